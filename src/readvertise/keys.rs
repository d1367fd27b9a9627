use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;

use crate::types::name::Name;

//------------ SigningInfo ---------------------------------------------------

/// Selects the identity that signs an upstream announcement.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SigningInfo {
    identity: Name,
}

impl SigningInfo {
    pub fn by_identity(identity: Name) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &Name {
        &self.identity
    }
}

impl fmt::Display for SigningInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id:{}", self.identity)
    }
}

//------------ KeyStore ------------------------------------------------------

/// The set of signing identities available on this host; the stand-in
/// for the local key chain as far as the readvertise policy is
/// concerned.
#[derive(Debug, Default)]
pub struct KeyStore {
    identities: RefCell<BTreeSet<Name>>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the identity already existed.
    pub fn create_identity(&self, name: Name) -> bool {
        self.identities.borrow_mut().insert(name)
    }

    /// Returns `false` when the identity did not exist.
    pub fn delete_identity(&self, name: &Name) -> bool {
        self.identities.borrow_mut().remove(name)
    }

    pub fn contains_identity(&self, name: &Name) -> bool {
        self.identities.borrow().contains(name)
    }

    /// Snapshot of all identities, in name order.
    pub fn identities(&self) -> Vec<Name> {
        self.identities.borrow().iter().cloned().collect()
    }
}
