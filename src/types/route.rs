use std::cell::Cell;
use std::fmt;
use std::ops::BitOr;
use std::rc::Rc;
use std::time::Instant;

/// Origin of routes registered by local applications.
pub const ORIGIN_APP: u16 = 0;
/// Origin of routes loaded from static configuration.
pub const ORIGIN_STATIC: u16 = 255;

//------------ RouteFlags ----------------------------------------------------

/// Bitset of per-route behavior flags.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct RouteFlags(u64);

impl RouteFlags {
    /// The route also applies to all descendant prefixes, until a
    /// capturing entry is reached.
    pub const CHILD_INHERIT: RouteFlags = RouteFlags(1);
    /// The route's entry stops child-inherit propagation from ancestors.
    pub const CAPTURE: RouteFlags = RouteFlags(2);

    pub const fn empty() -> Self {
        RouteFlags(0)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn contains(self, other: RouteFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for RouteFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        RouteFlags(self.0 | rhs.0)
    }
}

impl fmt::Display for RouteFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (
            self.contains(Self::CHILD_INHERIT),
            self.contains(Self::CAPTURE),
        ) {
            (false, false) => write!(f, "none"),
            (true, false) => write!(f, "child-inherit"),
            (false, true) => write!(f, "capture"),
            (true, true) => write!(f, "child-inherit|capture"),
        }
    }
}

//------------ ExpirationEvent -----------------------------------------------

/// Cancellation token for a scheduled route expiration.
///
/// The scheduler that armed the timer keeps one clone, the route keeps
/// another. Cancelling is idempotent; a fired or cancelled token stays
/// cancelled forever.
#[derive(Clone, Debug, Default)]
pub struct ExpirationEvent(Rc<Cell<bool>>);

impl ExpirationEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

//------------ RouteKey ------------------------------------------------------

/// The identity of a route within one entry.
///
/// A `(prefix, face_id, origin)` triple identifies at most one stored
/// route; cost, flags and expiry are payload, not identity.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RouteKey {
    pub face_id: u64,
    pub origin: u16,
}

impl RouteKey {
    pub fn new(face_id: u64, origin: u16) -> Self {
        Self { face_id, origin }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(face: {}, origin: {})", self.face_id, self.origin)
    }
}

//------------ Route ---------------------------------------------------------

/// One contribution to a RIB entry: send traffic for the entry's prefix
/// through `face_id`, at `cost`, subject to `flags`.
///
/// Routes compare equal when their [`RouteKey`] matches; re-registering a
/// route with an existing key overwrites the payload fields in place.
#[derive(Clone, Debug, Default)]
pub struct Route {
    pub face_id: u64,
    pub origin: u16,
    pub cost: u64,
    pub flags: RouteFlags,
    pub expires: Option<Instant>,
    /// Token cancelling the pending expiration timer, if one is armed.
    pub expiration_event: Option<ExpirationEvent>,
}

impl Route {
    pub fn new(face_id: u64, origin: u16) -> Self {
        Self {
            face_id,
            origin,
            ..Self::default()
        }
    }

    pub fn key(&self) -> RouteKey {
        RouteKey::new(self.face_id, self.origin)
    }

    pub fn is_child_inherit(&self) -> bool {
        self.flags.contains(RouteFlags::CHILD_INHERIT)
    }

    pub fn is_capture(&self) -> bool {
        self.flags.contains(RouteFlags::CAPTURE)
    }

    /// Cancels and drops the pending expiration token, if any. Safe to
    /// call on a route that has none.
    pub fn cancel_expiration_event(&mut self) {
        if let Some(event) = self.expiration_event.take() {
            event.cancel();
        }
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Route {}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Route(face: {}, origin: {}, cost: {}, flags: {}, expires: {})",
            self.face_id,
            self.origin,
            self.cost,
            self.flags,
            if self.expires.is_some() {
                "finite"
            } else {
                "never"
            }
        )
    }
}
