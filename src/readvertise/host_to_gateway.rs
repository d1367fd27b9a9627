use std::rc::Rc;
use std::time::Duration;

use log::debug;
use serde::Deserialize;

use crate::readvertise::keys::{KeyStore, SigningInfo};
use crate::readvertise::{ReadvertiseAction, ReadvertisePolicy};
use crate::rib::entry::RibRouteRef;
use crate::types::name::Name;

const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(25);

/// Identities whose name ends in this component announce the parent
/// prefix instead, so `/net/site/nrd` advertises `/net/site`.
const IGNORE_COMPONENT: &[u8] = b"nrd";

//------------ HostToGatewayReadvertisePolicy --------------------------------

/// Re-announces locally registered prefixes to a gateway, as the prefix
/// of the identity that can sign the announcement.
///
/// Among all identities that cover a route's name, the one advertising
/// the shortest prefix wins: announcing `/net` once beats announcing
/// every deeper registration separately.
pub struct HostToGatewayReadvertisePolicy {
    key_store: Rc<KeyStore>,
    refresh_interval: Duration,
}

/// Shape of the policy's configuration section. Unknown keys are
/// ignored; an unreadable section falls back to the defaults wholesale.
#[derive(Debug, Default, Deserialize)]
struct PolicyConfig {
    refresh_interval: Option<u64>,
}

impl HostToGatewayReadvertisePolicy {
    /// Creates the policy over `key_store`, with the refresh cadence
    /// taken from the `refresh_interval` key (positive seconds) of
    /// `section`. Any other shape of the section yields the 25 s
    /// default.
    pub fn new(
        key_store: Rc<KeyStore>,
        section: Option<&serde_json::Value>,
    ) -> Self {
        let config: PolicyConfig = section
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or_default();
        let refresh_interval = config
            .refresh_interval
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL);
        Self {
            key_store,
            refresh_interval,
        }
    }
}

impl ReadvertisePolicy for HostToGatewayReadvertisePolicy {
    fn handle_new_route(
        &self,
        rib_route: &RibRouteRef,
    ) -> Option<ReadvertiseAction> {
        let entry_name = rib_route.name();
        if is_reserved_scope(&entry_name) {
            return None;
        }

        // the identity advertising the shortest covering prefix wins;
        // the first qualifying identity wins ties
        let mut found: Option<(Name, Name)> = None;
        for identity in self.key_store.identities() {
            let prefix = advertised_prefix(&identity);
            if !prefix.is_prefix_of(&entry_name) {
                continue;
            }
            let shorter = found
                .as_ref()
                .map_or(true, |(best, _)| prefix.len() < best.len());
            if shorter {
                found = Some((prefix, identity));
            }
        }

        let (prefix, identity) = found?;
        let cost = rib_route.route()?.cost;
        debug!(
            "readvertise: {} announced as {} signed by {}",
            entry_name, prefix, identity
        );
        Some(ReadvertiseAction {
            prefix,
            cost,
            signer: SigningInfo::by_identity(identity),
        })
    }

    fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }
}

/// Names under `/localhost` and `/localhop` never leave this host.
fn is_reserved_scope(name: &Name) -> bool {
    match name.get(0) {
        Some(first) => {
            first.as_bytes() == &b"localhost"[..]
                || first.as_bytes() == &b"localhop"[..]
        }
        None => false,
    }
}

/// The prefix an identity announces: its own name, with a trailing `nrd`
/// component stripped.
fn advertised_prefix(identity: &Name) -> Name {
    let strips = identity
        .len()
        .checked_sub(1)
        .and_then(|last| identity.get(last))
        .map_or(false, |component| {
            component.as_bytes() == IGNORE_COMPONENT
        });
    if strips {
        identity.get_prefix(identity.len() - 1)
    } else {
        identity.clone()
    }
}
