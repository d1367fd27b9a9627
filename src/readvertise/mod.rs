pub mod host_to_gateway;
pub mod keys;

use std::fmt;
use std::time::Duration;

use crate::rib::entry::RibRouteRef;
use crate::types::name::Name;

pub use host_to_gateway::HostToGatewayReadvertisePolicy;
pub use keys::{KeyStore, SigningInfo};

//------------ ReadvertiseAction ---------------------------------------------

/// Instruction for the upstream announcer: announce `prefix` at `cost`,
/// signed as `signer`. Actually sending the announcement is the
/// downstream consumer's job.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReadvertiseAction {
    pub prefix: Name,
    pub cost: u64,
    pub signer: SigningInfo,
}

impl fmt::Display for ReadvertiseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "announce {} cost {} signed by {}",
            self.prefix, self.cost, self.signer
        )
    }
}

//------------ ReadvertisePolicy ---------------------------------------------

/// Decides which locally registered routes are re-announced upstream.
///
/// Implementations observe the RIB's route signals; `handle_new_route`
/// turns one added route into at most one announcement.
pub trait ReadvertisePolicy {
    /// Proposes an announcement for a newly added route, or `None` when
    /// the route should not be announced.
    fn handle_new_route(
        &self,
        rib_route: &RibRouteRef,
    ) -> Option<ReadvertiseAction>;

    /// Cadence at which announced prefixes are refreshed upstream.
    fn refresh_interval(&self) -> Duration;
}
