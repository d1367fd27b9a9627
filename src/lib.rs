//! An in-memory, prefix-indexed Routing Information Base for name-based
//! forwarding.
//!
//! The [`Rib`] stores routes contributed by applications and other
//! daemons under hierarchical [`Name`] prefixes. Register and unregister
//! updates are queued, handed to a downstream [`FibUpdater`]
//! (`rib::fib_updater`), and committed locally only once the updater has
//! acknowledged, so readers never observe partial state. Child-inherit
//! and capture flags propagate routes along the prefix tree; the
//! `readvertise` module decides which local routes are re-announced
//! upstream.

pub mod rib;
pub mod readvertise;
mod stats;
pub mod types;

pub use crate::rib::entry::{RibEntry, RibRouteRef, SharedRibEntry};
pub use crate::rib::fib_updater::{
    FibUpdateFailureCallback, FibUpdateSuccessCallback, FibUpdater,
};
pub use crate::rib::rib::{
    Rib, RibSignals, UpdateFailureCallback, UpdateSuccessCallback,
};
pub use crate::rib::signal::Signal;
pub use crate::stats::Counters;
pub use crate::types::errors::{FibUpdateError, NameParseError};
pub use crate::types::name::{Name, NameComponent};
pub use crate::types::rib_update::{
    RibUpdate, RibUpdateAction, RibUpdateBatch, RibUpdateList,
};
pub use crate::types::route::{
    ExpirationEvent, Route, RouteFlags, RouteKey, ORIGIN_APP, ORIGIN_STATIC,
};
