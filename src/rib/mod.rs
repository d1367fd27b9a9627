pub mod entry;
pub mod fib_updater;
pub mod rib;
pub mod signal;

pub use entry::{RibEntry, RibRouteRef, SharedRibEntry};
pub use fib_updater::FibUpdater;
pub use rib::{Rib, RibSignals};
