use crate::types::errors::FibUpdateError;
use crate::types::rib_update::{RibUpdateBatch, RibUpdateList};

/// Invoked when the FIB updater accepted a batch. Carries the delta of
/// inherited-route updates the RIB must apply locally.
pub type FibUpdateSuccessCallback = Box<dyn FnOnce(RibUpdateList)>;

/// Invoked when the FIB updater rejected a batch.
pub type FibUpdateFailureCallback = Box<dyn FnOnce(FibUpdateError)>;

//------------ FibUpdater ----------------------------------------------------

/// The downstream computation service the RIB commits through.
///
/// For every batch the updater computes the effective forwarding-table
/// changes plus the induced inherited-route delta, then invokes exactly
/// one of the two callbacks, on the thread the RIB runs on. Invocation
/// may happen before `compute_and_send_fib_updates` returns or at any
/// later point; the RIB keeps at most one batch outstanding either way.
/// The updater is expected to be idempotent under retries of identical
/// batches.
pub trait FibUpdater {
    fn compute_and_send_fib_updates(
        &self,
        batch: RibUpdateBatch,
        on_success: FibUpdateSuccessCallback,
        on_failure: FibUpdateFailureCallback,
    );
}
