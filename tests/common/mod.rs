#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Write;
use std::rc::Rc;

use name_rib::{
    FibUpdateError, FibUpdateFailureCallback, FibUpdateSuccessCallback,
    FibUpdater, Name, RibUpdate, RibUpdateAction, RibUpdateBatch,
    RibUpdateList, Route,
};

pub fn init() {
    let _ = env_logger::builder()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .is_test(true)
        .try_init();
}

pub fn register_update(name: &Name, route: Route) -> RibUpdate {
    RibUpdate {
        action: RibUpdateAction::Register,
        name: name.clone(),
        route,
    }
}

pub fn unregister_update(name: &Name, route: Route) -> RibUpdate {
    RibUpdate {
        action: RibUpdateAction::Unregister,
        name: name.clone(),
        route,
    }
}

//------------ MockFibUpdater ------------------------------------------------

/// One scripted answer of the [`MockFibUpdater`].
pub enum Reply {
    /// Acknowledge immediately, returning this inherited-route delta.
    Accept(RibUpdateList),
    /// Reject immediately with this code and message.
    Reject(u32, &'static str),
    /// Neither; park the callbacks until the test resolves them.
    Hold,
}

/// Scriptable FIB updater. Replies are consumed in order; once the
/// script runs dry every batch is acknowledged immediately with an empty
/// inherited-route delta.
pub struct MockFibUpdater {
    batches: RefCell<Vec<RibUpdateBatch>>,
    replies: RefCell<VecDeque<Reply>>,
    held: RefCell<Vec<(FibUpdateSuccessCallback, FibUpdateFailureCallback)>>,
}

impl MockFibUpdater {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            batches: RefCell::new(Vec::new()),
            replies: RefCell::new(VecDeque::new()),
            held: RefCell::new(Vec::new()),
        })
    }

    pub fn push_reply(&self, reply: Reply) {
        self.replies.borrow_mut().push_back(reply);
    }

    /// Every batch received so far, in arrival order.
    pub fn batches(&self) -> Vec<RibUpdateBatch> {
        self.batches.borrow().clone()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.borrow().len()
    }

    pub fn held_count(&self) -> usize {
        self.held.borrow().len()
    }

    /// Acknowledges the oldest held batch.
    pub fn resolve_next_held(&self, inherited_routes: RibUpdateList) {
        let (on_success, _) = self.held.borrow_mut().remove(0);
        on_success(inherited_routes);
    }

    /// Rejects the oldest held batch.
    pub fn reject_next_held(&self, code: u32, message: &str) {
        let (_, on_failure) = self.held.borrow_mut().remove(0);
        on_failure(FibUpdateError::new(code, message));
    }
}

impl FibUpdater for MockFibUpdater {
    fn compute_and_send_fib_updates(
        &self,
        batch: RibUpdateBatch,
        on_success: FibUpdateSuccessCallback,
        on_failure: FibUpdateFailureCallback,
    ) {
        self.batches.borrow_mut().push(batch);
        // the pop must not hold a borrow while a callback re-enters us
        let reply = self.replies.borrow_mut().pop_front();
        match reply {
            None => on_success(Vec::new()),
            Some(Reply::Accept(inherited_routes)) => {
                on_success(inherited_routes)
            }
            Some(Reply::Reject(code, message)) => {
                on_failure(FibUpdateError::new(code, message))
            }
            Some(Reply::Hold) => {
                self.held.borrow_mut().push((on_success, on_failure))
            }
        }
    }
}
