use std::cell::RefCell;
use std::fmt;

//------------ Signal --------------------------------------------------------

/// A fan-out point with a plain subscription list.
///
/// Handlers run in subscription order. The emitting RIB releases all of
/// its borrows before a signal fires, but handlers still must not mutate
/// the RIB synchronously, and must not connect to the signal they are
/// handling; neither re-entrancy is defined.
pub struct Signal<T> {
    handlers: RefCell<Vec<Box<dyn FnMut(&T)>>>,
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
        }
    }

    /// Appends a handler to the subscription list.
    pub fn connect(&self, handler: impl FnMut(&T) + 'static) {
        self.handlers.borrow_mut().push(Box::new(handler));
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub(crate) fn emit(&self, event: &T) {
        for handler in self.handlers.borrow_mut().iter_mut() {
            handler(event);
        }
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signal({} handlers)", self.handler_count())
    }
}
