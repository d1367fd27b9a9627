//------------ Types for Statistics ------------------------------------------

use std::cell::Cell;
use std::fmt;

/// Entry and route tallies for one RIB.
///
/// `routes` counts stored routes across all entries, `entries` counts the
/// prefixes present in the table. Both move only on acknowledged updates;
/// an in-place route refresh touches neither.
#[derive(Clone, Debug, Default)]
pub struct Counters {
    entries: Cell<usize>,
    routes: Cell<usize>,
}

impl Counters {
    pub fn entries(&self) -> usize {
        self.entries.get()
    }

    pub fn routes(&self) -> usize {
        self.routes.get()
    }

    pub(crate) fn inc_entries_count(&self) {
        self.entries.set(self.entries.get() + 1);
    }

    pub(crate) fn dec_entries_count(&self) {
        debug_assert!(self.entries.get() > 0);
        self.entries.set(self.entries.get() - 1);
    }

    pub(crate) fn inc_routes_count(&self) {
        self.routes.set(self.routes.get() + 1);
    }

    pub(crate) fn dec_routes_count(&self) {
        debug_assert!(self.routes.get() > 0);
        self.routes.set(self.routes.get() - 1);
    }
}

impl fmt::Display for Counters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries, {} routes",
            self.entries.get(),
            self.routes.get()
        )
    }
}
