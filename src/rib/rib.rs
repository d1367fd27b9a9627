use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::ops::Bound;
use std::rc::Rc;

use log::{debug, trace};

use crate::rib::entry::{RibEntry, RibRouteRef, SharedRibEntry};
use crate::rib::fib_updater::FibUpdater;
use crate::rib::signal::Signal;
use crate::stats::Counters;
use crate::types::errors::FibUpdateError;
use crate::types::name::Name;
use crate::types::rib_update::{
    RibUpdate, RibUpdateAction, RibUpdateBatch, RibUpdateList,
};
use crate::types::route::{Route, RouteKey};

//------------ Update callbacks ----------------------------------------------

/// Invoked once the update has been committed locally.
pub type UpdateSuccessCallback = Box<dyn FnOnce()>;

/// Invoked when the FIB updater rejected the update; the RIB is unchanged.
pub type UpdateFailureCallback = Box<dyn FnOnce(FibUpdateError)>;

//------------ UpdateQueueItem -----------------------------------------------

struct UpdateQueueItem {
    batch: RibUpdateBatch,
    on_success: Option<UpdateSuccessCallback>,
    on_failure: Option<UpdateFailureCallback>,
}

//------------ RibSignals ----------------------------------------------------

/// The observation hooks the RIB emits on committed local changes.
///
/// These are fan-out points for policies; the RIB makes no assumption
/// about their handlers beyond the re-entrancy rule documented on
/// [`Signal`].
#[derive(Debug, Default)]
pub struct RibSignals {
    pub after_insert_entry: Signal<Name>,
    pub after_add_route: Signal<RibRouteRef>,
    pub before_remove_route: Signal<RibRouteRef>,
    pub after_erase_entry: Signal<Name>,
}

//------------ Rib -----------------------------------------------------------

/// Mutable tables of one RIB, guarded by a single `RefCell`.
struct RibState {
    /// Lexicographic by name, so all descendants of a prefix form one
    /// contiguous range directly after it.
    table: BTreeMap<Name, SharedRibEntry>,
    /// Face id to entries, one occurrence per stored route on that face.
    face_entries: BTreeMap<u64, Vec<SharedRibEntry>>,
    update_queue: VecDeque<UpdateQueueItem>,
    /// True iff a batch has been sent to the FIB updater and not yet
    /// acknowledged.
    is_update_in_progress: bool,
}

struct RibInner {
    state: RefCell<RibState>,
    signals: RibSignals,
    counters: Counters,
    fib_updater: RefCell<Option<Rc<dyn FibUpdater>>>,
}

/// The Routing Information Base: an in-memory, prefix-indexed tree of
/// name-based routes.
///
/// `Rib` is a cheaply cloneable handle; clones share one underlying
/// table. All operations run on one thread; the completion callbacks of
/// the FIB updater re-enter through clones of this handle.
///
/// Registrations and unregistrations go through
/// [`begin_apply_update`](Self::begin_apply_update) and its siblings:
/// they queue the change, hand it to the FIB updater, and mutate the
/// local tree only once the updater has acknowledged. A reader between
/// enqueue and acknowledgement therefore always sees the pre-update
/// state.
#[derive(Clone)]
pub struct Rib {
    inner: Rc<RibInner>,
}

impl Rib {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RibInner {
                state: RefCell::new(RibState {
                    table: BTreeMap::new(),
                    face_entries: BTreeMap::new(),
                    update_queue: VecDeque::new(),
                    is_update_in_progress: false,
                }),
                signals: RibSignals::default(),
                counters: Counters::default(),
                fib_updater: RefCell::new(None),
            }),
        }
    }

    /// Sets the collaborator every queued batch is committed through.
    /// Must be called before the first `begin_*` operation.
    pub fn set_fib_updater(&self, updater: Rc<dyn FibUpdater>) {
        *self.inner.fib_updater.borrow_mut() = Some(updater);
    }

    pub fn signals(&self) -> &RibSignals {
        &self.inner.signals
    }

    pub fn counters(&self) -> &Counters {
        &self.inner.counters
    }

    /// Total number of stored routes across all entries.
    pub fn n_items(&self) -> usize {
        self.inner.counters.routes()
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.inner.counters.entries()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_update_in_progress(&self) -> bool {
        self.inner.state.borrow().is_update_in_progress
    }

    //--- Lookups ------------------------------------------------------------

    pub fn find(&self, prefix: &Name) -> Option<SharedRibEntry> {
        self.inner.state.borrow().table.get(prefix).cloned()
    }

    /// Snapshot of the route with `key` stored under exactly `prefix`.
    pub fn find_route(
        &self,
        prefix: &Name,
        key: RouteKey,
    ) -> Option<Route> {
        self.find(prefix)
            .and_then(|entry| entry.borrow().find_route(key).cloned())
    }

    /// Like [`find_route`](Self::find_route), falling back to the
    /// immediate parent entry; ancestors further up are not consulted.
    pub fn find_route_longest_prefix(
        &self,
        prefix: &Name,
        key: RouteKey,
    ) -> Option<Route> {
        self.find_route(prefix, key).or_else(|| {
            self.find_parent(prefix)
                .and_then(|parent| parent.borrow().find_route(key).cloned())
        })
    }

    /// The entry for the longest proper prefix of `prefix` present in the
    /// table, down to and including the zero-length name.
    pub fn find_parent(&self, prefix: &Name) -> Option<SharedRibEntry> {
        Self::find_parent_in(&self.inner.state.borrow(), prefix)
    }

    /// All entries whose name has `prefix` as a proper prefix. `prefix`
    /// itself must be in the table; the walk is then a contiguous range
    /// scan.
    pub fn find_descendants(&self, prefix: &Name) -> Vec<SharedRibEntry> {
        Self::find_descendants_in(&self.inner.state.borrow(), prefix)
    }

    /// Descendant walk for a name that is not in the table itself; scans
    /// the whole table.
    pub fn find_descendants_for_non_inserted_name(
        &self,
        prefix: &Name,
    ) -> Vec<SharedRibEntry> {
        self.inner
            .state
            .borrow()
            .table
            .iter()
            .filter(|(name, _)| prefix.is_prefix_of(name))
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    /// Snapshot of all entries in table order.
    pub fn entries(&self) -> Vec<SharedRibEntry> {
        self.inner.state.borrow().table.values().cloned().collect()
    }

    /// Snapshot of the entries currently indexed for `face_id`, one
    /// occurrence per stored route on that face.
    pub fn entries_with_face(&self, face_id: u64) -> Vec<SharedRibEntry> {
        self.inner
            .state
            .borrow()
            .face_entries
            .get(&face_id)
            .cloned()
            .unwrap_or_default()
    }

    fn find_parent_in(
        state: &RibState,
        prefix: &Name,
    ) -> Option<SharedRibEntry> {
        for i in (0..prefix.len()).rev() {
            if let Some(entry) = state.table.get(&prefix.get_prefix(i)) {
                return Some(entry.clone());
            }
        }
        None
    }

    fn find_descendants_in(
        state: &RibState,
        prefix: &Name,
    ) -> Vec<SharedRibEntry> {
        let mut descendants = Vec::new();
        if state.table.contains_key(prefix) {
            let after = (Bound::Excluded(prefix), Bound::Unbounded);
            for (name, entry) in state.table.range::<Name, _>(after) {
                if !prefix.is_prefix_of(name) {
                    break;
                }
                descendants.push(entry.clone());
            }
        }
        descendants
    }

    //--- Inheritance --------------------------------------------------------

    /// The child-inherit routes `entry` picks up from its ancestors,
    /// ordered by face id, one route per face. Collection walks parent
    /// links upward and stops after the first capturing ancestor has
    /// contributed.
    pub fn get_ancestor_routes(&self, entry: &SharedRibEntry) -> Vec<Route> {
        Self::collect_ancestor_routes(entry.borrow().parent())
    }

    /// As [`get_ancestor_routes`](Self::get_ancestor_routes), for a name
    /// that need not be in the table.
    pub fn get_ancestor_routes_for_name(&self, name: &Name) -> Vec<Route> {
        Self::collect_ancestor_routes(self.find_parent(name))
    }

    fn collect_ancestor_routes(
        mut ancestor: Option<SharedRibEntry>,
    ) -> Vec<Route> {
        let mut routes: Vec<Route> = Vec::new();
        while let Some(current) = ancestor {
            let entry = current.borrow();
            for route in entry.routes() {
                if route.is_child_inherit() {
                    routes.push(route.clone());
                }
            }
            if entry.has_capture() {
                break;
            }
            ancestor = entry.parent();
        }
        // closest ancestor wins per face: pushes happened closest-first
        // and the sort is stable
        routes.sort_by_key(|route| route.face_id);
        routes.dedup_by_key(|route| route.face_id);
        routes
    }

    /// Applies the inherited-route delta returned by the FIB updater.
    fn modify_inherited_routes(&self, inherited_routes: RibUpdateList) {
        for update in inherited_routes {
            let entry = self.find(&update.name);
            debug_assert!(
                entry.is_some(),
                "inherited-route delta names a missing entry"
            );
            let Some(entry) = entry else { continue };
            match update.action {
                RibUpdateAction::Register => {
                    trace!(
                        "rib: {} inherits {}",
                        update.name,
                        update.route
                    );
                    entry.borrow_mut().add_inherited_route(update.route);
                }
                RibUpdateAction::Unregister => {
                    trace!(
                        "rib: {} no longer inherits {}",
                        update.name,
                        update.route
                    );
                    entry
                        .borrow_mut()
                        .remove_inherited_route(update.route.key());
                }
                // the removal of the originating route already accounts
                // for the delta
                RibUpdateAction::RemoveFace => {}
            }
        }
    }

    //--- Local mutation (runs only on FIB-updater acknowledgement) ----------

    fn insert(&self, prefix: Name, route: Route) {
        enum Outcome {
            NewEntry(RibRouteRef),
            NewRoute(RibRouteRef),
            Refreshed,
        }

        let outcome = {
            let mut state = self.inner.state.borrow_mut();
            if let Some(entry) = state.table.get(&prefix).cloned() {
                let mut borrowed = entry.borrow_mut();
                if let Some(existing) = borrowed.find_route_mut(route.key())
                {
                    // refresh in place: cancel the outstanding expiration
                    // timer before replacing the handle
                    if existing.expiration_event.is_some() {
                        trace!(
                            "rib: cancelling expiration event for {} {}",
                            prefix,
                            existing
                        );
                    }
                    existing.cancel_expiration_event();
                    *existing = route;
                    Outcome::Refreshed
                } else {
                    let key = route.key();
                    let face_id = route.face_id;
                    borrowed.insert_route(route);
                    drop(borrowed);
                    self.inner.counters.inc_routes_count();
                    state
                        .face_entries
                        .entry(face_id)
                        .or_default()
                        .push(entry.clone());
                    Outcome::NewRoute(RibRouteRef::new(entry, key))
                }
            } else {
                let key = route.key();
                let face_id = route.face_id;
                let entry =
                    Rc::new(RefCell::new(RibEntry::new(prefix.clone())));
                entry.borrow_mut().insert_route(route);
                state.table.insert(prefix.clone(), entry.clone());
                self.inner.counters.inc_entries_count();
                self.inner.counters.inc_routes_count();

                let parent = Self::find_parent_in(&state, &prefix);
                entry.borrow_mut().set_parent(parent.as_ref());
                if let Some(parent) = &parent {
                    parent.borrow_mut().add_child(entry.clone());
                }

                // descendants that hung off the parent move under the new
                // entry
                for child in Self::find_descendants_in(&state, &prefix) {
                    let child_parent = child.borrow().parent();
                    let hangs_off_parent = match (&child_parent, &parent) {
                        (None, None) => true,
                        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                        _ => false,
                    };
                    if hangs_off_parent {
                        if let Some(parent) = &parent {
                            parent.borrow_mut().remove_child(&child);
                        }
                        entry.borrow_mut().add_child(child.clone());
                        child.borrow_mut().set_parent(Some(&entry));
                    }
                }

                state
                    .face_entries
                    .entry(face_id)
                    .or_default()
                    .push(entry.clone());
                Outcome::NewEntry(RibRouteRef::new(entry, key))
            }
        };

        match outcome {
            Outcome::NewEntry(rib_route) => {
                self.inner.signals.after_insert_entry.emit(&prefix);
                self.inner.signals.after_add_route.emit(&rib_route);
            }
            Outcome::NewRoute(rib_route) => {
                self.inner.signals.after_add_route.emit(&rib_route);
            }
            Outcome::Refreshed => {}
        }
    }

    fn erase(&self, prefix: &Name, key: RouteKey) {
        let Some(entry) = self.find(prefix) else {
            // name prefix does not exist
            return;
        };
        if entry.borrow().find_route(key).is_none() {
            return;
        }

        self.inner
            .signals
            .before_remove_route
            .emit(&RibRouteRef::new(entry.clone(), key));

        let entry_now_empty = {
            let mut state = self.inner.state.borrow_mut();
            let mut borrowed = entry.borrow_mut();
            let removed = borrowed.erase_route(key);
            debug_assert!(removed.is_some());
            self.inner.counters.dec_routes_count();

            // drop one index pair once the entry has no route left on
            // this face
            if !borrowed.has_face_id(key.face_id) {
                if let Some(entries) =
                    state.face_entries.get_mut(&key.face_id)
                {
                    if let Some(pos) = entries
                        .iter()
                        .position(|indexed| Rc::ptr_eq(indexed, &entry))
                    {
                        entries.remove(pos);
                    }
                    if entries.is_empty() {
                        state.face_entries.remove(&key.face_id);
                    }
                }
            }
            borrowed.is_empty()
        };

        if entry_now_empty {
            self.erase_entry(prefix);
        }
    }

    fn erase_entry(&self, name: &Name) {
        {
            let mut state = self.inner.state.borrow_mut();
            let Some(entry) = state.table.remove(name) else { return };
            let parent = entry.borrow().parent();
            if let Some(parent) = &parent {
                parent.borrow_mut().remove_child(&entry);
            }
            // the children move up to the grandparent, which may be absent
            let children = entry.borrow().children().to_vec();
            for child in children {
                entry.borrow_mut().remove_child(&child);
                child.borrow_mut().set_parent(parent.as_ref());
                if let Some(parent) = &parent {
                    parent.borrow_mut().add_child(child.clone());
                }
            }
            self.inner.counters.dec_entries_count();
        }
        self.inner.signals.after_erase_entry.emit(name);
    }

    //--- Update queue and commit protocol -----------------------------------

    /// Queues one update and starts draining the queue if it is idle.
    /// The callbacks fire after the FIB updater has answered for this
    /// batch: `on_success` once the local tree has been mutated,
    /// `on_failure` with the updater's rejection and the tree unchanged.
    pub fn begin_apply_update(
        &self,
        update: RibUpdate,
        on_success: Option<UpdateSuccessCallback>,
        on_failure: Option<UpdateFailureCallback>,
    ) {
        self.add_update_to_queue(update, on_success, on_failure);
        self.send_batch_from_queue();
    }

    /// Queues a REMOVE_FACE update for every route on `face_id` and
    /// starts draining.
    pub fn begin_remove_face(&self, face_id: u64) {
        let entries = self.entries_with_face(face_id);
        for entry in entries {
            self.enqueue_remove_face(&entry, face_id);
        }
        self.send_batch_from_queue();
    }

    /// Queues REMOVE_FACE updates for every route whose face is not in
    /// `active_face_ids` and starts draining.
    pub fn begin_remove_failed_faces(
        &self,
        active_face_ids: &BTreeSet<u64>,
    ) {
        let pairs: Vec<(u64, SharedRibEntry)> = {
            let state = self.inner.state.borrow();
            state
                .face_entries
                .iter()
                .flat_map(|(face_id, entries)| {
                    entries.iter().map(move |entry| (*face_id, entry.clone()))
                })
                .collect()
        };
        for (face_id, entry) in pairs {
            if active_face_ids.contains(&face_id) {
                continue;
            }
            self.enqueue_remove_face(&entry, face_id);
        }
        self.send_batch_from_queue();
    }

    /// Expiration never mutates the tree directly; it queues an
    /// UNREGISTER like any other source. A timer firing for a route that
    /// is already gone drains into a silent no-op.
    pub fn on_route_expiration(&self, prefix: &Name, key: RouteKey) {
        debug!("rib: route {} for {} has expired", key, prefix);
        let update = RibUpdate {
            action: RibUpdateAction::Unregister,
            name: prefix.clone(),
            route: Route::new(key.face_id, key.origin),
        };
        self.begin_apply_update(update, None, None);
    }

    fn enqueue_remove_face(&self, entry: &SharedRibEntry, face_id: u64) {
        let updates: Vec<RibUpdate> = {
            let borrowed = entry.borrow();
            borrowed
                .routes()
                .iter()
                .filter(|route| route.face_id == face_id)
                .map(|route| RibUpdate {
                    action: RibUpdateAction::RemoveFace,
                    name: borrowed.name().clone(),
                    route: route.clone(),
                })
                .collect()
        };
        for update in updates {
            self.add_update_to_queue(update, None, None);
        }
    }

    fn add_update_to_queue(
        &self,
        update: RibUpdate,
        on_success: Option<UpdateSuccessCallback>,
        on_failure: Option<UpdateFailureCallback>,
    ) {
        trace!("rib: queueing {}", update);
        let mut batch = RibUpdateBatch::new(update.route.face_id);
        batch.add(update);
        self.inner.state.borrow_mut().update_queue.push_back(
            UpdateQueueItem {
                batch,
                on_success,
                on_failure,
            },
        );
    }

    fn send_batch_from_queue(&self) {
        let (item, updater) = {
            let mut state = self.inner.state.borrow_mut();
            if state.is_update_in_progress {
                return;
            }
            let updater = self.inner.fib_updater.borrow().clone();
            let Some(updater) = updater else {
                debug_assert!(
                    state.update_queue.is_empty(),
                    "updates queued without a FIB updater"
                );
                return;
            };
            let Some(item) = state.update_queue.pop_front() else {
                return;
            };
            state.is_update_in_progress = true;
            (item, updater)
        };

        // each batch carries exactly one update until coalescing lands
        debug_assert_eq!(item.batch.len(), 1);
        debug!("rib: sending {} to the FIB updater", item.batch);

        let batch = item.batch.clone();
        let rib = self.clone();
        let on_success = item.on_success;
        let rib_on_failure = self.clone();
        let on_failure = item.on_failure;
        updater.compute_and_send_fib_updates(
            item.batch,
            Box::new(move |inherited_routes| {
                rib.on_fib_update_success(batch, inherited_routes, on_success);
            }),
            Box::new(move |error| {
                rib_on_failure.on_fib_update_failure(on_failure, error);
            }),
        );
    }

    fn on_fib_update_success(
        &self,
        batch: RibUpdateBatch,
        inherited_routes: RibUpdateList,
        on_success: Option<UpdateSuccessCallback>,
    ) {
        debug!(
            "rib: FIB updater acknowledged batch for face {}",
            batch.face_id()
        );
        for update in &batch {
            match update.action {
                RibUpdateAction::Register => {
                    self.insert(update.name.clone(), update.route.clone());
                }
                RibUpdateAction::Unregister
                | RibUpdateAction::RemoveFace => {
                    self.erase(&update.name, update.route.key());
                }
            }
        }

        self.modify_inherited_routes(inherited_routes);

        self.inner.state.borrow_mut().is_update_in_progress = false;

        if let Some(on_success) = on_success {
            on_success();
        }

        // try to advance the batch queue
        self.send_batch_from_queue();
    }

    fn on_fib_update_failure(
        &self,
        on_failure: Option<UpdateFailureCallback>,
        error: FibUpdateError,
    ) {
        debug!("rib: {}", error);
        self.inner.state.borrow_mut().is_update_in_progress = false;

        if let Some(on_failure) = on_failure {
            on_failure(error);
        }

        // try to advance the batch queue
        self.send_batch_from_queue();
    }
}

impl Default for Rib {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Rib {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.entries() {
            writeln!(f, "{}", entry.borrow())?;
        }
        Ok(())
    }
}
