use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::types::name::Name;
use crate::types::route::{Route, RouteKey};

/// Shared handle to a [`RibEntry`].
///
/// Entries are co-owned by the table, the face index and their parent's
/// child list; parent links are weak so the tree carries no ownership
/// cycle.
pub type SharedRibEntry = Rc<RefCell<RibEntry>>;

pub type WeakRibEntry = Weak<RefCell<RibEntry>>;

//------------ RibEntry ------------------------------------------------------

/// The per-name record gathering all routes for one prefix, plus its
/// position in the prefix tree.
///
/// The tree wiring (parent, children) is maintained by the RIB that owns
/// the entry; mutating it directly leaves the tree inconsistent.
#[derive(Debug, Default)]
pub struct RibEntry {
    name: Name,
    routes: Vec<Route>,
    inherited_routes: Vec<Route>,
    parent: WeakRibEntry,
    children: Vec<SharedRibEntry>,
}

impl RibEntry {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    /// The stored routes, in insertion order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn parent(&self) -> Option<SharedRibEntry> {
        self.parent.upgrade()
    }

    pub fn set_parent(&mut self, parent: Option<&SharedRibEntry>) {
        self.parent = parent.map(Rc::downgrade).unwrap_or_default();
    }

    pub fn children(&self) -> &[SharedRibEntry] {
        &self.children
    }

    pub fn add_child(&mut self, child: SharedRibEntry) {
        debug_assert!(!self
            .children
            .iter()
            .any(|existing| Rc::ptr_eq(existing, &child)));
        self.children.push(child);
    }

    pub fn remove_child(&mut self, child: &SharedRibEntry) {
        self.children.retain(|existing| !Rc::ptr_eq(existing, child));
    }

    /// Adds a new route. Returns `false` without touching anything when a
    /// route with the same key is already stored.
    pub fn insert_route(&mut self, route: Route) -> bool {
        if self.find_route(route.key()).is_some() {
            return false;
        }
        self.routes.push(route);
        true
    }

    pub fn find_route(&self, key: RouteKey) -> Option<&Route> {
        self.routes.iter().find(|route| route.key() == key)
    }

    pub fn find_route_mut(&mut self, key: RouteKey) -> Option<&mut Route> {
        self.routes.iter_mut().find(|route| route.key() == key)
    }

    /// Removes and returns the route with `key`, if present.
    pub fn erase_route(&mut self, key: RouteKey) -> Option<Route> {
        let pos = self.routes.iter().position(|route| route.key() == key)?;
        Some(self.routes.remove(pos))
    }

    pub fn has_face_id(&self, face_id: u64) -> bool {
        self.routes.iter().any(|route| route.face_id == face_id)
    }

    /// True when any stored route carries the capture flag, which stops
    /// child-inherit propagation from ancestors at this entry.
    pub fn has_capture(&self) -> bool {
        self.routes.iter().any(|route| route.is_capture())
    }

    pub fn has_child_inherit_on_face(&self, face_id: u64) -> bool {
        self.routes
            .iter()
            .any(|route| route.face_id == face_id && route.is_child_inherit())
    }

    /// Routes inherited from ancestors, as last reported by the FIB
    /// updater.
    pub fn inherited_routes(&self) -> &[Route] {
        &self.inherited_routes
    }

    pub fn add_inherited_route(&mut self, route: Route) {
        self.inherited_routes.push(route);
    }

    pub fn remove_inherited_route(&mut self, key: RouteKey) {
        if let Some(pos) = self
            .inherited_routes
            .iter()
            .position(|route| route.key() == key)
        {
            self.inherited_routes.remove(pos);
        }
    }

    pub fn has_inherited_route(&self, key: RouteKey) -> bool {
        self.inherited_routes
            .iter()
            .any(|route| route.key() == key)
    }
}

impl fmt::Display for RibEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RibEntry {{ name: {}", self.name)?;
        for route in &self.routes {
            writeln!(f, "  {}", route)?;
        }
        for route in &self.inherited_routes {
            writeln!(f, "  inherited {}", route)?;
        }
        write!(f, "}}")
    }
}

//------------ RibRouteRef ---------------------------------------------------

/// Reference to one route inside one RIB entry; the payload of the
/// route-level signals.
#[derive(Clone)]
pub struct RibRouteRef {
    entry: SharedRibEntry,
    route: RouteKey,
}

impl RibRouteRef {
    pub fn new(entry: SharedRibEntry, route: RouteKey) -> Self {
        Self { entry, route }
    }

    pub fn entry(&self) -> &SharedRibEntry {
        &self.entry
    }

    pub fn route_key(&self) -> RouteKey {
        self.route
    }

    pub fn name(&self) -> Name {
        self.entry.borrow().name().clone()
    }

    /// Snapshot of the referenced route. `None` when the route has been
    /// removed since the reference was taken.
    pub fn route(&self) -> Option<Route> {
        self.entry.borrow().find_route(self.route).cloned()
    }
}

impl fmt::Debug for RibRouteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RibRouteRef({}, {})", self.name(), self.route)
    }
}
