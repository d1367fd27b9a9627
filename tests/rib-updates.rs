mod common;

use std::cell::Cell;
use std::error::Error;
use std::rc::Rc;

use name_rib::{
    ExpirationEvent, Name, Rib, Route, RouteFlags, RouteKey,
};

use common::{register_update, unregister_update, MockFibUpdater, Reply};

fn rib_with_updater() -> (Rib, Rc<MockFibUpdater>) {
    let rib = Rib::new();
    let updater = MockFibUpdater::new();
    rib.set_fib_updater(updater.clone());
    (rib, updater)
}

#[test]
fn test_register_then_unregister() -> Result<(), Box<dyn Error>> {
    common::init();
    let (rib, updater) = rib_with_updater();

    let prefix: Name = "/a".parse()?;
    let mut route = Route::new(1, 0);
    route.cost = 100;
    let key = route.key();

    let committed = Rc::new(Cell::new(false));
    let flag = committed.clone();
    rib.begin_apply_update(
        register_update(&prefix, route),
        Some(Box::new(move || flag.set(true))),
        None,
    );

    assert!(committed.get());
    assert_eq!(rib.n_items(), 1);
    assert_eq!(rib.len(), 1);
    assert_eq!(rib.find_route(&prefix, key).map(|r| r.cost), Some(100));

    rib.begin_apply_update(
        unregister_update(&prefix, Route::new(1, 0)),
        None,
        None,
    );

    assert_eq!(rib.n_items(), 0);
    assert!(rib.find(&prefix).is_none());
    assert!(rib.is_empty());
    assert_eq!(updater.batch_count(), 2);

    Ok(())
}

#[test]
fn test_rejected_update_leaves_rib_unchanged() -> Result<(), Box<dyn Error>> {
    common::init();
    let (rib, updater) = rib_with_updater();
    updater.push_reply(Reply::Reject(403, "not authorized"));

    let prefix: Name = "/a".parse()?;
    let failure: Rc<Cell<Option<u32>>> = Rc::new(Cell::new(None));
    let seen = failure.clone();
    rib.begin_apply_update(
        register_update(&prefix, Route::new(1, 0)),
        None,
        Some(Box::new(move |error| {
            assert_eq!(error.message, "not authorized");
            seen.set(Some(error.code));
        })),
    );

    assert_eq!(failure.get(), Some(403));
    assert!(rib.find(&prefix).is_none());
    assert_eq!(rib.n_items(), 0);
    assert!(!rib.is_update_in_progress());

    // the queue keeps draining after a rejection
    rib.begin_apply_update(register_update(&prefix, Route::new(1, 0)), None, None);
    assert_eq!(rib.n_items(), 1);

    Ok(())
}

#[test]
fn test_tree_unchanged_while_update_in_flight() -> Result<(), Box<dyn Error>> {
    common::init();
    let (rib, updater) = rib_with_updater();
    updater.push_reply(Reply::Hold);

    let first: Name = "/a".parse()?;
    let second: Name = "/b".parse()?;
    rib.begin_apply_update(register_update(&first, Route::new(1, 0)), None, None);

    // dispatched but unacknowledged: no observable change yet
    assert!(rib.is_update_in_progress());
    assert!(rib.find(&first).is_none());
    assert_eq!(updater.batch_count(), 1);

    // enqueueing while in flight does not dispatch a second batch
    rib.begin_apply_update(register_update(&second, Route::new(2, 0)), None, None);
    assert_eq!(updater.batch_count(), 1);

    updater.resolve_next_held(Vec::new());

    // both batches committed, in enqueue order
    assert_eq!(updater.batch_count(), 2);
    assert!(!rib.is_update_in_progress());
    assert!(rib.find(&first).is_some());
    assert!(rib.find(&second).is_some());
    assert_eq!(updater.batches()[0].face_id(), 1);
    assert_eq!(updater.batches()[1].face_id(), 2);

    Ok(())
}

#[test]
fn test_duplicate_registration_refreshes_in_place() -> Result<(), Box<dyn Error>> {
    common::init();
    let (rib, _updater) = rib_with_updater();

    let prefix: Name = "/a".parse()?;
    let added = Rc::new(Cell::new(0));
    let count = added.clone();
    rib.signals()
        .after_add_route
        .connect(move |_| count.set(count.get() + 1));

    let first_event = ExpirationEvent::new();
    let mut first = Route::new(1, 0);
    first.cost = 100;
    first.expiration_event = Some(first_event.clone());
    rib.begin_apply_update(register_update(&prefix, first), None, None);

    let mut refresh = Route::new(1, 0);
    refresh.cost = 50;
    refresh.flags = RouteFlags::CHILD_INHERIT;
    rib.begin_apply_update(register_update(&prefix, refresh), None, None);

    // exactly one route, carrying the refreshed fields
    assert_eq!(rib.n_items(), 1);
    let stored = rib.find_route(&prefix, RouteKey::new(1, 0)).unwrap();
    assert_eq!(stored.cost, 50);
    assert!(stored.is_child_inherit());

    // the first registration's timer is cancelled, and no second
    // add-route signal fired
    assert!(first_event.is_cancelled());
    assert_eq!(added.get(), 1);

    Ok(())
}

#[test]
fn test_expiration_of_absent_route_is_absorbed() -> Result<(), Box<dyn Error>> {
    common::init();
    let (rib, updater) = rib_with_updater();

    let prefix: Name = "/gone".parse()?;
    rib.on_route_expiration(&prefix, RouteKey::new(7, 0));

    // the UNREGISTER went through the queue and found nothing to erase
    assert_eq!(updater.batch_count(), 1);
    assert_eq!(rib.n_items(), 0);
    assert!(!rib.is_update_in_progress());

    Ok(())
}

#[test]
fn test_signals_fire_per_entry_and_route() -> Result<(), Box<dyn Error>> {
    common::init();
    let (rib, _updater) = rib_with_updater();

    let inserted = Rc::new(Cell::new(0));
    let added = Rc::new(Cell::new(0));
    let removed = Rc::new(Cell::new(0));
    let erased = Rc::new(Cell::new(0));
    for (signal, counter) in [
        (&rib.signals().after_insert_entry, &inserted),
        (&rib.signals().after_erase_entry, &erased),
    ] {
        let counter = counter.clone();
        signal.connect(move |_| counter.set(counter.get() + 1));
    }
    for (signal, counter) in [
        (&rib.signals().after_add_route, &added),
        (&rib.signals().before_remove_route, &removed),
    ] {
        let counter = counter.clone();
        signal.connect(move |_| counter.set(counter.get() + 1));
    }

    let prefix: Name = "/a".parse()?;
    rib.begin_apply_update(register_update(&prefix, Route::new(1, 0)), None, None);
    rib.begin_apply_update(register_update(&prefix, Route::new(2, 0)), None, None);
    assert_eq!((inserted.get(), added.get()), (1, 2));

    rib.begin_apply_update(unregister_update(&prefix, Route::new(1, 0)), None, None);
    assert_eq!((removed.get(), erased.get()), (1, 0));

    rib.begin_apply_update(unregister_update(&prefix, Route::new(2, 0)), None, None);
    assert_eq!((removed.get(), erased.get()), (2, 1));
    assert!(rib.is_empty());

    Ok(())
}

#[test]
fn test_insert_then_erase_restores_initial_state() -> Result<(), Box<dyn Error>> {
    common::init();
    let (rib, _updater) = rib_with_updater();

    let prefix: Name = "/a/b".parse()?;
    let route = Route::new(1, 0);
    rib.begin_apply_update(register_update(&prefix, route.clone()), None, None);
    rib.begin_apply_update(unregister_update(&prefix, route), None, None);

    assert_eq!(rib.n_items(), 0);
    assert_eq!(rib.len(), 0);
    assert!(rib.find(&prefix).is_none());
    assert!(rib.entries_with_face(1).is_empty());

    Ok(())
}
