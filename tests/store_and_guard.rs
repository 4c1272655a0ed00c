use std::collections::BTreeMap;

use cascade_core::definition::{FilterDefinition, FilterDefinitionSet};
use cascade_core::provider::StaticProvider;
use cascade_core::reconcile::RequestGuard;
use cascade_core::store::{FetchStatus, SelectionStore, StatusBoard};
use cascade_core::{FilterId, FilterOption, Selection};

fn definitions() -> FilterDefinitionSet {
    FilterDefinitionSet::new(vec![
        FilterDefinition::new("country", StaticProvider::default()),
        FilterDefinition::new("store", StaticProvider::default())
            .depends_on(["country"])
            .multi(),
    ])
    .unwrap()
}

#[test]
fn invariant_store_starts_at_defaults() {
    let store = SelectionStore::new(&definitions());
    let snapshot = store.snapshot();

    assert_eq!(snapshot.revision, 0);
    assert_eq!(store.get("country").unwrap(), Selection::single(FilterOption::all()));
    assert_eq!(store.get("store").unwrap(), Selection::Multi(vec![FilterOption::all()]));
    assert!(store.get("planet").is_none());
}

#[tokio::test]
async fn invariant_batch_is_one_transition() {
    let store = SelectionStore::new(&definitions());
    let mut watcher = store.subscribe();

    let revision = store.commit_batch(BTreeMap::from([
        (FilterId::new("country"), Selection::single(FilterOption::new(10, "France"))),
        (FilterId::new("store"), Selection::Multi(vec![FilterOption::new(3, "StoreA")])),
    ]));
    assert_eq!(revision, 1);

    watcher.changed().await.unwrap();
    let seen = watcher.borrow_and_update().clone();
    assert_eq!(seen.revision, 1);
    assert_eq!(seen.selections.active().count(), 2);
    assert!(!watcher.has_changed().unwrap(), "one batch, one notification");

    assert_eq!(store.set(FilterId::new("country"), Selection::single(FilterOption::all())), 2);
    assert_eq!(store.reset(), 3);
    assert_eq!(store.snapshot().selections.active().count(), 0);
}

#[test]
fn dropped_watcher_unsubscribes() {
    let store = SelectionStore::new(&definitions());
    let watcher = store.subscribe();
    drop(watcher);

    // Nobody listening is not an error.
    assert_eq!(store.set(FilterId::new("country"), Selection::single(FilterOption::new(1, "A"))), 1);
}

#[test]
fn invariant_newer_ticket_supersedes_older() {
    let guard = RequestGuard::new();
    let country = FilterId::new("country");
    let city = FilterId::new("city");

    let first = guard.issue(&country);
    assert!(guard.is_current(&first));

    let second = guard.issue(&country);
    assert!(!guard.is_current(&first));
    assert!(guard.is_current(&second));
    assert!(second.generation() > first.generation());

    let city_ticket = guard.issue(&city);
    assert!(guard.is_current(&second), "other filters are unaffected");

    guard.invalidate_all([&country, &city]);
    assert!(!guard.is_current(&second));
    assert!(!guard.is_current(&city_ticket));
}

#[test]
fn begin_supersedes_every_rewritten_filter() {
    let guard = RequestGuard::new();
    let continent = FilterId::new("continent");
    let country = FilterId::new("country");
    let city = FilterId::new("city");

    let city_pass = guard.issue(&city);
    let country_pass = guard.begin(&country, [&city]);
    assert_eq!(country_pass.filter(), &country);
    assert!(!guard.is_current(&city_pass), "the country pass rewrites city");

    // A descendant pass leaves its ancestor's pass alone.
    let continent_pass = guard.begin(&continent, [&country, &city]);
    assert!(!guard.is_current(&country_pass));
    let _later_city = guard.begin(&city, std::iter::empty());
    assert!(guard.is_current(&continent_pass));
}

#[test]
fn commit_if_current_checks_every_ticket() {
    let guard = RequestGuard::new();
    let country = FilterId::new("country");
    let city = FilterId::new("city");

    let tickets = guard.issue_all([&country, &city]);
    assert_eq!(guard.commit_if_current(&tickets, || 7), Some(7));

    let _newer_city = guard.issue(&city);
    let mut called = false;
    assert_eq!(guard.commit_if_current(&tickets, || called = true), None);
    assert!(!called);
    assert_eq!(guard.commit_if_current(&tickets[..1], || "country only"), Some("country only"));
}

#[test]
fn invalidate_with_runs_in_the_same_step() {
    let guard = RequestGuard::new();
    let country = FilterId::new("country");
    let ticket = guard.issue(&country);

    let revision = guard.invalidate_with([&country], || 42);
    assert_eq!(revision, 42);
    assert!(!guard.is_current(&ticket));
}

#[test]
fn status_board_tracks_each_filter() {
    let board = StatusBoard::new(&definitions());
    let mut watcher = board.subscribe();
    let country = FilterId::new("country");

    assert_eq!(board.get("country"), Some(FetchStatus::Idle));

    board.set(&country, FetchStatus::Loading);
    assert!(watcher.has_changed().unwrap());
    watcher.borrow_and_update();

    board.set(&country, FetchStatus::Loading);
    assert!(!watcher.has_changed().unwrap(), "unchanged status does not notify");

    board.set(&country, FetchStatus::Ready { options: 2 });
    assert_eq!(board.get("country"), Some(FetchStatus::Ready { options: 2 }));
}
