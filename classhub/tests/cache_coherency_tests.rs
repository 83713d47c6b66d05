//! Coherency contract of the cache store: read-your-write, generational
//! invalidation, TTL expiry and explicit removal.

#[path = "testutils/mod.rs"]
mod testutils;

use std::sync::Arc;
use std::time::Duration;

use classhub::{CacheConfig, CoherencyStore, EntityKind, GenerationMap, SchoolUser, UserRole};
use testutils::fixture::init_logging;

fn store() -> CoherencyStore {
    init_logging();
    CoherencyStore::with_defaults()
}

#[test]
fn set_then_get_returns_the_value() {
    let store = store();
    let user = SchoolUser::new("Alice", "alice@school.edu", UserRole::Teacher);

    store.set("User_Id_7", EntityKind::User, user.clone(), None);
    assert_eq!(store.get::<SchoolUser>("User_Id_7"), Some(user));
}

#[test]
fn generation_bump_invalidates_all_tagged_entries() {
    let store = store();
    let v1 = SchoolUser::new("Alice", "alice@school.edu", UserRole::Teacher);

    store.set(
        "User_Id_7",
        EntityKind::User,
        v1,
        Some(Duration::from_secs(900)),
    );
    store.set("User_AllActive", EntityKind::User, vec![1u32, 2, 3], None);

    store.bump_generation(EntityKind::User);

    // Both the id key and the list variant miss, even though neither was
    // removed explicitly.
    assert_eq!(store.get::<SchoolUser>("User_Id_7"), None);
    assert_eq!(store.get::<Vec<u32>>("User_AllActive"), None);

    // Re-populating after the bump serves the new value.
    let v2 = SchoolUser::new("Alice Cooper", "alice@school.edu", UserRole::Teacher);
    store.set(
        "User_Id_7",
        EntityKind::User,
        v2.clone(),
        Some(Duration::from_secs(900)),
    );
    assert_eq!(store.get::<SchoolUser>("User_Id_7"), Some(v2));
}

#[test]
fn bump_of_one_kind_leaves_other_kinds_alone() {
    let store = store();
    store.set("User_Id_1", EntityKind::User, 1u32, None);
    store.set("Team_Id_1", EntityKind::Team, 2u32, None);

    store.bump_generation(EntityKind::User);

    assert_eq!(store.get::<u32>("User_Id_1"), None);
    assert_eq!(store.get::<u32>("Team_Id_1"), Some(2));
}

#[test]
fn expiration_is_lazy_and_passive() {
    let store = store();
    store.set(
        "Subject_Id_1",
        EntityKind::Subject,
        "algebra".to_string(),
        Some(Duration::from_millis(20)),
    );
    assert!(store.get::<String>("Subject_Id_1").is_some());

    std::thread::sleep(Duration::from_millis(40));

    // Entry still physically present until the read drops it.
    assert_eq!(store.len(), 1);
    assert_eq!(store.get::<String>("Subject_Id_1"), None);
    assert_eq!(store.len(), 0);
}

#[test]
fn remove_evicts_exactly_one_key() {
    let store = store();
    store.set("Team_Id_1", EntityKind::Team, 1u32, None);
    store.set("Team_Id_2", EntityKind::Team, 2u32, None);

    store.remove("Team_Id_1");

    assert_eq!(store.get::<u32>("Team_Id_1"), None);
    assert_eq!(store.get::<u32>("Team_Id_2"), Some(2));
}

#[test]
fn stats_count_hits_and_misses() {
    let store = store();
    store.set("User_Id_1", EntityKind::User, 1u32, None);

    assert!(store.get::<u32>("User_Id_1").is_some());
    assert!(store.get::<u32>("User_Id_2").is_none());

    let stats = store.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.insertions, 1);
    assert!(stats.hit_rate() > 0.49 && stats.hit_rate() < 0.51);
}

#[test]
fn generations_are_shared_across_stores() {
    init_logging();
    let generations = Arc::new(GenerationMap::new());
    let store_a =
        CoherencyStore::new(CacheConfig::default(), Arc::clone(&generations)).unwrap();
    let store_b = CoherencyStore::new(CacheConfig::default(), generations).unwrap();

    store_a.set("Team_Id_1", EntityKind::Team, 1u32, None);
    store_b.bump_generation(EntityKind::Team);

    // The bump through one handle retires entries tagged via the other.
    assert_eq!(store_a.get::<u32>("Team_Id_1"), None);
}
