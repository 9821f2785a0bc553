use std::collections::HashSet;
use std::sync::Arc;

use eavbase::query::select_ids;
use eavbase::storage::EavStore;
use eavbase::{BaseObject, ClassIdentity, EavbaseConfig, EntityFactory, PersistenceGate, PredicateSet, RecordId};
use serde_json::json;

fn on_disk_gate(dir: &tempfile::TempDir) -> PersistenceGate {
    PersistenceGate::new(EavbaseConfig::relational(dir.path().to_string_lossy()))
}

fn package() -> ClassIdentity {
    ClassIdentity::new("repo", "Package")
}

fn ids(found: Option<Vec<RecordId>>) -> HashSet<RecordId> {
    found.expect("persistence should be active").into_iter().collect()
}

#[test]
fn test_round_trip_through_select_by_params() {
    let dir = tempfile::tempdir().unwrap();
    let gate = on_disk_gate(&dir);
    let factory = EntityFactory::new(&gate);

    let mut entity = factory.construct_uninitialized(&package()).unwrap();
    entity.set_param("name", json!("foo")).unwrap();
    entity.set_param("version", json!("1.0")).unwrap();
    let id = entity.id().unwrap();

    let by_name = factory
        .select_by_params(&package(), &PredicateSet::new().and("name", "foo"))
        .unwrap()
        .unwrap();
    assert!(by_name.iter().any(|e| e.id() == Some(id)));
    assert!(by_name.iter().all(|e| e.is_persistent()));

    let wrong_version = factory
        .select_by_params(&package(), &PredicateSet::new().and("name", "foo").and("version", "2.0"))
        .unwrap()
        .unwrap();
    assert!(wrong_version.iter().all(|e| e.id() != Some(id)));

    // the returned entity proxies the existing record, not a fresh one
    let found = &by_name[0];
    assert_eq!(found.get_param("version").unwrap(), Some(json!("1.0")));
}

#[test]
fn test_conjunction_requires_every_predicate() {
    let dir = tempfile::tempdir().unwrap();
    let gate = on_disk_gate(&dir);
    let factory = EntityFactory::new(&gate);

    let mut r1 = factory.construct_uninitialized(&package()).unwrap();
    r1.set_params([("a", json!(1)), ("b", json!(2))]).unwrap();
    let mut r2 = factory.construct_uninitialized(&package()).unwrap();
    r2.set_params([("a", json!(1)), ("b", json!(3))]).unwrap();

    let both = select_ids(&gate, &package(), &PredicateSet::new().and("a", 1).and("b", 2)).unwrap();
    assert_eq!(both, Some(vec![r1.id().unwrap()]));

    let only_a = ids(select_ids(&gate, &package(), &PredicateSet::new().and("a", 1)).unwrap());
    assert_eq!(only_a, [r1.id().unwrap(), r2.id().unwrap()].into_iter().collect());
}

#[test]
fn test_adding_predicates_only_narrows() {
    let store = Arc::new(EavStore::open_in_memory().unwrap());
    let gate = PersistenceGate::with_store(EavbaseConfig::relational("."), store);
    let factory = EntityFactory::new(&gate);

    let rows = [
        [("color", "red"), ("size", "s"), ("shape", "round")],
        [("color", "red"), ("size", "m"), ("shape", "round")],
        [("color", "blue"), ("size", "s"), ("shape", "round")],
        [("color", "red"), ("size", "s"), ("shape", "square")],
    ];
    for row in rows {
        let mut e = factory.construct_uninitialized(&package()).unwrap();
        e.set_params(row.iter().map(|(k, v)| (*k, json!(v)))).unwrap();
    }

    let chain = [("color", "red"), ("size", "s"), ("shape", "round")];
    let mut preds = PredicateSet::new();
    let mut previous = ids(select_ids(&gate, &package(), &preds).unwrap());
    assert_eq!(previous.len(), 4);
    let mut sizes = Vec::new();
    for (k, v) in chain {
        preds = preds.and(k, v);
        let current = ids(select_ids(&gate, &package(), &preds).unwrap());
        assert!(current.is_subset(&previous));
        sizes.push(current.len());
        previous = current;
    }
    assert_eq!(sizes, vec![3, 2, 1]);
}

#[test]
fn test_empty_predicates_return_all_ids_or_empty() {
    let store = Arc::new(EavStore::open_in_memory().unwrap());
    let gate = PersistenceGate::with_store(EavbaseConfig::relational("."), store);

    // tables not created yet
    assert_eq!(select_ids(&gate, &package(), &PredicateSet::new()).unwrap(), Some(vec![]));
    assert_eq!(
        select_ids(&gate, &package(), &PredicateSet::new().and("a", 1)).unwrap(),
        Some(vec![])
    );

    let factory = EntityFactory::new(&gate);
    let created: HashSet<_> = (0..3)
        .map(|_| factory.construct_uninitialized(&package()).unwrap().id().unwrap())
        .collect();
    assert_eq!(ids(select_ids(&gate, &package(), &PredicateSet::new()).unwrap()), created);
}

#[test]
fn test_disabled_persistence_is_none_for_any_predicates() {
    let gate = PersistenceGate::new(EavbaseConfig::default());
    let sets = [
        PredicateSet::new(),
        PredicateSet::new().and("a", 1),
        PredicateSet::new().and("a", 1).and("b", "x").and("c", true),
    ];
    for preds in &sets {
        assert!(select_ids(&gate, &package(), preds).unwrap().is_none());
        assert!(EntityFactory::new(&gate).select_by_params(&package(), preds).unwrap().is_none());
    }
}

#[test]
fn test_inaccessible_store_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("var")).unwrap();
    // a plain file where the db/ directory should be
    std::fs::write(dir.path().join("var/db"), b"").unwrap();
    let gate = on_disk_gate(&dir);
    let factory = EntityFactory::new(&gate);

    assert!(factory
        .select_by_params(&package(), &PredicateSet::new().and("name", "foo"))
        .unwrap()
        .is_none());
    let entity = factory.construct_uninitialized(&package()).unwrap();
    assert!(!entity.is_persistent());
}

#[test]
fn test_version_mismatch_behaves_as_disabled() {
    let store = Arc::new(EavStore::open_in_memory().unwrap());
    store.set_schema_version(eavbase::guard::SCHEMA_VERSION + 1).unwrap();
    let gate = PersistenceGate::with_store(EavbaseConfig::relational("."), store);
    let factory = EntityFactory::new(&gate);

    assert!(select_ids(&gate, &package(), &PredicateSet::new()).unwrap().is_none());
    assert!(!factory.construct_uninitialized(&package()).unwrap().is_persistent());
}

#[test]
fn test_value_types_are_distinguished() {
    let store = Arc::new(EavStore::open_in_memory().unwrap());
    let gate = PersistenceGate::with_store(EavbaseConfig::relational("."), store);
    let factory = EntityFactory::new(&gate);

    let mut e = factory.construct_uninitialized(&package()).unwrap();
    e.set_param("n", json!(1)).unwrap();

    assert_eq!(select_ids(&gate, &package(), &PredicateSet::new().and("n", 1)).unwrap().unwrap().len(), 1);
    assert!(select_ids(&gate, &package(), &PredicateSet::new().and("n", "1")).unwrap().unwrap().is_empty());
}

#[test]
fn test_duplicate_property_rows_are_not_deduplicated() {
    let store = Arc::new(EavStore::open_in_memory().unwrap());
    let gate = PersistenceGate::with_store(EavbaseConfig::relational("."), Arc::clone(&store));
    let factory = EntityFactory::new(&gate);

    let mut e = factory.construct_uninitialized(&package()).unwrap();
    e.set_param("tag", json!("x")).unwrap();
    let id = e.id().unwrap();
    let tables = eavbase::TableNamespace::for_class(&package());
    store.append_property(&tables, id, "tag", &json!("x")).unwrap();

    let found = select_ids(&gate, &package(), &PredicateSet::new().and("tag", "x")).unwrap().unwrap();
    assert_eq!(found, vec![id, id]);
}

#[test]
fn test_store_shared_across_classes() {
    let dir = tempfile::tempdir().unwrap();
    let gate = on_disk_gate(&dir);
    let factory = EntityFactory::new(&gate);

    factory.construct_uninitialized(&package()).unwrap();
    factory.construct_uninitialized(&ClassIdentity::new("repo", "Release")).unwrap();

    let entries: Vec<_> = std::fs::read_dir(dir.path().join("var/db")).unwrap().collect();
    assert_eq!(entries.len(), 1);
    let stats = gate.database_handle().unwrap().stats().unwrap();
    assert_eq!(stats.records_tables, 2);
}

#[test]
fn test_existing_store_without_marker_is_inactive() {
    let dir = tempfile::tempdir().unwrap();
    let db_dir = dir.path().join("var/db");
    std::fs::create_dir_all(&db_dir).unwrap();
    {
        let conn = rusqlite::Connection::open(db_dir.join("eavbase.db")).unwrap();
        conn.execute_batch(
            "CREATE TABLE eavbase_meta (version INTEGER NOT NULL);
             CREATE TABLE eavbase__repo__Package__recs (id INTEGER PRIMARY KEY);
             INSERT INTO eavbase__repo__Package__recs (id) VALUES (7);",
        )
        .unwrap();
    }

    let gate = on_disk_gate(&dir);
    assert!(gate.database_handle().is_some());
    assert!(select_ids(&gate, &package(), &PredicateSet::new()).unwrap().is_none());
    assert!(!EntityFactory::new(&gate).construct_uninitialized(&package()).unwrap().is_persistent());
}
