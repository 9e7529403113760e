//! Integration tests for flagr
//!
//! These tests verify end-to-end behavior by opening collections in
//! temporary directories and driving the public API the way a host
//! application would: per-document mutation with persistence, membership
//! queries, bulk updates and the frequency aggregation.

use flagr::{
    aggregate, bulk, query, Collection, Document, DocumentId, FlagStore, Flaggable, Predicate,
};
use tempfile::TempDir;

/// Helper to open a collection in a fresh temporary directory
fn setup_collection() -> (TempDir, Collection) {
    let dir = TempDir::new().unwrap();
    let collection = Collection::open(dir.path().join("collection")).unwrap();
    (dir, collection)
}

/// Helper to persist a document carrying the given flags
fn seed(collection: &Collection, id: &str, flags: &[&str]) -> Document {
    let mut doc = Document::new(id);
    for flag in flags {
        doc.add_flag(flag);
    }
    collection.save(&doc).unwrap();
    doc
}

#[test]
fn test_fresh_document_has_no_flags() {
    let (_dir, collection) = setup_collection();

    let doc = collection.create("doc-1").unwrap();
    assert!(doc.flags().is_empty());

    let loaded = collection.load(&doc.id).unwrap().unwrap();
    assert!(loaded.flags().is_empty());
    assert!(loaded.flags.is_none());
}

#[test]
fn test_add_flag_and_save_round_trips() {
    let (_dir, collection) = setup_collection();

    let mut doc = collection.create("doc-1").unwrap();
    doc.add_flag_and_save(&collection, "urgent").unwrap();
    doc.add_flag_and_save(&collection, "urgent").unwrap();

    let loaded = collection.load(&doc.id).unwrap().unwrap();
    assert_eq!(loaded.flags(), ["urgent"]);
}

#[test]
fn test_remove_flag_and_save() {
    let (_dir, collection) = setup_collection();

    let mut doc = collection.create("doc-1").unwrap();
    doc.add_flag_and_save(&collection, "flag1").unwrap();
    doc.add_flag_and_save(&collection, "flag2").unwrap();

    doc.remove_flag_and_save(&collection, "flag1").unwrap();
    // Removing an absent flag persists fine and changes nothing
    doc.remove_flag_and_save(&collection, "flag1").unwrap();

    let loaded = collection.load(&doc.id).unwrap().unwrap();
    assert_eq!(loaded.flags(), ["flag2"]);
}

#[test]
fn test_clear_flags_and_save_leaves_field_present() {
    let (_dir, collection) = setup_collection();

    let mut doc = collection.create("doc-1").unwrap();
    doc.add_flag_and_save(&collection, "flag1").unwrap();
    doc.clear_flags_and_save(&collection).unwrap();

    let loaded = collection.load(&doc.id).unwrap().unwrap();
    assert_eq!(loaded.flags, Some(Vec::new()));
    assert!(loaded.flags().is_empty());
}

#[test]
fn test_distinct_in_memory_copies_do_not_interfere() {
    let (_dir, collection) = setup_collection();

    let saved = seed(&collection, "doc-1", &["flag1"]);

    let mut copy = collection.load(&saved.id).unwrap().unwrap();
    copy.add_flag("flag2");

    // The store still holds the original until the copy is persisted
    let loaded = collection.load(&saved.id).unwrap().unwrap();
    assert_eq!(loaded.flags(), ["flag1"]);

    collection.save(&copy).unwrap();
    let loaded = collection.load(&saved.id).unwrap().unwrap();
    assert_eq!(loaded.flags(), ["flag1", "flag2"]);
}

#[test]
fn test_membership_queries_per_spec_example() {
    let (_dir, collection) = setup_collection();

    seed(&collection, "doc-1", &["flag1"]);
    seed(&collection, "doc-2", &["flag2"]);
    seed(&collection, "doc-3", &["flag1", "flag2"]);

    let all = query::by_all_flags(&collection, ["flag1", "flag2"]).unwrap();
    assert_eq!(all, vec![DocumentId::new("doc-3")]);

    let any = query::by_any_flags(&collection, ["flag1", "flag2"]).unwrap();
    assert_eq!(any.len(), 3);
}

#[test]
fn test_flag_count_paths_agree() {
    let (_dir, collection) = setup_collection();

    seed(&collection, "doc-1", &["flag1"]);
    seed(&collection, "doc-2", &["flag1", "flag2"]);
    seed(&collection, "doc-3", &["flag2"]);

    assert_eq!(
        query::flag_count(&collection, ["flag1"]).unwrap(),
        query::by_all_flags(&collection, ["flag1"]).unwrap().len()
    );
    assert_eq!(query::flag_count(&collection, ["flag1", "flag2"]).unwrap(), 1);
}

#[test]
fn test_distinct_flags_across_collection() {
    let (_dir, collection) = setup_collection();

    seed(&collection, "doc-1", &["flag1"]);
    seed(&collection, "doc-2", &["flag2"]);
    seed(&collection, "doc-3", &["flag3"]);
    seed(&collection, "doc-4", &["flag3", "flag4"]);

    let distinct = query::distinct_flags(&collection).unwrap();
    assert_eq!(distinct, vec!["flag1", "flag2", "flag3", "flag4"]);
}

#[test]
fn test_bulk_add_exactly_the_matching_documents() {
    let (_dir, collection) = setup_collection();

    seed(&collection, "doc-1", &["candidate"]);
    seed(&collection, "doc-2", &["candidate"]);
    seed(&collection, "doc-3", &["other"]);

    let predicate = query::all_of(["candidate"]);
    let changed = bulk::bulk_add_flag(&collection, "approved", Some(&predicate)).unwrap();
    assert_eq!(changed, 2);

    let approved = query::by_all_flags(&collection, ["approved"]).unwrap();
    assert_eq!(approved.len(), 2);
    assert!(!approved.contains(&DocumentId::new("doc-3")));

    // Re-applying produces no further change
    let changed = bulk::bulk_add_flag(&collection, "approved", Some(&predicate)).unwrap();
    assert_eq!(changed, 0);
}

#[test]
fn test_bulk_remove_with_default_predicate() {
    let (_dir, collection) = setup_collection();

    seed(&collection, "doc-1", &["stale", "flag1"]);
    seed(&collection, "doc-2", &["stale"]);
    collection.create("doc-3").unwrap();

    let changed = bulk::bulk_remove_flag(&collection, "stale", None).unwrap();
    assert_eq!(changed, 2);

    assert!(query::by_any_flags(&collection, ["stale"]).unwrap().is_empty());
    assert_eq!(query::distinct_flags(&collection).unwrap(), vec!["flag1"]);

    // The never-flagged document keeps its absent field
    let doc = collection.load(&DocumentId::new("doc-3")).unwrap().unwrap();
    assert!(doc.flags.is_none());
}

#[test]
fn test_flag_frequency_per_spec_example() {
    let (_dir, collection) = setup_collection();

    seed(&collection, "doc-1", &["flag1"]);
    seed(&collection, "doc-2", &["flag2"]);
    seed(&collection, "doc-3", &["flag1", "flag2"]);

    let freq = aggregate::flag_frequency(&collection).unwrap();
    assert_eq!(freq.len(), 2);
    assert_eq!(freq.get("flag1"), Some(2));
    assert_eq!(freq.get("flag2"), Some(2));
}

#[test]
fn test_flag_frequency_orders_by_descending_count() {
    let (_dir, collection) = setup_collection();

    seed(&collection, "doc-1", &["common"]);
    seed(&collection, "doc-2", &["common", "rare"]);
    seed(&collection, "doc-3", &["common"]);

    let freq = aggregate::flag_frequency(&collection).unwrap();
    let ordered: Vec<(&str, u64)> = freq.iter().collect();
    assert_eq!(ordered, vec![("common", 3), ("rare", 1)]);
}

#[test]
fn test_flag_frequency_on_empty_and_flagless_collections() {
    let (_dir, collection) = setup_collection();

    let freq = aggregate::flag_frequency(&collection).unwrap();
    assert!(freq.is_empty());

    // Documents with absent or empty flag fields contribute nothing
    collection.create("unflagged").unwrap();
    let mut cleared = collection.create("cleared").unwrap();
    cleared.clear_flags_and_save(&collection).unwrap();

    let freq = aggregate::flag_frequency(&collection).unwrap();
    assert!(freq.is_empty());
}

#[test]
fn test_bulk_then_frequency_then_reload() {
    let (_dir, collection) = setup_collection();

    let mut doc = seed(&collection, "doc-1", &["flag1"]);
    seed(&collection, "doc-2", &["flag1"]);

    bulk::bulk_add_flag(&collection, "audited", None).unwrap();

    let freq = aggregate::flag_frequency(&collection).unwrap();
    assert_eq!(freq.get("audited"), Some(2));
    assert_eq!(freq.get("flag1"), Some(2));

    // The in-memory copy only sees the bulk update after a reload
    assert!(!doc.has_flag("audited"));
    collection.reload(&mut doc).unwrap();
    assert!(doc.has_flag("audited"));
}

#[test]
fn test_flags_reopen_after_flush() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("collection");

    {
        let collection = Collection::open(&path).unwrap();
        seed(&collection, "doc-1", &["flag1", "flag2"]);
        collection.flush().unwrap();
    }

    let collection = Collection::open(&path).unwrap();
    assert_eq!(query::flag_count(&collection, ["flag1"]).unwrap(), 1);
    assert_eq!(
        collection.count(&Predicate::AllFlags(vec!["flag1".into(), "flag2".into()])).unwrap(),
        1
    );
}
