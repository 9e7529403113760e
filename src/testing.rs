//! Testing utilities for flagr
//!
//! This module provides helper types for writing tests, including a
//! `TestCollection` wrapper that holds a collection in a temporary
//! directory and removes it on drop.
//!
//! Only available when compiled with `cfg(test)`.

use crate::store::{Collection, FlagStore};
use crate::{Document, Flaggable};
use tempfile::TempDir;

/// A collection in a temporary directory, removed on drop
///
/// # Examples
/// ```ignore
/// let test = TestCollection::new();
/// let collection = test.collection();
///
/// test.seed("doc-1", &["flag1"]);
/// assert_eq!(collection.len(), 1);
/// // Directory removed when `test` is dropped
/// ```
pub struct TestCollection {
    _dir: TempDir,
    collection: Collection,
}

impl TestCollection {
    /// Open a fresh collection in a new temporary directory
    ///
    /// # Panics
    /// Panics if the directory or the collection cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temporary directory");
        let collection =
            Collection::open(dir.path().join("collection")).expect("Failed to open collection");

        Self {
            _dir: dir,
            collection,
        }
    }

    /// Get a reference to the underlying collection
    #[must_use]
    pub const fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Create and persist a document carrying the given flags
    ///
    /// # Panics
    /// Panics if persisting fails.
    pub fn seed(&self, id: &str, flags: &[&str]) -> Document {
        let mut doc = Document::new(id);
        for flag in flags {
            doc.add_flag(flag);
        }
        self.collection.save(&doc).expect("Failed to seed document");
        doc
    }
}

impl Default for TestCollection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DocumentId;

    #[test]
    fn test_collection_starts_empty() {
        let test = TestCollection::new();
        assert!(test.collection().is_empty());
    }

    #[test]
    fn test_seed_persists_flags() {
        let test = TestCollection::new();
        let doc = test.seed("doc-1", &["flag1", "flag2"]);

        assert_eq!(doc.flags(), ["flag1", "flag2"]);
        let loaded = test
            .collection()
            .load(&DocumentId::new("doc-1"))
            .unwrap()
            .unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_collections_are_isolated() {
        let first = TestCollection::new();
        let second = TestCollection::new();

        first.seed("doc-1", &["flag1"]);
        assert!(second.collection().is_empty());
    }
}
