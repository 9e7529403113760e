//! The narrow store contract the flag components depend on
//!
//! [`FlagSet`](crate::flags), [`query`](crate::query), [`bulk`](crate::bulk)
//! and [`aggregate`](crate::aggregate) all talk to the store exclusively
//! through [`FlagStore`]; they never call each other. [`Predicate`] is the
//! complete vocabulary of read predicates the contract supports.

use super::error::StoreError;
use crate::aggregate::Stage;
use crate::flags::Flaggable;
use crate::{Document, DocumentId};

/// Store predicate selecting documents by flag membership or identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Match every document in the collection
    All,
    /// Flag array contains this one value (equality on array element)
    HasFlag(String),
    /// Flag array contains every listed value; an empty list matches nothing
    AllFlags(Vec<String>),
    /// Flag array contains at least one listed value; an empty list matches
    /// nothing
    AnyFlags(Vec<String>),
    /// Flag field is present (not null), even if empty
    FlagsPresent,
    /// Document id is one of the listed ids
    Ids(Vec<DocumentId>),
}

impl Predicate {
    /// Evaluate this predicate against an in-memory document
    ///
    /// Stores with no smarter execution path can filter with this; indexed
    /// stores must agree with it.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::All => true,
            Self::HasFlag(flag) => doc.flags().contains(flag),
            Self::AllFlags(flags) => {
                !flags.is_empty() && flags.iter().all(|f| doc.flags().contains(f))
            }
            Self::AnyFlags(flags) => flags.iter().any(|f| doc.flags().contains(f)),
            Self::FlagsPresent => doc.flags.is_some(),
            Self::Ids(ids) => ids.contains(&doc.id),
        }
    }
}

/// Contract a collection store fulfils to host flagged documents
///
/// This is the only boundary the flag components see. Store failures cross
/// it unmodified; no retries happen on either side.
pub trait FlagStore {
    /// Ids of all documents matching the predicate
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if reading the collection fails.
    fn find(&self, predicate: &Predicate) -> Result<Vec<DocumentId>, StoreError>;

    /// Number of documents matching the predicate
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if reading the collection fails.
    fn count(&self, predicate: &Predicate) -> Result<usize, StoreError>;

    /// Every distinct flag value present anywhere in the collection
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if reading the flag index fails.
    fn distinct_flags(&self) -> Result<Vec<String>, StoreError>;

    /// Add a flag to every matching document's set, skipping documents that
    /// already carry it; the whole update runs at the store without
    /// materializing documents
    ///
    /// Returns the number of documents whose flag set changed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if any document update fails.
    fn add_to_set(&self, predicate: &Predicate, flag: &str) -> Result<usize, StoreError>;

    /// Remove all occurrences of a flag from every matching document
    ///
    /// Returns the number of documents whose flag set changed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if any document update fails.
    fn pull(&self, predicate: &Predicate, flag: &str) -> Result<usize, StoreError>;

    /// Execute an aggregation pipeline, yielding (flag value, count) groups
    ///
    /// Group order is unspecified; ordering is the caller's concern.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidPipeline` when the stages cannot be
    /// executed in the given order, or another `StoreError` on read failure.
    fn run_pipeline(&self, stages: &[Stage]) -> Result<Vec<(String, u64)>, StoreError>;

    /// Persist a document's in-memory flag field
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write or index maintenance fails.
    fn save<D: Flaggable>(&self, doc: &D) -> Result<(), StoreError>;

    /// Read one document, `None` when the id is not in the collection
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read or decoding fails.
    fn load(&self, id: &DocumentId) -> Result<Option<Document>, StoreError>;

    /// Discard in-memory mutations, re-reading the flag field from the store
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DocumentNotFound` if the document is no longer
    /// in the collection.
    fn reload<D: Flaggable>(&self, doc: &mut D) -> Result<(), StoreError>;
}
