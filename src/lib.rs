//! Flagr - a flagging layer for documents in a collection store
//!
//! This library attaches an unordered set of string labels ("flags") to
//! documents and provides membership queries, bulk updates and a frequency
//! aggregation over an embedded database with a reverse flag index.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod aggregate;
pub mod bulk;
pub mod flags;
pub mod query;
pub mod store;

#[cfg(test)]
pub mod testing;

pub use aggregate::FlagFrequency;
pub use flags::Flaggable;
pub use store::{Collection, FlagStore, Predicate, StoreError};

/// Identifier of a document within a collection
#[derive(
    Encode, Decode, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create a new document id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Data struct pairing a document id with its optional flag field
///
/// `flags` is `None` until the first `add_flag`; `clear_flags` leaves it as
/// `Some(vec![])`. The distinction only matters to the store (documents
/// without the field are absent from the sparse flag index) - the
/// [`Flaggable`] accessors treat both states as "no flags".
#[derive(Encode, Decode, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub flags: Option<Vec<String>>,
}

impl Document {
    /// Create a new document with an absent flag field
    #[must_use]
    pub fn new(id: impl Into<DocumentId>) -> Self {
        Self {
            id: id.into(),
            flags: None,
        }
    }

    /// Create a document with an already-populated flag field
    #[must_use]
    pub const fn with_flags(id: DocumentId, flags: Option<Vec<String>>) -> Self {
        Self { id, flags }
    }
}

impl Flaggable for Document {
    fn id(&self) -> &DocumentId {
        &self.id
    }

    fn flag_field(&self) -> Option<&Vec<String>> {
        self.flags.as_ref()
    }

    fn flag_field_mut(&mut self) -> &mut Option<Vec<String>> {
        &mut self.flags
    }
}
