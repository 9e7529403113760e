//! Type wrappers for store keys and values
//!
//! This module provides type-safe wrappers around the raw bytes the sled
//! trees hold. Document ids are stored as their UTF-8 bytes directly so the
//! `docs` tree iterates in id order; flag fields are bincode-encoded.
//!
//! # Types
//!
//! - **`IdKey`**: Wrapper turning a `DocumentId` into a tree key and back
//! - **`FlagField`**: The optional flag vector of one document, with its
//!   encoding to and from tree values
//!
//! Keeping the conversions here means encoding decisions live at the type
//! level rather than at each use site.

use super::error::StoreError;
use crate::DocumentId;

/// Wrapper for a `DocumentId` usable as a raw tree key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdKey(DocumentId);

impl IdKey {
    #[must_use]
    pub fn new(id: &DocumentId) -> Self {
        Self(id.clone())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_str().as_bytes()
    }

    /// # Errors
    ///
    /// Returns `StoreError::KeyError` if the bytes are not valid UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        let id = std::str::from_utf8(bytes)
            .map_err(|_| StoreError::KeyError("Invalid UTF-8 in document id".into()))?;
        Ok(Self(DocumentId::new(id)))
    }

    #[must_use]
    pub fn into_inner(self) -> DocumentId {
        self.0
    }

    #[must_use]
    pub fn id(&self) -> &DocumentId {
        &self.0
    }
}

impl From<&DocumentId> for IdKey {
    fn from(id: &DocumentId) -> Self {
        Self::new(id)
    }
}

/// The flag field of one document as stored in the `docs` tree
///
/// `None` is the absent field (document never flagged), `Some(vec![])` the
/// cleared set. Both states round-trip through the tree value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagField(Option<Vec<String>>);

impl FlagField {
    #[must_use]
    pub const fn new(flags: Option<Vec<String>>) -> Self {
        Self(flags)
    }

    #[must_use]
    pub const fn absent() -> Self {
        Self(None)
    }

    /// # Errors
    ///
    /// Returns `StoreError` if bincode encoding fails.
    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        Ok(bincode::encode_to_vec(&self.0, bincode::config::standard())?)
    }

    /// # Errors
    ///
    /// Returns `StoreError` if the bytes cannot be decoded.
    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        let (flags, _): (Option<Vec<String>>, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(Self(flags))
    }

    #[must_use]
    pub fn into_inner(self) -> Option<Vec<String>> {
        self.0
    }

    #[must_use]
    pub const fn as_ref(&self) -> Option<&Vec<String>> {
        self.0.as_ref()
    }

    /// True when the field is present, even if empty
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.0.is_some()
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
