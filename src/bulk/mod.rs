//! Collection-level flag mutation
//!
//! Applies a flag add or remove to every document matching a predicate, at
//! the store level, without materializing documents. `None` for the
//! predicate means "match all documents". Both operations are idempotent
//! and return the number of documents whose flag set actually changed.

use crate::flags::normalize;
use crate::store::{FlagStore, Predicate, StoreError};

/// Add a flag to every document matching the predicate
///
/// Set-union semantics: documents already carrying the flag are untouched.
///
/// # Errors
///
/// Returns `StoreError` if the store update fails.
pub fn bulk_add_flag<S, F>(
    store: &S,
    flag: F,
    predicate: Option<&Predicate>,
) -> Result<usize, StoreError>
where
    S: FlagStore,
    F: ToString,
{
    let flag = normalize(flag);
    store.add_to_set(predicate.unwrap_or(&Predicate::All), &flag)
}

/// Remove all occurrences of a flag from every document matching the
/// predicate
///
/// Set-difference semantics: documents without the flag are untouched, and
/// a document's flag field is never dropped, only emptied.
///
/// # Errors
///
/// Returns `StoreError` if the store update fails.
pub fn bulk_remove_flag<S, F>(
    store: &S,
    flag: F,
    predicate: Option<&Predicate>,
) -> Result<usize, StoreError>
where
    S: FlagStore,
    F: ToString,
{
    let flag = normalize(flag);
    store.pull(predicate.unwrap_or(&Predicate::All), &flag)
}
