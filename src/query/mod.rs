//! Collection-level selection by flag membership
//!
//! Translates flag-selection requests into store predicates and runs them.
//! The pure builders [`all_of`] and [`any_of`] are also exposed for callers
//! composing predicates without touching the store, typically to feed the
//! bulk mutation functions.

use crate::flags::normalize_all;
use crate::store::{FlagStore, Predicate, StoreError};
use crate::DocumentId;

/// Predicate matching documents whose flag set is a superset of `flags`
pub fn all_of<I>(flags: I) -> Predicate
where
    I: IntoIterator,
    I::Item: ToString,
{
    Predicate::AllFlags(normalize_all(flags))
}

/// Predicate matching documents whose flag set intersects `flags`
pub fn any_of<I>(flags: I) -> Predicate
where
    I: IntoIterator,
    I::Item: ToString,
{
    Predicate::AnyFlags(normalize_all(flags))
}

/// Ids of documents carrying every requested flag
///
/// # Errors
///
/// Returns `StoreError` if the store query fails.
pub fn by_all_flags<S, I>(store: &S, flags: I) -> Result<Vec<DocumentId>, StoreError>
where
    S: FlagStore,
    I: IntoIterator,
    I::Item: ToString,
{
    store.find(&all_of(flags))
}

/// Ids of documents carrying at least one requested flag
///
/// # Errors
///
/// Returns `StoreError` if the store query fails.
pub fn by_any_flags<S, I>(store: &S, flags: I) -> Result<Vec<DocumentId>, StoreError>
where
    S: FlagStore,
    I: IntoIterator,
    I::Item: ToString,
{
    store.find(&any_of(flags))
}

/// Number of documents carrying every requested flag
///
/// A single requested value uses the direct membership predicate, which the
/// store answers straight from its flag index; several values delegate to
/// the all-of predicate. Both paths agree on the count.
///
/// # Errors
///
/// Returns `StoreError` if the store query fails.
pub fn flag_count<S, I>(store: &S, flags: I) -> Result<usize, StoreError>
where
    S: FlagStore,
    I: IntoIterator,
    I::Item: ToString,
{
    let mut flags = normalize_all(flags);
    if flags.len() == 1 {
        let flag = flags.remove(0);
        store.count(&Predicate::HasFlag(flag))
    } else {
        store.count(&Predicate::AllFlags(flags))
    }
}

/// Every distinct flag value present anywhere in the collection
///
/// No ordering guarantee beyond what the store imposes.
///
/// # Errors
///
/// Returns `StoreError` if the store query fails.
pub fn distinct_flags<S: FlagStore>(store: &S) -> Result<Vec<String>, StoreError> {
    store.distinct_flags()
}
