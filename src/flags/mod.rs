//! Per-document flag set operations
//!
//! The [`Flaggable`] trait is the capability a document type implements to
//! opt into flag support: expose an identity and the optional flag field,
//! and every set operation arrives as a provided method. All mutation here
//! is purely in-memory; only the `*_and_save` variants touch the store.
//!
//! Flag values are normalized to their string form at this boundary, so any
//! label-like value (string slice, owned string, number) is accepted. The
//! membership checks accept one collection of labels, letting callers pass
//! either an inline array or a pre-built `Vec` interchangeably.

use crate::store::{FlagStore, StoreError};
use crate::DocumentId;
use std::collections::HashSet;

/// Normalize a label-like value to its canonical string form
///
/// Every flag entering the library passes through here before storage or
/// comparison; internal code only ever sees the normalized form.
pub fn normalize<F: ToString>(flag: F) -> String {
    flag.to_string()
}

/// Normalize a collection of label-like values, preserving order
pub fn normalize_all<I>(flags: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: ToString,
{
    flags.into_iter().map(normalize).collect()
}

/// Capability trait granting flag-set operations to a document type
///
/// Implementors provide the identity and flag-field accessors; everything
/// else is a provided method. [`crate::Document`] is the stock implementor.
///
/// # Examples
/// ```
/// use flagr::{Document, Flaggable};
///
/// let mut doc = Document::new("doc-1");
/// assert!(doc.flags().is_empty());
///
/// doc.add_flag("urgent");
/// doc.add_flag("urgent");
/// assert_eq!(doc.flags(), ["urgent"]);
///
/// assert!(doc.any_flags(["urgent", "archived"]));
/// assert!(!doc.all_flags(["urgent", "archived"]));
/// ```
pub trait Flaggable {
    /// Identity of this document within its collection
    fn id(&self) -> &DocumentId;

    /// The raw optional flag field (`None` when never flagged)
    fn flag_field(&self) -> Option<&Vec<String>>;

    /// Mutable access to the raw flag field
    fn flag_field_mut(&mut self) -> &mut Option<Vec<String>>;

    /// Current flags, or an empty slice when the field is absent
    ///
    /// Never "null" from the caller's perspective.
    fn flags(&self) -> &[String] {
        match self.flag_field() {
            Some(flags) => flags,
            None => &[],
        }
    }

    /// Add a flag to the in-memory set
    ///
    /// Initializes an absent field, appends the normalized value and
    /// de-duplicates the sequence, so adding a present flag is a no-op with
    /// respect to final state.
    fn add_flag<F: ToString>(&mut self, flag: F) {
        let flag = normalize(flag);
        let field = self.flag_field_mut().get_or_insert_with(Vec::new);
        field.push(flag);

        let mut seen = HashSet::new();
        field.retain(|f| seen.insert(f.clone()));
    }

    /// Remove all occurrences of a flag from the in-memory set
    ///
    /// No-op when the field is absent or the value was never present.
    fn remove_flag<F: ToString>(&mut self, flag: F) {
        let flag = normalize(flag);
        if let Some(field) = self.flag_field_mut().as_mut() {
            field.retain(|f| f != &flag);
        }
    }

    /// Reset the flag set to empty
    ///
    /// The field is left present-but-empty, not absent.
    fn clear_flags(&mut self) {
        *self.flag_field_mut() = Some(Vec::new());
    }

    /// True iff every requested value is present in the flag set
    ///
    /// The request is normalized and de-duplicated first; an empty request
    /// is vacuously true.
    fn all_flags<I>(&self, flags: I) -> bool
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let mut wanted = normalize_all(flags);
        wanted.sort();
        wanted.dedup();
        wanted.iter().all(|f| self.flags().contains(f))
    }

    /// True iff at least one requested value is present in the flag set
    fn any_flags<I>(&self, flags: I) -> bool
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        flags
            .into_iter()
            .any(|f| self.flags().contains(&normalize(f)))
    }

    /// Single-value membership convenience
    fn has_flag<F: ToString>(&self, flag: F) -> bool {
        self.flags().contains(&normalize(flag))
    }

    /// Add a flag and immediately persist the document
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if persisting through the store fails.
    fn add_flag_and_save<F, S>(&mut self, store: &S, flag: F) -> Result<(), StoreError>
    where
        F: ToString,
        S: FlagStore,
        Self: Sized,
    {
        self.add_flag(flag);
        store.save(self)
    }

    /// Remove a flag and immediately persist the document
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if persisting through the store fails.
    fn remove_flag_and_save<F, S>(&mut self, store: &S, flag: F) -> Result<(), StoreError>
    where
        F: ToString,
        S: FlagStore,
        Self: Sized,
    {
        self.remove_flag(flag);
        store.save(self)
    }

    /// Clear all flags and immediately persist the document
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if persisting through the store fails.
    fn clear_flags_and_save<S>(&mut self, store: &S) -> Result<(), StoreError>
    where
        S: FlagStore,
        Self: Sized,
    {
        self.clear_flags();
        store.save(self)
    }
}
