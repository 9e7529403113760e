//! Flag frequency aggregation
//!
//! Computes how many documents carry each flag value. The work is expressed
//! as a pipeline of [`Stage`]s the store executes (filter, project, unwind,
//! group); the sort by descending count happens here, after the store
//! returns its unordered groups.

use crate::store::{FlagStore, Predicate, StoreError};

/// One stage of a store aggregation pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Keep only documents matching the predicate
    Match(Predicate),
    /// Reduce each document to its flag field
    Project,
    /// Explode each flag array into one row per value; absent fields and
    /// empty arrays contribute nothing
    Unwind,
    /// Group rows by flag value, counting rows per value
    Group,
}

/// The stock frequency pipeline: match present fields, project, unwind, group
#[must_use]
pub fn frequency_pipeline() -> Vec<Stage> {
    vec![
        Stage::Match(Predicate::FlagsPresent),
        Stage::Project,
        Stage::Unwind,
        Stage::Group,
    ]
}

/// Mapping from flag value to document count, ordered by descending count
///
/// Iteration order reflects the sort; flags tied on count keep no defined
/// relative order. An empty collection yields an empty mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagFrequency(Vec<(String, u64)>);

impl FlagFrequency {
    /// Build from groups already sorted by descending count
    #[must_use]
    pub const fn from_sorted(groups: Vec<(String, u64)>) -> Self {
        Self(groups)
    }

    /// Count for one flag value, `None` when the flag occurs nowhere
    #[must_use]
    pub fn get(&self, flag: &str) -> Option<u64> {
        self.0
            .iter()
            .find(|(value, _)| value == flag)
            .map(|&(_, count)| count)
    }

    /// Iterate (flag value, count) pairs in descending-count order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(value, count)| (value.as_str(), *count))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<(String, u64)> {
        self.0
    }
}

impl IntoIterator for FlagFrequency {
    type Item = (String, u64);
    type IntoIter = std::vec::IntoIter<(String, u64)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Compute how many documents carry each flag value across the collection
///
/// Runs the [`frequency_pipeline`] through the store, then orders groups by
/// count descending.
///
/// # Errors
///
/// Returns `StoreError` if the store fails to execute the pipeline.
pub fn flag_frequency<S: FlagStore>(store: &S) -> Result<FlagFrequency, StoreError> {
    let mut groups = store.run_pipeline(&frequency_pipeline())?;
    groups.sort_by(|a, b| b.1.cmp(&a.1));

    tracing::debug!(distinct = groups.len(), "computed flag frequency");
    Ok(FlagFrequency::from_sorted(groups))
}
