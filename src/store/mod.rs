//! Embedded collection store for flagged documents
//!
//! Provides [`Collection`], a sled-backed store fulfilling the [`FlagStore`]
//! contract the flag components depend on.
//!
//! Uses multiple sled trees:
//! - `docs`: Main tree mapping document ids to their optional flag field
//! - `flags`: Sparse reverse index mapping flag values to document ids
//!
//! The reverse index only lists documents actually carrying a flag, so
//! documents whose field is absent or empty appear nowhere in it.
//!
//! Every flag update runs as a single transaction spanning both trees:
//! concurrent updates to the same document serialize instead of losing
//! writes, and the index can never drift from the documents.

use sled::transaction::{
    ConflictableTransactionError, TransactionError, Transactional, TransactionalTree,
};
use sled::{Db, Tree};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

use crate::aggregate::Stage;
use crate::flags::Flaggable;
use crate::{Document, DocumentId};

pub mod error;
pub mod traits;
pub mod types;

pub use error::StoreError;
pub use traits::{FlagStore, Predicate};
pub use types::{FlagField, IdKey};

/// Intermediate row shape while executing an aggregation pipeline
enum Rows {
    Docs(Vec<Document>),
    Fields(Vec<Option<Vec<String>>>),
    Values(Vec<String>),
    Groups(Vec<(String, u64)>),
}

impl Rows {
    const fn shape(&self) -> &'static str {
        match self {
            Self::Docs(_) => "documents",
            Self::Fields(_) => "flag fields",
            Self::Values(_) => "flag values",
            Self::Groups(_) => "groups",
        }
    }
}

/// Collection of flagged documents backed by an embedded database
///
/// Opening a collection declares the optional flag field (absent by default
/// on every document) and its sparse reverse index.
pub struct Collection {
    db: Db,
    docs: Tree,  // id -> flag field
    flags: Tree, // flag -> ids, sparse reverse index
}

impl Collection {
    /// Opens or creates a collection at the specified path
    ///
    /// # Examples
    /// ```no_run
    /// use flagr::Collection;
    /// let collection = Collection::open("my_collection").unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the database cannot be opened or if the
    /// internal trees cannot be created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(&path)?;
        let docs = db.open_tree("docs")?;
        let flags = db.open_tree("flags")?;

        debug!(path = %path.as_ref().display(), "opened collection");
        Ok(Self { db, docs, flags })
    }

    /// Insert a fresh document with an absent flag field
    ///
    /// Overwrites any previous flags carried under the same id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write or index maintenance fails.
    pub fn create(&self, id: impl Into<DocumentId>) -> Result<Document, StoreError> {
        let doc = Document::new(id);
        self.save(&doc)?;
        Ok(doc)
    }

    /// Check if a document exists in the collection
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read fails.
    pub fn contains(&self, id: &DocumentId) -> Result<bool, StoreError> {
        Ok(self.docs.contains_key(IdKey::new(id).as_bytes())?)
    }

    /// Number of documents in the collection
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// All documents in the collection, in id order
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if iteration or decoding fails.
    pub fn list_all(&self) -> Result<Vec<Document>, StoreError> {
        let mut documents = Vec::new();
        for result in &self.docs {
            let (key, value) = result?;
            let id = IdKey::from_bytes(&key)?.into_inner();
            let field = FlagField::decode(&value)?;
            documents.push(Document::with_flags(id, field.into_inner()));
        }
        Ok(documents)
    }

    /// Clear all documents and the flag index
    ///
    /// # Warning
    /// This operation is irreversible!
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if clearing either tree fails.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.docs.clear()?;
        self.flags.clear()?;
        Ok(())
    }

    /// Flush all pending writes to disk
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the flush operation fails.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    // Private helpers for the docs tree and the flag index

    fn read_flag_field(&self, id: &DocumentId) -> Result<Option<FlagField>, StoreError> {
        match self.docs.get(IdKey::new(id).as_bytes())? {
            Some(value) => Ok(Some(FlagField::decode(&value)?)),
            None => Ok(None),
        }
    }

    /// Atomically transform one document's flag field
    ///
    /// The read, the rewrite and the reverse-index maintenance all run in
    /// one transaction over both trees, so concurrent updates to the same
    /// document serialize rather than overwriting each other.
    ///
    /// Returns true when the stored state changed. A missing document is
    /// handed to `apply` as an absent field and written back, which is how
    /// fresh documents enter the collection.
    fn update_flag_field<F>(&self, id: &DocumentId, apply: F) -> Result<bool, StoreError>
    where
        F: Fn(Option<Vec<String>>) -> Option<Vec<String>>,
    {
        let key = IdKey::new(id);

        (&self.docs, &self.flags)
            .transaction(|(docs, flags)| {
                let (existed, old) = match docs.get(key.as_bytes())? {
                    Some(value) => (true, FlagField::decode(&value).map_err(abort)?.into_inner()),
                    None => (false, None),
                };

                let new = apply(old.clone());
                if existed && new == old {
                    return Ok(false);
                }

                let empty = Vec::new();
                let old_flags = old.as_ref().unwrap_or(&empty);
                let new_flags = new.as_ref().unwrap_or(&empty);

                for flag in old_flags {
                    if !new_flags.contains(flag) {
                        tx_remove_from_index(flags, id.as_str(), flag)?;
                    }
                }
                for flag in new_flags {
                    if !old_flags.contains(flag) {
                        tx_add_to_index(flags, id.as_str(), flag)?;
                    }
                }

                let value = FlagField::new(new).encode().map_err(abort)?;
                docs.insert(key.as_bytes(), value)?;
                Ok(true)
            })
            .map_err(|err| match err {
                TransactionError::Abort(err) => err,
                TransactionError::Storage(err) => StoreError::SledError(err),
            })
    }

    /// Ids currently listed under one flag in the reverse index
    fn index_ids(&self, flag: &str) -> Result<Vec<String>, StoreError> {
        match self.flags.get(flag.as_bytes())? {
            Some(value) => {
                let (ids, _): (Vec<String>, usize) =
                    bincode::decode_from_slice(&value, bincode::config::standard())?;
                Ok(ids)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Ids of documents whose flag set is a superset of `flags`
    ///
    /// Intersects the index entries of each requested value. An empty
    /// request matches nothing.
    fn find_all_flags(&self, flags: &[String]) -> Result<Vec<DocumentId>, StoreError> {
        if flags.is_empty() {
            return Ok(Vec::new());
        }

        let mut id_sets: Vec<HashSet<String>> = flags
            .iter()
            .map(|flag| self.index_ids(flag).map(|ids| ids.into_iter().collect()))
            .collect::<Result<_, _>>()?;

        let first_set = id_sets.remove(0);
        let result: Vec<DocumentId> = first_set
            .into_iter()
            .filter(|id| id_sets.iter().all(|set| set.contains(id)))
            .map(DocumentId::new)
            .collect();

        Ok(result)
    }

    /// Ids of documents carrying at least one of `flags`
    ///
    /// Union of the index entries of each requested value.
    fn find_any_flags(&self, flags: &[String]) -> Result<Vec<DocumentId>, StoreError> {
        let mut id_set = HashSet::new();
        for flag in flags {
            id_set.extend(self.index_ids(flag)?);
        }
        Ok(id_set.into_iter().map(DocumentId::new).collect())
    }

    /// Ids of documents whose flag field is present, even if empty
    fn find_flags_present(&self) -> Result<Vec<DocumentId>, StoreError> {
        let mut ids = Vec::new();
        for result in &self.docs {
            let (key, value) = result?;
            if FlagField::decode(&value)?.is_present() {
                ids.push(IdKey::from_bytes(&key)?.into_inner());
            }
        }
        Ok(ids)
    }
}

type TxResult<T> = Result<T, ConflictableTransactionError<StoreError>>;

fn abort(err: impl Into<StoreError>) -> ConflictableTransactionError<StoreError> {
    ConflictableTransactionError::Abort(err.into())
}

/// Ids listed under one flag, read inside a transaction
fn tx_index_ids(flags: &TransactionalTree, flag: &str) -> TxResult<Vec<String>> {
    match flags.get(flag.as_bytes())? {
        Some(value) => {
            let (ids, _): (Vec<String>, usize) =
                bincode::decode_from_slice(&value, bincode::config::standard()).map_err(abort)?;
            Ok(ids)
        }
        None => Ok(Vec::new()),
    }
}

/// Add a document id to a flag's index entry
///
/// Entries are created on first use; a document already listed under a
/// flag is not listed twice.
fn tx_add_to_index(flags: &TransactionalTree, id: &str, flag: &str) -> TxResult<()> {
    let mut ids = tx_index_ids(flags, flag)?;
    if !ids.contains(&id.to_string()) {
        ids.push(id.to_string());
    }

    let encoded =
        bincode::encode_to_vec(&ids, bincode::config::standard()).map_err(abort)?;
    flags.insert(flag.as_bytes(), encoded)?;
    Ok(())
}

/// Remove a document id from a flag's index entry
///
/// Entries left without any document are deleted, keeping the index
/// sparse.
fn tx_remove_from_index(flags: &TransactionalTree, id: &str, flag: &str) -> TxResult<()> {
    let mut ids = tx_index_ids(flags, flag)?;
    ids.retain(|i| i != id);

    if ids.is_empty() {
        flags.remove(flag.as_bytes())?;
    } else {
        let encoded =
            bincode::encode_to_vec(&ids, bincode::config::standard()).map_err(abort)?;
        flags.insert(flag.as_bytes(), encoded)?;
    }
    Ok(())
}

impl FlagStore for Collection {
    fn find(&self, predicate: &Predicate) -> Result<Vec<DocumentId>, StoreError> {
        match predicate {
            Predicate::All => {
                let mut ids = Vec::new();
                for result in &self.docs {
                    let (key, _) = result?;
                    ids.push(IdKey::from_bytes(&key)?.into_inner());
                }
                Ok(ids)
            }
            Predicate::HasFlag(flag) => {
                Ok(self.index_ids(flag)?.into_iter().map(DocumentId::new).collect())
            }
            Predicate::AllFlags(flags) => self.find_all_flags(flags),
            Predicate::AnyFlags(flags) => self.find_any_flags(flags),
            Predicate::FlagsPresent => self.find_flags_present(),
            Predicate::Ids(wanted) => {
                let mut ids = Vec::new();
                for id in wanted {
                    if self.contains(id)? {
                        ids.push(id.clone());
                    }
                }
                Ok(ids)
            }
        }
    }

    fn count(&self, predicate: &Predicate) -> Result<usize, StoreError> {
        match predicate {
            Predicate::All => Ok(self.len()),
            Predicate::HasFlag(flag) => Ok(self.index_ids(flag)?.len()),
            _ => Ok(self.find(predicate)?.len()),
        }
    }

    fn distinct_flags(&self) -> Result<Vec<String>, StoreError> {
        let mut values: Vec<String> = self
            .flags
            .iter()
            .keys()
            .map(|result| {
                let key = result?;
                String::from_utf8(key.to_vec())
                    .map_err(|_| StoreError::KeyError("Invalid UTF-8 in flag value".into()))
            })
            .collect::<Result<_, _>>()?;
        values.sort();
        Ok(values)
    }

    fn add_to_set(&self, predicate: &Predicate, flag: &str) -> Result<usize, StoreError> {
        let mut changed = 0;
        for id in self.find(predicate)? {
            let updated = self.update_flag_field(&id, |field| match field {
                None => Some(vec![flag.to_string()]),
                Some(flags) if flags.iter().any(|f| f == flag) => Some(flags),
                Some(mut flags) => {
                    flags.push(flag.to_string());
                    Some(flags)
                }
            })?;
            if updated {
                changed += 1;
            }
        }

        debug!(flag, changed, "bulk add to set");
        Ok(changed)
    }

    fn pull(&self, predicate: &Predicate, flag: &str) -> Result<usize, StoreError> {
        let mut changed = 0;
        for id in self.find(predicate)? {
            let updated = self.update_flag_field(&id, |field| {
                field.map(|mut flags| {
                    flags.retain(|f| f != flag);
                    flags
                })
            })?;
            if updated {
                changed += 1;
            }
        }

        debug!(flag, changed, "bulk pull");
        Ok(changed)
    }

    fn run_pipeline(&self, stages: &[Stage]) -> Result<Vec<(String, u64)>, StoreError> {
        let mut rows = Rows::Docs(self.list_all()?);

        for stage in stages {
            rows = match (stage, rows) {
                (Stage::Match(predicate), Rows::Docs(mut docs)) => {
                    docs.retain(|doc| predicate.matches(doc));
                    Rows::Docs(docs)
                }
                (Stage::Project, Rows::Docs(docs)) => {
                    Rows::Fields(docs.into_iter().map(|doc| doc.flags).collect())
                }
                (Stage::Unwind, Rows::Fields(fields)) => {
                    Rows::Values(fields.into_iter().flatten().flatten().collect())
                }
                (Stage::Unwind, Rows::Docs(docs)) => {
                    Rows::Values(docs.into_iter().filter_map(|doc| doc.flags).flatten().collect())
                }
                (Stage::Group, Rows::Values(values)) => {
                    let mut counts: HashMap<String, u64> = HashMap::new();
                    for value in values {
                        *counts.entry(value).or_insert(0) += 1;
                    }
                    Rows::Groups(counts.into_iter().collect())
                }
                (stage, rows) => {
                    return Err(StoreError::InvalidPipeline(format!(
                        "{stage:?} cannot run on {}",
                        rows.shape()
                    )))
                }
            };
        }

        match rows {
            Rows::Groups(groups) => Ok(groups),
            rows => Err(StoreError::InvalidPipeline(format!(
                "pipeline ended with {}, expected groups",
                rows.shape()
            ))),
        }
    }

    fn save<D: Flaggable>(&self, doc: &D) -> Result<(), StoreError> {
        let field = doc.flag_field().cloned();
        self.update_flag_field(doc.id(), |_| field.clone())?;
        Ok(())
    }

    fn load(&self, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        match self.read_flag_field(id)? {
            Some(field) => Ok(Some(Document::with_flags(id.clone(), field.into_inner()))),
            None => Ok(None),
        }
    }

    fn reload<D: Flaggable>(&self, doc: &mut D) -> Result<(), StoreError> {
        match self.read_flag_field(doc.id())? {
            Some(field) => {
                *doc.flag_field_mut() = field.into_inner();
                Ok(())
            }
            None => Err(StoreError::DocumentNotFound(doc.id().to_string())),
        }
    }
}

impl Drop for Collection {
    fn drop(&mut self) {
        // Best-effort flush on drop. Errors are ignored since we can't
        // propagate them from Drop. Callers should explicitly flush()
        // if they need guaranteed durability.
        let _ = self.db.flush();
    }
}
