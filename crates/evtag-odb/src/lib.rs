//! Read-only access to content-addressed object stores.
//!
//! [`ObjectReader`] is the narrow interface the digest engine consumes. It is
//! implemented by [`MemoryStore`] (tests and synthetic snapshots) and by
//! [`GitStore`], which reads a repository on disk through loose objects and a
//! `git cat-file --batch` child for everything packed.

pub mod batch;
pub mod discover;
pub mod loose;
pub mod memory;
pub mod repo;

use std::path::PathBuf;

use bstr::{BStr, BString};
use evtag_hash::{HashAlgorithm, HashError, ObjectId};
use evtag_object::{Commit, ObjectKind, RawObject, Tree};

pub use batch::BatchReader;
pub use discover::DiscoveredRepo;
pub use loose::LooseStore;
pub use memory::MemoryStore;
pub use repo::GitStore;

/// Errors from object store access.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    #[error("revision not found: {0}")]
    RevisionNotFound(String),

    #[error("object {id} is a {actual}, expected a {expected}")]
    UnexpectedKind {
        id: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    #[error("corrupt object {id}: {reason}")]
    Corrupt { id: ObjectId, reason: String },

    #[error("object {expected} hashes to {actual}")]
    IdMismatch { expected: ObjectId, actual: ObjectId },

    #[error("SHA-1 collision attack detected in object {0}")]
    Sha1Collision(ObjectId),

    #[error("cannot open submodule '{path}': {reason}")]
    SubmoduleOpen { path: BString, reason: String },

    #[error("not a git repository: {path}: {reason}")]
    Repository { path: PathBuf, reason: String },

    #[error("cat-file protocol error: {0}")]
    Batch(String),

    #[error(transparent)]
    Util(#[from] evtag_utils::UtilError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A parsed object together with the raw bytes it was parsed from.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub object: T,
    pub raw: RawObject,
}

/// A gitlink entry resolved to the checkout that backs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmoduleLink {
    /// Path of the entry relative to the parent store's root tree.
    pub path: BString,
    /// Commit id recorded in the parent tree.
    pub recorded_id: ObjectId,
    /// `HEAD` of the submodule's own checkout.
    pub working_commit_id: ObjectId,
    /// Checkout directory, when the submodule lives on disk.
    pub work_tree: Option<PathBuf>,
}

impl SubmoduleLink {
    /// Whether the checkout is at the commit the parent tree records.
    pub fn is_at_recorded_commit(&self) -> bool {
        self.recorded_id == self.working_commit_id
    }
}

/// Read interface over one object store.
///
/// `read_commit` and `read_tree` are provided in terms of `read_object`;
/// implementations may override them, and the digest engine always goes
/// through them so the reported entry order is the reader's to decide.
pub trait ObjectReader {
    /// Native id algorithm of this store.
    fn hash_algo(&self) -> HashAlgorithm;

    /// Read one object. Fails with [`StoreError::NotFound`] if absent.
    fn read_object(&self, id: &ObjectId) -> Result<RawObject, StoreError>;

    /// Read and parse a commit. Fails with [`StoreError::UnexpectedKind`]
    /// if `id` names something else.
    fn read_commit(&self, id: &ObjectId) -> Result<Loaded<Commit>, StoreError> {
        let raw = self.read_object(id)?;
        expect_kind(id, &raw, ObjectKind::Commit)?;
        let object = Commit::parse(&raw.data).map_err(|e| corrupt(id, e))?;
        Ok(Loaded { object, raw })
    }

    /// Read and parse a tree; entries come back in the store's order.
    fn read_tree(&self, id: &ObjectId) -> Result<Loaded<Tree>, StoreError> {
        let raw = self.read_object(id)?;
        expect_kind(id, &raw, ObjectKind::Tree)?;
        let object = Tree::parse(&raw.data, self.hash_algo()).map_err(|e| corrupt(id, e))?;
        Ok(Loaded { object, raw })
    }

    /// Resolve the gitlink at `path` (recording `recorded_id`) to its checkout.
    fn resolve_submodule(
        &self,
        path: &BStr,
        recorded_id: &ObjectId,
    ) -> Result<SubmoduleLink, StoreError>;

    /// Open the submodule's own store, bound to its current checkout.
    fn open_substore(&self, link: &SubmoduleLink)
        -> Result<Box<dyn ObjectReader + '_>, StoreError>;
}

impl<T: ObjectReader + ?Sized> ObjectReader for &T {
    fn hash_algo(&self) -> HashAlgorithm {
        (**self).hash_algo()
    }

    fn read_object(&self, id: &ObjectId) -> Result<RawObject, StoreError> {
        (**self).read_object(id)
    }

    fn read_commit(&self, id: &ObjectId) -> Result<Loaded<Commit>, StoreError> {
        (**self).read_commit(id)
    }

    fn read_tree(&self, id: &ObjectId) -> Result<Loaded<Tree>, StoreError> {
        (**self).read_tree(id)
    }

    fn resolve_submodule(
        &self,
        path: &BStr,
        recorded_id: &ObjectId,
    ) -> Result<SubmoduleLink, StoreError> {
        (**self).resolve_submodule(path, recorded_id)
    }

    fn open_substore(
        &self,
        link: &SubmoduleLink,
    ) -> Result<Box<dyn ObjectReader + '_>, StoreError> {
        (**self).open_substore(link)
    }
}

/// Fail unless `raw` is of the `expected` kind.
pub fn expect_kind(id: &ObjectId, raw: &RawObject, expected: ObjectKind) -> Result<(), StoreError> {
    if raw.kind != expected {
        return Err(StoreError::UnexpectedKind {
            id: *id,
            expected,
            actual: raw.kind,
        });
    }
    Ok(())
}

fn corrupt(id: &ObjectId, err: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt {
        id: *id,
        reason: err.to_string(),
    }
}
