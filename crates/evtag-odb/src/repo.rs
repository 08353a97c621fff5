use std::path::{Path, PathBuf};

use bstr::{BStr, ByteSlice};
use evtag_hash::{HashAlgorithm, HashError, NativeHasher, ObjectId};
use evtag_object::{ObjectKind, RawObject, Tag};
use evtag_utils::ToolCommand;

use crate::batch::BatchReader;
use crate::discover::{self, DiscoveredRepo};
use crate::loose::LooseStore;
use crate::{expect_kind, Loaded, ObjectReader, StoreError, SubmoduleLink};

/// A repository on disk.
///
/// Loose objects are inflated directly; anything else (packs, alternates)
/// goes through a `git cat-file --batch` child. With `verify_ids` on, every
/// object read is rehashed and must reproduce the id it was requested by.
pub struct GitStore {
    repo: DiscoveredRepo,
    hash_algo: HashAlgorithm,
    loose: LooseStore,
    batch: BatchReader,
    verify_ids: bool,
}

impl GitStore {
    /// Discover the repository containing `start` and open it.
    pub fn discover(start: &Path) -> Result<Self, StoreError> {
        Self::open(discover::discover(start)?)
    }

    pub fn open(repo: DiscoveredRepo) -> Result<Self, StoreError> {
        let hash_algo = object_format(&repo.git_dir)?;
        tracing::debug!(
            git_dir = %repo.git_dir.display(),
            object_format = %hash_algo,
            "opened repository"
        );
        Ok(Self {
            loose: LooseStore::open(repo.objects_dir(), hash_algo),
            batch: BatchReader::new(&repo.git_dir),
            hash_algo,
            repo,
            verify_ids: true,
        })
    }

    /// Rehash objects on read. On by default.
    pub fn set_verify_ids(&mut self, verify: bool) {
        self.verify_ids = verify;
    }

    pub fn git_dir(&self) -> &Path {
        &self.repo.git_dir
    }

    pub fn work_tree(&self) -> Option<&Path> {
        self.repo.work_tree.as_deref()
    }

    /// Resolve a revision to the id it names, without peeling.
    pub fn resolve(&self, rev: &str) -> Result<ObjectId, StoreError> {
        self.batch
            .query(rev)?
            .map(|(id, _)| id)
            .ok_or_else(|| StoreError::RevisionNotFound(rev.to_string()))
    }

    /// Resolve a revision, peeling tags, to a commit id.
    pub fn resolve_commit(&self, rev: &str) -> Result<ObjectId, StoreError> {
        self.resolve(&format!("{rev}^{{commit}}"))
    }

    pub fn head(&self) -> Result<ObjectId, StoreError> {
        self.resolve_commit("HEAD")
    }

    /// Read the annotated tag `refs/tags/<name>`.
    pub fn read_tag(&self, name: &str) -> Result<Loaded<Tag>, StoreError> {
        let spec = format!("refs/tags/{name}");
        let (id, raw) = self
            .batch
            .query(&spec)?
            .ok_or(StoreError::RevisionNotFound(spec))?;
        expect_kind(&id, &raw, ObjectKind::Tag)?;
        self.check_id(&id, &raw)?;
        let object = Tag::parse(&raw.data).map_err(|e| StoreError::Corrupt {
            id,
            reason: e.to_string(),
        })?;
        Ok(Loaded { object, raw })
    }

    fn check_id(&self, id: &ObjectId, raw: &RawObject) -> Result<(), StoreError> {
        if !self.verify_ids {
            return Ok(());
        }
        let actual = NativeHasher::object_id(id.algorithm(), raw.kind.name(), &raw.data)
            .map_err(|e| match e {
                HashError::Sha1Collision => StoreError::Sha1Collision(*id),
                other => StoreError::Hash(other),
            })?;
        if actual != *id {
            return Err(StoreError::IdMismatch {
                expected: *id,
                actual,
            });
        }
        Ok(())
    }

    fn submodule_dir(&self, path: &BStr) -> Result<PathBuf, StoreError> {
        let work_tree = self.work_tree().ok_or_else(|| StoreError::SubmoduleOpen {
            path: path.to_owned(),
            reason: "bare repository has no submodule checkouts".into(),
        })?;
        let rel = path.to_path().map_err(|e| StoreError::SubmoduleOpen {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(work_tree.join(rel))
    }
}

impl ObjectReader for GitStore {
    fn hash_algo(&self) -> HashAlgorithm {
        self.hash_algo
    }

    fn read_object(&self, id: &ObjectId) -> Result<RawObject, StoreError> {
        let raw = match self.loose.read(id)? {
            Some(raw) => raw,
            None => self.batch.read(id)?.ok_or(StoreError::NotFound(*id))?,
        };
        self.check_id(id, &raw)?;
        Ok(raw)
    }

    fn resolve_submodule(
        &self,
        path: &BStr,
        recorded_id: &ObjectId,
    ) -> Result<SubmoduleLink, StoreError> {
        let dir = self.submodule_dir(path)?;
        let open_failed = |e: StoreError| StoreError::SubmoduleOpen {
            path: path.to_owned(),
            reason: e.to_string(),
        };
        let sub = discover::open_from_work_tree(&dir).map_err(open_failed)?;
        let head = ToolCommand::git(&sub.git_dir)
            .args(["rev-parse", "--verify", "HEAD^{commit}"])
            .run_checked()
            .map_err(|e| open_failed(e.into()))?;
        let working_commit_id = ObjectId::from_hex(&head.stdout_trimmed())
            .map_err(|e| open_failed(e.into()))?;

        Ok(SubmoduleLink {
            path: path.to_owned(),
            recorded_id: *recorded_id,
            working_commit_id,
            work_tree: Some(dir),
        })
    }

    fn open_substore(
        &self,
        link: &SubmoduleLink,
    ) -> Result<Box<dyn ObjectReader + '_>, StoreError> {
        let open_failed = |e: StoreError| StoreError::SubmoduleOpen {
            path: link.path.clone(),
            reason: e.to_string(),
        };
        let dir = match &link.work_tree {
            Some(dir) => dir.clone(),
            None => self.submodule_dir(link.path.as_bstr())?,
        };
        let sub = discover::open_from_work_tree(&dir).map_err(open_failed)?;
        let mut store = GitStore::open(sub).map_err(open_failed)?;
        store.set_verify_ids(self.verify_ids);
        Ok(Box::new(store))
    }
}

/// Native id format from `extensions.objectFormat`; SHA-1 when unset.
fn object_format(git_dir: &Path) -> Result<HashAlgorithm, StoreError> {
    let out = ToolCommand::git(git_dir)
        .args(["config", "--get", "extensions.objectFormat"])
        .run()?;
    if !out.success() {
        return Ok(HashAlgorithm::Sha1);
    }
    Ok(HashAlgorithm::from_name(&out.stdout_trimmed())?)
}
