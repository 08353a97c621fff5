//! The canonical traversal.
//!
//! Pre-order, depth-first: a commit, its root tree, then each entry of each
//! tree in the order the store reports them. Subtrees are absorbed where
//! they appear and descended into immediately; submodule links descend into
//! the submodule's own store at the same point. Nothing is deduplicated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bstr::{BStr, BString, ByteSlice, ByteVec};
use evtag_hash::ObjectId;
use evtag_object::ObjectKind;
use evtag_odb::{expect_kind, ObjectReader, StoreError};

use crate::accumulator::{Computed, DigestState};
use crate::{DigestFormat, EngineError};

/// Drives one [`DigestState`] over everything reachable from a commit.
pub struct Walker<'a> {
    store: &'a dyn ObjectReader,
    format: DigestFormat,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> Walker<'a> {
    pub fn new(store: &'a dyn ObjectReader, format: DigestFormat) -> Self {
        Self {
            store,
            format,
            cancel: None,
        }
    }

    /// Abort the walk once `flag` is set. Checked before each object read.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Walk from `commit` and finalize. A failure anywhere discards the
    /// partial state.
    pub fn digest(&self, commit: &ObjectId) -> Result<Computed, EngineError> {
        if !self.format.is_walked() {
            return Err(EngineError::NotWalkable(self.format));
        }

        let mut state = DigestState::new(self.format);
        self.walk_commit(self.store, commit, BStr::new(""), &mut state)?;
        let computed = state.finalize();
        tracing::info!(
            commit = %commit,
            format = %self.format,
            digest = %computed.result.hex,
            submodules = computed.stats.n_submodules,
            objects = computed.stats.total_objects(),
            bytes = computed.stats.total_bytes(),
            "computed digest"
        );
        Ok(computed)
    }

    fn check_cancelled(&self) -> Result<(), EngineError> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(EngineError::Cancelled),
            _ => Ok(()),
        }
    }

    /// `outer` is the path of the current store inside the top-level
    /// checkout; empty for the top-level store itself.
    fn walk_commit(
        &self,
        store: &dyn ObjectReader,
        id: &ObjectId,
        outer: &BStr,
        state: &mut DigestState,
    ) -> Result<(), EngineError> {
        self.check_cancelled()?;
        let commit = store.read_commit(id)?;
        tracing::trace!(%id, kind = "commit", size = commit.raw.size(), "absorb");
        state.absorb(&commit.raw)?;
        self.walk_tree(store, &commit.object.tree, BStr::new(""), outer, state)
    }

    fn walk_tree(
        &self,
        store: &dyn ObjectReader,
        id: &ObjectId,
        dir: &BStr,
        outer: &BStr,
        state: &mut DigestState,
    ) -> Result<(), EngineError> {
        self.check_cancelled()?;
        let tree = store.read_tree(id)?;
        tracing::trace!(%id, kind = "tree", size = tree.raw.size(), path = %dir, "absorb");
        state.absorb(&tree.raw)?;

        for entry in tree.object.iter() {
            let path = join(dir, entry.name.as_bstr());
            match entry.kind() {
                ObjectKind::Blob => {
                    self.check_cancelled()?;
                    let raw = store.read_object(&entry.id)?;
                    if raw.kind == ObjectKind::Tag {
                        return Err(EngineError::UnexpectedObjectKind(ObjectKind::Tag));
                    }
                    expect_kind(&entry.id, &raw, ObjectKind::Blob)?;
                    tracing::trace!(id = %entry.id, kind = %raw.kind, size = raw.size(), path = %path, "absorb");
                    state.absorb(&raw)?;
                }
                ObjectKind::Tree => self.walk_tree(store, &entry.id, path.as_bstr(), outer, state)?,
                ObjectKind::Commit => {
                    state.note_submodule();
                    self.walk_submodule(store, path.as_bstr(), &entry.id, outer, state)?;
                }
                ObjectKind::Tag => return Err(EngineError::UnexpectedObjectKind(ObjectKind::Tag)),
            }
        }
        Ok(())
    }

    fn walk_submodule(
        &self,
        store: &dyn ObjectReader,
        path: &BStr,
        recorded_id: &ObjectId,
        outer: &BStr,
        state: &mut DigestState,
    ) -> Result<(), EngineError> {
        let full_path = join(outer, path);
        let open_failed = |e: StoreError| match e {
            StoreError::SubmoduleOpen { reason, .. } => EngineError::SubmoduleOpenFailure {
                path: full_path.clone(),
                reason,
            },
            other => other.into(),
        };

        let link = store.resolve_submodule(path, recorded_id).map_err(open_failed)?;
        if !link.is_at_recorded_commit() {
            tracing::warn!(
                path = %full_path,
                recorded = %link.recorded_id,
                checkout = %link.working_commit_id,
                "submodule checkout differs from recorded commit; hashing the checkout"
            );
        }
        let substore = store.open_substore(&link).map_err(open_failed)?;
        tracing::debug!(path = %full_path, commit = %link.working_commit_id, "descending into submodule");
        self.walk_commit(&*substore, &link.working_commit_id, full_path.as_bstr(), state)
    }
}

fn join(dir: &BStr, name: &BStr) -> BString {
    if dir.is_empty() {
        return name.to_owned();
    }
    let mut path = dir.to_owned();
    path.push_byte(b'/');
    path.push_str(name);
    path
}
