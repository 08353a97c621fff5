//! An in-memory object store.

use std::collections::HashMap;

use bstr::{BStr, BString, ByteSlice};
use evtag_hash::{HashAlgorithm, NativeHasher, ObjectId};
use evtag_object::{Commit, ObjectKind, RawObject, Tree};

use crate::{ObjectReader, StoreError, SubmoduleLink};

/// Identity written into commits built by [`MemoryStore::insert_commit`].
pub const FIXED_IDENT: &str = "Test Author <test@example.com> 1234567890 +0000";

struct Submodule {
    store: MemoryStore,
    head: ObjectId,
}

/// Content-addressed store held in a `HashMap`.
///
/// Ids are computed exactly as git computes them, so a snapshot built here
/// hashes the same as one written by git. Submodules are nested stores
/// registered by path, each with its own checked-out `HEAD`.
pub struct MemoryStore {
    algo: HashAlgorithm,
    objects: HashMap<ObjectId, RawObject>,
    submodules: HashMap<BString, Submodule>,
}

impl MemoryStore {
    pub fn new(algo: HashAlgorithm) -> Self {
        Self {
            algo,
            objects: HashMap::new(),
            submodules: HashMap::new(),
        }
    }

    /// Store `data` as an object of `kind` and return its native id.
    pub fn insert(&mut self, kind: ObjectKind, data: impl Into<Vec<u8>>) -> Result<ObjectId, StoreError> {
        let raw = RawObject::new(kind, data);
        let id = NativeHasher::object_id(self.algo, kind.name(), &raw.data)?;
        self.objects.insert(id, raw);
        Ok(id)
    }

    pub fn insert_blob(&mut self, data: impl Into<Vec<u8>>) -> Result<ObjectId, StoreError> {
        self.insert(ObjectKind::Blob, data)
    }

    /// Store a tree with its entries in the given order.
    pub fn insert_tree(&mut self, tree: &Tree) -> Result<ObjectId, StoreError> {
        self.insert(ObjectKind::Tree, tree.serialize())
    }

    /// Store a commit of `tree` with a fixed author, committer and date.
    pub fn insert_commit(
        &mut self,
        tree: &ObjectId,
        parents: &[ObjectId],
        message: &str,
    ) -> Result<ObjectId, StoreError> {
        self.insert(ObjectKind::Commit, Commit::build(tree, parents, FIXED_IDENT, message))
    }

    /// Register `store` as the checkout of the gitlink at `path`.
    pub fn add_submodule(&mut self, path: impl Into<BString>, store: MemoryStore, head: ObjectId) {
        self.submodules.insert(path.into(), Submodule { store, head });
    }

    /// Mutable access to a registered submodule's store.
    pub fn submodule_mut(&mut self, path: &BStr) -> Option<&mut MemoryStore> {
        self.submodules.get_mut(path).map(|s| &mut s.store)
    }

    /// Drop an object, to simulate a damaged store.
    pub fn remove(&mut self, id: &ObjectId) -> Option<RawObject> {
        self.objects.remove(id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectReader for MemoryStore {
    fn hash_algo(&self) -> HashAlgorithm {
        self.algo
    }

    fn read_object(&self, id: &ObjectId) -> Result<RawObject, StoreError> {
        self.objects.get(id).cloned().ok_or(StoreError::NotFound(*id))
    }

    fn resolve_submodule(
        &self,
        path: &BStr,
        recorded_id: &ObjectId,
    ) -> Result<SubmoduleLink, StoreError> {
        let sub = self
            .submodules
            .get(path)
            .ok_or_else(|| StoreError::SubmoduleOpen {
                path: path.to_owned(),
                reason: "no checkout registered at this path".into(),
            })?;
        Ok(SubmoduleLink {
            path: path.to_owned(),
            recorded_id: *recorded_id,
            working_commit_id: sub.head,
            work_tree: None,
        })
    }

    fn open_substore(
        &self,
        link: &SubmoduleLink,
    ) -> Result<Box<dyn ObjectReader + '_>, StoreError> {
        let sub = self
            .submodules
            .get(link.path.as_bstr())
            .ok_or_else(|| StoreError::SubmoduleOpen {
                path: link.path.clone(),
                reason: "no checkout registered at this path".into(),
            })?;
        Ok(Box::new(&sub.store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evtag_object::{FileMode, TreeEntry};

    #[test]
    fn ids_match_git() {
        let mut store = MemoryStore::new(HashAlgorithm::Sha1);
        let blob = store.insert_blob(b"hello\n".to_vec()).unwrap();
        assert_eq!(blob.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");
        let empty_tree = store.insert_tree(&Tree::default()).unwrap();
        assert_eq!(empty_tree.to_hex(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
    }

    #[test]
    fn read_back_and_missing() {
        let mut store = MemoryStore::new(HashAlgorithm::Sha1);
        let id = store.insert_blob(b"data".to_vec()).unwrap();
        assert_eq!(store.read_object(&id).unwrap().data, b"data");
        store.remove(&id);
        assert!(matches!(store.read_object(&id), Err(StoreError::NotFound(missing)) if missing == id));
    }

    #[test]
    fn read_commit_rejects_blob() {
        let mut store = MemoryStore::new(HashAlgorithm::Sha1);
        let id = store.insert_blob(b"not a commit".to_vec()).unwrap();
        assert!(matches!(
            store.read_commit(&id),
            Err(StoreError::UnexpectedKind {
                expected: ObjectKind::Commit,
                actual: ObjectKind::Blob,
                ..
            })
        ));
    }

    #[test]
    fn read_tree_keeps_inserted_order() {
        let mut store = MemoryStore::new(HashAlgorithm::Sha1);
        let blob = store.insert_blob(b"x".to_vec()).unwrap();
        let tree = Tree::new(vec![
            TreeEntry::new(FileMode::Regular, "b", blob),
            TreeEntry::new(FileMode::Regular, "a", blob),
        ]);
        let id = store.insert_tree(&tree).unwrap();
        let loaded = store.read_tree(&id).unwrap();
        assert_eq!(loaded.object, tree);
        assert_eq!(loaded.raw.kind, ObjectKind::Tree);
    }

    #[test]
    fn submodule_resolution() {
        let mut sub = MemoryStore::new(HashAlgorithm::Sha1);
        let sub_tree = sub.insert_tree(&Tree::default()).unwrap();
        let sub_head = sub.insert_commit(&sub_tree, &[], "sub\n").unwrap();

        let mut store = MemoryStore::new(HashAlgorithm::Sha1);
        store.add_submodule("lib", sub, sub_head);

        let link = store.resolve_submodule(BStr::new("lib"), &sub_head).unwrap();
        assert!(link.is_at_recorded_commit());
        let substore = store.open_substore(&link).unwrap();
        assert!(substore.read_commit(&sub_head).is_ok());

        assert!(matches!(
            store.resolve_submodule(BStr::new("other"), &sub_head),
            Err(StoreError::SubmoduleOpen { .. })
        ));
    }
}
