use std::cmp::Ordering;

use bstr::{BStr, BString, ByteSlice};
use evtag_hash::{HashAlgorithm, ObjectId};

use crate::{ObjectError, ObjectKind};

/// Mode of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileMode {
    /// 100644
    Regular,
    /// 100755
    Executable,
    /// 120000
    Symlink,
    /// 160000, a submodule link
    Gitlink,
    /// 40000
    Tree,
    /// Anything else, kept verbatim.
    Unknown(u32),
}

impl FileMode {
    /// Parse from octal ASCII (`b"100644"`).
    pub fn from_bytes(s: &[u8]) -> Result<Self, ObjectError> {
        parse_octal(s)
            .map(Self::from_raw)
            .ok_or_else(|| ObjectError::InvalidFileMode(s.to_str_lossy().into_owned()))
    }

    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0o100644 => Self::Regular,
            0o100755 => Self::Executable,
            0o120000 => Self::Symlink,
            0o160000 => Self::Gitlink,
            0o040000 => Self::Tree,
            other => Self::Unknown(other),
        }
    }

    pub fn raw(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Gitlink => 0o160000,
            Self::Tree => 0o40000,
            Self::Unknown(v) => *v,
        }
    }

    /// Kind of object the entry points at. Symlinks are blobs; gitlinks name
    /// a commit in another store.
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Tree => ObjectKind::Tree,
            Self::Gitlink => ObjectKind::Commit,
            _ => ObjectKind::Blob,
        }
    }
}

fn parse_octal(s: &[u8]) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    s.iter().try_fold(0u32, |acc, &b| {
        if !(b'0'..=b'7').contains(&b) {
            return None;
        }
        acc.checked_mul(8)?.checked_add(u32::from(b - b'0'))
    })
}

/// One named entry of a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: FileMode,
    pub name: BString,
    pub id: ObjectId,
}

impl TreeEntry {
    pub fn new(mode: FileMode, name: impl Into<BString>, id: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            id,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.mode.kind()
    }

    /// Git's entry order: directories compare as if their name ended in '/'.
    pub fn canonical_cmp(a: &TreeEntry, b: &TreeEntry) -> Ordering {
        let common = a.name.len().min(b.name.len());
        match a.name[..common].cmp(&b.name[..common]) {
            Ordering::Equal => {}
            other => return other,
        }
        let next = |e: &TreeEntry| -> u8 {
            match e.name.get(common) {
                Some(&c) => c,
                None if e.mode == FileMode::Tree => b'/',
                None => 0,
            }
        };
        next(a).cmp(&next(b))
    }
}

/// A parsed tree, entries in the order the store wrote them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new(entries: Vec<TreeEntry>) -> Self {
        Self { entries }
    }

    /// Parse binary tree content: repeated `<octal-mode> <name>\0<raw-id>`.
    ///
    /// The entry order of the bytes is preserved; nothing is re-sorted.
    pub fn parse(content: &[u8], algo: HashAlgorithm) -> Result<Self, ObjectError> {
        let id_len = algo.id_len();
        let mut entries = Vec::new();
        let mut pos = 0;

        while pos < content.len() {
            let space = content[pos..]
                .find_byte(b' ')
                .ok_or_else(|| ObjectError::InvalidTreeEntry {
                    offset: pos,
                    reason: "missing space after mode".into(),
                })?
                + pos;
            let mode = FileMode::from_bytes(&content[pos..space]).map_err(|_| {
                ObjectError::InvalidTreeEntry {
                    offset: pos,
                    reason: "invalid mode".into(),
                }
            })?;

            let name_start = space + 1;
            let nul = content[name_start..]
                .find_byte(0)
                .ok_or_else(|| ObjectError::InvalidTreeEntry {
                    offset: name_start,
                    reason: "missing NUL after name".into(),
                })?
                + name_start;
            if nul == name_start {
                return Err(ObjectError::InvalidTreeEntry {
                    offset: name_start,
                    reason: "empty entry name".into(),
                });
            }

            let id_start = nul + 1;
            let id_end = id_start + id_len;
            if id_end > content.len() {
                return Err(ObjectError::InvalidTreeEntry {
                    offset: id_start,
                    reason: "truncated object id".into(),
                });
            }
            let id = ObjectId::from_bytes(&content[id_start..id_end], algo)?;

            entries.push(TreeEntry {
                mode,
                name: BString::from(&content[name_start..nul]),
                id,
            });
            pos = id_end;
        }

        Ok(Self { entries })
    }

    /// Serialize entries in their current order.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in &self.entries {
            out.extend_from_slice(format!("{:o}", entry.mode.raw()).as_bytes());
            out.push(b' ');
            out.extend_from_slice(&entry.name);
            out.push(0);
            out.extend_from_slice(entry.id.as_bytes());
        }
        out
    }

    /// Put entries in git's canonical order.
    pub fn sort(&mut self) {
        self.entries.sort_by(TreeEntry::canonical_cmp);
    }

    pub fn find(&self, name: &BStr) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name.as_bstr() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(n: u8) -> ObjectId {
        ObjectId::Sha1([n; 20])
    }

    #[test]
    fn mode_kinds() {
        assert_eq!(FileMode::from_bytes(b"100644").unwrap().kind(), ObjectKind::Blob);
        assert_eq!(FileMode::from_bytes(b"120000").unwrap().kind(), ObjectKind::Blob);
        assert_eq!(FileMode::from_bytes(b"40000").unwrap().kind(), ObjectKind::Tree);
        assert_eq!(FileMode::from_bytes(b"160000").unwrap().kind(), ObjectKind::Commit);
        assert!(FileMode::from_bytes(b"10064x").is_err());
        assert!(FileMode::from_bytes(b"").is_err());
    }

    #[test]
    fn parse_keeps_byte_order() {
        let tree = Tree::new(vec![
            TreeEntry::new(FileMode::Regular, "zeta", oid(1)),
            TreeEntry::new(FileMode::Regular, "alpha", oid(2)),
        ]);
        let parsed = Tree::parse(&tree.serialize(), HashAlgorithm::Sha1).unwrap();
        assert_eq!(parsed.entries[0].name, "zeta");
        assert_eq!(parsed.entries[1].name, "alpha");
    }

    #[test]
    fn parse_sha256_ids() {
        let id = ObjectId::Sha256([7; 32]);
        let tree = Tree::new(vec![TreeEntry::new(FileMode::Tree, "src", id)]);
        let parsed = Tree::parse(&tree.serialize(), HashAlgorithm::Sha256).unwrap();
        assert_eq!(parsed.entries[0].id, id);
        assert!(Tree::parse(&tree.serialize(), HashAlgorithm::Sha1).is_err());
    }

    #[test]
    fn parse_truncated() {
        let mut data = b"100644 file\0".to_vec();
        data.extend_from_slice(&[1; 10]);
        assert!(matches!(
            Tree::parse(&data, HashAlgorithm::Sha1),
            Err(ObjectError::InvalidTreeEntry { offset: 12, .. })
        ));
    }

    #[test]
    fn parse_empty_tree() {
        assert!(Tree::parse(b"", HashAlgorithm::Sha1).unwrap().is_empty());
    }

    #[test]
    fn canonical_sort_treats_dirs_as_slash_terminated() {
        let mut tree = Tree::new(vec![
            TreeEntry::new(FileMode::Tree, "foo", oid(1)),
            TreeEntry::new(FileMode::Regular, "foo.c", oid(2)),
            TreeEntry::new(FileMode::Regular, "foo-bar", oid(3)),
        ]);
        tree.sort();
        let names: Vec<_> = tree.iter().map(|e| e.name.to_string()).collect();
        assert_eq!(names, ["foo-bar", "foo.c", "foo"]);
    }

    #[test]
    fn find_by_name() {
        let tree = Tree::new(vec![TreeEntry::new(FileMode::Gitlink, "vendor/lib", oid(9))]);
        assert_eq!(tree.find(BStr::new("vendor/lib")).map(|e| e.kind()), Some(ObjectKind::Commit));
        assert!(tree.find(BStr::new("missing")).is_none());
    }
}
