use bstr::ByteSlice;
use evtag_hash::ObjectId;

use crate::ObjectError;

/// The parts of a commit the traversal follows.
///
/// Author, committer and message only matter as bytes, and those are hashed
/// from the raw object, so they are not parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Root tree.
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
}

impl Commit {
    /// Parse the header block of raw commit content.
    pub fn parse(content: &[u8]) -> Result<Self, ObjectError> {
        let mut tree = None;
        let mut parents = Vec::new();

        for line in content.lines() {
            // Headers end at the first blank line.
            if line.is_empty() {
                break;
            }
            let Some((key, value)) = line.split_once_str(b" ") else {
                continue;
            };
            match key {
                b"tree" if tree.is_none() => tree = Some(parse_id(value, "tree")?),
                b"parent" => parents.push(parse_id(value, "parent")?),
                _ => {}
            }
        }

        let tree = tree.ok_or(ObjectError::MissingCommitField { field: "tree" })?;
        Ok(Self { tree, parents })
    }

    /// Render commit content with a fixed identity for author and committer.
    ///
    /// `ident` is the full `Name <email> <epoch> <tz>` signature text.
    pub fn build(tree: &ObjectId, parents: &[ObjectId], ident: &str, message: &str) -> Vec<u8> {
        let mut out = format!("tree {tree}\n");
        for parent in parents {
            out.push_str(&format!("parent {parent}\n"));
        }
        out.push_str(&format!("author {ident}\ncommitter {ident}\n\n{message}"));
        out.into_bytes()
    }
}

fn parse_id(value: &[u8], field: &'static str) -> Result<ObjectId, ObjectError> {
    let hex = value
        .to_str()
        .map_err(|_| ObjectError::InvalidHeader(format!("non-UTF8 {field} id")))?;
    Ok(ObjectId::from_hex(hex.trim_end())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";
    const PARENT: &str = "ce013625030ba8dba906f756967f9e9ca394464a";

    #[test]
    fn parse_root_tree_and_parents() {
        let raw = format!(
            "tree {TREE}\nparent {PARENT}\nauthor A <a@b> 0 +0000\ncommitter A <a@b> 0 +0000\n\nmsg\ntree {PARENT}\n"
        );
        let commit = Commit::parse(raw.as_bytes()).unwrap();
        assert_eq!(commit.tree.to_hex(), TREE);
        assert_eq!(commit.parents.len(), 1);
        assert_eq!(commit.parents[0].to_hex(), PARENT);
    }

    #[test]
    fn missing_tree() {
        let err = Commit::parse(b"author A <a@b> 0 +0000\n\nmsg\n").unwrap_err();
        assert!(matches!(err, ObjectError::MissingCommitField { field: "tree" }));
    }

    #[test]
    fn build_then_parse() {
        let tree = ObjectId::from_hex(TREE).unwrap();
        let parent = ObjectId::from_hex(PARENT).unwrap();
        let raw = Commit::build(&tree, &[parent], "T <t@example.com> 1234567890 +0000", "init\n");
        let commit = Commit::parse(&raw).unwrap();
        assert_eq!(commit.tree, tree);
        assert_eq!(commit.parents, vec![parent]);
        assert!(raw.ends_with(b"\n\ninit\n"));
    }
}
