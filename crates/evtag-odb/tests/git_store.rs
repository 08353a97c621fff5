//! Integration tests: reading real repositories written by C git.

use std::fs;
use std::path::Path;
use std::process::Command;

use bstr::BStr;
use evtag_hash::{HashAlgorithm, ObjectId};
use evtag_object::{FileMode, ObjectKind, Tree, TreeEntry};
use evtag_odb::{GitStore, MemoryStore, ObjectReader, StoreError};

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Test Author")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_AUTHOR_DATE", "1234567890 +0000")
        .env("GIT_COMMITTER_NAME", "Test Author")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_DATE", "1234567890 +0000")
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("HOME", dir.parent().unwrap_or(dir))
        .env("GIT_CONFIG_COUNT", "1")
        .env("GIT_CONFIG_KEY_0", "protocol.file.allow")
        .env("GIT_CONFIG_VALUE_0", "always")
        .env_remove("GIT_DIR")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

fn init_repo(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    git(dir, &["init", "-q", "-b", "main"]);
}

fn commit_file(dir: &Path, name: &str, content: &str, message: &str) -> String {
    fs::write(dir.join(name), content).unwrap();
    git(dir, &["add", name]);
    git(dir, &["commit", "-q", "-m", message]);
    git(dir, &["rev-parse", "HEAD"])
}

fn oid(hex: &str) -> ObjectId {
    hex.parse().unwrap()
}

#[test]
fn reads_loose_and_packed_objects() {
    let tmp = tempfile::tempdir().unwrap();
    let repo = tmp.path().join("repo");
    init_repo(&repo);
    let head = commit_file(&repo, "README", "hello\n", "init");

    let store = GitStore::discover(&repo).unwrap();
    assert_eq!(store.hash_algo(), HashAlgorithm::Sha1);
    assert_eq!(store.head().unwrap(), oid(&head));
    let loose = store.read_commit(&oid(&head)).unwrap();
    drop(store);

    git(&repo, &["repack", "-a", "-d", "-q"]);
    git(&repo, &["prune-packed"]);

    let store = GitStore::discover(&repo).unwrap();
    let packed = store.read_commit(&oid(&head)).unwrap();
    assert_eq!(packed.raw, loose.raw);

    let tree = store.read_tree(&packed.object.tree).unwrap();
    let readme = tree.object.find(BStr::new("README")).unwrap();
    let blob = store.read_object(&readme.id).unwrap();
    assert_eq!(blob.kind, ObjectKind::Blob);
    assert_eq!(blob.data, b"hello\n");
}

#[test]
fn memory_store_ids_agree_with_git() {
    let tmp = tempfile::tempdir().unwrap();
    let repo = tmp.path().join("repo");
    init_repo(&repo);
    let head = commit_file(&repo, "README", "hello\n", "init");
    let git_tree = git(&repo, &["rev-parse", "HEAD^{tree}"]);

    let mut mem = MemoryStore::new(HashAlgorithm::Sha1);
    let blob = mem.insert_blob(b"hello\n".to_vec()).unwrap();
    let tree = mem
        .insert_tree(&Tree::new(vec![TreeEntry::new(FileMode::Regular, "README", blob)]))
        .unwrap();
    assert_eq!(tree, oid(&git_tree));

    let store = GitStore::discover(&repo).unwrap();
    let commit = store.read_commit(&oid(&head)).unwrap();
    assert_eq!(commit.object.tree, tree);
}

#[test]
fn missing_object_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let repo = tmp.path().join("repo");
    init_repo(&repo);
    commit_file(&repo, "a", "a\n", "init");

    let store = GitStore::discover(&repo).unwrap();
    let absent = ObjectId::Sha1([0x5a; 20]);
    assert!(matches!(store.read_object(&absent), Err(StoreError::NotFound(id)) if id == absent));
    assert!(matches!(
        store.resolve_commit("no-such-branch"),
        Err(StoreError::RevisionNotFound(_))
    ));
}

#[test]
fn rehashing_catches_a_swapped_loose_object() {
    let tmp = tempfile::tempdir().unwrap();
    let repo = tmp.path().join("repo");
    init_repo(&repo);
    commit_file(&repo, "a", "first\n", "one");
    let a = git(&repo, &["rev-parse", "HEAD:a"]);
    commit_file(&repo, "a", "second\n", "two");
    let b = git(&repo, &["rev-parse", "HEAD:a"]);

    let objects = repo.join(".git/objects");
    let path_of = |hex: &str| objects.join(&hex[..2]).join(&hex[2..]);
    let replacement = fs::read(path_of(&b)).unwrap();
    let target = path_of(&a);
    fs::remove_file(&target).unwrap();
    fs::write(&target, replacement).unwrap();

    let mut store = GitStore::discover(&repo).unwrap();
    assert!(matches!(
        store.read_object(&oid(&a)),
        Err(StoreError::IdMismatch { expected, .. }) if expected == oid(&a)
    ));

    store.set_verify_ids(false);
    assert_eq!(store.read_object(&oid(&a)).unwrap().data, b"second\n");
}

#[test]
fn reads_annotated_tag() {
    let tmp = tempfile::tempdir().unwrap();
    let repo = tmp.path().join("repo");
    init_repo(&repo);
    let head = commit_file(&repo, "a", "a\n", "init");
    git(&repo, &["tag", "-a", "-m", "Release one", "v1"]);

    let store = GitStore::discover(&repo).unwrap();
    let tag = store.read_tag("v1").unwrap();
    assert_eq!(tag.object.target, oid(&head));
    assert_eq!(tag.object.target_kind, ObjectKind::Commit);
    assert_eq!(tag.object.message, "Release one\n");
    assert!(tag.object.signature.is_none());

    assert!(matches!(store.read_tag("v2"), Err(StoreError::RevisionNotFound(_))));
}

#[test]
fn resolves_submodule_checkout() {
    let tmp = tempfile::tempdir().unwrap();
    let sub = tmp.path().join("sub");
    init_repo(&sub);
    let sub_head = commit_file(&sub, "lib.c", "int x;\n", "sub init");

    let parent = tmp.path().join("parent");
    init_repo(&parent);
    commit_file(&parent, "README", "top\n", "init");
    git(&parent, &["submodule", "add", "-q", sub.to_str().unwrap(), "lib"]);
    git(&parent, &["commit", "-q", "-m", "add lib"]);

    let store = GitStore::discover(&parent).unwrap();
    let root = store.read_tree(&store.read_commit(&store.head().unwrap()).unwrap().object.tree).unwrap();
    let gitlink = root.object.find(BStr::new("lib")).unwrap();
    assert_eq!(gitlink.mode, FileMode::Gitlink);
    assert_eq!(gitlink.id, oid(&sub_head));

    let link = store.resolve_submodule(BStr::new("lib"), &gitlink.id).unwrap();
    assert!(link.is_at_recorded_commit());
    let substore = store.open_substore(&link).unwrap();
    let sub_commit = substore.read_commit(&link.working_commit_id).unwrap();
    let files = substore.read_tree(&sub_commit.object.tree).unwrap();
    assert!(files.object.find(BStr::new("lib.c")).is_some());

    // Move the checkout past the recorded commit.
    let checkout = parent.join("lib");
    let moved = commit_file(&checkout, "lib.h", "int y;\n", "sub change");
    let link = store.resolve_submodule(BStr::new("lib"), &gitlink.id).unwrap();
    assert!(!link.is_at_recorded_commit());
    assert_eq!(link.working_commit_id, oid(&moved));
}

#[test]
fn uninitialized_submodule_fails_to_open() {
    let tmp = tempfile::tempdir().unwrap();
    let repo = tmp.path().join("repo");
    init_repo(&repo);
    commit_file(&repo, "a", "a\n", "init");
    fs::create_dir_all(repo.join("vendor")).unwrap();

    let store = GitStore::discover(&repo).unwrap();
    let recorded = ObjectId::Sha1([1; 20]);
    assert!(matches!(
        store.resolve_submodule(BStr::new("vendor"), &recorded),
        Err(StoreError::SubmoduleOpen { .. })
    ));
}
