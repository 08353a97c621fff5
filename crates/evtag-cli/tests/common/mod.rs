//! Shared harness for the git-evtag end-to-end tests.
//!
//! Every process runs with a pinned environment so commit ids, and with them
//! the digests, are the same on every machine.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Captured output from running a command.
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    /// Stdout lines, for output that is one digest line per row.
    pub fn lines(&self) -> Vec<&str> {
        self.stdout.lines().collect()
    }
}

pub fn evtag_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_git-evtag"))
}

fn pin_env(cmd: &mut Command, home: &Path) {
    cmd.env("GIT_AUTHOR_NAME", "Test Author")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_AUTHOR_DATE", "1234567890 +0000")
        .env("GIT_COMMITTER_NAME", "Test Committer")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_DATE", "1234567890 +0000")
        .env("TZ", "UTC")
        .env("LC_ALL", "C")
        .env("LANG", "C")
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("HOME", home)
        .env("GIT_CONFIG_COUNT", "1")
        .env("GIT_CONFIG_KEY_0", "protocol.file.allow")
        .env("GIT_CONFIG_VALUE_0", "always")
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE")
        .env_remove("GIT_EDITOR")
        .env_remove("GIT_EVTAG_LOG");
}

fn capture(mut cmd: Command, what: &str) -> CommandResult {
    let output = cmd.output().unwrap_or_else(|e| panic!("failed to run {what}: {e}"));
    CommandResult {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(128),
    }
}

fn home_of(dir: &Path) -> &Path {
    dir.parent().unwrap_or(dir)
}

/// Run C git in `dir`.
pub fn git(dir: &Path, args: &[&str]) -> CommandResult {
    let mut cmd = Command::new("git");
    cmd.args(args).current_dir(dir);
    pin_env(&mut cmd, home_of(dir));
    capture(cmd, "git")
}

/// Run C git in `dir` and fail the test unless it succeeds.
pub fn git_ok(dir: &Path, args: &[&str]) -> String {
    let result = git(dir, args);
    assert_eq!(
        result.exit_code, 0,
        "git {:?} failed:\n{}",
        args, result.stderr
    );
    result.stdout
}

/// Run git-evtag in `dir`.
pub fn evtag(dir: &Path, args: &[&str]) -> CommandResult {
    evtag_with_env(dir, args, &[])
}

pub fn evtag_with_env(dir: &Path, args: &[&str], env: &[(&str, &str)]) -> CommandResult {
    let mut cmd = Command::new(evtag_bin());
    cmd.args(args).current_dir(dir);
    pin_env(&mut cmd, home_of(dir));
    for (key, val) in env {
        cmd.env(key, val);
    }
    capture(cmd, "git-evtag")
}

/// A repository with two commits touching a nested directory.
pub fn setup_repo(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    git_ok(dir, &["init", "-q", "-b", "main"]);
    fs::write(dir.join("README"), "hello\n").unwrap();
    fs::create_dir_all(dir.join("src/bin")).unwrap();
    fs::write(dir.join("src/lib.rs"), "pub fn answer() -> u32 { 42 }\n").unwrap();
    fs::write(dir.join("src/bin/main.rs"), "fn main() {}\n").unwrap();
    git_ok(dir, &["add", "."]);
    git_ok(dir, &["commit", "-q", "-m", "initial"]);
    fs::write(dir.join("README"), "hello again\n").unwrap();
    git_ok(dir, &["commit", "-q", "-a", "-m", "second"]);
}

/// `setup_repo` plus a submodule checkout at `lib`.
pub fn setup_repo_with_submodule(root: &Path) -> PathBuf {
    let sub = root.join("sub-upstream");
    fs::create_dir_all(&sub).unwrap();
    git_ok(&sub, &["init", "-q", "-b", "main"]);
    fs::write(sub.join("sub.txt"), "submodule content\n").unwrap();
    git_ok(&sub, &["add", "."]);
    git_ok(&sub, &["commit", "-q", "-m", "sub initial"]);

    let repo = root.join("repo");
    setup_repo(&repo);
    let url = sub.to_str().unwrap();
    git_ok(&repo, &["submodule", "add", "-q", url, "lib"]);
    git_ok(&repo, &["commit", "-q", "-m", "add submodule"]);
    repo
}

/// Annotated, unsigned tag at HEAD with `message`.
pub fn tag_with_message(dir: &Path, name: &str, message: &str) {
    let file = dir.join(".git").join("TEST_TAGMSG");
    fs::write(&file, message).unwrap();
    git_ok(dir, &["tag", "-a", "-F", file.to_str().unwrap(), name]);
}
