//! The legacy `ExtendedVerify-SHA256-archive-tar` checksum.
//!
//! This is SHA-256 over the bytes `git archive --format=tar` produces for the
//! commit. It covers no submodule content and depends on the archiver's
//! output staying byte-stable, which is why it is only kept for old tags.

use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};
use evtag_core::{DigestFormat, DigestResult};
use evtag_hash::{ObjectId, StrongHasher};
use evtag_utils::{StdioMode, ToolCommand};

pub fn digest(git_dir: &Path, commit: &ObjectId) -> Result<DigestResult> {
    let format = DigestFormat::LegacyArchive;
    let cmd = ToolCommand::git(git_dir)
        .args(["archive", "--format=tar"])
        .arg(commit.to_hex())
        .stderr(StdioMode::Inherit);
    let mut child = cmd.spawn()?;
    let mut stdout = child.stdout.take().context("git archive has no stdout")?;

    let mut hasher = StrongHasher::new(format.algorithm());
    let copied = io::copy(&mut stdout, &mut hasher);
    // Close our end so a child blocked on a full pipe can exit.
    drop(stdout);
    let status = child.wait()?;
    let bytes = copied.context("reading git archive output")?;
    if !status.success() {
        bail!("{} exited with {}", cmd.command_string(), status);
    }

    tracing::debug!(commit = %commit, bytes, "archive checksum");
    Ok(DigestResult::new(format, hasher.finalize_hex()))
}
