pub mod compute;
pub mod sign;
pub mod verify;

use std::env;

use anyhow::{Context, Result};
use clap::Subcommand;
use evtag_core::{DigestFormat, DigestResult, EngineError, EvTag, Stats};
use evtag_hash::ObjectId;
use evtag_odb::{GitStore, ObjectReader};

use crate::{archive, Cli};

#[derive(Subcommand)]
pub enum Commands {
    /// Create a signed tag carrying the digest of HEAD
    Sign(sign::SignArgs),
    /// Check a tag's signature and recompute its digests against HEAD
    Verify(verify::VerifyArgs),
    /// Print the digest of a commit
    Compute(compute::ComputeArgs),
}

pub fn run(cli: &Cli) -> Result<i32> {
    match &cli.command {
        Commands::Sign(args) => sign::run(args),
        Commands::Verify(args) => verify::run(args),
        Commands::Compute(args) => compute::run(args),
    }
}

/// Open the repository containing the current directory.
pub(crate) fn open_store() -> Result<GitStore> {
    let cwd = env::current_dir()?;
    GitStore::discover(&cwd).context("not a git repository (or any of the parent directories)")
}

/// Exit code for an engine error: 1 when a digest line did not check out.
/// Anything else is fatal and propagates.
pub(crate) fn verification_exit(err: EngineError) -> Result<i32> {
    if err.is_verification_failure() {
        eprintln!("error: {err}");
        Ok(1)
    } else {
        Err(err.into())
    }
}

/// Digest of `commit` under `format`. Walk statistics exist only for the
/// formats computed by the engine.
pub(crate) fn digest(
    store: &GitStore,
    commit: &ObjectId,
    format: DigestFormat,
) -> Result<(DigestResult, Option<Stats>)> {
    if format.is_walked() {
        let computed = EvTag::compute(store, commit, format)?;
        Ok((computed.result, Some(computed.stats)))
    } else {
        // `git archive` accepts any tree-ish; the checksum is defined for commits.
        store.read_commit(commit).map_err(EngineError::from)?;
        Ok((archive::digest(store.git_dir(), commit)?, None))
    }
}
