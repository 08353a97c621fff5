//! The git-evtag content digest engine.
//!
//! Computes one strong digest over everything reachable from a commit,
//! submodules included, independent of the store's own object ids:
//!
//! - [`Walker`] performs the canonical traversal and drives a [`DigestState`].
//! - [`DigestFormat`] selects both the line prefix and the hashing rule.
//! - [`Verifier`] finds a recorded digest line in a tag message and compares
//!   it with a fresh [`DigestResult`].

mod accumulator;
mod error;
mod format;
mod verify;
mod walker;

pub use accumulator::{Computed, DigestResult, DigestState, Stats};
pub use error::EngineError;
pub use format::DigestFormat;
pub use verify::{DigestLines, VerificationLine, Verifier};
pub use walker::Walker;

use evtag_hash::ObjectId;
use evtag_odb::ObjectReader;

/// Entry point for one-shot computations.
pub struct EvTag;

impl EvTag {
    /// Digest of everything reachable from `commit` in `store`.
    pub fn compute(
        store: &dyn ObjectReader,
        commit: &ObjectId,
        format: DigestFormat,
    ) -> Result<Computed, EngineError> {
        Walker::new(store, format).digest(commit)
    }

    /// Compute the digest of `commit` and check it against the line for
    /// `format` in `text`.
    pub fn verify(
        store: &dyn ObjectReader,
        commit: &ObjectId,
        format: DigestFormat,
        text: &str,
    ) -> Result<VerificationLine, EngineError> {
        let computed = Self::compute(store, commit, format)?;
        Verifier::new(text).verify(&computed.result)
    }
}
