//! Running digest state and traversal statistics.

use evtag_hash::StrongHasher;
use evtag_object::{header, ObjectKind, RawObject};

use crate::{DigestFormat, EngineError};

/// Counts of what a traversal absorbed.
///
/// Byte totals count everything fed to the hash for that kind, header
/// included when the format frames objects. Diagnostic only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub n_submodules: u64,
    pub n_commits: u64,
    pub n_trees: u64,
    pub n_blobs: u64,
    pub bytes_commits: u64,
    pub bytes_trees: u64,
    pub bytes_blobs: u64,
}

impl Stats {
    pub fn total_objects(&self) -> u64 {
        self.n_commits + self.n_trees + self.n_blobs
    }

    pub fn total_bytes(&self) -> u64 {
        self.bytes_commits + self.bytes_trees + self.bytes_blobs
    }

    /// The advisory `#` line placed above a digest line in a tag message.
    pub fn comment_line(&self) -> String {
        format!(
            "# git-evtag comment: submodules={} commits={} ({}) trees={} ({}) blobs={} ({})",
            self.n_submodules,
            self.n_commits,
            self.bytes_commits,
            self.n_trees,
            self.bytes_trees,
            self.n_blobs,
            self.bytes_blobs,
        )
    }

    fn record(&mut self, kind: ObjectKind, bytes: u64) {
        let (count, total) = match kind {
            ObjectKind::Commit => (&mut self.n_commits, &mut self.bytes_commits),
            ObjectKind::Tree => (&mut self.n_trees, &mut self.bytes_trees),
            ObjectKind::Blob => (&mut self.n_blobs, &mut self.bytes_blobs),
            // Rejected by absorb before we get here.
            ObjectKind::Tag => return,
        };
        *count += 1;
        *total += bytes;
    }
}

/// A finished digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestResult {
    pub format: DigestFormat,
    /// Lowercase hex.
    pub hex: String,
}

impl DigestResult {
    pub fn new(format: DigestFormat, hex: impl Into<String>) -> Self {
        Self {
            format,
            hex: hex.into(),
        }
    }

    /// `SHA512` or `SHA256`.
    pub fn algorithm_tag(&self) -> &'static str {
        self.format.algorithm().tag()
    }

    /// `<prefix> <hex>`, as embedded in a tag message.
    pub fn line(&self) -> String {
        format!("{} {}", self.format.prefix(), self.hex)
    }
}

/// Digest and statistics of one complete traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Computed {
    pub result: DigestResult,
    pub stats: Stats,
}

/// The one hash state of a traversal.
///
/// Submodules feed the same state as the top-level store. Finalizing
/// consumes it.
pub struct DigestState {
    format: DigestFormat,
    hasher: StrongHasher,
    stats: Stats,
}

impl DigestState {
    pub fn new(format: DigestFormat) -> Self {
        Self {
            format,
            hasher: StrongHasher::new(format.algorithm()),
            stats: Stats::default(),
        }
    }

    pub fn format(&self) -> DigestFormat {
        self.format
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Feed one object: its header (if the format frames objects), then its
    /// bytes.
    pub fn absorb(&mut self, object: &RawObject) -> Result<(), EngineError> {
        if object.kind == ObjectKind::Tag {
            return Err(EngineError::UnexpectedObjectKind(ObjectKind::Tag));
        }

        let mut fed = object.size();
        if self.format.frames_objects() {
            let header = header::encode(object.kind, object.size());
            self.hasher.update(&header);
            fed += header.len() as u64;
        }
        self.hasher.update(&object.data);
        self.stats.record(object.kind, fed);
        Ok(())
    }

    pub fn note_submodule(&mut self) {
        self.stats.n_submodules += 1;
    }

    pub fn finalize(self) -> Computed {
        Computed {
            result: DigestResult::new(self.format, self.hasher.finalize_hex()),
            stats: self.stats,
        }
    }
}
