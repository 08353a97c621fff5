use std::fmt;
use std::str::FromStr;

use evtag_hash::DigestAlgorithm;

/// A versioned digest format: the line prefix and the rule that produced
/// the hex after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestFormat {
    /// SHA-512 over `"<kind> <size>\0"` + payload for every object walked.
    V0,
    /// SHA-512 over payloads alone, no framing.
    ContentsPlain,
    /// SHA-256 of `git archive --format=tar` output.
    LegacyArchive,
}

impl DigestFormat {
    /// Every format, in detection order.
    pub const ALL: [DigestFormat; 3] = [Self::V0, Self::ContentsPlain, Self::LegacyArchive];

    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::V0 => "Git-EVTag-v0-SHA512:",
            Self::ContentsPlain => "Git-EVTag-Contents-SHA512:",
            Self::LegacyArchive => "ExtendedVerify-SHA256-archive-tar:",
        }
    }

    pub const fn algorithm(&self) -> DigestAlgorithm {
        match self {
            Self::V0 | Self::ContentsPlain => DigestAlgorithm::Sha512,
            Self::LegacyArchive => DigestAlgorithm::Sha256,
        }
    }

    /// Whether each object is preceded by its canonical header.
    pub const fn frames_objects(&self) -> bool {
        matches!(self, Self::V0)
    }

    /// Whether the digest comes from walking the object graph. The archive
    /// checksum is produced by a separate pipeline.
    pub const fn is_walked(&self) -> bool {
        !matches!(self, Self::LegacyArchive)
    }

    /// Short name used on the command line.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::V0 => "v0",
            Self::ContentsPlain => "contents",
            Self::LegacyArchive => "legacy-archive",
        }
    }
}

impl fmt::Display for DigestFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| format!("unknown digest format '{s}' (expected v0, contents or legacy-archive)"))
    }
}
