use bstr::BString;
use evtag_hash::ObjectId;
use evtag_object::ObjectKind;
use evtag_odb::StoreError;

use crate::DigestFormat;

/// Errors from computing or verifying a digest. Every variant is terminal for
/// the operation that produced it.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("object not found: {id}")]
    ObjectNotFound { id: ObjectId },

    #[error("{id} names a {actual}, not a commit")]
    NotACommit { id: ObjectId, actual: ObjectKind },

    #[error("cannot open submodule '{path}': {reason}")]
    SubmoduleOpenFailure { path: BString, reason: String },

    #[error("no line starting with '{prefix}' found")]
    PrefixNotFound { prefix: String },

    #[error("malformed verification line '{line}': {reason}")]
    MalformedVerificationLine { line: String, reason: &'static str },

    #[error("digest mismatch: expected {expected}, actual {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("traversal cancelled")]
    Cancelled,

    #[error("unexpected {0} object during traversal")]
    UnexpectedObjectKind(ObjectKind),

    #[error("the {0} format is not computed by walking objects")]
    NotWalkable(DigestFormat),

    #[error(transparent)]
    Store(StoreError),
}

impl EngineError {
    /// Whether the digest was computed but did not check out, as opposed to
    /// the computation itself failing.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            Self::PrefixNotFound { .. }
                | Self::MalformedVerificationLine { .. }
                | Self::DigestMismatch { .. }
        )
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::ObjectNotFound { id },
            StoreError::UnexpectedKind {
                id,
                expected: ObjectKind::Commit,
                actual,
            } => Self::NotACommit { id, actual },
            StoreError::SubmoduleOpen { path, reason } => Self::SubmoduleOpenFailure { path, reason },
            other => Self::Store(other),
        }
    }
}
