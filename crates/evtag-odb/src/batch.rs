//! A long-lived `git cat-file --batch` child.
//!
//! Packed objects are read through git itself rather than by parsing pack
//! files. One child serves every request for the lifetime of the reader.

use std::cell::RefCell;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout};

use evtag_hash::ObjectId;
use evtag_object::{ObjectKind, RawObject};
use evtag_utils::{StdioMode, ToolCommand};

use crate::StoreError;

struct Session {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl Session {
    fn spawn(git_dir: &Path) -> Result<Self, StoreError> {
        let mut child = ToolCommand::git(git_dir)
            .args(["cat-file", "--batch"])
            .stderr(StdioMode::Null)
            .spawn_piped()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| StoreError::Batch("child has no stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| StoreError::Batch("child has no stdout".into()))?;
        tracing::debug!(git_dir = %git_dir.display(), "started cat-file --batch");
        Ok(Self {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
        })
    }

    fn query(&mut self, spec: &str) -> Result<Option<(ObjectId, RawObject)>, StoreError> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| StoreError::Batch("stdin already closed".into()))?;
        stdin.write_all(spec.as_bytes())?;
        stdin.write_all(b"\n")?;
        stdin.flush()?;

        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(StoreError::Batch("cat-file exited unexpectedly".into()));
        }
        let line = line.trim_end_matches('\n');

        if line.ends_with(" missing") || line.ends_with(" ambiguous") {
            return Ok(None);
        }

        let mut fields = line.split(' ');
        let (Some(hex), Some(kind), Some(size), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(StoreError::Batch(format!("unexpected header line: {line:?}")));
        };
        let id = ObjectId::from_hex(hex)?;
        let kind = ObjectKind::from_bytes(kind.as_bytes())
            .map_err(|e| StoreError::Batch(e.to_string()))?;
        let size: usize = size
            .parse()
            .map_err(|_| StoreError::Batch(format!("bad size in header line: {line:?}")))?;

        let mut data = vec![0u8; size];
        self.stdout.read_exact(&mut data)?;
        let mut lf = [0u8; 1];
        self.stdout.read_exact(&mut lf)?;
        if lf[0] != b'\n' {
            return Err(StoreError::Batch("missing newline after object content".into()));
        }

        Ok(Some((id, RawObject::new(kind, data))))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Closing stdin ends the batch loop.
        self.stdin.take();
        let _ = self.child.wait();
    }
}

/// Object and revision lookup through `git cat-file --batch`.
///
/// The child is spawned on first use. A protocol error discards it and the
/// next request starts a fresh one.
pub struct BatchReader {
    git_dir: PathBuf,
    session: RefCell<Option<Session>>,
}

impl BatchReader {
    pub fn new(git_dir: impl AsRef<Path>) -> Self {
        Self {
            git_dir: git_dir.as_ref().to_path_buf(),
            session: RefCell::new(None),
        }
    }

    /// Look up anything `cat-file --batch` accepts: an id, a ref, `rev^{commit}`.
    ///
    /// Returns the resolved id with the object, or `None` if git reports the
    /// spec as missing or ambiguous.
    pub fn query(&self, spec: &str) -> Result<Option<(ObjectId, RawObject)>, StoreError> {
        if spec.contains('\n') {
            return Err(StoreError::Batch(format!("spec contains a newline: {spec:?}")));
        }

        let mut slot = self.session.borrow_mut();
        if slot.is_none() {
            *slot = Some(Session::spawn(&self.git_dir)?);
        }
        let Some(session) = slot.as_mut() else {
            return Err(StoreError::Batch("no cat-file session".into()));
        };

        let result = session.query(spec);
        if result.is_err() {
            *slot = None;
        }
        result
    }

    pub fn read(&self, id: &ObjectId) -> Result<Option<RawObject>, StoreError> {
        Ok(self.query(&id.to_hex())?.map(|(_, raw)| raw))
    }
}
