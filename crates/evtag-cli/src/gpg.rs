//! Signature checks through the configured gpg program.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use evtag_utils::ToolCommand;

use crate::config;

/// Outcome of one `gpg --verify` run.
#[derive(Debug)]
pub struct GpgVerifyResult {
    pub valid: bool,
    /// Long key id from the `VALIDSIG`/`GOODSIG`/`BADSIG` status line.
    pub key_id: Option<String>,
    /// gpg's human readable report (stderr).
    pub summary: String,
}

pub struct GpgVerifier {
    program: String,
}

impl GpgVerifier {
    /// Uses `gpg.program`, falling back to `gpg`.
    pub fn from_git_config(git_dir: &Path) -> Result<Self> {
        let program = config::get(git_dir, "gpg.program")?.unwrap_or_else(|| "gpg".into());
        Ok(Self { program })
    }

    pub fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<GpgVerifyResult> {
        let mut sig_file = tempfile::Builder::new()
            .prefix("evtag-sig")
            .tempfile()
            .context("cannot create signature file")?;
        sig_file.write_all(signature)?;
        sig_file.flush()?;

        let output = ToolCommand::new(&self.program)
            .args(["--status-fd=1", "--keyid-format", "long", "--verify"])
            .arg(sig_file.path())
            .arg("-")
            .input(payload.to_vec())
            .run()
            .with_context(|| format!("cannot run {}", self.program))?;

        let status = String::from_utf8_lossy(&output.stdout);
        tracing::debug!(program = %self.program, status = %status.trim(), "gpg verify");
        Ok(GpgVerifyResult {
            valid: output.success() && has_good_signature(&status),
            key_id: signing_key(&status),
            summary: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

fn has_good_signature(status: &str) -> bool {
    status.lines().any(|line| line.starts_with("[GNUPG:] GOODSIG "))
}

fn signing_key(status: &str) -> Option<String> {
    status.lines().find_map(|line| {
        let rest = line
            .strip_prefix("[GNUPG:] GOODSIG ")
            .or_else(|| line.strip_prefix("[GNUPG:] BADSIG "))
            .or_else(|| line.strip_prefix("[GNUPG:] ERRSIG "))?;
        rest.split_whitespace().next().map(str::to_string)
    })
}
