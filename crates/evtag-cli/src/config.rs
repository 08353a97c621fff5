use std::path::Path;

use anyhow::{bail, Result};
use evtag_utils::ToolCommand;

/// `git config --get <key>`; `None` when the key is unset.
pub fn get(git_dir: &Path, key: &str) -> Result<Option<String>> {
    let cmd = ToolCommand::git(git_dir).args(["config", "--get", key]);
    let output = cmd.run()?;
    match output.status.code() {
        Some(0) => Ok(Some(output.stdout_trimmed())),
        Some(1) => Ok(None),
        _ => bail!(
            "{} failed: {}",
            cmd.command_string(),
            String::from_utf8_lossy(&output.stderr).trim()
        ),
    }
}
