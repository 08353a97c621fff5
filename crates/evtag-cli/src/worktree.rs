use std::path::Path;

use anyhow::{bail, Result};
use evtag_utils::ToolCommand;

/// Fails when tracked files or submodules differ from `HEAD`.
pub fn ensure_clean(work_tree: &Path) -> Result<()> {
    let status = ToolCommand::new("git")
        .working_dir(work_tree)
        .args(["status", "--porcelain", "--untracked-files=no", "--ignore-submodules=none"])
        .run_checked()?
        .stdout_trimmed();
    if !status.is_empty() {
        bail!("attempting to tag a dirty working tree:\n{status}");
    }
    Ok(())
}
