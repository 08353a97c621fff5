use std::path::Path;

use anyhow::{bail, Result};
use evtag_utils::ToolCommand;

/// The editor git would launch: `GIT_EDITOR`, `core.editor`, `VISUAL`,
/// `EDITOR`, then git's built-in default.
pub struct Editor {
    command: String,
}

impl Editor {
    pub fn from_git(git_dir: &Path) -> Result<Self> {
        let command = ToolCommand::git(git_dir)
            .args(["var", "GIT_EDITOR"])
            .run_checked()?
            .stdout_trimmed();
        if command.is_empty() {
            bail!("no editor configured");
        }
        Ok(Self { command })
    }

    /// Open `path` in the editor and wait for it to exit.
    pub fn edit(&self, path: &Path) -> Result<()> {
        // The command may carry its own arguments, so let the shell split it.
        let output = ToolCommand::new("sh")
            .arg("-c")
            .arg(format!("{} \"$@\"", self.command))
            .arg(&self.command)
            .arg(path)
            .interactive()
            .run()?;
        if !output.success() {
            bail!("editor '{}' exited with {}", self.command, output.status);
        }
        Ok(())
    }
}
