//! Builder for the external tools git-evtag drives: `git`, `gpg`, the editor.

use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

use bstr::ByteSlice;

use crate::error::UtilError;
use crate::Result;

/// Stdio mode for subprocess streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    /// Inherit the parent process's stream.
    Inherit,
    /// Pipe the stream (capture it).
    Pipe,
    /// Redirect to /dev/null.
    Null,
}

impl StdioMode {
    fn to_stdio(self) -> Stdio {
        match self {
            StdioMode::Inherit => Stdio::inherit(),
            StdioMode::Pipe => Stdio::piped(),
            StdioMode::Null => Stdio::null(),
        }
    }
}

/// Captured result of a finished tool invocation.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    /// Captured stdout (empty if not piped).
    pub stdout: Vec<u8>,
    /// Captured stderr (empty if not piped).
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Stdout as lossy UTF-8 with trailing whitespace removed.
    pub fn stdout_trimmed(&self) -> String {
        self.stdout.trim_end().to_str_lossy().into_owned()
    }
}

/// Fluent wrapper over `std::process::Command`.
pub struct ToolCommand {
    program: OsString,
    args: Vec<OsString>,
    env_vars: Vec<(OsString, OsString)>,
    input: Option<Vec<u8>>,
    stdin_mode: StdioMode,
    stdout_mode: StdioMode,
    stderr_mode: StdioMode,
    working_dir: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            env_vars: Vec::new(),
            input: None,
            stdin_mode: StdioMode::Null,
            stdout_mode: StdioMode::Pipe,
            stderr_mode: StdioMode::Pipe,
            working_dir: None,
        }
    }

    /// `git` with `--git-dir` pinned, so discovery never wanders.
    pub fn git(git_dir: impl AsRef<Path>) -> Self {
        Self::new("git").arg("--git-dir").arg(git_dir.as_ref())
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl AsRef<OsStr>>) -> Self {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, val: impl AsRef<OsStr>) -> Self {
        self.env_vars
            .push((key.as_ref().to_os_string(), val.as_ref().to_os_string()));
        self
    }

    /// Bytes written to the child's stdin before waiting on it.
    pub fn input(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.input = Some(data.into());
        self.stdin_mode = StdioMode::Pipe;
        self
    }

    pub fn stdout(mut self, mode: StdioMode) -> Self {
        self.stdout_mode = mode;
        self
    }

    pub fn stderr(mut self, mode: StdioMode) -> Self {
        self.stderr_mode = mode;
        self
    }

    /// Let the child talk to the terminal directly (editors).
    pub fn interactive(mut self) -> Self {
        self.stdin_mode = StdioMode::Inherit;
        self.stdout(StdioMode::Inherit).stderr(StdioMode::Inherit)
    }

    pub fn working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, val) in &self.env_vars {
            cmd.env(key, val);
        }
        cmd.stdin(self.stdin_mode.to_stdio());
        cmd.stdout(self.stdout_mode.to_stdio());
        cmd.stderr(self.stderr_mode.to_stdio());
        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Program and arguments joined for error messages.
    pub fn command_string(&self) -> String {
        let mut s = self.program.to_string_lossy().into_owned();
        for arg in &self.args {
            s.push(' ');
            s.push_str(&arg.to_string_lossy());
        }
        s
    }

    /// Run to completion and capture output, whatever the exit status.
    pub fn run(&self) -> Result<ToolOutput> {
        let cmd_str = self.command_string();
        tracing::trace!(command = %cmd_str, "spawning");
        let mut child = self.spawn()?;

        if let Some(ref data) = self.input {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(data).map_err(|e| UtilError::Spawn {
                    command: cmd_str.clone(),
                    source: e,
                })?;
            }
        }

        let output = child.wait_with_output().map_err(|e| UtilError::Spawn {
            command: cmd_str,
            source: e,
        })?;
        Ok(ToolOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    /// Run and fail unless the tool exits successfully.
    pub fn run_checked(&self) -> Result<ToolOutput> {
        let output = self.run()?;
        if !output.success() {
            return Err(UtilError::Failed {
                command: self.command_string(),
                status: output.status,
                stderr: output.stderr.trim().to_str_lossy().into_owned(),
            });
        }
        Ok(output)
    }

    /// Spawn without waiting; the caller owns the child's pipes.
    pub fn spawn(&self) -> Result<Child> {
        self.build_command().spawn().map_err(|e| UtilError::Spawn {
            command: self.command_string(),
            source: e,
        })
    }

    /// Spawn with stdin piped, for request/response tools like `cat-file --batch`.
    pub fn spawn_piped(&self) -> Result<Child> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::piped());
        cmd.spawn().map_err(|e| UtilError::Spawn {
            command: self.command_string(),
            source: e,
        })
    }
}
