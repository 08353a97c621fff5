//! Locating a repository's git directory.

use std::path::{Path, PathBuf};

use crate::StoreError;

/// Where a repository lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredRepo {
    pub git_dir: PathBuf,
    /// Shared directory holding `objects/` (differs from `git_dir` in linked
    /// worktrees).
    pub common_dir: PathBuf,
    /// `None` for bare repositories.
    pub work_tree: Option<PathBuf>,
}

impl DiscoveredRepo {
    pub fn objects_dir(&self) -> PathBuf {
        self.common_dir.join("objects")
    }

    pub fn is_bare(&self) -> bool {
        self.work_tree.is_none()
    }
}

/// Find the repository containing `start`.
///
/// `$GIT_DIR` wins if set. Otherwise walk up from `start`, at each level
/// checking for a `.git` directory, then a `.git` file with a `gitdir:`
/// redirect (submodules, linked worktrees), then whether the directory is
/// itself a bare repository.
pub fn discover(start: &Path) -> Result<DiscoveredRepo, StoreError> {
    if let Some(git_dir) = std::env::var_os("GIT_DIR") {
        let git_dir = PathBuf::from(git_dir);
        let git_dir = if git_dir.is_absolute() {
            git_dir
        } else {
            start.join(git_dir)
        };
        return open_git_dir(&git_dir);
    }

    let start = canonicalize(start)?;
    let mut current = start.clone();
    loop {
        if current.join(".git").exists() {
            return open_from_work_tree(&current);
        }
        if is_git_dir(&current) {
            return Ok(DiscoveredRepo {
                common_dir: resolve_common_dir(&current),
                git_dir: current,
                work_tree: None,
            });
        }
        match current.parent() {
            Some(parent) if parent != current => current = parent.to_path_buf(),
            _ => {
                return Err(StoreError::Repository {
                    path: start,
                    reason: "no .git found in this or any parent directory".into(),
                })
            }
        }
    }
}

/// Open a known git directory.
pub fn open_git_dir(git_dir: &Path) -> Result<DiscoveredRepo, StoreError> {
    let git_dir = canonicalize(git_dir)?;
    if !is_git_dir(&git_dir) {
        return Err(StoreError::Repository {
            path: git_dir,
            reason: "missing HEAD, objects/, or refs/".into(),
        });
    }

    let work_tree = git_dir
        .parent()
        .filter(|parent| parent.join(".git") == git_dir)
        .map(Path::to_path_buf);
    Ok(DiscoveredRepo {
        common_dir: resolve_common_dir(&git_dir),
        git_dir,
        work_tree,
    })
}

/// Open the repository whose checkout root is exactly `work_tree`.
///
/// Unlike [`discover`] this never walks up: a submodule directory without
/// its own `.git` must not resolve to the parent repository.
pub fn open_from_work_tree(work_tree: &Path) -> Result<DiscoveredRepo, StoreError> {
    let dot_git = work_tree.join(".git");

    let git_dir = if dot_git.is_dir() {
        dot_git
    } else if dot_git.is_file() {
        let target = parse_gitdir_file(&dot_git)?;
        if target.is_absolute() {
            target
        } else {
            work_tree.join(target)
        }
    } else {
        return Err(StoreError::Repository {
            path: work_tree.to_path_buf(),
            reason: "no .git directory or file".into(),
        });
    };

    let git_dir = canonicalize(&git_dir)?;
    if !is_git_dir(&git_dir) {
        return Err(StoreError::Repository {
            path: git_dir,
            reason: "missing HEAD, objects/, or refs/".into(),
        });
    }
    Ok(DiscoveredRepo {
        common_dir: resolve_common_dir(&git_dir),
        git_dir,
        work_tree: Some(canonicalize(work_tree)?),
    })
}

/// Whether `path` has the shape of a git directory.
pub fn is_git_dir(path: &Path) -> bool {
    path.join("HEAD").is_file() && path.join("objects").is_dir() && path.join("refs").is_dir()
}

/// Parse a `.git` file containing `gitdir: <path>`.
pub fn parse_gitdir_file(path: &Path) -> Result<PathBuf, StoreError> {
    let content = std::fs::read_to_string(path).map_err(|e| StoreError::Repository {
        path: path.to_path_buf(),
        reason: format!("cannot read .git file: {e}"),
    })?;
    let content = content.trim();
    let target = content
        .strip_prefix("gitdir:")
        .map(str::trim_start)
        .ok_or_else(|| StoreError::Repository {
            path: path.to_path_buf(),
            reason: format!("expected 'gitdir: <path>', got: {content}"),
        })?;
    Ok(PathBuf::from(target))
}

fn resolve_common_dir(git_dir: &Path) -> PathBuf {
    let commondir_file = git_dir.join("commondir");
    if let Ok(content) = std::fs::read_to_string(&commondir_file) {
        let resolved = git_dir.join(content.trim());
        return std::fs::canonicalize(&resolved).unwrap_or(resolved);
    }
    git_dir.to_path_buf()
}

fn canonicalize(path: &Path) -> Result<PathBuf, StoreError> {
    std::fs::canonicalize(path).map_err(|e| StoreError::Repository {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
