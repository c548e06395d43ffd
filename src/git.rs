//! Git repository summary, modeled as a capability so tests can fake it.

use std::path::Path;
use std::process::{Command, Stdio};

/// The two queries the git segment needs. Both are best-effort: `None` from
/// either one omits the whole segment.
pub trait GitProbe {
    fn branch(&self, dir: &Path) -> Option<String>;
    fn change_count(&self, dir: &Path) -> Option<usize>;
}

/// Real implementation shelling out to `git`. `--no-optional-locks` skips
/// lock acquisition so a refresh tick never contends with an interactive
/// git command running in the same repository.
pub struct ProcessGit;

impl GitProbe for ProcessGit {
    fn branch(&self, dir: &Path) -> Option<String> {
        // Checked before spawning anything. A `.git` file (worktree or
        // submodule) does not count as a repository here.
        if !dir.join(".git").is_dir() {
            return None;
        }

        let output = Command::new("git")
            .args(["--no-optional-locks", "rev-parse", "--abbrev-ref", "HEAD"])
            .current_dir(dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if branch.is_empty() {
            None
        } else {
            Some(branch)
        }
    }

    fn change_count(&self, dir: &Path) -> Option<usize> {
        let output = Command::new("git")
            .args(["--no-optional-locks", "status", "--porcelain"])
            .current_dir(dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        match output {
            Ok(out) if out.status.success() => Some(
                String::from_utf8_lossy(&out.stdout)
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .count(),
            ),
            Ok(out) => {
                tracing::debug!("git status exited with {}", out.status);
                None
            }
            Err(e) => {
                tracing::debug!("git status failed to spawn: {e}");
                None
            }
        }
    }
}

/// Canned probe for tests.
#[cfg(test)]
pub struct FakeGit {
    pub branch: Option<String>,
    pub changes: Option<usize>,
}

#[cfg(test)]
impl GitProbe for FakeGit {
    fn branch(&self, _dir: &Path) -> Option<String> {
        self.branch.clone()
    }

    fn change_count(&self, _dir: &Path) -> Option<usize> {
        self.changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_branch_none_outside_repository() {
        let dir = TempDir::new().unwrap();
        assert!(ProcessGit.branch(dir.path()).is_none());
    }

    #[test]
    fn test_branch_none_when_git_dir_is_a_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".git"), "gitdir: elsewhere").unwrap();
        assert!(ProcessGit.branch(dir.path()).is_none());
    }

    #[test]
    fn test_change_count_none_when_status_fails() {
        // A dangling gitdir link makes `git status` exit non-zero no matter
        // what surrounds the temp dir.
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".git"), "gitdir: elsewhere").unwrap();
        assert!(ProcessGit.change_count(dir.path()).is_none());
    }
}
