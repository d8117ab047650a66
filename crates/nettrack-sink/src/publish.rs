//! Publisher trait and the git-backed implementation.
//!
//! Publishing works on the accumulated log file, not on single events, so a
//! successful push also carries anything an earlier failed push left behind.

use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::PublishError;

pub trait Publisher {
    fn publish(&mut self) -> Result<(), PublishError>;
}

impl<T: Publisher + ?Sized> Publisher for &mut T {
    fn publish(&mut self) -> Result<(), PublishError> {
        (**self).publish()
    }
}

impl<T: Publisher + ?Sized> Publisher for Box<T> {
    fn publish(&mut self) -> Result<(), PublishError> {
        (**self).publish()
    }
}

/// `None` disables publishing.
impl<P: Publisher> Publisher for Option<P> {
    fn publish(&mut self) -> Result<(), PublishError> {
        match self {
            Some(publisher) => publisher.publish(),
            None => Ok(()),
        }
    }
}

// ─── Git command runner ─────────────────────────────────────────────

/// Runs one git subcommand and returns stdout. Mockable for tests.
pub trait GitRunner: Send + Sync {
    fn run(&self, args: &[&str]) -> Result<String, PublishError>;
}

impl<T: GitRunner + ?Sized> GitRunner for &T {
    fn run(&self, args: &[&str]) -> Result<String, PublishError> {
        (**self).run(args)
    }
}

/// Real git executor using `std::process::Command`.
pub struct GitExecutor {
    git_bin: String,
    work_dir: Option<PathBuf>,
}

impl GitExecutor {
    pub fn new(git_bin: impl Into<String>) -> Self {
        Self {
            git_bin: git_bin.into(),
            work_dir: None,
        }
    }

    #[must_use]
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }
}

impl Default for GitExecutor {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitRunner for GitExecutor {
    fn run(&self, args: &[&str]) -> Result<String, PublishError> {
        let mut cmd = std::process::Command::new(&self.git_bin);
        if let Some(ref dir) = self.work_dir {
            cmd.current_dir(dir);
        }
        cmd.args(args);
        let output = cmd.output()?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // git reports "nothing to commit" on stdout
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(PublishError::CommandFailed {
                step: args.first().copied().unwrap_or_default().to_string(),
                detail: format!("exit code {}: {detail}", output.status.code().unwrap_or(-1)),
            });
        }
        Ok(stdout)
    }
}

// ─── Git publisher ──────────────────────────────────────────────────

pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_BRANCH: &str = "master";

/// `git add <file>`, `git commit`, `git push -u <remote> <branch>`.
pub struct GitPublisher<R = GitExecutor> {
    runner: R,
    file: PathBuf,
    remote: String,
    branch: String,
}

impl GitPublisher<GitExecutor> {
    /// Publisher running git inside `work_dir`; `file` is relative to it.
    pub fn in_repo(work_dir: &Path, file: impl Into<PathBuf>) -> Self {
        Self::new(GitExecutor::default().in_dir(work_dir), file)
    }
}

impl<R: GitRunner> GitPublisher<R> {
    pub fn new(runner: R, file: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            file: file.into(),
            remote: DEFAULT_REMOTE.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
        }
    }

    #[must_use]
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    fn commit_message() -> String {
        format!("autocommit @ {}", Local::now().format("%a-%d-%b_%H-%M-%S"))
    }
}

/// git words this differently when untracked files sit next to the log.
fn nothing_to_commit(detail: &str) -> bool {
    detail.contains("nothing to commit") || detail.contains("nothing added to commit")
}

impl<R: GitRunner> Publisher for GitPublisher<R> {
    fn publish(&mut self) -> Result<(), PublishError> {
        let file = self.file.to_string_lossy();
        self.runner.run(&["add", &file])?;

        let message = Self::commit_message();
        match self.runner.run(&["commit", "-m", &message]) {
            Ok(_) => {}
            // An earlier commit whose push failed leaves nothing new to commit;
            // the push below still delivers it.
            Err(PublishError::CommandFailed { detail, .. }) if nothing_to_commit(&detail) => {
                tracing::debug!("nothing new to commit, pushing pending commits");
            }
            Err(e) => return Err(e),
        }

        self.runner
            .run(&["push", "-u", &self.remote, &self.branch])?;
        tracing::debug!(file = %file, remote = %self.remote, "log published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records calls; fails the subcommand named in `fail_on`.
    struct MockGit {
        calls: Mutex<Vec<Vec<String>>>,
        fail_on: Option<(&'static str, &'static str)>,
    }

    impl MockGit {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn failing(step: &'static str, detail: &'static str) -> Self {
            Self {
                fail_on: Some((step, detail)),
                ..Self::new()
            }
        }

        fn subcommands(&self) -> Vec<String> {
            self.calls
                .lock()
                .expect("lock")
                .iter()
                .map(|c| c[0].clone())
                .collect()
        }
    }

    impl GitRunner for MockGit {
        fn run(&self, args: &[&str]) -> Result<String, PublishError> {
            self.calls
                .lock()
                .expect("lock")
                .push(args.iter().map(|a| a.to_string()).collect());
            match self.fail_on {
                Some((step, detail)) if args.first() == Some(&step) => {
                    Err(PublishError::CommandFailed {
                        step: step.to_string(),
                        detail: detail.to_string(),
                    })
                }
                _ => Ok(String::new()),
            }
        }
    }

    #[test]
    fn publish_runs_add_commit_push() {
        let git = MockGit::new();
        let mut publisher = GitPublisher::new(&git, "phone.csv").with_branch("main");
        publisher.publish().expect("publish");

        assert_eq!(git.subcommands(), vec!["add", "commit", "push"]);
        let calls = git.calls.lock().expect("lock");
        assert_eq!(calls[0], vec!["add", "phone.csv"]);
        assert!(calls[1][2].contains("autocommit @"));
        assert_eq!(calls[2], vec!["push", "-u", "origin", "main"]);
    }

    #[test]
    fn nothing_to_commit_still_pushes() {
        let git = MockGit::failing("commit", "exit code 1: nothing to commit, working tree clean");
        let mut publisher = GitPublisher::new(&git, "phone.csv");
        publisher.publish().expect("publish");
        assert_eq!(git.subcommands(), vec!["add", "commit", "push"]);
    }

    #[test]
    fn untracked_neighbours_still_push() {
        let git = MockGit::failing(
            "commit",
            "exit code 1: nothing added to commit but untracked files present (use \"git add\" to track)",
        );
        let mut publisher = GitPublisher::new(&git, "phone.csv");
        publisher.publish().expect("publish");
        assert_eq!(git.subcommands(), vec!["add", "commit", "push"]);
    }

    #[test]
    fn other_commit_failure_skips_push() {
        let git = MockGit::failing("commit", "exit code 128: unable to auto-detect email address");
        let mut publisher = GitPublisher::new(&git, "phone.csv");
        assert!(publisher.publish().is_err());
        assert_eq!(git.subcommands(), vec!["add", "commit"]);
    }

    #[test]
    fn push_failure_is_reported() {
        let git = MockGit::failing("push", "exit code 128: could not resolve host");
        let mut publisher = GitPublisher::new(&git, "phone.csv").with_remote("backup");
        let err = publisher.publish().expect_err("push should fail");
        assert!(err.to_string().contains("git push failed"));
    }

    #[test]
    fn add_failure_stops_early() {
        let git = MockGit::failing("add", "exit code 128: not a git repository");
        let mut publisher = GitPublisher::new(&git, "phone.csv");
        assert!(publisher.publish().is_err());
        assert_eq!(git.subcommands(), vec!["add"]);
    }

    #[test]
    fn none_publisher_is_noop() {
        let mut publisher: Option<GitPublisher<&MockGit>> = None;
        assert!(publisher.publish().is_ok());
    }

    #[test]
    fn git_executor_missing_binary_is_io_error() {
        let exec = GitExecutor::new("/nonexistent/nettrack-test-git");
        assert!(matches!(exec.run(&["status"]), Err(PublishError::Io(_))));
    }
}
