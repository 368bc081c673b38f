//! Version-control history of requirement rows.
//!
//! The [`VersionControl`] trait is the narrow set of capabilities the
//! [`HistoryLocator`] needs from a repository. [`GitCli`] provides them by
//! driving the `git` executable.

use std::{fmt, io, num::NonZeroUsize, path::Path, path::PathBuf};

use crate::domain::CommitInfo;

mod git;
pub use git::{GitCli, GitCommit};

mod locator;
pub use locator::HistoryLocator;

#[cfg(test)]
pub(crate) mod memory;

/// A full commit hash.
pub type CommitId = String;

/// A revision range `(since, until]`: commits reachable from `until` but not
/// from `since`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevRange {
    /// The exclusive lower bound, e.g. the baseline tag.
    pub since: String,
    /// The inclusive upper bound, e.g. the mainline branch.
    pub until: String,
}

impl RevRange {
    /// Create a range.
    #[must_use]
    pub fn new(since: impl Into<String>, until: impl Into<String>) -> Self {
        Self {
            since: since.into(),
            until: until.into(),
        }
    }
}

impl fmt::Display for RevRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.since, self.until)
    }
}

/// A commit on the first-parent chain of a branch, with its parents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainlineCommit {
    /// The commit hash.
    pub id: CommitId,
    /// The parent hashes, first parent first.
    pub parents: Vec<CommitId>,
}

/// The repository capabilities reconciliation relies on.
pub trait VersionControl {
    /// The commit metadata returned by [`VersionControl::commit`].
    type Commit: CommitInfo;

    /// The commit that last touched line `line` of `path` at revision `rev`,
    /// or `None` if the file or line does not exist there.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be queried.
    fn blame(&self, rev: &str, path: &Path, line: NonZeroUsize)
    -> Result<Option<CommitId>, VcsError>;

    /// The commits in `range` whose patch to `path` adds or removes a line
    /// containing the literal text `needle`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be queried.
    fn search_log(
        &self,
        needle: &str,
        range: &RevRange,
        path: &Path,
    ) -> Result<Vec<CommitId>, VcsError>;

    /// The first-parent chain of `range.until` back to (excluding) the
    /// commits reachable from `range.since`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be queried.
    fn first_parent_chain(&self, range: &RevRange) -> Result<Vec<MainlineCommit>, VcsError>;

    /// Whether `ancestor` is reachable from `descendant`. A commit is its
    /// own ancestor.
    ///
    /// # Errors
    ///
    /// Returns an error if either commit is unknown.
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool, VcsError>;

    /// The metadata of a commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit is unknown.
    fn commit(&self, id: &str) -> Result<Self::Commit, VcsError>;

    /// Whether `path` exists at revision `rev`.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be queried.
    fn contains_path(&self, rev: &str, path: &Path) -> Result<bool, VcsError>;
}

/// Errors from the version-control collaborator.
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    /// The `git` executable could not be run.
    #[error("failed to run git")]
    Io(#[from] io::Error),

    /// A `git` command exited unsuccessfully.
    #[error("`git {command}` failed: {stderr}")]
    Command {
        /// The arguments passed to git.
        command: String,
        /// What git reported.
        stderr: String,
    },

    /// A `git` command produced output that could not be understood.
    #[error("unexpected output from `git {command}`: {detail}")]
    Output {
        /// The arguments passed to git.
        command: String,
        /// What was wrong with the output.
        detail: String,
    },

    /// A document lies outside the repository.
    #[error("{} is not inside the repository at {}", path.display(), root.display())]
    OutsideRepository {
        /// The offending path.
        path: PathBuf,
        /// The repository root.
        root: PathBuf,
    },

    /// A commit or revision is unknown to the repository.
    #[error("unknown revision {0}")]
    UnknownRevision(String),
}
