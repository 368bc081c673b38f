//! Issue-tracker cross-references of requirements.
//!
//! The [`IssueTracker`] trait is what the [`IssueLinker`] needs from a
//! tracker. [`GitHub`] provides it over the GitHub REST API.

use crate::domain::IssueInfo;

mod github;
pub use github::{GitHub, GitHubIssue};

mod linker;
pub use linker::IssueLinker;

#[cfg(test)]
pub(crate) mod memory;

/// The tracker capabilities reconciliation relies on.
pub trait IssueTracker {
    /// The issue type returned by the tracker.
    type Issue: IssueInfo;

    /// Every issue of the tracked repository. Closed issues are included
    /// only if `include_closed` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker cannot be queried.
    fn issues(&self, include_closed: bool) -> Result<Vec<Self::Issue>, TrackerError>;

    /// A single issue by number, or `None` if there is no such issue.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker cannot be queried.
    fn issue(&self, number: u64) -> Result<Option<Self::Issue>, TrackerError>;
}

/// Errors from the issue-tracker collaborator.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The environment variable holding the access token is not set.
    #[error("no tracker access token: set the {0} environment variable")]
    MissingToken(String),

    /// The access token cannot be sent as an HTTP header.
    #[error("the tracker access token contains invalid characters")]
    InvalidToken,

    /// The request failed or the tracker answered with an error status.
    #[error("tracker request failed")]
    Http(#[from] reqwest::Error),
}
