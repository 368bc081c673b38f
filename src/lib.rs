//! Requirement changelogs from document revisions, git history and issues.
//!
//! Requirements are rows of markdown tables, identified by a bolded dotted
//! identifier such as `**1.2.3**`. Given the current and baseline revisions
//! of a set of documents, this crate attributes to each requirement the
//! commits that touched its row and the tracker issues that discuss it, and
//! merges the two revisions into one record per current requirement.

pub mod domain;
pub use domain::{
    CommitInfo, CommitRef, Config, IssueIndex, IssueInfo, IssueRef, Level, Requirement,
    RequirementId, Tag, TagKind,
};

/// Reading requirement documents and revision directories.
pub mod storage;
pub use storage::{Document, RevisionDirectory, RowParser};

pub mod vcs;
pub use vcs::{GitCli, HistoryLocator, VersionControl};

pub mod tracker;
pub use tracker::{GitHub, IssueLinker, IssueTracker};

pub mod report;

pub mod reconcile;
pub use reconcile::{ReconcileError, Reconciler};
