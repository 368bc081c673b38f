//! Domain models for requirement reconciliation.
//!
//! This module contains the core domain types: requirement identifiers and
//! tags, requirement records with their attributed history, the textual
//! reference grammars, and the merge of two document revisions. Nothing in
//! here performs I/O.

/// Requirement identifier types and parsing.
pub mod id;
pub use id::{Error as IdError, RequirementId};

/// Change tags and their categories.
pub mod tag;
pub use tag::{Tag, TagKind};

/// Requirement records and the capability views of commits and issues.
pub mod requirement;
pub use requirement::{CommitInfo, CommitRef, IssueInfo, IssueRef, Level, Position, Requirement};

pub mod references;
pub use references::{IssueIndex, ReferencePattern};

pub mod merge;
pub use merge::{merge, MergeError};

mod config;
pub use config::{Config, TrackerConfig};
