use std::{
    cmp::Ordering,
    collections::HashSet,
    fmt,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::domain::{RequirementId, Tag, TagKind};

/// The compliance level of a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Level 1, the baseline.
    One,
    /// Level 2.
    Two,
    /// Level 3, the most demanding.
    Three,
}

impl Level {
    /// Derive the level from the three positional marker columns.
    ///
    /// The first non-blank column wins, checked in order 1, 2, 3. If every
    /// column is blank the requirement has no level.
    #[must_use]
    pub fn from_columns(l1: &str, l2: &str, l3: &str) -> Option<Self> {
        [(l1, Self::One), (l2, Self::Two), (l3, Self::Three)]
            .into_iter()
            .find(|(column, _)| !column.trim().is_empty())
            .map(|(_, level)| level)
    }

    /// The level as a number from 1 to 3.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl Serialize for Level {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.number())
    }
}

/// Where a requirement row was found. Provenance only, never identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    /// The document the row was read from.
    pub path: PathBuf,
    /// The 1-based line number of the row.
    pub line: NonZeroUsize,
}

impl Position {
    /// Create a position.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, line: NonZeroUsize) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }

    /// The document the row was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

/// The view of a version-control commit that reconciliation relies on.
///
/// Any client's commit type can take part by implementing this.
pub trait CommitInfo {
    /// The full commit hash.
    fn hash(&self) -> &str;

    /// The full commit message.
    fn message(&self) -> &str;

    /// The commit timestamp, if the client provides one.
    fn time(&self) -> Option<DateTime<FixedOffset>> {
        None
    }
}

/// The view of a tracker issue that reconciliation relies on.
pub trait IssueInfo {
    /// The issue number.
    fn number(&self) -> u64;

    /// The issue title.
    fn title(&self) -> &str;

    /// The canonical, human-facing URL of the issue.
    fn url(&self) -> &str;
}

/// A commit judged relevant to a requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRef {
    hash: String,
    #[serde(rename = "summary", serialize_with = "serialize_summary")]
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<DateTime<FixedOffset>>,
}

fn serialize_summary<S>(message: &str, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(summary_line(message))
}

fn summary_line(message: &str) -> &str {
    message.lines().next().unwrap_or_default().trim()
}

impl CommitRef {
    /// Create a commit reference from its hash and message.
    #[must_use]
    pub fn new(hash: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            message: message.into(),
            time: None,
        }
    }

    /// Copy the fields reconciliation needs out of any client's commit.
    #[must_use]
    pub fn from_info(commit: &impl CommitInfo) -> Self {
        Self {
            hash: commit.hash().to_string(),
            message: commit.message().to_string(),
            time: commit.time(),
        }
    }

    /// The first line of the commit message.
    #[must_use]
    pub fn summary(&self) -> &str {
        summary_line(&self.message)
    }
}

impl CommitInfo for CommitRef {
    fn hash(&self) -> &str {
        &self.hash
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn time(&self) -> Option<DateTime<FixedOffset>> {
        self.time
    }
}

/// A tracker issue judged relevant to a requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueRef {
    number: u64,
    title: String,
    url: String,
}

impl IssueRef {
    /// Create an issue reference.
    #[must_use]
    pub fn new(number: u64, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
            url: url.into(),
        }
    }

    /// Copy the fields reconciliation needs out of any client's issue.
    #[must_use]
    pub fn from_info(issue: &impl IssueInfo) -> Self {
        Self::new(issue.number(), issue.title(), issue.url())
    }

    /// The report order of issues: by number, highest (most recent) first.
    #[must_use]
    pub fn newest_first(a: &Self, b: &Self) -> Ordering {
        b.number.cmp(&a.number)
    }
}

impl IssueInfo for IssueRef {
    fn number(&self) -> u64 {
        self.number
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Deduplicate issues by number and order them newest first.
///
/// When two entries share a number, the one yielded first is kept.
pub(crate) fn unify_issues(issues: impl IntoIterator<Item = IssueRef>) -> Vec<IssueRef> {
    let mut seen = HashSet::new();
    let mut unified: Vec<IssueRef> = issues
        .into_iter()
        .filter(|issue| seen.insert(issue.number))
        .collect();
    unified.sort_by(IssueRef::newest_first);
    unified
}

/// One identified row of a requirements document, with the history and
/// tracker issues attributed to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub(crate) id: RequirementId,
    pub(crate) tag: Option<Tag>,
    pub(crate) description: String,
    pub(crate) level: Option<Level>,
    pub(crate) position: Option<Position>,
    pub(crate) commits: Vec<CommitRef>,
    pub(crate) issues: Vec<IssueRef>,
}

impl Requirement {
    /// Construct a requirement with no attributed commits or issues.
    #[must_use]
    pub const fn new(
        id: RequirementId,
        tag: Option<Tag>,
        description: String,
        level: Option<Level>,
        position: Option<Position>,
    ) -> Self {
        Self {
            id,
            tag,
            description,
            level,
            position,
            commits: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// Returns a copy of this requirement carrying the given history.
    ///
    /// Issues are deduplicated by number and ordered newest first.
    #[must_use]
    pub fn with_history(self, commits: Vec<CommitRef>, issues: Vec<IssueRef>) -> Self {
        Self {
            commits,
            issues: unify_issues(issues),
            ..self
        }
    }

    /// The requirement identifier.
    #[must_use]
    pub const fn id(&self) -> RequirementId {
        self.id
    }

    /// The change note, if the row carries one.
    #[must_use]
    pub const fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }

    /// The change category, [`TagKind::Untagged`] if there is no tag.
    #[must_use]
    pub fn tag_kind(&self) -> TagKind {
        self.tag.as_ref().map_or(TagKind::Untagged, Tag::kind)
    }

    /// The cleaned description text.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The compliance level, if any column marks one.
    #[must_use]
    pub const fn level(&self) -> Option<Level> {
        self.level
    }

    /// Where the row was found.
    #[must_use]
    pub const fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// The commits judged relevant to this requirement.
    #[must_use]
    pub fn commits(&self) -> &[CommitRef] {
        &self.commits
    }

    /// The tracker issues judged relevant to this requirement, newest first.
    #[must_use]
    pub fn issues(&self) -> &[IssueRef] {
        &self.issues
    }
}
