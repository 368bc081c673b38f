//! Rendering reconciled requirements as a changelog.
//!
//! The markdown rendering is a table with one row per requirement:
//!
//! ```text
//! | Id | Level | Issues | Status | Description |
//! | :---: | :---: | --- | :---: | --- |
//! | 1.2.3 | 2 | <a href='…' title='…'>#120</a> | <span title='ADDED'>🆕</span> | Verify that … |
//! ```
//!
//! Rows are ordered by requirement identifier. Apostrophes and vertical bars
//! in any cell or attribute are replaced by HTML entities so that they
//! cannot break out of an attribute or split a row.

use serde::Serialize;

use crate::domain::{
    CommitRef, IssueInfo, IssueRef, Level, Position, Requirement, RequirementId, Tag, TagKind,
};

/// The table header and separator rows.
pub const HEADER: &str = concat!(
    "| Id | Level | Issues | Status | Description |\n",
    "| :---: | :---: | --- | :---: | --- |",
);

/// An output format for the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// A markdown table.
    #[default]
    Markdown,
    /// A JSON array of requirement records.
    Json,
}

impl Format {
    /// Render `requirements` in this format.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render(self, requirements: &[Requirement]) -> Result<String, serde_json::Error> {
        match self {
            Self::Markdown => Ok(markdown(requirements)),
            Self::Json => json(requirements),
        }
    }
}

/// Replace the characters that would corrupt a row or attribute.
#[must_use]
pub fn escape(text: &str) -> String {
    text.replace('\'', "&#39;").replace('|', "&#124;")
}

/// The requirements in report order: by identifier, then by position.
#[must_use]
pub fn ordered(requirements: &[Requirement]) -> Vec<&Requirement> {
    let mut ordered: Vec<&Requirement> = requirements.iter().collect();
    ordered.sort_by(|a, b| {
        a.id()
            .cmp(&b.id())
            .then_with(|| a.position().cmp(&b.position()))
    });
    ordered
}

/// Render the full markdown table, header included, ending in a newline.
#[must_use]
pub fn markdown(requirements: &[Requirement]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for requirement in ordered(requirements) {
        out.push_str(&row(requirement));
        out.push('\n');
    }
    out
}

/// Render one requirement as a table row.
#[must_use]
pub fn row(requirement: &Requirement) -> String {
    let level = requirement
        .level()
        .map(|level| level.to_string())
        .unwrap_or_default();

    format!(
        "| {} | {} | {} | {} | {} |",
        requirement.id(),
        level,
        issue_links(requirement.issues()),
        status(requirement.tag()),
        escape(requirement.description()),
    )
}

fn issue_links(issues: &[IssueRef]) -> String {
    issues
        .iter()
        .map(|issue| {
            format!(
                "<a href='{}' title='{}'>#{}</a>",
                escape(issue.url()),
                escape(issue.title()),
                issue.number()
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn status(tag: Option<&Tag>) -> String {
    tag.map(|tag| format!("<span title='{}'>{}</span>", escape(tag.text()), tag.kind().glyph()))
        .unwrap_or_default()
}

#[derive(Serialize)]
struct Record<'a> {
    id: RequirementId,
    level: Option<Level>,
    tag: Option<&'a Tag>,
    kind: TagKind,
    description: &'a str,
    position: Option<&'a Position>,
    commits: &'a [CommitRef],
    issues: &'a [IssueRef],
}

impl<'a> From<&'a Requirement> for Record<'a> {
    fn from(requirement: &'a Requirement) -> Self {
        Self {
            id: requirement.id(),
            level: requirement.level(),
            tag: requirement.tag(),
            kind: requirement.tag_kind(),
            description: requirement.description(),
            position: requirement.position(),
            commits: requirement.commits(),
            issues: requirement.issues(),
        }
    }
}

/// Render the requirements as a pretty-printed JSON array, in report order.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn json(requirements: &[Requirement]) -> Result<String, serde_json::Error> {
    let records: Vec<Record<'_>> = ordered(requirements).into_iter().map(Record::from).collect();
    serde_json::to_string_pretty(&records)
}
