//! Textual cross-references between commits, issues and requirements.
//!
//! Two grammars are recognised:
//!
//! - issue references in free text (`#123`, `issue 123`, `PR 45`,
//!   `issues/678`), see [`ReferencePattern`]
//! - requirement identifiers in issue titles (`1.2.3`), see
//!   [`requirement_ids`]

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::LazyLock,
};

use regex::Regex;

use crate::domain::{
    requirement::{IssueInfo, IssueRef},
    RequirementId,
};

/// Matches issue references in free text, such as commit messages.
///
/// A reference is one of the cues `issues/`, `pull/`, `issue`, `pr` (each
/// word optionally followed by a single space) or `#`, immediately followed
/// by a number with at least the configured count of digits. Short numbers
/// are ignored so that version numbers and list items do not produce false
/// positives.
#[derive(Debug, Clone)]
pub struct ReferencePattern {
    regex: Regex,
}

impl ReferencePattern {
    /// Build a pattern accepting numbers of at least `min_digits` digits.
    ///
    /// A minimum of zero is treated as one.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting regular expression is too large to
    /// compile.
    pub fn new(min_digits: usize) -> Result<Self, regex::Error> {
        let min_digits = min_digits.max(1);
        let regex = Regex::new(&format!(
            r"(?i)(?:issues/|pull/|\bissue ?|\bpr ?|#)([0-9]{{{min_digits},}})"
        ))?;
        Ok(Self { regex })
    }

    /// Returns the distinct issue numbers referenced in `text`.
    #[must_use]
    pub fn numbers(&self, text: &str) -> BTreeSet<u64> {
        self.regex
            .captures_iter(text)
            .filter_map(|captures| captures.get(1)?.as_str().parse().ok())
            .collect()
    }
}

static REQUIREMENT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[1-9][0-9]*\.[1-9][0-9]*\.[1-9][0-9]*").expect("pattern is valid")
});

/// Returns the requirement identifiers mentioned in `text`, in order of
/// appearance.
///
/// A mention must stand on its own: `v1.2.3.4`, `01.2.3` and `1.2.3.5` are
/// not mentions of `1.2.3`.
#[must_use]
pub fn requirement_ids(text: &str) -> Vec<RequirementId> {
    let bytes = text.as_bytes();
    REQUIREMENT_ID
        .find_iter(text)
        .filter(|found| {
            let before = found.start().checked_sub(1).map(|i| bytes[i]);
            let after = bytes.get(found.end()).copied();
            let after_next = bytes.get(found.end() + 1).copied();

            let joined_before = before.is_some_and(|b| b.is_ascii_digit() || b == b'.');
            let joined_after = after.is_some_and(|b| b.is_ascii_digit())
                || (after == Some(b'.') && after_next.is_some_and(|b| b.is_ascii_digit()));

            !joined_before && !joined_after
        })
        .filter_map(|found| found.as_str().parse().ok())
        .collect()
}

/// A reverse index from requirement identifier to the tracker issues whose
/// title mentions it.
///
/// Built once per run from the full issue list and shared by every
/// component that needs it.
#[derive(Debug, Default, Clone)]
pub struct IssueIndex {
    by_number: BTreeMap<u64, IssueRef>,
    by_requirement: HashMap<RequirementId, Vec<u64>>,
}

impl IssueIndex {
    /// Index every issue under each requirement identifier in its title.
    pub fn build<'a, I>(issues: impl IntoIterator<Item = &'a I>) -> Self
    where
        I: IssueInfo + 'a,
    {
        let mut index = Self::default();

        for issue in issues {
            let number = issue.number();
            for id in requirement_ids(issue.title()) {
                let numbers = index.by_requirement.entry(id).or_default();
                if !numbers.contains(&number) {
                    numbers.push(number);
                }
            }
            index.by_number.insert(number, IssueRef::from_info(issue));
        }

        tracing::debug!(
            issues = index.by_number.len(),
            requirements = index.by_requirement.len(),
            "built issue index"
        );

        index
    }

    /// Look up an issue by number.
    #[must_use]
    pub fn issue(&self, number: u64) -> Option<&IssueRef> {
        self.by_number.get(&number)
    }

    /// The issues whose title mentions `id`.
    pub fn mentioning(&self, id: RequirementId) -> impl Iterator<Item = &IssueRef> {
        self.by_requirement
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|number| self.by_number.get(number))
    }

    /// The number of indexed issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_number.len()
    }

    /// Whether the index holds no issues.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_number.is_empty()
    }
}
