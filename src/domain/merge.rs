//! Three-way reconciliation of two revisions of a requirements document.
//!
//! The current revision anchors the result: every requirement it contains
//! appears exactly once, requirements that only exist in the prior revision
//! are dropped.

use std::collections::HashMap;

use thiserror::Error;
use tracing::instrument;

use crate::domain::{
    requirement::{unify_issues, Requirement},
    RequirementId,
};

/// Errors that can occur while merging two revisions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    /// The prior revision holds more than one row with the same identifier.
    #[error("requirement {id} appears {count} times in the prior revision")]
    DuplicateId {
        /// The ambiguous identifier.
        id: RequirementId,
        /// How many rows carry it.
        count: usize,
    },
}

/// Combine one requirement from each revision into a new record.
///
/// Scalar fields come from `new` when present and fall back to `old`.
/// Commits are `new` then `old`, concatenated as-is. Issues are the union of
/// both sides, deduplicated by number with `new`'s copy kept, newest first.
#[must_use]
pub fn combine(new: &Requirement, old: &Requirement) -> Requirement {
    let description = if new.description.is_empty() {
        old.description.clone()
    } else {
        new.description.clone()
    };

    Requirement {
        id: new.id,
        tag: new.tag.clone().or_else(|| old.tag.clone()),
        description,
        level: new.level.or(old.level),
        position: new.position.clone().or_else(|| old.position.clone()),
        commits: new.commits.iter().chain(&old.commits).cloned().collect(),
        issues: unify_issues(new.issues.iter().chain(&old.issues).cloned()),
    }
}

/// Merge the current revision's requirements with the prior revision's.
///
/// The output holds one record per requirement in `new`, in `new`'s order.
///
/// # Errors
///
/// Returns [`MergeError::DuplicateId`] if a requirement in `new` matches more
/// than one requirement in `old`.
#[instrument(level = "debug", skip_all, fields(new = new.len(), old = old.len()))]
pub fn merge(new: &[Requirement], old: &[Requirement]) -> Result<Vec<Requirement>, MergeError> {
    let mut by_id: HashMap<RequirementId, Vec<&Requirement>> = HashMap::new();
    for requirement in old {
        by_id.entry(requirement.id).or_default().push(requirement);
    }

    new.iter()
        .map(|requirement| match by_id.get(&requirement.id).map(Vec::as_slice) {
            None | Some([]) => Ok(requirement.clone()),
            Some([previous]) => Ok(combine(requirement, previous)),
            Some(matches) => Err(MergeError::DuplicateId {
                id: requirement.id,
                count: matches.len(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::domain::{
        requirement::{CommitInfo, CommitRef, IssueInfo, IssueRef, Level, Position},
        Tag,
    };

    fn requirement(id: &str, tag: Option<&str>, description: &str) -> Requirement {
        Requirement::new(
            id.parse().unwrap(),
            tag.and_then(Tag::new),
            description.to_string(),
            None,
            None,
        )
    }

    fn ids(requirements: &[Requirement]) -> Vec<String> {
        requirements.iter().map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn tag_falls_back_but_description_does_not() {
        let new = requirement("1.1.1", None, "B");
        let old = requirement("1.1.1", Some("ADDED"), "A");

        let merged = combine(&new, &old);

        assert_eq!(merged.tag().unwrap().text(), "ADDED");
        assert_eq!(merged.description(), "B");
    }

    #[test]
    fn empty_description_falls_back() {
        let new = requirement("1.1.1", Some("MODIFIED"), "");
        let old = requirement("1.1.1", Some("ADDED"), "A");

        let merged = combine(&new, &old);

        assert_eq!(merged.tag().unwrap().text(), "MODIFIED");
        assert_eq!(merged.description(), "A");
    }

    #[test]
    fn level_and_position_fall_back() {
        let position = Position::new("old.md", NonZeroUsize::new(12).unwrap());
        let new = requirement("1.1.1", None, "B");
        let old = Requirement {
            level: Some(Level::Two),
            position: Some(position.clone()),
            ..requirement("1.1.1", None, "A")
        };

        let merged = combine(&new, &old);

        assert_eq!(merged.level(), Some(Level::Two));
        assert_eq!(merged.position(), Some(&position));

        let new = Requirement {
            level: Some(Level::One),
            ..new
        };
        assert_eq!(combine(&new, &old).level(), Some(Level::One));
    }

    #[test]
    fn commits_are_concatenated_new_first() {
        let new = requirement("1.1.1", None, "B").with_history(
            vec![CommitRef::new("c2", "second"), CommitRef::new("c1", "first")],
            Vec::new(),
        );
        let old = requirement("1.1.1", None, "A")
            .with_history(vec![CommitRef::new("c1", "first")], Vec::new());

        let merged = combine(&new, &old);

        let hashes: Vec<&str> = merged.commits().iter().map(CommitInfo::hash).collect();
        assert_eq!(hashes, ["c2", "c1", "c1"]);
    }

    #[test]
    fn shared_issue_keeps_new_copy() {
        let new = requirement("1.1.1", None, "B").with_history(
            Vec::new(),
            vec![IssueRef::new(42, "new title", "u-new")],
        );
        let old = requirement("1.1.1", None, "A").with_history(
            Vec::new(),
            vec![
                IssueRef::new(42, "old title", "u-old"),
                IssueRef::new(99, "other", "u99"),
            ],
        );

        let merged = combine(&new, &old);

        let numbers: Vec<u64> = merged.issues().iter().map(IssueInfo::number).collect();
        assert_eq!(numbers, [99, 42]);
        assert_eq!(merged.issues()[1].title(), "new title");
    }

    #[test]
    fn output_is_anchored_to_new_revision() {
        let new = vec![requirement("1.1.1", None, "x"), requirement("1.2.1", None, "y")];
        let old = vec![requirement("1.2.1", None, "z"), requirement("1.3.1", None, "w")];

        let merged = merge(&new, &old).unwrap();

        assert_eq!(ids(&merged), ["1.1.1", "1.2.1"]);
        assert_eq!(merged[1].description(), "y");
    }

    #[test]
    fn unmatched_requirement_passes_through() {
        let new = vec![requirement("3.1.1", Some("ADDED"), "fresh")];

        let merged = merge(&new, &[]).unwrap();

        assert_eq!(merged, new);
    }

    #[test]
    fn duplicate_in_prior_revision_is_an_error() {
        let new = vec![requirement("2.1.1", None, "x")];
        let old = vec![requirement("2.1.1", None, "a"), requirement("2.1.1", None, "b")];

        let error = merge(&new, &old).unwrap_err();

        assert_eq!(
            error,
            MergeError::DuplicateId {
                id: "2.1.1".parse().unwrap(),
                count: 2
            }
        );
    }

    #[test]
    fn sources_are_left_untouched() {
        let new = vec![requirement("1.1.1", None, "B")];
        let old = vec![requirement("1.1.1", Some("ADDED"), "A")];
        let (new_before, old_before) = (new.clone(), old.clone());

        let _ = merge(&new, &old).unwrap();

        assert_eq!(new, new_before);
        assert_eq!(old, old_before);
    }
}
