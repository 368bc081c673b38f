use std::collections::{BTreeSet, HashMap};

use tracing::instrument;

use super::{IssueTracker, TrackerError};
use crate::domain::{
    CommitInfo, Config, IssueIndex, IssueInfo, IssueRef, ReferencePattern, RequirementId,
    requirement::unify_issues,
};

/// Attributes tracker issues to requirements.
///
/// An issue is attributed to a requirement if one of the requirement's
/// commits references it, or if its title mentions the requirement's
/// identifier. Issues on the denylist are never attributed.
///
/// Referenced issues missing from the [`IssueIndex`] are fetched from the
/// tracker one at a time and remembered for the rest of the run.
#[derive(Debug)]
pub struct IssueLinker {
    pattern: ReferencePattern,
    ignored: BTreeSet<u64>,
    fetched: HashMap<u64, Option<IssueRef>>,
}

impl IssueLinker {
    /// Create a linker using `pattern` and never attributing the `ignored`
    /// issue numbers.
    #[must_use]
    pub fn new(pattern: ReferencePattern, ignored: impl IntoIterator<Item = u64>) -> Self {
        Self {
            pattern,
            ignored: ignored.into_iter().collect(),
            fetched: HashMap::new(),
        }
    }

    /// Create a linker from the reference policy in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference pattern cannot be compiled.
    pub fn from_config(config: &Config) -> Result<Self, regex::Error> {
        Ok(Self::new(
            ReferencePattern::new(config.min_reference_digits())?,
            config.ignored_issues().iter().copied(),
        ))
    }

    /// The issues attributed to requirement `id` with the given commits,
    /// ordered newest first.
    ///
    /// References to issue numbers the tracker does not know are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker has to be consulted and fails.
    #[instrument(level = "debug", skip(self, commits, index, tracker))]
    pub fn link<C, T>(
        &mut self,
        id: RequirementId,
        commits: &[C],
        index: &IssueIndex,
        tracker: &T,
    ) -> Result<Vec<IssueRef>, TrackerError>
    where
        C: CommitInfo,
        T: IssueTracker,
    {
        let referenced: BTreeSet<u64> = commits
            .iter()
            .flat_map(|commit| self.pattern.numbers(commit.message()))
            .filter(|number| !self.ignored.contains(number))
            .collect();

        let mut issues = Vec::with_capacity(referenced.len());
        for number in referenced {
            if let Some(issue) = self.resolve(number, index, tracker)? {
                issues.push(issue);
            }
        }

        issues.extend(
            index
                .mentioning(id)
                .filter(|issue| !self.ignored.contains(&issue.number()))
                .cloned(),
        );

        Ok(unify_issues(issues))
    }

    fn resolve<T: IssueTracker>(
        &mut self,
        number: u64,
        index: &IssueIndex,
        tracker: &T,
    ) -> Result<Option<IssueRef>, TrackerError> {
        if let Some(issue) = index.issue(number) {
            return Ok(Some(issue.clone()));
        }
        if let Some(known) = self.fetched.get(&number) {
            return Ok(known.clone());
        }

        let issue = tracker.issue(number)?.map(|issue| IssueRef::from_info(&issue));
        if issue.is_none() {
            tracing::debug!("Issue #{number} is referenced but does not exist");
        }
        self.fetched.insert(number, issue.clone());
        Ok(issue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::CommitRef, tracker::memory::MemoryTracker};

    fn tracker() -> MemoryTracker {
        MemoryTracker::new()
            .open(120, "Clarify 1.2.3")
            .open(150, "Typo in 2.1.1 and 1.2.3")
            .closed(170, "Old discussion")
            .open(300, "Tracking issue for everything")
            .open(410, "Unrelated")
    }

    fn numbers(issues: &[IssueRef]) -> Vec<u64> {
        issues.iter().map(IssueInfo::number).collect()
    }

    #[test]
    fn commits_and_titles_are_unioned_newest_first() {
        let tracker = tracker();
        let index = IssueIndex::build(&tracker.issues(true).unwrap());
        let mut linker = IssueLinker::new(ReferencePattern::new(2).unwrap(), []);
        let commits = [
            CommitRef::new("a", "Merge pull request #410 from fork/branch"),
            CommitRef::new("b", "Reword, see issue 120"),
        ];

        let issues = linker
            .link("1.2.3".parse().unwrap(), &commits, &index, &tracker)
            .unwrap();

        assert_eq!(numbers(&issues), [410, 150, 120]);
        assert_eq!(issues[0].url(), "https://tracker.test/issues/410");
    }

    #[test]
    fn ignored_issues_are_never_attributed() {
        let tracker = tracker();
        let index = IssueIndex::build(&tracker.issues(true).unwrap());
        let mut linker = IssueLinker::new(ReferencePattern::new(2).unwrap(), [300, 150]);
        let commits = [CommitRef::new("a", "Part of #300, fixes #120")];

        let issues = linker
            .link("1.2.3".parse().unwrap(), &commits, &index, &tracker)
            .unwrap();

        assert_eq!(numbers(&issues), [120]);
    }

    #[test]
    fn unindexed_issues_are_fetched_once() {
        let tracker = tracker();
        let index = IssueIndex::build(&tracker.issues(false).unwrap());
        let mut linker = IssueLinker::new(ReferencePattern::new(2).unwrap(), []);
        let commits = [CommitRef::new("a", "Revisit #170 and #999")];

        for _ in 0..3 {
            let issues = linker
                .link("9.9.9".parse().unwrap(), &commits, &index, &tracker)
                .unwrap();
            assert_eq!(numbers(&issues), [170]);
        }

        // #170 is closed and so not indexed; #999 does not exist.
        assert_eq!(tracker.lookups(), 2);
    }

    #[test]
    fn short_references_are_ignored() {
        let tracker = tracker();
        let index = IssueIndex::build(&tracker.issues(true).unwrap());
        let mut linker = IssueLinker::new(ReferencePattern::new(3).unwrap(), []);
        let commits = [CommitRef::new("a", "Bump to #12")];

        let issues = linker
            .link("4.4.4".parse().unwrap(), &commits, &index, &tracker)
            .unwrap();

        assert!(issues.is_empty());
        assert_eq!(tracker.lookups(), 0);
    }

    #[test]
    fn configured_policy_is_applied() {
        let mut config = Config::default();
        config.ignore_issue(120);
        let tracker = tracker();
        let index = IssueIndex::build(&tracker.issues(true).unwrap());
        let mut linker = IssueLinker::from_config(&config).unwrap();

        let issues = linker
            .link::<CommitRef, _>("1.2.3".parse().unwrap(), &[], &index, &tracker)
            .unwrap();

        assert_eq!(numbers(&issues), [150]);
    }
}
