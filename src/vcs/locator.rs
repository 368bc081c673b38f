use std::{
    collections::{HashMap, HashSet},
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use tracing::instrument;

use super::{CommitId, MainlineCommit, RevRange, VcsError, VersionControl};
use crate::domain::{CommitRef, RequirementId};

/// Finds the commits relevant to each requirement's history.
///
/// The mainline's first-parent chain, resolved merge commits and commit
/// metadata are cached, so one locator should be reused for a whole run.
#[derive(Debug)]
pub struct HistoryLocator<'a, V> {
    vcs: &'a V,
    range: RevRange,
    mainline: Option<Vec<MainlineCommit>>,
    merges: HashMap<CommitId, Option<CommitId>>,
    commits: HashMap<CommitId, CommitRef>,
    baseline_paths: HashMap<PathBuf, bool>,
}

impl<'a, V: VersionControl> HistoryLocator<'a, V> {
    /// Create a locator searching `(baseline, mainline]`.
    #[must_use]
    pub fn new(vcs: &'a V, baseline: &str, mainline: &str) -> Self {
        Self {
            vcs,
            range: RevRange::new(baseline, mainline),
            mainline: None,
            merges: HashMap::new(),
            commits: HashMap::new(),
            baseline_paths: HashMap::new(),
        }
    }

    /// The revision range searched.
    #[must_use]
    pub const fn range(&self) -> &RevRange {
        &self.range
    }

    /// The commits relevant to requirement `id` in the document at `path`.
    ///
    /// These are the commits whose patch adds or removes the requirement's
    /// marker text, followed by the merge commits that brought them into the
    /// mainline, without duplicates. A document absent from the baseline
    /// revision has no relevant history.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be queried.
    #[instrument(level = "debug", skip(self, path), fields(path = %path.display()))]
    pub fn locate(&mut self, id: RequirementId, path: &Path) -> Result<Vec<CommitRef>, VcsError> {
        if !self.in_baseline(path)? {
            return Ok(Vec::new());
        }

        let touched = self.vcs.search_log(&id.marker(), &self.range, path)?;

        let mut relevant = touched.clone();
        for commit in &touched {
            if let Some(merge) = self.resolve_merge(commit)? {
                relevant.push(merge);
            }
        }

        let mut seen = HashSet::new();
        relevant.retain(|hash| seen.insert(hash.clone()));

        tracing::debug!(
            "{id}: {} touching commits, {} relevant",
            touched.len(),
            relevant.len()
        );

        relevant.iter().map(|hash| self.commit(hash)).collect()
    }

    /// The merge commit that brought `commit` into the mainline.
    ///
    /// Two strategies must agree: the first mainline commit (walking back
    /// from the tip) that has `commit` as a direct parent, and the mainline
    /// commit that reaches `commit` only through its non-first parents. If
    /// they disagree, or neither finds one, there is no attributed merge.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be queried.
    pub fn resolve_merge(&mut self, commit: &str) -> Result<Option<CommitId>, VcsError> {
        if let Some(known) = self.merges.get(commit) {
            return Ok(known.clone());
        }

        let by_parent = self.merge_by_parent_set(commit)?;
        let by_reachability = self.merge_by_reachability(commit)?;

        let merge = if by_parent == by_reachability {
            by_parent
        } else {
            tracing::debug!(
                "Merge of {commit} is ambiguous: parent set says {by_parent:?}, reachability says \
                 {by_reachability:?}"
            );
            None
        };

        self.merges.insert(commit.to_string(), merge.clone());
        Ok(merge)
    }

    /// The commit that last touched `line` of `path` at the mainline tip.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be queried.
    pub fn last_touched(
        &mut self,
        path: &Path,
        line: NonZeroUsize,
    ) -> Result<Option<CommitRef>, VcsError> {
        let until = self.range.until.clone();
        self.vcs
            .blame(&until, path, line)?
            .map(|hash| self.commit(&hash))
            .transpose()
    }

    fn in_baseline(&mut self, path: &Path) -> Result<bool, VcsError> {
        if let Some(&known) = self.baseline_paths.get(path) {
            return Ok(known);
        }
        let present = self.vcs.contains_path(&self.range.since, path)?;
        if !present {
            tracing::debug!("{} is not in {}", path.display(), self.range.since);
        }
        self.baseline_paths.insert(path.to_path_buf(), present);
        Ok(present)
    }

    fn mainline(&mut self) -> Result<&[MainlineCommit], VcsError> {
        if self.mainline.is_none() {
            let chain = self.vcs.first_parent_chain(&self.range)?;
            tracing::debug!("Mainline {} has {} commits", self.range, chain.len());
            self.mainline = Some(chain);
        }
        Ok(self.mainline.as_deref().unwrap_or_default())
    }

    fn merge_by_parent_set(&mut self, commit: &str) -> Result<Option<CommitId>, VcsError> {
        Ok(self
            .mainline()?
            .iter()
            .find(|candidate| candidate.parents.iter().any(|p| p == commit))
            .map(|merge| merge.id.clone()))
    }

    fn merge_by_reachability(&mut self, commit: &str) -> Result<Option<CommitId>, VcsError> {
        let vcs = self.vcs;
        let chain = self.mainline()?;

        // Reachability of `commit` is monotone along the chain: every mainline
        // commit newer than the one that introduced it reaches it, every older
        // one does not. Bisect for the oldest one that does.
        let (mut newer, mut older) = (0, chain.len());
        while newer < older {
            let mid = newer + (older - newer) / 2;
            if vcs.is_ancestor(commit, &chain[mid].id)? {
                newer = mid + 1;
            } else {
                older = mid;
            }
        }

        let Some(entry) = newer.checked_sub(1).map(|i| &chain[i]) else {
            return Ok(None);
        };

        let Some((first, rest)) = entry.parents.split_first() else {
            return Ok(None);
        };
        if vcs.is_ancestor(commit, first)? {
            return Ok(None);
        }
        for parent in rest {
            if vcs.is_ancestor(commit, parent)? {
                return Ok(Some(entry.id.clone()));
            }
        }

        // The commit is the mainline commit itself.
        Ok(None)
    }

    fn commit(&mut self, hash: &str) -> Result<CommitRef, VcsError> {
        if let Some(known) = self.commits.get(hash) {
            return Ok(known.clone());
        }
        let commit = CommitRef::from_info(&self.vcs.commit(hash)?);
        self.commits.insert(hash.to_string(), commit.clone());
        Ok(commit)
    }
}
