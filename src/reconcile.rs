//! The reconciliation pipeline.
//!
//! For each pair of current and baseline documents, the rows of both are
//! parsed, each row's history is located and its issues linked, and the
//! current rows are merged with the baseline rows.
//!
//! Everything is computed before anything is returned: a failure anywhere
//! aborts the whole run.

use std::path::{Path, PathBuf};

use tracing::instrument;

use crate::{
    domain::{merge, CommitRef, Config, IssueIndex, MergeError, Requirement, RequirementId},
    storage::{Document, DocumentPair, LoadError, RowParser},
    tracker::{IssueLinker, IssueTracker, TrackerError},
    vcs::{HistoryLocator, VcsError, VersionControl},
};

/// Errors that abort a reconciliation run.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// A document could not be read.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The configured issue reference policy is not a valid pattern.
    #[error("invalid issue reference pattern")]
    ReferencePattern(#[from] regex::Error),

    /// The history of a requirement could not be queried.
    #[error("failed to locate the history of {id} in {}", path.display())]
    History {
        /// The requirement being reconciled.
        id: RequirementId,
        /// The document it was found in.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: VcsError,
    },

    /// The tracker could not be queried.
    #[error("failed to link the issues of {id}")]
    Issues {
        /// The requirement being reconciled.
        id: RequirementId,
        /// The underlying failure.
        #[source]
        source: TrackerError,
    },

    /// The baseline document holds conflicting rows.
    #[error("cannot merge {} with its baseline", path.display())]
    Merge {
        /// The current document.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: MergeError,
    },
}

/// Fetch every issue and index it by the requirement identifiers in its
/// title. Done once per run.
///
/// # Errors
///
/// Returns an error if the tracker cannot be queried.
pub fn build_index<T: IssueTracker>(
    tracker: &T,
    include_closed: bool,
) -> Result<IssueIndex, TrackerError> {
    let issues = tracker.issues(include_closed)?;
    Ok(IssueIndex::build(&issues))
}

/// Drives one reconciliation run.
///
/// Holds the state shared by every document: the history locator and its
/// caches, the issue linker and its caches, and the issue index.
#[derive(Debug)]
pub struct Reconciler<'a, V, T> {
    locator: HistoryLocator<'a, V>,
    linker: IssueLinker,
    index: IssueIndex,
    tracker: &'a T,
    parser: RowParser,
}

impl<'a, V, T> Reconciler<'a, V, T>
where
    V: VersionControl,
    T: IssueTracker,
{
    /// Prepare a run over `vcs` and `tracker` with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured reference policy is invalid.
    pub fn new(
        vcs: &'a V,
        tracker: &'a T,
        index: IssueIndex,
        config: &Config,
    ) -> Result<Self, ReconcileError> {
        Ok(Self {
            locator: HistoryLocator::new(vcs, &config.baseline, &config.mainline),
            linker: IssueLinker::from_config(config)?,
            index,
            tracker,
            parser: RowParser::new(config.annotation_marker.clone()),
        })
    }

    /// Reconcile every document pair, returning the merged requirements of
    /// all documents in order.
    ///
    /// # Errors
    ///
    /// Returns the first failure; no partial result is produced.
    pub fn run<'p>(
        &mut self,
        pairs: impl IntoIterator<Item = &'p DocumentPair>,
    ) -> Result<Vec<Requirement>, ReconcileError> {
        let mut requirements = Vec::new();
        for pair in pairs {
            requirements.extend(self.reconcile(pair)?);
        }
        tracing::info!("Reconciled {} requirements", requirements.len());
        Ok(requirements)
    }

    /// Reconcile one document pair.
    ///
    /// # Errors
    ///
    /// Returns an error if either document cannot be read, a collaborator
    /// fails, or the baseline document holds duplicate identifiers.
    #[instrument(level = "debug", skip_all, fields(document = %pair.relative.display()))]
    pub fn reconcile(&mut self, pair: &DocumentPair) -> Result<Vec<Requirement>, ReconcileError> {
        let current = Document::load(&pair.current, &self.parser)?;

        let new = current
            .into_requirements()
            .into_iter()
            .map(|requirement| self.attribute(requirement, &pair.current))
            .collect::<Result<Vec<_>, _>>()?;

        let old = match &pair.baseline {
            Some(path) => Document::load(path, &self.parser)?
                .into_requirements()
                .into_iter()
                .map(|requirement| self.attribute_baseline(requirement, path))
                .collect::<Result<Vec<_>, _>>()?,
            None => {
                tracing::debug!("No baseline for {}", pair.relative.display());
                Vec::new()
            }
        };

        merge(&new, &old).map_err(|source| ReconcileError::Merge {
            path: pair.current.clone(),
            source,
        })
    }

    fn attribute(
        &mut self,
        requirement: Requirement,
        path: &Path,
    ) -> Result<Requirement, ReconcileError> {
        let id = requirement.id();
        let commits = self
            .locator
            .locate(id, path)
            .map_err(|source| ReconcileError::History {
                id,
                path: path.to_path_buf(),
                source,
            })?;
        self.link(requirement, commits)
    }

    /// As [`Self::attribute`], but a baseline document kept outside the
    /// repository has no history.
    fn attribute_baseline(
        &mut self,
        requirement: Requirement,
        path: &Path,
    ) -> Result<Requirement, ReconcileError> {
        let id = requirement.id();
        let commits = match self.locator.locate(id, path) {
            Ok(commits) => commits,
            Err(VcsError::OutsideRepository { .. }) => {
                tracing::trace!("{} is outside the repository", path.display());
                Vec::new()
            }
            Err(source) => {
                return Err(ReconcileError::History {
                    id,
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        self.link(requirement, commits)
    }

    fn link(
        &mut self,
        requirement: Requirement,
        commits: Vec<CommitRef>,
    ) -> Result<Requirement, ReconcileError> {
        let id = requirement.id();
        let issues = self
            .linker
            .link(id, &commits, &self.index, self.tracker)
            .map_err(|source| ReconcileError::Issues { id, source })?;

        Ok(requirement.with_history(commits, issues))
    }
}
