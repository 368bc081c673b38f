//! Locating requirement documents in revision directories.
//!
//! Two parallel trees are consumed, the current revision and the baseline
//! revision. Documents are found by matching a glob against their path
//! relative to the tree root, and paired by that relative path.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern, PatternError};
use walkdir::WalkDir;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A directory holding one revision of the requirements documents.
#[derive(Debug, Clone)]
pub struct RevisionDirectory {
    root: PathBuf,
    pattern: Pattern,
}

impl RevisionDirectory {
    /// Open a revision directory, matching documents against `pattern`.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid glob.
    pub fn new(root: impl Into<PathBuf>, pattern: &str) -> Result<Self, DirectoryError> {
        Ok(Self {
            root: root.into(),
            pattern: Pattern::new(pattern)?,
        })
    }

    /// The root of the revision directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The paths of matching documents, relative to the root, in sorted
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not a readable directory.
    pub fn documents(&self) -> Result<Vec<PathBuf>, DirectoryError> {
        if !self.root.is_dir() {
            return Err(DirectoryError::NotADirectory(self.root.clone()));
        }

        let documents = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                entry
                    .path()
                    .strip_prefix(&self.root)
                    .ok()
                    .map(Path::to_path_buf)
            })
            .filter(|relative| self.pattern.matches_path_with(relative, MATCH_OPTIONS))
            .collect();

        Ok(documents)
    }

    /// The absolute location of a document given its relative path.
    #[must_use]
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }
}

/// A current-revision document and its baseline counterpart, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPair {
    /// The path shared by both documents, relative to each tree's root.
    pub relative: PathBuf,
    /// The document in the current revision.
    pub current: PathBuf,
    /// The document in the baseline revision, if one exists at the same
    /// relative path.
    pub baseline: Option<PathBuf>,
}

/// Pair every current-revision document with its baseline counterpart.
///
/// Baseline documents without a current counterpart are ignored, the report
/// is anchored to the current revision.
///
/// # Errors
///
/// Returns an error if the current revision directory cannot be listed.
pub fn pair_documents(
    current: &RevisionDirectory,
    baseline: &RevisionDirectory,
) -> Result<Vec<DocumentPair>, DirectoryError> {
    let pairs: Vec<DocumentPair> = current
        .documents()?
        .into_iter()
        .map(|relative| {
            let counterpart = baseline.resolve(&relative);
            DocumentPair {
                current: current.resolve(&relative),
                baseline: counterpart.is_file().then_some(counterpart),
                relative,
            }
        })
        .collect();

    tracing::debug!(
        "Paired {} documents ({} with a baseline)",
        pairs.len(),
        pairs.iter().filter(|pair| pair.baseline.is_some()).count()
    );

    Ok(pairs)
}

/// Errors that can occur when locating documents.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// The document pattern is not a valid glob.
    #[error("invalid document pattern: {0}")]
    Pattern(#[from] PatternError),
    /// The revision root is missing or not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}
