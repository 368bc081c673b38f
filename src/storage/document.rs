use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use tracing::instrument;

use crate::{
    domain::{Position, Requirement},
    storage::RowParser,
};

/// The requirement rows of one markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
    requirements: Vec<Requirement>,
}

impl Document {
    /// Read every requirement row from `reader`, recording positions against
    /// `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if a line cannot be read.
    pub fn read<R: BufRead>(reader: R, path: &Path, parser: &RowParser) -> io::Result<Self> {
        let mut requirements = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line_number = NonZeroUsize::MIN.saturating_add(index);
            if let Some(requirement) = parser.parse(&line, Position::new(path, line_number)) {
                requirements.push(requirement);
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            requirements,
        })
    }

    /// Load the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::NotFound`] if there is no file at `path`, or
    /// [`LoadError::Io`] if it cannot be read.
    #[instrument(level = "debug", skip(parser))]
    pub fn load(path: &Path, parser: &RowParser) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|io_error| match io_error.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            _ => LoadError::Io(path.to_path_buf(), io_error),
        })?;

        let document = Self::read(BufReader::new(file), path, parser)
            .map_err(|e| LoadError::Io(path.to_path_buf(), e))?;

        tracing::debug!(
            "Parsed {} requirements from {}",
            document.requirements.len(),
            path.display()
        );

        Ok(document)
    }

    /// The path the document was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The requirement rows, in document order.
    #[must_use]
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Consume the document, returning its requirement rows.
    #[must_use]
    pub fn into_requirements(self) -> Vec<Requirement> {
        self.requirements
    }
}

/// Errors that can occur when loading a document.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The document was not found.
    #[error("document not found: {}", .0.display())]
    NotFound(PathBuf),
    /// An I/O error occurred.
    #[error("failed to read {}", .0.display())]
    Io(PathBuf, #[source] io::Error),
}
