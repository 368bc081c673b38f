pub mod directory;
mod document;
/// Parsing requirement rows out of markdown table lines.
pub mod row;

pub use directory::{pair_documents, DirectoryError, DocumentPair, RevisionDirectory};
pub use document::{Document, LoadError};
pub use row::RowParser;
