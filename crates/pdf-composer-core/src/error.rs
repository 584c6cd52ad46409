use thiserror::Error;

use crate::editor::SourceId;

/// Unified error type for pdf-composer-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Parsing source documents
/// - Page addressing and copying
/// - Logo image decoding and embedding
/// - Editor compilation (missing sources)
/// - Output assembly and serialization
/// - Thumbnail rendering
/// - Configuration loading
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Document Errors
    // ==========================================================================
    /// Failed to parse a source PDF
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Page index not present in a source document
    #[error("page index {page} out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// Error from the lopdf object model
    #[error("lopdf error: {0}")]
    Lopdf(String),

    // ==========================================================================
    // Drawing Errors
    // ==========================================================================
    /// Logo bytes were not PNG/JPEG-decodable, or the declared type is neither
    #[error("unsupported logo image format: {0}")]
    UnsupportedImage(String),

    /// Failed to render a page preview
    #[error("failed to render page {page}: {reason}")]
    Render { page: usize, reason: String },

    // ==========================================================================
    // Pipeline Errors
    // ==========================================================================
    /// A merge aborted because one of its inputs could not be processed
    #[error("merge failed on '{input}': {source}")]
    Merge {
        input: String,
        #[source]
        source: Box<Error>,
    },

    /// An editor page references a source id that was not supplied
    #[error("editor page references missing source '{0}'")]
    MissingSource(SourceId),

    /// Failed to serialize the assembled output document
    #[error("failed to serialize output PDF: {0}")]
    Serialize(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap an error as a merge failure for the named input.
    pub fn merge(input: impl Into<String>, source: Self) -> Self {
        Self::Merge {
            input: input.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
