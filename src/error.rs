use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a run
///
/// Per-pair DS9 failures and missing composites are handled where they occur
/// and never reach this type through the batch loops.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (invalid values, unknown survey, unreadable file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem error with the path it happened on
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing or column access error
    #[error("CSV error: {0}")]
    Csv(#[from] polars::error::PolarsError),

    /// Input table is readable but unusable (missing column, empty cell)
    #[error("Input error: {0}")]
    Input(String),

    /// JSON configuration error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image decode or encode error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Font file could not be parsed
    #[error("Font error: {0}")]
    Font(String),
}

/// Type alias for Results using the crate Error
pub type Result<T> = std::result::Result<T, Error>;
