//! Error types for the table → PDF pipeline.

use thiserror::Error;

/// Result type alias for tablepdf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while validating, parsing, or rendering a table request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The request payload is malformed, missing `htmlTable`, or empty.
    #[error("{0}")]
    Validation(String),

    /// The HTML fragment has no locatable table structure.
    #[error("{0}")]
    Parse(String),

    /// Producing the PDF bytes failed.
    #[error("{0}")]
    Render(String),

    /// A pipeline or server setting is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// The error class name reported to HTTP callers.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "ValidationError",
            Error::Parse(_) => "ParseError",
            Error::Render(_) => "RenderError",
            Error::Config(_) => "ConfigError",
        }
    }
}
