//! Custom error types for the bladed-reader crate.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum BladedError {
    /// An I/O operation on a result file or directory failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A descriptor line could not be converted into the value its keyword requires.
    #[error("Parse error in {} line {line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A count declared in a descriptor does not match the number of items found.
    #[error("Count mismatch for {item_type} in {}: expected {expected}, but found {found}", .path.display())]
    CountMismatch {
        path: PathBuf,
        item_type: &'static str,
        expected: usize,
        found: usize,
    },

    /// A descriptor lacks one of the keywords needed to locate its data.
    #[error("Missing keyword {keyword} in {}", .path.display())]
    MissingKeyword {
        path: PathBuf,
        keyword: &'static str,
    },

    /// No descriptor or data file of the run exists in the directory.
    #[error("No result files for run '{run}' in {}", .directory.display())]
    RunNotFound { directory: PathBuf, run: String },

    /// The run's files do not pair up into descriptor/data parts.
    #[error("Malformed run at {}: {reason}", .path.display())]
    MalformedRun { path: PathBuf, reason: String },

    /// The requested channel is not declared by any descriptor of the run.
    #[error("Channel '{name}' not found")]
    ChannelNotFound { name: String },

    /// A data file holds fewer bytes than its descriptor declares.
    #[error("Truncated data file {}: expected {expected} bytes, but found {found} bytes", .path.display())]
    Truncated {
        path: PathBuf,
        expected: u64,
        found: u64,
    },

    /// The declared element format cannot be decoded.
    #[error("Unsupported encoding '{format}' for {}", .path.display())]
    UnsupportedEncoding { path: PathBuf, format: String },

    /// A lookup was attempted before the first successful `scan()`.
    #[error("Result has not been scanned; call scan() first")]
    NotScanned,

    /// The reader configuration could not be loaded.
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// Decoded data could not be assembled into the declared shape.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

impl BladedError {
    /// Wraps an I/O error with the path it occurred on.
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| BladedError::Io { path, source }
    }

    /// True for errors raised while reading descriptor text.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            BladedError::Parse { .. }
                | BladedError::CountMismatch { .. }
                | BladedError::MissingKeyword { .. }
        )
    }
}

/// A convenience `Result` type alias using the crate's `BladedError` type.
pub type Result<T> = std::result::Result<T, BladedError>;
