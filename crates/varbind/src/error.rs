//! Error types for the configuration registry.

use thiserror::Error;

/// Errors that can occur while loading or saving a configuration file.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backing file could not be opened for reading
    #[error("cannot open configuration file {path}: {source}")]
    FileOpen {
        /// Path to the configuration file
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A key token was not followed by an `=` separator; the remainder
    /// of the file is treated as unparseable
    #[error("malformed separator after key `{key}` in {path}")]
    Separator {
        /// Path to the configuration file
        path: String,
        /// The key token preceding the bad separator
        key: String,
    },

    /// I/O error while writing the configuration file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A value's text could not be converted to the bound variable's type.
#[derive(Error, Debug)]
#[error("cannot parse {text:?} as {target}")]
pub struct ValueError {
    /// The offending value text
    text: String,
    /// Name of the target type
    target: &'static str,
}

impl ValueError {
    /// Create a parse error for the given target type.
    #[must_use]
    pub fn new<T>(text: &str) -> Self {
        Self {
            text: text.to_string(),
            target: std::any::type_name::<T>(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
