//! Error type for structured data access and format I/O.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading, writing or interpreting structured data.
#[derive(Debug, Error)]
pub enum DataError {
    /// Text could not be encoded or decoded in the requested format.
    #[error("format error: {0}")]
    Format(String),

    /// A file could not be read or written.
    #[error("i/o error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file extension does not name a supported format.
    #[error("cannot infer data format from '{0}'")]
    UnknownFormat(PathBuf),

    /// A value had an unexpected shape.
    #[error("type mismatch for '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A fixed-arity array (vector, quaternion, color) had the wrong length.
    #[error("'{field}' must have {expected} elements, found {found}")]
    WrongArity {
        field: String,
        expected: usize,
        found: usize,
    },

    /// A field without a documented default was absent.
    #[error("missing field '{field}'")]
    MissingField { field: String },

    /// A string did not name any accepted variant.
    #[error("invalid value '{value}' for '{field}'")]
    InvalidVariant { field: String, value: String },
}

impl DataError {
    pub(crate) fn mismatch(field: &str, expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch {
            field: field.to_owned(),
            expected,
            found,
        }
    }
}
