//! Error types for output writers

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::PropertyType;

/// Result type for writer operations
pub type WriterResult<T> = Result<T, WriterError>;

/// Failures while producing output files
#[derive(Error, Debug)]
pub enum WriterError {
    /// Output location cannot be created or written
    #[error("Failed to {operation} {path:?}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Identifier or literal cannot be expressed in RDF
    #[error("RDF serialization error: {0}")]
    Rdf(String),

    /// Node-link JSON could not be produced
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Record rejected by its label's column schema (`strict` mode)
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl WriterError {
    /// Create an I/O error with its path
    pub fn io(operation: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Record does not match the columns fixed by the first record of its label
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Property '{property}' of '{label}' record '{id}' is {found}, column type is {expected}")]
    TypeMismatch {
        label: String,
        id: String,
        property: String,
        expected: PropertyType,
        found: String,
    },

    #[error("Property '{property}' of '{label}' record '{id}' is not a column of label '{label}'")]
    UnknownColumn {
        label: String,
        id: String,
        property: String,
    },
}
