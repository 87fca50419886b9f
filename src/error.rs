//! Unified error handling for the ontoweave crate
//!
//! Each stage has its own error type; [`Error`] wraps them so a whole export
//! can be driven with one `Result`.
//!
//! # Architecture
//!
//! - [`OntoweaveErrorTrait`] - Classification shared by all errors
//! - [`ErrorCategory`] - Which stage an error comes from
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use ontoweave::error::{Error, OntoweaveErrorTrait};
//!
//! fn report(err: &Error) {
//!     if err.is_fatal() {
//!         eprintln!("{} failure: {err}", err.category());
//!     }
//! }
//! ```

use std::fmt;
use std::io;
use thiserror::Error;

pub use crate::adapter::AdapterError;
pub use crate::ontology::error::OntologyError;
pub use crate::schema::error::SchemaError;
pub use crate::storage::error::{ValidationError, WriterError};
pub use crate::translate::error::TranslationError;

use crate::config::ValidationMode;

/// Common classification of ontoweave errors
pub trait OntoweaveErrorTrait: std::error::Error {
    /// Whether the error aborts a run in every validation mode
    fn is_fatal(&self) -> bool;

    /// Stage the error belongs to
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors by pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Ontology fetch, parse and assembly
    Ontology,
    /// Schema mapping parse and binding
    Schema,
    /// Individual input records
    Record,
    /// Output files
    Storage,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ontology => "ontology",
            Self::Schema => "schema",
            Self::Record => "record",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the ontoweave crate
#[derive(Error, Debug)]
pub enum Error {
    /// Ontology fetch, parse, root and join failures
    #[error("Ontology error: {0}")]
    Ontology(#[from] OntologyError),

    /// Schema mapping errors
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Record rejected during translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Record rejected by its label's columns
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Output file errors
    #[error("Writer error: {0}")]
    Writer(#[from] WriterError),

    /// Input source errors
    #[error("Input error: {0}")]
    Adapter(#[from] AdapterError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl OntoweaveErrorTrait for Error {
    fn is_fatal(&self) -> bool {
        match self {
            // only missing endpoints abort outside strict mode
            Self::Translation(e) => e.is_fatal_in(ValidationMode::Warn),
            Self::Validation(_) => false,
            Self::Writer(WriterError::Validation(_)) => false,
            _ => true,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Ontology(_) => ErrorCategory::Ontology,
            Self::Schema(_) => ErrorCategory::Schema,
            Self::Translation(_) | Self::Validation(_) | Self::Adapter(_) => ErrorCategory::Record,
            Self::Writer(WriterError::Validation(_)) => ErrorCategory::Record,
            Self::Writer(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Configuration loading reports through anyhow
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Config(format!("{err:#}"))
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
