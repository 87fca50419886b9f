//! Custom error types for ontology operations
//!
//! Every variant here is raised while the class hierarchy is being assembled,
//! before any record is processed, and aborts the run.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for ontology operations
pub type OntologyResult<T> = Result<T, OntologyError>;

/// Custom error type for ontology operations
#[derive(Debug)]
pub enum OntologyError {
    // =========================================================================
    // Fetch Errors
    // =========================================================================
    /// Download failed (connection refused, HTTP error status, ...)
    FetchFailed { url: String, reason: String },

    /// Download did not complete in time
    FetchTimeout { url: String, timeout_secs: u64 },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    /// RDF document could not be parsed
    ParseFailed { url: String, reason: String },

    /// Serialization hint not understood
    UnsupportedFormat { value: String },

    // =========================================================================
    // Hierarchy Errors
    // =========================================================================
    /// Configured root class is absent from the document
    RootNotFound { url: String, root: String },

    /// Join node missing from the head or tail ontology
    JoinNodeNotFound {
        side: &'static str,
        node: String,
        url: String,
    },

    /// Class name not present in the tree
    UnknownClass { name: String },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// File I/O error
    IoError {
        operation: String,
        path: Option<PathBuf>,
        source: io::Error,
    },

    // =========================================================================
    // Generic Errors
    // =========================================================================
    /// Generic error with context
    Other {
        context: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl fmt::Display for OntologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Fetch
            OntologyError::FetchFailed { url, reason } => {
                write!(f, "Failed to fetch ontology '{url}': {reason}")
            }
            OntologyError::FetchTimeout { url, timeout_secs } => {
                write!(f, "Fetching ontology '{url}' timed out after {timeout_secs}s")
            }

            // Parse
            OntologyError::ParseFailed { url, reason } => {
                write!(f, "Failed to parse ontology '{url}': {reason}")
            }
            OntologyError::UnsupportedFormat { value } => {
                write!(f, "Unsupported ontology format: '{value}'")
            }

            // Hierarchy
            OntologyError::RootNotFound { url, root } => {
                write!(f, "Root node '{root}' not found in ontology '{url}'")
            }
            OntologyError::JoinNodeNotFound { side, node, url } => {
                write!(f, "{side} join node '{node}' not found in ontology '{url}'")
            }
            OntologyError::UnknownClass { name } => {
                write!(f, "Class '{name}' is not part of the ontology")
            }

            // I/O
            OntologyError::IoError {
                operation,
                path,
                source,
            } => {
                if let Some(p) = path {
                    write!(f, "I/O error during {operation} on {p:?}: {source}")
                } else {
                    write!(f, "I/O error during {operation}: {source}")
                }
            }

            // Generic
            OntologyError::Other { context, source } => {
                if let Some(src) = source {
                    write!(f, "{context}: {src}")
                } else {
                    write!(f, "{context}")
                }
            }
        }
    }
}

impl std::error::Error for OntologyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OntologyError::IoError { source, .. } => Some(source),
            OntologyError::Other {
                source: Some(src), ..
            } => Some(src.as_ref()),
            _ => None,
        }
    }
}

// ============================================================================
// Conversion implementations
// ============================================================================

impl From<io::Error> for OntologyError {
    fn from(err: io::Error) -> Self {
        OntologyError::IoError {
            operation: "unknown".to_string(),
            path: None,
            source: err,
        }
    }
}

// ============================================================================
// Helper constructors
// ============================================================================

impl OntologyError {
    /// Create a fetch error
    pub fn fetch_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        OntologyError::FetchFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a parse error
    pub fn parse_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        OntologyError::ParseFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing join node error
    pub fn join_node_not_found(
        side: &'static str,
        node: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        OntologyError::JoinNodeNotFound {
            side,
            node: node.into(),
            url: url.into(),
        }
    }

    /// Create an unknown class error
    pub fn unknown_class(name: impl Into<String>) -> Self {
        OntologyError::UnknownClass { name: name.into() }
    }

    /// Create an I/O error with context
    pub fn io_error(
        operation: impl Into<String>,
        path: Option<PathBuf>,
        source: io::Error,
    ) -> Self {
        OntologyError::IoError {
            operation: operation.into(),
            path,
            source,
        }
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        OntologyError::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Whether another download attempt may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            OntologyError::FetchFailed { .. } | OntologyError::FetchTimeout { .. }
        )
    }
}
