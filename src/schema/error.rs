//! Error types for schema configuration

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Schema configuration errors; all of them abort the run
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Schema file could not be read
    #[error("Failed to read schema configuration {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Document is not valid YAML or not a mapping
    #[error("Invalid schema YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Entry fields are malformed
    #[error("Schema entry '{class}': {reason}")]
    InvalidEntry { class: String, reason: String },

    /// Two entries of one representation kind claim the same input label
    #[error("Input label '{label}' is declared by both '{first}' and '{second}' ({kind} entries)")]
    DuplicateInputLabel {
        label: String,
        kind: &'static str,
        first: String,
        second: String,
    },

    /// `is_a` chain does not end in a known class
    #[error("Schema entry '{class}' has is_a '{parent}', which does not resolve to an ontology class")]
    UnresolvedParent { class: String, parent: String },

    /// `is_a` chains of schema entries form a cycle
    #[error("Schema entries form an is_a cycle through '{class}'")]
    InheritanceCycle { class: String },

    /// Class outside the retained hierarchy
    #[error("Class '{name}' is not part of the ontology")]
    UnknownClass { name: String },
}

impl SchemaError {
    /// Create an invalid entry error
    pub fn invalid_entry(class: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEntry {
            class: class.into(),
            reason: reason.into(),
        }
    }
}
