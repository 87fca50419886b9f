//! Per-record translation errors

use thiserror::Error;

use crate::config::ValidationMode;

/// Result type for translation
pub type TranslationResult<T> = Result<T, TranslationError>;

/// Problems with a single input record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// Input label not present in the schema
    #[error("Unknown input label '{label}'")]
    UnknownLabel { label: String },

    /// Edge record without a source or target id
    #[error("Edge record with label '{label}' has no {side} id")]
    MissingEndpoint { label: String, side: &'static str },

    /// Node record whose label is mapped to an edge entry
    #[error("Node '{id}' has input label '{label}', which is mapped to an edge")]
    NodeMappedToEdge { id: String, label: String },

    /// Property not on the allow-list of the record's class
    #[error("Property '{property}' of '{label}' record '{id}' is not declared in the schema")]
    UndeclaredProperty {
        label: String,
        id: String,
        property: String,
    },
}

impl TranslationError {
    /// Whether the error aborts the run under `mode`
    ///
    /// Missing edge endpoints abort in every mode.
    pub fn is_fatal_in(&self, mode: ValidationMode) -> bool {
        match self {
            Self::MissingEndpoint { .. } => true,
            _ => mode == ValidationMode::Strict,
        }
    }
}
