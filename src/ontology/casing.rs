//! Name casing conversions
//!
//! Ontology classes are named in lower sentence case internally
//! (`gene or gene product`), rendered in PascalCase for node labels and file
//! names (`GeneOrGeneProduct`) and in upper snake case for relationship types
//! (`GENE_OR_GENE_PRODUCT`). All functions are pure and total.
//!
//! Round trips hold for names made of lowercase ASCII words:
//!
//! ```
//! use ontoweave::ontology::casing::*;
//!
//! let name = "protein protein interaction";
//! assert_eq!(pascal_to_sentence(&sentence_to_pascal(name)), name);
//! assert_eq!(upper_snake_to_sentence(&sentence_to_upper_snake(name)), name);
//! ```

use heck::{ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};

/// Normalize any supported casing to lower sentence case
///
/// Names already containing spaces are only lowercased, so labels with
/// punctuation (`5' UTR`) survive unchanged apart from case.
pub fn to_lower_sentence_case(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.contains(' ') {
        trimmed.to_lowercase()
    } else if trimmed.contains('_') {
        snake_to_sentence(trimmed)
    } else if trimmed.chars().next().is_some_and(char::is_uppercase) {
        pascal_to_sentence(trimmed)
    } else {
        trimmed.to_string()
    }
}

/// `protein protein interaction` -> `ProteinProteinInteraction`
pub fn sentence_to_pascal(s: &str) -> String {
    s.to_upper_camel_case()
}

/// `ProteinProteinInteraction` -> `protein protein interaction`
pub fn pascal_to_sentence(s: &str) -> String {
    s.to_snake_case().replace('_', " ")
}

/// `protein_protein_interaction` -> `protein protein interaction`
pub fn snake_to_sentence(s: &str) -> String {
    s.split('_')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `protein protein interaction` -> `protein_protein_interaction`
pub fn sentence_to_snake(s: &str) -> String {
    s.to_snake_case()
}

/// `protein protein interaction` -> `PROTEIN_PROTEIN_INTERACTION`
pub fn sentence_to_upper_snake(s: &str) -> String {
    s.to_shouty_snake_case()
}

/// `PROTEIN_PROTEIN_INTERACTION` -> `protein protein interaction`
pub fn upper_snake_to_sentence(s: &str) -> String {
    snake_to_sentence(s)
}
