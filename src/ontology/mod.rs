//! Ontology model
//!
//! Builds the class hierarchy that drives translation: a head ontology cut at
//! its root node, optionally extended by tail ontologies spliced at join
//! nodes, then extended again by schema classes that are not part of any
//! ontology.
//!
//! # Submodules
//!
//! - [`loader`] - fetching and parsing ontology documents
//! - [`tree`] - arena-owned class hierarchy
//! - [`casing`] - name casing conversions
//! - [`error`] - error types for ontology loading
//!
//! # Quick Start
//!
//! ```no_run
//! use ontoweave::config::Config;
//! use ontoweave::ontology::OntologyLoader;
//! use ontoweave::schema::SchemaMapping;
//! use std::path::Path;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::from_file(Path::new("config/ontoweave_config.yaml"))?;
//! let tree = OntologyLoader::from_config(&config).load().await?;
//! let ontology = SchemaMapping::from_file(Path::new("config/schema_config.yaml"))?.bind(tree)?;
//! println!("{:?}", ontology.ancestors("protein")?);
//! # Ok(())
//! # }
//! ```

pub mod casing;
pub mod error;
pub mod loader;
pub mod tree;

pub use error::{OntologyError, OntologyResult};
pub use loader::{OntologyFormat, OntologyLoader, RawHierarchy};
pub use tree::{ClassId, OntologyClass, OntologyTree};

use std::collections::HashSet;

use crate::schema::{SchemaError, SchemaMapping};

/// Class tree bound to a schema mapping; immutable for the rest of the run
#[derive(Debug, Clone)]
pub struct Ontology {
    tree: OntologyTree,
    mapping: SchemaMapping,
}

impl Ontology {
    pub(crate) fn new(tree: OntologyTree, mapping: SchemaMapping) -> Self {
        Self { tree, mapping }
    }

    pub fn tree(&self) -> &OntologyTree {
        &self.tree
    }

    pub fn mapping(&self) -> &SchemaMapping {
        &self.mapping
    }

    /// Class names from `class` up to the root, `class` first
    pub fn ancestors(&self, class: &str) -> Result<Vec<String>, SchemaError> {
        self.tree
            .ancestors(class)
            .map(|names| names.into_iter().map(str::to_string).collect())
            .ok_or_else(|| SchemaError::UnknownClass {
                name: class.to_string(),
            })
    }

    /// Hierarchy restricted to schema classes and their ancestors
    pub fn render_schema_tree(&self) -> String {
        let mut keep = HashSet::new();
        for entry in self.mapping.entries() {
            if let Some(id) = self.tree.id(entry.class_name()) {
                keep.extend(self.tree.ancestor_ids(id));
            }
        }
        self.tree.render(Some(&keep))
    }

    /// Full hierarchy
    pub fn render_tree(&self) -> String {
        self.tree.render(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ontology() -> Ontology {
        let mut tree = OntologyTree::with_root("entity");
        tree.graft("named thing", "entity").unwrap();
        tree.graft("gene", "named thing").unwrap();
        tree.graft("protein", "named thing").unwrap();
        tree.graft("association", "entity").unwrap();
        SchemaMapping::from_yaml_str("protein:\n  represented_as: node\n  input_label: protein\n")
            .unwrap()
            .bind(tree)
            .unwrap()
    }

    #[test]
    fn test_ancestors_are_stable() {
        let ontology = ontology();
        let first = ontology.ancestors("protein").unwrap();
        assert_eq!(first, ["protein", "named thing", "entity"]);
        assert_eq!(ontology.ancestors("Protein").unwrap(), first);
    }

    #[test]
    fn test_unknown_class() {
        let err = ontology().ancestors("gizmo").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownClass { .. }));
    }

    #[test]
    fn test_render_schema_tree() {
        let rendered = ontology().render_schema_tree();
        assert_eq!(rendered, "entity\n└── named thing\n    └── protein\n");
        assert!(ontology().render_tree().contains("association"));
    }
}
