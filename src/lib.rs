//! ontoweave - ontology-driven knowledge graph export
//!
//! Translates streams of biomedical entities and relationships into a
//! knowledge graph shaped by a schema mapping and an ontology hierarchy, and
//! writes it as bulk-import files for a graph or relational database.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Run configuration and writer settings
//! - [`ontology`] - Ontology fetching, parsing and the class tree
//! - [`schema`] - Schema mapping and binding to the tree
//! - [`translate`] - Input records to graph records
//! - [`storage`] - Deduplication and the batch writers
//! - [`pipeline`] - Export session and run report
//! - [`adapter`] - JSON Lines input
//! - [`models`] - Core data structures and types
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use ontoweave::config::Config;
//! use ontoweave::models::NodeRecord;
//! use ontoweave::pipeline::{load_ontology, ExportSession};
//!
//! #[tokio::main]
//! async fn main() -> ontoweave::error::Result<()> {
//!     let config = Config::from_file("config/ontoweave.yaml".as_ref())?;
//!     let ontology = load_ontology(&config, None).await?;
//!     let mut session = ExportSession::from_config(&ontology, &config)?;
//!     session.write_nodes(vec![NodeRecord::new("P1", "uniprot_protein")])?;
//!     println!("{}", session.finish()?);
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod models;
pub mod ontology;
pub mod pipeline;
pub mod schema;
pub mod storage;
pub mod translate;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, Dbms, ValidationMode, WriterSettings};
    pub use crate::error::{Error, ErrorCategory, OntoweaveErrorTrait, Result};
    pub use crate::models::{EdgeRecord, GraphRecord, InputRecord, NodeRecord, PropertyValue};
    pub use crate::ontology::Ontology;
    pub use crate::pipeline::{ExportSession, RunReport};
    pub use crate::schema::SchemaMapping;
}

// Direct re-exports for convenience
pub use models::{EdgeRecord, InputRecord, NodeRecord};
