//! Export session
//!
//! Pulls input records, translates them, suppresses duplicates and hands the
//! result to the batch writer. Everything is single-threaded; only the
//! per-label writers and the dedup sets stay in memory.

use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::config::{Config, ValidationMode, WriterSettings};
use crate::error::Result;
use crate::models::{EdgeRecord, GraphEdge, GraphNode, GraphRecord, InputRecord, NodeRecord};
use crate::ontology::{Ontology, OntologyLoader};
use crate::schema::SchemaMapping;
use crate::storage::{create_writer, BatchWriter, DedupReport, Deduplicator, ExportSummary};
use crate::translate::{TranslationStats, Translator};
use crate::utils::display_path;

/// Fetch the ontology, load the schema mapping and bind them
///
/// `schema_path` overrides `schema_config_path` from the configuration.
#[instrument(skip(config))]
pub async fn load_ontology(config: &Config, schema_path: Option<&Path>) -> Result<Ontology> {
    let schema_path = schema_path.unwrap_or(&config.ontoweave.schema_config_path);
    let mapping = SchemaMapping::from_file(schema_path)?;

    let tree = OntologyLoader::from_config(config).load().await?;

    let ontology = mapping.bind(tree)?;
    info!(
        schema = %display_path(schema_path),
        classes = ontology.tree().len(),
        entries = ontology.mapping().len(),
        "Ontology bound to schema"
    );
    Ok(ontology)
}

// ============================================================================
// Session
// ============================================================================

/// One export run over a bound ontology
pub struct ExportSession<'a> {
    translator: Translator<'a>,
    dedup: Deduplicator,
    writer: Box<dyn BatchWriter>,
    validation_dropped: u64,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl<'a> ExportSession<'a> {
    /// Session writing with the backend selected by `settings`
    pub fn new(ontology: &'a Ontology, settings: WriterSettings, deduplicate: bool) -> Result<Self> {
        let mode = settings.validation_mode;
        let writer = create_writer(settings, ontology.mapping().declared_types())?;
        Ok(Self::with_writer(ontology, mode, deduplicate, writer))
    }

    /// Session from a run configuration
    pub fn from_config(ontology: &'a Ontology, config: &Config) -> Result<Self> {
        Self::new(ontology, config.writer_settings()?, config.ontoweave.deduplicate)
    }

    pub fn with_writer(
        ontology: &'a Ontology,
        mode: ValidationMode,
        deduplicate: bool,
        writer: Box<dyn BatchWriter>,
    ) -> Self {
        Self {
            translator: Translator::new(ontology, mode),
            dedup: if deduplicate {
                Deduplicator::new()
            } else {
                Deduplicator::disabled()
            },
            writer,
            validation_dropped: 0,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    /// Write a stream of node tuples
    pub fn write_nodes(&mut self, nodes: impl IntoIterator<Item = NodeRecord>) -> Result<()> {
        self.write_records(nodes.into_iter().map(InputRecord::Node))
    }

    /// Write a stream of edge tuples
    pub fn write_edges(&mut self, edges: impl IntoIterator<Item = EdgeRecord>) -> Result<()> {
        self.write_records(edges.into_iter().map(InputRecord::Edge))
    }

    /// Write a mixed stream of records
    pub fn write_records(&mut self, records: impl IntoIterator<Item = InputRecord>) -> Result<()> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }

    pub fn write_record(&mut self, record: InputRecord) -> Result<()> {
        match self.translator.translate(record)? {
            Some(GraphRecord::Node(node)) => self.emit_node(&node),
            Some(GraphRecord::Edge(edge)) => self.emit_edge(&edge),
            Some(GraphRecord::Association {
                node,
                source_edge,
                target_edge,
            }) => {
                self.emit_node(&node)?;
                self.emit_edge(&source_edge)?;
                self.emit_edge(&target_edge)
            }
            None => Ok(()),
        }
    }

    fn emit_node(&mut self, node: &GraphNode) -> Result<()> {
        if self.dedup.is_duplicate_node(node) {
            return Ok(());
        }
        if !self.writer.write_node(node)? {
            self.validation_dropped += 1;
        }
        Ok(())
    }

    fn emit_edge(&mut self, edge: &GraphEdge) -> Result<()> {
        if self.dedup.is_duplicate_edge(edge) {
            return Ok(());
        }
        if !self.writer.write_edge(edge)? {
            self.validation_dropped += 1;
        }
        Ok(())
    }

    /// Flush all files and collect the run report
    pub fn finish(self) -> Result<RunReport> {
        let summary = self.writer.finish()?;
        debug!(validation_dropped = self.validation_dropped, "Writer finished");

        let report = RunReport {
            summary,
            translation: self.translator.into_stats(),
            duplicates: self.dedup.report(),
            started_at: self.started_at,
            elapsed: self.started.elapsed(),
        };
        info!(
            rows = report.summary.total_rows(),
            duplicates = report.duplicates.total_duplicates(),
            dropped = report.total_dropped(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Export finished"
        );
        Ok(report)
    }
}

// ============================================================================
// Report
// ============================================================================

/// Everything a run produced and skipped
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: ExportSummary,
    pub translation: TranslationStats,
    pub duplicates: DedupReport,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl RunReport {
    /// Records dropped by translation or column validation
    pub fn total_dropped(&self) -> u64 {
        self.translation.total_dropped() + self.summary.validation_dropped.values().sum::<u64>()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary)?;
        writeln!(f, "  {}", self.duplicates)?;
        for (label, count) in self
            .duplicates
            .node_duplicates
            .iter()
            .chain(&self.duplicates.edge_duplicates)
        {
            writeln!(f, "    duplicate {label}: {count}")?;
        }
        for (label, count) in &self.translation.dropped {
            writeln!(f, "  dropped {label}: {count}")?;
        }
        for (label, count) in &self.summary.validation_dropped {
            writeln!(f, "  dropped by validation {label}: {count}")?;
        }
        if !self.translation.unknown_labels.is_empty() {
            let labels: Vec<&str> = self
                .translation
                .unknown_labels
                .keys()
                .map(String::as_str)
                .collect();
            writeln!(f, "  unknown input labels: {}", labels.join(", "))?;
        }
        if self.translation.passed_through > 0 {
            writeln!(
                f,
                "  passed through unmapped: {}",
                self.translation.passed_through
            )?;
        }
        write!(
            f,
            "  started {}, finished in {:.2}s",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.elapsed.as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::Dbms;
    use crate::ontology::OntologyTree;

    const SCHEMA: &str = r#"
protein:
  represented_as: node
  input_label: uniprot_protein
  preferred_id: uniprot
  properties:
    name: str
binding:
  is_a: association
  represented_as: edge
  input_label: ppi
regulates:
  is_a: association
  represented_as: edge
  input_label: regulates
  use_id: false
  properties:
    evidence: str
"#;

    fn ontology() -> Ontology {
        let mut tree = OntologyTree::with_root("entity");
        tree.graft("association", "entity").unwrap();
        SchemaMapping::from_yaml_str(SCHEMA)
            .unwrap()
            .bind(tree)
            .unwrap()
    }

    #[test]
    fn test_duplicates_are_written_once() {
        let ontology = ontology();
        let dir = tempfile::tempdir().unwrap();
        let settings = WriterSettings::new(Dbms::Csv, dir.path());
        let mut session = ExportSession::new(&ontology, settings, true).unwrap();

        session
            .write_nodes(vec![
                NodeRecord::new("P1", "uniprot_protein").with_property("name", "X"),
                NodeRecord::new("P1", "uniprot_protein").with_property("name", "X"),
            ])
            .unwrap();
        session
            .write_edges(vec![EdgeRecord::new(None, "P1", "P2", "ppi")])
            .unwrap();
        let report = session.finish().unwrap();

        assert_eq!(report.summary.rows("protein"), 1);
        assert_eq!(report.summary.rows("binding"), 1);
        assert_eq!(report.duplicates.duplicates_for("protein"), 1);
        assert!(report.to_string().contains("duplicate protein: 1"));
    }

    #[test]
    fn test_parallel_edges_with_withheld_ids_are_kept() {
        let ontology = ontology();
        let dir = tempfile::tempdir().unwrap();
        let settings = WriterSettings::new(Dbms::Csv, dir.path());
        let mut session = ExportSession::new(&ontology, settings, true).unwrap();

        session
            .write_edges(vec![
                EdgeRecord::new(Some("r1"), "A", "B", "regulates").with_property("evidence", "x"),
                EdgeRecord::new(Some("r2"), "A", "B", "regulates").with_property("evidence", "y"),
            ])
            .unwrap();
        let report = session.finish().unwrap();

        assert_eq!(report.summary.rows("regulates"), 2);
        assert_eq!(report.duplicates.total_duplicates(), 0);
        let part = std::fs::read_to_string(dir.path().join("Regulates-part000.csv")).unwrap();
        assert_eq!(part.lines().count(), 3);
        assert!(!part.contains("r1"));
    }

    #[test]
    fn test_deduplication_can_be_disabled() {
        let ontology = ontology();
        let dir = tempfile::tempdir().unwrap();
        let writer = create_writer(WriterSettings::new(Dbms::Csv, dir.path()), HashMap::new()).unwrap();
        let mut session = ExportSession::with_writer(&ontology, ValidationMode::Warn, false, writer);
        let node = NodeRecord::new("P1", "uniprot_protein");
        session.write_nodes(vec![node.clone(), node]).unwrap();

        let report = session.finish().unwrap();
        assert_eq!(report.summary.rows("protein"), 2);
        assert_eq!(report.duplicates.total_duplicates(), 0);
    }

    #[test]
    fn test_missing_endpoint_aborts() {
        let ontology = ontology();
        let dir = tempfile::tempdir().unwrap();
        let settings =
            WriterSettings::new(Dbms::Csv, dir.path()).with_validation_mode(ValidationMode::None);
        let mut session = ExportSession::new(&ontology, settings, true).unwrap();

        let mut edge = EdgeRecord::new(Some("e1"), "P1", "P2", "ppi");
        edge.target = None;
        let err = session.write_edges(vec![edge]).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Translation(crate::translate::TranslationError::MissingEndpoint { .. })
        ));
    }
}
