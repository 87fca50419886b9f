//! Batch export backends
//!
//! A [`BatchWriter`] receives translated records one at a time and produces
//! the files a target system bulk-loads, plus the script that loads them.
//! [`create_writer`] picks the backend from the configured `dbms`.

pub mod batch;
pub mod csv;
pub mod dedup;
pub mod error;
pub mod neo4j;
pub mod networkx;
pub mod rdf;
pub mod relational;

pub use dedup::{DedupReport, Deduplicator};
pub use error::{ValidationError, WriterError, WriterResult};

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::{Dbms, WriterSettings};
use crate::models::{GraphEdge, GraphNode};
use crate::schema::{PropertySchema, RecordKind};
use crate::utils::display_path;

use self::batch::TabularWriter;
use self::csv::CsvDialect;
use self::neo4j::Neo4jDialect;
use self::networkx::NetworkxWriter;
use self::rdf::RdfWriter;
use self::relational::RelationalDialect;

/// Sink for translated records
pub trait BatchWriter {
    /// Write one node; `false` when the record was dropped by validation
    fn write_node(&mut self, node: &GraphNode) -> WriterResult<bool>;

    /// Write one edge; `false` when the record was dropped by validation
    fn write_edge(&mut self, edge: &GraphEdge) -> WriterResult<bool>;

    /// Flush everything and write the remaining files
    fn finish(self: Box<Self>) -> WriterResult<ExportSummary>;
}

/// Rows and part files of one label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSummary {
    pub kind: RecordKind,
    pub rows: u64,
    pub parts: usize,
}

/// What a writer produced
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub dbms: Dbms,
    pub output_dir: PathBuf,
    pub labels: BTreeMap<String, LabelSummary>,
    pub files: Vec<PathBuf>,
    pub import_script: Option<PathBuf>,
    /// Records dropped because they did not match their label's columns
    pub validation_dropped: BTreeMap<String, u64>,
}

impl ExportSummary {
    pub fn new(dbms: Dbms, output_dir: &Path) -> Self {
        Self {
            dbms,
            output_dir: output_dir.to_path_buf(),
            labels: BTreeMap::new(),
            files: Vec::new(),
            import_script: None,
            validation_dropped: BTreeMap::new(),
        }
    }

    pub fn record_label(&mut self, kind: RecordKind, label: &str, rows: u64, parts: usize) {
        self.labels
            .insert(label.to_string(), LabelSummary { kind, rows, parts });
    }

    pub fn rows(&self, label: &str) -> u64 {
        self.labels.get(label).map_or(0, |l| l.rows)
    }

    pub fn total_rows(&self) -> u64 {
        self.labels.values().map(|l| l.rows).sum()
    }
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} export to {}: {} rows in {} files",
            self.dbms,
            display_path(&self.output_dir),
            self.total_rows(),
            self.files.len()
        )?;
        for (label, summary) in &self.labels {
            writeln!(
                f,
                "  {:<5} {label}: {} rows, {} part(s)",
                summary.kind, summary.rows, summary.parts
            )?;
        }
        if let Some(script) = &self.import_script {
            writeln!(f, "  import script: {}", display_path(script))?;
        }
        Ok(())
    }
}

/// Create the writer for `settings.dbms`
///
/// `declared` maps output labels to the property types the schema declares;
/// undeclared columns are typed from the data.
pub fn create_writer(
    settings: WriterSettings,
    declared: HashMap<String, PropertySchema>,
) -> WriterResult<Box<dyn BatchWriter>> {
    std::fs::create_dir_all(&settings.output_dir)
        .map_err(|e| WriterError::io("create", &settings.output_dir, e))?;
    info!(
        dbms = %settings.dbms,
        output_dir = %settings.output_dir.display(),
        batch_size = settings.batch_size,
        "Creating batch writer"
    );

    let writer: Box<dyn BatchWriter> = match settings.dbms {
        Dbms::Neo4j => {
            let dialect = Neo4jDialect {
                version: settings.neo4j_version,
            };
            Box::new(TabularWriter::new(settings, declared, dialect))
        }
        Dbms::Postgresql => Box::new(TabularWriter::new(settings, declared, RelationalDialect::postgres())),
        Dbms::Sqlite => Box::new(TabularWriter::new(settings, declared, RelationalDialect::sqlite())),
        Dbms::Csv | Dbms::Pandas => Box::new(TabularWriter::new(settings, declared, CsvDialect)),
        Dbms::Rdf | Dbms::Owl => Box::new(RdfWriter::new(&settings)?),
        Dbms::Networkx => Box::new(NetworkxWriter::new(settings)),
    };
    Ok(writer)
}

/// Write a generated file in one go
pub(crate) fn write_file(path: &Path, content: &str) -> WriterResult<()> {
    std::fs::write(path, content).map_err(|e| WriterError::io("write", path, e))
}

/// Write a generated script and mark it executable
pub(crate) fn write_script(path: &Path, content: &str) -> WriterResult<()> {
    write_file(path, content)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| WriterError::io("chmod", path, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::ValidationMode;
    use crate::models::{Properties, PropertyValue};

    fn node(id: &str, properties: Properties) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            label: "protein".to_string(),
            preferred_id: "uniprot".to_string(),
            properties,
            lineage: Arc::from(vec!["protein".to_string()]),
        }
    }

    fn score(value: PropertyValue) -> Properties {
        Properties::from_iter([("score".to_string(), value)])
    }

    #[test]
    fn test_neo4j_rotation_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let settings = WriterSettings::new(Dbms::Neo4j, dir.path()).with_batch_size(2);
        let mut writer = create_writer(settings, HashMap::new()).unwrap();
        for i in 0..5 {
            assert!(writer.write_node(&node(&format!("P{i}"), Properties::new())).unwrap());
        }
        let summary = writer.finish().unwrap();

        assert_eq!(summary.rows("protein"), 5);
        assert_eq!(summary.labels["protein"].parts, 3);
        assert!(dir.path().join("Protein-header.csv").exists());
        assert!(dir.path().join("Protein-part002.csv").exists());
        assert!(!dir.path().join("Protein-part003.csv").exists());
        assert_eq!(
            summary.import_script,
            Some(dir.path().join(neo4j::IMPORT_SCRIPT))
        );
    }

    #[test]
    fn test_type_mismatch_by_mode() {
        for (mode, expect_rows) in [(ValidationMode::Warn, 1), (ValidationMode::None, 2)] {
            let dir = tempfile::tempdir().unwrap();
            let settings = WriterSettings::new(Dbms::Csv, dir.path()).with_validation_mode(mode);
            let mut writer = create_writer(settings, HashMap::new()).unwrap();
            writer.write_node(&node("P1", score(PropertyValue::Int(1)))).unwrap();
            let kept = writer
                .write_node(&node("P2", score(PropertyValue::Str("high".into()))))
                .unwrap();
            assert_eq!(kept, mode == ValidationMode::None);

            let summary = writer.finish().unwrap();
            assert_eq!(summary.rows("protein"), expect_rows);
            if mode == ValidationMode::Warn {
                assert_eq!(summary.validation_dropped["protein"], 1);
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let settings =
            WriterSettings::new(Dbms::Csv, dir.path()).with_validation_mode(ValidationMode::Strict);
        let mut writer = create_writer(settings, HashMap::new()).unwrap();
        writer.write_node(&node("P1", score(PropertyValue::Int(1)))).unwrap();
        let err = writer
            .write_node(&node("P2", score(PropertyValue::Str("high".into()))))
            .unwrap_err();
        assert!(matches!(err, WriterError::Validation(ValidationError::TypeMismatch { .. })));
    }

    #[test]
    fn test_declared_types_win_over_data() {
        let dir = tempfile::tempdir().unwrap();
        let settings = WriterSettings::new(Dbms::Neo4j, dir.path());
        let mut declared = HashMap::new();
        declared.insert(
            "protein".to_string(),
            PropertySchema::from_iter([("score".to_string(), crate::models::PropertyType::Float)]),
        );
        let mut writer = create_writer(settings, declared).unwrap();
        writer.write_node(&node("P1", score(PropertyValue::Int(3)))).unwrap();
        writer.finish().unwrap();

        let header = std::fs::read_to_string(dir.path().join("Protein-header.csv")).unwrap();
        assert_eq!(header.trim_end(), ":ID;score:double;id;preferred_id;:LABEL");
    }
}
