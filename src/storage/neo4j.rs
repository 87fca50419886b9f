//! Neo4j admin-import files
//!
//! One `<Label>-header.csv` per label next to its part files, and
//! `neo4j-admin-import-call.sh` that loads them all.

use super::batch::{script_path, BatchFiles, ColumnSchema, Dialect, FieldFormat, LabelBatch};
use crate::config::WriterSettings;
use crate::models::{GraphEdge, GraphNode, PropertyType};
use crate::ontology::casing::{sentence_to_pascal, sentence_to_upper_snake};
use crate::schema::RecordKind;

pub const IMPORT_SCRIPT: &str = "neo4j-admin-import-call.sh";

/// Header and row layout of `neo4j-admin` CSV input
#[derive(Debug, Clone, Copy)]
pub(crate) struct Neo4jDialect {
    pub version: u8,
}

/// Type suffix of a property column; plain strings have none
fn type_suffix(ty: PropertyType) -> &'static str {
    match ty {
        PropertyType::Str => "",
        PropertyType::Int => ":long",
        PropertyType::Float => ":double",
        PropertyType::Bool => ":boolean",
        PropertyType::StrList => ":string[]",
        PropertyType::IntList => ":long[]",
        PropertyType::FloatList => ":double[]",
        PropertyType::BoolList => ":boolean[]",
    }
}

/// Delimiter as written on the `neo4j-admin` command line
fn cli_char(c: char) -> String {
    match c {
        '\t' => "TAB".to_string(),
        '"' => "\\\"".to_string(),
        other => other.to_string(),
    }
}

fn property_headers(columns: &ColumnSchema) -> impl Iterator<Item = String> + '_ {
    columns
        .columns()
        .iter()
        .map(|c| format!("{}{}", c.name, type_suffix(c.ty())))
}

impl Dialect for Neo4jDialect {
    fn inline_header(&self) -> bool {
        false
    }

    fn header(&self, _format: &FieldFormat, kind: RecordKind, columns: &ColumnSchema) -> Vec<String> {
        let mut cells = Vec::with_capacity(columns.len() + 4);
        match kind {
            RecordKind::Node => {
                cells.push(":ID".to_string());
                cells.extend(property_headers(columns));
                cells.extend(["id", "preferred_id", ":LABEL"].map(String::from));
            }
            RecordKind::Edge => {
                cells.extend([":START_ID", "id"].map(String::from));
                cells.extend(property_headers(columns));
                cells.extend([":END_ID", ":TYPE"].map(String::from));
            }
        }
        cells
    }

    fn node_row(&self, format: &FieldFormat, node: &GraphNode, columns: &ColumnSchema) -> Vec<String> {
        let id = format.scalar(&node.id).into_owned();
        let labels = node
            .lineage
            .iter()
            .map(|class| sentence_to_pascal(class))
            .collect::<Vec<_>>()
            .join(&format.array_delimiter.to_string());

        let mut cells = vec![id.clone()];
        cells.extend(columns.cells(&node.properties, |v| format.value(v)));
        cells.push(id);
        cells.push(format.scalar(&node.preferred_id).into_owned());
        cells.push(format.scalar(&labels).into_owned());
        cells
    }

    fn edge_row(&self, format: &FieldFormat, edge: &GraphEdge, columns: &ColumnSchema) -> Vec<String> {
        let mut cells = vec![
            format.scalar(&edge.source).into_owned(),
            edge.id
                .as_deref()
                .map(|id| format.scalar(id).into_owned())
                .unwrap_or_default(),
        ];
        cells.extend(columns.cells(&edge.properties, |v| format.value(v)));
        cells.push(format.scalar(&edge.target).into_owned());
        cells.push(sentence_to_upper_snake(&edge.label));
        cells
    }

    fn header_file(&self, format: &FieldFormat, batch: &LabelBatch) -> Option<(String, String)> {
        let header = format.join(&self.header(format, batch.kind, &batch.columns));
        Some((format!("{}-header.csv", batch.stem), format!("{header}\n")))
    }

    fn import_script(&self, settings: &WriterSettings, files: &[BatchFiles]) -> (String, String) {
        let mut args = vec![
            format!("--delimiter=\"{}\"", cli_char(settings.delimiter)),
            format!("--array-delimiter=\"{}\"", cli_char(settings.array_delimiter)),
            format!("--quote=\"{}\"", cli_char(settings.quote)),
        ];
        if self.version >= 5 {
            args.push("--overwrite-destination=true".to_string());
        } else {
            args.push("--force=true".to_string());
            args.push(format!("--database={}", settings.database_name));
        }

        for batch in files.iter().filter(|f| !f.parts.is_empty()) {
            let flag = match batch.kind {
                RecordKind::Node => "--nodes",
                RecordKind::Edge => "--relationships",
            };
            let list = batch
                .header
                .iter()
                .chain(batch.parts.iter())
                .map(|path| script_path(settings, path))
                .collect::<Vec<_>>()
                .join(",");
            args.push(format!("{flag}=\"{list}\""));
        }

        let command = if self.version >= 5 {
            args.push(settings.database_name.clone());
            format!("{}neo4j-admin database import full", settings.bin_prefix)
        } else {
            format!("{}neo4j-admin import", settings.bin_prefix)
        };

        let mut script = String::from("#!/bin/bash\nset -e\n\n");
        script.push_str(&command);
        for arg in &args {
            script.push_str(" \\\n    ");
            script.push_str(arg);
        }
        script.push('\n');
        (IMPORT_SCRIPT.to_string(), script)
    }
}
