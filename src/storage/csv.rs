//! Plain CSV parts with inline headers, plus a pandas loader

use super::batch::{script_path, BatchFiles, ColumnSchema, Dialect, FieldFormat, LabelBatch};
use crate::config::WriterSettings;
use crate::models::{GraphEdge, GraphNode};
use crate::ontology::casing::sentence_to_snake;
use crate::schema::RecordKind;

pub const IMPORT_SCRIPT: &str = "import_pandas_csv.py";

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CsvDialect;

fn python_str(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\t', "\\t");
    format!("\"{escaped}\"")
}

impl Dialect for CsvDialect {
    fn inline_header(&self) -> bool {
        true
    }

    fn header(&self, format: &FieldFormat, kind: RecordKind, columns: &ColumnSchema) -> Vec<String> {
        let properties = columns
            .columns()
            .iter()
            .map(|c| format.scalar(&c.name).into_owned());
        let mut cells = Vec::with_capacity(columns.len() + 4);
        match kind {
            RecordKind::Node => {
                cells.push("id".to_string());
                cells.extend(properties);
                cells.extend(["preferred_id", "label"].map(String::from));
            }
            RecordKind::Edge => {
                cells.extend(["id", "source", "target"].map(String::from));
                cells.extend(properties);
                cells.push("label".to_string());
            }
        }
        cells
    }

    fn node_row(&self, format: &FieldFormat, node: &GraphNode, columns: &ColumnSchema) -> Vec<String> {
        let mut cells = vec![format.scalar(&node.id).into_owned()];
        cells.extend(columns.cells(&node.properties, |v| format.value(v)));
        cells.push(format.scalar(&node.preferred_id).into_owned());
        cells.push(format.scalar(&node.label).into_owned());
        cells
    }

    fn edge_row(&self, format: &FieldFormat, edge: &GraphEdge, columns: &ColumnSchema) -> Vec<String> {
        let mut cells = vec![
            edge.id
                .as_deref()
                .map(|id| format.scalar(id).into_owned())
                .unwrap_or_default(),
            format.scalar(&edge.source).into_owned(),
            format.scalar(&edge.target).into_owned(),
        ];
        cells.extend(columns.cells(&edge.properties, |v| format.value(v)));
        cells.push(format.scalar(&edge.label).into_owned());
        cells
    }

    fn header_file(&self, _format: &FieldFormat, _batch: &LabelBatch) -> Option<(String, String)> {
        None
    }

    fn import_script(&self, settings: &WriterSettings, files: &[BatchFiles]) -> (String, String) {
        let mut script = String::from("import pandas as pd\n\n");
        script.push_str(&format!(
            "READ_OPTIONS = dict(sep={}, quotechar={})\n\n",
            python_str(&settings.delimiter.to_string()),
            python_str(&settings.quote.to_string())
        ));

        for batch in files.iter().filter(|f| !f.parts.is_empty()) {
            let parts = batch
                .parts
                .iter()
                .map(|p| format!("        pd.read_csv({}, **READ_OPTIONS),", python_str(&script_path(settings, p))))
                .collect::<Vec<_>>()
                .join("\n");
            script.push_str(&format!(
                "{} = pd.concat(\n    [\n{parts}\n    ],\n    ignore_index=True,\n)\n",
                python_identifier(&batch.label)
            ));
        }
        (IMPORT_SCRIPT.to_string(), script)
    }
}

/// `protein protein interaction` -> `protein_protein_interaction_df`
fn python_identifier(label: &str) -> String {
    let name: String = sentence_to_snake(label)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_df", name.trim_matches('_'))
}
