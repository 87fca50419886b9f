//! PostgreSQL and SQLite bulk-load files
//!
//! Each label becomes a table. Its DDL goes to `<Label>-create_table.sql`,
//! rows go to header-less part files loaded by `\copy` or `.import`.

use super::batch::{script_path, BatchFiles, ColumnSchema, Dialect, FieldFormat, LabelBatch};
use crate::config::WriterSettings;
use crate::models::{GraphEdge, GraphNode, PropertyType, PropertyValue};
use crate::ontology::casing::{sentence_to_pascal, sentence_to_snake};
use crate::schema::RecordKind;
use crate::utils::shell_quote;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flavor {
    Postgres,
    Sqlite,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RelationalDialect {
    pub flavor: Flavor,
}

impl RelationalDialect {
    pub fn postgres() -> Self {
        Self {
            flavor: Flavor::Postgres,
        }
    }

    pub fn sqlite() -> Self {
        Self {
            flavor: Flavor::Sqlite,
        }
    }

    fn column_type(&self, ty: PropertyType) -> String {
        match self.flavor {
            Flavor::Postgres => {
                let element = match ty.element() {
                    PropertyType::Int => "bigint",
                    PropertyType::Float => "double precision",
                    PropertyType::Bool => "boolean",
                    _ => "text",
                };
                if ty.is_list() {
                    format!("{element}[]")
                } else {
                    element.to_string()
                }
            }
            Flavor::Sqlite => match ty {
                PropertyType::Int | PropertyType::Bool => "INTEGER",
                PropertyType::Float => "REAL",
                _ => "TEXT",
            }
            .to_string(),
        }
    }

    fn text_type(&self) -> &'static str {
        match self.flavor {
            Flavor::Postgres => "text",
            Flavor::Sqlite => "TEXT",
        }
    }

    fn labels_type(&self) -> &'static str {
        match self.flavor {
            Flavor::Postgres => "text[]",
            Flavor::Sqlite => "TEXT",
        }
    }

    fn value(&self, format: &FieldFormat, value: &PropertyValue) -> String {
        match (self.flavor, value) {
            (Flavor::Postgres, PropertyValue::List(items)) => {
                let cells: Vec<String> = items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(|item| item.to_cell().into_owned())
                    .collect();
                format.scalar(&pg_array(&cells)).into_owned()
            }
            (Flavor::Sqlite, PropertyValue::Bool(b)) => u8::from(*b).to_string(),
            _ => format.value(value),
        }
    }

    fn labels(&self, format: &FieldFormat, lineage: &[String]) -> String {
        let labels: Vec<String> = lineage.iter().map(|c| sentence_to_pascal(c)).collect();
        match self.flavor {
            Flavor::Postgres => format.scalar(&pg_array(&labels)).into_owned(),
            Flavor::Sqlite => format
                .scalar(&labels.join(&format.array_delimiter.to_string()))
                .into_owned(),
        }
    }

    fn script_name(&self) -> &'static str {
        match self.flavor {
            Flavor::Postgres => "postgres-import-call.sh",
            Flavor::Sqlite => "sqlite-import-call.sh",
        }
    }

    fn postgres_script(&self, settings: &WriterSettings, files: &[BatchFiles]) -> String {
        let connection = format!(
            "--dbname={} --host={} --port={} --user={}",
            shell_quote(&settings.database_name),
            shell_quote(&settings.host),
            settings.port,
            shell_quote(&settings.user)
        );
        let psql = format!("{}psql", settings.bin_prefix);
        let mut script = String::from("#!/bin/bash\nset -e\n\n");

        for batch in files {
            if let Some(ddl) = &batch.header {
                script.push_str(&format!(
                    "{psql} -f {} {connection}\n",
                    shell_quote(&script_path(settings, ddl))
                ));
            }
        }
        for batch in files {
            let table = table_name(&batch.label);
            for part in &batch.parts {
                script.push_str(&format!(
                    "{psql} -c \"\\copy {table} FROM '{}' WITH (FORMAT csv, DELIMITER E'{}', QUOTE E'{}')\" {connection}\n",
                    script_path(settings, part),
                    sql_char(settings.delimiter),
                    sql_char(settings.quote),
                ));
            }
        }
        script
    }

    fn sqlite_script(&self, settings: &WriterSettings, files: &[BatchFiles]) -> String {
        let sqlite = format!("{}sqlite3", settings.bin_prefix);
        let db = shell_quote(&settings.database_name);
        let separator = match settings.delimiter {
            '\t' => "$'\\t'".to_string(),
            other => shell_quote(&other.to_string()),
        };
        let mut script = String::from("#!/bin/bash\nset -e\n\n");

        for batch in files {
            if let Some(ddl) = &batch.header {
                script.push_str(&format!(
                    "{sqlite} {db} < {}\n",
                    shell_quote(&script_path(settings, ddl))
                ));
            }
        }
        for batch in files {
            let table = table_name(&batch.label);
            for part in &batch.parts {
                script.push_str(&format!(
                    "{sqlite} -csv -separator {separator} {db} \".import '{}' {table}\"\n",
                    script_path(settings, part),
                ));
            }
        }
        script
    }
}

/// Table of a label: `protein protein interaction` -> `protein_protein_interaction`
pub fn table_name(label: &str) -> String {
    let name = sentence_to_snake(label);
    if name.is_empty() {
        "unlabeled".to_string()
    } else {
        name
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// PostgreSQL array literal, `{a,"b c"}`
fn pg_array(items: &[String]) -> String {
    let elements: Vec<String> = items
        .iter()
        .map(|item| {
            let plain = !item.is_empty()
                && !item.eq_ignore_ascii_case("null")
                && !item
                    .chars()
                    .any(|c| matches!(c, ',' | '{' | '}' | '"' | '\\') || c.is_whitespace());
            if plain {
                item.clone()
            } else {
                format!("\"{}\"", item.replace('\\', "\\\\").replace('"', "\\\""))
            }
        })
        .collect();
    format!("{{{}}}", elements.join(","))
}

/// Character inside a shell-quoted `E'...'` literal
fn sql_char(c: char) -> String {
    match c {
        '\t' => "\\t".to_string(),
        '\'' => "\\'".to_string(),
        '"' => "\\\"".to_string(),
        '\\' => "\\\\\\\\".to_string(),
        other => other.to_string(),
    }
}

impl Dialect for RelationalDialect {
    fn inline_header(&self) -> bool {
        false
    }

    fn header(&self, _format: &FieldFormat, kind: RecordKind, columns: &ColumnSchema) -> Vec<String> {
        let properties = columns.columns().iter().map(|c| c.name.clone());
        let mut names = Vec::with_capacity(columns.len() + 4);
        match kind {
            RecordKind::Node => {
                names.push("_id".to_string());
                names.extend(properties);
                names.extend(["preferred_id", "_label"].map(String::from));
            }
            RecordKind::Edge => {
                names.extend(["_start_id", "_id"].map(String::from));
                names.extend(properties);
                names.extend(["_end_id", "_type"].map(String::from));
            }
        }
        names
    }

    fn node_row(&self, format: &FieldFormat, node: &GraphNode, columns: &ColumnSchema) -> Vec<String> {
        let mut cells = vec![format.scalar(&node.id).into_owned()];
        cells.extend(columns.cells(&node.properties, |v| self.value(format, v)));
        cells.push(format.scalar(&node.preferred_id).into_owned());
        cells.push(self.labels(format, &node.lineage));
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
        cells.extend(columns.cells(&edge.properties, |v| self.value(format, v)));
        cells.push(format.scalar(&edge.target).into_owned());
        cells.push(format.scalar(&edge.label).into_owned());
        cells
    }

    fn header_file(&self, format: &FieldFormat, batch: &LabelBatch) -> Option<(String, String)> {
        let table = table_name(&batch.label);
        let names = self.header(format, batch.kind, &batch.columns);
        let types = self.column_types(batch.kind, &batch.columns);

        let body = names
            .iter()
            .zip(types)
            .map(|(name, ty)| format!("    {} {ty}", quote_ident(name)))
            .collect::<Vec<_>>()
            .join(",\n");
        let ddl = format!("DROP TABLE IF EXISTS {table};\nCREATE TABLE {table} (\n{body}\n);\n");
        Some((format!("{}-create_table.sql", batch.stem), ddl))
    }

    fn import_script(&self, settings: &WriterSettings, files: &[BatchFiles]) -> (String, String) {
        let script = match self.flavor {
            Flavor::Postgres => self.postgres_script(settings, files),
            Flavor::Sqlite => self.sqlite_script(settings, files),
        };
        (self.script_name().to_string(), script)
    }
}

impl RelationalDialect {
    /// SQL types in header order
    fn column_types(&self, kind: RecordKind, columns: &ColumnSchema) -> Vec<String> {
        let text = self.text_type().to_string();
        let properties = columns.columns().iter().map(|c| self.column_type(c.ty()));
        let mut types = Vec::with_capacity(columns.len() + 4);
        match kind {
            RecordKind::Node => {
                types.push(text.clone());
                types.extend(properties);
                types.push(text);
                types.push(self.labels_type().to_string());
            }
            RecordKind::Edge => {
                types.extend([text.clone(), text.clone()]);
                types.extend(properties);
                types.extend([text.clone(), text]);
            }
        }
        types
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;
    use crate::config::Dbms;
    use crate::models::Properties;

    fn format() -> FieldFormat {
        FieldFormat {
            delimiter: '\t',
            array_delimiter: ',',
            quote: '"',
        }
    }

    #[test]
    fn test_pg_array() {
        assert_eq!(pg_array(&["a".into(), "b".into()]), "{a,b}");
        assert_eq!(pg_array(&["a b".into(), "x\"y".into()]), r#"{"a b","x\"y"}"#);
        assert_eq!(pg_array(&[]), "{}");
    }

    #[test]
    fn test_postgres_row_renders_arrays() {
        let mut properties = Properties::new();
        properties.insert(
            "synonyms".into(),
            PropertyValue::List(vec!["p53".into(), "TP53".into()]),
        );
        let node = GraphNode {
            id: "P1".into(),
            label: "protein".into(),
            preferred_id: "uniprot".into(),
            properties,
            lineage: Arc::from(vec!["protein".to_string(), "named thing".to_string()]),
        };
        let columns = ColumnSchema::from_first(&node.properties, None);
        let row = RelationalDialect::postgres().node_row(&format(), &node, &columns);
        assert_eq!(row, vec!["P1", "{p53,TP53}", "uniprot", "{Protein,NamedThing}"]);
    }

    #[test]
    fn test_table_name() {
        assert_eq!(table_name("protein protein interaction"), "protein_protein_interaction");
        assert_eq!(table_name(""), "unlabeled");
    }

    #[test]
    fn test_postgres_script() {
        let settings = WriterSettings::new(Dbms::Postgresql, "/out");
        let files = vec![BatchFiles {
            kind: RecordKind::Node,
            label: "protein".into(),
            stem: "Protein".into(),
            header: Some(PathBuf::from("/out/Protein-create_table.sql")),
            parts: vec![PathBuf::from("/out/Protein-part000.csv")],
            rows: 1,
        }];
        let (name, script) = RelationalDialect::postgres().import_script(&settings, &files);
        assert_eq!(name, "postgres-import-call.sh");
        assert!(script.contains("psql -f /out/Protein-create_table.sql --dbname=postgres"));
        assert!(script.contains(
            "\\copy protein FROM '/out/Protein-part000.csv' WITH (FORMAT csv, DELIMITER E'\\t', QUOTE E'\\\"')"
        ));
    }

    #[test]
    fn test_sqlite_script() {
        let settings = WriterSettings::new(Dbms::Sqlite, "/out");
        let files = vec![BatchFiles {
            kind: RecordKind::Edge,
            label: "binding".into(),
            stem: "Binding".into(),
            header: Some(PathBuf::from("/out/Binding-create_table.sql")),
            parts: vec![PathBuf::from("/out/Binding-part000.csv")],
            rows: 1,
        }];
        let (name, script) = RelationalDialect::sqlite().import_script(&settings, &files);
        assert_eq!(name, "sqlite-import-call.sh");
        assert!(script.contains("sqlite3 sqlite.db < /out/Binding-create_table.sql"));
        assert!(script.contains(".import '/out/Binding-part000.csv' binding"));
    }
}
