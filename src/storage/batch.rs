//! Shared machinery of the delimited-text backends
//!
//! Records are grouped by label. The first record of a label fixes its
//! columns; rows go to `<Label>-part000.csv`, `<Label>-part001.csv`, ...
//! rotated every `batch_size` rows. Backends plug in through [`Dialect`],
//! which decides header layout, row layout, separate header files and the
//! import script.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use super::error::{ValidationError, WriterError, WriterResult};
use super::{write_file, write_script, BatchWriter, ExportSummary};
use crate::config::{ValidationMode, WriterSettings};
use crate::models::{GraphEdge, GraphNode, Properties, PropertyType, PropertyValue};
use crate::ontology::casing::sentence_to_pascal;
use crate::schema::{PropertySchema, RecordKind};
use crate::utils::display_path;

// ============================================================================
// Field rendering
// ============================================================================

/// Delimiter, array delimiter and quote character of one backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldFormat {
    pub delimiter: char,
    pub array_delimiter: char,
    pub quote: char,
}

impl FieldFormat {
    pub fn from_settings(settings: &WriterSettings) -> Self {
        Self {
            delimiter: settings.delimiter,
            array_delimiter: settings.array_delimiter,
            quote: settings.quote,
        }
    }

    /// Wrap in quote characters, doubling embedded ones
    pub fn quote(&self, s: &str) -> String {
        let q = self.quote;
        let escaped = s.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// Quote only when the text contains the delimiter, the quote character
    /// or a line break
    pub fn scalar<'s>(&self, s: &'s str) -> Cow<'s, str> {
        if s.contains(self.delimiter) || s.contains(self.quote) || s.contains(['\n', '\r']) {
            Cow::Owned(self.quote(s))
        } else {
            Cow::Borrowed(s)
        }
    }

    /// List items joined by the array delimiter inside one quoted field
    pub fn list(&self, items: &[PropertyValue]) -> String {
        let joined = items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| item.to_cell().into_owned())
            .collect::<Vec<_>>()
            .join(&self.array_delimiter.to_string());
        if joined.is_empty() {
            return String::new();
        }
        self.quote(&joined)
    }

    pub fn value(&self, value: &PropertyValue) -> String {
        match value {
            PropertyValue::Null => String::new(),
            PropertyValue::List(items) => self.list(items),
            other => self.scalar(&other.to_cell()).into_owned(),
        }
    }

    /// Join already rendered cells into one line
    pub fn join<S: AsRef<str>>(&self, cells: &[S]) -> String {
        let mut line = String::new();
        for (i, cell) in cells.iter().enumerate() {
            if i > 0 {
                line.push(self.delimiter);
            }
            line.push_str(cell.as_ref());
        }
        line
    }
}

// ============================================================================
// Columns
// ============================================================================

/// One property column; the type is fixed by the schema or by the first
/// non-null value
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    ty: Option<PropertyType>,
}

impl Column {
    /// Column type, `str` while no value has been seen
    pub fn ty(&self) -> PropertyType {
        self.ty.unwrap_or(PropertyType::Str)
    }
}

/// Property columns of one label
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSchema {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
}

impl ColumnSchema {
    /// Columns in the property order of the first record
    pub fn from_first(properties: &Properties, declared: Option<&PropertySchema>) -> Self {
        let columns: Vec<Column> = properties
            .iter()
            .map(|(name, value)| Column {
                name: name.clone(),
                ty: declared
                    .and_then(|d| d.get(name).copied())
                    .or_else(|| PropertyType::infer(value)),
            })
            .collect();
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Self { columns, index }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Check a record against the columns, then fix still untyped columns
    pub fn admit(
        &mut self,
        label: &str,
        id: &str,
        properties: &Properties,
    ) -> Result<(), ValidationError> {
        for (name, value) in properties {
            let Some(&i) = self.index.get(name) else {
                return Err(ValidationError::UnknownColumn {
                    label: label.to_string(),
                    id: id.to_string(),
                    property: name.clone(),
                });
            };
            if let Some(ty) = self.columns[i].ty {
                if !ty.accepts(value) {
                    return Err(ValidationError::TypeMismatch {
                        label: label.to_string(),
                        id: id.to_string(),
                        property: name.clone(),
                        expected: ty,
                        found: describe(value),
                    });
                }
            }
        }

        for (name, value) in properties {
            if let Some(&i) = self.index.get(name) {
                if self.columns[i].ty.is_none() {
                    self.columns[i].ty = PropertyType::infer(value);
                }
            }
        }
        Ok(())
    }

    /// Render property cells in column order; absent properties are empty
    pub fn cells(&self, properties: &Properties, render: impl Fn(&PropertyValue) -> String) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| properties.get(&c.name).map(&render).unwrap_or_default())
            .collect()
    }
}

fn describe(value: &PropertyValue) -> String {
    match PropertyType::infer(value) {
        Some(ty) => ty.to_string(),
        None if matches!(value, PropertyValue::List(_)) => "an empty list".to_string(),
        None => "null".to_string(),
    }
}

/// File name stem of a label
pub fn file_stem(label: &str) -> String {
    let stem = sentence_to_pascal(label);
    if stem.is_empty() {
        "Unlabeled".to_string()
    } else {
        stem
    }
}

/// Reserve a stem for a new batch. A stem held by another batch is
/// qualified with the record kind, then numbered.
fn claim_stem(taken: &mut HashSet<String>, kind: RecordKind, label: &str) -> String {
    let base = file_stem(label);
    let mut stem = base.clone();
    let mut n = 1;
    while !taken.insert(stem.clone()) {
        n += 1;
        stem = if n == 2 {
            format!("{base}-{kind}")
        } else {
            format!("{base}-{kind}{}", n - 1)
        };
    }
    if stem != base {
        warn!(label, %kind, stem = %stem, "File stem already used by another label, renaming");
    }
    stem
}

// ============================================================================
// Per-label state
// ============================================================================

/// Open part file and counters of one label
#[derive(Debug)]
pub(crate) struct LabelBatch {
    pub kind: RecordKind,
    pub label: String,
    pub stem: String,
    pub columns: ColumnSchema,
    rows: u64,
    rows_in_part: usize,
    out: Option<BufWriter<File>>,
    parts: Vec<PathBuf>,
}

impl LabelBatch {
    fn new(kind: RecordKind, label: &str, stem: String, columns: ColumnSchema) -> Self {
        Self {
            kind,
            label: label.to_string(),
            stem,
            columns,
            rows: 0,
            rows_in_part: 0,
            out: None,
            parts: Vec::new(),
        }
    }

    fn create_part(&mut self, dir: &Path, header: Option<String>) -> WriterResult<BufWriter<File>> {
        let path = dir.join(format!("{}-part{:03}.csv", self.stem, self.parts.len()));
        let file = File::create(&path).map_err(|e| WriterError::io("create", &path, e))?;
        let mut out = BufWriter::new(file);
        if let Some(header) = header {
            writeln!(out, "{header}").map_err(|e| WriterError::io("write", &path, e))?;
        }
        debug!(label = %self.label, path = %path.display(), "Opened part file");
        self.parts.push(path);
        self.rows_in_part = 0;
        Ok(out)
    }

    /// Whether the next row starts a new part file
    fn needs_part(&self, batch_size: usize) -> bool {
        self.out.is_none() || self.rows_in_part >= batch_size
    }

    fn write_row(
        &mut self,
        dir: &Path,
        batch_size: usize,
        header: Option<String>,
        line: &str,
    ) -> WriterResult<()> {
        if self.rows_in_part >= batch_size {
            self.close()?;
        }
        let out = match self.out.take() {
            Some(out) => out,
            None => self.create_part(dir, header)?,
        };
        let out = self.out.insert(out);
        out.write_all(line.as_bytes())
            .and_then(|()| out.write_all(b"\n"))
            .map_err(|e| WriterError::io("write", current_part(&self.parts), e))?;
        self.rows_in_part += 1;
        self.rows += 1;
        Ok(())
    }

    fn close(&mut self) -> WriterResult<()> {
        if let Some(mut out) = self.out.take() {
            out.flush()
                .map_err(|e| WriterError::io("flush", current_part(&self.parts), e))?;
        }
        Ok(())
    }
}

fn current_part(parts: &[PathBuf]) -> &Path {
    parts.last().map(PathBuf::as_path).unwrap_or(Path::new(""))
}

/// Files written for one label, handed to the import script renderer
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFiles {
    pub kind: RecordKind,
    pub label: String,
    pub stem: String,
    pub header: Option<PathBuf>,
    pub parts: Vec<PathBuf>,
    pub rows: u64,
}

/// How an import script refers to a written file
pub fn script_path(settings: &WriterSettings, path: &Path) -> String {
    match (&settings.file_prefix, path.file_name()) {
        (Some(prefix), Some(name)) => format!("{prefix}{}", name.to_string_lossy()),
        _ => display_path(path),
    }
}

// ============================================================================
// Dialects
// ============================================================================

/// Backend-specific layout of the delimited-text output
pub(crate) trait Dialect {
    /// Every part file starts with the header line
    fn inline_header(&self) -> bool;

    fn header(&self, format: &FieldFormat, kind: RecordKind, columns: &ColumnSchema) -> Vec<String>;

    fn node_row(&self, format: &FieldFormat, node: &GraphNode, columns: &ColumnSchema) -> Vec<String>;

    fn edge_row(&self, format: &FieldFormat, edge: &GraphEdge, columns: &ColumnSchema) -> Vec<String>;

    /// Separate header or table definition, written at finish as
    /// `(file name, content)`
    fn header_file(&self, format: &FieldFormat, batch: &LabelBatch) -> Option<(String, String)>;

    /// Import script as `(file name, content)`
    fn import_script(&self, settings: &WriterSettings, files: &[BatchFiles]) -> (String, String);
}

// ============================================================================
// Writer
// ============================================================================

/// Batch writer for the delimited-text backends
pub(crate) struct TabularWriter<D> {
    settings: WriterSettings,
    format: FieldFormat,
    dialect: D,
    declared: HashMap<String, PropertySchema>,
    batches: IndexMap<(RecordKind, String), LabelBatch>,
    stems: HashSet<String>,
    validation_dropped: BTreeMap<String, u64>,
}

impl<D: Dialect> TabularWriter<D> {
    pub fn new(settings: WriterSettings, declared: HashMap<String, PropertySchema>, dialect: D) -> Self {
        Self {
            format: FieldFormat::from_settings(&settings),
            settings,
            dialect,
            declared,
            batches: IndexMap::new(),
            stems: HashSet::new(),
            validation_dropped: BTreeMap::new(),
        }
    }

    fn write_record(
        &mut self,
        kind: RecordKind,
        label: &str,
        id: &str,
        properties: &Properties,
        render: impl FnOnce(&D, &FieldFormat, &ColumnSchema) -> Vec<String>,
    ) -> WriterResult<bool> {
        let declared = &self.declared;
        let stems = &mut self.stems;
        let batch = self
            .batches
            .entry((kind, label.to_string()))
            .or_insert_with(|| {
                let columns = ColumnSchema::from_first(properties, declared.get(label));
                let stem = claim_stem(stems, kind, label);
                debug!(label, %kind, stem = %stem, columns = columns.len(), "New label batch");
                LabelBatch::new(kind, label, stem, columns)
            });

        if let Err(err) = batch.columns.admit(label, id, properties) {
            match self.settings.validation_mode {
                ValidationMode::Strict => return Err(err.into()),
                ValidationMode::Warn => {
                    warn!(error = %err, "Dropping record that does not match its columns");
                    *self.validation_dropped.entry(label.to_string()).or_default() += 1;
                    return Ok(false);
                }
                ValidationMode::None => {}
            }
        }

        let line = self.format.join(&render(&self.dialect, &self.format, &batch.columns));
        let batch_size = self.settings.batch_size;
        let header = (self.dialect.inline_header() && batch.needs_part(batch_size))
            .then(|| self.format.join(&self.dialect.header(&self.format, kind, &batch.columns)));
        batch.write_row(&self.settings.output_dir, batch_size, header, &line)?;
        Ok(true)
    }
}

impl<D: Dialect> BatchWriter for TabularWriter<D> {
    fn write_node(&mut self, node: &GraphNode) -> WriterResult<bool> {
        self.write_record(RecordKind::Node, &node.label, &node.id, &node.properties, |d, f, c| {
            d.node_row(f, node, c)
        })
    }

    fn write_edge(&mut self, edge: &GraphEdge) -> WriterResult<bool> {
        self.write_record(RecordKind::Edge, &edge.label, edge.dedup_id(), &edge.properties, |d, f, c| {
            d.edge_row(f, edge, c)
        })
    }

    fn finish(mut self: Box<Self>) -> WriterResult<ExportSummary> {
        let mut summary = ExportSummary::new(self.settings.dbms, &self.settings.output_dir);
        let mut files = Vec::with_capacity(self.batches.len());

        for batch in self.batches.values_mut() {
            batch.close()?;
        }
        for batch in self.batches.values() {
            let header = match self.dialect.header_file(&self.format, batch) {
                Some((name, content)) => {
                    let path = self.settings.output_dir.join(name);
                    write_file(&path, &content)?;
                    summary.files.push(path.clone());
                    Some(path)
                }
                None => None,
            };
            summary.files.extend(batch.parts.iter().cloned());
            summary.record_label(batch.kind, &batch.label, batch.rows, batch.parts.len());
            files.push(BatchFiles {
                kind: batch.kind,
                label: batch.label.clone(),
                stem: batch.stem.clone(),
                header,
                parts: batch.parts.clone(),
                rows: batch.rows,
            });
        }

        let (name, content) = self.dialect.import_script(&self.settings, &files);
        let script = self.settings.output_dir.join(name);
        write_script(&script, &content)?;
        summary.files.push(script.clone());
        summary.import_script = Some(script);
        summary.validation_dropped = std::mem::take(&mut self.validation_dropped);

        info!(
            dbms = %self.settings.dbms,
            labels = files.len(),
            files = summary.files.len(),
            "Finished writing batch files"
        );
        Ok(summary)
    }
}
