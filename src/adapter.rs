//! JSON Lines input source
//!
//! One record per line. Nodes look like
//! `{"id": "P1", "label": "uniprot_protein", "properties": {...}}`, edges add
//! `source` and `target` and may omit `id`. Lines are read lazily.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::models::{EdgeRecord, InputRecord, NodeRecord, Properties};
use crate::schema::RecordKind;

/// Result type for reading input records
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Failures while reading input records
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path:?} line {line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

#[derive(Debug, Deserialize)]
struct RawLine {
    #[serde(default)]
    id: Option<String>,
    label: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    properties: Properties,
}

/// Lazy iterator over the records of a JSON Lines stream
#[derive(Debug)]
pub struct JsonLinesSource<R> {
    reader: R,
    path: PathBuf,
    line: usize,
    kind: Option<RecordKind>,
    buf: String,
}

impl JsonLinesSource<BufReader<File>> {
    /// Open a file; the record kind is taken from each line
    pub fn open(path: &Path) -> AdapterResult<Self> {
        let file = File::open(path).map_err(|source| AdapterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Opened JSON Lines source");
        Ok(Self::from_reader(BufReader::new(file), path))
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn from_reader(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            line: 0,
            kind: None,
            buf: String::new(),
        }
    }

    /// Treat every line as a node or as an edge instead of guessing
    pub fn with_kind(mut self, kind: RecordKind) -> Self {
        self.kind = Some(kind);
        self
    }

    fn malformed(&self, reason: impl Into<String>) -> AdapterError {
        AdapterError::Malformed {
            path: self.path.clone(),
            line: self.line,
            reason: reason.into(),
        }
    }

    fn decode(&self, text: &str) -> AdapterResult<InputRecord> {
        let raw: RawLine = serde_json::from_str(text).map_err(|e| self.malformed(e.to_string()))?;
        let kind = self.kind.unwrap_or(if raw.source.is_some() || raw.target.is_some() {
            RecordKind::Edge
        } else {
            RecordKind::Node
        });

        Ok(match kind {
            RecordKind::Node => {
                let Some(id) = raw.id.filter(|id| !id.is_empty()) else {
                    return Err(self.malformed("node record without id"));
                };
                InputRecord::Node(NodeRecord {
                    id,
                    label: raw.label,
                    properties: raw.properties,
                })
            }
            RecordKind::Edge => InputRecord::Edge(EdgeRecord {
                id: raw.id,
                source: raw.source,
                target: raw.target,
                label: raw.label,
                properties: raw.properties,
            }),
        })
    }
}

impl<R: BufRead> Iterator for JsonLinesSource<R> {
    type Item = AdapterResult<InputRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            self.line += 1;
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(source) => {
                    return Some(Err(AdapterError::Io {
                        path: self.path.clone(),
                        source,
                    }))
                }
            }
            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }
            return Some(self.decode(text));
        }
    }
}
