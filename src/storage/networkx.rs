//! NetworkX node-link dump
//!
//! Records are collected in memory and written once at finish as
//! `networkx_graph.json`, with `import_networkx.py` to load it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Utc;
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use tracing::info;

use super::batch::script_path;
use super::error::{WriterError, WriterResult};
use super::{write_script, BatchWriter, ExportSummary};
use crate::config::WriterSettings;
use crate::models::{GraphEdge, GraphNode, Properties};
use crate::schema::RecordKind;

pub const GRAPH_FILE: &str = "networkx_graph.json";
pub const IMPORT_SCRIPT: &str = "import_networkx.py";

/// In-memory graph collector
pub(crate) struct NetworkxWriter {
    settings: WriterSettings,
    nodes: Vec<Value>,
    links: Vec<Value>,
    rows: IndexMap<(RecordKind, String), u64>,
}

fn attributes(properties: &Properties) -> WriterResult<Map<String, Value>> {
    let mut map = Map::new();
    for (key, value) in properties {
        map.insert(key.clone(), serde_json::to_value(value)?);
    }
    Ok(map)
}

impl NetworkxWriter {
    pub fn new(settings: WriterSettings) -> Self {
        Self {
            settings,
            nodes: Vec::new(),
            links: Vec::new(),
            rows: IndexMap::new(),
        }
    }
}

fn loader_script(settings: &WriterSettings, graph: &Path) -> String {
    format!(
        "import json\n\
         import networkx as nx\n\
         \n\
         with open({path:?}) as handle:\n    \
             data = json.load(handle)\n\
         \n\
         G = nx.node_link_graph(data)\n",
        path = script_path(settings, graph)
    )
}

impl BatchWriter for NetworkxWriter {
    fn write_node(&mut self, node: &GraphNode) -> WriterResult<bool> {
        let mut entry = attributes(&node.properties)?;
        entry.insert("id".into(), json!(node.id));
        entry.insert("label".into(), json!(node.label));
        entry.insert("preferred_id".into(), json!(node.preferred_id));
        entry.insert("labels".into(), json!(node.lineage.as_ref()));
        self.nodes.push(Value::Object(entry));
        *self.rows.entry((RecordKind::Node, node.label.clone())).or_default() += 1;
        Ok(true)
    }

    fn write_edge(&mut self, edge: &GraphEdge) -> WriterResult<bool> {
        let mut entry = attributes(&edge.properties)?;
        entry.insert("source".into(), json!(edge.source));
        entry.insert("target".into(), json!(edge.target));
        entry.insert("key".into(), json!(edge.dedup_id()));
        if let Some(id) = &edge.id {
            entry.insert("id".into(), json!(id));
        }
        entry.insert("label".into(), json!(edge.label));
        self.links.push(Value::Object(entry));
        *self.rows.entry((RecordKind::Edge, edge.label.clone())).or_default() += 1;
        Ok(true)
    }

    fn finish(self: Box<Self>) -> WriterResult<ExportSummary> {
        let NetworkxWriter {
            settings,
            nodes,
            links,
            rows,
        } = *self;

        let path = settings.output_dir.join(GRAPH_FILE);
        let graph = json!({
            "directed": true,
            "multigraph": true,
            "graph": { "created": Utc::now().to_rfc3339() },
            "nodes": nodes,
            "links": links,
        });
        let file = File::create(&path).map_err(|e| WriterError::io("create", &path, e))?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, &graph)?;
        out.flush().map_err(|e| WriterError::io("flush", &path, e))?;

        let script = settings.output_dir.join(IMPORT_SCRIPT);
        write_script(&script, &loader_script(&settings, &path))?;

        let mut summary = ExportSummary::new(settings.dbms, &settings.output_dir);
        for ((kind, label), count) in rows {
            summary.record_label(kind, &label, count, 1);
        }
        summary.files.push(path.clone());
        summary.files.push(script.clone());
        summary.import_script = Some(script);
        info!(path = %path.display(), labels = summary.labels.len(), "Wrote node-link graph");
        Ok(summary)
    }
}
