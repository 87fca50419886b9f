//! Record translation
//!
//! Resolves each adapter record's input label through the schema mapping,
//! filters its properties against the class allow-list, assigns identifiers
//! and emits a [`GraphRecord`]. Relationships whose label maps to a node
//! entry are reified into an association node plus two linking edges.
//!
//! Per-record problems are filtered through the [`ValidationMode`]: `strict`
//! returns the error, `warn` logs and drops the record, `none` drops silently
//! (unknown labels pass through unchanged). Edges without a source or target
//! are an error in every mode.

pub mod error;

pub use error::{TranslationError, TranslationResult};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ValidationMode;
use crate::models::{
    synthesize_id, EdgeRecord, GraphEdge, GraphNode, GraphRecord, InputRecord, NodeRecord,
    Properties,
};
use crate::ontology::Ontology;
use crate::schema::{RecordKind, SchemaEntry};

/// Label of the edge linking a relationship's source to its association node
pub const SOURCE_LINK_LABEL: &str = "IS_SOURCE_OF";

/// Label of the edge linking a relationship's target to its association node
pub const TARGET_LINK_LABEL: &str = "IS_TARGET_OF";

/// Counters collected while translating
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationStats {
    pub nodes: u64,
    pub edges: u64,
    pub associations: u64,
    /// Records with unknown labels written as-is (`none` mode)
    pub passed_through: u64,
    /// Records dropped per input label, unknown labels excluded
    pub dropped: BTreeMap<String, u64>,
    /// Records seen per unknown input label
    pub unknown_labels: BTreeMap<String, u64>,
    /// Undeclared property values removed per input label
    pub dropped_properties: BTreeMap<String, u64>,
}

impl TranslationStats {
    pub fn total_dropped(&self) -> u64 {
        self.dropped.values().sum::<u64>() + self.unknown_labels.values().sum::<u64>()
    }
}

/// Translates adapter records against a bound ontology
#[derive(Debug)]
pub struct Translator<'a> {
    ontology: &'a Ontology,
    mode: ValidationMode,
    lineages: HashMap<String, Arc<[String]>>,
    stats: TranslationStats,
}

impl<'a> Translator<'a> {
    pub fn new(ontology: &'a Ontology, mode: ValidationMode) -> Self {
        Self {
            ontology,
            mode,
            lineages: HashMap::new(),
            stats: TranslationStats::default(),
        }
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn stats(&self) -> &TranslationStats {
        &self.stats
    }

    pub fn into_stats(self) -> TranslationStats {
        self.stats
    }

    /// Translate one record; `Ok(None)` means the record was dropped
    pub fn translate(&mut self, record: InputRecord) -> TranslationResult<Option<GraphRecord>> {
        match record {
            InputRecord::Node(node) => self.translate_node(node),
            InputRecord::Edge(edge) => self.translate_edge(edge),
        }
    }

    pub fn translate_node(&mut self, node: NodeRecord) -> TranslationResult<Option<GraphRecord>> {
        let ontology = self.ontology;
        let mapping = ontology.mapping();

        let Some(entry) = mapping.entry_for_input(&node.label, RecordKind::Node) else {
            if mapping.entry_for_input(&node.label, RecordKind::Edge).is_some() {
                let label = node.label.clone();
                return self.reject(
                    &label,
                    TranslationError::NodeMappedToEdge {
                        id: node.id,
                        label: node.label,
                    },
                );
            }
            if !self.on_unknown(&node.label)? {
                return Ok(None);
            }
            self.stats.passed_through += 1;
            let lineage: Arc<[String]> = Arc::from(vec![node.label.clone()]);
            return Ok(Some(GraphRecord::Node(GraphNode {
                id: node.id,
                label: node.label,
                preferred_id: "id".to_string(),
                properties: node.properties,
                lineage,
            })));
        };

        let properties = self.filter_properties(entry, &node.label, &node.id, node.properties)?;
        self.stats.nodes += 1;
        Ok(Some(GraphRecord::Node(self.graph_node(entry, node.id, properties))))
    }

    pub fn translate_edge(&mut self, edge: EdgeRecord) -> TranslationResult<Option<GraphRecord>> {
        let source = endpoint(edge.source, &edge.label, "source")?;
        let target = endpoint(edge.target, &edge.label, "target")?;
        let given_id = edge.id.filter(|id| !id.is_empty());

        let ontology = self.ontology;
        let mapping = ontology.mapping();

        if let Some(entry) = mapping.entry_for_input(&edge.label, RecordKind::Edge) {
            let key = given_id
                .clone()
                .unwrap_or_else(|| synthesize_id(&source, &target));
            let properties = self.filter_properties(entry, &edge.label, &key, edge.properties)?;
            let id = match entry {
                SchemaEntry::Edge(e) if !e.use_id => None,
                _ => given_id,
            };
            self.stats.edges += 1;
            return Ok(Some(GraphRecord::Edge(GraphEdge {
                id,
                key,
                source,
                target,
                label: entry.output_label().to_string(),
                properties,
            })));
        }

        if let Some(entry) = mapping.entry_for_input(&edge.label, RecordKind::Node) {
            let id = given_id.unwrap_or_else(|| synthesize_id(&source, &target));
            let properties = self.filter_properties(entry, &edge.label, &id, edge.properties)?;
            let node = self.graph_node(entry, id.clone(), properties);
            self.stats.associations += 1;
            return Ok(Some(GraphRecord::Association {
                node,
                source_edge: GraphEdge::new(None, source, id.clone(), SOURCE_LINK_LABEL),
                target_edge: GraphEdge::new(None, target, id, TARGET_LINK_LABEL),
            }));
        }

        if !self.on_unknown(&edge.label)? {
            return Ok(None);
        }
        self.stats.passed_through += 1;
        Ok(Some(GraphRecord::Edge(
            GraphEdge::new(given_id, source, target, edge.label).with_properties(edge.properties),
        )))
    }

    /// Canonical class of an input label
    pub fn translate_term(&self, input_label: &str) -> Option<&'a str> {
        let ontology = self.ontology;
        ontology.mapping().class_for_input(input_label)
    }

    /// First input label mapped to a class
    pub fn reverse_translate_term(&self, class: &str) -> Option<&'a str> {
        let ontology = self.ontology;
        ontology
            .mapping()
            .input_labels_for_class(class)
            .first()
            .map(String::as_str)
    }

    fn graph_node(&mut self, entry: &SchemaEntry, id: String, properties: Properties) -> GraphNode {
        GraphNode {
            id,
            label: entry.class_name().to_string(),
            preferred_id: entry.preferred_id().to_string(),
            properties,
            lineage: self.lineage(entry.class_name()),
        }
    }

    fn lineage(&mut self, class: &str) -> Arc<[String]> {
        if let Some(lineage) = self.lineages.get(class) {
            return Arc::clone(lineage);
        }
        let lineage: Arc<[String]> = self
            .ontology
            .ancestors(class)
            .unwrap_or_else(|_| vec![class.to_string()])
            .into();
        self.lineages.insert(class.to_string(), Arc::clone(&lineage));
        lineage
    }

    /// Keep declared properties in declared order, filling absent ones with
    /// null. Entries without declared properties pass everything through.
    fn filter_properties(
        &mut self,
        entry: &SchemaEntry,
        label: &str,
        id: &str,
        mut properties: Properties,
    ) -> TranslationResult<Properties> {
        let allowed = entry.allowed_properties();
        if allowed.is_empty() {
            return Ok(properties);
        }

        if let Some(key) = properties.keys().find(|k| !allowed.contains_key(k.as_str())) {
            if self.mode == ValidationMode::Strict {
                return Err(TranslationError::UndeclaredProperty {
                    label: label.to_string(),
                    id: id.to_string(),
                    property: key.clone(),
                });
            }
            debug!(label, id, property = %key, "Dropping undeclared property");
            let removed = properties
                .keys()
                .filter(|k| !allowed.contains_key(k.as_str()))
                .count() as u64;
            *self
                .stats
                .dropped_properties
                .entry(label.to_string())
                .or_default() += removed;
        }

        let mut filtered = Properties::with_capacity(allowed.len());
        for name in allowed.keys() {
            let value = properties.swap_remove(name).unwrap_or_default();
            filtered.insert(name.clone(), value);
        }
        Ok(filtered)
    }

    /// Decide what to do with an unknown label; `true` means pass through
    fn on_unknown(&mut self, label: &str) -> TranslationResult<bool> {
        match self.mode {
            ValidationMode::Strict => Err(TranslationError::UnknownLabel {
                label: label.to_string(),
            }),
            ValidationMode::Warn => {
                let seen = self.stats.unknown_labels.entry(label.to_string()).or_default();
                if *seen == 0 {
                    warn!(label, "Input label not in schema, dropping its records");
                }
                *seen += 1;
                Ok(false)
            }
            ValidationMode::None => Ok(true),
        }
    }

    fn reject(
        &mut self,
        label: &str,
        err: TranslationError,
    ) -> TranslationResult<Option<GraphRecord>> {
        if err.is_fatal_in(self.mode) {
            return Err(err);
        }
        if self.mode == ValidationMode::Warn {
            warn!(error = %err, "Dropping record");
        }
        *self.stats.dropped.entry(label.to_string()).or_default() += 1;
        Ok(None)
    }
}

fn endpoint(id: Option<String>, label: &str, side: &'static str) -> TranslationResult<String> {
    id.filter(|id| !id.trim().is_empty())
        .ok_or_else(|| TranslationError::MissingEndpoint {
            label: label.to_string(),
            side,
        })
}
