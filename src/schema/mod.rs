//! Schema mapping
//!
//! Parses the schema configuration (top-level keys are ontology class names)
//! into tagged [`SchemaEntry`] values, checks them eagerly, and binds them to
//! an [`OntologyTree`]. Binding grafts schema-only classes below their `is_a`
//! chain and resolves inherited property allow-lists, producing the frozen
//! [`Ontology`] used by translation.
//!
//! ```yaml
//! protein:
//!   represented_as: node
//!   preferred_id: uniprot
//!   input_label: uniprot_protein
//!   properties:
//!     name: str
//!     taxon: int
//! binding:
//!   is_a: protein protein interaction
//!   inherit_properties: true
//!   input_label: [binding, physical_binding]
//! ```

pub mod error;

pub use error::{SchemaError, SchemaResult};

use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::models::PropertyType;
use crate::ontology::casing::to_lower_sentence_case;
use crate::ontology::tree::OntologyTree;
use crate::ontology::Ontology;

/// Ordered property name -> declared type map
pub type PropertySchema = IndexMap<String, PropertyType>;

/// How records of an entry are represented in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Node,
    Edge,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Edge => "edge",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Entries
// ============================================================================

/// Fields shared by node and edge entries
#[derive(Debug, Clone, PartialEq)]
pub struct EntryCommon {
    /// Canonical class name (the schema key in lower sentence case)
    pub class_name: String,
    pub input_labels: Vec<String>,
    pub preferred_id: Option<String>,
    /// Direct parent first, then its parent, and so on
    pub is_a: Vec<String>,
    pub inherit_properties: bool,
    /// Properties declared on this entry
    pub properties: PropertySchema,
    pub exclude_properties: Vec<String>,
    allowed: PropertySchema,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeSchemaEntry {
    pub common: EntryCommon,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSchemaEntry {
    pub common: EntryCommon,
    pub source: Option<String>,
    pub target: Option<String>,
    pub label_as_edge: Option<String>,
    /// Write adapter-provided ids into the id column
    pub use_id: bool,
}

/// One schema configuration entry
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaEntry {
    Node(NodeSchemaEntry),
    Edge(EdgeSchemaEntry),
}

impl SchemaEntry {
    pub fn common(&self) -> &EntryCommon {
        match self {
            Self::Node(n) => &n.common,
            Self::Edge(e) => &e.common,
        }
    }

    fn common_mut(&mut self) -> &mut EntryCommon {
        match self {
            Self::Node(n) => &mut n.common,
            Self::Edge(e) => &mut e.common,
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Node(_) => RecordKind::Node,
            Self::Edge(_) => RecordKind::Edge,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.common().class_name
    }

    /// Identifier namespace, `id` when none is declared
    pub fn preferred_id(&self) -> &str {
        self.common().preferred_id.as_deref().unwrap_or("id")
    }

    /// Properties kept on translated records; empty means pass-through
    pub fn allowed_properties(&self) -> &PropertySchema {
        &self.common().allowed
    }

    /// Label written for records of this entry
    pub fn output_label(&self) -> &str {
        match self {
            Self::Edge(EdgeSchemaEntry {
                label_as_edge: Some(label),
                ..
            }) => label,
            _ => self.class_name(),
        }
    }
}

// ============================================================================
// Raw configuration
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s],
            Self::Many(v) => v,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEntry {
    represented_as: Option<String>,
    preferred_id: Option<String>,
    input_label: Option<OneOrMany>,
    is_a: Option<OneOrMany>,
    inherit_properties: bool,
    properties: Option<IndexMap<String, String>>,
    exclude_properties: Option<OneOrMany>,
    source: Option<String>,
    target: Option<String>,
    label_as_edge: Option<String>,
    use_id: Option<bool>,
}

/// Entry with field types checked but inheritance not yet applied
#[derive(Debug)]
struct Draft {
    represented_as: Option<RecordKind>,
    preferred_id: Option<String>,
    input_labels: Vec<String>,
    is_a: Vec<String>,
    inherit_properties: bool,
    properties: PropertySchema,
    exclude_properties: Vec<String>,
    source: Option<String>,
    target: Option<String>,
    label_as_edge: Option<String>,
    use_id: Option<bool>,
}

impl Draft {
    fn from_raw(key: &str, raw: RawEntry) -> SchemaResult<Self> {
        let represented_as = raw
            .represented_as
            .map(|r| match r.trim().to_lowercase().as_str() {
                "node" => Ok(RecordKind::Node),
                "edge" => Ok(RecordKind::Edge),
                other => Err(SchemaError::invalid_entry(
                    key,
                    format!("unknown represented_as '{other}'"),
                )),
            })
            .transpose()?;

        let mut properties = PropertySchema::new();
        for (name, ty) in raw.properties.unwrap_or_default() {
            let ty = ty
                .parse::<PropertyType>()
                .map_err(|reason| SchemaError::invalid_entry(key, format!("property '{name}': {reason}")))?;
            properties.insert(name, ty);
        }

        Ok(Self {
            represented_as,
            preferred_id: raw.preferred_id,
            input_labels: raw.input_label.map(OneOrMany::into_vec).unwrap_or_default(),
            is_a: raw
                .is_a
                .map(OneOrMany::into_vec)
                .unwrap_or_default()
                .iter()
                .map(|p| to_lower_sentence_case(p))
                .collect(),
            inherit_properties: raw.inherit_properties,
            properties,
            exclude_properties: raw
                .exclude_properties
                .map(OneOrMany::into_vec)
                .unwrap_or_default(),
            source: raw.source.map(|s| to_lower_sentence_case(&s)),
            target: raw.target.map(|t| to_lower_sentence_case(&t)),
            label_as_edge: raw.label_as_edge,
            use_id: raw.use_id,
        })
    }
}

/// First value found walking `class` and its schema `is_a` parents
fn inherited<T>(
    drafts: &IndexMap<String, Draft>,
    class: &str,
    get: impl Fn(&Draft) -> Option<T>,
) -> SchemaResult<Option<T>> {
    let mut seen = HashSet::new();
    let mut current = class;
    loop {
        if !seen.insert(current) {
            return Err(SchemaError::InheritanceCycle {
                class: current.to_string(),
            });
        }
        let Some(draft) = drafts.get(current) else {
            return Ok(None);
        };
        if let Some(value) = get(draft) {
            return Ok(Some(value));
        }
        match draft.is_a.first() {
            Some(parent) => current = parent,
            None => return Ok(None),
        }
    }
}

// ============================================================================
// Mapping
// ============================================================================

/// Validated schema configuration with lookup indices
#[derive(Debug, Clone, Default)]
pub struct SchemaMapping {
    entries: Vec<SchemaEntry>,
    by_class: HashMap<String, usize>,
    node_labels: HashMap<String, usize>,
    edge_labels: HashMap<String, usize>,
    by_output_label: HashMap<String, usize>,
}

impl SchemaMapping {
    /// Load the schema configuration from a YAML file
    pub fn from_file(path: &Path) -> SchemaResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mapping = Self::from_yaml_str(&content)?;
        debug!(path = %path.display(), entries = mapping.len(), "Loaded schema configuration");
        Ok(mapping)
    }

    pub fn from_yaml_str(content: &str) -> SchemaResult<Self> {
        let doc: Option<IndexMap<String, serde_yaml::Value>> = serde_yaml::from_str(content)?;

        let mut drafts: IndexMap<String, Draft> = IndexMap::new();
        for (key, value) in doc.unwrap_or_default() {
            if !value.is_mapping() {
                return Err(SchemaError::invalid_entry(&key, "expected a mapping"));
            }
            let raw: RawEntry = serde_yaml::from_value(value)
                .map_err(|e| SchemaError::invalid_entry(&key, e.to_string()))?;
            let draft = Draft::from_raw(&key, raw)?;
            if drafts.insert(to_lower_sentence_case(&key), draft).is_some() {
                return Err(SchemaError::invalid_entry(&key, "declared more than once"));
            }
        }

        let mut entries = Vec::with_capacity(drafts.len());
        for (class, draft) in &drafts {
            let kind = inherited(&drafts, class, |d| d.represented_as)?.ok_or_else(|| {
                SchemaError::invalid_entry(class, "represented_as is missing and not inherited through is_a")
            })?;
            let common = EntryCommon {
                class_name: class.clone(),
                input_labels: draft.input_labels.clone(),
                preferred_id: inherited(&drafts, class, |d| d.preferred_id.clone())?,
                is_a: draft.is_a.clone(),
                inherit_properties: draft.inherit_properties,
                properties: draft.properties.clone(),
                exclude_properties: draft.exclude_properties.clone(),
                allowed: draft.properties.clone(),
            };
            entries.push(match kind {
                RecordKind::Node => SchemaEntry::Node(NodeSchemaEntry { common }),
                RecordKind::Edge => SchemaEntry::Edge(EdgeSchemaEntry {
                    common,
                    source: inherited(&drafts, class, |d| d.source.clone())?,
                    target: inherited(&drafts, class, |d| d.target.clone())?,
                    label_as_edge: draft.label_as_edge.clone(),
                    use_id: inherited(&drafts, class, |d| d.use_id)?.unwrap_or(true),
                }),
            });
        }

        Self::index(entries)
    }

    fn index(entries: Vec<SchemaEntry>) -> SchemaResult<Self> {
        let mut mapping = Self {
            entries,
            ..Self::default()
        };

        for (i, entry) in mapping.entries.iter().enumerate() {
            mapping.by_class.insert(entry.class_name().to_string(), i);
            mapping
                .by_output_label
                .entry(entry.output_label().to_string())
                .or_insert(i);

            let labels = match entry.kind() {
                RecordKind::Node => &mut mapping.node_labels,
                RecordKind::Edge => &mut mapping.edge_labels,
            };
            for label in &entry.common().input_labels {
                if let Some(&first) = labels.get(label) {
                    return Err(SchemaError::DuplicateInputLabel {
                        label: label.clone(),
                        kind: entry.kind().as_str(),
                        first: mapping.entries[first].class_name().to_string(),
                        second: entry.class_name().to_string(),
                    });
                }
                labels.insert(label.clone(), i);
            }
        }

        Ok(mapping)
    }

    /// Attach the schema to a class tree
    ///
    /// Classes missing from the tree are grafted below their `is_a` chain,
    /// whose last element must resolve. Property allow-lists are then
    /// resolved against the extended tree.
    pub fn bind(mut self, mut tree: OntologyTree) -> SchemaResult<Ontology> {
        let before = tree.len();
        for i in 0..self.entries.len() {
            let class = self.entries[i].class_name().to_string();
            self.ensure_class(&class, &mut tree, &mut Vec::new())?;
        }

        let allowed = (0..self.entries.len())
            .map(|i| self.resolve_properties(i, &tree))
            .collect::<SchemaResult<Vec<_>>>()?;
        for (entry, allowed) in self.entries.iter_mut().zip(allowed) {
            entry.common_mut().allowed = allowed;
        }

        for entry in &self.entries {
            if let SchemaEntry::Edge(edge) = entry {
                for endpoint in [&edge.source, &edge.target].into_iter().flatten() {
                    if !tree.contains(endpoint) {
                        warn!(
                            class = %edge.common.class_name,
                            endpoint = %endpoint,
                            "Edge endpoint class is not part of the ontology"
                        );
                    }
                }
            }
        }

        info!(
            entries = self.entries.len(),
            grafted = tree.len() - before,
            classes = tree.len(),
            "Schema bound to ontology"
        );
        Ok(Ontology::new(tree, self))
    }

    /// Make sure `class` is in the tree, grafting its `is_a` chain as needed
    fn ensure_class(
        &self,
        class: &str,
        tree: &mut OntologyTree,
        stack: &mut Vec<String>,
    ) -> SchemaResult<()> {
        let chain = match self.by_class.get(class) {
            Some(&i) => self.entries[i].common().is_a.clone(),
            None if tree.contains(class) => return Ok(()),
            None => {
                return Err(SchemaError::UnknownClass {
                    name: class.to_string(),
                })
            }
        };
        if stack.iter().any(|c| c == class) {
            return Err(SchemaError::InheritanceCycle {
                class: class.to_string(),
            });
        }
        if chain.is_empty() {
            return if tree.contains(class) {
                Ok(())
            } else {
                Err(SchemaError::UnknownClass {
                    name: class.to_string(),
                })
            };
        }

        stack.push(class.to_string());
        let unresolved = |parent: &str| SchemaError::UnresolvedParent {
            class: class.to_string(),
            parent: parent.to_string(),
        };

        let last = chain.len() - 1;
        if !tree.contains(&chain[last]) {
            self.ensure_class(&chain[last], tree, stack)
                .map_err(|e| match e {
                    SchemaError::UnknownClass { .. } => unresolved(&chain[last]),
                    other => other,
                })?;
        }
        for j in (0..last).rev() {
            tree.graft(&chain[j], &chain[j + 1])
                .map_err(|_| unresolved(&chain[j + 1]))?;
        }
        if tree.contains(class) {
            debug!(class, "Schema class already in ontology, keeping its position");
        } else {
            tree.graft(class, &chain[0]).map_err(|_| unresolved(&chain[0]))?;
        }

        stack.pop();
        Ok(())
    }

    /// Own properties, then those of the nearest declaring ancestor, minus
    /// exclusions
    fn resolve_properties(&self, i: usize, tree: &OntologyTree) -> SchemaResult<PropertySchema> {
        let common = self.entries[i].common();
        let mut allowed = common.properties.clone();

        if common.inherit_properties {
            let nearest = match self.declaring_parent(&common.is_a, &mut vec![i]) {
                Some(props) => Some(props),
                None => {
                    let ancestors = tree.ancestors(&common.class_name).ok_or_else(|| {
                        SchemaError::UnknownClass {
                            name: common.class_name.clone(),
                        }
                    })?;
                    ancestors
                        .iter()
                        .skip(1)
                        .filter_map(|a| self.by_class.get(*a))
                        .map(|&j| &self.entries[j].common().properties)
                        .find(|props| !props.is_empty())
                }
            };
            if let Some(props) = nearest {
                for (name, ty) in props {
                    allowed.entry(name.clone()).or_insert(*ty);
                }
            }
        }

        for name in &common.exclude_properties {
            allowed.shift_remove(name);
        }
        Ok(allowed)
    }

    /// Properties of the first schema entry declaring any, walking `chain`
    /// nearest first and each parent's own `is_a` before moving on
    fn declaring_parent(&self, chain: &[String], seen: &mut Vec<usize>) -> Option<&PropertySchema> {
        for parent in chain {
            let Some(&j) = self.by_class.get(parent.as_str()) else {
                continue;
            };
            if seen.contains(&j) {
                continue;
            }
            seen.push(j);
            let common = self.entries[j].common();
            if !common.properties.is_empty() {
                return Some(&common.properties);
            }
            if let Some(props) = self.declaring_parent(&common.is_a, seen) {
                return Some(props);
            }
        }
        None
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn entry_for_input(&self, label: &str, kind: RecordKind) -> Option<&SchemaEntry> {
        let index = match kind {
            RecordKind::Node => &self.node_labels,
            RecordKind::Edge => &self.edge_labels,
        };
        index.get(label).map(|&i| &self.entries[i])
    }

    pub fn entry_for_class(&self, class: &str) -> Option<&SchemaEntry> {
        self.by_class
            .get(&to_lower_sentence_case(class))
            .map(|&i| &self.entries[i])
    }

    /// Canonical class of an input label, node entries first
    pub fn class_for_input(&self, label: &str) -> Option<&str> {
        self.entry_for_input(label, RecordKind::Node)
            .or_else(|| self.entry_for_input(label, RecordKind::Edge))
            .map(SchemaEntry::class_name)
    }

    pub fn input_labels_for_class(&self, class: &str) -> &[String] {
        self.entry_for_class(class)
            .map(|e| e.common().input_labels.as_slice())
            .unwrap_or_default()
    }

    /// Declared column types for an output label
    pub fn declared_property_types(&self, label: &str) -> Option<&PropertySchema> {
        self.by_output_label
            .get(label)
            .map(|&i| self.entries[i].allowed_properties())
            .filter(|props| !props.is_empty())
    }

    /// Declared column types of every output label
    pub fn declared_types(&self) -> HashMap<String, PropertySchema> {
        self.by_output_label
            .keys()
            .filter_map(|label| {
                self.declared_property_types(label)
                    .map(|props| (label.clone(), props.clone()))
            })
            .collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
protein:
  represented_as: node
  preferred_id: uniprot
  input_label: protein
  properties:
    name: str
    taxon: int
protein protein interaction:
  represented_as: edge
  source: protein
  target: protein
  properties:
    is_directed: bool
binding:
  is_a: protein protein interaction
  inherit_properties: true
  input_label: [binding, physical_binding]
  exclude_properties: []
"#;

    fn tree() -> OntologyTree {
        let mut tree = OntologyTree::with_root("entity");
        tree.graft("named thing", "entity").unwrap();
        tree.graft("protein", "named thing").unwrap();
        tree.graft("association", "entity").unwrap();
        tree.graft("protein protein interaction", "association").unwrap();
        tree
    }

    #[test]
    fn test_parse_entries() {
        let mapping = SchemaMapping::from_yaml_str(SCHEMA).unwrap();
        assert_eq!(mapping.len(), 3);

        let protein = mapping.entry_for_input("protein", RecordKind::Node).unwrap();
        assert_eq!(protein.preferred_id(), "uniprot");
        assert_eq!(protein.common().properties["taxon"], PropertyType::Int);

        // represented_as, source and target come from the parent entry
        let Some(SchemaEntry::Edge(binding)) = mapping.entry_for_input("physical_binding", RecordKind::Edge)
        else {
            panic!("binding should be an edge entry");
        };
        assert_eq!(binding.source.as_deref(), Some("protein"));
        assert!(binding.use_id);
        assert_eq!(mapping.class_for_input("binding"), Some("binding"));
        assert_eq!(mapping.input_labels_for_class("Binding"), ["binding", "physical_binding"]);
    }

    #[test]
    fn test_duplicate_input_label() {
        let yaml = "a:\n  represented_as: node\n  input_label: x\nb:\n  represented_as: node\n  input_label: x\n";
        let err = SchemaMapping::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateInputLabel { kind: "node", .. }));
    }

    #[test]
    fn test_same_label_for_node_and_edge_is_allowed() {
        let yaml = "a:\n  represented_as: node\n  input_label: x\nb:\n  represented_as: edge\n  input_label: x\n";
        assert!(SchemaMapping::from_yaml_str(yaml).is_ok());
    }

    #[test]
    fn test_invalid_entries() {
        let err = SchemaMapping::from_yaml_str("a:\n  represented_as: hyperedge\n").unwrap_err();
        assert!(err.to_string().contains("hyperedge"));

        let err = SchemaMapping::from_yaml_str("a:\n  represented_as: node\n  properties:\n    x: decimal\n")
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidEntry { .. }));

        let err = SchemaMapping::from_yaml_str("a:\n  input_label: a\n").unwrap_err();
        assert!(err.to_string().contains("represented_as"));

        let err = SchemaMapping::from_yaml_str("a: 3\n").unwrap_err();
        assert!(err.to_string().contains("mapping"));
    }

    #[test]
    fn test_inheritance_cycle() {
        let yaml = "a:\n  is_a: b\nb:\n  is_a: a\n";
        let err = SchemaMapping::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, SchemaError::InheritanceCycle { .. }));
    }

    #[test]
    fn test_bind_grafts_and_inherits_properties() {
        let ontology = SchemaMapping::from_yaml_str(SCHEMA).unwrap().bind(tree()).unwrap();
        assert_eq!(
            ontology.ancestors("binding").unwrap(),
            ["binding", "protein protein interaction", "association", "entity"]
        );

        let binding = ontology.mapping().entry_for_class("binding").unwrap();
        assert_eq!(
            binding.allowed_properties().keys().collect::<Vec<_>>(),
            ["is_directed"]
        );
        assert_eq!(
            ontology.mapping().declared_property_types("binding").unwrap()["is_directed"],
            PropertyType::Bool
        );
    }

    #[test]
    fn test_inherits_from_schema_parent_when_tree_places_class_elsewhere() {
        let mut tree = tree();
        tree.graft("binding", "association").unwrap();

        let ontology = SchemaMapping::from_yaml_str(SCHEMA).unwrap().bind(tree).unwrap();
        // the tree position is kept
        assert_eq!(
            ontology.ancestors("binding").unwrap(),
            ["binding", "association", "entity"]
        );
        let binding = ontology.mapping().entry_for_class("binding").unwrap();
        assert!(binding.allowed_properties().contains_key("is_directed"));
    }

    #[test]
    fn test_inherits_through_parent_without_properties() {
        let yaml = r#"
protein:
  represented_as: node
  properties: {name: str}
isoform:
  represented_as: node
  is_a: protein
fragment:
  represented_as: node
  is_a: isoform
  inherit_properties: true
"#;
        let mut tree = tree();
        tree.graft("isoform", "named thing").unwrap();
        tree.graft("fragment", "named thing").unwrap();

        let ontology = SchemaMapping::from_yaml_str(yaml).unwrap().bind(tree).unwrap();
        let fragment = ontology.mapping().entry_for_class("fragment").unwrap();
        assert_eq!(fragment.allowed_properties().keys().collect::<Vec<_>>(), ["name"]);
    }

    #[test]
    fn test_bind_is_a_chain() {
        let yaml = r#"
variant to gene association:
  represented_as: edge
  is_a: [gene association, association]
  input_label: v2g
"#;
        let ontology = SchemaMapping::from_yaml_str(yaml).unwrap().bind(tree()).unwrap();
        assert_eq!(
            ontology.ancestors("variant to gene association").unwrap(),
            ["variant to gene association", "gene association", "association", "entity"]
        );
    }

    #[test]
    fn test_bind_parent_declared_later_in_file() {
        let yaml = r#"
child:
  represented_as: node
  is_a: parent
parent:
  represented_as: node
  is_a: protein
"#;
        let ontology = SchemaMapping::from_yaml_str(yaml).unwrap().bind(tree()).unwrap();
        assert_eq!(ontology.ancestors("child").unwrap()[..3], ["child", "parent", "protein"]);
    }

    #[test]
    fn test_unresolved_parent() {
        let yaml = "thing:\n  represented_as: node\n  is_a: nonexistent class\n";
        let err = SchemaMapping::from_yaml_str(yaml).unwrap().bind(tree()).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnresolvedParent { ref parent, .. } if parent == "nonexistent class"
        ));
    }

    #[test]
    fn test_unknown_class_without_is_a() {
        let yaml = "gizmo:\n  represented_as: node\n";
        let err = SchemaMapping::from_yaml_str(yaml).unwrap().bind(tree()).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownClass { .. }));
    }

    #[test]
    fn test_exclude_properties() {
        let yaml = r#"
protein:
  represented_as: node
  properties: {name: str, sequence: str}
isoform:
  represented_as: node
  is_a: protein
  inherit_properties: true
  properties: {isoform_id: str}
  exclude_properties: sequence
"#;
        let ontology = SchemaMapping::from_yaml_str(yaml).unwrap().bind(tree()).unwrap();
        let isoform = ontology.mapping().entry_for_class("isoform").unwrap();
        assert_eq!(
            isoform.allowed_properties().keys().collect::<Vec<_>>(),
            ["isoform_id", "name"]
        );
    }
}
