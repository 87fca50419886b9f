// Core data structures shared by translation and export

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Ordered property map; column order follows insertion order
pub type Properties = IndexMap<String, PropertyValue>;

/// A single property value as delivered by an adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum PropertyValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Render a scalar for a text cell. Lists are rendered by the writer.
    pub fn to_cell(&self) -> Cow<'_, str> {
        match self {
            Self::Null => Cow::Borrowed(""),
            Self::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            Self::Int(i) => Cow::Owned(i.to_string()),
            Self::Float(f) => Cow::Owned(f.to_string()),
            Self::Str(s) => Cow::Borrowed(s.as_str()),
            Self::List(items) => Cow::Owned(
                items
                    .iter()
                    .map(|v| v.to_cell().into_owned())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cell())
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

/// Declared type of a schema property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    Str,
    Int,
    Float,
    Bool,
    StrList,
    IntList,
    FloatList,
    BoolList,
}

impl PropertyType {
    /// Canonical schema spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::StrList => "str[]",
            Self::IntList => "int[]",
            Self::FloatList => "float[]",
            Self::BoolList => "bool[]",
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(
            self,
            Self::StrList | Self::IntList | Self::FloatList | Self::BoolList
        )
    }

    /// Element type of a list type, or the type itself for scalars
    pub fn element(&self) -> PropertyType {
        match self {
            Self::StrList => Self::Str,
            Self::IntList => Self::Int,
            Self::FloatList => Self::Float,
            Self::BoolList => Self::Bool,
            other => *other,
        }
    }

    fn list_of(element: PropertyType) -> PropertyType {
        match element {
            Self::Int => Self::IntList,
            Self::Float => Self::FloatList,
            Self::Bool => Self::BoolList,
            _ => Self::StrList,
        }
    }

    /// Infer the type of a value; `None` for null and empty lists
    pub fn infer(value: &PropertyValue) -> Option<PropertyType> {
        match value {
            PropertyValue::Null => None,
            PropertyValue::Bool(_) => Some(Self::Bool),
            PropertyValue::Int(_) => Some(Self::Int),
            PropertyValue::Float(_) => Some(Self::Float),
            PropertyValue::Str(_) => Some(Self::Str),
            PropertyValue::List(items) => items
                .iter()
                .find_map(Self::infer)
                .map(|t| Self::list_of(t.element())),
        }
    }

    /// Whether a value conforms to this type. Null always conforms and
    /// integers are accepted where floats are declared.
    pub fn accepts(&self, value: &PropertyValue) -> bool {
        match (self, value) {
            (_, PropertyValue::Null) => true,
            (Self::Str, PropertyValue::Str(_)) => true,
            (Self::Int, PropertyValue::Int(_)) => true,
            (Self::Float, PropertyValue::Float(_) | PropertyValue::Int(_)) => true,
            (Self::Bool, PropertyValue::Bool(_)) => true,
            (list, PropertyValue::List(items)) if list.is_list() => {
                let element = list.element();
                items.iter().all(|item| element.accepts(item))
            }
            _ => false,
        }
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "str" | "string" => Ok(Self::Str),
            "int" | "integer" | "long" => Ok(Self::Int),
            "float" | "double" => Ok(Self::Float),
            "bool" | "boolean" => Ok(Self::Bool),
            "str[]" | "string[]" | "list" | "array" => Ok(Self::StrList),
            "int[]" | "integer[]" | "long[]" => Ok(Self::IntList),
            "float[]" | "double[]" => Ok(Self::FloatList),
            "bool[]" | "boolean[]" => Ok(Self::BoolList),
            other => Err(format!("unknown property type '{other}'")),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Adapter records
// ============================================================================

/// Entity tuple `(id, input_label, properties)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub properties: Properties,
}

impl NodeRecord {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Relationship tuple `(id?, source_id, target_id, input_label, properties)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    pub label: String,
    #[serde(default)]
    pub properties: Properties,
}

impl EdgeRecord {
    pub fn new(
        id: Option<&str>,
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.map(str::to_string),
            source: Some(source.into()),
            target: Some(target.into()),
            label: label.into(),
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// One item pulled from an adapter
#[derive(Debug, Clone, PartialEq)]
pub enum InputRecord {
    Node(NodeRecord),
    Edge(EdgeRecord),
}

impl InputRecord {
    pub fn label(&self) -> &str {
        match self {
            Self::Node(n) => &n.label,
            Self::Edge(e) => &e.label,
        }
    }
}

impl From<NodeRecord> for InputRecord {
    fn from(n: NodeRecord) -> Self {
        Self::Node(n)
    }
}

impl From<EdgeRecord> for InputRecord {
    fn from(e: EdgeRecord) -> Self {
        Self::Edge(e)
    }
}

// ============================================================================
// Translated records
// ============================================================================

/// Canonical node ready for export
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    /// Canonical sentence-case class name (raw label for pass-through records)
    pub label: String,
    /// Identifier namespace, `id` when the schema declares none
    pub preferred_id: String,
    pub properties: Properties,
    /// The label followed by its ontology ancestors up to the root
    pub lineage: Arc<[String]>,
}

/// Canonical edge ready for export
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    /// Identifier rendered in the id column, if any
    pub id: Option<String>,
    /// Deduplication key, set even when `id` is withheld from output
    pub key: String,
    pub source: String,
    pub target: String,
    pub label: String,
    pub properties: Properties,
}

impl GraphEdge {
    /// Edge keyed by its id, or by `source_target` when absent
    pub fn new(
        id: Option<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        let (source, target) = (source.into(), target.into());
        Self {
            key: id.clone().unwrap_or_else(|| synthesize_id(&source, &target)),
            id,
            source,
            target,
            label: label.into(),
            properties: Properties::new(),
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Key used for deduplication
    pub fn dedup_id(&self) -> &str {
        &self.key
    }
}

/// Deterministic identifier for records without one. Source precedes target.
pub fn synthesize_id(source: &str, target: &str) -> String {
    format!("{source}_{target}")
}

/// Output of translating one input record
#[derive(Debug, Clone, PartialEq)]
pub enum GraphRecord {
    Node(GraphNode),
    Edge(GraphEdge),
    /// Relationship reified as a node with two linking edges
    Association {
        node: GraphNode,
        source_edge: GraphEdge,
        target_edge: GraphEdge,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_type_parsing() {
        assert_eq!("string".parse::<PropertyType>().unwrap(), PropertyType::Str);
        assert_eq!("long".parse::<PropertyType>().unwrap(), PropertyType::Int);
        assert_eq!("float[]".parse::<PropertyType>().unwrap(), PropertyType::FloatList);
        assert!("decimal".parse::<PropertyType>().is_err());
    }

    #[test]
    fn test_accepts() {
        assert!(PropertyType::Float.accepts(&PropertyValue::Int(3)));
        assert!(!PropertyType::Int.accepts(&PropertyValue::Float(3.5)));
        assert!(PropertyType::Bool.accepts(&PropertyValue::Null));
        assert!(PropertyType::StrList.accepts(&PropertyValue::List(vec!["a".into(), "b".into()])));
        assert!(!PropertyType::StrList.accepts(&PropertyValue::Str("a".into())));
    }

    #[test]
    fn test_infer_list_type() {
        let v = PropertyValue::List(vec![PropertyValue::Null, PropertyValue::Int(1)]);
        assert_eq!(PropertyType::infer(&v), Some(PropertyType::IntList));
        assert_eq!(PropertyType::infer(&PropertyValue::List(vec![])), None);
    }

    #[test]
    fn test_untagged_json_values() {
        let props: Properties =
            serde_json::from_str(r#"{"a": null, "b": true, "c": 2, "d": 1.5, "e": "x", "f": ["y"]}"#)
                .unwrap();
        assert_eq!(props["a"], PropertyValue::Null);
        assert_eq!(props["b"], PropertyValue::Bool(true));
        assert_eq!(props["c"], PropertyValue::Int(2));
        assert_eq!(props["d"], PropertyValue::Float(1.5));
        assert_eq!(props["e"], PropertyValue::Str("x".into()));
        assert_eq!(props.keys().collect::<Vec<_>>(), ["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn test_edge_dedup_id() {
        let edge = GraphEdge::new(None, "A", "B", "binding");
        assert_eq!(edge.dedup_id(), "A_B");

        let withheld = GraphEdge {
            id: None,
            ..GraphEdge::new(Some("r1".into()), "A", "B", "binding")
        };
        assert_eq!(withheld.dedup_id(), "r1");
    }
}
