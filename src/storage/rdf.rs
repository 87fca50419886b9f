//! RDF and OWL documents
//!
//! Triples are streamed into a single `graph.<ext>` document. Node ids become
//! resource IRIs: ids with a known CURIE prefix are expanded, absolute
//! `http(s)` ids are kept, everything else is minted under the default
//! namespace. Classes and predicates live in the class namespace.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use oxrdf::vocab::{rdf, rdfs};
use oxrdf::{Literal, NamedNode, NamedNodeRef, TermRef, TripleRef};
use oxrdfxml::{RdfXmlSerializer, WriterRdfXmlSerializer};
use oxttl::turtle::WriterTurtleSerializer;
use oxttl::TurtleSerializer;
use tracing::{debug, info};
use url::form_urlencoded;

use super::error::{WriterError, WriterResult};
use super::{BatchWriter, ExportSummary};
use crate::config::{Dbms, RdfSettings, WriterSettings};
use crate::models::{GraphEdge, GraphNode, Properties, PropertyValue};
use crate::ontology::casing::{sentence_to_pascal, sentence_to_snake};
use crate::schema::RecordKind;

const OWL_CLASS: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#Class");
const OWL_OBJECT_PROPERTY: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#ObjectProperty");
const OWL_NAMED_INDIVIDUAL: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#NamedIndividual");
const RDF_STATEMENT: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#Statement");
const RDF_SUBJECT: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#subject");
const RDF_PREDICATE: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#predicate");
const RDF_OBJECT: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#object");

/// Prefixes expanded without configuration
const DEFAULT_PREFIXES: &[(&str, &str)] = &[
    ("biolink", "https://w3id.org/biolink/vocab/"),
    ("uniprot", "http://purl.uniprot.org/uniprot/"),
    ("uniprotkb", "http://purl.uniprot.org/uniprot/"),
    ("ncbigene", "https://identifiers.org/ncbigene:"),
    ("hgnc", "https://identifiers.org/hgnc:"),
    ("ensembl", "https://identifiers.org/ensembl:"),
    ("go", "http://purl.obolibrary.org/obo/GO_"),
    ("chebi", "http://purl.obolibrary.org/obo/CHEBI_"),
    ("mondo", "http://purl.obolibrary.org/obo/MONDO_"),
    ("hp", "http://purl.obolibrary.org/obo/HP_"),
    ("so", "http://purl.obolibrary.org/obo/SO_"),
    ("uberon", "http://purl.obolibrary.org/obo/UBERON_"),
    ("reactome", "https://identifiers.org/reactome:"),
];

// ============================================================================
// Formats
// ============================================================================

/// RDF serialization of the output document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    Turtle,
    NTriples,
    RdfXml,
}

impl RdfFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Turtle => "ttl",
            Self::NTriples => "nt",
            Self::RdfXml => "xml",
        }
    }
}

impl FromStr for RdfFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "turtle" | "ttl" => Ok(Self::Turtle),
            "ntriples" | "n-triples" | "nt" => Ok(Self::NTriples),
            "xml" | "rdfxml" | "rdf/xml" | "pretty-xml" => Ok(Self::RdfXml),
            other => Err(format!("unsupported rdf_format '{other}'")),
        }
    }
}

impl fmt::Display for RdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Turtle => "turtle",
            Self::NTriples => "ntriples",
            Self::RdfXml => "xml",
        })
    }
}

enum Sink {
    Turtle(WriterTurtleSerializer<BufWriter<File>>),
    NTriples(BufWriter<File>),
    RdfXml(WriterRdfXmlSerializer<BufWriter<File>>),
}

impl Sink {
    fn emit(&mut self, triple: TripleRef<'_>) -> io::Result<()> {
        match self {
            Self::Turtle(serializer) => serializer.serialize_triple(triple),
            Self::NTriples(out) => writeln!(out, "{triple} ."),
            Self::RdfXml(serializer) => serializer.serialize_triple(triple),
        }
    }

    fn finish(self) -> io::Result<()> {
        let mut out = match self {
            Self::Turtle(serializer) => serializer.finish()?,
            Self::NTriples(out) => out,
            Self::RdfXml(serializer) => serializer.finish()?,
        };
        out.flush()
    }
}

// ============================================================================
// Identifiers
// ============================================================================

/// Mints IRIs for resources, classes and predicates
#[derive(Debug, Clone)]
pub struct IriMinter {
    default_namespace: String,
    class_namespace: String,
    prefixes: IndexMap<String, String>,
}

impl IriMinter {
    pub fn new(settings: &RdfSettings) -> Self {
        let mut prefixes: IndexMap<String, String> = DEFAULT_PREFIXES
            .iter()
            .map(|(p, ns)| (p.to_string(), ns.to_string()))
            .collect();
        for (prefix, namespace) in &settings.namespaces {
            prefixes.insert(prefix.to_lowercase(), namespace.clone());
        }
        Self {
            default_namespace: settings.default_namespace.clone(),
            class_namespace: settings.class_namespace.clone(),
            prefixes,
        }
    }

    pub fn prefixes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, ns)| (p.as_str(), ns.as_str()))
    }

    /// IRI of a node or statement id
    pub fn resource(&self, id: &str) -> WriterResult<NamedNode> {
        if id.starts_with("http://") || id.starts_with("https://") {
            return named(id.to_string());
        }
        if let Some((prefix, local)) = id.split_once(':') {
            if let Some(namespace) = self.prefixes.get(&prefix.to_lowercase()) {
                let local: String = form_urlencoded::byte_serialize(local.as_bytes()).collect();
                return named(format!("{namespace}{local}"));
            }
        }
        let local: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
        named(format!("{}{local}", self.default_namespace))
    }

    /// `gene or gene product` -> `<class ns>GeneOrGeneProduct`
    pub fn class(&self, name: &str) -> WriterResult<NamedNode> {
        named(format!("{}{}", self.class_namespace, sentence_to_pascal(name)))
    }

    /// `protein protein interaction` -> `<class ns>protein_protein_interaction`
    pub fn predicate(&self, name: &str) -> WriterResult<NamedNode> {
        named(format!("{}{}", self.class_namespace, sentence_to_snake(name)))
    }
}

fn named(iri: String) -> WriterResult<NamedNode> {
    NamedNode::new(iri.as_str()).map_err(|e| WriterError::Rdf(format!("invalid IRI <{iri}>: {e}")))
}

fn literals(value: &PropertyValue) -> Vec<Literal> {
    match value {
        PropertyValue::Null => Vec::new(),
        PropertyValue::Bool(b) => vec![Literal::from(*b)],
        PropertyValue::Int(i) => vec![Literal::from(*i)],
        PropertyValue::Float(f) => vec![Literal::from(*f)],
        PropertyValue::Str(s) => vec![Literal::new_simple_literal(s.as_str())],
        PropertyValue::List(items) => items.iter().flat_map(literals).collect(),
    }
}

// ============================================================================
// Writer
// ============================================================================

/// Streaming RDF/OWL batch writer
pub(crate) struct RdfWriter {
    dbms: Dbms,
    owl: bool,
    path: PathBuf,
    output_dir: PathBuf,
    minter: IriMinter,
    sink: Sink,
    /// Lineage of every node label seen
    node_classes: IndexMap<String, Arc<[String]>>,
    edge_predicates: BTreeSet<String>,
    rows: IndexMap<(RecordKind, String), u64>,
}

impl RdfWriter {
    pub fn new(settings: &WriterSettings) -> WriterResult<Self> {
        let format = RdfFormat::from_str(&settings.rdf.rdf_format).map_err(WriterError::Rdf)?;
        let minter = IriMinter::new(&settings.rdf);
        let path = settings
            .output_dir
            .join(format!("graph.{}", format.extension()));
        let file = File::create(&path).map_err(|e| WriterError::io("create", &path, e))?;
        let out = BufWriter::new(file);

        let sink = match format {
            RdfFormat::Turtle => {
                let mut serializer = TurtleSerializer::new();
                for (prefix, namespace) in minter.prefixes() {
                    serializer = serializer
                        .with_prefix(prefix, namespace)
                        .map_err(|e| WriterError::Rdf(e.to_string()))?;
                }
                Sink::Turtle(serializer.for_writer(out))
            }
            RdfFormat::NTriples => Sink::NTriples(out),
            RdfFormat::RdfXml => Sink::RdfXml(RdfXmlSerializer::new().for_writer(out)),
        };

        debug!(path = %path.display(), %format, "Opened RDF document");
        Ok(Self {
            dbms: settings.dbms,
            owl: settings.dbms == Dbms::Owl,
            path,
            output_dir: settings.output_dir.clone(),
            minter,
            sink,
            node_classes: IndexMap::new(),
            edge_predicates: BTreeSet::new(),
            rows: IndexMap::new(),
        })
    }

    fn emit<'a>(
        &mut self,
        subject: NamedNodeRef<'a>,
        predicate: NamedNodeRef<'a>,
        object: impl Into<TermRef<'a>>,
    ) -> WriterResult<()> {
        self.sink
            .emit(TripleRef::new(subject, predicate, object))
            .map_err(|e| WriterError::io("write", &self.path, e))
    }

    fn emit_properties(&mut self, subject: &NamedNode, properties: &Properties) -> WriterResult<()> {
        for (key, value) in properties {
            let predicate = self.minter.predicate(key)?;
            for literal in literals(value) {
                self.emit(subject.as_ref(), predicate.as_ref(), literal.as_ref())?;
            }
        }
        Ok(())
    }

    fn emit_hierarchy(&mut self) -> WriterResult<()> {
        let mut declared = HashSet::new();
        let lineages: Vec<Arc<[String]>> = self.node_classes.values().cloned().collect();

        for lineage in &lineages {
            for (i, name) in lineage.iter().enumerate() {
                if !declared.insert(name.clone()) {
                    continue;
                }
                let class = self.minter.class(name)?;
                if self.owl {
                    self.emit(class.as_ref(), rdf::TYPE, OWL_CLASS)?;
                }
                self.emit(
                    class.as_ref(),
                    rdfs::LABEL,
                    Literal::new_simple_literal(name.as_str()).as_ref(),
                )?;
                if let Some(parent) = lineage.get(i + 1) {
                    let parent = self.minter.class(parent)?;
                    self.emit(class.as_ref(), rdfs::SUB_CLASS_OF, parent.as_ref())?;
                }
            }
        }

        if self.owl {
            let predicates: Vec<String> = self.edge_predicates.iter().cloned().collect();
            for label in &predicates {
                let predicate = self.minter.predicate(label)?;
                self.emit(predicate.as_ref(), rdf::TYPE, OWL_OBJECT_PROPERTY)?;
                self.emit(
                    predicate.as_ref(),
                    rdfs::LABEL,
                    Literal::new_simple_literal(label.as_str()).as_ref(),
                )?;
            }
        }
        Ok(())
    }
}

impl BatchWriter for RdfWriter {
    fn write_node(&mut self, node: &GraphNode) -> WriterResult<bool> {
        let subject = self.minter.resource(&node.id)?;
        let class = self.minter.class(&node.label)?;

        self.emit(subject.as_ref(), rdf::TYPE, class.as_ref())?;
        if self.owl {
            self.emit(subject.as_ref(), rdf::TYPE, OWL_NAMED_INDIVIDUAL)?;
        }
        self.emit_properties(&subject, &node.properties)?;

        self.node_classes
            .entry(node.label.clone())
            .or_insert_with(|| Arc::clone(&node.lineage));
        *self.rows.entry((RecordKind::Node, node.label.clone())).or_default() += 1;
        Ok(true)
    }

    fn write_edge(&mut self, edge: &GraphEdge) -> WriterResult<bool> {
        let source = self.minter.resource(&edge.source)?;
        let target = self.minter.resource(&edge.target)?;
        let predicate = self.minter.predicate(&edge.label)?;

        self.emit(source.as_ref(), predicate.as_ref(), target.as_ref())?;

        if edge.id.is_some() || !edge.properties.is_empty() {
            let statement = self.minter.resource(edge.dedup_id())?;
            self.emit(statement.as_ref(), rdf::TYPE, RDF_STATEMENT)?;
            self.emit(statement.as_ref(), RDF_SUBJECT, source.as_ref())?;
            self.emit(statement.as_ref(), RDF_PREDICATE, predicate.as_ref())?;
            self.emit(statement.as_ref(), RDF_OBJECT, target.as_ref())?;
            self.emit_properties(&statement, &edge.properties)?;
        }

        self.edge_predicates.insert(edge.label.clone());
        *self.rows.entry((RecordKind::Edge, edge.label.clone())).or_default() += 1;
        Ok(true)
    }

    fn finish(mut self: Box<Self>) -> WriterResult<ExportSummary> {
        self.emit_hierarchy()?;

        let RdfWriter {
            dbms,
            path,
            output_dir,
            sink,
            rows,
            ..
        } = *self;
        sink.finish()
            .map_err(|e| WriterError::io("finish", &path, e))?;

        let mut summary = ExportSummary::new(dbms, &output_dir);
        for ((kind, label), count) in rows {
            summary.record_label(kind, &label, count, 1);
        }
        summary.files.push(path.clone());
        info!(path = %path.display(), labels = summary.labels.len(), "Finished RDF document");
        Ok(summary)
    }
}
