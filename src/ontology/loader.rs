//! Ontology fetching and parsing
//!
//! Ontologies are read from `http(s)://` URLs, `file://` URLs or plain paths,
//! parsed with oxttl (Turtle, N-Triples) or oxrdfxml (RDF/XML), and reduced to
//! the `rdfs:subClassOf` / `rdfs:label` facts needed to build an
//! [`OntologyTree`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use oxrdf::vocab::{rdf, rdfs};
use oxrdf::{Term, Triple};
use tracing::{debug, info, instrument};

use super::error::{OntologyError, OntologyResult};
use super::tree::OntologyTree;
use crate::config::{Config, HeadOntologyConfig, TailOntologyConfig};
use crate::utils::retry::{with_retry_if, RetryConfig};

const OWL_CLASS: &str = "http://www.w3.org/2002/07/owl#Class";

// ============================================================================
// Serialization formats
// ============================================================================

/// RDF syntax of an ontology document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OntologyFormat {
    Turtle,
    NTriples,
    RdfXml,
}

impl OntologyFormat {
    /// Pick the syntax from an explicit hint, else from the file extension.
    /// Unknown extensions are read as Turtle.
    pub fn detect(location: &str, hint: Option<&str>) -> OntologyResult<Self> {
        if let Some(hint) = hint {
            return hint.parse();
        }
        let path = location.split(['?', '#']).next().unwrap_or(location);
        let ext = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        Ok(match ext.as_str() {
            "nt" => Self::NTriples,
            "owl" | "rdf" | "xml" => Self::RdfXml,
            _ => Self::Turtle,
        })
    }
}

impl FromStr for OntologyFormat {
    type Err = OntologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "turtle" | "ttl" => Ok(Self::Turtle),
            "ntriples" | "n-triples" | "nt" => Ok(Self::NTriples),
            "xml" | "rdf" | "owl" | "rdfxml" | "rdf/xml" => Ok(Self::RdfXml),
            other => Err(OntologyError::UnsupportedFormat {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for OntologyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Turtle => "turtle",
            Self::NTriples => "ntriples",
            Self::RdfXml => "rdf/xml",
        })
    }
}

// ============================================================================
// Raw hierarchy
// ============================================================================

#[derive(Debug, Clone, Default)]
struct RawClass {
    label: Option<String>,
    /// Label is untagged or English
    label_preferred: bool,
    parents: BTreeSet<String>,
}

/// Class facts extracted from one document, keyed by IRI
#[derive(Debug, Clone, Default)]
pub struct RawHierarchy {
    classes: BTreeMap<String, RawClass>,
}

impl RawHierarchy {
    /// Parse a document and keep only class-related statements
    pub fn parse(
        bytes: &[u8],
        format: OntologyFormat,
        base_iri: Option<&str>,
        url: &str,
    ) -> OntologyResult<Self> {
        let mut hierarchy = Self::default();
        let bad = |e: &dyn fmt::Display| OntologyError::parse_failed(url, e.to_string());

        match format {
            OntologyFormat::Turtle => {
                let mut parser = oxttl::TurtleParser::new();
                if let Some(base) = base_iri {
                    parser = parser.with_base_iri(base).map_err(|e| bad(&e))?;
                }
                for triple in parser.for_reader(bytes) {
                    hierarchy.ingest(triple.map_err(|e| bad(&e))?);
                }
            }
            OntologyFormat::NTriples => {
                for triple in oxttl::NTriplesParser::new().for_reader(bytes) {
                    hierarchy.ingest(triple.map_err(|e| bad(&e))?);
                }
            }
            OntologyFormat::RdfXml => {
                let mut parser = oxrdfxml::RdfXmlParser::new();
                if let Some(base) = base_iri {
                    parser = parser.with_base_iri(base).map_err(|e| bad(&e))?;
                }
                for triple in parser.for_reader(bytes) {
                    hierarchy.ingest(triple.map_err(|e| bad(&e))?);
                }
            }
        }

        debug!(url, %format, classes = hierarchy.len(), "Parsed ontology document");
        Ok(hierarchy)
    }

    fn ingest(&mut self, triple: Triple) {
        let Term::NamedNode(subject) = Term::from(triple.subject) else {
            return;
        };
        let predicate = triple.predicate.as_ref();

        if predicate == rdfs::SUB_CLASS_OF {
            // blank-node parents are OWL restrictions
            if let Term::NamedNode(parent) = &triple.object {
                self.add_subclass(subject.as_str(), parent.as_str());
            }
        } else if predicate == rdfs::LABEL {
            if let Term::Literal(literal) = &triple.object {
                let preferred = literal
                    .language()
                    .map_or(true, |lang| lang.eq_ignore_ascii_case("en") || lang.starts_with("en-"));
                self.set_label(subject.as_str(), literal.value(), preferred);
            }
        } else if predicate == rdf::TYPE {
            if matches!(&triple.object, Term::NamedNode(o) if o.as_str() == OWL_CLASS) {
                self.declare(subject.as_str());
            }
        }
    }

    /// Record `child rdfs:subClassOf parent`
    pub fn add_subclass(&mut self, child: &str, parent: &str) {
        if child == parent {
            return;
        }
        self.declare(parent);
        self.classes
            .entry(child.to_string())
            .or_default()
            .parents
            .insert(parent.to_string());
    }

    /// Record a label; preferred labels replace non-preferred ones, the first
    /// label of equal preference wins
    pub fn set_label(&mut self, iri: &str, label: &str, preferred: bool) {
        let class = self.classes.entry(iri.to_string()).or_default();
        if class.label.is_none() || (preferred && !class.label_preferred) {
            class.label = Some(label.to_string());
            class.label_preferred = preferred;
        }
    }

    pub fn declare(&mut self, iri: &str) {
        self.classes.entry(iri.to_string()).or_default();
    }

    /// `(iri, label)` pairs in IRI order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.classes
            .iter()
            .map(|(iri, class)| (iri.as_str(), class.label.as_deref()))
    }

    pub fn parents<'a>(&'a self, iri: &str) -> impl Iterator<Item = &'a str> {
        self.classes
            .get(iri)
            .into_iter()
            .flat_map(|class| class.parents.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Last path segment or fragment of an IRI
pub fn local_name(iri: &str) -> &str {
    match iri.rsplit(['#', '/']).next() {
        Some(name) if !name.is_empty() => name,
        _ => iri,
    }
}

// ============================================================================
// Fetching
// ============================================================================

/// Read an ontology document from a URL or path
pub async fn fetch(location: &str, timeout: Duration, retry: &RetryConfig) -> OntologyResult<Vec<u8>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OntologyError::fetch_failed(location, e.to_string()))?;
        return with_retry_if(
            retry,
            || fetch_http(&client, location, timeout),
            OntologyError::is_recoverable,
        )
        .await;
    }

    let path = if location.starts_with("file://") {
        url::Url::parse(location)
            .ok()
            .and_then(|u| u.to_file_path().ok())
            .ok_or_else(|| OntologyError::fetch_failed(location, "invalid file URL"))?
    } else {
        PathBuf::from(location)
    };

    tokio::fs::read(&path)
        .await
        .map_err(|e| OntologyError::io_error("reading ontology", Some(path), e))
}

async fn fetch_http(client: &reqwest::Client, url: &str, timeout: Duration) -> OntologyResult<Vec<u8>> {
    let map_err = |e: reqwest::Error| {
        if e.is_timeout() {
            OntologyError::FetchTimeout {
                url: url.to_string(),
                timeout_secs: timeout.as_secs(),
            }
        } else {
            OntologyError::fetch_failed(url, e.to_string())
        }
    };

    let response = client
        .get(url)
        .send()
        .await
        .map_err(map_err)?
        .error_for_status()
        .map_err(map_err)?;
    let bytes = response.bytes().await.map_err(map_err)?;

    debug!(url, bytes = bytes.len(), "Downloaded ontology");
    Ok(bytes.to_vec())
}

// ============================================================================
// Loader
// ============================================================================

/// Builds the class tree from a head ontology and optional tail ontologies
#[derive(Debug, Clone)]
pub struct OntologyLoader {
    head: HeadOntologyConfig,
    tails: Vec<TailOntologyConfig>,
    timeout: Duration,
    retry: RetryConfig,
}

impl OntologyLoader {
    pub fn new(head: HeadOntologyConfig) -> Self {
        Self {
            head,
            tails: Vec::new(),
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let settings = &config.ontoweave;
        Self::new(settings.head_ontology.clone())
            .with_tails(settings.tail_ontologies.clone())
            .with_timeout(config.fetch_timeout())
            .with_retry(RetryConfig::new(settings.fetch_retries))
    }

    pub fn with_tails(mut self, tails: Vec<TailOntologyConfig>) -> Self {
        self.tails = tails;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch and assemble the full tree
    #[instrument(skip(self), fields(head = %self.head.url, tails = self.tails.len()))]
    pub async fn load(&self) -> OntologyResult<OntologyTree> {
        let mut tree = self
            .load_one(
                &self.head.url,
                self.head.format.as_deref(),
                &self.head.root_node,
                self.head.switch_label_and_id,
            )
            .await?;

        for tail in &self.tails {
            let tail_tree = self
                .load_one(
                    &tail.url,
                    tail.format.as_deref(),
                    &tail.tail_join_node,
                    tail.switch_label_and_id,
                )
                .await
                .map_err(|e| match e {
                    OntologyError::RootNotFound { url, root } => {
                        OntologyError::join_node_not_found("tail", root, url)
                    }
                    other => other,
                })?;
            tree.splice(&tail.head_join_node, tail_tree, tail.merge_nodes)?;
        }

        info!(classes = tree.len(), root = %tree.root().name(), "Ontology loaded");
        Ok(tree)
    }

    async fn load_one(
        &self,
        url: &str,
        format: Option<&str>,
        root: &str,
        switch_label_and_id: bool,
    ) -> OntologyResult<OntologyTree> {
        let format = OntologyFormat::detect(url, format)?;
        let bytes = fetch(url, self.timeout, &self.retry).await?;
        let base = url.starts_with("http").then_some(url);
        let hierarchy = RawHierarchy::parse(&bytes, format, base, url)?;
        OntologyTree::from_hierarchy(&hierarchy, root, switch_label_and_id, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: &str = r#"
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix ex: <http://example.org/> .

ex:Thing a owl:Class ; rdfs:label "thing" .
ex:Animal rdfs:subClassOf ex:Thing ; rdfs:label "Tier"@de, "animal"@en .
ex:Dog rdfs:subClassOf ex:Animal, [ a owl:Restriction ] .
"#;

    #[test]
    fn test_format_detection() {
        assert_eq!(OntologyFormat::detect("a/b.ttl", None).unwrap(), OntologyFormat::Turtle);
        assert_eq!(OntologyFormat::detect("x.owl?raw=1", None).unwrap(), OntologyFormat::RdfXml);
        assert_eq!(OntologyFormat::detect("x.nt", None).unwrap(), OntologyFormat::NTriples);
        assert_eq!(OntologyFormat::detect("x.owl", Some("ttl")).unwrap(), OntologyFormat::Turtle);
        assert!(OntologyFormat::detect("x", Some("json")).is_err());
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("http://example.org/vocab#Gene"), "Gene");
        assert_eq!(local_name("https://w3id.org/biolink/vocab/NamedThing"), "NamedThing");
        assert_eq!(local_name("urn:x"), "urn:x");
    }

    #[test]
    fn test_parse_turtle() {
        let h = RawHierarchy::parse(TTL.as_bytes(), OntologyFormat::Turtle, None, "t").unwrap();
        let labels: BTreeMap<_, _> = h.iter().collect();
        assert_eq!(labels["http://example.org/Thing"], Some("thing"));
        assert_eq!(labels["http://example.org/Animal"], Some("animal"));
        assert_eq!(labels["http://example.org/Dog"], None);
        // restriction parent dropped
        assert_eq!(h.parents("http://example.org/Dog").collect::<Vec<_>>(), ["http://example.org/Animal"]);
    }

    #[test]
    fn test_parse_ntriples() {
        let nt = "<http://e/B> <http://www.w3.org/2000/01/rdf-schema#subClassOf> <http://e/A> .\n";
        let h = RawHierarchy::parse(nt.as_bytes(), OntologyFormat::NTriples, None, "t").unwrap();
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_parse_rdf_xml() {
        let xml = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:rdfs="http://www.w3.org/2000/01/rdf-schema#">
  <rdf:Description rdf:about="http://e/B">
    <rdfs:subClassOf rdf:resource="http://e/A"/>
    <rdfs:label>bee</rdfs:label>
  </rdf:Description>
</rdf:RDF>"#;
        let h = RawHierarchy::parse(xml.as_bytes(), OntologyFormat::RdfXml, None, "t").unwrap();
        let labels: BTreeMap<_, _> = h.iter().collect();
        assert_eq!(labels["http://e/B"], Some("bee"));
        assert_eq!(h.parents("http://e/B").collect::<Vec<_>>(), ["http://e/A"]);
    }

    #[test]
    fn test_parse_error() {
        let err = RawHierarchy::parse(b"ex:broken", OntologyFormat::Turtle, None, "bad.ttl").unwrap_err();
        assert!(matches!(err, OntologyError::ParseFailed { .. }));
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn test_load_from_file_with_tail() {
        let dir = tempfile::tempdir().unwrap();
        let head = dir.path().join("head.ttl");
        std::fs::write(&head, TTL).unwrap();
        let tail = dir.path().join("tail.ttl");
        std::fs::write(
            &tail,
            "<http://t/Puppy> <http://www.w3.org/2000/01/rdf-schema#subClassOf> <http://t/Young> .\n",
        )
        .unwrap();

        let loader = OntologyLoader::new(HeadOntologyConfig {
            url: head.to_string_lossy().into_owned(),
            root_node: "thing".to_string(),
            format: None,
            switch_label_and_id: true,
        })
        .with_tails(vec![TailOntologyConfig {
            name: Some("tail".to_string()),
            url: format!("file://{}", tail.display()),
            head_join_node: "dog".to_string(),
            tail_join_node: "Young".to_string(),
            format: Some("ntriples".to_string()),
            switch_label_and_id: true,
            merge_nodes: false,
        }]);

        let tree = loader.load().await.unwrap();
        assert_eq!(
            tree.ancestors("puppy").unwrap(),
            vec!["puppy", "young", "dog", "animal", "thing"]
        );
    }

    #[tokio::test]
    async fn test_missing_tail_join_node() {
        let dir = tempfile::tempdir().unwrap();
        let head = dir.path().join("head.ttl");
        std::fs::write(&head, TTL).unwrap();

        let loader = OntologyLoader::new(HeadOntologyConfig {
            url: head.to_string_lossy().into_owned(),
            root_node: "thing".to_string(),
            format: None,
            switch_label_and_id: true,
        })
        .with_tails(vec![TailOntologyConfig {
            name: None,
            url: head.to_string_lossy().into_owned(),
            head_join_node: "dog".to_string(),
            tail_join_node: "plant".to_string(),
            format: None,
            switch_label_and_id: true,
            merge_nodes: false,
        }]);

        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, OntologyError::JoinNodeNotFound { side: "tail", .. }));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = fetch("/nonexistent/ontology.ttl", Duration::from_secs(1), &RetryConfig::new(0))
            .await
            .unwrap_err();
        assert!(matches!(err, OntologyError::IoError { .. }));
    }
}
