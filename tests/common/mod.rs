//! Common test utilities

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use ontoweave::config::Config;
use tempfile::TempDir;

/// Small Biolink-shaped head ontology
pub const HEAD_ONTOLOGY: &str = r#"
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix biolink: <https://w3id.org/biolink/vocab/> .

biolink:Entity a owl:Class ; rdfs:label "entity" .
biolink:NamedThing rdfs:subClassOf biolink:Entity ; rdfs:label "named thing" .
biolink:BiologicalEntity rdfs:subClassOf biolink:NamedThing ; rdfs:label "biological entity" .
biolink:Polypeptide rdfs:subClassOf biolink:BiologicalEntity ; rdfs:label "polypeptide" .
biolink:Protein rdfs:subClassOf biolink:Polypeptide ; rdfs:label "protein" .
biolink:Gene rdfs:subClassOf biolink:BiologicalEntity ; rdfs:label "gene" .
biolink:SequenceVariant rdfs:subClassOf biolink:BiologicalEntity ; rdfs:label "sequence variant" .
biolink:Association rdfs:subClassOf biolink:Entity ; rdfs:label "association" .
"#;

/// Sequence ontology fragment joined below `sequence variant`
pub const TAIL_ONTOLOGY: &str = r#"
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix obo: <http://purl.obolibrary.org/obo/> .

obo:SO_0001059 rdfs:label "sequence_alteration" .
obo:SO_0001483 rdfs:subClassOf obo:SO_0001059 ; rdfs:label "SNV" .
obo:SO_0000159 rdfs:subClassOf obo:SO_0001059 ; rdfs:label "deletion" .
"#;

pub const SCHEMA: &str = r#"
protein:
  represented_as: node
  input_label: uniprot_protein
  preferred_id: uniprot
  properties:
    name: str
    score: float
gene:
  represented_as: node
  input_label: hgnc_gene
  preferred_id: hgnc
  properties:
    symbol: str
    synonyms: str[]
protein protein interaction:
  is_a: association
  represented_as: edge
  input_label: ppi
  source: protein
  target: protein
  properties:
    method: str
binding:
  is_a: protein protein interaction
  represented_as: edge
  input_label: binding
  inherit_properties: true
gene expression association:
  is_a: association
  represented_as: node
  input_label: expression
"#;

/// A temporary directory holding ontology, schema and config files
pub struct Fixture {
    pub dir: TempDir,
    pub config_path: PathBuf,
    pub schema_path: PathBuf,
    pub output_dir: PathBuf,
}

impl Fixture {
    /// Fixture for `dbms` with extra YAML appended to the `ontoweave:` section
    pub fn new(dbms: &str, extra: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let head = write(dir.path(), "biolink.ttl", HEAD_ONTOLOGY);
        write(dir.path(), "so.ttl", TAIL_ONTOLOGY);
        let schema_path = write(dir.path(), "schema_config.yaml", SCHEMA);
        let output_dir = dir.path().join("out");

        let config = format!(
            "ontoweave:\n  dbms: {dbms}\n  output_directory: {out}\n  schema_config_path: {schema}\n  fetch_retries: 0\n  head_ontology:\n    url: {head}\n    root_node: entity\n{extra}",
            out = output_dir.display(),
            schema = schema_path.display(),
            head = head.display(),
        );
        let config_path = write(dir.path(), "ontoweave.yaml", &config);

        Self {
            dir,
            config_path,
            schema_path,
            output_dir,
        }
    }

    /// Append YAML lines to the config file
    pub fn append_config(&self, extra: &str) {
        let mut content = std::fs::read_to_string(&self.config_path).unwrap();
        content.push_str(extra);
        std::fs::write(&self.config_path, content).unwrap();
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn config(&self) -> Config {
        Config::from_file(&self.config_path).unwrap()
    }

    /// Contents of a generated file
    pub fn output(&self, name: &str) -> String {
        std::fs::read_to_string(self.output_dir.join(name))
            .unwrap_or_else(|e| panic!("missing output file {name}: {e}"))
    }

    pub fn output_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.output_dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

pub fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
