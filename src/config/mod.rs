//! Configuration management for ontoweave
//!
//! This module handles loading and validating the run configuration from a YAML
//! file and environment variables, and resolves the per-backend writer settings.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default Biolink release used when no head ontology is configured
pub const DEFAULT_HEAD_ONTOLOGY: &str =
    "https://github.com/biolink/biolink-model/raw/v3.2.1/biolink-model.owl.ttl";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Run-level settings
    pub ontoweave: RunSettings,

    /// Neo4j admin-import settings
    pub neo4j: BackendSection,

    /// PostgreSQL COPY settings
    pub postgresql: BackendSection,

    /// SQLite import settings
    pub sqlite: BackendSection,

    /// Plain CSV / pandas settings
    pub csv: BackendSection,

    /// RDF and OWL settings
    pub rdf: RdfSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// How per-record problems are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Ignore problems and pass data through
    None,
    /// Log, drop the offending record and continue
    #[default]
    Warn,
    /// Abort the run on the first problem
    Strict,
}

impl FromStr for ValidationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "warn" | "warning" => Ok(Self::Warn),
            "strict" => Ok(Self::Strict),
            other => anyhow::bail!("unknown validation mode '{other}'"),
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Warn => "warn",
            Self::Strict => "strict",
        })
    }
}

/// Output backend family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dbms {
    #[default]
    Neo4j,
    #[serde(alias = "postgres")]
    Postgresql,
    Sqlite,
    Rdf,
    Owl,
    Csv,
    Pandas,
    Networkx,
}

impl Dbms {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neo4j => "neo4j",
            Self::Postgresql => "postgresql",
            Self::Sqlite => "sqlite",
            Self::Rdf => "rdf",
            Self::Owl => "owl",
            Self::Csv => "csv",
            Self::Pandas => "pandas",
            Self::Networkx => "networkx",
        }
    }
}

impl FromStr for Dbms {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "neo4j" => Ok(Self::Neo4j),
            "postgresql" | "postgres" => Ok(Self::Postgresql),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "rdf" => Ok(Self::Rdf),
            "owl" => Ok(Self::Owl),
            "csv" => Ok(Self::Csv),
            "pandas" => Ok(Self::Pandas),
            "networkx" => Ok(Self::Networkx),
            other => anyhow::bail!("unsupported dbms '{other}'"),
        }
    }
}

impl fmt::Display for Dbms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run-level settings (the `ontoweave:` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Output backend
    pub dbms: Dbms,

    /// Only offline (file-based) export is supported
    pub offline: bool,

    /// Per-record validation policy
    pub validation_mode: ValidationMode,

    /// Legacy switch; `true` forces strict validation
    pub strict_mode: Option<bool>,

    /// Suppress repeated (label, id) pairs
    pub deduplicate: bool,

    /// Directory receiving all generated files
    pub output_directory: PathBuf,

    /// Schema mapping YAML
    pub schema_config_path: PathBuf,

    /// Timeout for each ontology download in seconds
    pub fetch_timeout_secs: u64,

    /// Retries after a failed ontology download
    pub fetch_retries: u32,

    /// Primary ontology
    pub head_ontology: HeadOntologyConfig,

    /// Ontologies spliced into the head ontology
    pub tail_ontologies: Vec<TailOntologyConfig>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            dbms: Dbms::Neo4j,
            offline: true,
            validation_mode: ValidationMode::Warn,
            strict_mode: None,
            deduplicate: true,
            output_directory: PathBuf::from("ontoweave-out"),
            schema_config_path: PathBuf::from("config/schema_config.yaml"),
            fetch_timeout_secs: 30,
            fetch_retries: 2,
            head_ontology: HeadOntologyConfig::default(),
            tail_ontologies: Vec::new(),
        }
    }
}

/// Head ontology source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadOntologyConfig {
    /// URL, `file://` URL or local path
    pub url: String,

    /// Class at which the retained subtree begins
    pub root_node: String,

    /// Serialization override (`turtle`, `ntriples`, `xml`)
    pub format: Option<String>,

    /// Use `rdfs:label` as the class name (true) or the IRI local name (false)
    pub switch_label_and_id: bool,
}

impl Default for HeadOntologyConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_HEAD_ONTOLOGY.to_string(),
            root_node: "entity".to_string(),
            format: None,
            switch_label_and_id: true,
        }
    }
}

/// Tail ontology source and join points
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailOntologyConfig {
    /// Display name used in logs
    #[serde(default)]
    pub name: Option<String>,

    pub url: String,

    /// Existing class of the head ontology receiving the subtree
    pub head_join_node: String,

    /// Root of the retained tail subtree
    pub tail_join_node: String,

    #[serde(default)]
    pub format: Option<String>,

    #[serde(default = "default_true")]
    pub switch_label_and_id: bool,

    /// Identify the tail join node with the head join node instead of nesting it
    #[serde(default)]
    pub merge_nodes: bool,
}

fn default_true() -> bool {
    true
}

/// Backend section as written in the config file; unset fields take the
/// defaults of the selected backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    pub delimiter: Option<String>,
    pub array_delimiter: Option<String>,
    pub quote_character: Option<String>,
    pub batch_size: Option<usize>,
    pub database_name: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub import_call_bin_prefix: Option<String>,
    pub import_call_file_prefix: Option<String>,
    pub neo4j_version: Option<u8>,
}

/// RDF/OWL output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RdfSettings {
    /// `turtle`, `ntriples` or `xml`
    pub rdf_format: String,

    /// Namespace for identifiers without a recognized prefix
    pub default_namespace: String,

    /// Namespace for ontology classes
    pub class_namespace: String,

    /// Extra or overriding CURIE prefixes
    pub namespaces: IndexMap<String, String>,
}

impl Default for RdfSettings {
    fn default() -> Self {
        Self {
            rdf_format: "turtle".to_string(),
            default_namespace: "https://w3id.org/ontoweave/resource/".to_string(),
            class_namespace: "https://w3id.org/biolink/vocab/".to_string(),
            namespaces: IndexMap::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

/// Fully resolved writer settings for one backend
#[derive(Debug, Clone)]
pub struct WriterSettings {
    pub dbms: Dbms,
    pub output_dir: PathBuf,
    pub delimiter: char,
    pub array_delimiter: char,
    pub quote: char,
    pub batch_size: usize,
    pub database_name: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub bin_prefix: String,
    /// Replaces the output directory in import script paths (e.g. a container mount)
    pub file_prefix: Option<String>,
    pub neo4j_version: u8,
    pub validation_mode: ValidationMode,
    pub rdf: RdfSettings,
}

impl WriterSettings {
    /// Backend defaults rooted at `output_dir`
    pub fn new(dbms: Dbms, output_dir: impl Into<PathBuf>) -> Self {
        let (delimiter, array_delimiter, quote) = match dbms {
            Dbms::Neo4j => (';', '|', '\''),
            Dbms::Postgresql | Dbms::Sqlite => ('\t', ',', '"'),
            _ => (',', '|', '"'),
        };
        let (database_name, user, port) = match dbms {
            Dbms::Postgresql => ("postgres", "postgres", 5432),
            Dbms::Sqlite => ("sqlite.db", "", 0),
            _ => ("neo4j", "neo4j", 7687),
        };

        Self {
            dbms,
            output_dir: output_dir.into(),
            delimiter,
            array_delimiter,
            quote,
            batch_size: 1_000_000,
            database_name: database_name.to_string(),
            host: "localhost".to_string(),
            port,
            user: user.to_string(),
            bin_prefix: if dbms == Dbms::Neo4j {
                "bin/".to_string()
            } else {
                String::new()
            },
            file_prefix: None,
            neo4j_version: 5,
            validation_mode: ValidationMode::Warn,
            rdf: RdfSettings::default(),
        }
    }

    /// Set field delimiter
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set array delimiter
    pub fn with_array_delimiter(mut self, delimiter: char) -> Self {
        self.array_delimiter = delimiter;
        self
    }

    /// Set quote character
    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    /// Set rows per part file
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set validation mode
    pub fn with_validation_mode(mut self, mode: ValidationMode) -> Self {
        self.validation_mode = mode;
        self
    }

    /// Set RDF settings
    pub fn with_rdf(mut self, rdf: RdfSettings) -> Self {
        self.rdf = rdf;
        self
    }

    fn apply_section(mut self, section: &BackendSection) -> Result<Self> {
        if let Some(d) = &section.delimiter {
            self.delimiter = decode_delimiter(d).context("invalid delimiter")?;
        }
        if let Some(d) = &section.array_delimiter {
            self.array_delimiter = decode_delimiter(d).context("invalid array_delimiter")?;
        }
        if let Some(q) = &section.quote_character {
            self.quote = decode_delimiter(q).context("invalid quote_character")?;
        }
        if let Some(size) = section.batch_size {
            self.batch_size = size;
        }
        if let Some(name) = &section.database_name {
            self.database_name = name.clone();
        }
        if let Some(host) = &section.host {
            self.host = host.clone();
        }
        if let Some(port) = section.port {
            self.port = port;
        }
        if let Some(user) = &section.user {
            self.user = user.clone();
        }
        if let Some(prefix) = &section.import_call_bin_prefix {
            self.bin_prefix = prefix.clone();
        }
        if let Some(prefix) = &section.import_call_file_prefix {
            self.file_prefix = Some(prefix.clone());
        }
        if let Some(version) = section.neo4j_version {
            self.neo4j_version = version;
        }
        Ok(self)
    }
}

/// Decode a single-character delimiter, accepting `\t`-style escapes
pub fn decode_delimiter(raw: &str) -> Result<char> {
    let decoded = match raw {
        "\\t" => "\t",
        "\\n" => "\n",
        "\\\\" => "\\",
        other => other,
    };
    let mut chars = decoded.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => anyhow::bail!("delimiter must be a single character, got '{raw}'"),
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse YAML config file: {}", path.display()))
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Apply `ONTOWEAVE_*` environment overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(dbms) = std::env::var("ONTOWEAVE_DBMS") {
            self.ontoweave.dbms = dbms.parse()?;
        }
        if let Ok(dir) = std::env::var("ONTOWEAVE_OUTPUT_DIR") {
            self.ontoweave.output_directory = PathBuf::from(dir);
        }
        if let Ok(mode) = std::env::var("ONTOWEAVE_VALIDATION_MODE") {
            self.ontoweave.validation_mode = mode.parse()?;
            self.ontoweave.strict_mode = None;
        }
        if let Ok(level) = std::env::var("ONTOWEAVE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("ONTOWEAVE_LOG_FORMAT") {
            self.logging.format = format;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.ontoweave.offline {
            anyhow::bail!("online mode is not supported; set offline: true");
        }

        if self.ontoweave.head_ontology.url.trim().is_empty() {
            anyhow::bail!("head_ontology.url must not be empty");
        }

        if self.ontoweave.head_ontology.root_node.trim().is_empty() {
            anyhow::bail!("head_ontology.root_node must not be empty");
        }

        if self.ontoweave.fetch_timeout_secs == 0 {
            anyhow::bail!("fetch_timeout_secs must be greater than 0");
        }

        for tail in &self.ontoweave.tail_ontologies {
            if tail.head_join_node.trim().is_empty() || tail.tail_join_node.trim().is_empty() {
                anyhow::bail!("tail ontology '{}' needs both join nodes", tail.url);
            }
        }

        let writer = self.writer_settings()?;
        if writer.batch_size == 0 {
            anyhow::bail!("batch_size must be greater than 0");
        }
        if writer.delimiter == writer.array_delimiter {
            anyhow::bail!("delimiter and array_delimiter must differ");
        }
        if writer.delimiter == writer.quote {
            anyhow::bail!("delimiter and quote_character must differ");
        }
        if matches!(writer.dbms, Dbms::Rdf | Dbms::Owl) {
            self.rdf
                .rdf_format
                .parse::<crate::storage::rdf::RdfFormat>()
                .map_err(anyhow::Error::msg)?;
        }

        Ok(())
    }

    /// Effective validation mode, honouring the legacy `strict_mode` switch
    #[must_use]
    pub fn validation_mode(&self) -> ValidationMode {
        match self.ontoweave.strict_mode {
            Some(true) => ValidationMode::Strict,
            _ => self.ontoweave.validation_mode,
        }
    }

    /// Ontology download timeout as Duration
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.ontoweave.fetch_timeout_secs)
    }

    /// Resolve writer settings for the configured backend
    pub fn writer_settings(&self) -> Result<WriterSettings> {
        let dbms = self.ontoweave.dbms;
        let section = match dbms {
            Dbms::Neo4j => Some(&self.neo4j),
            Dbms::Postgresql => Some(&self.postgresql),
            Dbms::Sqlite => Some(&self.sqlite),
            Dbms::Csv | Dbms::Pandas => Some(&self.csv),
            Dbms::Rdf | Dbms::Owl | Dbms::Networkx => None,
        };

        let mut settings = WriterSettings::new(dbms, &self.ontoweave.output_directory)
            .with_validation_mode(self.validation_mode())
            .with_rdf(self.rdf.clone());
        if let Some(section) = section {
            settings = settings.apply_section(section)?;
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
ontoweave:
  dbms: neo4j
  validation_mode: strict
  output_directory: out
  head_ontology:
    url: test/ontology.ttl
    root_node: entity
  tail_ontologies:
    - url: test/so.owl
      head_join_node: sequence variant
      tail_join_node: sequence_variant
      switch_label_and_id: false
neo4j:
  delimiter: '\t'
  array_delimiter: '|'
  batch_size: 10
"#;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let config = Config::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.ontoweave.dbms, Dbms::Neo4j);
        assert_eq!(config.validation_mode(), ValidationMode::Strict);
        assert_eq!(config.ontoweave.tail_ontologies.len(), 1);
        assert!(!config.ontoweave.tail_ontologies[0].switch_label_and_id);
        assert!(!config.ontoweave.tail_ontologies[0].merge_nodes);

        let writer = config.writer_settings().unwrap();
        assert_eq!(writer.delimiter, '\t');
        assert_eq!(writer.quote, '\'');
        assert_eq!(writer.batch_size, 10);
        assert_eq!(writer.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_strict_mode_alias() {
        let config =
            Config::from_yaml_str("ontoweave:\n  validation_mode: none\n  strict_mode: true\n")
                .unwrap();
        assert_eq!(config.validation_mode(), ValidationMode::Strict);
    }

    #[test]
    fn test_online_mode_rejected() {
        let mut config = Config::default();
        config.ontoweave.offline = false;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_conflicting_delimiters_rejected() {
        let mut config = Config::default();
        config.neo4j.array_delimiter = Some(";".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_decode_delimiter() {
        assert_eq!(decode_delimiter("\\t").unwrap(), '\t');
        assert_eq!(decode_delimiter(";").unwrap(), ';');
        assert!(decode_delimiter(";;").is_err());
    }

    #[test]
    fn test_backend_defaults() {
        let pg = WriterSettings::new(Dbms::Postgresql, "out");
        assert_eq!(pg.delimiter, '\t');
        assert_eq!(pg.port, 5432);
        let csv = WriterSettings::new(Dbms::Csv, "out");
        assert_eq!(csv.delimiter, ',');
    }

    #[test]
    fn test_fetch_timeout_conversion() {
        let config = Config::default();
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
    }
}
