use anyhow::{Context, Result};
use std::path::PathBuf;

use ontoweave::adapter::JsonLinesSource;
use ontoweave::pipeline::{load_ontology, ExportSession};
use ontoweave::schema::RecordKind;

use super::load_config;

/// Arguments of the `export` command
#[derive(Debug, Default)]
pub struct ExportParams {
    pub config: PathBuf,
    pub schema: Option<PathBuf>,
    pub nodes: Vec<PathBuf>,
    pub edges: Vec<PathBuf>,
    pub records: Vec<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub dbms: Option<String>,
}

pub async fn export(params: ExportParams) -> Result<()> {
    let mut config = load_config(&params.config)?;
    if let Some(dir) = params.output_dir {
        config.ontoweave.output_directory = dir;
    }
    if let Some(dbms) = &params.dbms {
        config.ontoweave.dbms = dbms.parse()?;
    }
    config.validate().context("Invalid configuration")?;

    let ontology = load_ontology(&config, params.schema.as_deref()).await?;
    let mut session = ExportSession::from_config(&ontology, &config)?;

    let inputs = params
        .nodes
        .iter()
        .map(|p| (p, Some(RecordKind::Node)))
        .chain(params.edges.iter().map(|p| (p, Some(RecordKind::Edge))))
        .chain(params.records.iter().map(|p| (p, None)));

    for (path, kind) in inputs {
        tracing::info!(path = %path.display(), kind = ?kind, "Reading input");
        let mut source = JsonLinesSource::open(path)?;
        if let Some(kind) = kind {
            source = source.with_kind(kind);
        }
        for record in source {
            session.write_record(record?)?;
        }
    }

    let report = session.finish()?;
    println!("{report}");
    Ok(())
}
