use anyhow::Result;
use std::path::PathBuf;

use ontoweave::pipeline::load_ontology;

use super::load_config;

/// Print the class hierarchy; schema classes and their ancestors unless `full`
pub async fn tree(config: PathBuf, schema: Option<PathBuf>, full: bool) -> Result<()> {
    let config = load_config(&config)?;
    config.validate()?;
    let ontology = load_ontology(&config, schema.as_deref()).await?;

    if full {
        print!("{}", ontology.render_tree());
    } else {
        print!("{}", ontology.render_schema_tree());
    }
    Ok(())
}

/// Print the ancestors of a class, nearest first
pub async fn ancestors(config: PathBuf, schema: Option<PathBuf>, class: String) -> Result<()> {
    let config = load_config(&config)?;
    config.validate()?;
    let ontology = load_ontology(&config, schema.as_deref()).await?;

    for (depth, name) in ontology.ancestors(&class)?.iter().enumerate() {
        println!("{}{name}", "  ".repeat(depth));
    }
    Ok(())
}
