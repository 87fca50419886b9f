mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::ExportParams;

#[derive(Parser)]
#[command(
    name = "ontoweave",
    version,
    about = "Ontology-driven translation of biomedical data into knowledge graph import files",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to ONTOWEAVE_LOG_FORMAT or text
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate JSON Lines input and write batch import files
    Export {
        /// Run configuration (YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Schema mapping, overriding schema_config_path
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// JSON Lines file of node records
        #[arg(long)]
        nodes: Vec<PathBuf>,

        /// JSON Lines file of edge records
        #[arg(long)]
        edges: Vec<PathBuf>,

        /// JSON Lines file of mixed records
        #[arg(long)]
        input: Vec<PathBuf>,

        /// Output directory, overriding output_directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Backend, overriding dbms
        #[arg(long)]
        dbms: Option<String>,
    },

    /// Print the ontology hierarchy
    Tree {
        /// Run configuration (YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Schema mapping, overriding schema_config_path
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Print every class instead of the schema classes only
        #[arg(long, default_value = "false")]
        full: bool,
    },

    /// Print the ancestors of a class
    Ancestors {
        /// Run configuration (YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Schema mapping, overriding schema_config_path
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Class name
        class: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging
    let log_format = cli
        .log_format
        .clone()
        .or_else(|| std::env::var("ONTOWEAVE_LOG_FORMAT").ok())
        .unwrap_or_else(|| "text".to_string());
    setup_tracing(&log_format, cli.verbose)?;

    match cli.command {
        Commands::Export {
            config,
            schema,
            nodes,
            edges,
            input,
            output_dir,
            dbms,
        } => {
            tracing::info!(
                config = %config.display(),
                nodes = nodes.len(),
                edges = edges.len(),
                inputs = input.len(),
                dbms = ?dbms,
                "Starting export command"
            );
            commands::export(ExportParams {
                config,
                schema,
                nodes,
                edges,
                records: input,
                output_dir,
                dbms,
            })
            .await?;
        }

        Commands::Tree {
            config,
            schema,
            full,
        } => {
            tracing::info!(config = %config.display(), full, "Starting tree command");
            commands::tree(config, schema, full).await?;
        }

        Commands::Ancestors {
            config,
            schema,
            class,
        } => {
            tracing::info!(config = %config.display(), class = %class, "Starting ancestors command");
            commands::ancestors(config, schema, class).await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let level = if verbose {
        "debug".to_string()
    } else {
        std::env::var("ONTOWEAVE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
    };
    let env_filter = tracing_subscriber::EnvFilter::try_new(format!("ontoweave={level},warn"))?;

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
