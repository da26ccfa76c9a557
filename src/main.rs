//! refdb CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "refdb")]
#[command(about = "Track and maintain references between resource files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Project root path (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Config file (defaults to refdb.toml in the project root)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load or build the reference database and print a summary
    Init,
    /// List the resources a resource references
    Refs {
        /// Resource path relative to the project root
        path: String,
    },
    /// List the resources that reference a resource
    Dependents {
        /// Resource path relative to the project root
        path: String,

        /// Follow references transitively
        #[arg(short, long)]
        transitive: bool,
    },
    /// Watch the data directory and keep the database current until Ctrl-C
    Watch,
    /// Rescan every resource and overwrite the persisted database
    Rebuild,
    /// Delete the persisted database
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("refdb={}", log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = refdb_core::RefDbConfig::load(&cli.root, cli.config.as_deref())?;
    tracing::debug!("Project root: {}", config.root.display());

    match cli.command {
        Commands::Init => commands::init(config),
        Commands::Refs { path } => commands::refs(config, &path),
        Commands::Dependents { path, transitive } => commands::dependents(config, &path, transitive),
        Commands::Watch => commands::watch(config).await,
        Commands::Rebuild => commands::rebuild(config),
        Commands::Clear => commands::clear(config),
    }
}
