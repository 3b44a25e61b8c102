use anyhow::Context;
use clap::{Parser, Subcommand};
use docway::config::{read_config, MigrateConfig};
use docway::migration::{run_migrations, DeclarativeLoader, MigrationExecutor};
use docway::source::FsMigrationSource;
use docway::store::FileStore;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Docway - versioned, one-way migrations for document databases
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// JSON configuration file; command-line flags override its values
    #[arg(long, global = true, env = "DOCWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Document store file
    #[arg(long, global = true, env = "DOCWAY_STORE")]
    store: Option<PathBuf>,

    /// Collection holding migration results
    #[arg(long, global = true, env = "DOCWAY_COLLECTION")]
    collection: Option<String>,

    /// Log level: debug | info | warn | error
    #[arg(long, global = true, env = "DOCWAY_LOG_LEVEL")]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Migrates the database to the latest version
    Migrate {
        /// Path to migration files
        #[arg(long, env = "DOCWAY_PATH")]
        path: Option<PathBuf>,

        /// Simulates changes without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Name recorded as installed_by
        #[arg(long, env = "DOCWAY_INSTALLED_BY")]
        installed_by: Option<String>,
    },
    /// Lists recorded migration results
    Status,
}

async fn load_config(args: &Args) -> anyhow::Result<MigrateConfig> {
    let mut config = match &args.config {
        Some(path) => read_config(path)
            .await
            .with_context(|| format!("Failed to read config {}", path.display()))?
            .unwrap_or_default(),
        None => MigrateConfig::default(),
    };

    if let Some(store) = &args.store {
        config.store_path = store.clone();
    }
    if let Some(collection) = &args.collection {
        config.results_collection = collection.clone();
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if let Command::Migrate {
        path,
        dry_run,
        installed_by,
    } = &args.command
    {
        if let Some(path) = path {
            config.source_directory = path.clone();
        }
        config.dry_run = config.dry_run || *dry_run;
        if let Some(installed_by) = installed_by {
            config.installed_by = Some(installed_by.clone());
        }
    }

    config.validate()?;
    Ok(config)
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(&args).await?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(config.log_level.to_lowercase()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store = Arc::new(FileStore::new(&config.store_path));

    match args.command {
        Command::Migrate { .. } => {
            let config = MigrateConfig {
                source_directory: FsMigrationSource::resolve(&config.source_directory),
                ..config
            };
            let stats = run_migrations(&config, store, Arc::new(DeclarativeLoader::new())).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Status => {
            let executor = MigrationExecutor::new(
                Arc::new(FsMigrationSource::new()),
                Arc::new(DeclarativeLoader::new()),
                store,
            );
            let results = executor.history(&config.results_collection).await?;
            info!(count = results.len(), "Recorded migrations");
            for result in results {
                println!(
                    "{:>4}  {:<12} {:<7} {}  {}",
                    result.installed_rank,
                    result.version,
                    if result.success { "success" } else { "FAILED" },
                    result.installed_on.to_rfc3339(),
                    result.script
                );
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
