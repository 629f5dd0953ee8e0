use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use thiserror::Error;

use catalog_tracker::db::{DbError, establish_connection_pool, run_migrations};
use catalog_tracker::domain::types::{ProductUrl, TypeConstraintError};
use catalog_tracker::models::config::{AppConfig, StoreConfig};
use catalog_tracker::repository::{CatalogStore, DieselRepository, RepositoryError};
use catalog_tracker::scraper::ScrapeError;
use catalog_tracker::scraper::http::HttpScraper;
use catalog_tracker::services::PipelineError;
use catalog_tracker::services::catalog::{export_catalog, product_history};
use catalog_tracker::services::pipeline::{
    CatalogPipeline, PipelineSettings, RunMode, RunOutcome,
};
use catalog_tracker::services::report::LogReporter;

#[derive(Parser)]
#[command(name = "catalog-tracker", version, about = "Track a storefront catalog and its prices")]
struct Cli {
    /// Settings file layered over config/default and config/{APP_ENV}
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the homepage with the catalog and observe homepage products
    Scan,
    /// Observe every available stored product
    Refresh,
    /// Write all products with their latest observation as JSON
    Export {
        /// Destination file (default: output.json_file)
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Print the observation history of one product as JSON
    History { url: String },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Scraper(#[from] ScrapeError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("invalid product url: {0}")]
    Url(#[from] TypeConstraintError),
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan => run_pipeline(&config, RunMode::Scan),
        Commands::Refresh => run_pipeline(&config, RunMode::Refresh),
        Commands::Export { output } => {
            let path = output.unwrap_or_else(|| config.output.json_file.clone());
            let mut store = open_primary(&config)?;
            let entries = export_catalog(&store);
            store.close()?;
            let json = serde_json::to_string_pretty(&entries?)?;
            fs::write(&path, json).map_err(|source| CliError::Write {
                path: path.clone(),
                source,
            })?;
            log::info!("Exported catalog to {}", path.display());
            Ok(())
        }
        Commands::History { url } => {
            let url = ProductUrl::new(url)?;
            let mut store = open_primary(&config)?;
            let history = product_history(&store, &url);
            store.close()?;
            println!("{}", serde_json::to_string_pretty(&history?)?);
            Ok(())
        }
    }
}

fn run_pipeline(config: &AppConfig, mode: RunMode) -> Result<(), CliError> {
    let stores = config
        .stores
        .iter()
        .map(|store| open_store(store).map(|s| Box::new(s) as Box<dyn CatalogStore>))
        .collect::<Result<Vec<_>, _>>()?;
    let scraper = HttpScraper::new(
        &config.scraping.base_url,
        config.http.clone(),
        &config.selectors,
    )?;
    let settings = PipelineSettings {
        homepage_limit: config.scraping.initial_products_limit,
        max_recommended: config.scraping.max_recommended,
    };

    let outcome = CatalogPipeline::new(scraper, stores, settings)?.run(mode, &mut LogReporter)?;
    match outcome {
        RunOutcome::Scan(summary) => log::info!(
            "Scan summary: {} processed, {} new, {} recorded, {} removed, {} returned, {} failed, {} availability updates failed",
            summary.processed,
            summary.new_products,
            summary.recorded,
            summary.removed,
            summary.returned,
            summary.failed,
            summary.reconcile_failures
        ),
        RunOutcome::Refresh(summary) => log::info!(
            "Refresh summary: {} total, {} updated, {} skipped as removed, {} failed",
            summary.total,
            summary.updated,
            summary.skipped_removed,
            summary.failed
        ),
        RunOutcome::EmptyCatalog => log::info!("Nothing to refresh"),
    }
    Ok(())
}

fn open_store(store: &StoreConfig) -> Result<DieselRepository, CliError> {
    let pool = establish_connection_pool(&store.database_url)?;
    run_migrations(&pool)?;
    log::debug!("Opened store {} at {}", store.name, store.database_url);
    Ok(DieselRepository::new(store.name.clone(), pool))
}

fn open_primary(config: &AppConfig) -> Result<DieselRepository, CliError> {
    // `AppConfig::load` rejects an empty store list.
    let primary = config
        .stores
        .first()
        .ok_or_else(|| ::config::ConfigError::Message("no store configured".into()))?;
    open_store(primary)
}
