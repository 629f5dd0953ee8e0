use thiserror::Error;

use crate::repository::RepositoryError;
use crate::scraper::ScrapeError;

/// Errors that abort a whole pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A pipeline needs at least one store to read from.
    #[error("no catalog store configured")]
    NoStores,
    /// Session start-up or homepage acquisition failed.
    #[error("scraper failed: {0}")]
    Scraper(#[from] ScrapeError),
    /// The primary store could not list the catalog.
    #[error("store `{store}` failed: {source}")]
    Catalog {
        store: String,
        #[source]
        source: RepositoryError,
    },
}

/// Convenient alias for results returned from pipeline functions.
pub type PipelineResult<T> = Result<T, PipelineError>;
