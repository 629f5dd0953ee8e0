//! Acquisition port: listing homepage products and reading product pages.

use std::num::NonZeroUsize;

use thiserror::Error;

use crate::domain::observation::ScrapedProductDetails;
use crate::domain::product::ScrapedProduct;
use crate::domain::types::ProductUrl;

#[cfg(feature = "cli")]
pub mod http;
#[cfg(test)]
pub mod test;

/// Errors raised by scraper implementations.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// An operation was attempted before `initialize` or after `close`.
    #[error("scraper session is not initialized")]
    NotInitialized,
    /// `list_homepage` was called before the homepage was loaded.
    #[error("homepage has not been loaded")]
    HomepageNotLoaded,
    #[cfg(feature = "cli")]
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    /// A configured CSS selector could not be parsed.
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
    /// The configured base URL cannot be used to resolve links.
    #[error("invalid base url `{0}`")]
    BaseUrl(String),
    /// Failure reported by a scraper backend without a dedicated variant.
    #[error("{0}")]
    Backend(String),
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// A single scraping session against one catalog.
///
/// Implementations own exactly one session and are driven sequentially; no
/// method retries on its own.
pub trait Scraper {
    /// Acquire the session. Must precede every other call.
    fn initialize(&mut self) -> ScrapeResult<()>;
    /// Load the landing listing so that [`Scraper::list_homepage`] can read it.
    fn go_to_homepage(&mut self) -> ScrapeResult<()>;
    /// Up to `limit` products in page order, distinct by url.
    fn list_homepage(&mut self, limit: NonZeroUsize) -> ScrapeResult<Vec<ScrapedProduct>>;
    /// Read one product page, returning at most `max_recommended` related items.
    fn fetch_product_detail(
        &mut self,
        url: &ProductUrl,
        max_recommended: usize,
    ) -> ScrapeResult<ScrapedProductDetails>;
    /// Release the session. Idempotent, and safe without `initialize`.
    fn close(&mut self) -> ScrapeResult<()>;
}
