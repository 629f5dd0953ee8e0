//! Run events and the reporters that receive them.

use chrono::NaiveDateTime;

use crate::domain::types::{Price, ProductTitle, ProductUrl};

/// Observable step of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// The homepage snapshot was taken.
    HomepageListed { count: usize },
    /// An item is about to be processed.
    Progress {
        position: usize,
        total: usize,
        url: ProductUrl,
        title: ProductTitle,
    },
    /// An available product is no longer on the homepage.
    ProductRemoved { url: ProductUrl, title: ProductTitle },
    /// A removed product is back on the homepage.
    ProductReturned { url: ProductUrl, title: ProductTitle },
    /// A homepage item was stored for the first time.
    NewProduct { url: ProductUrl, title: ProductTitle },
    ObservationRecorded {
        url: ProductUrl,
        price: Option<Price>,
        original_price: Option<Price>,
    },
    /// Refresh skipped a product that is marked removed.
    SkippedRemoved {
        url: ProductUrl,
        removed_at: NaiveDateTime,
    },
    /// Processing of one item failed; the run continued.
    ItemFailed { url: ProductUrl, error: String },
    /// An availability change could not be written to every store.
    ReconcileFailed { url: ProductUrl, error: String },
    /// Refresh found no stored products.
    CatalogEmpty,
    /// Closing the scraper or a store failed.
    CleanupFailed { resource: String, error: String },
}

/// Receives [`RunEvent`]s as the pipeline produces them.
pub trait RunReporter {
    fn report(&mut self, event: RunEvent);
}

/// Writes every event to the `log` facade.
#[derive(Debug, Default)]
pub struct LogReporter;

impl RunReporter for LogReporter {
    fn report(&mut self, event: RunEvent) {
        match event {
            RunEvent::HomepageListed { count } => {
                log::info!("Found {count} products on the homepage")
            }
            RunEvent::Progress {
                position,
                total,
                title,
                ..
            } => log::info!("[{position}/{total}] {title}"),
            RunEvent::ProductRemoved { title, .. } => log::info!("Removed: {title}"),
            RunEvent::ProductReturned { title, .. } => log::info!("Returned: {title}"),
            RunEvent::NewProduct { url, .. } => log::info!("New product: {url}"),
            RunEvent::ObservationRecorded {
                price,
                original_price,
                ..
            } => match (price, original_price) {
                (Some(price), Some(original)) => log::info!("Price: {price} (was {original})"),
                (Some(price), None) => log::info!("Price: {price}"),
                _ => log::info!("Price: n/a"),
            },
            RunEvent::SkippedRemoved { url, removed_at } => {
                log::info!("Skipping {url}, removed at {removed_at}")
            }
            RunEvent::ItemFailed { url, error } => log::warn!("Failed to process {url}: {error}"),
            RunEvent::ReconcileFailed { url, error } => {
                log::warn!("Failed to update availability of {url}: {error}")
            }
            RunEvent::CatalogEmpty => {
                log::info!("No products stored yet; run a scan first")
            }
            RunEvent::CleanupFailed { resource, error } => {
                log::error!("Failed to close {resource}: {error}")
            }
        }
    }
}

/// Keeps every event; handy for callers that inspect a run afterwards.
impl RunReporter for Vec<RunEvent> {
    fn report(&mut self, event: RunEvent) {
        self.push(event);
    }
}
