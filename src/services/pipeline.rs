//! Catalog reconciliation and the scan/refresh pipelines.
//!
//! A run owns one scraper session and every configured store. Reads go to the
//! primary (first) store; every write is broadcast to all stores. Failures
//! while handling a single product are reported and counted, never
//! propagated. Only session start-up, homepage loading and the primary
//! store's catalog listings abort a run.

use std::collections::HashSet;
use std::num::NonZeroUsize;

use serde::Serialize;
use thiserror::Error;

use crate::domain::observation::Observation;
use crate::domain::product::{Product, ScrapedProduct};
use crate::domain::types::ProductUrl;
use crate::repository::{CatalogStore, RepositoryError, RepositoryResult};
use crate::scraper::{ScrapeError, Scraper};
use crate::services::errors::{PipelineError, PipelineResult};
use crate::services::fanout::{BroadcastError, broadcast};
use crate::services::report::{RunEvent, RunReporter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Discover the homepage, reconcile availability, observe homepage items.
    Scan,
    /// Observe every available stored product.
    Refresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Homepage items considered by a scan.
    pub homepage_limit: NonZeroUsize,
    /// Related items requested per product page. Not consumed by either mode.
    pub max_recommended: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Homepage items visited.
    pub processed: usize,
    pub new_products: usize,
    /// Homepage items whose observation reached every store. An append that
    /// only some stores accepted counts as `failed`.
    pub recorded: usize,
    pub removed: usize,
    pub returned: usize,
    /// Homepage items whose processing failed.
    pub failed: usize,
    /// Availability changes that some store rejected.
    pub reconcile_failures: usize,
}

/// Totals of a refresh. `total == updated + failed + skipped_removed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub total: usize,
    pub updated: usize,
    pub skipped_removed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Scan(ScanSummary),
    Refresh(RefreshSummary),
    /// Refresh had nothing to do because no product was ever stored.
    EmptyCatalog,
}

/// Failure confined to one product.
#[derive(Debug, Error)]
enum ItemError {
    #[error(transparent)]
    Lookup(#[from] RepositoryError),
    #[error(transparent)]
    Write(#[from] BroadcastError),
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}

pub struct CatalogPipeline<S> {
    scraper: S,
    stores: Vec<Box<dyn CatalogStore>>,
    settings: PipelineSettings,
}

impl<S: Scraper> CatalogPipeline<S> {
    /// `stores` must not be empty; its first entry answers all reads.
    pub fn new(
        scraper: S,
        stores: Vec<Box<dyn CatalogStore>>,
        settings: PipelineSettings,
    ) -> PipelineResult<Self> {
        if stores.is_empty() {
            return Err(PipelineError::NoStores);
        }
        Ok(Self {
            scraper,
            stores,
            settings,
        })
    }

    /// Execute one run, then close the scraper and every store exactly once.
    ///
    /// Cleanup failures are reported to `reporter` and do not replace the
    /// run's own result.
    pub fn run(mut self, mode: RunMode, reporter: &mut dyn RunReporter) -> PipelineResult<RunOutcome> {
        let result = match mode {
            RunMode::Scan => self.scan(reporter).map(RunOutcome::Scan),
            RunMode::Refresh => self.refresh(reporter),
        };
        self.shutdown(reporter);
        result
    }

    fn scan(&mut self, reporter: &mut dyn RunReporter) -> PipelineResult<ScanSummary> {
        self.scraper.initialize()?;
        self.scraper.go_to_homepage()?;
        let homepage = distinct_by_url(self.scraper.list_homepage(self.settings.homepage_limit)?);
        reporter.report(RunEvent::HomepageListed {
            count: homepage.len(),
        });

        let on_homepage: HashSet<&ProductUrl> = homepage.iter().map(|p| &p.url).collect();
        let mut summary = ScanSummary::default();

        let available = self.read_catalog(|store| store.list_available_products())?;
        for product in available.iter().filter(|p| !on_homepage.contains(&p.url)) {
            match broadcast(&self.stores, |store| store.mark_removed(&product.url)) {
                Ok(()) => {
                    summary.removed += 1;
                    reporter.report(RunEvent::ProductRemoved {
                        url: product.url.clone(),
                        title: product.title.clone(),
                    });
                }
                Err(e) => {
                    summary.reconcile_failures += 1;
                    reporter.report(RunEvent::ReconcileFailed {
                        url: product.url.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let catalog = self.read_catalog(|store| store.list_products())?;
        for product in catalog
            .iter()
            .filter(|p| !p.is_available() && on_homepage.contains(&p.url))
        {
            match broadcast(&self.stores, |store| store.mark_available(&product.url)) {
                Ok(()) => {
                    summary.returned += 1;
                    reporter.report(RunEvent::ProductReturned {
                        url: product.url.clone(),
                        title: product.title.clone(),
                    });
                }
                Err(e) => {
                    summary.reconcile_failures += 1;
                    reporter.report(RunEvent::ReconcileFailed {
                        url: product.url.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let total = homepage.len();
        for (index, item) in homepage.iter().enumerate() {
            summary.processed += 1;
            reporter.report(RunEvent::Progress {
                position: index + 1,
                total,
                url: item.url.clone(),
                title: item.title.clone(),
            });

            match self.scan_item(item, &mut summary, reporter) {
                Ok(()) => summary.recorded += 1,
                Err(e) => {
                    summary.failed += 1;
                    reporter.report(RunEvent::ItemFailed {
                        url: item.url.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        log::info!(
            "Scan finished: {} processed, {} new, {} removed, {} returned, {} failed",
            summary.processed,
            summary.new_products,
            summary.removed,
            summary.returned,
            summary.failed
        );
        Ok(summary)
    }

    /// Store the identity of the item in every store that lacks it, then
    /// record its observation. Existing rows are left as they are.
    fn scan_item(
        &mut self,
        item: &ScrapedProduct,
        summary: &mut ScanSummary,
        reporter: &mut dyn RunReporter,
    ) -> Result<(), ItemError> {
        let is_new = !self.primary().product_exists(&item.url)?;
        let product = Product::from(item);
        broadcast(&self.stores, |store| {
            if store.product_exists(&product.url)? {
                Ok(())
            } else {
                store.upsert_product(&product)
            }
        })?;

        if is_new {
            summary.new_products += 1;
            reporter.report(RunEvent::NewProduct {
                url: item.url.clone(),
                title: item.title.clone(),
            });
        }

        self.record_observation(&item.url, reporter)
    }

    fn refresh(&mut self, reporter: &mut dyn RunReporter) -> PipelineResult<RunOutcome> {
        self.scraper.initialize()?;

        let catalog = self.read_catalog(|store| store.list_products())?;
        if catalog.is_empty() {
            reporter.report(RunEvent::CatalogEmpty);
            return Ok(RunOutcome::EmptyCatalog);
        }

        let mut summary = RefreshSummary {
            total: catalog.len(),
            ..Default::default()
        };

        for (index, product) in catalog.iter().enumerate() {
            reporter.report(RunEvent::Progress {
                position: index + 1,
                total: summary.total,
                url: product.url.clone(),
                title: product.title.clone(),
            });

            if let Some(removed_at) = product.removed_at {
                summary.skipped_removed += 1;
                reporter.report(RunEvent::SkippedRemoved {
                    url: product.url.clone(),
                    removed_at,
                });
                continue;
            }

            match self.record_observation(&product.url, reporter) {
                Ok(()) => summary.updated += 1,
                Err(e) => {
                    summary.failed += 1;
                    reporter.report(RunEvent::ItemFailed {
                        url: product.url.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        log::info!(
            "Refresh finished: {} products, {} updated, {} skipped as removed, {} failed",
            summary.total,
            summary.updated,
            summary.skipped_removed,
            summary.failed
        );
        Ok(RunOutcome::Refresh(summary))
    }

    fn record_observation(
        &mut self,
        url: &ProductUrl,
        reporter: &mut dyn RunReporter,
    ) -> Result<(), ItemError> {
        let details = self
            .scraper
            .fetch_product_detail(url, self.settings.max_recommended)?;
        if !details.recommended.is_empty() {
            log::debug!("{url} recommends {} products", details.recommended.len());
        }

        let observation = Observation::new(url.clone(), details.observation);
        broadcast(&self.stores, |store| store.append_observation(&observation))?;

        reporter.report(RunEvent::ObservationRecorded {
            url: url.clone(),
            price: observation.price(),
            original_price: observation.original_price(),
        });
        Ok(())
    }

    fn primary(&self) -> &dyn CatalogStore {
        // `new` rejects an empty store list.
        self.stores[0].as_ref()
    }

    fn read_catalog<T>(
        &self,
        read: impl FnOnce(&dyn CatalogStore) -> RepositoryResult<T>,
    ) -> PipelineResult<T> {
        let primary = self.primary();
        read(primary).map_err(|source| PipelineError::Catalog {
            store: primary.name().to_string(),
            source,
        })
    }

    fn shutdown(&mut self, reporter: &mut dyn RunReporter) {
        if let Err(e) = self.scraper.close() {
            reporter.report(RunEvent::CleanupFailed {
                resource: "scraper".into(),
                error: e.to_string(),
            });
        }
        for store in &mut self.stores {
            if let Err(e) = store.close() {
                reporter.report(RunEvent::CleanupFailed {
                    resource: store.name().to_string(),
                    error: e.to_string(),
                });
            }
        }
    }
}

/// Keep the first occurrence of every url, preserving order.
fn distinct_by_url(products: Vec<ScrapedProduct>) -> Vec<ScrapedProduct> {
    let mut seen = HashSet::new();
    products
        .into_iter()
        .filter(|p| seen.insert(p.url.clone()))
        .collect()
}
