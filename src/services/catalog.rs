//! Read-only views over a stored catalog.

use serde::Serialize;

use crate::domain::observation::Observation;
use crate::domain::product::Product;
use crate::domain::types::ProductUrl;
use crate::repository::{CatalogReader, RepositoryResult};

/// A product together with its most recent observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub product: Product,
    pub latest_observation: Option<Observation>,
}

/// Every stored product, available or not, in insertion order.
pub fn export_catalog(store: &dyn CatalogReader) -> RepositoryResult<Vec<CatalogEntry>> {
    store
        .list_products()?
        .into_iter()
        .map(|product| {
            let latest_observation = store.list_observations(&product.url)?.pop();
            Ok(CatalogEntry {
                product,
                latest_observation,
            })
        })
        .collect()
}

/// Observations of one product, oldest first. Unknown urls yield no rows.
pub fn product_history(
    store: &dyn CatalogReader,
    url: &ProductUrl,
) -> RepositoryResult<Vec<Observation>> {
    store.list_observations(url)
}
