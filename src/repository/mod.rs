use crate::db::{DbConnection, DbPool};
use crate::domain::observation::Observation;
use crate::domain::product::Product;
use crate::domain::types::ProductUrl;

pub mod errors;
pub mod observation;
pub mod product;
#[cfg(test)]
pub mod test;

pub use errors::{RepositoryError, RepositoryResult};

/// Catalog store backed by Diesel and SQLite.
///
/// The underlying `r2d2::Pool` is cheap to clone; clones share connections.
/// After [`CatalogStore::close`] every operation fails with
/// [`RepositoryError::Closed`].
#[derive(Clone)]
pub struct DieselRepository {
    name: String,
    pool: Option<DbPool>,
}

impl DieselRepository {
    /// Create a new repository from an established database pool.
    pub fn new(name: impl Into<String>, pool: DbPool) -> Self {
        Self {
            name: name.into(),
            pool: Some(pool),
        }
    }

    /// Get a pooled database connection.
    fn conn(&self) -> RepositoryResult<DbConnection> {
        let pool = self.pool.as_ref().ok_or(RepositoryError::Closed)?;
        Ok(pool.get()?)
    }
}

/// Read-only catalog queries.
pub trait CatalogReader {
    /// Whether a product row exists for `url`, available or not.
    fn product_exists(&self, url: &ProductUrl) -> RepositoryResult<bool>;
    /// Every known product in insertion order.
    fn list_products(&self) -> RepositoryResult<Vec<Product>>;
    /// Products with no `removed_at` timestamp.
    fn list_available_products(&self) -> RepositoryResult<Vec<Product>>;
    /// Observations recorded for `url`, oldest first.
    fn list_observations(&self, url: &ProductUrl) -> RepositoryResult<Vec<Observation>>;
}

/// Catalog mutations.
pub trait CatalogWriter {
    /// Insert or update a product by url, overwriting title and `removed_at`.
    fn upsert_product(&self, product: &Product) -> RepositoryResult<()>;
    /// Upsert several products. Empty input is a no-op.
    fn upsert_products(&self, products: &[Product]) -> RepositoryResult<()>;
    /// Append one observation. Never updates existing rows.
    fn append_observation(&self, observation: &Observation) -> RepositoryResult<()>;
    /// Stamp `removed_at` unless the product is already removed.
    fn mark_removed(&self, url: &ProductUrl) -> RepositoryResult<()>;
    /// Clear `removed_at`.
    fn mark_available(&self, url: &ProductUrl) -> RepositoryResult<()>;
}

/// A complete persistence target the pipeline can read from and write to.
pub trait CatalogStore: CatalogReader + CatalogWriter {
    /// Label used when reporting failures of this store.
    fn name(&self) -> &str;
    /// Release held resources. Safe on a store that was never used.
    fn close(&mut self) -> RepositoryResult<()>;
}

impl CatalogStore for DieselRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) -> RepositoryResult<()> {
        // Dropping the last pool handle closes its idle connections.
        self.pool = None;
        Ok(())
    }
}
