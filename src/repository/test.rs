use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use crate::domain::observation::Observation;
use crate::domain::product::Product;
use crate::domain::types::ProductUrl;
use crate::repository::{
    CatalogReader, CatalogStore, CatalogWriter, RepositoryError, RepositoryResult,
};

/// Store operation recorded by [`TestRepository`], in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Upsert(String),
    Append(String),
    MarkRemoved(String),
    MarkAvailable(String),
}

#[derive(Default)]
struct State {
    products: Vec<Product>,
    observations: Vec<Observation>,
    calls: Vec<StoreCall>,
    failing_urls: HashSet<String>,
    fail_reads: bool,
    fail_close: bool,
    closed: usize,
}

/// Simple in-memory store used for unit tests.
///
/// Clones share state so a test can keep a handle after handing a boxed copy
/// to the pipeline.
#[derive(Clone, Default)]
pub struct TestRepository {
    name: String,
    state: Arc<Mutex<State>>,
}

impl TestRepository {
    pub fn new(name: &str, products: Vec<Product>) -> Self {
        let repo = Self {
            name: name.to_string(),
            state: Arc::default(),
        };
        repo.state().products = products;
        repo
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Every mutating call touching `url` fails from now on.
    pub fn fail_writes_for(&self, url: &str) {
        self.state().failing_urls.insert(url.to_string());
    }

    pub fn fail_reads(&self) {
        self.state().fail_reads = true;
    }

    /// `close` still counts the call but reports an error.
    pub fn fail_close(&self) {
        self.state().fail_close = true;
    }

    pub fn product(&self, url: &str) -> Option<Product> {
        self.state()
            .products
            .iter()
            .find(|p| p.url.as_str() == url)
            .cloned()
    }

    pub fn observations(&self) -> Vec<Observation> {
        self.state().observations.clone()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    pub fn times_closed(&self) -> usize {
        self.state().closed
    }

    fn check_write(&self, state: &State, url: &ProductUrl) -> RepositoryResult<()> {
        if state.closed > 0 {
            return Err(RepositoryError::Closed);
        }
        if state.failing_urls.contains(url.as_str()) {
            return Err(RepositoryError::Backend(format!(
                "{} rejected write for {url}",
                self.name
            )));
        }
        Ok(())
    }

    fn check_read(&self, state: &State) -> RepositoryResult<()> {
        if state.closed > 0 {
            return Err(RepositoryError::Closed);
        }
        if state.fail_reads {
            return Err(RepositoryError::Backend(format!("{} is unreachable", self.name)));
        }
        Ok(())
    }
}

impl CatalogReader for TestRepository {
    fn product_exists(&self, url: &ProductUrl) -> RepositoryResult<bool> {
        let state = self.state();
        self.check_read(&state)?;
        Ok(state.products.iter().any(|p| &p.url == url))
    }

    fn list_products(&self) -> RepositoryResult<Vec<Product>> {
        let state = self.state();
        self.check_read(&state)?;
        Ok(state.products.clone())
    }

    fn list_available_products(&self) -> RepositoryResult<Vec<Product>> {
        let state = self.state();
        self.check_read(&state)?;
        Ok(state
            .products
            .iter()
            .filter(|p| p.is_available())
            .cloned()
            .collect())
    }

    fn list_observations(&self, url: &ProductUrl) -> RepositoryResult<Vec<Observation>> {
        let state = self.state();
        self.check_read(&state)?;
        Ok(state
            .observations
            .iter()
            .filter(|o| o.product_url() == url)
            .cloned()
            .collect())
    }
}

impl CatalogWriter for TestRepository {
    fn upsert_product(&self, product: &Product) -> RepositoryResult<()> {
        let mut state = self.state();
        self.check_write(&state, &product.url)?;
        state
            .calls
            .push(StoreCall::Upsert(product.url.to_string()));
        match state.products.iter_mut().find(|p| p.url == product.url) {
            Some(existing) => {
                existing.title = product.title.clone();
                existing.removed_at = product.removed_at;
            }
            None => state.products.push(product.clone()),
        }
        Ok(())
    }

    fn upsert_products(&self, products: &[Product]) -> RepositoryResult<()> {
        products.iter().try_for_each(|p| self.upsert_product(p))
    }

    fn append_observation(&self, observation: &Observation) -> RepositoryResult<()> {
        let mut state = self.state();
        self.check_write(&state, observation.product_url())?;
        if !state
            .products
            .iter()
            .any(|p| &p.url == observation.product_url())
        {
            return Err(RepositoryError::Backend(format!(
                "no product row for {}",
                observation.product_url()
            )));
        }
        state
            .calls
            .push(StoreCall::Append(observation.product_url().to_string()));
        state.observations.push(observation.clone());
        Ok(())
    }

    fn mark_removed(&self, url: &ProductUrl) -> RepositoryResult<()> {
        let mut state = self.state();
        self.check_write(&state, url)?;
        state.calls.push(StoreCall::MarkRemoved(url.to_string()));
        if let Some(product) = state
            .products
            .iter_mut()
            .find(|p| &p.url == url && p.removed_at.is_none())
        {
            product.removed_at = Some(Utc::now().naive_utc());
        }
        Ok(())
    }

    fn mark_available(&self, url: &ProductUrl) -> RepositoryResult<()> {
        let mut state = self.state();
        self.check_write(&state, url)?;
        state.calls.push(StoreCall::MarkAvailable(url.to_string()));
        if let Some(product) = state.products.iter_mut().find(|p| &p.url == url) {
            product.removed_at = None;
        }
        Ok(())
    }
}

impl CatalogStore for TestRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) -> RepositoryResult<()> {
        let mut state = self.state();
        state.closed += 1;
        if state.fail_close {
            return Err(RepositoryError::Backend(format!("{} failed to close", self.name)));
        }
        Ok(())
    }
}
