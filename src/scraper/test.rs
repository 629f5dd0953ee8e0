use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::observation::{ObservationInput, ScrapedProductDetails};
use crate::domain::product::ScrapedProduct;
use crate::domain::types::{Price, ProductTitle, ProductUrl};
use crate::scraper::{ScrapeError, ScrapeResult, Scraper};

#[derive(Default)]
struct State {
    homepage: Vec<ScrapedProduct>,
    prices: HashMap<String, f64>,
    failing_urls: HashSet<String>,
    fail_initialize: bool,
    fail_homepage: bool,
    fail_close: bool,
    initialized: bool,
    fetched: Vec<String>,
    closed: usize,
}

/// Scripted scraper used for unit tests. Clones share state.
#[derive(Clone, Default)]
pub struct TestScraper {
    state: Arc<Mutex<State>>,
}

pub fn identity(url: &str, title: &str) -> ScrapedProduct {
    ScrapedProduct {
        url: ProductUrl::new(url).unwrap(),
        title: ProductTitle::new(title).unwrap(),
    }
}

impl TestScraper {
    pub fn with_homepage(homepage: Vec<ScrapedProduct>) -> Self {
        let scraper = Self::default();
        scraper.state().homepage = homepage;
        scraper
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn set_price(&self, url: &str, price: f64) {
        self.state().prices.insert(url.to_string(), price);
    }

    pub fn fail_detail_for(&self, url: &str) {
        self.state().failing_urls.insert(url.to_string());
    }

    pub fn fail_initialize(&self) {
        self.state().fail_initialize = true;
    }

    pub fn fail_homepage(&self) {
        self.state().fail_homepage = true;
    }

    pub fn fail_close(&self) {
        self.state().fail_close = true;
    }

    pub fn fetched(&self) -> Vec<String> {
        self.state().fetched.clone()
    }

    pub fn times_closed(&self) -> usize {
        self.state().closed
    }
}

impl Scraper for TestScraper {
    fn initialize(&mut self) -> ScrapeResult<()> {
        let mut state = self.state();
        if state.fail_initialize {
            return Err(ScrapeError::Backend("browser failed to start".into()));
        }
        state.initialized = true;
        Ok(())
    }

    fn go_to_homepage(&mut self) -> ScrapeResult<()> {
        let state = self.state();
        if !state.initialized {
            return Err(ScrapeError::NotInitialized);
        }
        if state.fail_homepage {
            return Err(ScrapeError::Status {
                url: "https://shop.example/".into(),
                status: 503,
            });
        }
        Ok(())
    }

    fn list_homepage(&mut self, limit: NonZeroUsize) -> ScrapeResult<Vec<ScrapedProduct>> {
        let state = self.state();
        if !state.initialized {
            return Err(ScrapeError::NotInitialized);
        }
        Ok(state.homepage.iter().take(limit.get()).cloned().collect())
    }

    fn fetch_product_detail(
        &mut self,
        url: &ProductUrl,
        _max_recommended: usize,
    ) -> ScrapeResult<ScrapedProductDetails> {
        let mut state = self.state();
        if !state.initialized {
            return Err(ScrapeError::NotInitialized);
        }
        state.fetched.push(url.to_string());
        if state.failing_urls.contains(url.as_str()) {
            return Err(ScrapeError::Backend(format!("timed out loading {url}")));
        }
        let price = state
            .prices
            .get(url.as_str())
            .map(|p| Price::new(*p).unwrap());
        Ok(ScrapedProductDetails {
            observation: ObservationInput {
                price,
                ..Default::default()
            },
            recommended: vec![],
        })
    }

    fn close(&mut self) -> ScrapeResult<()> {
        let mut state = self.state();
        state.initialized = false;
        state.closed += 1;
        if state.fail_close {
            return Err(ScrapeError::Backend("browser did not exit".into()));
        }
        Ok(())
    }
}
