//! Scraper adapter that reads catalog pages over plain HTTP.

use std::collections::HashSet;
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use std::thread;
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use ::scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::domain::observation::{ObservationInput, ScrapedProductDetails};
use crate::domain::product::ScrapedProduct;
use crate::domain::types::{Price, ProductTitle, ProductUrl, Rating, ReviewCount};
use crate::models::config::{HttpConfig, SelectorConfig};
use crate::scraper::{ScrapeError, ScrapeResult, Scraper};

/// Compiled CSS selectors for homepage and product pages.
#[derive(Debug, Clone)]
pub struct PageSelectors {
    product_link: Selector,
    link_image: Selector,
    link_heading: Selector,
    price: Selector,
    original_price: Selector,
    rating: Selector,
    review_count: Selector,
    availability: Selector,
    currency: Selector,
    recommended_container: Selector,
}

fn compile(selector: &str) -> ScrapeResult<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

impl PageSelectors {
    pub fn compile(config: &SelectorConfig) -> ScrapeResult<Self> {
        Ok(Self {
            product_link: compile(&config.product_link)?,
            link_image: compile("img")?,
            link_heading: compile("h3")?,
            price: compile(&config.price)?,
            original_price: compile(&config.original_price)?,
            rating: compile(&config.rating)?,
            review_count: compile(&config.review_count)?,
            availability: compile(&config.availability)?,
            currency: compile(&config.currency)?,
            recommended_container: compile(&config.recommended_container)?,
        })
    }
}

/// HTTP session against one catalog site.
pub struct HttpScraper {
    base_url: Url,
    config: HttpConfig,
    selectors: PageSelectors,
    client: Option<Client>,
    homepage: Option<String>,
}

impl HttpScraper {
    pub fn new(
        base_url: &str,
        config: HttpConfig,
        selectors: &SelectorConfig,
    ) -> ScrapeResult<Self> {
        let base_url = Url::parse(base_url).map_err(|_| ScrapeError::BaseUrl(base_url.into()))?;
        Ok(Self {
            base_url,
            config,
            selectors: PageSelectors::compile(selectors)?,
            client: None,
            homepage: None,
        })
    }

    fn fetch(&self, url: &Url) -> ScrapeResult<String> {
        let client = self.client.as_ref().ok_or(ScrapeError::NotInitialized)?;

        log::debug!("GET {url}");
        let response = client.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text()?;

        if let Some(dir) = &self.config.snapshot_dir {
            save_snapshot(dir, url, &body);
        }
        Ok(body)
    }
}

impl Scraper for HttpScraper {
    fn initialize(&mut self) -> ScrapeResult<()> {
        let mut headers = HeaderMap::new();
        let language = HeaderValue::from_str(&self.config.accept_language)
            .map_err(|e| ScrapeError::Backend(format!("invalid Accept-Language: {e}")))?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = Client::builder()
            .user_agent(self.config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()?;

        log::info!("HTTP session opened for {}", self.base_url);
        self.client = Some(client);
        Ok(())
    }

    fn go_to_homepage(&mut self) -> ScrapeResult<()> {
        let body = self.fetch(&self.base_url)?;
        self.homepage = Some(body);
        Ok(())
    }

    fn list_homepage(&mut self, limit: NonZeroUsize) -> ScrapeResult<Vec<ScrapedProduct>> {
        let html = self
            .homepage
            .as_deref()
            .ok_or(ScrapeError::HomepageNotLoaded)?;
        let products = parse_homepage(html, &self.base_url, &self.selectors, limit.get());
        log::debug!("Parsed {} product links from the homepage", products.len());
        Ok(products)
    }

    fn fetch_product_detail(
        &mut self,
        url: &ProductUrl,
        max_recommended: usize,
    ) -> ScrapeResult<ScrapedProductDetails> {
        if self.client.is_none() {
            return Err(ScrapeError::NotInitialized);
        }
        if self.config.request_delay_ms > 0 {
            thread::sleep(Duration::from_millis(self.config.request_delay_ms));
        }

        let page_url = Url::parse(url.as_str()).map_err(|e| ScrapeError::Backend(e.to_string()))?;
        let html = self.fetch(&page_url)?;
        Ok(parse_product_page(
            &html,
            &self.base_url,
            &self.selectors,
            max_recommended,
        ))
    }

    fn close(&mut self) -> ScrapeResult<()> {
        if self.client.take().is_some() {
            log::info!("HTTP session closed");
        }
        self.homepage = None;
        Ok(())
    }
}

/// Products linked from a listing page, distinct by resolved url.
pub fn parse_homepage(
    html: &str,
    base_url: &Url,
    selectors: &PageSelectors,
    limit: usize,
) -> Vec<ScrapedProduct> {
    let document = Html::parse_document(html);
    collect_products(
        document.select(&selectors.product_link),
        base_url,
        selectors,
        limit,
        true,
    )
}

/// Observation fields and related items from a product page.
pub fn parse_product_page(
    html: &str,
    base_url: &Url,
    selectors: &PageSelectors,
    max_recommended: usize,
) -> ScrapedProductDetails {
    let document = Html::parse_document(html);
    let first = |selector: &Selector| document.select(selector).next();

    let price = first(&selectors.price)
        .and_then(|e| {
            e.value()
                .attr("content")
                .map(str::to_string)
                .or_else(|| Some(element_text(e)))
        })
        .and_then(|text| parse_decimal(&text))
        .and_then(|value| Price::new(value).ok());

    let original_price = first(&selectors.original_price)
        .and_then(|e| parse_decimal(&element_text(e)))
        .and_then(|value| Price::new(value).ok());

    let rating = first(&selectors.rating)
        .and_then(|e| e.value().attr("aria-label"))
        .and_then(first_number)
        .and_then(|value| Rating::new(value as f64).ok());

    let review_count = first(&selectors.review_count)
        .and_then(|e| first_number(&element_text(e)))
        .and_then(|value| ReviewCount::new(value).ok());

    let in_stock = first(&selectors.availability).and_then(|e| {
        let marker = e
            .value()
            .attr("href")
            .or_else(|| e.value().attr("content"))
            .unwrap_or_default();
        if marker.contains("OutOfStock") {
            Some(false)
        } else if marker.contains("InStock") {
            Some(true)
        } else {
            None
        }
    });

    let mut observation = ObservationInput {
        price,
        original_price,
        in_stock,
        rating,
        review_count,
        ..Default::default()
    };
    if let Some(currency) = first(&selectors.currency).and_then(|e| e.value().attr("content")) {
        observation
            .additional_data
            .insert("currency".into(), Value::String(currency.trim().to_string()));
    }

    let recommended = match (max_recommended, first(&selectors.recommended_container)) {
        (0, _) | (_, None) => Vec::new(),
        (max, Some(container)) => collect_products(
            container.select(&selectors.product_link),
            base_url,
            selectors,
            max,
            false,
        ),
    };

    ScrapedProductDetails {
        observation,
        recommended,
    }
}

fn collect_products<'a>(
    links: impl Iterator<Item = ElementRef<'a>>,
    base_url: &Url,
    selectors: &PageSelectors,
    limit: usize,
    aria_label_fallback: bool,
) -> Vec<ScrapedProduct> {
    let mut seen = HashSet::new();
    let mut products = Vec::new();

    for link in links {
        if products.len() >= limit {
            break;
        }
        let Some(resolved) = link.value().attr("href").and_then(|h| base_url.join(h).ok()) else {
            continue;
        };
        if !seen.insert(resolved.to_string()) {
            continue;
        }
        let Some(title) = link_title(link, selectors, aria_label_fallback) else {
            continue;
        };
        if let (Ok(url), Ok(title)) = (ProductUrl::new(resolved.as_str()), ProductTitle::new(title)) {
            products.push(ScrapedProduct { url, title });
        }
    }

    products
}

fn link_title(link: ElementRef<'_>, selectors: &PageSelectors, aria: bool) -> Option<String> {
    let from_image = link
        .select(&selectors.link_image)
        .next()
        .and_then(|img| img.value().attr("alt"))
        .map(collapse_whitespace);
    let from_heading = || {
        link.select(&selectors.link_heading)
            .next()
            .map(element_text)
    };
    let from_label = || {
        aria.then(|| link.value().attr("aria-label"))
            .flatten()
            .map(collapse_whitespace)
    };

    from_image
        .filter(|t| !t.is_empty())
        .or_else(|| from_heading().filter(|t| !t.is_empty()))
        .or_else(|| from_label().filter(|t| !t.is_empty()))
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse prices such as `1.299,99 €`, `19,90` or `449.00`.
fn parse_decimal(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };
    normalized.parse().ok()
}

fn first_number(text: &str) -> Option<i32> {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|part| !part.is_empty())
        .and_then(|digits| digits.parse().ok())
}

fn snapshot_file_name(url: &Url) -> String {
    let stem: String = url
        .path()
        .trim_start_matches('/')
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "index.html".to_string()
    } else {
        format!("{stem}.html")
    }
}

fn save_snapshot(dir: &Path, url: &Url, body: &str) {
    let path = dir.join(snapshot_file_name(url));
    let written = fs::create_dir_all(dir).and_then(|_| fs::write(&path, body));
    match written {
        Ok(()) => log::debug!("Saved snapshot {}", path.display()),
        Err(e) => log::warn!("Failed to save snapshot {}: {e}", path.display()),
    }
}
