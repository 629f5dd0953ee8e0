use std::num::NonZeroUsize;
use std::path::PathBuf;

use serde::Deserialize;

/// Top-level settings of the catalog tracker.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub scraping: ScrapingConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    /// Persistence targets; the first entry is the primary store used for reads.
    pub stores: Vec<StoreConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// What to scrape and how much of it.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapingConfig {
    pub base_url: String,
    /// Homepage products considered by a scan.
    pub initial_products_limit: NonZeroUsize,
    /// Related items requested per product page.
    #[serde(default)]
    pub max_recommended: usize,
}

/// HTTP session settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub timeout_secs: u64,
    /// Pause before each product page request.
    pub request_delay_ms: u64,
    /// Directory receiving a copy of every fetched page, when set.
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
            accept_language: "pt-PT,pt;q=0.9".into(),
            timeout_secs: 60,
            request_delay_ms: 2000,
            snapshot_dir: None,
        }
    }
}

/// CSS selectors used to read listing and product pages.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub product_link: String,
    pub price: String,
    pub original_price: String,
    pub rating: String,
    pub review_count: String,
    pub availability: String,
    pub currency: String,
    pub recommended_container: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            product_link: r#"a[href^="/produtos/"]"#.into(),
            price: r#"[itemprop="price"]"#.into(),
            original_price: ".price__scratched-numbers .value".into(),
            rating: r#"[aria-label*="Avaliação"]"#.into(),
            review_count: ".rating__opinions span".into(),
            availability: r#"[itemprop="availability"]"#.into(),
            currency: r#"[itemprop="priceCurrency"]"#.into(),
            recommended_container: ".related-cards__cards-container.grid".into(),
        }
    }
}

/// One SQLite database receiving catalog writes.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub name: String,
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default destination of `export`.
    pub json_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_file: PathBuf::from("./products.json"),
        }
    }
}

#[cfg(feature = "cli")]
mod loader {
    use std::path::Path;

    use ::config::{Config, ConfigError, Environment, File};

    use super::AppConfig;

    impl AppConfig {
        /// Layer `config/default`, `config/{APP_ENV}`, an optional explicit
        /// file and `CATALOG__*` environment variables, in that order.
        pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
            let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "local".into());

            let mut builder = Config::builder()
                .add_source(File::with_name("config/default").required(false))
                .add_source(File::with_name(&format!("config/{app_env}")).required(false));
            if let Some(path) = explicit {
                builder = builder.add_source(File::from(path));
            }

            let settings = builder
                .add_source(
                    Environment::with_prefix("CATALOG")
                        .prefix_separator("__")
                        .separator("__")
                        .try_parsing(true),
                )
                .build()?;

            let config: AppConfig = settings.try_deserialize()?;
            config.validate()?;
            Ok(config)
        }

        fn validate(&self) -> Result<(), ConfigError> {
            if self.stores.is_empty() {
                return Err(ConfigError::Message(
                    "at least one store must be configured".into(),
                ));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_settings_fill_in_defaults() {
        let value = serde_json::json!({
            "scraping": { "base_url": "https://shop.example", "initial_products_limit": 10 },
            "stores": [{ "name": "main", "database_url": "catalog.db" }],
        });

        let config: AppConfig = serde_json::from_value(value).unwrap();

        assert_eq!(config.scraping.initial_products_limit.get(), 10);
        assert_eq!(config.scraping.max_recommended, 0);
        assert_eq!(config.http.timeout_secs, 60);
        assert_eq!(config.selectors.product_link, r#"a[href^="/produtos/"]"#);
        assert_eq!(config.output.json_file, PathBuf::from("./products.json"));
    }

    #[test]
    fn zero_product_limit_is_rejected() {
        let value = serde_json::json!({
            "scraping": { "base_url": "https://shop.example", "initial_products_limit": 0 },
            "stores": [],
        });

        assert!(serde_json::from_value::<AppConfig>(value).is_err());
    }
}
