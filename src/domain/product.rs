use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{ProductTitle, ProductUrl};

/// A catalog item as it is known to the store.
///
/// `removed_at` is `None` while the item is listed on the homepage and holds
/// the time it disappeared otherwise. Products are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub url: ProductUrl,
    pub title: ProductTitle,
    pub removed_at: Option<NaiveDateTime>,
}

impl Product {
    pub fn new(url: ProductUrl, title: ProductTitle) -> Self {
        Self {
            url,
            title,
            removed_at: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.removed_at.is_none()
    }
}

/// Identity of a product as read from a listing page.
///
/// It only becomes a [`Product`] once the pipeline decides to persist it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScrapedProduct {
    pub url: ProductUrl,
    pub title: ProductTitle,
}

impl From<ScrapedProduct> for Product {
    fn from(scraped: ScrapedProduct) -> Self {
        Product::new(scraped.url, scraped.title)
    }
}

impl From<&ScrapedProduct> for Product {
    fn from(scraped: &ScrapedProduct) -> Self {
        Product::new(scraped.url.clone(), scraped.title.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn scraped() -> ScrapedProduct {
        ScrapedProduct {
            url: ProductUrl::new("https://shop.example/produtos/kettle").unwrap(),
            title: ProductTitle::new("Kettle").unwrap(),
        }
    }

    #[test]
    fn scraped_identity_becomes_available_product() {
        let product = Product::from(scraped());

        assert!(product.is_available());
        assert_eq!(product.title, "Kettle");
    }

    #[test]
    fn removed_product_is_not_available() {
        let mut product = Product::from(&scraped());
        product.removed_at = Some(DateTime::from_timestamp(0, 0).unwrap().naive_utc());

        assert!(!product.is_available());
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let value = serde_json::to_value(Product::from(scraped())).unwrap();

        assert_eq!(value["url"], "https://shop.example/produtos/kettle");
        assert!(value["removedAt"].is_null());
    }
}
