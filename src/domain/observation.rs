use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::product::ScrapedProduct;
use crate::domain::types::{Price, ProductUrl, Rating, ReviewCount};

/// Unstructured extra fields captured from a product page.
pub type AdditionalData = Map<String, Value>;

/// Raw measurement fields reported by a scraper for one product page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationInput {
    pub price: Option<Price>,
    pub original_price: Option<Price>,
    pub in_stock: Option<bool>,
    pub rating: Option<Rating>,
    pub review_count: Option<ReviewCount>,
    #[serde(default)]
    pub additional_data: AdditionalData,
}

/// Everything a detail fetch yields: the measurement plus related items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedProductDetails {
    pub observation: ObservationInput,
    pub recommended: Vec<ScrapedProduct>,
}

/// Immutable point-in-time price/availability record of a product.
///
/// Derived fields are computed once in [`Observation::new`]; rows read back
/// from storage keep the values that were persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub(crate) product_url: ProductUrl,
    pub(crate) checked_at: NaiveDateTime,
    pub(crate) price: Option<Price>,
    pub(crate) original_price: Option<Price>,
    pub(crate) has_promotion: bool,
    pub(crate) discount_percentage: Option<i32>,
    pub(crate) in_stock: bool,
    pub(crate) rating: Option<Rating>,
    pub(crate) review_count: Option<ReviewCount>,
    pub(crate) additional_data: AdditionalData,
}

impl Observation {
    /// Stamp a new observation for `product_url` with the current UTC time.
    pub fn new(product_url: ProductUrl, input: ObservationInput) -> Self {
        let has_promotion = matches!(
            (input.price, input.original_price),
            (Some(price), Some(original)) if price.get() < original.get()
        );
        let discount_percentage = if has_promotion {
            input
                .price
                .zip(input.original_price)
                .map(|(price, original)| discount_percentage(price, original))
        } else {
            None
        };

        Self {
            product_url,
            checked_at: Utc::now().naive_utc(),
            price: input.price,
            original_price: input.original_price,
            has_promotion,
            discount_percentage,
            in_stock: input.in_stock.unwrap_or(true),
            rating: input.rating,
            review_count: input.review_count,
            additional_data: input.additional_data,
        }
    }

    pub fn product_url(&self) -> &ProductUrl {
        &self.product_url
    }

    pub fn checked_at(&self) -> NaiveDateTime {
        self.checked_at
    }

    pub fn price(&self) -> Option<Price> {
        self.price
    }

    pub fn original_price(&self) -> Option<Price> {
        self.original_price
    }

    pub fn has_promotion(&self) -> bool {
        self.has_promotion
    }

    pub fn discount_percentage(&self) -> Option<i32> {
        self.discount_percentage
    }

    pub fn in_stock(&self) -> bool {
        self.in_stock
    }

    pub fn rating(&self) -> Option<Rating> {
        self.rating
    }

    pub fn review_count(&self) -> Option<ReviewCount> {
        self.review_count
    }

    pub fn additional_data(&self) -> &AdditionalData {
        &self.additional_data
    }
}

/// Whole-number discount, rounding halves up. Callers guarantee
/// `price < original`, so `original` is strictly positive.
fn discount_percentage(price: Price, original: Price) -> i32 {
    let ratio = (original.get() - price.get()) / original.get() * 100.0;
    ratio.round() as i32
}
