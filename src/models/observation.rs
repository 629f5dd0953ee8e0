use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::observation::{AdditionalData, Observation as DomainObservation};
use crate::domain::types::{Price, ProductUrl, Rating, ReviewCount};
use crate::repository::errors::RepositoryError;

/// Diesel model representing a row in the `product_checks` table.
#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::product_checks)]
pub struct Observation {
    pub id: i32,
    pub product_url: String,
    pub checked_at: NaiveDateTime,
    pub price: Option<f64>,
    pub original_price: Option<f64>,
    pub has_promotion: bool,
    pub discount_percentage: Option<i32>,
    pub in_stock: bool,
    pub rating: Option<f64>,
    pub review_count: Option<i32>,
    /// JSON object text.
    pub additional_data: String,
}

/// Insertable form of [`Observation`]; `additional_data` is already serialized.
#[derive(Insertable)]
#[diesel(table_name = crate::schema::product_checks)]
pub struct NewObservation<'a> {
    pub product_url: &'a str,
    pub checked_at: NaiveDateTime,
    pub price: Option<f64>,
    pub original_price: Option<f64>,
    pub has_promotion: bool,
    pub discount_percentage: Option<i32>,
    pub in_stock: bool,
    pub rating: Option<f64>,
    pub review_count: Option<i32>,
    pub additional_data: String,
}

impl<'a> TryFrom<&'a DomainObservation> for NewObservation<'a> {
    type Error = serde_json::Error;

    fn try_from(observation: &'a DomainObservation) -> Result<Self, Self::Error> {
        Ok(Self {
            product_url: observation.product_url().as_str(),
            checked_at: observation.checked_at(),
            price: observation.price().map(Price::get),
            original_price: observation.original_price().map(Price::get),
            has_promotion: observation.has_promotion(),
            discount_percentage: observation.discount_percentage(),
            in_stock: observation.in_stock(),
            rating: observation.rating().map(Rating::get),
            review_count: observation.review_count().map(ReviewCount::get),
            additional_data: serde_json::to_string(observation.additional_data())?,
        })
    }
}

impl TryFrom<Observation> for DomainObservation {
    type Error = RepositoryError;

    fn try_from(row: Observation) -> Result<Self, Self::Error> {
        let additional_data: AdditionalData = serde_json::from_str(&row.additional_data)?;

        Ok(Self {
            product_url: ProductUrl::new(row.product_url)?,
            checked_at: row.checked_at,
            price: row.price.map(Price::new).transpose()?,
            original_price: row.original_price.map(Price::new).transpose()?,
            has_promotion: row.has_promotion,
            discount_percentage: row.discount_percentage,
            in_stock: row.in_stock,
            rating: row.rating.map(Rating::new).transpose()?,
            review_count: row.review_count.map(ReviewCount::new).transpose()?,
            additional_data,
        })
    }
}
