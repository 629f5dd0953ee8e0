use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::product::Product as DomainProduct;
use crate::domain::types::{ProductTitle, ProductUrl, TypeConstraintError};

/// Diesel model representing a row in the `products` table.
#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::products)]
#[diesel(primary_key(url))]
pub struct Product {
    pub url: String,
    pub title: String,
    pub removed_at: Option<NaiveDateTime>,
    pub last_checked: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

/// Insertable form of [`Product`] used by upserts.
#[derive(Insertable)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProduct<'a> {
    pub url: &'a str,
    pub title: &'a str,
    pub removed_at: Option<NaiveDateTime>,
    pub last_checked: NaiveDateTime,
    /// Ignored on conflict, so it keeps the time of first insertion.
    pub created_at: NaiveDateTime,
}

impl<'a> NewProduct<'a> {
    pub fn from_domain(product: &'a DomainProduct, checked_at: NaiveDateTime) -> Self {
        Self {
            url: product.url.as_str(),
            title: product.title.as_str(),
            removed_at: product.removed_at,
            last_checked: checked_at,
            created_at: checked_at,
        }
    }
}

impl TryFrom<Product> for DomainProduct {
    type Error = TypeConstraintError;

    fn try_from(product: Product) -> Result<Self, Self::Error> {
        Ok(Self {
            url: ProductUrl::new(product.url)?,
            title: ProductTitle::new(product.title)?,
            removed_at: product.removed_at,
        })
    }
}
