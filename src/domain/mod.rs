//! Catalog domain: product identities, observations and their value objects.

pub mod observation;
pub mod product;
pub mod types;
