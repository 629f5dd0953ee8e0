//! Diesel row types, their conversions into domain types, and settings.

pub mod config;
pub mod observation;
pub mod product;
