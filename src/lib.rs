//! Core library exports for the catalog tracker.
//!
//! This crate exposes the domain types, the SQLite catalog store, the scraper
//! port and the pipeline that reconciles a storefront homepage with the
//! stored catalog.

#[cfg(feature = "data")]
pub mod db;
#[cfg(feature = "data")]
pub mod domain;
#[cfg(feature = "data")]
pub mod models;
#[cfg(feature = "data")]
pub mod repository;
#[cfg(feature = "data")]
pub mod schema;
#[cfg(feature = "data")]
pub mod scraper;
#[cfg(feature = "data")]
pub mod services;
