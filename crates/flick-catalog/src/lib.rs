//! Thin client for the TMDB v3 REST API.
//!
//! Every call is a single stateless request: no caching, no retry, and no
//! timeout beyond the HTTP client default. Any failure collapses into
//! [`CatalogError`].

mod client;
mod error;

pub use client::{CatalogConfig, TmdbClient};
pub use error::CatalogError;
