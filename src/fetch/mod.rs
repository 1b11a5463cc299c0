// src/fetch/mod.rs
// =============================================================================
// Everything needed to download a target page.
//
// Submodules:
// - dns: primary/fallback DNS resolver plugged into reqwest
// - http: the configured client and the fetch call
// - error: the failure taxonomy (TLS, timeout, connect, status, ...)
// =============================================================================

mod dns;
mod error;
mod http;

pub use error::FetchError;
pub use http::{FetchConfig, Fetcher};
