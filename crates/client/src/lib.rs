//! Client code for shellcache.
//!
//! This crate provides the HTTP fetch pipeline the worker uses to reach the
//! network, and the `Fetcher` trait seam the operation handlers consume.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, FetchedResponse, Fetcher, classify, resolve};

// Re-exported so downstream code (and test doubles) can build and inspect
// responses without depending on the HTTP stack directly.
pub use bytes::Bytes;
pub use reqwest::{StatusCode, Url, header::HeaderMap};
