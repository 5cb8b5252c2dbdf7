//! Network boundary for pwa-cache.
//!
//! This crate provides the request/response types the worker exchanges with
//! the network, the `Network` trait the strategies fetch through, and the
//! reqwest-backed client used in production.

pub mod fetch;

pub use fetch::{
    CacheMode, FetchClient, FetchConfig, FetchError, FetchRequest, FetchResponse, HeaderMap, Method, Network, StatusCode,
    UrlError, canonicalize, headers, resolve,
};
