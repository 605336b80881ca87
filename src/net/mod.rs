//! Network layer for the asset cache.
//!
//! The `AssetFetcher` trait is the seam between the cache manager and the
//! network: production code uses the reqwest-backed `HttpFetcher`, tests
//! substitute a counting fake.

pub mod fetcher;

pub use fetcher::{AssetFetcher, FetchError, FetchedAsset, HttpFetcher};
