//! Offline shell asset caching.
//!
//! This module provides the `AssetCache`, which keeps the application shell
//! available without network under version-tagged cache generations:
//!
//! - install: fetch and store every manifest asset, all-or-nothing
//! - activate: delete every generation with a stale version tag
//! - fetch: cache-first with network fallback for intercepted requests
//!
//! Bumping `SHELL_VERSION` is the only invalidation mechanism; there is no
//! per-asset expiry or revalidation.

pub mod manager;

pub use manager::{
    AssetCache, AssetRequest, CacheStatus, CachedAsset, FetchOutcome, SHELL_ASSETS, SHELL_VERSION,
};
