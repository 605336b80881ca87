//! The shell asset cache manager.
//!
//! Cached responses live under `<root>/<generation>/`, one metadata file
//! plus one body file per entry, keyed by a deterministic encoding of the
//! exact request URL. Superseded generations are directories with a
//! different version tag; `activate` deletes them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::net::{AssetFetcher, FetchedAsset};

/// Cache generation name prefix; the full name is `shell-<SHELL_VERSION>`.
const CACHE_PREFIX: &str = "shell";

/// Version tag of the current cache generation.
/// Must be bumped on every shell asset change; old generations are deleted
/// on activation and a stale asset is otherwise served indefinitely.
pub const SHELL_VERSION: &str = "v2";

/// Application shell paths, fetched verbatim at install time.
pub const SHELL_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/jadwal.html",
    "/style.css",
    "/script.js",
    "/manifest.json",
];

/// A response captured in the cache, keyed by its exact request URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedAsset {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub fetched_at: DateTime<Utc>,
    /// Body bytes live in the sibling `.bin` file, not the metadata JSON.
    #[serde(skip)]
    pub body: Vec<u8>,
}

impl CachedAsset {
    fn from_fetched(url: &str, fetched: FetchedAsset) -> Self {
        Self {
            url: url.to_string(),
            status: fetched.status,
            content_type: fetched.content_type,
            fetched_at: Utc::now(),
            body: fetched.body,
        }
    }
}

/// A request seen by the cache manager.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    pub method: Method,
    pub url: String,
    /// Page navigations fall back to the cached shell document when the
    /// network fails; other requests propagate the failure.
    pub navigate: bool,
}

impl AssetRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            navigate: false,
        }
    }

    pub fn navigation(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            navigate: true,
        }
    }
}

/// How an intercepted request was answered.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Served from the current cache generation, no freshness check.
    Cached(CachedAsset),
    /// Fetched from the network (stored when the status was exactly 200).
    Network(CachedAsset),
    /// Network failed on a navigation request; cached shell document served.
    Fallback(CachedAsset),
    /// Non-GET request, forwarded to the network untouched and never cached.
    Passthrough(CachedAsset),
    /// Non-http(s) request, left to default handling.
    Ignored,
}

#[derive(Debug)]
pub struct CacheStatus {
    pub generation: String,
    pub entries: usize,
    pub stale: Vec<String>,
}

pub struct AssetCache<F> {
    root: PathBuf,
    generation: String,
    origin: String,
    fetcher: F,
}

impl<F: AssetFetcher> AssetCache<F> {
    pub fn new(root: impl Into<PathBuf>, origin: impl Into<String>, fetcher: F) -> Self {
        Self {
            root: root.into(),
            generation: format!("{}-{}", CACHE_PREFIX, SHELL_VERSION),
            origin: origin.into().trim_end_matches('/').to_string(),
            fetcher,
        }
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    /// Shell manifest URLs, resolved against the configured origin.
    pub fn manifest(&self) -> Vec<String> {
        SHELL_ASSETS
            .iter()
            .map(|path| format!("{}{}", self.origin, path))
            .collect()
    }

    /// The document served when a navigation request fails offline.
    fn fallback_url(&self) -> String {
        format!("{}/index.html", self.origin)
    }

    fn generation_dir(&self) -> PathBuf {
        self.root.join(&self.generation)
    }

    fn entry_paths(&self, url: &str) -> (PathBuf, PathBuf) {
        let key = entry_key(url);
        let dir = self.generation_dir();
        (dir.join(format!("{key}.json")), dir.join(format!("{key}.bin")))
    }

    /// Populate the current generation with every manifest asset.
    ///
    /// All-or-nothing: any fetch failure (including a non-200 status)
    /// removes the partially-populated generation and fails the pass, so an
    /// incomplete shell can never activate. The caller may simply retry.
    pub async fn install(&self) -> Result<usize> {
        let manifest = self.manifest();
        let dir = self.generation_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache generation {}", self.generation))?;

        info!(generation = %self.generation, assets = manifest.len(), "Installing shell assets");
        for url in &manifest {
            match self.fetch_and_store(url).await {
                Ok(()) => debug!(url = %url, "Cached shell asset"),
                Err(e) => {
                    let _ = std::fs::remove_dir_all(&dir);
                    return Err(e).with_context(|| format!("Failed to cache shell asset {}", url));
                }
            }
        }
        Ok(manifest.len())
    }

    async fn fetch_and_store(&self, url: &str) -> Result<()> {
        let fetched = self.fetcher.fetch(Method::GET, url).await?;
        if fetched.status != 200 {
            anyhow::bail!("unexpected status {}", fetched.status);
        }
        self.store(&CachedAsset::from_fetched(url, fetched))
    }

    /// Delete every cache generation whose name does not carry the current
    /// version tag. Returns the deleted generation names.
    pub fn activate(&self) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        if !self.root.exists() {
            return Ok(deleted);
        }
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name != self.generation {
                info!(generation = %name, "Deleting stale cache generation");
                std::fs::remove_dir_all(entry.path())
                    .with_context(|| format!("Failed to delete stale generation {}", name))?;
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    /// Answer an intercepted request.
    ///
    /// Non-GET requests pass straight to the network; non-http(s) URLs are
    /// ignored. Otherwise: exact-match cache lookup, then network on a miss
    /// (storing only status-200 responses), then the cached shell document
    /// as a last resort for failed navigations.
    pub async fn fetch(&self, request: &AssetRequest) -> Result<FetchOutcome> {
        if request.method != Method::GET {
            let fetched = self.fetcher.fetch(request.method.clone(), &request.url).await?;
            return Ok(FetchOutcome::Passthrough(CachedAsset::from_fetched(
                &request.url,
                fetched,
            )));
        }
        if !request.url.starts_with("http://") && !request.url.starts_with("https://") {
            return Ok(FetchOutcome::Ignored);
        }

        if let Some(cached) = self.lookup(&request.url)? {
            debug!(url = %request.url, "Serving from cache");
            return Ok(FetchOutcome::Cached(cached));
        }

        debug!(url = %request.url, "Fetching from network");
        match self.fetcher.fetch(Method::GET, &request.url).await {
            Ok(fetched) => {
                let asset = CachedAsset::from_fetched(&request.url, fetched);
                if asset.status == 200 {
                    if let Err(e) = self.store(&asset) {
                        warn!(url = %request.url, error = %e, "Failed to store fetched asset");
                    }
                }
                Ok(FetchOutcome::Network(asset))
            }
            Err(e) => {
                if request.navigate {
                    if let Some(cached) = self.lookup(&self.fallback_url())? {
                        warn!(url = %request.url, error = %e, "Network failed, serving cached shell document");
                        return Ok(FetchOutcome::Fallback(cached));
                    }
                }
                Err(e).with_context(|| format!("Failed to fetch {}", request.url))
            }
        }
    }

    /// Exact-match lookup in the current generation.
    pub fn lookup(&self, url: &str) -> Result<Option<CachedAsset>> {
        let (meta_path, body_path) = self.entry_paths(url);
        if !meta_path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&meta_path)
            .with_context(|| format!("Failed to read cache entry for {}", url))?;
        let mut asset: CachedAsset = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache entry for {}", url))?;
        match std::fs::read(&body_path) {
            Ok(body) => asset.body = body,
            Err(e) => {
                // Metadata without a body is a broken entry, treat as a miss.
                warn!(url = %url, error = %e, "Cache entry has no body file");
                return Ok(None);
            }
        }
        Ok(Some(asset))
    }

    /// Store a captured response in the current generation. A second write
    /// to the same key overwrites (last write wins).
    pub fn store(&self, asset: &CachedAsset) -> Result<()> {
        std::fs::create_dir_all(self.generation_dir())?;
        let (meta_path, body_path) = self.entry_paths(&asset.url);
        std::fs::write(&meta_path, serde_json::to_string_pretty(asset)?)?;
        std::fs::write(&body_path, &asset.body)?;
        Ok(())
    }

    pub fn status(&self) -> Result<CacheStatus> {
        let dir = self.generation_dir();
        let entries = if dir.exists() {
            std::fs::read_dir(&dir)?
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                .count()
        } else {
            0
        };

        let mut stale = Vec::new();
        if self.root.exists() {
            for entry in std::fs::read_dir(&self.root)? {
                let entry = entry?;
                if entry.file_type()?.is_dir() {
                    let name = entry.file_name().to_string_lossy().to_string();
                    if name != self.generation {
                        stale.push(name);
                    }
                }
            }
        }

        Ok(CacheStatus {
            generation: self.generation.clone(),
            entries,
            stale,
        })
    }
}

/// Deterministic, injective, filesystem-safe encoding of a URL.
fn entry_key(url: &str) -> String {
    let mut key = String::with_capacity(url.len());
    for b in url.bytes() {
        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'-' | b'_' => key.push(b as char),
            _ => key.push_str(&format!("%{:02X}", b)),
        }
    }
    key
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    use crate::net::{AssetFetcher, FetchError};
    use async_trait::async_trait;

    const ORIGIN: &str = "http://app.test";

    /// Fake fetcher with canned responses and a network-call counter.
    /// Clone shares state, so tests keep a handle while the cache owns one.
    #[derive(Clone, Default)]
    struct FakeFetcher {
        responses: Arc<Mutex<HashMap<String, FetchedAsset>>>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeFetcher {
        fn respond(&self, url: &str, status: u16, body: &str) {
            self.responses.lock().unwrap().insert(
                url.to_string(),
                FetchedAsset {
                    status,
                    content_type: Some("text/plain".to_string()),
                    body: body.as_bytes().to_vec(),
                },
            );
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AssetFetcher for FakeFetcher {
        async fn fetch(&self, _method: Method, url: &str) -> Result<FetchedAsset, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Unavailable(url.to_string()))
        }
    }

    /// Fetcher with a 200 response for every shell asset.
    fn shell_fetcher() -> FakeFetcher {
        let fetcher = FakeFetcher::default();
        for path in SHELL_ASSETS {
            fetcher.respond(&format!("{}{}", ORIGIN, path), 200, &format!("body of {}", path));
        }
        fetcher
    }

    fn cache_at(dir: &TempDir, fetcher: FakeFetcher) -> AssetCache<FakeFetcher> {
        AssetCache::new(dir.path(), ORIGIN, fetcher)
    }

    #[tokio::test]
    async fn test_install_caches_every_manifest_url() {
        let dir = TempDir::new().unwrap();
        let fetcher = shell_fetcher();
        let cache = cache_at(&dir, fetcher.clone());

        let cached = cache.install().await.unwrap();
        assert_eq!(cached, SHELL_ASSETS.len());
        assert_eq!(fetcher.calls(), SHELL_ASSETS.len());

        for url in cache.manifest() {
            let entry = cache.lookup(&url).unwrap();
            assert!(entry.is_some(), "missing entry for {}", url);
            assert_eq!(entry.unwrap().status, 200);
        }
    }

    #[tokio::test]
    async fn test_install_is_all_or_nothing() {
        let dir = TempDir::new().unwrap();
        let fetcher = shell_fetcher();
        // One shell asset now 404s.
        fetcher.respond(&format!("{}/style.css", ORIGIN), 404, "gone");
        let cache = cache_at(&dir, fetcher);

        assert!(cache.install().await.is_err());
        assert!(!dir.path().join(cache.generation()).exists());
        assert_eq!(cache.status().unwrap().entries, 0);
    }

    #[tokio::test]
    async fn test_cached_fetch_never_reaches_network() {
        let dir = TempDir::new().unwrap();
        let fetcher = shell_fetcher();
        let cache = cache_at(&dir, fetcher.clone());
        cache.install().await.unwrap();
        let calls_after_install = fetcher.calls();

        let url = format!("{}/style.css", ORIGIN);
        for _ in 0..3 {
            let outcome = cache.fetch(&AssetRequest::get(&url)).await.unwrap();
            match outcome {
                FetchOutcome::Cached(asset) => {
                    assert_eq!(asset.body, b"body of /style.css");
                }
                other => panic!("expected cache hit, got {:?}", other),
            }
        }
        assert_eq!(fetcher.calls(), calls_after_install);
    }

    #[tokio::test]
    async fn test_miss_stores_200_then_serves_from_cache() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::default();
        let url = format!("{}/logo.png", ORIGIN);
        fetcher.respond(&url, 200, "png bytes");
        let cache = cache_at(&dir, fetcher.clone());

        let outcome = cache.fetch(&AssetRequest::get(&url)).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Network(_)));
        assert_eq!(fetcher.calls(), 1);

        let outcome = cache.fetch(&AssetRequest::get(&url)).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Cached(_)));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_non_200_responses_are_not_cached() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::default();
        let url = format!("{}/missing.css", ORIGIN);
        fetcher.respond(&url, 404, "not found");
        let cache = cache_at(&dir, fetcher.clone());

        let outcome = cache.fetch(&AssetRequest::get(&url)).await.unwrap();
        match outcome {
            FetchOutcome::Network(asset) => assert_eq!(asset.status, 404),
            other => panic!("expected network response, got {:?}", other),
        }
        assert!(cache.lookup(&url).unwrap().is_none());

        // Still a miss, so the network is consulted again.
        cache.fetch(&AssetRequest::get(&url)).await.unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_navigation_falls_back_to_shell_document() {
        let dir = TempDir::new().unwrap();
        let fetcher = shell_fetcher();
        let cache = cache_at(&dir, fetcher);
        cache.install().await.unwrap();

        let url = format!("{}/somewhere/else.html", ORIGIN);
        let outcome = cache.fetch(&AssetRequest::navigation(&url)).await.unwrap();
        match outcome {
            FetchOutcome::Fallback(asset) => {
                assert_eq!(asset.body, b"body of /index.html");
            }
            other => panic!("expected fallback, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_non_navigation_propagates() {
        let dir = TempDir::new().unwrap();
        let fetcher = shell_fetcher();
        let cache = cache_at(&dir, fetcher);
        cache.install().await.unwrap();

        let url = format!("{}/api/data.json", ORIGIN);
        assert!(cache.fetch(&AssetRequest::get(&url)).await.is_err());
    }

    #[tokio::test]
    async fn test_non_get_passes_through_uncached() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::default();
        let url = format!("{}/submit", ORIGIN);
        fetcher.respond(&url, 200, "ok");
        let cache = cache_at(&dir, fetcher.clone());

        let request = AssetRequest {
            method: Method::POST,
            url: url.clone(),
            navigate: false,
        };
        let outcome = cache.fetch(&request).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Passthrough(_)));
        assert_eq!(fetcher.calls(), 1);
        assert!(cache.lookup(&url).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_non_http_requests_are_ignored() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::default();
        let cache = cache_at(&dir, fetcher.clone());

        let outcome = cache
            .fetch(&AssetRequest::get("chrome-extension://abcdef/page.html"))
            .await
            .unwrap();
        assert!(matches!(outcome, FetchOutcome::Ignored));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_activate_deletes_stale_generations_only() {
        let dir = TempDir::new().unwrap();
        let stale_dir = dir.path().join("shell-v1");
        std::fs::create_dir_all(&stale_dir).unwrap();
        std::fs::write(stale_dir.join("old.json"), "{}").unwrap();

        let fetcher = shell_fetcher();
        let cache = cache_at(&dir, fetcher);
        cache.install().await.unwrap();

        let deleted = cache.activate().unwrap();
        assert_eq!(deleted, vec!["shell-v1".to_string()]);
        assert!(!stale_dir.exists());
        assert!(dir.path().join(cache.generation()).exists());

        let status = cache.status().unwrap();
        assert!(status.stale.is_empty());
        assert_eq!(status.entries, SHELL_ASSETS.len());
    }

    #[test]
    fn test_entry_key_is_filesystem_safe_and_distinct() {
        let a = entry_key("http://app.test/style.css");
        let b = entry_key("http://app.test/style.css?v=2");
        assert_ne!(a, b);
        for key in [&a, &b] {
            assert!(key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '%')));
        }
    }
}
