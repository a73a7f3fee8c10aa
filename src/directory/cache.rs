use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::time::interval;
use tracing::{debug, info, instrument};

use super::types::DirectoryPage;
use crate::shared::AppError;

/// Default page TTL. Tens of minutes, not hours: staleness inside this
/// window is an accepted tradeoff.
pub const DEFAULT_PAGE_TTL: Duration = Duration::from_secs(15 * 60);

struct CacheEntry {
    page: DirectoryPage,
    expires_at: Instant,
}

/// Typed TTL cache for directory pages. Entries are keyed by the full
/// filter tuple plus page coordinates; every Store mutation clears the
/// whole cache, since pages are cross-guardian aggregates. Best-effort:
/// a miss always falls back to recomputation.
pub struct PageCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_PAGE_TTL)
    }

    /// Returns the cached page for `key`, or runs `compute` and stores the
    /// result under the configured TTL
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        compute: F,
    ) -> Result<DirectoryPage, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<DirectoryPage, AppError>>,
    {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(key) {
                if entry.expires_at > Instant::now() {
                    debug!(key, "Directory page cache hit");
                    return Ok(entry.page.clone());
                }
            }
        }

        debug!(key, "Directory page cache miss, recomputing");
        let page = compute().await?;
        self.insert(key, page.clone()).await;
        Ok(page)
    }

    pub async fn insert(&self, key: &str, page: DirectoryPage) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                page,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drops every cached page. Wired to the Store's mutation methods.
    #[instrument(skip(self))]
    pub async fn invalidate_all(&self) {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        if dropped > 0 {
            debug!(dropped, "Directory page cache invalidated");
        }
    }

    /// Evicts entries past their TTL; returns how many were dropped
    pub async fn sweep_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Starts the background task that periodically evicts expired pages
#[instrument(skip(cache))]
pub async fn start_cache_sweep_task(cache: Arc<PageCache>, sweep_interval: Duration) {
    info!(
        sweep_interval_secs = sweep_interval.as_secs(),
        "Starting directory cache sweep task"
    );

    let mut sweep = interval(sweep_interval);

    loop {
        sweep.tick().await;
        let dropped = cache.sweep_expired().await;
        if dropped > 0 {
            info!(dropped, "Swept expired directory pages");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_page() -> DirectoryPage {
        DirectoryPage {
            page_number: 1,
            page_size: 20,
            total_items: 0,
            total_pages: 0,
            truncated: false,
            entries: Vec::new(),
        }
    }

    #[tokio::test]
    async fn computes_once_within_ttl() {
        let cache = PageCache::new(Duration::from_secs(60));
        let mut computes = 0;

        for _ in 0..3 {
            cache
                .get_or_compute("key", || {
                    computes += 1;
                    async { Ok(empty_page()) }
                })
                .await
                .unwrap();
        }

        assert_eq!(computes, 1);
    }

    #[tokio::test]
    async fn expired_entry_is_recomputed() {
        let cache = PageCache::new(Duration::from_millis(5));

        let mut computes = 0;
        cache
            .get_or_compute("key", || {
                computes += 1;
                async { Ok(empty_page()) }
            })
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;

        cache
            .get_or_compute("key", || {
                computes += 1;
                async { Ok(empty_page()) }
            })
            .await
            .unwrap();

        assert_eq!(computes, 2);
    }

    #[tokio::test]
    async fn invalidate_all_forces_recomputation() {
        let cache = PageCache::new(Duration::from_secs(60));

        cache
            .get_or_compute("key", || async { Ok(empty_page()) })
            .await
            .unwrap();
        assert_eq!(cache.len().await, 1);

        cache.invalidate_all().await;
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn sweep_drops_only_expired_entries() {
        let cache = PageCache::new(Duration::from_millis(5));
        cache.insert("old", empty_page()).await;

        tokio::time::sleep(Duration::from_millis(10)).await;

        cache.insert("fresh", empty_page()).await;

        let dropped = cache.sweep_expired().await;
        assert_eq!(dropped, 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn distinct_keys_are_cached_independently() {
        let cache = PageCache::new(Duration::from_secs(60));
        let mut computes = 0;

        for key in ["a", "b", "a"] {
            cache
                .get_or_compute(key, || {
                    computes += 1;
                    async { Ok(empty_page()) }
                })
                .await
                .unwrap();
        }

        assert_eq!(computes, 2);
    }
}
