//! Lazy, write-through cache of detail records keyed by id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::api::DetailSource;
use crate::models::Record;

use super::entry::CacheEntry;

/// Detail records fetched on first use and kept until [`clear`](Self::clear).
///
/// The cache is an ordinary value: construct one per consumer group and
/// share it by `Arc`. Concurrent `get`s for the same missing id each fetch;
/// whichever settles last overwrites the entry. A failed fetch stores
/// nothing, so the next `get` tries again.
pub struct KeyedCache<R: Record> {
    source: Arc<dyn DetailSource<R>>,
    entries: Mutex<HashMap<R::Id, CacheEntry<R>>>,
}

impl<R: Record> KeyedCache<R> {
    pub fn new(source: Arc<dyn DetailSource<R>>) -> Self {
        Self {
            source,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<R::Id, CacheEntry<R>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the cached record for `id`, fetching it on a miss.
    /// `None` means the record could not be loaded.
    pub async fn get(&self, id: &R::Id) -> Option<R> {
        if let Some(record) = self.peek(id) {
            debug!(%id, "Cache hit");
            return Some(record);
        }

        debug!(%id, "Cache miss, fetching");
        match self.source.fetch_by_id(id).await {
            Ok(record) => {
                self.lock().insert(id.clone(), CacheEntry::new(record.clone()));
                Some(record)
            }
            Err(e) if e.is_not_found() => {
                debug!(%id, "Record not found");
                None
            }
            Err(e) => {
                warn!(%id, error = %e, "Failed to fetch record");
                None
            }
        }
    }

    /// The cached record for `id`, without fetching.
    pub fn peek(&self, id: &R::Id) -> Option<R> {
        self.lock().get(id).map(|entry| entry.record.clone())
    }

    /// Age label of the entry for `id`, if cached.
    pub fn age_display(&self, id: &R::Id) -> Option<String> {
        self.lock().get(id).map(CacheEntry::age_display)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop the entry for `id` so the next `get` fetches it again.
    pub fn invalidate(&self, id: &R::Id) -> bool {
        let removed = self.lock().remove(id).is_some();
        if removed {
            debug!(%id, "Invalidated cache entry");
        }
        removed
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut entries = self.lock();
        debug!(count = entries.len(), "Clearing cache");
        entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::models::{BookingRequest, BookingStatus, GalleryItem};
    use crate::testing::{booking, gallery_item, ScriptedSource};

    fn gallery_cache() -> (Arc<ScriptedSource<GalleryItem>>, KeyedCache<GalleryItem>) {
        let source = Arc::new(ScriptedSource::new());
        let cache = KeyedCache::new(source.clone() as Arc<dyn DetailSource<GalleryItem>>);
        (source, cache)
    }

    #[tokio::test]
    async fn test_get_fetches_then_reuses() {
        let (source, cache) = gallery_cache();
        source.insert_detail(gallery_item("w1"));

        let first = cache.get(&"w1".to_string()).await;
        let second = cache.get(&"w1".to_string()).await;

        assert_eq!(first, Some(gallery_item("w1")));
        assert_eq!(second, first);
        assert_eq!(source.detail_calls(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.age_display(&"w1".to_string()).as_deref(), Some("just now"));
    }

    #[tokio::test]
    async fn test_concurrent_gets_store_one_entry() {
        let (source, cache) = gallery_cache();
        let gate_one = source.gate_detail();
        let gate_two = source.gate_detail();
        let id = "w1".to_string();

        let first = cache.get(&id);
        let second = cache.get(&id);
        let release = async {
            tokio::task::yield_now().await;
            let mut older = gallery_item("w1");
            older.title = "older".to_string();
            gate_two.send(Ok(older)).unwrap();
            tokio::task::yield_now().await;
            gate_one.send(Ok(gallery_item("w1"))).unwrap();
        };
        let (first, second, ()) = futures::join!(first, second, release);

        assert!(first.is_some());
        assert!(second.is_some());
        assert!(source.detail_calls() <= 2);
        assert_eq!(cache.len(), 1);
        // Last write wins.
        assert_eq!(cache.peek(&id).unwrap().title, "Gallery w1");
    }

    #[tokio::test]
    async fn test_failure_stores_nothing_and_retries() {
        let (source, cache) = gallery_cache();
        let gate = source.gate_detail();
        gate.send(Err(ApiError::ServerError("timeout".into()))).unwrap();
        let id = "w2".to_string();

        assert_eq!(cache.get(&id).await, None);
        assert!(cache.is_empty());

        source.insert_detail(gallery_item("w2"));
        assert!(cache.get(&id).await.is_some());
        assert_eq!(source.detail_calls(), 2);
    }

    #[tokio::test]
    async fn test_not_found_is_none() {
        let (source, cache) = gallery_cache();
        assert_eq!(cache.get(&"missing".to_string()).await, None);
        assert!(cache.peek(&"missing".to_string()).is_none());
        assert_eq!(source.detail_calls(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_refetches_one_entry() {
        let source = Arc::new(ScriptedSource::<BookingRequest>::new());
        let cache = KeyedCache::new(source.clone() as Arc<dyn DetailSource<BookingRequest>>);
        source.insert_detail(booking(3, BookingStatus::Pending));
        source.insert_detail(booking(4, BookingStatus::Pending));
        cache.get(&3).await;
        cache.get(&4).await;

        assert!(cache.invalidate(&3));
        assert!(!cache.invalidate(&3));
        assert!(cache.peek(&3).is_none());
        assert!(cache.peek(&4).is_some());

        source.insert_detail(booking(3, BookingStatus::Approved));
        let refreshed = cache.get(&3).await.unwrap();
        assert_eq!(refreshed.status, BookingStatus::Approved);
        assert_eq!(source.detail_calls(), 3);
    }

    #[tokio::test]
    async fn test_clear_forces_refetch() {
        let source = Arc::new(ScriptedSource::<BookingRequest>::new());
        let cache = KeyedCache::new(source.clone() as Arc<dyn DetailSource<BookingRequest>>);
        source.insert_detail(booking(7, BookingStatus::Pending));

        cache.get(&7).await;
        cache.clear();
        assert!(cache.is_empty());
        cache.get(&7).await;

        assert_eq!(source.detail_calls(), 2);
        assert_eq!(cache.len(), 1);
    }
}
