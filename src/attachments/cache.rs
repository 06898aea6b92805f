//! Lazy attachment content fetch with an in-memory cache.
//!
//! Content is fetched on first request and cached per
//! (message_id, attachment_id). Concurrent first requests for the same
//! key may each trigger a fetch; last writer wins, and since content for
//! a given key never changes the duplicate work is harmless.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::capability::AttachmentFetcher;
use crate::error::AttachmentError;
use crate::message::model::AttachmentRef;

/// Caching front for an [`AttachmentFetcher`].
pub struct AttachmentStore {
    fetcher: Arc<dyn AttachmentFetcher>,
    cache: Mutex<HashMap<(String, String), String>>,
}

impl AttachmentStore {
    pub fn new(fetcher: Arc<dyn AttachmentFetcher>) -> Self {
        Self {
            fetcher,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Base64 content for an attachment, from cache or the backing fetcher.
    pub async fn get_content(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<String, AttachmentError> {
        let key = (message_id.to_string(), attachment_id.to_string());
        if let Some(hit) = self.cache.lock().unwrap().get(&key) {
            debug!(message_id, attachment_id, "Attachment cache hit");
            return Ok(hit.clone());
        }

        // Fetch happens outside the lock so a slow backend never blocks
        // cache hits for other keys.
        let content = self
            .fetcher
            .fetch_content(message_id, attachment_id)
            .await
            .map_err(|e| AttachmentError::FetchFailed {
                message_id: message_id.to_string(),
                attachment_id: attachment_id.to_string(),
                reason: e.to_string(),
            })?;

        info!(message_id, attachment_id, size = content.len(), "Fetched attachment content");
        self.cache
            .lock()
            .unwrap()
            .insert(key, content.clone());
        Ok(content)
    }

    /// Resolve an attachment reference to its content.
    ///
    /// Inline content wins; otherwise both fetch keys must be present.
    pub async fn resolve(&self, attachment: &AttachmentRef) -> Result<String, AttachmentError> {
        if let Some(content) = &attachment.content {
            return Ok(content.clone());
        }
        let (Some(message_id), Some(attachment_id)) =
            (&attachment.message_id, &attachment.attachment_id)
        else {
            return Err(AttachmentError::MissingFetchKey);
        };
        self.get_content(message_id, attachment_id).await
    }

    #[cfg(test)]
    fn cached_entries(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::FetchError;

    struct CountingFetcher {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl AttachmentFetcher for CountingFetcher {
        async fn fetch_content(
            &self,
            message_id: &str,
            attachment_id: &str,
        ) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::NotFound {
                    message_id: message_id.to_string(),
                });
            }
            Ok(format!("content-{message_id}-{attachment_id}"))
        }
    }

    fn store(fail: bool) -> (AttachmentStore, Arc<CountingFetcher>) {
        let fetcher = Arc::new(CountingFetcher { calls: AtomicUsize::new(0), fail });
        let store = AttachmentStore::new(Arc::clone(&fetcher) as Arc<dyn AttachmentFetcher>);
        (store, fetcher)
    }

    #[tokio::test]
    async fn second_request_is_served_from_cache() {
        let (store, fetcher) = store(false);
        let a = store.get_content("m1", "a1").await.unwrap();
        let b = store.get_content("m1", "a1").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_keys_are_cached_separately() {
        let (store, fetcher) = store(false);
        store.get_content("m1", "a1").await.unwrap();
        store.get_content("m1", "a2").await.unwrap();
        store.get_content("m2", "a1").await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.cached_entries(), 3);
    }

    #[tokio::test]
    async fn fetch_error_is_not_cached() {
        let (store, fetcher) = store(true);
        assert!(store.get_content("m1", "a1").await.is_err());
        assert!(store.get_content("m1", "a1").await.is_err());
        // A failed fetch is retried on the next request.
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.cached_entries(), 0);
    }

    #[tokio::test]
    async fn resolve_prefers_inline_content() {
        let (store, fetcher) = store(false);
        let att = AttachmentRef {
            content: Some("aGVsbG8=".into()),
            message_id: Some("m1".into()),
            attachment_id: Some("a1".into()),
            ..AttachmentRef::default()
        };
        assert_eq!(store.resolve(&att).await.unwrap(), "aGVsbG8=");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resolve_without_keys_is_an_error() {
        let (store, _) = store(false);
        let att = AttachmentRef::default();
        assert!(matches!(
            store.resolve(&att).await,
            Err(AttachmentError::MissingFetchKey)
        ));
    }
}
