// ── Parameterized cache family ──
//
// A keyed set of cache nodes (one per app UUID, store slug, share code...).
// Each entry is created on first use and then lives independently.

use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use futures_util::FutureExt;
use uuid::Uuid;

use super::node::{CacheNode, FetchFuture, Fetcher, NodeState};
use crate::error::{CacheError, CoreError};
use crate::stream::NodeStream;

/// An external identifier a family can be keyed by.
pub trait FamilyKey: Eq + Hash + Clone + Display + Send + Sync + 'static {
    /// A blank key reads like a missing one: default value, no fetch.
    fn is_blank(&self) -> bool {
        false
    }
}

impl FamilyKey for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl FamilyKey for Uuid {
    fn is_blank(&self) -> bool {
        self.is_nil()
    }
}

type KeyedFetcher<K, T> = Arc<dyn Fn(&K) -> FetchFuture<T> + Send + Sync>;

/// A family of [`CacheNode`]s keyed by an external identifier.
///
/// Reading one key never fetches, writes or evicts another. A `None` or
/// blank key (an identifier the caller does not have yet) resolves to the
/// default without touching the network.
pub struct CacheFamily<K, T>
where
    K: FamilyKey,
    T: Default + Send + Sync + 'static,
{
    name: &'static str,
    nodes: DashMap<K, CacheNode<T>>,
    fetch: KeyedFetcher<K, T>,
    default: Arc<T>,
}

impl<K, T> CacheFamily<K, T>
where
    K: FamilyKey,
    T: Default + Send + Sync + 'static,
{
    pub fn new<F, Fut>(name: &'static str, fetch: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let fetch: KeyedFetcher<K, T> = Arc::new(move |key: &K| fetch(key.clone()).boxed());
        Self {
            name,
            nodes: DashMap::new(),
            fetch,
            default: Arc::new(T::default()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The node for `key`, created (uninitialized) if absent.
    pub fn node(&self, key: &K) -> CacheNode<T> {
        if let Some(node) = self.nodes.get(key) {
            return node.value().clone();
        }
        self.nodes
            .entry(key.clone())
            .or_insert_with(|| {
                let fetch = Arc::clone(&self.fetch);
                let owned = key.clone();
                let fetcher: Fetcher<T> = Arc::new(move || fetch(&owned));
                CacheNode::with_fetcher(format!("{}[{key}]", self.name), fetcher)
            })
            .value()
            .clone()
    }

    /// Load the entry for `key`, fetching on first use.
    pub async fn ensure_loaded(&self, key: Option<&K>) -> Arc<T> {
        match key {
            Some(key) if !key.is_blank() => self.node(key).ensure_loaded().await,
            _ => Arc::clone(&self.default),
        }
    }

    /// Cached value for `key`, or the default if it was never loaded.
    pub fn get(&self, key: &K) -> Arc<T> {
        self.nodes
            .get(key)
            .map_or_else(|| Arc::clone(&self.default), |node| node.value().get())
    }

    pub fn snapshot(&self, key: &K) -> Option<NodeState<T>> {
        self.nodes.get(key).map(|node| node.value().snapshot())
    }

    /// Seed or overwrite one entry without fetching.
    pub fn set(&self, key: &K, value: T) {
        self.node(key).write(value);
    }

    pub async fn refresh(&self, key: &K) -> Result<Arc<T>, CacheError> {
        self.node(key).refresh().await
    }

    /// Refresh `key` only if the entry exists. Returns `None` otherwise.
    pub async fn refresh_if_present(&self, key: &K) -> Option<Result<Arc<T>, CacheError>> {
        let node = self.nodes.get(key).map(|node| node.value().clone())?;
        Some(node.refresh().await)
    }

    /// Drop the entry for `key`; the next read fetches it again.
    pub fn evict(&self, key: &K) -> bool {
        self.nodes.remove(key).is_some()
    }

    pub fn subscribe(&self, key: &K) -> NodeStream<T> {
        self.node(key).subscribe()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::store::NodeStatus;

    fn family(calls: &Arc<AtomicUsize>) -> CacheFamily<String, String> {
        let calls = Arc::clone(calls);
        CacheFamily::new("store_app", move |slug: String| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if slug == "missing" {
                    Err(CoreError::NotFound {
                        message: "No StoreApp matches the given query.".into(),
                    })
                } else {
                    Ok(format!("app:{slug}"))
                }
            }
        })
    }

    #[tokio::test]
    async fn none_key_returns_default_without_fetching() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fam = family(&calls);

        let value = fam.ensure_loaded(None).await;
        assert!(value.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(fam.is_empty());
    }

    #[tokio::test]
    async fn blank_key_reads_like_none() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fam = family(&calls);

        assert!(fam.ensure_loaded(Some(&String::new())).await.is_empty());
        assert!(fam.ensure_loaded(Some(&"  ".to_string())).await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(fam.is_empty());
    }

    #[test]
    fn nil_uuid_is_blank() {
        assert!(Uuid::nil().is_blank());
        assert!(!Uuid::from_u128(7).is_blank());
    }

    #[tokio::test]
    async fn each_key_fetches_once_and_independently() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fam = family(&calls);
        let a = "a".to_string();
        let b = "b".to_string();

        assert_eq!(*fam.ensure_loaded(Some(&a)).await, "app:a");
        assert_eq!(*fam.ensure_loaded(Some(&a)).await, "app:a");
        assert_eq!(*fam.ensure_loaded(Some(&b)).await, "app:b");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(fam.len(), 2);
    }

    #[tokio::test]
    async fn set_is_idempotent_and_skips_network() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fam = family(&calls);
        let key = "slug-x".to_string();

        fam.set(&key, "V".into());
        fam.set(&key, "V".into());
        assert_eq!(*fam.ensure_loaded(Some(&key)).await, "V");
        assert_eq!(*fam.get(&key), "V");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn set_does_not_touch_other_keys() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fam = family(&calls);
        let a = "a".to_string();
        let b = "b".to_string();

        fam.ensure_loaded(Some(&a)).await;
        fam.set(&b, "seeded".into());
        assert_eq!(*fam.get(&a), "app:a");
        assert_eq!(*fam.get(&b), "seeded");
    }

    #[tokio::test]
    async fn failed_key_is_ready_with_default_and_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fam = family(&calls);
        let key = "missing".to_string();

        let value = fam.ensure_loaded(Some(&key)).await;
        assert!(value.is_empty());

        let state = fam.snapshot(&key).unwrap();
        assert_eq!(state.status, NodeStatus::Ready);
        assert_eq!(state.error.unwrap().status, Some(404));
    }

    #[tokio::test]
    async fn evict_forces_a_new_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fam = family(&calls);
        let key = "a".to_string();

        fam.ensure_loaded(Some(&key)).await;
        assert!(fam.evict(&key));
        assert!(!fam.contains(&key));
        assert!(fam.get(&key).is_empty());

        fam.ensure_loaded(Some(&key)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn refresh_if_present_ignores_unknown_keys() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fam = family(&calls);

        assert!(fam.refresh_if_present(&"nope".to_string()).await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(fam.is_empty());
    }
}
