// ── Cache node ──
//
// One lazily fetched, explicitly overwritable value. The state lives in a
// `watch` channel so readers take cheap snapshots and waiters are woken by
// completion instead of polling.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{CacheError, CoreError};
use crate::stream::NodeStream;

/// Future returned by a node's fetch function.
pub type FetchFuture<T> = BoxFuture<'static, Result<T, CoreError>>;

pub(crate) type Fetcher<T> = Arc<dyn Fn() -> FetchFuture<T> + Send + Sync>;

/// Lifecycle of a cache node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum NodeStatus {
    /// Never read, never written.
    Uninitialized,
    /// First fetch in flight.
    Loading,
    /// Holds a value: fetched, written, or the default after a failure.
    Ready,
}

/// Point-in-time view of a cache node.
#[derive(Debug)]
pub struct NodeState<T> {
    pub status: NodeStatus,
    pub value: Arc<T>,
    /// Set when the most recent fetch failed; cleared by the next success
    /// or write.
    pub error: Option<CacheError>,
    /// Sequence number of the fetch or write that produced `value`.
    committed: u64,
}

impl<T> Clone for NodeState<T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            value: Arc::clone(&self.value),
            error: self.error.clone(),
            committed: self.committed,
        }
    }
}

impl<T> NodeState<T> {
    pub fn is_ready(&self) -> bool {
        self.status == NodeStatus::Ready
    }

    pub fn is_loading(&self) -> bool {
        self.status == NodeStatus::Loading
    }
}

/// A reactive cache cell for one server-fetched entity.
///
/// - [`ensure_loaded`](Self::ensure_loaded) fetches on first use and
///   shares the in-flight fetch with concurrent callers.
/// - [`get`](Self::get) is a synchronous read of whatever is cached.
/// - [`write`](Self::write) replaces the value without fetching.
/// - [`refresh`](Self::refresh) forces a new fetch.
///
/// Every fetch and write takes a sequence number; a fetch result is
/// committed only if nothing issued after it has committed first, so a
/// slow response never overwrites newer data. A failed first fetch
/// leaves the node `Ready` with its default value and `error` set.
pub struct CacheNode<T: Send + Sync + 'static> {
    inner: Arc<NodeInner<T>>,
}

impl<T: Send + Sync + 'static> Clone for CacheNode<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct NodeInner<T> {
    key: String,
    default: Arc<T>,
    fetcher: Fetcher<T>,
    state: watch::Sender<NodeState<T>>,
    /// Bumped on every state change; lets derived views watch nodes of
    /// different value types through one receiver type.
    version: watch::Sender<u64>,
    issued: AtomicU64,
}

impl<T: Default + Send + Sync + 'static> CacheNode<T> {
    /// Create a node whose default (and value after a failed first fetch)
    /// is `T::default()`.
    pub fn new<F, Fut>(key: impl Into<String>, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let fetcher: Fetcher<T> = Arc::new(move || fetch().boxed());
        Self::with_fetcher(key.into(), fetcher)
    }

    pub(crate) fn with_fetcher(key: String, fetcher: Fetcher<T>) -> Self {
        let default = Arc::new(T::default());
        let (state, _) = watch::channel(NodeState {
            status: NodeStatus::Uninitialized,
            value: Arc::clone(&default),
            error: None,
            committed: 0,
        });
        let (version, _) = watch::channel(0u64);

        Self {
            inner: Arc::new(NodeInner {
                key,
                default,
                fetcher,
                state,
                version,
                issued: AtomicU64::new(0),
            }),
        }
    }
}

impl<T: Send + Sync + 'static> CacheNode<T> {
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// The cached value (the default until something is loaded).
    pub fn get(&self) -> Arc<T> {
        Arc::clone(&self.inner.state.borrow().value)
    }

    pub fn snapshot(&self) -> NodeState<T> {
        self.inner.state.borrow().clone()
    }

    pub fn status(&self) -> NodeStatus {
        self.inner.state.borrow().status
    }

    pub fn error(&self) -> Option<CacheError> {
        self.inner.state.borrow().error.clone()
    }

    /// Return the value, fetching it first if the node was never loaded.
    ///
    /// Never fails: a failed fetch resolves to the default value and the
    /// failure is recorded in the node's `error`.
    pub async fn ensure_loaded(&self) -> Arc<T> {
        let mut start = None;
        self.inner.publish(|s| {
            if s.status == NodeStatus::Uninitialized {
                s.status = NodeStatus::Loading;
                start = Some(self.inner.next_seq());
                true
            } else {
                false
            }
        });

        if let Some(seq) = start {
            debug!(node = %self.inner.key, seq, "loading");
            // Detached: the fetch commits even if this caller goes away.
            drop(self.spawn_fetch(seq));
        }

        let mut rx = self.inner.state.subscribe();
        match rx.wait_for(NodeState::is_ready).await {
            Ok(state) => Arc::clone(&state.value),
            Err(_) => self.get(),
        }
    }

    /// Force a new fetch and wait for it.
    ///
    /// On failure the previous value is kept (or the default if there was
    /// none), `error` is set, and the error is returned.
    pub async fn refresh(&self) -> Result<Arc<T>, CacheError> {
        let seq = self.inner.next_seq();
        self.inner.publish(|s| {
            if s.status == NodeStatus::Uninitialized {
                s.status = NodeStatus::Loading;
                true
            } else {
                false
            }
        });
        debug!(node = %self.inner.key, seq, "refreshing");

        match self.spawn_fetch(seq).await {
            Ok(result) => result,
            Err(join_err) => {
                let err = CacheError {
                    message: format!("fetch task failed: {join_err}"),
                    status: None,
                };
                self.inner.fail(seq, &err);
                Err(err)
            }
        }
    }

    /// Replace the value without fetching. The node becomes `Ready` and
    /// any recorded error is cleared.
    pub fn write(&self, value: T) {
        let seq = self.inner.next_seq();
        let value = Arc::new(value);
        self.inner.publish(move |s| {
            s.committed = s.committed.max(seq);
            s.status = NodeStatus::Ready;
            s.value = value;
            s.error = None;
            true
        });
        debug!(node = %self.inner.key, seq, "written");
    }

    pub fn subscribe(&self) -> NodeStream<T> {
        NodeStream::new(self.inner.state.subscribe())
    }

    /// Type-erased change notifications for derived views.
    pub(crate) fn changes(&self) -> watch::Receiver<u64> {
        self.inner.version.subscribe()
    }

    fn spawn_fetch(&self, seq: u64) -> JoinHandle<Result<Arc<T>, CacheError>> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            // A panicking fetcher still has to settle the node.
            let fetch = AssertUnwindSafe(async { (inner.fetcher)().await });
            let result = fetch.catch_unwind().await.unwrap_or_else(|panic| {
                Err(CoreError::Internal(format!(
                    "fetch panicked: {}",
                    panic_message(panic.as_ref())
                )))
            });
            inner.commit(seq, result)
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

impl<T: Send + Sync + 'static> NodeInner<T> {
    fn next_seq(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn publish(&self, modify: impl FnOnce(&mut NodeState<T>) -> bool) -> bool {
        let modified = self.state.send_if_modified(modify);
        if modified {
            self.version.send_modify(|v| *v += 1);
        }
        modified
    }

    fn commit(&self, seq: u64, result: Result<T, CoreError>) -> Result<Arc<T>, CacheError> {
        match result {
            Ok(value) => {
                let value = Arc::new(value);
                let fresh = Arc::clone(&value);
                let applied = self.publish(move |s| {
                    if seq <= s.committed {
                        return false;
                    }
                    s.committed = seq;
                    s.status = NodeStatus::Ready;
                    s.value = fresh;
                    s.error = None;
                    true
                });
                if applied {
                    debug!(node = %self.key, seq, "fetched");
                    Ok(value)
                } else {
                    debug!(node = %self.key, seq, "dropping stale fetch result");
                    Ok(Arc::clone(&self.state.borrow().value))
                }
            }
            Err(err) => {
                let err = CacheError::from(&err);
                self.fail(seq, &err);
                Err(err)
            }
        }
    }

    /// Record a failed fetch. Failures never advance `committed`, so an
    /// earlier fetch that later succeeds still lands.
    fn fail(&self, seq: u64, err: &CacheError) {
        warn!(node = %self.key, error = %err, "fetch failed");
        let default = Arc::clone(&self.default);
        let err = err.clone();
        self.publish(move |s| {
            if seq <= s.committed {
                return false;
            }
            if s.status != NodeStatus::Ready {
                s.value = default;
            }
            s.status = NodeStatus::Ready;
            s.error = Some(err);
            true
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use tokio::sync::Notify;

    use super::*;

    fn counting_node(calls: &Arc<AtomicUsize>, value: Vec<u32>) -> CacheNode<Vec<u32>> {
        let calls = Arc::clone(calls);
        CacheNode::new("numbers", move || {
            let calls = Arc::clone(&calls);
            let value = value.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            }
        })
    }

    fn failing_node() -> CacheNode<Vec<u32>> {
        CacheNode::new("broken", || async {
            Err(CoreError::Api {
                message: "boom".into(),
                status: Some(500),
            })
        })
    }

    #[tokio::test]
    async fn starts_uninitialized_with_default() {
        let calls = Arc::new(AtomicUsize::new(0));
        let node = counting_node(&calls, vec![1]);
        assert_eq!(node.status(), NodeStatus::Uninitialized);
        assert!(node.get().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn repeated_reads_fetch_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let node = counting_node(&calls, vec![1, 2]);

        assert_eq!(*node.ensure_loaded().await, vec![1, 2]);
        assert_eq!(*node.ensure_loaded().await, vec![1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(node.status(), NodeStatus::Ready);
    }

    #[tokio::test]
    async fn concurrent_reads_share_the_in_flight_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let node = counting_node(&calls, vec![7]);

        let (a, b, c) = tokio::join!(node.ensure_loaded(), node.ensure_loaded(), node.ensure_loaded());
        for value in [a, b, c] {
            assert_eq!(*value, vec![7]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_fetch_resolves_to_default_and_ready() {
        let node = failing_node();

        let value = node.ensure_loaded().await;
        assert!(value.is_empty());

        let state = node.snapshot();
        assert_eq!(state.status, NodeStatus::Ready);
        let err = state.error.unwrap();
        assert_eq!(err.message, "boom");
        assert_eq!(err.status, Some(500));
    }

    #[tokio::test]
    async fn write_overwrites_and_clears_error() {
        let node = failing_node();
        node.ensure_loaded().await;
        assert!(node.error().is_some());

        node.write(vec![3]);
        assert_eq!(*node.get(), vec![3]);
        assert!(node.error().is_none());
        assert_eq!(node.status(), NodeStatus::Ready);
    }

    #[tokio::test]
    async fn write_before_first_read_skips_the_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let node = counting_node(&calls, vec![1]);

        node.write(vec![]);
        assert!(node.ensure_loaded().await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refresh_fetches_again() {
        let calls = Arc::new(AtomicUsize::new(0));
        let node = counting_node(&calls, vec![5]);

        node.ensure_loaded().await;
        let value = node.refresh().await.unwrap();
        assert_eq!(*value, vec![5]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn refresh_failure_keeps_last_known_good() {
        let node = failing_node();
        node.write(vec![1, 2, 3]);

        let err = node.refresh().await.unwrap_err();
        assert_eq!(err.status, Some(500));
        assert_eq!(*node.get(), vec![1, 2, 3]);
        assert_eq!(node.error(), Some(err));
    }

    #[tokio::test]
    async fn stale_fetch_does_not_overwrite_later_write() {
        let gate = Arc::new(Notify::new());
        let started = Arc::new(AtomicUsize::new(0));

        let node: CacheNode<Vec<u32>> = {
            let gate = Arc::clone(&gate);
            let started = Arc::clone(&started);
            CacheNode::new("slow", move || {
                let gate = Arc::clone(&gate);
                let started = Arc::clone(&started);
                async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    gate.notified().await;
                    Ok(vec![0])
                }
            })
        };

        let pending = {
            let node = node.clone();
            tokio::spawn(async move { node.refresh().await })
        };
        while started.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        node.write(vec![42]);
        gate.notify_one();

        let returned = pending.await.unwrap().unwrap();
        assert_eq!(*returned, vec![42]);
        assert_eq!(*node.get(), vec![42]);
    }

    #[tokio::test]
    async fn panicking_fetch_still_settles_the_node() {
        let node: CacheNode<Vec<u32>> = CacheNode::new("boom", || async { panic!("fetcher blew up") });

        let value = tokio::time::timeout(Duration::from_secs(2), node.ensure_loaded())
            .await
            .expect("ensure_loaded must not hang on a panicking fetch");
        assert!(value.is_empty());

        let state = node.snapshot();
        assert_eq!(state.status, NodeStatus::Ready);
        assert!(state.error.unwrap().message.contains("fetcher blew up"));

        let err = node.refresh().await.unwrap_err();
        assert!(err.message.contains("fetch panicked"));
        assert_eq!(node.status(), NodeStatus::Ready);
    }

    #[tokio::test]
    async fn later_refresh_wins_over_slower_earlier_one() {
        let gate = Arc::new(Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));

        // First call blocks on the gate and answers [1]; later calls answer [2] at once.
        let node: CacheNode<Vec<u32>> = {
            let gate = Arc::clone(&gate);
            let calls = Arc::clone(&calls);
            CacheNode::new("racing", move || {
                let gate = Arc::clone(&gate);
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 0 {
                        gate.notified().await;
                        Ok(vec![1])
                    } else {
                        Ok(vec![2])
                    }
                }
            })
        };

        let slow = {
            let node = node.clone();
            tokio::spawn(async move { node.refresh().await })
        };
        while calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let fast = node.refresh().await.unwrap();
        assert_eq!(*fast, vec![2]);

        gate.notify_one();
        let slow_returned = slow.await.unwrap().unwrap();
        assert_eq!(*slow_returned, vec![2]);
        assert_eq!(*node.get(), vec![2]);
        assert!(node.error().is_none());
    }

    #[tokio::test]
    async fn subscribers_see_load_completion() {
        let calls = Arc::new(AtomicUsize::new(0));
        let node = counting_node(&calls, vec![9]);
        let mut stream = node.subscribe();
        assert_eq!(stream.current().status, NodeStatus::Uninitialized);

        node.ensure_loaded().await;
        let latest = stream.latest();
        assert!(latest.is_ready());
        assert_eq!(*latest.value, vec![9]);

        node.write(vec![10]);
        let next = stream.changed().await.unwrap();
        assert_eq!(*next.value, vec![10]);
    }
}
