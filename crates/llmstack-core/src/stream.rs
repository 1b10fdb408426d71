// ── Node subscriptions ──
//
// A consumer that declared interest in a cache node holds a `NodeStream`.
// It sees the node move Uninitialized -> Loading -> Ready and every later
// write, refresh or failure as whole-state snapshots.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::NodeState;

/// Interest in one cache node.
///
/// `current` is the state this subscriber has acknowledged and only moves
/// when `changed` returns. `latest` peeks at the node without acknowledging,
/// so it can run ahead of `current`. Intermediate states are coalesced: a
/// slow subscriber sees the newest state, not every step.
pub struct NodeStream<T: Send + Sync + 'static> {
    seen: NodeState<T>,
    receiver: watch::Receiver<NodeState<T>>,
}

impl<T: Send + Sync + 'static> NodeStream<T> {
    pub(crate) fn new(mut receiver: watch::Receiver<NodeState<T>>) -> Self {
        let seen = receiver.borrow_and_update().clone();
        Self { seen, receiver }
    }

    /// Last acknowledged state: at subscription, or from the last `changed`.
    pub fn current(&self) -> &NodeState<T> {
        &self.seen
    }

    /// The node's state right now. Does not acknowledge it.
    pub fn latest(&self) -> NodeState<T> {
        self.receiver.borrow().clone()
    }

    /// Wait until the node commits something this subscriber has not seen.
    ///
    /// Stale fetch results dropped by the node do not wake it. `None` once
    /// the node itself is gone.
    pub async fn changed(&mut self) -> Option<NodeState<T>> {
        self.receiver.changed().await.ok()?;
        self.seen = self.receiver.borrow_and_update().clone();
        Some(self.seen.clone())
    }

    pub fn into_stream(self) -> NodeWatchStream<T> {
        NodeWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// [`NodeStream`] as a `Stream`: the node's state at conversion, then one
/// item per committed change.
pub struct NodeWatchStream<T: Send + Sync + 'static> {
    inner: WatchStream<NodeState<T>>,
}

impl<T: Send + Sync + 'static> Stream for NodeWatchStream<T> {
    type Item = NodeState<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio_stream::StreamExt;

    use crate::store::{CacheNode, NodeStatus};

    fn node() -> CacheNode<Vec<u32>> {
        CacheNode::new("numbers", || async { Ok(vec![1]) })
    }

    #[tokio::test]
    async fn latest_runs_ahead_of_current_until_changed() {
        let node = node();
        let mut sub = node.subscribe();

        node.write(vec![2]);
        assert_eq!(sub.current().status, NodeStatus::Uninitialized);
        assert_eq!(*sub.latest().value, vec![2]);

        let seen = sub.changed().await.unwrap();
        assert_eq!(*seen.value, vec![2]);
        assert_eq!(*sub.current().value, vec![2]);
    }

    #[tokio::test]
    async fn stream_yields_state_at_conversion_then_commits() {
        let node = node();
        node.write(vec![3]);
        let mut stream = node.subscribe().into_stream();

        assert_eq!(*stream.next().await.unwrap().value, vec![3]);
        node.write(vec![4]);
        assert_eq!(*stream.next().await.unwrap().value, vec![4]);
    }
}
