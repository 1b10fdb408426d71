// ── Derived views ──
//
// Read-only projections over one or more cache nodes. A view holds no
// value of its own: every read recomputes from the inputs' current
// snapshots and never triggers a fetch.

use std::sync::Arc;

use futures_util::future::select_all;
use tokio::sync::watch;

use super::node::CacheNode;

/// A recomputed-on-read view over cache nodes.
pub struct Derived<T> {
    name: &'static str,
    compute: Arc<dyn Fn() -> T + Send + Sync>,
    inputs: Vec<watch::Receiver<u64>>,
}

impl<T> Derived<T> {
    pub fn new(name: &'static str, compute: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            name,
            compute: Arc::new(compute),
            inputs: Vec::new(),
        }
    }

    /// Recompute whenever `node` changes.
    pub fn watching<U: Send + Sync + 'static>(mut self, node: &CacheNode<U>) -> Self {
        let mut rx = node.changes();
        rx.mark_unchanged();
        self.inputs.push(rx);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The view computed from the inputs as they are now.
    pub fn get(&self) -> T {
        (self.compute)()
    }

    /// Wait until any input changes, then return the recomputed view.
    ///
    /// Returns `None` if the view has no inputs or an input was dropped.
    pub async fn changed(&mut self) -> Option<T> {
        if self.inputs.is_empty() {
            return None;
        }
        let (result, _, _) =
            select_all(self.inputs.iter_mut().map(|rx| Box::pin(rx.changed()))).await;
        result.ok()?;

        // Several inputs may have moved at once; one recompute covers them all.
        for rx in &mut self.inputs {
            rx.mark_unchanged();
        }
        Some(self.get())
    }
}
