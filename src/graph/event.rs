//! Graph change events and the observer seam.

/// Fine-grained notification of a single graph mutation.
///
/// Every mutating call emits its element-level events followed by one
/// [`GraphEvent::Changed`], in that order. Bulk loads collapse to a single
/// `Changed`. Events are dispatched after the graph lock is released, so an
/// observer may call straight back into the graph it is watching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEvent<K> {
    NodeAdded(K),
    NodeModified(K),
    NodeRemoved(K),
    EdgeAdded(K, K),
    EdgeModified(K, K),
    EdgeRemoved(K, K),
    /// Something changed. Always the last event of a mutation.
    Changed,
}

/// Callback seam for graph mutations.
///
/// Observers are notified synchronously, in subscription order, on the thread
/// that performed the mutation.
pub trait GraphObserver<K>: Send + Sync {
    fn on_graph_event(&self, event: &GraphEvent<K>);
}

/// Any `Fn(&GraphEvent<K>)` closure is an observer.
impl<K, F> GraphObserver<K> for F
where
    F: Fn(&GraphEvent<K>) + Send + Sync,
{
    fn on_graph_event(&self, event: &GraphEvent<K>) {
        self(event)
    }
}
