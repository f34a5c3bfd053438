//! Lock-wrapped graph handle for callers that share one graph across threads.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::export::GraphSnapshot;
use super::RelationshipGraph;

/// Cloneable handle to one [`RelationshipGraph`].
///
/// Readers run in parallel, writers are exclusive. For long analytics,
/// take a [`snapshot`](Self::snapshot) or clone the graph out rather than
/// holding the read guard, so ingestion is not blocked.
#[derive(Debug, Clone, Default)]
pub struct SharedGraph {
    inner: Arc<RwLock<RelationshipGraph>>,
}

impl SharedGraph {
    pub fn new(graph: RelationshipGraph) -> Self {
        Self { inner: Arc::new(RwLock::new(graph)) }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, RelationshipGraph> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, RelationshipGraph> {
        self.inner.write()
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        self.inner.read().snapshot()
    }

    /// Detached copy of the current graph.
    pub fn clone_graph(&self) -> RelationshipGraph {
        self.inner.read().clone()
    }
}

impl From<RelationshipGraph> for SharedGraph {
    fn from(graph: RelationshipGraph) -> Self {
        Self::new(graph)
    }
}
