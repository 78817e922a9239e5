//! Parked nodes awaiting reuse, keyed by geometry.

use std::collections::HashMap;

use crate::assets::GeometryHandle;
use crate::scene::NodeKey;

/// Inactive nodes kept for the next import.
#[derive(Debug, Clone, Default)]
pub struct NodePool {
    parked: HashMap<GeometryHandle, Vec<NodeKey>>,
}

impl NodePool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Park `key` under `geometry`.
    pub fn park(&mut self, geometry: GeometryHandle, key: NodeKey) {
        self.parked.entry(geometry).or_default().push(key);
    }

    /// Take a parked node with the same geometry, oldest first.
    pub fn take(&mut self, geometry: &GeometryHandle) -> Option<NodeKey> {
        let keys = self.parked.get_mut(geometry)?;
        let key = if keys.is_empty() { None } else { Some(keys.remove(0)) };
        if keys.is_empty() {
            self.parked.remove(geometry);
        }
        key
    }

    /// Number of parked nodes.
    pub fn len(&self) -> usize {
        self.parked.values().map(Vec::len).sum()
    }

    /// Whether nothing is parked.
    pub fn is_empty(&self) -> bool {
        self.parked.is_empty()
    }

    /// Remove and return every parked key.
    pub fn drain(&mut self) -> Vec<NodeKey> {
        self.parked.drain().flat_map(|(_, keys)| keys).collect()
    }
}
