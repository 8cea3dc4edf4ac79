//! Ordered, id-addressed storage for committed layers.

use std::sync::atomic::{AtomicU32, Ordering};

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use crate::scene::layer::{Layer, LayerMeta};

new_key_type! {
    pub struct LayerKey;
}

/// Owns every committed layer.
///
/// Layers live in a slotmap keyed by [`LayerKey`]; a parallel order vector
/// preserves insertion order for `meta()` and iteration, and a string map
/// resolves the public `layer-N` ids. Ids come from a monotonic counter and
/// are never reused, even after removal.
#[derive(Debug, Default)]
pub struct LayerStore {
    layers: SlotMap<LayerKey, Layer>,
    order: Vec<LayerKey>,
    by_id: FxHashMap<String, LayerKey>,
    next_id: AtomicU32,
}

impl LayerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the next `layer-N` id.
    pub fn next_layer_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("layer-{n}")
    }

    /// Commits a layer. The layer becomes visible to `meta()` and `get()`
    /// atomically with this call.
    pub fn insert(&mut self, layer: Layer) {
        let id = layer.id.clone();
        let key = self.layers.insert(layer);
        self.order.push(key);
        self.by_id.insert(id, key);
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.by_id.get(id).and_then(|key| self.layers.get(*key))
    }

    /// Removes a layer, returning it if it existed.
    pub fn remove(&mut self, id: &str) -> Option<Layer> {
        let Some(key) = self.by_id.remove(id) else {
            log::warn!("attempted to remove unknown layer '{id}'");
            return None;
        };
        self.order.retain(|k| *k != key);
        self.layers.remove(key)
    }

    /// Drops every layer. The id counter keeps counting.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.order.clear();
        self.by_id.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Snapshots of all layers in insertion order.
    #[must_use]
    pub fn meta(&self) -> Vec<LayerMeta> {
        self.iter().map(Layer::meta).collect()
    }

    /// Layers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.order.iter().filter_map(|key| self.layers.get(*key))
    }
}
