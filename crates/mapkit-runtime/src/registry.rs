//! Ordered registry of layers.
//!
//! Lookups scan in insertion order and the first match wins. Identifiers
//! are not required to be unique: adding `None` twice registers two
//! default layers, and removing `None` removes only the first.

use crate::error::MapError;
use crate::layer::LayerControllerBuilder;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Layers owned by one map controller.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    entries: Mutex<Vec<Arc<LayerControllerBuilder>>>,
}

impl LayerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a layer.
    pub fn add(&self, entry: Arc<LayerControllerBuilder>) {
        let mut entries = self.entries.lock();
        entries.push(entry);
        debug!(count = entries.len(), "layer registered");
    }

    /// Removes and returns the first layer matching `layer_id`.
    pub fn remove(&self, layer_id: Option<&str>) -> Option<Arc<LayerControllerBuilder>> {
        let mut entries = self.entries.lock();
        let index = entries.iter().position(|e| e.matches(layer_id))?;
        Some(entries.remove(index))
    }

    /// Returns the first layer matching `layer_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::LayerNotFound`] if nothing matches.
    pub fn get(&self, layer_id: Option<&str>) -> Result<Arc<LayerControllerBuilder>, MapError> {
        self.entries
            .lock()
            .iter()
            .find(|e| e.matches(layer_id))
            .cloned()
            .ok_or_else(|| MapError::layer_not_found(layer_id))
    }

    /// Removes and returns every layer, in order.
    pub fn drain(&self) -> Vec<Arc<LayerControllerBuilder>> {
        std::mem::take(&mut *self.entries.lock())
    }

    /// Layer identifiers in registration order.
    #[must_use]
    pub fn layer_ids(&self) -> Vec<Option<String>> {
        self.entries
            .lock()
            .iter()
            .map(|e| e.layer_id().map(str::to_string))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(layer_id: Option<&str>) -> Arc<LayerControllerBuilder> {
        Arc::new(LayerControllerBuilder::new(
            layer_id.map(str::to_string),
            false,
        ))
    }

    #[test]
    fn empty_registry() {
        let registry = LayerRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(
            registry.get(None).expect_err("empty"),
            MapError::LayerNotFound(None)
        );
        assert!(registry.remove(Some("x")).is_none());
    }

    #[test]
    fn preserves_insertion_order() {
        let registry = LayerRegistry::new();
        registry.add(entry(Some("b")));
        registry.add(entry(None));
        registry.add(entry(Some("a")));

        assert_eq!(
            registry.layer_ids(),
            vec![Some("b".to_string()), None, Some("a".to_string())]
        );
    }

    #[test]
    fn lookup_returns_first_match() {
        let registry = LayerRegistry::new();
        let first = entry(Some("poi"));
        registry.add(Arc::clone(&first));
        registry.add(entry(Some("poi")));

        let found = registry.get(Some("poi")).expect("found");
        assert!(Arc::ptr_eq(&found, &first));
    }

    #[test]
    fn remove_takes_only_first_duplicate() {
        let registry = LayerRegistry::new();
        let first = entry(None);
        let second = entry(None);
        registry.add(Arc::clone(&first));
        registry.add(Arc::clone(&second));

        let removed = registry.remove(None).expect("removed");
        assert!(Arc::ptr_eq(&removed, &first));
        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&registry.get(None).expect("left"), &second));
    }

    #[test]
    fn named_and_default_layers_are_distinct() {
        let registry = LayerRegistry::new();
        registry.add(entry(Some("poi")));

        assert!(registry.get(None).is_err());
        assert!(registry.remove(None).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn drain_empties() {
        let registry = LayerRegistry::new();
        registry.add(entry(None));
        registry.add(entry(Some("x")));

        assert_eq!(registry.drain().len(), 2);
        assert!(registry.is_empty());
    }
}
