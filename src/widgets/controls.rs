//! Two-level control storage shared by the widget managers.
//!
//! Controls are addressed by (layer alias, control alias). The map is the
//! weak half of the layer/widget relationship: entries outlive nothing, and
//! every access validates that the addressed entry still exists. Removing a
//! layer drops all of its controls in one call.

use std::collections::HashMap;

use crate::error::{Error, Result};

pub(crate) struct ControlMap<E> {
    by_layer: HashMap<String, HashMap<String, E>>,
}

impl<E> Default for ControlMap<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ControlMap<E> {
    pub(crate) fn new() -> Self {
        Self {
            by_layer: HashMap::new(),
        }
    }

    /// Register a control. Duplicate registration is a caller bug.
    pub(crate) fn insert(&mut self, layer: &str, control: &str, entry: E) -> Result<()> {
        let slot = self.by_layer.entry(layer.to_string()).or_default();
        if slot.contains_key(control) {
            return Err(Error::duplicate_control(layer, control));
        }
        slot.insert(control.to_string(), entry);
        Ok(())
    }

    pub(crate) fn get(&self, layer: &str, control: &str) -> Result<&E> {
        self.by_layer
            .get(layer)
            .and_then(|slot| slot.get(control))
            .ok_or_else(|| Error::control_not_found(layer, control))
    }

    pub(crate) fn get_mut(&mut self, layer: &str, control: &str) -> Result<&mut E> {
        self.by_layer
            .get_mut(layer)
            .and_then(|slot| slot.get_mut(control))
            .ok_or_else(|| Error::control_not_found(layer, control))
    }

    pub(crate) fn contains(&self, layer: &str, control: &str) -> bool {
        self.by_layer
            .get(layer)
            .is_some_and(|slot| slot.contains_key(control))
    }

    pub(crate) fn has_layer(&self, layer: &str) -> bool {
        self.by_layer.get(layer).is_some_and(|slot| !slot.is_empty())
    }

    /// Drop every control owned by `layer`. Idempotent.
    pub(crate) fn remove_layer(&mut self, layer: &str) {
        self.by_layer.remove(layer);
    }

    pub(crate) fn remove(&mut self, layer: &str, control: &str) -> Option<E> {
        self.by_layer.get_mut(layer)?.remove(control)
    }

    /// Controls on one layer, in unspecified order.
    pub(crate) fn iter_layer_mut(&mut self, layer: &str) -> impl Iterator<Item = (&str, &mut E)> {
        self.by_layer
            .get_mut(layer)
            .into_iter()
            .flat_map(|slot| slot.iter_mut().map(|(alias, entry)| (alias.as_str(), entry)))
    }

    /// Every control in the map, in unspecified order.
    pub(crate) fn iter_all_mut(&mut self) -> impl Iterator<Item = (&str, &str, &mut E)> {
        self.by_layer.iter_mut().flat_map(|(layer, slot)| {
            slot.iter_mut()
                .map(move |(alias, entry)| (layer.as_str(), alias.as_str(), entry))
        })
    }
}
