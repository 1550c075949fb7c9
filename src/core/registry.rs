//! Layer registry: alias-keyed ownership of every layer buffer.

use std::collections::HashMap;

use crate::core::layer::Layer;
use crate::error::{Error, Result};

/// Flat store of layers. Parent/child structure is expressed through each
/// layer's parent alias, never through owning pointers, so the tree cannot
/// form reference cycles.
#[derive(Default, Clone)]
pub struct LayerRegistry {
    layers: HashMap<String, Layer>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new layer. Fails on non-positive dimensions, a duplicate
    /// alias, or an unknown parent alias.
    pub fn add(
        &mut self,
        alias: impl Into<String>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        z: i32,
        parent: impl Into<String>,
    ) -> Result<()> {
        let alias = alias.into();
        let parent = parent.into();
        if self.layers.contains_key(&alias) {
            return Err(Error::DuplicateLayer { alias });
        }
        if !parent.is_empty() {
            let Some(parent_layer) = self.layers.get_mut(&parent) else {
                return Err(Error::UnknownParent { alias, parent });
            };
            parent_layer.is_parent = true;
        }
        let layer = Layer::new(alias.clone(), parent, x, y, width, height, z)?;
        self.layers.insert(alias, layer);
        Ok(())
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.layers.contains_key(alias)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, alias: &str) -> Result<&Layer> {
        self.layers
            .get(alias)
            .ok_or_else(|| Error::layer_not_found(alias))
    }

    pub fn get_mut(&mut self, alias: &str) -> Result<&mut Layer> {
        self.layers
            .get_mut(alias)
            .ok_or_else(|| Error::layer_not_found(alias))
    }

    /// Remove a layer and, recursively, every layer that transitively names
    /// it as parent. Idempotent: removing an unknown alias is a no-op.
    pub fn remove(&mut self, alias: &str) {
        let Some(removed) = self.layers.remove(alias) else {
            return;
        };

        let children: Vec<String> = self
            .layers
            .values()
            .filter(|layer| layer.parent() == alias)
            .map(|layer| layer.alias().to_string())
            .collect();
        for child in children {
            self.remove(&child);
        }

        // The former parent may have just lost its last child.
        let former_parent = removed.parent().to_string();
        if !former_parent.is_empty() {
            let still_parent = self.is_parent(&former_parent);
            if let Some(parent_layer) = self.layers.get_mut(&former_parent) {
                parent_layer.is_parent = still_parent;
            }
        }
    }

    /// True iff any registered layer names `alias` as its parent.
    pub fn is_parent(&self, alias: &str) -> bool {
        self.layers.values().any(|layer| layer.parent() == alias)
    }

    /// (alias, z) pairs in ascending z. Ties break by alias so one snapshot
    /// is deterministic; callers must not rely on tie order across calls.
    pub fn sorted_by_z_order(&self) -> Vec<(String, i32)> {
        let mut entries: Vec<(String, i32)> = self
            .layers
            .values()
            .map(|layer| (layer.alias().to_string(), layer.z))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }

    /// Raise `alias` to the highest z among layers sharing `scope_parent`.
    /// The previous topmost layer in that scope steps down by one and loses
    /// its topmost flag.
    pub fn promote_to_top(&mut self, alias: &str, scope_parent: &str) -> Result<()> {
        if !self.layers.contains_key(alias) {
            return Err(Error::layer_not_found(alias));
        }

        let top = self
            .layers
            .values()
            .filter(|layer| layer.parent() == scope_parent)
            .max_by_key(|layer| layer.z)
            .map(|layer| (layer.alias().to_string(), layer.z));

        let Some((top_alias, top_z)) = top else {
            return Ok(());
        };
        if top_alias == alias {
            let layer = self.get_mut(alias)?;
            layer.topmost = true;
            return Ok(());
        }

        {
            let demoted = self.get_mut(&top_alias)?;
            demoted.z -= 1;
            demoted.topmost = false;
        }
        let promoted = self.get_mut(alias)?;
        promoted.z = top_z;
        promoted.topmost = true;
        Ok(())
    }

    /// Walk the parent chain from `alias` to the root (a layer whose parent
    /// is empty). Returns `alias` itself if it has no parent.
    pub fn root_of(&self, alias: &str) -> Result<String> {
        let mut current = self.get(alias)?;
        let mut hops = 0;
        while !current.parent().is_empty() {
            current = self.get(current.parent())?;
            // Parents are validated on insert, so a cycle would be a bug;
            // bail out rather than spin.
            hops += 1;
            if hops > self.layers.len() {
                break;
            }
        }
        Ok(current.alias().to_string())
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }
}
