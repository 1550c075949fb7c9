//! Horizontal progress bars.

use crate::core::cell::CellKind;
use crate::core::layer::{CellTag, Layer};
use crate::core::style::TextStyle;
use crate::error::Result;
use crate::widgets::controls::ControlMap;

const FILLED: char = '█';
const EMPTY: char = '░';

pub struct ProgressEntry {
    x: i32,
    y: i32,
    width: i32,
    value: i32,
    max: i32,
    visible: bool,
    style: TextStyle,
}

impl ProgressEntry {
    fn filled_cells(&self) -> i32 {
        if self.max <= 0 || self.width <= 0 {
            return 0;
        }
        let ratio = self.value as f64 / self.max as f64;
        ((ratio * self.width as f64) as i32).clamp(0, self.width)
    }
}

#[derive(Default)]
pub struct ProgressBars {
    entries: ControlMap<ProgressEntry>,
}

impl ProgressBars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        layer: &str,
        alias: &str,
        x: i32,
        y: i32,
        width: i32,
        max: i32,
        style: TextStyle,
    ) -> Result<()> {
        self.entries.insert(
            layer,
            alias,
            ProgressEntry {
                x,
                y,
                width: width.max(1),
                value: 0,
                max: max.max(0),
                visible: true,
                style,
            },
        )
    }

    pub fn value(&self, layer: &str, alias: &str) -> Result<i32> {
        Ok(self.entries.get(layer, alias)?.value)
    }

    /// Clamps into `[0, max]`. Returns whether the stored value moved.
    pub fn set_value(&mut self, layer: &str, alias: &str, value: i32) -> Result<bool> {
        let entry = self.entries.get_mut(layer, alias)?;
        let clamped = value.clamp(0, entry.max);
        if clamped == entry.value {
            return Ok(false);
        }
        entry.value = clamped;
        Ok(true)
    }

    pub fn set_max(&mut self, layer: &str, alias: &str, max: i32) -> Result<()> {
        let entry = self.entries.get_mut(layer, alias)?;
        entry.max = max.max(0);
        entry.value = entry.value.min(entry.max);
        Ok(())
    }

    pub fn set_visible(&mut self, layer: &str, alias: &str, visible: bool) -> Result<()> {
        self.entries.get_mut(layer, alias)?.visible = visible;
        Ok(())
    }

    pub(crate) fn contains(&self, layer: &str, alias: &str) -> bool {
        self.entries.contains(layer, alias)
    }

    pub(crate) fn remove_layer(&mut self, layer: &str) {
        self.entries.remove_layer(layer);
    }

    pub(crate) fn has_layer(&self, layer: &str) -> bool {
        self.entries.has_layer(layer)
    }

    pub(crate) fn draw_on(&mut self, layer: &mut Layer) {
        let layer_alias = layer.alias().to_string();
        for (alias, entry) in self.entries.iter_layer_mut(&layer_alias) {
            if !entry.visible {
                continue;
            }
            let tag = CellTag::control(CellKind::ProgressBar, alias);
            let filled = entry.filled_cells();
            for i in 0..entry.width {
                let rune = if i < filled { FILLED } else { EMPTY };
                layer.put_rune_tagged(entry.x + i, entry.y, rune, &entry.style, &tag);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ProgressBars;
    use crate::core::layer::Layer;
    use crate::core::style::TextStyle;

    #[test]
    fn fill_tracks_the_value_ratio() {
        let mut bars = ProgressBars::new();
        bars.add("win", "load", 0, 0, 10, 100, TextStyle::default())
            .unwrap();
        bars.set_value("win", "load", 37).unwrap();

        let mut layer = Layer::new("win", "", 0, 0, 10, 1, 1).unwrap();
        bars.draw_on(&mut layer);

        // 37/100 of ten cells floors to three filled.
        assert_eq!(layer.cell(2, 0).unwrap().rune, '█');
        assert_eq!(layer.cell(3, 0).unwrap().rune, '░');
        assert_eq!(layer.cell(9, 0).unwrap().rune, '░');
    }

    #[test]
    fn value_clamps_to_the_range() {
        let mut bars = ProgressBars::new();
        bars.add("win", "load", 0, 0, 10, 100, TextStyle::default())
            .unwrap();

        assert!(bars.set_value("win", "load", 250).unwrap());
        assert_eq!(bars.value("win", "load").unwrap(), 100);
        assert!(bars.set_value("win", "load", -5).unwrap());
        assert_eq!(bars.value("win", "load").unwrap(), 0);
        assert!(!bars.set_value("win", "load", -1).unwrap());
    }

    #[test]
    fn lowering_max_reclamps_the_value() {
        let mut bars = ProgressBars::new();
        bars.add("win", "load", 0, 0, 10, 100, TextStyle::default())
            .unwrap();
        bars.set_value("win", "load", 80).unwrap();
        bars.set_max("win", "load", 50).unwrap();
        assert_eq!(bars.value("win", "load").unwrap(), 50);
    }
}
