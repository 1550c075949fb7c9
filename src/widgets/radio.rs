//! Radio groups, one option per row.

use crate::core::cell::{CellFlags, CellKind};
use crate::core::input::MouseSnapshot;
use crate::core::layer::{CellTag, Layer};
use crate::core::style::TextStyle;
use crate::error::Result;
use crate::render::Hit;
use crate::runtime::focus::FocusState;
use crate::widgets::controls::ControlMap;

pub struct RadioEntry {
    x: i32,
    y: i32,
    options: Vec<String>,
    selected: usize,
    enabled: bool,
    visible: bool,
    style: TextStyle,
}

#[derive(Default)]
pub struct Radios {
    entries: ControlMap<RadioEntry>,
}

impl Radios {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        layer: &str,
        alias: &str,
        x: i32,
        y: i32,
        options: Vec<String>,
        style: TextStyle,
    ) -> Result<()> {
        self.entries.insert(
            layer,
            alias,
            RadioEntry {
                x,
                y,
                options,
                selected: 0,
                enabled: true,
                visible: true,
                style,
            },
        )
    }

    pub fn selected(&self, layer: &str, alias: &str) -> Result<usize> {
        Ok(self.entries.get(layer, alias)?.selected)
    }

    pub fn set_selected(&mut self, layer: &str, alias: &str, index: usize) -> Result<()> {
        let entry = self.entries.get_mut(layer, alias)?;
        if !entry.options.is_empty() {
            entry.selected = index.min(entry.options.len() - 1);
        }
        Ok(())
    }

    pub fn set_enabled(&mut self, layer: &str, alias: &str, enabled: bool) -> Result<()> {
        self.entries.get_mut(layer, alias)?.enabled = enabled;
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

    /// Select the option row under a press. Safe to run twice per event:
    /// re-selecting the same row is a no-op second time around.
    pub(crate) fn handle_mouse(
        &mut self,
        hit: Option<&Hit>,
        now: &MouseSnapshot,
        prev: &MouseSnapshot,
        focus: &mut FocusState,
    ) -> bool {
        let press = now.button > 0 && prev.button == 0;
        if !press {
            return false;
        }
        let Some(hit) = hit.filter(|h| h.kind == CellKind::Radio) else {
            return false;
        };
        let Ok(entry) = self.entries.get_mut(&hit.layer, &hit.control) else {
            return false;
        };
        if !entry.enabled || hit.part < 0 || hit.part as usize >= entry.options.len() {
            return false;
        }
        let index = hit.part as usize;
        focus.set_focus(&hit.layer, &hit.control, CellKind::Radio);
        if entry.selected == index {
            return false;
        }
        entry.selected = index;
        true
    }

    pub(crate) fn draw_on(&mut self, layer: &mut Layer, focus: &FocusState) {
        let layer_alias = layer.alias().to_string();
        for (alias, entry) in self.entries.iter_layer_mut(&layer_alias) {
            if !entry.visible {
                continue;
            }
            let focused = focus.is_focused(&layer_alias, alias, CellKind::Radio);
            let style = if focused {
                entry.style.with_flags(entry.style.flags | CellFlags::BOLD)
            } else {
                entry.style
            };
            for (row, option) in entry.options.iter().enumerate() {
                let tag = CellTag::control(CellKind::Radio, alias).with_part(row as i32);
                let mark = if row == entry.selected { '•' } else { ' ' };
                let text = format!("({mark}) {option}");
                layer.put_str_tagged(entry.x, entry.y + row as i32, &text, &style, &tag);
            }
        }
    }
}
