//! Checkboxes.

use crate::core::cell::{CellFlags, CellKind};
use crate::core::input::MouseSnapshot;
use crate::core::layer::{CellTag, Layer};
use crate::core::style::TextStyle;
use crate::error::Result;
use crate::render::Hit;
use crate::runtime::focus::FocusState;
use crate::widgets::controls::ControlMap;

pub struct CheckboxEntry {
    x: i32,
    y: i32,
    label: String,
    checked: bool,
    enabled: bool,
    visible: bool,
    style: TextStyle,
}

#[derive(Default)]
pub struct Checkboxes {
    entries: ControlMap<CheckboxEntry>,
}

impl Checkboxes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        layer: &str,
        alias: &str,
        x: i32,
        y: i32,
        label: impl Into<String>,
        style: TextStyle,
    ) -> Result<()> {
        self.entries.insert(
            layer,
            alias,
            CheckboxEntry {
                x,
                y,
                label: label.into(),
                checked: false,
                enabled: true,
                visible: true,
                style,
            },
        )
    }

    pub fn is_checked(&self, layer: &str, alias: &str) -> Result<bool> {
        Ok(self.entries.get(layer, alias)?.checked)
    }

    pub fn set_checked(&mut self, layer: &str, alias: &str, checked: bool) -> Result<()> {
        self.entries.get_mut(layer, alias)?.checked = checked;
        Ok(())
    }

    pub fn set_label(&mut self, layer: &str, alias: &str, label: impl Into<String>) -> Result<()> {
        self.entries.get_mut(layer, alias)?.label = label.into();
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

    /// Toggle on press.
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
        let Some(hit) = hit.filter(|h| h.kind == CellKind::Checkbox) else {
            return false;
        };
        let Ok(entry) = self.entries.get_mut(&hit.layer, &hit.control) else {
            return false;
        };
        if !entry.enabled {
            return false;
        }
        entry.checked = !entry.checked;
        focus.set_focus(&hit.layer, &hit.control, CellKind::Checkbox);
        true
    }

    pub(crate) fn draw_on(&mut self, layer: &mut Layer, focus: &FocusState) {
        let layer_alias = layer.alias().to_string();
        for (alias, entry) in self.entries.iter_layer_mut(&layer_alias) {
            if !entry.visible {
                continue;
            }
            let focused = focus.is_focused(&layer_alias, alias, CellKind::Checkbox);
            let style = if focused {
                entry.style.with_flags(entry.style.flags | CellFlags::BOLD)
            } else {
                entry.style
            };
            let tag = CellTag::control(CellKind::Checkbox, alias);
            let mark = if entry.checked { 'X' } else { ' ' };
            let text = format!("[{mark}] {}", entry.label);
            layer.put_str_tagged(entry.x, entry.y, &text, &style, &tag);
        }
    }
}
