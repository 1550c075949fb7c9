//! Push buttons.

use crate::core::cell::{CellFlags, CellKind};
use crate::core::input::MouseSnapshot;
use crate::core::layer::{CellTag, Layer};
use crate::core::style::TextStyle;
use crate::core::text::{display_width, truncate_to_width};
use crate::error::Result;
use crate::render::Hit;
use crate::runtime::focus::FocusState;
use crate::widgets::controls::ControlMap;

pub struct ButtonEntry {
    x: i32,
    y: i32,
    width: i32,
    label: String,
    style: TextStyle,
    pressed: bool,
    enabled: bool,
    visible: bool,
    on_click: Option<Box<dyn FnMut()>>,
}

#[derive(Default)]
pub struct Buttons {
    entries: ControlMap<ButtonEntry>,
}

impl Buttons {
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
        label: impl Into<String>,
        style: TextStyle,
    ) -> Result<()> {
        self.entries.insert(
            layer,
            alias,
            ButtonEntry {
                x,
                y,
                width: width.max(1),
                label: label.into(),
                style,
                pressed: false,
                enabled: true,
                visible: true,
                on_click: None,
            },
        )
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

    pub fn set_on_click(
        &mut self,
        layer: &str,
        alias: &str,
        handler: Option<Box<dyn FnMut()>>,
    ) -> Result<()> {
        self.entries.get_mut(layer, alias)?.on_click = handler;
        Ok(())
    }

    pub fn is_pressed(&self, layer: &str, alias: &str) -> Result<bool> {
        Ok(self.entries.get(layer, alias)?.pressed)
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

    /// Press arms the button under the cursor; release over the same button
    /// fires its click handler. Release anywhere disarms every button.
    pub(crate) fn handle_mouse(
        &mut self,
        hit: Option<&Hit>,
        now: &MouseSnapshot,
        prev: &MouseSnapshot,
        focus: &mut FocusState,
    ) -> bool {
        let press = now.button > 0 && prev.button == 0;
        let release = now.button == 0 && prev.button > 0;
        let mut dirty = false;

        if press {
            if let Some(hit) = hit.filter(|h| h.kind == CellKind::Button) {
                if let Ok(entry) = self.entries.get_mut(&hit.layer, &hit.control) {
                    if entry.enabled {
                        entry.pressed = true;
                        focus.set_focus(&hit.layer, &hit.control, CellKind::Button);
                        dirty = true;
                    }
                }
            }
        } else if release {
            let over = hit
                .filter(|h| h.kind == CellKind::Button)
                .map(|h| (h.layer.clone(), h.control.clone()));
            for (layer, alias, entry) in self.entries.iter_all_mut() {
                if !entry.pressed {
                    continue;
                }
                entry.pressed = false;
                dirty = true;
                let released_over = over
                    .as_ref()
                    .is_some_and(|(l, c)| l == layer && c == alias);
                if released_over {
                    if let Some(handler) = entry.on_click.as_mut() {
                        handler();
                    }
                }
            }
        }
        dirty
    }

    pub(crate) fn draw_on(&mut self, layer: &mut Layer, focus: &FocusState) {
        let layer_alias = layer.alias().to_string();
        for (alias, entry) in self.entries.iter_layer_mut(&layer_alias) {
            if !entry.visible {
                continue;
            }
            let focused = focus.is_focused(&layer_alias, alias, CellKind::Button);
            let style = match (entry.pressed, focused) {
                (true, _) => entry.style.inverted(),
                (false, true) => entry.style.with_flags(entry.style.flags | CellFlags::BOLD),
                (false, false) => entry.style,
            };
            let tag = CellTag::control(CellKind::Button, alias);

            let width = entry.width as usize;
            let label = truncate_to_width(&entry.label, width.saturating_sub(2));
            let pad = width.saturating_sub(display_width(label));
            let left = pad / 2;
            let right = pad - left;
            let text = format!("{}{}{}", " ".repeat(left), label, " ".repeat(right));
            layer.put_str_tagged(entry.x, entry.y, &text, &style, &tag);
        }
    }
}
