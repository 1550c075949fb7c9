//! Scrollbars and the handle/value kernel shared with scrolling widgets.
//!
//! A scrollbar of track length `L` spends two cells on arrows and shows its
//! handle on one of the `L - 2` remaining track cells, indexed `0..=L-3`.
//! The kernel maps a scroll value in `[0, max]` onto that handle range and
//! back; the last track cell always snaps to `max` so reaching the end of
//! the track means "scrolled to the end".

use crate::core::cell::{CellKind, PART_SCROLL_DOWN, PART_SCROLL_HANDLE, PART_SCROLL_UP};
use crate::core::input::{Key, MouseSnapshot};
use crate::core::layer::{CellTag, Layer};
use crate::core::style::TextStyle;
use crate::error::{Error, Result};
use crate::render::Hit;
use crate::runtime::focus::FocusState;
use crate::widgets::controls::ControlMap;

const GLYPH_UP: char = '▲';
const GLYPH_DOWN: char = '▼';
const GLYPH_LEFT: char = '◀';
const GLYPH_RIGHT: char = '▶';
const GLYPH_TRACK: char = '░';
const GLYPH_HANDLE: char = '█';

/// Handle index for a scroll value. `value` is clamped to `[0, max]`; a zero
/// range pins the handle to the top.
pub fn handle_from_value(value: i32, max: i32, length: i32) -> i32 {
    let span = length - 3;
    if max <= 0 || span <= 0 {
        return 0;
    }
    let value = value.clamp(0, max);
    let handle = ((value as f64 / max as f64) * span as f64).floor() as i32;
    handle.clamp(0, span)
}

/// Scroll value for a handle index. The last track cell snaps to `max`.
pub fn value_from_handle(handle: i32, max: i32, length: i32) -> i32 {
    let span = (length - 3).max(0);
    let handle = handle.clamp(0, span);
    if handle == span {
        return max.max(0);
    }
    ((handle as f64 / length as f64) * max as f64).floor() as i32
}

pub struct ScrollbarEntry {
    x: i32,
    y: i32,
    length: i32,
    max: i32,
    value: i32,
    handle: i32,
    increment: i32,
    horizontal: bool,
    enabled: bool,
    visible: bool,
    style: TextStyle,
}

impl ScrollbarEntry {
    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn handle(&self) -> i32 {
        self.handle
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    /// Set the scroll value and recompute the handle. No-op when disabled.
    /// Returns true when anything changed.
    pub fn set_value(&mut self, value: i32) -> bool {
        if !self.enabled {
            return false;
        }
        let value = value.clamp(0, self.max);
        let handle = handle_from_value(value, self.max, self.length);
        let changed = value != self.value || handle != self.handle;
        self.value = value;
        self.handle = handle;
        changed
    }

    /// Place the handle and derive the value from it. No-op when disabled.
    pub fn set_handle(&mut self, handle: i32) -> bool {
        if !self.enabled {
            return false;
        }
        let handle = handle.clamp(0, (self.length - 3).max(0));
        let value = value_from_handle(handle, self.max, self.length);
        let changed = handle != self.handle || value != self.value;
        self.handle = handle;
        self.value = value;
        changed
    }

    fn scroll_by(&mut self, delta: i32) -> bool {
        self.set_value(self.value + delta)
    }
}

#[derive(Default)]
pub struct Scrollbars {
    entries: ControlMap<ScrollbarEntry>,
}

impl Scrollbars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scrollbar at (x, y) on a layer. `length` counts every cell
    /// of the bar including both arrows and must be at least 3.
    #[allow(clippy::too_many_arguments)]
    pub fn add(
        &mut self,
        layer: &str,
        alias: &str,
        x: i32,
        y: i32,
        length: i32,
        max: i32,
        horizontal: bool,
        style: TextStyle,
    ) -> Result<()> {
        if length < 3 {
            return Err(Error::TrackTooShort {
                alias: alias.to_string(),
                length,
            });
        }
        self.entries.insert(
            layer,
            alias,
            ScrollbarEntry {
                x,
                y,
                length,
                max: max.max(0),
                value: 0,
                handle: 0,
                increment: 1,
                horizontal,
                enabled: true,
                visible: true,
                style,
            },
        )
    }

    pub fn get(&self, layer: &str, alias: &str) -> Result<&ScrollbarEntry> {
        self.entries.get(layer, alias)
    }

    pub fn get_mut(&mut self, layer: &str, alias: &str) -> Result<&mut ScrollbarEntry> {
        self.entries.get_mut(layer, alias)
    }

    pub fn contains(&self, layer: &str, alias: &str) -> bool {
        self.entries.contains(layer, alias)
    }

    pub fn set_max(&mut self, layer: &str, alias: &str, max: i32) -> Result<()> {
        let entry = self.entries.get_mut(layer, alias)?;
        entry.max = max.max(0);
        entry.value = entry.value.clamp(0, entry.max);
        entry.handle = handle_from_value(entry.value, entry.max, entry.length);
        Ok(())
    }

    pub fn set_increment(&mut self, layer: &str, alias: &str, increment: i32) -> Result<()> {
        self.entries.get_mut(layer, alias)?.increment = increment.max(1);
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

    pub(crate) fn remove_layer(&mut self, layer: &str) {
        self.entries.remove_layer(layer);
    }

    pub(crate) fn has_layer(&self, layer: &str) -> bool {
        self.entries.has_layer(layer)
    }

    /// Keyboard scroll for the focused scrollbar. Arrows move by one
    /// increment, page keys by three.
    pub(crate) fn handle_key(&mut self, key: &Key, focus: &FocusState) -> bool {
        let Some(target) = focus.focused_of_kind(CellKind::Scrollbar) else {
            return false;
        };
        let Ok(entry) = self.entries.get_mut(&target.layer, &target.control) else {
            return false;
        };
        let step = entry.increment;
        match key.name() {
            Some("up") | Some("left") => entry.scroll_by(-step),
            Some("down") | Some("right") => entry.scroll_by(step),
            Some("pgup") => entry.scroll_by(-3 * step),
            Some("pgdn") => entry.scroll_by(3 * step),
            _ => false,
        }
    }

    /// Arrow and track clicks. Handle presses are claimed by the drag
    /// machine before dispatch reaches this point.
    pub(crate) fn handle_mouse(
        &mut self,
        hit: Option<&Hit>,
        now: &MouseSnapshot,
        prev: &MouseSnapshot,
        focus: &mut FocusState,
    ) -> bool {
        let Some(hit) = hit else {
            return false;
        };
        if hit.kind != CellKind::Scrollbar {
            return false;
        }
        let press = now.button > 0 && prev.button == 0;
        if !press {
            return false;
        }
        let Ok(entry) = self.entries.get_mut(&hit.layer, &hit.control) else {
            return false;
        };
        if !entry.enabled {
            return false;
        }
        focus.set_focus(&hit.layer, &hit.control, CellKind::Scrollbar);
        let step = entry.increment;
        match hit.part {
            PART_SCROLL_UP => {
                entry.scroll_by(-step);
            }
            PART_SCROLL_DOWN => {
                entry.scroll_by(step);
            }
            part if part >= 0 => {
                entry.set_handle(part);
            }
            _ => {}
        }
        true
    }

    /// Drag delta from the drag machine while in the handle-drag state.
    pub(crate) fn drag_handle(
        &mut self,
        layer: &str,
        alias: &str,
        dx: i32,
        dy: i32,
    ) -> Result<bool> {
        let entry = self.entries.get_mut(layer, alias)?;
        let delta = if entry.horizontal { dx } else { dy };
        if delta == 0 {
            return Ok(false);
        }
        Ok(entry.set_handle(entry.handle + delta))
    }

    pub(crate) fn draw_on(&mut self, layer: &mut Layer, focus: &FocusState) {
        let layer_alias = layer.alias().to_string();
        for (alias, entry) in self.entries.iter_layer_mut(&layer_alias) {
            if !entry.visible {
                continue;
            }
            let focused = focus.is_focused(&layer_alias, alias, CellKind::Scrollbar);
            let style = entry.style;
            let handle_style = if focused { style.inverted() } else { style };
            let tag = |part: i32| CellTag::control(CellKind::Scrollbar, alias).with_part(part);

            let (first, last) = if entry.horizontal {
                (GLYPH_LEFT, GLYPH_RIGHT)
            } else {
                (GLYPH_UP, GLYPH_DOWN)
            };
            let place = |index: i32| -> (i32, i32) {
                if entry.horizontal {
                    (entry.x + index, entry.y)
                } else {
                    (entry.x, entry.y + index)
                }
            };

            let (x, y) = place(0);
            layer.put_rune_tagged(x, y, first, &style, &tag(PART_SCROLL_UP));
            let (x, y) = place(entry.length - 1);
            layer.put_rune_tagged(x, y, last, &style, &tag(PART_SCROLL_DOWN));

            for segment in 0..entry.length - 2 {
                let (x, y) = place(1 + segment);
                if segment == entry.handle {
                    layer.put_rune_tagged(x, y, GLYPH_HANDLE, &handle_style, &tag(PART_SCROLL_HANDLE));
                } else {
                    layer.put_rune_tagged(x, y, GLYPH_TRACK, &style, &tag(segment));
                }
            }
        }
    }
}
