//! Single-line text fields.
//!
//! The content scrolls horizontally behind a fixed display width. Cursor and
//! view offset are grapheme indices, so editing never splits a cluster and
//! wide glyphs shift the view by whole cells.

use unicode_segmentation::UnicodeSegmentation;

use crate::core::cell::CellKind;
use crate::core::input::{Key, MouseSnapshot};
use crate::core::layer::{CellTag, Layer};
use crate::core::style::TextStyle;
use crate::core::text::grapheme_width;
use crate::error::Result;
use crate::render::Hit;
use crate::runtime::focus::FocusState;
use crate::widgets::controls::ControlMap;

pub struct TextFieldEntry {
    x: i32,
    y: i32,
    width: i32,
    content: String,
    cursor: usize,
    view: usize,
    masked: bool,
    enabled: bool,
    visible: bool,
    style: TextStyle,
}

impl TextFieldEntry {
    fn grapheme_count(&self) -> usize {
        self.content.graphemes(true).count()
    }

    fn byte_offset(&self, index: usize) -> usize {
        self.content
            .grapheme_indices(true)
            .nth(index)
            .map(|(offset, _)| offset)
            .unwrap_or(self.content.len())
    }

    /// Columns the glyph at `index` occupies, 1 when masked or past the end.
    fn glyph_width(&self, index: usize) -> usize {
        if self.masked {
            return 1;
        }
        self.content
            .graphemes(true)
            .nth(index)
            .map(|g| grapheme_width(g).max(1))
            .unwrap_or(1)
    }

    fn ensure_cursor_visible(&mut self) {
        if self.cursor < self.view {
            self.view = self.cursor;
            return;
        }
        // Widen the view until the cursor cell itself fits.
        loop {
            let mut columns = self.glyph_width(self.cursor);
            for index in self.view..self.cursor {
                columns += self.glyph_width(index);
            }
            if columns <= self.width as usize || self.view >= self.cursor {
                break;
            }
            self.view += 1;
        }
    }

    fn insert(&mut self, ch: char) {
        let offset = self.byte_offset(self.cursor);
        self.content.insert(offset, ch);
        self.cursor += 1;
        self.ensure_cursor_visible();
    }

    fn remove_at(&mut self, index: usize) {
        let start = self.byte_offset(index);
        let end = self.byte_offset(index + 1);
        self.content.replace_range(start..end, "");
    }
}

#[derive(Default)]
pub struct TextFields {
    entries: ControlMap<TextFieldEntry>,
}

impl TextFields {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add(
        &mut self,
        layer: &str,
        alias: &str,
        x: i32,
        y: i32,
        width: i32,
        style: TextStyle,
        masked: bool,
    ) -> Result<()> {
        self.entries.insert(
            layer,
            alias,
            TextFieldEntry {
                x,
                y,
                width: width.max(1),
                content: String::new(),
                cursor: 0,
                view: 0,
                masked,
                enabled: true,
                visible: true,
                style,
            },
        )
    }

    pub fn content(&self, layer: &str, alias: &str) -> Result<String> {
        Ok(self.entries.get(layer, alias)?.content.clone())
    }

    /// Replaces the content and moves the cursor to the end.
    pub fn set_content(&mut self, layer: &str, alias: &str, content: impl Into<String>) -> Result<()> {
        let entry = self.entries.get_mut(layer, alias)?;
        entry.content = content.into();
        entry.cursor = entry.grapheme_count();
        entry.view = 0;
        entry.ensure_cursor_visible();
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

    #[cfg(test)]
    pub(crate) fn cursor(&self, layer: &str, alias: &str) -> Result<usize> {
        Ok(self.entries.get(layer, alias)?.cursor)
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

    pub(crate) fn handle_key(&mut self, key: &Key, focus: &FocusState) -> bool {
        let Some(target) = focus.focused_of_kind(CellKind::TextField) else {
            return false;
        };
        let Ok(entry) = self.entries.get_mut(&target.layer, &target.control) else {
            return false;
        };
        if !entry.enabled {
            return false;
        }
        match key {
            Key::Char(ch) => {
                entry.insert(*ch);
                true
            }
            Key::Named(name) => {
                let changed = match *name {
                    "backspace" if entry.cursor > 0 => {
                        entry.cursor -= 1;
                        entry.remove_at(entry.cursor);
                        true
                    }
                    "delete" if entry.cursor < entry.grapheme_count() => {
                        entry.remove_at(entry.cursor);
                        true
                    }
                    "left" if entry.cursor > 0 => {
                        entry.cursor -= 1;
                        true
                    }
                    "right" if entry.cursor < entry.grapheme_count() => {
                        entry.cursor += 1;
                        true
                    }
                    "home" if entry.cursor > 0 => {
                        entry.cursor = 0;
                        true
                    }
                    "end" if entry.cursor < entry.grapheme_count() => {
                        entry.cursor = entry.grapheme_count();
                        true
                    }
                    _ => false,
                };
                if changed {
                    entry.ensure_cursor_visible();
                }
                changed
            }
        }
    }

    /// A press focuses the field and drops the cursor on the clicked glyph.
    /// Each drawn cell carries its grapheme index as the sub-part id, so the
    /// click maps straight back without coordinate arithmetic.
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
        let Some(hit) = hit.filter(|h| h.kind == CellKind::TextField) else {
            return false;
        };
        let Ok(entry) = self.entries.get_mut(&hit.layer, &hit.control) else {
            return false;
        };
        if !entry.enabled || hit.part < 0 {
            return false;
        }
        focus.set_focus(&hit.layer, &hit.control, CellKind::TextField);
        entry.cursor = (hit.part as usize).min(entry.grapheme_count());
        entry.ensure_cursor_visible();
        true
    }

    pub(crate) fn draw_on(&mut self, layer: &mut Layer, focus: &FocusState) {
        let layer_alias = layer.alias().to_string();
        for (alias, entry) in self.entries.iter_layer_mut(&layer_alias) {
            if !entry.visible {
                continue;
            }
            let focused = focus.is_focused(&layer_alias, alias, CellKind::TextField);
            let cursor_style = entry.style.inverted();
            let glyph_count = entry.grapheme_count();

            let mut column = 0i32;
            for (index, grapheme) in entry.content.graphemes(true).enumerate().skip(entry.view) {
                let glyph: &str = if entry.masked { "*" } else { grapheme };
                let width = if entry.masked {
                    1
                } else {
                    grapheme_width(grapheme).max(1)
                } as i32;
                if column + width > entry.width {
                    break;
                }
                let style = if focused && index == entry.cursor {
                    cursor_style
                } else {
                    entry.style
                };
                let tag = CellTag::control(CellKind::TextField, alias).with_part(index as i32);
                layer.put_str_tagged(entry.x + column, entry.y, glyph, &style, &tag);
                column += width;
            }

            // Blank tail, tagged one past the last glyph so a click there
            // parks the cursor at the end.
            let tail_tag =
                CellTag::control(CellKind::TextField, alias).with_part(glyph_count as i32);
            let mut at_end_cursor = focused && entry.cursor >= glyph_count;
            while column < entry.width {
                let style = if at_end_cursor {
                    at_end_cursor = false;
                    cursor_style
                } else {
                    entry.style
                };
                layer.put_rune_tagged(entry.x + column, entry.y, ' ', &style, &tail_tag);
                column += 1;
            }
        }
    }
}
