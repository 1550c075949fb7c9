//! Read-only text viewers with word wrap and scrolling.

use unicode_segmentation::UnicodeSegmentation;

use crate::core::cell::CellKind;
use crate::core::input::{Key, MouseSnapshot, Wheel};
use crate::core::layer::{CellTag, Layer};
use crate::core::style::TextStyle;
use crate::core::text::{display_width, graphemes_with_width, truncate_to_width};
use crate::error::Result;
use crate::render::Hit;
use crate::runtime::focus::FocusState;
use crate::widgets::controls::ControlMap;
use crate::widgets::scrollbar::Scrollbars;

/// Greedy word wrap by display width. Whitespace at a break is dropped; a
/// single word wider than the line is split mid-word.
pub(crate) fn wrap_text(text: &str, width: usize) -> Vec<String> {
    fn flush(lines: &mut Vec<String>, line: &mut String) {
        let trimmed = line.trim_end().len();
        line.truncate(trimmed);
        lines.push(std::mem::take(line));
    }

    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut used = 0;
        for token in paragraph.split_word_bounds() {
            let token_width = display_width(token);
            if used + token_width <= width {
                line.push_str(token);
                used += token_width;
                continue;
            }
            if token.trim().is_empty() {
                flush(&mut lines, &mut line);
                used = 0;
                continue;
            }
            if token_width <= width {
                flush(&mut lines, &mut line);
                line.push_str(token);
                used = token_width;
            } else {
                for (grapheme, grapheme_width) in graphemes_with_width(token) {
                    if used + grapheme_width > width {
                        flush(&mut lines, &mut line);
                        used = 0;
                    }
                    line.push_str(grapheme);
                    used += grapheme_width;
                }
            }
        }
        flush(&mut lines, &mut line);
    }
    lines
}

pub struct TextboxEntry {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    lines: Vec<String>,
    top: usize,
    scrollbar: Option<String>,
    enabled: bool,
    visible: bool,
    style: TextStyle,
}

impl TextboxEntry {
    fn rows(&self) -> usize {
        self.height.max(1) as usize
    }

    fn max_top(&self) -> usize {
        self.lines.len().saturating_sub(self.rows())
    }

    fn scroll_to(&mut self, top: usize) -> bool {
        let top = top.min(self.max_top());
        if top == self.top {
            return false;
        }
        self.top = top;
        true
    }
}

#[derive(Default)]
pub struct Textboxes {
    entries: ControlMap<TextboxEntry>,
}

impl Textboxes {
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
        height: i32,
        text: &str,
        style: TextStyle,
    ) -> Result<()> {
        let width = width.max(1);
        self.entries.insert(
            layer,
            alias,
            TextboxEntry {
                x,
                y,
                width,
                height: height.max(1),
                lines: wrap_text(text, width as usize),
                top: 0,
                scrollbar: None,
                enabled: true,
                visible: true,
                style,
            },
        )
    }

    /// Mirror the view position into a scrollbar on the same layer.
    pub fn attach_scrollbar(
        &mut self,
        layer: &str,
        alias: &str,
        bar: &str,
        scrollbars: &mut Scrollbars,
    ) -> Result<()> {
        let entry = self.entries.get_mut(layer, alias)?;
        scrollbars.set_max(layer, bar, entry.max_top() as i32)?;
        entry.scrollbar = Some(bar.to_string());
        Ok(())
    }

    /// Rewrap new text and jump back to the first line.
    pub fn set_text(
        &mut self,
        layer: &str,
        alias: &str,
        text: &str,
        scrollbars: &mut Scrollbars,
    ) -> Result<()> {
        let entry = self.entries.get_mut(layer, alias)?;
        entry.lines = wrap_text(text, entry.width as usize);
        entry.top = 0;
        if let Some(bar) = entry.scrollbar.clone() {
            scrollbars.set_max(layer, &bar, entry.max_top() as i32)?;
            if let Ok(bar) = scrollbars.get_mut(layer, &bar) {
                bar.set_value(0);
            }
        }
        Ok(())
    }

    pub fn line_count(&self, layer: &str, alias: &str) -> Result<usize> {
        Ok(self.entries.get(layer, alias)?.lines.len())
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

    fn push_top(layer: &str, entry: &TextboxEntry, scrollbars: &mut Scrollbars) {
        if let Some(bar) = &entry.scrollbar {
            if let Ok(bar) = scrollbars.get_mut(layer, bar) {
                bar.set_value(entry.top as i32);
            }
        }
    }

    /// Keyboard scrolling for the focused viewer. Arrows move one line,
    /// page keys one screenful.
    pub(crate) fn handle_key(
        &mut self,
        key: &Key,
        focus: &FocusState,
        scrollbars: &mut Scrollbars,
    ) -> bool {
        let Some(target) = focus.focused_of_kind(CellKind::Textbox) else {
            return false;
        };
        let Ok(entry) = self.entries.get_mut(&target.layer, &target.control) else {
            return false;
        };
        if !entry.enabled {
            return false;
        }
        let page = entry.rows();
        let moved = match key.name() {
            Some("up") => entry.scroll_to(entry.top.saturating_sub(1)),
            Some("down") => entry.scroll_to(entry.top + 1),
            Some("pgup") => entry.scroll_to(entry.top.saturating_sub(page)),
            Some("pgdn") => entry.scroll_to(entry.top + page),
            Some("home") => entry.scroll_to(0),
            Some("end") => entry.scroll_to(entry.max_top()),
            _ => false,
        };
        if moved {
            Self::push_top(&target.layer, entry, scrollbars);
        }
        moved
    }

    pub(crate) fn handle_mouse(
        &mut self,
        hit: Option<&Hit>,
        now: &MouseSnapshot,
        prev: &MouseSnapshot,
        focus: &mut FocusState,
        scrollbars: &mut Scrollbars,
    ) -> bool {
        let Some(hit) = hit.filter(|h| h.kind == CellKind::Textbox) else {
            return false;
        };
        let Ok(entry) = self.entries.get_mut(&hit.layer, &hit.control) else {
            return false;
        };
        if !entry.enabled {
            return false;
        }

        if now.wheel != Wheel::None {
            let target = match now.wheel {
                Wheel::Up => entry.top.saturating_sub(1),
                Wheel::Down => entry.top + 1,
                _ => return false,
            };
            let changed = entry.scroll_to(target);
            if changed {
                Self::push_top(&hit.layer, entry, scrollbars);
            }
            return changed;
        }

        let press = now.button > 0 && prev.button == 0;
        if press {
            focus.set_focus(&hit.layer, &hit.control, CellKind::Textbox);
            return true;
        }
        false
    }

    /// Post-scroll pass: follow an attached scrollbar moved earlier in the
    /// same event.
    pub(crate) fn sync_from_scrollbars(&mut self, scrollbars: &Scrollbars) -> bool {
        let mut dirty = false;
        for (layer, _, entry) in self.entries.iter_all_mut() {
            let Some(bar) = &entry.scrollbar else {
                continue;
            };
            let Ok(bar) = scrollbars.get(layer, bar) else {
                continue;
            };
            if entry.scroll_to(bar.value().max(0) as usize) {
                dirty = true;
            }
        }
        dirty
    }

    pub(crate) fn draw_on(&mut self, layer: &mut Layer) {
        let layer_alias = layer.alias().to_string();
        for (alias, entry) in self.entries.iter_layer_mut(&layer_alias) {
            if !entry.visible {
                continue;
            }
            for row in 0..entry.rows() {
                let index = entry.top + row;
                let tag = CellTag::control(CellKind::Textbox, alias).with_part(index as i32);
                let y = entry.y + row as i32;
                let text = entry
                    .lines
                    .get(index)
                    .map(|line| truncate_to_width(line, entry.width as usize))
                    .unwrap_or("");
                layer.put_str_tagged(entry.x, y, text, &entry.style, &tag);
                let used = display_width(text) as i32;
                for x in used..entry.width {
                    layer.put_rune_tagged(entry.x + x, y, ' ', &entry.style, &tag);
                }
            }
        }
    }
}
