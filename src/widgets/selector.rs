//! Scrollable select lists.
//!
//! A selector shows a window of `height` rows over its item list. The window
//! position lives in `top`; when a scrollbar is attached, `top` and the bar's
//! scroll value mirror each other in both directions.

use crate::core::cell::{CellFlags, CellKind};
use crate::core::input::{Key, MouseSnapshot, Wheel};
use crate::core::layer::{CellTag, Layer};
use crate::core::style::TextStyle;
use crate::core::text::{display_width, truncate_to_width};
use crate::error::Result;
use crate::render::Hit;
use crate::runtime::focus::FocusState;
use crate::widgets::controls::ControlMap;
use crate::widgets::scrollbar::Scrollbars;

pub struct SelectorEntry {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    items: Vec<String>,
    top: usize,
    selected: usize,
    highlighted: Option<usize>,
    scrollbar: Option<String>,
    enabled: bool,
    visible: bool,
    style: TextStyle,
}

impl SelectorEntry {
    fn rows(&self) -> usize {
        self.height.max(1) as usize
    }

    fn max_top(&self) -> usize {
        self.items.len().saturating_sub(self.rows())
    }

    fn scroll_to(&mut self, top: usize) -> bool {
        let top = top.min(self.max_top());
        if top == self.top {
            return false;
        }
        self.top = top;
        true
    }

    fn keep_selected_visible(&mut self) {
        if self.selected < self.top {
            self.top = self.selected;
        } else if self.selected >= self.top + self.rows() {
            self.top = self.selected + 1 - self.rows();
        }
    }
}

#[derive(Default)]
pub struct Selectors {
    entries: ControlMap<SelectorEntry>,
}

impl Selectors {
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
        items: Vec<String>,
        style: TextStyle,
    ) -> Result<()> {
        self.entries.insert(
            layer,
            alias,
            SelectorEntry {
                x,
                y,
                width: width.max(1),
                height: height.max(1),
                items,
                top: 0,
                selected: 0,
                highlighted: None,
                scrollbar: None,
                enabled: true,
                visible: true,
                style,
            },
        )
    }

    /// Mirror the view position into a scrollbar on the same layer. The bar's
    /// range is retuned so its value equals the top row index.
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

    pub fn selected(&self, layer: &str, alias: &str) -> Result<usize> {
        Ok(self.entries.get(layer, alias)?.selected)
    }

    pub fn selected_item(&self, layer: &str, alias: &str) -> Result<Option<String>> {
        let entry = self.entries.get(layer, alias)?;
        Ok(entry.items.get(entry.selected).cloned())
    }

    pub fn set_selected(&mut self, layer: &str, alias: &str, index: usize) -> Result<()> {
        let entry = self.entries.get_mut(layer, alias)?;
        if !entry.items.is_empty() {
            entry.selected = index.min(entry.items.len() - 1);
            entry.keep_selected_visible();
        }
        Ok(())
    }

    pub fn set_items(
        &mut self,
        layer: &str,
        alias: &str,
        items: Vec<String>,
        scrollbars: &mut Scrollbars,
    ) -> Result<()> {
        let entry = self.entries.get_mut(layer, alias)?;
        entry.items = items;
        entry.selected = entry.selected.min(entry.items.len().saturating_sub(1));
        entry.top = entry.top.min(entry.max_top());
        entry.highlighted = None;
        if let Some(bar) = entry.scrollbar.clone() {
            scrollbars.set_max(layer, &bar, entry.max_top() as i32)?;
            if let Ok(bar) = scrollbars.get_mut(layer, &bar) {
                bar.set_value(entry.top as i32);
            }
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

    fn push_top(layer: &str, entry: &SelectorEntry, scrollbars: &mut Scrollbars) {
        if let Some(bar) = &entry.scrollbar {
            // Bar may have been removed with its layer; stale aliases are
            // skipped, not errors.
            if let Ok(bar) = scrollbars.get_mut(layer, bar) {
                bar.set_value(entry.top as i32);
            }
        }
    }

    pub(crate) fn handle_key(
        &mut self,
        key: &Key,
        focus: &FocusState,
        scrollbars: &mut Scrollbars,
    ) -> bool {
        let Some(target) = focus.focused_of_kind(CellKind::SelectorItem) else {
            return false;
        };
        let Ok(entry) = self.entries.get_mut(&target.layer, &target.control) else {
            return false;
        };
        if !entry.enabled || entry.items.is_empty() {
            return false;
        }
        let page = entry.rows();
        let last = entry.items.len() - 1;
        let moved = match key.name() {
            Some("up") if entry.selected > 0 => {
                entry.selected -= 1;
                true
            }
            Some("down") if entry.selected < last => {
                entry.selected += 1;
                true
            }
            Some("pgup") if entry.selected > 0 => {
                entry.selected = entry.selected.saturating_sub(page);
                true
            }
            Some("pgdn") if entry.selected < last => {
                entry.selected = (entry.selected + page).min(last);
                true
            }
            Some("home") if entry.selected > 0 => {
                entry.selected = 0;
                true
            }
            Some("end") if entry.selected < last => {
                entry.selected = last;
                true
            }
            _ => false,
        };
        if moved {
            entry.keep_selected_visible();
            Self::push_top(&target.layer, entry, scrollbars);
        }
        moved
    }

    /// Press selects, wheel scrolls the view, motion tracks a hover
    /// highlight. Wheel and view changes are mirrored into the attached
    /// scrollbar.
    pub(crate) fn handle_mouse(
        &mut self,
        hit: Option<&Hit>,
        now: &MouseSnapshot,
        prev: &MouseSnapshot,
        focus: &mut FocusState,
        scrollbars: &mut Scrollbars,
    ) -> bool {
        let press = now.button > 0 && prev.button == 0;
        let over = hit.filter(|h| h.kind == CellKind::SelectorItem);

        if now.wheel != Wheel::None {
            let Some(hit) = over else {
                return false;
            };
            let Ok(entry) = self.entries.get_mut(&hit.layer, &hit.control) else {
                return false;
            };
            if !entry.enabled {
                return false;
            }
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

        if press {
            let Some(hit) = over else {
                return false;
            };
            let Ok(entry) = self.entries.get_mut(&hit.layer, &hit.control) else {
                return false;
            };
            if !entry.enabled || hit.part < 0 || hit.part as usize >= entry.items.len() {
                return false;
            }
            focus.set_focus(&hit.layer, &hit.control, CellKind::SelectorItem);
            entry.selected = hit.part as usize;
            entry.highlighted = Some(entry.selected);
            return true;
        }

        if now.button == 0 && prev.button == 0 {
            // Plain motion: hover highlight follows the cursor, and leaves
            // with it.
            let mut dirty = false;
            for (layer, alias, entry) in self.entries.iter_all_mut() {
                let hovered = over
                    .filter(|h| h.layer == layer && h.control == alias)
                    .and_then(|h| {
                        (h.part >= 0 && (h.part as usize) < entry.items.len())
                            .then_some(h.part as usize)
                    });
                if entry.highlighted != hovered {
                    entry.highlighted = hovered;
                    dirty = true;
                }
            }
            return dirty;
        }

        false
    }

    /// Post-scroll pass: if a drag or click moved the attached scrollbar this
    /// event, follow it.
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

    pub(crate) fn draw_on(&mut self, layer: &mut Layer, focus: &FocusState) {
        let layer_alias = layer.alias().to_string();
        for (alias, entry) in self.entries.iter_layer_mut(&layer_alias) {
            if !entry.visible {
                continue;
            }
            let focused = focus.is_focused(&layer_alias, alias, CellKind::SelectorItem);
            for row in 0..entry.rows() {
                let index = entry.top + row;
                let tag = CellTag::control(CellKind::SelectorItem, alias).with_part(index as i32);
                let y = entry.y + row as i32;
                let (text, style) = match entry.items.get(index) {
                    Some(item) => {
                        let style = if index == entry.selected {
                            entry.style.inverted()
                        } else if entry.highlighted == Some(index) || focused {
                            entry.style.with_flags(entry.style.flags | CellFlags::BOLD)
                        } else {
                            entry.style
                        };
                        (truncate_to_width(item, entry.width as usize), style)
                    }
                    None => ("", entry.style),
                };
                layer.put_str_tagged(entry.x, y, text, &style, &tag);
                let used = display_width(text) as i32;
                for x in used..entry.width {
                    layer.put_rune_tagged(entry.x + x, y, ' ', &style, &tag);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Selectors;
    use crate::core::cell::CellKind;
    use crate::core::color::WHITE;
    use crate::core::input::{Key, MouseSnapshot, Wheel};
    use crate::core::layer::Layer;
    use crate::core::style::TextStyle;
    use crate::render::Hit;
    use crate::runtime::focus::FocusState;
    use crate::widgets::scrollbar::Scrollbars;

    fn selector_hit(part: i32) -> Hit {
        Hit {
            layer: "win".to_string(),
            parent: String::new(),
            control: "list".to_string(),
            kind: CellKind::SelectorItem,
            part,
            cell_id: 0,
        }
    }

    fn snapshot(button: u32, wheel: Wheel) -> MouseSnapshot {
        MouseSnapshot {
            x: 0,
            y: 0,
            button,
            wheel,
        }
    }

    fn ten_items() -> Vec<String> {
        (0..10).map(|i| format!("item {i}")).collect()
    }

    fn setup() -> (Selectors, Scrollbars) {
        let mut selectors = Selectors::new();
        let mut bars = Scrollbars::new();
        selectors
            .add("win", "list", 0, 0, 8, 3, ten_items(), TextStyle::default())
            .unwrap();
        bars.add("win", "bar", 9, 0, 5, 0, false, TextStyle::default())
            .unwrap();
        selectors
            .attach_scrollbar("win", "list", "bar", &mut bars)
            .unwrap();
        (selectors, bars)
    }

    #[test]
    fn attach_retunes_the_scrollbar_range() {
        let (_, bars) = setup();
        // Ten items on three rows leave seven scroll positions.
        assert_eq!(bars.get("win", "bar").unwrap().max(), 7);
    }

    #[test]
    fn click_selects_the_hit_item() {
        let (mut selectors, mut bars) = setup();
        let mut focus = FocusState::new();

        assert!(selectors.handle_mouse(
            Some(&selector_hit(2)),
            &snapshot(1, Wheel::None),
            &snapshot(0, Wheel::None),
            &mut focus,
            &mut bars,
        ));
        assert_eq!(selectors.selected("win", "list").unwrap(), 2);
        assert_eq!(
            selectors.selected_item("win", "list").unwrap().as_deref(),
            Some("item 2")
        );
        assert!(focus.is_focused("win", "list", CellKind::SelectorItem));
    }

    #[test]
    fn wheel_scrolls_and_mirrors_into_the_bar() {
        let (mut selectors, mut bars) = setup();
        let mut focus = FocusState::new();
        let still = snapshot(0, Wheel::None);

        for _ in 0..2 {
            assert!(selectors.handle_mouse(
                Some(&selector_hit(0)),
                &snapshot(0, Wheel::Down),
                &still,
                &mut focus,
                &mut bars,
            ));
        }
        assert_eq!(bars.get("win", "bar").unwrap().value(), 2);

        // Clamped at the far end.
        for _ in 0..20 {
            selectors.handle_mouse(
                Some(&selector_hit(0)),
                &snapshot(0, Wheel::Down),
                &still,
                &mut focus,
                &mut bars,
            );
        }
        assert_eq!(bars.get("win", "bar").unwrap().value(), 7);
    }

    #[test]
    fn keyboard_selection_keeps_itself_visible() {
        let (mut selectors, mut bars) = setup();
        let mut focus = FocusState::new();
        focus.set_focus("win", "list", CellKind::SelectorItem);

        for _ in 0..4 {
            assert!(selectors.handle_key(&Key::Named("down"), &focus, &mut bars));
        }
        assert_eq!(selectors.selected("win", "list").unwrap(), 4);
        // Row window slid down to keep index 4 on the last visible row.
        assert_eq!(bars.get("win", "bar").unwrap().value(), 2);

        assert!(selectors.handle_key(&Key::Named("home"), &focus, &mut bars));
        assert_eq!(bars.get("win", "bar").unwrap().value(), 0);
    }

    #[test]
    fn scrollbar_moves_pull_the_view_in_the_second_pass() {
        let (mut selectors, mut bars) = setup();
        bars.get_mut("win", "bar").unwrap().set_value(5);

        assert!(selectors.sync_from_scrollbars(&bars));
        assert!(!selectors.sync_from_scrollbars(&bars));

        let mut layer = Layer::new("win", "", 0, 0, 10, 3, 1).unwrap();
        selectors.draw_on(&mut layer, &FocusState::new());
        assert_eq!(layer.cell(5, 0).unwrap().rune, '5');
        assert_eq!(layer.cell(0, 0).unwrap().part, 5);
    }

    #[test]
    fn hover_highlight_follows_and_leaves() {
        let (mut selectors, mut bars) = setup();
        let mut focus = FocusState::new();
        let still = snapshot(0, Wheel::None);

        assert!(selectors.handle_mouse(Some(&selector_hit(1)), &still, &still, &mut focus, &mut bars));
        // Same hover again: nothing new to draw.
        assert!(!selectors.handle_mouse(Some(&selector_hit(1)), &still, &still, &mut focus, &mut bars));
        // Cursor moved off the list entirely.
        assert!(selectors.handle_mouse(None, &still, &still, &mut focus, &mut bars));
    }

    #[test]
    fn draw_inverts_the_selected_row() {
        let (mut selectors, _) = setup();
        selectors.set_selected("win", "list", 1).unwrap();

        let mut layer = Layer::new("win", "", 0, 0, 10, 3, 1).unwrap();
        selectors.draw_on(&mut layer, &FocusState::new());

        // Default style is white on black; the selected row swaps them.
        assert_eq!(layer.cell(0, 1).unwrap().bg, WHITE);
        assert_ne!(layer.cell(0, 0).unwrap().bg, WHITE);
        assert_eq!(layer.cell(0, 1).unwrap().rune, 'i');
        assert_eq!(layer.cell(7, 2).unwrap().kind, CellKind::SelectorItem);
    }
}
