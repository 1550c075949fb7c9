//! Dropdowns with pop-up option trays.
//!
//! The closed control is a one-row strip on its owner layer. Opening creates
//! a child layer directly beneath the strip, promoted to the top of the
//! owner's scope so the tray overlays sibling layers; the tray is torn down
//! again on close. A side table maps tray layer aliases back to their owning
//! (layer, control) pair so tray hits resolve to the right entry.

use std::collections::HashMap;

use crate::core::cell::{CellFlags, CellKind};
use crate::core::input::{Key, MouseSnapshot};
use crate::core::layer::{CellTag, Layer};
use crate::core::registry::LayerRegistry;
use crate::core::style::TextStyle;
use crate::core::text::{display_width, truncate_to_width};
use crate::error::Result;
use crate::render::Hit;
use crate::runtime::focus::FocusState;
use crate::widgets::controls::ControlMap;

/// Sub-part id on the closed strip, distinct from tray row indexes.
const PART_CLOSED_BODY: i32 = -1;

const GLYPH_CLOSED: char = '▼';
const GLYPH_OPEN: char = '▲';

pub struct DropdownEntry {
    x: i32,
    y: i32,
    width: i32,
    options: Vec<String>,
    selected: usize,
    open: bool,
    tray: String,
    enabled: bool,
    visible: bool,
    style: TextStyle,
}

#[derive(Default)]
pub struct Dropdowns {
    entries: ControlMap<DropdownEntry>,
    trays: HashMap<String, (String, String)>,
}

impl Dropdowns {
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
        options: Vec<String>,
        style: TextStyle,
    ) -> Result<()> {
        self.entries.insert(
            layer,
            alias,
            DropdownEntry {
                x,
                y,
                width: width.max(1),
                options,
                selected: 0,
                open: false,
                tray: format!("{layer}.{alias}.tray"),
                enabled: true,
                visible: true,
                style,
            },
        )
    }

    pub fn selected(&self, layer: &str, alias: &str) -> Result<usize> {
        Ok(self.entries.get(layer, alias)?.selected)
    }

    pub fn selected_item(&self, layer: &str, alias: &str) -> Result<Option<String>> {
        let entry = self.entries.get(layer, alias)?;
        Ok(entry.options.get(entry.selected).cloned())
    }

    pub fn set_selected(&mut self, layer: &str, alias: &str, index: usize) -> Result<()> {
        let entry = self.entries.get_mut(layer, alias)?;
        if !entry.options.is_empty() {
            entry.selected = index.min(entry.options.len() - 1);
        }
        Ok(())
    }

    pub fn is_open(&self, layer: &str, alias: &str) -> Result<bool> {
        Ok(self.entries.get(layer, alias)?.open)
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
        self.trays
            .retain(|tray, (owner, _)| owner != layer && tray != layer);
    }

    pub(crate) fn has_layer(&self, layer: &str) -> bool {
        self.entries.has_layer(layer) || self.trays.contains_key(layer)
    }

    fn open_tray(
        entry: &mut DropdownEntry,
        trays: &mut HashMap<String, (String, String)>,
        layers: &mut LayerRegistry,
        owner: &str,
        control: &str,
    ) -> bool {
        if entry.open || entry.options.is_empty() {
            return false;
        }
        if layers
            .add(
                entry.tray.clone(),
                entry.x,
                entry.y + 1,
                entry.width,
                entry.options.len() as i32,
                1,
                owner,
            )
            .is_err()
        {
            // Owner layer already gone; nothing to pop up over.
            return false;
        }
        let _ = layers.promote_to_top(&entry.tray, owner);
        entry.open = true;
        trays.insert(entry.tray.clone(), (owner.to_string(), control.to_string()));
        true
    }

    fn close_tray(
        entry: &mut DropdownEntry,
        trays: &mut HashMap<String, (String, String)>,
        layers: &mut LayerRegistry,
    ) -> bool {
        if !entry.open {
            return false;
        }
        entry.open = false;
        layers.remove(&entry.tray);
        trays.remove(&entry.tray);
        true
    }

    /// Close every open tray except the named control's. Used before opening
    /// a dropdown and on presses that land outside any dropdown.
    fn close_all_except(
        &mut self,
        layers: &mut LayerRegistry,
        keep: Option<(&str, &str)>,
    ) -> bool {
        let mut closed = Vec::new();
        for (layer, alias, entry) in self.entries.iter_all_mut() {
            if !entry.open {
                continue;
            }
            if let Some((keep_layer, keep_alias)) = keep {
                if layer == keep_layer && alias == keep_alias {
                    continue;
                }
            }
            entry.open = false;
            closed.push(entry.tray.clone());
        }
        for tray in &closed {
            layers.remove(tray);
            self.trays.remove(tray);
        }
        !closed.is_empty()
    }

    pub(crate) fn handle_key(
        &mut self,
        key: &Key,
        focus: &FocusState,
        layers: &mut LayerRegistry,
    ) -> bool {
        let Some(target) = focus.focused_of_kind(CellKind::Dropdown) else {
            return false;
        };
        let owner = target.layer.clone();
        let control = target.control.clone();
        let toggle_open = matches!(key, Key::Char(' ')) || key.name() == Some("enter");
        let closed_others = if toggle_open {
            self.close_all_except(layers, Some((&owner, &control)))
        } else {
            false
        };
        let Ok(entry) = self.entries.get_mut(&owner, &control) else {
            return closed_others;
        };
        if !entry.enabled {
            return closed_others;
        }
        if toggle_open {
            let changed = if entry.open {
                Self::close_tray(entry, &mut self.trays, layers)
            } else {
                Self::open_tray(entry, &mut self.trays, layers, &owner, &control)
            };
            return changed || closed_others;
        }
        match key.name() {
            Some("esc") | Some("escape") => Self::close_tray(entry, &mut self.trays, layers),
            Some("up") if entry.open && entry.selected > 0 => {
                entry.selected -= 1;
                true
            }
            Some("down") if entry.open && entry.selected + 1 < entry.options.len() => {
                entry.selected += 1;
                true
            }
            _ => false,
        }
    }

    /// Press on the strip toggles the tray; press on a tray row selects and
    /// closes; a press anywhere else closes every open tray. Runs on the
    /// press edge only, so the post-scroll second pass cannot re-toggle.
    pub(crate) fn handle_mouse(
        &mut self,
        hit: Option<&Hit>,
        now: &MouseSnapshot,
        prev: &MouseSnapshot,
        focus: &mut FocusState,
        layers: &mut LayerRegistry,
    ) -> bool {
        let press = now.button > 0 && prev.button == 0;
        if !press {
            return false;
        }

        if let Some(hit) = hit.filter(|h| h.kind == CellKind::Dropdown) {
            if let Some((owner, control)) = self.trays.get(&hit.layer).cloned() {
                let Ok(entry) = self.entries.get_mut(&owner, &control) else {
                    return false;
                };
                if hit.part >= 0 && (hit.part as usize) < entry.options.len() {
                    entry.selected = hit.part as usize;
                }
                Self::close_tray(entry, &mut self.trays, layers);
                focus.set_focus(&owner, &control, CellKind::Dropdown);
                return true;
            }

            if self.entries.contains(&hit.layer, &hit.control) {
                let closed_others =
                    self.close_all_except(layers, Some((&hit.layer, &hit.control)));
                let Ok(entry) = self.entries.get_mut(&hit.layer, &hit.control) else {
                    return closed_others;
                };
                if !entry.enabled {
                    return closed_others;
                }
                focus.set_focus(&hit.layer, &hit.control, CellKind::Dropdown);
                if entry.open {
                    Self::close_tray(entry, &mut self.trays, layers);
                } else {
                    Self::open_tray(entry, &mut self.trays, layers, &hit.layer, &hit.control);
                }
                return true;
            }
        }

        self.close_all_except(layers, None)
    }

    pub(crate) fn draw_on(&mut self, layer: &mut Layer, focus: &FocusState) {
        let layer_alias = layer.alias().to_string();

        if let Some((owner, control)) = self.trays.get(&layer_alias) {
            if let Ok(entry) = self.entries.get(owner, control) {
                Self::draw_tray(entry, control, layer);
            }
            return;
        }

        for (alias, entry) in self.entries.iter_layer_mut(&layer_alias) {
            if !entry.visible {
                continue;
            }
            let focused = focus.is_focused(&layer_alias, alias, CellKind::Dropdown);
            let style = if focused {
                entry.style.with_flags(entry.style.flags | CellFlags::BOLD)
            } else {
                entry.style
            };
            let tag = CellTag::control(CellKind::Dropdown, alias).with_part(PART_CLOSED_BODY);
            let text = entry
                .options
                .get(entry.selected)
                .map(|item| truncate_to_width(item, (entry.width - 2).max(0) as usize))
                .unwrap_or("");
            layer.put_str_tagged(entry.x, entry.y, text, &style, &tag);
            for x in display_width(text) as i32..entry.width - 1 {
                layer.put_rune_tagged(entry.x + x, entry.y, ' ', &style, &tag);
            }
            let arrow = if entry.open { GLYPH_OPEN } else { GLYPH_CLOSED };
            layer.put_rune_tagged(entry.x + entry.width - 1, entry.y, arrow, &style, &tag);
        }
    }

    fn draw_tray(entry: &DropdownEntry, control: &str, layer: &mut Layer) {
        for (row, option) in entry.options.iter().enumerate() {
            let tag = CellTag::control(CellKind::Dropdown, control).with_part(row as i32);
            let style = if row == entry.selected {
                entry.style.inverted()
            } else {
                entry.style
            };
            let text = truncate_to_width(option, entry.width as usize);
            layer.put_str_tagged(0, row as i32, text, &style, &tag);
            for x in display_width(text) as i32..entry.width {
                layer.put_rune_tagged(x, row as i32, ' ', &style, &tag);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Dropdowns;
    use crate::core::cell::CellKind;
    use crate::core::input::{Key, MouseSnapshot, Wheel};
    use crate::core::registry::LayerRegistry;
    use crate::core::style::TextStyle;
    use crate::render::Hit;
    use crate::runtime::focus::FocusState;

    fn dropdown_hit(layer: &str, part: i32) -> Hit {
        Hit {
            layer: layer.to_string(),
            parent: String::new(),
            control: "pick".to_string(),
            kind: CellKind::Dropdown,
            part,
            cell_id: 0,
        }
    }

    fn press() -> (MouseSnapshot, MouseSnapshot) {
        (
            MouseSnapshot {
                x: 0,
                y: 0,
                button: 1,
                wheel: Wheel::None,
            },
            MouseSnapshot::start(),
        )
    }

    fn setup() -> (Dropdowns, LayerRegistry) {
        let mut dropdowns = Dropdowns::new();
        let mut layers = LayerRegistry::new();
        layers.add("win", 0, 0, 20, 10, 1, "").unwrap();
        dropdowns
            .add(
                "win",
                "pick",
                2,
                1,
                8,
                vec!["red".to_string(), "green".to_string(), "blue".to_string()],
                TextStyle::default(),
            )
            .unwrap();
        (dropdowns, layers)
    }

    #[test]
    fn body_press_opens_a_tray_layer() {
        let (mut dropdowns, mut layers) = setup();
        let mut focus = FocusState::new();
        let (now, prev) = press();

        assert!(dropdowns.handle_mouse(
            Some(&dropdown_hit("win", -1)),
            &now,
            &prev,
            &mut focus,
            &mut layers,
        ));
        assert!(dropdowns.is_open("win", "pick").unwrap());
        assert!(layers.contains("win.pick.tray"));
        let tray = layers.get("win.pick.tray").unwrap();
        assert_eq!((tray.x, tray.y), (2, 2));
        assert!(focus.is_focused("win", "pick", CellKind::Dropdown));
    }

    #[test]
    fn tray_row_press_selects_and_closes() {
        let (mut dropdowns, mut layers) = setup();
        let mut focus = FocusState::new();
        let (now, prev) = press();

        dropdowns.handle_mouse(Some(&dropdown_hit("win", -1)), &now, &prev, &mut focus, &mut layers);
        assert!(dropdowns.handle_mouse(
            Some(&dropdown_hit("win.pick.tray", 2)),
            &now,
            &prev,
            &mut focus,
            &mut layers,
        ));

        assert_eq!(dropdowns.selected("win", "pick").unwrap(), 2);
        assert_eq!(
            dropdowns.selected_item("win", "pick").unwrap().as_deref(),
            Some("blue")
        );
        assert!(!dropdowns.is_open("win", "pick").unwrap());
        assert!(!layers.contains("win.pick.tray"));
    }

    #[test]
    fn press_elsewhere_closes_open_trays() {
        let (mut dropdowns, mut layers) = setup();
        let mut focus = FocusState::new();
        let (now, prev) = press();

        dropdowns.handle_mouse(Some(&dropdown_hit("win", -1)), &now, &prev, &mut focus, &mut layers);
        assert!(dropdowns.handle_mouse(None, &now, &prev, &mut focus, &mut layers));
        assert!(!dropdowns.is_open("win", "pick").unwrap());
        assert!(!layers.contains("win.pick.tray"));

        // No open tray left: a stray press reports clean.
        assert!(!dropdowns.handle_mouse(None, &now, &prev, &mut focus, &mut layers));
    }

    #[test]
    fn held_button_does_not_retoggle() {
        let (mut dropdowns, mut layers) = setup();
        let mut focus = FocusState::new();
        let (now, prev) = press();

        dropdowns.handle_mouse(Some(&dropdown_hit("win", -1)), &now, &prev, &mut focus, &mut layers);
        // Same button still held on the next event.
        assert!(!dropdowns.handle_mouse(
            Some(&dropdown_hit("win", -1)),
            &now,
            &now,
            &mut focus,
            &mut layers,
        ));
        assert!(dropdowns.is_open("win", "pick").unwrap());
    }

    #[test]
    fn keyboard_toggles_and_steps_options() {
        let (mut dropdowns, mut layers) = setup();
        let mut focus = FocusState::new();
        focus.set_focus("win", "pick", CellKind::Dropdown);

        assert!(dropdowns.handle_key(&Key::Named("enter"), &focus, &mut layers));
        assert!(dropdowns.is_open("win", "pick").unwrap());

        assert!(dropdowns.handle_key(&Key::Named("down"), &focus, &mut layers));
        assert_eq!(dropdowns.selected("win", "pick").unwrap(), 1);
        // Closed again; selection stays.
        assert!(dropdowns.handle_key(&Key::Named("esc"), &focus, &mut layers));
        assert!(!dropdowns.is_open("win", "pick").unwrap());
        assert!(!dropdowns.handle_key(&Key::Named("down"), &focus, &mut layers));
        assert_eq!(dropdowns.selected("win", "pick").unwrap(), 1);
    }

    #[test]
    fn opening_one_dropdown_closes_another() {
        let (mut dropdowns, mut layers) = setup();
        dropdowns
            .add(
                "win",
                "other",
                2,
                5,
                8,
                vec!["a".to_string(), "b".to_string()],
                TextStyle::default(),
            )
            .unwrap();
        let mut focus = FocusState::new();
        let (now, prev) = press();

        dropdowns.handle_mouse(Some(&dropdown_hit("win", -1)), &now, &prev, &mut focus, &mut layers);
        let other = Hit {
            control: "other".to_string(),
            ..dropdown_hit("win", -1)
        };
        dropdowns.handle_mouse(Some(&other), &now, &prev, &mut focus, &mut layers);

        assert!(!dropdowns.is_open("win", "pick").unwrap());
        assert!(dropdowns.is_open("win", "other").unwrap());
        assert!(!layers.contains("win.pick.tray"));
        assert!(layers.contains("win.other.tray"));
    }

    #[test]
    fn removing_the_owner_layer_purges_tray_records() {
        let (mut dropdowns, mut layers) = setup();
        let mut focus = FocusState::new();
        let (now, prev) = press();
        dropdowns.handle_mouse(Some(&dropdown_hit("win", -1)), &now, &prev, &mut focus, &mut layers);

        layers.remove("win");
        dropdowns.remove_layer("win");
        dropdowns.remove_layer("win.pick.tray");

        assert!(!dropdowns.contains("win", "pick"));
        assert!(!dropdowns.has_layer("win.pick.tray"));
        // The tray went down with its parent layer.
        assert!(!layers.contains("win.pick.tray"));
    }
}
