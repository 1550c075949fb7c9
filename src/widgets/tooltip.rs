//! Hover tooltips.
//!
//! A tooltip is a rectangular hot-spot on its owner layer plus a text bubble.
//! The hot-spot is stamped as metadata only, leaving whatever the layer
//! already shows untouched; the bubble appears once the periodic tick sees
//! the pointer rest on the hot-spot for the configured delay.

use std::time::Instant;

use crate::core::cell::CellKind;
use crate::core::input::MouseSnapshot;
use crate::core::layer::{CellTag, Layer, Rect};
use crate::core::style::TextStyle;
use crate::core::text::{display_width, truncate_to_width};
use crate::error::Result;
use crate::render::Hit;
use crate::runtime::focus::FocusState;
use crate::widgets::controls::ControlMap;

pub struct TooltipEntry {
    hot_spot: Rect,
    text: String,
    delay_ms: u64,
    hover_started: Option<Instant>,
    hover_at: (i32, i32),
    drawn: bool,
    visible: bool,
    style: TextStyle,
}

#[derive(Default)]
pub struct Tooltips {
    entries: ControlMap<TooltipEntry>,
}

impl Tooltips {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        layer: &str,
        alias: &str,
        hot_spot: Rect,
        text: impl Into<String>,
        delay_ms: u64,
        style: TextStyle,
    ) -> Result<()> {
        self.entries.insert(
            layer,
            alias,
            TooltipEntry {
                hot_spot,
                text: text.into(),
                delay_ms,
                hover_started: None,
                hover_at: (-1, -1),
                drawn: false,
                visible: true,
                style,
            },
        )
    }

    pub fn set_text(&mut self, layer: &str, alias: &str, text: impl Into<String>) -> Result<()> {
        self.entries.get_mut(layer, alias)?.text = text.into();
        Ok(())
    }

    pub fn set_delay_ms(&mut self, layer: &str, alias: &str, delay_ms: u64) -> Result<()> {
        self.entries.get_mut(layer, alias)?.delay_ms = delay_ms;
        Ok(())
    }

    pub fn set_visible(&mut self, layer: &str, alias: &str, visible: bool) -> Result<()> {
        let entry = self.entries.get_mut(layer, alias)?;
        entry.visible = visible;
        if !visible {
            entry.drawn = false;
            entry.hover_started = None;
        }
        Ok(())
    }

    pub fn is_drawn(&self, layer: &str, alias: &str) -> Result<bool> {
        Ok(self.entries.get(layer, alias)?.drawn)
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

    /// Periodic-tick step while the pointer sits on this tooltip's hot-spot.
    /// Returns dirty once the delay elapses and the bubble appears.
    pub(crate) fn pointer_resting(
        &mut self,
        layer: &str,
        alias: &str,
        at: (i32, i32),
        now: Instant,
    ) -> Result<bool> {
        let entry = self.entries.get_mut(layer, alias)?;
        if !entry.visible || entry.drawn {
            return Ok(false);
        }
        let Some(started) = entry.hover_started else {
            entry.hover_started = Some(now);
            entry.hover_at = at;
            return Ok(false);
        };
        if entry.hover_at != at {
            // Pointer moved within the hot-spot: the rest period starts over.
            entry.hover_started = None;
            return Ok(false);
        }
        if now.duration_since(started).as_millis() as u64 >= entry.delay_ms {
            entry.drawn = true;
            return Ok(true);
        }
        Ok(false)
    }

    /// Hide every bubble and forget hover timers. Returns whether any bubble
    /// was actually showing.
    pub(crate) fn undraw_all(&mut self) -> bool {
        let mut changed = false;
        for (_, _, entry) in self.entries.iter_all_mut() {
            if entry.drawn {
                changed = true;
            }
            entry.drawn = false;
            entry.hover_started = None;
        }
        changed
    }

    /// Phase-one mouse step: a press dismisses any visible bubble.
    pub(crate) fn handle_mouse(
        &mut self,
        _hit: Option<&Hit>,
        now: &MouseSnapshot,
        prev: &MouseSnapshot,
        _focus: &mut FocusState,
    ) -> bool {
        let press = now.button > 0 && prev.button == 0;
        if !press {
            return false;
        }
        self.undraw_all()
    }

    pub(crate) fn draw_on(&mut self, layer: &mut Layer) {
        let layer_alias = layer.alias().to_string();
        let bounds = Rect::new(0, 0, layer.width(), layer.height());
        for (alias, entry) in self.entries.iter_layer_mut(&layer_alias) {
            if !entry.visible {
                continue;
            }

            // Hot-spot: metadata only. The cells keep their glyphs and
            // colors; hit-testing is what needs to know they are ours.
            if let Some(spot) = entry.hot_spot.intersect(&bounds) {
                for y in spot.y..spot.y + spot.h {
                    for x in spot.x..spot.x + spot.w {
                        if let Some(cell) = layer.cell_mut(x, y) {
                            cell.kind = CellKind::Tooltip;
                            cell.control.clear();
                            cell.control.push_str(alias);
                            cell.part = 0;
                        }
                    }
                }
            }

            if !entry.drawn {
                continue;
            }
            let text = truncate_to_width(&entry.text, bounds.w.max(0) as usize);
            let text_width = display_width(text) as i32;
            let mut y = entry.hot_spot.y + entry.hot_spot.h;
            if y >= bounds.h {
                y = entry.hot_spot.y - 1;
            }
            let x = entry.hot_spot.x.min(bounds.w - text_width).max(0);
            let tag = CellTag::control(CellKind::Tooltip, alias.to_string());
            layer.put_str_tagged(x, y, text, &entry.style, &tag);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::Tooltips;
    use crate::core::cell::CellKind;
    use crate::core::layer::{CellTag, Layer, Rect};
    use crate::core::style::TextStyle;

    fn hovering() -> Tooltips {
        let mut tips = Tooltips::new();
        tips.add(
            "win",
            "hint",
            Rect::new(2, 1, 4, 1),
            "saves the file",
            1000,
            TextStyle::default(),
        )
        .unwrap();
        tips
    }

    #[test]
    fn bubble_appears_after_the_delay() {
        let mut tips = hovering();
        let t0 = Instant::now();

        // First sample records the rest position.
        assert!(!tips.pointer_resting("win", "hint", (3, 1), t0).unwrap());
        // Half the delay: still hidden.
        assert!(!tips
            .pointer_resting("win", "hint", (3, 1), t0 + Duration::from_millis(500))
            .unwrap());
        // Past the delay: bubble up, screen dirty.
        assert!(tips
            .pointer_resting("win", "hint", (3, 1), t0 + Duration::from_millis(1100))
            .unwrap());
        assert!(tips.is_drawn("win", "hint").unwrap());
    }

    #[test]
    fn moving_the_pointer_restarts_the_rest_period() {
        let mut tips = hovering();
        let t0 = Instant::now();

        tips.pointer_resting("win", "hint", (3, 1), t0).unwrap();
        // Moved one cell: timer resets, nothing drawn even past the delay.
        assert!(!tips
            .pointer_resting("win", "hint", (4, 1), t0 + Duration::from_millis(1100))
            .unwrap());
        assert!(!tips.is_drawn("win", "hint").unwrap());

        // Rest again from scratch.
        tips.pointer_resting("win", "hint", (4, 1), t0 + Duration::from_millis(1200))
            .unwrap();
        assert!(tips
            .pointer_resting("win", "hint", (4, 1), t0 + Duration::from_millis(2300))
            .unwrap());
    }

    #[test]
    fn undraw_clears_bubbles_and_timers() {
        let mut tips = hovering();
        let t0 = Instant::now();
        tips.pointer_resting("win", "hint", (3, 1), t0).unwrap();
        tips.pointer_resting("win", "hint", (3, 1), t0 + Duration::from_millis(1100))
            .unwrap();

        assert!(tips.undraw_all());
        assert!(!tips.is_drawn("win", "hint").unwrap());
        // Nothing showing the second time around.
        assert!(!tips.undraw_all());
    }

    #[test]
    fn hot_spot_is_stamped_without_touching_glyphs() {
        let mut tips = hovering();
        let mut layer = Layer::new("win", "", 0, 0, 20, 5, 1).unwrap();
        layer.put_str_tagged(0, 1, "save button", &TextStyle::default(), &CellTag::plain());

        tips.draw_on(&mut layer);

        let cell = layer.cell(2, 1).unwrap();
        assert_eq!(cell.rune, 'v');
        assert_eq!(cell.kind, CellKind::Tooltip);
        assert_eq!(cell.control, "hint");
        // Outside the hot-spot: untouched.
        assert_eq!(layer.cell(0, 1).unwrap().kind, CellKind::Plain);
    }

    #[test]
    fn bubble_renders_below_the_hot_spot() {
        let mut tips = hovering();
        let t0 = Instant::now();
        tips.pointer_resting("win", "hint", (3, 1), t0).unwrap();
        tips.pointer_resting("win", "hint", (3, 1), t0 + Duration::from_millis(1100))
            .unwrap();

        let mut layer = Layer::new("win", "", 0, 0, 20, 5, 1).unwrap();
        tips.draw_on(&mut layer);

        // Hot-spot row 1, height 1: bubble lands on row 2 at the spot's x.
        assert_eq!(layer.cell(2, 2).unwrap().rune, 's');
        assert_eq!(layer.cell(3, 2).unwrap().rune, 'a');
        assert_eq!(layer.cell(2, 2).unwrap().kind, CellKind::Tooltip);
    }
}
