//! Event routing: keyboard dispatch, the two-phase mouse pass, window and
//! scrollbar-handle dragging, and the periodic tooltip step.

use std::time::Instant;

use crate::core::cell::{CellKind, PART_SCROLL_HANDLE};
use crate::core::input::{Event, Key, Modifiers, MouseInput, MouseSnapshot};
use crate::error::dirty_or_clean;
use crate::logging;
use crate::render::Hit;
use crate::runtime::context::Context;
use crate::runtime::focus::{DragState, FocusTarget};

impl Context {
    /// Route one decoded terminal event. Returns whether the screen needs
    /// recomposing.
    pub fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Key { key, modifiers } => self.handle_key_event(key, modifiers),
            Event::Mouse(input) => self.handle_mouse_event(input),
        }
    }

    /// Keyboard path: update the modifier mask, let tab walk the focus
    /// ring, hand everything else to the widgets in dispatch order, then
    /// park the key on the FIFO for the application.
    pub fn handle_key_event(&mut self, key: Key, modifiers: Modifiers) -> bool {
        self.focus.modifiers = modifiers;

        let dirty = if key.is("tab") {
            let widgets = &self.widgets;
            self.focus.next_tab_index(|target| widgets.exists(target));
            true
        } else {
            self.widgets.route_key(&key, &self.focus, &mut self.layers)
        };

        if logging::debug_enabled() {
            logging::log_debug("router", &format!("key {key} dirty={dirty}"));
        }
        self.keyboard.push(key);
        dirty
    }

    /// Mouse path: swap the snapshot pair, raise the pressed window, step
    /// the drag machine, then run both widget dispatch phases.
    pub fn handle_mouse_event(&mut self, input: MouseInput) -> bool {
        self.mouse.advance(MouseSnapshot::from_input(&input));
        let now = self.mouse.current;
        let prev = self.mouse.previous;

        let hit = self.hit_at(now.x, now.y);
        let press = now.button > 0 && prev.button == 0;

        let mut dirty = false;
        if press {
            if let Some(hit) = hit.as_ref() {
                if !hit.layer.is_empty() {
                    dirty |= self.bring_to_front(&hit.layer);
                }
            }
        }

        dirty |= self.update_drag(hit.as_ref(), &now, &prev);
        dirty |= self
            .widgets
            .route_mouse_phase1(hit.as_ref(), &now, &prev, &mut self.focus, &mut self.layers);
        dirty |= self.widgets.route_mouse_phase2();

        if press && logging::debug_enabled() {
            let target = hit
                .as_ref()
                .map(|h| format!("{}/{}", h.layer, h.control))
                .unwrap_or_default();
            logging::log_debug(
                "router",
                &format!("press ({},{}) target={target} dirty={dirty}", now.x, now.y),
            );
        }
        dirty
    }

    /// Raise the root window above `layer_alias` to the top of the root
    /// scope. Returns whether the stacking order actually changed.
    fn bring_to_front(&mut self, layer_alias: &str) -> bool {
        let Ok(root) = self.layers.root_of(layer_alias) else {
            return false;
        };
        let top_root = self
            .layers
            .sorted_by_z_order()
            .into_iter()
            .rev()
            .map(|(alias, _)| alias)
            .find(|alias| {
                self.layers
                    .get(alias)
                    .map(|layer| layer.parent().is_empty())
                    .unwrap_or(false)
            });
        if self.layers.promote_to_top(&root, "").is_err() {
            return false;
        }
        top_root.as_deref() != Some(root.as_str())
    }

    /// One step of the drag machine. A release always lands in idle; a
    /// press on a frame-top row or a scrollbar handle arms a drag; while
    /// the button stays down the armed drag keeps applying deltas.
    fn update_drag(&mut self, hit: Option<&Hit>, now: &MouseSnapshot, prev: &MouseSnapshot) -> bool {
        if now.button == 0 {
            self.focus.drag = DragState::Idle;
            return false;
        }

        if prev.button == 0 {
            if self.focus.drag != DragState::Idle {
                return false;
            }
            let Some(hit) = hit else {
                return false;
            };
            match hit.kind {
                CellKind::FrameTop => {
                    self.focus.drag = DragState::Window;
                    self.focus.set_focus(hit.layer.clone(), "", CellKind::FrameTop);
                }
                CellKind::Scrollbar if hit.part == PART_SCROLL_HANDLE => {
                    self.focus.drag = DragState::ScrollbarHandle;
                    self.focus
                        .set_focus(hit.layer.clone(), hit.control.clone(), CellKind::Scrollbar);
                }
                _ => {}
            }
            return false;
        }

        let dx = now.x - prev.x;
        let dy = now.y - prev.y;
        match self.focus.drag {
            DragState::Window => self.drag_window_by(dx, dy),
            DragState::ScrollbarHandle => {
                let Some(target) = self.focus.focused_of_kind(CellKind::Scrollbar).cloned() else {
                    return false;
                };
                dirty_or_clean(
                    self.widgets
                        .scrollbars
                        .drag_handle(&target.layer, &target.control, dx, dy),
                )
                .unwrap_or(false)
            }
            DragState::Idle => false,
        }
    }

    /// Move the window being dragged by its frame-top row. The move is
    /// reverted outright when it would push the window's top row outside
    /// its parent viewport (the terminal for root windows), or slide the
    /// window so far left or right that nothing of it stays visible. Two
    /// columns on the left are kept for the drop shadow.
    fn drag_window_by(&mut self, dx: i32, dy: i32) -> bool {
        if dx == 0 && dy == 0 {
            return false;
        }
        let Some(target) = self.focus.focused_of_kind(CellKind::FrameTop).cloned() else {
            return false;
        };

        let (view_w, view_h) = match self.layers.get(&target.layer) {
            Ok(layer) if !layer.parent().is_empty() => match self.layers.get(layer.parent()) {
                Ok(parent) => (parent.width(), parent.height()),
                Err(_) => (self.columns(), self.rows()),
            },
            Ok(_) => (self.columns(), self.rows()),
            Err(_) => return false,
        };

        let Ok(layer) = self.layers.get_mut(&target.layer) else {
            return false;
        };
        let next_x = layer.x + dx;
        let next_y = layer.y + dy;
        let min_x = -layer.width() + 2;
        if next_x <= min_x || next_x >= view_w || next_y < 0 || next_y >= view_h {
            return false;
        }
        layer.x = next_x;
        layer.y = next_y;
        true
    }

    /// Periodic step, driven by the runtime tick. Arms and fires tooltip
    /// bubbles under a resting pointer; tears every bubble down once the
    /// pointer leaves.
    pub fn handle_tick(&mut self, now: Instant) -> bool {
        let position = (self.mouse.current.x, self.mouse.current.y);
        let hit = self.hit_at(position.0, position.1);

        let over_tooltip = hit.as_ref().is_some_and(|hit| {
            hit.kind == CellKind::Tooltip
                && self.focus.drag == DragState::Idle
                && self.widgets.tooltips.contains(&hit.layer, &hit.control)
        });

        if over_tooltip {
            let Some(hit) = hit else {
                return false;
            };
            self.focus.set_highlighted(FocusTarget::new(
                hit.layer.clone(),
                hit.control.clone(),
                CellKind::Tooltip,
            ));
            return matches!(
                self.widgets
                    .tooltips
                    .pointer_resting(&hit.layer, &hit.control, position, now),
                Ok(true)
            );
        }

        let leaving = self
            .focus
            .highlighted()
            .is_some_and(|target| target.kind == CellKind::Tooltip);
        if leaving {
            self.widgets.tooltips.undraw_all();
            self.focus.clear_highlighted();
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crate::core::cell::CellKind;
    use crate::core::input::{Key, Modifiers, MouseInput, Wheel};
    use crate::core::layer::Rect;
    use crate::core::style::TextStyle;
    use crate::render::border;
    use crate::runtime::context::Context;
    use crate::runtime::focus::DragState;

    fn mouse(x: i32, y: i32, buttons: u32) -> MouseInput {
        MouseInput {
            x,
            y,
            buttons,
            wheel: Wheel::None,
        }
    }

    fn framed_window(ctx: &mut Context, alias: &str, x: i32, y: i32, w: i32, h: i32, z: i32) {
        ctx.add_layer(alias, x, y, w, h, z, "").expect("layer");
        let layer = ctx.layer_mut(alias).expect("layer");
        border::draw_frame(
            layer,
            Rect::new(0, 0, w, h),
            "win",
            &TextStyle::default(),
            alias,
        );
    }

    #[test]
    fn tab_walks_the_ring_and_reports_dirty() {
        let mut ctx = Context::new(40, 20);
        ctx.add_layer("win", 0, 0, 20, 5, 1, "").expect("layer");
        for alias in ["a", "b"] {
            ctx.widgets
                .buttons
                .add("win", alias, 0, 0, 6, alias, TextStyle::default())
                .expect("button");
            ctx.focus.add_to_tab_index("win", alias, CellKind::Button);
        }

        assert!(ctx.handle_key_event(Key::Named("tab"), Modifiers::empty()));
        assert!(ctx.focus.is_focused("win", "b", CellKind::Button));
        assert!(ctx.handle_key_event(Key::Named("tab"), Modifiers::empty()));
        assert!(ctx.focus.is_focused("win", "a", CellKind::Button));
    }

    #[test]
    fn every_key_lands_on_the_fifo() {
        let mut ctx = Context::new(40, 20);
        ctx.handle_key_event(Key::Char('x'), Modifiers::empty());
        ctx.handle_key_event(Key::Named("tab"), Modifiers::empty());
        assert_eq!(ctx.keyboard.next_key(), Some(Key::Char('x')));
        assert_eq!(ctx.keyboard.next_key(), Some(Key::Named("tab")));
        assert_eq!(ctx.keyboard.next_key(), None);
    }

    #[test]
    fn frame_top_press_arms_and_moves_a_window() {
        let mut ctx = Context::new(40, 20);
        framed_window(&mut ctx, "win", 2, 2, 10, 4, 1);
        ctx.refresh();

        ctx.handle_mouse_event(mouse(5, 2, 1));
        assert_eq!(ctx.focus.drag, DragState::Window);

        let dirty = ctx.handle_mouse_event(mouse(7, 3, 1));
        assert!(dirty);
        let layer = ctx.layer("win").expect("layer");
        assert_eq!((layer.x, layer.y), (4, 3));

        ctx.handle_mouse_event(mouse(7, 3, 0));
        assert_eq!(ctx.focus.drag, DragState::Idle);
    }

    #[test]
    fn drag_that_would_hide_the_window_is_reverted() {
        let mut ctx = Context::new(40, 20);
        framed_window(&mut ctx, "win", 2, 2, 10, 4, 1);
        ctx.refresh();

        ctx.handle_mouse_event(mouse(5, 2, 1));
        let dirty = ctx.handle_mouse_event(mouse(-20, 2, 1));
        assert!(!dirty);
        let layer = ctx.layer("win").expect("layer");
        assert_eq!((layer.x, layer.y), (2, 2));

        // Re-arm and try to cross the top edge; also rejected.
        ctx.handle_mouse_event(mouse(5, 2, 0));
        ctx.handle_mouse_event(mouse(5, 2, 1));
        assert!(!ctx.handle_mouse_event(mouse(5, -1, 1)));
        assert_eq!(ctx.layer("win").expect("layer").y, 2);
    }

    #[test]
    fn press_raises_the_window_under_the_pointer() {
        let mut ctx = Context::new(40, 20);
        framed_window(&mut ctx, "back", 0, 0, 12, 6, 1);
        framed_window(&mut ctx, "front", 4, 2, 12, 6, 2);
        ctx.refresh();

        // (1, 1) shows only "back"; pressing there brings it to the top.
        let dirty = ctx.handle_mouse_event(mouse(1, 1, 1));
        assert!(dirty);
        ctx.refresh();
        let hit = ctx.hit_at(6, 3).expect("hit");
        assert_eq!(hit.layer, "back");
    }

    #[test]
    fn handle_drag_scrolls_through_the_router() {
        let mut ctx = Context::new(40, 20);
        ctx.add_layer("win", 0, 0, 5, 12, 1, "").expect("layer");
        ctx.widgets
            .scrollbars
            .add("win", "bar", 0, 0, 10, 33, false, TextStyle::default())
            .expect("scrollbar");
        ctx.refresh();

        // Handle starts just below the up arrow.
        ctx.handle_mouse_event(mouse(0, 1, 1));
        assert_eq!(ctx.focus.drag, DragState::ScrollbarHandle);

        let dirty = ctx.handle_mouse_event(mouse(0, 3, 1));
        assert!(dirty);
        let entry = ctx.widgets.scrollbars.get("win", "bar").expect("bar");
        assert_eq!(entry.handle(), 2);
        assert_eq!(entry.value(), 6);
    }

    #[test]
    fn tooltip_arms_fires_and_tears_down() {
        let mut ctx = Context::new(40, 20);
        ctx.add_layer("win", 0, 0, 20, 6, 1, "").expect("layer");
        ctx.widgets
            .tooltips
            .add(
                "win",
                "tip",
                Rect::new(2, 1, 6, 1),
                "hello",
                500,
                TextStyle::default(),
            )
            .expect("tooltip");
        ctx.refresh();
        ctx.handle_mouse_event(mouse(3, 1, 0));

        let t0 = Instant::now();
        assert!(!ctx.handle_tick(t0));
        assert!(ctx.handle_tick(t0 + Duration::from_millis(600)));
        assert!(ctx.widgets.tooltips.is_drawn("win", "tip").expect("tip"));

        // Pointer leaves the hot-spot: the bubble comes down.
        ctx.refresh();
        ctx.handle_mouse_event(mouse(15, 5, 0));
        assert!(ctx.handle_tick(t0 + Duration::from_millis(700)));
        assert!(!ctx.widgets.tooltips.is_drawn("win", "tip").expect("tip"));
    }
}
