//! Shared application state: layer tree, styles, widget managers, focus,
//! input snapshots, and the most recently composed screen.

use std::collections::VecDeque;

use crate::core::cell::Cell;
use crate::core::input::{Key, MouseSnapshot};
use crate::core::layer::Layer;
use crate::core::registry::LayerRegistry;
use crate::core::style::StyleSheet;
use crate::error::Result;
use crate::render::{compose, hit_test, Hit};
use crate::runtime::focus::FocusState;
use crate::widgets::Widgets;

/// Keys wait here until the application drains them.
const KEY_FIFO_CAP: usize = 64;

/// Keyboard state fed by the event loop.
///
/// Terminals report key presses only, never releases, so a key stays in the
/// held set until the application clears it after acting on it.
#[derive(Default)]
pub struct KeyboardState {
    fifo: VecDeque<Key>,
    held: Vec<Key>,
}

impl KeyboardState {
    pub(crate) fn push(&mut self, key: Key) {
        if self.fifo.len() == KEY_FIFO_CAP {
            self.fifo.pop_front();
        }
        self.fifo.push_back(key);
        if !self.held.contains(&key) {
            self.held.push(key);
        }
    }

    /// Oldest key not yet drained, if any.
    pub fn next_key(&mut self) -> Option<Key> {
        self.fifo.pop_front()
    }

    pub fn has_pending(&self) -> bool {
        !self.fifo.is_empty()
    }

    /// True while `id` sits in the held set. Accepts the same names
    /// [`Key::is`] does, e.g. `"enter"`, `"f1"`, or a printable character.
    pub fn is_pressed(&self, id: &str) -> bool {
        self.held.iter().any(|key| key.is(id))
    }

    pub fn clear_pressed(&mut self, id: &str) {
        self.held.retain(|key| !key.is(id));
    }

    pub fn clear_all_pressed(&mut self) {
        self.held.clear();
    }
}

/// Current and previous pointer snapshots. Edge detection (press, release,
/// drag delta) always works from this pair.
#[derive(Debug, Clone, Copy)]
pub struct MouseState {
    pub current: MouseSnapshot,
    pub previous: MouseSnapshot,
}

impl Default for MouseState {
    fn default() -> Self {
        Self {
            current: MouseSnapshot::start(),
            previous: MouseSnapshot::start(),
        }
    }
}

impl MouseState {
    /// Shift `current` into `previous` and install the new snapshot.
    pub(crate) fn advance(&mut self, next: MouseSnapshot) {
        self.previous = std::mem::replace(&mut self.current, next);
    }
}

/// Everything an application owns between frames.
///
/// The registry keeps what the application painted; the widget managers
/// keep control state. [`Context::refresh`] merges the two into a composed
/// screen without disturbing either side: widgets draw into a throwaway
/// copy of the registry, so cells the application painted survive controls
/// that come and go (tooltip bubbles, dropped-down trays).
pub struct Context {
    pub layers: LayerRegistry,
    pub styles: StyleSheet,
    pub widgets: Widgets,
    pub focus: FocusState,
    pub keyboard: KeyboardState,
    pub mouse: MouseState,
    screen: Option<Layer>,
    columns: i32,
    rows: i32,
    backdrop: Cell,
}

impl Context {
    pub fn new(columns: i32, rows: i32) -> Self {
        Self {
            layers: LayerRegistry::new(),
            styles: StyleSheet::new(),
            widgets: Widgets::new(),
            focus: FocusState::new(),
            keyboard: KeyboardState::default(),
            mouse: MouseState::default(),
            screen: None,
            columns: columns.max(0),
            rows: rows.max(0),
            backdrop: Cell::default(),
        }
    }

    pub fn columns(&self) -> i32 {
        self.columns
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    /// Adopt a new viewport size. The next [`Context::refresh`] composes at
    /// this size; layers keep their own geometry.
    pub fn set_viewport(&mut self, columns: i32, rows: i32) {
        self.columns = columns.max(0);
        self.rows = rows.max(0);
    }

    /// The cell every part of the screen no layer covers is filled with.
    pub fn set_backdrop(&mut self, cell: Cell) {
        self.backdrop = cell;
    }

    /// Register a layer. Pass an empty `parent` for a root layer.
    #[allow(clippy::too_many_arguments)]
    pub fn add_layer(
        &mut self,
        alias: &str,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        z: i32,
        parent: &str,
    ) -> Result<()> {
        self.layers.add(alias, x, y, width, height, z, parent)
    }

    pub fn layer(&self, alias: &str) -> Result<&Layer> {
        self.layers.get(alias)
    }

    pub fn layer_mut(&mut self, alias: &str) -> Result<&mut Layer> {
        self.layers.get_mut(alias)
    }

    /// Remove a layer, every layer nested under it, and every control
    /// registered on any of them. Unknown aliases are a no-op.
    pub fn remove_layer(&mut self, alias: &str) {
        let before: Vec<String> = self.layers.aliases().map(str::to_string).collect();
        self.layers.remove(alias);
        for gone in before {
            if !self.layers.contains(&gone) {
                self.widgets.remove_layer(&gone);
            }
        }
    }

    /// Compose the next frame and remember it for hit testing.
    ///
    /// Widget faces are drawn into a scratch copy of the registry, then the
    /// copy is flattened. The registry itself is left untouched.
    pub fn refresh(&mut self) -> &Layer {
        let mut scratch = self.layers.clone();
        let aliases: Vec<String> = scratch.aliases().map(str::to_string).collect();
        for alias in &aliases {
            if let Ok(layer) = scratch.get_mut(alias) {
                self.widgets.draw_layer(layer, &self.focus);
            }
        }
        let composed = compose(&scratch, self.columns, self.rows, &self.backdrop);
        self.screen.insert(composed)
    }

    /// The screen composed by the last [`Context::refresh`], if any.
    pub fn screen(&self) -> Option<&Layer> {
        self.screen.as_ref()
    }

    /// Which layer and control owns the composed cell at (`x`, `y`).
    /// `None` until the first refresh or outside the viewport.
    pub fn hit_at(&self, x: i32, y: i32) -> Option<Hit> {
        let screen = self.screen.as_ref()?;
        hit_test(screen, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::{Context, KeyboardState, KEY_FIFO_CAP};
    use crate::core::cell::CellKind;
    use crate::core::input::Key;
    use crate::core::style::TextStyle;

    fn context_with_button() -> Context {
        let mut ctx = Context::new(20, 6);
        ctx.add_layer("win", 0, 0, 12, 3, 1, "").expect("layer");
        ctx.widgets
            .buttons
            .add("win", "save", 1, 1, 8, "Save", TextStyle::default())
            .expect("button");
        ctx
    }

    #[test]
    fn refresh_composes_widgets_without_touching_the_registry() {
        let mut ctx = context_with_button();
        ctx.refresh();

        let hit = ctx.hit_at(4, 1).expect("hit");
        assert_eq!(hit.kind, CellKind::Button);
        assert_eq!(hit.control, "save");

        // The application's grid never saw the button face.
        let cell = ctx.layer("win").unwrap().cell(4, 1).expect("cell");
        assert_eq!(cell.kind, CellKind::Plain);
        assert_eq!(cell.rune, ' ');
    }

    #[test]
    fn hit_at_requires_a_composed_screen() {
        let ctx = context_with_button();
        assert!(ctx.hit_at(4, 1).is_none());
    }

    #[test]
    fn remove_layer_takes_controls_of_descendants_with_it() {
        let mut ctx = context_with_button();
        ctx.add_layer("inner", 1, 1, 6, 2, 2, "win").expect("inner");
        ctx.widgets
            .checkboxes
            .add("inner", "opt", 0, 0, "Opt", TextStyle::default())
            .expect("checkbox");

        ctx.remove_layer("win");
        assert!(!ctx.layers.contains("win"));
        assert!(!ctx.layers.contains("inner"));
        assert!(!ctx.widgets.layer_has_controls("win"));
        assert!(!ctx.widgets.layer_has_controls("inner"));
    }

    #[test]
    fn keyboard_fifo_drops_oldest_past_capacity() {
        let mut keys = KeyboardState::default();
        for i in 0..(KEY_FIFO_CAP + 2) {
            keys.push(Key::Char(char::from(b'a' + (i % 26) as u8)));
        }
        assert_eq!(keys.next_key(), Some(Key::Char('c')));
    }

    #[test]
    fn held_keys_stay_until_cleared() {
        let mut keys = KeyboardState::default();
        keys.push(Key::Named("enter"));
        keys.push(Key::Char('q'));
        assert!(keys.is_pressed("enter"));
        assert!(keys.is_pressed("q"));

        keys.clear_pressed("enter");
        assert!(!keys.is_pressed("enter"));
        assert!(keys.is_pressed("q"));

        keys.clear_all_pressed();
        assert!(!keys.is_pressed("q"));
    }
}
