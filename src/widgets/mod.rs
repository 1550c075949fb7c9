//! Widget managers and the dispatch fabric that feeds them.
//!
//! Each widget kind has a manager keyed (layer alias, control alias); the
//! [`Widgets`] bundle owns all of them and fixes the two orders everything
//! else relies on: the per-layer draw order (pop-up sources draw late so
//! their metadata wins) and the event dispatch order.

pub mod button;
pub mod checkbox;
mod controls;
pub mod dropdown;
pub mod label;
pub mod progress;
pub mod radio;
pub mod scrollbar;
pub mod selector;
pub mod text_field;
pub mod textbox;
pub mod tooltip;

pub use button::Buttons;
pub use checkbox::Checkboxes;
pub use dropdown::Dropdowns;
pub use label::Labels;
pub use progress::ProgressBars;
pub use radio::Radios;
pub use scrollbar::{handle_from_value, value_from_handle, Scrollbars};
pub use selector::Selectors;
pub use text_field::TextFields;
pub use textbox::Textboxes;
pub use tooltip::Tooltips;

use crate::core::cell::CellKind;
use crate::core::input::{Key, MouseSnapshot};
use crate::core::layer::Layer;
use crate::core::registry::LayerRegistry;
use crate::render::Hit;
use crate::runtime::focus::{FocusState, FocusTarget};

/// Every widget manager, one field per kind.
#[derive(Default)]
pub struct Widgets {
    pub buttons: Buttons,
    pub text_fields: TextFields,
    pub checkboxes: Checkboxes,
    pub dropdowns: Dropdowns,
    pub selectors: Selectors,
    pub scrollbars: Scrollbars,
    pub textboxes: Textboxes,
    pub radios: Radios,
    pub progress_bars: ProgressBars,
    pub labels: Labels,
    pub tooltips: Tooltips,
}

impl Widgets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw every control owned by `layer` into its grid. The order is
    /// fixed: tooltips stamp their hot-spot metadata last so it overrides
    /// whatever was drawn underneath.
    pub(crate) fn draw_layer(&mut self, layer: &mut Layer, focus: &FocusState) {
        self.buttons.draw_on(layer, focus);
        self.text_fields.draw_on(layer, focus);
        self.checkboxes.draw_on(layer, focus);
        self.dropdowns.draw_on(layer, focus);
        self.selectors.draw_on(layer, focus);
        self.scrollbars.draw_on(layer, focus);
        self.textboxes.draw_on(layer);
        self.radios.draw_on(layer, focus);
        self.progress_bars.draw_on(layer);
        self.labels.draw_on(layer);
        self.tooltips.draw_on(layer);
    }

    /// Keyboard dispatch. Focus kinds are exclusive, so at most one manager
    /// acts; the rest report clean.
    pub(crate) fn route_key(
        &mut self,
        key: &Key,
        focus: &FocusState,
        layers: &mut LayerRegistry,
    ) -> bool {
        let mut dirty = self.scrollbars.handle_key(key, focus);
        dirty |= self.text_fields.handle_key(key, focus);
        dirty |= self.textboxes.handle_key(key, focus, &mut self.scrollbars);
        dirty |= self.selectors.handle_key(key, focus, &mut self.scrollbars);
        dirty |= self.dropdowns.handle_key(key, focus, layers);
        dirty
    }

    /// First mouse pass over the composed hit.
    pub(crate) fn route_mouse_phase1(
        &mut self,
        hit: Option<&Hit>,
        now: &MouseSnapshot,
        prev: &MouseSnapshot,
        focus: &mut FocusState,
        layers: &mut LayerRegistry,
    ) -> bool {
        let mut dirty = self.tooltips.handle_mouse(hit, now, prev, focus);
        dirty |= self.text_fields.handle_mouse(hit, now, prev, focus);
        dirty |= self
            .selectors
            .handle_mouse(hit, now, prev, focus, &mut self.scrollbars);
        dirty |= self
            .textboxes
            .handle_mouse(hit, now, prev, focus, &mut self.scrollbars);
        dirty |= self.radios.handle_mouse(hit, now, prev, focus);
        dirty |= self.dropdowns.handle_mouse(hit, now, prev, focus, layers);
        dirty |= self.checkboxes.handle_mouse(hit, now, prev, focus);
        dirty |= self.buttons.handle_mouse(hit, now, prev, focus);
        dirty |= self.scrollbars.handle_mouse(hit, now, prev, focus);
        dirty
    }

    /// Post-scroll pass: scrolling widgets re-read their attached scrollbars
    /// so a bar moved earlier in the same event (click, drag, or key) shows
    /// up in the widget's viewport before the frame is composed.
    pub(crate) fn route_mouse_phase2(&mut self) -> bool {
        let mut dirty = self.selectors.sync_from_scrollbars(&self.scrollbars);
        dirty |= self.textboxes.sync_from_scrollbars(&self.scrollbars);
        dirty
    }

    /// Forget every control registered on a layer. Called for each alias a
    /// registry removal takes down, trays included.
    pub(crate) fn remove_layer(&mut self, alias: &str) {
        self.buttons.remove_layer(alias);
        self.text_fields.remove_layer(alias);
        self.checkboxes.remove_layer(alias);
        self.dropdowns.remove_layer(alias);
        self.selectors.remove_layer(alias);
        self.scrollbars.remove_layer(alias);
        self.textboxes.remove_layer(alias);
        self.radios.remove_layer(alias);
        self.progress_bars.remove_layer(alias);
        self.labels.remove_layer(alias);
        self.tooltips.remove_layer(alias);
    }

    pub(crate) fn layer_has_controls(&self, alias: &str) -> bool {
        self.buttons.has_layer(alias)
            || self.text_fields.has_layer(alias)
            || self.checkboxes.has_layer(alias)
            || self.dropdowns.has_layer(alias)
            || self.selectors.has_layer(alias)
            || self.scrollbars.has_layer(alias)
            || self.textboxes.has_layer(alias)
            || self.radios.has_layer(alias)
            || self.progress_bars.has_layer(alias)
            || self.labels.has_layer(alias)
            || self.tooltips.has_layer(alias)
    }

    /// Does a focus target still point at a live control? Stale tab-ring
    /// entries fail this and get skipped.
    pub(crate) fn exists(&self, target: &FocusTarget) -> bool {
        let layer = target.layer.as_str();
        let control = target.control.as_str();
        match target.kind {
            CellKind::Button => self.buttons.contains(layer, control),
            CellKind::TextField => self.text_fields.contains(layer, control),
            CellKind::Checkbox => self.checkboxes.contains(layer, control),
            CellKind::Dropdown => self.dropdowns.contains(layer, control),
            CellKind::SelectorItem => self.selectors.contains(layer, control),
            CellKind::Scrollbar => self.scrollbars.contains(layer, control),
            CellKind::Textbox => self.textboxes.contains(layer, control),
            CellKind::Radio => self.radios.contains(layer, control),
            CellKind::ProgressBar => self.progress_bars.contains(layer, control),
            CellKind::Label => self.labels.contains(layer, control),
            CellKind::Tooltip => self.tooltips.contains(layer, control),
            CellKind::Plain | CellKind::FrameTop => false,
        }
    }
}
