//! Interaction state: focus triple, tab ring, drag machine, modifier mask.
//!
//! Focus is a weak reference, a (layer, control, kind) triple. Nothing here
//! checks that the target still exists; widget managers validate on access,
//! and the tab ring skips entries its caller reports as stale. That keeps
//! layer deletion cheap: the ring is never compacted.

use crate::core::cell::CellKind;
use crate::core::input::Modifiers;

/// The addressing triple for an interactive control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTarget {
    pub layer: String,
    pub control: String,
    pub kind: CellKind,
}

impl FocusTarget {
    pub fn new(layer: impl Into<String>, control: impl Into<String>, kind: CellKind) -> Self {
        Self {
            layer: layer.into(),
            control: control.into(),
            kind,
        }
    }
}

/// What the pressed mouse button is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Moving a window by its frame-top row.
    Window,
    /// Dragging a scrollbar handle along its track.
    ScrollbarHandle,
}

#[derive(Default)]
pub struct FocusState {
    focused: Option<FocusTarget>,
    /// Control the mouse most recently rested on; used to un-highlight when
    /// the cursor leaves a selector item or tooltip hot-spot.
    highlighted: Option<FocusTarget>,
    pub drag: DragState,
    ring: Vec<FocusTarget>,
    tab_index: usize,
    pub modifiers: Modifiers,
}

impl FocusState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<&FocusTarget> {
        self.focused.as_ref()
    }

    /// Focus a control directly. If the triple is on the tab ring, tabbing
    /// continues from it.
    pub fn set_focus(&mut self, layer: impl Into<String>, control: impl Into<String>, kind: CellKind) {
        let target = FocusTarget::new(layer, control, kind);
        if let Some(position) = self.ring.iter().position(|entry| *entry == target) {
            self.tab_index = position;
        }
        self.focused = Some(target);
    }

    pub fn clear_focus(&mut self) {
        self.focused = None;
    }

    pub fn is_focused(&self, layer: &str, control: &str, kind: CellKind) -> bool {
        self.focused
            .as_ref()
            .is_some_and(|t| t.layer == layer && t.control == control && t.kind == kind)
    }

    /// The focus triple if (and only if) it has the given kind.
    pub fn focused_of_kind(&self, kind: CellKind) -> Option<&FocusTarget> {
        self.focused.as_ref().filter(|t| t.kind == kind)
    }

    pub fn highlighted(&self) -> Option<&FocusTarget> {
        self.highlighted.as_ref()
    }

    pub fn set_highlighted(&mut self, target: FocusTarget) {
        self.highlighted = Some(target);
    }

    pub fn clear_highlighted(&mut self) {
        self.highlighted = None;
    }

    /// Append a control to the tab ring. Order of registration is tab order.
    pub fn add_to_tab_index(
        &mut self,
        layer: impl Into<String>,
        control: impl Into<String>,
        kind: CellKind,
    ) {
        self.ring.push(FocusTarget::new(layer, control, kind));
    }

    /// Advance the ring and focus the next entry that still resolves.
    ///
    /// `exists` reports whether a ring entry is still backed by a live
    /// control; stale entries are skipped. One full lap without a live entry
    /// leaves focus unchanged and returns `None`.
    pub fn next_tab_index<F>(&mut self, exists: F) -> Option<&FocusTarget>
    where
        F: Fn(&FocusTarget) -> bool,
    {
        if self.ring.is_empty() {
            return None;
        }
        let len = self.ring.len();
        for step in 1..=len {
            let candidate = (self.tab_index + step) % len;
            if exists(&self.ring[candidate]) {
                self.tab_index = candidate;
                let target = self.ring[candidate].clone();
                self.focused = Some(target);
                return self.focused.as_ref();
            }
        }
        None
    }

    pub fn tab_ring_len(&self) -> usize {
        self.ring.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{DragState, FocusState, FocusTarget};
    use crate::core::cell::CellKind;

    #[test]
    fn focus_triple_equality() {
        let mut focus = FocusState::new();
        focus.set_focus("win", "ok", CellKind::Button);
        assert!(focus.is_focused("win", "ok", CellKind::Button));
        assert!(!focus.is_focused("win", "ok", CellKind::Checkbox));
        assert!(!focus.is_focused("win", "cancel", CellKind::Button));

        assert!(focus.focused_of_kind(CellKind::Button).is_some());
        assert!(focus.focused_of_kind(CellKind::Scrollbar).is_none());

        focus.clear_focus();
        assert!(focus.focused().is_none());
    }

    #[test]
    fn tab_ring_cycles_in_registration_order() {
        let mut focus = FocusState::new();
        focus.add_to_tab_index("win", "a", CellKind::Button);
        focus.add_to_tab_index("win", "b", CellKind::Checkbox);
        focus.add_to_tab_index("win", "c", CellKind::TextField);

        let order: Vec<String> = (0..4)
            .map(|_| focus.next_tab_index(|_| true).unwrap().control.clone())
            .collect();
        assert_eq!(order, vec!["b", "c", "a", "b"]);
    }

    #[test]
    fn tab_ring_skips_stale_entries() {
        let mut focus = FocusState::new();
        focus.add_to_tab_index("win", "a", CellKind::Button);
        focus.add_to_tab_index("gone", "b", CellKind::Button);
        focus.add_to_tab_index("win", "c", CellKind::Button);

        let exists = |t: &FocusTarget| t.layer == "win";
        assert_eq!(focus.next_tab_index(exists).unwrap().control, "c");
        assert_eq!(focus.next_tab_index(exists).unwrap().control, "a");
        assert_eq!(focus.next_tab_index(exists).unwrap().control, "c");
    }

    #[test]
    fn all_stale_ring_leaves_focus_alone() {
        let mut focus = FocusState::new();
        focus.set_focus("win", "keep", CellKind::Button);
        focus.add_to_tab_index("gone", "a", CellKind::Button);

        assert!(focus.next_tab_index(|_| false).is_none());
        assert!(focus.is_focused("win", "keep", CellKind::Button));
    }

    #[test]
    fn empty_ring_returns_none() {
        let mut focus = FocusState::new();
        assert!(focus.next_tab_index(|_| true).is_none());
        assert_eq!(focus.drag, DragState::Idle);
    }
}
