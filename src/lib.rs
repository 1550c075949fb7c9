//! Per-cell text UI compositor and event router.
//!
//! Invariant: single output gate. Only [`core::output::OutputGate::flush`]
//! writes to the terminal; everything else queues commands.
//!
//! # Public API Overview
//! - Build layers and widgets through a [`Context`], then drive them with
//!   the blocking [`Tui`] runtime, or call [`Context::handle_event`] and
//!   [`Context::refresh`] yourself against any [`Terminal`].
//! - Decode raw terminal bytes with [`parse_events`].
//! - Name colors and attributes once in a [`StyleSheet`], then reference
//!   them from widgets and `{alias}` text markup.

#![allow(clippy::too_many_arguments, clippy::type_complexity)]

pub mod config;
pub mod error;
pub mod logging;

pub mod core;
pub mod platform;
pub mod render;
pub mod runtime;
pub mod widgets;

/// Cell grid model: one glyph plus paint and interaction metadata per cell.
pub use crate::core::cell::{Cell, CellFlags, CellKind};
pub use crate::core::color::{ansi_color, transition, Rgb, BLACK, BRIGHT_WHITE, WHITE};
pub use crate::core::layer::{CellTag, Layer, Rect};
pub use crate::core::registry::LayerRegistry;
pub use crate::core::style::{StyleSheet, TextStyle};

/// Input decoding: raw chunks in, key and mouse events out.
pub use crate::core::input::{parse_events, Event, Key, Modifiers, MouseInput, MouseSnapshot, Wheel};

/// Terminal seam and the process-backed implementation.
pub use crate::core::output::{OutputGate, TerminalCmd};
pub use crate::core::terminal::{Terminal, TerminalGuard};
pub use crate::platform::ProcessTerminal;

/// Composition, hit testing and frame diffing.
pub use crate::render::{
    compose, draw_border, draw_drop_shadow, draw_frame, hit_test, CellRenderer, Hit,
};

/// The stateful context and the blocking runtime.
pub use crate::runtime::{
    sleep_ms, Context, DragState, FocusState, FocusTarget, KeyboardState, MouseState,
    RuntimeHandle, Tui,
};

/// Widget managers, one per control kind.
pub use crate::widgets::{
    Buttons, Checkboxes, Dropdowns, Labels, ProgressBars, Radios, Scrollbars, Selectors,
    TextFields, Textboxes, Tooltips, Widgets,
};

/// Crate error type; missing-entity errors downgrade to no-ops in routing.
pub use crate::error::{Error, Result};

/// Width helpers for wide glyphs, emoji and grapheme clusters.
pub use crate::core::text::{display_width, grapheme_width, rune_width};
