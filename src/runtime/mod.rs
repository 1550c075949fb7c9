//! The stateful half of the crate: the [`Context`] that owns layers,
//! widgets, and focus, the event router, and the blocking [`Tui`] loop.

pub mod context;
pub mod focus;
mod router;
pub mod tui;

pub use context::{Context, KeyboardState, MouseState};
pub use focus::{DragState, FocusState, FocusTarget};
pub use tui::{sleep_ms, RuntimeHandle, Tui};
