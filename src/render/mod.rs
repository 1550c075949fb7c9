//! Rendering pipeline: composition, border drawing, frame encoding.

pub mod border;
pub mod compositor;
pub mod renderer;

pub use border::{draw_border, draw_drop_shadow, draw_frame};
pub use compositor::{compose, hit_test, Hit};
pub use renderer::CellRenderer;
