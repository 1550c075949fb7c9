//! Core data model: cells, layers, styles, input decoding, terminal seam.

pub mod cell;
pub mod color;
pub mod input;
pub mod layer;
pub mod markup;
pub mod output;
pub mod registry;
pub mod style;
pub mod terminal;
pub mod text;
