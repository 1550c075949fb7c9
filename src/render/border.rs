//! Box-drawing primitives with connector merging.
//!
//! Every line cell written through this module carries a four-bit connection
//! descriptor. Writing over an existing line cell ORs the descriptors and
//! looks the union up again, so crossing borders join into tees and crosses
//! instead of overwriting each other.

use bitflags::bitflags;

use crate::core::cell::{Cell, CellKind};
use crate::core::layer::{CellTag, Layer, Rect};
use crate::core::style::TextStyle;
use crate::core::text::{display_width, truncate_to_width};

bitflags! {
    /// Which neighbours a line cell connects to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Connect: u8 {
        const TOP = 1;
        const BOTTOM = 2;
        const LEFT = 4;
        const RIGHT = 8;
    }
}

const T: u8 = Connect::TOP.bits();
const B: u8 = Connect::BOTTOM.bits();
const L: u8 = Connect::LEFT.bits();
const R: u8 = Connect::RIGHT.bits();

/// The eleven connector roles.
const CONNECTORS: [(char, u8); 11] = [
    ('─', L | R),
    ('│', T | B),
    ('┌', B | R),
    ('┐', B | L),
    ('└', T | R),
    ('┘', T | L),
    ('├', T | B | R),
    ('┤', T | B | L),
    ('┬', B | L | R),
    ('┴', T | L | R),
    ('┼', T | B | L | R),
];

/// Connector glyph for a connection set, if one exists.
pub fn connector(connect: Connect) -> Option<char> {
    CONNECTORS
        .iter()
        .find(|(_, bits)| *bits == connect.bits())
        .map(|(rune, _)| *rune)
}

/// Connection set of a glyph, if it is a connector.
pub fn connections(rune: char) -> Option<Connect> {
    CONNECTORS
        .iter()
        .find(|(candidate, _)| *candidate == rune)
        .and_then(|(_, bits)| Connect::from_bits(*bits))
}

/// Write one line cell, merging with any line cell already at (x, y).
pub fn put_line_rune(
    layer: &mut Layer,
    x: i32,
    y: i32,
    connect: Connect,
    style: &TextStyle,
    tag: &CellTag,
) {
    let mut joined = connect;
    if let Some(existing) = layer.cell(x, y).and_then(|cell| connections(cell.rune)) {
        joined |= existing;
    }
    if let Some(rune) = connector(joined) {
        layer.put_rune_tagged(x, y, rune, style, tag);
    }
}

pub fn draw_hline(layer: &mut Layer, x: i32, y: i32, len: i32, style: &TextStyle, tag: &CellTag) {
    for i in 0..len.max(0) {
        put_line_rune(layer, x + i, y, Connect::LEFT | Connect::RIGHT, style, tag);
    }
}

pub fn draw_vline(layer: &mut Layer, x: i32, y: i32, len: i32, style: &TextStyle, tag: &CellTag) {
    for i in 0..len.max(0) {
        put_line_rune(layer, x, y + i, Connect::TOP | Connect::BOTTOM, style, tag);
    }
}

/// Rectangular border. Degenerate sizes collapse to a single line.
pub fn draw_border(layer: &mut Layer, rect: Rect, style: &TextStyle, tag: &CellTag) {
    if rect.w < 1 || rect.h < 1 {
        return;
    }
    if rect.h == 1 {
        draw_hline(layer, rect.x, rect.y, rect.w, style, tag);
        return;
    }
    if rect.w == 1 {
        draw_vline(layer, rect.x, rect.y, rect.h, style, tag);
        return;
    }

    let right = rect.x + rect.w - 1;
    let bottom = rect.y + rect.h - 1;

    put_line_rune(layer, rect.x, rect.y, Connect::BOTTOM | Connect::RIGHT, style, tag);
    put_line_rune(layer, right, rect.y, Connect::BOTTOM | Connect::LEFT, style, tag);
    put_line_rune(layer, rect.x, bottom, Connect::TOP | Connect::RIGHT, style, tag);
    put_line_rune(layer, right, bottom, Connect::TOP | Connect::LEFT, style, tag);
    draw_hline(layer, rect.x + 1, rect.y, rect.w - 2, style, tag);
    draw_hline(layer, rect.x + 1, bottom, rect.w - 2, style, tag);
    draw_vline(layer, rect.x, rect.y + 1, rect.h - 2, style, tag);
    draw_vline(layer, right, rect.y + 1, rect.h - 2, style, tag);
}

/// Window frame: a border whose top row is draggable chrome.
///
/// Every top-row cell, title included, is tagged `FrameTop` with the owning
/// control alias so the router recognises a window-move grab anywhere on
/// the title bar.
pub fn draw_frame(layer: &mut Layer, rect: Rect, title: &str, style: &TextStyle, control: &str) {
    if rect.w < 2 || rect.h < 2 {
        draw_border(layer, rect, style, &CellTag::plain());
        return;
    }

    let top_tag = CellTag::control(CellKind::FrameTop, control);
    let body_tag = CellTag::plain();

    let right = rect.x + rect.w - 1;
    let bottom = rect.y + rect.h - 1;

    put_line_rune(layer, rect.x, rect.y, Connect::BOTTOM | Connect::RIGHT, style, &top_tag);
    put_line_rune(layer, right, rect.y, Connect::BOTTOM | Connect::LEFT, style, &top_tag);
    draw_hline(layer, rect.x + 1, rect.y, rect.w - 2, style, &top_tag);

    put_line_rune(layer, rect.x, bottom, Connect::TOP | Connect::RIGHT, style, &body_tag);
    put_line_rune(layer, right, bottom, Connect::TOP | Connect::LEFT, style, &body_tag);
    draw_hline(layer, rect.x + 1, bottom, rect.w - 2, style, &body_tag);
    draw_vline(layer, rect.x, rect.y + 1, rect.h - 2, style, &body_tag);
    draw_vline(layer, right, rect.y + 1, rect.h - 2, style, &body_tag);

    if !title.is_empty() && rect.w >= 7 {
        let text = truncate_to_width(title, (rect.w - 6) as usize);
        let padded = format!(" {text} ");
        let width = display_width(&padded) as i32;
        let tx = rect.x + (rect.w - width) / 2;
        layer.put_str_tagged(tx, rect.y, &padded, style, &top_tag);
    }
}

/// Translucent drop shadow: two columns to the right of `frame` and one row
/// beneath it, offset by (2, 1). Shadow cells are null-rune with half alpha,
/// so composition darkens whatever lies below without hiding it.
pub fn draw_drop_shadow(layer: &mut Layer, frame: Rect) {
    let shade = Cell::shadow(0.5, 0.5);
    let right = frame.x + frame.w;
    let bottom = frame.y + frame.h;
    for y in (frame.y + 1)..=bottom {
        layer.set_cell(right, y, shade.clone());
        layer.set_cell(right + 1, y, shade.clone());
    }
    for x in (frame.x + 2)..right {
        layer.set_cell(x, bottom, shade.clone());
    }
}
