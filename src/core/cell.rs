//! Cell data model: one glyph plus attributes and control metadata.
//!
//! Control metadata rides on every cell so hit-testing is a plain lookup on
//! the composed screen buffer. A cell whose rune is [`TRANSPARENT`]
//! contributes no glyph of its own; the compositor treats it as a tint over
//! whatever is already beneath it.

use bitflags::bitflags;

use crate::core::color::{Rgb, BLACK, WHITE};

/// The null rune. Marks a cell as transparent to the compositor.
pub const TRANSPARENT: char = '\0';

/// Scrollbar sub-part ids carried in [`Cell::part`]. Track segments use
/// their non-negative segment index.
pub const PART_SCROLL_UP: i32 = -1;
pub const PART_SCROLL_DOWN: i32 = -2;
pub const PART_SCROLL_HANDLE: i32 = -3;

bitflags! {
    /// Display attribute flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CellFlags: u8 {
        const BOLD      = 1 << 0;
        const ITALIC    = 1 << 1;
        const UNDERLINE = 1 << 2;
        const BLINK     = 1 << 3;
        const REVERSE   = 1 << 4;
    }
}

/// What kind of control a cell belongs to. `Plain` cells are inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellKind {
    #[default]
    Plain,
    Button,
    TextField,
    /// Top border row of a draggable window frame.
    FrameTop,
    SelectorItem,
    Scrollbar,
    Dropdown,
    Checkbox,
    Textbox,
    Radio,
    ProgressBar,
    Label,
    Tooltip,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub rune: char,
    pub fg: Rgb,
    pub bg: Rgb,
    /// Blend percentage applied to the foreground when this cell lands on
    /// another. 1.0 replaces the destination outright.
    pub fg_alpha: f32,
    pub bg_alpha: f32,
    /// Keep the destination's background color when overlaying this cell.
    pub background_transparent: bool,
    pub flags: CellFlags,
    pub kind: CellKind,
    /// Alias of the owning control; empty for plain cells.
    pub control: String,
    /// Sub-part id within the control. See the `PART_SCROLL_*` constants.
    pub part: i32,
    /// Application-assigned id for custom hit-testing.
    pub cell_id: i32,
    /// Alias of the layer this cell was composed from.
    pub layer: String,
    /// Parent alias of that layer at composition time.
    pub parent: String,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            rune: ' ',
            fg: WHITE,
            bg: BLACK,
            fg_alpha: 1.0,
            bg_alpha: 1.0,
            background_transparent: false,
            flags: CellFlags::empty(),
            kind: CellKind::Plain,
            control: String::new(),
            part: 0,
            cell_id: 0,
            layer: String::new(),
            parent: String::new(),
        }
    }
}

impl Cell {
    /// A space cell in the given colors; alphas opaque, no metadata.
    pub fn blank(fg: Rgb, bg: Rgb) -> Self {
        Self {
            fg,
            bg,
            ..Self::default()
        }
    }

    /// A transparent tint cell. With both alphas 1.0 it changes nothing
    /// underneath; lower alphas darken the destination toward black.
    pub fn shadow(fg_alpha: f32, bg_alpha: f32) -> Self {
        Self {
            rune: TRANSPARENT,
            fg_alpha,
            bg_alpha,
            ..Self::default()
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.rune == TRANSPARENT
    }

    /// Copy display attributes (not metadata) from another cell.
    pub fn set_attrs_from(&mut self, other: &Cell) {
        self.fg = other.fg;
        self.bg = other.bg;
        self.fg_alpha = other.fg_alpha;
        self.bg_alpha = other.bg_alpha;
        self.background_transparent = other.background_transparent;
        self.flags = other.flags;
    }

    /// Copy control metadata (not display attributes) from another cell.
    pub fn set_meta_from(&mut self, other: &Cell) {
        self.kind = other.kind;
        self.control.clone_from(&other.control);
        self.part = other.part;
        self.cell_id = other.cell_id;
        self.layer.clone_from(&other.layer);
        self.parent.clone_from(&other.parent);
    }
}
