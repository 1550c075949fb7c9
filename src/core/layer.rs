//! Layer buffer: a positioned, z-ordered grid of cells.

use crate::core::cell::{Cell, CellKind};
use crate::core::style::TextStyle;
use crate::core::text::graphemes_with_width;
use crate::error::{Error, Result};

/// Integer rectangle in cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = (self.x + self.w).min(other.x + other.w);
        let bottom = (self.y + self.h).min(other.y + other.h);
        if right <= x || bottom <= y {
            return None;
        }
        Some(Rect::new(x, y, right - x, bottom - y))
    }
}

/// Control metadata stamped onto cells as widgets draw them.
#[derive(Debug, Clone, Default)]
pub struct CellTag {
    pub kind: CellKind,
    pub control: String,
    pub part: i32,
    pub cell_id: i32,
}

impl CellTag {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn control(kind: CellKind, control: impl Into<String>) -> Self {
        Self {
            kind,
            control: control.into(),
            ..Self::default()
        }
    }

    pub fn with_part(mut self, part: i32) -> Self {
        self.part = part;
        self
    }
}

/// A rectangular grid of cells with a screen offset and z-order.
///
/// Grid dimensions are fixed at construction; only deletion changes the
/// footprint of a layer. Offsets may be negative (partially off-screen).
#[derive(Clone)]
pub struct Layer {
    alias: String,
    pub(crate) parent: String,
    width: i32,
    height: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub visible: bool,
    /// True iff some other layer names this one as parent. Maintained by the
    /// registry.
    pub(crate) is_parent: bool,
    pub topmost: bool,
    cursor_x: i32,
    cursor_y: i32,
    default_cell: Cell,
    grid: Vec<Cell>,
}

impl Layer {
    pub(crate) fn new(
        alias: impl Into<String>,
        parent: impl Into<String>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        z: i32,
    ) -> Result<Self> {
        let alias = alias.into();
        if width <= 0 || height <= 0 {
            return Err(Error::InvalidDimensions {
                alias,
                width,
                height,
            });
        }
        let default_cell = Cell::default();
        let grid = vec![default_cell.clone(); (width * height) as usize];
        Ok(Self {
            alias,
            parent: parent.into(),
            width,
            height,
            x,
            y,
            z,
            visible: true,
            is_parent: false,
            topmost: false,
            cursor_x: 0,
            cursor_y: 0,
            default_cell,
            grid,
        })
    }

    /// Anonymous working buffer used by the compositor. Not registered.
    pub fn scratch(width: i32, height: i32, default_cell: Cell) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let grid = vec![default_cell.clone(); (width * height) as usize];
        Self {
            alias: String::new(),
            parent: String::new(),
            width,
            height,
            x: 0,
            y: 0,
            z: 0,
            visible: true,
            is_parent: false,
            topmost: false,
            cursor_x: 0,
            cursor_y: 0,
            default_cell,
            grid,
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn parent(&self) -> &str {
        &self.parent
    }

    pub fn is_parent(&self) -> bool {
        self.is_parent
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Screen-space rectangle of this layer.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    fn index(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some(&self.grid[self.index(x, y)])
    }

    pub fn cell_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let idx = self.index(x, y);
        Some(&mut self.grid[idx])
    }

    /// Store a cell, ignoring writes outside the grid. Returns whether the
    /// write landed.
    pub fn set_cell(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let idx = self.index(x, y);
        self.grid[idx] = cell;
        true
    }

    pub fn default_cell(&self) -> &Cell {
        &self.default_cell
    }

    /// Row-major view of the whole grid.
    pub(crate) fn cells(&self) -> &[Cell] {
        &self.grid
    }

    pub fn set_default_cell(&mut self, cell: Cell) {
        self.default_cell = cell;
    }

    pub fn cursor(&self) -> (i32, i32) {
        (self.cursor_x, self.cursor_y)
    }

    pub fn set_cursor(&mut self, x: i32, y: i32) -> Result<()> {
        if !self.in_bounds(x, y) {
            return Err(Error::CursorOutOfBounds {
                alias: self.alias.clone(),
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        self.cursor_x = x;
        self.cursor_y = y;
        Ok(())
    }

    pub fn fill(&mut self, cell: Cell) {
        for slot in self.grid.iter_mut() {
            *slot = cell.clone();
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, cell: Cell) {
        let Some(clipped) = rect.intersect(&Rect::new(0, 0, self.width, self.height)) else {
            return;
        };
        for y in clipped.y..clipped.y + clipped.h {
            for x in clipped.x..clipped.x + clipped.w {
                let idx = self.index(x, y);
                self.grid[idx] = cell.clone();
            }
        }
    }

    /// Reset every cell to the layer default.
    pub fn clear(&mut self) {
        let default = self.default_cell.clone();
        self.fill(default);
    }

    /// Write one styled rune with plain metadata.
    pub fn put_rune(&mut self, x: i32, y: i32, rune: char, style: &TextStyle) {
        self.put_rune_tagged(x, y, rune, style, &CellTag::plain());
    }

    /// Write one styled rune carrying control metadata.
    pub fn put_rune_tagged(&mut self, x: i32, y: i32, rune: char, style: &TextStyle, tag: &CellTag) {
        let mut cell = self.default_cell.clone();
        cell.rune = rune;
        cell.fg = style.fg;
        cell.bg = style.bg;
        cell.flags = style.flags;
        cell.kind = tag.kind;
        cell.control.clone_from(&tag.control);
        cell.part = tag.part;
        cell.cell_id = tag.cell_id;
        self.set_cell(x, y, cell);
    }

    /// Write a styled, tagged run of text starting at (x, y).
    ///
    /// Wide graphemes occupy two cells; the trailing cell carries a space
    /// with identical attributes and metadata. A wide glyph that would hang
    /// past the right edge degrades to a single space. Newlines end the run.
    /// Returns the x position after the last cell written.
    pub fn put_str_tagged(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        style: &TextStyle,
        tag: &CellTag,
    ) -> i32 {
        let mut cx = x;
        for (grapheme, width) in graphemes_with_width(text) {
            if grapheme.contains('\n') || grapheme.contains('\r') {
                break;
            }
            if width == 0 {
                continue;
            }
            if cx >= self.width {
                break;
            }

            let mut cell = self.default_cell.clone();
            cell.fg = style.fg;
            cell.bg = style.bg;
            cell.flags = style.flags;
            cell.kind = tag.kind;
            cell.control.clone_from(&tag.control);
            cell.part = tag.part;
            cell.cell_id = tag.cell_id;

            if width == 2 && cx + 1 >= self.width {
                cell.rune = ' ';
                self.set_cell(cx, y, cell);
                cx += 1;
                break;
            }

            let head_rune = grapheme.chars().next().unwrap_or(' ');
            let mut head = cell.clone();
            head.rune = head_rune;
            self.set_cell(cx, y, head);

            if width == 2 {
                let mut tail = cell;
                tail.rune = ' ';
                self.set_cell(cx + 1, y, tail);
            }

            cx += width as i32;
        }
        cx
    }

    /// Write a styled run of text with plain metadata.
    pub fn put_str(&mut self, x: i32, y: i32, text: &str, style: &TextStyle) -> i32 {
        self.put_str_tagged(x, y, text, style, &CellTag::plain())
    }
}
