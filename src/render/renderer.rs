//! Frame encoding and damage-based repaint.
//!
//! [`CellRenderer`] turns a composed cell grid into terminal escape
//! sequences. It keeps a copy of the previously rendered frame and, on
//! each call, emits only the cell runs that changed since then, each one
//! prefixed with an absolute cursor move. The whole batch is wrapped in
//! synchronized-update markers so the terminal presents it atomically.
//!
//! The renderer never writes to the terminal itself. It returns
//! [`TerminalCmd`]s for the caller to push through the output gate, which
//! keeps the encoding logic testable without a live terminal.

use crate::core::cell::{Cell, CellFlags};
use crate::core::color::Rgb;
use crate::core::layer::Layer;
use crate::core::output::TerminalCmd;
use crate::core::text::rune_width;
use crate::logging;

/// Begin synchronized update (terminal buffers output until the end marker).
const SYNC_START: &str = "\x1b[?2026h";
/// End synchronized update.
const SYNC_END: &str = "\x1b[?2026l";
/// Clear scrollback, clear screen, home the cursor.
const CLEAR_ALL: &str = "\x1b[3J\x1b[2J\x1b[H";
/// Reset all SGR attributes.
const RESET: &str = "\x1b[0m";

/// Diff-based renderer for composed frames.
pub struct CellRenderer {
    previous: Vec<Cell>,
    previous_columns: i32,
    previous_rows: i32,
    force_full_redraw_next: bool,
}

impl CellRenderer {
    pub fn new() -> Self {
        Self {
            previous: Vec::new(),
            previous_columns: 0,
            previous_rows: 0,
            force_full_redraw_next: false,
        }
    }

    /// Force the next [`render`](Self::render) to repaint every cell, even
    /// if nothing changed. Used after resume, resize, or anything else that
    /// may have clobbered the screen behind our back.
    pub fn request_full_redraw(&mut self) {
        self.force_full_redraw_next = true;
    }

    /// Encode `frame` against the previously rendered frame.
    ///
    /// Returns an empty vec when nothing changed. The first frame, a frame
    /// with different dimensions, and a frame after
    /// [`request_full_redraw`](Self::request_full_redraw) are painted in
    /// full, preceded by a screen clear.
    pub fn render(&mut self, frame: &Layer) -> Vec<TerminalCmd> {
        let columns = frame.width();
        let rows = frame.height();
        let size_changed = columns != self.previous_columns || rows != self.previous_rows;
        let full = self.previous.is_empty() || size_changed || self.force_full_redraw_next;
        self.force_full_redraw_next = false;

        let mut buffer = String::new();
        let cells_changed = if full {
            buffer.push_str(CLEAR_ALL);
            for y in 0..rows {
                buffer.push_str(&cursor_to(0, y));
                encode_span(frame, y, 0, columns, &mut buffer);
            }
            (columns * rows) as usize
        } else {
            self.diff_into(frame, &mut buffer)
        };

        self.previous = frame.cells().to_vec();
        self.previous_columns = columns;
        self.previous_rows = rows;

        if cells_changed == 0 {
            return Vec::new();
        }
        buffer.push_str(RESET);

        let mut bytes = String::with_capacity(buffer.len() + SYNC_START.len() + SYNC_END.len());
        bytes.push_str(SYNC_START);
        bytes.push_str(&buffer);
        bytes.push_str(SYNC_END);

        if logging::frames_enabled() {
            logging::log_frame_stats(&logging::FrameStats {
                columns: columns as u16,
                rows: rows as u16,
                cells_changed,
                bytes_written: bytes.len(),
                full_repaint: full,
            });
        }

        vec![TerminalCmd::Bytes(bytes)]
    }

    /// Append repaint runs for every changed cell, returns the count of
    /// repainted cells.
    fn diff_into(&self, frame: &Layer, buffer: &mut String) -> usize {
        let columns = frame.width();
        let rows = frame.height();
        let mut changed = 0usize;
        for y in 0..rows {
            let mut x = 0;
            while x < columns {
                if self.cell_unchanged(frame, x, y) {
                    x += 1;
                    continue;
                }
                let mut start = x;
                // Never start a run on the tail of a wide pair: repainting
                // the tail alone would clip the glyph, so back up one column
                // and rewrite the head as well.
                if start > 0 && frame.cell(start - 1, y).is_some_and(|c| rune_width(c.rune) == 2) {
                    start -= 1;
                }
                let mut end = x + 1;
                while end < columns && !self.cell_unchanged(frame, end, y) {
                    end += 1;
                }
                changed += (end - start) as usize;
                buffer.push_str(&cursor_to(start, y));
                encode_span(frame, y, start, end, buffer);
                x = end;
            }
        }
        changed
    }

    fn cell_unchanged(&self, frame: &Layer, x: i32, y: i32) -> bool {
        let index = (y * self.previous_columns + x) as usize;
        match (frame.cell(x, y), self.previous.get(index)) {
            (Some(now), Some(before)) => same_visual(now, before),
            _ => false,
        }
    }
}

impl Default for CellRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Two cells repaint identically when their visible parts match. Control
/// metadata is ignored here: it feeds hit-testing, not the screen.
fn same_visual(a: &Cell, b: &Cell) -> bool {
    a.rune == b.rune && a.fg == b.fg && a.bg == b.bg && a.flags == b.flags
}

/// Absolute cursor move to zero-based grid coordinates.
fn cursor_to(x: i32, y: i32) -> String {
    format!("\x1b[{};{}H", y + 1, x + 1)
}

/// Encode the cells of row `y` in `[start, end)`, switching attributes only
/// where they differ from the previous cell. Wide runes advance two columns,
/// so the space the compositor keeps in the tail cell is skipped.
fn encode_span(frame: &Layer, y: i32, start: i32, end: i32, out: &mut String) {
    let mut attrs: Option<(Rgb, Rgb, CellFlags)> = None;
    let mut x = start;
    while x < end {
        let Some(cell) = frame.cell(x, y) else {
            break;
        };
        let cell_attrs = (cell.fg, cell.bg, cell.flags);
        if attrs != Some(cell_attrs) {
            push_sgr(cell, out);
            attrs = Some(cell_attrs);
        }
        let width = rune_width(cell.rune);
        let rune = if width == 0 { ' ' } else { cell.rune };
        out.push(rune);
        x += if width == 2 { 2 } else { 1 };
    }
}

/// Full SGR for one cell: reset, then text flags, then truecolor fg and bg.
fn push_sgr(cell: &Cell, out: &mut String) {
    out.push_str("\x1b[0");
    let flags = cell.flags;
    if flags.contains(CellFlags::BOLD) {
        out.push_str(";1");
    }
    if flags.contains(CellFlags::ITALIC) {
        out.push_str(";3");
    }
    if flags.contains(CellFlags::UNDERLINE) {
        out.push_str(";4");
    }
    if flags.contains(CellFlags::BLINK) {
        out.push_str(";5");
    }
    if flags.contains(CellFlags::REVERSE) {
        out.push_str(";7");
    }
    let fg = cell.fg;
    let bg = cell.bg;
    out.push_str(&format!(
        ";38;2;{};{};{};48;2;{};{};{}m",
        fg.r, fg.g, fg.b, bg.r, bg.g, bg.b
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cell::Cell;
    use crate::core::style::TextStyle;

    fn frame(width: i32, height: i32) -> Layer {
        Layer::scratch(width, height, Cell::default())
    }

    fn rendered_bytes(cmds: &[TerminalCmd]) -> String {
        let mut bytes = String::new();
        for cmd in cmds {
            match cmd {
                TerminalCmd::Bytes(data) => bytes.push_str(data),
                TerminalCmd::BytesStatic(data) => bytes.push_str(data),
                other => panic!("renderer must only emit byte commands, got {other:?}"),
            }
        }
        bytes
    }

    #[test]
    fn first_render_paints_everything() {
        let mut renderer = CellRenderer::new();
        let mut screen = frame(4, 2);
        screen.put_str(0, 0, "hi", &TextStyle::default());

        let bytes = rendered_bytes(&renderer.render(&screen));
        assert!(bytes.starts_with(SYNC_START));
        assert!(bytes.ends_with(SYNC_END));
        assert!(bytes.contains(CLEAR_ALL));
        assert!(bytes.contains("hi"));
    }

    #[test]
    fn identical_render_produces_no_output() {
        let mut renderer = CellRenderer::new();
        let mut screen = frame(4, 2);
        screen.put_str(0, 0, "hi", &TextStyle::default());

        renderer.render(&screen);
        assert!(renderer.render(&screen).is_empty());
    }

    #[test]
    fn diff_repaints_only_the_changed_cells() {
        let mut renderer = CellRenderer::new();
        let mut screen = frame(6, 2);
        screen.put_str(0, 0, "aaaaaa", &TextStyle::default());
        screen.put_str(0, 1, "aaaaaa", &TextStyle::default());
        renderer.render(&screen);

        screen.put_str(2, 1, "Z", &TextStyle::default());
        let bytes = rendered_bytes(&renderer.render(&screen));

        assert!(bytes.contains("\x1b[2;3H"), "run must target row 2 col 3: {bytes:?}");
        assert!(bytes.contains('Z'));
        assert!(!bytes.contains('a'), "unchanged cells must not repaint: {bytes:?}");
        assert!(!bytes.contains(CLEAR_ALL));
    }

    #[test]
    fn size_change_forces_a_full_repaint() {
        let mut renderer = CellRenderer::new();
        renderer.render(&frame(4, 2));

        let bytes = rendered_bytes(&renderer.render(&frame(5, 2)));
        assert!(bytes.contains(CLEAR_ALL));
    }

    #[test]
    fn requested_full_redraw_repaints_an_identical_frame() {
        let mut renderer = CellRenderer::new();
        let screen = frame(4, 2);
        renderer.render(&screen);
        assert!(renderer.render(&screen).is_empty());

        renderer.request_full_redraw();
        let bytes = rendered_bytes(&renderer.render(&screen));
        assert!(bytes.contains(CLEAR_ALL));
    }

    #[test]
    fn wide_runes_are_emitted_once_and_tails_skipped() {
        let mut renderer = CellRenderer::new();
        let mut screen = frame(5, 1);
        screen.put_str(0, 0, "a日x", &TextStyle::default());

        let bytes = rendered_bytes(&renderer.render(&screen));
        assert_eq!(bytes.matches('日').count(), 1);
        // The tail cell must not be emitted as a padding space between the
        // wide rune and the next cell, or later columns would shift right.
        assert!(bytes.contains("a日x"), "row must encode contiguously: {bytes:?}");
    }

    #[test]
    fn attribute_changes_emit_new_sgr_runs() {
        let mut renderer = CellRenderer::new();
        let mut screen = frame(4, 1);
        let bold = TextStyle::default().with_flags(CellFlags::BOLD);
        screen.put_str(0, 0, "ab", &TextStyle::default());
        screen.put_str(2, 0, "cd", &bold);

        let bytes = rendered_bytes(&renderer.render(&screen));
        assert!(bytes.contains("\x1b[0;1;38;2;"), "bold run must carry SGR 1: {bytes:?}");
    }

    #[test]
    fn metadata_only_changes_do_not_repaint() {
        let mut renderer = CellRenderer::new();
        let mut screen = frame(4, 1);
        renderer.render(&screen);

        let mut cell = screen.cell(1, 0).cloned().unwrap();
        cell.layer = "somewhere".to_string();
        screen.set_cell(1, 0, cell);
        assert!(renderer.render(&screen).is_empty());
    }
}
