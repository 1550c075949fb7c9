//! Z-ordered flattening of the layer tree into one output buffer.
//!
//! Composition is a pure function of the registry: widgets have already
//! drawn into their layer grids by the time it runs. The composed buffer
//! carries every cell's control metadata, which is what makes hit-testing
//! a plain lookup afterwards.

use crate::core::cell::{Cell, CellKind};
use crate::core::color::{transition, BLACK};
use crate::core::layer::{Layer, Rect};
use crate::core::registry::LayerRegistry;
use crate::core::text::rune_width;

/// Metadata of the composed cell under a screen position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub layer: String,
    pub parent: String,
    pub control: String,
    pub kind: CellKind,
    pub part: i32,
    pub cell_id: i32,
}

/// Flatten the registry into one buffer of the given viewport size.
///
/// Layers are visited in ascending z. A layer that is itself a parent is
/// composed into a temporary buffer of its own size first (its grid at
/// (0, 0), then its children clipped against it), and the result lands at
/// the parent's screen offset. Children therefore never paint outside
/// their parent's rectangle.
pub fn compose(registry: &LayerRegistry, width: i32, height: i32, default: &Cell) -> Layer {
    let mut screen = Layer::scratch(width, height, default.clone());
    let order = registry.sorted_by_z_order();
    compose_scope(registry, &order, "", &mut screen);
    screen
}

fn compose_scope(registry: &LayerRegistry, order: &[(String, i32)], scope: &str, out: &mut Layer) {
    for (alias, _) in order {
        let Ok(layer) = registry.get(alias) else {
            continue;
        };
        if layer.parent() != scope || !layer.visible {
            continue;
        }
        if layer.is_parent() {
            let mut inner = Layer::scratch(layer.width(), layer.height(), layer.default_cell().clone());
            blit(layer, &mut inner, 0, 0, Some((layer.alias(), layer.parent())));
            compose_scope(registry, order, alias, &mut inner);
            blit(&inner, out, layer.x, layer.y, None);
        } else {
            blit(layer, out, layer.x, layer.y, Some((layer.alias(), layer.parent())));
        }
    }
}

/// Probe the composed buffer. `None` only for out-of-range positions; an
/// uncovered in-range cell reports empty aliases.
pub fn hit_test(screen: &Layer, x: i32, y: i32) -> Option<Hit> {
    let cell = screen.cell(x, y)?;
    Some(Hit {
        layer: cell.layer.clone(),
        parent: cell.parent.clone(),
        control: cell.control.clone(),
        kind: cell.kind,
        part: cell.part,
        cell_id: cell.cell_id,
    })
}

/// Overlay `src` onto `dst` with its top-left at (`at_x`, `at_y`).
///
/// `stamp` carries the owning (layer, parent) aliases when `src` is a layer
/// grid; `None` means `src` is an already-composed buffer whose cells keep
/// their recorded owners.
pub(crate) fn blit(src: &Layer, dst: &mut Layer, at_x: i32, at_y: i32, stamp: Option<(&str, &str)>) {
    let src_rect = Rect::new(at_x, at_y, src.width(), src.height());
    let dst_rect = Rect::new(0, 0, dst.width(), dst.height());
    let Some(clip) = src_rect.intersect(&dst_rect) else {
        return;
    };

    let right_edge = clip.x + clip.w - 1;
    for dy in clip.y..clip.y + clip.h {
        for dx in clip.x..clip.x + clip.w {
            let Some(cell) = src.cell(dx - at_x, dy - at_y) else {
                continue;
            };
            if cell.is_transparent() {
                tint_cell(dst, dx, dy, cell, stamp);
            } else {
                copy_cell(dst, dx, dy, cell, src.default_cell(), stamp, dx, clip.x, right_edge);
            }
        }
    }
}

/// Null-rune overlay: darken the destination's colors in place, keep its
/// glyph. Tooltip hot-spots additionally stamp their metadata so the
/// hit-tester still finds them.
fn tint_cell(dst: &mut Layer, x: i32, y: i32, src: &Cell, stamp: Option<(&str, &str)>) {
    let Some(dest) = dst.cell_mut(x, y) else {
        return;
    };
    dest.fg = transition(BLACK, dest.fg, src.fg_alpha);
    dest.bg = transition(BLACK, dest.bg, src.bg_alpha);
    if src.kind == CellKind::Tooltip {
        dest.kind = CellKind::Tooltip;
        dest.control.clone_from(&src.control);
        dest.part = src.part;
        dest.cell_id = src.cell_id;
        match stamp {
            Some((layer, parent)) => {
                dest.layer.clear();
                dest.layer.push_str(layer);
                dest.parent.clear();
                dest.parent.push_str(parent);
            }
            None => {
                dest.layer.clone_from(&src.layer);
                dest.parent.clone_from(&src.parent);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn copy_cell(
    dst: &mut Layer,
    x: i32,
    y: i32,
    src: &Cell,
    src_default: &Cell,
    stamp: Option<(&str, &str)>,
    dx: i32,
    left_edge: i32,
    right_edge: i32,
) {
    // Overwriting the trailing half of a destination wide pair: blank the
    // head so no half-glyph survives. Only the clip's first column can hit
    // this; further in, the sweep rewrites whole pairs anyway.
    if dx == left_edge && dx > 0 {
        if let Some(prev) = dst.cell_mut(dx - 1, y) {
            if rune_width(prev.rune) == 2 {
                prev.rune = ' ';
            }
        }
    }

    let Some(dest) = dst.cell_mut(x, y) else {
        return;
    };

    // Per-cell alphas of exactly 1.0 defer to the layer-wide default, which
    // is how a whole layer is made translucent in one call.
    let (fg_alpha, bg_alpha) = if src.fg_alpha == 1.0 && src.bg_alpha == 1.0 {
        (src_default.fg_alpha, src_default.bg_alpha)
    } else {
        (src.fg_alpha, src.bg_alpha)
    };

    // A wide head with no room for its trailing cell degrades to a space.
    let mut rune = src.rune;
    if rune_width(rune) == 2 && dx == right_edge {
        rune = ' ';
    }

    dest.rune = rune;
    dest.fg = transition(dest.fg, src.fg, fg_alpha);
    dest.bg = if src.background_transparent {
        dest.bg
    } else {
        transition(dest.bg, src.bg, bg_alpha)
    };
    dest.fg_alpha = 1.0;
    dest.bg_alpha = 1.0;
    dest.background_transparent = false;
    dest.flags = src.flags;
    dest.kind = src.kind;
    dest.control.clone_from(&src.control);
    dest.part = src.part;
    dest.cell_id = src.cell_id;
    match stamp {
        Some((layer, parent)) => {
            dest.layer.clear();
            dest.layer.push_str(layer);
            dest.parent.clear();
            dest.parent.push_str(parent);
        }
        None => {
            dest.layer.clone_from(&src.layer);
            dest.parent.clone_from(&src.parent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{compose, hit_test};
    use crate::core::cell::{Cell, CellKind, TRANSPARENT};
    use crate::core::color::{Rgb, BLACK, WHITE};
    use crate::core::layer::CellTag;
    use crate::core::registry::LayerRegistry;
    use crate::core::style::TextStyle;

    fn fill_rune(registry: &mut LayerRegistry, alias: &str, rune: char) {
        let layer = registry.get_mut(alias).expect("layer");
        layer.fill(Cell {
            rune,
            ..Cell::default()
        });
    }

    fn rune_at(screen: &crate::core::layer::Layer, x: i32, y: i32) -> char {
        screen.cell(x, y).map(|cell| cell.rune).unwrap_or('?')
    }

    #[test]
    fn higher_z_wins_in_overlap() {
        let mut registry = LayerRegistry::new();
        registry.add("back", 0, 0, 40, 20, 1, "").expect("back");
        registry.add("front", 10, 5, 10, 5, 2, "").expect("front");
        fill_rune(&mut registry, "back", 'a');
        fill_rune(&mut registry, "front", 'b');

        let screen = compose(&registry, 40, 20, &Cell::default());
        assert_eq!(rune_at(&screen, 9, 5), 'a');
        assert_eq!(rune_at(&screen, 10, 5), 'b');
        assert_eq!(rune_at(&screen, 19, 9), 'b');
        assert_eq!(rune_at(&screen, 20, 9), 'a');
        assert_eq!(rune_at(&screen, 10, 10), 'a');
    }

    #[test]
    fn composition_is_idempotent() {
        let mut registry = LayerRegistry::new();
        registry.add("back", 0, 0, 12, 6, 1, "").expect("back");
        registry.add("front", 3, 1, 6, 3, 2, "").expect("front");
        fill_rune(&mut registry, "back", 'x');
        registry
            .get_mut("front")
            .expect("front")
            .fill(Cell::shadow(0.5, 0.5));

        let first = compose(&registry, 12, 6, &Cell::default());
        let second = compose(&registry, 12, 6, &Cell::default());
        for y in 0..6 {
            for x in 0..12 {
                assert_eq!(first.cell(x, y), second.cell(x, y), "cell ({x}, {y})");
            }
        }
    }

    #[test]
    fn null_rune_tints_without_replacing() {
        let mut registry = LayerRegistry::new();
        registry.add("back", 0, 0, 10, 6, 1, "").expect("back");
        registry.add("shade", 2, 2, 5, 3, 2, "").expect("shade");
        fill_rune(&mut registry, "back", 'x');
        registry
            .get_mut("shade")
            .expect("shade")
            .fill(Cell::shadow(0.5, 0.5));

        let screen = compose(&registry, 10, 6, &Cell::default());
        let shaded = screen.cell(3, 3).expect("shaded");
        assert_eq!(shaded.rune, 'x');
        assert_eq!(shaded.fg, Rgb::new(96, 96, 96));
        assert_eq!(shaded.bg, BLACK);
        let clear = screen.cell(1, 1).expect("clear");
        assert_eq!(clear.fg, WHITE);
    }

    #[test]
    fn full_alpha_shadow_changes_nothing_but_metadata() {
        let mut registry = LayerRegistry::new();
        registry.add("back", 0, 0, 8, 4, 1, "").expect("back");
        registry.add("hot", 1, 1, 3, 1, 2, "").expect("hot");
        fill_rune(&mut registry, "back", 'q');
        let hot = registry.get_mut("hot").expect("hot");
        let mut cell = Cell::shadow(1.0, 1.0);
        cell.kind = CellKind::Tooltip;
        cell.control = "tip1".to_string();
        hot.fill(cell);

        let screen = compose(&registry, 8, 4, &Cell::default());
        let covered = screen.cell(2, 1).expect("covered");
        assert_eq!(covered.rune, 'q');
        assert_eq!(covered.fg, WHITE);
        assert_eq!(covered.kind, CellKind::Tooltip);
        assert_eq!(covered.control, "tip1");
        assert_eq!(covered.layer, "hot");
    }

    #[test]
    fn children_clip_to_their_parent() {
        let mut registry = LayerRegistry::new();
        registry.add("back", 0, 0, 20, 10, 1, "").expect("back");
        registry.add("panel", 4, 2, 8, 4, 2, "").expect("panel");
        registry.add("child", 5, 1, 10, 2, 3, "panel").expect("child");
        fill_rune(&mut registry, "back", '.');
        fill_rune(&mut registry, "panel", 'p');
        fill_rune(&mut registry, "child", 'c');

        let screen = compose(&registry, 20, 10, &Cell::default());
        // Child is at (5, 1) inside the panel, so screen (9, 3) onward.
        assert_eq!(rune_at(&screen, 9, 3), 'c');
        assert_eq!(rune_at(&screen, 11, 3), 'c');
        // The child is 10 wide but the panel ends at screen x = 11.
        assert_eq!(rune_at(&screen, 12, 3), '.');
        assert_eq!(rune_at(&screen, 8, 3), 'p');
    }

    #[test]
    fn background_transparent_keeps_dest_bg() {
        let mut registry = LayerRegistry::new();
        registry.add("back", 0, 0, 6, 3, 1, "").expect("back");
        registry.add("label", 1, 1, 3, 1, 2, "").expect("label");
        let red = Rgb::new(200, 0, 0);
        let back = registry.get_mut("back").expect("back");
        back.fill(Cell::blank(WHITE, red));
        let label = registry.get_mut("label").expect("label");
        label.fill(Cell {
            rune: 't',
            background_transparent: true,
            ..Cell::default()
        });

        let screen = compose(&registry, 6, 3, &Cell::default());
        let over = screen.cell(2, 1).expect("over");
        assert_eq!(over.rune, 't');
        assert_eq!(over.bg, red);
    }

    #[test]
    fn overwriting_half_a_wide_pair_blanks_the_head() {
        let mut registry = LayerRegistry::new();
        registry.add("base", 0, 0, 10, 2, 1, "").expect("base");
        registry.add("spot", 5, 0, 1, 1, 2, "").expect("spot");
        {
            let base = registry.get_mut("base").expect("base");
            base.put_str(4, 0, "日", &TextStyle::default());
        }
        fill_rune(&mut registry, "spot", 'X');

        let screen = compose(&registry, 10, 2, &Cell::default());
        assert_eq!(rune_at(&screen, 4, 0), ' ');
        assert_eq!(rune_at(&screen, 5, 0), 'X');
    }

    #[test]
    fn wide_head_at_clip_edge_degrades_to_space() {
        let mut registry = LayerRegistry::new();
        registry.add("strip", 7, 0, 4, 1, 1, "").expect("strip");
        {
            let strip = registry.get_mut("strip").expect("strip");
            strip.put_str(0, 0, "ab日", &TextStyle::default());
        }

        // Screen is 10 wide, so the wide head at screen x = 9 has no room.
        let screen = compose(&registry, 10, 1, &Cell::default());
        assert_eq!(rune_at(&screen, 8, 0), 'b');
        assert_eq!(rune_at(&screen, 9, 0), ' ');
    }

    #[test]
    fn hit_test_reads_composed_metadata() {
        let mut registry = LayerRegistry::new();
        registry.add("win", 2, 1, 8, 4, 1, "").expect("win");
        {
            let win = registry.get_mut("win").expect("win");
            let tag = CellTag::control(CellKind::Button, "ok").with_part(0);
            win.put_str_tagged(1, 1, "[ OK ]", &TextStyle::default(), &tag);
        }

        let screen = compose(&registry, 12, 6, &Cell::default());
        let hit = hit_test(&screen, 4, 2).expect("hit");
        assert_eq!(hit.layer, "win");
        assert_eq!(hit.control, "ok");
        assert_eq!(hit.kind, CellKind::Button);

        let blank = hit_test(&screen, 0, 0).expect("in range");
        assert!(blank.layer.is_empty());
        assert_eq!(blank.kind, CellKind::Plain);

        assert!(hit_test(&screen, 50, 0).is_none());
        assert!(hit_test(&screen, -1, 2).is_none());
    }

    #[test]
    fn invisible_layers_are_skipped() {
        let mut registry = LayerRegistry::new();
        registry.add("back", 0, 0, 6, 3, 1, "").expect("back");
        registry.add("top", 0, 0, 6, 3, 2, "").expect("top");
        fill_rune(&mut registry, "back", 'a');
        fill_rune(&mut registry, "top", 'b');
        registry.get_mut("top").expect("top").visible = false;

        let screen = compose(&registry, 6, 3, &Cell::default());
        assert_eq!(rune_at(&screen, 3, 1), 'a');
        assert_eq!(screen.cell(3, 1).expect("cell").layer, "back");
    }

    #[test]
    fn transparent_cells_leave_viewport_default() {
        let mut registry = LayerRegistry::new();
        registry.add("ghost", 0, 0, 4, 2, 1, "").expect("ghost");
        registry
            .get_mut("ghost")
            .expect("ghost")
            .fill(Cell {
                rune: TRANSPARENT,
                ..Cell::default()
            });

        let default = Cell::blank(WHITE, Rgb::new(0, 0, 80));
        let screen = compose(&registry, 4, 2, &default);
        let cell = screen.cell(1, 1).expect("cell");
        assert_eq!(cell.rune, ' ');
        assert_eq!(cell.bg, Rgb::new(0, 0, 80));
        assert!(cell.layer.is_empty());
    }
}
