//! Whole-frame composition checks driven through the public `Context` API:
//! layers in, one composed screen out.

use cel_tui::{Cell, CellKind, Context, Rgb, TextStyle, BLACK, WHITE};

fn ink(rune: char) -> Cell {
    Cell {
        rune,
        ..Cell::default()
    }
}

fn fill_layer(ctx: &mut Context, alias: &str, rune: char) {
    ctx.layer_mut(alias).expect("layer").fill(ink(rune));
}

fn rune_at(ctx: &Context, x: i32, y: i32) -> char {
    ctx.screen()
        .expect("composed screen")
        .cell(x, y)
        .map(|cell| cell.rune)
        .unwrap_or('?')
}

#[test]
fn overlapping_window_covers_exactly_its_rectangle() {
    let mut ctx = Context::new(40, 20);
    ctx.add_layer("base", 0, 0, 40, 20, 1, "").expect("base");
    ctx.add_layer("top", 10, 5, 10, 5, 2, "").expect("top");
    fill_layer(&mut ctx, "base", 'a');
    fill_layer(&mut ctx, "top", 'b');
    ctx.refresh();

    for y in 0..20 {
        for x in 0..40 {
            let expected = if (10..20).contains(&x) && (5..10).contains(&y) {
                'b'
            } else {
                'a'
            };
            assert_eq!(rune_at(&ctx, x, y), expected, "at ({x}, {y})");
        }
    }
}

#[test]
fn half_alpha_overlay_darkens_without_hiding() {
    let mut ctx = Context::new(40, 20);
    ctx.add_layer("base", 0, 0, 40, 20, 1, "").expect("base");
    ctx.add_layer("shade", 2, 2, 5, 3, 2, "").expect("shade");
    fill_layer(&mut ctx, "base", 'x');
    ctx.layer_mut("shade")
        .expect("shade")
        .fill(Cell::shadow(0.5, 0.5));
    ctx.refresh();

    let shaded = ctx.screen().expect("screen").cell(4, 3).expect("cell");
    assert_eq!(shaded.rune, 'x', "glyph shows through the shade");
    assert_eq!(shaded.fg, Rgb::new(96, 96, 96), "white halves to mid-gray");
    assert_eq!(shaded.bg, BLACK, "black has nowhere darker to go");

    let clear = ctx.screen().expect("screen").cell(10, 10).expect("cell");
    assert_eq!(clear.fg, WHITE);
}

#[test]
fn refreshing_twice_without_changes_yields_the_same_frame() {
    let mut ctx = Context::new(40, 20);
    ctx.add_layer("base", 0, 0, 40, 20, 1, "").expect("base");
    ctx.add_layer("win", 6, 3, 20, 8, 2, "").expect("win");
    fill_layer(&mut ctx, "base", '.');
    fill_layer(&mut ctx, "win", '#');
    ctx.widgets
        .buttons
        .add("win", "ok", 2, 2, 8, "OK", TextStyle::default())
        .expect("button");

    let first = ctx.refresh().clone();
    let second = ctx.refresh();

    for y in 0..20 {
        for x in 0..40 {
            assert_eq!(first.cell(x, y), second.cell(x, y), "at ({x}, {y})");
        }
    }
}

#[test]
fn children_never_paint_outside_their_parent() {
    let mut ctx = Context::new(40, 20);
    ctx.add_layer("base", 0, 0, 40, 20, 1, "").expect("base");
    ctx.add_layer("frame", 8, 4, 12, 6, 2, "").expect("frame");
    ctx.add_layer("tray", 9, 3, 10, 4, 3, "frame").expect("tray");
    fill_layer(&mut ctx, "base", '.');
    fill_layer(&mut ctx, "frame", 'f');
    fill_layer(&mut ctx, "tray", 't');
    ctx.refresh();

    // Tray coordinates are relative to the frame, so it starts at (17, 7)
    // on screen and runs past the frame's right edge at x = 19.
    assert_eq!(rune_at(&ctx, 17, 7), 't');
    assert_eq!(rune_at(&ctx, 19, 7), 't');
    assert_eq!(rune_at(&ctx, 20, 7), '.', "clipped at the parent edge");
    assert_eq!(rune_at(&ctx, 16, 7), 'f');
}

#[test]
fn wide_glyphs_keep_their_trailing_cell() {
    let mut ctx = Context::new(40, 20);
    ctx.add_layer("base", 0, 0, 40, 20, 1, "").expect("base");
    let style = TextStyle::new(Rgb::new(255, 200, 0), Rgb::new(0, 0, 64));
    ctx.layer_mut("base")
        .expect("base")
        .put_str(5, 2, "日本", &style);
    ctx.refresh();

    let screen = ctx.screen().expect("screen");
    let head = screen.cell(5, 2).expect("head");
    let tail = screen.cell(6, 2).expect("tail");
    assert_eq!(head.rune, '日');
    assert_eq!(tail.rune, ' ');
    assert_eq!(tail.fg, head.fg);
    assert_eq!(tail.bg, head.bg);
    assert_eq!(rune_at(&ctx, 7, 2), '本');
}

#[test]
fn z_ties_fall_back_to_alias_order() {
    let mut ctx = Context::new(10, 4);
    ctx.add_layer("zed", 0, 0, 10, 4, 5, "").expect("zed");
    ctx.add_layer("alpha", 0, 0, 10, 4, 5, "").expect("alpha");
    fill_layer(&mut ctx, "zed", 'z');
    fill_layer(&mut ctx, "alpha", 'a');
    ctx.refresh();

    // Same z: the lexicographically later alias composes on top.
    assert_eq!(rune_at(&ctx, 3, 1), 'z');
}

#[test]
fn widget_faces_appear_on_the_screen_but_not_in_the_registry() {
    let mut ctx = Context::new(40, 20);
    ctx.add_layer("win", 4, 2, 20, 6, 1, "").expect("win");
    ctx.widgets
        .checkboxes
        .add("win", "opt", 1, 1, "Wrap lines", TextStyle::default())
        .expect("checkbox");
    ctx.refresh();

    let hit = ctx.hit_at(6, 3).expect("hit");
    assert_eq!(hit.kind, CellKind::Checkbox);
    assert_eq!(hit.layer, "win");
    assert_eq!(hit.control, "opt");

    // The registry copy never saw the checkbox drawn.
    let stored = ctx.layer("win").expect("win").cell(2, 1).expect("cell");
    assert_eq!(stored.kind, CellKind::Plain);
}
