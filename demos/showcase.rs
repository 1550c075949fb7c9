use std::cell::Cell as StdCell;
use std::rc::Rc;

use cel_tui::{
    draw_drop_shadow, draw_frame, Cell, CellFlags, CellKind, Context, ProcessTerminal, Rect, Rgb,
    TextStyle, Tui,
};

const FILES: [&str; 14] = [
    "Cargo.toml",
    "README.md",
    "src/lib.rs",
    "src/core/cell.rs",
    "src/core/color.rs",
    "src/core/layer.rs",
    "src/core/markup.rs",
    "src/render/border.rs",
    "src/render/compositor.rs",
    "src/render/renderer.rs",
    "src/runtime/context.rs",
    "src/runtime/router.rs",
    "src/widgets/button.rs",
    "src/widgets/selector.rs",
];

const NOTES: &str = "Drag either window by its title bar.\n\
Tab walks the focus ring; arrows move inside lists.\n\
Wheel-scroll the file list, or grab its handle.\n\
Press q to quit.";

fn panel_style() -> TextStyle {
    TextStyle::new(Rgb::new(220, 220, 220), Rgb::new(32, 40, 52))
}

fn chrome_style() -> TextStyle {
    TextStyle::new(Rgb::new(255, 214, 140), Rgb::new(32, 40, 52))
}

fn control_style() -> TextStyle {
    TextStyle::new(Rgb::new(235, 235, 235), Rgb::new(58, 70, 88))
}

fn build_gallery(ctx: &mut Context) -> cel_tui::Result<()> {
    ctx.set_backdrop(Cell::blank(Rgb::new(120, 130, 140), Rgb::new(14, 18, 24)));

    ctx.styles.set("plain", panel_style());
    ctx.styles.set("accent", chrome_style().with_flags(CellFlags::BOLD));
    ctx.styles.set("dim", TextStyle::new(Rgb::new(140, 150, 160), Rgb::new(32, 40, 52)));

    // Layers carry a 2x1 transparent margin so the drop shadow has room.
    ctx.add_layer("panel", 2, 1, 48, 22, 1, "")?;
    {
        let layer = ctx.layer_mut("panel")?;
        layer.fill(Cell::shadow(1.0, 1.0));
        layer.fill_rect(
            Rect::new(0, 0, 46, 21),
            Cell::blank(Rgb::new(220, 220, 220), Rgb::new(32, 40, 52)),
        );
        draw_frame(layer, Rect::new(0, 0, 46, 21), " Widget Gallery ", &chrome_style(), "panel");
        draw_drop_shadow(layer, Rect::new(0, 0, 46, 21));
    }

    let widgets = &mut ctx.widgets;
    widgets.labels.add(
        "panel",
        "intro",
        2,
        2,
        "Every control below is {accent}live{plain}.",
        &ctx.styles,
        panel_style(),
    )?;

    widgets.buttons.add("panel", "apply", 2, 4, 11, "Apply", control_style())?;
    widgets.checkboxes.add("panel", "logs", 16, 4, "Verbose logs", control_style())?;

    widgets.radios.add(
        "panel",
        "mode",
        2,
        6,
        vec!["Fast".into(), "Balanced".into(), "Thorough".into()],
        control_style(),
    )?;

    widgets.labels.add("panel", "name_cap", 2, 10, "{dim}Name", &ctx.styles, panel_style())?;
    widgets.text_fields.add("panel", "name", 8, 10, 16, control_style(), false)?;
    widgets.labels.add("panel", "pass_cap", 26, 10, "{dim}Key", &ctx.styles, panel_style())?;
    widgets.text_fields.add("panel", "secret", 31, 10, 12, control_style(), true)?;

    widgets.dropdowns.add(
        "panel",
        "theme",
        2,
        12,
        16,
        vec!["Midnight".into(), "Paper".into(), "Solarized".into(), "Mono".into()],
        control_style(),
    )?;

    widgets.progress_bars.add("panel", "meter", 2, 15, 40, 100, control_style())?;
    widgets.progress_bars.set_value("panel", "meter", 20)?;

    widgets.textboxes.add("panel", "notes", 2, 17, 42, 3, NOTES, panel_style())?;
    widgets.scrollbars.add("panel", "notes_bar", 44, 17, 3, 0, false, control_style())?;
    widgets.textboxes.attach_scrollbar("panel", "notes", "notes_bar", &mut widgets.scrollbars)?;

    // Hot spots claim their cells for hit-testing, so the tooltip hovers
    // the passive meter row rather than a clickable control.
    widgets.tooltips.add(
        "panel",
        "meter_tip",
        Rect::new(2, 15, 40, 1),
        "Apply fills this meter",
        600,
        TextStyle::new(Rgb::new(20, 20, 20), Rgb::new(255, 214, 140)),
    )?;

    ctx.add_layer("files", 40, 4, 34, 16, 2, "")?;
    {
        let layer = ctx.layer_mut("files")?;
        layer.fill(Cell::shadow(1.0, 1.0));
        layer.fill_rect(
            Rect::new(0, 0, 32, 15),
            Cell::blank(Rgb::new(220, 220, 220), Rgb::new(26, 34, 44)),
        );
        draw_frame(layer, Rect::new(0, 0, 32, 15), " Files ", &chrome_style(), "files");
        draw_drop_shadow(layer, Rect::new(0, 0, 32, 15));
    }

    let widgets = &mut ctx.widgets;
    widgets.selectors.add(
        "files",
        "list",
        2,
        2,
        26,
        11,
        FILES.iter().map(|name| (*name).to_string()).collect(),
        control_style(),
    )?;
    widgets.scrollbars.add("files", "list_bar", 29, 2, 11, 0, false, control_style())?;
    widgets.selectors.attach_scrollbar("files", "list", "list_bar", &mut widgets.scrollbars)?;

    let focus = &mut ctx.focus;
    focus.add_to_tab_index("panel", "apply", CellKind::Button);
    focus.add_to_tab_index("panel", "logs", CellKind::Checkbox);
    focus.add_to_tab_index("panel", "name", CellKind::TextField);
    focus.add_to_tab_index("panel", "secret", CellKind::TextField);
    focus.add_to_tab_index("panel", "theme", CellKind::Dropdown);
    focus.add_to_tab_index("files", "list", CellKind::SelectorItem);

    Ok(())
}

fn main() -> cel_tui::Result<()> {
    let mut tui = Tui::new(ProcessTerminal::new());
    tui.start()?;

    let mut ctx = Context::new(i32::from(tui.columns()), i32::from(tui.rows()));
    build_gallery(&mut ctx)?;

    let clicks = Rc::new(StdCell::new(0u32));
    let counter = Rc::clone(&clicks);
    ctx.widgets.buttons.set_on_click(
        "panel",
        "apply",
        Some(Box::new(move || counter.set(counter.get() + 1))),
    )?;

    let mut applied = 0;
    while tui.step(&mut ctx) {
        while let Some(key) = ctx.keyboard.next_key() {
            if key.is("q") || key.is("esc") {
                tui.runtime_handle().request_stop();
            }
        }

        if clicks.get() > applied {
            applied = clicks.get();
            let value = 20 + ((applied * 10) % 81) as i32;
            if ctx.widgets.progress_bars.set_value("panel", "meter", value)? {
                tui.request_redraw();
            }
        }
    }

    tui.stop()?;
    Ok(())
}
