use cel_tui::{
    draw_drop_shadow, draw_frame, Cell, CellKind, Context, ProcessTerminal, Rect, Rgb, TextStyle,
    Tui,
};

fn main() -> cel_tui::Result<()> {
    let mut tui = Tui::new(ProcessTerminal::new());
    tui.start()?;

    let columns = i32::from(tui.columns());
    let rows = i32::from(tui.rows());
    let mut ctx = Context::new(columns, rows);

    let body = TextStyle::new(Rgb::new(220, 220, 220), Rgb::new(36, 44, 58));
    let field = TextStyle::new(Rgb::new(235, 235, 235), Rgb::new(62, 74, 94));
    let chrome = TextStyle::new(Rgb::new(160, 210, 255), Rgb::new(36, 44, 58));

    ctx.set_backdrop(Cell::blank(Rgb::new(110, 120, 130), Rgb::new(12, 16, 22)));
    ctx.styles.set("plain", body);
    ctx.styles.set("hint", TextStyle::new(Rgb::new(130, 140, 155), Rgb::new(36, 44, 58)));

    let (w, h) = (34, 11);
    let x = (columns - w) / 2;
    let y = (rows - h) / 2;
    // Two extra columns and one extra row give the drop shadow room.
    ctx.add_layer("login", x.max(0), y.max(0), w + 2, h + 1, 1, "")?;
    {
        let layer = ctx.layer_mut("login")?;
        layer.fill(Cell::shadow(1.0, 1.0));
        layer.fill_rect(
            Rect::new(0, 0, w, h),
            Cell::blank(Rgb::new(220, 220, 220), Rgb::new(36, 44, 58)),
        );
        draw_frame(layer, Rect::new(0, 0, w, h), " Sign in ", &chrome, "login");
        draw_drop_shadow(layer, Rect::new(0, 0, w, h));
    }

    let widgets = &mut ctx.widgets;
    widgets.labels.add("login", "user_cap", 2, 2, "User", &ctx.styles, body)?;
    widgets.text_fields.add("login", "user", 11, 2, 20, field, false)?;
    widgets.labels.add("login", "pass_cap", 2, 4, "Password", &ctx.styles, body)?;
    widgets.text_fields.add("login", "pass", 11, 4, 20, field, true)?;
    widgets.checkboxes.add("login", "remember", 2, 6, "Remember me", field)?;
    widgets.buttons.add("login", "go", 2, 8, 12, "Sign in", field)?;
    widgets.labels.add("login", "hint", 16, 8, "{hint}esc quits", &ctx.styles, body)?;

    ctx.focus.add_to_tab_index("login", "user", CellKind::TextField);
    ctx.focus.add_to_tab_index("login", "pass", CellKind::TextField);
    ctx.focus.add_to_tab_index("login", "remember", CellKind::Checkbox);
    ctx.focus.add_to_tab_index("login", "go", CellKind::Button);
    ctx.focus.set_focus("login", "user", CellKind::TextField);

    while tui.step(&mut ctx) {
        while let Some(key) = ctx.keyboard.next_key() {
            if key.is("esc") {
                tui.runtime_handle().request_stop();
            }
        }
    }

    tui.stop()?;
    Ok(())
}
