//! Static text labels with inline `{alias}` markup.
//!
//! Markup is parsed when the text is set, so a bad style alias errors at the
//! call site and the draw pass stays infallible.

use crate::core::cell::CellKind;
use crate::core::layer::{CellTag, Layer};
use crate::core::markup::{parse_markup, StyledRun};
use crate::core::style::{StyleSheet, TextStyle};
use crate::core::text::display_width;
use crate::error::Result;
use crate::widgets::controls::ControlMap;

pub struct LabelEntry {
    x: i32,
    y: i32,
    runs: Vec<StyledRun>,
    visible: bool,
}

#[derive(Default)]
pub struct Labels {
    entries: ControlMap<LabelEntry>,
}

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        layer: &str,
        alias: &str,
        x: i32,
        y: i32,
        text: &str,
        sheet: &StyleSheet,
        base: TextStyle,
    ) -> Result<()> {
        let runs = parse_markup(text, sheet, base)?;
        self.entries.insert(
            layer,
            alias,
            LabelEntry {
                x,
                y,
                runs,
                visible: true,
            },
        )
    }

    pub fn set_text(
        &mut self,
        layer: &str,
        alias: &str,
        text: &str,
        sheet: &StyleSheet,
        base: TextStyle,
    ) -> Result<()> {
        let runs = parse_markup(text, sheet, base)?;
        self.entries.get_mut(layer, alias)?.runs = runs;
        Ok(())
    }

    pub fn set_visible(&mut self, layer: &str, alias: &str, visible: bool) -> Result<()> {
        self.entries.get_mut(layer, alias)?.visible = visible;
        Ok(())
    }

    pub fn text(&self, layer: &str, alias: &str) -> Result<String> {
        let entry = self.entries.get(layer, alias)?;
        Ok(entry.runs.iter().map(|r| r.text.as_str()).collect())
    }

    pub(crate) fn contains(&self, layer: &str, alias: &str) -> bool {
        self.entries.contains(layer, alias)
    }

    pub(crate) fn remove_layer(&mut self, layer: &str) {
        self.entries.remove_layer(layer);
    }

    pub(crate) fn has_layer(&self, layer: &str) -> bool {
        self.entries.has_layer(layer)
    }

    pub(crate) fn draw_on(&mut self, layer: &mut Layer) {
        let layer_alias = layer.alias().to_string();
        for (alias, entry) in self.entries.iter_layer_mut(&layer_alias) {
            if !entry.visible {
                continue;
            }
            let tag = CellTag::control(CellKind::Label, alias);
            let mut x = entry.x;
            for run in &entry.runs {
                layer.put_str_tagged(x, entry.y, &run.text, &run.style, &tag);
                x += display_width(&run.text) as i32;
            }
        }
    }
}
