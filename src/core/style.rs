//! Text styles and the named style table consumed by markup.

use std::collections::HashMap;

use crate::core::cell::CellFlags;
use crate::core::color::{Rgb, BLACK, WHITE};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    pub fg: Rgb,
    pub bg: Rgb,
    pub flags: CellFlags,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            fg: WHITE,
            bg: BLACK,
            flags: CellFlags::empty(),
        }
    }
}

impl TextStyle {
    pub fn new(fg: Rgb, bg: Rgb) -> Self {
        Self {
            fg,
            bg,
            flags: CellFlags::empty(),
        }
    }

    pub fn with_flags(mut self, flags: CellFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Foreground/background swapped, for highlights.
    pub fn inverted(&self) -> Self {
        Self {
            fg: self.bg,
            bg: self.fg,
            flags: self.flags,
        }
    }
}

/// Named styles addressed by `{alias}` markup tags.
#[derive(Debug, Default)]
pub struct StyleSheet {
    styles: HashMap<String, TextStyle>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, alias: impl Into<String>, style: TextStyle) {
        self.styles.insert(alias.into(), style);
    }

    /// Unknown aliases are a caller bug, not a runtime condition.
    pub fn get(&self, alias: &str) -> Result<TextStyle> {
        self.styles
            .get(alias)
            .copied()
            .ok_or_else(|| Error::unknown_style(alias))
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.styles.contains_key(alias)
    }
}
