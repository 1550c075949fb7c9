//! Error types shared across the crate.
//!
//! Two families matter at runtime: contract violations (bad dimensions,
//! duplicate aliases, out-of-range channels) which callers treat as fatal,
//! and missing-entity errors (a layer or control deleted mid-event) which
//! the event router downgrades to "nothing happened".

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("layer '{alias}' not found")]
    LayerNotFound { alias: String },

    #[error("layer '{alias}' already exists")]
    DuplicateLayer { alias: String },

    #[error("layer '{alias}' names unknown parent '{parent}'")]
    UnknownParent { alias: String, parent: String },

    #[error("layer '{alias}' has invalid size {width}x{height}; both sides must be positive")]
    InvalidDimensions {
        alias: String,
        width: i32,
        height: i32,
    },

    #[error("color channel out of range in ({r}, {g}, {b}); channels must be 0..=255")]
    InvalidChannel { r: i32, g: i32, b: i32 },

    #[error("cursor ({x}, {y}) lies outside layer '{alias}' ({width}x{height})")]
    CursorOutOfBounds {
        alias: String,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },

    #[error("unknown text style '{alias}'")]
    UnknownStyle { alias: String },

    #[error("control '{control}' on layer '{layer}' not found")]
    ControlNotFound { layer: String, control: String },

    #[error("control '{control}' already exists on layer '{layer}'")]
    DuplicateControl { layer: String, control: String },

    #[error("scrollbar '{alias}' has track length {length}; minimum is 3")]
    TrackTooShort { alias: String, length: i32 },

    #[error("failed to initialise terminal: {source}")]
    TerminalInit {
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    #[must_use]
    pub fn layer_not_found(alias: impl Into<String>) -> Self {
        Self::LayerNotFound {
            alias: alias.into(),
        }
    }

    #[must_use]
    pub fn control_not_found(layer: impl Into<String>, control: impl Into<String>) -> Self {
        Self::ControlNotFound {
            layer: layer.into(),
            control: control.into(),
        }
    }

    #[must_use]
    pub fn duplicate_control(layer: impl Into<String>, control: impl Into<String>) -> Self {
        Self::DuplicateControl {
            layer: layer.into(),
            control: control.into(),
        }
    }

    #[must_use]
    pub fn unknown_style(alias: impl Into<String>) -> Self {
        Self::UnknownStyle {
            alias: alias.into(),
        }
    }

    /// True for errors that mean "the thing is gone", as opposed to a broken
    /// call contract. The router treats these as clean no-ops.
    pub fn is_missing_entity(&self) -> bool {
        matches!(
            self,
            Self::LayerNotFound { .. } | Self::ControlNotFound { .. }
        )
    }
}

/// Collapse a missing-entity error into "not dirty"; propagate the rest.
///
/// Event dispatch uses this so controls deleted between event arrival and
/// dispatch degrade to no-ops instead of tearing the loop down.
pub fn dirty_or_clean(result: Result<bool>) -> Result<bool> {
    match result {
        Ok(dirty) => Ok(dirty),
        Err(err) if err.is_missing_entity() => Ok(false),
        Err(err) => Err(err),
    }
}
