//! Debug logging to an append-only file sink.
//!
//! Terminal UIs cannot log to stdout while they own the screen, so all
//! diagnostics go to the file named by `CEL_DEBUG_LOG`. With the variable
//! unset every logging call is a cheap no-op.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

use crate::config::EnvConfig;

static START: Lazy<Instant> = Lazy::new(Instant::now);

struct Sink {
    file: Mutex<File>,
    frames: bool,
}

static SINK: Lazy<Option<Sink>> = Lazy::new(|| {
    let config = EnvConfig::from_env();
    let path = config.debug_log?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .ok()?;
    Some(Sink {
        file: Mutex::new(file),
        frames: config.debug_frames,
    })
});

pub fn debug_enabled() -> bool {
    SINK.is_some()
}

/// True when per-frame diff statistics should be recorded.
pub fn frames_enabled() -> bool {
    SINK.as_ref().is_some_and(|sink| sink.frames)
}

/// Append one line to the debug log, tagged with the originating area
/// (`"router"`, `"compose"`, `"frame"`, ...).
pub fn log_debug(area: &str, message: &str) {
    let Some(sink) = SINK.as_ref() else {
        return;
    };
    let line = format_line(START.elapsed(), area, message);
    let mut file = match sink.file.lock() {
        Ok(file) => file,
        Err(poisoned) => poisoned.into_inner(),
    };
    let _ = file.write_all(line.as_bytes());
}

/// Per-frame diff statistics emitted by the renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    pub columns: u16,
    pub rows: u16,
    pub cells_changed: usize,
    pub bytes_written: usize,
    pub full_repaint: bool,
}

impl FrameStats {
    pub fn summary(&self) -> String {
        format!(
            "{}x{} changed={} bytes={}{}",
            self.columns,
            self.rows,
            self.cells_changed,
            self.bytes_written,
            if self.full_repaint { " full" } else { "" }
        )
    }
}

pub fn log_frame_stats(stats: &FrameStats) {
    if frames_enabled() {
        log_debug("frame", &stats.summary());
    }
}

fn format_line(elapsed: Duration, area: &str, message: &str) -> String {
    format!(
        "[{:>8.3}s] {area}: {message}\n",
        elapsed.as_secs_f64(),
    )
}
