//! Assembly of raw reads into chunks the event decoder can parse whole.
//!
//! A `read` can end in the middle of an escape sequence or a multi-byte
//! character. The assembler holds such tails back until the next read
//! completes them, or until a short deadline passes; a lone ESC that stays
//! lone for that long really is the escape key.

use std::time::{Duration, Instant};

const ESC: u8 = 0x1b;

pub struct SequenceAssembler {
    pending: Vec<u8>,
    hold: Duration,
    deadline: Option<Instant>,
}

impl SequenceAssembler {
    pub fn new(hold_ms: u64) -> Self {
        Self {
            pending: Vec::new(),
            hold: Duration::from_millis(hold_ms),
            deadline: None,
        }
    }

    /// Append freshly read bytes and return the longest decodable prefix.
    /// An incomplete tail stays buffered with a flush deadline of now plus
    /// the hold interval.
    pub fn feed(&mut self, bytes: &[u8], now: Instant) -> Option<String> {
        self.deadline = None;
        self.pending.extend_from_slice(bytes);
        let ready = complete_prefix_len(&self.pending);
        let chunk = if ready == 0 {
            None
        } else {
            let tail = self.pending.split_off(ready);
            let head = std::mem::replace(&mut self.pending, tail);
            Some(String::from_utf8_lossy(&head).into_owned())
        };
        if !self.pending.is_empty() {
            self.deadline = Some(now + self.hold);
        }
        chunk
    }

    /// Emit the held tail verbatim once its deadline has passed.
    pub fn flush_due(&mut self, now: Instant) -> Option<String> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;
        if self.pending.is_empty() {
            return None;
        }
        let held = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&held).into_owned())
    }

    /// Poll timeout that honours a pending tail deadline.
    pub fn next_timeout_ms(&self, now: Instant, default_ms: i32) -> i32 {
        let Some(deadline) = self.deadline else {
            return default_ms;
        };
        let remaining = deadline.saturating_duration_since(now);
        let ms = remaining.as_millis().min(i32::MAX as u128) as i32;
        ms.clamp(0, default_ms)
    }
}

fn complete_prefix_len(bytes: &[u8]) -> usize {
    let mut pos = 0;
    while pos < bytes.len() {
        let step = if bytes[pos] == ESC {
            escape_len(&bytes[pos..])
        } else {
            char_len(&bytes[pos..])
        };
        match step {
            Some(len) => pos += len,
            None => break,
        }
    }
    pos
}

/// Byte length of the escape sequence at the start of `bytes`, or `None`
/// while its tail is still outstanding.
fn escape_len(bytes: &[u8]) -> Option<usize> {
    match bytes.get(1)? {
        // X10 mouse report: three payload bytes after the introducer.
        b'[' if bytes.get(2) == Some(&b'M') => (bytes.len() >= 6).then_some(6),
        // CSI runs until its final byte.
        b'[' => bytes[2..]
            .iter()
            .position(|byte| (0x40..=0x7e).contains(byte))
            .map(|i| i + 3),
        b'O' => (bytes.len() >= 3).then_some(3),
        // ESC ESC: the first stands alone as the escape key.
        &ESC => Some(1),
        // Alt-prefixed character.
        _ => char_len(&bytes[1..]).map(|len| len + 1),
    }
}

/// Byte length of the character at the start of `bytes`, or `None` while
/// continuation bytes are still outstanding. Stray continuation bytes count
/// as one each and decode lossily later.
fn char_len(bytes: &[u8]) -> Option<usize> {
    let need = match *bytes.first()? {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => 1,
    };
    (bytes.len() >= need).then_some(need)
}
