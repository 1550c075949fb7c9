//! Decoding of raw terminal byte streams into key and mouse events.
//!
//! Input arrives as coalesced chunks from the reader thread, so one chunk may
//! carry several events. `parse_events` walks the chunk left to right and
//! yields every event it recognises, skipping escape sequences it does not.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Modifier mask, laid out like the xterm `1 + bits` parameter encoding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1;
        const ALT = 2;
        const CTRL = 4;
    }
}

/// Mouse button bits as stored in [`MouseInput::buttons`].
pub const BUTTON_LEFT: u32 = 1;
pub const BUTTON_MIDDLE: u32 = 2;
pub const BUTTON_RIGHT: u32 = 4;

/// One keystroke: a printable code point or a lowercase symbolic name.
///
/// Symbolic names are the canonical set `enter`, `esc`, `tab`, `up`, `down`,
/// `left`, `right`, `pgup`, `pgdn`, `home`, `end`, `backspace`, `delete`,
/// `insert` and `f1`..`f12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Named(&'static str),
}

impl Key {
    /// Symbolic name, or `None` for printable keys.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Key::Named(name) => Some(name),
            Key::Char(_) => None,
        }
    }

    /// Compare against a key id. `"escape"` is accepted as an alias for the
    /// canonical `"esc"`; printable keys match their single-character id.
    pub fn is(&self, id: &str) -> bool {
        match self {
            Key::Named(name) => *name == id || (*name == "esc" && id == "escape"),
            Key::Char(ch) => {
                let mut chars = id.chars();
                chars.next() == Some(*ch) && chars.next().is_none()
            }
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(ch) => write!(f, "{ch}"),
            Key::Named(name) => f.write_str(name),
        }
    }
}

/// Wheel direction of a mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wheel {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
}

impl Wheel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Wheel::None => "",
            Wheel::Up => "Up",
            Wheel::Down => "Down",
            Wheel::Left => "Left",
            Wheel::Right => "Right",
        }
    }
}

/// One decoded mouse report in zero-based screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseInput {
    pub x: i32,
    pub y: i32,
    /// Held-button mask; zero on release and pure motion.
    pub buttons: u32,
    pub wheel: Wheel,
}

impl MouseInput {
    /// 1-based index of the lowest held button, 0 when none is held.
    pub fn pressed_button(&self) -> u32 {
        if self.buttons == 0 {
            0
        } else {
            self.buttons.trailing_zeros() + 1
        }
    }
}

/// One resolved mouse sample as the router and widgets see it: position,
/// 1-based pressed button index, wheel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseSnapshot {
    pub x: i32,
    pub y: i32,
    pub button: u32,
    pub wheel: Wheel,
}

impl MouseSnapshot {
    /// The pre-first-event sample. Position (-1, -1) keeps cell (0, 0) from
    /// firing phantom events at startup.
    pub fn start() -> Self {
        Self {
            x: -1,
            y: -1,
            button: 0,
            wheel: Wheel::None,
        }
    }

    pub fn from_input(input: &MouseInput) -> Self {
        Self {
            x: input.x,
            y: input.y,
            button: input.pressed_button(),
            wheel: input.wheel,
        }
    }
}

/// A decoded terminal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Key { key: Key, modifiers: Modifiers },
    Mouse(MouseInput),
}

fn key_event(name: &'static str, modifiers: Modifiers) -> Event {
    Event::Key {
        key: Key::Named(name),
        modifiers,
    }
}

fn char_event(ch: char, modifiers: Modifiers) -> Event {
    Event::Key {
        key: Key::Char(ch),
        modifiers,
    }
}

/// Decode every recognisable event in `data`. Unknown escape sequences are
/// consumed silently so their bytes never leak through as printable input.
pub fn parse_events(data: &str) -> Vec<Event> {
    let mut events = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let (event, used) = next_event(data, i);
        if let Some(event) = event {
            events.push(event);
        }
        i += used.max(1);
    }
    events
}

fn next_event(data: &str, start: usize) -> (Option<Event>, usize) {
    if data.as_bytes()[start] == 0x1b {
        parse_escape(data, start)
    } else {
        parse_plain(data, start, Modifiers::empty())
    }
}

/// Decode a single non-CSI byte or UTF-8 character at `start`, folding in
/// `extra` modifiers (used for the ESC = alt prefix).
fn parse_plain(data: &str, start: usize, extra: Modifiers) -> (Option<Event>, usize) {
    let bytes = data.as_bytes();
    match bytes[start] {
        b'\r' | b'\n' => (Some(key_event("enter", extra)), 1),
        b'\t' => (Some(key_event("tab", extra)), 1),
        0x7f | 0x08 => (Some(key_event("backspace", extra)), 1),
        0x1b => (Some(key_event("esc", extra)), 1),
        0x00 => (Some(char_event(' ', extra | Modifiers::CTRL)), 1),
        0x1c => (Some(char_event('\\', extra | Modifiers::CTRL)), 1),
        0x1d => (Some(char_event(']', extra | Modifiers::CTRL)), 1),
        0x1f => (Some(char_event('-', extra | Modifiers::CTRL)), 1),
        code @ 0x01..=0x1a => {
            let ch = (code + 96) as char;
            (Some(char_event(ch, extra | Modifiers::CTRL)), 1)
        }
        b if b < 0x20 => (None, 1),
        _ => match data[start..].chars().next() {
            Some(ch) => (Some(char_event(ch, extra)), ch.len_utf8()),
            None => (None, 1),
        },
    }
}

fn parse_escape(data: &str, start: usize) -> (Option<Event>, usize) {
    let bytes = data.as_bytes();
    if start + 1 >= bytes.len() {
        return (Some(key_event("esc", Modifiers::empty())), 1);
    }
    match bytes[start + 1] {
        b'[' => parse_csi(data, start),
        b'O' => parse_ss3(data, start),
        0x1b => (Some(key_event("esc", Modifiers::empty())), 1),
        _ => {
            let (event, used) = parse_plain(data, start + 1, Modifiers::ALT);
            (event, used + 1)
        }
    }
}

fn parse_ss3(data: &str, start: usize) -> (Option<Event>, usize) {
    let bytes = data.as_bytes();
    if start + 2 >= bytes.len() {
        return (None, bytes.len() - start);
    }
    let name = match bytes[start + 2] {
        b'P' => "f1",
        b'Q' => "f2",
        b'R' => "f3",
        b'S' => "f4",
        b'A' => "up",
        b'B' => "down",
        b'C' => "right",
        b'D' => "left",
        b'H' => "home",
        b'F' => "end",
        b'M' => "enter",
        _ => return (None, 3),
    };
    (Some(key_event(name, Modifiers::empty())), 3)
}

fn parse_csi(data: &str, start: usize) -> (Option<Event>, usize) {
    let bytes = data.as_bytes();
    let len = bytes.len();

    // Linux console function keys: ESC [ [ A..E.
    if start + 2 < len && bytes[start + 2] == b'[' {
        if start + 3 >= len {
            return (None, len - start);
        }
        let name = match bytes[start + 3] {
            b'A' => "f1",
            b'B' => "f2",
            b'C' => "f3",
            b'D' => "f4",
            b'E' => "f5",
            _ => return (None, 4),
        };
        return (Some(key_event(name, Modifiers::empty())), 4);
    }

    let mut i = start + 2;
    let sgr_mouse = i < len && bytes[i] == b'<';
    if sgr_mouse {
        i += 1;
    }
    let body_start = i;
    while i < len && matches!(bytes[i], 0x30..=0x3f) {
        i += 1;
    }
    if i >= len {
        // Truncated sequence at the end of the chunk.
        return (None, len - start);
    }
    let final_byte = bytes[i] as char;
    let body = &data[body_start..i];
    let used = i + 1 - start;

    if sgr_mouse {
        return (parse_sgr_mouse(body, final_byte), used);
    }

    // X10 mouse fallback: ESC [ M cb cx cy with bias 32.
    if final_byte == 'M' && body.is_empty() {
        if start + 5 >= len {
            return (None, len - start);
        }
        let cb = bytes[start + 3].wrapping_sub(32) as i32;
        let x = bytes[start + 4].wrapping_sub(33) as i32;
        let y = bytes[start + 5].wrapping_sub(33) as i32;
        return (Some(decode_mouse_flags(cb, x, y, cb & 3 != 3)), 6);
    }

    let modifiers = csi_modifiers(body);
    let event = match final_byte {
        'A' => Some(key_event("up", modifiers)),
        'B' => Some(key_event("down", modifiers)),
        'C' => Some(key_event("right", modifiers)),
        'D' => Some(key_event("left", modifiers)),
        'H' => Some(key_event("home", modifiers)),
        'F' => Some(key_event("end", modifiers)),
        'Z' => Some(key_event("tab", modifiers | Modifiers::SHIFT)),
        '~' => tilde_key(body),
        _ => None,
    };
    (event, used)
}

/// Modifier parameter of a `CSI 1;m X` sequence; absent means none.
fn csi_modifiers(body: &str) -> Modifiers {
    let Some((_, raw)) = body.split_once(';') else {
        return Modifiers::empty();
    };
    let value = raw
        .split(':')
        .next()
        .unwrap_or(raw)
        .parse::<u8>()
        .unwrap_or(1);
    Modifiers::from_bits_truncate(value.saturating_sub(1))
}

fn tilde_key(body: &str) -> Option<Event> {
    let code_raw = body.split(';').next().unwrap_or(body);
    let code = code_raw.parse::<u8>().ok()?;
    let name = match code {
        1 | 7 => "home",
        2 => "insert",
        3 => "delete",
        4 | 8 => "end",
        5 => "pgup",
        6 => "pgdn",
        11 => "f1",
        12 => "f2",
        13 => "f3",
        14 => "f4",
        15 => "f5",
        17 => "f6",
        18 => "f7",
        19 => "f8",
        20 => "f9",
        21 => "f10",
        23 => "f11",
        24 => "f12",
        _ => return None,
    };
    Some(key_event(name, csi_modifiers(body)))
}

fn parse_sgr_mouse(body: &str, final_byte: char) -> Option<Event> {
    let mut parts = body.split(';').map(str::parse::<i32>);
    let cb = parts.next()?.ok()?;
    let x = parts.next()?.ok()? - 1;
    let y = parts.next()?.ok()? - 1;
    Some(decode_mouse_flags(cb, x, y, final_byte == 'M'))
}

fn decode_mouse_flags(cb: i32, x: i32, y: i32, press: bool) -> Event {
    let mut input = MouseInput {
        x,
        y,
        buttons: 0,
        wheel: Wheel::None,
    };
    if cb & 64 != 0 {
        input.wheel = match cb & 3 {
            0 => Wheel::Up,
            1 => Wheel::Down,
            2 => Wheel::Left,
            _ => Wheel::Right,
        };
    } else if press {
        // Bits 0..1 name the button; 3 means motion with no button held.
        input.buttons = match cb & 3 {
            0 => BUTTON_LEFT,
            1 => BUTTON_MIDDLE,
            2 => BUTTON_RIGHT,
            _ => 0,
        };
    }
    Event::Mouse(input)
}

#[cfg(test)]
mod tests {
    use super::{parse_events, Event, Key, Modifiers, MouseInput, Wheel};

    fn single(data: &str) -> Event {
        let events = parse_events(data);
        assert_eq!(events.len(), 1, "expected one event from {data:?}");
        events[0]
    }

    fn named(data: &str) -> (Key, Modifiers) {
        match single(data) {
            Event::Key { key, modifiers } => (key, modifiers),
            other => panic!("expected key event, got {other:?}"),
        }
    }

    fn mouse(data: &str) -> MouseInput {
        match single(data) {
            Event::Mouse(input) => input,
            other => panic!("expected mouse event, got {other:?}"),
        }
    }

    #[test]
    fn printable_run_yields_char_events() {
        let events = parse_events("héllo");
        assert_eq!(events.len(), 5);
        assert_eq!(
            events[1],
            Event::Key {
                key: Key::Char('é'),
                modifiers: Modifiers::empty()
            }
        );
    }

    #[test]
    fn basic_named_keys() {
        assert_eq!(named("\r").0, Key::Named("enter"));
        assert_eq!(named("\t").0, Key::Named("tab"));
        assert_eq!(named("\x7f").0, Key::Named("backspace"));
        assert_eq!(named("\x1b").0, Key::Named("esc"));
        assert_eq!(named("\x1b[A").0, Key::Named("up"));
        assert_eq!(named("\x1b[H").0, Key::Named("home"));
        assert_eq!(named("\x1bOF").0, Key::Named("end"));
        assert_eq!(named("\x1b[5~").0, Key::Named("pgup"));
        assert_eq!(named("\x1b[6~").0, Key::Named("pgdn"));
        assert_eq!(named("\x1b[2~").0, Key::Named("insert"));
        assert_eq!(named("\x1b[3~").0, Key::Named("delete"));
    }

    #[test]
    fn function_keys_across_encodings() {
        assert_eq!(named("\x1bOP").0, Key::Named("f1"));
        assert_eq!(named("\x1b[15~").0, Key::Named("f5"));
        assert_eq!(named("\x1b[24~").0, Key::Named("f12"));
        assert_eq!(named("\x1b[[C").0, Key::Named("f3"));
    }

    #[test]
    fn modifier_parameters() {
        let (key, mods) = named("\x1b[1;5D");
        assert_eq!(key, Key::Named("left"));
        assert_eq!(mods, Modifiers::CTRL);

        let (key, mods) = named("\x1b[Z");
        assert_eq!(key, Key::Named("tab"));
        assert_eq!(mods, Modifiers::SHIFT);

        let (key, mods) = named("\x1b[3;2~");
        assert_eq!(key, Key::Named("delete"));
        assert_eq!(mods, Modifiers::SHIFT);
    }

    #[test]
    fn ctrl_and_alt_chords() {
        let (key, mods) = named("\x01");
        assert_eq!(key, Key::Char('a'));
        assert_eq!(mods, Modifiers::CTRL);

        let (key, mods) = named("\x1bx");
        assert_eq!(key, Key::Char('x'));
        assert_eq!(mods, Modifiers::ALT);

        let (key, mods) = named("\x1b\r");
        assert_eq!(key, Key::Named("enter"));
        assert_eq!(mods, Modifiers::ALT);
    }

    #[test]
    fn sgr_press_drag_release() {
        let press = mouse("\x1b[<0;5;3M");
        assert_eq!((press.x, press.y), (4, 2));
        assert_eq!(press.buttons, 1);
        assert_eq!(press.pressed_button(), 1);

        let drag = mouse("\x1b[<32;6;3M");
        assert_eq!(drag.buttons, 1);

        let release = mouse("\x1b[<0;6;3m");
        assert_eq!(release.buttons, 0);
        assert_eq!(release.pressed_button(), 0);
    }

    #[test]
    fn sgr_wheel_and_right_button() {
        let wheel = mouse("\x1b[<64;10;4M");
        assert_eq!(wheel.wheel, Wheel::Up);
        assert_eq!(wheel.buttons, 0);
        assert_eq!(mouse("\x1b[<65;10;4M").wheel, Wheel::Down);

        let right = mouse("\x1b[<2;1;1M");
        assert_eq!(right.buttons, 4);
        assert_eq!(right.pressed_button(), 3);
    }

    #[test]
    fn x10_fallback_mouse() {
        // ESC [ M, then cb=32 (left press), x=5, y=3 with bias 32/33.
        let data = "\x1b[M\x20\x26\x24";
        let input = mouse(data);
        assert_eq!((input.x, input.y), (5, 3));
        assert_eq!(input.buttons, 1);
    }

    #[test]
    fn mixed_chunk_parses_in_order() {
        let events = parse_events("\x1b[<0;2;2Mab\x1b[B");
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], Event::Mouse(_)));
        assert_eq!(
            events[3],
            Event::Key {
                key: Key::Named("down"),
                modifiers: Modifiers::empty()
            }
        );
    }

    #[test]
    fn unknown_sequences_are_swallowed() {
        // Bracketed-paste fences decode to nothing; the payload survives.
        let events = parse_events("\x1b[200~hi\x1b[201~");
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            Event::Key {
                key: Key::Char('h'),
                modifiers: Modifiers::empty()
            }
        );
    }

    #[test]
    fn key_id_matching_with_escape_alias() {
        assert!(Key::Named("esc").is("escape"));
        assert!(Key::Named("esc").is("esc"));
        assert!(!Key::Named("enter").is("esc"));
        assert!(Key::Char('q').is("q"));
        assert!(!Key::Char('q').is("qu"));
    }

    #[test]
    fn wheel_direction_strings() {
        assert_eq!(Wheel::Up.as_str(), "Up");
        assert_eq!(Wheel::Left.as_str(), "Left");
        assert_eq!(Wheel::None.as_str(), "");
    }
}
