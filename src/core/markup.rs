//! Inline `{alias}` style markup.
//!
//! A tag switches the active style for everything after it until the next
//! tag or end of input. `{{` and `}}` print literal braces. Unknown style
//! aliases fail the parse; dialogs are authored by the application, so a bad
//! alias is a bug worth surfacing early.

use crate::core::style::{StyleSheet, TextStyle};
use crate::error::Result;

/// A run of text in one resolved style.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledRun {
    pub style: TextStyle,
    pub text: String,
}

pub fn parse_markup(input: &str, sheet: &StyleSheet, base: TextStyle) -> Result<Vec<StyledRun>> {
    let mut runs = Vec::new();
    let mut current = base;
    let mut buffer = String::new();
    let mut chars = input.chars().peekable();

    let mut flush = |runs: &mut Vec<StyledRun>, style: TextStyle, buffer: &mut String| {
        if !buffer.is_empty() {
            runs.push(StyledRun {
                style,
                text: std::mem::take(buffer),
            });
        }
    };

    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    buffer.push('{');
                    continue;
                }
                let mut alias = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    alias.push(inner);
                }
                if !closed {
                    // Unterminated tag: print it verbatim.
                    buffer.push('{');
                    buffer.push_str(&alias);
                    continue;
                }
                let style = sheet.get(&alias)?;
                flush(&mut runs, current, &mut buffer);
                current = style;
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                }
                buffer.push('}');
            }
            other => buffer.push(other),
        }
    }
    flush(&mut runs, current, &mut buffer);
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::parse_markup;
    use crate::core::cell::CellFlags;
    use crate::core::color::Rgb;
    use crate::core::style::{StyleSheet, TextStyle};

    fn sheet() -> StyleSheet {
        let mut sheet = StyleSheet::new();
        sheet.set(
            "em",
            TextStyle::new(Rgb::new(255, 0, 0), Rgb::new(0, 0, 0)).with_flags(CellFlags::BOLD),
        );
        sheet
    }

    #[test]
    fn plain_text_is_one_run() {
        let runs = parse_markup("hello", &sheet(), TextStyle::default()).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "hello");
        assert_eq!(runs[0].style, TextStyle::default());
    }

    #[test]
    fn tag_switches_style_until_end() {
        let runs = parse_markup("a{em}bc", &sheet(), TextStyle::default()).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "a");
        assert_eq!(runs[1].text, "bc");
        assert!(runs[1].style.flags.contains(CellFlags::BOLD));
    }

    #[test]
    fn escaped_braces_are_literal() {
        let runs = parse_markup("{{em}}", &sheet(), TextStyle::default()).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "{em}");
    }

    #[test]
    fn unknown_alias_fails() {
        assert!(parse_markup("{nope}x", &sheet(), TextStyle::default()).is_err());
    }

    #[test]
    fn unterminated_tag_prints_verbatim() {
        let runs = parse_markup("a{em", &sheet(), TextStyle::default()).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "a{em");
    }
}
