//! Display-width helpers for grapheme clusters.

use emojis::get as emoji_get;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

/// Columns a single grapheme cluster occupies on screen.
///
/// Emoji sequences report 2 regardless of what their individual scalars
/// claim, matching how terminals actually advance the cursor for them.
pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.is_empty() {
        return 0;
    }

    if emoji_get(grapheme).is_some() {
        return 2;
    }

    let mut width = 0;
    for ch in grapheme.chars() {
        width += UnicodeWidthChar::width(ch).unwrap_or(0);
    }
    width
}

/// Columns a single code point occupies in a cell grid.
pub fn rune_width(rune: char) -> usize {
    UnicodeWidthChar::width(rune).unwrap_or(0)
}

/// Total display width of a string.
pub fn display_width(input: &str) -> usize {
    input.graphemes(true).map(grapheme_width).sum()
}

/// Grapheme clusters of a string with their display widths.
pub fn graphemes_with_width(input: &str) -> impl Iterator<Item = (&str, usize)> {
    input.graphemes(true).map(|g| (g, grapheme_width(g)))
}

/// Truncate to at most `max` columns, never splitting a wide grapheme.
pub fn truncate_to_width(input: &str, max: usize) -> &str {
    let mut used = 0;
    let mut end = 0;
    for (grapheme, width) in graphemes_with_width(input) {
        if used + width > max {
            break;
        }
        used += width;
        end += grapheme.len();
    }
    &input[..end]
}
