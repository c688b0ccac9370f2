//! Position and range conversions between byte offsets and LSP coordinates.
//!
//! The LSP protocol expresses positions as 0-based `(line, UTF-16 code unit)`
//! pairs. The scanner and step parser in [`crate::analysis`] work over byte
//! offsets and byte columns, since regex matching is naturally byte-indexed.
//! This module bridges the two.

use lsp_types::{Position, Range};

/// Calculate UTF-16 code units for a character.
///
/// BMP characters (code points ≤ 0xFFFF) use 1 UTF-16 code unit.
/// Non-BMP characters (code points > 0xFFFF) use 2 UTF-16 code units (surrogate pair).
#[inline]
fn utf16_code_units(ch: char) -> u32 {
    if u32::from(ch) <= 0xFFFF { 1 } else { 2 }
}

/// Convert a byte column offset to UTF-16 code units for a single line.
///
/// Given a 0-based line number and a byte offset within that line, returns the
/// equivalent UTF-16 code unit column position.
///
/// # Examples
///
/// ```
/// use webspec_lsp::handlers::util::byte_col_to_utf16_col;
///
/// let source = "// 1. Let x be true.";
/// assert_eq!(byte_col_to_utf16_col(source, 0, 3), 3);
/// ```
#[must_use]
pub fn byte_col_to_utf16_col(source: &str, line_0: usize, byte_col: usize) -> u32 {
    let line_text = source.lines().nth(line_0).unwrap_or("");

    line_text
        .char_indices()
        .take_while(|(byte_pos, _)| *byte_pos < byte_col)
        .map(|(_, ch)| utf16_code_units(ch))
        .sum::<u32>()
}

/// The text of a single 0-based line of `source`, or `""` past the end of
/// file.
#[must_use]
pub fn line_text(source: &str, line_0: u32) -> &str {
    let line_usize = usize::try_from(line_0).unwrap_or(usize::MAX);
    source.lines().nth(line_usize).unwrap_or("")
}

/// Convert a UTF-16 code-unit column within `line_text` to its byte column.
///
/// Inverse of [`byte_col_to_utf16_col`], scoped to a single already-extracted
/// line rather than the whole document.
#[must_use]
pub fn utf16_col_to_byte_col(line_text: &str, utf16_col: u32) -> u32 {
    let mut utf16_count = 0u32;
    for (byte_pos, ch) in line_text.char_indices() {
        if utf16_count >= utf16_col {
            return u32::try_from(byte_pos).unwrap_or(u32::MAX);
        }
        utf16_count += utf16_code_units(ch);
    }
    u32::try_from(line_text.len()).unwrap_or(u32::MAX)
}

/// Render a hierarchical step number as a dotted label, e.g. `[5, 1]` -> `"5.1"`.
#[must_use]
pub fn step_label(number: &[u32]) -> String {
    number
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// Build an LSP [`Range`] spanning `(start_line, start_col)` to
/// `(end_line, end_col)`, where both are byte columns within their
/// respective lines and `end_line` may differ from `start_line` for a
/// multi-line step comment.
#[must_use]
pub fn span_to_lsp_range(
    source: &str,
    start_line: u32,
    start_col: u32,
    end_line: u32,
    end_col: u32,
) -> Range {
    let start_line_usize = usize::try_from(start_line).unwrap_or(usize::MAX);
    let end_line_usize = usize::try_from(end_line).unwrap_or(usize::MAX);
    let start_char = byte_col_to_utf16_col(source, start_line_usize, start_col as usize);
    let end_char = byte_col_to_utf16_col(source, end_line_usize, end_col as usize);
    Range {
        start: Position::new(start_line, start_char),
        end: Position::new(end_line, end_char),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_col_to_utf16_col_handles_non_ascii() {
        let source = "// café done";
        assert_eq!(byte_col_to_utf16_col(source, 0, 3), 3);
        assert_eq!(byte_col_to_utf16_col(source, 0, 9), 8);
    }

    #[test]
    fn span_to_lsp_range_crosses_lines() {
        let source = "// Step 1. first\n// continues\n";
        let range = span_to_lsp_range(source, 0, 3, 1, 12);
        assert_eq!(range.start, Position::new(0, 3));
        assert_eq!(range.end, Position::new(1, 12));
    }

    #[test]
    fn line_text_returns_requested_line() {
        let source = "abc\ndef\n";
        assert_eq!(line_text(source, 0), "abc");
        assert_eq!(line_text(source, 1), "def");
        assert_eq!(line_text(source, 5), "");
    }

    #[test]
    fn utf16_col_to_byte_col_is_inverse_of_byte_col_to_utf16_col() {
        let line = "// café done";
        for byte_col in [0usize, 3, 6, 7, line.len()] {
            let utf16 = byte_col_to_utf16_col(line, 0, byte_col);
            let back = utf16_col_to_byte_col(line, utf16);
            assert_eq!(back as usize, byte_col, "roundtrip failed for {byte_col}");
        }
    }

    #[test]
    fn step_label_joins_hierarchical_number() {
        assert_eq!(step_label(&[5]), "5");
        assert_eq!(step_label(&[5, 1]), "5.1");
        assert_eq!(step_label(&[5, 1, 2]), "5.1.2");
    }
}
