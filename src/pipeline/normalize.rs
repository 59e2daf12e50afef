//! Text preparation: deterministic cleanup of the PDF-to-text output before
//! the line scan.
//!
//! PDF text layers carry artefacts that break substring checks without being
//! visible: Windows line endings, zero-width spaces between a code and its
//! title, soft hyphens inside long course names. Each rule below is a pure
//! `&str → String` pass and is independently testable.

use once_cell::sync::Lazy;
use regex::Regex;

/// Prepare raw transcript text for the line scan.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, etc.)
/// 3. Replace non-breaking spaces with plain spaces
pub fn prepare_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    replace_nbsp(&s)
}

/// Split prepared text into raw (untrimmed) lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}

/// Collapse every whitespace run to one space and trim.
pub fn collapse_whitespace(input: &str) -> String {
    RE_WHITESPACE.replace_all(input.trim(), " ").into_owned()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ──────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Non-breaking spaces ──────────────────────────────────────────────

fn replace_nbsp(input: &str) -> String {
    input.replace(['\u{00A0}', '\u{202F}'], " ")
}

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_remove_invisible() {
        let input = "INE002\u{200B} - PROGRA\u{00AD}MACIÓN\u{FEFF}";
        assert_eq!(remove_invisible_chars(input), "INE002 - PROGRAMACIÓN");
    }

    #[test]
    fn test_prepare_text() {
        let input = "PERIODO ACADÉMICO\u{00A0}2023-1\r\nINE002 - X";
        let out = prepare_text(input);
        assert_eq!(split_lines(&out), vec!["PERIODO ACADÉMICO 2023-1", "INE002 - X"]);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Créditos \n\t aprobados:  180 "), "Créditos aprobados: 180");
    }
}
