//! Splits one raw source line into (label, mnemonic/directive, operand
//! text, comment). Comments are stripped before anything else;
//! everything downstream only ever sees already-stripped, already-trimmed
//! text.

use once_cell::sync::Lazy;
use regex::Regex;

static LABEL_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\S+):\s*(.*)$").unwrap());
static VALID_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());
static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\.?[A-Za-z_][A-Za-z0-9_]*)\s*(.*)$").unwrap());
/// The colon-less `NAME EQU expr` shape: a label is required,
/// but it need not be colon-terminated when followed directly by `EQU`.
static EQU_NO_COLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(\S+)\s+equ\b\s*(.*)$").unwrap());

/// One line after comment-stripping, label extraction and mnemonic
/// splitting, but with its operand expression(s) still unparsed text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLine {
    pub line_number: usize,
    pub label: Option<String>,
    /// Set when a label was recorded despite not matching
    /// `[A-Za-z_][A-Za-z0-9_]*`, the line parser still records it, but the
    /// caller should surface this as a warning.
    pub label_warning: Option<String>,
    /// `None` for a line with no mnemonic/directive (kind `Empty`, possibly
    /// still carrying a label).
    pub mnemonic: Option<String>,
    pub operand_text: String,
}

/// Strip a `;`-introduced comment, which runs to end of line.
fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Parse one physical source line.
pub fn parse_line(line_number: usize, raw_text: &str) -> RawLine {
    let stripped = strip_comment(raw_text).trim();

    if stripped.is_empty() {
        return RawLine { line_number, label: None, label_warning: None, mnemonic: None, operand_text: String::new() };
    }

    let (label, label_warning, rest) = match LABEL_TOKEN.captures(stripped) {
        Some(caps) => {
            let candidate = caps.get(1).unwrap().as_str().to_string();
            let warning = if VALID_LABEL.is_match(&candidate) {
                None
            } else {
                Some(format!(
                    "label \"{}\" does not match [A-Za-z_][A-Za-z0-9_]*; recording it anyway",
                    candidate
                ))
            };
            (Some(candidate), warning, caps.get(2).unwrap().as_str())
        }
        None => (None, None, stripped),
    };

    let rest = rest.trim();
    if rest.is_empty() {
        return RawLine { line_number, label, label_warning, mnemonic: None, operand_text: String::new() };
    }

    if label.is_none() {
        if let Some(caps) = EQU_NO_COLON.captures(rest) {
            let candidate = caps.get(1).unwrap().as_str().to_string();
            let label_warning = if VALID_LABEL.is_match(&candidate) {
                None
            } else {
                Some(format!(
                    "label \"{}\" does not match [A-Za-z_][A-Za-z0-9_]*; recording it anyway",
                    candidate
                ))
            };
            return RawLine {
                line_number,
                label: Some(candidate),
                label_warning,
                mnemonic: Some("EQU".to_string()),
                operand_text: caps.get(2).unwrap().as_str().trim().to_string(),
            };
        }
    }

    match TOKEN.captures(rest) {
        Some(caps) => {
            let mnemonic = caps.get(1).unwrap().as_str().to_uppercase();
            let operand_text = caps.get(2).unwrap().as_str().trim().to_string();
            RawLine { line_number, label, label_warning, mnemonic: Some(mnemonic), operand_text }
        }
        None => {
            // Not a well-formed token at all (e.g. stray punctuation); treat
            // the whole remainder as an unrecognized mnemonic so the
            // assembler reports a syntactic error instead of silently
            // dropping the line.
            RawLine { line_number, label, label_warning, mnemonic: Some(rest.to_string()), operand_text: String::new() }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_line_after_comment_strip() {
        let line = parse_line(1, "   ; just a comment");
        assert_eq!(line.label, None);
        assert_eq!(line.mnemonic, None);
    }

    #[test]
    fn label_and_instruction_on_one_line() {
        let line = parse_line(2, "START: LDA #$42 ; load");
        assert_eq!(line.label.as_deref(), Some("START"));
        assert_eq!(line.mnemonic.as_deref(), Some("LDA"));
        assert_eq!(line.operand_text, "#$42");
    }

    #[test]
    fn label_only_line() {
        let line = parse_line(3, "loop:");
        assert_eq!(line.label.as_deref(), Some("loop"));
        assert_eq!(line.mnemonic, None);
    }

    #[test]
    fn directive_token_may_start_with_dot() {
        let line = parse_line(4, "  .ORG $8000");
        assert_eq!(line.mnemonic.as_deref(), Some(".ORG"));
        assert_eq!(line.operand_text, "$8000");
    }

    #[test]
    fn mnemonic_is_case_insensitive_canonicalized_uppercase() {
        let line = parse_line(5, "lda #$10");
        assert_eq!(line.mnemonic.as_deref(), Some("LDA"));
    }

    #[test]
    fn malformed_label_warns_but_is_kept() {
        let line = parse_line(6, "1bad: NOP");
        assert_eq!(line.label.as_deref(), Some("1bad"));
        assert!(line.label_warning.is_some());
    }

    #[test]
    fn equ_directive_shape_without_colon() {
        let line = parse_line(7, "SIZE EQU $10");
        assert_eq!(line.label.as_deref(), Some("SIZE"));
        assert_eq!(line.mnemonic.as_deref(), Some("EQU"));
        assert_eq!(line.operand_text, "$10");
    }

    #[test]
    fn labelless_equ_has_no_label() {
        let line = parse_line(8, "EQU $10");
        assert_eq!(line.label, None);
        assert_eq!(line.mnemonic.as_deref(), Some("EQU"));
    }
}
