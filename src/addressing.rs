//! Addressing-mode recognizer: matches operand text against the
//! active CPU's ordered pattern list. First match wins, so profiles must
//! list more specific patterns (e.g. `($nn,X)`) before more general ones
//! (e.g. `$nn`).

use crate::profile::CpuProfile;

#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedOperand {
    pub mode: String,
    /// The operand text to hand to the expression parser. `None` only for
    /// the implied/inherent mode.
    pub expr_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoModeMatched {
    pub operand_text: String,
}

/// Strip the syntactic markers (`#`, parens, `,X`/`,Y` suffixes) a pattern
/// without a capture group relies on to still hand a bare expression to the
/// parser.
fn strip_markers(text: &str) -> String {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix('#') {
        s = rest.trim();
    }
    if let Some(rest) = s.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        s = rest.trim();
    }
    for suffix in [",X", ",x", ", X", ", x", ",Y", ",y", ", Y", ", y"] {
        if let Some(rest) = s.strip_suffix(suffix) {
            s = rest.trim();
            break;
        }
    }
    s.to_string()
}

/// Recognize the addressing mode of `operand_text` against `profile`.
pub fn recognize(operand_text: &str, profile: &CpuProfile) -> Result<RecognizedOperand, NoModeMatched> {
    let trimmed = operand_text.trim();
    if trimmed.is_empty() {
        return Ok(RecognizedOperand { mode: profile.implied_mode.clone(), expr_text: None });
    }

    for pattern in &profile.patterns {
        if let Some(captures) = pattern.regex.captures(trimmed) {
            let expr_text = match pattern.group {
                Some(group) => captures.get(group).map(|m| m.as_str().to_string()).unwrap_or_default(),
                None => strip_markers(trimmed),
            };
            return Ok(RecognizedOperand { mode: pattern.mode.clone(), expr_text: Some(expr_text) });
        }
    }

    Err(NoModeMatched { operand_text: trimmed.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::CpuProfile;

    fn test_profile() -> CpuProfile {
        CpuProfile::from_str(
            r#"
cpu_info:
  name: test
  data_width_bits: 8
  address_width_bits: 16
  endianness: little
  fill_byte: 0xFF
addressing_modes:
  implied: 0
  immediate: 1
  indirect_x: 2
  absolute: 3
addressing_mode_patterns:
  - regex: '^#(.+)$'
    mode: immediate
    group: 1
  - regex: '^\((.+),\s*[Xx]\)$'
    mode: indirect_x
    group: 1
  - regex: '^.+$'
    mode: absolute
opcodes:
  LDA:
    immediate: { bytes: [0xA9], operand_size: 1 }
    indirect_x: { bytes: [0xA1], operand_size: 1 }
    absolute: { bytes: [0xAD], operand_size: 2 }
"#,
        )
        .unwrap()
    }

    #[test]
    fn empty_operand_is_implied() {
        let profile = test_profile();
        let recognized = recognize("", &profile).unwrap();
        assert_eq!(recognized.mode, "implied");
        assert_eq!(recognized.expr_text, None);
    }

    #[test]
    fn immediate_uses_capture_group() {
        let profile = test_profile();
        let recognized = recognize("#$42", &profile).unwrap();
        assert_eq!(recognized.mode, "immediate");
        assert_eq!(recognized.expr_text.as_deref(), Some("$42"));
    }

    #[test]
    fn more_specific_pattern_wins_over_general() {
        let profile = test_profile();
        let recognized = recognize("($20,X)", &profile).unwrap();
        assert_eq!(recognized.mode, "indirect_x");
        assert_eq!(recognized.expr_text.as_deref(), Some("$20"));
    }

    #[test]
    fn falls_through_to_absolute() {
        let profile = test_profile();
        let recognized = recognize("TARGET", &profile).unwrap();
        assert_eq!(recognized.mode, "absolute");
        assert_eq!(recognized.expr_text.as_deref(), Some("TARGET"));
    }
}
