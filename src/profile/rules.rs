//! The generic validation-rule form and legacy-rule normalization.

use super::schema::RawValidationRule;
use super::ProfileError;
use std::collections::HashSet;

/// One normalized validation rule. Every `RawValidationRule`, legacy or
/// generic, is rewritten into one of these at profile-load time so the
/// two-pass assembler only ever evaluates this shape.
#[derive(Debug, Clone)]
pub enum ValidationRule {
    ModeIs {
        error: bool,
        mnemonics: HashSet<String>,
        modes: HashSet<String>,
        message: String,
    },
    ModeIsNot {
        error: bool,
        mnemonics: HashSet<String>,
        modes: HashSet<String>,
        message: String,
    },
    OperandOutOfRange {
        error: bool,
        min: i64,
        max: i64,
        message: String,
        exceptions: HashSet<String>,
    },
    RegisterUsed {
        error: bool,
        mnemonics: HashSet<String>,
        registers: HashSet<String>,
        message: String,
    },
}

impl ValidationRule {
    /// Whether this rule applies, as an error, to `mnemonic`. Used to
    /// interpolate `{mnemonic}` / `{mode}` / `{value}` message templates at
    /// the call site in the assembler.
    pub fn is_error(&self) -> bool {
        match self {
            ValidationRule::ModeIs { error, .. }
            | ValidationRule::ModeIsNot { error, .. }
            | ValidationRule::OperandOutOfRange { error, .. }
            | ValidationRule::RegisterUsed { error, .. } => *error,
        }
    }
}

fn set(items: Vec<String>) -> HashSet<String> {
    items.into_iter().collect()
}

/// Rewrite one raw rule document into its normalized form. Never fails:
/// an unresolvable field would have already failed `serde` deserialization.
pub fn normalize(raw: RawValidationRule) -> Result<ValidationRule, ProfileError> {
    Ok(match raw {
        RawValidationRule::ErrorIfModeIs { mnemonics, modes, message } => ValidationRule::ModeIs {
            error: true,
            mnemonics: set(mnemonics),
            modes: set(modes),
            message,
        },
        RawValidationRule::WarningIfModeIs { mnemonics, modes, message } => ValidationRule::ModeIs {
            error: false,
            mnemonics: set(mnemonics),
            modes: set(modes),
            message,
        },
        RawValidationRule::ErrorIfModeIsNot { mnemonics, modes, message } => ValidationRule::ModeIsNot {
            error: true,
            mnemonics: set(mnemonics),
            modes: set(modes),
            message,
        },
        RawValidationRule::WarningIfModeIsNot { mnemonics, modes, message } => ValidationRule::ModeIsNot {
            error: false,
            mnemonics: set(mnemonics),
            modes: set(modes),
            message,
        },
        RawValidationRule::ErrorIfOperandOutOfRange { min, max, message, exceptions } => {
            ValidationRule::OperandOutOfRange { error: true, min, max, message, exceptions: set(exceptions) }
        }
        RawValidationRule::WarningIfOperandOutOfRange { min, max, message, exceptions } => {
            ValidationRule::OperandOutOfRange { error: false, min, max, message, exceptions: set(exceptions) }
        }
        RawValidationRule::ErrorIfRegisterUsed { mnemonics, registers, message } => ValidationRule::RegisterUsed {
            error: true,
            mnemonics: set(mnemonics),
            registers: set(registers),
            message,
        },
        RawValidationRule::WarningIfRegisterUsed { mnemonics, registers, message } => ValidationRule::RegisterUsed {
            error: false,
            mnemonics: set(mnemonics),
            registers: set(registers),
            message,
        },
        RawValidationRule::Legacy { mnemonics, allowed_modes, disallowed_modes, severity, message } => {
            let error = match severity.as_deref() {
                Some("warning") => false,
                Some("error") | None => true,
                Some(other) => {
                    return Err(ProfileError::Schema(format!(
                        "legacy validation rule has unknown severity \"{}\"",
                        other
                    )))
                }
            };
            match (allowed_modes, disallowed_modes) {
                (Some(allowed), None) => ValidationRule::ModeIsNot {
                    error,
                    mnemonics: set(mnemonics),
                    modes: set(allowed),
                    message,
                },
                (None, Some(disallowed)) => ValidationRule::ModeIs {
                    error,
                    mnemonics: set(mnemonics),
                    modes: set(disallowed),
                    message,
                },
                _ => {
                    return Err(ProfileError::Schema(
                        "legacy validation rule must set exactly one of allowed_modes/disallowed_modes".into(),
                    ))
                }
            }
        }
    })
}

/// Expand `{mnemonic}`, `{mode}` and `{value}` placeholders in a rule
/// message template.
pub fn render_message(template: &str, mnemonic: &str, mode: &str, value: Option<i64>) -> String {
    let mut out = template.replace("{mnemonic}", mnemonic).replace("{mode}", mode);
    if let Some(value) = value {
        out = out.replace("{value}", &value.to_string());
    }
    out
}
