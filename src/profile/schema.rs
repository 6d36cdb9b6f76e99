//! Wire format for a CPU profile document.
//!
//! These types mirror the YAML shape field-for-field; [`super::CpuProfile`]
//! is the validated, compiled form the rest of the engine actually uses.

use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct ProfileDocument {
    pub cpu_info: RawCpuInfo,
    pub addressing_modes: HashMap<String, u32>,
    pub addressing_mode_patterns: Vec<RawPattern>,
    pub opcodes: HashMap<String, HashMap<String, RawOpcode>>,
    #[serde(default)]
    pub branch_mnemonics: Vec<String>,
    #[serde(default)]
    pub directives: HashMap<String, RawDirective>,
    #[serde(default)]
    pub validation_rules: Vec<RawValidationRule>,
}

#[derive(Debug, Deserialize)]
pub struct RawCpuInfo {
    pub name: String,
    pub data_width_bits: u8,
    pub address_width_bits: u8,
    pub endianness: String,
    pub fill_byte: u8,
}

#[derive(Debug, Deserialize)]
pub struct RawPattern {
    pub regex: String,
    pub mode: String,
    #[serde(default)]
    pub group: Option<usize>,
    #[serde(default)]
    pub flags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawOpcode {
    pub bytes: Vec<u8>,
    pub operand_size: u8,
    #[serde(default)]
    pub cycles: Option<u32>,
    #[serde(default)]
    pub flags_affected: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawDirective {
    Org,
    Equ,
    Byte {
        #[serde(default = "one")]
        unit_size: u8,
    },
    Word {
        #[serde(default = "two")]
        unit_size: u8,
    },
    Text,
    Fill,
    Space,
    End,
}

fn one() -> u8 {
    1
}

fn two() -> u8 {
    2
}

/// A validation-rule record. `Legacy` is the old mnemonic-set/allowed-modes
/// shape; everything else is the generic rule form. The loader
/// rewrites `Legacy` into the generic form (see [`super::rules`]).
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawValidationRule {
    ErrorIfModeIs {
        mnemonics: Vec<String>,
        modes: Vec<String>,
        message: String,
    },
    ErrorIfModeIsNot {
        mnemonics: Vec<String>,
        modes: Vec<String>,
        message: String,
    },
    WarningIfModeIs {
        mnemonics: Vec<String>,
        modes: Vec<String>,
        message: String,
    },
    WarningIfModeIsNot {
        mnemonics: Vec<String>,
        modes: Vec<String>,
        message: String,
    },
    ErrorIfOperandOutOfRange {
        min: i64,
        max: i64,
        message: String,
        #[serde(default)]
        exceptions: Vec<String>,
    },
    WarningIfOperandOutOfRange {
        min: i64,
        max: i64,
        message: String,
        #[serde(default)]
        exceptions: Vec<String>,
    },
    ErrorIfRegisterUsed {
        mnemonics: Vec<String>,
        registers: Vec<String>,
        message: String,
    },
    WarningIfRegisterUsed {
        mnemonics: Vec<String>,
        registers: Vec<String>,
        message: String,
    },
    /// `{mnemonics: [...], allowed_modes: [...]}` or `{..., disallowed_modes: [...]}`,
    /// with an optional `severity: error|warning` (defaults to error).
    Legacy {
        mnemonics: Vec<String>,
        #[serde(default)]
        allowed_modes: Option<Vec<String>>,
        #[serde(default)]
        disallowed_modes: Option<Vec<String>>,
        #[serde(default)]
        severity: Option<String>,
        message: String,
    },
}
