//! The declarative CPU profile: opcode table, addressing modes, directives
//! and validation rules, loaded once per run and immutable thereafter.
//!
//! Retargeting the assembler to another CPU means loading a different
//! profile document; nothing here subclasses or branches on CPU identity.

pub mod rules;
mod schema;

use regex::Regex;
use rules::ValidationRule;
use schema::{ProfileDocument, RawDirective};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Byte order used when encoding multi-byte operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

#[derive(Debug, Clone)]
pub struct CpuInfo {
    pub name: String,
    pub data_width_bits: u8,
    pub address_width_bits: u8,
    pub endianness: Endianness,
    pub fill_byte: u8,
}

/// One entry of the ordered `addressing_mode_patterns` list: first
/// regex to match the operand text wins.
pub struct AddressingPattern {
    pub regex: Regex,
    pub mode: String,
    pub group: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct OpcodeDescriptor {
    pub bytes: Vec<u8>,
    pub operand_size: u8,
    pub cycles: Option<u32>,
    pub flags_affected: Option<String>,
}

/// A directive's typed action kind plus its parameters (e.g. the unit size
/// of a data directive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Org,
    Equ,
    Byte { unit_size: u8 },
    Word { unit_size: u8 },
    Text,
    Fill,
    Space,
    End,
}

/// A fully validated, compiled CPU profile.
pub struct CpuProfile {
    pub cpu_info: CpuInfo,
    pub addressing_modes: HashMap<String, u32>,
    /// The addressing mode name used when an instruction has no operand.
    pub implied_mode: String,
    pub patterns: Vec<AddressingPattern>,
    pub opcodes: HashMap<String, HashMap<String, OpcodeDescriptor>>,
    pub branch_mnemonics: HashSet<String>,
    pub directives: HashMap<String, DirectiveKind>,
    pub validation_rules: Vec<ValidationRule>,
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("no profile named \"{name}\" found in {dir} (tried .yaml, .yml, .json)")]
    NotFound { name: String, dir: String },
    #[error("failed to read profile: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse profile: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid profile: {0}")]
    Schema(String),
}

impl CpuProfile {
    /// Resolve `--cpu <name>` against a profiles directory: tries
    /// `<dir>/<name>.yaml`, then `.yml`, then `.json`, in that order.
    pub fn load_from_dir(dir: &Path, name: &str) -> Result<CpuProfile, ProfileError> {
        for ext in ["yaml", "yml", "json"] {
            let path = dir.join(format!("{name}.{ext}"));
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }
        Err(ProfileError::NotFound { name: name.to_string(), dir: dir.display().to_string() })
    }

    /// Load and validate a profile document from a single file. JSON
    /// documents are accepted through the same YAML parser, since JSON is a
    /// valid subset of YAML 1.2.
    pub fn load_from_path(path: &Path) -> Result<CpuProfile, ProfileError> {
        let text = fs::read_to_string(path)?;
        Self::from_str(&text)
    }

    /// Parse and validate a profile document already read into memory.
    pub fn from_str(text: &str) -> Result<CpuProfile, ProfileError> {
        let doc: ProfileDocument = serde_yaml::from_str(text)?;
        Self::from_document(doc)
    }

    fn from_document(doc: ProfileDocument) -> Result<CpuProfile, ProfileError> {
        let endianness = match doc.cpu_info.endianness.to_lowercase().as_str() {
            "little" => Endianness::Little,
            "big" => Endianness::Big,
            other => {
                return Err(ProfileError::Schema(format!(
                    "cpu_info.endianness must be \"little\" or \"big\", got \"{other}\""
                )))
            }
        };
        let cpu_info = CpuInfo {
            name: doc.cpu_info.name,
            data_width_bits: doc.cpu_info.data_width_bits,
            address_width_bits: doc.cpu_info.address_width_bits,
            endianness,
            fill_byte: doc.cpu_info.fill_byte,
        };

        let implied_mode = doc
            .addressing_modes
            .keys()
            .find(|mode| {
                let upper = mode.to_uppercase();
                upper == "IMPLIED" || upper == "INHERENT"
            })
            .cloned()
            .ok_or_else(|| {
                ProfileError::Schema("addressing_modes must declare an IMPLIED or INHERENT mode".into())
            })?;

        let mut patterns = Vec::with_capacity(doc.addressing_mode_patterns.len());
        for raw in doc.addressing_mode_patterns {
            if !doc.addressing_modes.contains_key(&raw.mode) {
                return Err(ProfileError::Schema(format!(
                    "addressing_mode_patterns references undeclared mode \"{}\"",
                    raw.mode
                )));
            }
            let regex = Regex::new(&raw.regex)
                .map_err(|e| ProfileError::Schema(format!("bad regex \"{}\": {e}", raw.regex)))?;
            patterns.push(AddressingPattern { regex, mode: raw.mode, group: raw.group });
        }

        let mut opcodes: HashMap<String, HashMap<String, OpcodeDescriptor>> = HashMap::new();
        for (mnemonic, modes) in doc.opcodes {
            let mut by_mode = HashMap::with_capacity(modes.len());
            for (mode, raw) in modes {
                if !doc.addressing_modes.contains_key(&mode) {
                    return Err(ProfileError::Schema(format!(
                        "opcode \"{mnemonic}\" references undeclared mode \"{mode}\""
                    )));
                }
                if raw.bytes.is_empty() {
                    return Err(ProfileError::Schema(format!(
                        "opcode \"{mnemonic}\" mode \"{mode}\" has empty opcode bytes"
                    )));
                }
                if raw.operand_size > 2 {
                    return Err(ProfileError::Schema(format!(
                        "opcode \"{mnemonic}\" mode \"{mode}\" has operand_size > 2"
                    )));
                }
                by_mode.insert(
                    mode,
                    OpcodeDescriptor {
                        bytes: raw.bytes,
                        operand_size: raw.operand_size,
                        cycles: raw.cycles,
                        flags_affected: raw.flags_affected,
                    },
                );
            }
            opcodes.insert(mnemonic.to_uppercase(), by_mode);
        }

        let branch_mnemonics: HashSet<String> = doc.branch_mnemonics.iter().map(|m| m.to_uppercase()).collect();
        for mnemonic in &branch_mnemonics {
            let has_one_byte_mode = opcodes
                .get(mnemonic)
                .map(|modes| modes.values().any(|d| d.operand_size == 1))
                .unwrap_or(false);
            if !has_one_byte_mode {
                return Err(ProfileError::Schema(format!(
                    "branch mnemonic \"{mnemonic}\" has no opcode entry with a 1-byte operand"
                )));
            }
        }

        let mut directives = HashMap::with_capacity(doc.directives.len());
        for (name, raw) in doc.directives {
            let kind = match raw {
                RawDirective::Org => DirectiveKind::Org,
                RawDirective::Equ => DirectiveKind::Equ,
                RawDirective::Byte { unit_size } => DirectiveKind::Byte { unit_size },
                RawDirective::Word { unit_size } => DirectiveKind::Word { unit_size },
                RawDirective::Text => DirectiveKind::Text,
                RawDirective::Fill => DirectiveKind::Fill,
                RawDirective::Space => DirectiveKind::Space,
                RawDirective::End => DirectiveKind::End,
            };
            directives.insert(name.to_uppercase(), kind);
        }

        let mut validation_rules = Vec::with_capacity(doc.validation_rules.len());
        for raw in doc.validation_rules {
            validation_rules.push(rules::normalize(raw)?);
        }

        Ok(CpuProfile {
            cpu_info,
            addressing_modes: doc.addressing_modes,
            implied_mode,
            patterns,
            opcodes,
            branch_mnemonics,
            directives,
            validation_rules,
        })
    }

    /// Look up the opcode descriptor for `mnemonic` in `mode`, uppercasing
    /// the mnemonic first since mnemonics are canonicalized that way
    /// throughout the engine.
    pub fn opcode(&self, mnemonic: &str, mode: &str) -> Option<&OpcodeDescriptor> {
        self.opcodes.get(mnemonic).and_then(|modes| modes.get(mode))
    }

    pub fn is_branch(&self, mnemonic: &str) -> bool {
        self.branch_mnemonics.contains(mnemonic)
    }

    pub fn directive(&self, name: &str) -> Option<&DirectiveKind> {
        self.directives.get(name)
    }
}
