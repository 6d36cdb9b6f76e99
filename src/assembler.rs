//! The two-pass assembler: Pass 1 sizes every instruction, assigns
//! addresses and populates the symbol table; Pass 2 evaluates operands,
//! runs validation rules, and encodes machine bytes.

use crate::addressing::{self, RecognizedOperand};
use crate::diagnostics::Diagnostics;
use crate::expr;
use crate::instruction::{Instruction, InstructionKind, Operand, Program};
use crate::line_parser::{parse_line, RawLine};
use crate::profile::rules::{self, ValidationRule};
use crate::profile::{CpuProfile, DirectiveKind, Endianness};
use crate::symtab::{SymbolKind, SymbolTable};
use thiserror::Error;

/// Errors that can stop a run before assembly even starts: loading the CPU
/// profile or reading the source file. Everything that happens *during*
/// the two passes (lexical/syntactic/semantic/range/rule failures) never
/// propagates as a Rust-level `Err`, it accumulates in [`Diagnostics`]
/// instead, so one run surfaces as many problems as possible.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Profile(#[from] crate::profile::ProfileError),
    #[error("failed to read source file: {0}")]
    Io(#[from] std::io::Error),
}

/// The result of one `assemble()` call: the addressed, (partially) encoded
/// program plus the symbol table Pass 1 built. Whether the run succeeded is
/// read off the `Diagnostics` sink passed in, not from this struct.
pub struct AssembleOutcome {
    pub program: Program,
    pub symbol_table: SymbolTable,
}

/// Assemble `source` against `profile`. `start_address` overrides the
/// initial origin (`--start-address`); `.ORG` can still move it mid-source.
/// Diagnostics accumulate into `diagnostics`; check `diagnostics.had_errors()`
/// after the call to determine success.
pub fn assemble(
    source: &str,
    profile: &CpuProfile,
    start_address: Option<u32>,
    diagnostics: &mut Diagnostics,
) -> AssembleOutcome {
    let (instructions, symbol_table) = pass1(source, profile, start_address, diagnostics);
    let mut instructions = instructions;
    pass2(&mut instructions, profile, &symbol_table, diagnostics);
    AssembleOutcome { program: Program { instructions, fill_byte: profile.cpu_info.fill_byte }, symbol_table }
}

// ---------------------------------------------------------------------
// Pass 1: sizing and symbol definition
// ---------------------------------------------------------------------

fn pass1(
    source: &str,
    profile: &CpuProfile,
    start_address: Option<u32>,
    diagnostics: &mut Diagnostics,
) -> (Vec<Instruction>, SymbolTable) {
    let mut symbol_table = SymbolTable::new();
    let mut current_address: u32 = start_address.unwrap_or(0);
    let mut instructions = Vec::new();

    for (index, raw_text) in source.lines().enumerate() {
        let line_number = index + 1;
        let raw = parse_line(line_number, raw_text);

        if let Some(warning) = &raw.label_warning {
            diagnostics.warning(line_number, warning.clone());
        }

        let Some(mnemonic) = raw.mnemonic.clone() else {
            if let Some(label) = &raw.label {
                define_label(&mut symbol_table, label, current_address, line_number, diagnostics);
            }
            instructions.push(Instruction::empty(line_number, raw.label.clone()));
            continue;
        };

        if mnemonic == "EQU" {
            pass1_equ(&raw, &mut symbol_table, &mut instructions, current_address, diagnostics);
            continue;
        }

        if let Some(label) = &raw.label {
            define_label(&mut symbol_table, label, current_address, line_number, diagnostics);
        }

        if let Some(directive) = profile.directive(&mnemonic).copied() {
            let stop = pass1_directive(
                &raw,
                &mnemonic,
                directive,
                profile,
                &symbol_table,
                &mut current_address,
                &mut instructions,
                diagnostics,
            );
            if stop {
                break;
            }
            continue;
        }

        pass1_instruction(&raw, &mnemonic, profile, &mut current_address, &mut instructions, diagnostics);
    }

    (instructions, symbol_table)
}

fn define_label(
    symbol_table: &mut SymbolTable,
    label: &str,
    address: u32,
    line_number: usize,
    diagnostics: &mut Diagnostics,
) {
    if let Err(dup) = symbol_table.define(label, address as i64, SymbolKind::Label, line_number) {
        diagnostics.error(
            line_number,
            format!("duplicate label \"{}\" (first defined on line {})", label, dup.first_defined_at_line),
        );
    }
}

fn directive_instruction(raw: &RawLine, name: &str, address: u32, operand: Operand, size: u32) -> Instruction {
    Instruction {
        line_number: raw.line_number,
        label: raw.label.clone(),
        kind: InstructionKind::Directive,
        name: Some(name.to_string()),
        operand_text: raw.operand_text.clone(),
        operand,
        mode: None,
        address,
        size,
        bytes: Vec::new(),
    }
}

fn pass1_equ(
    raw: &RawLine,
    symbol_table: &mut SymbolTable,
    instructions: &mut Vec<Instruction>,
    current_address: u32,
    diagnostics: &mut Diagnostics,
) {
    let Some(label) = &raw.label else {
        diagnostics.error(raw.line_number, "EQU requires a label (shape: NAME EQU expr)".to_string());
        instructions.push(directive_instruction(raw, "EQU", current_address, Operand::None, 0));
        return;
    };

    match expr::parse(&raw.operand_text) {
        Ok((tree, lexical_errors)) => {
            for message in lexical_errors {
                diagnostics.error(raw.line_number, message);
            }
            match expr::eval(&tree, symbol_table) {
                Ok(value) => {
                    if let Err(dup) = symbol_table.define(label, value, SymbolKind::Equate, raw.line_number) {
                        diagnostics.error(
                            raw.line_number,
                            format!(
                                "duplicate symbol \"{}\" (first defined on line {})",
                                label, dup.first_defined_at_line
                            ),
                        );
                    }
                    instructions.push(directive_instruction(raw, "EQU", current_address, Operand::Single(tree), 0));
                }
                Err(e) => {
                    symbol_table.note_forward_reference(label, raw.line_number);
                    diagnostics.error(raw.line_number, e.to_string());
                    instructions.push(directive_instruction(raw, "EQU", current_address, Operand::None, 0));
                }
            }
        }
        Err(e) => {
            diagnostics.error(raw.line_number, e.to_string());
            instructions.push(directive_instruction(raw, "EQU", current_address, Operand::None, 0));
        }
    }
}

/// Evaluate an expression that must resolve immediately (`.ORG`, `.FILL`
/// count, `.SPACE` count); forward references are not allowed here.
fn eval_immediate(text: &str, symbol_table: &SymbolTable, line_number: usize, diagnostics: &mut Diagnostics) -> Option<i64> {
    match expr::parse(text) {
        Ok((tree, lexical_errors)) => {
            for message in lexical_errors {
                diagnostics.error(line_number, message);
            }
            match expr::eval(&tree, symbol_table) {
                Ok(value) => Some(value),
                Err(e) => {
                    diagnostics.error(line_number, e.to_string());
                    None
                }
            }
        }
        Err(e) => {
            diagnostics.error(line_number, e.to_string());
            None
        }
    }
}

fn parse_quoted_string(text: &str, line_number: usize, diagnostics: &mut Diagnostics) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.len() < 2 || !trimmed.starts_with('"') || !trimmed.ends_with('"') {
        diagnostics.error(line_number, format!("expected a quoted string, got \"{}\"", text));
        return None;
    }
    let inner = &trimmed[1..trimmed.len() - 1];
    let mut out = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => out.push(other),
                None => diagnostics.error(line_number, "unterminated escape in string literal".to_string()),
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Returns `true` if Pass 1 should stop processing further lines (`.END`).
#[allow(clippy::too_many_arguments)]
fn pass1_directive(
    raw: &RawLine,
    mnemonic: &str,
    directive: DirectiveKind,
    profile: &CpuProfile,
    symbol_table: &SymbolTable,
    current_address: &mut u32,
    instructions: &mut Vec<Instruction>,
    diagnostics: &mut Diagnostics,
) -> bool {
    match directive {
        DirectiveKind::Org => {
            if let Some(value) = eval_immediate(&raw.operand_text, symbol_table, raw.line_number, diagnostics) {
                *current_address = value as u32;
            }
            instructions.push(directive_instruction(raw, mnemonic, *current_address, Operand::None, 0));
        }
        DirectiveKind::Equ => unreachable!("EQU is handled by pass1_equ before directive dispatch"),
        DirectiveKind::Byte { unit_size } | DirectiveKind::Word { unit_size } => {
            match expr::parse_list(&raw.operand_text) {
                Ok((items, lexical_errors)) => {
                    for message in lexical_errors {
                        diagnostics.error(raw.line_number, message);
                    }
                    let size = items.len() as u32 * unit_size as u32;
                    let address = *current_address;
                    *current_address += size;
                    instructions.push(directive_instruction(raw, mnemonic, address, Operand::List(items), size));
                }
                Err(e) => {
                    diagnostics.error(raw.line_number, e.to_string());
                    instructions.push(directive_instruction(raw, mnemonic, *current_address, Operand::None, 0));
                }
            }
        }
        DirectiveKind::Text => {
            if let Some(text) = parse_quoted_string(&raw.operand_text, raw.line_number, diagnostics) {
                let bytes = text.into_bytes();
                let size = bytes.len() as u32;
                let address = *current_address;
                *current_address += size;
                instructions.push(directive_instruction(raw, mnemonic, address, Operand::Bytes(bytes), size));
            } else {
                instructions.push(directive_instruction(raw, mnemonic, *current_address, Operand::None, 0));
            }
        }
        DirectiveKind::Fill => {
            let (count, byte) = match expr::parse_list(&raw.operand_text) {
                Ok((items, lexical_errors)) if items.len() == 2 => {
                    for message in lexical_errors {
                        diagnostics.error(raw.line_number, message);
                    }
                    let count = expr::eval(&items[0], symbol_table).ok();
                    let byte = expr::eval(&items[1], symbol_table).ok();
                    (count, byte)
                }
                Ok(_) => {
                    diagnostics.error(raw.line_number, ".FILL expects exactly two arguments: count, byte".to_string());
                    (None, None)
                }
                Err(e) => {
                    diagnostics.error(raw.line_number, e.to_string());
                    (None, None)
                }
            };
            match (count, byte) {
                (Some(count), Some(byte)) if count >= 0 => {
                    let bytes = vec![byte as u8; count as usize];
                    let size = bytes.len() as u32;
                    let address = *current_address;
                    *current_address += size;
                    instructions.push(directive_instruction(raw, mnemonic, address, Operand::Bytes(bytes), size));
                }
                (Some(count), _) if count < 0 => {
                    diagnostics.error(raw.line_number, format!(".FILL count must be non-negative, got {}", count));
                    instructions.push(directive_instruction(raw, mnemonic, *current_address, Operand::None, 0));
                }
                _ => instructions.push(directive_instruction(raw, mnemonic, *current_address, Operand::None, 0)),
            }
        }
        DirectiveKind::Space => match eval_immediate(&raw.operand_text, symbol_table, raw.line_number, diagnostics) {
            Some(count) if count >= 0 => {
                let size = count as u32;
                let address = *current_address;
                *current_address += size;
                instructions.push(directive_instruction(raw, mnemonic, address, Operand::Bytes(vec![0u8; size as usize]), size));
            }
            Some(count) => {
                diagnostics.error(raw.line_number, format!(".SPACE count must be non-negative, got {}", count));
                instructions.push(directive_instruction(raw, mnemonic, *current_address, Operand::None, 0));
            }
            None => instructions.push(directive_instruction(raw, mnemonic, *current_address, Operand::None, 0)),
        },
        DirectiveKind::End => {
            instructions.push(directive_instruction(raw, mnemonic, *current_address, Operand::None, 0));
            return true;
        }
    }
    false
}

fn pass1_instruction(
    raw: &RawLine,
    mnemonic: &str,
    profile: &CpuProfile,
    current_address: &mut u32,
    instructions: &mut Vec<Instruction>,
    diagnostics: &mut Diagnostics,
) {
    let Some(modes_for_mnemonic) = profile.opcodes.get(mnemonic) else {
        diagnostics.error(raw.line_number, format!("unknown instruction \"{}\"", mnemonic));
        instructions.push(Instruction {
            line_number: raw.line_number,
            label: raw.label.clone(),
            kind: InstructionKind::Instruction,
            name: Some(mnemonic.to_string()),
            operand_text: raw.operand_text.clone(),
            operand: Operand::None,
            mode: None,
            address: *current_address,
            size: 0,
            bytes: Vec::new(),
        });
        return;
    };

    let recognized = match addressing::recognize(&raw.operand_text, profile) {
        Ok(r) => r,
        Err(no_match) => {
            diagnostics.error(
                raw.line_number,
                format!("unrecognized operand \"{}\" for CPU \"{}\"", no_match.operand_text, profile.cpu_info.name),
            );
            instructions.push(Instruction {
                line_number: raw.line_number,
                label: raw.label.clone(),
                kind: InstructionKind::Instruction,
                name: Some(mnemonic.to_string()),
                operand_text: raw.operand_text.clone(),
                operand: Operand::None,
                mode: None,
                address: *current_address,
                size: 0,
                bytes: Vec::new(),
            });
            return;
        }
    };

    let RecognizedOperand { mode, expr_text } = recognized;

    let Some(descriptor) = modes_for_mnemonic.get(&mode) else {
        diagnostics.error(
            raw.line_number,
            format!("instruction \"{}\" does not support addressing mode \"{}\"", mnemonic, mode),
        );
        instructions.push(Instruction {
            line_number: raw.line_number,
            label: raw.label.clone(),
            kind: InstructionKind::Instruction,
            name: Some(mnemonic.to_string()),
            operand_text: raw.operand_text.clone(),
            operand: Operand::None,
            mode: Some(mode),
            address: *current_address,
            size: 0,
            bytes: Vec::new(),
        });
        return;
    };

    let size = descriptor.bytes.len() as u32 + descriptor.operand_size as u32;
    let address = *current_address;
    *current_address += size;

    let operand = match expr_text.as_deref() {
        Some(text) if !text.trim().is_empty() => match expr::parse(text) {
            Ok((tree, lexical_errors)) => {
                for message in lexical_errors {
                    diagnostics.error(raw.line_number, message);
                }
                Operand::Single(tree)
            }
            Err(e) => {
                diagnostics.error(raw.line_number, e.to_string());
                Operand::None
            }
        },
        _ => Operand::None,
    };

    instructions.push(Instruction {
        line_number: raw.line_number,
        label: raw.label.clone(),
        kind: InstructionKind::Instruction,
        name: Some(mnemonic.to_string()),
        operand_text: raw.operand_text.clone(),
        operand,
        mode: Some(mode),
        address,
        size,
        bytes: Vec::new(),
    });
}

// ---------------------------------------------------------------------
// Pass 2: evaluation, validation, encoding
// ---------------------------------------------------------------------

fn pass2(instructions: &mut [Instruction], profile: &CpuProfile, symbol_table: &SymbolTable, diagnostics: &mut Diagnostics) {
    for instr in instructions.iter_mut() {
        if instr.size == 0 {
            instr.bytes.clear();
            continue;
        }
        match instr.kind {
            InstructionKind::Instruction => encode_instruction(instr, profile, symbol_table, diagnostics),
            InstructionKind::Directive => encode_directive(instr, profile, symbol_table, diagnostics),
            InstructionKind::Empty => {}
        }
    }
}

fn encode_value(value: u64, size: u8, endianness: Endianness) -> Vec<u8> {
    let mut bytes: Vec<u8> = (0..size).map(|i| ((value >> (8 * i)) & 0xFF) as u8).collect();
    if endianness == Endianness::Big {
        bytes.reverse();
    }
    bytes
}

fn encode_instruction(instr: &mut Instruction, profile: &CpuProfile, symbol_table: &SymbolTable, diagnostics: &mut Diagnostics) {
    let mnemonic = instr.name.clone().expect("instruction always has a mnemonic");
    let mode = instr.mode.clone().expect("mode resolved in pass 1");
    let Some(descriptor) = profile.opcode(&mnemonic, &mode) else { return };

    let value = match &instr.operand {
        Operand::None => None,
        Operand::Single(tree) => match expr::eval(tree, symbol_table) {
            Ok(value) => Some(value),
            Err(e) => {
                diagnostics.error(instr.line_number, e.to_string());
                return;
            }
        },
        Operand::List(_) | Operand::Bytes(_) => None,
    };

    if value.is_none() && descriptor.operand_size > 0 {
        diagnostics.error(
            instr.line_number,
            format!("missing operand for \"{}\" in mode \"{}\"", mnemonic, mode),
        );
        return;
    }

    let is_branch = profile.is_branch(&mnemonic);

    if let Some(value) = value {
        if is_branch {
            let displacement = value - (instr.address as i64 + instr.size as i64);
            if !(-128..=127).contains(&displacement) {
                diagnostics.error(instr.line_number, "branch out of range".to_string());
                run_validation_rules(profile, &mnemonic, &mode, Some(value), &instr.operand_text, instr.line_number, diagnostics);
                return;
            }
        } else {
            let max = 1i64 << (8 * descriptor.operand_size as u32);
            if value < 0 || value >= max {
                diagnostics.error(
                    instr.line_number,
                    format!("operand out of range: {} does not fit in {} byte(s)", value, descriptor.operand_size),
                );
                run_validation_rules(profile, &mnemonic, &mode, Some(value), &instr.operand_text, instr.line_number, diagnostics);
                return;
            }
        }
    }

    run_validation_rules(profile, &mnemonic, &mode, value, &instr.operand_text, instr.line_number, diagnostics);

    let mut bytes = descriptor.bytes.clone();
    if let Some(value) = value {
        if is_branch {
            let displacement = (value - (instr.address as i64 + instr.size as i64)) as i8;
            bytes.push(displacement as u8);
        } else {
            bytes.extend(encode_value(value as u64, descriptor.operand_size, profile.cpu_info.endianness));
        }
    }
    instr.bytes = bytes;
}

fn encode_directive(instr: &mut Instruction, profile: &CpuProfile, symbol_table: &SymbolTable, diagnostics: &mut Diagnostics) {
    match &instr.operand {
        Operand::Bytes(bytes) => instr.bytes = bytes.clone(),
        Operand::List(items) => {
            let name = instr.name.clone().expect("directive always has a name");
            let unit_size = match profile.directive(&name) {
                Some(DirectiveKind::Byte { unit_size }) | Some(DirectiveKind::Word { unit_size }) => *unit_size,
                _ => return,
            };
            let mut bytes = Vec::with_capacity(items.len() * unit_size as usize);
            let mut had_error = false;
            for item in items {
                match expr::eval(item, symbol_table) {
                    Ok(value) => {
                        let max = 1i64 << (8 * unit_size as u32);
                        if value < 0 || value >= max {
                            diagnostics.error(
                                instr.line_number,
                                format!("operand out of range: {} does not fit in {} byte(s)", value, unit_size),
                            );
                            had_error = true;
                        } else {
                            bytes.extend(encode_value(value as u64, unit_size, profile.cpu_info.endianness));
                        }
                    }
                    Err(e) => {
                        diagnostics.error(instr.line_number, e.to_string());
                        had_error = true;
                    }
                }
            }
            if !had_error {
                instr.bytes = bytes;
            }
        }
        Operand::None | Operand::Single(_) => {}
    }
}

fn run_validation_rules(
    profile: &CpuProfile,
    mnemonic: &str,
    mode: &str,
    value: Option<i64>,
    raw_operand_text: &str,
    line_number: usize,
    diagnostics: &mut Diagnostics,
) {
    for rule in &profile.validation_rules {
        match rule {
            ValidationRule::ModeIs { mnemonics, modes, message, .. } => {
                if mnemonics.contains(mnemonic) && modes.contains(mode) {
                    emit_rule(diagnostics, rule, line_number, rules::render_message(message, mnemonic, mode, value));
                }
            }
            ValidationRule::ModeIsNot { mnemonics, modes, message, .. } => {
                if mnemonics.contains(mnemonic) && !modes.contains(mode) {
                    emit_rule(diagnostics, rule, line_number, rules::render_message(message, mnemonic, mode, value));
                }
            }
            ValidationRule::OperandOutOfRange { min, max, message, exceptions, .. } => {
                if let Some(value) = value {
                    if (value < *min || value > *max) && !exceptions.contains(mnemonic) {
                        emit_rule(diagnostics, rule, line_number, rules::render_message(message, mnemonic, mode, Some(value)));
                    }
                }
            }
            ValidationRule::RegisterUsed { mnemonics, registers, message, .. } => {
                if mnemonics.contains(mnemonic) && registers.iter().any(|r| raw_operand_text.contains(r.as_str())) {
                    emit_rule(diagnostics, rule, line_number, rules::render_message(message, mnemonic, mode, value));
                }
            }
        }
    }
}

fn emit_rule(diagnostics: &mut Diagnostics, rule: &ValidationRule, line_number: usize, message: String) {
    if rule.is_error() {
        diagnostics.error(line_number, message);
    } else {
        diagnostics.warning(line_number, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_6502() -> CpuProfile {
        CpuProfile::from_str(include_str!("../profiles/m6502.yaml")).unwrap()
    }

    fn profile_6800() -> CpuProfile {
        CpuProfile::from_str(include_str!("../profiles/m6800.yaml")).unwrap()
    }

    fn assemble_ok(source: &str, profile: &CpuProfile) -> (Vec<u8>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let outcome = assemble(source, profile, None, &mut diagnostics);
        (outcome.program.byte_image(), diagnostics)
    }

    #[test]
    fn s1_immediate_and_branch() {
        let profile = profile_6502();
        let source = "      .ORG $8000\nSTART: LDA #$42\n       BRA START\n";
        let (bytes, diagnostics) = assemble_ok(source, &profile);
        assert!(!diagnostics.had_errors());
        assert_eq!(bytes, vec![0xA9, 0x42, 0x80, 0xFC]);
    }

    #[test]
    fn s2_word_directive_big_endian() {
        let profile = profile_6800();
        let source = "      .ORG $C000\n      .WORD $1234, $5678\n";
        let (bytes, diagnostics) = assemble_ok(source, &profile);
        assert!(!diagnostics.had_errors());
        assert_eq!(bytes, vec![0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn s3_equ_has_zero_size() {
        let profile = profile_6502();
        let source = "      .ORG $0000\nSIZE  EQU $10\n      .BYTE SIZE, SIZE+1\n";
        let (bytes, diagnostics) = assemble_ok(source, &profile);
        assert!(!diagnostics.had_errors());
        assert_eq!(bytes, vec![0x10, 0x11]);
    }

    #[test]
    fn s4_forward_reference_resolves() {
        let profile = profile_6502();
        let source = "      .ORG $8000\n      LDA TARGET\n      .ORG $9000\nTARGET: .BYTE $AA\n";
        let (bytes, diagnostics) = assemble_ok(source, &profile);
        assert!(!diagnostics.had_errors());
        assert_eq!(&bytes[0..3], &[0xAD, 0x00, 0x90]);
    }

    #[test]
    fn s5_branch_out_of_range_reserves_its_slot() {
        let profile = profile_6502();
        let mut source = String::from("      .ORG $8000\nSTART: BRA FAR\n");
        source.push_str(&".BYTE $00\n".repeat(200));
        source.push_str("FAR: NOP\n");
        let mut diagnostics = Diagnostics::new();
        let outcome = assemble(&source, &profile, None, &mut diagnostics);
        assert!(diagnostics.had_errors());
        assert!(diagnostics.entries().iter().any(|d| d.message.contains("branch out of range")));
        let branch = &outcome.program.instructions[1];
        assert_eq!(branch.size, 2);
        assert!(branch.bytes.is_empty());
    }

    #[test]
    fn s6_duplicate_label_reports_once() {
        let profile = profile_6502();
        let source = "FOO: NOP\nFOO: NOP\n";
        let mut diagnostics = Diagnostics::new();
        assemble(source, &profile, None, &mut diagnostics);
        let duplicate_errors = diagnostics.entries().iter().filter(|d| d.message.contains("duplicate label")).count();
        assert_eq!(duplicate_errors, 1);
    }

    #[test]
    fn s7_warning_rule_still_assembles() {
        let profile = profile_6502();
        let source = "      .ORG $0000\n      LDA $0050\n";
        let mut diagnostics = Diagnostics::new();
        let outcome = assemble(source, &profile, None, &mut diagnostics);
        assert!(!diagnostics.had_errors());
        assert!(diagnostics.entries().iter().any(|d| d.message.contains("absolute mode")));
        assert_eq!(outcome.program.instructions[1].bytes, vec![0xAD, 0x50, 0x00]);
    }

    #[test]
    fn undefined_symbol_is_an_error_and_yields_no_bytes() {
        let profile = profile_6502();
        let source = "      .ORG $0000\n      LDA MISSING\n";
        let mut diagnostics = Diagnostics::new();
        let outcome = assemble(source, &profile, None, &mut diagnostics);
        assert!(diagnostics.had_errors());
        assert!(outcome.program.instructions[1].bytes.is_empty());
    }

    #[test]
    fn monotone_addresses_invariant() {
        let profile = profile_6502();
        let source = "      .ORG $8000\nA: LDA #$01\nB: LDA #$02\nC: LDA #$03\n";
        let mut diagnostics = Diagnostics::new();
        let outcome = assemble(source, &profile, None, &mut diagnostics);
        let mut prev_end: Option<u32> = None;
        for instr in &outcome.program.instructions {
            if instr.size == 0 {
                continue;
            }
            if let Some(end) = prev_end {
                assert!(end <= instr.address);
            }
            prev_end = Some(instr.address + instr.size);
        }
    }

    #[test]
    fn text_directive_encodes_string_bytes() {
        let profile = profile_6502();
        let source = "      .ORG $0000\n      .TEXT \"HI\"\n";
        let (bytes, diagnostics) = assemble_ok(source, &profile);
        assert!(!diagnostics.had_errors());
        assert_eq!(bytes, b"HI");
    }

    #[test]
    fn fill_directive_repeats_byte() {
        let profile = profile_6502();
        let source = "      .ORG $0000\n      .FILL 3, $AA\n";
        let (bytes, diagnostics) = assemble_ok(source, &profile);
        assert!(!diagnostics.had_errors());
        assert_eq!(bytes, vec![0xAA, 0xAA, 0xAA]);
    }

    #[test]
    fn space_directive_reserves_zeroed_bytes() {
        let profile = profile_6502();
        let source = "      .ORG $0000\n      .SPACE 4\n      NOP\n";
        let (bytes, diagnostics) = assemble_ok(source, &profile);
        assert!(!diagnostics.had_errors());
        assert_eq!(bytes, vec![0x00, 0x00, 0x00, 0x00, 0xEA]);
    }

    #[test]
    fn end_directive_stops_pass1() {
        let profile = profile_6502();
        let source = "      .ORG $0000\n      .END\nGHOST: LDA #$01\n";
        let mut diagnostics = Diagnostics::new();
        let outcome = assemble(source, &profile, None, &mut diagnostics);
        assert!(!outcome.symbol_table.contains("GHOST"));
    }

    #[test]
    fn missing_operand_errors_instead_of_under_encoding() {
        let profile = profile_6502();
        // "#" alone falls through the immediate pattern (which requires at
        // least one character after `#`) to the absolute catch-all, whose
        // stripped expression text is empty: a 2-byte operand with nothing
        // to encode.
        let source = "      .ORG $0000\n      LDA #\n";
        let mut diagnostics = Diagnostics::new();
        let outcome = assemble(source, &profile, None, &mut diagnostics);
        assert!(diagnostics.had_errors());
        assert!(diagnostics.entries().iter().any(|d| d.message.contains("missing operand")));
        let instr = &outcome.program.instructions[1];
        assert!(instr.bytes.is_empty());
        assert_eq!(instr.size, 3);
    }
}
