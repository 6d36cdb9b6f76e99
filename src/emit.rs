//! Output emission: the flat binary image and an optional
//! human-readable listing. Thin wrappers around [`crate::instruction::Program`]
//! no assembly logic lives here.

use crate::instruction::Program;
use std::fmt::Write as _;

/// The raw binary image, ready to write to disk.
pub fn binary_image(program: &Program) -> Vec<u8> {
    program.byte_image()
}

/// A human-readable listing: one line per instruction/directive that
/// occupies space, as `address  bytes  source-line`. Lines with no bytes
/// (label-only, `EQU`, `.ORG`, zero-size errors) are skipped.
pub fn listing(program: &Program, source: &str) -> String {
    let source_lines: Vec<&str> = source.lines().collect();
    let mut out = String::new();
    for instr in &program.instructions {
        if instr.size == 0 {
            continue;
        }
        let bytes_field = if instr.bytes.is_empty() {
            "--".repeat(instr.size as usize)
        } else {
            instr.bytes.iter().map(|b| format!("{:02X}", b)).collect::<Vec<_>>().join(" ")
        };
        let source_line = source_lines.get(instr.line_number - 1).copied().unwrap_or("").trim_end();
        let _ = writeln!(out, "{:06X}  {:<24}  {}", instr.address, bytes_field, source_line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::{Instruction, InstructionKind, Operand};

    fn instr(address: u32, size: u32, bytes: Vec<u8>) -> Instruction {
        Instruction {
            line_number: 1,
            label: None,
            kind: InstructionKind::Instruction,
            name: Some("NOP".to_string()),
            operand_text: String::new(),
            operand: Operand::None,
            mode: Some("implied".to_string()),
            address,
            size,
            bytes,
        }
    }

    #[test]
    fn binary_image_delegates_to_program() {
        let program = Program { instructions: vec![instr(0, 1, vec![0xEA])], fill_byte: 0 };
        assert_eq!(binary_image(&program), vec![0xEA]);
    }

    #[test]
    fn listing_skips_zero_size_lines() {
        let mut zero = instr(0, 0, Vec::new());
        zero.kind = InstructionKind::Directive;
        zero.name = Some("ORG".to_string());
        let program = Program { instructions: vec![zero, instr(0x8000, 1, vec![0xEA])], fill_byte: 0 };
        let rendered = listing(&program, "      .ORG $8000\n      NOP\n");
        assert_eq!(rendered.lines().count(), 1);
        assert!(rendered.contains("008000"));
        assert!(rendered.contains("EA"));
    }
}
