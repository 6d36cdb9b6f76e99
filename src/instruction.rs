//! The `Instruction` and `Program` data model: one record per logical
//! source line that produces output or affects assembler state, assembled
//! into an ordered, addressed program.

use crate::expr::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionKind {
    Instruction,
    Directive,
    Empty,
}

/// The parsed operand, before Pass 2 evaluates it.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    Single(Expr),
    List(Vec<Expr>),
    /// Already-resolved bytes from a directive that needs no Pass 2
    /// evaluation (`.TEXT`, `.FILL`, `.SPACE`), copied verbatim into
    /// `Instruction::bytes` by Pass 2.
    Bytes(Vec<u8>),
}

/// One record per logical source line, threading state from the line
/// parser through both assembler passes.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub line_number: usize,
    pub label: Option<String>,
    pub kind: InstructionKind,
    /// Mnemonic or directive name, canonicalized uppercase. `None` only for
    /// a bare `Empty` line (possibly still carrying a label).
    pub name: Option<String>,
    pub operand_text: String,
    pub operand: Operand,
    /// Addressing mode name, populated by Pass 1 for `Instruction` lines.
    pub mode: Option<String>,
    /// Assigned address, populated by Pass 1.
    pub address: u32,
    /// Size in bytes, populated by Pass 1. Never changes in Pass 2 (invariant 1).
    pub size: u32,
    /// Machine code, populated by Pass 2. Empty if an error was recorded
    /// for this instruction.
    pub bytes: Vec<u8>,
}

impl Instruction {
    pub fn empty(line_number: usize, label: Option<String>) -> Instruction {
        Instruction {
            line_number,
            label,
            kind: InstructionKind::Empty,
            name: None,
            operand_text: String::new(),
            operand: Operand::None,
            mode: None,
            address: 0,
            size: 0,
            bytes: Vec::new(),
        }
    }
}

/// An ordered sequence of instructions plus the profile's fill byte, used
/// to form the final byte image.
pub struct Program {
    pub instructions: Vec<Instruction>,
    pub fill_byte: u8,
}

impl Program {
    /// Concatenate every instruction's bytes in source order, padding
    /// between non-contiguous address ranges with the fill byte. Mirrors
    /// what the emitter does, so callers that only need the raw bytes (as
    /// opposed to a listing) don't need to depend on `emit`.
    pub fn byte_image(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut cursor: Option<u32> = None;
        for instr in &self.instructions {
            if instr.size == 0 {
                continue;
            }
            match cursor {
                Some(c) if instr.address > c => {
                    out.extend(std::iter::repeat(self.fill_byte).take((instr.address - c) as usize));
                }
                _ => {}
            }
            if instr.bytes.is_empty() {
                // an error was recorded for this instruction; its slot is
                // still reserved so later addresses stay correct
                out.extend(std::iter::repeat(self.fill_byte).take(instr.size as usize));
            } else {
                out.extend_from_slice(&instr.bytes);
            }
            cursor = Some(instr.address + instr.size);
        }
        out
    }

    /// The address of the first instruction that occupies space, i.e. the
    /// base address of the output file.
    pub fn base_address(&self) -> u32 {
        self.instructions.iter().find(|i| i.size > 0).map(|i| i.address).unwrap_or(0)
    }
}
