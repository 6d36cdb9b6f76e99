//! A retargetable two-pass assembler for 8/16-bit microprocessors.
//!
//! The engine translates textual assembly source into a flat binary image,
//! resolving labels, evaluating constant expressions, checking CPU-specific
//! addressing rules and producing diagnostics with source line numbers.
//!
//! Retargeting to a new CPU means pointing [`profile::CpuProfile::load_from_dir`]
//! at a new declarative profile document: the parser, expression engine and
//! two-pass driver are entirely data-driven by it.

pub mod diagnostics;
pub mod profile;
pub mod symtab;
pub mod expr;
pub mod line_parser;
pub mod addressing;
pub mod instruction;
pub mod assembler;
pub mod emit;

pub use assembler::{assemble, AssembleOutcome, Error};
pub use diagnostics::Diagnostics;
pub use profile::CpuProfile;
