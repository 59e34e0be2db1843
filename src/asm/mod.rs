//! Assembler and disassembler for Hack programs.
//!
//! This module provides:
//! - The encoding tables and predefined symbols
//! - A two-pass assembler (text → instruction words + aligned source lines)
//! - The `.hack` machine-code format
//! - A disassembler (instruction words → readable text)

pub mod assembler;
pub mod disasm;
pub mod program;
pub mod symbols;
pub mod tables;

pub use assembler::{assemble, Assembler, AssemblerError};
pub use disasm::{disassemble, disassemble_word};
pub use program::{load_hack, load_program, save_hack, Program, ProgramError};
pub use symbols::SymbolTable;
