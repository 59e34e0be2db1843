//! CPU emulation for the Hack computer.
//!
//! This module implements the Hack architecture:
//! - Instruction memory (read-only, one 16-bit word per address)
//! - 24577 sixteen-bit data memory cells
//! - 3 registers: A (address), D (data), PC (program counter)
//! - Two instruction forms: address load and compute

pub mod alu;
pub mod decode;
pub mod execute;
pub mod memory;
pub mod registers;

pub use decode::{DecodeError, Dest, Instruction, Jump};
pub use execute::{Cpu, CpuError, CpuSnapshot, CpuState, Modified};
pub use memory::{Memory, MEMORY_SIZE};
pub use registers::Registers;
