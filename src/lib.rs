//! # Hack Emulator
//!
//! An assembler, CPU emulator and breakpoint debugger for the 16-bit Hack
//! computer.
//!
//! The pipeline is assemble → execute → inspect: [`assemble`] turns source
//! text into instruction words plus the source line behind each one, [`Cpu`]
//! executes those words one step at a time, and [`Debugger`] wraps the CPU
//! with breakpoints and bounded runs.

pub mod asm;
pub mod config;
pub mod cpu;
pub mod debugger;
pub mod shell;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export commonly used types
pub use asm::{assemble, disassemble, load_program, AssemblerError, Program, ProgramError};
pub use config::{Config, ConfigError};
pub use cpu::{Cpu, CpuError, CpuSnapshot, CpuState, Modified, Registers};
pub use debugger::{Debugger, RunState, StopReason};
pub use shell::Shell;

#[cfg(feature = "tui")]
pub use tui::run_debugger;
