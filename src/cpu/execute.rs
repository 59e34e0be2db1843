//! CPU execution engine for the Hack computer.
//!
//! Implements the fetch-decode-execute cycle over an immutable instruction
//! memory and a mutable data memory.

use crate::cpu::alu;
use crate::cpu::decode::{self, Instruction};
use crate::cpu::memory::{Memory, MEMORY_SIZE};
use crate::cpu::registers::Registers;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU can execute the instruction at PC.
    Running,
    /// PC left the instruction memory. Only `reset` leaves this state.
    Halted,
}

/// A location written by the most recent step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Modified {
    A,
    D,
    Pc,
    /// A data memory cell, by address.
    Memory(usize),
}

impl fmt::Display for Modified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modified::A => write!(f, "A"),
            Modified::D => write!(f, "D"),
            Modified::Pc => write!(f, "PC"),
            Modified::Memory(addr) => write!(f, "M[{}]", addr),
        }
    }
}

/// Register values plus the locations changed by the last step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSnapshot {
    pub a: i16,
    pub d: i16,
    pub pc: i16,
    pub last_modified: BTreeSet<Modified>,
}

/// The Hack CPU.
#[derive(Clone)]
pub struct Cpu {
    /// Instruction memory, fixed at construction.
    rom: Vec<u16>,
    /// CPU registers.
    regs: Registers,
    /// Data memory.
    mem: Memory,
    /// Current execution state.
    state: CpuState,
    /// Instructions executed since construction or reset.
    cycles: u64,
    /// Locations written by the most recent step.
    last_modified: BTreeSet<Modified>,
}

impl Cpu {
    /// Create a CPU for a program with the standard 24577-cell memory.
    pub fn new(rom: Vec<u16>) -> Self {
        Self {
            rom,
            regs: Registers::new(),
            mem: Memory::new(MEMORY_SIZE),
            state: CpuState::Running,
            cycles: 0,
            last_modified: BTreeSet::new(),
        }
    }

    /// Create a CPU with a custom data memory size.
    pub fn with_memory_size(rom: Vec<u16>, memory_size: usize) -> Result<Self, CpuError> {
        if memory_size == 0 {
            return Err(CpuError::EmptyMemory);
        }
        let mut cpu = Self::new(rom);
        cpu.mem = Memory::new(memory_size);
        Ok(cpu)
    }

    /// Reset registers and data memory. The program is kept.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.last_modified.clear();
    }

    /// Execute a single instruction.
    ///
    /// Returns `false` without doing anything if the CPU is halted or PC is
    /// outside the instruction memory; the CPU is halted from then on.
    pub fn step(&mut self) -> bool {
        self.last_modified.clear();

        if self.state == CpuState::Halted {
            return false;
        }

        // Fetch
        let word = match self.regs.pc_index().and_then(|pc| self.rom.get(pc)) {
            Some(&word) => word,
            None => {
                tracing::debug!(pc = self.regs.pc, "cpu halted");
                self.state = CpuState::Halted;
                return false;
            }
        };

        tracing::trace!(pc = self.regs.pc, word = %decode::format_word(word), "step");

        // Decode and execute
        self.execute(decode::decode(word));
        self.cycles += 1;
        true
    }

    fn execute(&mut self, instr: Instruction) {
        match instr {
            Instruction::Address(value) => {
                self.regs.a = value as i16;
                self.last_modified.insert(Modified::A);
                self.regs.advance_pc();
            }

            Instruction::Compute { a, comp, dest, jump } => {
                let operand = if a {
                    self.mem.read_at(self.regs.a)
                } else {
                    self.regs.a
                };
                let result = alu::compute(comp, self.regs.d, operand);

                // RAM[A] is addressed by A as it was before this instruction
                if dest.m {
                    let addr = self.mem.write_at(self.regs.a, result);
                    self.last_modified.insert(Modified::Memory(addr));
                }
                if dest.a {
                    self.regs.a = result;
                    self.last_modified.insert(Modified::A);
                }
                if dest.d {
                    self.regs.d = result;
                    self.last_modified.insert(Modified::D);
                }

                // Jump target is A after this instruction's writes
                if jump.holds(result) {
                    self.regs.jump();
                    self.last_modified.insert(Modified::Pc);
                } else {
                    self.regs.advance_pc();
                }
            }
        }
    }

    /// Read a data memory cell. Out-of-range addresses read as 0.
    pub fn get_ram(&self, addr: i32) -> i16 {
        self.mem.get(addr)
    }

    /// Write a data memory cell, reducing the value to 16 bits.
    /// Out-of-range addresses are ignored.
    pub fn set_ram(&mut self, addr: i32, value: i32) {
        if !self.mem.set(addr, value) {
            tracing::debug!(addr, "ignored out-of-range memory write");
        }
    }

    /// Current registers and last-modified set.
    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            a: self.regs.a,
            d: self.regs.d,
            pc: self.regs.pc,
            last_modified: self.last_modified.clone(),
        }
    }

    /// Current register values.
    pub fn registers(&self) -> Registers {
        self.regs
    }

    /// Data memory.
    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    /// Instruction memory.
    pub fn rom(&self) -> &[u16] {
        &self.rom
    }

    /// Locations written by the most recent step.
    pub fn last_modified(&self) -> &BTreeSet<Modified> {
        &self.last_modified
    }

    pub fn state(&self) -> CpuState {
        self.state
    }

    /// Instructions executed since construction or the last reset.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("rom_len", &self.rom.len())
            .finish()
    }
}

/// Errors that can occur while constructing a CPU.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("data memory size must be at least 1")]
    EmptyMemory,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assemble;

    fn cpu_for(source: &str) -> Cpu {
        Cpu::new(assemble(source).unwrap().instructions)
    }

    fn run(cpu: &mut Cpu, steps: usize) {
        for _ in 0..steps {
            assert!(cpu.step());
        }
    }

    #[test]
    fn test_add_and_store() {
        let mut cpu = cpu_for("@2\nD=A\n@3\nD=D+A\n@0\nM=D");
        run(&mut cpu, 6);
        assert_eq!(cpu.get_ram(0), 5);
        assert_eq!(cpu.registers().d, 5);
        assert_eq!(cpu.cycles(), 6);
    }

    #[test]
    fn test_halts_past_end() {
        let mut cpu = cpu_for("@1");
        assert!(cpu.step());
        assert!(!cpu.step());
        assert!(cpu.is_halted());
        assert!(!cpu.step());
        assert_eq!(cpu.registers().pc, 1);
    }

    #[test]
    fn test_empty_program_halts() {
        let mut cpu = Cpu::new(Vec::new());
        assert!(!cpu.step());
        assert_eq!(cpu.state(), CpuState::Halted);
    }

    #[test]
    fn test_negative_pc_halts() {
        // A=-1, then jump to it
        let mut cpu = cpu_for("A=-1;JMP");
        assert!(cpu.step());
        assert_eq!(cpu.registers().pc, -1);
        assert!(!cpu.step());
        assert!(cpu.is_halted());
    }

    #[test]
    fn test_last_modified_tracking() {
        let mut cpu = cpu_for("@5\nD=A\n@R0\nM=D\nAMD=D-1");
        cpu.step();
        assert_eq!(cpu.registers().a, 5);
        assert!(cpu.last_modified().contains(&Modified::A));

        cpu.step();
        assert_eq!(cpu.last_modified().iter().copied().collect::<Vec<_>>(), vec![Modified::D]);

        cpu.step();
        cpu.step();
        assert_eq!(cpu.get_ram(0), 5);
        assert!(cpu.last_modified().contains(&Modified::Memory(0)));
        assert_eq!(cpu.snapshot().last_modified.len(), 1);

        cpu.step();
        let names: Vec<String> = cpu.last_modified().iter().map(|m| m.to_string()).collect();
        assert_eq!(names, vec!["A", "D", "M[0]"]);
        assert_eq!(cpu.get_ram(0), 4);
        assert_eq!(cpu.registers().a, 4);
    }

    #[test]
    fn test_last_modified_cleared_on_halt() {
        let mut cpu = cpu_for("D=1");
        cpu.step();
        assert!(!cpu.last_modified().is_empty());
        cpu.step();
        assert!(cpu.last_modified().is_empty());
    }

    #[test]
    fn test_memory_operand_wraps_address() {
        let mut cpu = Cpu::with_memory_size(assemble("@12\nD=M").unwrap().instructions, 10).unwrap();
        cpu.set_ram(2, 77);
        run(&mut cpu, 2);
        assert_eq!(cpu.registers().d, 77);
    }

    #[test]
    fn test_conditional_jump() {
        let source = "
            @7
            D=A
            @END
            D;JGT
            @0
            M=1
        (END)
            @END
            0;JMP
        ";
        let mut cpu = cpu_for(source);
        run(&mut cpu, 4);
        assert_eq!(cpu.registers().pc, 6);
        assert!(cpu.last_modified().contains(&Modified::Pc));
        assert_eq!(cpu.get_ram(0), 0);
    }

    #[test]
    fn test_jump_not_taken_advances() {
        let mut cpu = cpu_for("@9\nD=0;JNE");
        run(&mut cpu, 2);
        assert_eq!(cpu.registers().pc, 2);
        assert!(!cpu.last_modified().contains(&Modified::Pc));
    }

    #[test]
    fn test_jump_target_uses_written_a() {
        // A is loaded with 100, then A=1 and jump: target is the new A
        let mut cpu = cpu_for("@100\nA=1;JMP");
        run(&mut cpu, 2);
        assert_eq!(cpu.registers().pc, 1);
    }

    #[test]
    fn test_memory_write_uses_pre_write_a() {
        // AM=A+1 with A=3 writes 4 to RAM[3], not RAM[4]
        let mut cpu = cpu_for("@3\nAM=A+1");
        run(&mut cpu, 2);
        assert_eq!(cpu.get_ram(3), 4);
        assert_eq!(cpu.get_ram(4), 0);
        assert_eq!(cpu.registers().a, 4);
    }

    #[test]
    fn test_arithmetic_wraps() {
        let mut cpu = cpu_for("@32767\nD=A\nD=D+1\n@0\nM=D-1");
        run(&mut cpu, 5);
        assert_eq!(cpu.registers().d, -32768);
        assert_eq!(cpu.get_ram(0), 32767);
    }

    #[test]
    fn test_undefined_computation_is_zero() {
        // 111 0 111110 010 000: D = <undefined>
        let mut cpu = Cpu::new(vec![0b1110_1111_1001_0000]);
        cpu.regs.d = 9;
        assert!(cpu.step());
        assert_eq!(cpu.registers().d, 0);
    }

    #[test]
    fn test_set_ram_out_of_range_is_noop() {
        let mut cpu = Cpu::new(Vec::new());
        cpu.set_ram(-1, 5);
        cpu.set_ram(MEMORY_SIZE as i32, 5);
        assert_eq!(cpu.get_ram(-1), 0);
        assert_eq!(cpu.get_ram(MEMORY_SIZE as i32), 0);
        cpu.set_ram(100, 70000);
        assert_eq!(cpu.get_ram(100), 4464);
    }

    #[test]
    fn test_reset() {
        let mut cpu = cpu_for("@3\nD=A\n@1\nM=D");
        run(&mut cpu, 4);
        cpu.step();
        assert!(cpu.is_halted());

        cpu.reset();
        assert!(!cpu.is_halted());
        assert_eq!(cpu.registers(), Registers::new());
        assert_eq!(cpu.get_ram(1), 0);
        assert_eq!(cpu.cycles(), 0);
        assert_eq!(cpu.rom().len(), 4);
        assert!(cpu.step());
    }

    #[test]
    fn test_zero_memory_rejected() {
        assert_eq!(Cpu::with_memory_size(vec![], 0).unwrap_err(), CpuError::EmptyMemory);
    }
}
