//! Breakpoint debugger wrapping the Hack CPU.
//!
//! The debugger owns one [`Cpu`] together with the source line behind each
//! instruction, and adds breakpoints, single-stepping and run-to-breakpoint.
//! Runs are synchronous and bounded by a step budget; a caller that wants to
//! stay responsive runs with a small budget and calls again.

use crate::asm::Program;
use crate::config::DebuggerConfig;
use crate::cpu::{Cpu, CpuError, CpuSnapshot, Registers};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// PC reached a breakpoint; that instruction has not run.
    Breakpoint,
    /// The CPU halted.
    Halted,
    /// The step budget ran out.
    MaxSteps,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::Breakpoint => "breakpoint",
            StopReason::Halted => "halted",
            StopReason::MaxSteps => "max_steps",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Debugger run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    /// Inside `run_until_breakpoint`.
    Running,
}

/// Debugger for a loaded program.
#[derive(Debug, Clone)]
pub struct Debugger {
    cpu: Cpu,
    /// Source text per instruction address.
    source_lines: Vec<String>,
    breakpoints: BTreeSet<usize>,
    run_state: RunState,
    /// Budget used by [`Debugger::run`].
    default_max_steps: u64,
}

impl Debugger {
    /// Wrap a CPU. `source_lines` is indexed by instruction address.
    ///
    /// Lines past the end of the program are dropped; instructions without
    /// a line report no source text.
    pub fn new(cpu: Cpu, source_lines: Vec<String>) -> Self {
        Self::with_config(cpu, source_lines, &DebuggerConfig::default())
    }

    /// Like [`Debugger::new`], with the step budget taken from `config`.
    pub fn with_config(cpu: Cpu, mut source_lines: Vec<String>, config: &DebuggerConfig) -> Self {
        source_lines.truncate(cpu.rom().len());
        Self {
            cpu,
            source_lines,
            breakpoints: BTreeSet::new(),
            run_state: RunState::Idle,
            default_max_steps: config.max_steps,
        }
    }

    /// Build a CPU for an assembled program and wrap it.
    pub fn from_program(program: Program, config: &DebuggerConfig) -> Result<Self, CpuError> {
        let (instructions, source_lines) = program.into_parts();
        let cpu = Cpu::with_memory_size(instructions, config.memory_size)?;
        Ok(Self::with_config(cpu, source_lines, config))
    }

    /// Add a breakpoint. Only addresses inside the program are accepted.
    pub fn add_breakpoint(&mut self, addr: i32) -> bool {
        match usize::try_from(addr) {
            Ok(addr) if addr < self.cpu.rom().len() => {
                self.breakpoints.insert(addr);
                tracing::debug!(addr, "breakpoint added");
                true
            }
            _ => false,
        }
    }

    /// Remove a breakpoint. Returns whether one was set.
    pub fn remove_breakpoint(&mut self, addr: i32) -> bool {
        let removed = usize::try_from(addr)
            .map(|addr| self.breakpoints.remove(&addr))
            .unwrap_or(false);
        if removed {
            tracing::debug!(addr, "breakpoint removed");
        }
        removed
    }

    /// Toggle a breakpoint. Returns whether it is now set.
    pub fn toggle_breakpoint(&mut self, addr: i32) -> bool {
        if self.remove_breakpoint(addr) {
            false
        } else {
            self.add_breakpoint(addr)
        }
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    /// Breakpoint addresses in ascending order.
    pub fn breakpoints(&self) -> &BTreeSet<usize> {
        &self.breakpoints
    }

    pub fn has_breakpoint(&self, addr: usize) -> bool {
        self.breakpoints.contains(&addr)
    }

    /// Execute one instruction.
    pub fn step(&mut self) -> (bool, CpuSnapshot) {
        let ok = self.cpu.step();
        (ok, self.cpu.snapshot())
    }

    /// Run until a breakpoint, a halt, or `max_steps` executed instructions.
    ///
    /// The breakpoint check happens before each instruction, so calling this
    /// again while stopped at a breakpoint stops immediately at the same
    /// address. Step over it first to continue.
    pub fn run_until_breakpoint(&mut self, max_steps: u64) -> (StopReason, CpuSnapshot) {
        self.run_state = RunState::Running;
        let reason = self.run_loop(max_steps);
        self.run_state = RunState::Idle;

        tracing::debug!(reason = %reason, pc = self.cpu.registers().pc, "run stopped");
        (reason, self.cpu.snapshot())
    }

    fn run_loop(&mut self, max_steps: u64) -> StopReason {
        for _ in 0..max_steps {
            let at_breakpoint = self
                .cpu
                .registers()
                .pc_index()
                .is_some_and(|pc| self.breakpoints.contains(&pc));
            if at_breakpoint {
                return StopReason::Breakpoint;
            }
            if !self.cpu.step() {
                return StopReason::Halted;
            }
        }
        StopReason::MaxSteps
    }

    /// Run with the configured step budget.
    pub fn run(&mut self) -> (StopReason, CpuSnapshot) {
        self.run_until_breakpoint(self.default_max_steps)
    }

    /// Reset the CPU. Breakpoints are kept.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.run_state = RunState::Idle;
        tracing::debug!("debugger reset");
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Source text of the instruction at PC, if PC is inside the program.
    pub fn get_current_source_line(&self) -> Option<&str> {
        self.cpu
            .registers()
            .pc_index()
            .and_then(|pc| self.source_lines.get(pc))
            .map(String::as_str)
    }

    pub fn get_registers(&self) -> Registers {
        self.cpu.registers()
    }

    /// Up to `count` memory cells starting at `start`, clamped to memory.
    pub fn get_ram_range(&self, start: i32, count: usize) -> Vec<i16> {
        self.cpu.memory().range(start, count)
    }

    pub fn get_ram_value(&self, addr: i32) -> i16 {
        self.cpu.get_ram(addr)
    }

    /// Write a memory cell. Out-of-range addresses are ignored.
    pub fn set_ram_value(&mut self, addr: i32, value: i32) {
        self.cpu.set_ram(addr, value);
    }

    pub fn source_lines(&self) -> &[String] {
        &self.source_lines
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Current default step budget for [`Debugger::run`].
    pub fn default_max_steps(&self) -> u64 {
        self.default_max_steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assemble;

    fn debugger_for(source: &str) -> Debugger {
        let program = assemble(source).unwrap();
        Debugger::from_program(program, &DebuggerConfig::default()).unwrap()
    }

    const STORE_FIVE: &str = "@5\nD=A\n@R0\nM=D\n@R1\nM=D+1";

    #[test]
    fn test_mismatched_source_lines() {
        let rom = assemble("@1\nD=A").unwrap().instructions;

        let dbg = Debugger::new(Cpu::new(rom.clone()), vec!["@1".into(), "D=A".into(), "extra".into()]);
        assert_eq!(dbg.source_lines().len(), 2);

        let mut dbg = Debugger::new(Cpu::new(rom), vec!["@1".into()]);
        assert_eq!(dbg.get_current_source_line(), Some("@1"));
        dbg.step();
        assert_eq!(dbg.get_current_source_line(), None);
        assert!(dbg.add_breakpoint(1));
    }

    #[test]
    fn test_breakpoint_bounds() {
        let mut dbg = debugger_for(STORE_FIVE);
        assert!(!dbg.add_breakpoint(6));
        assert!(!dbg.add_breakpoint(-1));
        assert!(dbg.breakpoints().is_empty());

        assert!(dbg.add_breakpoint(5));
        assert!(dbg.add_breakpoint(0));
        assert_eq!(dbg.breakpoints().iter().copied().collect::<Vec<_>>(), vec![0, 5]);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut dbg = debugger_for(STORE_FIVE);
        dbg.add_breakpoint(2);
        assert!(dbg.remove_breakpoint(2));
        assert!(!dbg.remove_breakpoint(2));
        assert!(!dbg.remove_breakpoint(-4));

        dbg.add_breakpoint(1);
        dbg.add_breakpoint(3);
        dbg.clear_breakpoints();
        assert!(dbg.breakpoints().is_empty());
    }

    #[test]
    fn test_toggle_breakpoint() {
        let mut dbg = debugger_for(STORE_FIVE);
        assert!(dbg.toggle_breakpoint(4));
        assert!(dbg.has_breakpoint(4));
        assert!(!dbg.toggle_breakpoint(4));
        assert!(!dbg.has_breakpoint(4));
        assert!(!dbg.toggle_breakpoint(40));
    }

    #[test]
    fn test_step_returns_snapshot() {
        let mut dbg = debugger_for(STORE_FIVE);
        let (ok, state) = dbg.step();
        assert!(ok);
        assert_eq!(state.pc, 1);
        assert_eq!(state.a, 5);
        assert_eq!(dbg.get_current_source_line(), Some("D=A"));
    }

    #[test]
    fn test_run_to_breakpoint() {
        let mut dbg = debugger_for(STORE_FIVE);
        dbg.add_breakpoint(3);

        let (reason, state) = dbg.run_until_breakpoint(1000);
        assert_eq!(reason, StopReason::Breakpoint);
        assert_eq!(state.pc, 3);
        assert_eq!(dbg.cpu().cycles(), 3);
        assert_eq!(dbg.get_ram_value(0), 0);
        assert_eq!(dbg.run_state(), RunState::Idle);
    }

    #[test]
    fn test_run_again_at_breakpoint_stops_immediately() {
        let mut dbg = debugger_for(STORE_FIVE);
        dbg.add_breakpoint(3);
        dbg.run_until_breakpoint(1000);

        let (reason, state) = dbg.run_until_breakpoint(1000);
        assert_eq!(reason, StopReason::Breakpoint);
        assert_eq!(state.pc, 3);
        assert_eq!(dbg.cpu().cycles(), 3);

        // Stepping over the breakpoint lets the run continue to the end
        dbg.step();
        let (reason, _) = dbg.run_until_breakpoint(1000);
        assert_eq!(reason, StopReason::Halted);
        assert_eq!(dbg.get_ram_range(0, 2), vec![5, 6]);
    }

    #[test]
    fn test_breakpoint_at_entry() {
        let mut dbg = debugger_for(STORE_FIVE);
        dbg.add_breakpoint(0);
        let (reason, state) = dbg.run_until_breakpoint(10);
        assert_eq!(reason, StopReason::Breakpoint);
        assert_eq!(state.pc, 0);
        assert_eq!(dbg.cpu().cycles(), 0);
    }

    #[test]
    fn test_run_halts() {
        let mut dbg = debugger_for(STORE_FIVE);
        let (reason, state) = dbg.run();
        assert_eq!(reason, StopReason::Halted);
        assert_eq!(state.pc, 6);
        assert_eq!(dbg.get_current_source_line(), None);
        assert!(dbg.cpu().is_halted());
    }

    #[test]
    fn test_run_max_steps() {
        let mut dbg = debugger_for("(LOOP)\n@LOOP\n0;JMP");
        let (reason, state) = dbg.run_until_breakpoint(10);
        assert_eq!(reason, StopReason::MaxSteps);
        assert_eq!(state.pc, 0);
        assert_eq!(dbg.cpu().cycles(), 10);
        assert_eq!(reason.to_string(), "max_steps");
    }

    #[test]
    fn test_zero_budget() {
        let mut dbg = debugger_for(STORE_FIVE);
        let (reason, _) = dbg.run_until_breakpoint(0);
        assert_eq!(reason, StopReason::MaxSteps);
        assert_eq!(dbg.cpu().cycles(), 0);
    }

    #[test]
    fn test_reset_keeps_breakpoints() {
        let mut dbg = debugger_for(STORE_FIVE);
        dbg.add_breakpoint(4);
        dbg.run();
        assert_eq!(dbg.get_registers().pc, 4);

        dbg.reset();
        assert_eq!(dbg.get_registers(), Registers::new());
        assert!(dbg.has_breakpoint(4));
        let (reason, state) = dbg.run();
        assert_eq!(reason, StopReason::Breakpoint);
        assert_eq!(state.pc, 4);
    }

    #[test]
    fn test_set_ram_value() {
        let mut dbg = debugger_for(STORE_FIVE);
        dbg.set_ram_value(10, -3);
        dbg.set_ram_value(-1, 9);
        dbg.set_ram_value(24577, 9);
        assert_eq!(dbg.get_ram_range(9, 3), vec![0, -3, 0]);
        assert_eq!(dbg.get_ram_value(24577), 0);
        assert_eq!(dbg.get_ram_range(24575, 10).len(), 2);
    }

    #[test]
    fn test_configured_budget() {
        let config = DebuggerConfig {
            max_steps: 7,
            ..DebuggerConfig::default()
        };
        let program = assemble("(LOOP)\n@LOOP\n0;JMP").unwrap();
        let mut dbg = Debugger::from_program(program, &config).unwrap();
        assert_eq!(dbg.default_max_steps(), 7);
        let (reason, _) = dbg.run();
        assert_eq!(reason, StopReason::MaxSteps);
        assert_eq!(dbg.cpu().cycles(), 7);
    }
}
