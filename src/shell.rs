//! Line-oriented debugger shell.
//!
//! Reads one command per line and drives a [`Debugger`]. Input and output
//! are generic so the shell runs equally well on stdin/stdout or in-memory
//! buffers.

use crate::config::Config;
use crate::debugger::{Debugger, StopReason};
use crate::cpu::CpuSnapshot;
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Lines of source shown on each side of PC by `list`.
const LIST_CONTEXT: usize = 5;

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Step,
    Run,
    Break(i32),
    Delete(i32),
    ClearBreakpoints,
    ListBreakpoints,
    Registers,
    Memory { addr: i32, count: Option<usize> },
    Set { addr: i32, value: i32 },
    Reset,
    List,
    Config,
    Help,
    Quit,
}

impl Command {
    /// Parse a command line. Command names are case-insensitive.
    pub fn parse(line: &str) -> Result<Self, ShellError> {
        let lower = line.trim().to_lowercase();
        let mut parts = lower.split_whitespace();
        let name = parts.next().ok_or(ShellError::Empty)?;
        let args: Vec<&str> = parts.collect();

        let cmd = match (name, args.as_slice()) {
            ("s" | "step", []) => Command::Step,
            ("r" | "run", []) => Command::Run,
            ("b" | "break", [addr]) => Command::Break(parse_arg(addr, USAGE_BREAK)?),
            ("b" | "break", _) => return Err(ShellError::Usage(USAGE_BREAK)),
            ("d" | "delete", [addr]) => Command::Delete(parse_arg(addr, USAGE_DELETE)?),
            ("d" | "delete", _) => return Err(ShellError::Usage(USAGE_DELETE)),
            ("bc", []) => Command::ClearBreakpoints,
            ("bl", []) => Command::ListBreakpoints,
            ("reg", []) => Command::Registers,
            ("m" | "mem", [addr]) => Command::Memory {
                addr: parse_arg(addr, USAGE_MEMORY)?,
                count: None,
            },
            ("m" | "mem", [addr, count]) => Command::Memory {
                addr: parse_arg(addr, USAGE_MEMORY)?,
                count: Some(parse_arg(count, USAGE_MEMORY)?),
            },
            ("m" | "mem", _) => return Err(ShellError::Usage(USAGE_MEMORY)),
            ("set", [addr, value]) => Command::Set {
                addr: parse_arg(addr, USAGE_SET)?,
                value: parse_arg(value, USAGE_SET)?,
            },
            ("set", _) => return Err(ShellError::Usage(USAGE_SET)),
            ("reset", []) => Command::Reset,
            ("l" | "list", []) => Command::List,
            ("config", []) => Command::Config,
            ("h" | "help" | "?", _) => Command::Help,
            ("q" | "quit" | "exit", _) => Command::Quit,
            _ => return Err(ShellError::Unknown(line.trim().to_string())),
        };
        Ok(cmd)
    }
}

const USAGE_BREAK: &str = "b <address>";
const USAGE_DELETE: &str = "d <address>";
const USAGE_MEMORY: &str = "m <address> [count]";
const USAGE_SET: &str = "set <address> <value>";

fn parse_arg<T: std::str::FromStr>(text: &str, usage: &'static str) -> Result<T, ShellError> {
    text.parse().map_err(|_| ShellError::Usage(usage))
}

/// Whether the shell should keep reading commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Interactive shell around a debugger.
pub struct Shell<'a> {
    debugger: Debugger,
    config: &'a Config,
}

impl<'a> Shell<'a> {
    pub fn new(debugger: Debugger, config: &'a Config) -> Self {
        Self { debugger, config }
    }

    pub fn debugger(&self) -> &Debugger {
        &self.debugger
    }

    /// Read and execute commands until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        writeln!(out, "=== Hack debugger ===")?;
        write_help(out)?;

        let mut lines = input.lines();
        loop {
            write!(out, "\n[PC={}] > ", self.debugger.get_registers().pc)?;
            out.flush()?;

            let line = match lines.next() {
                Some(line) => line?,
                None => break,
            };
            if line.trim().is_empty() {
                continue;
            }

            match Command::parse(&line) {
                Ok(cmd) => {
                    if self.execute(cmd, out)? == Flow::Quit {
                        break;
                    }
                }
                Err(e) => writeln!(out, "{}", e)?,
            }
        }
        Ok(())
    }

    /// Execute one command.
    pub fn execute<W: Write>(&mut self, cmd: Command, out: &mut W) -> io::Result<Flow> {
        match cmd {
            Command::Step => {
                let line = self.debugger.get_current_source_line().map(str::to_string);
                let (ok, state) = self.debugger.step();
                if ok {
                    writeln!(out, "executed: {}", line.as_deref().unwrap_or("(none)"))?;
                    write_state(out, &state)?;
                } else {
                    writeln!(out, "program halted")?;
                }
            }

            Command::Run => {
                let (reason, state) = self.debugger.run();
                match reason {
                    StopReason::Breakpoint => writeln!(out, "stopped at breakpoint (PC={})", state.pc)?,
                    StopReason::Halted => writeln!(out, "program halted")?,
                    StopReason::MaxSteps => writeln!(
                        out,
                        "step limit reached ({} steps)",
                        self.debugger.default_max_steps()
                    )?,
                }
                write_state(out, &state)?;
            }

            Command::Break(addr) => {
                if self.debugger.add_breakpoint(addr) {
                    writeln!(out, "breakpoint set at {}", addr)?;
                } else {
                    writeln!(out, "invalid address: {}", addr)?;
                }
            }

            Command::Delete(addr) => {
                if self.debugger.remove_breakpoint(addr) {
                    writeln!(out, "breakpoint at {} removed", addr)?;
                } else {
                    writeln!(out, "no breakpoint at {}", addr)?;
                }
            }

            Command::ClearBreakpoints => {
                self.debugger.clear_breakpoints();
                writeln!(out, "all breakpoints cleared")?;
            }

            Command::ListBreakpoints => {
                let bps = self.debugger.breakpoints();
                if bps.is_empty() {
                    writeln!(out, "no breakpoints")?;
                } else {
                    let list: Vec<String> = bps.iter().map(|bp| bp.to_string()).collect();
                    writeln!(out, "breakpoints: {}", list.join(", "))?;
                }
            }

            Command::Registers => {
                let regs = self.debugger.get_registers();
                writeln!(out, "A  = {}", regs.a)?;
                writeln!(out, "D  = {}", regs.d)?;
                writeln!(out, "PC = {}", regs.pc)?;
            }

            Command::Memory { addr, count: None } => {
                writeln!(out, "RAM[{}] = {}", addr, self.debugger.get_ram_value(addr))?;
            }

            Command::Memory { addr, count: Some(count) } => {
                let first = addr.max(0);
                for (i, value) in self.debugger.get_ram_range(addr, count).iter().enumerate() {
                    writeln!(out, "RAM[{}] = {}", first as usize + i, value)?;
                }
            }

            Command::Set { addr, value } => {
                self.debugger.set_ram_value(addr, value);
                writeln!(out, "RAM[{}] = {}", addr, self.debugger.get_ram_value(addr))?;
            }

            Command::Reset => {
                self.debugger.reset();
                writeln!(out, "CPU reset")?;
            }

            Command::List => self.write_listing(out)?,

            Command::Config => {
                let dbg = &self.config.debugger;
                writeln!(out, "ram view size: {}", dbg.ram_view_size)?;
                writeln!(out, "max steps:     {}", dbg.max_steps)?;
                writeln!(out, "memory size:   {}", dbg.memory_size)?;
                writeln!(out, "output dir:    {}", self.config.assembler.output_dir)?;
            }

            Command::Help => write_help(out)?,

            Command::Quit => {
                writeln!(out, "bye")?;
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Source lines around PC: `>` marks PC, `*` marks breakpoints.
    fn write_listing<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let lines = self.debugger.source_lines();
        if lines.is_empty() {
            return writeln!(out, "(empty program)");
        }
        let pc = self.debugger.get_registers().pc_index();
        let center = pc.unwrap_or(0).min(lines.len() - 1);
        let start = center.saturating_sub(LIST_CONTEXT);
        let end = (center + LIST_CONTEXT + 1).min(lines.len());

        for (addr, text) in lines.iter().enumerate().take(end).skip(start) {
            let cursor = if pc == Some(addr) { '>' } else { ' ' };
            let bp = if self.debugger.has_breakpoint(addr) { '*' } else { ' ' };
            writeln!(out, "{}{} {:5}: {}", cursor, bp, addr, text)?;
        }
        Ok(())
    }
}

fn write_state<W: Write>(out: &mut W, state: &CpuSnapshot) -> io::Result<()> {
    write!(out, "registers: A={}, D={}, PC={}", state.a, state.d, state.pc)?;
    if !state.last_modified.is_empty() {
        let changed: Vec<String> = state.last_modified.iter().map(|m| m.to_string()).collect();
        write!(out, "  (changed: {})", changed.join(", "))?;
    }
    writeln!(out)
}

fn write_help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "commands:")?;
    writeln!(out, "  s, step              execute one instruction")?;
    writeln!(out, "  r, run               run until breakpoint or halt")?;
    writeln!(out, "  b <addr>             set breakpoint")?;
    writeln!(out, "  d <addr>             delete breakpoint")?;
    writeln!(out, "  bc                   clear all breakpoints")?;
    writeln!(out, "  bl                   list breakpoints")?;
    writeln!(out, "  reg                  show registers")?;
    writeln!(out, "  m <addr> [count]     show memory")?;
    writeln!(out, "  set <addr> <value>   write memory")?;
    writeln!(out, "  l, list              show source around PC")?;
    writeln!(out, "  reset                reset the CPU")?;
    writeln!(out, "  config               show configuration")?;
    writeln!(out, "  h, help, ?           show this help")?;
    writeln!(out, "  q, quit, exit        leave the debugger")
}

/// Errors from parsing a command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0} (type h for help)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}
