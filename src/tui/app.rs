//! Debugger application state and logic.

use crate::config::{Config, ViewConfig};
use crate::cpu::Modified;
use crate::debugger::{Debugger, StopReason};

/// Instructions executed per frame while running.
const STEPS_PER_TICK: u64 = 2_000;

/// Debugger application state.
pub struct DebuggerApp {
    /// The debugger being driven.
    pub debugger: Debugger,
    /// Highlight colors.
    pub view: ViewConfig,
    /// Rows in the memory view.
    pub ram_rows: usize,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Steps left in the current run.
    budget: u64,
    /// Step budget for one run.
    max_steps: u64,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset.
    pub mem_scroll: usize,
    /// Selected source line (breakpoint target).
    pub cursor: usize,
}

impl DebuggerApp {
    /// Create a new application around a debugger.
    pub fn new(debugger: Debugger, config: &Config) -> Self {
        Self {
            debugger,
            view: config.view.clone(),
            ram_rows: config.debugger.ram_view_size,
            running: false,
            budget: 0,
            max_steps: config.debugger.max_steps,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            mem_scroll: 0,
            cursor: 0,
        }
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        self.running = false;
        let pc = self.debugger.get_registers().pc;
        let line = self
            .debugger
            .get_current_source_line()
            .unwrap_or("")
            .to_string();

        let (ok, state) = self.debugger.step();
        if ok {
            self.status = format!("PC={:05}: {}", pc, line);
            if let Ok(pc) = usize::try_from(state.pc) {
                self.cursor = pc.min(self.last_line());
            }
        } else {
            self.status = format!("CPU halted after {} cycles", self.debugger.cpu().cycles());
        }
    }

    /// Start continuous execution.
    pub fn run(&mut self) {
        self.running = true;
        self.budget = self.max_steps;
        self.status = "Running...".into();
    }

    /// Stop continuous execution.
    pub fn pause(&mut self) {
        if self.running {
            self.running = false;
            self.status = format!("Paused at PC={}", self.debugger.get_registers().pc);
        }
    }

    /// Run one slice of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        let chunk = self.budget.min(STEPS_PER_TICK);
        let before = self.debugger.cpu().cycles();
        let (reason, state) = self.debugger.run_until_breakpoint(chunk);
        let executed = self.debugger.cpu().cycles().saturating_sub(before);
        self.budget = self.budget.saturating_sub(executed);

        match reason {
            StopReason::MaxSteps if self.budget > 0 => return,
            StopReason::MaxSteps => {
                self.status = format!("Step limit reached ({} steps)", self.max_steps);
            }
            StopReason::Breakpoint => {
                self.status = format!("Breakpoint at PC={}", state.pc);
            }
            StopReason::Halted => {
                self.status = format!("Halted after {} cycles", self.debugger.cpu().cycles());
            }
        }

        self.running = false;
        if let Ok(pc) = usize::try_from(state.pc) {
            self.cursor = pc.min(self.last_line());
        }
    }

    /// Toggle breakpoint at the selected line.
    pub fn toggle_breakpoint(&mut self) {
        let addr = self.cursor as i32;
        if self.debugger.toggle_breakpoint(addr) {
            self.status = format!("Set breakpoint at {}", addr);
        } else if self.debugger.source_lines().is_empty() {
            self.status = "No instructions".into();
        } else {
            self.status = format!("Removed breakpoint at {}", addr);
        }
    }

    /// Reset CPU to initial state.
    pub fn reset(&mut self) {
        self.debugger.reset();
        self.running = false;
        self.cursor = 0;
        self.status = "Reset. Ready.".into();
    }

    /// Move the source cursor.
    pub fn move_cursor(&mut self, delta: isize) {
        self.cursor = self.cursor.saturating_add_signed(delta).min(self.last_line());
    }

    /// Scroll the memory view.
    pub fn scroll_memory(&mut self, delta: isize) {
        let max = self.debugger.cpu().memory().len().saturating_sub(1);
        self.mem_scroll = self.mem_scroll.saturating_add_signed(delta).min(max);
    }

    /// Whether a location was written by the last step.
    pub fn was_modified(&self, location: Modified) -> bool {
        self.debugger.cpu().last_modified().contains(&location)
    }

    /// Source listing window of `rows` lines around the cursor:
    /// `(address, text, is_pc, is_breakpoint, is_cursor)`.
    pub fn listing(&self, rows: usize) -> Vec<(usize, &str, bool, bool, bool)> {
        let lines = self.debugger.source_lines();
        let pc = self.debugger.get_registers().pc_index();
        let start = self.cursor.saturating_sub(rows / 2);

        lines
            .iter()
            .enumerate()
            .skip(start)
            .take(rows)
            .map(|(addr, text)| {
                (
                    addr,
                    text.as_str(),
                    pc == Some(addr),
                    self.debugger.has_breakpoint(addr),
                    addr == self.cursor,
                )
            })
            .collect()
    }

    fn last_line(&self) -> usize {
        self.debugger.source_lines().len().saturating_sub(1)
    }
}

/// Run the debugger in the terminal.
pub fn run_debugger(debugger: Debugger, config: &Config) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(debugger, config);

    // Main loop
    let result = loop {
        if let Err(e) = terminal.draw(|frame| super::ui::draw(frame, &app)) {
            break Err(e);
        }

        match event::poll(Duration::from_millis(30)) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') => app.should_quit = true,
                    KeyCode::Char('s') => app.step(),
                    KeyCode::Char('r') => app.run(),
                    KeyCode::Char('p') => app.pause(),
                    KeyCode::Char('b') => app.toggle_breakpoint(),
                    KeyCode::Char('x') => app.reset(),
                    KeyCode::Up => app.move_cursor(-1),
                    KeyCode::Down => app.move_cursor(1),
                    KeyCode::PageUp => app.scroll_memory(-(app.ram_rows as isize)),
                    KeyCode::PageDown => app.scroll_memory(app.ram_rows as isize),
                    _ => {}
                },
                Ok(_) => {}
                Err(e) => break Err(e),
            },
            Ok(false) => {}
            Err(e) => break Err(e),
        }

        // Tick for continuous running
        app.tick();

        if app.should_quit {
            break Ok(());
        }
    };

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assemble;

    fn app_for(source: &str, max_steps: u64) -> DebuggerApp {
        let mut config = Config::default();
        config.debugger.max_steps = max_steps;
        let program = assemble(source).unwrap();
        let debugger = Debugger::from_program(program, &config.debugger).unwrap();
        DebuggerApp::new(debugger, &config)
    }

    #[test]
    fn test_step_moves_cursor() {
        let mut app = app_for("@1\nD=A\n@2", 100);
        app.step();
        app.step();
        assert_eq!(app.cursor, 2);
        assert!(app.status.contains("D=A"));
        assert!(app.was_modified(Modified::D));
    }

    #[test]
    fn test_run_stops_at_breakpoint() {
        let mut app = app_for("@1\nD=A\n@2\nD=D+A", 100);
        app.move_cursor(2);
        app.toggle_breakpoint();
        app.run();
        app.tick();
        assert!(!app.running);
        assert_eq!(app.status, "Breakpoint at PC=2");
    }

    #[test]
    fn test_run_honors_budget_across_ticks() {
        let mut app = app_for("(LOOP)\n@LOOP\n0;JMP", 5_000);
        app.run();
        for _ in 0..10 {
            app.tick();
        }
        assert!(!app.running);
        assert!(app.status.starts_with("Step limit reached"));
        assert_eq!(app.debugger.cpu().cycles(), 5_000);
    }

    #[test]
    fn test_listing_window() {
        let app = app_for("@1\n@2\n@3", 10);
        let listing = app.listing(2);
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0], (0, "@1", true, false, true));
    }

    #[test]
    fn test_reset_and_scroll() {
        let mut app = app_for("@1\nD=A", 10);
        app.step();
        app.reset();
        assert_eq!(app.cursor, 0);
        assert_eq!(app.debugger.get_registers().pc, 0);

        app.scroll_memory(-5);
        assert_eq!(app.mem_scroll, 0);
        app.scroll_memory(100_000);
        assert_eq!(app.mem_scroll, 24576);
    }
}
