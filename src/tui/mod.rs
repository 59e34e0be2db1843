//! Terminal UI for the Hack debugger.
//!
//! Provides an interactive terminal-based debugger with:
//! - Source listing with PC, breakpoint and cursor markers
//! - Register and RAM views highlighting the last step's writes
//! - Step/run/breakpoint controls

mod app;
mod ui;

pub use app::{run_debugger, DebuggerApp};
pub use ui::parse_hex_color;
