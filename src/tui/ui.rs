//! UI rendering for the debugger.

use super::app::DebuggerApp;
use crate::cpu::Modified;
use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(frame.area());

    // Left side: source and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(6),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_source(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: memory and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(5)])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_help(frame, right_chunks[1]);
}

/// Draw the source listing with PC, breakpoint and cursor markers.
fn draw_source(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let current = parse_hex_color(&app.view.color_current_instruction).unwrap_or(Color::Yellow);
    let breakpoint = parse_hex_color(&app.view.color_breakpoint).unwrap_or(Color::Red);
    let rows = (area.height as usize).saturating_sub(2);

    let items: Vec<ListItem> = app
        .listing(rows)
        .into_iter()
        .map(|(addr, text, is_pc, is_bp, is_cursor)| {
            let prefix = if is_pc { "▶" } else { " " };
            let bp = if is_bp { "●" } else { " " };
            let cursor = if is_cursor { "›" } else { " " };

            let mut style = if is_pc {
                Style::default().fg(current).add_modifier(Modifier::BOLD)
            } else if is_bp {
                Style::default().fg(breakpoint)
            } else {
                Style::default()
            };
            if is_cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }

            ListItem::new(format!("{}{}{} {:05}: {}", bp, prefix, cursor, addr, text)).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Source ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(list, area);
}

/// Draw registers, highlighting those written by the last step.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let modified = parse_hex_color(&app.view.color_modified_value).unwrap_or(Color::Green);
    let regs = app.debugger.get_registers();
    let style_for = |location: Modified| {
        if app.was_modified(location) {
            Style::default().fg(modified).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        }
    };

    let cpu = app.debugger.cpu();
    let content = vec![
        Line::from(vec![
            Span::raw("A:  "),
            Span::styled(format!("{:>6}", regs.a), style_for(Modified::A)),
            Span::raw(format!("  {:016b}", regs.a as u16)),
        ]),
        Line::from(vec![
            Span::raw("D:  "),
            Span::styled(format!("{:>6}", regs.d), style_for(Modified::D)),
            Span::raw(format!("  {:016b}", regs.d as u16)),
        ]),
        Line::from(vec![
            Span::raw("PC: "),
            Span::styled(format!("{:>6}", regs.pc), style_for(Modified::Pc)),
            Span::raw("   Cycles: "),
            Span::styled(format!("{}", cpu.cycles()), Style::default().fg(Color::Cyan)),
            Span::raw("   State: "),
            Span::styled(
                format!("{:?}", cpu.state()),
                if cpu.is_halted() {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default().fg(Color::Green)
                },
            ),
        ]),
    ];

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)),
    );

    frame.render_widget(paragraph, area);
}

/// Draw memory view.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let modified = parse_hex_color(&app.view.color_modified_value).unwrap_or(Color::Green);
    let visible_rows = (area.height as usize).saturating_sub(2).min(app.ram_rows);
    let start = app.mem_scroll;
    let a_cell = app.debugger.cpu().memory().wrap_address(app.debugger.get_registers().a);

    let items: Vec<ListItem> = app
        .debugger
        .get_ram_range(start as i32, visible_rows)
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            let addr = start + i;
            let text = format!("{:05}: {:>6}", addr, value);

            let style = if app.was_modified(Modified::Memory(addr)) {
                Style::default().fg(modified).add_modifier(Modifier::BOLD)
            } else if addr == a_cell {
                Style::default().fg(Color::Yellow)
            } else if value != 0 {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" RAM ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)),
    );

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default().title(" Status ").borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  r: Run  p: Pause  b: Breakpoint"),
        Line::from("x: Reset  ↑↓: Select line  PgUp/PgDn: RAM"),
        Line::from("q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default().title(" Help ").borders(Borders::ALL));

    frame.render_widget(help, area);
}

/// Parse an `RRGGBB` hex color (optionally prefixed with `#`).
pub fn parse_hex_color(text: &str) -> Option<Color> {
    let hex = text.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;
    Some(Color::Rgb((value >> 16) as u8, (value >> 8) as u8, value as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("FFFF00"), Some(Color::Rgb(255, 255, 0)));
        assert_eq!(parse_hex_color("#90ee90"), Some(Color::Rgb(0x90, 0xEE, 0x90)));
        assert_eq!(parse_hex_color("FFF"), None);
        assert_eq!(parse_hex_color("GGGGGG"), None);
        assert_eq!(parse_hex_color("+FFFFF"), None);
        assert_eq!(parse_hex_color("-00000"), None);
    }
}
