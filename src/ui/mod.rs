//! Rendering: windows are laid out once per frame and each window draws
//! whatever view currently occupies it according to the window manager.

mod diff;
mod popup;
mod side;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthChar;

use crate::App;
use crate::prompt::spinner_frame;

pub fn render(app: &mut App, f: &mut Frame) {
    let area = f.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(app.settings.command_log_height),
            Constraint::Length(1),
        ])
        .split(area);
    let content_area = rows[0];
    let extras_area = rows[1];
    let status_line_area = rows[2];

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(content_area);
    let side_area = columns[0];
    let main_area = columns[1];

    app.main_area = main_area;
    app.main_height = main_area.height.saturating_sub(2);

    let side_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Percentage(30),
            Constraint::Percentage(25),
            Constraint::Percentage(30),
            Constraint::Min(3),
        ])
        .split(side_area);

    side::render_window(app, f, side_rows[0], "status");
    side::render_window(app, f, side_rows[1], "files");
    side::render_window(app, f, side_rows[2], "branches");
    side::render_window(app, f, side_rows[3], "commits");
    side::render_window(app, f, side_rows[4], "stash");

    diff::render_main_window(app, f, main_area);
    render_command_log(app, f, extras_area);
    render_status_line(app, f, status_line_area);

    popup::render_popups(app, f, area);
}

/// Border styling shared by every window: the window driving the active
/// context is highlighted.
pub fn window_block(app: &App, window: &str, title: String) -> Block<'static> {
    let active = app
        .registry
        .by_key(app.windows.active_context())
        .map(|c| c.window == window)
        .unwrap_or(false);

    let border_style = if active {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title)
}

fn render_command_log(app: &App, f: &mut Frame, area: Rect) {
    if area.height == 0 {
        return;
    }
    let block = window_block(app, "extras", " Command log ".to_string());
    let inner_height = area.height.saturating_sub(2) as usize;
    let start = app.command_log.len().saturating_sub(inner_height);
    let lines: Vec<Line> = app.command_log[start..]
        .iter()
        .map(|l| Line::from(Span::styled(l.clone(), Style::default().fg(Color::DarkGray))))
        .collect();
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_line(app: &App, f: &mut Frame, area: Rect) {
    let mut spans: Vec<Span> = Vec::new();

    if let Some(label) = app.waiting {
        spans.push(Span::styled(
            format!(" {} {label}... ", spinner_frame(app.tick)),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    } else if let Some(msg) = &app.status_line {
        spans.push(Span::styled(
            format!(" {msg} "),
            Style::default().fg(Color::Yellow),
        ));
    }

    let branch = if app.status.branch.is_empty() {
        String::new()
    } else {
        format!(" {} \u{2191}{} \u{2193}{} ", app.status.branch, app.status.ahead, app.status.behind)
    };
    spans.push(Span::styled(branch, Style::default().fg(Color::Cyan)));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub fn truncate_to_width(s: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut wsum = 0usize;

    for ch in s.chars() {
        let w = if ch == '\t' {
            4
        } else {
            UnicodeWidthChar::width(ch).unwrap_or(0)
        };
        if wsum + w > width {
            break;
        }
        out.push(ch);
        wsum += w;
        if wsum >= width {
            break;
        }
    }

    out
}
