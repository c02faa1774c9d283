//! Centered modal popups: confirmation, free-text input, commit message.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::App;

pub fn render_popups(app: &mut App, f: &mut Frame, area: Rect) {
    if let Some(confirm) = &app.confirm {
        let rect = centered_rect(area, 50, 20);
        f.render_widget(Clear, rect);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(format!(" {} ", confirm.title));
        let text = vec![
            Line::from(confirm.prompt.clone()),
            Line::from(""),
            Line::from(Span::styled(
                "y/enter: confirm   n/esc: cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        f.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }).block(block), rect);
    }

    if let Some(input) = &app.input {
        let rect = centered_rect(area, 50, 15);
        f.render_widget(Clear, rect);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", input.title));
        let text = vec![
            Line::from(vec![
                Span::raw(input.text.clone()),
                Span::styled("\u{2588}", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "enter: confirm   esc: cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        f.render_widget(Paragraph::new(text).block(block), rect);
    }

    if app.message_open {
        let rect = centered_rect(area, 60, 35);
        f.render_widget(Clear, rect);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .title(" Commit message ");

        let inner_height = rect.height.saturating_sub(3) as usize;
        app.message.ensure_cursor_visible(inner_height);
        let (cursor_line, cursor_col) = app.message.cursor_line_col();

        let mut lines: Vec<Line> = app
            .message
            .text
            .split('\n')
            .enumerate()
            .skip(app.message.scroll_y as usize)
            .take(inner_height)
            .map(|(i, l)| {
                if i == cursor_line {
                    // crude cursor: highlight the char under it
                    let (before, rest) = split_at_char(l, cursor_col);
                    let (at, after) = split_at_char(rest, 1);
                    let at = if at.is_empty() { " " } else { at };
                    Line::from(vec![
                        Span::raw(before.to_string()),
                        Span::styled(at.to_string(), Style::default().add_modifier(Modifier::REVERSED)),
                        Span::raw(after.to_string()),
                    ])
                } else {
                    Line::from(l.to_string())
                }
            })
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "enter: commit   alt-enter: newline   esc: cancel",
            Style::default().fg(Color::DarkGray),
        )));

        f.render_widget(Paragraph::new(lines).block(block), rect);
    }
}

fn split_at_char(s: &str, char_idx: usize) -> (&str, &str) {
    let byte = s
        .char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s.split_at(byte)
}

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let width = area.width * percent_x / 100;
    let height = (area.height * percent_y / 100).max(5);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
