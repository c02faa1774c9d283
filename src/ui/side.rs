//! Side-column windows. Each window asks the window manager which view
//! occupies it right now and draws that view's content.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
};

use crate::App;
use crate::commit::CommitStatus;
use crate::ui::{truncate_to_width, window_block};

pub fn render_window(app: &mut App, f: &mut Frame, area: Rect, window: &str) {
    let view = match app.windows.view_for_window(window) {
        Ok(view) => view.to_string(),
        Err(e) => {
            // a window with no resolvable view is a bug; make it loud
            tracing::error!(window, error = %e, "window has no view");
            return;
        }
    };

    match view.as_str() {
        "status" => render_status(app, f, area),
        "files" => render_files(app, f, area),
        "branches" => render_branches(app, f, area),
        "commits" => render_commits(app, f, area),
        "reflogCommits" => render_reflog(app, f, area),
        "commitFiles" => render_commit_files(app, f, area),
        "stash" => render_stash(app, f, area),
        _ => {}
    }
}

fn render_status(app: &App, f: &mut Frame, area: Rect) {
    let block = window_block(app, "status", " Status ".to_string());
    let text = if app.status.branch.is_empty() {
        "no branch".to_string()
    } else {
        format!(
            "{} \u{2191}{} \u{2193}{}",
            app.status.branch, app.status.ahead, app.status.behind
        )
    };
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn render_files(app: &mut App, f: &mut Frame, area: Rect) {
    let block = window_block(app, "files", format!(" Files ({}) ", app.files_panel.entries.len()));
    let width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = app
        .files_panel
        .entries
        .iter()
        .map(|e| {
            let marker = if e.is_untracked {
                "??".to_string()
            } else {
                format!("{}{}", e.staged_status, e.worktree_status)
            };
            let color = if e.is_untracked {
                Color::Magenta
            } else if e.worktree_status == ' ' {
                Color::Green
            } else {
                Color::Yellow
            };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(color)),
                Span::raw(" "),
                Span::raw(truncate_to_width(&e.path, width)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, area, &mut app.files_panel.list_state);
}

fn render_branches(app: &mut App, f: &mut Frame, area: Rect) {
    let title = if app.branches_panel.filter_edit || !app.branches_panel.query.is_empty() {
        format!(" Branches /{} ", app.branches_panel.query)
    } else {
        " Branches ".to_string()
    };
    let block = window_block(app, "branches", title);
    let width = area.width.saturating_sub(4) as usize;

    let branches = app.session.tables.branches.snapshot();
    let items: Vec<ListItem> = app
        .branches_panel
        .filtered
        .iter()
        .filter_map(|idx| branches.get(*idx))
        .map(|b| {
            let mut spans = Vec::new();
            if b.is_current {
                spans.push(Span::styled("* ", Style::default().fg(Color::Green)));
            } else {
                spans.push(Span::raw("  "));
            }
            let color = if b.is_remote {
                Color::Red
            } else {
                Color::default()
            };
            spans.push(Span::styled(
                truncate_to_width(&b.name, width),
                Style::default().fg(color),
            ));
            if let Some(track) = &b.track {
                spans.push(Span::styled(
                    format!(" {track}"),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, area, &mut app.branches_panel.list_state);
}

fn render_commits(app: &mut App, f: &mut Frame, area: Rect) {
    let commits = app.session.tables.commits.snapshot();
    let block = window_block(app, "commits", format!(" Commits ({}) ", commits.len()));
    let width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = commits
        .iter()
        .map(|c| {
            let mut spans = vec![Span::styled(
                format!("{} ", c.short_sha()),
                Style::default().fg(Color::Yellow),
            )];
            match c.status {
                CommitStatus::RebasingPending => {
                    let action = c.action.map(|a| a.as_str()).unwrap_or("pick");
                    spans.push(Span::styled(
                        format!("{action:>6} "),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ));
                }
                CommitStatus::RebasingDone => {
                    spans.push(Span::styled(
                        "  done ",
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                CommitStatus::Normal => {}
            }
            if !c.decoration.is_empty() {
                spans.push(Span::styled(
                    format!("{} ", c.decoration),
                    Style::default().fg(Color::Magenta),
                ));
            }
            spans.push(Span::raw(truncate_to_width(&c.subject, width)));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, area, &mut app.commits_panel.list_state);
}

fn render_reflog(app: &mut App, f: &mut Frame, area: Rect) {
    let entries = app.session.tables.reflog.snapshot();
    let block = window_block(app, "commits", format!(" Reflog ({}) ", entries.len()));
    let width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = entries
        .iter()
        .map(|e| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} ", &e.sha[..e.sha.len().min(8)]),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(truncate_to_width(&e.subject, width)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, area, &mut app.reflog_list);
}

fn render_commit_files(app: &mut App, f: &mut Frame, area: Rect) {
    let Some(short) = app
        .commit_files
        .as_ref()
        .map(|p| p.ref_name.chars().take(8).collect::<String>())
    else {
        return;
    };
    let block = window_block(app, "commits", format!(" Files of {short} "));
    let width = area.width.saturating_sub(6) as usize;
    let Some(panel) = app.commit_files.as_mut() else {
        return;
    };

    let items: Vec<ListItem> = panel
        .files
        .iter()
        .map(|file| {
            let color = match file.status.chars().next().unwrap_or(' ') {
                'A' => Color::Green,
                'D' => Color::Red,
                _ => Color::Yellow,
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:>2} ", file.status), Style::default().fg(color)),
                Span::raw(truncate_to_width(&file.path, width)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, area, &mut panel.list_state);
}

fn render_stash(app: &mut App, f: &mut Frame, area: Rect) {
    let block = window_block(app, "stash", format!(" Stash ({}) ", app.stash_entries.len()));
    let width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = app
        .stash_entries
        .iter()
        .map(|e| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} ", e.selector),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(truncate_to_width(&e.subject, width)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, area, &mut app.stash_list);
}
