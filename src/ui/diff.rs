//! Main window: either the line-by-line panel (staging / patch building) or
//! plain commit/diff text.

use ratatui::{
    Frame,
    layout::Rect,
    text::Text,
    widgets::Paragraph,
};

use crate::ui::window_block;
use crate::{App, PatchKind};

pub fn render_main_window(app: &mut App, f: &mut Frame, area: Rect) {
    let view = app
        .windows
        .view_for_window("main")
        .unwrap_or("normal")
        .to_string();

    match view.as_str() {
        "staging" | "patchBuilding" => render_patch_panel(app, f, area),
        _ => render_normal(app, f, area),
    }
}

fn render_patch_panel(app: &mut App, f: &mut Frame, area: Rect) {
    let height = area.height.saturating_sub(2) as usize;

    let Some(panel) = app.patch_panel.as_mut() else {
        // the window claims a line-by-line view but no panel is open: render
        // the placeholder rather than stale content
        let block = window_block(app, "main", " Diff ".to_string());
        f.render_widget(Paragraph::new("no content").block(block), area);
        return;
    };

    // deterministic scroll-follow: origin moves only as far as needed
    panel.origin = panel.state.calculate_origin(panel.origin, height);
    let origin = panel.origin;

    let (title, included) = match &panel.kind {
        PatchKind::Staging { path } => (format!(" Staging {path} "), None),
        PatchKind::PatchBuilding { path, .. } => (
            format!(" Building patch from {path} "),
            Some(panel.included.as_slice()),
        ),
    };

    let full = panel.state.render(included);
    let visible: Vec<_> = full
        .lines
        .into_iter()
        .skip(origin)
        .take(height)
        .collect();

    let block = window_block(app, "main", title);
    f.render_widget(Paragraph::new(Text::from(visible)).block(block), area);
}

fn render_normal(app: &mut App, f: &mut Frame, area: Rect) {
    let title = match &app.shown_sha {
        Some(sha) => format!(" Patch {} ", &sha[..sha.len().min(8)]),
        None => " Diff ".to_string(),
    };
    let block = window_block(app, "main", title);

    let text = if app.main_text.is_empty() {
        "nothing to show"
    } else {
        app.main_text.as_str()
    };
    f.render_widget(
        Paragraph::new(text)
            .block(block)
            .scroll((app.main_scroll, 0)),
        area,
    );
}
