//! Event handling: keyboard and mouse input routed through the active
//! context.
//!
//! The window manager resolves which context owns the input; each context's
//! handler mutates panel state, drives the patch engine, or hands commit
//! actions to the mid-rebase orchestrator and falls through to real git
//! operations when the orchestrator declines.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::commit::CommitStatus;
use crate::context::{
    BRANCHES_CONTEXT, COMMITS_CONTEXT, COMMIT_FILES_CONTEXT, CONFIRMATION_CONTEXT, ContextKey,
    FILES_CONTEXT, PATCH_BUILDING_CONTEXT, REFLOG_CONTEXT, STAGING_CONTEXT, STASH_CONTEXT,
    STATUS_CONTEXT,
};
use crate::errors::AppError;
use crate::git_ops;
use crate::patch::PatchState;
use crate::prompt::{ConfirmAction, ConfirmPrompt, InputAction, InputPrompt};
use crate::rebase::{self, MidRebaseOutcome, MoveOutcome, TodoAction};
use crate::{App, GitJob, PatchKind, PatchPanel};

/// Result of handling a key event.
#[derive(PartialEq, Eq)]
pub enum KeyEventResult {
    Continue,
    Quit,
}

const SIDE_CONTEXTS: [ContextKey; 5] = [
    STATUS_CONTEXT,
    FILES_CONTEXT,
    BRANCHES_CONTEXT,
    COMMITS_CONTEXT,
    STASH_CONTEXT,
];

pub fn handle_key_event(app: &mut App, key: KeyEvent) -> KeyEventResult {
    // a waiting status blocks input until the operation finishes
    if app.waiting.is_some() {
        return KeyEventResult::Continue;
    }

    if app.confirm.is_some() {
        handle_confirm_key(app, key);
        return KeyEventResult::Continue;
    }
    if app.input.is_some() {
        handle_input_key(app, key);
        return KeyEventResult::Continue;
    }
    if app.message_open {
        handle_message_key(app, key);
        return KeyEventResult::Continue;
    }

    match key.code {
        KeyCode::Char('q') if !app.branches_panel.filter_edit => return KeyEventResult::Quit,
        KeyCode::Esc => handle_escape(app),
        KeyCode::Char(ch @ '1'..='5')
            if !app.branches_panel.filter_edit && !in_main_context(app) =>
        {
            let idx = (ch as u8 - b'1') as usize;
            app.focus_context(SIDE_CONTEXTS[idx]);
        }
        KeyCode::Tab if !in_main_context(app) => {
            let current = app.windows.active_context();
            let pos = SIDE_CONTEXTS.iter().position(|k| *k == current).unwrap_or(0);
            app.focus_context(SIDE_CONTEXTS[(pos + 1) % SIDE_CONTEXTS.len()]);
        }
        KeyCode::Char('R') if !app.branches_panel.filter_edit => {
            app.refresh_status();
            app.refresh_files();
            app.refresh_stash();
            app.refresher
                .spawn_commits_and_branches(app.commits_panel.limit_commits);
            app.set_status("refreshing");
        }
        KeyCode::Char('P') if !app.branches_panel.filter_edit => {
            app.confirm = Some(ConfirmPrompt::new(
                "Push",
                "Push current branch to its upstream?",
                ConfirmAction::Push,
            ));
        }
        _ => handle_context_key(app, key),
    }

    KeyEventResult::Continue
}

fn in_main_context(app: &App) -> bool {
    matches!(
        app.windows.active_context(),
        STAGING_CONTEXT | PATCH_BUILDING_CONTEXT
    )
}

fn handle_escape(app: &mut App) {
    match app.windows.active_context() {
        STAGING_CONTEXT => app.focus_context(FILES_CONTEXT),
        PATCH_BUILDING_CONTEXT => app.focus_context(COMMIT_FILES_CONTEXT),
        COMMIT_FILES_CONTEXT => {
            app.commit_files = None;
            app.focus_context(COMMITS_CONTEXT);
        }
        BRANCHES_CONTEXT if app.branches_panel.filter_edit || !app.branches_panel.query.is_empty() =>
        {
            app.branches_panel.filter_edit = false;
            app.branches_panel.query.clear();
            let branches = app.session.tables.branches.snapshot();
            app.branches_panel.update_filtered(&branches);
        }
        _ => {
            app.status_line = None;
        }
    }
}

fn handle_context_key(app: &mut App, key: KeyEvent) {
    match app.windows.active_context() {
        FILES_CONTEXT => handle_files_key(app, key),
        BRANCHES_CONTEXT => handle_branches_key(app, key),
        COMMITS_CONTEXT => handle_commits_key(app, key),
        REFLOG_CONTEXT => handle_reflog_key(app, key),
        COMMIT_FILES_CONTEXT => handle_commit_files_key(app, key),
        STASH_CONTEXT => handle_stash_key(app, key),
        STAGING_CONTEXT | PATCH_BUILDING_CONTEXT => handle_patch_key(app, key),
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// files panel

fn handle_files_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.files_panel.move_selection(1);
            show_file_diff(app);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.files_panel.move_selection(-1);
            show_file_diff(app);
        }
        KeyCode::Char(' ') => {
            let Some(entry) = app.files_panel.selected_entry().cloned() else {
                return;
            };
            let staged_only = entry.worktree_status == ' ' && !entry.is_untracked;
            if staged_only {
                app.start_job("unstaging file", GitJob::UnstagePath { path: entry.path });
            } else {
                app.start_job("staging file", GitJob::StagePath { path: entry.path });
            }
        }
        KeyCode::Enter => open_staging_panel(app),
        KeyCode::Char('c') => {
            app.message_open = true;
            app.focus_context(crate::context::COMMIT_MESSAGE_CONTEXT);
        }
        _ => {}
    }
}

fn show_file_diff(app: &mut App) {
    let Some(entry) = app.files_panel.selected_entry().cloned() else {
        app.main_text.clear();
        return;
    };
    app.shown_sha = None;
    app.main_scroll = 0;
    if entry.is_untracked {
        app.main_text = format!("untracked file: {}", entry.path);
        return;
    }
    let staged_only = entry.worktree_status == ' ';
    let result = git_ops::diff_path(&app.session.repo_root, &entry.path, staged_only);
    if let Some(diff) = app.surface(result) {
        app.main_text = diff;
    }
}

/// Enter line-by-line staging for the selected file. An empty diff is a
/// sentinel "no content": the panel is treated as empty and focus stays put.
fn open_staging_panel(app: &mut App) {
    let Some(entry) = app.files_panel.selected_entry().cloned() else {
        return;
    };
    if entry.is_untracked {
        let _ = app.surface::<()>(Err(AppError::Validation(
            "stage the whole file first to pick lines of an untracked file".to_string(),
        )));
        return;
    }

    let result = git_ops::diff_path(&app.session.repo_root, &entry.path, false);
    let Some(diff) = app.surface(result) else {
        return;
    };

    let old = app.patch_panel.as_ref().and_then(|p| match &p.kind {
        PatchKind::Staging { path } if *path == entry.path => Some(&p.state),
        _ => None,
    });
    match PatchState::new(&diff, None, old) {
        Some(state) => {
            app.patch_panel = Some(PatchPanel {
                kind: PatchKind::Staging { path: entry.path },
                state,
                origin: 0,
                included: Vec::new(),
            });
            app.focus_context(STAGING_CONTEXT);
        }
        None => {
            let _ = app.surface::<()>(Err(AppError::EmptyState("no unstaged changes in file")));
        }
    }
}

// ---------------------------------------------------------------------------
// branches panel

fn handle_branches_key(app: &mut App, key: KeyEvent) {
    if app.branches_panel.filter_edit {
        match key.code {
            KeyCode::Enter => app.branches_panel.filter_edit = false,
            KeyCode::Backspace => {
                app.branches_panel.query.pop();
                let branches = app.session.tables.branches.snapshot();
                app.branches_panel.update_filtered(&branches);
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                app.branches_panel.query.push(ch);
                let branches = app.session.tables.branches.snapshot();
                app.branches_panel.update_filtered(&branches);
            }
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('/') => app.branches_panel.filter_edit = true,
        KeyCode::Char('j') | KeyCode::Down => app.branches_panel.move_selection(1),
        KeyCode::Char('k') | KeyCode::Up => app.branches_panel.move_selection(-1),
        KeyCode::Char('f') => app.start_job("fetching", GitJob::Fetch),
        KeyCode::Enter => {
            let branches = app.session.tables.branches.snapshot();
            let Some(idx) = app.branches_panel.selected_branch_idx() else {
                return;
            };
            let Some(branch) = branches.get(idx) else {
                return;
            };
            if branch.is_current {
                app.set_status("already on this branch");
                return;
            }
            app.confirm = Some(ConfirmPrompt::new(
                "Checkout",
                format!("Checkout branch {}?", branch.name),
                ConfirmAction::Checkout {
                    rev: branch.name.clone(),
                },
            ));
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// commits panel

fn handle_commits_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => move_commit_selection(app, 1),
        KeyCode::Char('k') | KeyCode::Up => move_commit_selection(app, -1),
        KeyCode::PageDown => move_commit_selection(app, 10),
        KeyCode::PageUp => move_commit_selection(app, -10),
        KeyCode::Char('G') | KeyCode::End => {
            // jumping to the bottom needs the full list loaded
            if app.commits_panel.limit_commits {
                app.commits_panel.limit_commits = false;
                app.refresher.spawn_commits_and_branches(false);
            }
            let len = app.session.tables.commits.with_state(|c| c.len());
            move_commit_selection(app, len as i64);
        }
        KeyCode::Char('s') => mid_rebase_or_confirm(
            app,
            TodoAction::Squash,
            "Squash",
            "Are you sure you want to squash this commit into the commit below?",
        ),
        KeyCode::Char('f') => mid_rebase_or_confirm(
            app,
            TodoAction::Fixup,
            "Fixup",
            "Are you sure you want to 'fixup' this commit? It will be merged into the commit below",
        ),
        KeyCode::Char('d') => mid_rebase_or_confirm(
            app,
            TodoAction::Drop,
            "Delete commit",
            "Are you sure you want to delete this commit?",
        ),
        KeyCode::Char('e') => mid_rebase_or_confirm(
            app,
            TodoAction::Edit,
            "Edit commit",
            "Pause the rebase at this commit for editing?",
        ),
        KeyCode::Char('r') => handle_reword(app),
        KeyCode::Char('p') => handle_pick(app),
        KeyCode::Char('J') => handle_move(app, true),
        KeyCode::Char('K') => handle_move(app, false),
        KeyCode::Char('A') => {
            let Some(commit) = app.selected_commit() else {
                return;
            };
            app.confirm = Some(ConfirmPrompt::new(
                "Amend commit",
                format!(
                    "Amend commit {} with your staged changes?",
                    commit.short_sha()
                ),
                ConfirmAction::AmendTo { sha: commit.sha },
            ));
        }
        KeyCode::Char('t') => {
            let Some(commit) = app.selected_commit() else {
                return;
            };
            app.input = Some(InputPrompt::new(
                "Tag name",
                "",
                InputAction::TagCommit { sha: commit.sha },
            ));
        }
        KeyCode::Char('v') => {
            let Some(commit) = app.selected_commit() else {
                return;
            };
            if commit.is_merge() {
                let _ = app.surface::<()>(Err(AppError::Validation(
                    "reverting a merge commit requires choosing a parent; not supported here"
                        .to_string(),
                )));
                return;
            }
            app.confirm = Some(ConfirmPrompt::new(
                "Revert commit",
                format!("Revert commit {}?", commit.short_sha()),
                ConfirmAction::Revert { sha: commit.sha },
            ));
        }
        KeyCode::Char(' ') => {
            let Some(commit) = app.selected_commit() else {
                return;
            };
            app.confirm = Some(ConfirmPrompt::new(
                "Checkout commit",
                format!("Checkout commit {}? This detaches HEAD", commit.short_sha()),
                ConfirmAction::Checkout { rev: commit.sha },
            ));
        }
        KeyCode::Enter => {
            let Some(commit) = app.selected_commit() else {
                return;
            };
            app.load_commit_files(commit.ref_name().to_string());
            if app.commit_files.is_some() {
                app.focus_context(COMMIT_FILES_CONTEXT);
            }
        }
        // the commits window has a reflog tab
        KeyCode::Char(']') | KeyCode::Char('[') => app.focus_context(REFLOG_CONTEXT),
        KeyCode::Char('C') => app.start_job("continuing rebase", GitJob::RebaseContinue),
        KeyCode::Char('S') => app.start_job("skipping rebase commit", GitJob::RebaseSkip),
        KeyCode::Char('X') => {
            app.confirm = Some(ConfirmPrompt::new(
                "Abort rebase",
                "Abort the in-flight rebase and return to the original branch?",
                ConfirmAction::RebaseAbort,
            ));
        }
        _ => {}
    }
}

fn move_commit_selection(app: &mut App, delta: i64) {
    let len = app.session.tables.commits.with_state(|c| c.len());
    app.commits_panel.move_selection(delta, len);

    let idx = app.commits_panel.selected_idx();
    if app.commits_panel.wants_more(idx) {
        app.commits_panel.limit_commits = false;
        app.refresher.spawn_commits_and_branches(false);
    }

    if let Some(commit) = app.selected_commit() {
        app.request_show(commit.sha);
    }
}

/// Route an action through the mid-rebase orchestrator; when the selected
/// commit is not a pending rebase entry, fall through to confirming a fresh
/// interactive rebase.
fn mid_rebase_or_confirm(app: &mut App, action: TodoAction, title: &'static str, prompt: &str) {
    let commits = app.commits_snapshot();
    if commits.len() <= 1 {
        let _ = app.surface::<()>(Err(AppError::EmptyState("not enough commits")));
        return;
    }
    let selected = app.commits_panel.selected_idx();

    match try_mid_rebase(app, &commits, selected, action) {
        Some(MidRebaseOutcome::Applied) => {}
        Some(MidRebaseOutcome::NotApplicable) => {
            let action = match action {
                TodoAction::Squash => ConfirmAction::Squash { index: selected },
                TodoAction::Fixup => ConfirmAction::Fixup { index: selected },
                TodoAction::Drop => ConfirmAction::Drop { index: selected },
                _ => ConfirmAction::Edit { index: selected },
            };
            app.confirm = Some(ConfirmPrompt::new(title, prompt.to_string(), action));
        }
        None => {}
    }
}

/// Run the orchestrator against the plan file, refreshing the merged commit
/// list on success. Returns `None` when an error was surfaced.
fn try_mid_rebase(
    app: &mut App,
    commits: &[crate::commit::Commit],
    selected: usize,
    action: TodoAction,
) -> Option<MidRebaseOutcome> {
    let pending = commits
        .get(selected)
        .is_some_and(|c| c.status == CommitStatus::RebasingPending);
    if !pending {
        return Some(MidRebaseOutcome::NotApplicable);
    }

    let mut editor = match app.plan_editor() {
        Ok(editor) => editor,
        Err(e) => {
            let _ = app.surface::<()>(Err(e));
            return None;
        }
    };

    let result = rebase::handle_mid_rebase(&mut editor, commits, selected, action);
    match result {
        Ok(MidRebaseOutcome::Applied) => {
            app.log_command(format!("update rebase plan: {}", action.as_str()));
            let refresh = app.refresher.refresh_rebase_commits();
            let _ = app.surface(refresh);
            Some(MidRebaseOutcome::Applied)
        }
        Ok(MidRebaseOutcome::NotApplicable) => Some(MidRebaseOutcome::NotApplicable),
        Err(e) => {
            let _ = app.surface::<()>(Err(e));
            None
        }
    }
}

fn handle_reword(app: &mut App) {
    let commits = app.commits_snapshot();
    let selected = app.commits_panel.selected_idx();
    let Some(commit) = commits.get(selected) else {
        return;
    };

    // reword on a pending plan entry is explicitly unsupported
    if commit.status == CommitStatus::RebasingPending {
        let mut editor = match app.plan_editor() {
            Ok(editor) => editor,
            Err(e) => {
                let _ = app.surface::<()>(Err(e));
                return;
            }
        };
        let result = rebase::handle_mid_rebase(&mut editor, &commits, selected, TodoAction::Reword);
        let _ = app.surface(result);
        return;
    }

    if selected != 0 {
        let _ = app.surface::<()>(Err(AppError::Validation(
            "only the top commit can be reworded in place".to_string(),
        )));
        return;
    }

    let result = git_ops::get_commit_message(&app.session.repo_root, &commit.sha);
    if let Some(message) = app.surface(result) {
        app.input = Some(InputPrompt::new(
            "Reword commit",
            message,
            InputAction::RewordTopCommit,
        ));
    }
}

/// Pick only means something while rebasing; otherwise it falls through to
/// pull.
fn handle_pick(app: &mut App) {
    let commits = app.commits_snapshot();
    let selected = app.commits_panel.selected_idx();

    match try_mid_rebase(app, &commits, selected, TodoAction::Pick) {
        Some(MidRebaseOutcome::Applied) => {}
        Some(MidRebaseOutcome::NotApplicable) => {
            app.confirm = Some(ConfirmPrompt::new(
                "Pull",
                "Pull changes from the remote (rebase)?",
                ConfirmAction::Pull,
            ));
        }
        None => {}
    }
}

fn handle_move(app: &mut App, down: bool) {
    let commits = app.commits_snapshot();
    let selected = app.commits_panel.selected_idx();
    let Some(commit) = commits.get(selected) else {
        return;
    };

    if commit.status == CommitStatus::RebasingPending {
        let mut editor = match app.plan_editor() {
            Ok(editor) => editor,
            Err(e) => {
                let _ = app.surface::<()>(Err(e));
                return;
            }
        };
        let result = rebase::handle_mid_rebase_move(&mut editor, &commits, selected, down);
        match app.surface(result) {
            Some(MoveOutcome::Moved) => {
                app.log_command(if down {
                    "move rebase plan entry down"
                } else {
                    "move rebase plan entry up"
                });
                let len = commits.len();
                app.commits_panel
                    .move_selection(if down { 1 } else { -1 }, len);
                let refresh = app.refresher.refresh_rebase_commits();
                let _ = app.surface(refresh);
            }
            // blocked moves leave plan and selection unchanged
            Some(MoveOutcome::Blocked) | Some(MoveOutcome::NotApplicable) | None => {}
        }
        return;
    }

    app.confirm = Some(ConfirmPrompt::new(
        if down { "Move down" } else { "Move up" },
        format!(
            "Move commit {} {}?",
            commit.short_sha(),
            if down { "down" } else { "up" }
        ),
        ConfirmAction::MoveCommit {
            index: selected,
            down,
        },
    ));
}

// ---------------------------------------------------------------------------
// reflog panel

fn handle_reflog_key(app: &mut App, key: KeyEvent) {
    let len = app.session.tables.reflog.with_state(|r| r.len());
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => move_reflog_selection(app, 1, len),
        KeyCode::Char('k') | KeyCode::Up => move_reflog_selection(app, -1, len),
        KeyCode::Char(']') | KeyCode::Char('[') => app.focus_context(COMMITS_CONTEXT),
        KeyCode::Enter => {
            if let Some(sha) = selected_reflog_sha(app) {
                app.request_show(sha);
            }
        }
        _ => {}
    }
}

fn move_reflog_selection(app: &mut App, delta: i64, len: usize) {
    if len == 0 {
        app.reflog_list.select(None);
        return;
    }
    let cur = app.reflog_list.selected().unwrap_or(0) as i64;
    let next = (cur + delta).clamp(0, len as i64 - 1) as usize;
    app.reflog_list.select(Some(next));
    if let Some(sha) = selected_reflog_sha(app) {
        app.request_show(sha);
    }
}

fn selected_reflog_sha(app: &App) -> Option<String> {
    let idx = app.reflog_list.selected()?;
    app.session
        .tables
        .reflog
        .with_state(|r| r.get(idx).map(|e| e.sha.clone()))
}

// ---------------------------------------------------------------------------
// commit files panel

fn handle_commit_files_key(app: &mut App, key: KeyEvent) {
    let Some(panel) = app.commit_files.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            let len = panel.files.len();
            if len > 0 {
                let cur = panel.list_state.selected().unwrap_or(0);
                panel.list_state.select(Some((cur + 1).min(len - 1)));
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            let cur = panel.list_state.selected().unwrap_or(0);
            panel.list_state.select(Some(cur.saturating_sub(1)));
        }
        KeyCode::Enter => open_patch_building_panel(app),
        _ => {}
    }
}

/// Enter the patch-building panel for the selected file of the commit.
fn open_patch_building_panel(app: &mut App) {
    let Some(panel) = app.commit_files.as_ref() else {
        return;
    };
    let Some(idx) = panel.list_state.selected() else {
        return;
    };
    let Some(file) = panel.files.get(idx) else {
        return;
    };
    let sha = panel.ref_name.clone();
    let path = file.path.clone();

    let result = git_ops::show_commit_file_diff(&app.session.repo_root, &sha, &path);
    let Some(diff) = app.surface(result) else {
        return;
    };

    match PatchState::new(&diff, None, None) {
        Some(state) => {
            app.patch_panel = Some(PatchPanel {
                kind: PatchKind::PatchBuilding { sha, path },
                state,
                origin: 0,
                included: Vec::new(),
            });
            app.focus_context(PATCH_BUILDING_CONTEXT);
        }
        None => {
            let _ = app.surface::<()>(Err(AppError::EmptyState(
                "no changes in this file for the commit",
            )));
        }
    }
}

// ---------------------------------------------------------------------------
// stash panel

fn handle_stash_key(app: &mut App, key: KeyEvent) {
    let len = app.stash_entries.len();
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            if len > 0 {
                let cur = app.stash_list.selected().unwrap_or(0);
                app.stash_list.select(Some((cur + 1).min(len - 1)));
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            let cur = app.stash_list.selected().unwrap_or(0);
            app.stash_list.select(Some(cur.saturating_sub(1)));
        }
        KeyCode::Char(' ') | KeyCode::Enter => {
            if let Some(entry) = selected_stash(app) {
                app.confirm = Some(ConfirmPrompt::new(
                    "Apply stash",
                    format!("Apply {}?", entry),
                    ConfirmAction::StashApply { selector: entry },
                ));
            }
        }
        KeyCode::Char('d') => {
            if let Some(entry) = selected_stash(app) {
                app.confirm = Some(ConfirmPrompt::new(
                    "Drop stash",
                    format!("Drop {}? This cannot be undone", entry),
                    ConfirmAction::StashDrop { selector: entry },
                ));
            }
        }
        _ => {}
    }
}

fn selected_stash(app: &App) -> Option<String> {
    let idx = app.stash_list.selected()?;
    app.stash_entries.get(idx).map(|e| e.selector.clone())
}

// ---------------------------------------------------------------------------
// line-by-line panels (staging and patch building)

fn handle_patch_key(app: &mut App, key: KeyEvent) {
    let page = app.main_height.saturating_sub(2).max(1) as i64;
    let Some(panel) = app.patch_panel.as_mut() else {
        return;
    };

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => panel.state.cycle_selection(true),
        KeyCode::Char('k') | KeyCode::Up => panel.state.cycle_selection(false),
        KeyCode::Char('l') | KeyCode::Right => panel.state.cycle_hunk(true),
        KeyCode::Char('h') | KeyCode::Left => panel.state.cycle_hunk(false),
        KeyCode::Char('v') => panel.state.toggle_select_range(),
        KeyCode::Char('a') => panel.state.toggle_select_hunk(),
        KeyCode::PageDown => panel.state.adjust_selected_line_idx(page),
        KeyCode::PageUp => panel.state.adjust_selected_line_idx(-page),
        KeyCode::Char('g') | KeyCode::Home => panel.state.select_top(),
        KeyCode::Char('G') | KeyCode::End => panel.state.select_bottom(),
        KeyCode::Char(' ') => apply_patch_selection(app),
        _ => {}
    }
}

/// Space on a selection: stage the selected lines (staging panel) or toggle
/// them in the custom patch (patch building).
fn apply_patch_selection(app: &mut App) {
    let Some(panel) = app.patch_panel.as_mut() else {
        return;
    };

    if matches!(panel.kind, PatchKind::Staging { .. }) {
        let patch = panel.state.modified_patch_for_selection();
        match patch {
            Some(patch) => app.start_job("staging selection", GitJob::ApplyPatch {
                patch,
                reverse: false,
            }),
            None => {
                let _ = app.surface::<()>(Err(AppError::EmptyState(
                    "selection contains no stageable lines",
                )));
            }
        }
        return;
    }

    let (lo, hi) = panel.state.selected_range();
    let change_lines: Vec<usize> = (lo..=hi)
        .filter(|idx| panel.state.lines()[*idx].is_change())
        .collect();
    if change_lines.is_empty() {
        let _ = app.surface::<()>(Err(AppError::EmptyState(
            "selection contains no change lines",
        )));
        return;
    }

    let all_included = change_lines.iter().all(|i| panel.included.contains(i));
    if all_included {
        panel.included.retain(|i| !change_lines.contains(i));
    } else {
        for idx in change_lines {
            if !panel.included.contains(&idx) {
                panel.included.push(idx);
            }
        }
    }
    let count = panel.included.len();
    app.set_status(format!("custom patch: {count} lines included"));
}

// ---------------------------------------------------------------------------
// popups

fn handle_confirm_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            if let Some(prompt) = app.confirm.take() {
                dispatch_confirm(app, prompt.action);
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            // never run the action on cancel
            app.confirm = None;
        }
        _ => {}
    }
}

fn dispatch_confirm(app: &mut App, action: ConfirmAction) {
    match action {
        ConfirmAction::Squash { index } => app.start_job("squashing", GitJob::InteractiveRebase {
            index,
            action: TodoAction::Squash,
        }),
        ConfirmAction::Fixup { index } => app.start_job("fixing up", GitJob::InteractiveRebase {
            index,
            action: TodoAction::Fixup,
        }),
        ConfirmAction::Drop { index } => app.start_job("deleting", GitJob::InteractiveRebase {
            index,
            action: TodoAction::Drop,
        }),
        ConfirmAction::Edit { index } => app.start_job("rebasing", GitJob::InteractiveRebase {
            index,
            action: TodoAction::Edit,
        }),
        ConfirmAction::MoveCommit { index, down } => app.start_job_with_delta(
            "moving",
            GitJob::MoveCommit { index, down },
            if down { 1 } else { -1 },
        ),
        ConfirmAction::Revert { sha } => app.start_job("reverting", GitJob::Revert { sha }),
        ConfirmAction::Checkout { rev } => app.start_job("checking out", GitJob::Checkout { rev }),
        ConfirmAction::AmendTo { sha } => app.start_job("amending", GitJob::AmendTo { sha }),
        ConfirmAction::Pull => app.start_job("pulling", GitJob::Pull),
        ConfirmAction::Push => app.start_job("pushing", GitJob::Push),
        ConfirmAction::RebaseAbort => app.start_job("aborting rebase", GitJob::RebaseAbort),
        ConfirmAction::StashApply { selector } => {
            app.start_job("applying stash", GitJob::StashApply { selector });
        }
        ConfirmAction::StashDrop { selector } => {
            app.start_job("dropping stash", GitJob::StashDrop { selector });
        }
    }
}

fn handle_input_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input = None;
        }
        KeyCode::Enter => {
            if let Some(prompt) = app.input.take() {
                let text = prompt.text.trim().to_string();
                if text.is_empty() {
                    let _ = app.surface::<()>(Err(AppError::Validation(
                        "nothing entered".to_string(),
                    )));
                    return;
                }
                match prompt.action {
                    InputAction::TagCommit { sha } => {
                        app.start_job("tagging", GitJob::Tag { name: text, sha });
                    }
                    InputAction::RewordTopCommit => {
                        app.start_job("rewording", GitJob::RewordTop { message: text });
                    }
                }
            }
        }
        KeyCode::Backspace => {
            if let Some(prompt) = app.input.as_mut() {
                prompt.text.pop();
            }
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(prompt) = app.input.as_mut() {
                prompt.text.push(ch);
            }
        }
        _ => {}
    }
}

fn handle_message_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.message_open = false;
            app.focus_context(FILES_CONTEXT);
        }
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
            app.message.insert_char('\n');
        }
        KeyCode::Enter => {
            let message = app.message.text.clone();
            app.message_open = false;
            app.message.clear();
            app.focus_context(FILES_CONTEXT);
            app.start_job("committing", GitJob::CommitChanges { message });
        }
        KeyCode::Backspace => app.message.backspace(),
        KeyCode::Left => app.message.move_left(),
        KeyCode::Right => app.message.move_right(),
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.message.insert_char(ch);
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// mouse

pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    if app.waiting.is_some() || app.confirm.is_some() || app.input.is_some() || app.message_open {
        return;
    }

    let in_main = app.main_area.contains(ratatui::layout::Position {
        x: mouse.column,
        y: mouse.row,
    });

    match mouse.kind {
        MouseEventKind::ScrollDown if in_main => {
            if let Some(panel) = app.patch_panel.as_mut() {
                panel.state.cycle_selection(true);
            } else {
                app.main_scroll = app.main_scroll.saturating_add(3);
            }
        }
        MouseEventKind::ScrollUp if in_main => {
            if let Some(panel) = app.patch_panel.as_mut() {
                panel.state.cycle_selection(false);
            } else {
                app.main_scroll = app.main_scroll.saturating_sub(3);
            }
        }
        MouseEventKind::Down(MouseButton::Left) if in_main => {
            if let Some(panel) = app.patch_panel.as_mut() {
                let row = mouse.row.saturating_sub(app.main_area.y + 1) as usize;
                // a fresh pointer-down starts a new range anchor
                panel.state.select_new_line_for_range(panel.origin + row);
            }
        }
        MouseEventKind::Drag(MouseButton::Left) if in_main => {
            if let Some(panel) = app.patch_panel.as_mut() {
                let row = mouse.row.saturating_sub(app.main_area.y + 1) as usize;
                panel.state.select_line(panel.origin + row);
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// context lifecycle hooks

/// On-focus hook: render the newly focused context's content into the main
/// window.
pub fn on_context_focused(app: &mut App, key: ContextKey) {
    tracing::debug!(context = key, "focused");
    match key {
        FILES_CONTEXT => show_file_diff(app),
        COMMITS_CONTEXT => {
            if let Some(commit) = app.selected_commit() {
                app.request_show(commit.sha);
            }
        }
        REFLOG_CONTEXT => {
            if let Some(sha) = selected_reflog_sha(app) {
                app.request_show(sha);
            }
        }
        _ => {}
    }
}

/// On-focus-lost hook: transient main panels vacate their state.
pub fn on_context_focus_lost(app: &mut App, key: ContextKey) {
    match key {
        STAGING_CONTEXT | PATCH_BUILDING_CONTEXT => {
            app.patch_panel = None;
        }
        CONFIRMATION_CONTEXT => {
            app.confirm = None;
        }
        _ => {}
    }
}
