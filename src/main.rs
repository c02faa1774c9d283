use std::{
    env, fs,
    io::{self},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::prelude::*;
use ratatui::widgets::ListState;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

mod branch;
mod commit;
mod context;
mod errors;
mod events;
mod files;
mod git_ops;
mod patch;
mod prompt;
mod rebase;
mod refresh;
mod session;
mod show_cache;
mod ui;
mod window;

use branch::BranchesPanel;
use commit::{CommitsPanel, MessageState};
use context::{COMMITS_CONTEXT, ContextKey, ContextRegistry, FILES_CONTEXT};
use errors::Result;
use files::FilesPanel;
use git_ops::{CommitFileChange, StashEntry, StatusSummary};
use patch::PatchState;
use prompt::{ConfirmPrompt, InputPrompt};
use rebase::FilePlanEditor;
use refresh::{RefreshUpdate, Refresher};
use session::Session;
use window::WindowManager;

/// Commit-files side panel, targeted at a commit by its ref name so it can be
/// re-resolved after refreshes shift list positions.
pub struct CommitFilesPanel {
    pub ref_name: String,
    pub files: Vec<CommitFileChange>,
    pub list_state: ListState,
}

/// Which flavor of the line-by-line panel is open in the main window.
pub enum PatchKind {
    /// Staging working-tree changes of one file into the index.
    Staging { path: String },
    /// Picking lines of one file of a commit into a custom patch.
    PatchBuilding { sha: String, path: String },
}

pub struct PatchPanel {
    pub kind: PatchKind,
    pub state: PatchState,
    pub origin: usize,
    /// Line indices already added to the custom patch (patch building only).
    pub included: Vec<usize>,
}

/// A blocking git operation dispatched off the UI thread.
pub enum GitJob {
    InteractiveRebase {
        index: usize,
        action: rebase::TodoAction,
    },
    MoveCommit {
        index: usize,
        down: bool,
    },
    Revert {
        sha: String,
    },
    Checkout {
        rev: String,
    },
    AmendTo {
        sha: String,
    },
    Tag {
        name: String,
        sha: String,
    },
    RewordTop {
        message: String,
    },
    CommitChanges {
        message: String,
    },
    Pull,
    Push,
    Fetch,
    StashApply {
        selector: String,
    },
    StashDrop {
        selector: String,
    },
    StagePath {
        path: String,
    },
    UnstagePath {
        path: String,
    },
    ApplyPatch {
        patch: String,
        reverse: bool,
    },
    RebaseContinue,
    RebaseAbort,
    RebaseSkip,
}

/// Results flowing back from background jobs into the event loop.
pub enum JobOutcome {
    Op {
        label: &'static str,
        result: Result<()>,
        /// Selection shift to apply on success (commit reorders).
        selection_delta: i64,
    },
    ShowLoaded {
        sha: String,
        result: Result<String>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub focused_context: String,
    pub command_log_height: u16,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            focused_context: FILES_CONTEXT.to_string(),
            command_log_height: 4,
        }
    }
}

pub struct App {
    pub session: Arc<Session>,
    pub refresher: Refresher,
    pub registry: ContextRegistry,
    pub windows: WindowManager,

    pub status: StatusSummary,
    pub files_panel: FilesPanel,
    pub branches_panel: BranchesPanel,
    pub commits_panel: CommitsPanel,
    pub reflog_list: ListState,
    pub stash_entries: Vec<StashEntry>,
    pub stash_list: ListState,
    pub commit_files: Option<CommitFilesPanel>,

    pub patch_panel: Option<PatchPanel>,
    /// Content of the normal main view (commit show output).
    pub main_text: String,
    pub main_scroll: u16,
    /// Viewport height of the main window, captured during render for page
    /// moves and origin calculation.
    pub main_height: u16,
    /// Screen rect of the main window, captured during render so mouse
    /// events can be routed.
    pub main_area: Rect,
    /// SHA currently shown (or being loaded) in the main view.
    pub shown_sha: Option<String>,

    pub confirm: Option<ConfirmPrompt>,
    pub input: Option<InputPrompt>,
    pub message_open: bool,
    pub message: MessageState,
    pub waiting: Option<&'static str>,
    pub status_line: Option<String>,
    pub command_log: Vec<String>,

    pub settings: UiSettings,
    pub tick: usize,
    jobs_tx: mpsc::UnboundedSender<JobOutcome>,
}

impl App {
    fn new(
        session: Arc<Session>,
        refresher: Refresher,
        jobs_tx: mpsc::UnboundedSender<JobOutcome>,
        settings: UiSettings,
    ) -> Self {
        let registry = ContextRegistry::new();
        let windows = WindowManager::new(&registry);

        Self {
            session,
            refresher,
            registry,
            windows,
            status: StatusSummary::default(),
            files_panel: FilesPanel::new(),
            branches_panel: BranchesPanel::new(),
            commits_panel: CommitsPanel::new(),
            reflog_list: ListState::default(),
            stash_entries: Vec::new(),
            stash_list: ListState::default(),
            commit_files: None,
            patch_panel: None,
            main_text: String::new(),
            main_scroll: 0,
            main_height: 0,
            main_area: Rect::default(),
            shown_sha: None,
            confirm: None,
            input: None,
            message_open: false,
            message: MessageState::default(),
            waiting: None,
            status_line: None,
            command_log: Vec::new(),
            settings,
            tick: 0,
            jobs_tx,
        }
    }

    pub fn set_status<S: Into<String>>(&mut self, msg: S) {
        self.status_line = Some(msg.into());
    }

    pub fn log_command<S: Into<String>>(&mut self, line: S) {
        let line = line.into();
        tracing::info!(command = %line, "running");
        self.command_log.push(line);
        if self.command_log.len() > 200 {
            self.command_log.remove(0);
        }
    }

    /// The uniform error-surfacing path: show the failure, keep prior state.
    pub fn surface<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                if e.is_defect() {
                    tracing::error!(error = %e, "internal defect");
                } else {
                    tracing::warn!(error = %e, "operation failed");
                }
                self.set_status(e.to_string());
                None
            }
        }
    }

    pub fn commits_snapshot(&self) -> Vec<commit::Commit> {
        self.session.tables.commits.snapshot()
    }

    pub fn selected_commit(&self) -> Option<commit::Commit> {
        let commits = self.session.tables.commits.snapshot();
        commits.get(self.commits_panel.selected_idx()).cloned()
    }

    /// Switch focus to a context, running the focus lifecycle hooks when the
    /// activation actually changed something.
    pub fn focus_context(&mut self, key: ContextKey) {
        let previous = self.windows.active_context();
        match self.windows.set_active_context(&self.registry, key) {
            Ok(window::Activation::Activated) => {
                events::on_context_focus_lost(self, previous);
                events::on_context_focused(self, key);
            }
            Ok(window::Activation::Unchanged) => {}
            Err(e) => {
                let _ = self.surface::<()>(Err(e));
            }
        }
    }

    /// Run a blocking git operation off the UI thread, holding a waiting
    /// status that blocks this panel's input until it completes.
    pub fn start_job(&mut self, label: &'static str, job: GitJob) {
        self.start_job_with_delta(label, job, 0);
    }

    pub fn start_job_with_delta(&mut self, label: &'static str, job: GitJob, delta: i64) {
        self.waiting = Some(label);
        self.log_command(label);

        let root = self.session.repo_root.clone();
        let commits = self.commits_snapshot();
        let tx = self.jobs_tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = run_job(&root, &commits, job);
            let _ = tx.send(JobOutcome::Op {
                label,
                result,
                selection_delta: delta,
            });
        });
    }

    /// Load `git show` output for a commit into the main view, through the
    /// cache when possible.
    pub fn request_show(&mut self, sha: String) {
        self.shown_sha = Some(sha.clone());
        self.main_scroll = 0;

        if let Some(text) = self.session.show_cache.get(&sha) {
            self.main_text = text;
            return;
        }

        let root = self.session.repo_root.clone();
        let tx = self.jobs_tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = git_ops::show_commit(&root, &sha);
            let _ = tx.send(JobOutcome::ShowLoaded { sha, result });
        });
    }

    pub fn refresh_status(&mut self) {
        let result = git_ops::status_summary(&self.session.repo_root);
        if let Some(summary) = self.surface(result) {
            self.status = summary;
        }
    }

    pub fn refresh_files(&mut self) {
        let result = git_ops::list_working_files(&self.session.repo_root);
        if let Some(entries) = self.surface(result) {
            self.files_panel.set_entries(entries);
        }
    }

    pub fn refresh_stash(&mut self) {
        let result = git_ops::list_stashes(&self.session.repo_root);
        if let Some(entries) = self.surface(result) {
            if entries.is_empty() {
                self.stash_list.select(None);
            } else if self.stash_list.selected().unwrap_or(0) >= entries.len() {
                self.stash_list.select(Some(0));
            } else if self.stash_list.selected().is_none() {
                self.stash_list.select(Some(0));
            }
            self.stash_entries = entries;
        }
    }

    /// Rebuild the staging panel's diff after the index moved, seeding the
    /// new state from the old one so the cursor survives. Closes the panel
    /// when nothing unstaged remains in the file.
    fn reload_staging_panel(&mut self) {
        let Some(panel) = self.patch_panel.as_ref() else {
            return;
        };
        let PatchKind::Staging { path } = &panel.kind else {
            return;
        };
        let path = path.clone();

        let result = git_ops::diff_path(&self.session.repo_root, &path, false);
        let Some(diff) = self.surface(result) else {
            return;
        };

        let old = self.patch_panel.as_ref().map(|p| &p.state);
        match PatchState::new(&diff, None, old) {
            Some(state) => {
                if let Some(panel) = self.patch_panel.as_mut() {
                    panel.state = state;
                }
            }
            None => {
                self.patch_panel = None;
                self.set_status("all changes in file staged");
                self.focus_context(FILES_CONTEXT);
            }
        }
    }

    /// Editor over the in-flight rebase plan file.
    pub fn plan_editor(&self) -> Result<FilePlanEditor> {
        let path = git_ops::rebase_todo_path(&self.session.repo_root)?;
        Ok(FilePlanEditor::new(path))
    }

    /// Rebuild the commit-files panel for a commit addressed by ref name.
    pub fn load_commit_files(&mut self, ref_name: String) {
        let result = git_ops::list_commit_files(&self.session.repo_root, &ref_name);
        if let Some(list) = self.surface(result) {
            let mut list_state = ListState::default();
            if !list.is_empty() {
                list_state.select(Some(0));
            }
            self.commit_files = Some(CommitFilesPanel {
                ref_name,
                files: list,
                list_state,
            });
        }
    }

    fn apply_refresh_update(&mut self, update: RefreshUpdate) {
        match update {
            RefreshUpdate::Commits => {
                let len = self.session.tables.commits.with_state(|c| c.len());
                if self.commits_panel.selected_idx() >= len && len > 0 {
                    self.commits_panel.list_state.select(Some(len - 1));
                }
                // the commit under the cursor may be new; re-resolve the
                // main view by identity
                if self.windows.active_context() == COMMITS_CONTEXT {
                    if let Some(commit) = self.selected_commit() {
                        if self.shown_sha.as_deref() != Some(commit.ref_name()) {
                            self.request_show(commit.sha);
                        }
                    }
                }
            }
            RefreshUpdate::Branches => {
                let branches = self.session.tables.branches.snapshot();
                self.branches_panel.update_filtered(&branches);
            }
            RefreshUpdate::Reflog => {
                let len = self.session.tables.reflog.with_state(|r| r.len());
                if len == 0 {
                    self.reflog_list.select(None);
                } else if self.reflog_list.selected().unwrap_or(0) >= len {
                    self.reflog_list.select(Some(len - 1));
                }
            }
            RefreshUpdate::CommitsAndBranchesDone => {
                // re-target the commit-files panel at the commit now sitting
                // at the same selected index, addressed by its ref; if the
                // index is gone the panel is left stale
                if self.commit_files.is_some() {
                    if let Some(commit) = self.selected_commit() {
                        self.load_commit_files(commit.ref_name().to_string());
                    }
                }
            }
            RefreshUpdate::Error(msg) => {
                tracing::warn!(error = %msg, "background refresh failed");
                self.set_status(msg);
            }
        }
    }

    fn apply_job_outcome(&mut self, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Op {
                label,
                result,
                selection_delta,
            } => {
                self.waiting = None;
                match result {
                    Ok(()) => {
                        self.set_status(format!("{label}: done"));
                        if selection_delta != 0 {
                            let len = self.session.tables.commits.with_state(|c| c.len());
                            self.commits_panel.move_selection(selection_delta, len);
                        }
                    }
                    Err(e) => {
                        let _ = self.surface::<()>(Err(e));
                    }
                }
                // whatever happened, git state may have moved
                self.session.show_cache.clear();
                self.refresh_status();
                self.refresh_files();
                self.refresh_stash();
                self.reload_staging_panel();
                self.refresher
                    .spawn_commits_and_branches(self.commits_panel.limit_commits);
            }
            JobOutcome::ShowLoaded { sha, result } => {
                if let Some(text) = self.surface(result) {
                    self.session.show_cache.insert(sha.clone(), text.clone());
                    if self.shown_sha.as_deref() == Some(sha.as_str()) {
                        self.main_text = text;
                    }
                }
            }
        }
    }
}

/// Execute one job against the repository. Runs on a blocking thread.
fn run_job(root: &std::path::Path, commits: &[commit::Commit], job: GitJob) -> Result<()> {
    match job {
        GitJob::InteractiveRebase { index, action } => {
            git_ops::interactive_rebase(root, commits, index, action)
        }
        GitJob::MoveCommit { index, down } => {
            let (todo, base) = rebase::build_move_todo(commits, index, down)?;
            git_ops::rebase_with_todo(root, &todo, &base)
        }
        GitJob::Revert { sha } => git_ops::revert_commit(root, &sha),
        GitJob::Checkout { rev } => git_ops::checkout(root, &rev),
        GitJob::AmendTo { sha } => git_ops::amend_to(root, &sha),
        GitJob::Tag { name, sha } => git_ops::create_lightweight_tag(root, &name, &sha),
        GitJob::RewordTop { message } => git_ops::amend_message(root, &message),
        GitJob::CommitChanges { message } => git_ops::commit_with_message(root, &message),
        GitJob::Pull => git_ops::pull_rebase(root),
        GitJob::Push => git_ops::push(root),
        GitJob::Fetch => git_ops::fetch_prune(root),
        GitJob::StashApply { selector } => git_ops::stash_apply(root, &selector),
        GitJob::StashDrop { selector } => git_ops::stash_drop(root, &selector),
        GitJob::StagePath { path } => git_ops::stage_path(root, &path),
        GitJob::UnstagePath { path } => git_ops::unstage_path(root, &path),
        GitJob::ApplyPatch { patch, reverse } => git_ops::apply_patch_cached(root, &patch, reverse),
        GitJob::RebaseContinue => git_ops::rebase_continue(root),
        GitJob::RebaseAbort => git_ops::rebase_abort(root),
        GitJob::RebaseSkip => git_ops::rebase_skip(root),
    }
}

fn config_dir() -> Option<PathBuf> {
    env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .map(|d| d.join("jetgit"))
}

fn load_settings() -> UiSettings {
    let Some(path) = config_dir().map(|d| d.join("settings.json")) else {
        return UiSettings::default();
    };
    match fs::read_to_string(&path) {
        Ok(data) => serde_json::from_str(&data).unwrap_or_default(),
        Err(_) => UiSettings::default(),
    }
}

fn save_settings(settings: &UiSettings) {
    let Some(dir) = config_dir() else {
        return;
    };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    if let Ok(data) = serde_json::to_string_pretty(settings) {
        let _ = fs::write(dir.join("settings.json"), data);
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let Some(dir) = config_dir() else {
        return;
    };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("jetgit.log"))
    else {
        return;
    };

    let filter = EnvFilter::try_from_env("JETGIT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> io::Result<()> {
    init_tracing();

    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let Some(repo_root) = git_ops::discover_repo_root(&cwd) else {
        eprintln!("jetgit: not inside a git repository");
        std::process::exit(1);
    };
    tracing::info!(repo = %repo_root.display(), "session open");

    let session = Arc::new(Session::new(repo_root));
    let (refresher, mut updates_rx) = Refresher::new(Arc::clone(&session));
    let (jobs_tx, mut jobs_rx) = mpsc::unbounded_channel();

    let settings = load_settings();
    let mut app = App::new(session, refresher, jobs_tx, settings);

    app.refresh_status();
    app.refresh_files();
    app.refresh_stash();
    app.refresher.spawn_commits_and_branches(true);

    let initial: ContextKey = app
        .registry
        .flatten()
        .iter()
        .find(|c| c.key == app.settings.focused_context.as_str() && c.focusable)
        .map(|c| c.key)
        .unwrap_or_else(|| app.registry.initial_focus().key);
    app.focus_context(initial);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut stream = EventStream::new();
    let mut ticker = tokio::time::interval(Duration::from_millis(120));

    loop {
        terminal.draw(|f| ui::render(&mut app, f))?;

        tokio::select! {
            maybe_event = stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let events::KeyEventResult::Quit = events::handle_key_event(&mut app, key) {
                            break;
                        }
                    }
                    Some(Ok(Event::Mouse(mouse))) => {
                        events::handle_mouse_event(&mut app, mouse);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "terminal event stream error");
                        break;
                    }
                    None => break,
                }
            }
            Some(update) = updates_rx.recv() => {
                app.apply_refresh_update(update);
                // drain whatever else arrived in the same batch
                while let Ok(update) = updates_rx.try_recv() {
                    app.apply_refresh_update(update);
                }
            }
            Some(outcome) = jobs_rx.recv() => {
                app.apply_job_outcome(outcome);
            }
            _ = ticker.tick() => {
                app.tick = app.tick.wrapping_add(1);
            }
        }
    }

    app.settings.focused_context = app.windows.active_context().to_string();
    save_settings(&app.settings);
    tracing::info!("session close");

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    Ok(())
}
