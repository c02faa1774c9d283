//! Pending rebase plan editing and the mid-rebase command orchestrator.
//!
//! While an interactive rebase is paused, the not-yet-executed steps live in
//! the repository's TODO file. A squash/fixup/drop/edit/pick on a commit that
//! is still pending edits that file in place instead of starting a new
//! rebase; the orchestrator decides which of the two paths applies.

use std::fs;
use std::path::PathBuf;

use crate::commit::{Commit, CommitStatus};
use crate::errors::{AppError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TodoAction {
    Pick,
    Reword,
    Edit,
    Squash,
    Fixup,
    Drop,
    Break,
}

impl TodoAction {
    pub fn as_str(self) -> &'static str {
        match self {
            TodoAction::Pick => "pick",
            TodoAction::Reword => "reword",
            TodoAction::Edit => "edit",
            TodoAction::Squash => "squash",
            TodoAction::Fixup => "fixup",
            TodoAction::Drop => "drop",
            TodoAction::Break => "break",
        }
    }

    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "pick" | "p" => Some(TodoAction::Pick),
            "reword" | "r" => Some(TodoAction::Reword),
            "edit" | "e" => Some(TodoAction::Edit),
            "squash" | "s" => Some(TodoAction::Squash),
            "fixup" | "f" => Some(TodoAction::Fixup),
            "drop" | "d" => Some(TodoAction::Drop),
            "break" | "b" => Some(TodoAction::Break),
            _ => None,
        }
    }
}

/// One pending step of the rebase plan.
#[derive(Clone, Debug)]
pub struct TodoLine {
    pub action: TodoAction,
    pub sha: String,
    pub subject: String,
}

/// Parse the TODO entries out of raw plan-file content. Comment and blank
/// lines are skipped; entry index *i* here matches commit-list index *i*.
pub fn parse_todo(content: &str) -> Vec<TodoLine> {
    content
        .lines()
        .filter(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
        .filter_map(|l| {
            let mut it = l.split_whitespace();
            let action = TodoAction::parse(it.next()?)?;
            let sha = if action == TodoAction::Break {
                String::new()
            } else {
                it.next()?.to_string()
            };
            let subject = it.collect::<Vec<_>>().join(" ");
            Some(TodoLine {
                action,
                sha,
                subject,
            })
        })
        .collect()
}

/// Line-indexed operations on a persisted pending-rebase plan. The file
/// editor is the production implementation; tests drive an in-memory plan.
pub trait PlanEditor {
    /// Replace the action of entry `idx`.
    fn set_action(&mut self, idx: usize, action: TodoAction) -> Result<()>;
    /// Swap entries `idx` and `idx + 1`.
    fn swap_down(&mut self, idx: usize) -> Result<()>;
}

/// Edits the TODO file of the repository's in-flight rebase, preserving
/// comments and untouched lines byte for byte.
pub struct FilePlanEditor {
    path: PathBuf,
}

impl FilePlanEditor {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path)
            .map_err(|e| AppError::ExternalCommand(format!("read rebase todo: {e}")))
    }

    fn write(&self, content: &str) -> Result<()> {
        fs::write(&self.path, content)
            .map_err(|e| AppError::ExternalCommand(format!("write rebase todo: {e}")))
    }
}

impl PlanEditor for FilePlanEditor {
    fn set_action(&mut self, idx: usize, action: TodoAction) -> Result<()> {
        let content = self.read()?;
        self.write(&set_action_in_content(&content, idx, action)?)
    }

    fn swap_down(&mut self, idx: usize) -> Result<()> {
        let content = self.read()?;
        self.write(&swap_down_in_content(&content, idx)?)
    }
}

/// Indices of the entry lines (non-comment, non-blank) in plan content.
fn entry_line_numbers(content: &str) -> Vec<usize> {
    content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
        .map(|(i, _)| i)
        .collect()
}

fn set_action_in_content(content: &str, idx: usize, action: TodoAction) -> Result<String> {
    let entries = entry_line_numbers(content);
    let line_no = *entries
        .get(idx)
        .ok_or_else(|| AppError::InconsistentState(format!("no rebase plan entry at index {idx}")))?;

    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    let old = &lines[line_no];
    let rest = old
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest)
        .unwrap_or("");
    lines[line_no] = format!("{} {}", action.as_str(), rest);

    Ok(join_lines(lines))
}

fn swap_down_in_content(content: &str, idx: usize) -> Result<String> {
    let entries = entry_line_numbers(content);
    let a = *entries
        .get(idx)
        .ok_or_else(|| AppError::InconsistentState(format!("no rebase plan entry at index {idx}")))?;
    let b = *entries.get(idx + 1).ok_or_else(|| {
        AppError::InconsistentState(format!("no rebase plan entry at index {}", idx + 1))
    })?;

    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    lines.swap(a, b);

    Ok(join_lines(lines))
}

fn join_lines(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Whether a mid-rebase command consumed the action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MidRebaseOutcome {
    /// The pending plan was edited; nothing further to do.
    Applied,
    /// The selected commit is not a pending rebase entry; the caller should
    /// fall through to launching a real rebase (or, for pick, to pulling).
    NotApplicable,
}

/// Outcome of a mid-rebase reorder request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// The adjacent entry is not pending; plan and selection stay unchanged.
    Blocked,
    NotApplicable,
}

/// Apply `action` to the pending plan entry for the selected commit, if the
/// selected commit is in fact a pending rebase entry.
///
/// Reword is rejected outright on this path: it needs an interactive editor
/// hookup, and silently mutating the plan would be worse than refusing.
pub fn handle_mid_rebase(
    editor: &mut dyn PlanEditor,
    commits: &[Commit],
    selected: usize,
    action: TodoAction,
) -> Result<MidRebaseOutcome> {
    let commit = commits
        .get(selected)
        .ok_or(AppError::EmptyState("no commit selected"))?;

    if commit.status != CommitStatus::RebasingPending {
        return Ok(MidRebaseOutcome::NotApplicable);
    }

    if action == TodoAction::Reword {
        return Err(AppError::NotSupported("rewording a pending rebase entry"));
    }

    tracing::info!(
        sha = commit.short_sha(),
        action = action.as_str(),
        "updating rebase plan entry"
    );
    editor.set_action(selected, action)?;

    Ok(MidRebaseOutcome::Applied)
}

/// Reorder the selected pending entry one slot down (`down == true`) or up.
/// Both entries being swapped must be pending; otherwise nothing changes.
pub fn handle_mid_rebase_move(
    editor: &mut dyn PlanEditor,
    commits: &[Commit],
    selected: usize,
    down: bool,
) -> Result<MoveOutcome> {
    let commit = commits
        .get(selected)
        .ok_or(AppError::EmptyState("no commit selected"))?;

    if commit.status != CommitStatus::RebasingPending {
        return Ok(MoveOutcome::NotApplicable);
    }

    let neighbor = if down {
        selected.checked_add(1)
    } else {
        selected.checked_sub(1)
    };
    let neighbor_pending = neighbor
        .and_then(|i| commits.get(i))
        .is_some_and(|c| c.status == CommitStatus::RebasingPending);
    if !neighbor_pending {
        return Ok(MoveOutcome::Blocked);
    }

    let swap_idx = if down { selected } else { selected - 1 };
    tracing::info!(
        sha = commit.short_sha(),
        down,
        "moving rebase plan entry"
    );
    editor.swap_down(swap_idx)?;

    Ok(MoveOutcome::Moved)
}

/// Build the TODO content for launching a fresh interactive rebase that
/// applies `action` to the commit at `index`, leaving everything newer as
/// pick. Squash and fixup fold into the commit below the target, so that
/// commit is included in the plan too. Returns the TODO (oldest entry first)
/// plus the SHA the rebase is based onto.
pub fn build_rebase_todo(
    commits: &[Commit],
    index: usize,
    action: TodoAction,
) -> Result<(String, String)> {
    if index >= commits.len() {
        return Err(AppError::EmptyState("no commit selected"));
    }

    let mut base_index = index + 1;
    if matches!(action, TodoAction::Squash | TodoAction::Fixup) {
        base_index += 1;
    }
    let base = commits.get(base_index).ok_or_else(|| {
        AppError::Validation("not enough commits below to rebase onto".to_string())
    })?;

    let mut todo = String::new();
    for (i, commit) in commits[..base_index].iter().enumerate() {
        let line_action = if i == index { action } else { TodoAction::Pick };
        // prepend: the todo runs oldest to newest
        todo = format!(
            "{} {} {}\n{}",
            line_action.as_str(),
            commit.sha,
            commit.subject,
            todo
        );
    }

    Ok((todo, base.sha.clone()))
}

/// Build the TODO for moving the commit at `index` one slot down (older) or
/// up (newer) via a fresh interactive rebase.
pub fn build_move_todo(commits: &[Commit], index: usize, down: bool) -> Result<(String, String)> {
    let swap_with = if down {
        index.checked_add(1).filter(|i| *i < commits.len())
    } else {
        index.checked_sub(1)
    };
    let Some(swap_with) = swap_with else {
        return Err(AppError::Validation("no commit to swap with".to_string()));
    };

    let deepest = index.max(swap_with);
    let base = commits.get(deepest + 1).ok_or_else(|| {
        AppError::Validation("not enough commits below to rebase onto".to_string())
    })?;

    let mut order: Vec<usize> = (0..=deepest).collect();
    order.swap(index, swap_with);

    let mut todo = String::new();
    for &i in &order {
        // prepend: the todo runs oldest to newest
        todo = format!("pick {} {}\n{}", commits[i].sha, commits[i].subject, todo);
    }

    Ok((todo, base.sha.clone()))
}

#[cfg(test)]
pub(crate) struct MemoryPlanEditor {
    pub content: String,
}

#[cfg(test)]
impl PlanEditor for MemoryPlanEditor {
    fn set_action(&mut self, idx: usize, action: TodoAction) -> Result<()> {
        self.content = set_action_in_content(&self.content, idx, action)?;
        Ok(())
    }

    fn swap_down(&mut self, idx: usize) -> Result<()> {
        self.content = swap_down_in_content(&self.content, idx)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = "\
pick 1111111 first
pick 2222222 second
pick 3333333 third

# Rebase instructions
# p, pick <commit> = use commit
";

    fn commits(statuses: &[CommitStatus]) -> Vec<Commit> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, status)| Commit {
                sha: format!("{}{}{}{}{}{}{}", i, i, i, i, i, i, i),
                parents: vec!["p".to_string()],
                status: *status,
                action: None,
                author: "a".to_string(),
                date: "d".to_string(),
                subject: format!("subject {i}"),
                decoration: String::new(),
            })
            .collect()
    }

    #[test]
    fn parse_skips_comments_and_blanks() {
        let todo = parse_todo(PLAN);
        assert_eq!(todo.len(), 3);
        assert_eq!(todo[0].sha, "1111111");
        assert_eq!(todo[2].subject, "third");
        assert!(todo.iter().all(|l| l.action == TodoAction::Pick));
    }

    #[test]
    fn set_action_rewrites_only_the_target_entry() {
        let out = set_action_in_content(PLAN, 1, TodoAction::Squash).unwrap();
        let todo = parse_todo(&out);
        assert_eq!(todo[0].action, TodoAction::Pick);
        assert_eq!(todo[1].action, TodoAction::Squash);
        assert_eq!(todo[1].sha, "2222222");
        assert_eq!(todo[2].action, TodoAction::Pick);
        // comments are preserved verbatim
        assert!(out.contains("# Rebase instructions"));
    }

    #[test]
    fn swap_down_exchanges_adjacent_entries() {
        let out = swap_down_in_content(PLAN, 0).unwrap();
        let todo = parse_todo(&out);
        assert_eq!(todo[0].sha, "2222222");
        assert_eq!(todo[1].sha, "1111111");
    }

    #[test]
    fn orchestrator_edits_plan_for_pending_commit() {
        use CommitStatus::*;
        let commits = commits(&[RebasingPending, RebasingPending, Normal]);
        let mut editor = MemoryPlanEditor {
            content: PLAN.to_string(),
        };

        let outcome = handle_mid_rebase(&mut editor, &commits, 0, TodoAction::Fixup).unwrap();
        assert_eq!(outcome, MidRebaseOutcome::Applied);
        assert_eq!(parse_todo(&editor.content)[0].action, TodoAction::Fixup);
    }

    #[test]
    fn orchestrator_falls_through_for_normal_commit() {
        use CommitStatus::*;
        let commits = commits(&[RebasingPending, Normal]);
        let mut editor = MemoryPlanEditor {
            content: PLAN.to_string(),
        };

        let outcome = handle_mid_rebase(&mut editor, &commits, 1, TodoAction::Squash).unwrap();
        assert_eq!(outcome, MidRebaseOutcome::NotApplicable);
        // plan untouched
        assert_eq!(editor.content, PLAN);
    }

    #[test]
    fn reword_on_pending_entry_is_not_supported() {
        use CommitStatus::*;
        let commits = commits(&[RebasingPending]);
        let mut editor = MemoryPlanEditor {
            content: PLAN.to_string(),
        };

        let err = handle_mid_rebase(&mut editor, &commits, 0, TodoAction::Reword).unwrap_err();
        assert!(matches!(err, AppError::NotSupported(_)));
        assert_eq!(editor.content, PLAN);
    }

    #[test]
    fn move_down_blocked_when_neighbor_not_pending() {
        use CommitStatus::*;
        // index 3 pending, index 4 not
        let commits = commits(&[RebasingPending, RebasingPending, RebasingPending, RebasingPending, Normal]);
        let mut editor = MemoryPlanEditor {
            content: PLAN.to_string(),
        };

        let outcome = handle_mid_rebase_move(&mut editor, &commits, 3, true).unwrap();
        assert_eq!(outcome, MoveOutcome::Blocked);
        assert_eq!(editor.content, PLAN);
    }

    #[test]
    fn move_down_swaps_pending_neighbors() {
        use CommitStatus::*;
        let commits = commits(&[RebasingPending, RebasingPending, Normal]);
        let mut editor = MemoryPlanEditor {
            content: PLAN.to_string(),
        };

        let outcome = handle_mid_rebase_move(&mut editor, &commits, 0, true).unwrap();
        assert_eq!(outcome, MoveOutcome::Moved);
        let todo = parse_todo(&editor.content);
        assert_eq!(todo[0].sha, "2222222");
        assert_eq!(todo[1].sha, "1111111");
    }

    #[test]
    fn move_up_at_top_is_blocked() {
        use CommitStatus::*;
        let commits = commits(&[RebasingPending, RebasingPending]);
        let mut editor = MemoryPlanEditor {
            content: PLAN.to_string(),
        };

        let outcome = handle_mid_rebase_move(&mut editor, &commits, 0, false).unwrap();
        assert_eq!(outcome, MoveOutcome::Blocked);
    }

    #[test]
    fn built_todo_lists_oldest_first_with_action_on_target() {
        use CommitStatus::*;
        let commits = commits(&[Normal, Normal, Normal, Normal]);
        let (todo, base) = build_rebase_todo(&commits, 1, TodoAction::Drop).unwrap();

        let lines: Vec<&str> = todo.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("drop 1111111"));
        assert!(lines[1].starts_with("pick 0000000"));
        assert_eq!(base, "2222222");
    }

    #[test]
    fn squash_todo_includes_the_commit_below_the_target() {
        use CommitStatus::*;
        let commits = commits(&[Normal, Normal, Normal, Normal]);
        let (todo, base) = build_rebase_todo(&commits, 1, TodoAction::Squash).unwrap();

        let lines: Vec<&str> = todo.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("pick 2222222"));
        assert!(lines[1].starts_with("squash 1111111"));
        assert!(lines[2].starts_with("pick 0000000"));
        assert_eq!(base, "3333333");
    }

    #[test]
    fn move_todo_swaps_the_two_entries() {
        use CommitStatus::*;
        let commits = commits(&[Normal, Normal, Normal, Normal]);
        let (todo, base) = build_move_todo(&commits, 1, true).unwrap();

        let lines: Vec<&str> = todo.lines().collect();
        // moving index 1 below index 2: oldest-first order becomes 1, 2, 0
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("pick 1111111"));
        assert!(lines[1].starts_with("pick 2222222"));
        assert!(lines[2].starts_with("pick 0000000"));
        assert_eq!(base, "3333333");
    }

    #[test]
    fn rebase_without_a_base_commit_is_rejected() {
        use CommitStatus::*;
        let commits = commits(&[Normal, Normal]);
        let err = build_rebase_todo(&commits, 1, TodoAction::Drop).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
