//! Git subprocess execution.
//!
//! Every interaction with the repository goes through [`run_git`]: a plain
//! `git` child process with prompts, pagers and editors disabled so nothing
//! can block the UI waiting for a terminal.

use std::{
    fs, io,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::branch::Branch;
use crate::commit::{Commit, CommitStatus};
use crate::errors::{AppError, Result};
use crate::rebase::{self, TodoAction};

fn run_git(cwd: &Path, args: &[&str]) -> io::Result<std::process::Output> {
    Command::new("git")
        .arg("-C")
        .arg(cwd)
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("GCM_INTERACTIVE", "never")
        .env("GIT_PAGER", "cat")
        .env("PAGER", "cat")
        .env("GIT_EDITOR", ":")
        .env("EDITOR", ":")
        .env("GIT_SEQUENCE_EDITOR", ":")
        .env("GIT_MERGE_AUTOEDIT", "no")
        .output()
}

/// Run git and return stdout, mapping any failure into the uniform
/// external-command error path.
fn git_output(cwd: &Path, args: &[&str]) -> Result<String> {
    let out = run_git(cwd, args).map_err(|e| AppError::ExternalCommand(e.to_string()))?;
    if !out.status.success() {
        return Err(AppError::ExternalCommand(
            String::from_utf8_lossy(&out.stderr).trim().to_string(),
        ));
    }
    Ok(String::from_utf8_lossy(&out.stdout).to_string())
}

fn git_unit(cwd: &Path, args: &[&str]) -> Result<()> {
    git_output(cwd, args).map(|_| ())
}

pub fn discover_repo_root(path: &Path) -> Option<PathBuf> {
    let out = run_git(path, &["rev-parse", "--show-toplevel"]).ok()?;
    if !out.status.success() {
        return None;
    }
    let root = String::from_utf8(out.stdout).ok()?.trim().to_string();
    if root.is_empty() {
        None
    } else {
        Some(PathBuf::from(root))
    }
}

#[derive(Clone, Debug, Default)]
pub struct StatusSummary {
    pub branch: String,
    pub ahead: u32,
    pub behind: u32,
}

pub fn status_summary(repo_root: &Path) -> Result<StatusSummary> {
    let text = git_output(repo_root, &["status", "--porcelain=v1", "-b", "--no-renames"])?;
    let mut summary = StatusSummary::default();

    let Some(line) = text.lines().find(|l| l.starts_with("## ")) else {
        return Ok(summary);
    };
    let rest = line.trim_start_matches("## ").trim();

    let (head, ab_part) = match rest.rsplit_once('[') {
        Some((left, right)) => (left.trim(), Some(right.trim_end_matches(']').trim())),
        None => (rest, None),
    };
    summary.branch = head.split("...").next().unwrap_or(head).trim().to_string();

    if let Some(ab_part) = ab_part {
        for item in ab_part.split(',').map(str::trim) {
            if let Some(v) = item.strip_prefix("ahead ") {
                summary.ahead = v.parse().unwrap_or(0);
            } else if let Some(v) = item.strip_prefix("behind ") {
                summary.behind = v.parse().unwrap_or(0);
            }
        }
    }

    Ok(summary)
}

/// Rebuild the commit list from the log, newest first, with any in-flight
/// rebase merged in: pending TODO entries first (index *i* matches TODO line
/// *i*), already-applied entries flagged as done.
pub fn list_commits(repo_root: &Path, limit: Option<usize>) -> Result<Vec<Commit>> {
    let max_s;
    let mut args: Vec<&str> = vec![
        "log",
        "--no-color",
        "--decorate=short",
        "--date=short",
        "--pretty=format:%H\x1f%P\x1f%an\x1f%ad\x1f%s\x1f%d",
    ];
    if let Some(limit) = limit {
        max_s = limit.to_string();
        args.push("--max-count");
        args.push(&max_s);
    }

    let text = match git_output(repo_root, &args) {
        Ok(text) => text,
        // an empty repository has no HEAD to log from
        Err(AppError::ExternalCommand(msg)) if msg.contains("does not have any commits") => {
            String::new()
        }
        Err(e) => return Err(e),
    };

    let mut commits = Vec::new();
    for line in text.lines() {
        let mut it = line.splitn(6, '\x1f');
        let sha = it.next().unwrap_or("").trim().to_string();
        if sha.is_empty() {
            continue;
        }
        let parents = it
            .next()
            .unwrap_or("")
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let author = it.next().unwrap_or("").trim().to_string();
        let date = it.next().unwrap_or("").trim().to_string();
        let subject = it.next().unwrap_or("").trim().to_string();
        let decoration = it.next().unwrap_or("").trim().to_string();
        commits.push(Commit {
            sha,
            parents,
            status: CommitStatus::Normal,
            action: None,
            author,
            date,
            subject,
            decoration,
        });
    }

    merge_rebasing_commits(repo_root, commits)
}

/// Strip any previous rebase prefix from `commits` and re-merge the current
/// pending plan on top. Called after every plan edit so the Rebasing-Pending
/// prefix mirrors the TODO file.
pub fn merge_rebasing_commits(repo_root: &Path, commits: Vec<Commit>) -> Result<Vec<Commit>> {
    let mut rest: Vec<Commit> = commits
        .into_iter()
        .filter(|c| c.status != CommitStatus::RebasingPending)
        .collect();

    let Some(todo_dir) = rebase_merge_dir(repo_root)? else {
        for c in rest.iter_mut() {
            c.status = CommitStatus::Normal;
        }
        return Ok(rest);
    };

    let todo_content = fs::read_to_string(todo_dir.join("git-rebase-todo")).unwrap_or_default();
    let done_content = fs::read_to_string(todo_dir.join("done")).unwrap_or_default();

    let done_shas: Vec<String> = rebase::parse_todo(&done_content)
        .into_iter()
        .map(|l| l.sha)
        .collect();
    for c in rest.iter_mut() {
        if done_shas.iter().any(|sha| c.sha.starts_with(sha.as_str())) {
            c.status = CommitStatus::RebasingDone;
        }
    }

    let mut merged: Vec<Commit> = rebase::parse_todo(&todo_content)
        .into_iter()
        .map(|l| Commit {
            sha: l.sha,
            parents: Vec::new(),
            status: CommitStatus::RebasingPending,
            action: Some(l.action),
            author: String::new(),
            date: String::new(),
            subject: l.subject,
            decoration: String::new(),
        })
        .collect();
    merged.append(&mut rest);

    Ok(merged)
}

/// Path of the in-flight rebase directory, if a rebase is underway.
pub fn rebase_merge_dir(repo_root: &Path) -> Result<Option<PathBuf>> {
    for kind in ["rebase-merge", "rebase-apply"] {
        let out = git_output(repo_root, &["rev-parse", "--git-path", kind])?;
        let p = out.trim();
        if !p.is_empty() {
            let dir = repo_root.join(p);
            if dir.exists() {
                return Ok(Some(dir));
            }
        }
    }
    Ok(None)
}

pub fn rebase_in_progress(repo_root: &Path) -> Result<bool> {
    Ok(rebase_merge_dir(repo_root)?.is_some())
}

pub fn rebase_todo_path(repo_root: &Path) -> Result<PathBuf> {
    let dir = rebase_merge_dir(repo_root)?.ok_or(AppError::EmptyState("no rebase in progress"))?;
    Ok(dir.join("git-rebase-todo"))
}

#[derive(Clone, Debug)]
pub struct ReflogEntry {
    pub sha: String,
    pub selector: String,
    pub subject: String,
}

pub fn list_reflog(repo_root: &Path, max: usize) -> Result<Vec<ReflogEntry>> {
    let max_s = max.to_string();
    let text = match git_output(
        repo_root,
        &[
            "log",
            "-g",
            "--no-color",
            "--max-count",
            &max_s,
            "--pretty=format:%H\x1f%gD\x1f%gs",
        ],
    ) {
        Ok(text) => text,
        // a fresh repository has no reflog yet
        Err(_) => String::new(),
    };

    let mut entries = Vec::new();
    for line in text.lines() {
        let mut it = line.splitn(3, '\x1f');
        let sha = it.next().unwrap_or("").trim().to_string();
        let selector = it.next().unwrap_or("").trim().to_string();
        let subject = it.next().unwrap_or("").trim().to_string();
        if sha.is_empty() {
            continue;
        }
        entries.push(ReflogEntry {
            sha,
            selector,
            subject,
        });
    }

    Ok(entries)
}

pub fn list_branches(repo_root: &Path) -> Result<Vec<Branch>> {
    let format = "%(HEAD)\x1f%(refname:short)\x1f%(upstream:short)\x1f%(upstream:track)";
    let mut branches = Vec::new();

    for (refs, is_remote) in [("refs/heads", false), ("refs/remotes", true)] {
        let text = git_output(
            repo_root,
            &[
                "for-each-ref",
                "--sort=-committerdate",
                refs,
                "--format",
                format,
            ],
        )?;

        for line in text.lines() {
            let mut it = line.split('\x1f');
            let head = it.next().unwrap_or("").trim();
            let name = it.next().unwrap_or("").trim().to_string();
            if name.is_empty() || name.ends_with("/HEAD") {
                continue;
            }
            let upstream = it
                .next()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            let track = it
                .next()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            branches.push(Branch {
                name,
                is_current: head == "*",
                is_remote,
                upstream,
                track,
                recency_rank: None,
            });
        }
    }

    Ok(branches)
}

#[derive(Clone, Debug)]
pub struct StashEntry {
    pub selector: String,
    pub subject: String,
}

pub fn list_stashes(repo_root: &Path) -> Result<Vec<StashEntry>> {
    let text = git_output(
        repo_root,
        &["stash", "list", "--no-color", "--pretty=format:%gd\x1f%gs"],
    )?;

    let mut entries = Vec::new();
    for line in text.lines() {
        let mut it = line.splitn(2, '\x1f');
        let selector = it.next().unwrap_or("").trim().to_string();
        let subject = it.next().unwrap_or("").trim().to_string();
        if selector.is_empty() {
            continue;
        }
        entries.push(StashEntry { selector, subject });
    }

    Ok(entries)
}

pub fn stash_apply(repo_root: &Path, selector: &str) -> Result<()> {
    git_unit(repo_root, &["stash", "apply", selector])
}

pub fn stash_drop(repo_root: &Path, selector: &str) -> Result<()> {
    git_unit(repo_root, &["stash", "drop", selector])
}

/// Full `git show` text for one commit: message, stat and patch.
pub fn show_commit(repo_root: &Path, sha: &str) -> Result<String> {
    git_output(
        repo_root,
        &[
            "show",
            "--no-color",
            "--decorate=short",
            "--date=short",
            "--stat",
            "--patch",
            sha,
        ],
    )
}

pub fn get_commit_message(repo_root: &Path, sha: &str) -> Result<String> {
    git_output(repo_root, &["log", "-1", "--format=%B", sha]).map(|s| s.trim_end().to_string())
}

#[derive(Clone, Debug)]
pub struct CommitFileChange {
    pub status: String,
    pub path: String,
    pub old_path: Option<String>,
}

fn first_parent(repo_root: &Path, sha: &str) -> Result<Option<String>> {
    let text = git_output(repo_root, &["rev-list", "--parents", "-n", "1", sha])?;
    Ok(text
        .lines()
        .next()
        .unwrap_or("")
        .split_whitespace()
        .nth(1)
        .map(str::to_string))
}

pub fn list_commit_files(repo_root: &Path, sha: &str) -> Result<Vec<CommitFileChange>> {
    let text = match first_parent(repo_root, sha)? {
        Some(parent) => git_output(
            repo_root,
            &["diff", "--no-color", "--name-status", &parent, sha],
        )?,
        None => git_output(
            repo_root,
            &["show", "--no-color", "--format=", "--name-status", "--no-patch", sha],
        )?,
    };

    let mut files = Vec::new();
    for line in text.lines() {
        let parts: Vec<&str> = line.trim().split('\t').collect();
        let Some(status) = parts.first().filter(|s| !s.is_empty()) else {
            continue;
        };
        let status = status.to_string();

        let (old_path, path) = if status.starts_with('R') || status.starts_with('C') {
            (
                parts.get(1).map(|s| s.to_string()),
                parts.get(2).map(|s| s.to_string()).unwrap_or_default(),
            )
        } else {
            (
                None,
                parts.get(1).map(|s| s.to_string()).unwrap_or_default(),
            )
        };
        if path.is_empty() {
            continue;
        }
        files.push(CommitFileChange {
            status,
            path,
            old_path,
        });
    }

    Ok(files)
}

/// Diff of one file of a commit against its first parent, used to seed the
/// patch-building panel.
pub fn show_commit_file_diff(repo_root: &Path, sha: &str, path: &str) -> Result<String> {
    match first_parent(repo_root, sha)? {
        Some(parent) => git_output(
            repo_root,
            &["diff", "--no-color", &parent, sha, "--", path],
        ),
        None => git_output(
            repo_root,
            &["show", "--no-color", "--format=", "--patch", sha, "--", path],
        ),
    }
}

/// Working-tree (or index) diff of one file, feeding the staging panel.
pub fn diff_path(repo_root: &Path, path: &str, staged: bool) -> Result<String> {
    let mut args: Vec<&str> = vec!["diff", "--no-color"];
    if staged {
        args.push("--cached");
    }
    args.push("--");
    args.push(path);
    git_output(repo_root, &args)
}

#[derive(Clone, Debug)]
pub struct FileEntry {
    pub path: String,
    pub staged_status: char,
    pub worktree_status: char,
    pub is_untracked: bool,
}

pub fn list_working_files(repo_root: &Path) -> Result<Vec<FileEntry>> {
    let out = run_git(repo_root, &["status", "--porcelain=v1", "-z", "--no-renames"])
        .map_err(|e| AppError::ExternalCommand(e.to_string()))?;
    if !out.status.success() {
        return Err(AppError::ExternalCommand(
            String::from_utf8_lossy(&out.stderr).trim().to_string(),
        ));
    }

    let mut entries = Vec::new();
    for item in out.stdout.split(|b| *b == 0).filter(|s| !s.is_empty()) {
        let s = String::from_utf8_lossy(item);
        if s.len() < 4 {
            continue;
        }
        let x = s.chars().next().unwrap_or(' ');
        let y = s.chars().nth(1).unwrap_or(' ');
        let path = s[3..].to_string();
        entries.push(FileEntry {
            path,
            staged_status: x,
            worktree_status: y,
            is_untracked: x == '?',
        });
    }

    Ok(entries)
}

pub fn stage_path(repo_root: &Path, path: &str) -> Result<()> {
    git_unit(repo_root, &["add", "--", path])
}

pub fn unstage_path(repo_root: &Path, path: &str) -> Result<()> {
    git_unit(repo_root, &["restore", "--staged", "--", path])
}

/// Apply a generated patch to the index (stage) or reverse-apply it from the
/// index (unstage). The patch text is fed through stdin.
pub fn apply_patch_cached(repo_root: &Path, patch: &str, reverse: bool) -> Result<()> {
    let mut args = vec!["apply", "--cached", "--unidiff-zero"];
    if reverse {
        args.push("--reverse");
    }
    args.push("-");

    let mut child = Command::new("git")
        .arg("-C")
        .arg(repo_root)
        .args(&args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| AppError::ExternalCommand(e.to_string()))?;

    if let Some(mut stdin) = child.stdin.take() {
        use std::io::Write as _;
        stdin
            .write_all(patch.as_bytes())
            .map_err(|e| AppError::ExternalCommand(e.to_string()))?;
    }

    let out = child
        .wait_with_output()
        .map_err(|e| AppError::ExternalCommand(e.to_string()))?;
    if out.status.success() {
        Ok(())
    } else {
        Err(AppError::ExternalCommand(
            String::from_utf8_lossy(&out.stderr).trim().to_string(),
        ))
    }
}

/// Launch an interactive rebase with a prebuilt TODO. The plan is written to
/// a temp file and installed by pointing the sequence editor at `cp`, so git
/// never opens a real editor.
pub fn interactive_rebase(
    repo_root: &Path,
    commits: &[Commit],
    index: usize,
    action: TodoAction,
) -> Result<()> {
    let (todo, base) = rebase::build_rebase_todo(commits, index, action)?;
    rebase_with_todo(repo_root, &todo, &base)
}

/// Start an interactive rebase onto `base` with a prebuilt TODO installed in
/// place of the generated one.
pub fn rebase_with_todo(repo_root: &Path, todo: &str, base: &str) -> Result<()> {
    let mut plan_path = std::env::temp_dir();
    plan_path.push(format!("jetgit-rebase-{}.todo", std::process::id()));
    fs::write(&plan_path, todo).map_err(|e| AppError::ExternalCommand(e.to_string()))?;

    let editor = format!("cp {}", plan_path.display());
    let result = run_git_with_sequence_editor(
        repo_root,
        &["rebase", "--interactive", "--autostash", base],
        &editor,
    );

    let _ = fs::remove_file(&plan_path);
    result
}

/// `git commit --fixup` on the target, then an autosquash rebase with the
/// generated plan accepted as-is.
pub fn amend_to(repo_root: &Path, sha: &str) -> Result<()> {
    git_unit(repo_root, &["commit", "--fixup", sha])?;
    run_git_with_sequence_editor(
        repo_root,
        &["rebase", "--interactive", "--autostash", "--autosquash", &format!("{sha}^")],
        ":",
    )
}

fn run_git_with_sequence_editor(repo_root: &Path, args: &[&str], editor: &str) -> Result<()> {
    let out = Command::new("git")
        .arg("-C")
        .arg(repo_root)
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("GIT_PAGER", "cat")
        .env("PAGER", "cat")
        .env("GIT_EDITOR", ":")
        .env("EDITOR", ":")
        .env("GIT_SEQUENCE_EDITOR", editor)
        .env("GIT_MERGE_AUTOEDIT", "no")
        .output()
        .map_err(|e| AppError::ExternalCommand(e.to_string()))?;

    if out.status.success() {
        Ok(())
    } else {
        Err(AppError::ExternalCommand(
            String::from_utf8_lossy(&out.stderr).trim().to_string(),
        ))
    }
}

pub fn rebase_continue(repo_root: &Path) -> Result<()> {
    git_unit(repo_root, &["rebase", "--continue"])
}

pub fn rebase_abort(repo_root: &Path) -> Result<()> {
    git_unit(repo_root, &["rebase", "--abort"])
}

pub fn rebase_skip(repo_root: &Path) -> Result<()> {
    git_unit(repo_root, &["rebase", "--skip"])
}

pub fn revert_commit(repo_root: &Path, sha: &str) -> Result<()> {
    git_unit(repo_root, &["revert", "--no-edit", sha])
}

pub fn create_lightweight_tag(repo_root: &Path, name: &str, sha: &str) -> Result<()> {
    git_unit(repo_root, &["tag", name, sha])
}

pub fn checkout(repo_root: &Path, rev: &str) -> Result<()> {
    git_unit(repo_root, &["checkout", rev])
}

pub fn pull_rebase(repo_root: &Path) -> Result<()> {
    git_unit(repo_root, &["pull", "--rebase"])
}

pub fn push(repo_root: &Path) -> Result<()> {
    git_unit(repo_root, &["push"])
}

pub fn fetch_prune(repo_root: &Path) -> Result<()> {
    git_unit(repo_root, &["fetch", "--prune"])
}

/// Commit staged changes with a message, written through a temp file so
/// multi-line messages survive shells and platforms alike.
pub fn commit_with_message(repo_root: &Path, message: &str) -> Result<()> {
    let msg = message.trim();
    if msg.is_empty() {
        return Err(AppError::Validation("empty commit message".to_string()));
    }

    let mut path = std::env::temp_dir();
    path.push(format!("jetgit-commit-{}.txt", std::process::id()));
    fs::write(&path, msg).map_err(|e| AppError::ExternalCommand(e.to_string()))?;

    let result = git_unit(repo_root, &["commit", "-F", path.to_string_lossy().as_ref()]);
    let _ = fs::remove_file(&path);
    result
}

/// Reword the top commit in place. Rewording deeper commits needs an
/// interactive rebase and is validated by the caller.
pub fn amend_message(repo_root: &Path, message: &str) -> Result<()> {
    let msg = message.trim();
    if msg.is_empty() {
        return Err(AppError::Validation("empty commit message".to_string()));
    }

    let mut path = std::env::temp_dir();
    path.push(format!("jetgit-reword-{}.txt", std::process::id()));
    fs::write(&path, msg).map_err(|e| AppError::ExternalCommand(e.to_string()))?;

    let result = git_unit(
        repo_root,
        &["commit", "--amend", "-F", path.to_string_lossy().as_ref()],
    );
    let _ = fs::remove_file(&path);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use tempfile::TempDir;

    fn init_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let run = |args: &[&str]| {
            let out = Command::new("git")
                .arg("-C")
                .arg(root)
                .args(args)
                .env("GIT_AUTHOR_NAME", "test")
                .env("GIT_AUTHOR_EMAIL", "t@example.com")
                .env("GIT_COMMITTER_NAME", "test")
                .env("GIT_COMMITTER_EMAIL", "t@example.com")
                .output()
                .unwrap();
            assert!(
                out.status.success(),
                "git {:?} failed: {}",
                args,
                String::from_utf8_lossy(&out.stderr)
            );
        };
        run(&["init", "-b", "main"]);
        run(&["config", "user.name", "test"]);
        run(&["config", "user.email", "t@example.com"]);
        std::fs::write(root.join("a.txt"), "one\n").unwrap();
        run(&["add", "."]);
        run(&["commit", "-m", "first"]);
        std::fs::write(root.join("a.txt"), "one\ntwo\n").unwrap();
        run(&["add", "."]);
        run(&["commit", "-m", "second"]);
        dir
    }

    #[test]
    fn lists_commits_newest_first() {
        let repo = init_repo();
        let commits = list_commits(repo.path(), Some(10)).unwrap();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].subject, "second");
        assert_eq!(commits[1].subject, "first");
        assert_eq!(commits[1].parents.len(), 0);
        assert_eq!(commits[0].parents.len(), 1);
        assert!(commits.iter().all(|c| c.status == CommitStatus::Normal));
    }

    #[test]
    fn status_summary_reports_branch() {
        let repo = init_repo();
        let summary = status_summary(repo.path()).unwrap();
        assert_eq!(summary.branch, "main");
        assert_eq!(summary.ahead, 0);
    }

    #[test]
    fn diff_path_produces_unified_diff() {
        let repo = init_repo();
        std::fs::write(repo.path().join("a.txt"), "one\nchanged\n").unwrap();
        let diff = diff_path(repo.path(), "a.txt", false).unwrap();
        assert!(diff.contains("-two"));
        assert!(diff.contains("+changed"));
    }

    #[test]
    fn working_files_show_unstaged_changes() {
        let repo = init_repo();
        std::fs::write(repo.path().join("a.txt"), "dirty\n").unwrap();
        std::fs::write(repo.path().join("new.txt"), "x\n").unwrap();

        let files = list_working_files(repo.path()).unwrap();
        let a = files.iter().find(|f| f.path == "a.txt").unwrap();
        assert_eq!(a.worktree_status, 'M');
        let n = files.iter().find(|f| f.path == "new.txt").unwrap();
        assert!(n.is_untracked);
    }

    #[test]
    fn no_rebase_means_no_pending_commits() {
        let repo = init_repo();
        assert!(!rebase_in_progress(repo.path()).unwrap());
        let commits = list_commits(repo.path(), None).unwrap();
        assert!(commits.iter().all(|c| c.status == CommitStatus::Normal));
    }

    #[test]
    fn commit_files_listed_for_a_commit() {
        let repo = init_repo();
        let commits = list_commits(repo.path(), None).unwrap();
        let files = list_commit_files(repo.path(), &commits[0].sha).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "a.txt");
        assert_eq!(files[0].status, "M");
    }

    #[test]
    fn reflog_has_checkout_free_entries() {
        let repo = init_repo();
        let entries = list_reflog(repo.path(), 50).unwrap();
        assert!(entries.len() >= 2);
        assert!(entries.iter().all(|e| !e.sha.is_empty()));
    }
}
