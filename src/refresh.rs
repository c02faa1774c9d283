//! Refresh coordinator for the commit/branch/reflog view-model tables.
//!
//! Rebuilds of the same table serialize on that table's lock; independent
//! tables refresh concurrently. Results are committed under a generation
//! guard so a slow refresh that started earlier can never overwrite the
//! result of a newer one. Completion notices flow back into the UI loop over
//! a channel; the loop then re-resolves dependent panels by commit identity.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task;

use crate::branch;
use crate::commit::COMMIT_LIMIT;
use crate::errors::{AppError, Result};
use crate::git_ops;
use crate::session::{Session, StartupStage};

/// Completion notices delivered to the UI loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshUpdate {
    Commits,
    Branches,
    Reflog,
    /// The joined commits+branches refresh finished; panels showing a
    /// specific commit re-resolve it by ref name now.
    CommitsAndBranchesDone,
    Error(String),
}

/// How many reflog entries to load; recency sorting only needs the recent
/// tail.
const REFLOG_LIMIT: usize = 500;

#[derive(Clone)]
pub struct Refresher {
    session: Arc<Session>,
    updates_tx: mpsc::UnboundedSender<RefreshUpdate>,
}

impl Refresher {
    pub fn new(session: Arc<Session>) -> (Self, mpsc::UnboundedReceiver<RefreshUpdate>) {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        (
            Self {
                session,
                updates_tx,
            },
            updates_rx,
        )
    }

    fn notify(&self, update: RefreshUpdate) {
        let _ = self.updates_tx.send(update);
    }

    /// Rebuild the commit table from the log. With `limit` set only the
    /// first [`COMMIT_LIMIT`] entries are loaded; the cap is lifted once the
    /// user scrolls past it or searches.
    pub async fn refresh_commits_with_limit(&self, limit: bool) -> Result<()> {
        let generation = self.session.tables.commits.begin();
        let root = self.session.repo_root.clone();
        let max = limit.then_some(COMMIT_LIMIT);

        let commits = task::spawn_blocking(move || git_ops::list_commits(&root, max))
            .await
            .map_err(|e| AppError::ExternalCommand(e.to_string()))??;

        if self.session.tables.commits.commit(generation, commits) {
            self.notify(RefreshUpdate::Commits);
        }
        Ok(())
    }

    /// Re-merge the pending rebase plan into the commit list without
    /// re-running the log. Called after every plan edit so status flips show
    /// up immediately.
    pub fn refresh_rebase_commits(&self) -> Result<()> {
        let table = &self.session.tables.commits;
        let generation = table.begin();
        let merged = git_ops::merge_rebasing_commits(&self.session.repo_root, table.snapshot())?;
        if table.commit(generation, merged) {
            self.notify(RefreshUpdate::Commits);
        }
        Ok(())
    }

    pub async fn refresh_reflog(&self) -> Result<()> {
        let generation = self.session.tables.reflog.begin();
        let root = self.session.repo_root.clone();

        let entries = task::spawn_blocking(move || git_ops::list_reflog(&root, REFLOG_LIMIT))
            .await
            .map_err(|e| AppError::ExternalCommand(e.to_string()))??;

        if self.session.tables.reflog.commit(generation, entries) {
            self.notify(RefreshUpdate::Reflog);
        }
        Ok(())
    }

    /// Rebuild the branch table, ordered by checkout recency derived from
    /// the reflog table's current contents.
    pub async fn refresh_branches(&self) -> Result<()> {
        let generation = self.session.tables.branches.begin();
        let root = self.session.repo_root.clone();

        let mut branches = task::spawn_blocking(move || git_ops::list_branches(&root))
            .await
            .map_err(|e| AppError::ExternalCommand(e.to_string()))??;

        let subjects: Vec<String> = self
            .session
            .tables
            .reflog
            .with_state(|reflog| reflog.iter().map(|e| e.subject.clone()).collect());
        branch::apply_recency(&mut branches, &branch::checkout_recency(&subjects));

        if self.session.tables.branches.commit(generation, branches) {
            self.notify(RefreshUpdate::Branches);
        }
        Ok(())
    }

    /// Two-stage startup policy around the expensive reflog fetch.
    ///
    /// In stage Initial the fetch is deferred: a background task loads the
    /// reflog, re-derives branch recency, then flips the stage to Complete —
    /// at most once per process. From then on the fetch runs inline.
    pub async fn refresh_reflog_considering_startup(&self) -> Result<()> {
        match self.session.startup_stage() {
            StartupStage::Initial => {
                if self.session.claim_startup_task() {
                    let this = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = this.refresh_reflog().await {
                            this.notify(RefreshUpdate::Error(e.to_string()));
                        }
                        if let Err(e) = this.refresh_branches().await {
                            this.notify(RefreshUpdate::Error(e.to_string()));
                        }
                        this.session.complete_startup();
                        tracing::debug!("startup reflog fetch complete");
                    });
                }
                Ok(())
            }
            StartupStage::Complete => self.refresh_reflog().await,
        }
    }

    /// The full refresh: branch+reflog and the commit list are independent
    /// read paths, so they run concurrently and join before the refresh is
    /// declared complete.
    pub async fn refresh_commits_and_branches(&self, limit: bool) -> Result<()> {
        let branches_path = async {
            self.refresh_reflog_considering_startup().await?;
            self.refresh_branches().await
        };
        let commits_path = self.refresh_commits_with_limit(limit);

        let (branches_result, commits_result) = tokio::join!(branches_path, commits_path);
        branches_result?;
        commits_result?;

        self.notify(RefreshUpdate::CommitsAndBranchesDone);
        Ok(())
    }

    /// Fire-and-forget wrapper for input handlers that must not block the
    /// event loop. Failures surface through the updates channel.
    pub fn spawn_commits_and_branches(&self, limit: bool) {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.refresh_commits_and_branches(limit).await {
                this.notify(RefreshUpdate::Error(e.to_string()));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::process::Command;
    use std::time::Duration;
    use tempfile::TempDir;

    fn git(root: &Path, args: &[&str]) {
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
    }

    fn init_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        git(root, &["init", "-b", "main"]);
        git(root, &["config", "user.name", "test"]);
        git(root, &["config", "user.email", "t@example.com"]);
        std::fs::write(root.join("a.txt"), "one\n").unwrap();
        git(root, &["add", "."]);
        git(root, &["commit", "-m", "first"]);
        git(root, &["checkout", "-b", "feature"]);
        std::fs::write(root.join("a.txt"), "one\ntwo\n").unwrap();
        git(root, &["add", "."]);
        git(root, &["commit", "-m", "second"]);
        dir
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn joined_refresh_fills_all_tables() {
        let repo = init_repo();
        let session = Arc::new(Session::new(repo.path().to_path_buf()));
        let (refresher, mut updates) = Refresher::new(Arc::clone(&session));

        // skip the startup dance: complete it so the reflog loads inline
        session.claim_startup_task();
        session.complete_startup();

        refresher.refresh_commits_and_branches(true).await.unwrap();

        assert_eq!(session.tables.commits.snapshot().len(), 2);
        assert!(!session.tables.reflog.snapshot().is_empty());
        let branches = session.tables.branches.snapshot();
        assert!(branches.iter().any(|b| b.name == "main"));
        assert!(branches.iter().any(|b| b.name == "feature" && b.is_current));

        // the join completion notice arrives after the table notices
        let mut saw_done = false;
        while let Ok(update) = updates.try_recv() {
            if update == RefreshUpdate::CommitsAndBranchesDone {
                saw_done = true;
            }
        }
        assert!(saw_done);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn startup_stage_transitions_exactly_once() {
        let repo = init_repo();
        let session = Arc::new(Session::new(repo.path().to_path_buf()));
        let (refresher, _updates) = Refresher::new(Arc::clone(&session));

        assert_eq!(session.startup_stage(), StartupStage::Initial);

        // first call defers the fetch to a background task
        refresher.refresh_reflog_considering_startup().await.unwrap();
        // a second call while still Initial must not claim the task again
        refresher.refresh_reflog_considering_startup().await.unwrap();

        for _ in 0..100 {
            if session.startup_stage() == StartupStage::Complete {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(session.startup_stage(), StartupStage::Complete);
        assert!(!session.tables.reflog.snapshot().is_empty());
        // branch recency was derived by the deferred task
        assert!(
            session
                .tables
                .branches
                .snapshot()
                .iter()
                .any(|b| b.recency_rank.is_some())
        );

        // after the transition the fetch runs inline and no task is claimed
        refresher.refresh_reflog_considering_startup().await.unwrap();
        assert!(!session.claim_startup_task());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn commit_refresh_respects_limit_flag() {
        let repo = init_repo();
        let session = Arc::new(Session::new(repo.path().to_path_buf()));
        let (refresher, _updates) = Refresher::new(Arc::clone(&session));

        refresher.refresh_commits_with_limit(true).await.unwrap();
        let limited = session.tables.commits.snapshot();
        refresher.refresh_commits_with_limit(false).await.unwrap();
        let full = session.tables.commits.snapshot();

        // repo is tiny, both fit; the flag only bounds the load
        assert_eq!(limited.len(), full.len());
        assert!(limited.len() <= COMMIT_LIMIT);
    }
}
