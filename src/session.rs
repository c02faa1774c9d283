//! Repository session: the shared state every component receives by
//! reference. Created when a repository is opened, dropped when it closes;
//! nothing here is a free-standing global.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

use parking_lot::{Mutex, MutexGuard};

use crate::branch::Branch;
use crate::commit::Commit;
use crate::git_ops::ReflogEntry;
use crate::show_cache::ShowCache;

/// One refreshable view-model table. The mutex serializes rebuilds of this
/// table; distinct tables overlap freely. Generations guard against a slow,
/// earlier-started refresh overwriting the result of a newer one.
pub struct Table<T> {
    state: Mutex<Vec<T>>,
    next_gen: AtomicU64,
    committed_gen: AtomicU64,
}

impl<T: Clone> Table<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Vec::new()),
            next_gen: AtomicU64::new(0),
            committed_gen: AtomicU64::new(0),
        }
    }

    /// Take a generation ticket. Call before starting the read that will
    /// produce the replacement rows.
    pub fn begin(&self) -> u64 {
        self.next_gen.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Replace the table contents wholesale, unless a refresh that started
    /// later has already committed. Returns whether the rows were installed.
    pub fn commit(&self, generation: u64, rows: Vec<T>) -> bool {
        let mut state = self.state.lock();
        if generation <= self.committed_gen.load(Ordering::SeqCst) {
            tracing::debug!(generation, "discarding stale refresh result");
            return false;
        }
        self.committed_gen.store(generation, Ordering::SeqCst);
        *state = rows;
        true
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.state.lock().clone()
    }

    /// Run `f` inside this table's critical section.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let mut state = self.state.lock();
        f(&mut state)
    }

    pub fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.state.lock()
    }
}

impl<T: Clone> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Tables {
    pub commits: Table<Commit>,
    pub branches: Table<Branch>,
    pub reflog: Table<ReflogEntry>,
}

/// During startup the bottleneck is fetching the reflog, needed to sort
/// branches by recency. Stage `Initial` defers that fetch to a background
/// task; once it lands the stage flips to `Complete`, exactly once per
/// process, and later refreshes fetch the reflog inline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartupStage {
    Initial,
    Complete,
}

pub struct Session {
    pub repo_root: PathBuf,
    pub tables: Tables,
    pub show_cache: ShowCache,
    startup_stage: AtomicU8,
    startup_claimed: AtomicBool,
}

impl Session {
    pub fn new(repo_root: PathBuf) -> Self {
        Self {
            repo_root,
            tables: Tables {
                commits: Table::new(),
                branches: Table::new(),
                reflog: Table::new(),
            },
            show_cache: ShowCache::new(128),
            startup_stage: AtomicU8::new(0),
            startup_claimed: AtomicBool::new(false),
        }
    }

    pub fn startup_stage(&self) -> StartupStage {
        match self.startup_stage.load(Ordering::SeqCst) {
            0 => StartupStage::Initial,
            _ => StartupStage::Complete,
        }
    }

    /// Claim the one-shot deferred startup task. Only the first caller gets
    /// `true`; the transition to Complete happens when that task finishes.
    pub fn claim_startup_task(&self) -> bool {
        self.startup_claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn complete_startup(&self) {
        self.startup_stage.store(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_task_is_claimed_exactly_once() {
        let session = Session::new(PathBuf::from("/tmp"));
        assert_eq!(session.startup_stage(), StartupStage::Initial);
        assert!(session.claim_startup_task());
        assert!(!session.claim_startup_task());

        session.complete_startup();
        assert_eq!(session.startup_stage(), StartupStage::Complete);
        // a later claim still fails; the deferred fetch can never re-trigger
        assert!(!session.claim_startup_task());
    }

    #[test]
    fn stale_generation_is_discarded() {
        let table: Table<u32> = Table::new();
        let early = table.begin();
        let late = table.begin();

        assert!(table.commit(late, vec![2]));
        // the slower refresh that started earlier finishes later: dropped
        assert!(!table.commit(early, vec![1]));
        assert_eq!(table.snapshot(), vec![2]);
    }

    #[test]
    fn fresh_generation_replaces_state_wholesale() {
        let table: Table<u32> = Table::new();
        let g1 = table.begin();
        assert!(table.commit(g1, vec![1, 2, 3]));
        let g2 = table.begin();
        assert!(table.commit(g2, vec![9]));
        assert_eq!(table.snapshot(), vec![9]);
    }

    #[test]
    fn critical_sections_are_mutually_exclusive() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let table: Arc<Table<u32>> = Arc::new(Table::new());
        let owners = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let table = Arc::clone(&table);
                let owners = Arc::clone(&owners);
                let max_seen = Arc::clone(&max_seen);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        table.with_state(|state| {
                            let n = owners.fetch_add(1, Ordering::SeqCst) + 1;
                            max_seen.fetch_max(n, Ordering::SeqCst);
                            state.push(0);
                            owners.fetch_sub(1, Ordering::SeqCst);
                        });
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(table.snapshot().len(), 8 * 200);
    }
}
