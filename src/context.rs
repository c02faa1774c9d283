//! UI contexts: addressable units bound to at most one on-screen view.
//!
//! Contexts live in a single arena owned by [`ContextRegistry`] and are
//! referred to everywhere else by their stable key. Windows never hold a
//! pointer back into a context; they resolve through the registry.

use crate::errors::{AppError, Result};

/// Stable identity of a context. Keys are static because the set of contexts
/// is fixed at startup.
pub type ContextKey = &'static str;

pub const GLOBAL_CONTEXT: ContextKey = "global";
pub const STATUS_CONTEXT: ContextKey = "status";
pub const FILES_CONTEXT: ContextKey = "files";
pub const BRANCHES_CONTEXT: ContextKey = "localBranches";
pub const COMMITS_CONTEXT: ContextKey = "commits";
pub const REFLOG_CONTEXT: ContextKey = "reflogCommits";
pub const COMMIT_FILES_CONTEXT: ContextKey = "commitFiles";
pub const STASH_CONTEXT: ContextKey = "stash";
pub const NORMAL_MAIN_CONTEXT: ContextKey = "normal";
pub const STAGING_CONTEXT: ContextKey = "staging";
pub const PATCH_BUILDING_CONTEXT: ContextKey = "patchBuilding";
pub const CONFIRMATION_CONTEXT: ContextKey = "confirmation";
pub const COMMIT_MESSAGE_CONTEXT: ContextKey = "commitMessage";
pub const COMMAND_LOG_CONTEXT: ContextKey = "cmdLog";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextKind {
    /// Keybindings that apply everywhere; owns no window.
    Global,
    /// A list panel in the left column.
    Side,
    /// Content of the main window (diff, commit text, staging).
    Main,
    /// A popup dismissed by any context switch.
    PopupTemporary,
    /// A popup that survives until explicitly closed (commit message).
    PopupPersistent,
    /// Auxiliary surfaces like the command log.
    Extras,
}

#[derive(Clone, Debug)]
pub struct Context {
    pub key: ContextKey,
    pub kind: ContextKind,
    /// Logical screen region this context's view appears in. Empty for the
    /// global context, which has no view at all. Mutable because a transient
    /// context (commit files) is re-homed to whichever window it was entered
    /// from.
    pub window: String,
    pub view: &'static str,
    pub focusable: bool,
    /// A transient context vacates its previous window cleanly when its view
    /// moves, rather than leaving that window without an occupant.
    pub transient: bool,
}

impl Context {
    fn new(
        key: ContextKey,
        kind: ContextKind,
        window: &str,
        view: &'static str,
        focusable: bool,
    ) -> Self {
        Self {
            key,
            kind,
            window: window.to_string(),
            view,
            focusable,
            transient: false,
        }
    }

    fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    pub fn has_view(&self) -> bool {
        !self.view.is_empty()
    }
}

/// Arena of every context in the application, in canonical priority order.
///
/// The order decides which context initially occupies a window shared by
/// several contexts (the last one listed for a window wins) and the stacking
/// order of views.
pub struct ContextRegistry {
    contexts: Vec<Context>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        use ContextKind::*;

        let contexts = vec![
            Context::new(GLOBAL_CONTEXT, Global, "", "", false),
            Context::new(STATUS_CONTEXT, Side, "status", "status", true),
            Context::new(FILES_CONTEXT, Side, "files", "files", true),
            Context::new(BRANCHES_CONTEXT, Side, "branches", "branches", true),
            Context::new(COMMIT_FILES_CONTEXT, Side, "commits", "commitFiles", true).transient(),
            Context::new(REFLOG_CONTEXT, Side, "commits", "reflogCommits", true),
            Context::new(COMMITS_CONTEXT, Side, "commits", "commits", true),
            Context::new(STASH_CONTEXT, Side, "stash", "stash", true),
            Context::new(STAGING_CONTEXT, Main, "main", "staging", true),
            Context::new(PATCH_BUILDING_CONTEXT, Main, "main", "patchBuilding", true),
            Context::new(NORMAL_MAIN_CONTEXT, Main, "main", "normal", false),
            Context::new(CONFIRMATION_CONTEXT, PopupTemporary, "confirmation", "confirmation", true),
            Context::new(COMMIT_MESSAGE_CONTEXT, PopupPersistent, "commitMessage", "commitMessage", true),
            Context::new(COMMAND_LOG_CONTEXT, Extras, "extras", "cmdLog", false),
        ];

        Self { contexts }
    }

    /// Re-home a context to a different window. Only meaningful for transient
    /// contexts; the window manager repairs the previously occupied window on
    /// the next activation.
    pub fn set_context_window(&mut self, key: ContextKey, window: &str) -> Result<()> {
        let context = self
            .contexts
            .iter_mut()
            .find(|c| c.key == key)
            .ok_or_else(|| AppError::InconsistentState(format!("unknown context key: {key}")))?;
        context.window = window.to_string();
        Ok(())
    }

    /// All contexts in priority order. Determines initial focus and which
    /// view starts on top of a shared window.
    pub fn flatten(&self) -> &[Context] {
        &self.contexts
    }

    pub fn by_key(&self, key: ContextKey) -> Result<&Context> {
        self.contexts
            .iter()
            .find(|c| c.key == key)
            .ok_or_else(|| AppError::InconsistentState(format!("unknown context key: {key}")))
    }

    pub fn context_for_view(&self, view: &str) -> Option<&Context> {
        self.contexts
            .iter()
            .find(|c| c.has_view() && c.view == view)
    }

    /// First focusable context in priority order, used for initial focus.
    pub fn initial_focus(&self) -> &Context {
        self.contexts
            .iter()
            .find(|c| c.focusable)
            .expect("registry always contains a focusable context")
    }

    /// Contexts bound to the given window, in priority order.
    pub fn contexts_for_window<'a>(
        &'a self,
        window: &'a str,
    ) -> impl Iterator<Item = &'a Context> + 'a {
        self.contexts
            .iter()
            .filter(move |c| c.has_view() && c.window == window)
    }
}

impl Default for ContextRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_is_stable_and_contains_every_key() {
        let registry = ContextRegistry::new();
        let keys: Vec<_> = registry.flatten().iter().map(|c| c.key).collect();

        assert_eq!(keys.first(), Some(&GLOBAL_CONTEXT));
        assert!(keys.contains(&COMMITS_CONTEXT));
        assert!(keys.contains(&STAGING_CONTEXT));

        // keys are unique
        let mut deduped = keys.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), keys.len());
    }

    #[test]
    fn initial_focus_is_first_focusable() {
        let registry = ContextRegistry::new();
        assert_eq!(registry.initial_focus().key, STATUS_CONTEXT);
    }

    #[test]
    fn commits_window_is_shared_by_three_contexts() {
        let registry = ContextRegistry::new();
        let keys: Vec<_> = registry
            .contexts_for_window("commits")
            .map(|c| c.key)
            .collect();
        assert_eq!(keys, vec![COMMIT_FILES_CONTEXT, REFLOG_CONTEXT, COMMITS_CONTEXT]);
    }

    #[test]
    fn only_commit_files_is_transient() {
        let registry = ContextRegistry::new();
        let transient: Vec<_> = registry
            .flatten()
            .iter()
            .filter(|c| c.transient)
            .map(|c| c.key)
            .collect();
        assert_eq!(transient, vec![COMMIT_FILES_CONTEXT]);
    }
}
