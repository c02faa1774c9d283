//! Window bookkeeping.
//!
//! A window is a named place on the screen that shows exactly one view at a
//! time. Most windows are 1:1 with views; the exception is the commit-files
//! view, which moves between windows and must vacate cleanly when it does.

use std::collections::HashMap;

use crate::context::{Context, ContextKey, ContextRegistry};
use crate::errors::{AppError, Result};

/// Outcome of [`WindowManager::set_active_context`], letting callers skip
/// focus side effects when nothing changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    Activated,
    Unchanged,
}

pub struct WindowManager {
    /// window name -> view name currently occupying it
    window_view: HashMap<String, String>,
    active: ContextKey,
}

impl WindowManager {
    /// Build the initial window->view map from the registry's priority
    /// order. For a window shared by several contexts the last one listed
    /// starts on top.
    pub fn new(registry: &ContextRegistry) -> Self {
        let mut window_view = HashMap::new();
        for context in registry.flatten() {
            if context.has_view() {
                window_view.insert(context.window.clone(), context.view.to_string());
            }
        }

        Self {
            window_view,
            active: registry.initial_focus().key,
        }
    }

    pub fn active_context(&self) -> ContextKey {
        self.active
    }

    pub fn view_for_window(&self, window: &str) -> Result<&str> {
        self.window_view
            .get(window)
            .map(String::as_str)
            .ok_or_else(|| AppError::InconsistentState(format!("no view for window: {window}")))
    }

    /// Resolve the context currently driving a window. Failing here means the
    /// registry and the window map disagree, which is a bug, not a condition
    /// to recover from.
    pub fn context_for_window<'a>(
        &self,
        registry: &'a ContextRegistry,
        window: &str,
    ) -> Result<&'a Context> {
        let view = self.view_for_window(window)?;
        registry.context_for_view(view).ok_or_else(|| {
            AppError::InconsistentState(format!("no context claims view {view} in window {window}"))
        })
    }

    /// Make a context the active one for its window. A second activation of
    /// the already-active context is a no-op so callers can re-enter freely
    /// without re-running focus hooks.
    pub fn set_active_context(
        &mut self,
        registry: &ContextRegistry,
        key: ContextKey,
    ) -> Result<Activation> {
        let context = registry.by_key(key)?.clone();

        if self.active == key && self.view_for_window(&context.window).ok() == Some(context.view) {
            return Ok(Activation::Unchanged);
        }

        if context.transient {
            self.repair_vacated_windows(registry, &context);
        }

        self.window_view
            .insert(context.window.clone(), context.view.to_string());
        self.active = key;

        Ok(Activation::Activated)
    }

    /// When a transient context's view is still recorded in a window other
    /// than the one it now belongs to, that window would be left without a
    /// resolvable occupant. Re-occupy it with the remaining context bound to
    /// it that would normally start on top (last in priority order).
    fn repair_vacated_windows(&mut self, registry: &ContextRegistry, moved: &Context) {
        let vacated: Vec<String> = self
            .window_view
            .iter()
            .filter(|(window, view)| view.as_str() == moved.view && **window != moved.window)
            .map(|(window, _)| window.clone())
            .collect();

        for window in vacated {
            let replacement = registry
                .contexts_for_window(&window)
                .filter(|c| c.key != moved.key)
                .last();
            if let Some(replacement) = replacement {
                let view = replacement.view.to_string();
                self.window_view.insert(window, view);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{
        COMMITS_CONTEXT, COMMIT_FILES_CONTEXT, NORMAL_MAIN_CONTEXT, STAGING_CONTEXT,
    };

    fn setup() -> (ContextRegistry, WindowManager) {
        let registry = ContextRegistry::new();
        let windows = WindowManager::new(&registry);
        (registry, windows)
    }

    #[test]
    fn initial_map_prefers_last_context_per_window() {
        let (registry, windows) = setup();
        // commits window is shared by commitFiles, reflogCommits and commits;
        // the last one in priority order starts on top
        assert_eq!(windows.view_for_window("commits").unwrap(), "commits");
        assert_eq!(windows.view_for_window("main").unwrap(), "normal");
        assert_eq!(
            windows.context_for_window(&registry, "main").unwrap().key,
            NORMAL_MAIN_CONTEXT
        );
    }

    #[test]
    fn activating_same_context_twice_is_noop() {
        let (registry, mut windows) = setup();
        assert_eq!(
            windows
                .set_active_context(&registry, COMMITS_CONTEXT)
                .unwrap(),
            Activation::Activated
        );
        assert_eq!(
            windows
                .set_active_context(&registry, COMMITS_CONTEXT)
                .unwrap(),
            Activation::Unchanged
        );
    }

    #[test]
    fn transient_context_vacates_old_window_on_move() {
        let (mut registry, mut windows) = setup();

        // commit-files takes over the commits window
        windows
            .set_active_context(&registry, COMMIT_FILES_CONTEXT)
            .unwrap();
        assert_eq!(windows.view_for_window("commits").unwrap(), "commitFiles");

        // the view is re-homed to the branches window (entered from there)
        registry
            .set_context_window(COMMIT_FILES_CONTEXT, "branches")
            .unwrap();
        windows
            .set_active_context(&registry, COMMIT_FILES_CONTEXT)
            .unwrap();

        assert_eq!(windows.view_for_window("branches").unwrap(), "commitFiles");
        // the commits window must not be orphaned: the context that normally
        // sits on top of it re-occupies
        let ctx = windows.context_for_window(&registry, "commits").unwrap();
        assert_eq!(ctx.key, COMMITS_CONTEXT);
    }

    #[test]
    fn unknown_window_is_a_defect() {
        let (_registry, windows) = setup();
        let err = windows.view_for_window("nope").unwrap_err();
        assert!(err.is_defect());
    }

    #[test]
    fn activating_staging_replaces_main_view() {
        let (registry, mut windows) = setup();
        windows
            .set_active_context(&registry, STAGING_CONTEXT)
            .unwrap();
        assert_eq!(windows.view_for_window("main").unwrap(), "staging");
        assert_eq!(
            windows.context_for_window(&registry, "main").unwrap().key,
            STAGING_CONTEXT
        );
    }
}
