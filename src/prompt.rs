//! Modal confirmation and free-text prompts.
//!
//! Mutating actions communicate intent through a confirmation popup before
//! anything executes; the bound action runs only on explicit confirmation
//! and never on cancel. Plan edits are the exception: they apply
//! immediately, since the TODO file is trivially re-editable.

/// Action bound to a confirmation popup, dispatched on confirm only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfirmAction {
    Squash { index: usize },
    Fixup { index: usize },
    Drop { index: usize },
    Edit { index: usize },
    MoveCommit { index: usize, down: bool },
    Revert { sha: String },
    Checkout { rev: String },
    AmendTo { sha: String },
    Pull,
    Push,
    RebaseAbort,
    StashApply { selector: String },
    StashDrop { selector: String },
}

#[derive(Clone, Debug)]
pub struct ConfirmPrompt {
    pub title: &'static str,
    pub prompt: String,
    pub action: ConfirmAction,
}

impl ConfirmPrompt {
    pub fn new(title: &'static str, prompt: impl Into<String>, action: ConfirmAction) -> Self {
        Self {
            title,
            prompt: prompt.into(),
            action,
        }
    }
}

/// Action bound to a free-text prompt, dispatched with the entered text on
/// confirm only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputAction {
    TagCommit { sha: String },
    RewordTopCommit,
}

#[derive(Clone, Debug)]
pub struct InputPrompt {
    pub title: &'static str,
    pub text: String,
    pub action: InputAction,
}

impl InputPrompt {
    pub fn new(title: &'static str, initial: impl Into<String>, action: InputAction) -> Self {
        Self {
            title,
            text: initial.into(),
            action,
        }
    }
}

/// Spinner frames for the waiting status shown while a blocking git
/// operation runs. Input to the owning panel is ignored until it clears.
pub const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

pub fn spinner_frame(tick: usize) -> &'static str {
    SPINNER_FRAMES[tick % SPINNER_FRAMES.len()]
}
