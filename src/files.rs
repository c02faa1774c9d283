//! Working-tree files panel: the entry point into line-by-line staging.

use ratatui::widgets::ListState;

use crate::git_ops::FileEntry;

pub struct FilesPanel {
    pub entries: Vec<FileEntry>,
    pub list_state: ListState,
}

impl FilesPanel {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            list_state: ListState::default(),
        }
    }

    pub fn set_entries(&mut self, entries: Vec<FileEntry>) {
        let prev_path = self.selected_entry().map(|e| e.path.clone());
        self.entries = entries;

        if self.entries.is_empty() {
            self.list_state.select(None);
            return;
        }

        // keep the cursor on the same file across refreshes when possible
        let desired = prev_path
            .and_then(|p| self.entries.iter().position(|e| e.path == p))
            .unwrap_or(0);
        self.list_state.select(Some(desired));
    }

    pub fn selected_entry(&self) -> Option<&FileEntry> {
        let sel = self.list_state.selected()?;
        self.entries.get(sel)
    }

    pub fn move_selection(&mut self, delta: i64) {
        if self.entries.is_empty() {
            self.list_state.select(None);
            return;
        }
        let cur = self.list_state.selected().unwrap_or(0) as i64;
        let next = (cur + delta).clamp(0, self.entries.len() as i64 - 1);
        self.list_state.select(Some(next as usize));
    }
}

impl Default for FilesPanel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str) -> FileEntry {
        FileEntry {
            path: path.to_string(),
            staged_status: ' ',
            worktree_status: 'M',
            is_untracked: false,
        }
    }

    #[test]
    fn selection_follows_file_across_refresh() {
        let mut panel = FilesPanel::new();
        panel.set_entries(vec![entry("a"), entry("b"), entry("c")]);
        panel.move_selection(1);
        assert_eq!(panel.selected_entry().unwrap().path, "b");

        // "a" disappears after staging; cursor stays on "b"
        panel.set_entries(vec![entry("b"), entry("c")]);
        assert_eq!(panel.selected_entry().unwrap().path, "b");

        // selected file gone entirely: fall back to the top
        panel.set_entries(vec![entry("x")]);
        assert_eq!(panel.selected_entry().unwrap().path, "x");

        panel.set_entries(Vec::new());
        assert!(panel.selected_entry().is_none());
    }
}
