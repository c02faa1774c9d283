//! Branch view-model with reflog-derived recency ordering.

use std::collections::HashMap;

use ratatui::widgets::ListState;

#[derive(Clone, Debug)]
pub struct Branch {
    pub name: String,
    pub is_current: bool,
    pub is_remote: bool,
    pub upstream: Option<String>,
    pub track: Option<String>,
    /// Position in the reflog's checkout history; `None` until the reflog
    /// has been fetched (provisional ordering during startup).
    pub recency_rank: Option<usize>,
}

/// Derive the checkout-recency order of branch names from reflog subjects
/// ("checkout: moving from X to Y"). The most recently checked out branch
/// ranks first; branches never checked out get no rank.
pub fn checkout_recency(reflog_subjects: &[String]) -> HashMap<String, usize> {
    let mut ranks = HashMap::new();
    let mut next = 0usize;

    for subject in reflog_subjects {
        let Some(rest) = subject.strip_prefix("checkout: moving from ") else {
            continue;
        };
        let Some((from, to)) = rest.split_once(" to ") else {
            continue;
        };
        for name in [to, from] {
            if !name.is_empty() && !ranks.contains_key(name) {
                ranks.insert(name.to_string(), next);
                next += 1;
            }
        }
    }

    ranks
}

/// Re-derive branch recency from the reflog and sort: current branch first,
/// then by recency, then remaining locals by name, remotes last.
pub fn apply_recency(branches: &mut [Branch], ranks: &HashMap<String, usize>) {
    for b in branches.iter_mut() {
        b.recency_rank = ranks.get(&b.name).copied();
    }
    branches.sort_by(|a, b| {
        b.is_current
            .cmp(&a.is_current)
            .then(a.is_remote.cmp(&b.is_remote))
            .then_with(|| match (a.recency_rank, b.recency_rank) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.name.cmp(&b.name),
            })
    });
}

fn fuzzy_score(haystack: &str, needle: &str) -> Option<i32> {
    let n = needle.trim();
    if n.is_empty() {
        return Some(0);
    }

    let mut score: i32 = 0;
    let mut last_match: Option<usize> = None;
    let mut pos = 0usize;

    for ch in n.chars() {
        let mut found_at: Option<usize> = None;
        for (i, hc) in haystack[pos..].char_indices() {
            if hc == ch {
                found_at = Some(pos + i);
                break;
            }
        }
        let idx = found_at?;

        score += 10;
        if let Some(prev) = last_match {
            if idx == prev + 1 {
                score += 15;
            }
        } else {
            score += (30 - idx as i32).max(0);
        }

        last_match = Some(idx);
        pos = idx + ch.len_utf8();
    }

    Some(score)
}

/// Selection + filter state for the branches panel. The branch list itself
/// is a session table; `filtered` holds indices into it.
pub struct BranchesPanel {
    pub query: String,
    pub filter_edit: bool,
    pub filtered: Vec<usize>,
    pub list_state: ListState,
}

impl BranchesPanel {
    pub fn new() -> Self {
        Self {
            query: String::new(),
            filter_edit: false,
            filtered: Vec::new(),
            list_state: ListState::default(),
        }
    }

    /// Recompute the filtered view, keeping the previously selected branch
    /// selected when it survives the filter.
    pub fn update_filtered(&mut self, branches: &[Branch]) {
        let q = self.query.trim().to_lowercase();

        let prev = self
            .selected_branch_idx()
            .filter(|idx| *idx < branches.len());

        let mut matches: Vec<(i32, usize)> = Vec::new();
        for (i, b) in branches.iter().enumerate() {
            if q.is_empty() {
                matches.push((0, i));
            } else if let Some(score) = fuzzy_score(&b.name.to_lowercase(), &q) {
                matches.push((score, i));
            }
        }
        matches.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        self.filtered = matches.into_iter().map(|(_, i)| i).collect();

        if self.filtered.is_empty() {
            self.list_state.select(None);
            return;
        }

        let desired = prev
            .and_then(|p| self.filtered.iter().position(|i| *i == p))
            .unwrap_or(0);
        self.list_state.select(Some(desired));
    }

    pub fn selected_branch_idx(&self) -> Option<usize> {
        let sel = self.list_state.selected()?;
        self.filtered.get(sel).copied()
    }

    pub fn move_selection(&mut self, delta: i64) {
        if self.filtered.is_empty() {
            self.list_state.select(None);
            return;
        }
        let cur = self.list_state.selected().unwrap_or(0) as i64;
        let next = (cur + delta).clamp(0, self.filtered.len() as i64 - 1);
        self.list_state.select(Some(next as usize));
    }
}

impl Default for BranchesPanel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(name: &str) -> Branch {
        Branch {
            name: name.to_string(),
            is_current: false,
            is_remote: false,
            upstream: None,
            track: None,
            recency_rank: None,
        }
    }

    #[test]
    fn recency_comes_from_checkout_entries() {
        let subjects = vec![
            "checkout: moving from main to feature".to_string(),
            "commit: something".to_string(),
            "checkout: moving from old to main".to_string(),
        ];
        let ranks = checkout_recency(&subjects);
        assert_eq!(ranks["feature"], 0);
        assert_eq!(ranks["main"], 1);
        assert_eq!(ranks["old"], 2);
    }

    #[test]
    fn current_branch_sorts_first_then_recency() {
        let mut branches = vec![branch("zebra"), branch("feature"), branch("main")];
        branches[2].is_current = true;

        let subjects = vec!["checkout: moving from zebra to feature".to_string()];
        apply_recency(&mut branches, &checkout_recency(&subjects));

        let names: Vec<_> = branches.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["main", "feature", "zebra"]);
    }

    #[test]
    fn unranked_branches_sort_by_name_after_ranked() {
        let mut branches = vec![branch("bbb"), branch("aaa"), branch("hot")];
        let subjects = vec!["checkout: moving from main to hot".to_string()];
        apply_recency(&mut branches, &checkout_recency(&subjects));

        let names: Vec<_> = branches.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["hot", "aaa", "bbb"]);
    }

    #[test]
    fn filter_keeps_selection_on_surviving_branch() {
        let branches = vec![branch("main"), branch("feature-x"), branch("feature-y")];
        let mut panel = BranchesPanel::new();
        panel.update_filtered(&branches);
        panel.move_selection(2);
        assert_eq!(panel.selected_branch_idx(), Some(2));

        panel.query = "feat".to_string();
        panel.update_filtered(&branches);
        assert_eq!(panel.selected_branch_idx(), Some(2));

        panel.query = "nomatch".to_string();
        panel.update_filtered(&branches);
        assert_eq!(panel.selected_branch_idx(), None);
    }
}
