//! Line-addressed diff document with a selection state machine.
//!
//! Two panels drive this engine: the staging panel (stage individual lines of
//! a working-tree diff) and the patch-building panel (pick lines of an old
//! commit's file into a custom patch). The engine parses raw unified-diff
//! text into hunks, tracks a cursor plus an optional ranged selection, works
//! out minimal-scroll viewport origins, and renders a selection-aware view.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    /// diff --git / index / --- / +++ / mode lines
    FileHeader,
    /// @@ -a,b +c,d @@
    HunkHeader,
    Context,
    Addition,
    Deletion,
    /// "\ No newline at end of file"
    NoNewline,
}

#[derive(Clone, Debug)]
pub struct PatchLine {
    pub kind: LineKind,
    /// Raw line text including the leading diff marker.
    pub text: String,
}

impl PatchLine {
    pub fn is_change(&self) -> bool {
        matches!(self.kind, LineKind::Addition | LineKind::Deletion)
    }
}

/// A contiguous block of lines sharing one `@@` header. `start` is the index
/// of the header line itself; the hunk's range runs to the line before the
/// next hunk's header (or the end of the document). The first hunk's range is
/// extended back to line 0 so the hunks partition the whole document.
#[derive(Clone, Copy, Debug)]
pub struct Hunk {
    pub start: usize,
    pub old_start: u32,
    pub new_start: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectMode {
    Line,
    Range,
    Hunk,
}

/// Selection state over a parsed diff. Owned by exactly one panel at a time;
/// rebuilt on every diff refresh, optionally seeded from the previous state
/// so the cursor survives the refresh.
pub struct PatchState {
    lines: Vec<PatchLine>,
    hunks: Vec<Hunk>,
    mode: SelectMode,
    selected_idx: usize,
    /// Range anchor. Only meaningful in Range/Hunk mode.
    anchor_idx: usize,
}

impl PatchState {
    /// Parse a diff and build selection state. Returns `None` when the diff
    /// has no stageable (added/deleted) lines; callers must then treat the
    /// panel as empty and skip focus entirely.
    pub fn new(diff: &str, selected_idx: Option<usize>, old: Option<&PatchState>) -> Option<Self> {
        let lines = parse_lines(diff);
        let hunks = find_hunks(&lines);

        if hunks.is_empty() || !lines.iter().any(PatchLine::is_change) {
            return None;
        }

        let first_stageable = lines
            .iter()
            .position(PatchLine::is_change)
            .unwrap_or(hunks[0].start);

        let initial = selected_idx
            .or(old.map(|s| s.selected_idx))
            .unwrap_or(first_stageable)
            .min(lines.len() - 1);

        Some(Self {
            lines,
            hunks,
            mode: SelectMode::Line,
            selected_idx: initial,
            anchor_idx: initial,
        })
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[PatchLine] {
        &self.lines
    }

    pub fn hunk_count(&self) -> usize {
        self.hunks.len()
    }

    pub fn mode(&self) -> SelectMode {
        self.mode
    }

    pub fn selected_idx(&self) -> usize {
        self.selected_idx
    }

    /// Inclusive range of selected line indices.
    pub fn selected_range(&self) -> (usize, usize) {
        match self.mode {
            SelectMode::Line => (self.selected_idx, self.selected_idx),
            SelectMode::Range => (
                self.anchor_idx.min(self.selected_idx),
                self.anchor_idx.max(self.selected_idx),
            ),
            SelectMode::Hunk => {
                let lo = self.hunk_containing(self.anchor_idx.min(self.selected_idx));
                let hi = self.hunk_containing(self.anchor_idx.max(self.selected_idx));
                (self.hunk_range(lo).0, self.hunk_range(hi).1)
            }
        }
    }

    /// Move the cursor by one line. Clamps at the document boundaries; no
    /// wraparound.
    pub fn cycle_selection(&mut self, forward: bool) {
        let next = if forward {
            self.selected_idx.saturating_add(1)
        } else {
            self.selected_idx.saturating_sub(1)
        };
        self.selected_idx = next.min(self.lines.len() - 1);
    }

    /// Jump to the next/previous hunk's header line, clamping at the first
    /// and last hunk. The selection mode is untouched; in Hunk mode the
    /// anchor follows so exactly the new hunk is selected.
    pub fn cycle_hunk(&mut self, forward: bool) {
        let current = self.hunk_containing(self.selected_idx);
        let next = if forward {
            (current + 1).min(self.hunks.len() - 1)
        } else {
            current.saturating_sub(1)
        };
        self.selected_idx = self.hunks[next].start;
        if self.mode == SelectMode::Hunk {
            self.anchor_idx = self.selected_idx;
        }
    }

    /// Toggle Range mode. Entering anchors at the cursor; leaving returns to
    /// Line mode with the cursor where it is now, not back at the anchor.
    pub fn toggle_select_range(&mut self) {
        if self.mode == SelectMode::Range {
            self.mode = SelectMode::Line;
        } else {
            self.mode = SelectMode::Range;
            self.anchor_idx = self.selected_idx;
        }
    }

    /// Toggle Hunk mode, anchoring at the cursor on entry.
    pub fn toggle_select_hunk(&mut self) {
        if self.mode == SelectMode::Hunk {
            self.mode = SelectMode::Line;
        } else {
            self.mode = SelectMode::Hunk;
            self.anchor_idx = self.selected_idx;
        }
    }

    /// Move the cursor to `idx`, extending the active range when one exists.
    pub fn select_line(&mut self, idx: usize) {
        self.selected_idx = idx.min(self.lines.len() - 1);
    }

    /// Start a fresh range anchored at `idx` (a new pointer-down), as opposed
    /// to extending the current range.
    pub fn select_new_line_for_range(&mut self, idx: usize) {
        let idx = idx.min(self.lines.len() - 1);
        self.mode = SelectMode::Range;
        self.anchor_idx = idx;
        self.selected_idx = idx;
    }

    pub fn set_line_select_mode(&mut self) {
        self.mode = SelectMode::Line;
    }

    /// Page-relative move: forces Line mode, clamps to the document.
    pub fn adjust_selected_line_idx(&mut self, delta: i64) {
        self.set_line_select_mode();
        let target = self.selected_idx as i64 + delta;
        let max = (self.lines.len() - 1) as i64;
        self.selected_idx = target.clamp(0, max) as usize;
    }

    pub fn select_top(&mut self) {
        self.selected_idx = 0;
    }

    pub fn select_bottom(&mut self) {
        self.selected_idx = self.lines.len() - 1;
    }

    /// Deterministic scroll-follow: keep the current origin when the cursor
    /// is already visible, otherwise move it the minimal amount, never going
    /// negative or past the end of the content.
    pub fn calculate_origin(&self, current_origin: usize, viewport_height: usize) -> usize {
        if viewport_height == 0 {
            return 0;
        }
        let max_origin = self.lines.len().saturating_sub(viewport_height);

        let origin = if self.selected_idx < current_origin {
            self.selected_idx
        } else if self.selected_idx >= current_origin + viewport_height {
            self.selected_idx + 1 - viewport_height
        } else {
            current_origin
        };

        origin.min(max_origin)
    }

    /// Line number of the cursor in the underlying file: the new-file number
    /// for additions and context, the old-file number for deletions. Used for
    /// "open file at line".
    pub fn current_line_number(&self) -> u32 {
        let hunk = self.hunks[self.hunk_containing(self.selected_idx)];
        let mut old_ln = hunk.old_start;
        let mut new_ln = hunk.new_start;

        for idx in (hunk.start + 1)..=self.selected_idx.min(self.lines.len() - 1) {
            let kind = self.lines[idx].kind;
            if idx == self.selected_idx {
                return match kind {
                    LineKind::Deletion => old_ln,
                    _ => new_ln,
                };
            }
            match kind {
                LineKind::Context => {
                    old_ln += 1;
                    new_ln += 1;
                }
                LineKind::Addition => new_ln += 1,
                LineKind::Deletion => old_ln += 1,
                _ => {}
            }
        }

        new_ln
    }

    /// Raw text of the selected lines, for the clipboard.
    pub fn plain_render_selected(&self) -> String {
        let (lo, hi) = self.selected_range();
        self.lines[lo..=hi]
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Build a patch containing only the selected change lines, suitable for
    /// `git apply`. Deletions outside the selection become context; additions
    /// outside it are dropped; hunk headers are recounted. Hunks left with no
    /// changes are omitted, and `None` is returned when nothing at all
    /// survives.
    pub fn modified_patch_for_selection(&self) -> Option<String> {
        let (lo, hi) = self.selected_range();
        let selected = |idx: usize| idx >= lo && idx <= hi;

        let mut out: Vec<String> = Vec::new();
        for line in &self.lines {
            if line.kind != LineKind::FileHeader {
                break;
            }
            out.push(line.text.clone());
        }

        let mut kept_any = false;
        for i in 0..self.hunks.len() {
            let hunk = self.hunks[i];
            let (_, range_end) = self.hunk_range(i);

            let mut body: Vec<String> = Vec::new();
            let mut old_count = 0u32;
            let mut new_count = 0u32;
            let mut changed = false;

            for idx in (hunk.start + 1)..=range_end {
                let line = &self.lines[idx];
                match line.kind {
                    LineKind::Context => {
                        old_count += 1;
                        new_count += 1;
                        body.push(line.text.clone());
                    }
                    LineKind::Deletion => {
                        if selected(idx) {
                            old_count += 1;
                            changed = true;
                            body.push(line.text.clone());
                        } else {
                            // an unstaged deletion is still present in the file
                            old_count += 1;
                            new_count += 1;
                            body.push(format!(" {}", &line.text[1..]));
                        }
                    }
                    LineKind::Addition => {
                        if selected(idx) {
                            new_count += 1;
                            changed = true;
                            body.push(line.text.clone());
                        }
                    }
                    LineKind::NoNewline => body.push(line.text.clone()),
                    LineKind::FileHeader | LineKind::HunkHeader => {}
                }
            }

            if changed {
                kept_any = true;
                out.push(format!(
                    "@@ -{},{} +{},{} @@",
                    hunk.old_start, old_count, hunk.new_start, new_count
                ));
                out.append(&mut body);
            }
        }

        if !kept_any {
            return None;
        }

        let mut patch = out.join("\n");
        patch.push('\n');
        Some(patch)
    }

    /// Selection-highlighted rendering of the diff. When `included` is given
    /// (building a partial patch against a prior selection), change lines
    /// outside that set render de-emphasized but stay navigable.
    pub fn render(&self, included: Option<&[usize]>) -> Text<'static> {
        let (sel_lo, sel_hi) = self.selected_range();

        let mut rendered = Vec::with_capacity(self.lines.len());
        for (idx, line) in self.lines.iter().enumerate() {
            let mut style = match line.kind {
                LineKind::FileHeader => Style::default().add_modifier(Modifier::BOLD),
                LineKind::HunkHeader => Style::default().fg(Color::Cyan),
                LineKind::Addition => Style::default().fg(Color::Green),
                LineKind::Deletion => Style::default().fg(Color::Red),
                LineKind::Context => Style::default(),
                LineKind::NoNewline => Style::default().fg(Color::DarkGray),
            };

            if let Some(included) = included {
                if line.is_change() && !included.contains(&idx) {
                    style = Style::default().fg(Color::DarkGray);
                }
            }

            if idx >= sel_lo && idx <= sel_hi {
                style = style.add_modifier(Modifier::REVERSED);
            }

            rendered.push(Line::from(Span::styled(line.text.clone(), style)));
        }

        Text::from(rendered)
    }

    /// Index of the hunk whose range contains `idx`. Lines before the first
    /// hunk header count as part of the first hunk.
    pub fn hunk_containing(&self, idx: usize) -> usize {
        match self.hunks.iter().rposition(|h| h.start <= idx) {
            Some(i) => i,
            None => 0,
        }
    }

    /// Inclusive line range of hunk `i`; the first hunk reaches back to the
    /// top of the document so the hunks cover every line exactly once.
    pub fn hunk_range(&self, i: usize) -> (usize, usize) {
        let lo = if i == 0 { 0 } else { self.hunks[i].start };
        let hi = match self.hunks.get(i + 1) {
            Some(next) => next.start - 1,
            None => self.lines.len() - 1,
        };
        (lo, hi)
    }
}

fn parse_lines(diff: &str) -> Vec<PatchLine> {
    diff.lines()
        .map(|raw| {
            let kind = if raw.starts_with("@@") {
                LineKind::HunkHeader
            } else if raw.starts_with("+++ ") || raw.starts_with("--- ") {
                LineKind::FileHeader
            } else if raw.starts_with('+') {
                LineKind::Addition
            } else if raw.starts_with('-') {
                LineKind::Deletion
            } else if raw.starts_with("\\ No newline") {
                LineKind::NoNewline
            } else if raw.starts_with(' ') {
                LineKind::Context
            } else {
                LineKind::FileHeader
            };
            PatchLine {
                kind,
                text: raw.to_string(),
            }
        })
        .collect()
}

fn find_hunks(lines: &[PatchLine]) -> Vec<Hunk> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.kind == LineKind::HunkHeader)
        .filter_map(|(idx, l)| {
            parse_hunk_header(&l.text).map(|(old_start, new_start)| Hunk {
                start: idx,
                old_start,
                new_start,
            })
        })
        .collect()
}

fn parse_hunk_header(line: &str) -> Option<(u32, u32)> {
    let rest = line.trim().strip_prefix("@@")?;
    let (range, _) = rest.trim_start().split_once("@@")?;
    let mut it = range.trim().split_whitespace();
    let old_tok = it.next()?;
    let new_tok = it.next()?;

    let old_start = old_tok.strip_prefix('-')?.split(',').next()?.parse().ok()?;
    let new_start = new_tok.strip_prefix('+')?.split(',').next()?.parse().ok()?;

    Some((old_start, new_start))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_HUNKS: &str = "\
@@ -1,4 +1,4 @@
 fn main() {
-    println!(\"old\");
+    println!(\"new\");
 }
@@ -10,4 +10,4 @@
 fn other() {
-    let a = 1;
+    let a = 2;
 }";

    fn state(diff: &str) -> PatchState {
        PatchState::new(diff, None, None).expect("diff has stageable lines")
    }

    #[test]
    fn empty_diff_has_no_content() {
        assert!(PatchState::new("", None, None).is_none());
        assert!(PatchState::new("diff --git a/x b/x\nindex 000..111 100644\n", None, None).is_none());
    }

    #[test]
    fn initial_selection_is_first_change_line() {
        let s = state(TWO_HUNKS);
        assert_eq!(s.selected_idx(), 2);
        assert_eq!(s.lines()[2].kind, LineKind::Deletion);
    }

    #[test]
    fn selection_survives_refresh_via_old_state() {
        let mut s = state(TWO_HUNKS);
        s.select_line(7);
        let refreshed = PatchState::new(TWO_HUNKS, None, Some(&s)).unwrap();
        assert_eq!(refreshed.selected_idx(), 7);
    }

    #[test]
    fn explicit_index_wins_over_old_state() {
        let s = state(TWO_HUNKS);
        let refreshed = PatchState::new(TWO_HUNKS, Some(3), Some(&s)).unwrap();
        assert_eq!(refreshed.selected_idx(), 3);
    }

    #[test]
    fn cycle_selection_clamps_at_boundaries() {
        let mut s = state(TWO_HUNKS);
        s.select_top();
        s.cycle_selection(false);
        assert_eq!(s.selected_idx(), 0);

        s.select_bottom();
        let last = s.line_count() - 1;
        s.cycle_selection(true);
        assert_eq!(s.selected_idx(), last);
    }

    #[test]
    fn index_stays_in_bounds_under_arbitrary_ops() {
        let mut s = state(TWO_HUNKS);
        let n = s.line_count();

        s.adjust_selected_line_idx(1000);
        assert!(s.selected_idx() < n);
        s.adjust_selected_line_idx(-1000);
        assert!(s.selected_idx() < n);
        s.select_line(usize::MAX);
        assert!(s.selected_idx() < n);
        for _ in 0..n + 5 {
            s.cycle_selection(true);
            assert!(s.selected_idx() < n);
        }
        s.cycle_hunk(true);
        s.cycle_hunk(true);
        assert!(s.selected_idx() < n);
    }

    #[test]
    fn cycle_hunk_lands_on_hunk_headers_and_clamps() {
        // two hunks occupying lines 0-4 and 5-9
        let mut s = state(TWO_HUNKS);
        s.select_top();

        s.cycle_hunk(true);
        assert_eq!(s.selected_idx(), 5);
        s.cycle_hunk(true);
        assert_eq!(s.selected_idx(), 5);
        s.cycle_hunk(true);
        assert_eq!(s.selected_idx(), 5);

        s.cycle_hunk(false);
        assert_eq!(s.selected_idx(), 0);
        s.cycle_hunk(false);
        assert_eq!(s.selected_idx(), 0);
    }

    #[test]
    fn hunks_partition_the_document() {
        let s = state(TWO_HUNKS);
        let mut covered = 0usize;
        for i in 0..s.hunk_count() {
            let (lo, hi) = s.hunk_range(i);
            assert_eq!(lo, covered);
            covered = hi + 1;
        }
        assert_eq!(covered, s.line_count());
    }

    #[test]
    fn toggle_range_twice_returns_to_line_mode_keeping_cursor() {
        let mut s = state(TWO_HUNKS);
        s.select_line(2);
        s.toggle_select_range();
        assert_eq!(s.mode(), SelectMode::Range);
        s.select_line(6);
        s.toggle_select_range();
        assert_eq!(s.mode(), SelectMode::Line);
        // cursor stays where it was moved to, not back at the anchor
        assert_eq!(s.selected_idx(), 6);
    }

    #[test]
    fn range_extends_from_anchor() {
        let mut s = state(TWO_HUNKS);
        s.select_line(2);
        s.toggle_select_range();
        s.select_line(6);
        assert_eq!(s.selected_range(), (2, 6));
        // moving back before the anchor flips the range
        s.select_line(1);
        assert_eq!(s.selected_range(), (1, 2));
    }

    #[test]
    fn new_range_anchor_replaces_old_one() {
        let mut s = state(TWO_HUNKS);
        s.select_line(1);
        s.toggle_select_range();
        s.select_line(4);
        assert_eq!(s.selected_range(), (1, 4));

        // a fresh pointer-down starts over rather than extending
        s.select_new_line_for_range(7);
        assert_eq!(s.selected_range(), (7, 7));
        s.select_line(8);
        assert_eq!(s.selected_range(), (7, 8));
    }

    #[test]
    fn hunk_mode_selects_whole_hunks() {
        let mut s = state(TWO_HUNKS);
        s.select_line(2);
        s.toggle_select_hunk();
        assert_eq!(s.mode(), SelectMode::Hunk);
        assert_eq!(s.selected_range(), (0, 4));

        s.select_line(7);
        assert_eq!(s.selected_range(), (0, 9));

        s.toggle_select_hunk();
        assert_eq!(s.mode(), SelectMode::Line);
        assert_eq!(s.selected_range(), (7, 7));
    }

    #[test]
    fn page_move_forces_line_mode() {
        let mut s = state(TWO_HUNKS);
        s.toggle_select_range();
        s.adjust_selected_line_idx(3);
        assert_eq!(s.mode(), SelectMode::Line);
    }

    #[test]
    fn origin_keeps_cursor_visible() {
        let mut s = state(TWO_HUNKS);
        let height = 4;

        for idx in 0..s.line_count() {
            s.select_line(idx);
            let origin = s.calculate_origin(0, height);
            assert!(s.selected_idx() >= origin);
            assert!(s.selected_idx() < origin + height);

            let origin = s.calculate_origin(6, height);
            assert!(s.selected_idx() >= origin);
            assert!(s.selected_idx() < origin + height);
        }
    }

    #[test]
    fn origin_unchanged_when_cursor_already_visible() {
        let mut s = state(TWO_HUNKS);
        s.select_line(3);
        assert_eq!(s.calculate_origin(2, 4), 2);
    }

    #[test]
    fn origin_never_scrolls_past_content_end() {
        let mut s = state(TWO_HUNKS);
        s.select_bottom();
        let origin = s.calculate_origin(0, 4);
        assert!(origin <= s.line_count() - 4);

        // viewport taller than content pins the origin at zero
        assert_eq!(s.calculate_origin(3, 50), 0);
    }

    #[test]
    fn current_line_number_tracks_hunk_headers() {
        let mut s = state(TWO_HUNKS);
        s.select_line(1); // " fn main() {" -> new line 1
        assert_eq!(s.current_line_number(), 1);
        s.select_line(2); // deletion -> old line 2
        assert_eq!(s.current_line_number(), 2);
        s.select_line(3); // addition -> new line 2
        assert_eq!(s.current_line_number(), 2);
        s.select_line(6); // second hunk context -> new line 10
        assert_eq!(s.current_line_number(), 10);
    }

    #[test]
    fn plain_render_covers_selected_range() {
        let mut s = state(TWO_HUNKS);
        s.select_line(2);
        s.toggle_select_range();
        s.select_line(3);
        let text = s.plain_render_selected();
        assert_eq!(text, "-    println!(\"old\");\n+    println!(\"new\");");
    }

    #[test]
    fn partial_patch_keeps_only_selected_changes() {
        let mut s = state(TWO_HUNKS);
        s.select_line(2); // deletion in hunk 1 only
        let patch = s.modified_patch_for_selection().unwrap();

        assert!(patch.contains("-    println!(\"old\");"));
        // the unselected addition is dropped entirely
        assert!(!patch.contains("+    println!(\"new\");"));
        // the second hunk had no selected changes and is omitted
        assert!(!patch.contains("let a ="));
        // counts are recomputed: one deletion kept, nothing added
        assert!(patch.contains("@@ -1,3 +1,2 @@"));
    }

    #[test]
    fn unselected_deletions_become_context_in_partial_patch() {
        let mut s = state(TWO_HUNKS);
        s.select_line(3); // addition only; the deletion above stays unstaged
        let patch = s.modified_patch_for_selection().unwrap();
        assert!(patch.contains("     println!(\"old\");"));
        assert!(patch.contains("+    println!(\"new\");"));
        assert!(patch.contains("@@ -1,3 +1,4 @@"));
    }

    #[test]
    fn render_dims_lines_excluded_from_patch() {
        let s = state(TWO_HUNKS);
        let text = s.render(Some(&[2]));
        assert_eq!(text.lines.len(), s.line_count());
        // line 3 is a change not in the included set: dimmed
        let dimmed = &text.lines[3].spans[0];
        assert_eq!(dimmed.style.fg, Some(Color::DarkGray));
        // line 2 is included and keeps its deletion color
        let kept = &text.lines[2].spans[0];
        assert_eq!(kept.style.fg, Some(Color::Red));
    }
}
