//! File-level diff: line-by-line comparison of file contents.
//!
//! Uses the `similar` crate (Myers diff algorithm) to produce structured
//! hunks with context lines. Content that is not valid UTF-8 on either side
//! gets an explicit [`DiffOutcome::Binary`] instead of a line diff.

use similar::{ChangeTag, TextDiff};

/// Context lines kept around each change.
const CONTEXT_LINES: usize = 3;

/// The result of diffing two file versions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileDiff {
    pub outcome: DiffOutcome,
    /// Lines only in the new version.
    pub added: usize,
    /// Lines only in the old version.
    pub removed: usize,
}

/// Text hunks, or a binary comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffOutcome {
    Text { hunks: Vec<DiffHunk> },
    Binary { differs: bool, old_size: usize, new_size: usize },
}

impl FileDiff {
    /// Returns `true` if the two versions differ.
    pub fn is_different(&self) -> bool {
        match &self.outcome {
            DiffOutcome::Text { hunks } => !hunks.is_empty(),
            DiffOutcome::Binary { differs, .. } => *differs,
        }
    }

    /// Returns `true` if either side was not valid UTF-8.
    pub fn is_binary(&self) -> bool {
        matches!(self.outcome, DiffOutcome::Binary { .. })
    }

    /// Hunks of a text diff; empty for binary content.
    pub fn hunks(&self) -> &[DiffHunk] {
        match &self.outcome {
            DiffOutcome::Text { hunks } => hunks,
            DiffOutcome::Binary { .. } => &[],
        }
    }

    /// Changed line count (`added + removed`).
    pub fn changed_lines(&self) -> usize {
        self.added + self.removed
    }

    /// Render as unified-diff lines (without trailing newlines).
    ///
    /// Identical content renders as no lines at all.
    pub fn unified(&self, old_label: &str, new_label: &str) -> Vec<String> {
        match &self.outcome {
            DiffOutcome::Binary { differs: false, .. } => Vec::new(),
            DiffOutcome::Binary { differs: true, .. } => {
                vec![format!("Binary files {old_label} and {new_label} differ")]
            }
            DiffOutcome::Text { hunks } if hunks.is_empty() => Vec::new(),
            DiffOutcome::Text { hunks } => {
                let mut out = vec![format!("--- {old_label}"), format!("+++ {new_label}")];
                for hunk in hunks {
                    out.push(hunk.header());
                    out.extend(hunk.lines.iter().map(DiffLine::render));
                }
                out
            }
        }
    }
}

/// A contiguous region of changes in a diff.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffHunk {
    /// Line number in the old content where this hunk starts (1-based).
    pub old_start: usize,
    /// Number of lines from the old content in this hunk.
    pub old_count: usize,
    /// Line number in the new content where this hunk starts (1-based).
    pub new_start: usize,
    /// Number of lines from the new content in this hunk.
    pub new_count: usize,
    /// The individual diff lines in this hunk.
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// The `@@ -a,b +c,d @@` header.
    pub fn header(&self) -> String {
        format!(
            "@@ -{} +{} @@",
            range(self.old_start, self.old_count),
            range(self.new_start, self.new_count)
        )
    }
}

fn range(start: usize, count: usize) -> String {
    // An empty side points at the line before the hunk.
    let start = if count == 0 { start.saturating_sub(1) } else { start };
    format!("{start},{count}")
}

/// A single line in a diff hunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffLine {
    /// A line present in both old and new (context).
    Context(String),
    /// A line added in the new content.
    Added(String),
    /// A line removed from the old content.
    Removed(String),
}

impl DiffLine {
    fn render(&self) -> String {
        match self {
            DiffLine::Context(t) => format!(" {t}"),
            DiffLine::Added(t) => format!("+{t}"),
            DiffLine::Removed(t) => format!("-{t}"),
        }
    }
}

/// Compute a line-by-line diff between two byte slices.
pub fn compare_files(old: &[u8], new: &[u8]) -> FileDiff {
    let (old_str, new_str) = match (std::str::from_utf8(old), std::str::from_utf8(new)) {
        (Ok(o), Ok(n)) => (o, n),
        _ => {
            return FileDiff {
                outcome: DiffOutcome::Binary {
                    differs: old != new,
                    old_size: old.len(),
                    new_size: new.len(),
                },
                added: 0,
                removed: 0,
            }
        }
    };

    if old_str == new_str {
        return FileDiff {
            outcome: DiffOutcome::Text { hunks: Vec::new() },
            added: 0,
            removed: 0,
        };
    }

    let text_diff = TextDiff::from_lines(old_str, new_str);
    let mut hunks = Vec::new();
    let mut added = 0;
    let mut removed = 0;

    for group in text_diff.grouped_ops(CONTEXT_LINES) {
        let mut lines = Vec::new();
        let (mut old_count, mut new_count) = (0usize, 0usize);
        let old_start = group.first().map_or(0, |op| op.old_range().start) + 1;
        let new_start = group.first().map_or(0, |op| op.new_range().start) + 1;

        for op in &group {
            for change in text_diff.iter_changes(op) {
                let text = change
                    .value()
                    .trim_end_matches('\n')
                    .trim_end_matches('\r')
                    .to_string();
                match change.tag() {
                    ChangeTag::Equal => {
                        lines.push(DiffLine::Context(text));
                        old_count += 1;
                        new_count += 1;
                    }
                    ChangeTag::Delete => {
                        lines.push(DiffLine::Removed(text));
                        old_count += 1;
                        removed += 1;
                    }
                    ChangeTag::Insert => {
                        lines.push(DiffLine::Added(text));
                        new_count += 1;
                        added += 1;
                    }
                }
            }
        }

        hunks.push(DiffHunk {
            old_start,
            old_count,
            new_start,
            new_count,
            lines,
        });
    }

    FileDiff {
        outcome: DiffOutcome::Text { hunks },
        added,
        removed,
    }
}
