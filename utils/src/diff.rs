//! Line diff formatting for assertion messages.

use std::fmt::Write as _;

use similar::{ChangeTag, TextDiff};

/// Unchanged lines between two changes beyond which the run is collapsed.
const GAP_THRESHOLD: usize = 3;

/// Format a line diff from `expected` to `actual`.
///
/// Produces output with:
/// - 1 line of context around each change
/// - `...` between changes separated by >3 unchanged lines
/// - `-` for lines only in `expected`, `+` for lines only in `actual`
///
/// Returns an empty string when the inputs have identical lines.
#[must_use]
pub fn format_line_diff(expected: &str, actual: &str) -> String {
    let diff = TextDiff::from_lines(expected, actual);
    let changes: Vec<_> = diff.iter_all_changes().collect();
    if changes.iter().all(|c| c.tag() == ChangeTag::Equal) {
        return String::new();
    }

    let max_line = expected.lines().count().max(actual.lines().count());
    let width = max_line.max(1).to_string().len();
    let gap_marker = format!("{:>width$}\n", "...");

    let mut out = String::new();
    let mut last_output_idx: Option<usize> = None;

    for (i, change) in changes.iter().enumerate() {
        let near_change = change.tag() != ChangeTag::Equal
            || (i > 0 && changes[i - 1].tag() != ChangeTag::Equal)
            || changes
                .get(i + 1)
                .is_some_and(|c| c.tag() != ChangeTag::Equal);
        if !near_change {
            continue;
        }

        if let Some(last_idx) = last_output_idx
            && i - last_idx - 1 > GAP_THRESHOLD
        {
            out.push_str(&gap_marker);
        }

        let (index, marker) = match change.tag() {
            ChangeTag::Equal => (change.old_index(), ' '),
            ChangeTag::Delete => (change.old_index(), '-'),
            ChangeTag::Insert => (change.new_index(), '+'),
        };
        let line_no = index.map_or(0, |n| n + 1);
        let _ = writeln!(
            out,
            "{line_no:>width$} {marker}{}",
            change.value().trim_end_matches('\n')
        );
        last_output_idx = Some(i);
    }

    out
}
