//! Line-oriented diff of multi-line strings.

use similar::{ChangeTag, TextDiff};
use std::fmt::Write;

/// Lines of context kept around each hunk.
const CONTEXT_LINES: usize = 3;

/// Returns true if either side spans more than one line.
pub fn is_multiline(old: &str, new: &str) -> bool {
    old.contains('\n') || new.contains('\n')
}

/// Renders a unified diff of `old` and `new`, one line per entry.
///
/// The diff is an annotation for humans; equality of the two strings is
/// decided by the caller.
pub fn line_diff(old: &str, new: &str) -> String {
    let text_diff = TextDiff::from_lines(old, new);
    let mut out = String::from("--- \n+++ ");

    for hunk in text_diff.grouped_ops(CONTEXT_LINES) {
        let (Some(first), Some(last)) = (hunk.first(), hunk.last()) else {
            continue;
        };
        let old_start = first.old_range().start;
        let new_start = first.new_range().start;
        let old_count = last.old_range().end - old_start;
        let new_count = last.new_range().end - new_start;
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "\n@@ -{},{} +{},{} @@",
            old_start + 1,
            old_count,
            new_start + 1,
            new_count
        );

        for op in &hunk {
            for change in text_diff.iter_changes(op) {
                let marker = match change.tag() {
                    ChangeTag::Equal => ' ',
                    ChangeTag::Delete => '-',
                    ChangeTag::Insert => '+',
                };
                let text = change.value().trim_end_matches('\n');
                let _ = write!(out, "\n{}{}", marker, text);
            }
        }
    }
    out
}
