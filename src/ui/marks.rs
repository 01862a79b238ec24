//! Mark commands
//!
//! Marks live in the `mark` column of each display line and are reset to
//! unmarked whenever the view is re-rendered.

use super::tree::DisplayLine;
use crate::core::Mark;

/// Set `mark` on `count` lines starting at `start`
///
/// Stops quietly at the last line. Returns how many lines were visited, which
/// is how far the cursor should advance.
pub fn mark_lines(lines: &mut [DisplayLine], start: usize, count: usize, mark: Mark) -> usize {
    let end = start.saturating_add(count).min(lines.len());
    if start >= end {
        return 0;
    }
    for line in &mut lines[start..end] {
        line.mark = mark;
    }
    end - start
}

/// Clear every mark
pub fn unmark_all(lines: &mut [DisplayLine]) {
    for line in lines {
        line.mark = Mark::Unmarked;
    }
}

/// Number of lines carrying a signal mark
pub fn marked_count(lines: &[DisplayLine]) -> usize {
    lines.iter().filter(|l| l.mark.is_marked()).count()
}
