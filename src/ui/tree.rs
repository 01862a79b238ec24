//! Tree rendering
//!
//! Turns a snapshot into display lines in pre-order: a parent immediately
//! precedes its children, siblings follow ascending PID order, the last
//! sibling is drawn with a corner and the others with a tee. Every ancestor
//! that was not a last child contributes a vertical column to its subtree's
//! indentation, a last child contributes a blank column.

use std::collections::HashSet;

use crate::core::{Mark, Pid, ProcessRecord, Snapshot};

/// Tree drawing characters
pub struct TreeStrings {
    pub vert: &'static str,
    pub rtee: &'static str,
    pub bend: &'static str,
    pub blank: &'static str,
}

/// ASCII tree characters
pub const TREE_ASCII: TreeStrings = TreeStrings {
    vert: "| ",
    rtee: "|-",
    bend: "`-",
    blank: "  ",
};

/// Unicode tree characters
pub const TREE_UTF8: TreeStrings = TreeStrings {
    vert: "\u{2502} ",       // │
    rtee: "\u{251c}\u{2500}", // ├─
    bend: "\u{2514}\u{2500}", // └─
    blank: "  ",
};

/// One indentation column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    Blank,
    Vertical,
    Tee,
    Corner,
}

impl Indent {
    pub fn glyph(self, tree_str: &TreeStrings) -> &'static str {
        match self {
            Indent::Blank => tree_str.blank,
            Indent::Vertical => tree_str.vert,
            Indent::Tee => tree_str.rtee,
            Indent::Corner => tree_str.bend,
        }
    }
}

/// One rendered row of the process view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLine {
    pub pid: Pid,
    pub state: char,
    pub indent: Vec<Indent>,
    pub command: String,
    pub mark: Mark,
}

impl DisplayLine {
    fn new(record: &ProcessRecord, indent: Vec<Indent>) -> Self {
        DisplayLine {
            pid: record.pid,
            state: record.state_glyph(),
            indent,
            command: record.command.clone(),
            mark: Mark::Unmarked,
        }
    }

    /// Row text: mark column, PID, state, tree glyphs, command
    pub fn text(&self, tree_str: &TreeStrings) -> String {
        let mut text = format!("{} {:>7} {} ", self.mark.label(), self.pid, self.state);
        for column in &self.indent {
            text.push_str(column.glyph(tree_str));
        }
        text.push_str(&self.command);
        text
    }
}

/// A node waiting to be emitted during the walk
struct Pending {
    pid: Pid,
    /// Columns inherited from the ancestors
    lead: Vec<Indent>,
    /// Tee or corner for non-roots
    branch: Option<Indent>,
}

/// Render a snapshot into display lines
///
/// The walk uses an explicit stack so depth is not limited by the call
/// stack. A PID is emitted at most once per pass; records that are never
/// reached from a root (parent cycles) are drawn as extra roots afterwards.
pub fn render(snapshot: &Snapshot) -> Vec<DisplayLine> {
    let mut lines = Vec::with_capacity(snapshot.len());
    let mut shown: HashSet<Pid> = HashSet::with_capacity(snapshot.len());

    for root in snapshot.roots() {
        walk(snapshot, root.pid, &mut shown, &mut lines);
    }

    if shown.len() < snapshot.len() {
        let stragglers: Vec<Pid> = snapshot
            .iter()
            .map(|r| r.pid)
            .filter(|pid| !shown.contains(pid))
            .collect();
        for pid in stragglers {
            walk(snapshot, pid, &mut shown, &mut lines);
        }
    }

    lines
}

fn walk(snapshot: &Snapshot, root: Pid, shown: &mut HashSet<Pid>, lines: &mut Vec<DisplayLine>) {
    let mut stack = vec![Pending {
        pid: root,
        lead: Vec::new(),
        branch: None,
    }];

    while let Some(node) = stack.pop() {
        if !shown.insert(node.pid) {
            continue;
        }
        let record = match snapshot.get(node.pid) {
            Some(r) => r,
            None => continue,
        };

        let mut indent = node.lead.clone();
        indent.extend(node.branch);

        // Column this node hands down to its own subtree
        let mut child_lead = node.lead;
        match node.branch {
            Some(Indent::Corner) => child_lead.push(Indent::Blank),
            Some(_) => child_lead.push(Indent::Vertical),
            None => {}
        }

        lines.push(DisplayLine::new(record, indent));

        let children: Vec<Pid> = record
            .children
            .iter()
            .copied()
            .filter(|pid| !shown.contains(pid) && snapshot.contains(*pid))
            .collect();
        let last = children.len().saturating_sub(1);

        // Reverse so the smallest PID is popped first
        for (i, pid) in children.into_iter().enumerate().rev() {
            stack.push(Pending {
                pid,
                lead: child_lead.clone(),
                branch: Some(if i == last {
                    Indent::Corner
                } else {
                    Indent::Tee
                }),
            });
        }
    }
}

/// Render to plain text, one row per line
pub fn render_text(lines: &[DisplayLine], tree_str: &TreeStrings) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&line.text(tree_str));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{sample_source, SnapshotBuilder};

    fn pids(lines: &[DisplayLine]) -> Vec<Pid> {
        lines.iter().map(|l| l.pid).collect()
    }

    fn find(lines: &[DisplayLine], pid: Pid) -> &DisplayLine {
        lines.iter().find(|l| l.pid == pid).unwrap()
    }

    // ==================== Structure Tests ====================

    #[test]
    fn test_render_sample_forest() {
        let snapshot = SnapshotBuilder::new(&sample_source()).build().unwrap();
        let lines = render(&snapshot);

        assert_eq!(pids(&lines), vec![1, 10, 20, 30]);
        assert!(find(&lines, 1).indent.is_empty());
        assert_eq!(find(&lines, 10).indent, vec![Indent::Tee]);
        assert_eq!(find(&lines, 20).indent, vec![Indent::Corner]);
        assert_eq!(find(&lines, 30).indent, vec![Indent::Blank, Indent::Corner]);
    }

    #[test]
    fn test_render_last_sibling_gets_corner() {
        let snapshot = Snapshot::from_records(vec![
            ProcessRecord::new(1, "root", 'S', 0),
            ProcessRecord::new(9, "c", 'S', 1),
            ProcessRecord::new(2, "a", 'S', 1),
            ProcessRecord::new(5, "b", 'S', 1),
        ]);
        let lines = render(&snapshot);

        assert_eq!(pids(&lines), vec![1, 2, 5, 9]);
        assert_eq!(find(&lines, 2).indent, vec![Indent::Tee]);
        assert_eq!(find(&lines, 5).indent, vec![Indent::Tee]);
        assert_eq!(find(&lines, 9).indent, vec![Indent::Corner]);
    }

    #[test]
    fn test_render_vertical_continuation() {
        // 1 -> {2 -> {3, 4}, 5}
        let snapshot = Snapshot::from_records(vec![
            ProcessRecord::new(1, "root", 'S', 0),
            ProcessRecord::new(2, "child1", 'S', 1),
            ProcessRecord::new(3, "grandchild1", 'S', 2),
            ProcessRecord::new(4, "grandchild2", 'S', 2),
            ProcessRecord::new(5, "child2", 'S', 1),
        ]);
        let lines = render(&snapshot);

        assert_eq!(pids(&lines), vec![1, 2, 3, 4, 5]);
        assert_eq!(find(&lines, 3).indent, vec![Indent::Vertical, Indent::Tee]);
        assert_eq!(
            find(&lines, 4).indent,
            vec![Indent::Vertical, Indent::Corner]
        );
        assert_eq!(find(&lines, 5).indent, vec![Indent::Corner]);
    }

    #[test]
    fn test_render_deep_chain() {
        let depth = 5000;
        let records: Vec<ProcessRecord> = (1..=depth)
            .map(|pid| ProcessRecord::new(pid, "x", 'S', pid - 1))
            .collect();
        let snapshot = Snapshot::from_records(records);
        let lines = render(&snapshot);

        assert_eq!(lines.len(), depth as usize);
        let deepest = lines.last().unwrap();
        assert_eq!(deepest.pid, depth);
        assert_eq!(deepest.indent.len(), depth as usize - 1);
        assert_eq!(*deepest.indent.last().unwrap(), Indent::Corner);
        assert!(deepest.indent[..deepest.indent.len() - 1]
            .iter()
            .all(|c| *c == Indent::Blank));
    }

    #[test]
    fn test_render_multiple_roots_ascending() {
        let snapshot = Snapshot::from_records(vec![
            ProcessRecord::new(300, "orphan", 'S', 299),
            ProcessRecord::new(2, "kthreadd", 'S', 0),
            ProcessRecord::new(1, "init", 'S', 0),
            ProcessRecord::new(3, "kworker", 'I', 2),
        ]);
        let lines = render(&snapshot);
        assert_eq!(pids(&lines), vec![1, 2, 3, 300]);
        assert!(find(&lines, 300).indent.is_empty());
        assert_eq!(find(&lines, 3).indent, vec![Indent::Corner]);
    }

    // ==================== Edge Case Tests ====================

    #[test]
    fn test_render_empty_snapshot() {
        assert!(render(&Snapshot::default()).is_empty());
    }

    #[test]
    fn test_render_all_orphans() {
        let snapshot = Snapshot::from_records(vec![
            ProcessRecord::new(7, "a", 'S', 70),
            ProcessRecord::new(8, "b", 'S', 80),
            ProcessRecord::new(9, "c", 'S', 90),
        ]);
        let lines = render(&snapshot);
        assert_eq!(pids(&lines), vec![7, 8, 9]);
        assert!(lines.iter().all(|l| l.indent.is_empty()));
    }

    #[test]
    fn test_render_is_deterministic() {
        let snapshot = SnapshotBuilder::new(&sample_source()).build().unwrap();
        assert_eq!(render(&snapshot), render(&snapshot));
    }

    #[test]
    fn test_render_shared_child_shown_once() {
        let mut snapshot = Snapshot::from_records(vec![
            ProcessRecord::new(1, "root", 'S', 0),
            ProcessRecord::new(2, "a", 'S', 1),
            ProcessRecord::new(3, "b", 'S', 1),
            ProcessRecord::new(4, "shared", 'S', 2),
        ]);
        // Both 2 and 3 claim 4
        snapshot.records.get_mut(&3).unwrap().children.push(4);

        let lines = render(&snapshot);
        assert_eq!(pids(&lines), vec![1, 2, 4, 3]);
    }

    #[test]
    fn test_render_parent_cycle_terminates() {
        // 5 and 6 are each other's parent: no root reaches them
        let snapshot = Snapshot::from_records(vec![
            ProcessRecord::new(1, "init", 'S', 0),
            ProcessRecord::new(5, "a", 'S', 6),
            ProcessRecord::new(6, "b", 'S', 5),
        ]);
        let lines = render(&snapshot);
        assert_eq!(pids(&lines), vec![1, 5, 6]);
        assert!(find(&lines, 5).indent.is_empty());
        assert_eq!(find(&lines, 6).indent, vec![Indent::Corner]);
    }

    #[test]
    fn test_render_child_cycle_back_to_ancestor() {
        let mut snapshot = Snapshot::from_records(vec![
            ProcessRecord::new(1, "init", 'S', 0),
            ProcessRecord::new(2, "a", 'S', 1),
        ]);
        snapshot.records.get_mut(&2).unwrap().children.push(1);

        let lines = render(&snapshot);
        assert_eq!(pids(&lines), vec![1, 2]);
    }

    // ==================== Text Tests ====================

    #[test]
    fn test_line_text_hides_sleeping_state() {
        let snapshot = SnapshotBuilder::new(&sample_source()).build().unwrap();
        let lines = render(&snapshot);
        assert_eq!(find(&lines, 1).text(&TREE_ASCII), "           1   init");
        assert_eq!(
            find(&lines, 30).text(&TREE_ASCII),
            "          30 R   `-bash"
        );
    }

    #[test]
    fn test_render_text_ascii() {
        let snapshot = SnapshotBuilder::new(&sample_source()).build().unwrap();
        let mut lines = render(&snapshot);
        lines[1].mark = Mark::Kill;

        let expected = concat!(
            "           1   init\n",
            "KILL      10   |-cron\n",
            "          20   `-sshd\n",
            "          30 R   `-bash\n",
        );
        assert_eq!(render_text(&lines, &TREE_ASCII), expected);
    }

    #[test]
    fn test_render_text_utf8() {
        let snapshot = SnapshotBuilder::new(&sample_source()).build().unwrap();
        let lines = render(&snapshot);
        assert!(find(&lines, 10).text(&TREE_UTF8).ends_with("\u{251c}\u{2500}cron"));
        assert!(find(&lines, 30)
            .text(&TREE_UTF8)
            .ends_with("  \u{2514}\u{2500}bash"));
    }
}
