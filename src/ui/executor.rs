//! Signal execution
//!
//! Walks the display top to bottom, delivers each pending mark, and builds
//! the new display: lines whose process is gone are dropped, everything else
//! is kept in order.

use log::info;

use super::tree::DisplayLine;
use crate::core::{DispatchError, Mark, Pid, SignalSender};

/// Outcome of one execution pass
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub delivered: Vec<(Pid, Mark)>,
    pub vanished: Vec<Pid>,
    /// Failures other than a missing process, with the error text
    pub failed: Vec<(Pid, String)>,
    /// Row indices (in the old display) that were removed, ascending
    pub removed_rows: Vec<usize>,
}

impl ExecutionReport {
    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty() && self.vanished.is_empty() && self.failed.is_empty()
    }

    /// Number of removed rows strictly above `row`
    pub fn removed_before(&self, row: usize) -> usize {
        self.removed_rows.partition_point(|r| *r < row)
    }

    /// One-line summary for the status bar
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "No marked processes".to_string();
        }
        let mut parts = vec![format!("{} signalled", self.delivered.len())];
        if !self.vanished.is_empty() {
            parts.push(format!("{} gone", self.vanished.len()));
        }
        if !self.failed.is_empty() {
            let reasons: Vec<String> = self
                .failed
                .iter()
                .map(|(pid, msg)| format!("pid {}: {}", pid, msg))
                .collect();
            parts.push(format!(
                "{} failed ({})",
                self.failed.len(),
                reasons.join("; ")
            ));
        }
        parts.join(", ")
    }
}

/// Deliver every pending mark, one process at a time
///
/// A failure on one process never stops the rest. Delivered lines are
/// unmarked; lines that failed for another reason keep their mark so the
/// operator can see and retry them.
pub fn execute(
    lines: Vec<DisplayLine>,
    sender: &mut dyn SignalSender,
) -> (Vec<DisplayLine>, ExecutionReport) {
    let mut report = ExecutionReport::default();
    let mut kept = Vec::with_capacity(lines.len());

    for (row, mut line) in lines.into_iter().enumerate() {
        let signal = match line.mark.signal() {
            Some(s) => s,
            None => {
                kept.push(line);
                continue;
            }
        };

        match sender.send(line.pid, signal) {
            Ok(()) => {
                report.delivered.push((line.pid, line.mark));
                line.mark = Mark::Unmarked;
                kept.push(line);
            }
            Err(DispatchError::NoSuchProcess) => {
                report.vanished.push(line.pid);
                report.removed_rows.push(row);
            }
            Err(DispatchError::Other(msg)) => {
                report.failed.push((line.pid, msg));
                kept.push(line);
            }
        }
    }

    info!(
        "executed marks: {} delivered, {} vanished, {} failed",
        report.delivered.len(),
        report.vanished.len(),
        report.failed.len()
    );

    (kept, report)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::{ProcessRecord, Snapshot};
    use crate::ui::marks::mark_lines;
    use crate::ui::tree::render;
    use nix::sys::signal::Signal;
    use std::collections::HashMap;

    /// Records every call; PIDs in `gone` answer ESRCH, PIDs in `denied` EPERM
    #[derive(Default)]
    pub(crate) struct FakeSender {
        pub sent: Vec<(Pid, Signal)>,
        pub gone: Vec<Pid>,
        pub denied: HashMap<Pid, String>,
    }

    impl SignalSender for FakeSender {
        fn send(&mut self, pid: Pid, signal: Signal) -> Result<(), DispatchError> {
            self.sent.push((pid, signal));
            if self.gone.contains(&pid) {
                return Err(DispatchError::NoSuchProcess);
            }
            if let Some(msg) = self.denied.get(&pid) {
                return Err(DispatchError::Other(msg.clone()));
            }
            Ok(())
        }
    }

    fn five_lines() -> Vec<DisplayLine> {
        let snapshot = Snapshot::from_records(vec![
            ProcessRecord::new(1, "init", 'S', 0),
            ProcessRecord::new(2, "a", 'S', 1),
            ProcessRecord::new(3, "b", 'S', 1),
            ProcessRecord::new(4, "c", 'S', 1),
            ProcessRecord::new(5, "d", 'S', 1),
        ]);
        render(&snapshot)
    }

    fn pids(lines: &[DisplayLine]) -> Vec<Pid> {
        lines.iter().map(|l| l.pid).collect()
    }

    #[test]
    fn test_execute_unmarked_is_noop() {
        let mut sender = FakeSender::default();
        let (lines, report) = execute(five_lines(), &mut sender);
        assert_eq!(pids(&lines), vec![1, 2, 3, 4, 5]);
        assert!(report.is_empty());
        assert!(sender.sent.is_empty());
        assert_eq!(report.summary(), "No marked processes");
    }

    #[test]
    fn test_execute_delivers_and_unmarks() {
        let mut lines = five_lines();
        mark_lines(&mut lines, 1, 2, Mark::Term);
        mark_lines(&mut lines, 4, 1, Mark::Kill);

        let mut sender = FakeSender::default();
        let (lines, report) = execute(lines, &mut sender);

        assert_eq!(
            sender.sent,
            vec![
                (2, Signal::SIGTERM),
                (3, Signal::SIGTERM),
                (5, Signal::SIGKILL)
            ]
        );
        assert_eq!(
            report.delivered,
            vec![(2, Mark::Term), (3, Mark::Term), (5, Mark::Kill)]
        );
        assert_eq!(pids(&lines), vec![1, 2, 3, 4, 5]);
        assert!(lines.iter().all(|l| !l.mark.is_marked()));
    }

    #[test]
    fn test_execute_removes_vanished_line_only() {
        let mut lines = five_lines();
        mark_lines(&mut lines, 2, 1, Mark::Term);

        let mut sender = FakeSender {
            gone: vec![3],
            ..Default::default()
        };
        let (lines, report) = execute(lines, &mut sender);

        assert_eq!(lines.len(), 4);
        assert_eq!(pids(&lines), vec![1, 2, 4, 5]);
        assert_eq!(report.vanished, vec![3]);
        assert_eq!(report.removed_rows, vec![2]);
    }

    #[test]
    fn test_execute_consecutive_vanished_lines() {
        let mut lines = five_lines();
        mark_lines(&mut lines, 1, 4, Mark::Hup);

        let mut sender = FakeSender {
            gone: vec![2, 3, 5],
            ..Default::default()
        };
        let (lines, report) = execute(lines, &mut sender);

        // Every marked process was tried despite the removals
        assert_eq!(sender.sent.len(), 4);
        assert_eq!(pids(&lines), vec![1, 4]);
        assert_eq!(report.removed_rows, vec![1, 2, 4]);
        assert_eq!(report.removed_before(0), 0);
        assert_eq!(report.removed_before(2), 1);
        assert_eq!(report.removed_before(4), 2);
        assert_eq!(report.removed_before(5), 3);
    }

    #[test]
    fn test_execute_other_error_keeps_line_and_mark() {
        let mut lines = five_lines();
        mark_lines(&mut lines, 0, 3, Mark::Kill);

        let mut sender = FakeSender::default();
        sender
            .denied
            .insert(1, "Operation not permitted".to_string());
        sender.denied.insert(3, "Invalid argument".to_string());
        let (lines, report) = execute(lines, &mut sender);

        assert_eq!(pids(&lines), vec![1, 2, 3, 4, 5]);
        assert_eq!(lines[0].mark, Mark::Kill);
        assert_eq!(lines[1].mark, Mark::Unmarked);
        assert_eq!(lines[2].mark, Mark::Kill);
        assert_eq!(
            report.failed,
            vec![
                (1, "Operation not permitted".to_string()),
                (3, "Invalid argument".to_string())
            ]
        );
        assert_eq!(report.delivered, vec![(2, Mark::Kill)]);
        assert_eq!(
            report.summary(),
            "1 signalled, 2 failed (pid 1: Operation not permitted; pid 3: Invalid argument)"
        );
    }
}
