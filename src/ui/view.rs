//! Process tree view
//!
//! Owns the rendered lines, their marks and the refresh scheduler. Window
//! positions are kept by the caller and adjusted here whenever the lines
//! change underneath them.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use log::{debug, warn};

use super::executor::{self, ExecutionReport};
use super::marks;
use super::refresh::{RefreshScheduler, Tick, WindowState};
use super::tree::{render, DisplayLine, TreeStrings};
use crate::core::{Mark, ProcessSource, SignalSender, SnapshotBuilder, SnapshotError};

pub struct ProcessView {
    lines: Vec<DisplayLine>,
    tree_str: &'static TreeStrings,
    scheduler: RefreshScheduler,
    auto_refresh: bool,
    last_refresh: Option<DateTime<Local>>,
}

impl ProcessView {
    pub fn new(tree_str: &'static TreeStrings, interval: Duration, auto_refresh: bool) -> Self {
        ProcessView {
            lines: Vec::new(),
            tree_str,
            scheduler: RefreshScheduler::new(interval),
            auto_refresh,
            last_refresh: None,
        }
    }

    pub fn lines(&self) -> &[DisplayLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_text(&self, row: usize) -> Option<String> {
        self.lines.get(row).map(|l| l.text(self.tree_str))
    }

    pub fn tree_str(&self) -> &'static TreeStrings {
        self.tree_str
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    pub fn last_refresh(&self) -> Option<DateTime<Local>> {
        self.last_refresh
    }

    pub fn marked_count(&self) -> usize {
        marks::marked_count(&self.lines)
    }

    /// Snapshot, render and swap in the new lines
    ///
    /// On an enumeration failure the current lines stay as they are.
    pub fn rebuild<S: ProcessSource>(
        &mut self,
        source: &S,
        windows: &mut [WindowState],
    ) -> Result<usize, SnapshotError> {
        let snapshot = SnapshotBuilder::new(source).build()?;
        let lines = render(&snapshot);
        debug!("rebuilt view: {} lines", lines.len());

        self.lines = lines;
        for window in windows.iter_mut().filter(|w| w.shows_view) {
            self.restore_position(window);
        }
        self.last_refresh = Some(Local::now());
        Ok(self.lines.len())
    }

    /// Explicit refresh: rebuild and restart the timer
    pub fn refresh<S: ProcessSource>(
        &mut self,
        source: &S,
        windows: &mut [WindowState],
        now: Instant,
    ) -> Result<usize, SnapshotError> {
        let result = self.rebuild(source, windows);
        if let Err(e) = &result {
            warn!("refresh failed, keeping previous display: {}", e);
        }
        if self.auto_refresh {
            self.scheduler.start(now);
        }
        result
    }

    /// Timer hook, called from the main loop
    ///
    /// Returns `None` when nothing was rebuilt.
    pub fn on_timer<S: ProcessSource>(
        &mut self,
        source: &S,
        windows: &mut [WindowState],
        now: Instant,
    ) -> Option<Result<usize, SnapshotError>> {
        let visible = windows.iter().any(|w| w.shows_view);
        match self.scheduler.tick(now, visible) {
            Tick::Due => {
                let result = self.rebuild(source, windows);
                if let Err(e) = &result {
                    warn!("scheduled refresh failed, keeping previous display: {}", e);
                }
                Some(result)
            }
            Tick::Idle | Tick::NotDue | Tick::Cancelled => None,
        }
    }

    /// Mark `count` lines from `start`; stops automatic refresh so the
    /// marks cannot be lost to a rebuild
    pub fn mark(&mut self, start: usize, count: usize, mark: Mark) -> usize {
        self.scheduler.stop();
        marks::mark_lines(&mut self.lines, start, count, mark)
    }

    pub fn unmark_all(&mut self) {
        self.scheduler.stop();
        marks::unmark_all(&mut self.lines);
    }

    /// Send every pending mark and restart the timer
    ///
    /// Lines that failed keep their mark, and while any mark is left the
    /// timer stays stopped so a rebuild cannot clear it.
    pub fn execute(
        &mut self,
        sender: &mut dyn SignalSender,
        windows: &mut [WindowState],
        now: Instant,
    ) -> ExecutionReport {
        let lines = std::mem::take(&mut self.lines);
        let (lines, report) = executor::execute(lines, sender);
        self.lines = lines;

        for window in windows.iter_mut().filter(|w| w.shows_view) {
            window.cursor_line -= report.removed_before(window.cursor_line);
            window.scroll_top -= report.removed_before(window.scroll_top);
            self.restore_position(window);
        }

        if self.auto_refresh && self.marked_count() == 0 {
            self.scheduler.start(now);
        }
        report
    }

    /// Clamp a window's saved position to the current lines
    fn restore_position(&self, window: &mut WindowState) {
        if self.lines.is_empty() {
            *window = WindowState::showing();
            return;
        }
        let last = self.lines.len() - 1;
        window.cursor_line = window.cursor_line.min(last);
        window.scroll_top = window.scroll_top.min(last);
        let width = self.lines[window.cursor_line]
            .text(self.tree_str)
            .chars()
            .count();
        window.cursor_col = window.cursor_col.min(width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{sample_source, Pid};
    use crate::ui::executor::tests::FakeSender;
    use crate::ui::tree::TREE_ASCII;

    const SEC: Duration = Duration::from_secs(1);

    fn view() -> ProcessView {
        ProcessView::new(&TREE_ASCII, SEC, true)
    }

    fn pids(view: &ProcessView) -> Vec<Pid> {
        view.lines().iter().map(|l| l.pid).collect()
    }

    // ==================== Rebuild Tests ====================

    #[test]
    fn test_rebuild_renders_snapshot() {
        let mut view = view();
        assert!(view.last_refresh().is_none());

        let count = view.rebuild(&sample_source(), &mut []).unwrap();
        assert_eq!(count, 4);
        assert_eq!(pids(&view), vec![1, 10, 20, 30]);
        assert_eq!(
            view.line_text(3).as_deref(),
            Some("          30 R   `-bash")
        );
        assert!(view.last_refresh().is_some());
    }

    #[test]
    fn test_rebuild_preserves_window_positions() {
        let mut view = view();
        let source = sample_source();
        view.rebuild(&source, &mut []).unwrap();

        let mut windows = [
            WindowState {
                shows_view: true,
                scroll_top: 1,
                cursor_line: 2,
                cursor_col: 5,
            },
            WindowState {
                shows_view: false,
                scroll_top: 40,
                cursor_line: 40,
                cursor_col: 40,
            },
        ];
        view.rebuild(&source.with(40, "vim", 'S', 30), &mut windows)
            .unwrap();

        assert_eq!(view.len(), 5);
        assert_eq!(
            windows[0],
            WindowState {
                shows_view: true,
                scroll_top: 1,
                cursor_line: 2,
                cursor_col: 5,
            }
        );
        // Windows not showing the view are left alone
        assert_eq!(windows[1].cursor_line, 40);
    }

    #[test]
    fn test_rebuild_clamps_to_shorter_display() {
        let mut view = view();
        let mut source = sample_source();
        view.rebuild(&source, &mut []).unwrap();

        // Cursor at the end of the bash line
        let mut windows = [WindowState {
            shows_view: true,
            scroll_top: 3,
            cursor_line: 3,
            cursor_col: 23,
        }];
        source.remove(30);
        view.rebuild(&source, &mut windows).unwrap();

        assert_eq!(view.len(), 3);
        assert_eq!(windows[0].cursor_line, 2);
        assert_eq!(windows[0].scroll_top, 2);
        // "          20   `-sshd" is 21 characters
        assert_eq!(windows[0].cursor_col, 21);
    }

    #[test]
    fn test_rebuild_failure_keeps_display() {
        let mut view = view();
        let mut source = sample_source();
        view.rebuild(&source, &mut []).unwrap();
        view.mark(0, 1, Mark::Term);

        source.fail_listing = true;
        let mut windows = [WindowState::showing()];
        assert!(view.refresh(&source, &mut windows, Instant::now()).is_err());
        assert_eq!(pids(&view), vec![1, 10, 20, 30]);
        assert_eq!(view.marked_count(), 1);
    }

    #[test]
    fn test_rebuild_resets_marks() {
        let mut view = view();
        let source = sample_source();
        view.rebuild(&source, &mut []).unwrap();
        view.mark(0, 4, Mark::Kill);
        assert_eq!(view.marked_count(), 4);

        view.rebuild(&source, &mut []).unwrap();
        assert_eq!(view.marked_count(), 0);
    }

    // ==================== Timer Tests ====================

    #[test]
    fn test_timer_rebuilds_when_due() {
        let t0 = Instant::now();
        let mut view = view();
        let mut windows = [WindowState::showing()];
        view.refresh(&sample_source(), &mut windows, t0).unwrap();
        assert!(view.scheduler().is_running());

        let source = sample_source().with(40, "vim", 'S', 30);
        assert!(view.on_timer(&source, &mut windows, t0).is_none());
        assert_eq!(view.len(), 4);

        let result = view.on_timer(&source, &mut windows, t0 + SEC);
        assert_eq!(result.map(|r| r.unwrap()), Some(5));
    }

    #[test]
    fn test_timer_cancels_without_visible_window() {
        let t0 = Instant::now();
        let mut view = view();
        let mut windows = [WindowState::showing()];
        view.refresh(&sample_source(), &mut windows, t0).unwrap();

        windows[0].shows_view = false;
        assert!(view.on_timer(&sample_source(), &mut windows, t0 + SEC).is_none());
        assert!(!view.scheduler().is_running());

        windows[0].shows_view = true;
        let source = sample_source().with(40, "vim", 'S', 30);
        for i in 2..6 {
            assert!(view.on_timer(&source, &mut windows, t0 + SEC * i).is_none());
        }
        assert_eq!(view.len(), 4);
    }

    #[test]
    fn test_marking_stops_timer_until_refresh() {
        let t0 = Instant::now();
        let mut view = view();
        let mut windows = [WindowState::showing()];
        let source = sample_source();
        view.refresh(&source, &mut windows, t0).unwrap();

        view.mark(1, 2, Mark::Hup);
        assert!(!view.scheduler().is_running());
        assert!(view.on_timer(&source, &mut windows, t0 + SEC * 10).is_none());
        assert_eq!(view.marked_count(), 2);

        view.refresh(&source, &mut windows, t0 + SEC * 10).unwrap();
        assert!(view.scheduler().is_running());
        assert_eq!(view.marked_count(), 0);

        view.unmark_all();
        assert!(!view.scheduler().is_running());
        assert!(view.on_timer(&source, &mut windows, t0 + SEC * 20).is_none());
    }

    #[test]
    fn test_auto_refresh_disabled() {
        let mut view = ProcessView::new(&TREE_ASCII, SEC, false);
        let mut windows = [WindowState::showing()];
        view.refresh(&sample_source(), &mut windows, Instant::now())
            .unwrap();
        assert!(!view.scheduler().is_running());
    }

    // ==================== Execute Tests ====================

    #[test]
    fn test_execute_removes_vanished_and_moves_cursor() {
        let t0 = Instant::now();
        let mut view = view();
        let mut windows = [WindowState {
            shows_view: true,
            scroll_top: 2,
            cursor_line: 3,
            cursor_col: 0,
        }];
        view.refresh(&sample_source(), &mut windows, t0).unwrap();
        view.mark(1, 1, Mark::Kill);
        view.mark(2, 1, Mark::Term);

        let mut sender = FakeSender {
            gone: vec![10],
            ..Default::default()
        };
        let report = view.execute(&mut sender, &mut windows, t0);

        assert_eq!(report.vanished, vec![10]);
        assert_eq!(report.delivered, vec![(20, Mark::Term)]);
        assert_eq!(pids(&view), vec![1, 20, 30]);
        // Still on bash, now one row up
        assert_eq!(windows[0].cursor_line, 2);
        assert_eq!(windows[0].scroll_top, 1);
        assert_eq!(view.marked_count(), 0);
        assert!(view.scheduler().is_running());
    }

    #[test]
    fn test_execute_cursor_on_removed_line() {
        let t0 = Instant::now();
        let mut view = view();
        let mut windows = [WindowState {
            cursor_line: 3,
            ..WindowState::showing()
        }];
        view.refresh(&sample_source(), &mut windows, t0).unwrap();
        view.mark(3, 1, Mark::Kill);

        let mut sender = FakeSender {
            gone: vec![30],
            ..Default::default()
        };
        view.execute(&mut sender, &mut windows, t0);

        assert_eq!(view.len(), 3);
        assert_eq!(windows[0].cursor_line, 2);
    }

    #[test]
    fn test_execute_failure_keeps_mark_across_ticks() {
        let t0 = Instant::now();
        let mut view = view();
        let mut windows = [WindowState::showing()];
        let source = sample_source();
        view.refresh(&source, &mut windows, t0).unwrap();
        view.mark(0, 2, Mark::Kill);

        let mut sender = FakeSender::default();
        sender
            .denied
            .insert(1, "Operation not permitted".to_string());
        let report = view.execute(&mut sender, &mut windows, t0);

        assert_eq!(report.failed.len(), 1);
        assert_eq!(view.marked_count(), 1);
        assert!(!view.scheduler().is_running());
        assert!(view.on_timer(&source, &mut windows, t0 + SEC).is_none());
        assert_eq!(view.lines()[0].mark, Mark::Kill);

        // Retrying once the failure clears restarts the timer
        sender.denied.clear();
        let report = view.execute(&mut sender, &mut windows, t0 + SEC);
        assert_eq!(report.delivered, vec![(1, Mark::Kill)]);
        assert_eq!(view.marked_count(), 0);
        assert!(view.scheduler().is_running());
    }
}
