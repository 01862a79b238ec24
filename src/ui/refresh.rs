//! Periodic refresh
//!
//! The scheduler is owned by the view. It does no work itself: the main loop
//! asks it on every iteration whether a rebuild is due, passing whether the
//! view is visible in any window.

use std::time::{Duration, Instant};

use log::{debug, info};

/// Per-window position that survives a rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowState {
    pub shows_view: bool,
    pub scroll_top: usize,
    pub cursor_line: usize,
    pub cursor_col: usize,
}

impl WindowState {
    pub fn showing() -> Self {
        WindowState {
            shows_view: true,
            ..Default::default()
        }
    }

    /// Keep the cursor on `len` lines and inside a `height`-row viewport
    pub fn clamp(&mut self, len: usize, height: usize) {
        if len == 0 {
            self.cursor_line = 0;
            self.scroll_top = 0;
            return;
        }
        self.cursor_line = self.cursor_line.min(len - 1);
        let height = height.max(1);
        if self.cursor_line < self.scroll_top {
            self.scroll_top = self.cursor_line;
        } else if self.cursor_line >= self.scroll_top + height {
            self.scroll_top = self.cursor_line + 1 - height;
        }
        self.scroll_top = self.scroll_top.min(len.saturating_sub(height));
    }
}

/// Result of asking the scheduler for work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Not running
    Idle,
    NotDue,
    /// Rebuild now; the next tick is already armed
    Due,
    /// The view was not visible; the scheduler stopped itself
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    interval: Duration,
    next_tick: Option<Instant>,
}

impl RefreshScheduler {
    pub fn new(interval: Duration) -> Self {
        RefreshScheduler {
            interval,
            next_tick: None,
        }
    }

    /// Arm the timer one interval from `now`; restarting a running timer only
    /// pushes its deadline back
    pub fn start(&mut self, now: Instant) {
        if self.next_tick.is_none() {
            debug!("refresh scheduler started ({:?})", self.interval);
        }
        self.next_tick = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        if self.next_tick.take().is_some() {
            debug!("refresh scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Time left before the next tick, for sizing the input timeout
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.next_tick.map(|t| t.saturating_duration_since(now))
    }

    pub fn tick(&mut self, now: Instant, visible: bool) -> Tick {
        let deadline = match self.next_tick {
            Some(t) => t,
            None => return Tick::Idle,
        };
        if !visible {
            info!("view not visible, cancelling refresh");
            self.next_tick = None;
            return Tick::Cancelled;
        }
        if now < deadline {
            return Tick::NotDue;
        }
        self.next_tick = Some(now + self.interval);
        Tick::Due
    }
}
