//! Pending-signal marks
//!
//! A mark records which signal the operator wants delivered to a displayed
//! process once the pending marks are executed.

use nix::sys::signal::Signal;

use super::error::DispatchError;
use super::process::Pid;

/// Signal intent attached to a displayed process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mark {
    #[default]
    Unmarked,
    Term,
    Hup,
    Kill,
    Quit,
}

impl Mark {
    /// The signal to deliver, `None` for unmarked
    pub fn signal(self) -> Option<Signal> {
        match self {
            Mark::Unmarked => None,
            Mark::Term => Some(Signal::SIGTERM),
            Mark::Hup => Some(Signal::SIGHUP),
            Mark::Kill => Some(Signal::SIGKILL),
            Mark::Quit => Some(Signal::SIGQUIT),
        }
    }

    /// Label shown in the mark column (4 chars wide)
    pub fn label(self) -> &'static str {
        match self {
            Mark::Unmarked => "    ",
            Mark::Term => "TERM",
            Mark::Hup => "HUP ",
            Mark::Kill => "KILL",
            Mark::Quit => "QUIT",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mark::Unmarked => "none",
            Mark::Term => "SIGTERM",
            Mark::Hup => "SIGHUP",
            Mark::Kill => "SIGKILL",
            Mark::Quit => "SIGQUIT",
        }
    }

    pub fn is_marked(self) -> bool {
        self != Mark::Unmarked
    }
}

/// Delivers a signal to a process
///
/// Calls are blocking and issued one at a time.
pub trait SignalSender {
    fn send(&mut self, pid: Pid, signal: Signal) -> Result<(), DispatchError>;
}
