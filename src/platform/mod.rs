//! Platform-specific system information
//!
//! This module provides the process information source and signal delivery
//! for the operating system.

use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd;

use crate::core::{DispatchError, Pid, SignalSender};

#[cfg(not(target_os = "linux"))]
compile_error!("proctree reads processes from a /proc filesystem and only supports Linux");

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "linux")]
pub use linux::ProcFs;

/// Delivers signals with kill(2)
#[derive(Debug, Default)]
pub struct KillSender;

impl SignalSender for KillSender {
    fn send(&mut self, pid: Pid, signal: Signal) -> Result<(), DispatchError> {
        let result = classify(kill(unistd::Pid::from_raw(pid), signal));
        match &result {
            Ok(()) => debug!("sent {} to {}", signal, pid),
            Err(DispatchError::NoSuchProcess) => debug!("{} vanished before {}", pid, signal),
            Err(DispatchError::Other(msg)) => warn!("{} to {} failed: {}", signal, pid, msg),
        }
        result
    }
}

/// Classify a kill(2) result into success, vanished, or any other failure
pub fn classify(result: nix::Result<()>) -> Result<(), DispatchError> {
    match result {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => Err(DispatchError::NoSuchProcess),
        Err(errno) => Err(DispatchError::Other(errno.desc().to_string())),
    }
}
