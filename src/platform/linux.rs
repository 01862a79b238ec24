//! Linux platform implementation
//!
//! This module reads process records, command lines, environments and link
//! targets from the /proc filesystem (or any directory laid out like it).

use std::fs;
use std::path::PathBuf;

use log::debug;
use procfs::process::Process;
use procfs::ProcError;

use crate::core::{
    split_nul_block, DetailFlags, Pid, ProcessDetails, ProcessSource, SnapshotError,
};

/// Process information source rooted at a /proc-like directory
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ProcFs { root: root.into() }
    }

    fn pid_dir(&self, pid: Pid) -> PathBuf {
        self.root.join(pid.to_string())
    }

    /// Read the detail fields selected by `flags`
    ///
    /// Returns `None` if the process no longer exists. Individual parts that
    /// cannot be read (permissions, kernel threads) are left as `None`.
    pub fn read_details(&self, pid: Pid, flags: DetailFlags) -> Option<ProcessDetails> {
        let dir = self.pid_dir(pid);
        let process = match Process::new_with_root(dir.clone()) {
            Ok(p) => p,
            Err(e) => {
                debug!("pid {}: details unavailable: {}", pid, e);
                return None;
            }
        };

        let mut details = ProcessDetails::new(pid);

        if flags.contains(DetailFlags::CMDLINE) {
            details.cmdline = readable(pid, "cmdline", process.cmdline());
        }
        if flags.contains(DetailFlags::ENVIRON) {
            // Read the raw block rather than procfs' map so the order survives
            details.environ = fs::read(dir.join("environ"))
                .ok()
                .map(|block| split_nul_block(&block));
        }
        if flags.contains(DetailFlags::LINKS) {
            details.cwd = readable(pid, "cwd", process.cwd());
            details.exe = readable(pid, "exe", process.exe());
            details.root = readable(pid, "root", process.root());
        }
        if flags.contains(DetailFlags::OWNER) {
            details.uid = readable(pid, "uid", process.uid());
            details.user = details.uid.and_then(|uid| {
                users::get_user_by_uid(uid).map(|u| u.name().to_string_lossy().into_owned())
            });
        }

        // Everything missing and the directory gone: the process exited
        if !dir.exists() {
            return None;
        }

        Some(details)
    }
}

impl Default for ProcFs {
    fn default() -> Self {
        ProcFs::new("/proc")
    }
}

impl ProcessSource for ProcFs {
    fn list_entries(&self) -> Result<Vec<String>, SnapshotError> {
        let entries = fs::read_dir(&self.root).map_err(|source| SnapshotError::Enumerate {
            root: self.root.clone(),
            source,
        })?;

        Ok(entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect())
    }

    fn read_stat(&self, pid: Pid) -> Option<String> {
        // Command names are arbitrary bytes (prctl PR_SET_NAME)
        fs::read(self.pid_dir(pid).join("stat"))
            .ok()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Turn a procfs result into an optional value, logging anything unexpected
fn readable<T>(pid: Pid, what: &str, result: Result<T, ProcError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(ProcError::PermissionDenied(_)) | Err(ProcError::NotFound(_)) => None,
        Err(e) => {
            debug!("pid {}: cannot read {}: {}", pid, what, e);
            None
        }
    }
}
