//! Snapshot building
//!
//! A snapshot is the full parent/child forest of every process readable at
//! enumeration time. Records are read in parallel, then linked and sorted
//! in a single sequential pass so that no partial snapshot is ever visible.

use std::collections::BTreeMap;

use log::debug;
use rayon::prelude::*;

use super::error::SnapshotError;
use super::process::{Pid, ProcessRecord};

/// Source of raw per-process status records
///
/// `list_entries` may fail (the only fatal condition); `read_stat` returning
/// `None` means the process went away or could not be read and is simply
/// left out.
pub trait ProcessSource: Sync {
    /// Directory-like listing of the information source
    fn list_entries(&self) -> Result<Vec<String>, SnapshotError>;

    /// Raw status record for one process
    fn read_stat(&self, pid: Pid) -> Option<String>;
}

/// Parse a listing entry as a process ID (numeric and positive only)
pub fn parse_pid_entry(name: &str) -> Option<Pid> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse::<Pid>().ok().filter(|pid| *pid > 0)
}

/// Point-in-time forest of process records, keyed and iterated by ascending ID
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub(crate) records: BTreeMap<Pid, ProcessRecord>,
}

impl Snapshot {
    /// Build a snapshot from unlinked records
    ///
    /// Later duplicates of a PID replace earlier ones. Each record is linked
    /// into its parent's child list; parents missing from the set are
    /// skipped (the record becomes an orphan root).
    pub fn from_records(records: impl IntoIterator<Item = ProcessRecord>) -> Self {
        let mut map: BTreeMap<Pid, ProcessRecord> = BTreeMap::new();
        for mut record in records {
            record.children.clear();
            map.insert(record.pid, record);
        }

        // Link pass. Iterating the BTreeMap in ascending order keeps every
        // child list sorted without a separate sort.
        let links: Vec<(Pid, Pid)> = map
            .values()
            .filter(|r| r.has_parent())
            .map(|r| (r.ppid, r.pid))
            .collect();
        for (ppid, pid) in links {
            match map.get_mut(&ppid) {
                Some(parent) => parent.children.push(pid),
                None => debug!("pid {} has parent {} outside the snapshot", pid, ppid),
            }
        }

        Snapshot { records: map }
    }

    pub fn get(&self, pid: Pid) -> Option<&ProcessRecord> {
        self.records.get(&pid)
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.records.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in ascending ID order
    pub fn iter(&self) -> impl Iterator<Item = &ProcessRecord> {
        self.records.values()
    }

    /// True if the record starts a tree: no parent, or a parent outside the snapshot
    pub fn is_root(&self, record: &ProcessRecord) -> bool {
        !record.has_parent() || !self.records.contains_key(&record.ppid)
    }

    /// Top-level records in ascending ID order
    pub fn roots(&self) -> impl Iterator<Item = &ProcessRecord> {
        self.records.values().filter(move |r| self.is_root(r))
    }
}

/// Builds snapshots from a process source
pub struct SnapshotBuilder<'a, S: ProcessSource> {
    source: &'a S,
}

impl<'a, S: ProcessSource> SnapshotBuilder<'a, S> {
    pub fn new(source: &'a S) -> Self {
        SnapshotBuilder { source }
    }

    /// Enumerate, read and link every visible process
    pub fn build(&self) -> Result<Snapshot, SnapshotError> {
        let pids: Vec<Pid> = self
            .source
            .list_entries()?
            .iter()
            .filter_map(|name| parse_pid_entry(name))
            .collect();

        let records: Vec<ProcessRecord> = pids
            .par_iter()
            .filter_map(|&pid| self.read_record(pid))
            .collect();

        debug!(
            "snapshot: {} of {} listed processes readable",
            records.len(),
            pids.len()
        );

        Ok(Snapshot::from_records(records))
    }

    /// Read and parse one record; vanished or malformed records are dropped
    fn read_record(&self, pid: Pid) -> Option<ProcessRecord> {
        let content = self.source.read_stat(pid)?;
        match ProcessRecord::parse_stat(&content) {
            Some(record) if record.pid == pid => Some(record),
            Some(record) => {
                debug!("pid {}: status record names pid {}", pid, record.pid);
                None
            }
            None => {
                debug!("pid {}: malformed status record", pid);
                None
            }
        }
    }
}
