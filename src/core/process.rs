//! Process representation
//!
//! This module contains the ProcessRecord struct, the parser for the
//! fixed-format per-process status line, and the detail fields that are
//! read on demand for a single process.

use std::path::PathBuf;

use bitflags::bitflags;

/// Process ID as reported by the kernel
pub type Pid = i32;

/// Single-character state code rendered as a blank (interruptible sleep)
pub const QUIET_STATE: char = 'S';

/// A single process as seen in one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: Pid,
    pub command: String,
    pub state: char,
    /// Parent ID, 0 when the process has no parent
    pub ppid: Pid,
    /// Child IDs, ascending; filled in by the snapshot link pass
    pub children: Vec<Pid>,
}

impl ProcessRecord {
    pub fn new(pid: Pid, command: &str, state: char, ppid: Pid) -> Self {
        ProcessRecord {
            pid,
            command: command.to_string(),
            state,
            ppid,
            children: Vec::new(),
        }
    }

    /// Parse a status record (`pid (comm) state ppid ...`)
    ///
    /// The command name may itself contain spaces and parentheses, so it is
    /// delimited by the first `(` and the last `)` of the line. Anything that
    /// does not match the layout yields `None`.
    pub fn parse_stat(content: &str) -> Option<Self> {
        let open = content.find('(')?;
        let close = content.rfind(')')?;
        if close < open {
            return None;
        }

        let pid: Pid = content[..open].trim().parse().ok()?;
        if pid <= 0 {
            return None;
        }
        let command = &content[open + 1..close];

        // After the command: " S 1234 ..."
        let mut fields = content[close + 1..].split_whitespace();
        let state_field = fields.next()?;
        let mut state_chars = state_field.chars();
        let state = state_chars.next()?;
        if state_chars.next().is_some() {
            return None;
        }
        let ppid: Pid = fields.next()?.parse().ok()?;
        if ppid < 0 {
            return None;
        }

        Some(ProcessRecord::new(pid, command, state, ppid))
    }

    /// True if the record names a parent at all
    pub fn has_parent(&self) -> bool {
        self.ppid > 0 && self.ppid != self.pid
    }

    /// State glyph used in the tree view ('S' is drawn as a blank)
    pub fn state_glyph(&self) -> char {
        if self.state == QUIET_STATE {
            ' '
        } else {
            self.state
        }
    }
}

bitflags! {
    /// Which parts of a process to read for the details screen
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DetailFlags: u32 {
        const CMDLINE = 0x0001;
        const ENVIRON = 0x0002;
        const LINKS = 0x0004;
        const OWNER = 0x0008;
    }
}

impl Default for DetailFlags {
    fn default() -> Self {
        DetailFlags::all()
    }
}

/// Details read on demand for a single process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessDetails {
    pub pid: Pid,
    pub cmdline: Option<Vec<String>>,
    /// `KEY=VALUE` entries in the order the kernel reports them
    pub environ: Option<Vec<String>>,
    pub cwd: Option<PathBuf>,
    pub exe: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub uid: Option<u32>,
    pub user: Option<String>,
}

impl ProcessDetails {
    pub fn new(pid: Pid) -> Self {
        ProcessDetails {
            pid,
            ..Default::default()
        }
    }

    /// Labelled lines for the details screen
    pub fn to_lines(&self) -> Vec<String> {
        fn path_or_dash(path: &Option<PathBuf>) -> String {
            path.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string())
        }

        let mut lines = Vec::new();
        lines.push(format!("PID:     {}", self.pid));
        let owner = match (&self.user, self.uid) {
            (Some(user), Some(uid)) => format!("{} ({})", user, uid),
            (None, Some(uid)) => uid.to_string(),
            _ => "-".to_string(),
        };
        lines.push(format!("Owner:   {}", owner));
        let cmdline = self
            .cmdline
            .as_ref()
            .filter(|args| !args.is_empty())
            .map(|args| args.join(" "))
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!("Command: {}", cmdline));
        lines.push(format!("Exe:     {}", path_or_dash(&self.exe)));
        lines.push(format!("Cwd:     {}", path_or_dash(&self.cwd)));
        lines.push(format!("Root:    {}", path_or_dash(&self.root)));
        match &self.environ {
            Some(env) => {
                lines.push(format!("Environment ({} entries):", env.len()));
                lines.extend(env.iter().map(|entry| format!("  {}", entry)));
            }
            None => lines.push("Environment: -".to_string()),
        }
        lines
    }
}

/// Split a NUL-separated block (cmdline, environ) into its entries
pub fn split_nul_block(block: &[u8]) -> Vec<String> {
    block
        .split(|b| *b == 0)
        .filter(|part| !part.is_empty())
        .map(|part| String::from_utf8_lossy(part).into_owned())
        .collect()
}
