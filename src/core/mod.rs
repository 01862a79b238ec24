//! Core module containing the main data structures
//!
//! This module contains:
//! - ProcessRecord: a single process as read from its status record
//! - Snapshot: the parent/child forest of all processes, and its builder
//! - Mark: pending-signal intent for a displayed process
//! - Settings: user configuration
//! - Errors for enumeration, signal dispatch and settings

mod error;
mod mark;
mod process;
mod settings;
mod snapshot;

pub use error::*;
pub use mark::*;
pub use process::*;
pub use settings::*;
pub use snapshot::*;

#[cfg(test)]
pub(crate) use snapshot::tests::sample_source;
