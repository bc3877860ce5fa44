//! # Record Store
//!
//! Durable, versioned storage of [`UserChanges`](crate::changes::UserChanges)
//! indexed by integer [`Record`](crate::model::Record) handles.
//!
//! ## Layering
//!
//! - [`backend::RecordBackend`]: raw I/O (the "how"): header, record files,
//!   flush, wipe.
//! - [`record_store::RecordStore`]: the "what": handle allocation, schema
//!   versioning, serialization, write serialization, doctor.
//!
//! ## Allocation
//!
//! Handles come from a monotonically increasing counter kept in the store
//! header and are never reused. Updating an existing record rewrites it in
//! place; updating `Record::NONE` (or a handle the store does not know)
//! allocates a new one. Callers must always keep the handle returned by
//! `update_user_changes`.
//!
//! ## Crash Tolerance
//!
//! - Every record and the header are written atomically (tmp file + rename), so
//!   a crash leaves either the old or the new content, never a torn file.
//! - The counter is bumped *before* the record is written: a crash in between
//!   leaves an unused handle, never two tasks sharing one.
//! - An unreadable or mismatching header fails [`migrate`]; [`RecordStore::open`]
//!   then wipes the store and starts over. Only replay history is lost, never
//!   the learner's files on disk.
//!
//! [`migrate`]: record_store::RecordStore::migrate
//!
//! ## Storage Layout
//!
//! ```text
//! .lessonflow/history/
//! ├── store.json          # Header: schema version + next handle
//! └── record-{n}.json     # One serialized change list per handle
//! ```
//!
//! ## Implementations
//!
//! - [`fs_backend::FsRecordBackend`]: production, one file per record.
//! - [`mem_backend::MemRecordBackend`]: for tests, with error simulation.

use serde::{Deserialize, Serialize};

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;
pub mod record_store;

pub use record_store::RecordStore;

/// Schema version written by this build.
pub const CURRENT_VERSION: u32 = 1;

/// Contents of `store.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreHeader {
    pub version: u32,
    pub next_record: i64,
}

impl StoreHeader {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            next_record: 0,
        }
    }
}

/// Report from the `doctor` operation.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DoctorReport {
    /// Records that parsed fine.
    pub healthy_records: usize,
    /// Records that failed to parse and were deleted.
    pub removed_corrupt_records: usize,
    /// The allocation counter lagged behind existing records and was bumped.
    pub fixed_counter: bool,
    /// The header was missing or unreadable and was rewritten.
    pub rebuilt_header: bool,
}

impl DoctorReport {
    pub fn is_clean(&self) -> bool {
        self.removed_corrupt_records == 0 && !self.fixed_counter && !self.rebuilt_header
    }
}
