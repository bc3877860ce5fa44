use super::backend::RecordBackend;
use super::{DoctorReport, StoreHeader, CURRENT_VERSION};
use crate::changes::UserChanges;
use crate::error::{LessonError, Result};
use crate::model::Record;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, error, warn};

pub struct RecordStore<B: RecordBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
    /// Serializes allocation and writes. Reads go straight to the backend:
    /// records are replaced atomically, so a reader sees old or new, not both.
    write_lock: Mutex<()>,
    disposed: AtomicBool,
}

fn disposed_error() -> io::Error {
    io::Error::other("record store is disposed")
}

impl<B: RecordBackend> RecordStore<B> {
    /// Wraps a backend without touching it. Call [`migrate`](Self::migrate)
    /// before use, or use [`open`](Self::open).
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
            disposed: AtomicBool::new(false),
        }
    }

    /// Opens a store at [`CURRENT_VERSION`]. If the existing data cannot be
    /// migrated it is deleted and the store is recreated empty.
    pub fn open(backend: B) -> Result<Self> {
        let store = Self::with_backend(backend);
        if let Err(e) = store.migrate(CURRENT_VERSION) {
            error!(
                location = %store.backend.location().display(),
                error = %e,
                "framework lesson history is unusable, resetting it"
            );
            store.backend.wipe().map_err(LessonError::Io)?;
            store.migrate(CURRENT_VERSION)?;
            warn!("framework lesson history was reset; previous task histories are lost");
        }
        Ok(store)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Stored schema version, `None` for a never-initialized store.
    pub fn version(&self) -> Result<Option<u32>> {
        Ok(self.load_header()?.map(|h| h.version))
    }

    /// Brings the store to `target_version`. A fresh store is stamped with it.
    /// There are no registered upgrade steps: any other stored version, or an
    /// unreadable header, is a [`LessonError::Migration`].
    pub fn migrate(&self, target_version: u32) -> Result<()> {
        let _guard = self.lock();
        self.ensure_open(Record::NONE, true)?;

        match self.load_header() {
            Ok(None) => {
                debug!(version = target_version, "initializing framework lesson history");
                self.save_header(&StoreHeader::new(target_version))
            }
            Ok(Some(header)) if header.version == target_version => Ok(()),
            Ok(Some(header)) => Err(LessonError::Migration {
                found: Some(header.version),
                expected: target_version,
            }),
            Err(e) => {
                debug!(error = %e, "unreadable store header");
                Err(LessonError::Migration {
                    found: None,
                    expected: target_version,
                })
            }
        }
    }

    /// Reads the change list of `record`. `Record::NONE` is the empty list and
    /// never touches the backend.
    pub fn get_user_changes(&self, record: Record) -> Result<UserChanges> {
        if record.is_none() {
            return Ok(UserChanges::empty());
        }
        self.ensure_open(record, false)?;

        let raw = self
            .backend
            .read_record(record)
            .map_err(|e| LessonError::read(record, e))?
            .ok_or_else(|| {
                LessonError::read(
                    record,
                    io::Error::new(io::ErrorKind::NotFound, "unknown record"),
                )
            })?;

        serde_json::from_str(&raw).map_err(|e| LessonError::read(record, e))
    }

    /// Persists `changes` for `record` and returns the handle to use from now
    /// on. On failure nothing the old handle points to has changed.
    pub fn update_user_changes(&self, record: Record, changes: &UserChanges) -> Result<Record> {
        let _guard = self.lock();
        self.ensure_open(record, true)?;

        let data = serde_json::to_string(changes).map_err(|e| LessonError::write(record, e))?;

        let mut header = self
            .load_header()
            .map_err(|e| LessonError::write(record, to_io(e)))?
            .ok_or_else(|| {
                LessonError::write(record, io::Error::other("record store is not initialized"))
            })?;

        let target = if record.is_some() && record.value() < header.next_record {
            record
        } else {
            let allocated = Record::new(header.next_record);
            header.next_record += 1;
            self.save_header(&header)
                .map_err(|e| LessonError::write(record, to_io(e)))?;
            allocated
        };

        self.backend
            .write_record(target, &data)
            .map_err(|e| LessonError::write(target, e))?;

        debug!(record = %record, stored_as = %target, changes = changes.len(), "stored user changes");
        Ok(target)
    }

    /// Makes every completed write durable.
    pub fn force(&self) -> Result<()> {
        self.ensure_open(Record::NONE, true)?;
        self.backend
            .flush()
            .map_err(|e| LessonError::write(Record::NONE, e))
    }

    /// Releases the store. Idempotent; later operations fail with storage
    /// errors.
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            let _guard = self.lock();
            if let Err(e) = self.backend.flush() {
                warn!(error = %e, "failed to flush framework lesson history on dispose");
            }
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Verifies and repairs the store: drops records that do not parse,
    /// moves the allocation counter past every existing record and rebuilds a
    /// missing or unreadable header.
    pub fn doctor(&self) -> Result<DoctorReport> {
        let _guard = self.lock();
        self.ensure_open(Record::NONE, true)?;

        let mut report = DoctorReport::default();
        let mut header = match self.load_header() {
            Ok(Some(header)) => header,
            Ok(None) | Err(_) => {
                report.rebuilt_header = true;
                StoreHeader::new(CURRENT_VERSION)
            }
        };

        let records = self.backend.list_records().map_err(LessonError::Io)?;
        let mut max_seen: Option<i64> = None;

        for record in records {
            let healthy = matches!(
                self.backend.read_record(record),
                Ok(Some(raw)) if serde_json::from_str::<UserChanges>(&raw).is_ok()
            );
            if healthy {
                report.healthy_records += 1;
                max_seen = Some(max_seen.map_or(record.value(), |m| m.max(record.value())));
            } else {
                warn!(record = %record, "removing corrupt framework lesson record");
                self.backend.delete_record(record).map_err(LessonError::Io)?;
                report.removed_corrupt_records += 1;
            }
        }

        if let Some(max) = max_seen {
            if max >= header.next_record {
                header.next_record = max + 1;
                report.fixed_counter = true;
            }
        }

        if report.fixed_counter || report.rebuilt_header {
            self.save_header(&header)?;
        }

        Ok(report)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_open(&self, record: Record, write: bool) -> Result<()> {
        if !self.is_disposed() {
            return Ok(());
        }
        Err(if write {
            LessonError::write(record, disposed_error())
        } else {
            LessonError::read(record, disposed_error())
        })
    }

    fn load_header(&self) -> Result<Option<StoreHeader>> {
        match self.backend.read_header()? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn save_header(&self, header: &StoreHeader) -> Result<()> {
        let raw = serde_json::to_string_pretty(header)?;
        self.backend.write_header(&raw)?;
        Ok(())
    }
}

fn to_io(e: LessonError) -> io::Error {
    match e {
        LessonError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::Change;
    use crate::store::mem_backend::MemRecordBackend;

    fn make_store() -> RecordStore<MemRecordBackend> {
        RecordStore::open(MemRecordBackend::new()).unwrap()
    }

    fn sample_changes() -> UserChanges {
        UserChanges::new(vec![
            Change::add_file("a.txt", "hello"),
            Change::remove_file("b.txt"),
        ])
    }

    // --- Read / Update ---

    #[test]
    fn test_sentinel_read_has_no_side_effects() {
        let store = RecordStore::with_backend(MemRecordBackend::new());
        store.backend.set_simulate_read_error(true);

        let changes = store.get_user_changes(Record::NONE).unwrap();
        assert_eq!(changes, UserChanges::empty());
        assert_eq!(store.backend.record_count(), 0);
    }

    #[test]
    fn test_update_then_get_returns_same_changes() {
        let store = make_store();
        let changes = sample_changes();

        let record = store.update_user_changes(Record::NONE, &changes).unwrap();
        assert!(record.is_some());
        assert_eq!(store.get_user_changes(record).unwrap(), changes);
    }

    #[test]
    fn test_update_existing_record_keeps_handle() {
        let store = make_store();
        let first = store
            .update_user_changes(Record::NONE, &sample_changes())
            .unwrap();

        let newer = UserChanges::new(vec![Change::change_file("a.txt", "v2")]);
        let second = store.update_user_changes(first, &newer).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.get_user_changes(second).unwrap(), newer);
        assert_eq!(store.backend.record_count(), 1);
    }

    #[test]
    fn test_allocation_is_monotonic() {
        let store = make_store();
        let a = store
            .update_user_changes(Record::NONE, &UserChanges::empty())
            .unwrap();
        let b = store
            .update_user_changes(Record::NONE, &UserChanges::empty())
            .unwrap();
        assert_eq!(a, Record::new(0));
        assert_eq!(b, Record::new(1));
    }

    #[test]
    fn test_update_unknown_handle_allocates() {
        let store = make_store();
        let record = store
            .update_user_changes(Record::new(99), &sample_changes())
            .unwrap();
        assert_eq!(record, Record::new(0));
    }

    #[test]
    fn test_get_unknown_record_is_read_error() {
        let store = make_store();
        let err = store.get_user_changes(Record::new(5)).unwrap_err();
        assert!(matches!(err, LessonError::StorageRead { record, .. } if record == Record::new(5)));
    }

    #[test]
    fn test_corrupt_record_is_read_error() {
        let store = make_store();
        let record = store
            .update_user_changes(Record::NONE, &sample_changes())
            .unwrap();
        store.backend.write_record(record, "{not json").unwrap();

        let err = store.get_user_changes(record).unwrap_err();
        assert!(matches!(err, LessonError::StorageRead { .. }));
        assert!(err.is_storage());
    }

    #[test]
    fn test_write_error_keeps_old_content() {
        let store = make_store();
        let changes = sample_changes();
        let record = store.update_user_changes(Record::NONE, &changes).unwrap();

        store.backend.set_simulate_write_error(true);
        let err = store
            .update_user_changes(record, &UserChanges::empty())
            .unwrap_err();
        assert!(matches!(err, LessonError::StorageWrite { .. }));

        store.backend.set_simulate_write_error(false);
        assert_eq!(store.get_user_changes(record).unwrap(), changes);
    }

    #[test]
    fn test_update_on_uninitialized_store_fails() {
        let store = RecordStore::with_backend(MemRecordBackend::new());
        let err = store
            .update_user_changes(Record::NONE, &sample_changes())
            .unwrap_err();
        assert!(matches!(err, LessonError::StorageWrite { .. }));
    }

    // --- Versioning ---

    #[test]
    fn test_migrate_stamps_fresh_store() {
        let store = RecordStore::with_backend(MemRecordBackend::new());
        assert_eq!(store.version().unwrap(), None);
        store.migrate(CURRENT_VERSION).unwrap();
        assert_eq!(store.version().unwrap(), Some(CURRENT_VERSION));
    }

    #[test]
    fn test_migrate_rejects_other_version() {
        let backend = MemRecordBackend::new();
        backend
            .write_header(r#"{"version": 7, "next_record": 0}"#)
            .unwrap();
        let store = RecordStore::with_backend(backend);

        let err = store.migrate(CURRENT_VERSION).unwrap_err();
        assert!(matches!(
            err,
            LessonError::Migration { found: Some(7), expected: CURRENT_VERSION }
        ));
    }

    #[test]
    fn test_open_resets_unmigratable_store() {
        let backend = MemRecordBackend::new();
        backend
            .write_header(r#"{"version": 7, "next_record": 3}"#)
            .unwrap();
        backend.write_record(Record::new(2), "{}").unwrap();

        let store = RecordStore::open(backend).unwrap();

        assert_eq!(store.version().unwrap(), Some(CURRENT_VERSION));
        assert_eq!(store.backend.record_count(), 0);
        assert!(store.get_user_changes(Record::new(2)).is_err());
    }

    #[test]
    fn test_open_resets_garbage_header() {
        let backend = MemRecordBackend::new();
        backend.write_header("garbage").unwrap();

        let store = RecordStore::open(backend).unwrap();
        assert_eq!(store.version().unwrap(), Some(CURRENT_VERSION));
    }

    #[test]
    fn test_open_keeps_current_store() {
        let backend = MemRecordBackend::new();
        let store = RecordStore::open(backend).unwrap();
        let changes = sample_changes();
        let record = store.update_user_changes(Record::NONE, &changes).unwrap();

        let reopened = RecordStore::open(store.backend).unwrap();
        assert_eq!(reopened.get_user_changes(record).unwrap(), changes);
    }

    // --- Lifecycle ---

    #[test]
    fn test_force_flushes_backend() {
        let store = make_store();
        store.force().unwrap();
        assert_eq!(store.backend.flush_count(), 1);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let store = make_store();
        store.dispose();
        store.dispose();

        assert!(store.is_disposed());
        assert_eq!(store.backend.flush_count(), 1);
        assert!(store.get_user_changes(Record::new(0)).is_err());
        assert!(store
            .update_user_changes(Record::NONE, &UserChanges::empty())
            .is_err());
        assert_eq!(
            store.get_user_changes(Record::NONE).unwrap(),
            UserChanges::empty()
        );
    }

    #[test]
    fn test_concurrent_updates_get_distinct_handles() {
        let store = std::sync::Arc::new(make_store());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let changes = UserChanges::new(vec![Change::add_file("f", i.to_string())]);
                    store.update_user_changes(Record::NONE, &changes).unwrap()
                })
            })
            .collect();

        let mut records: Vec<Record> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        records.sort();
        records.dedup();
        assert_eq!(records.len(), 8);
    }

    // --- Doctor ---

    #[test]
    fn test_doctor_clean_store() {
        let store = make_store();
        store
            .update_user_changes(Record::NONE, &sample_changes())
            .unwrap();

        let report = store.doctor().unwrap();
        assert!(report.is_clean());
        assert_eq!(report.healthy_records, 1);
    }

    #[test]
    fn test_doctor_removes_corrupt_and_fixes_counter() {
        let store = make_store();
        let good = store
            .update_user_changes(Record::NONE, &sample_changes())
            .unwrap();
        store.backend.write_record(Record::new(1), "oops").unwrap();
        let orphan = serde_json::to_string(&sample_changes()).unwrap();
        store.backend.write_record(Record::new(9), &orphan).unwrap();

        let report = store.doctor().unwrap();
        assert_eq!(report.healthy_records, 2);
        assert_eq!(report.removed_corrupt_records, 1);
        assert!(report.fixed_counter);

        // Next allocation must not collide with the adopted record 9.
        let next = store
            .update_user_changes(Record::NONE, &UserChanges::empty())
            .unwrap();
        assert_eq!(next, Record::new(10));
        assert!(store.get_user_changes(good).is_ok());
    }

    #[test]
    fn test_doctor_rebuilds_missing_header() {
        let backend = MemRecordBackend::new();
        let raw = serde_json::to_string(&sample_changes()).unwrap();
        backend.write_record(Record::new(4), &raw).unwrap();
        let store = RecordStore::with_backend(backend);

        let report = store.doctor().unwrap();
        assert!(report.rebuilt_header);
        assert_eq!(store.version().unwrap(), Some(CURRENT_VERSION));
        let next = store
            .update_user_changes(Record::NONE, &UserChanges::empty())
            .unwrap();
        assert_eq!(next, Record::new(5));
    }
}
