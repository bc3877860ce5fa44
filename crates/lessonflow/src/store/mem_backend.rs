use super::backend::RecordBackend;
use crate::model::Record;
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// In-memory record backend for testing.
///
/// Uses `Mutex` rather than `RefCell` so the store stays `Sync`: a navigation
/// and a background save may share it.
#[derive(Default)]
pub struct MemRecordBackend {
    header: Mutex<Option<String>>,
    records: Mutex<BTreeMap<Record, String>>,
    simulate_read_error: AtomicBool,
    simulate_write_error: AtomicBool,
    flushes: AtomicUsize,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl MemRecordBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable read error simulation for testing error handling.
    pub fn set_simulate_read_error(&self, simulate: bool) {
        self.simulate_read_error.store(simulate, Ordering::SeqCst);
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Number of successful flushes so far.
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    /// Number of stored records.
    pub fn record_count(&self) -> usize {
        lock(&self.records).len()
    }

    fn check_read(&self) -> io::Result<()> {
        if self.simulate_read_error.load(Ordering::SeqCst) {
            return Err(io::Error::other("Simulated read error"));
        }
        Ok(())
    }

    fn check_write(&self) -> io::Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(io::Error::other("Simulated write error"));
        }
        Ok(())
    }
}

impl RecordBackend for MemRecordBackend {
    fn read_header(&self) -> io::Result<Option<String>> {
        self.check_read()?;
        Ok(lock(&self.header).clone())
    }

    fn write_header(&self, data: &str) -> io::Result<()> {
        self.check_write()?;
        *lock(&self.header) = Some(data.to_string());
        Ok(())
    }

    fn read_record(&self, record: Record) -> io::Result<Option<String>> {
        self.check_read()?;
        Ok(lock(&self.records).get(&record).cloned())
    }

    fn write_record(&self, record: Record, data: &str) -> io::Result<()> {
        self.check_write()?;
        lock(&self.records).insert(record, data.to_string());
        Ok(())
    }

    fn delete_record(&self, record: Record) -> io::Result<()> {
        self.check_write()?;
        lock(&self.records).remove(&record);
        Ok(())
    }

    fn list_records(&self) -> io::Result<Vec<Record>> {
        self.check_read()?;
        Ok(lock(&self.records).keys().copied().collect())
    }

    fn flush(&self) -> io::Result<()> {
        self.check_write()?;
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn wipe(&self) -> io::Result<()> {
        self.check_write()?;
        *lock(&self.header) = None;
        lock(&self.records).clear();
        Ok(())
    }

    fn location(&self) -> PathBuf {
        PathBuf::from("memory://lessonflow-history")
    }
}
