use crate::model::Record;
use std::io;
use std::path::PathBuf;

/// Abstract interface for raw record I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while RecordStore handles the "what" (allocation, versioning, doctor).
///
/// Every method takes `&self`: implementations handle their own interior
/// mutability so a store can be shared between threads.
pub trait RecordBackend {
    // --- Header ---

    /// Read the raw store header (`store.json`).
    /// Returns Ok(None) when the store has never been initialized.
    fn read_header(&self) -> io::Result<Option<String>>;

    /// Replace the store header. MUST be atomic.
    fn write_header(&self, data: &str) -> io::Result<()>;

    // --- Records ---

    /// Read the raw serialized change list of a record.
    /// Returns Ok(None) if the record does not exist.
    fn read_record(&self, record: Record) -> io::Result<Option<String>>;

    /// Write a record. MUST be atomic (e.g. write to tmp then rename) so a
    /// reader never sees a half-written change list.
    fn write_record(&self, record: Record, data: &str) -> io::Result<()>;

    fn delete_record(&self, record: Record) -> io::Result<()>;

    /// List all records found in storage (for doctor).
    fn list_records(&self) -> io::Result<Vec<Record>>;

    // --- Lifecycle ---

    /// Make every write so far durable.
    fn flush(&self) -> io::Result<()>;

    /// Delete everything, header included.
    fn wipe(&self) -> io::Result<()>;

    /// Where the store lives. For MemRecordBackend, a virtual path.
    fn location(&self) -> PathBuf;
}
