use super::backend::RecordBackend;
use crate::model::Record;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

const HEADER_FILE: &str = "store.json";

/// Directory-backed record storage.
///
/// ```text
/// <root>/
/// ├── store.json        # { "version": 1, "next_record": 3 }
/// ├── record-0.json
/// ├── record-1.json
/// └── record-2.json
/// ```
pub struct FsRecordBackend {
    root: PathBuf,
    /// Files written since the last flush.
    dirty: Mutex<Vec<PathBuf>>,
}

impl FsRecordBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dirty: Mutex::new(Vec::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, record: Record) -> PathBuf {
        self.root.join(format!("record-{}.json", record.value()))
    }

    fn ensure_dir(&self) -> io::Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
        }
        Ok(())
    }

    fn atomic_write(&self, target: &Path, data: &str) -> io::Result<()> {
        self.ensure_dir()?;

        let tmp = self.root.join(format!(".record-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, data)?;
        if let Err(e) = fs::rename(&tmp, target) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        self.dirty
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(target.to_path_buf());
        Ok(())
    }

    fn read_optional(path: &Path) -> io::Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn parse_record_name(name: &str) -> Option<Record> {
    name.strip_prefix("record-")
        .and_then(|rest| rest.strip_suffix(".json"))
        .and_then(|n| n.parse::<i64>().ok())
        .filter(|n| *n >= 0)
        .map(Record::new)
}

impl RecordBackend for FsRecordBackend {
    fn read_header(&self) -> io::Result<Option<String>> {
        Self::read_optional(&self.root.join(HEADER_FILE))
    }

    fn write_header(&self, data: &str) -> io::Result<()> {
        self.atomic_write(&self.root.join(HEADER_FILE), data)
    }

    fn read_record(&self, record: Record) -> io::Result<Option<String>> {
        Self::read_optional(&self.record_path(record))
    }

    fn write_record(&self, record: Record, data: &str) -> io::Result<()> {
        self.atomic_write(&self.record_path(record), data)
    }

    fn delete_record(&self, record: Record) -> io::Result<()> {
        match fs::remove_file(self.record_path(record)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    fn list_records(&self) -> io::Result<Vec<Record>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if let Some(record) = path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(parse_record_name)
            {
                records.push(record);
            }
        }
        records.sort();
        Ok(records)
    }

    fn flush(&self) -> io::Result<()> {
        let dirty: Vec<PathBuf> =
            std::mem::take(&mut *self.dirty.lock().unwrap_or_else(|e| e.into_inner()));

        for path in &dirty {
            match fs::File::open(path) {
                Ok(file) => file.sync_all()?,
                // Deleted since it was written.
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }

        // Renames are only durable once the directory entry is.
        #[cfg(unix)]
        if !dirty.is_empty() {
            fs::File::open(&self.root)?.sync_all()?;
        }

        Ok(())
    }

    fn wipe(&self) -> io::Result<()> {
        self.dirty.lock().unwrap_or_else(|e| e.into_inner()).clear();
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }

    fn location(&self) -> PathBuf {
        self.root.clone()
    }
}
