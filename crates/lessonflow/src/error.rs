use crate::model::Record;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LessonError {
    /// The record store could not produce the change list for a record.
    /// Callers in the manager absorb this and continue with empty changes.
    #[error("Failed to read record {record}: {source}")]
    StorageRead {
        record: Record,
        #[source]
        source: std::io::Error,
    },

    /// The record store could not persist a change list.
    /// The previously stored entry is left intact.
    #[error("Failed to write record {record}: {source}")]
    StorageWrite {
        record: Record,
        #[source]
        source: std::io::Error,
    },

    #[error("Record store schema mismatch: found {found:?}, expected {expected}")]
    Migration { found: Option<u32>, expected: u32 },

    /// A caller bug, such as navigating past the end of a lesson.
    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl LessonError {
    pub fn read(record: Record, source: impl Into<std::io::Error>) -> Self {
        LessonError::StorageRead {
            record,
            source: source.into(),
        }
    }

    pub fn write(record: Record, source: impl Into<std::io::Error>) -> Self {
        LessonError::StorageWrite {
            record,
            source: source.into(),
        }
    }

    /// True for errors raised by the record store, which the manager never
    /// surfaces to the learner.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            LessonError::StorageRead { .. }
                | LessonError::StorageWrite { .. }
                | LessonError::Migration { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LessonError>;
