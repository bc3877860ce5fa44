//! # Domain Model: Tasks, Lessons and Snapshots
//!
//! This module defines the values the engine works on: [`Snapshot`], [`Record`],
//! [`Task`], [`TaskFile`] and [`FrameworkLesson`].
//!
//! ## Snapshots
//!
//! A snapshot maps a path relative to the task directory to the file's text.
//! It describes either a task's *initial* state (what the course author wrote)
//! or the *materialized* state of the shared working directory.
//!
//! Snapshots are `BTreeMap`s: iteration is always in sorted path order, which
//! gives the diff engine its canonical output order for free.
//!
//! ## Records
//!
//! A [`Record`] is a handle into the record store. `Record::NONE` (`-1`) means
//! "no history persisted yet" and reads as an empty change list. The handle is
//! serialized as a bare number so that it can live next to the rest of the
//! task metadata in whatever format the host uses.
//!
//! ## Visibility
//!
//! Each declared task file carries a `visible` flag. Visibility belongs to the
//! declaration, not to the snapshot: a path that shows up in a snapshot without
//! being declared by the task (a file the learner created, for example) is
//! visible. See [`Task::is_visible`].
//!
//! ```text
//! Task "Step 2"
//! ├── src/main.rs      visible    (declared)
//! ├── tests/check.rs   invisible  (declared)
//! └── notes.txt        visible    (not declared, learner-created)
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Relative path → text content.
pub type Snapshot = BTreeMap<String, String>;

/// Handle of a persisted change list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(i64);

impl Record {
    /// No history persisted yet.
    pub const NONE: Record = Record(-1);

    pub fn new(value: i64) -> Self {
        Record(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 < 0
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }
}

impl Default for Record {
    fn default() -> Self {
        Record::NONE
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether the course is being studied or authored. History is only kept in
/// study mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseMode {
    Study,
    Authoring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFile {
    pub text: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl TaskFile {
    pub fn visible(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            visible: true,
        }
    }

    pub fn invisible(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            visible: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    /// Declared task files, keyed by relative path.
    #[serde(default)]
    pub files: BTreeMap<String, TaskFile>,
    #[serde(default)]
    pub record: Record,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: BTreeMap::new(),
            record: Record::NONE,
        }
    }

    pub fn with_file(mut self, path: impl Into<String>, file: TaskFile) -> Self {
        self.files.insert(path.into(), file);
        self
    }

    pub fn with_record(mut self, record: Record) -> Self {
        self.record = record;
        self
    }

    /// The author-defined state of the task: the text of every declared file.
    pub fn initial_state(&self) -> Snapshot {
        self.files
            .iter()
            .map(|(path, file)| (path.clone(), file.text.clone()))
            .collect()
    }

    /// Declared visibility of `path`. Paths the task does not declare are
    /// visible: task declarations and directory contents drift apart whenever
    /// the learner creates files.
    pub fn is_visible(&self, path: &str) -> bool {
        self.files.get(path).map(|f| f.visible).unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkLesson {
    pub name: String,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub current_task_index: usize,
    /// Tasks carry their own boilerplate; learner changes are never propagated.
    #[serde(default)]
    pub template_based: bool,
}

impl FrameworkLesson {
    pub fn new(name: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            name: name.into(),
            tasks,
            current_task_index: 0,
            template_based: false,
        }
    }

    pub fn template_based(mut self, template_based: bool) -> Self {
        self.template_based = template_based;
        self
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.tasks.get(self.current_task_index)
    }

    pub fn has_next(&self) -> bool {
        self.current_task_index + 1 < self.tasks.len()
    }

    pub fn has_prev(&self) -> bool {
        self.current_task_index > 0 && self.current_task_index < self.tasks.len()
    }
}
