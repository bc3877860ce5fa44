//! # Change Model
//!
//! A [`Change`] is a whole-file edit; a [`UserChanges`] value is an ordered list
//! of them plus the time it was produced. Applying a change list to a snapshot
//! replays the edits in order:
//!
//! | Change                            | Effect on the snapshot      |
//! |-----------------------------------|-----------------------------|
//! | `AddFile`                         | `path → text`               |
//! | `ChangeFile`                      | `path → text`               |
//! | `PropagateLearnerCreatedTaskFile` | `path → text`               |
//! | `RemoveFile`                      | remove `path`               |
//! | `RemoveTaskFile`                  | remove `path`               |
//!
//! Several changes for the same path are last-write-wins. There are no line
//! level edits: binary content never enters a change list.
//!
//! `RemoveTaskFile` and `PropagateLearnerCreatedTaskFile` only come out of
//! forward propagation. They behave like their plain counterparts on apply but
//! survive [`UserChanges::rebase`] untouched, so a learner's deletion of a shared
//! file is not undone when the course content is updated.

use crate::model::Snapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Add;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change {
    AddFile { path: String, text: String },
    ChangeFile { path: String, text: String },
    RemoveFile { path: String },
    RemoveTaskFile { path: String },
    PropagateLearnerCreatedTaskFile { path: String, text: String },
}

impl Change {
    pub fn add_file(path: impl Into<String>, text: impl Into<String>) -> Self {
        Change::AddFile {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn change_file(path: impl Into<String>, text: impl Into<String>) -> Self {
        Change::ChangeFile {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn remove_file(path: impl Into<String>) -> Self {
        Change::RemoveFile { path: path.into() }
    }

    pub fn remove_task_file(path: impl Into<String>) -> Self {
        Change::RemoveTaskFile { path: path.into() }
    }

    pub fn propagate_learner_created(path: impl Into<String>, text: impl Into<String>) -> Self {
        Change::PropagateLearnerCreatedTaskFile {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Change::AddFile { path, .. }
            | Change::ChangeFile { path, .. }
            | Change::RemoveFile { path }
            | Change::RemoveTaskFile { path }
            | Change::PropagateLearnerCreatedTaskFile { path, .. } => path,
        }
    }

    /// New text of the file, or `None` for removals.
    pub fn text(&self) -> Option<&str> {
        match self {
            Change::AddFile { text, .. }
            | Change::ChangeFile { text, .. }
            | Change::PropagateLearnerCreatedTaskFile { text, .. } => Some(text),
            Change::RemoveFile { .. } | Change::RemoveTaskFile { .. } => None,
        }
    }

    pub fn is_removal(&self) -> bool {
        self.text().is_none()
    }

    /// Short label used in logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Change::AddFile { .. } => "add",
            Change::ChangeFile { .. } => "change",
            Change::RemoveFile { .. } => "remove",
            Change::RemoveTaskFile { .. } => "remove-task-file",
            Change::PropagateLearnerCreatedTaskFile { .. } => "propagate",
        }
    }

    pub fn apply_to(&self, state: &mut Snapshot) {
        match self.text() {
            Some(text) => {
                state.insert(self.path().to_string(), text.to_string());
            }
            None => {
                state.remove(self.path());
            }
        }
    }
}

/// Ordered change list plus the moment it was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserChanges {
    changes: Vec<Change>,
    timestamp: DateTime<Utc>,
}

impl Default for UserChanges {
    fn default() -> Self {
        Self::empty()
    }
}

impl UserChanges {
    /// Creates a change list stamped with the current time.
    pub fn new(changes: Vec<Change>) -> Self {
        Self {
            changes,
            timestamp: Utc::now(),
        }
    }

    /// The identity diff. Its timestamp is the Unix epoch.
    pub fn empty() -> Self {
        Self {
            changes: Vec::new(),
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }

    /// Replays the changes on top of `state`, in list order.
    pub fn apply_to(&self, state: &mut Snapshot) {
        for change in &self.changes {
            change.apply_to(state);
        }
    }

    /// Returns `base` with the changes replayed on top of it.
    pub fn apply(&self, base: &Snapshot) -> Snapshot {
        let mut state = base.clone();
        self.apply_to(&mut state);
        state
    }

    /// Remaps the change list against a new initial file set, after the course
    /// content of a task has been updated.
    ///
    /// - `AddFile` of a path the new initial state has → `ChangeFile`
    /// - `ChangeFile` of a path the new initial state lacks → `AddFile`
    /// - `RemoveFile` of a path the new initial state lacks → dropped
    /// - `RemoveTaskFile` / `PropagateLearnerCreatedTaskFile` → kept
    ///
    /// The timestamp is preserved.
    pub fn rebase(&self, new_initial: &Snapshot) -> UserChanges {
        let changes = self
            .changes
            .iter()
            .filter_map(|change| match change {
                Change::AddFile { path, text } if new_initial.contains_key(path) => {
                    Some(Change::change_file(path.clone(), text.clone()))
                }
                Change::ChangeFile { path, text } if !new_initial.contains_key(path) => {
                    Some(Change::add_file(path.clone(), text.clone()))
                }
                Change::RemoveFile { path } if !new_initial.contains_key(path) => None,
                other => Some(other.clone()),
            })
            .collect();

        UserChanges {
            changes,
            timestamp: self.timestamp,
        }
    }
}

impl Add for UserChanges {
    type Output = UserChanges;

    /// Concatenates two change lists, keeping the later timestamp.
    fn add(mut self, rhs: UserChanges) -> UserChanges {
        self.timestamp = self.timestamp.max(rhs.timestamp);
        self.changes.extend(rhs.changes);
        self
    }
}

impl<'a> IntoIterator for &'a UserChanges {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

impl FromIterator<Change> for UserChanges {
    fn from_iter<I: IntoIterator<Item = Change>>(iter: I) -> Self {
        UserChanges::new(iter.into_iter().collect())
    }
}
