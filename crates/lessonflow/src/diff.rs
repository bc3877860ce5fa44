//! # Diff Engine
//!
//! [`calculate_changes`] turns one snapshot into another with whole-file
//! changes. Output order is canonical so persisted histories are reproducible:
//!
//! 1. paths of the target snapshot, sorted: `AddFile` when the current snapshot
//!    lacks them, `ChangeFile` when the text differs, nothing when equal;
//! 2. paths only the current snapshot has, sorted: `RemoveFile`.
//!
//! `apply(a, calculate_changes(a, b)) == b` holds for every pair of snapshots.

use crate::changes::{Change, UserChanges};
use crate::model::{Snapshot, Task};

/// Returns the changes converting `current` into `target`.
pub fn calculate_changes(current: &Snapshot, target: &Snapshot) -> UserChanges {
    let mut changes = Vec::new();

    for (path, next_text) in target {
        match current.get(path) {
            None => changes.push(Change::add_file(path.clone(), next_text.clone())),
            Some(text) if text != next_text => {
                changes.push(Change::change_file(path.clone(), next_text.clone()))
            }
            Some(_) => {}
        }
    }

    changes.extend(
        current
            .keys()
            .filter(|path| !target.contains_key(*path))
            .map(|path| Change::remove_file(path.clone())),
    );

    UserChanges::new(changes)
}

/// Partitions `state` into `(visible, invisible)` using the task's declared
/// visibility. Every key lands in exactly one half.
pub fn split_by_visibility(state: &Snapshot, task: &Task) -> (Snapshot, Snapshot) {
    state
        .iter()
        .map(|(path, text)| (path.clone(), text.clone()))
        .partition(|(path, _)| task.is_visible(path))
}
