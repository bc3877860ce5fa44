//! # Propagation Policy
//!
//! Decides which change list turns the shared working directory from the
//! current task's state into the target task's state on a single step.
//!
//! ## Plain diff vs. propagation
//!
//! Most steps are a plain diff between the two reconstructed states. Only a
//! forward step carrying *new* learner changes in a non-template lesson
//! propagates: the learner's file-level additions and deletions are carried
//! into the next task instead of simply showing what the next task had.
//!
//! "New" means: either task has never had history, or the directory differs
//! from the last committed state of the current task. Going back and forth
//! without editing anything therefore never re-propagates.
//!
//! ## Propagation
//!
//! Files are split by each task's own visibility declarations.
//!
//! - Visible files present in both tasks survive untouched: non-template
//!   lessons share their boilerplate, so the text already in the directory is
//!   kept.
//! - Visible files only the current task has are learner-created and are
//!   carried over (`PropagateLearnerCreatedTaskFile`).
//! - Visible files only the target task has were deleted by the learner and
//!   the deletion is carried over (`RemoveTaskFile`).
//! - Invisible files, and files that turn visible in the target task, are
//!   diffed normally.
//! - A file turning invisible is not supported; it is logged and otherwise
//!   ignored.
//!
//! ## Conflicts
//!
//! If the target task was visited before and its visible files diverge from
//! the current ones, both sides hold learner work. The resolver picks between
//! keeping the target's state (plain diff) and the propagated changes. Without
//! a dialog the propagated changes win.

use crate::changes::{Change, UserChanges};
use crate::conflict::{Choice, Conflict, ConflictResolver};
use crate::diff::{calculate_changes, split_by_visibility};
use crate::model::{Record, Snapshot, Task};
use serde::Serialize;
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn delta(self) -> isize {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }

    /// Index reached from `from`, or `None` when it falls before zero.
    pub fn step(self, from: usize) -> Option<usize> {
        from.checked_add_signed(self.delta())
    }
}

/// Which branch produced a navigation's change list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Plain diff between the current and target states.
    Plain,
    /// First visit of the target task: propagated changes.
    Initialized,
    /// Visible files agree; only invisible files changed.
    InvisibleOnly,
    /// Conflict, resolved by keeping the target's own state.
    ConflictKeptTarget,
    /// Conflict, resolved by overwriting with the propagated changes.
    ConflictReplaced,
}

/// Everything the policy needs about one navigation step.
#[derive(Debug, Clone, Copy)]
pub struct Step<'a> {
    pub current_task: &'a Task,
    pub target_task: &'a Task,
    /// Record of the current task *before* this step stored its changes.
    pub previous_current_record: Record,
    /// Last committed state of the current task, before this step.
    pub previous_current_state: &'a Snapshot,
    pub current_state: &'a Snapshot,
    pub target_state: &'a Snapshot,
    pub direction: Direction,
    pub template_based: bool,
    pub show_dialog_if_conflict: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub changes: UserChanges,
    pub resolution: Resolution,
}

impl Step<'_> {
    pub fn has_new_changes(&self) -> bool {
        !(self.previous_current_record.is_some()
            && self.target_task.record.is_some()
            && self.previous_current_state == self.current_state)
    }

    pub fn should_propagate(&self) -> bool {
        self.direction == Direction::Forward && !self.template_based && self.has_new_changes()
    }
}

/// Computes the change list for one step.
pub fn plan(step: &Step<'_>, resolver: &dyn ConflictResolver) -> Plan {
    if !step.should_propagate() {
        debug!(
            direction = ?step.direction,
            template_based = step.template_based,
            "plain diff to target task"
        );
        return Plan {
            changes: calculate_changes(step.current_state, step.target_state),
            resolution: Resolution::Plain,
        };
    }
    propagate(step, resolver)
}

struct Propagation {
    /// Diff of invisible files, and of files turning visible.
    invisible: UserChanges,
    /// `PropagateLearnerCreatedTaskFile` / `RemoveTaskFile` changes.
    visible: UserChanges,
    current_visible_stable: Snapshot,
    target_visible_stable: Snapshot,
}

impl Propagation {
    fn compute(step: &Step<'_>) -> Self {
        let (current_visible, current_invisible) =
            split_by_visibility(step.current_state, step.current_task);
        let (target_visible, target_invisible) =
            split_by_visibility(step.target_state, step.target_task);

        let becoming_visible: Snapshot = target_visible
            .iter()
            .filter(|(path, _)| current_invisible.contains_key(*path))
            .map(|(p, t)| (p.clone(), t.clone()))
            .collect();

        let becoming_invisible: Vec<&String> = target_invisible
            .keys()
            .filter(|path| current_visible.contains_key(*path))
            .collect();
        if !becoming_invisible.is_empty() {
            error!(
                files = ?becoming_invisible,
                from = %step.current_task.name,
                to = %step.target_task.name,
                "visibility change from visible to invisible is not supported in non-template-based lessons"
            );
        }

        let current_visible_stable: Snapshot = current_visible
            .into_iter()
            .filter(|(path, _)| !target_invisible.contains_key(path))
            .collect();
        let target_visible_stable: Snapshot = target_visible
            .into_iter()
            .filter(|(path, _)| !current_invisible.contains_key(path))
            .collect();

        let mut to_remove = target_visible_stable.clone();
        let mut visible = Vec::new();
        for (path, text) in &current_visible_stable {
            if to_remove.remove(path).is_none() {
                visible.push(Change::propagate_learner_created(path.clone(), text.clone()));
            }
        }
        visible.extend(to_remove.into_keys().map(Change::remove_task_file));

        let mut target_invisible_and_revealed = target_invisible;
        target_invisible_and_revealed.extend(becoming_visible);

        Propagation {
            invisible: calculate_changes(&current_invisible, &target_invisible_and_revealed),
            visible: UserChanges::new(visible),
            current_visible_stable,
            target_visible_stable,
        }
    }

    fn changes(self) -> UserChanges {
        self.invisible + self.visible
    }
}

fn propagate(step: &Step<'_>, resolver: &dyn ConflictResolver) -> Plan {
    let propagation = Propagation::compute(step);

    if step.target_task.record.is_none() {
        debug!(target = %step.target_task.name, "initializing target task from propagation");
        return Plan {
            changes: propagation.changes(),
            resolution: Resolution::Initialized,
        };
    }

    if propagation.current_visible_stable == propagation.target_visible_stable {
        return Plan {
            changes: propagation.invisible,
            resolution: Resolution::InvisibleOnly,
        };
    }

    let choice = if step.show_dialog_if_conflict {
        resolver.resolve(&Conflict {
            current_task: step.current_task.name.clone(),
            target_task: step.target_task.name.clone(),
        })
    } else {
        Choice::ReplaceWithPropagated
    };
    debug!(?choice, target = %step.target_task.name, "conflicting changes");

    match choice {
        Choice::KeepTarget => Plan {
            changes: calculate_changes(step.current_state, step.target_state),
            resolution: Resolution::ConflictKeptTarget,
        },
        Choice::ReplaceWithPropagated => Plan {
            changes: propagation.changes(),
            resolution: Resolution::ConflictReplaced,
        },
    }
}
