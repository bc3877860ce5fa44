//! Conflict resolution strategies.
//!
//! A conflict happens when the learner moves forward with new changes while
//! the target task already has diverging visible files of its own. The engine
//! never prompts by itself: it hands a [`Conflict`] to an injected
//! [`ConflictResolver`] and acts on the returned [`Choice`].

use serde::{Deserialize, Serialize};

/// The two tasks involved, labeled for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub current_task: String,
    pub target_task: String,
}

impl Conflict {
    pub fn message(&self) -> String {
        format!(
            "Changes made in '{current}' conflict with changes already made in '{target}'.\n\
             Keep the changes of '{target}', or replace them with the changes from '{current}'?",
            current = self.current_task,
            target = self.target_task,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    /// Keep what the target task already has; discard the propagation.
    KeepTarget,
    /// Overwrite the target task with the propagated changes.
    ReplaceWithPropagated,
}

impl Choice {
    pub fn label(self) -> &'static str {
        match self {
            Choice::KeepTarget => "Keep",
            Choice::ReplaceWithPropagated => "Replace",
        }
    }
}

pub trait ConflictResolver {
    fn resolve(&self, conflict: &Conflict) -> Choice;
}

/// Headless default: the learner's newest changes win.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferPropagation;

impl ConflictResolver for PreferPropagation {
    fn resolve(&self, _conflict: &Conflict) -> Choice {
        Choice::ReplaceWithPropagated
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KeepTargetChanges;

impl ConflictResolver for KeepTargetChanges {
    fn resolve(&self, _conflict: &Conflict) -> Choice {
        Choice::KeepTarget
    }
}

impl<F> ConflictResolver for F
where
    F: Fn(&Conflict) -> Choice,
{
    fn resolve(&self, conflict: &Conflict) -> Choice {
        self(conflict)
    }
}
