//! # Lessonflow Architecture
//!
//! Lessonflow tracks the learner's state across the tasks of a *framework
//! lesson*: a lesson whose tasks share one working directory, each task
//! building on the code of the previous one. It is a library that happens to
//! have a CLI client, and the split drives the architecture.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (lessonflow-cli)                                       │
//! │  - Loads the lesson manifest, prompts, formats output       │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Manager (manager.rs)                                       │
//! │  - Navigation, external saves, rebase, timestamps           │
//! │  - Absorbs storage failures, returns Navigation results     │
//! └─────────────────────────────────────────────────────────────┘
//!                 │                             │
//!                 ▼                             ▼
//! ┌───────────────────────────────┐ ┌───────────────────────────┐
//! │  Policy (propagation.rs)      │ │  Record Store (store/)    │
//! │  - Pure: states in, plan out  │ │  - RecordBackend trait    │
//! │  - Conflicts via resolver     │ │  - Fs (prod), Mem (tests) │
//! └───────────────────────────────┘ └───────────────────────────┘
//! ```
//!
//! The task directory itself is reached through the
//! [`workdir::TaskDirectory`] trait, so the engine never assumes a terminal,
//! an editor or even a file system.
//!
//! ## Core Idea
//!
//! Each task owns an optional [`model::Record`] handle pointing at a stored
//! [`changes::UserChanges`]: the diff from the task's initial files to what
//! the learner last left in it. Any state is reconstructed as
//! `initial + changes`, and navigating only writes the files that differ.
//!
//! ## Testing Strategy
//!
//! 1. **Policy and diff**: exhaustive unit tests on plain snapshots.
//! 2. **Store**: unit tests against [`store::mem_backend::MemRecordBackend`]
//!    with simulated failures, integration tests against the file system.
//! 3. **Manager**: scenario tests with in-memory store and directory.
//! 4. **CLI**: argument parsing and end-to-end runs of the binary.
//!
//! ## Module Overview
//!
//! - [`model`]: lessons, tasks, task files, record handles
//! - [`changes`]: the `Change` vocabulary and `UserChanges`
//! - [`diff`]: snapshot diffing and visibility partitioning
//! - [`propagation`]: the per-step policy
//! - [`conflict`]: conflict resolvers
//! - [`store`]: durable record storage
//! - [`workdir`]: task directory access
//! - [`manager`]: the public entry point
//! - [`config`]: layered configuration
//! - [`error`]: error types

pub mod changes;
pub mod config;
pub mod conflict;
pub mod diff;
pub mod error;
pub mod manager;
pub mod model;
pub mod propagation;
pub mod store;
pub mod workdir;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use error::{LessonError, Result};
pub use manager::{FrameworkLessonManager, Navigation};
