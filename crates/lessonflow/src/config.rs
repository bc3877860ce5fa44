//! # Configuration
//!
//! Lessonflow configuration is loaded with [`confique`] from layered sources.
//!
//! ## Storage Hierarchy
//!
//! Configuration is resolved in priority order:
//! 1. **Environment variables**: `LESSONFLOW_STORAGE_DIR`, `LESSONFLOW_MAX_FILE_SIZE`,
//!    `LESSONFLOW_ON_CONFLICT`.
//! 2. **Project Config**: `.lessonflow/lessonflow.toml` next to the lesson.
//! 3. **Global Config**: OS-appropriate config directory (via `directories` crate).
//! 4. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `storage_dir` | `.lessonflow/history` | Record store location, relative to the project |
//! | `max_file_size` | `1048576` | Larger task files are never read or diffed |
//! | `ignored` | `[".git", ".lessonflow", ".idea"]` | Names skipped in the task directory |
//! | `on_conflict` | `ask` | `ask`, `keep` or `replace` |

use crate::conflict::Choice;
use crate::error::{LessonError, Result};
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_DIR: &str = ".lessonflow";
pub const CONFIG_FILE: &str = "lessonflow.toml";

/// What to do when forward navigation finds conflicting changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Ask the learner.
    Ask,
    Keep,
    Replace,
}

impl ConflictPolicy {
    /// The fixed answer of this policy, or `None` when the learner decides.
    pub fn choice(self) -> Option<Choice> {
        match self {
            ConflictPolicy::Ask => None,
            ConflictPolicy::Keep => Some(Choice::KeepTarget),
            ConflictPolicy::Replace => Some(Choice::ReplaceWithPropagated),
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = LessonError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ask" => Ok(ConflictPolicy::Ask),
            "keep" => Ok(ConflictPolicy::Keep),
            "replace" => Ok(ConflictPolicy::Replace),
            other => Err(LessonError::Config(format!(
                "unknown conflict policy `{}` (expected ask, keep or replace)",
                other
            ))),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConflictPolicy::Ask => "ask",
            ConflictPolicy::Keep => "keep",
            ConflictPolicy::Replace => "replace",
        };
        f.write_str(name)
    }
}

fn parse_conflict_policy(value: &str) -> Result<ConflictPolicy> {
    value.parse()
}

/// Configuration for lessonflow, stored in `lessonflow.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LessonflowConfig {
    /// Where change lists are stored. Relative paths are resolved against
    /// the project root.
    #[config(env = "LESSONFLOW_STORAGE_DIR", default = ".lessonflow/history")]
    pub storage_dir: PathBuf,

    /// Files larger than this (in bytes) are skipped when reading the task
    /// directory.
    #[config(env = "LESSONFLOW_MAX_FILE_SIZE", default = 1048576)]
    pub max_file_size: u64,

    /// File and directory names never read from the task directory.
    #[config(default = [".git", ".lessonflow", ".idea"])]
    pub ignored: Vec<String>,

    /// Conflict handling on forward navigation: "ask", "keep" or "replace".
    #[config(
        env = "LESSONFLOW_ON_CONFLICT",
        parse_env = parse_conflict_policy,
        default = "ask"
    )]
    pub on_conflict: ConflictPolicy,
}

impl Default for LessonflowConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(CONFIG_DIR).join("history"),
            max_file_size: 1024 * 1024,
            ignored: vec![
                ".git".to_string(),
                CONFIG_DIR.to_string(),
                ".idea".to_string(),
            ],
            on_conflict: ConflictPolicy::Ask,
        }
    }
}

impl LessonflowConfig {
    /// Loads the layered configuration for the project rooted at
    /// `project_root`. Missing files are skipped.
    pub fn load(project_root: &Path) -> Result<Self> {
        let mut builder = Self::builder()
            .env()
            .file(Self::project_file(project_root));
        if let Some(global) = Self::global_file() {
            builder = builder.file(global);
        }
        builder
            .load()
            .map_err(|e| LessonError::Config(e.to_string()))
    }

    pub fn project_file(project_root: &Path) -> PathBuf {
        project_root.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    pub fn global_file() -> Option<PathBuf> {
        ProjectDirs::from("", "", "lessonflow").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Absolute record store location for `project_root`.
    pub fn storage_path(&self, project_root: &Path) -> PathBuf {
        if self.storage_dir.is_absolute() {
            self.storage_dir.clone()
        } else {
            project_root.join(&self.storage_dir)
        }
    }
}
