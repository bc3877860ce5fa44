//! The lesson manifest: a `FrameworkLesson` as pretty-printed JSON.
//!
//! Saving goes through a temp file and a rename, so an interrupted save never
//! leaves a truncated manifest behind.

use anyhow::{bail, Context, Result};
use lessonflow::model::FrameworkLesson;
use std::fs;
use std::path::Path;
use uuid::Uuid;

pub fn load(path: &Path) -> Result<FrameworkLesson> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("cannot read lesson manifest {}", path.display()))?;
    let lesson: FrameworkLesson = serde_json::from_str(&raw)
        .with_context(|| format!("invalid lesson manifest {}", path.display()))?;

    if lesson.tasks.is_empty() {
        bail!("lesson `{}` has no tasks", lesson.name);
    }
    if lesson.current_task_index >= lesson.tasks.len() {
        bail!(
            "lesson `{}` points at task {} but has only {}",
            lesson.name,
            lesson.current_task_index + 1,
            lesson.tasks.len()
        );
    }
    Ok(lesson)
}

pub fn save(path: &Path, lesson: &FrameworkLesson) -> Result<()> {
    let data = serde_json::to_string_pretty(lesson)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = dir.join(format!(".lesson-{}.tmp", Uuid::new_v4()));

    fs::write(&tmp, data).with_context(|| format!("cannot write {}", tmp.display()))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("cannot replace {}", path.display()));
    }
    Ok(())
}
