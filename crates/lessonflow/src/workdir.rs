//! # Task Directory
//!
//! The shared working directory of a framework lesson, seen through the
//! [`TaskDirectory`] trait: the engine reads it as a [`Snapshot`] and writes
//! change lists back to it. The host owns the actual files.
//!
//! ## FsTaskDirectory
//!
//! Reads every regular file below the root whose content is UTF-8 text and no
//! larger than `max_file_size`. Binary and oversized files are reported in
//! [`DirectoryState::skipped`]: they are never diffed, written or removed.
//! Entries whose name is in `ignored` (e.g. `.git`) are left out with
//! everything below them, and so are leftover staging files.
//!
//! Writes happen in two phases:
//!
//! 1. **Stage**: every new file text is written to a temp file next to its
//!    target. Any failure removes the staged files and leaves the directory
//!    exactly as it was.
//! 2. **Commit**: temp files are renamed over their targets and removed files
//!    are deleted, in change-list order. Directories left empty by removals
//!    are pruned. If a rename fails, the staged files not yet renamed are
//!    removed before the error is returned.

use crate::changes::{Change, UserChanges};
use crate::error::{LessonError, Result};
use crate::model::{Snapshot, Task};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Name prefix of the temp files written while staging changes.
const STAGING_PREFIX: &str = ".lessonflow-";
const STAGING_SUFFIX: &str = ".tmp";

fn staging_name() -> String {
    format!("{}{}{}", STAGING_PREFIX, Uuid::new_v4(), STAGING_SUFFIX)
}

fn is_staging_file(name: &str) -> bool {
    name.starts_with(STAGING_PREFIX) && name.ends_with(STAGING_SUFFIX)
}

/// What a scan of the task directory found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryState {
    /// Text content of every readable file.
    pub files: Snapshot,
    /// Files present on disk but not readable as text (binary or oversized).
    /// They must be left alone: neither diffed nor overwritten nor removed.
    pub skipped: BTreeSet<String>,
}

pub trait TaskDirectory {
    /// Current content of the directory for `task`. Implementations may use
    /// the task's declared files to narrow down what they read.
    fn scan(&self, task: &Task) -> Result<DirectoryState>;

    /// Text content only, see [`TaskDirectory::scan`].
    fn read_state(&self, task: &Task) -> Result<Snapshot> {
        Ok(self.scan(task)?.files)
    }

    /// Materializes a change list in the directory.
    fn apply_changes(&self, changes: &UserChanges) -> Result<()>;
}

pub struct FsTaskDirectory {
    root: PathBuf,
    ignored: Vec<String>,
    max_file_size: u64,
}

enum Op {
    Write { tmp: PathBuf, target: PathBuf },
    Remove { target: PathBuf },
}

impl FsTaskDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignored: Vec::new(),
            max_file_size: u64::MAX,
        }
    }

    pub fn with_ignored(mut self, ignored: Vec<String>) -> Self {
        self.ignored = ignored;
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.ignored.iter().any(|i| i == name)
    }

    /// Removes everything below the root except ignored entries.
    pub fn clear(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Ok(());
        }
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.is_ignored(name))
            {
                continue;
            }
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
        }
        debug!(root = %self.root.display(), "cleared task directory");
        Ok(())
    }

    /// Text content of a file, or `None` when it is oversized or binary.
    fn read_text(&self, path: &Path) -> io::Result<Option<String>> {
        if fs::metadata(path)?.len() > self.max_file_size {
            debug!(path = %path.display(), "skipping oversized file");
            return Ok(None);
        }
        match String::from_utf8(fs::read(path)?) {
            Ok(text) => Ok(Some(text)),
            Err(_) => {
                debug!(path = %path.display(), "skipping binary file");
                Ok(None)
            }
        }
    }

    /// Whether an existing file at `target` is one a scan would skip.
    fn holds_skipped_file(&self, target: &Path) -> io::Result<bool> {
        if !target.is_file() {
            return Ok(false);
        }
        Ok(self.read_text(target)?.is_none())
    }

    fn collect(&self, dir: &Path, prefix: &str, state: &mut DirectoryState) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    debug!(name = ?raw, "skipping non UTF-8 file name");
                    continue;
                }
            };
            if self.is_ignored(&name) || is_staging_file(&name) {
                continue;
            }

            let relative = if prefix.is_empty() {
                name
            } else {
                format!("{}/{}", prefix, name)
            };
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                self.collect(&entry.path(), &relative, state)?;
            } else if file_type.is_file() {
                match self.read_text(&entry.path())? {
                    Some(text) => {
                        state.files.insert(relative, text);
                    }
                    None => {
                        state.skipped.insert(relative);
                    }
                }
            }
        }
        Ok(())
    }

    /// Resolves a change path inside the root, rejecting anything that could
    /// escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let valid = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(LessonError::Precondition(format!(
                "invalid task file path `{}`",
                path
            )));
        }
        Ok(self.root.join(relative))
    }

    fn stage(&self, changes: &UserChanges, ops: &mut Vec<Op>) -> Result<()> {
        for change in changes {
            let target = self.resolve(change.path())?;
            if self.holds_skipped_file(&target)? {
                debug!(path = %change.path(), "leaving skipped file untouched");
                continue;
            }
            match change.text() {
                Some(text) => {
                    let parent = target.parent().unwrap_or(&self.root);
                    fs::create_dir_all(parent)?;
                    let tmp = parent.join(staging_name());
                    fs::write(&tmp, text)?;
                    ops.push(Op::Write { tmp, target });
                }
                None => ops.push(Op::Remove { target }),
            }
        }
        Ok(())
    }

    fn prune_empty_dirs(&self, from: &Path) {
        let mut dir = from.parent();
        while let Some(d) = dir {
            if d == self.root || !d.starts_with(&self.root) {
                break;
            }
            // Fails when the directory is not empty, which ends the walk.
            if fs::remove_dir(d).is_err() {
                break;
            }
            dir = d.parent();
        }
    }

    fn commit(&self, op: Op) -> Result<()> {
        match op {
            Op::Write { tmp, target } => {
                if let Err(e) = fs::rename(&tmp, &target) {
                    let _ = fs::remove_file(&tmp);
                    return Err(e.into());
                }
            }
            Op::Remove { target } => {
                match fs::remove_file(&target) {
                    Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
                    _ => {}
                }
                self.prune_empty_dirs(&target);
            }
        }
        Ok(())
    }
}

fn discard_staged<'a>(ops: impl IntoIterator<Item = &'a Op>) {
    for op in ops {
        if let Op::Write { tmp, .. } = op {
            let _ = fs::remove_file(tmp);
        }
    }
}

impl TaskDirectory for FsTaskDirectory {
    fn scan(&self, _task: &Task) -> Result<DirectoryState> {
        let mut state = DirectoryState::default();
        if self.root.exists() {
            self.collect(&self.root, "", &mut state)?;
        }
        Ok(state)
    }

    fn apply_changes(&self, changes: &UserChanges) -> Result<()> {
        let mut ops = Vec::with_capacity(changes.len());

        if let Err(e) = self.stage(changes, &mut ops) {
            discard_staged(&ops);
            return Err(e);
        }

        let mut ops = ops.into_iter();
        while let Some(op) = ops.next() {
            if let Err(e) = self.commit(op) {
                discard_staged(ops.as_slice());
                return Err(e);
            }
        }
        Ok(())
    }
}

/// In-memory task directory for tests.
#[derive(Default)]
pub struct MemTaskDirectory {
    state: RefCell<Snapshot>,
    skipped: RefCell<BTreeSet<String>>,
}

impl MemTaskDirectory {
    pub fn new(state: Snapshot) -> Self {
        Self {
            state: RefCell::new(state),
            skipped: RefCell::default(),
        }
    }

    /// Simulates a file the directory cannot read as text.
    pub fn put_unreadable(&self, path: &str) {
        self.state.borrow_mut().remove(path);
        self.skipped.borrow_mut().insert(path.to_string());
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    /// Simulates a learner edit.
    pub fn write(&self, path: &str, text: &str) {
        self.state
            .borrow_mut()
            .insert(path.to_string(), text.to_string());
    }

    /// Simulates a learner deleting a file.
    pub fn remove(&self, path: &str) {
        self.state.borrow_mut().remove(path);
    }
}

impl TaskDirectory for MemTaskDirectory {
    fn scan(&self, _task: &Task) -> Result<DirectoryState> {
        Ok(DirectoryState {
            files: self.snapshot(),
            skipped: self.skipped.borrow().clone(),
        })
    }

    fn apply_changes(&self, changes: &UserChanges) -> Result<()> {
        let skipped = self.skipped.borrow();
        let writable: UserChanges = changes
            .iter()
            .filter(|c| !skipped.contains(c.path()))
            .cloned()
            .collect();
        writable.apply_to(&mut self.state.borrow_mut());
        Ok(())
    }
}

/// Writes a whole snapshot into a directory, e.g. the initial state of the
/// first task of a lesson.
pub fn write_snapshot(dir: &impl TaskDirectory, state: &Snapshot) -> Result<()> {
    let changes: UserChanges = state
        .iter()
        .map(|(path, text)| Change::add_file(path.clone(), text.clone()))
        .collect();
    dir.apply_changes(&changes)
}
