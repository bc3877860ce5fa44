use crate::manager::FrameworkLessonManager;
use crate::model::{FrameworkLesson, Task, TaskFile};
use crate::store::fs_backend::FsRecordBackend;
use crate::store::RecordStore;
use crate::workdir::FsTaskDirectory;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestEnv {
    // We keep _temp_dir to ensure the directory is not dropped until the test is done
    pub _temp_dir: TempDir,
    pub manager: FrameworkLessonManager<FsRecordBackend>,
    pub workdir: FsTaskDirectory,
    pub root: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let store = RecordStore::open(FsRecordBackend::new(root.join("history")))
            .expect("failed to open record store");
        let workdir = FsTaskDirectory::new(root.join("task"));
        Self {
            _temp_dir: temp_dir,
            manager: FrameworkLessonManager::new(store),
            workdir,
            root,
        }
    }

    /// Opens a second manager on the same history, as a restarted process
    /// would.
    pub fn reopen(&self) -> FrameworkLessonManager<FsRecordBackend> {
        let store = RecordStore::open(FsRecordBackend::new(self.root.join("history")))
            .expect("failed to reopen record store");
        FrameworkLessonManager::new(store)
    }

    pub fn task_path(&self) -> PathBuf {
        self.workdir.root().to_path_buf()
    }
}

/// A lesson of `count` tasks sharing `main.txt` (visible) and `test.txt`
/// (invisible, different per task).
pub fn sample_lesson(count: usize) -> FrameworkLesson {
    let tasks = (1..=count)
        .map(|n| {
            Task::new(format!("Task {}", n))
                .with_file("main.txt", TaskFile::visible("fn main() {}"))
                .with_file("test.txt", TaskFile::invisible(format!("test {}", n)))
        })
        .collect();
    FrameworkLesson::new("Sample lesson", tasks)
}
