//! # Framework Lesson Manager
//!
//! Keeps a change list per task: the difference between the task's initial
//! state and the learner's latest state. With those lists, navigating between
//! tasks only rewrites the files that actually differ instead of the whole
//! directory.
//!
//! ## Navigation
//!
//! ```text
//! prepare_next_task / prepare_prev_task
//!   1. previous state of current task  = initial + stored changes
//!   2. live state of the directory     → diff against initial → store (+ force)
//!   3. current state = initial + new changes, target state = initial + stored
//!   4. propagation::plan               → change list
//!   5. change list                     → task directory
//!   6. Navigation                      → caller commits it into the lesson
//! ```
//!
//! `plan_next_task` / `plan_prev_task` stop after step 4, so a caller can
//! persist the new position before [`Navigation::apply`] touches the files.
//!
//! Files the directory reports as skipped (binary or oversized) take no part:
//! they are dropped from every state before diffing, so they are never stored
//! as removed and never propagated.
//!
//! The manager never mutates the lesson. The new record of the current task
//! and the new current index come back in a [`Navigation`], which the caller
//! applies with [`Navigation::commit`] and then persists.
//!
//! ## Failure Policy
//!
//! Record store failures are logged and absorbed: a task whose history cannot
//! be read counts as unchanged, a history that cannot be written keeps its old
//! record. Navigation always completes. Precondition violations (wrong course
//! mode, stepping outside the lesson) and task directory I/O errors are
//! returned to the caller.

use crate::changes::UserChanges;
use crate::conflict::{ConflictResolver, PreferPropagation};
use crate::diff::{calculate_changes, split_by_visibility};
use crate::error::{LessonError, Result};
use crate::model::{CourseMode, FrameworkLesson, Record, Snapshot, Task};
use crate::propagation::{self, Direction, Resolution, Step};
use crate::store::backend::RecordBackend;
use crate::store::RecordStore;
use crate::workdir::TaskDirectory;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::{debug, error, info};

/// Outcome of one navigation step, to be committed into the lesson and
/// persisted by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub direction: Direction,
    pub from_index: usize,
    pub to_index: usize,
    /// Record of the task that was left. May differ from the one it had.
    pub current_record: Record,
    /// Changes that were applied to the task directory.
    pub changes: UserChanges,
    pub resolution: Resolution,
}

impl Navigation {
    /// Writes the new record of the task that was left and the new current
    /// index into `lesson`.
    pub fn commit(&self, lesson: &mut FrameworkLesson) {
        if let Some(task) = lesson.tasks.get_mut(self.from_index) {
            task.record = self.current_record;
        }
        lesson.current_task_index = self.to_index;
    }

    /// Writes the planned changes to the task directory.
    pub fn apply(&self, task_dir: &impl TaskDirectory) -> Result<()> {
        task_dir.apply_changes(&self.changes)?;
        info!(from = self.from_index, to = self.to_index, "moved to task");
        Ok(())
    }
}

fn without_skipped(mut state: Snapshot, skipped: &BTreeSet<String>) -> Snapshot {
    if !skipped.is_empty() {
        state.retain(|path, _| !skipped.contains(path));
    }
    state
}

pub struct FrameworkLessonManager<B: RecordBackend, R: ConflictResolver = PreferPropagation> {
    store: RecordStore<B>,
    resolver: R,
    mode: CourseMode,
}

impl<B: RecordBackend> FrameworkLessonManager<B> {
    /// A study-mode manager resolving conflicts in favor of propagation.
    pub fn new(store: RecordStore<B>) -> Self {
        Self {
            store,
            resolver: PreferPropagation,
            mode: CourseMode::Study,
        }
    }
}

impl<B: RecordBackend, R: ConflictResolver> FrameworkLessonManager<B, R> {
    pub fn with_resolver<R2: ConflictResolver>(self, resolver: R2) -> FrameworkLessonManager<B, R2> {
        FrameworkLessonManager {
            store: self.store,
            resolver,
            mode: self.mode,
        }
    }

    pub fn with_mode(mut self, mode: CourseMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn store(&self) -> &RecordStore<B> {
        &self.store
    }

    pub fn prepare_next_task(
        &self,
        lesson: &FrameworkLesson,
        task_dir: &impl TaskDirectory,
        show_dialog_if_conflict: bool,
    ) -> Result<Navigation> {
        let nav = self.plan_next_task(lesson, task_dir, show_dialog_if_conflict)?;
        nav.apply(task_dir)?;
        Ok(nav)
    }

    pub fn prepare_prev_task(
        &self,
        lesson: &FrameworkLesson,
        task_dir: &impl TaskDirectory,
        show_dialog_if_conflict: bool,
    ) -> Result<Navigation> {
        let nav = self.plan_prev_task(lesson, task_dir, show_dialog_if_conflict)?;
        nav.apply(task_dir)?;
        Ok(nav)
    }

    /// Like [`Self::prepare_next_task`], but leaves the task directory as it
    /// is. The current task's changes are stored all the same.
    pub fn plan_next_task(
        &self,
        lesson: &FrameworkLesson,
        task_dir: &impl TaskDirectory,
        show_dialog_if_conflict: bool,
    ) -> Result<Navigation> {
        self.navigate(lesson, Direction::Forward, task_dir, show_dialog_if_conflict)
    }

    pub fn plan_prev_task(
        &self,
        lesson: &FrameworkLesson,
        task_dir: &impl TaskDirectory,
        show_dialog_if_conflict: bool,
    ) -> Result<Navigation> {
        self.navigate(lesson, Direction::Backward, task_dir, show_dialog_if_conflict)
    }

    /// Stores a solution that did not come from the task directory (e.g. one
    /// synced from a remote). Only visible files are compared. Returns the
    /// record to persist with the task.
    pub fn save_external_changes(&self, task: &Task, external_state: &Snapshot) -> Result<Record> {
        self.require_study_mode("save_external_changes")?;

        let (visible_files, _) = split_by_visibility(&task.initial_state(), task);
        let (external_visible_files, _) = split_by_visibility(external_state, task);
        let changes = calculate_changes(&visible_files, &external_visible_files);

        match self.store.update_user_changes(task.record, &changes) {
            Ok(record) => Ok(record),
            Err(e) => {
                error!(task = %task.name, error = %e, "failed to save solution");
                Ok(task.record)
            }
        }
    }

    /// Rebases the stored changes of `task` onto a new initial state after
    /// the course content was updated. Returns the record to persist.
    pub fn update_user_changes(&self, task: &Task, new_initial_state: &Snapshot) -> Result<Record> {
        self.require_study_mode("update_user_changes")?;

        if task.record.is_none() {
            return Ok(task.record);
        }

        let changes = match self.store.get_user_changes(task.record) {
            Ok(changes) => changes,
            Err(e) => {
                error!(task = %task.name, error = %e, "failed to get user changes");
                return Ok(task.record);
            }
        };

        let rebased = changes.rebase(new_initial_state);
        match self.store.update_user_changes(task.record, &rebased) {
            Ok(record) => Ok(record),
            Err(e) => {
                error!(task = %task.name, error = %e, "failed to update user changes");
                Ok(task.record)
            }
        }
    }

    /// When the stored changes of `task` were produced. The Unix epoch for a
    /// task without history.
    pub fn get_changes_timestamp(&self, task: &Task) -> Result<DateTime<Utc>> {
        self.require_study_mode("get_changes_timestamp")?;
        Ok(self.user_changes(task).timestamp())
    }

    /// Stored change list of `task`; empty when unreadable.
    pub fn user_changes(&self, task: &Task) -> UserChanges {
        self.store.get_user_changes(task.record).unwrap_or_else(|e| {
            error!(task = %task.name, error = %e, "failed to get user changes");
            UserChanges::empty()
        })
    }

    /// Latest known state of `task`: its initial state plus stored changes.
    pub fn task_state(&self, task: &Task) -> Snapshot {
        self.user_changes(task).apply(&task.initial_state())
    }

    pub fn dispose(&self) {
        self.store.dispose();
    }

    fn require_study_mode(&self, operation: &str) -> Result<()> {
        if self.mode != CourseMode::Study {
            return Err(LessonError::Precondition(format!(
                "`{}` should be called only if course in study mode",
                operation
            )));
        }
        Ok(())
    }

    /// Diffs the live directory against `initial` and stores it. On storage
    /// failure the old record is kept and the diff read from disk is still
    /// returned, intentionally not the empty change list a failed read falls
    /// back to.
    fn record_current_changes(
        &self,
        task: &Task,
        initial: &Snapshot,
        live: &Snapshot,
    ) -> (Record, UserChanges) {
        let changes = calculate_changes(initial, live);

        let record = match self.store.update_user_changes(task.record, &changes) {
            Ok(record) => record,
            Err(e) => {
                error!(task = %task.name, error = %e, "failed to save user changes");
                return (task.record, changes);
            }
        };
        if let Err(e) = self.store.force() {
            error!(task = %task.name, error = %e, "failed to flush user changes");
        }
        (record, changes)
    }

    fn navigate(
        &self,
        lesson: &FrameworkLesson,
        direction: Direction,
        task_dir: &impl TaskDirectory,
        show_dialog_if_conflict: bool,
    ) -> Result<Navigation> {
        self.require_study_mode("navigate")?;

        let from_index = lesson.current_task_index;
        let current_task = lesson.tasks.get(from_index).ok_or_else(|| {
            LessonError::Precondition(format!(
                "lesson `{}` has no task at index {}",
                lesson.name, from_index
            ))
        })?;
        let to_index = direction
            .step(from_index)
            .filter(|i| *i < lesson.tasks.len())
            .ok_or_else(|| {
                LessonError::Precondition(format!(
                    "cannot move {:?} from task {} of lesson `{}`",
                    direction,
                    from_index + 1,
                    lesson.name
                ))
            })?;
        let target_task = &lesson.tasks[to_index];

        let live = task_dir.scan(current_task)?;
        if !live.skipped.is_empty() {
            debug!(paths = ?live.skipped, "leaving unreadable files out of navigation");
        }

        let initial_current = without_skipped(current_task.initial_state(), &live.skipped);
        let previous_current_state = without_skipped(
            self.user_changes(current_task).apply(&initial_current),
            &live.skipped,
        );

        let (current_record, current_changes) =
            self.record_current_changes(current_task, &initial_current, &live.files);

        let current_state = current_changes.apply(&initial_current);
        let target_state = without_skipped(
            self.user_changes(target_task).apply(&target_task.initial_state()),
            &live.skipped,
        );

        let step = Step {
            current_task,
            target_task,
            previous_current_record: current_task.record,
            previous_current_state: &previous_current_state,
            current_state: &current_state,
            target_state: &target_state,
            direction,
            template_based: lesson.template_based,
            show_dialog_if_conflict,
        };
        let plan = propagation::plan(&step, &self.resolver);

        debug!(
            from = %current_task.name,
            to = %target_task.name,
            resolution = ?plan.resolution,
            changes = plan.changes.len(),
            "planned target task changes"
        );

        Ok(Navigation {
            direction,
            from_index,
            to_index,
            current_record,
            changes: plan.changes,
            resolution: plan.resolution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::Change;
    use crate::conflict::{Choice, Conflict, KeepTargetChanges};
    use crate::model::TaskFile;
    use crate::store::mem_backend::MemRecordBackend;
    use crate::workdir::MemTaskDirectory;

    fn snapshot(entries: &[(&str, &str)]) -> Snapshot {
        entries
            .iter()
            .map(|(p, t)| (p.to_string(), t.to_string()))
            .collect()
    }

    fn make_manager() -> FrameworkLessonManager<MemRecordBackend> {
        FrameworkLessonManager::new(RecordStore::open(MemRecordBackend::new()).unwrap())
    }

    fn two_task_lesson() -> FrameworkLesson {
        let task = |name: &str| Task::new(name).with_file("a.txt", TaskFile::visible("1"));
        FrameworkLesson::new("lesson", vec![task("Task 1"), task("Task 2")])
    }

    fn start(lesson: &FrameworkLesson) -> MemTaskDirectory {
        MemTaskDirectory::new(lesson.tasks[0].initial_state())
    }

    fn next(
        manager: &FrameworkLessonManager<MemRecordBackend, impl ConflictResolver>,
        lesson: &mut FrameworkLesson,
        dir: &MemTaskDirectory,
    ) -> Navigation {
        let nav = manager.prepare_next_task(lesson, dir, true).unwrap();
        nav.commit(lesson);
        nav
    }

    fn prev(
        manager: &FrameworkLessonManager<MemRecordBackend, impl ConflictResolver>,
        lesson: &mut FrameworkLesson,
        dir: &MemTaskDirectory,
    ) -> Navigation {
        let nav = manager.prepare_prev_task(lesson, dir, true).unwrap();
        nav.commit(lesson);
        nav
    }

    // --- Navigation ---

    #[test]
    fn test_unedited_next_keeps_initial_content() {
        let manager = make_manager();
        let mut lesson = two_task_lesson();
        let dir = start(&lesson);

        let nav = next(&manager, &mut lesson, &dir);

        assert!(nav.changes.is_empty());
        assert_eq!(dir.snapshot(), snapshot(&[("a.txt", "1")]));
        assert_eq!(lesson.current_task_index, 1);
        assert!(lesson.tasks[0].record.is_some());
        assert!(lesson.tasks[1].record.is_none());
    }

    #[test]
    fn test_learner_file_is_carried_forward() {
        let manager = make_manager();
        let mut lesson = two_task_lesson();
        let dir = start(&lesson);
        dir.write("b.txt", "new");

        let nav = next(&manager, &mut lesson, &dir);

        assert_eq!(
            nav.changes.changes(),
            &[Change::propagate_learner_created("b.txt", "new")]
        );
        assert_eq!(dir.snapshot(), snapshot(&[("a.txt", "1"), ("b.txt", "new")]));

        let stored = manager.user_changes(&lesson.tasks[0]);
        assert_eq!(stored.changes(), &[Change::add_file("b.txt", "new")]);
    }

    #[test]
    fn test_deleted_shared_file_stays_deleted() {
        let manager = make_manager();
        let mut lesson = two_task_lesson();
        let dir = start(&lesson);
        dir.remove("a.txt");

        let nav = next(&manager, &mut lesson, &dir);

        assert_eq!(nav.changes.changes(), &[Change::remove_task_file("a.txt")]);
        assert!(dir.snapshot().is_empty());
    }

    #[test]
    fn test_back_and_forth_restores_each_task() {
        let manager = make_manager();
        let mut lesson = two_task_lesson();
        let dir = start(&lesson);
        dir.write("b.txt", "new");

        next(&manager, &mut lesson, &dir);
        dir.write("a.txt", "edited in 2");

        let back = prev(&manager, &mut lesson, &dir);
        assert_eq!(back.resolution, Resolution::Plain);
        assert_eq!(dir.snapshot(), snapshot(&[("a.txt", "1"), ("b.txt", "new")]));

        // No new edits: the stored state of task 2 comes back as it was.
        let again = next(&manager, &mut lesson, &dir);
        assert_eq!(again.resolution, Resolution::Plain);
        assert_eq!(
            dir.snapshot(),
            snapshot(&[("a.txt", "edited in 2"), ("b.txt", "new")])
        );
    }

    #[test]
    fn test_backward_uses_plain_diff_even_with_new_changes() {
        let manager = make_manager();
        let mut lesson = two_task_lesson();
        let dir = start(&lesson);
        next(&manager, &mut lesson, &dir);
        dir.write("c.txt", "only in 2");

        let resolver = |_: &Conflict| -> Choice { panic!("no dialog on backward moves") };
        let manager = manager.with_resolver(resolver);
        let nav = prev(&manager, &mut lesson, &dir);

        assert_eq!(nav.resolution, Resolution::Plain);
        assert_eq!(nav.changes.changes(), &[Change::remove_file("c.txt")]);
        assert_eq!(dir.snapshot(), snapshot(&[("a.txt", "1")]));
    }

    #[test]
    fn test_conflict_keep_target() {
        let manager = make_manager().with_resolver(KeepTargetChanges);
        let mut lesson = two_task_lesson();
        let dir = start(&lesson);

        next(&manager, &mut lesson, &dir);
        dir.write("from2.txt", "2");
        prev(&manager, &mut lesson, &dir);
        dir.write("from1.txt", "1");

        let nav = next(&manager, &mut lesson, &dir);

        assert_eq!(nav.resolution, Resolution::ConflictKeptTarget);
        assert_eq!(
            dir.snapshot(),
            snapshot(&[("a.txt", "1"), ("from2.txt", "2")])
        );
    }

    #[test]
    fn test_conflict_replace_without_dialog() {
        let manager = make_manager().with_resolver(KeepTargetChanges);
        let mut lesson = two_task_lesson();
        let dir = start(&lesson);

        next(&manager, &mut lesson, &dir);
        dir.write("from2.txt", "2");
        prev(&manager, &mut lesson, &dir);
        dir.write("from1.txt", "1");

        let nav = manager.prepare_next_task(&lesson, &dir, false).unwrap();
        nav.commit(&mut lesson);

        assert_eq!(nav.resolution, Resolution::ConflictReplaced);
        assert_eq!(
            dir.snapshot(),
            snapshot(&[("a.txt", "1"), ("from1.txt", "1")])
        );
    }

    #[test]
    fn test_template_based_lesson_shows_target_state() {
        let manager = make_manager();
        let mut lesson = FrameworkLesson::new(
            "templates",
            vec![
                Task::new("1").with_file("main.txt", TaskFile::visible("step 1")),
                Task::new("2").with_file("main.txt", TaskFile::visible("step 2")),
            ],
        )
        .template_based(true);
        let dir = start(&lesson);
        dir.write("notes.txt", "mine");

        let nav = next(&manager, &mut lesson, &dir);

        assert_eq!(nav.resolution, Resolution::Plain);
        assert_eq!(dir.snapshot(), snapshot(&[("main.txt", "step 2")]));
    }

    #[test]
    fn test_unreadable_file_is_neither_stored_nor_removed() {
        let manager = make_manager();
        let mut lesson = FrameworkLesson::new(
            "lesson",
            vec![
                Task::new("1")
                    .with_file("a.txt", TaskFile::visible("1"))
                    .with_file("data.txt", TaskFile::visible("d")),
                Task::new("2")
                    .with_file("a.txt", TaskFile::visible("1"))
                    .with_file("data.txt", TaskFile::invisible("d2")),
            ],
        );
        let dir = start(&lesson);
        dir.put_unreadable("data.txt");

        let nav = next(&manager, &mut lesson, &dir);

        assert!(nav.changes.iter().all(|c| c.path() != "data.txt"));
        assert!(manager.user_changes(&lesson.tasks[0]).is_empty());
        let state = dir.scan(&lesson.tasks[1]).unwrap();
        assert!(state.skipped.contains("data.txt"));
    }

    #[test]
    fn test_plan_leaves_directory_untouched() {
        let manager = make_manager();
        let lesson = FrameworkLesson::new(
            "templates",
            vec![
                Task::new("1").with_file("main.txt", TaskFile::visible("step 1")),
                Task::new("2").with_file("main.txt", TaskFile::visible("step 2")),
            ],
        )
        .template_based(true);
        let dir = start(&lesson);

        let nav = manager.plan_next_task(&lesson, &dir, true).unwrap();
        assert_eq!(dir.snapshot(), snapshot(&[("main.txt", "step 1")]));
        assert!(nav.current_record.is_some());

        nav.apply(&dir).unwrap();
        assert_eq!(dir.snapshot(), snapshot(&[("main.txt", "step 2")]));
    }

    // --- Failure handling ---

    #[test]
    fn test_navigation_survives_write_failure() {
        let manager = make_manager();
        let mut lesson = two_task_lesson();
        let dir = start(&lesson);
        dir.write("b.txt", "new");
        manager.store().backend().set_simulate_write_error(true);

        let nav = next(&manager, &mut lesson, &dir);

        assert!(nav.current_record.is_none());
        assert_eq!(dir.snapshot(), snapshot(&[("a.txt", "1"), ("b.txt", "new")]));
    }

    #[test]
    fn test_navigation_survives_read_failure() {
        let manager = make_manager();
        let mut lesson = two_task_lesson();
        lesson.tasks[1].record = Record::new(42);
        let dir = start(&lesson);

        let nav = next(&manager, &mut lesson, &dir);

        assert_eq!(lesson.current_task_index, 1);
        assert_eq!(dir.snapshot(), snapshot(&[("a.txt", "1")]));
        assert!(nav.changes.is_empty());
    }

    // --- Preconditions ---

    #[test]
    fn test_cannot_step_outside_lesson() {
        let manager = make_manager();
        let mut lesson = two_task_lesson();
        let dir = start(&lesson);

        let err = manager.prepare_prev_task(&lesson, &dir, false).unwrap_err();
        assert!(matches!(err, LessonError::Precondition(_)));

        lesson.current_task_index = 1;
        let err = manager.prepare_next_task(&lesson, &dir, false).unwrap_err();
        assert!(matches!(err, LessonError::Precondition(_)));
    }

    #[test]
    fn test_authoring_mode_is_rejected() {
        let manager = make_manager().with_mode(CourseMode::Authoring);
        let lesson = two_task_lesson();
        let dir = start(&lesson);

        assert!(matches!(
            manager.prepare_next_task(&lesson, &dir, false),
            Err(LessonError::Precondition(_))
        ));
        assert!(matches!(
            manager.save_external_changes(&lesson.tasks[0], &Snapshot::new()),
            Err(LessonError::Precondition(_))
        ));
        assert!(matches!(
            manager.get_changes_timestamp(&lesson.tasks[0]),
            Err(LessonError::Precondition(_))
        ));
    }

    // --- External changes, rebase, timestamp ---

    #[test]
    fn test_save_external_changes_ignores_invisible_files() {
        let manager = make_manager();
        let task = Task::new("t")
            .with_file("a.txt", TaskFile::visible("1"))
            .with_file("test.txt", TaskFile::invisible("t"));
        let external = snapshot(&[("a.txt", "solved"), ("test.txt", "tampered")]);

        let record = manager.save_external_changes(&task, &external).unwrap();
        let task = task.with_record(record);

        assert_eq!(
            manager.user_changes(&task).changes(),
            &[Change::change_file("a.txt", "solved")]
        );
        assert_eq!(
            manager.task_state(&task),
            snapshot(&[("a.txt", "solved"), ("test.txt", "t")])
        );
    }

    #[test]
    fn test_save_external_changes_failure_keeps_record() {
        let manager = make_manager();
        let task = Task::new("t").with_file("a.txt", TaskFile::visible("1"));
        manager.store().backend().set_simulate_write_error(true);

        let record = manager
            .save_external_changes(&task, &snapshot(&[("a.txt", "2")]))
            .unwrap();
        assert_eq!(record, Record::NONE);
    }

    #[test]
    fn test_update_user_changes_rebases() {
        let manager = make_manager();
        let task = Task::new("t").with_file("a.txt", TaskFile::visible("1"));
        let record = manager
            .save_external_changes(&task, &snapshot(&[("a.txt", "1"), ("b.txt", "mine")]))
            .unwrap();
        let task = task.with_record(record);

        let new_initial = snapshot(&[("b.txt", "author")]);
        let record = manager.update_user_changes(&task, &new_initial).unwrap();

        assert_eq!(record, task.record);
        assert_eq!(
            manager.user_changes(&task).changes(),
            &[Change::change_file("b.txt", "mine")]
        );
    }

    #[test]
    fn test_update_user_changes_without_history_is_noop() {
        let manager = make_manager();
        let task = Task::new("t");
        let record = manager
            .update_user_changes(&task, &snapshot(&[("a", "1")]))
            .unwrap();
        assert!(record.is_none());
        assert_eq!(manager.store().backend().record_count(), 0);
    }

    #[test]
    fn test_fs_round_trip_with_restart() {
        use crate::test_utils::{sample_lesson, TestEnv};
        use crate::workdir::write_snapshot;

        let env = TestEnv::new();
        let mut lesson = sample_lesson(2);
        write_snapshot(&env.workdir, &lesson.tasks[0].initial_state()).unwrap();
        std::fs::write(env.task_path().join("main.txt"), "solved").unwrap();

        let nav = env.manager.prepare_next_task(&lesson, &env.workdir, true).unwrap();
        nav.commit(&mut lesson);
        env.manager.dispose();

        let manager = env.reopen();
        let state = manager.task_state(&lesson.tasks[0]);
        assert_eq!(state["main.txt"], "solved");
        assert_eq!(state["test.txt"], "test 1");
    }

    #[test]
    fn test_changes_timestamp() {
        let manager = make_manager();
        let task = Task::new("t").with_file("a.txt", TaskFile::visible("1"));
        assert_eq!(
            manager.get_changes_timestamp(&task).unwrap(),
            DateTime::<Utc>::UNIX_EPOCH
        );

        let before = Utc::now();
        let record = manager
            .save_external_changes(&task, &snapshot(&[("a.txt", "2")]))
            .unwrap();
        let stamp = manager
            .get_changes_timestamp(&task.with_record(record))
            .unwrap();
        assert!(stamp >= before);
    }
}
