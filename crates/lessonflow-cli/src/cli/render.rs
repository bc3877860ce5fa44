//! # Rendering Module
//!
//! Every function here turns library results into a `String`; handlers print
//! them. Styling goes through `console`, which drops the escape codes when
//! the output is not a terminal.

use chrono::{DateTime, Utc};
use console::style;
use lessonflow::changes::{Change, UserChanges};
use lessonflow::model::{FrameworkLesson, Snapshot, Task};
use lessonflow::propagation::Resolution;
use lessonflow::store::DoctorReport;
use lessonflow::Navigation;
use std::fmt::Write;

const CURRENT_MARKER: &str = "▶";

pub fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    timeago::Formatter::new().convert(duration.to_std().unwrap_or_default())
}

fn change_line(change: &Change) -> String {
    let (symbol, note) = match change {
        Change::AddFile { .. } => (style("+").green(), ""),
        Change::ChangeFile { .. } => (style("~").yellow(), ""),
        Change::RemoveFile { .. } => (style("-").red(), ""),
        Change::RemoveTaskFile { .. } => (style("-").red(), " (removed by you)"),
        Change::PropagateLearnerCreatedTaskFile { .. } => (style("+").green(), " (yours)"),
    };
    format!("  {} {}{}", symbol, change.path(), style(note).dim())
}

pub fn render_changes(changes: &UserChanges) -> String {
    if changes.is_empty() {
        return format!("  {}\n", style("no file changes").dim());
    }
    let mut out = String::new();
    for change in changes {
        let _ = writeln!(out, "{}", change_line(change));
    }
    out
}

fn describe(resolution: Resolution) -> Option<&'static str> {
    match resolution {
        Resolution::Plain => None,
        Resolution::Initialized => Some("carried your files over to a new task"),
        Resolution::InvisibleOnly => Some("only updated the task's hidden files"),
        Resolution::ConflictKeptTarget => Some("kept the changes already made in this task"),
        Resolution::ConflictReplaced => Some("replaced this task's changes with yours"),
    }
}

/// Summary of a committed navigation; `lesson` is the updated lesson.
pub fn render_navigation(lesson: &FrameworkLesson, nav: &Navigation) -> String {
    let mut out = String::new();
    let name = lesson
        .tasks
        .get(nav.to_index)
        .map(|t| t.name.as_str())
        .unwrap_or("?");
    let _ = writeln!(
        out,
        "Task {}/{}: {}",
        nav.to_index + 1,
        lesson.tasks.len(),
        style(name).bold()
    );
    if let Some(note) = describe(nav.resolution) {
        let _ = writeln!(out, "{}", style(note).cyan());
    }
    out.push_str(&render_changes(&nav.changes));
    out
}

/// `stamps[i]` is the time task `i` was last saved, if ever.
pub fn render_status(lesson: &FrameworkLesson, stamps: &[Option<DateTime<Utc>>]) -> String {
    let mut out = String::new();
    let kind = if lesson.template_based {
        " (template based)"
    } else {
        ""
    };
    let _ = writeln!(out, "{}{}", style(&lesson.name).bold(), style(kind).dim());

    for (i, task) in lesson.tasks.iter().enumerate() {
        let marker = if i == lesson.current_task_index {
            style(CURRENT_MARKER).yellow().to_string()
        } else {
            " ".to_string()
        };
        let saved = match stamps.get(i).copied().flatten() {
            Some(stamp) => format!("saved {}", format_time_ago(stamp)),
            None => "never saved".to_string(),
        };
        let _ = writeln!(
            out,
            "{} {:>2}. {}  {}",
            marker,
            i + 1,
            task.name,
            style(saved).dim().italic()
        );
    }
    out
}

pub fn render_history(number: usize, task: &Task, changes: &UserChanges) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}. {}", number, style(&task.name).bold());
    if task.record.is_none() {
        let _ = writeln!(out, "  {}", style("no history yet").dim());
        return out;
    }
    let _ = writeln!(
        out,
        "  {} {}, {}",
        style("record").dim(),
        task.record,
        style(format!("saved {}", format_time_ago(changes.timestamp()))).dim()
    );
    out.push_str(&render_changes(changes));
    out
}

pub fn render_show(task: &Task, state: &Snapshot) -> String {
    let mut out = String::new();
    for (i, (path, text)) in state.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let hidden = if task.is_visible(path) { "" } else { " (hidden)" };
        let _ = writeln!(out, "{}{}", style(path).yellow().bold(), style(hidden).dim());
        let _ = writeln!(out, "--------------------------------");
        out.push_str(text);
        if !text.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

pub fn render_doctor(report: &DoctorReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} healthy records", report.healthy_records);
    if report.removed_corrupt_records > 0 {
        let _ = writeln!(
            out,
            "{}",
            style(format!(
                "removed {} corrupt records",
                report.removed_corrupt_records
            ))
            .red()
        );
    }
    if report.fixed_counter {
        let _ = writeln!(out, "{}", style("fixed the record counter").yellow());
    }
    if report.rebuilt_header {
        let _ = writeln!(out, "{}", style("rebuilt the store header").yellow());
    }
    if report.is_clean() {
        let _ = writeln!(out, "{}", style("history store is healthy").green());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use lessonflow::model::{Record, TaskFile};
    use lessonflow::propagation::Direction;

    fn plain(s: String) -> String {
        console::strip_ansi_codes(&s).to_string()
    }

    fn lesson() -> FrameworkLesson {
        FrameworkLesson::new(
            "Intro",
            vec![
                Task::new("One").with_file("a.txt", TaskFile::visible("1")),
                Task::new("Two").with_file("t.txt", TaskFile::invisible("t")),
            ],
        )
    }

    #[test]
    fn test_render_changes_marks_propagation() {
        let changes = UserChanges::new(vec![
            Change::propagate_learner_created("mine.rs", "x"),
            Change::remove_task_file("gone.rs"),
            Change::change_file("a.txt", "2"),
        ]);
        let out = plain(render_changes(&changes));
        assert_eq!(
            out,
            "  + mine.rs (yours)\n  - gone.rs (removed by you)\n  ~ a.txt\n"
        );
        assert!(plain(render_changes(&UserChanges::default())).contains("no file changes"));
    }

    #[test]
    fn test_render_navigation() {
        let mut lesson = lesson();
        lesson.current_task_index = 1;
        let nav = Navigation {
            direction: Direction::Forward,
            from_index: 0,
            to_index: 1,
            current_record: Record::new(0),
            changes: UserChanges::new(vec![Change::add_file("t.txt", "t")]),
            resolution: Resolution::Initialized,
        };
        let out = plain(render_navigation(&lesson, &nav));
        assert!(out.starts_with("Task 2/2: Two\n"));
        assert!(out.contains("carried your files over"));
        assert!(out.contains("+ t.txt"));
    }

    #[test]
    fn test_render_status() {
        let lesson = lesson();
        let stamps = vec![Some(Utc::now() - Duration::hours(2)), None];
        let out = plain(render_status(&lesson, &stamps));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Intro");
        assert!(lines[1].starts_with(CURRENT_MARKER));
        assert!(lines[1].contains("One"));
        assert!(lines[1].contains("2 hours ago"));
        assert!(lines[2].contains("never saved"));
    }

    #[test]
    fn test_render_history_without_record() {
        let task = Task::new("One");
        let out = plain(render_history(1, &task, &UserChanges::empty()));
        assert!(out.contains("no history yet"));
    }

    #[test]
    fn test_render_show_marks_hidden_files() {
        let lesson = lesson();
        let task = &lesson.tasks[1];
        let out = plain(render_show(task, &task.initial_state()));
        assert!(out.starts_with("t.txt (hidden)\n"));
        assert!(out.ends_with("t\n"));
    }

    #[test]
    fn test_render_doctor() {
        let clean = plain(render_doctor(&DoctorReport::default()));
        assert!(clean.contains("healthy"));

        let report = DoctorReport {
            healthy_records: 1,
            removed_corrupt_records: 2,
            fixed_counter: true,
            rebuilt_header: false,
        };
        let out = plain(render_doctor(&report));
        assert!(out.contains("removed 2 corrupt records"));
        assert!(out.contains("fixed the record counter"));
        assert!(!out.contains("history store is healthy"));
    }
}
