//! # CLI Layer
//!
//! The CLI layer is the **only** place in the codebase that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Uses `std::process::exit` (via `main.rs`)
//! - Handles argument parsing
//! - Formats output for human consumption
//!
//! ## Responsibilities
//!
//! 1. **Argument Parsing**: Convert shell arguments into typed commands via clap
//! 2. **Context Setup**: Load the manifest and config, open the history store
//! 3. **Dispatch**: Route commands to handlers
//! 4. **Persistence**: Save the manifest before the task directory is
//!    rewritten, and restore the old position if rewriting fails
//! 5. **Error Handling**: Convert errors to user-friendly messages and exit codes

use super::manifest;
use super::prompt::CliResolver;
use super::render;
use super::setup::{parse_cli, Cli, Commands};
use anyhow::{bail, Context as _, Result};
use lessonflow::config::{ConflictPolicy, LessonflowConfig};
use lessonflow::model::{FrameworkLesson, Task};
use lessonflow::store::fs_backend::FsRecordBackend;
use lessonflow::store::RecordStore;
use lessonflow::workdir::{write_snapshot, FsTaskDirectory};
use lessonflow::{FrameworkLessonManager, Navigation};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

struct Context {
    lesson_path: PathBuf,
    lesson: FrameworkLesson,
    /// Conflict policy for this run: `--on-conflict`, else the config.
    policy: ConflictPolicy,
    workdir: FsTaskDirectory,
    manager: FrameworkLessonManager<FsRecordBackend, CliResolver>,
}

pub fn run() -> Result<()> {
    let cli = parse_cli();
    init_tracing(cli.verbose);

    let on_conflict = match &cli.command {
        Commands::Next { on_conflict } => on_conflict.map(ConflictPolicy::from),
        _ => None,
    };
    let mut ctx = Context::load(&cli, on_conflict)?;
    let result = dispatch(&mut ctx, cli.command);
    ctx.manager.dispose();
    result
}

fn init_tracing(verbose: u8) {
    let default = if verbose > 0 { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn project_root(lesson_path: &Path) -> PathBuf {
    match lesson_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

impl Context {
    fn load(cli: &Cli, on_conflict: Option<ConflictPolicy>) -> Result<Self> {
        let root = project_root(&cli.lesson);
        let config = LessonflowConfig::load(&root)?;
        let policy = on_conflict.unwrap_or(config.on_conflict);
        let lesson = manifest::load(&cli.lesson)?;
        debug!(
            lesson = %lesson.name,
            current = lesson.current_task_index,
            ?policy,
            "loaded lesson"
        );

        let workdir = FsTaskDirectory::new(cli.workdir.clone().unwrap_or_else(|| root.join("task")))
            .with_ignored(config.ignored.clone())
            .with_max_file_size(config.max_file_size);

        let store = RecordStore::open(FsRecordBackend::new(config.storage_path(&root)))?;
        let manager = FrameworkLessonManager::new(store)
            .with_resolver(CliResolver::for_policy(policy));

        Ok(Self {
            lesson_path: cli.lesson.clone(),
            lesson,
            policy,
            workdir,
            manager,
        })
    }

    fn task(&self, number: usize) -> Result<&Task> {
        match number.checked_sub(1).and_then(|i| self.lesson.tasks.get(i)) {
            Some(task) => Ok(task),
            None => bail!(
                "no task {} in `{}` (tasks are numbered 1 to {})",
                number,
                self.lesson.name,
                self.lesson.tasks.len()
            ),
        }
    }

    fn save(&self) -> Result<()> {
        manifest::save(&self.lesson_path, &self.lesson)
    }
}

fn dispatch(ctx: &mut Context, command: Commands) -> Result<()> {
    match command {
        Commands::Init { force } => handle_init(ctx, force),
        Commands::Next { .. } => handle_next(ctx),
        Commands::Prev => handle_prev(ctx),
        Commands::Status => handle_status(ctx),
        Commands::History { task } => handle_history(ctx, task),
        Commands::Show { task } => handle_show(ctx, task),
        Commands::Doctor => handle_doctor(ctx),
    }
}

fn handle_init(ctx: &Context, force: bool) -> Result<()> {
    let root = ctx.workdir.root();
    let occupied = root.is_dir()
        && root
            .read_dir()
            .with_context(|| format!("cannot read {}", root.display()))?
            .next()
            .is_some();
    if occupied && !force {
        bail!(
            "{} is not empty; use --force to overwrite it",
            root.display()
        );
    }

    if occupied {
        ctx.workdir
            .clear()
            .with_context(|| format!("cannot clear {}", root.display()))?;
    }

    let task = ctx.task(ctx.lesson.current_task_index + 1)?;
    let state = ctx.manager.task_state(task);
    write_snapshot(&ctx.workdir, &state)?;
    println!(
        "Wrote {} files of {} to {}",
        state.len(),
        task.name,
        root.display()
    );
    Ok(())
}

fn handle_next(ctx: &mut Context) -> Result<()> {
    if !ctx.lesson.has_next() {
        bail!("already at the last task of `{}`", ctx.lesson.name);
    }

    // Without a terminal to ask on, conflicts take the headless default.
    let show_dialog = match ctx.policy {
        ConflictPolicy::Ask => std::io::stdin().is_terminal(),
        ConflictPolicy::Keep | ConflictPolicy::Replace => true,
    };
    let nav = ctx
        .manager
        .plan_next_task(&ctx.lesson, &ctx.workdir, show_dialog)?;
    move_to(ctx, &nav)
}

fn handle_prev(ctx: &mut Context) -> Result<()> {
    if !ctx.lesson.has_prev() {
        bail!("already at the first task of `{}`", ctx.lesson.name);
    }

    let nav = ctx
        .manager
        .plan_prev_task(&ctx.lesson, &ctx.workdir, false)?;
    move_to(ctx, &nav)
}

/// Persists the new position, then rewrites the task directory. If the
/// rewrite fails the manifest goes back to the task that is still on disk.
fn move_to(ctx: &mut Context, nav: &Navigation) -> Result<()> {
    nav.commit(&mut ctx.lesson);
    ctx.save()
        .context("could not save the lesson; the task directory was left unchanged")?;

    if let Err(e) = nav.apply(&ctx.workdir) {
        ctx.lesson.current_task_index = nav.from_index;
        ctx.save().with_context(|| {
            format!(
                "{} may not match task {} recorded in {}",
                ctx.workdir.root().display(),
                nav.to_index + 1,
                ctx.lesson_path.display()
            )
        })?;
        return Err(anyhow::Error::new(e).context(format!(
            "could not update {}; still on task {}",
            ctx.workdir.root().display(),
            nav.from_index + 1
        )));
    }

    print!("{}", render::render_navigation(&ctx.lesson, nav));
    Ok(())
}

fn handle_status(ctx: &Context) -> Result<()> {
    let stamps = ctx
        .lesson
        .tasks
        .iter()
        .map(|task| -> Result<_> {
            if task.record.is_none() {
                return Ok(None);
            }
            Ok(Some(ctx.manager.get_changes_timestamp(task)?))
        })
        .collect::<Result<Vec<_>>>()?;
    print!("{}", render::render_status(&ctx.lesson, &stamps));
    Ok(())
}

fn handle_history(ctx: &Context, number: usize) -> Result<()> {
    let task = ctx.task(number)?;
    let changes = ctx.manager.user_changes(task);
    print!("{}", render::render_history(number, task, &changes));
    Ok(())
}

fn handle_show(ctx: &Context, number: usize) -> Result<()> {
    let task = ctx.task(number)?;
    print!("{}", render::render_show(task, &ctx.manager.task_state(task)));
    Ok(())
}

fn handle_doctor(ctx: &Context) -> Result<()> {
    let report = ctx.manager.store().doctor()?;
    print!("{}", render::render_doctor(&report));
    Ok(())
}
