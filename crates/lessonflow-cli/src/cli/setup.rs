use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use lessonflow::config::ConflictPolicy;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "lessonflow",
    bin_name = "lessonflow",
    version,
    disable_help_subcommand = true
)]
#[command(about = "Navigate the tasks of a framework lesson in one working directory", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Lesson manifest (JSON)
    #[arg(short, long, global = true, default_value = "lesson.json", help_heading = "Options")]
    pub lesson: PathBuf,

    /// Task directory [default: task/ next to the manifest]
    #[arg(short, long, global = true, help_heading = "Options")]
    pub workdir: Option<PathBuf>,

    /// Verbose output (repeat for more)
    #[arg(short, long, global = true, action = ArgAction::Count, help_heading = "Options")]
    pub verbose: u8,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Write the current task's files into the task directory
    Init {
        /// Overwrite a non-empty task directory
        #[arg(long)]
        force: bool,
    },

    /// Move to the next task
    Next {
        /// What to do when both tasks hold diverging changes
        #[arg(long, value_enum)]
        on_conflict: Option<ConflictArg>,
    },

    /// Move to the previous task
    Prev,

    /// Show the lesson and where you are in it
    Status,

    /// Show the stored changes of a task
    History {
        /// Task number (1-based)
        task: usize,
    },

    /// Print the files of a task as last saved
    Show {
        /// Task number (1-based)
        task: usize,
    },

    /// Check and repair the history store
    Doctor,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConflictArg {
    Ask,
    Keep,
    Replace,
}

impl From<ConflictArg> for ConflictPolicy {
    fn from(arg: ConflictArg) -> Self {
        match arg {
            ConflictArg::Ask => ConflictPolicy::Ask,
            ConflictArg::Keep => ConflictPolicy::Keep,
            ConflictArg::Replace => ConflictPolicy::Replace,
        }
    }
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
