//! # CLI Behavior
//!
//! This is **one possible UI client** for lessonflow, not the application
//! itself. The CLI is the only place that knows about terminal I/O, exit codes,
//! and output formatting.
//!
//! For the overall architecture, see the crate-level documentation in [`crate`].
//!
//! ## Project Layout
//!
//! ```text
//! course/
//! ├── lesson.json              # manifest, rewritten after every navigation
//! ├── task/                    # the shared working directory (--workdir)
//! └── .lessonflow/
//!     ├── lessonflow.toml      # optional project config
//!     └── history/             # record store
//! ```
//!
//! ### Conflicts
//!
//! `lessonflow next` asks on the terminal when both tasks hold diverging
//! changes. When stdin is not a terminal, or with `--on-conflict replace`, the
//! learner's newest changes win; `--on-conflict keep` keeps the target's.
//!
//! ## Module Structure
//!
//! - `commands`: Context setup and per-command handlers
//! - `manifest`: Loading and atomically saving `lesson.json`
//! - `prompt`: Terminal conflict resolver
//! - `render`: Output formatting (colors, relative times)
//! - `setup`: Argument parsing via clap

mod commands;
mod manifest;
mod prompt;
mod render;
pub mod setup;

pub use commands::run;
