//! # Lessonflow CLI Architecture
//!
//! The binary is intentionally thin: the CLI lives in `src/cli/`, while this
//! file only invokes `cli::run()` and handles process termination.
//!
//! ## Workspace Structure
//!
//! Lessonflow is organized as a Cargo workspace with two crates:
//! - `crates/lessonflow/`: the library, UI-agnostic state tracking and propagation
//! - `crates/lessonflow-cli/`: this CLI tool, depends on the `lessonflow` library
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/lessonflow-cli/src/cli/)                 │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Context wiring + handlers (commands.rs)                  │
//! │  - Manifest persistence (manifest.rs)                       │
//! │  - Terminal rendering and prompts (render.rs, prompt.rs)    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Manager (crates/lessonflow/src/manager.rs)                 │
//! │  - Navigation and history operations                        │
//! │  - Returns `Navigation` / `Record` values to persist        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything from the manager inward is UI agnostic. The CLI layer is
//! responsible for **all** user-facing concerns: argument parsing, context
//! initialization, dispatch, error handling, persistence of the manifest, and
//! rendering.
//!
//! ## Testing Approach
//!
//! - **Library**: unit and scenario tests next to the code, file-system
//!   integration tests under `crates/lessonflow/tests/`.
//! - **CLI layer (`src/cli/`)**: clap parsing tests, rendering tests on canned
//!   values, and end-to-end runs of the binary under `tests/`.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
