//! xcd-core - directory memory and fuzzy navigation for the `xcd` shell wrapper
//!
//! Remembers every directory the user navigates from or to, and resolves a
//! partial basename to one of them. When several remembered directories share
//! the segment, repeated calls cycle through them in the order they were first
//! visited.
//!
//! # Output
//! The chosen directory goes to stdout (POSIX) or `%TEMP%\xcd_target.txt`
//! (Windows); the wrapper changes directory to it. Diagnostics and logs go to
//! stderr so they never reach the wrapper.
//!
//! # Persistence
//! `~/.xcd_memory`, one path per line (override with `XCD_MEMORY_FILE`).

mod engine;
mod error;
mod platform;
mod store;

use clap::{ArgGroup, Parser};
use colored::Colorize;
use engine::{filter_by_basename, preview_matches, resolve_target};
use error::{Result, XcdError};
use platform::{Native, PlatformPolicy};
use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use store::DirectoryStore;
use tracing::{debug, info};

// ============================================================================
// Command Line
// ============================================================================

const USAGE: &str = "\
xcd-core - core logic for xcd

Usage (called via shell wrapper):
  xcd-core                 Print canonical HOME directory.
  xcd-core DIR             Print canonical DIR if it exists.
  xcd-core SEGMENT         Fuzzy match remembered dirs by basename and
                           print the chosen target directory.

Options (management / info; do NOT change directory):
  xcd-core -h              Show this help.
  xcd-core -l              List all remembered directories.
  xcd-core -l SEGMENT      List remembered dirs whose basename contains SEGMENT.
  xcd-core -p SEGMENT      Preview matches and which one would be used next.
  xcd-core -c              Clear the memory file (~/.xcd_memory).

Note: wrappers should only 'cd' into the directory printed when
no -h/-l/-p/-c option is used.
";

#[derive(Parser, Debug)]
#[command(
    name = "xcd-core",
    disable_help_flag = true,
    disable_version_flag = true,
    override_usage = "xcd-core [-h | -c | -l [SEGMENT] | -p SEGMENT | DIR | SEGMENT]"
)]
#[command(group(
    ArgGroup::new("mode")
        .multiple(false)
        .args(["help", "list", "preview", "clear", "target"])
))]
struct Cli {
    /// Show usage
    #[arg(short = 'h')]
    help: bool,

    /// List remembered directories, optionally filtered by basename
    #[arg(short = 'l', value_name = "SEGMENT", num_args = 0..=1)]
    list: Option<Option<String>>,

    /// Preview the matches for a segment and which one comes next
    #[arg(short = 'p', value_name = "SEGMENT", num_args = 0..=1)]
    preview: Option<Option<String>>,

    /// Forget every remembered directory
    #[arg(short = 'c')]
    clear: bool,

    /// Directory or basename segment to navigate to
    #[arg(value_name = "DIR|SEGMENT", allow_hyphen_values = true)]
    target: Option<OsString>,
}

#[derive(Debug, PartialEq, Eq)]
enum Mode {
    Help,
    List(Option<String>),
    Preview(Option<String>),
    Clear,
    Navigate(Option<OsString>),
}

impl Cli {
    fn mode(self) -> Mode {
        if self.help {
            Mode::Help
        } else if self.clear {
            Mode::Clear
        } else if let Some(segment) = self.list {
            Mode::List(segment)
        } else if let Some(segment) = self.preview {
            Mode::Preview(segment)
        } else {
            Mode::Navigate(self.target)
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    // Logs only show up when RUST_LOG asks for them; stdout belongs to the wrapper
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            if let Err(io) = e.print() {
                debug!("Could not print argument error: {}", io);
            }
            return ExitCode::FAILURE;
        }
    };

    match run(cli.mode(), Native) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

/// Print a diagnostic on stderr
fn report(e: &XcdError) {
    eprintln!("{} {}", "xcd:".red().bold(), e);
}

fn run<P: PlatformPolicy + Copy>(mode: Mode, policy: P) -> Result<()> {
    let home = policy.resolve_home()?;
    let file = policy.memory_file(&home);
    debug!("Memory file: {:?}", file);

    let mut store = DirectoryStore::load(&file, policy).unwrap_or_else(|e| {
        report(&e);
        DirectoryStore::empty(&file, policy)
    });
    info!("Loaded {} remembered directories", store.len());

    let cwd = current_dir(&policy);

    match mode {
        Mode::Help => {
            print!("{}", USAGE);
            Ok(())
        }
        Mode::List(segment) => {
            for dir in filter_by_basename(segment.as_deref().unwrap_or(""), &store) {
                println!("{}", dir.display());
            }
            Ok(())
        }
        Mode::Preview(segment) => {
            let segment = segment
                .filter(|s| !s.is_empty())
                .ok_or(XcdError::MissingArgument("-p"))?;
            print!("{}", preview_matches(&segment, cwd.as_deref(), &store)?);
            Ok(())
        }
        Mode::Clear => {
            if let Err(e) = store.clear() {
                report(&e);
            }
            info!("Cleared {:?}", store.file());
            Ok(())
        }
        Mode::Navigate(segment) => {
            navigate(segment.as_deref(), cwd.as_deref(), &home, &mut store)
        }
    }
}

/// The process working directory in canonical form
fn current_dir<P: PlatformPolicy>(policy: &P) -> Option<PathBuf> {
    let cwd = env::current_dir().ok()?;
    policy.canonicalize(&cwd).ok()
}

/// Remember where we are, pick the target, hand it off, remember it too.
fn navigate<P: PlatformPolicy>(
    segment: Option<&OsStr>,
    cwd: Option<&Path>,
    home: &Path,
    store: &mut DirectoryStore<P>,
) -> Result<()> {
    if let Some(cwd) = cwd {
        store.remember(cwd);
    }

    let outcome = resolve_target(segment, cwd, store, home).and_then(|target| {
        store.policy().emit_target(&target)?;
        Ok(target)
    });

    if let Ok(target) = &outcome {
        info!("Target: {:?}", target);
        store.remember(target);
    }

    if store.is_dirty() {
        if let Err(e) = store.save() {
            report(&e);
        }
    }

    outcome.map(|_| ())
}

// ============================================================================
// Tests
// ============================================================================
