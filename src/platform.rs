//! Platform capability set.
//!
//! Everything that differs between the POSIX and Windows builds lives behind
//! [`PlatformPolicy`]: which characters separate path components, how two
//! paths are compared, how a path is canonicalized, where home is, and how the
//! chosen target is handed to the shell wrapper. The store and the engine are
//! written once against this trait.
//!
//! Both implementations compile on every platform so their pure parts can be
//! tested anywhere; [`Native`] picks the one matching the build target.

use crate::error::{Result, XcdError};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the persistence file inside the home directory
pub const MEMORY_FILE: &str = ".xcd_memory";

/// Name of the hand-off file inside the temp directory (Windows wrapper)
pub const TARGET_FILE: &str = "xcd_target.txt";

/// Overrides the persistence file location when set to a non-empty value
pub const MEMORY_FILE_ENV: &str = "XCD_MEMORY_FILE";

#[cfg(not(windows))]
pub use Posix as Native;

#[cfg(windows)]
pub use Windows as Native;

pub trait PlatformPolicy {
    /// Whether `c` separates path components in operands and stored paths
    fn is_separator(&self, c: char) -> bool;

    /// Record identity under the platform's case rules
    fn paths_equal(&self, a: &Path, b: &Path) -> bool;

    /// Absolute, normalized form used for storage and comparison
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Home directory from the environment, falling back to the OS user database
    fn resolve_home(&self) -> Result<PathBuf>;

    /// Hand the chosen directory to the shell wrapper
    fn emit_target(&self, target: &Path) -> Result<()>;

    fn contains_separator(&self, text: &str) -> bool {
        text.chars().any(|c| self.is_separator(c))
    }

    /// Text after the last separator; the whole string if there is none
    fn basename<'a>(&self, path: &'a str) -> &'a str {
        path.rsplit(|c: char| self.is_separator(c))
            .next()
            .unwrap_or(path)
    }

    fn memory_file(&self, home: &Path) -> PathBuf {
        match env::var_os(MEMORY_FILE_ENV) {
            Some(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => home.join(MEMORY_FILE),
        }
    }
}

fn home_from_env(var: &str) -> Result<PathBuf> {
    if let Some(home) = env::var_os(var).filter(|h| !h.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    debug!("{} is unset, asking the OS for the home directory", var);
    dirs::home_dir()
        .filter(|h| !h.as_os_str().is_empty())
        .ok_or(XcdError::HomeUnresolvable)
}

// ============================================================================
// POSIX
// ============================================================================

/// Linux and macOS: `/` separators, case-sensitive paths, target on stdout
#[cfg_attr(windows, allow(dead_code))]
#[derive(Debug, Clone, Copy, Default)]
pub struct Posix;

impl PlatformPolicy for Posix {
    fn is_separator(&self, c: char) -> bool {
        c == '/'
    }

    fn paths_equal(&self, a: &Path, b: &Path) -> bool {
        a == b
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }

    fn resolve_home(&self) -> Result<PathBuf> {
        home_from_env("HOME")
    }

    fn emit_target(&self, target: &Path) -> Result<()> {
        let mut line = target.as_os_str().as_encoded_bytes().to_vec();
        line.push(b'\n');

        let mut out = io::stdout().lock();
        out.write_all(&line)
            .and_then(|_| out.flush())
            .map_err(|source| XcdError::TargetUnwritable {
                path: PathBuf::from("<stdout>"),
                source,
            })
    }
}

// ============================================================================
// Windows
// ============================================================================

/// Windows: `\` or `/` separators, case-insensitive paths, target in a temp file
#[cfg_attr(not(windows), allow(dead_code))]
#[derive(Debug, Clone, Copy, Default)]
pub struct Windows;

#[cfg_attr(not(windows), allow(dead_code))]
impl Windows {
    pub fn target_file(&self) -> PathBuf {
        env::temp_dir().join(TARGET_FILE)
    }
}

impl PlatformPolicy for Windows {
    fn is_separator(&self, c: char) -> bool {
        c == '\\' || c == '/'
    }

    fn paths_equal(&self, a: &Path, b: &Path) -> bool {
        a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        // fs::canonicalize would produce verbatim `\\?\` paths that cmd.exe cannot cd into
        std::path::absolute(path)
    }

    fn resolve_home(&self) -> Result<PathBuf> {
        home_from_env("USERPROFILE")
    }

    fn emit_target(&self, target: &Path) -> Result<()> {
        let path = self.target_file();
        fs::write(&path, target.as_os_str().as_encoded_bytes())
            .map_err(|source| XcdError::TargetUnwritable { path, source })
    }
}
