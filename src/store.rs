//! Directory store: the ordered, deduplicated list of remembered directories
//! and its plain-text persistence file.
//!
//! # File format
//! One absolute path per line, LF terminated, no header and no escaping.
//! Paths are written in the platform's native byte encoding.
//!
//! # Invariants
//! - no two entries are equal under [`PlatformPolicy::paths_equal`]
//! - every entry was an existing directory when it was admitted
//! - entries keep insertion order; only [`DirectoryStore::clear`] removes them
//! - at most `capacity` entries; later insertions are dropped

use crate::error::{Result, XcdError};
use crate::platform::PlatformPolicy;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maximum number of remembered directories
pub const DEFAULT_CAPACITY: usize = 8192;

#[derive(Debug)]
pub struct DirectoryStore<P> {
    file: PathBuf,
    entries: Vec<PathBuf>,
    capacity: usize,
    dirty: bool,
    policy: P,
}

impl<P: PlatformPolicy> DirectoryStore<P> {
    /// A store with no entries bound to `file`. Nothing is read or written.
    pub fn empty(file: impl Into<PathBuf>, policy: P) -> Self {
        Self::with_capacity(file, policy, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(file: impl Into<PathBuf>, policy: P, capacity: usize) -> Self {
        Self {
            file: file.into(),
            entries: Vec::new(),
            capacity,
            dirty: false,
            policy,
        }
    }

    /// Read `file`, pruning lines that no longer name a directory.
    ///
    /// A missing file is an empty store. Any other read failure is returned so
    /// the caller can report it and fall back to [`DirectoryStore::empty`].
    pub fn load(file: impl Into<PathBuf>, policy: P) -> Result<Self> {
        Self::load_with_capacity(file, policy, DEFAULT_CAPACITY)
    }

    pub fn load_with_capacity(
        file: impl Into<PathBuf>,
        policy: P,
        capacity: usize,
    ) -> Result<Self> {
        let mut store = Self::with_capacity(file, policy, capacity);

        let bytes = match fs::read(&store.file) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No memory file at {:?} yet", store.file);
                return Ok(store);
            }
            Err(source) => {
                return Err(XcdError::PersistenceUnreadable {
                    path: store.file.clone(),
                    source,
                })
            }
        };

        let mut pruned = 0usize;
        for line in bytes.split(|b| *b == b'\n') {
            if store.entries.len() >= store.capacity {
                break;
            }
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match store.admit(&path_from_bytes(line)) {
                Some(canon) => store.entries.push(canon),
                None => pruned += 1,
            }
        }

        debug!(
            "Loaded {} directories from {:?} ({} skipped)",
            store.entries.len(),
            store.file,
            pruned
        );
        Ok(store)
    }

    /// Canonical form of `path` if it may join the store: an existing
    /// directory that is not already present.
    fn admit(&self, path: &Path) -> Option<PathBuf> {
        if !path.is_dir() {
            return None;
        }
        let canon = self.policy.canonicalize(path).ok()?;
        if self.contains(&canon) {
            return None;
        }
        Some(canon)
    }

    /// Append `path` if it is an existing directory not yet remembered.
    /// Returns whether the store grew.
    pub fn remember(&mut self, path: &Path) -> bool {
        if self.entries.len() >= self.capacity {
            return false;
        }
        match self.admit(path) {
            Some(canon) => {
                debug!("Remembering {:?}", canon);
                self.entries.push(canon);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.iter().any(|e| self.policy.paths_equal(e, path))
    }

    /// Rewrite the file if anything was remembered since load.
    /// Returns whether the file was written.
    pub fn save(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }

        let mut buf = Vec::new();
        for entry in &self.entries {
            buf.extend_from_slice(entry.as_os_str().as_encoded_bytes());
            buf.push(b'\n');
        }

        fs::write(&self.file, buf).map_err(|source| XcdError::PersistenceUnwritable {
            path: self.file.clone(),
            source,
        })?;

        debug!("Saved {} directories to {:?}", self.entries.len(), self.file);
        self.dirty = false;
        Ok(true)
    }

    /// Forget everything and truncate the file right away.
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.dirty = false;
        File::create(&self.file).map_err(|source| XcdError::PersistenceUnwritable {
            path: self.file.clone(),
            source,
        })?;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}
