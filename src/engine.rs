//! Match-and-cycle engine.
//!
//! Resolves an operand to one directory. A segment without separators is
//! matched against the basenames of remembered directories; when several
//! match, the one after the caller's current directory is chosen, wrapping
//! around. Running the same segment again from the chosen directory therefore
//! walks through every match without any extra state.

use crate::error::{Result, XcdError};
use crate::platform::PlatformPolicy;
use crate::store::DirectoryStore;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Remembered directories whose basename contains `segment`, in store order.
/// An empty segment matches everything.
pub fn filter_by_basename<'s, P: PlatformPolicy>(
    segment: &str,
    store: &'s DirectoryStore<P>,
) -> Vec<&'s Path> {
    let policy = store.policy();
    store
        .iter()
        .filter(|entry| {
            let text = entry.to_string_lossy();
            policy.basename(&text).contains(segment)
        })
        .collect()
}

/// Matches for a segment plus where the caller stands among them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle<'s> {
    pub matches: Vec<&'s Path>,
    /// Index of the current directory in `matches`, if it is one of them
    pub current: Option<usize>,
    /// Index the next navigation will pick
    pub next: usize,
}

impl<'s> Cycle<'s> {
    pub fn target(&self) -> &'s Path {
        self.matches[self.next]
    }
}

fn cycle<'s, P: PlatformPolicy>(
    segment: &str,
    current_dir: Option<&Path>,
    store: &'s DirectoryStore<P>,
) -> Result<Cycle<'s>> {
    let matches = filter_by_basename(segment, store);
    if matches.is_empty() {
        return Err(XcdError::NoMatch(segment.to_string()));
    }

    let current_dir = current_dir.ok_or(XcdError::CurrentDirUnresolvable)?;
    let policy = store.policy();
    let current = matches
        .iter()
        .position(|m| policy.paths_equal(m, current_dir));
    let next = match current {
        Some(i) => (i + 1) % matches.len(),
        None => 0,
    };

    Ok(Cycle {
        matches,
        current,
        next,
    })
}

/// Pick the directory an operand refers to.
///
/// - no operand: home, canonicalized when possible
/// - an existing directory (relative to `current_dir`): that directory
/// - a plain segment: the next basename match after `current_dir`
/// - anything else: [`XcdError::InvalidOperand`]
///
/// The operand is raw OS text so directories with non-UTF-8 names can still be
/// reached by path; only UTF-8 segments take part in basename matching.
pub fn resolve_target<P: PlatformPolicy>(
    segment: Option<&OsStr>,
    current_dir: Option<&Path>,
    store: &DirectoryStore<P>,
    home: &Path,
) -> Result<PathBuf> {
    let policy = store.policy();

    let segment = match segment {
        Some(s) if !s.is_empty() => s,
        _ => {
            return Ok(policy
                .canonicalize(home)
                .unwrap_or_else(|_| home.to_path_buf()))
        }
    };
    let invalid = || XcdError::InvalidOperand(segment.to_string_lossy().into_owned());

    let literal = Path::new(segment);
    let candidate = match current_dir {
        Some(cwd) if literal.is_relative() => cwd.join(literal),
        _ => literal.to_path_buf(),
    };
    if candidate.is_dir() {
        debug!("{:?} is a directory, skipping fuzzy match", candidate);
        return policy.canonicalize(&candidate).map_err(|_| invalid());
    }

    let Some(segment) = segment.to_str() else {
        return Err(invalid());
    };
    if policy.contains_separator(segment) {
        return Err(invalid());
    }

    let cycle = cycle(segment, current_dir, store)?;
    debug!(
        "Segment {:?}: {} matches, current {:?}, picking [{}]",
        segment,
        cycle.matches.len(),
        cycle.current,
        cycle.next
    );
    Ok(cycle.target().to_path_buf())
}

/// What navigating with `segment` would do, without touching the store
#[derive(Debug)]
pub struct Preview<'s> {
    pub segment: String,
    pub cycle: Option<Cycle<'s>>,
}

pub fn preview_matches<'s, P: PlatformPolicy>(
    segment: &str,
    current_dir: Option<&Path>,
    store: &'s DirectoryStore<P>,
) -> Result<Preview<'s>> {
    let cycle = match cycle(segment, current_dir, store) {
        Ok(c) => Some(c),
        Err(XcdError::NoMatch(_)) => None,
        Err(e) => return Err(e),
    };
    Ok(Preview {
        segment: segment.to_string(),
        cycle,
    })
}

impl fmt::Display for Preview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(cycle) = &self.cycle else {
            return writeln!(f, "No matches for \"{}\".", self.segment);
        };

        writeln!(f, "Matches for \"{}\":", self.segment)?;
        for (i, m) in cycle.matches.iter().enumerate() {
            let mark = if cycle.current == Some(i) { "*" } else { " " };
            writeln!(f, "  [{}]{} {}", i, mark, m.display())?;
        }

        match cycle.current {
            Some(i) => writeln!(f, "Current directory is at index [{}].", i)?,
            None => writeln!(f, "Current directory is not in the match list.")?,
        }

        writeln!(
            f,
            "Next target for segment \"{}\": [{}] {}",
            self.segment,
            cycle.next,
            cycle.target().display()
        )
    }
}
