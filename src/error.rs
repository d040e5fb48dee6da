//! Error kinds surfaced by the store, the engine and the command layer.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XcdError {
    #[error("cannot determine HOME")]
    HomeUnresolvable,

    #[error("cannot read {path}: {source}")]
    PersistenceUnreadable { path: PathBuf, source: io::Error },

    #[error("cannot write {path}: {source}")]
    PersistenceUnwritable { path: PathBuf, source: io::Error },

    #[error("cannot write target file {path}: {source}")]
    TargetUnwritable { path: PathBuf, source: io::Error },

    #[error("cannot determine current directory")]
    CurrentDirUnresolvable,

    #[error("no directory matches \"{0}\"")]
    NoMatch(String),

    #[error("\"{0}\" is not a directory and not a simple segment")]
    InvalidOperand(String),

    #[error("{0} requires a segment")]
    MissingArgument(&'static str),
}

pub type Result<T> = std::result::Result<T, XcdError>;
