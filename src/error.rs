//! Error types for labrat
//!
//! Construction-time errors carry the offending directory or identifier so
//! the operator can resolve the conflict manually (rename, delete, or switch
//! to resume mode).

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Labrat error types
#[derive(Error, Debug)]
pub enum Error {
    /// Container built from a mapping with zero fields
    #[error("cannot build a container from an empty mapping")]
    EmptyConfig,

    /// Value outside the JSON-compatible scalar/list/object model
    #[error("unsupported container value: {0}")]
    UnsupportedValue(String),

    /// Config argument is neither a JSON file path, an object, nor a Config
    #[error(
        "invalid config source: {0}\nExpected a path to a JSON file, an inline JSON object, or an existing Config"
    )]
    InvalidConfigSource(String),

    /// Both or neither of config / resume target supplied
    #[error("either a config or a resume target must be given, but not both")]
    Configuration,

    /// Fresh-creation target already exists and the collision policy forbids it
    #[error(
        "experiment directory `{}` already exists\nRemove or rename it, resume it instead, or allow overwriting",
        .dir.display()
    )]
    AlreadyExists {
        /// The colliding experiment directory
        dir: PathBuf,
    },

    /// Resume target does not carry the experiment metadata marker
    #[error(
        "`{}` is not an experiment directory (missing the `.labrat` marker)",
        .dir.display()
    )]
    NotAnExperiment {
        /// The directory that was checked
        dir: PathBuf,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
