//! # Labrat: Lightweight Experiment Tracker
//!
//! Labrat derives a deterministic, human-readable identifier from a nested
//! parameter set, persists the parameters and run metadata (commit hash,
//! command line, environment, logs, arbitrary result metrics) to a
//! per-experiment directory, and re-opens that directory later to append
//! results or inspect history.
//!
//! ## Example
//!
//! ```rust,no_run
//! use labrat::Experiment;
//! use std::io::Write;
//!
//! let mut experiment = Experiment::builder()
//!     .config(serde_json::json!({
//!         "lr": 0.01,
//!         "batch_size": 32,
//!         "_comment": "excluded from the identifier"
//!     }))
//!     .build()?;
//!
//! // experiments/32-0.01 now holds config.json and run metadata
//! let mut log = experiment.capture_logs()?;
//! writeln!(log, "training...")?;
//!
//! experiment.register_directory("checkpoints")?;
//! experiment.register_result("fold1.accuracy", 0.97)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Limitations
//!
//! Single-process by design: there is no cross-process locking on the
//! experiment directory, and concurrent creators can race on the
//! exists-then-create check.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cli;
pub mod config;
pub mod container;
pub mod error;
pub mod experiment;

pub use config::{Config, ConfigSource, DEFAULT_SEPARATOR};
pub use container::{Container, Node, Scalar};
pub use error::{Error, Result};
pub use experiment::{CollisionPolicy, Experiment, ExperimentBuilder, LogSession};
