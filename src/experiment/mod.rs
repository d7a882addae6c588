//! Experiment - a named, filesystem-backed run record
//!
//! An [`Experiment`] owns one [`Config`] and one results [`Container`]; the
//! experiment directory on disk is the durable representation of both.
//!
//! ## Lifecycle
//!
//! An experiment is created **fresh** (a config is given) or **resumed** (an
//! identifier or path to an existing experiment is given); supplying both or
//! neither fails with [`Error::Configuration`]. A directory is recognizable
//! as an experiment by its `.labrat` metadata marker.
//!
//! ```text
//! experiments/10-1x2x3-x/
//! ├── .labrat/
//! │   ├── config.json
//! │   ├── results.json
//! │   ├── commit_hash
//! │   ├── command
//! │   ├── environ
//! │   ├── registered_directories
//! │   └── logs/
//! └── checkpoints/            <- register_directory("checkpoints")
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use labrat::Experiment;
//!
//! let mut experiment = Experiment::builder()
//!     .config(serde_json::json!({"lr": 0.01, "batch_size": 32}))
//!     .experiments_dir("experiments")
//!     .build()?;
//!
//! experiment.register_directory("checkpoints")?;
//! experiment.register_result("fold1.accuracy", 0.97)?;
//! # Ok::<(), labrat::Error>(())
//! ```

mod log_session;
mod metadata;
mod prompt;

pub use log_session::LogSession;
pub use prompt::{CollisionHandler, CollisionPolicy, CollisionResolution, StdinPrompt};

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::config::{Config, ConfigSource};
use crate::container::{Container, Node};
use crate::error::{Error, Result};

/// Name of the metadata marker directory inside an experiment directory.
pub const META_DIR_NAME: &str = ".labrat";

const CONFIG_FILE: &str = "config.json";
const RESULTS_FILE: &str = "results.json";
const COMMIT_HASH_FILE: &str = "commit_hash";
const COMMAND_FILE: &str = "command";
const ENVIRON_FILE: &str = "environ";
const REGISTRY_FILE: &str = "registered_directories";
const LOGS_DIR: &str = "logs";

/// One tracked run.
#[derive(Debug)]
pub struct Experiment {
    experiment_dir: PathBuf,
    config: Config,
    registered: BTreeSet<String>,
}

/// Builder for [`Experiment`], enforcing the new/resume state machine.
pub struct ExperimentBuilder {
    experiments_dir: PathBuf,
    name: Option<String>,
    add_date: bool,
    on_collision: CollisionPolicy,
    handler: Box<dyn CollisionHandler>,
    config: Option<ConfigSource>,
    resume_from: Option<PathBuf>,
}

impl Experiment {
    /// Start building an experiment.
    #[must_use]
    pub fn builder() -> ExperimentBuilder {
        ExperimentBuilder::new()
    }

    /// Whether `directory` carries the experiment metadata marker.
    #[must_use]
    pub fn is_experiment(directory: impl AsRef<Path>) -> bool {
        directory.as_ref().join(META_DIR_NAME).is_dir()
    }

    /// The experiment directory.
    #[must_use]
    pub fn experiment_dir(&self) -> &Path {
        &self.experiment_dir
    }

    /// The run-parameter config.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Idempotently create `experiment_dir/name` and record it in the
    /// registry so a later resume rediscovers it.
    ///
    /// # Errors
    ///
    /// IO errors creating the directory or appending to the registry.
    pub fn register_directory(&mut self, name: &str) -> Result<PathBuf> {
        let directory = self.experiment_dir.join(name);
        fs::create_dir_all(&directory)?;

        if self.registered.insert(name.to_string()) {
            let mut registry = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.meta_path(REGISTRY_FILE))?;
            writeln!(registry, "{name}")?;
        }

        Ok(directory)
    }

    /// Resolve a previously registered directory name to its path.
    #[must_use]
    pub fn directory(&self, name: &str) -> Option<PathBuf> {
        self.registered
            .contains(name)
            .then(|| self.experiment_dir.join(name))
    }

    /// All registered directories, by name.
    #[must_use]
    pub fn directories(&self) -> BTreeMap<String, PathBuf> {
        self.registered
            .iter()
            .map(|name| (name.clone(), self.experiment_dir.join(name)))
            .collect()
    }

    /// Merge one result at the dotted path `name` into the persisted
    /// results tree, preserving all other previously stored leaves, and
    /// re-persist.
    ///
    /// # Errors
    ///
    /// IO/JSON errors, or [`Error::UnsupportedValue`] when `name` collides
    /// with an existing leaf's prefix.
    pub fn register_result(&self, name: &str, value: impl Into<Node>) -> Result<()> {
        let results_file = self.meta_path(RESULTS_FILE);

        let mut flat = if results_file.is_file() {
            Container::from_json_file(&results_file)?.as_flat_map()
        } else {
            Vec::new()
        };

        let value = value.into();
        match flat.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value,
            None => flat.push((name.to_string(), value)),
        }

        Container::from_flat_map(flat)?.to_json_file(results_file)
    }

    /// Load the persisted results tree.
    ///
    /// # Errors
    ///
    /// IO/JSON errors; missing file surfaces as [`Error::Io`].
    pub fn results(&self) -> Result<Container> {
        Container::from_json_file(self.meta_path(RESULTS_FILE))
    }

    /// The stored command line, if one was captured.
    ///
    /// # Errors
    ///
    /// IO errors reading the command file.
    pub fn command(&self) -> Result<String> {
        Ok(fs::read_to_string(self.meta_path(COMMAND_FILE))?
            .trim_end()
            .to_string())
    }

    /// The captured git commit hash, absent when capture was skipped.
    #[must_use]
    pub fn commit_hash(&self) -> Option<String> {
        fs::read_to_string(self.meta_path(COMMIT_HASH_FILE))
            .ok()
            .map(|hash| hash.trim().to_string())
    }

    /// Open a log-capture session: a tee writer duplicating everything to
    /// stdout and to a fresh timestamp-named file under `.labrat/logs/`.
    ///
    /// # Errors
    ///
    /// IO errors creating the logs directory or the session file.
    pub fn capture_logs(&self) -> Result<LogSession> {
        LogSession::open(&self.meta_path(LOGS_DIR), Box::new(std::io::stdout()))
    }

    /// Like [`Experiment::capture_logs`], duplicating to `echo` instead of
    /// stdout.
    ///
    /// # Errors
    ///
    /// IO errors creating the logs directory or the session file.
    pub fn capture_logs_to(&self, echo: Box<dyn Write + Send>) -> Result<LogSession> {
        LogSession::open(&self.meta_path(LOGS_DIR), echo)
    }

    fn meta_path(&self, name: &str) -> PathBuf {
        self.experiment_dir.join(META_DIR_NAME).join(name)
    }
}

impl Default for ExperimentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExperimentBuilder {
    /// New builder with the default `experiments` root, prompt-on-collision
    /// policy, and no date prefix.
    #[must_use]
    pub fn new() -> Self {
        Self {
            experiments_dir: PathBuf::from("experiments"),
            name: None,
            add_date: false,
            on_collision: CollisionPolicy::Prompt,
            handler: Box::new(StdinPrompt),
            config: None,
            resume_from: None,
        }
    }

    /// Root directory for all experiments.
    #[must_use]
    pub fn experiments_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.experiments_dir = dir.into();
        self
    }

    /// Custom experiment name used instead of the config identifier.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Prefix the experiment name with the current date (`YYYY-MM-DD-`).
    #[must_use]
    pub fn add_date(mut self, add_date: bool) -> Self {
        self.add_date = add_date;
        self
    }

    /// Policy applied when the fresh-creation target already exists.
    #[must_use]
    pub fn on_collision(mut self, policy: CollisionPolicy) -> Self {
        self.on_collision = policy;
        self
    }

    /// Handler consulted under [`CollisionPolicy::Prompt`].
    #[must_use]
    pub fn collision_handler(mut self, handler: Box<dyn CollisionHandler>) -> Self {
        self.handler = handler;
        self
    }

    /// Config for a fresh experiment (path, inline JSON object, or
    /// existing [`Config`]).
    #[must_use]
    pub fn config(mut self, source: impl Into<ConfigSource>) -> Self {
        self.config = Some(source.into());
        self
    }

    /// Resume target: a bare identifier resolved under the experiments
    /// root, or a direct path to an experiment directory.
    #[must_use]
    pub fn resume_from(mut self, target: impl Into<PathBuf>) -> Self {
        self.resume_from = Some(target.into());
        self
    }

    /// Build the experiment.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when both or neither of config and resume
    /// target were supplied; otherwise the creation/resume errors below.
    pub fn build(mut self) -> Result<Experiment> {
        match (self.config.take(), self.resume_from.take()) {
            (Some(source), None) => self.create(source),
            (None, Some(target)) => self.resume(target),
            _ => Err(Error::Configuration),
        }
    }

    fn create(self, source: ConfigSource) -> Result<Experiment> {
        let config = Config::resolve(source)?;

        let name = self
            .name
            .clone()
            .unwrap_or_else(|| config.identifier());
        let prefix = if self.add_date {
            Utc::now().format("%Y-%m-%d-").to_string()
        } else {
            String::new()
        };
        let experiment_dir = self.experiments_dir.join(format!("{prefix}{name}"));

        // symlink_metadata so a plain file or dangling symlink at the target
        // also goes through the collision policy
        if experiment_dir.symlink_metadata().is_ok() {
            match self.on_collision {
                CollisionPolicy::Abort => {
                    return Err(Error::AlreadyExists {
                        dir: experiment_dir,
                    });
                }
                CollisionPolicy::Overwrite => {}
                CollisionPolicy::Prompt => match self.handler.resolve(&experiment_dir) {
                    CollisionResolution::Abort => {
                        return Err(Error::AlreadyExists {
                            dir: experiment_dir,
                        });
                    }
                    CollisionResolution::Delete => {
                        tracing::warn!(dir = %experiment_dir.display(), "deleting existing experiment");
                        if experiment_dir.is_dir() {
                            fs::remove_dir_all(&experiment_dir)?;
                        } else {
                            fs::remove_file(&experiment_dir)?;
                        }
                    }
                    CollisionResolution::Merge => {}
                },
            }
        }

        let meta_dir = experiment_dir.join(META_DIR_NAME);
        fs::create_dir_all(&meta_dir)?;
        fs::create_dir_all(meta_dir.join(LOGS_DIR))?;

        config.to_json_file(meta_dir.join(CONFIG_FILE))?;
        metadata::capture_commit_hash(&meta_dir.join(COMMIT_HASH_FILE));
        metadata::capture_command(&meta_dir.join(COMMAND_FILE))?;
        metadata::capture_environ(&meta_dir.join(ENVIRON_FILE))?;

        tracing::info!(dir = %experiment_dir.display(), "created experiment");

        // A merged run inherits the previous run's registry
        let registered = load_registry(&meta_dir.join(REGISTRY_FILE))?;

        Ok(Experiment {
            experiment_dir,
            config,
            registered,
        })
    }

    fn resume(self, target: PathBuf) -> Result<Experiment> {
        let experiment_dir = if Experiment::is_experiment(&target) {
            target
        } else {
            let nested = self.experiments_dir.join(&target);
            if Experiment::is_experiment(&nested) {
                nested
            } else {
                return Err(Error::NotAnExperiment { dir: target });
            }
        };

        let meta_dir = experiment_dir.join(META_DIR_NAME);
        let config = Config::from_json_file(meta_dir.join(CONFIG_FILE))?;
        let registered = load_registry(&meta_dir.join(REGISTRY_FILE))?;

        tracing::info!(dir = %experiment_dir.display(), "resumed experiment");

        Ok(Experiment {
            experiment_dir,
            config,
            registered,
        })
    }
}

impl std::fmt::Debug for ExperimentBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExperimentBuilder")
            .field("experiments_dir", &self.experiments_dir)
            .field("name", &self.name)
            .field("add_date", &self.add_date)
            .field("on_collision", &self.on_collision)
            .field("config", &self.config.is_some())
            .field("resume_from", &self.resume_from)
            .finish_non_exhaustive()
    }
}

fn load_registry(path: &Path) -> Result<BTreeSet<String>> {
    if !path.is_file() {
        return Ok(BTreeSet::new());
    }
    Ok(fs::read_to_string(path)?
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect())
}
