//! Experiment lifecycle tests
//!
//! Every scenario runs against a scratch experiments root; nothing touches
//! the real working directory apart from the best-effort metadata capture.

use std::fs;
use std::io::Write;
use std::path::Path;

use labrat::experiment::{
    CollisionHandler, CollisionPolicy, CollisionResolution, META_DIR_NAME,
};
use labrat::{Config, Error, Experiment};
use serde_json::json;

fn nested_dict_config() -> serde_json::Value {
    json!({
        "a": 10,
        "_b": "a",
        "c": {"a": 10, "b": [1, 2, 3], "c": "a"}
    })
}

fn create(experiments_dir: &Path) -> Experiment {
    Experiment::builder()
        .config(nested_dict_config())
        .experiments_dir(experiments_dir)
        .build()
        .expect("creation failed")
}

/// Scripted stand-in for the interactive prompt.
struct Scripted(CollisionResolution);

impl CollisionHandler for Scripted {
    fn resolve(&self, _experiment_dir: &Path) -> CollisionResolution {
        self.0
    }
}

// =============================================================================
// Creation
// =============================================================================

#[test]
fn test_creation_persists_config() {
    let scratch = tempfile::tempdir().unwrap();
    let experiment = create(scratch.path());

    let config_file = experiment
        .experiment_dir()
        .join(META_DIR_NAME)
        .join("config.json");
    let persisted = Config::from_json_file(config_file).unwrap();
    assert_eq!(persisted.to_value(), nested_dict_config());
}

#[test]
fn test_experiment_dir_named_by_identifier() {
    let scratch = tempfile::tempdir().unwrap();
    let experiment = create(scratch.path());

    let expected = scratch.path().join(experiment.config().identifier());
    assert_eq!(experiment.experiment_dir(), expected);
    assert!(Experiment::is_experiment(experiment.experiment_dir()));
}

#[test]
fn test_explicit_name_overrides_identifier() {
    let scratch = tempfile::tempdir().unwrap();
    let experiment = Experiment::builder()
        .config(json!({"a": 1}))
        .experiments_dir(scratch.path())
        .name("baseline")
        .build()
        .unwrap();

    assert_eq!(experiment.experiment_dir(), scratch.path().join("baseline"));
}

#[test]
fn test_add_date_prefixes_directory_name() {
    let scratch = tempfile::tempdir().unwrap();
    let experiment = Experiment::builder()
        .config(json!({"a": 1}))
        .experiments_dir(scratch.path())
        .add_date(true)
        .build()
        .unwrap();

    let name = experiment
        .experiment_dir()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    // YYYY-MM-DD-<identifier>
    assert!(name.ends_with("-1"), "got `{name}`");
    assert_eq!(name.len(), "YYYY-MM-DD-".len() + 1);
}

#[test]
fn test_creation_captures_command_and_environ() {
    let scratch = tempfile::tempdir().unwrap();
    let experiment = create(scratch.path());

    assert!(!experiment.command().unwrap().is_empty());

    let environ_file = experiment
        .experiment_dir()
        .join(META_DIR_NAME)
        .join("environ");
    let environ: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(environ_file).unwrap()).unwrap();
    assert!(environ.is_object());
}

#[test]
#[cfg(unix)]
fn test_creation_tolerates_non_unicode_environment() {
    use std::os::unix::ffi::OsStrExt;

    let scratch = tempfile::tempdir().unwrap();
    std::env::set_var(
        "LABRAT_NON_UNICODE",
        std::ffi::OsStr::from_bytes(b"\xff\xfe"),
    );
    let result = Experiment::builder()
        .config(json!({"a": 1}))
        .experiments_dir(scratch.path())
        .build();
    std::env::remove_var("LABRAT_NON_UNICODE");

    let experiment = result.expect("creation must survive a non-unicode environment");
    assert!(experiment.experiment_dir().is_dir());
}

// =============================================================================
// Collision handling
// =============================================================================

#[test]
fn test_abort_policy_leaves_existing_directory_untouched() {
    let scratch = tempfile::tempdir().unwrap();
    let first = create(scratch.path());

    let sentinel = first.experiment_dir().join("precious.txt");
    fs::write(&sentinel, "keep me").unwrap();

    let result = Experiment::builder()
        .config(nested_dict_config())
        .experiments_dir(scratch.path())
        .on_collision(CollisionPolicy::Abort)
        .build();

    assert!(matches!(result, Err(Error::AlreadyExists { .. })));
    assert_eq!(fs::read_to_string(&sentinel).unwrap(), "keep me");
}

#[test]
fn test_abort_error_names_the_directory() {
    let scratch = tempfile::tempdir().unwrap();
    let first = create(scratch.path());
    let dir = first.experiment_dir().to_path_buf();

    let err = Experiment::builder()
        .config(nested_dict_config())
        .experiments_dir(scratch.path())
        .on_collision(CollisionPolicy::Abort)
        .build()
        .unwrap_err();

    assert!(err.to_string().contains(&dir.display().to_string()));
}

#[test]
fn test_abort_policy_covers_a_plain_file_at_the_target() {
    let scratch = tempfile::tempdir().unwrap();
    let identifier = Config::from_value(&nested_dict_config())
        .unwrap()
        .identifier();
    fs::write(scratch.path().join(&identifier), "in the way").unwrap();

    let result = Experiment::builder()
        .config(nested_dict_config())
        .experiments_dir(scratch.path())
        .on_collision(CollisionPolicy::Abort)
        .build();

    assert!(matches!(result, Err(Error::AlreadyExists { .. })));
}

#[test]
fn test_prompt_delete_replaces_a_plain_file_at_the_target() {
    let scratch = tempfile::tempdir().unwrap();
    let identifier = Config::from_value(&nested_dict_config())
        .unwrap()
        .identifier();
    fs::write(scratch.path().join(&identifier), "in the way").unwrap();

    let experiment = Experiment::builder()
        .config(nested_dict_config())
        .experiments_dir(scratch.path())
        .collision_handler(Box::new(Scripted(CollisionResolution::Delete)))
        .build()
        .unwrap();

    assert!(Experiment::is_experiment(experiment.experiment_dir()));
}

#[test]
fn test_overwrite_policy_merges_into_existing_directory() {
    let scratch = tempfile::tempdir().unwrap();
    let mut first = create(scratch.path());
    first.register_directory("checkpoints").unwrap();

    let second = Experiment::builder()
        .config(nested_dict_config())
        .experiments_dir(scratch.path())
        .on_collision(CollisionPolicy::Overwrite)
        .build()
        .unwrap();

    // registry from the previous run survives the merge
    assert!(second.directory("checkpoints").is_some());
}

#[test]
fn test_prompt_delete_recreates_the_directory() {
    let scratch = tempfile::tempdir().unwrap();
    let first = create(scratch.path());
    let sentinel = first.experiment_dir().join("stale.txt");
    fs::write(&sentinel, "old run").unwrap();

    let second = Experiment::builder()
        .config(nested_dict_config())
        .experiments_dir(scratch.path())
        .collision_handler(Box::new(Scripted(CollisionResolution::Delete)))
        .build()
        .unwrap();

    assert!(!sentinel.exists());
    assert!(Experiment::is_experiment(second.experiment_dir()));
}

#[test]
fn test_prompt_abort_fails_with_diagnostic() {
    let scratch = tempfile::tempdir().unwrap();
    create(scratch.path());

    let result = Experiment::builder()
        .config(nested_dict_config())
        .experiments_dir(scratch.path())
        .collision_handler(Box::new(Scripted(CollisionResolution::Abort)))
        .build();

    assert!(matches!(result, Err(Error::AlreadyExists { .. })));
}

// =============================================================================
// Resume
// =============================================================================

#[test]
fn test_resume_by_path_reconstructs_config() {
    let scratch = tempfile::tempdir().unwrap();
    let original = create(scratch.path());

    let resumed = Experiment::builder()
        .resume_from(original.experiment_dir())
        .build()
        .unwrap();

    assert_eq!(resumed.config(), original.config());
    assert_eq!(resumed.experiment_dir(), original.experiment_dir());
}

#[test]
fn test_resume_by_identifier_under_experiments_dir() {
    let scratch = tempfile::tempdir().unwrap();
    let original = create(scratch.path());
    let identifier = original.config().identifier();

    let resumed = Experiment::builder()
        .experiments_dir(scratch.path())
        .resume_from(identifier)
        .build()
        .unwrap();

    assert_eq!(resumed.config().to_value(), nested_dict_config());
}

#[test]
fn test_resume_rediscovers_registered_directories() {
    let scratch = tempfile::tempdir().unwrap();
    let mut original = create(scratch.path());
    original.register_directory("checkpoints").unwrap();
    original.register_directory("plots").unwrap();

    let resumed = Experiment::builder()
        .resume_from(original.experiment_dir())
        .build()
        .unwrap();

    assert_eq!(
        resumed.directory("checkpoints"),
        Some(original.experiment_dir().join("checkpoints"))
    );
    assert_eq!(resumed.directories().len(), 2);
}

#[test]
fn test_resume_rejects_non_experiment_directory() {
    let scratch = tempfile::tempdir().unwrap();
    fs::create_dir(scratch.path().join("not-an-experiment")).unwrap();

    let result = Experiment::builder()
        .experiments_dir(scratch.path())
        .resume_from("not-an-experiment")
        .build();

    assert!(matches!(result, Err(Error::NotAnExperiment { .. })));
}

// =============================================================================
// Registered directories
// =============================================================================

#[test]
fn test_register_directory_is_idempotent() {
    let scratch = tempfile::tempdir().unwrap();
    let mut experiment = create(scratch.path());

    let first = experiment.register_directory("x").unwrap();
    let second = experiment.register_directory("x").unwrap();
    assert_eq!(first, second);
    assert!(first.is_dir());

    let registry = experiment
        .experiment_dir()
        .join(META_DIR_NAME)
        .join("registered_directories");
    let entries: Vec<_> = fs::read_to_string(registry)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(entries, vec!["x"]);
}

#[test]
fn test_unregistered_directory_is_not_addressable() {
    let scratch = tempfile::tempdir().unwrap();
    let experiment = create(scratch.path());
    assert_eq!(experiment.directory("nope"), None);
}

// =============================================================================
// Results
// =============================================================================

#[test]
fn test_register_result_merges_shared_prefixes() {
    let scratch = tempfile::tempdir().unwrap();
    let experiment = create(scratch.path());

    experiment.register_result("fold1.accuracy", 0.97).unwrap();
    experiment.register_result("fold1.loss", 0.03).unwrap();

    let results = experiment.results().unwrap();
    assert_eq!(
        results.get("fold1.accuracy"),
        Some(&labrat::Node::from(0.97))
    );
    assert_eq!(results.get("fold1.loss"), Some(&labrat::Node::from(0.03)));
}

#[test]
fn test_register_result_overwrites_only_the_targeted_leaf() {
    let scratch = tempfile::tempdir().unwrap();
    let experiment = create(scratch.path());

    experiment.register_result("fold1.accuracy", 0.90).unwrap();
    experiment.register_result("fold1.loss", 0.10).unwrap();
    experiment.register_result("fold1.accuracy", 0.95).unwrap();

    let results = experiment.results().unwrap();
    assert_eq!(
        results.get("fold1.accuracy"),
        Some(&labrat::Node::from(0.95))
    );
    assert_eq!(results.get("fold1.loss"), Some(&labrat::Node::from(0.10)));
}

#[test]
fn test_results_survive_resume() {
    let scratch = tempfile::tempdir().unwrap();
    let original = create(scratch.path());
    original.register_result("best.score", 0.5).unwrap();

    let resumed = Experiment::builder()
        .resume_from(original.experiment_dir())
        .build()
        .unwrap();

    assert_eq!(
        resumed.results().unwrap().get("best.score"),
        Some(&labrat::Node::from(0.5))
    );
}

// =============================================================================
// Log capture
// =============================================================================

#[test]
fn test_log_session_tees_to_file_and_sink() {
    let scratch = tempfile::tempdir().unwrap();
    let experiment = create(scratch.path());

    let mut session = experiment.capture_logs_to(Box::new(Vec::new())).unwrap();
    writeln!(session, "epoch 1: loss 0.5").unwrap();
    let log_path = session.path().to_path_buf();
    drop(session);

    let logged = fs::read_to_string(&log_path).unwrap();
    assert!(logged.contains("epoch 1: loss 0.5"));

    // nothing written after the session is closed ends up in the file
    let after = fs::read_to_string(&log_path).unwrap();
    assert_eq!(logged, after);
}

#[test]
fn test_log_sessions_live_under_the_logs_dir() {
    let scratch = tempfile::tempdir().unwrap();
    let experiment = create(scratch.path());

    let session = experiment.capture_logs_to(Box::new(Vec::new())).unwrap();
    let logs_dir = experiment.experiment_dir().join(META_DIR_NAME).join("logs");
    assert_eq!(session.path().parent(), Some(logs_dir.as_path()));
}
