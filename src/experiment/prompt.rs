//! Collision handling for fresh experiment creation
//!
//! When the target directory already exists, the configured
//! [`CollisionPolicy`] decides what happens. [`CollisionPolicy::Prompt`]
//! delegates to a [`CollisionHandler`], so tests can inject a scripted
//! handler instead of the interactive [`StdinPrompt`].

use std::io::{BufRead, Write};
use std::path::Path;

/// Behavior when a fresh experiment's directory already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Ask the collision handler (interactive by default)
    Prompt,
    /// Abort immediately with a diagnostic
    Abort,
    /// Proceed, merging into the existing directory
    Overwrite,
}

/// The answer a collision handler gives for one colliding directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionResolution {
    /// Stop the run
    Abort,
    /// Delete the old experiment and recreate it
    Delete,
    /// Continue into the existing directory
    Merge,
}

/// Decides what to do with an already existing experiment directory.
pub trait CollisionHandler {
    /// Resolve the collision for `experiment_dir`.
    fn resolve(&self, experiment_dir: &Path) -> CollisionResolution;
}

/// Interactive handler asking on stdin.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl CollisionHandler for StdinPrompt {
    fn resolve(&self, experiment_dir: &Path) -> CollisionResolution {
        let stdin = std::io::stdin();
        let mut lines = stdin.lock().lines();
        query(experiment_dir, &mut std::io::stderr(), || {
            lines.next().and_then(std::result::Result::ok)
        })
    }
}

fn query<W, F>(experiment_dir: &Path, out: &mut W, mut read_line: F) -> CollisionResolution
where
    W: Write,
    F: FnMut() -> Option<String>,
{
    let _ = writeln!(
        out,
        "Experiment {} already exists. You can either:\n\n\
         \x20 * Stop the current run and manually remove or rename the old experiment.\n\
         \x20 * Agree to delete the old experiment (be careful with that) and continue the run.\n\
         \x20 * Just continue executing the current script. This could overwrite data\n\
         \x20   in the existing experiment directory.",
        experiment_dir.display()
    );

    loop {
        let _ = writeln!(
            out,
            "\n[exit/delete/continue]? Type in the desired option or simply press [ENTER] to exit."
        );
        let _ = out.flush();

        let Some(line) = read_line() else {
            return CollisionResolution::Abort;
        };
        match line.trim().to_lowercase().as_str() {
            "" | "exit" => return CollisionResolution::Abort,
            "delete" => return CollisionResolution::Delete,
            "continue" => return CollisionResolution::Merge,
            other => {
                let _ = writeln!(out, "Please respond with exit, delete or continue (got `{other}`)");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn run_query(answers: &[&str]) -> CollisionResolution {
        let mut answers = answers.iter().map(|s| (*s).to_string());
        let mut out = Vec::new();
        query(&PathBuf::from("experiments/x"), &mut out, || answers.next())
    }

    #[test]
    fn test_empty_answer_aborts() {
        assert_eq!(run_query(&[""]), CollisionResolution::Abort);
    }

    #[test]
    fn test_eof_aborts() {
        assert_eq!(run_query(&[]), CollisionResolution::Abort);
    }

    #[test]
    fn test_known_answers() {
        assert_eq!(run_query(&["exit"]), CollisionResolution::Abort);
        assert_eq!(run_query(&["delete"]), CollisionResolution::Delete);
        assert_eq!(run_query(&["continue"]), CollisionResolution::Merge);
    }

    #[test]
    fn test_unknown_answer_reprompts() {
        assert_eq!(run_query(&["what", "DELETE"]), CollisionResolution::Delete);
    }
}
