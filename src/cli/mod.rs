//! Command-line surface: inspection tooling over stored experiments
//!
//! All subcommands are thin consumers of the [`Experiment`] and
//! [`Container`](crate::container::Container) read interfaces; nothing here
//! writes to an experiment.

mod diff;
mod summarize;

use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::container::to_pretty_string;
use crate::error::Result;
use crate::experiment::Experiment;

/// labrat - lightweight experiment tracker
#[derive(Parser, Debug)]
#[command(name = "labrat", version, about)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize metrics from all experiments in a directory
    Summarize {
        /// Directory containing experiments
        directory: std::path::PathBuf,
        /// Sort rows by this metric, descending
        #[arg(long)]
        sort: Option<String>,
    },
    /// Print the stored config of an experiment
    ShowConfig {
        /// Experiment directory or identifier
        experiment: String,
    },
    /// Print the command line that launched an experiment
    ShowCommand {
        /// Experiment directory or identifier
        experiment: String,
    },
    /// Show a diff between the configs of two experiments
    ConfigDiff {
        /// First experiment
        first: String,
        /// Second experiment
        second: String,
    },
}

/// Execute a parsed command line.
///
/// # Errors
///
/// Propagates experiment resolution and IO errors.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Summarize { directory, sort } => summarize::run(&directory, sort.as_deref()),
        Commands::ShowConfig { experiment } => {
            let experiment = resume(&experiment)?;
            println!("{}", to_pretty_string(&experiment.config().to_value()));
            Ok(())
        }
        Commands::ShowCommand { experiment } => {
            let experiment = resume(&experiment)?;
            println!("{}", experiment.command()?);
            Ok(())
        }
        Commands::ConfigDiff { first, second } => {
            let first = resume(&first)?;
            let second = resume(&second)?;
            println!("First: {}", first.experiment_dir().display().to_string().bold());
            println!("Second: {}", second.experiment_dir().display().to_string().bold());
            println!();
            println!("{}", diff::render(first.config(), second.config()));
            Ok(())
        }
    }
}

fn resume(target: &str) -> Result<Experiment> {
    Experiment::builder().resume_from(target).build()
}
