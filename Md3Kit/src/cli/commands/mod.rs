pub mod dump;
pub mod inspect;
pub mod validate;

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Decode an MD3 file and print a summary with any diagnostics
    Inspect {
        /// MD3 file
        file: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Treat shader index mismatches as warnings
        #[arg(long)]
        lenient: bool,
    },

    /// Dump the whole decoded model as JSON
    Dump {
        /// MD3 file
        file: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Treat shader index mismatches as warnings
        #[arg(long)]
        lenient: bool,
    },

    /// Validate MD3 files or directories of them
    Validate {
        /// Files or directories (searched recursively)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Treat shader index mismatches as warnings
        #[arg(long)]
        lenient: bool,

        /// Only report failures
        #[arg(short, long)]
        quiet: bool,
    },
}

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Inspect { file, json, lenient } => inspect::execute(file, *json, *lenient),
            Commands::Dump { file, output, lenient } => {
                dump::execute(file, output.as_deref(), *lenient)
            }
            Commands::Validate { paths, lenient, quiet } => {
                validate::execute(paths, *lenient, *quiet)
            }
        }
    }
}

/// Decode options for the `--lenient` flag
fn read_options(lenient: bool) -> crate::formats::md3::ReadOptions {
    if lenient {
        crate::formats::md3::ReadOptions::lenient()
    } else {
        crate::formats::md3::ReadOptions::default()
    }
}
