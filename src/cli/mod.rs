// src/cli/mod.rs — CLI definition (clap derive)

pub mod inspect;
pub mod progress;
pub mod run;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::infra::config::Config;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "seqforge",
    about = "Feedback-directed random test generation",
    version
)]
pub struct Cli {
    /// Options for `run` (the default command when no subcommand is given)
    #[command(flatten)]
    pub run: RunArgs,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Explore a target and write the generated tests
    Run(RunArgs),
    /// List the built-in targets
    Targets,
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Built-in target to explore (see `seqforge targets`)
    #[arg(short, long, default_value = "collections")]
    pub target: String,

    /// Random seed; equal seeds give equal runs
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Wall-clock limit in seconds
    #[arg(long)]
    pub time_limit: Option<u64>,

    /// Stop after this many candidate sequences
    #[arg(long)]
    pub input_limit: Option<u64>,

    /// Stop after this many surfaced tests
    #[arg(long)]
    pub output_limit: Option<usize>,

    /// Per-statement timeout in milliseconds (0 disables it)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Directory for generated tests
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Suppress progress output (only print the summary)
    #[arg(short, long)]
    pub quiet: bool,
}

impl RunArgs {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(seed) = self.seed {
            config.generation.seed = seed;
        }
        if let Some(secs) = self.time_limit {
            config.generation.time_limit_secs = secs;
        }
        if self.input_limit.is_some() {
            config.generation.input_limit = self.input_limit;
        }
        if self.output_limit.is_some() {
            config.generation.output_limit = self.output_limit;
        }
        if let Some(ms) = self.timeout_ms {
            config.sandbox.statement_timeout_ms = (ms > 0).then_some(ms);
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(ref dir) = self.output_dir {
            config.output.dir = Some(dir.clone());
        }
    }
}
