//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Type checker for class-based Vue components
#[derive(Parser, Debug, Clone)]
#[command(name = "vue-class-check")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Workspace directory to check
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,

    /// Path to tsconfig.json
    #[arg(short = 'p', long)]
    pub project: Option<PathBuf>,

    /// Re-check when files change
    #[arg(short = 'W', long)]
    pub watch: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output: OutputFormat,

    /// Keep the generated TypeScript tree after checking
    #[arg(long)]
    pub emit_virtual: bool,

    /// Fail when more warnings than this are reported
    #[arg(long)]
    pub max_warnings: Option<usize>,

    /// Fail on any warning
    #[arg(long)]
    pub fail_on_warning: bool,

    /// Only report component diagnostics, without running the type checker
    #[arg(long)]
    pub skip_typecheck: bool,

    /// Use tsgo instead of tsc
    #[arg(long)]
    pub use_tsgo: bool,

    /// Ignore patterns (glob, relative to the workspace)
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Output format for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// One JSON object per line
    Json,
    /// Colon-separated fields
    Machine,
}

impl Args {
    /// The log filter used when `RUST_LOG` is unset.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }

    /// Whether a run with these counts fails.
    pub fn fails(&self, errors: usize, warnings: usize) -> bool {
        errors > 0
            || (self.fail_on_warning && warnings > 0)
            || self.max_warnings.is_some_and(|max| warnings > max)
    }
}
