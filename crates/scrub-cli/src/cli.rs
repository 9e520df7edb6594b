//! CLI argument definitions for the scrub pipeline.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use scrub_engine::CorrMethod;
use scrub_model::Stage;

#[derive(Parser)]
#[command(
    name = "scrub",
    version,
    about = "Guided cleaning pipeline for tabular CSV data",
    long_about = "Clean a CSV through staged suggestions: column pruning,\n\
                  missing-value repair, outlier handling, correlation pruning,\n\
                  categorical encoding and numeric scaling."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,
}

#[derive(Subcommand)]
pub enum Command {
    /// Clean a CSV end to end, accepting every suggestion.
    Run(RunArgs),

    /// Print the inferred schema of a CSV.
    Schema(InspectArgs),

    /// Print one stage's suggestions for a CSV.
    Suggest(SuggestArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Input CSV file.
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Cleaned CSV destination (default: <CSV stem>_cleaned.csv).
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Write the step log as JSON to this path.
    #[arg(long = "log-json", value_name = "PATH")]
    pub log_json: Option<PathBuf>,

    /// Correlation threshold in (0, 1] (default 0.90).
    #[arg(long = "corr-threshold", value_name = "R")]
    pub corr_threshold: Option<f64>,

    /// Correlation method.
    #[arg(long = "corr-method", value_enum, default_value = "pearson")]
    pub corr_method: CorrMethodArg,

    /// Drop the correlation engine's redundant columns without confirmation.
    #[arg(long = "auto-drop")]
    pub auto_drop: bool,

    /// Skip missing-value repair.
    #[arg(long = "no-missing")]
    pub no_missing: bool,

    /// Skip outlier handling.
    #[arg(long = "no-outliers")]
    pub no_outliers: bool,

    /// Skip correlation pruning.
    #[arg(long = "no-correlation")]
    pub no_correlation: bool,

    /// Skip categorical encoding.
    #[arg(long = "no-encoding")]
    pub no_encoding: bool,

    /// Skip numeric scaling.
    #[arg(long = "no-scaling")]
    pub no_scaling: bool,
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Input CSV file.
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Emit JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct SuggestArgs {
    /// Input CSV file.
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Pipeline stage to inspect.
    #[arg(long, value_enum)]
    pub stage: StageArg,

    /// Correlation threshold in (0, 1] (default 0.90).
    #[arg(long = "corr-threshold", value_name = "R")]
    pub corr_threshold: Option<f64>,

    /// Correlation method.
    #[arg(long = "corr-method", value_enum, default_value = "pearson")]
    pub corr_method: CorrMethodArg,

    /// Emit JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Suggestion-bearing stages. Pruning is manual and has no engine.
#[derive(Clone, Copy, ValueEnum)]
pub enum StageArg {
    Missing,
    Outliers,
    Correlation,
    Encoding,
    Scaling,
}

impl From<StageArg> for Stage {
    fn from(value: StageArg) -> Self {
        match value {
            StageArg::Missing => Stage::Missing,
            StageArg::Outliers => Stage::Outliers,
            StageArg::Correlation => Stage::Correlation,
            StageArg::Encoding => Stage::Encoding,
            StageArg::Scaling => Stage::Scaling,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CorrMethodArg {
    Pearson,
    Spearman,
}

impl From<CorrMethodArg> for CorrMethod {
    fn from(value: CorrMethodArg) -> Self {
        match value {
            CorrMethodArg::Pearson => CorrMethod::Pearson,
            CorrMethodArg::Spearman => CorrMethod::Spearman,
        }
    }
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
