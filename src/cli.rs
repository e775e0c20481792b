//! Command-line arguments

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_INPUT: &str = "Alternative CPA Pathways Survey_December 31, 2025_09.45.csv";

#[derive(Parser, Debug)]
#[command(
    name = "survey_insights",
    version,
    about = "Charts and summaries for the alternative CPA pathway survey"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Survey export (CSV with field codes and question text as header rows).
    #[arg(long, short, value_name = "PATH", default_value = DEFAULT_INPUT, global = true)]
    pub input: PathBuf,

    /// Directory the charts and summaries are written to.
    #[arg(long = "output-dir", short, value_name = "DIR", default_value = ".", global = true)]
    pub output_dir: PathBuf,

    /// Likelihood question used for the regret factor and enrollment threat.
    #[arg(long = "regret-field", value_name = "CODE", default_value = "Q35", global = true)]
    pub regret_field: String,

    /// More log output (-v for debug, -vv for trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Awareness gap, incentive shift and regret factor.
    Awareness,
    /// Mean rank of the program features.
    Irreplaceability,
    /// Enrollment threat, ROI against employer pressure, program value.
    Pathway,
    /// Every analysis (default).
    All,
}
