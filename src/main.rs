//! Survey Insights - CPA pathway survey analysis
//!
//! Loads the survey export once, then runs the awareness, irreplaceability
//! and pathway analyses, writing PNG charts and text/CSV summaries.

mod analysis;
mod charts;
mod cli;
mod config;
mod data;
mod logging;
mod report;
mod stats;

use analysis::{awareness, irreplaceability, pathway, AnalysisContext};
use anyhow::{Context, Result};
use charts::{ChartRenderer, ChartStyle};
use clap::Parser;
use cli::Cli;
use config::{Analysis, RunConfig};
use std::fs;
use tracing::info;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let config = RunConfig::from_cli(&cli)?;
    run(&config)
}

fn run(config: &RunConfig) -> Result<()> {
    let survey = data::load_survey(&config.input)
        .with_context(|| format!("loading survey {}", config.input.display()))?;
    info!(
        respondents = survey.respondent_count(),
        fields = survey.schema.field_codes().len(),
        "Survey loaded"
    );

    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("creating output directory {}", config.output_dir.display())
    })?;

    let renderer = ChartRenderer::new(ChartStyle::default());
    let ctx = AnalysisContext {
        survey: &survey,
        renderer: &renderer,
        output_dir: &config.output_dir,
        regret_field: &config.regret_field,
    };

    for analysis in &config.analyses {
        match analysis {
            Analysis::Awareness => {
                awareness::run(&ctx).context("awareness analysis failed")?;
            }
            Analysis::Irreplaceability => {
                irreplaceability::run(&ctx).context("irreplaceability analysis failed")?;
            }
            Analysis::Pathway => {
                pathway::run(&ctx).context("pathway analysis failed")?;
            }
        }
    }

    info!(dir = %config.output_dir.display(), "All outputs written");
    Ok(())
}
