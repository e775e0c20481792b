//! Run configuration resolved from the command line.

use crate::cli::{Cli, Command};
use crate::data::scale_for;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("regret field '{field}' has no registered ordinal scale")]
    UnknownRegretField { field: String },
}

/// Which analyses to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Analysis {
    Awareness,
    Irreplaceability,
    Pathway,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub regret_field: String,
    pub analyses: Vec<Analysis>,
}

impl RunConfig {
    /// Resolve and validate the arguments before anything is loaded or written.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let regret_field = cli.regret_field.trim().to_string();
        if scale_for(&regret_field).is_none() {
            return Err(ConfigError::UnknownRegretField {
                field: regret_field,
            });
        }

        let analyses = match cli.command.unwrap_or(Command::All) {
            Command::Awareness => vec![Analysis::Awareness],
            Command::Irreplaceability => vec![Analysis::Irreplaceability],
            Command::Pathway => vec![Analysis::Pathway],
            Command::All => vec![
                Analysis::Awareness,
                Analysis::Irreplaceability,
                Analysis::Pathway,
            ],
        };

        Ok(Self {
            input: cli.input.clone(),
            output_dir: cli.output_dir.clone(),
            regret_field,
            analyses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config(args: &[&str]) -> Result<RunConfig, ConfigError> {
        let cli = Cli::try_parse_from(args).unwrap();
        RunConfig::from_cli(&cli)
    }

    #[test]
    fn test_default_runs_everything() {
        let config = config(&["survey_insights"]).unwrap();
        assert_eq!(
            config.analyses,
            vec![
                Analysis::Awareness,
                Analysis::Irreplaceability,
                Analysis::Pathway
            ]
        );
        assert_eq!(config.regret_field, "Q35");
    }

    #[test]
    fn test_single_analysis() {
        let config = config(&["survey_insights", "irreplaceability", "-o", "out"]).unwrap();
        assert_eq!(config.analyses, vec![Analysis::Irreplaceability]);
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_unregistered_regret_field_is_rejected() {
        let err = config(&["survey_insights", "--regret-field", "Q33"]).unwrap_err();
        assert!(err.to_string().contains("Q33"));
    }
}
