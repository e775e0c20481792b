//! Summary Report Writer
//! Writes the plain-text summaries and the Metric/Value CSV summary.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write CSV summary {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Plain-text summary: a heading line followed by `label: value` lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextSummary {
    heading: String,
    lines: Vec<String>,
}

impl TextSummary {
    pub fn new(heading: &str) -> Self {
        Self {
            heading: heading.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn field(&mut self, label: &str, value: impl std::fmt::Display) -> &mut Self {
        self.lines.push(format!("{}: {}", label, value));
        self
    }

    pub fn line(&mut self, text: impl Into<String>) -> &mut Self {
        self.lines.push(text.into());
        self
    }

    pub fn render(&self) -> String {
        let mut out = format!("--- {} ---\n", self.heading);
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    pub fn write(&self, path: &Path) -> Result<(), ReportError> {
        fs::write(path, self.render()).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Wrote text summary");
        Ok(())
    }
}

/// One row of the CSV summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    #[serde(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Value")]
    pub value: String,
}

impl MetricRow {
    pub fn new(metric: &str, value: impl std::fmt::Display) -> Self {
        Self {
            metric: metric.to_string(),
            value: value.to_string(),
        }
    }
}

/// Write the two-column Metric/Value summary.
pub fn write_metric_csv(path: &Path, rows: &[MetricRow]) -> Result<(), ReportError> {
    let csv_err = |source: csv::Error| ReportError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for row in rows {
        writer.serialize(row).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), rows = rows.len(), "Wrote CSV summary");
    Ok(())
}

/// Percentage formatted for reports, e.g. `66.7%`.
pub fn format_pct(value: f64) -> String {
    format!("{:.1}%", value)
}
