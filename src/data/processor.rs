//! Data Processor Module
//! Extracts field values and adds derived columns (ordinal codes, coalesced answers).

use super::ordinal::OrdinalScale;
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("column '{column}' not found in survey table")]
    ColumnNotFound { column: String },
}

/// Handles value extraction and coding operations on the response table.
pub struct DataProcessor;

impl DataProcessor {
    fn column<'a>(df: &'a DataFrame, field: &str) -> Result<&'a Column, ProcessorError> {
        df.column(field)
            .map_err(|_| ProcessorError::ColumnNotFound {
                column: field.to_string(),
            })
    }

    /// Text answers of a field; blanks are `None`.
    pub fn text_values(df: &DataFrame, field: &str) -> Result<Vec<Option<String>>, ProcessorError> {
        let column = Self::column(df, field)?;
        let ca = column.as_materialized_series().str()?;
        Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
    }

    /// Numeric view of a field.
    ///
    /// Text cells that do not parse as a finite number become `None`;
    /// numeric columns (e.g. ordinal codes) are cast.
    pub fn numeric_values(df: &DataFrame, field: &str) -> Result<Vec<Option<f64>>, ProcessorError> {
        let column = Self::column(df, field)?;
        let values: Vec<Option<f64>> = if column.dtype() == &DataType::String {
            column
                .as_materialized_series()
                .str()?
                .into_iter()
                .map(|v| v.and_then(parse_number))
                .collect()
        } else {
            let cast = column.cast(&DataType::Float64)?;
            cast.as_materialized_series().f64()?.into_iter().collect()
        };

        let present = column.len() - column.null_count();
        let parsed = values.iter().filter(|v| v.is_some()).count();
        if parsed < present {
            debug!(
                field,
                unparseable = present - parsed,
                "Treating unparseable values as missing"
            );
        }
        Ok(values)
    }

    /// Ordinal codes of a field; labels outside the scale are `None`.
    pub fn ordinal_codes(
        df: &DataFrame,
        field: &str,
        scale: &OrdinalScale,
    ) -> Result<Vec<Option<i64>>, ProcessorError> {
        let answers = Self::text_values(df, field)?;
        let mut unmapped = 0usize;
        let codes = answers
            .iter()
            .map(|answer| {
                let answer = answer.as_deref()?;
                let code = scale.code(answer);
                if code.is_none() {
                    unmapped += 1;
                }
                code
            })
            .collect();

        if unmapped > 0 {
            warn!(
                field,
                scale = %scale.id(),
                unmapped,
                "Answers outside the ordinal scale are excluded"
            );
        }
        Ok(codes)
    }

    /// Copy of `df` with an `Int64` column holding the ordinal code of `field`.
    pub fn add_ordinal_column(
        df: &DataFrame,
        field: &str,
        scale: &OrdinalScale,
        derived: &str,
    ) -> Result<DataFrame, ProcessorError> {
        let codes = Self::ordinal_codes(df, field, scale)?;
        let mut out = df.clone();
        out.with_column(Column::new(derived.into(), codes))?;
        Ok(out)
    }

    /// Copy of `df` with a text column taking `primary`, or `fallback` where
    /// `primary` is blank.
    pub fn coalesce(
        df: &DataFrame,
        primary: &str,
        fallback: &str,
        derived: &str,
    ) -> Result<DataFrame, ProcessorError> {
        let first = Self::text_values(df, primary)?;
        let second = Self::text_values(df, fallback)?;
        let merged: Vec<Option<String>> = first
            .into_iter()
            .zip(second)
            .map(|(a, b)| a.or(b))
            .collect();

        let mut out = df.clone();
        out.with_column(Column::new(derived.into(), merged))?;
        Ok(out)
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
