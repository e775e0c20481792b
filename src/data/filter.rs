//! Row Filter Module
//! Conjunctive predicates over survey fields, evaluated with Polars lazy filters.

use polars::prelude::*;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("filter references unknown field '{field}'")]
    UnknownField { field: String },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// A single check on one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Answer equals the literal exactly.
    Equals { field: String, value: String },
    /// Answer is present.
    NotBlank { field: String },
    /// Numeric (coded) value is present and at most `limit`.
    AtMost { field: String, limit: i64 },
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Equals { field, .. }
            | Condition::NotBlank { field }
            | Condition::AtMost { field, .. } => field,
        }
    }

    fn to_expr(&self) -> Expr {
        match self {
            Condition::Equals { field, value } => col(field.as_str()).eq(lit(value.as_str())),
            Condition::NotBlank { field } => col(field.as_str()).is_not_null(),
            Condition::AtMost { field, limit } => col(field.as_str()).lt_eq(lit(*limit)),
        }
    }
}

/// Conjunction of conditions; an empty filter keeps every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowFilter {
    conditions: Vec<Condition>,
}

impl RowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals(mut self, field: &str, value: &str) -> Self {
        self.conditions.push(Condition::Equals {
            field: field.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn not_blank(mut self, field: &str) -> Self {
        self.conditions.push(Condition::NotBlank {
            field: field.to_string(),
        });
        self
    }

    pub fn at_most(mut self, field: &str, limit: i64) -> Self {
        self.conditions.push(Condition::AtMost {
            field: field.to_string(),
            limit,
        });
        self
    }

    /// Rows of `df` satisfying every condition, in their original order.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame, FilterError> {
        if let Some(missing) = self
            .conditions
            .iter()
            .find(|c| df.get_column_index(c.field()).is_none())
        {
            return Err(FilterError::UnknownField {
                field: missing.field().to_string(),
            });
        }

        let Some(predicate) = self
            .conditions
            .iter()
            .map(Condition::to_expr)
            .reduce(|acc, expr| acc.and(expr))
        else {
            return Ok(df.clone());
        };

        let filtered = df.clone().lazy().filter(predicate).collect()?;
        debug!(
            conditions = self.conditions.len(),
            rows_in = df.height(),
            rows_out = filtered.height(),
            "Applied row filter"
        );
        Ok(filtered)
    }
}
