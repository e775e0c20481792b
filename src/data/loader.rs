//! Survey Loader Module
//! Reads the two-row header survey export into a Polars DataFrame keyed by field code.

use polars::prelude::*;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// First cell prefix of the import-metadata row written by the survey platform.
pub const IMPORT_METADATA_PREFIX: &str = "{\"ImportId\"";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("survey file not found: {path}")]
    FileNotFound { path: PathBuf },
    #[error("failed to read survey file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("survey file {path} is missing its {row} header row")]
    MissingHeaderRow { path: PathBuf, row: &'static str },
    #[error("header rows of {path} disagree: {codes} field codes but {questions} question texts")]
    HeaderWidthMismatch {
        path: PathBuf,
        codes: usize,
        questions: usize,
    },
    #[error("empty field code in column {column} of {path}")]
    EmptyFieldCode { path: PathBuf, column: usize },
    #[error("duplicate field code '{code}' in {path}")]
    DuplicateFieldCode { path: PathBuf, code: String },
    #[error("line {line} of {path} has {found} cells, expected {expected}")]
    RowWidthMismatch {
        path: PathBuf,
        line: u64,
        found: usize,
        expected: usize,
    },
    #[error("survey has no '{code}' column")]
    MissingField { code: String },
    #[error("Failed to build survey table: {0}")]
    Table(#[from] PolarsError),
}

/// One cell of the import-metadata row, e.g. `{"ImportId":"QID27"}`.
#[derive(Debug, Deserialize)]
struct ImportMarker {
    #[serde(rename = "ImportId")]
    import_id: String,
}

/// Field codes of the export plus the documentation carried by the header rows.
#[derive(Debug, Clone, Default)]
pub struct SurveySchema {
    codes: Vec<String>,
    questions: HashMap<String, String>,
    import_ids: HashMap<String, String>,
}

impl SurveySchema {
    /// Validate the two header rows and pair each field code with its question text.
    fn from_header_rows(
        path: &Path,
        codes: &csv::StringRecord,
        questions: &csv::StringRecord,
    ) -> Result<Self, LoaderError> {
        if codes.len() != questions.len() {
            return Err(LoaderError::HeaderWidthMismatch {
                path: path.to_path_buf(),
                codes: codes.len(),
                questions: questions.len(),
            });
        }

        let mut seen = HashSet::new();
        let mut schema = SurveySchema::default();
        for (column, (code, question)) in codes.iter().zip(questions.iter()).enumerate() {
            let code = code.trim_start_matches('\u{feff}');
            if code.is_empty() {
                return Err(LoaderError::EmptyFieldCode {
                    path: path.to_path_buf(),
                    column: column + 1,
                });
            }
            if !seen.insert(code.to_string()) {
                return Err(LoaderError::DuplicateFieldCode {
                    path: path.to_path_buf(),
                    code: code.to_string(),
                });
            }
            schema.codes.push(code.to_string());
            schema
                .questions
                .insert(code.to_string(), question.to_string());
        }
        Ok(schema)
    }

    /// Remember the import ids found in the metadata row. Cells that are not
    /// import markers are skipped.
    fn record_import_ids(&mut self, marker_row: &csv::StringRecord) {
        for (code, cell) in self.codes.iter().zip(marker_row.iter()) {
            if let Ok(marker) = serde_json::from_str::<ImportMarker>(cell) {
                self.import_ids.insert(code.clone(), marker.import_id);
            }
        }
    }

    /// Field codes in file order.
    pub fn field_codes(&self) -> &[String] {
        &self.codes
    }

    pub fn contains(&self, code: &str) -> bool {
        self.questions.contains_key(code)
    }

    /// Question text shown to respondents for a field.
    pub fn question_text(&self, code: &str) -> Option<&str> {
        self.questions.get(code).map(String::as_str)
    }

    /// Platform question id from the import-metadata row, if one was present.
    pub fn import_id(&self, code: &str) -> Option<&str> {
        self.import_ids.get(code).map(String::as_str)
    }

    /// Fail on the first field code the export does not carry.
    pub fn require(&self, codes: &[&str]) -> Result<(), LoaderError> {
        match codes.iter().find(|code| !self.contains(code)) {
            Some(code) => Err(LoaderError::MissingField {
                code: code.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Loaded survey: responses keyed by field code plus the header documentation.
#[derive(Debug, Clone)]
pub struct SurveyData {
    pub table: DataFrame,
    pub schema: SurveySchema,
}

impl SurveyData {
    pub fn respondent_count(&self) -> usize {
        self.table.height()
    }
}

/// Load a survey export.
///
/// Row 0 holds field codes, row 1 the question text. A leading import-metadata
/// row is dropped. Cells are trimmed and blank cells become nulls; every column
/// is kept as text so coding stays explicit downstream.
pub fn load_survey(path: impl AsRef<Path>) -> Result<SurveyData, LoaderError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(LoaderError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let read_err = |source: csv::Error| LoaderError::Read {
        path: path.to_path_buf(),
        source,
    };

    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_err)?;
    let mut records = reader.into_records();

    let codes = records
        .next()
        .ok_or_else(|| LoaderError::MissingHeaderRow {
            path: path.to_path_buf(),
            row: "field code",
        })?
        .map_err(read_err)?;
    let questions = records
        .next()
        .ok_or_else(|| LoaderError::MissingHeaderRow {
            path: path.to_path_buf(),
            row: "question text",
        })?
        .map_err(read_err)?;

    let mut schema = SurveySchema::from_header_rows(path, &codes, &questions)?;
    let width = schema.codes.len();

    let mut rows = Vec::new();
    for record in records {
        let record = record.map_err(read_err)?;
        if record.len() != width {
            return Err(LoaderError::RowWidthMismatch {
                path: path.to_path_buf(),
                line: record.position().map(|p| p.line()).unwrap_or_default(),
                found: record.len(),
                expected: width,
            });
        }
        rows.push(record);
    }

    let has_marker = rows
        .first()
        .and_then(|row| row.get(0))
        .is_some_and(|cell| cell.starts_with(IMPORT_METADATA_PREFIX));
    if has_marker {
        let marker = rows.remove(0);
        schema.record_import_ids(&marker);
        debug!(
            import_ids = schema.import_ids.len(),
            "Dropped import-metadata row"
        );
    }

    if rows.is_empty() {
        warn!(path = %path.display(), "Survey export contains no responses");
    }

    let table = build_table(&schema.codes, &rows)?;
    info!(
        path = %path.display(),
        respondents = table.height(),
        fields = table.width(),
        "Loaded survey export"
    );

    Ok(SurveyData { table, schema })
}

/// Assemble one nullable text column per field code.
fn build_table(codes: &[String], rows: &[csv::StringRecord]) -> PolarsResult<DataFrame> {
    let columns: Vec<Column> = codes
        .iter()
        .enumerate()
        .map(|(idx, code)| {
            let values: Vec<Option<String>> = rows
                .iter()
                .map(|row| row.get(idx).filter(|v| !v.is_empty()).map(str::to_string))
                .collect();
            Column::new(code.as_str().into(), values)
        })
        .collect();

    DataFrame::new(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    fn text(df: &DataFrame, code: &str) -> Vec<Option<String>> {
        df.column(code)
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    #[test]
    fn test_load_two_row_header() {
        let file = create_temp_csv(
            "Q27,Q31\nAre you enrolled?,Were you aware?\nGraduate,Yes\nUndergraduate,No\n",
        );
        let survey = load_survey(file.path()).unwrap();

        assert_eq!(survey.schema.field_codes(), &["Q27", "Q31"]);
        assert_eq!(survey.schema.question_text("Q31"), Some("Were you aware?"));
        assert_eq!(survey.respondent_count(), 2);
        assert_eq!(
            text(&survey.table, "Q27"),
            vec![Some("Graduate".to_string()), Some("Undergraduate".to_string())]
        );
    }

    #[test]
    fn test_import_metadata_row_is_dropped() {
        let file = create_temp_csv(concat!(
            "Q27,Q31\n",
            "Status,Aware\n",
            "\"{\"\"ImportId\"\":\"\"QID27\"\"}\",\"{\"\"ImportId\"\":\"\"QID31\"\"}\"\n",
            "Graduate,No\n",
        ));
        let survey = load_survey(file.path()).unwrap();

        assert_eq!(survey.respondent_count(), 1);
        assert_eq!(survey.schema.import_id("Q27"), Some("QID27"));
        assert_eq!(survey.schema.import_id("Q31"), Some("QID31"));
        assert_eq!(text(&survey.table, "Q31"), vec![Some("No".to_string())]);
    }

    #[test]
    fn test_first_response_kept_without_marker() {
        let file = create_temp_csv("Q27\nStatus\nGraduate\n");
        let survey = load_survey(file.path()).unwrap();

        assert_eq!(survey.respondent_count(), 1);
        assert_eq!(survey.schema.import_id("Q27"), None);
    }

    #[test]
    fn test_blank_cells_become_null() {
        let file = create_temp_csv("Q27,Q31\nStatus,Aware\nGraduate,\n  ,Yes\n");
        let survey = load_survey(file.path()).unwrap();

        assert_eq!(text(&survey.table, "Q31"), vec![None, Some("Yes".to_string())]);
        assert_eq!(
            text(&survey.table, "Q27"),
            vec![Some("Graduate".to_string()), None]
        );
    }

    #[test]
    fn test_quoted_question_text_spanning_lines() {
        let file = create_temp_csv(concat!(
            "Q24_1,Q24_2\n",
            "\"Rank the features:\nCPA prep\",\"Networking, alumni\"\n",
            "1,2\n",
        ));
        let survey = load_survey(file.path()).unwrap();

        assert_eq!(
            survey.schema.question_text("Q24_1"),
            Some("Rank the features:\nCPA prep")
        );
        assert_eq!(survey.respondent_count(), 1);
    }

    #[test]
    fn test_byte_order_mark_is_stripped() {
        let file = create_temp_csv("\u{feff}Q27,Q31\nStatus,Aware\nGraduate,Yes\n");
        let survey = load_survey(file.path()).unwrap();

        assert_eq!(survey.schema.field_codes()[0], "Q27");
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let result = load_survey("/definitely/not/here.csv");
        assert!(matches!(result, Err(LoaderError::FileNotFound { .. })));
    }

    #[test]
    fn test_missing_question_row() {
        let file = create_temp_csv("Q27,Q31\n");
        let result = load_survey(file.path());
        assert!(matches!(
            result,
            Err(LoaderError::MissingHeaderRow {
                row: "question text",
                ..
            })
        ));
    }

    #[test]
    fn test_header_width_mismatch() {
        let file = create_temp_csv("Q27,Q31,Q35\nStatus,Aware\nGraduate,Yes,\n");
        let result = load_survey(file.path());
        assert!(matches!(
            result,
            Err(LoaderError::HeaderWidthMismatch {
                codes: 3,
                questions: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_field_code() {
        let file = create_temp_csv("Q27,Q27\nStatus,Status again\nGraduate,Yes\n");
        let err = load_survey(file.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate field code 'Q27'"));
    }

    #[test]
    fn test_empty_field_code() {
        let file = create_temp_csv("Q27,\nStatus,Other\nGraduate,Yes\n");
        let result = load_survey(file.path());
        assert!(matches!(
            result,
            Err(LoaderError::EmptyFieldCode { column: 2, .. })
        ));
    }

    #[test]
    fn test_short_data_row_is_rejected() {
        let file = create_temp_csv("Q27,Q31\nStatus,Aware\nGraduate\n");
        let result = load_survey(file.path());
        assert!(matches!(
            result,
            Err(LoaderError::RowWidthMismatch {
                line: 3,
                found: 1,
                expected: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_require_names_missing_field() {
        let file = create_temp_csv("Q27\nStatus\nGraduate\n");
        let survey = load_survey(file.path()).unwrap();

        assert!(survey.schema.require(&["Q27"]).is_ok());
        let err = survey.schema.require(&["Q27", "Q52"]).unwrap_err();
        assert_eq!(err.to_string(), "survey has no 'Q52' column");
    }
}
