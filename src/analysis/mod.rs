//! Analysis module - the three survey reports
//!
//! Each analysis filters the shared response table, aggregates, then writes
//! its charts and summary into the output directory.

pub mod awareness;
pub mod irreplaceability;
pub mod pathway;

use crate::charts::{ChartError, ChartRenderer};
use crate::data::{scale_for, FilterError, LoaderError, OrdinalScale, ProcessorError, SurveyData};
use crate::report::ReportError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Enrollment status question and its answers.
pub const ENROLLMENT_STATUS: &str = "Q27";
pub const GRADUATE: &str = "Graduate";
pub const UNDERGRADUATE: &str = "Undergraduate";

/// Awareness of the alternative pathway, asked separately per group.
pub const GRAD_AWARENESS: &str = "Q31";
pub const UNDERGRAD_AWARENESS: &str = "Q53";
pub const AWARE: &str = "Yes";
pub const UNAWARE: &str = "No";

/// Impact of pathway knowledge on the desire to pursue a graduate degree.
pub const DESIRE_IMPACT: &str = "Q52";

/// Belief that the degree leads to higher earnings, asked in two branches.
pub const ROI_BELIEF: &str = "Q55";
pub const ROI_BELIEF_FALLBACK: &str = "Q44";

/// Whether the respondent's employer requires the graduate degree.
pub const EMPLOYER_REQUIREMENT: &str = "Q49";

/// Ordinal codes at or below this value count as "unlikely".
pub const UNLIKELY_THRESHOLD: f64 = 2.0;

/// A ranked program feature: field code, long name, short chart name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramFeature {
    pub field: &'static str,
    pub name: &'static str,
    pub short_name: &'static str,
}

pub static PROGRAM_FEATURES: [ProgramFeature; 6] = [
    ProgramFeature { field: "Q24_1", name: "CPA Exam Prep", short_name: "CPA Prep" },
    ProgramFeature {
        field: "Q24_2",
        name: "Networking (Peers/Alumni)",
        short_name: "Networking",
    },
    ProgramFeature {
        field: "Q24_3",
        name: "Faculty Interaction",
        short_name: "Faculty Interaction",
    },
    ProgramFeature { field: "Q24_4", name: "Technical Skills", short_name: "Technical Skills" },
    ProgramFeature { field: "Q24_5", name: "Soft Skills", short_name: "Soft Skills" },
    ProgramFeature { field: "Q24_6", name: "Recruiting/Internships", short_name: "Recruiting" },
];

pub fn feature(field: &str) -> Option<&'static ProgramFeature> {
    PROGRAM_FEATURES.iter().find(|f| f.field == field)
}

pub fn feature_fields() -> Vec<&'static str> {
    PROGRAM_FEATURES.iter().map(|f| f.field).collect()
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Processor(#[from] ProcessorError),
    #[error(transparent)]
    Chart(#[from] ChartError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("no ordinal scale is registered for field '{field}'")]
    NoScale { field: String },
}

/// Everything an analysis needs: the loaded survey, the renderer and where to write.
pub struct AnalysisContext<'a> {
    pub survey: &'a SurveyData,
    pub renderer: &'a ChartRenderer,
    pub output_dir: &'a Path,
    /// Likelihood question used for the regret factor and the enrollment threat.
    pub regret_field: &'a str,
}

impl AnalysisContext<'_> {
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    pub fn regret_scale(&self) -> Result<OrdinalScale, AnalysisError> {
        scale_for(self.regret_field).ok_or_else(|| AnalysisError::NoScale {
            field: self.regret_field.to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::AnalysisContext;
    use crate::charts::ChartRenderer;
    use crate::data::{load_survey, SurveyData};
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;

    /// Load a survey from CSV text written to a temp file.
    pub fn survey_from_csv(content: &str) -> SurveyData {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        load_survey(file.path()).unwrap()
    }

    pub fn context<'a>(
        survey: &'a SurveyData,
        renderer: &'a ChartRenderer,
        output_dir: &'a Path,
    ) -> AnalysisContext<'a> {
        AnalysisContext {
            survey,
            renderer,
            output_dir,
            regret_field: "Q35",
        }
    }

    /// Assert that `path` holds a non-empty PNG image.
    pub fn assert_png(path: &Path) {
        let bytes = fs::read(path).unwrap_or_else(|e| panic!("{}: {}", path.display(), e));
        assert!(bytes.len() > 8, "{} is empty", path.display());
        assert_eq!(&bytes[..4], b"\x89PNG", "{} is not a PNG", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartStyle;

    #[test]
    fn test_feature_lookup() {
        assert_eq!(feature("Q24_4").map(|f| f.name), Some("Technical Skills"));
        assert_eq!(feature("Q24_6").map(|f| f.short_name), Some("Recruiting"));
        assert!(feature("Q25").is_none());
        assert_eq!(feature_fields().len(), 6);
    }

    #[test]
    fn test_regret_scale_requires_registered_field() {
        let survey = test_support::survey_from_csv("Q27\nStatus?\nGraduate\n");
        let renderer = ChartRenderer::new(ChartStyle::default());
        let dir = tempfile::tempdir().unwrap();

        let mut ctx = AnalysisContext {
            survey: &survey,
            renderer: &renderer,
            output_dir: dir.path(),
            regret_field: "Q35",
        };
        assert_eq!(ctx.regret_scale().unwrap().name, "likelihood");

        ctx.regret_field = "Q33";
        let err = ctx.regret_scale().unwrap_err();
        assert!(matches!(err, AnalysisError::NoScale { ref field } if field == "Q33"));
        assert_eq!(ctx.output_path("a.png"), dir.path().join("a.png"));
    }
}
