//! Ordinal Scales
//! Named, versioned label-to-score tables for Likert-style questions.

/// Fixed mapping from answer labels to ordinal scores.
///
/// Levels are listed from the lowest score to the highest, which is also
/// the display order used for charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrdinalScale {
    pub name: &'static str,
    pub version: u32,
    levels: &'static [(&'static str, i64)],
}

/// Likelihood to enroll, five points.
pub const LIKELIHOOD_SCALE: OrdinalScale = OrdinalScale::new(
    "likelihood",
    1,
    &[
        ("Extremely unlikely", 1),
        ("Somewhat unlikely", 2),
        ("Neither likely nor unlikely", 3),
        ("Somewhat likely", 4),
        ("Extremely likely", 5),
    ],
);

/// Belief in a statement, five points.
pub const BELIEF_SCALE: OrdinalScale = OrdinalScale::new(
    "belief",
    1,
    &[
        ("Definitely not", 1),
        ("Probably not", 2),
        ("Might or might not", 3),
        ("Probably yes", 4),
        ("Definitely yes", 5),
    ],
);

/// Scale attached to each coded question of the survey.
const QUESTION_SCALES: &[(&str, OrdinalScale)] = &[
    ("Q35", LIKELIHOOD_SCALE),
    ("Q44", BELIEF_SCALE),
    ("Q55", BELIEF_SCALE),
];

impl OrdinalScale {
    pub const fn new(
        name: &'static str,
        version: u32,
        levels: &'static [(&'static str, i64)],
    ) -> Self {
        Self {
            name,
            version,
            levels,
        }
    }

    /// Score for a label, or `None` when the label is not part of the scale.
    pub fn code(&self, label: &str) -> Option<i64> {
        let label = label.trim();
        self.levels
            .iter()
            .find(|(level, _)| *level == label)
            .map(|(_, score)| *score)
    }

    /// Labels from lowest to highest score.
    pub fn labels(&self) -> Vec<&'static str> {
        self.levels.iter().map(|(level, _)| *level).collect()
    }

    /// Identifier such as `likelihood@v1`, used in logs.
    pub fn id(&self) -> String {
        format!("{}@v{}", self.name, self.version)
    }
}

/// Look up the scale registered for a question.
pub fn scale_for(field: &str) -> Option<OrdinalScale> {
    QUESTION_SCALES
        .iter()
        .find(|(code, _)| *code == field)
        .map(|(_, scale)| *scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_likelihood_scale_is_total_over_labels() {
        for (expected, label) in LIKELIHOOD_SCALE.labels().iter().enumerate() {
            assert_eq!(LIKELIHOOD_SCALE.code(label), Some(expected as i64 + 1));
        }
    }

    #[test]
    fn test_unknown_label_is_unmapped() {
        assert_eq!(LIKELIHOOD_SCALE.code("Maybe"), None);
        assert_eq!(LIKELIHOOD_SCALE.code(""), None);
        assert_eq!(BELIEF_SCALE.code("extremely likely"), None);
    }

    #[test]
    fn test_label_whitespace_is_ignored() {
        assert_eq!(BELIEF_SCALE.code("  Probably not "), Some(2));
    }

    #[test]
    fn test_scale_registry() {
        assert_eq!(scale_for("Q35"), Some(LIKELIHOOD_SCALE));
        assert_eq!(scale_for("Q55"), Some(BELIEF_SCALE));
        assert_eq!(scale_for("Q33"), None);
        assert_eq!(LIKELIHOOD_SCALE.id(), "likelihood@v1");
        assert_eq!(BELIEF_SCALE.labels().len(), 5);
    }
}
