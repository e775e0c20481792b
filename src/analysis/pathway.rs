//! CPA Pathway Analysis
//! Enrollment threat among unaware graduates, ROI belief against employer
//! pressure, and the program features hardest to replace.

use super::irreplaceability::{rank_features, with_data, RankedFeature};
use super::{
    AnalysisContext, AnalysisError, EMPLOYER_REQUIREMENT, ENROLLMENT_STATUS, GRADUATE,
    GRAD_AWARENESS, ROI_BELIEF, ROI_BELIEF_FALLBACK, UNAWARE, UNLIKELY_THRESHOLD,
};
use crate::charts::{
    palette_color, Bar, BarChart, HorizontalBarChart, StackLayer, StackedBarChart, ValueFormat,
    RED_YELLOW_GREEN_PALETTE, ROCKET_PALETTE, VIRIDIS_PALETTE,
};
use crate::data::{scale_for, DataProcessor, OrdinalScale, RowFilter, SurveyData};
use crate::report::{format_pct, write_metric_csv, MetricRow};
use crate::stats::{
    percentage, CategoryCount, CrossTab, Distribution, StatsCalculator, ThresholdCount,
};
use tracing::{debug, info};

pub const THREAT_CHART: &str = "enrollment_threat.png";
pub const ROI_CHART: &str = "roi_vs_pressure.png";
pub const VALUE_CHART: &str = "program_value.png";
pub const SUMMARY_FILE: &str = "cpa_pathway_summary.csv";

const LIKELIHOOD_CODE: &str = "Likelihood_Code";
const ROI_BELIEF_RAW: &str = "ROI_Belief_Raw";
const ROI_BELIEF_SCORE: &str = "ROI_Belief_Score";

/// Highest belief score still counted as a low return on investment.
const LOW_ROI_MAX: i64 = 3;
const REQUIRED: &str = "Yes";

#[derive(Debug, Clone, PartialEq)]
pub struct EnrollmentThreat {
    /// Every graduate respondent.
    pub total_graduates: usize,
    /// Awareness answers of graduates.
    pub awareness: Distribution,
    /// Likelihood answers of unaware graduates, in scale order.
    pub likelihood: Vec<CategoryCount>,
    /// Unaware graduates unlikely to have enrolled, over their valid codes.
    pub potential_loss: ThresholdCount,
}

impl EnrollmentThreat {
    pub fn unaware_count(&self) -> usize {
        self.awareness.count(UNAWARE)
    }

    pub fn unaware_pct(&self) -> f64 {
        self.awareness.percentage(UNAWARE)
    }

    /// Potential loss as a share of all graduates.
    ///
    /// The denominator includes graduates who left the awareness question
    /// blank. This is the only percentage that does not drop blank answers
    /// from its denominator.
    pub fn loss_of_total_pct(&self) -> f64 {
        percentage(self.potential_loss.count, self.total_graduates)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoiPressure {
    /// Respondents with both a belief score and an employer answer.
    pub respondents: usize,
    /// Low belief while the employer requires the degree.
    pub reluctant: usize,
    /// Belief answers per employer answer.
    pub belief_by_requirement: CrossTab,
    pub scale: OrdinalScale,
}

impl RoiPressure {
    pub fn reluctant_pct(&self) -> f64 {
        percentage(self.reluctant, self.respondents)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathwayReport {
    pub threat: EnrollmentThreat,
    pub roi: RoiPressure,
    pub program_value: Vec<RankedFeature>,
}

pub fn enrollment_threat(
    survey: &SurveyData,
    likelihood_field: &str,
    scale: &OrdinalScale,
) -> Result<EnrollmentThreat, AnalysisError> {
    let graduates = RowFilter::new()
        .equals(ENROLLMENT_STATUS, GRADUATE)
        .apply(&survey.table)?;
    let awareness = StatsCalculator::value_counts(&graduates, GRAD_AWARENESS)?;

    let unaware = RowFilter::new()
        .equals(GRAD_AWARENESS, UNAWARE)
        .apply(&graduates)?;
    let coded =
        DataProcessor::add_ordinal_column(&unaware, likelihood_field, scale, LIKELIHOOD_CODE)?;
    let potential_loss =
        StatsCalculator::threshold_count(&coded, LIKELIHOOD_CODE, UNLIKELY_THRESHOLD)?;
    let likelihood =
        StatsCalculator::value_counts(&unaware, likelihood_field)?.reindexed(&scale.labels());

    let threat = EnrollmentThreat {
        total_graduates: graduates.height(),
        awareness,
        likelihood,
        potential_loss,
    };

    info!(
        total = threat.total_graduates,
        unaware = threat.unaware_count(),
        pct_unaware = %format_pct(threat.unaware_pct()),
        "Graduate awareness"
    );
    info!(
        potential_loss = threat.potential_loss.count,
        pct_of_unaware = %format_pct(threat.potential_loss.percentage),
        pct_of_total = %format_pct(threat.loss_of_total_pct()),
        "Potential enrollment loss"
    );
    Ok(threat)
}

pub fn roi_pressure(survey: &SurveyData) -> Result<RoiPressure, AnalysisError> {
    let scale = scale_for(ROI_BELIEF).ok_or_else(|| AnalysisError::NoScale {
        field: ROI_BELIEF.to_string(),
    })?;

    let merged = DataProcessor::coalesce(
        &survey.table,
        ROI_BELIEF,
        ROI_BELIEF_FALLBACK,
        ROI_BELIEF_RAW,
    )?;
    let scored =
        DataProcessor::add_ordinal_column(&merged, ROI_BELIEF_RAW, &scale, ROI_BELIEF_SCORE)?;

    let answered = RowFilter::new()
        .not_blank(ROI_BELIEF_SCORE)
        .not_blank(EMPLOYER_REQUIREMENT)
        .apply(&scored)?;
    let reluctant = RowFilter::new()
        .at_most(ROI_BELIEF_SCORE, LOW_ROI_MAX)
        .equals(EMPLOYER_REQUIREMENT, REQUIRED)
        .apply(&answered)?;
    let belief_by_requirement =
        StatsCalculator::cross_tab(&answered, EMPLOYER_REQUIREMENT, ROI_BELIEF_RAW)?;

    let roi = RoiPressure {
        respondents: answered.height(),
        reluctant: reluctant.height(),
        belief_by_requirement,
        scale,
    };

    info!(
        respondents = roi.respondents,
        reluctant = roi.reluctant,
        pct = %format_pct(roi.reluctant_pct()),
        "Reluctant students (low ROI belief, employer requirement)"
    );
    for (requirement, dist) in &roi.belief_by_requirement.groups {
        let counts: Vec<usize> = dist
            .reindexed(&scale.labels())
            .iter()
            .map(|c| c.count)
            .collect();
        debug!(requirement = requirement.as_str(), ?counts, "Belief counts by requirement");
    }
    Ok(roi)
}

/// Compute every pathway aggregate without writing anything.
pub fn compute(
    survey: &SurveyData,
    likelihood_field: &str,
    scale: &OrdinalScale,
) -> Result<PathwayReport, AnalysisError> {
    survey.schema.require(&[
        ENROLLMENT_STATUS,
        GRAD_AWARENESS,
        likelihood_field,
        ROI_BELIEF,
        ROI_BELIEF_FALLBACK,
        EMPLOYER_REQUIREMENT,
    ])?;

    Ok(PathwayReport {
        threat: enrollment_threat(survey, likelihood_field, scale)?,
        roi: roi_pressure(survey)?,
        program_value: rank_features(survey)?,
    })
}

pub fn threat_chart(threat: &EnrollmentThreat) -> BarChart {
    BarChart {
        title: format!(
            concat!(
                "Likelihood to Enroll if Alternative Pathway Known ",
                "(Among {} Unaware Graduate Students)"
            ),
            threat.unaware_count()
        ),
        x_desc: "Likelihood".to_string(),
        y_desc: "Number of Students".to_string(),
        y_max: None,
        bars: threat
            .likelihood
            .iter()
            .enumerate()
            .map(|(i, c)| Bar {
                label: c.label.clone(),
                value: c.count as f64,
                color: palette_color(&VIRIDIS_PALETTE, i),
            })
            .collect(),
        legend: Vec::new(),
        value_format: ValueFormat::Count,
    }
}

/// Belief proportions stacked per employer answer, groups in label order.
pub fn roi_chart(roi: &RoiPressure) -> StackedBarChart {
    let mut groups = roi.belief_by_requirement.group_names();
    groups.sort();

    let layers = roi
        .scale
        .labels()
        .into_iter()
        .enumerate()
        .map(|(i, label)| StackLayer {
            name: label.to_string(),
            values: groups
                .iter()
                .map(|group| {
                    roi.belief_by_requirement
                        .group(group)
                        .map_or(0.0, |dist| dist.percentage(label) / 100.0)
                })
                .collect(),
            color: palette_color(&RED_YELLOW_GREEN_PALETTE, i),
        })
        .collect();

    StackedBarChart {
        title: "ROI Belief by Employer Requirement".to_string(),
        x_desc: format!("Employer Requirement ({})", EMPLOYER_REQUIREMENT),
        y_desc: "Proportion of Students".to_string(),
        legend_title: "Belief in Higher Earnings".to_string(),
        groups,
        layers,
    }
}

pub fn value_chart(ranked: &[RankedFeature]) -> HorizontalBarChart {
    HorizontalBarChart {
        title: "Hardest to Replace Program Features (Lower Rank = More Essential)".to_string(),
        x_desc: "Mean Rank (1=Most Important, 6=Least)".to_string(),
        bars: with_data(ranked)
            .enumerate()
            .map(|(i, item)| Bar {
                label: item.feature.short_name.to_string(),
                value: item.rank.mean,
                color: palette_color(&ROCKET_PALETTE, i),
            })
            .collect(),
        value_format: ValueFormat::Hidden,
    }
}

fn feature_with_rank(item: Option<&RankedFeature>) -> String {
    item.map_or_else(
        || "n/a".to_string(),
        |item| format!("{} (Rank: {:.2})", item.feature.short_name, item.rank.mean),
    )
}

pub fn summary_rows(report: &PathwayReport) -> Vec<MetricRow> {
    let threat = &report.threat;
    let roi = &report.roi;
    let most = with_data(&report.program_value).next();
    let least = with_data(&report.program_value).last();

    vec![
        MetricRow::new("Total Graduate Students", threat.total_graduates),
        MetricRow::new("Pct Unaware of Alt Pathway", format_pct(threat.unaware_pct())),
        MetricRow::new(
            "Pct Unaware who would be Unlikely to Enroll",
            format_pct(threat.potential_loss.percentage),
        ),
        MetricRow::new(
            "Pct Total Grad Students at Risk",
            format_pct(threat.loss_of_total_pct()),
        ),
        MetricRow::new(
            "Number of Reluctant Students (Low ROI, High Pressure)",
            roi.reluctant,
        ),
        MetricRow::new("Pct Reluctant Students", format_pct(roi.reluctant_pct())),
        MetricRow::new(
            "Most Essential Feature (Hardest to Replace)",
            feature_with_rank(most),
        ),
        MetricRow::new("Least Essential Feature", feature_with_rank(least)),
    ]
}

/// Run the pathway analysis and write its charts and CSV summary.
pub fn run(ctx: &AnalysisContext) -> Result<PathwayReport, AnalysisError> {
    let scale = ctx.regret_scale()?;
    let report = compute(ctx.survey, ctx.regret_field, &scale)?;

    ctx.renderer
        .bar_chart(&ctx.output_path(THREAT_CHART), &threat_chart(&report.threat))?;
    ctx.renderer
        .stacked_bar_chart(&ctx.output_path(ROI_CHART), &roi_chart(&report.roi))?;
    ctx.renderer.horizontal_bar_chart(
        &ctx.output_path(VALUE_CHART),
        &value_chart(&report.program_value),
    )?;
    write_metric_csv(&ctx.output_path(SUMMARY_FILE), &summary_rows(&report))?;

    info!(dir = %ctx.output_dir.display(), "Pathway analysis complete");
    Ok(report)
}
