//! Awareness Impact Analysis
//! Awareness gap per student group, the incentive shift among undergraduates
//! and the regret factor among unaware graduates.

use super::{
    AnalysisContext, AnalysisError, AWARE, DESIRE_IMPACT, ENROLLMENT_STATUS, GRADUATE,
    GRAD_AWARENESS, UNAWARE, UNDERGRADUATE, UNDERGRAD_AWARENESS, UNLIKELY_THRESHOLD,
};
use crate::charts::{
    palette_color, Bar, BarChart, PieChart, ValueFormat, AWARENESS_PALETTE, PASTEL_PALETTE,
};
use crate::data::{DataProcessor, OrdinalScale, RowFilter, SurveyData};
use crate::report::{format_pct, TextSummary};
use crate::stats::{CrossTab, Distribution, StatsCalculator, ThresholdCount};
use tracing::{debug, info, warn};

pub const GAP_CHART: &str = "awareness_gap.png";
pub const INCENTIVE_CHART: &str = "incentive_shift_pie.png";
pub const SUMMARY_FILE: &str = "awareness_impact_summary.txt";

const REGRET_CODE: &str = "Regret_Code";

/// Awareness answers of one student group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAwareness {
    pub group: &'static str,
    pub answers: Distribution,
}

impl GroupAwareness {
    pub fn aware_pct(&self) -> f64 {
        self.answers.percentage(AWARE)
    }

    pub fn unaware_pct(&self) -> f64 {
        self.answers.percentage(UNAWARE)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AwarenessReport {
    pub graduate: GroupAwareness,
    pub undergraduate: GroupAwareness,
    /// Desire-impact answers of undergraduates.
    pub incentive_shift: Distribution,
    /// Unaware graduates whose regret answer is coded at most "unlikely".
    pub regret: ThresholdCount,
    /// Desire impact of undergraduates, split by their awareness answer.
    pub incentive_by_awareness: CrossTab,
}

fn group_awareness(
    survey: &SurveyData,
    group: &'static str,
    field: &str,
) -> Result<GroupAwareness, AnalysisError> {
    let subset = RowFilter::new()
        .equals(ENROLLMENT_STATUS, group)
        .not_blank(field)
        .apply(&survey.table)?;
    let answers = StatsCalculator::value_counts(&subset, field)?;

    debug!(
        field,
        question = survey.schema.question_text(field).unwrap_or_default(),
        import_id = survey.schema.import_id(field).unwrap_or_default(),
        "Awareness question"
    );
    info!(
        group,
        field = answers.field.as_str(),
        valid = answers.valid_count,
        unaware = answers.count(UNAWARE),
        aware = answers.count(AWARE),
        "Awareness answers"
    );
    Ok(GroupAwareness { group, answers })
}

fn regret_factor(
    survey: &SurveyData,
    regret_field: &str,
    scale: &OrdinalScale,
) -> Result<ThresholdCount, AnalysisError> {
    let unaware = RowFilter::new()
        .equals(ENROLLMENT_STATUS, GRADUATE)
        .equals(GRAD_AWARENESS, UNAWARE)
        .not_blank(regret_field)
        .apply(&survey.table)?;
    let coded = DataProcessor::add_ordinal_column(&unaware, regret_field, scale, REGRET_CODE)?;
    let regret = StatsCalculator::threshold_count(&coded, REGRET_CODE, UNLIKELY_THRESHOLD)?;

    info!(
        field = regret_field,
        threshold = regret.threshold,
        valid = regret.valid_count,
        unlikely = regret.count,
        pct = %format_pct(regret.percentage),
        "Regret factor among unaware graduates"
    );
    Ok(regret)
}

/// Compute every awareness aggregate without writing anything.
pub fn compute(
    survey: &SurveyData,
    regret_field: &str,
    scale: &OrdinalScale,
) -> Result<AwarenessReport, AnalysisError> {
    survey.schema.require(&[
        ENROLLMENT_STATUS,
        GRAD_AWARENESS,
        UNDERGRAD_AWARENESS,
        DESIRE_IMPACT,
        regret_field,
    ])?;

    let graduate = group_awareness(survey, GRADUATE, GRAD_AWARENESS)?;
    let undergraduate = group_awareness(survey, UNDERGRADUATE, UNDERGRAD_AWARENESS)?;

    let responding = RowFilter::new()
        .equals(ENROLLMENT_STATUS, UNDERGRADUATE)
        .not_blank(DESIRE_IMPACT)
        .apply(&survey.table)?;
    debug!(rows = responding.height(), "Undergraduates answering desire impact");
    let incentive_shift = StatsCalculator::value_counts(&responding, DESIRE_IMPACT)?;
    if incentive_shift.is_empty() {
        warn!(field = DESIRE_IMPACT, "No undergraduate answers for the incentive shift");
    }

    let regret = regret_factor(survey, regret_field, scale)?;

    let incentive_by_awareness =
        StatsCalculator::cross_tab(&responding, UNDERGRAD_AWARENESS, DESIRE_IMPACT)?;
    for (answer, dist) in &incentive_by_awareness.groups {
        for category in &dist.categories {
            info!(
                group_field = incentive_by_awareness.group_field.as_str(),
                value_field = incentive_by_awareness.value_field.as_str(),
                awareness = answer.as_str(),
                respondents = dist.valid_count,
                impact = category.label.as_str(),
                pct = %format_pct(category.percentage),
                "Desire impact by awareness"
            );
        }
    }

    Ok(AwarenessReport {
        graduate,
        undergraduate,
        incentive_shift,
        regret,
        incentive_by_awareness,
    })
}

/// Awareness bars, grouped per student group: aware then unaware.
pub fn gap_chart(report: &AwarenessReport) -> BarChart {
    let bars = [&report.graduate, &report.undergraduate]
        .iter()
        .flat_map(|group| {
            [("Aware", group.aware_pct()), ("Unaware", group.unaware_pct())]
                .into_iter()
                .enumerate()
                .map(move |(idx, (status, value))| Bar {
                    label: format!("{} ({})", group.group, status),
                    value,
                    color: palette_color(&AWARENESS_PALETTE, idx),
                })
        })
        .collect();

    BarChart {
        title: "Awareness of Alternative CPA Pathway".to_string(),
        x_desc: "Group".to_string(),
        y_desc: "Percentage of Students".to_string(),
        y_max: Some(100.0),
        bars,
        legend: vec![
            ("Aware".to_string(), palette_color(&AWARENESS_PALETTE, 0)),
            ("Unaware".to_string(), palette_color(&AWARENESS_PALETTE, 1)),
        ],
        value_format: ValueFormat::Percent,
    }
}

pub fn incentive_chart(report: &AwarenessReport) -> PieChart {
    PieChart {
        title: concat!(
            "Impact of Alternative Pathway Knowledge on Desire to Pursue ",
            "Graduate Degree (Undergraduates)"
        )
        .to_string(),
        slices: report
            .incentive_shift
            .categories
            .iter()
            .map(|c| (c.label.clone(), c.count as f64))
            .collect(),
        colors: PASTEL_PALETTE.to_vec(),
        start_angle: 140.0,
    }
}

pub fn summary(report: &AwarenessReport) -> TextSummary {
    let mut summary = TextSummary::new("Analysis Summary");
    summary
        .field("Graduate Unaware %", format_pct(report.graduate.unaware_pct()))
        .field(
            "Undergraduate Unaware %",
            format_pct(report.undergraduate.unaware_pct()),
        )
        .field(
            "Regret Factor (Unaware Grads who would be Unlikely to Enroll)",
            format_pct(report.regret.percentage),
        );
    summary
}

/// Run the awareness analysis and write its charts and summary.
pub fn run(ctx: &AnalysisContext) -> Result<AwarenessReport, AnalysisError> {
    let scale = ctx.regret_scale()?;
    let report = compute(ctx.survey, ctx.regret_field, &scale)?;

    ctx.renderer
        .bar_chart(&ctx.output_path(GAP_CHART), &gap_chart(&report))?;
    ctx.renderer
        .pie_chart(&ctx.output_path(INCENTIVE_CHART), &incentive_chart(&report))?;
    summary(&report).write(&ctx.output_path(SUMMARY_FILE))?;

    info!(dir = %ctx.output_dir.display(), "Awareness analysis complete");
    Ok(report)
}
