//! Program Irreplaceability Analysis
//! Mean rank of each program feature over all respondents; lower means
//! harder to replace through work experience.

use super::{feature, feature_fields, AnalysisContext, AnalysisError, ProgramFeature};
use crate::charts::{Bar, HorizontalBarChart, ValueFormat, SKY_BLUE};
use crate::data::SurveyData;
use crate::report::TextSummary;
use crate::stats::{FieldMean, StatsCalculator};
use tracing::{info, warn};

pub const CHART_FILE: &str = "program_irreplaceability.png";
pub const INSIGHTS_FILE: &str = "insights.txt";

const TECHNICAL: &str = "Q24_4";
const NETWORKING: &str = "Q24_2";
const RECRUITING: &str = "Q24_6";

#[derive(Debug, Clone, PartialEq)]
pub struct RankedFeature {
    pub feature: ProgramFeature,
    pub rank: FieldMean,
}

/// Program features ordered by ascending mean rank; features nobody ranked go last.
pub fn rank_features(survey: &SurveyData) -> Result<Vec<RankedFeature>, AnalysisError> {
    let fields = feature_fields();
    survey.schema.require(&fields)?;

    let ranking = StatsCalculator::mean_ranking(&survey.table, &fields)?;
    let ranked: Vec<RankedFeature> = ranking
        .into_iter()
        .filter_map(|rank| {
            feature(&rank.field).map(|feature| RankedFeature {
                feature: *feature,
                rank,
            })
        })
        .collect();

    for item in &ranked {
        if item.rank.has_data() {
            info!(
                feature = item.feature.name,
                mean = %format!("{:.2}", item.rank.mean),
                std_dev = %format!("{:.2}", item.rank.std_dev),
                n = item.rank.valid_count,
                "Mean rank"
            );
        } else {
            warn!(feature = item.feature.name, "No numeric ranks for feature");
        }
    }
    Ok(ranked)
}

/// Ranked features that have at least one numeric answer.
pub fn with_data(ranked: &[RankedFeature]) -> impl Iterator<Item = &RankedFeature> {
    ranked.iter().filter(|item| item.rank.has_data())
}

fn mean_of(ranked: &[RankedFeature], field: &str) -> Option<f64> {
    with_data(ranked)
        .find(|item| item.feature.field == field)
        .map(|item| item.rank.mean)
}

fn score(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

/// Where technical skills fall relative to networking and recruiting.
pub fn comparison_insight(
    technical: Option<f64>,
    networking: Option<f64>,
    recruiting: Option<f64>,
) -> &'static str {
    let (Some(technical), Some(networking), Some(recruiting)) = (technical, networking, recruiting)
    else {
        return concat!(
            "Not enough ranking data to compare Technical Skills ",
            "with Networking and Recruiting."
        );
    };

    if technical < networking.min(recruiting) {
        "Students value Technical Skills more than Networking and Recruiting."
    } else if technical > networking.max(recruiting) {
        "Students value Networking and Recruiting more than Technical Skills."
    } else {
        "Students value Technical Skills somewhere in between Networking and Recruiting."
    }
}

pub fn insights(ranked: &[RankedFeature]) -> TextSummary {
    let most_essential = with_data(ranked)
        .next()
        .map_or("n/a", |item| item.feature.name);
    let technical = mean_of(ranked, TECHNICAL);
    let networking = mean_of(ranked, NETWORKING);
    let recruiting = mean_of(ranked, RECRUITING);

    let mut summary = TextSummary::new("Insights");
    summary
        .line(format!("1. Most Essential Feature: {}", most_essential))
        .line(format!(
            "2. Comparison: Technical Skills ({}) vs Networking/Recruiting",
            score(technical)
        ))
        .line(format!("   - Networking (Peers/Alumni): {}", score(networking)))
        .line(format!("   - Recruiting/Internships: {}", score(recruiting)))
        .line(format!(
            "   -> {}",
            comparison_insight(technical, networking, recruiting)
        ));
    summary
}

pub fn chart(ranked: &[RankedFeature]) -> HorizontalBarChart {
    HorizontalBarChart {
        title: "Program Irreplaceability: What is Hardest to Replace via Work Experience?"
            .to_string(),
        x_desc: "Average Rank (Lower is More Essential)".to_string(),
        bars: with_data(ranked)
            .map(|item| Bar {
                label: item.feature.name.to_string(),
                value: item.rank.mean,
                color: SKY_BLUE,
            })
            .collect(),
        value_format: ValueFormat::Decimal2,
    }
}

/// Run the irreplaceability analysis and write its chart and insights.
pub fn run(ctx: &AnalysisContext) -> Result<Vec<RankedFeature>, AnalysisError> {
    let ranked = rank_features(ctx.survey)?;

    ctx.renderer
        .horizontal_bar_chart(&ctx.output_path(CHART_FILE), &chart(&ranked))?;
    insights(&ranked).write(&ctx.output_path(INSIGHTS_FILE))?;

    info!(dir = %ctx.output_dir.display(), "Irreplaceability analysis complete");
    Ok(ranked)
}
