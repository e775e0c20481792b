//! Statistics Calculator Module
//! Handles counts, conditional percentages, cross-tabulations and mean rankings.

use crate::data::{DataProcessor, ProcessorError};
use polars::prelude::*;
use statrs::statistics::Statistics;
use std::cmp::Ordering;

/// `100 * count / total`, or 0.0 when `total` is zero.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * count as f64 / total as f64
    }
}

/// One category of a distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

/// Distribution of the non-blank answers of one field within a subset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distribution {
    pub field: String,
    pub valid_count: usize,
    /// Sorted by descending count; ties keep first-appearance order.
    pub categories: Vec<CategoryCount>,
}

impl Distribution {
    pub fn from_values<'a, I>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut counts: Vec<(String, usize)> = Vec::new();
        let mut valid_count = 0;

        for value in values.into_iter().flatten() {
            valid_count += 1;
            match counts.iter_mut().find(|(label, _)| label == value) {
                Some((_, count)) => *count += 1,
                None => counts.push((value.to_string(), 1)),
            }
        }

        counts.sort_by(|a, b| b.1.cmp(&a.1));

        let categories = counts
            .into_iter()
            .map(|(label, count)| CategoryCount {
                label,
                count,
                percentage: percentage(count, valid_count),
            })
            .collect();

        Self {
            field: field.to_string(),
            valid_count,
            categories,
        }
    }

    pub fn count(&self, label: &str) -> usize {
        self.categories
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    pub fn percentage(&self, label: &str) -> f64 {
        percentage(self.count(label), self.valid_count)
    }

    /// Categories in a fixed order, zero-filled for labels that did not occur.
    pub fn reindexed(&self, order: &[&str]) -> Vec<CategoryCount> {
        order
            .iter()
            .map(|label| CategoryCount {
                label: label.to_string(),
                count: self.count(label),
                percentage: self.percentage(label),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.valid_count == 0
    }
}

/// Distribution of a value field within each group of a grouping field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossTab {
    pub group_field: String,
    pub value_field: String,
    /// Groups in first-appearance order.
    pub groups: Vec<(String, Distribution)>,
}

impl CrossTab {
    /// Build from (group, value) answer pairs; pairs with a blank side are skipped.
    pub fn from_pairs<'a, I>(group_field: &str, value_field: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (Option<&'a str>, Option<&'a str>)>,
    {
        let mut buckets: Vec<(&'a str, Vec<&'a str>)> = Vec::new();
        for (group, value) in pairs {
            let (Some(group), Some(value)) = (group, value) else {
                continue;
            };
            match buckets.iter_mut().find(|(g, _)| *g == group) {
                Some((_, values)) => values.push(value),
                None => buckets.push((group, vec![value])),
            }
        }

        let groups = buckets
            .into_iter()
            .map(|(group, values)| {
                let dist = Distribution::from_values(value_field, values.into_iter().map(Some));
                (group.to_string(), dist)
            })
            .collect();

        Self {
            group_field: group_field.to_string(),
            value_field: value_field.to_string(),
            groups,
        }
    }

    pub fn group(&self, name: &str) -> Option<&Distribution> {
        self.groups
            .iter()
            .find(|(group, _)| group == name)
            .map(|(_, dist)| dist)
    }

    pub fn group_names(&self) -> Vec<String> {
        self.groups.iter().map(|(group, _)| group.clone()).collect()
    }
}

/// Mean of one numeric field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMean {
    pub field: String,
    pub valid_count: usize,
    /// 0.0 when the field has no valid values.
    pub mean: f64,
    /// Sample standard deviation; 0.0 with fewer than two values.
    pub std_dev: f64,
}

impl FieldMean {
    pub fn from_values(field: &str, values: &[Option<f64>]) -> Self {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        let valid_count = present.len();

        let mean = if valid_count == 0 {
            0.0
        } else {
            present.iter().mean()
        };
        let std_dev = if valid_count < 2 {
            0.0
        } else {
            present.iter().std_dev()
        };

        Self {
            field: field.to_string(),
            valid_count,
            mean,
            std_dev,
        }
    }

    pub fn has_data(&self) -> bool {
        self.valid_count > 0
    }
}

/// Order fields by ascending mean. The sort is stable; fields without any
/// valid value go last in their input order.
pub fn rank_by_mean(mut means: Vec<FieldMean>) -> Vec<FieldMean> {
    means.sort_by(|a, b| match (a.has_data(), b.has_data()) {
        (true, true) => a.mean.partial_cmp(&b.mean).unwrap_or(Ordering::Equal),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    });
    means
}

/// How many coded values fall at or below a threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdCount {
    pub threshold: f64,
    pub count: usize,
    pub valid_count: usize,
    /// Percentage of `valid_count`.
    pub percentage: f64,
}

impl ThresholdCount {
    pub fn from_values(values: &[Option<f64>], threshold: f64) -> Self {
        let valid_count = values.iter().flatten().count();
        let count = values.iter().flatten().filter(|v| **v <= threshold).count();
        Self {
            threshold,
            count,
            valid_count,
            percentage: percentage(count, valid_count),
        }
    }
}

/// Handles aggregate calculations over response subsets.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Counts and percentages of the non-blank answers of `field`.
    pub fn value_counts(df: &DataFrame, field: &str) -> Result<Distribution, ProcessorError> {
        let values = DataProcessor::text_values(df, field)?;
        Ok(Distribution::from_values(
            field,
            values.iter().map(Option::as_deref),
        ))
    }

    /// Distribution of `value_field` within each value of `group_field`.
    pub fn cross_tab(
        df: &DataFrame,
        group_field: &str,
        value_field: &str,
    ) -> Result<CrossTab, ProcessorError> {
        let groups = DataProcessor::text_values(df, group_field)?;
        let values = DataProcessor::text_values(df, value_field)?;
        Ok(CrossTab::from_pairs(
            group_field,
            value_field,
            groups
                .iter()
                .map(Option::as_deref)
                .zip(values.iter().map(Option::as_deref)),
        ))
    }

    /// Mean of each numeric-coded field, ranked ascending.
    pub fn mean_ranking(df: &DataFrame, fields: &[&str]) -> Result<Vec<FieldMean>, ProcessorError> {
        let means = fields
            .iter()
            .map(|field| {
                let values = DataProcessor::numeric_values(df, field)?;
                Ok(FieldMean::from_values(field, &values))
            })
            .collect::<Result<Vec<_>, ProcessorError>>()?;
        Ok(rank_by_mean(means))
    }

    /// Rows whose numeric value of `field` is at most `threshold`.
    pub fn threshold_count(
        df: &DataFrame,
        field: &str,
        threshold: f64,
    ) -> Result<ThresholdCount, ProcessorError> {
        let values = DataProcessor::numeric_values(df, field)?;
        Ok(ThresholdCount::from_values(&values, threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round1(value: f64) -> f64 {
        (value * 10.0).round() / 10.0
    }

    fn frame(columns: Vec<(&str, Vec<Option<&str>>)>) -> DataFrame {
        DataFrame::new(
            columns
                .into_iter()
                .map(|(name, values)| Column::new(name.into(), values))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_value_counts_excludes_blanks() {
        let mut status = vec![Some("Yes"); 6];
        status.extend(vec![Some("No"); 3]);
        status.push(None);
        let df = frame(vec![("status", status)]);

        let dist = StatsCalculator::value_counts(&df, "status").unwrap();

        assert_eq!(dist.valid_count, 9);
        assert_eq!(dist.count("Yes"), 6);
        assert_eq!(dist.count("No"), 3);
        assert_eq!(round1(dist.percentage("Yes")), 66.7);
        assert_eq!(round1(dist.percentage("No")), 33.3);
        assert_eq!(dist.categories[0].label, "Yes");
    }

    #[test]
    fn test_counts_sum_to_valid_count() {
        let dist = Distribution::from_values(
            "Q52",
            vec![Some("a"), Some("b"), None, Some("a"), Some("c"), None],
        );
        let total: usize = dist.categories.iter().map(|c| c.count).sum();
        assert_eq!(total, dist.valid_count);
        let pct: f64 = dist.categories.iter().map(|c| c.percentage).sum();
        assert!(pct <= 100.0 + 1e-9);
    }

    #[test]
    fn test_ties_keep_first_appearance() {
        let dist = Distribution::from_values("f", vec![Some("b"), Some("a"), Some("a"), Some("b")]);
        let labels: Vec<&str> = dist.categories.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "a"]);
    }

    #[test]
    fn test_empty_subset_percentages_are_zero() {
        let df = frame(vec![("status", vec![])]);
        let dist = StatsCalculator::value_counts(&df, "status").unwrap();

        assert!(dist.is_empty());
        assert_eq!(dist.percentage("Yes"), 0.0);
        assert_eq!(percentage(0, 0), 0.0);

        let threshold = ThresholdCount::from_values(&[], 2.0);
        assert_eq!(threshold.percentage, 0.0);
    }

    #[test]
    fn test_reindexed_fills_zero() {
        let dist = Distribution::from_values(
            "Q35",
            vec![Some("Somewhat likely"), Some("Somewhat likely")],
        );
        let ordered = dist.reindexed(&["Somewhat unlikely", "Somewhat likely"]);

        assert_eq!(ordered[0].count, 0);
        assert_eq!(ordered[0].percentage, 0.0);
        assert_eq!(ordered[1].count, 2);
        assert_eq!(ordered[1].percentage, 100.0);
    }

    #[test]
    fn test_threshold_excludes_unparseable() {
        let df = frame(vec![(
            "code",
            vec![Some("1"), Some("2"), Some("bad"), Some("4"), Some("5")],
        )]);
        let result = StatsCalculator::threshold_count(&df, "code", 2.0).unwrap();

        assert_eq!(result.valid_count, 4);
        assert_eq!(result.count, 2);
        assert_eq!(round1(result.percentage), 50.0);
    }

    #[test]
    fn test_cross_tab_per_group_percentages() {
        let df = frame(vec![
            ("group", vec![Some("A"), Some("A"), Some("A"), Some("B"), None]),
            ("answer", vec![Some("Yes"), Some("Yes"), Some("No"), Some("Yes"), Some("No")]),
        ]);
        let tab = StatsCalculator::cross_tab(&df, "group", "answer").unwrap();

        assert_eq!(tab.group_names(), vec!["A", "B"]);
        let a = tab.group("A").unwrap();
        assert_eq!(round1(a.percentage("Yes")), 66.7);
        assert_eq!(round1(a.percentage("No")), 33.3);
        let b = tab.group("B").unwrap();
        assert_eq!(round1(b.percentage("Yes")), 100.0);
        assert!(tab.group("C").is_none());
    }

    #[test]
    fn test_mean_ranking_ascending() {
        let df = frame(vec![
            ("Q24_1", vec![Some("3"), Some("5")]),
            ("Q24_2", vec![Some("1"), Some("2")]),
            ("Q24_3", vec![Some("6"), Some("x")]),
        ]);
        let ranking = StatsCalculator::mean_ranking(&df, &["Q24_1", "Q24_2", "Q24_3"]).unwrap();
        let fields: Vec<&str> = ranking.iter().map(|m| m.field.as_str()).collect();

        assert_eq!(fields, vec!["Q24_2", "Q24_1", "Q24_3"]);
        assert_eq!(ranking[0].mean, 1.5);
        assert_eq!(ranking[2].valid_count, 1);
        assert_eq!(ranking[2].std_dev, 0.0);
    }

    #[test]
    fn test_mean_ranking_ties_are_stable() {
        let means = vec![
            FieldMean::from_values("b", &[Some(2.0)]),
            FieldMean::from_values("a", &[Some(2.0)]),
            FieldMean::from_values("c", &[Some(1.0)]),
        ];
        let ranked: Vec<String> = rank_by_mean(means).into_iter().map(|m| m.field).collect();
        assert_eq!(ranked, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_fields_without_data_rank_last() {
        let means = vec![
            FieldMean::from_values("empty", &[None, None]),
            FieldMean::from_values("full", &[Some(4.0), Some(6.0)]),
        ];
        let ranked = rank_by_mean(means);

        assert_eq!(ranked[0].field, "full");
        assert_eq!(ranked[0].mean, 5.0);
        assert_eq!(ranked[1].mean, 0.0);
        assert!(!ranked[1].has_data());
    }

    #[test]
    fn test_standard_deviation() {
        let values: Vec<Option<f64>> = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]
            .into_iter()
            .map(Some)
            .collect();
        let mean = FieldMean::from_values("f", &values);
        assert_eq!(mean.mean, 5.0);
        assert!((mean.std_dev - 2.138089935299395).abs() < 1e-9);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(66.666), 66.7);
        assert_eq!(round1(33.333), 33.3);
        assert_eq!(round1(0.0), 0.0);
    }
}
