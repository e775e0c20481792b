//! Static Chart Renderer
//! Writes bar, stacked bar, horizontal bar and pie charts as PNG files with plotters.
//!
//! Every chart follows the same layout:
//! 1. Title centered on top
//! 2. Plot area with category labels on the discrete axis
//! 3. Optional value labels and legend

use super::style::ChartStyle;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("failed to render chart: {0}")]
    Render(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Render(err.to_string())
    }
}

/// How values are printed next to their bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    Hidden,
    Percent,
    Count,
    Decimal2,
}

impl ValueFormat {
    fn render(self, value: f64) -> Option<String> {
        match self {
            ValueFormat::Hidden => None,
            ValueFormat::Percent => Some(format!("{:.1}%", value)),
            ValueFormat::Count => Some(format!("{:.0}", value)),
            ValueFormat::Decimal2 => Some(format!("{:.2}", value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub color: RGBColor,
}

/// Vertical bars, one per category.
#[derive(Debug, Clone)]
pub struct BarChart {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    /// Fixed upper bound of the value axis; derived from the data when `None`.
    pub y_max: Option<f64>,
    pub bars: Vec<Bar>,
    pub legend: Vec<(String, RGBColor)>,
    pub value_format: ValueFormat,
}

/// Horizontal bars listed top to bottom.
#[derive(Debug, Clone)]
pub struct HorizontalBarChart {
    pub title: String,
    pub x_desc: String,
    pub bars: Vec<Bar>,
    pub value_format: ValueFormat,
}

/// One stacked layer: its value for every group.
#[derive(Debug, Clone)]
pub struct StackLayer {
    pub name: String,
    pub values: Vec<f64>,
    pub color: RGBColor,
}

/// Proportions stacked to 1.0 per group.
#[derive(Debug, Clone)]
pub struct StackedBarChart {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub legend_title: String,
    pub groups: Vec<String>,
    pub layers: Vec<StackLayer>,
}

#[derive(Debug, Clone)]
pub struct PieChart {
    pub title: String,
    pub slices: Vec<(String, f64)>,
    pub colors: Vec<RGBColor>,
    pub start_angle: f64,
}

/// Renders charts to PNG files using a fixed [`ChartStyle`].
pub struct ChartRenderer {
    style: ChartStyle,
}

impl ChartRenderer {
    pub fn new(style: ChartStyle) -> Self {
        Self { style }
    }

    pub fn bar_chart(&self, path: &Path, chart: &BarChart) -> Result<(), ChartError> {
        let root =
            BitMapBackend::new(path, (self.style.width, self.style.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let n = chart.bars.len();
        let y_max = axis_max(chart.bars.iter().map(|b| b.value), chart.y_max);
        let labels: Vec<String> = chart.bars.iter().map(|b| b.label.clone()).collect();

        let mut ctx = ChartBuilder::on(&root)
            .caption(chart.title.as_str(), self.style.title_font())
            .margin(self.style.margin)
            .x_label_area_size(60)
            .y_label_area_size(70)
            .build_cartesian_2d((0..last_segment(n)).into_segmented(), 0f64..y_max)?;

        let x_fmt = |v: &SegmentValue<i32>| segment_label(&labels, v);
        ctx.configure_mesh()
            .disable_x_mesh()
            .x_labels(n.max(1))
            .x_label_formatter(&x_fmt)
            .x_desc(chart.x_desc.as_str())
            .y_desc(chart.y_desc.as_str())
            .label_style(self.style.label_font())
            .axis_desc_style(self.style.label_font())
            .draw()?;

        ctx.draw_series(chart.bars.iter().enumerate().map(|(i, bar)| {
            let x = i as i32;
            let mut rect = Rectangle::new(
                [(SegmentValue::Exact(x), 0.0), (SegmentValue::Exact(x + 1), bar.value)],
                bar.color.filled(),
            );
            rect.set_margin(0, 0, 12, 12);
            rect
        }))?;

        let value_style = TextStyle::from(self.style.annotation_font().into_font())
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        ctx.draw_series(
            chart
                .bars
                .iter()
                .enumerate()
                .filter(|(_, bar)| bar.value > 0.0)
                .filter_map(|(i, bar)| {
                    let text = chart.value_format.render(bar.value)?;
                    Some(Text::new(
                        text,
                        (SegmentValue::CenterOf(i as i32), bar.value),
                        value_style.clone(),
                    ))
                }),
        )?;

        if !chart.legend.is_empty() {
            for (name, color) in &chart.legend {
                let color = *color;
                ctx.draw_series(std::iter::empty::<Rectangle<(SegmentValue<i32>, f64)>>())?
                    .label(name.as_str())
                    .legend(move |(x, y)| {
                        Rectangle::new([(x, y - 6), (x + 12, y + 6)], color.filled())
                    });
            }
            ctx.configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .label_font(self.style.label_font())
                .draw()?;
        }

        root.present()?;
        debug!(path = %path.display(), bars = n, "Rendered bar chart");
        Ok(())
    }

    pub fn horizontal_bar_chart(
        &self,
        path: &Path,
        chart: &HorizontalBarChart,
    ) -> Result<(), ChartError> {
        let root =
            BitMapBackend::new(path, (self.style.width, self.style.height)).into_drawing_area();
        root.fill(&WHITE)?;

        // Segment 0 sits at the bottom, so the first bar is drawn last.
        let ordered: Vec<&Bar> = chart.bars.iter().rev().collect();
        let n = ordered.len();
        let x_max = axis_max(ordered.iter().map(|b| b.value), None);
        let labels: Vec<String> = ordered.iter().map(|b| b.label.clone()).collect();

        let mut ctx = ChartBuilder::on(&root)
            .caption(chart.title.as_str(), self.style.title_font())
            .margin(self.style.margin)
            .x_label_area_size(50)
            .y_label_area_size(220)
            .build_cartesian_2d(0f64..x_max, (0..last_segment(n)).into_segmented())?;

        let y_fmt = |v: &SegmentValue<i32>| segment_label(&labels, v);
        ctx.configure_mesh()
            .disable_y_mesh()
            .y_labels(n.max(1))
            .y_label_formatter(&y_fmt)
            .x_desc(chart.x_desc.as_str())
            .label_style(self.style.label_font())
            .axis_desc_style(self.style.label_font())
            .draw()?;

        ctx.draw_series(ordered.iter().enumerate().map(|(i, bar)| {
            let y = i as i32;
            let mut rect = Rectangle::new(
                [(0.0, SegmentValue::Exact(y)), (bar.value, SegmentValue::Exact(y + 1))],
                bar.color.filled(),
            );
            rect.set_margin(8, 8, 0, 0);
            rect
        }))?;

        let value_style = TextStyle::from(self.style.annotation_font().into_font())
            .pos(Pos::new(HPos::Left, VPos::Center));
        let offset = x_max * 0.01;
        ctx.draw_series(ordered.iter().enumerate().filter_map(|(i, bar)| {
            let text = chart.value_format.render(bar.value)?;
            Some(Text::new(
                text,
                (bar.value + offset, SegmentValue::CenterOf(i as i32)),
                value_style.clone(),
            ))
        }))?;

        root.present()?;
        debug!(path = %path.display(), bars = n, "Rendered horizontal bar chart");
        Ok(())
    }

    pub fn stacked_bar_chart(
        &self,
        path: &Path,
        chart: &StackedBarChart,
    ) -> Result<(), ChartError> {
        let root =
            BitMapBackend::new(path, (self.style.width, self.style.height)).into_drawing_area();
        root.fill(&WHITE)?;

        // Legend column right of the plot.
        let titled = root.titled(chart.title.as_str(), self.style.title_font())?;
        let (plot_width, _) = legend_split(titled.dim_in_pixel().0);
        let (plot_area, legend_area) = titled.split_horizontally(plot_width as i32);

        let n = chart.groups.len();
        let mut ctx = ChartBuilder::on(&plot_area)
            .margin(self.style.margin)
            .x_label_area_size(60)
            .y_label_area_size(70)
            .build_cartesian_2d((0..last_segment(n)).into_segmented(), 0f64..1f64)?;

        let x_fmt = |v: &SegmentValue<i32>| segment_label(&chart.groups, v);
        ctx.configure_mesh()
            .disable_x_mesh()
            .x_labels(n.max(1))
            .x_label_formatter(&x_fmt)
            .x_desc(chart.x_desc.as_str())
            .y_desc(chart.y_desc.as_str())
            .label_style(self.style.label_font())
            .axis_desc_style(self.style.label_font())
            .draw()?;

        let mut base = vec![0f64; n];
        for layer in &chart.layers {
            let rects: Vec<Rectangle<(SegmentValue<i32>, f64)>> = layer
                .values
                .iter()
                .zip(base.iter_mut())
                .enumerate()
                .map(|(i, (value, bottom))| {
                    let x = i as i32;
                    let top = *bottom + value;
                    let mut rect = Rectangle::new(
                        [(SegmentValue::Exact(x), *bottom), (SegmentValue::Exact(x + 1), top)],
                        layer.color.filled(),
                    );
                    rect.set_margin(0, 0, 30, 30);
                    *bottom = top;
                    rect
                })
                .collect();
            ctx.draw_series(rects)?;
        }

        let entries: Vec<(&str, RGBColor)> = chart
            .layers
            .iter()
            .map(|layer| (layer.name.as_str(), layer.color))
            .collect();
        self.draw_legend(&legend_area, &chart.legend_title, &entries)?;

        root.present()?;
        debug!(
            path = %path.display(),
            groups = n,
            layers = chart.layers.len(),
            "Rendered stacked bar chart"
        );
        Ok(())
    }

    /// Legend column: the title, then one swatch and name per entry, top down.
    fn draw_legend<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        title: &str,
        entries: &[(&str, RGBColor)],
    ) -> Result<(), ChartError> {
        let font = self.style.annotation_font();
        let swatch = self.style.annotation_size as i32;
        let step = swatch + 10;
        let x = 10;
        let mut y = self.style.margin as i32 + 10;

        area.draw(&Text::new(title, (x, y), font))?;
        for (name, color) in entries {
            y += step;
            area.draw(&Rectangle::new([(x, y), (x + swatch, y + swatch)], color.filled()))?;
            area.draw(&Text::new(*name, (x + swatch + 8, y), font))?;
        }
        Ok(())
    }

    pub fn pie_chart(&self, path: &Path, chart: &PieChart) -> Result<(), ChartError> {
        let side = self.style.pie_size;
        let root = BitMapBackend::new(path, (side, side)).into_drawing_area();
        root.fill(&WHITE)?;
        let area = root.titled(chart.title.as_str(), self.style.title_font())?;

        let sizes: Vec<f64> = chart.slices.iter().map(|(_, v)| *v).collect();
        if sizes.iter().sum::<f64>() <= 0.0 {
            warn!(path = %path.display(), "No data for pie chart, writing title only");
            root.present()?;
            return Ok(());
        }

        let labels: Vec<String> = chart.slices.iter().map(|(l, _)| l.clone()).collect();
        let colors: Vec<RGBColor> = (0..sizes.len())
            .map(|i| super::style::palette_color(&chart.colors, i))
            .collect();

        let (w, h) = area.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = f64::from(w.min(h)) * 0.32;

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(chart.start_angle);
        pie.label_style(TextStyle::from(self.style.label_font().into_font()).color(&BLACK));
        pie.percentages(TextStyle::from(self.style.annotation_font().into_font()).color(&BLACK));
        area.draw(&pie)?;

        root.present()?;
        debug!(path = %path.display(), slices = sizes.len(), "Rendered pie chart");
        Ok(())
    }
}

/// Upper bound of a value axis: the fixed bound, or the data maximum plus headroom.
fn axis_max(values: impl Iterator<Item = f64>, fixed: Option<f64>) -> f64 {
    if let Some(fixed) = fixed {
        return fixed;
    }
    let max = values.fold(0.0, f64::max);
    if max <= 0.0 {
        1.0
    } else {
        max * 1.15
    }
}

/// Width of a legend column beside the plot, capped at a third of the canvas.
const LEGEND_WIDTH: u32 = 240;

/// Split a canvas width into plot and legend column widths.
fn legend_split(width: u32) -> (u32, u32) {
    let legend = LEGEND_WIDTH.min(width / 3);
    (width - legend, legend)
}

/// Last index of the discrete axis; a single category still gets a two-slot axis.
fn last_segment(n: usize) -> i32 {
    (n as i32 - 1).max(1)
}

fn segment_label(labels: &[String], value: &SegmentValue<i32>) -> String {
    match value {
        SegmentValue::CenterOf(i) => usize::try_from(*i)
            .ok()
            .and_then(|i| labels.get(i))
            .cloned()
            .unwrap_or_default(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::style::{palette_color, AWARENESS_PALETTE, PASTEL_PALETTE, VIRIDIS_PALETTE};
    use std::fs;
    use tempfile::TempDir;

    fn renderer() -> ChartRenderer {
        ChartRenderer::new(ChartStyle::default())
    }

    fn assert_png(dir: &TempDir, name: &str) {
        let bytes = fs::read(dir.path().join(name)).unwrap();
        assert!(bytes.len() > 8);
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    fn bar(label: &str, value: f64, idx: usize) -> Bar {
        Bar {
            label: label.to_string(),
            value,
            color: palette_color(&VIRIDIS_PALETTE, idx),
        }
    }

    #[test]
    fn test_axis_max() {
        assert_eq!(axis_max([1.0, 4.0].into_iter(), Some(100.0)), 100.0);
        assert!((axis_max([1.0, 4.0].into_iter(), None) - 4.6).abs() < 1e-9);
        assert_eq!(axis_max(std::iter::empty(), None), 1.0);
    }

    #[test]
    fn test_segment_labels() {
        let labels = vec!["Graduate".to_string(), "Undergraduate".to_string()];
        assert_eq!(segment_label(&labels, &SegmentValue::CenterOf(1)), "Undergraduate");
        assert_eq!(segment_label(&labels, &SegmentValue::CenterOf(5)), "");
        assert_eq!(segment_label(&labels, &SegmentValue::CenterOf(-1)), "");
        assert_eq!(segment_label(&labels, &SegmentValue::Exact(0)), "");
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment(0), 1);
        assert_eq!(last_segment(1), 1);
        assert_eq!(last_segment(4), 3);
    }

    #[test]
    fn test_value_format() {
        assert_eq!(ValueFormat::Percent.render(66.666), Some("66.7%".to_string()));
        assert_eq!(ValueFormat::Decimal2.render(2.5), Some("2.50".to_string()));
        assert_eq!(ValueFormat::Count.render(3.0), Some("3".to_string()));
        assert_eq!(ValueFormat::Hidden.render(3.0), None);
    }

    #[test]
    fn test_legend_split() {
        assert_eq!(legend_split(1000), (760, 240));
        assert_eq!(legend_split(300), (200, 100));
    }

    #[test]
    fn test_bar_chart_with_legend() {
        let dir = tempfile::tempdir().unwrap();
        let chart = BarChart {
            title: "Awareness".to_string(),
            x_desc: "Group".to_string(),
            y_desc: "Percent".to_string(),
            y_max: Some(100.0),
            bars: vec![bar("Graduate (Aware)", 25.0, 0), bar("Graduate (Unaware)", 75.0, 1)],
            legend: vec![
                ("Aware".to_string(), AWARENESS_PALETTE[0]),
                ("Unaware".to_string(), AWARENESS_PALETTE[1]),
            ],
            value_format: ValueFormat::Percent,
        };

        renderer().bar_chart(&dir.path().join("bars.png"), &chart).unwrap();
        assert_png(&dir, "bars.png");
    }

    #[test]
    fn test_single_category_bar_chart() {
        let dir = tempfile::tempdir().unwrap();
        let chart = BarChart {
            title: "Likelihood".to_string(),
            x_desc: "Likelihood".to_string(),
            y_desc: "Students".to_string(),
            y_max: None,
            bars: vec![bar("Extremely unlikely", 3.0, 0)],
            legend: Vec::new(),
            value_format: ValueFormat::Count,
        };

        renderer().bar_chart(&dir.path().join("single.png"), &chart).unwrap();
        assert_png(&dir, "single.png");
    }

    #[test]
    fn test_horizontal_bar_chart() {
        let dir = tempfile::tempdir().unwrap();
        let chart = HorizontalBarChart {
            title: "Mean rank".to_string(),
            x_desc: "Rank".to_string(),
            bars: vec![bar("CPA Prep", 1.33, 0), bar("Recruiting", 5.67, 1)],
            value_format: ValueFormat::Decimal2,
        };

        renderer()
            .horizontal_bar_chart(&dir.path().join("ranks.png"), &chart)
            .unwrap();
        assert_png(&dir, "ranks.png");
    }

    #[test]
    fn test_stacked_bar_chart_with_legend_column() {
        let dir = tempfile::tempdir().unwrap();
        let chart = StackedBarChart {
            title: "ROI Belief".to_string(),
            x_desc: "Employer".to_string(),
            y_desc: "Proportion".to_string(),
            legend_title: "Belief in Higher Earnings".to_string(),
            groups: vec!["No".to_string(), "Yes".to_string()],
            layers: vec![
                StackLayer {
                    name: "Definitely not".to_string(),
                    values: vec![0.5, 0.0],
                    color: palette_color(&PASTEL_PALETTE, 0),
                },
                StackLayer {
                    name: "Definitely yes".to_string(),
                    values: vec![0.5, 1.0],
                    color: palette_color(&PASTEL_PALETTE, 1),
                },
            ],
        };

        renderer()
            .stacked_bar_chart(&dir.path().join("stacked.png"), &chart)
            .unwrap();
        assert_png(&dir, "stacked.png");
    }

    #[test]
    fn test_pie_chart() {
        let dir = tempfile::tempdir().unwrap();
        let chart = PieChart {
            title: "Incentive shift".to_string(),
            slices: vec![("More likely".to_string(), 2.0), ("No change".to_string(), 1.0)],
            colors: PASTEL_PALETTE.to_vec(),
            start_angle: 140.0,
        };

        renderer().pie_chart(&dir.path().join("pie.png"), &chart).unwrap();
        assert_png(&dir, "pie.png");
    }

    #[test]
    fn test_all_zero_pie_writes_title_only() {
        let dir = tempfile::tempdir().unwrap();
        let chart = PieChart {
            title: "Incentive shift".to_string(),
            slices: vec![("More likely".to_string(), 0.0), ("No change".to_string(), 0.0)],
            colors: PASTEL_PALETTE.to_vec(),
            start_angle: 140.0,
        };

        renderer().pie_chart(&dir.path().join("empty.png"), &chart).unwrap();
        assert_png(&dir, "empty.png");
    }
}
