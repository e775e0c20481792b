//! Chart Style
//! Explicit plotting configuration and color palettes, passed to the renderer at startup.

use plotters::style::RGBColor;

/// Aware / unaware bars.
pub const AWARENESS_PALETTE: [RGBColor; 2] = [
    RGBColor(46, 204, 113), // Green
    RGBColor(231, 76, 60),  // Red
];

/// Pastel slices for pie charts.
pub const PASTEL_PALETTE: [RGBColor; 10] = [
    RGBColor(161, 201, 244),
    RGBColor(255, 180, 130),
    RGBColor(141, 229, 161),
    RGBColor(255, 159, 155),
    RGBColor(208, 187, 255),
    RGBColor(222, 187, 155),
    RGBColor(250, 176, 228),
    RGBColor(207, 207, 207),
    RGBColor(255, 254, 163),
    RGBColor(185, 242, 240),
];

/// Sequential palette for ordered categories.
pub const VIRIDIS_PALETTE: [RGBColor; 5] = [
    RGBColor(68, 1, 84),
    RGBColor(59, 82, 139),
    RGBColor(33, 145, 140),
    RGBColor(94, 201, 98),
    RGBColor(253, 231, 37),
];

/// Diverging red-to-green palette for five-point scales.
pub const RED_YELLOW_GREEN_PALETTE: [RGBColor; 5] = [
    RGBColor(215, 25, 28),
    RGBColor(253, 174, 97),
    RGBColor(255, 255, 191),
    RGBColor(166, 217, 106),
    RGBColor(26, 150, 65),
];

/// Dark-to-light palette for ranked features.
pub const ROCKET_PALETTE: [RGBColor; 6] = [
    RGBColor(53, 25, 62),
    RGBColor(112, 31, 87),
    RGBColor(173, 23, 89),
    RGBColor(225, 51, 66),
    RGBColor(243, 118, 81),
    RGBColor(246, 180, 143),
];

pub const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);

/// Color for the `idx`-th item, cycling through the palette.
pub fn palette_color(palette: &[RGBColor], idx: usize) -> RGBColor {
    if palette.is_empty() {
        RGBColor(0, 0, 0)
    } else {
        palette[idx % palette.len()]
    }
}

/// Fonts and canvas sizes shared by every chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub font_family: String,
    pub title_size: u32,
    pub font_size: u32,
    pub annotation_size: u32,
    pub width: u32,
    pub height: u32,
    /// Side of the square canvas used for pie charts.
    pub pie_size: u32,
    pub margin: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            title_size: 24,
            font_size: 16,
            annotation_size: 14,
            width: 1000,
            height: 600,
            pie_size: 800,
            margin: 20,
        }
    }
}

impl ChartStyle {
    pub fn title_font(&self) -> (&str, u32) {
        (self.font_family.as_str(), self.title_size)
    }

    pub fn label_font(&self) -> (&str, u32) {
        (self.font_family.as_str(), self.font_size)
    }

    pub fn annotation_font(&self) -> (&str, u32) {
        (self.font_family.as_str(), self.annotation_size)
    }
}
