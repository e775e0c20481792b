//! Charts module - PNG chart rendering

mod renderer;
mod style;

pub use renderer::{
    Bar, BarChart, ChartError, ChartRenderer, HorizontalBarChart, PieChart, StackLayer,
    StackedBarChart, ValueFormat,
};
pub use style::{
    palette_color, ChartStyle, AWARENESS_PALETTE, PASTEL_PALETTE, RED_YELLOW_GREEN_PALETTE,
    ROCKET_PALETTE, SKY_BLUE, VIRIDIS_PALETTE,
};
