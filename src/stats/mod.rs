//! Stats module - survey aggregates

mod calculator;

pub use calculator::{
    percentage, CategoryCount, CrossTab, Distribution, FieldMean, StatsCalculator, ThresholdCount,
};
