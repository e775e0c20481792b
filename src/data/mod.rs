//! Data module - survey loading, filtering and coding

mod filter;
mod loader;
mod ordinal;
mod processor;

pub use filter::{FilterError, RowFilter};
pub use loader::{load_survey, LoaderError, SurveyData};
pub use ordinal::{scale_for, OrdinalScale};
pub use processor::{DataProcessor, ProcessorError};
