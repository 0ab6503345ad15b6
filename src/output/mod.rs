//! Reporting over stored work items

pub mod stats;

pub use stats::{load_statistics, print_statistics, summary_line, AnalysisStatistics};
