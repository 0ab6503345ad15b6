//! State module for tracking analysis progress
//!
//! # Components
//!
//! - `Status`: lifecycle of a work item (queued, running, done, error)
//! - `WorkItem`: a submitted URL with its lifecycle state and results
//! - `AnalysisResult`: the page metrics produced by one successful analysis

mod status;
mod work_item;

pub use status::Status;
pub use work_item::{AnalysisResult, HeadingCounts, WorkItem};
