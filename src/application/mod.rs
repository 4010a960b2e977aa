//! Application layer: batch orchestration over the domain pipeline.

pub mod analyzer;
pub mod report;

pub use analyzer::{Analyzer, BatchOptions};
pub use report::{BatchReport, FailedUser};
