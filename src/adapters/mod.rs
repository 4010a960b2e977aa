//! Adapters: file-backed implementations of the ports.

pub mod json_posts;
pub mod json_report;

pub use json_posts::JsonPostSource;
pub use json_report::JsonReportSink;
