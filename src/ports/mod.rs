//! Ports: trait boundaries between the core and its collaborators.

pub mod post_source;
pub mod profile_sink;

pub use post_source::{PostBatch, PostSource, SourceError};
pub use profile_sink::{ProfileSink, SinkError};
