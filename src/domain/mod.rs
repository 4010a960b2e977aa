//! Domain layer: the classification pipeline from posts to profiles.
//!
//! Pure, deterministic logic with no I/O. The application layer wires
//! these pieces together per user; adapters handle ingestion and output.

pub mod classifier;
pub mod confidence;
pub mod conflict;
pub mod extractor;
pub mod foundation;
pub mod indicator;
pub mod instruments;
pub mod ledger;
pub mod post;
pub mod profile;
pub mod signals;
pub mod text;
