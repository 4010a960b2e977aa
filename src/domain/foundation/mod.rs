//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, error types, and the state machine trait
//! that form the vocabulary of the Trader Lens domain.

mod errors;
mod score;
mod state_machine;
mod timestamp;

pub use errors::{AnalysisError, ValidationError};
pub use score::Score;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
