pub mod builder;
pub mod period;
pub mod provider;
pub mod synthetic;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use builder::*;
pub use period::*;
pub use provider::*;
pub use synthetic::*;

/// Errors raised while building the period sequence of a planning cycle
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PeriodError {
    #[error("no usable forecast from {start}")]
    EmptySequence { start: DateTime<Utc> },

    #[error("invalid telemetry: {0}")]
    InvalidTelemetry(String),
}
