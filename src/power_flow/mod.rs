/// Energy Flow Balance Model
///
/// This module contains the per-period flow model relating production,
/// consumption, battery and grid. The model is a set of linear constraints
/// over a fixed coefficient vector; every query is answered by the LP
/// adapter in [`crate::solver`].

pub mod coefficient;
pub mod constraints;
pub mod inputs;
pub mod model;
pub mod snapshot;

use thiserror::Error;

use crate::solver::{Goal, LpError};

pub use coefficient::{Coefficient, Row, COEFFICIENT_COUNT};
pub use constraints::{LinearConstraint, Relation};
pub use inputs::ModelInputs;
pub use model::EnergyFlowModel;
pub use snapshot::EnergyFlow;

/// Errors raised while building or solving a flow model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowError {
    #[error("invalid model inputs: {0}")]
    InvalidInputs(String),

    #[error("unable to {goal} {coefficient}: {source}")]
    Extreme {
        coefficient: Coefficient,
        goal: Goal,
        source: LpError,
    },

    #[error("unable to distribute energy: {0}")]
    Distribution(#[source] LpError),
}

impl FlowError {
    /// Whether the underlying linear program had no feasible point
    pub fn is_infeasible(&self) -> bool {
        matches!(
            self,
            FlowError::Extreme {
                source: LpError::Infeasible,
                ..
            } | FlowError::Distribution(LpError::Infeasible)
        )
    }
}
