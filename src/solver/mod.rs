//! Linear program adapter
//!
//! Every query is a fresh, stateless LP over the fixed coefficient space:
//! the full constraint list is handed to the solver on each call and nothing
//! is kept between calls.

mod lp;

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

use crate::power_flow::{Coefficient, Row, COEFFICIENT_COUNT};

pub use lp::solve;

/// Optimisation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Goal {
    Minimize,
    Maximize,
}

/// Objective handed to [`solve`]
#[derive(Debug, Clone, PartialEq)]
pub enum Objective {
    /// `Σ w_c * c`
    Linear(Row),
    /// Weighted L1 magnitude `Σ w_c * |c|`. Only meaningful when minimised;
    /// weights must be non-negative.
    Magnitude(Row),
}

impl Objective {
    /// The value of a single coefficient
    pub fn coefficient(coefficient: Coefficient) -> Self {
        let mut weights = [0.0; COEFFICIENT_COUNT];
        weights[coefficient.index()] = 1.0;
        Objective::Linear(weights)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LpError {
    #[error("linear program is infeasible")]
    Infeasible,

    #[error("linear program is unbounded")]
    Unbounded,

    #[error("a weighted magnitude can only be minimised")]
    NonConvex,

    #[error("solver failure: {0}")]
    Solver(String),
}

impl From<good_lp::ResolutionError> for LpError {
    fn from(err: good_lp::ResolutionError) -> Self {
        match err {
            good_lp::ResolutionError::Infeasible => LpError::Infeasible,
            good_lp::ResolutionError::Unbounded => LpError::Unbounded,
            other => LpError::Solver(other.to_string()),
        }
    }
}
