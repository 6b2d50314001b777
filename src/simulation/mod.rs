//! # Schedule Simulation
//!
//! Runs one candidate schedule over the periods of a planning context.
//!
//! ## Components
//!
//! - **SimulationState**: battery energy carried from period to period within one run
//! - **EssMode / PeriodConstraint**: per-period operating decisions pinned into the model
//! - **Simulator**: builds, constrains and solves one model per period and advances the state
//! - **evaluate_candidates**: runs candidate schedules concurrently under a time limit
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use energy_flow_planner::forecast::PlanningContext;
//! use energy_flow_planner::simulation::{EssMode, Simulator};
//!
//! # fn run(context: PlanningContext) -> Result<(), Box<dyn std::error::Error>> {
//! let simulator = Simulator::new(Arc::new(context), 0.5);
//! let schedule = vec![EssMode::Balancing; simulator.context().periods.len()];
//! let result = simulator.simulate(&schedule)?;
//! println!("total cost: {:.4}", result.total_cost);
//! # Ok(())
//! # }
//! ```

pub mod mode;
pub mod search;
pub mod simulator;
pub mod state;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::power_flow::FlowError;

pub use mode::{EssMode, PeriodConstraint, PeriodContext};
pub use search::{evaluate_candidates, Candidate, Evaluated};
pub use simulator::{ModeFlows, SimulatedPeriod, SimulationResult, Simulator};
pub use state::SimulationState;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("period {index} at {time} failed: {source}")]
    Period {
        index: usize,
        time: DateTime<Utc>,
        source: FlowError,
    },
}
