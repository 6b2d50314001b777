use serde::{Deserialize, Serialize};

/// Battery energy threaded through one candidate-schedule run
///
/// Owned by exactly one run. Advance it once per period, in period order,
/// after that period's model has been solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationState {
    ess_initial_energy: i32,
}

impl SimulationState {
    pub fn new(ess_initial_energy: i32) -> Self {
        Self {
            ess_initial_energy: ess_initial_energy.max(0),
        }
    }

    /// Battery energy (Wh) at the start of the next period
    pub fn initial_energy(&self) -> i32 {
        self.ess_initial_energy
    }

    /// Advance by a period's battery flow (positive = discharge). Never
    /// drops below zero.
    pub fn apply_charge(&mut self, ess_flow: i32) {
        self.ess_initial_energy = self.ess_initial_energy.saturating_sub(ess_flow).max(0);
    }
}
