use serde::{Deserialize, Serialize};

use crate::domain::{Ess, Grid};
use crate::forecast::Period;

use super::FlowError;

/// Scalar inputs of one period's flow model. All values are non-negative
/// magnitudes in Wh for the whole period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInputs {
    /// Forecasted PV production
    pub production: i32,

    /// Forecasted consumption
    pub consumption: i32,

    /// Energy the battery can absorb in this period
    pub ess_max_charge: i32,

    /// Energy the battery can deliver in this period
    pub ess_max_discharge: i32,

    /// Energy that may be bought from the grid
    pub grid_max_buy: i32,

    /// Energy that may be sold to the grid
    pub grid_max_sell: i32,
}

impl ModelInputs {
    pub fn new(
        production: i32,
        consumption: i32,
        ess_max_charge: i32,
        ess_max_discharge: i32,
        grid_max_buy: i32,
        grid_max_sell: i32,
    ) -> Self {
        Self {
            production,
            consumption,
            ess_max_charge,
            ess_max_discharge,
            grid_max_buy,
            grid_max_sell,
        }
    }

    /// Derive the inputs of `period` from the capability records and the
    /// battery energy at the start of the period.
    ///
    /// Capabilities are per quarter and get scaled by the number of quarters
    /// the period spans. Charging is further limited by the room left below
    /// the maximum SoC and discharging by the energy above the reserve.
    pub fn for_period(period: &Period, ess: &Ess, grid: &Grid, ess_initial_energy: i32) -> Self {
        let quarters = period.quarter_count() as i32;

        Self {
            production: period.production(),
            consumption: period.consumption(),
            ess_max_charge: ess
                .max_charge_energy
                .saturating_mul(quarters)
                .min(ess.charge_headroom(ess_initial_energy))
                .max(0),
            ess_max_discharge: ess
                .max_discharge_energy
                .saturating_mul(quarters)
                .min(ess.dischargeable_energy(ess_initial_energy))
                .max(0),
            grid_max_buy: grid.max_buy.saturating_mul(quarters),
            grid_max_sell: grid.max_sell.saturating_mul(quarters),
        }
    }

    /// Reject negative magnitudes
    pub fn validate(&self) -> Result<(), FlowError> {
        let fields = [
            ("production", self.production),
            ("consumption", self.consumption),
            ("ess_max_charge", self.ess_max_charge),
            ("ess_max_discharge", self.ess_max_discharge),
            ("grid_max_buy", self.grid_max_buy),
            ("grid_max_sell", self.grid_max_sell),
        ];
        match fields.iter().find(|(_, value)| *value < 0) {
            Some((name, value)) => Err(FlowError::InvalidInputs(format!(
                "{name} cannot be negative: {value}"
            ))),
            None => Ok(()),
        }
    }
}
