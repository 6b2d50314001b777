use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString};

use crate::domain::{Ess, Grid, PERIODS_PER_HOUR};
use crate::forecast::Period;
use crate::power_flow::{EnergyFlow, EnergyFlowModel, FlowError};

/// What a pin source sees of the period it constrains
#[derive(Debug, Clone, Copy)]
pub struct PeriodContext<'a> {
    pub period: &'a Period,
    pub ess: &'a Ess,
    pub grid: &'a Grid,
    pub ess_initial_energy: i32,
    pub charge_grid_c_rate: f64,
}

/// Operating decision for one period, expressed as pins on its model
pub trait PeriodConstraint: Send + Sync {
    fn apply(&self, model: &mut EnergyFlowModel, ctx: &PeriodContext<'_>) -> Result<(), FlowError>;
}

impl<F> PeriodConstraint for F
where
    F: Fn(&mut EnergyFlowModel, &PeriodContext<'_>) -> Result<(), FlowError> + Send + Sync,
{
    fn apply(&self, model: &mut EnergyFlowModel, ctx: &PeriodContext<'_>) -> Result<(), FlowError> {
        self(model, ctx)
    }
}

/// Time-of-use battery operating modes
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumCount,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EssMode {
    /// Battery balances consumption and production freely
    #[default]
    Balancing,
    /// Battery may charge but must not discharge
    DelayDischarge,
    /// Battery is charged from the grid at the configured C-rate
    ChargeGrid,
}

impl EssMode {
    /// Energy the battery is asked to absorb in `ChargeGrid` for a period
    /// spanning `quarters` quarters
    pub fn charge_grid_energy(ess: &Ess, c_rate: f64, quarters: usize) -> i32 {
        let per_quarter = f64::from(ess.total_energy) * c_rate / PERIODS_PER_HOUR as f64;
        (per_quarter * quarters as f64).round() as i32
    }

    /// Downgrade `mode` to a cheaper mode that yields the same battery flow
    pub fn postprocess(
        mode: EssMode,
        ef_balancing: &EnergyFlow,
        ef_delay_discharge: &EnergyFlow,
        ef_charge_grid: &EnergyFlow,
    ) -> EssMode {
        let mut mode = mode;
        if mode == EssMode::ChargeGrid && ef_charge_grid.ess() >= ef_delay_discharge.ess() {
            mode = EssMode::DelayDischarge;
        }
        if mode == EssMode::DelayDischarge && ef_delay_discharge.ess() >= ef_balancing.ess() {
            mode = EssMode::Balancing;
        }
        mode
    }
}

impl PeriodConstraint for EssMode {
    fn apply(&self, model: &mut EnergyFlowModel, ctx: &PeriodContext<'_>) -> Result<(), FlowError> {
        match self {
            EssMode::Balancing => {}
            EssMode::DelayDischarge => {
                model.set_ess_max_discharge(0)?;
            }
            EssMode::ChargeGrid => {
                let energy = Self::charge_grid_energy(
                    ctx.ess,
                    ctx.charge_grid_c_rate,
                    ctx.period.quarter_count(),
                );
                model.set_ess(-energy)?;
            }
        }
        Ok(())
    }
}
