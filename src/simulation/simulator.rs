use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::mode::{EssMode, PeriodConstraint, PeriodContext};
use super::state::SimulationState;
use super::SimulationError;
use crate::forecast::{Period, PlanningContext};
use crate::power_flow::{EnergyFlow, EnergyFlowModel, FlowError};

/// Outcome of one period of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedPeriod {
    pub index: usize,
    pub time: DateTime<Utc>,
    /// Per MWh
    pub price: f64,
    pub energy_flow: EnergyFlow,
    /// Battery energy at the start of the period
    pub ess_initial_energy: i32,
    /// Grid purchase cost of the period
    pub cost: f64,
}

/// Outcome of one candidate schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub periods: Vec<SimulatedPeriod>,
    pub total_cost: f64,
    /// Battery energy after the last period
    pub final_ess_energy: i32,
}

/// Flows of one period under each [`EssMode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeFlows {
    pub balancing: EnergyFlow,
    pub delay_discharge: EnergyFlow,
    pub charge_grid: EnergyFlow,
}

impl ModeFlows {
    pub fn postprocess(&self, mode: EssMode) -> EssMode {
        EssMode::postprocess(mode, &self.balancing, &self.delay_discharge, &self.charge_grid)
    }
}

/// Evaluates candidate schedules against one planning context
///
/// Cheap to clone; the context is shared read-only. Every run owns its own
/// [`SimulationState`] and builds a fresh model per period, so runs may
/// proceed concurrently on clones of the same simulator.
#[derive(Debug, Clone)]
pub struct Simulator {
    context: Arc<PlanningContext>,
    charge_grid_c_rate: f64,
}

impl Simulator {
    pub fn new(context: Arc<PlanningContext>, charge_grid_c_rate: f64) -> Self {
        Self {
            context,
            charge_grid_c_rate,
        }
    }

    pub fn context(&self) -> &PlanningContext {
        &self.context
    }

    /// Solve one period starting from `ess_initial_energy`, with the pins of
    /// `constraint` applied first
    pub fn simulate_period(
        &self,
        period: &Period,
        ess_initial_energy: i32,
        constraint: Option<&dyn PeriodConstraint>,
    ) -> Result<EnergyFlow, FlowError> {
        let mut model = EnergyFlowModel::from_period(
            period,
            &self.context.ess,
            &self.context.grid,
            ess_initial_energy,
        )?;
        if let Some(constraint) = constraint {
            let ctx = PeriodContext {
                period,
                ess: &self.context.ess,
                grid: &self.context.grid,
                ess_initial_energy,
                charge_grid_c_rate: self.charge_grid_c_rate,
            };
            constraint.apply(&mut model, &ctx)?;
        }
        model.solve()
    }

    /// Run `schedule` over every period of the context.
    ///
    /// `schedule[i]` constrains period `i`; periods beyond the end of the
    /// schedule run without extra pins. The first failing period aborts the
    /// run.
    pub fn simulate<C: PeriodConstraint>(
        &self,
        schedule: &[C],
    ) -> Result<SimulationResult, SimulationError> {
        let mut state = SimulationState::new(self.context.ess.current_energy);
        let mut periods = Vec::with_capacity(self.context.periods.len());

        for (i, period) in self.context.periods.iter().enumerate() {
            let ess_initial_energy = state.initial_energy();
            let constraint = schedule.get(i).map(|c| c as &dyn PeriodConstraint);
            let energy_flow = self
                .simulate_period(period, ess_initial_energy, constraint)
                .map_err(|source| SimulationError::Period {
                    index: period.index(),
                    time: period.time(),
                    source,
                })?;
            state.apply_charge(energy_flow.ess());

            periods.push(SimulatedPeriod {
                index: period.index(),
                time: period.time(),
                price: period.price(),
                energy_flow,
                ess_initial_energy,
                cost: energy_flow.grid_cost(period.price()),
            });
        }

        let total_cost = periods.iter().map(|p| p.cost).sum();
        debug!(
            periods = periods.len(),
            total_cost,
            final_ess_energy = state.initial_energy(),
            "Simulated schedule"
        );
        Ok(SimulationResult {
            periods,
            total_cost,
            final_ess_energy: state.initial_energy(),
        })
    }

    /// Evaluate every [`EssMode`] for one period without advancing any state
    pub fn simulate_period_modes(
        &self,
        period: &Period,
        ess_initial_energy: i32,
    ) -> Result<ModeFlows, FlowError> {
        let run = |mode: EssMode| {
            self.simulate_period(period, ess_initial_energy, Some(&mode as &dyn PeriodConstraint))
        };
        Ok(ModeFlows {
            balancing: run(EssMode::Balancing)?,
            delay_discharge: run(EssMode::DelayDischarge)?,
            charge_grid: run(EssMode::ChargeGrid)?,
        })
    }

    /// Replace each mode of a simulated schedule by the cheapest mode with
    /// the same battery behaviour
    pub fn postprocess_schedule(
        &self,
        schedule: &[EssMode],
        result: &SimulationResult,
    ) -> Result<Vec<EssMode>, SimulationError> {
        self.context
            .periods
            .iter()
            .zip(&result.periods)
            .enumerate()
            .map(|(i, (period, simulated))| {
                let mode = schedule.get(i).copied().unwrap_or_default();
                self.simulate_period_modes(period, simulated.ess_initial_energy)
                    .map(|flows| flows.postprocess(mode))
                    .map_err(|source| SimulationError::Period {
                        index: period.index(),
                        time: period.time(),
                        source,
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Ess, Grid};
    use crate::forecast::QuarterPeriod;
    use crate::power_flow::{Coefficient, Relation};
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn simulator(periods: &[(i32, i32, f64)]) -> Simulator {
        let periods = periods
            .iter()
            .enumerate()
            .map(|(i, &(production, consumption, price))| {
                Period::Quarter(QuarterPeriod::new(
                    i,
                    start() + Duration::minutes(15 * i as i64),
                    production,
                    consumption,
                    price,
                ))
            })
            .collect();
        let ess = Ess {
            current_energy: 3000,
            total_energy: 10000,
            min_soc_energy: 0,
            max_soc_energy: 9000,
            max_charge_energy: 2000,
            max_discharge_energy: 2000,
        };
        let grid = Grid {
            max_buy: 5000,
            max_sell: 5000,
        };
        let context = PlanningContext::new(start(), periods, ess, grid).unwrap();
        Simulator::new(Arc::new(context), 0.5)
    }

    #[test]
    fn test_surplus_then_deficit() {
        let sim = simulator(&[(2000, 1500, 100.0), (0, 1000, 300.0)]);
        let result = sim.simulate::<EssMode>(&[]).unwrap();

        assert_eq!(result.periods.len(), 2);
        assert_eq!(result.periods[0].ess_initial_energy, 3000);
        assert_eq!(result.periods[0].energy_flow.ess(), -500);
        assert_eq!(result.periods[1].ess_initial_energy, 3500);
        assert_eq!(result.periods[1].energy_flow.ess(), 1000);
        assert_eq!(result.periods[1].energy_flow.grid(), 0);
        assert_eq!(result.final_ess_energy, 2500);
        assert_eq!(result.total_cost, 0.0);
    }

    #[test]
    fn test_delay_discharge_buys_from_grid() {
        let sim = simulator(&[(0, 1000, 300.0)]);
        let result = sim.simulate(&[EssMode::DelayDischarge]).unwrap();

        let period = &result.periods[0];
        assert_eq!(period.energy_flow.ess(), 0);
        assert_eq!(period.energy_flow.grid(), 1000);
        assert!((period.cost - 0.3).abs() < 1e-12);
        assert_eq!(result.final_ess_energy, 3000);
    }

    #[test]
    fn test_charge_grid() {
        let sim = simulator(&[(0, 500, 50.0)]);
        let result = sim.simulate(&[EssMode::ChargeGrid]).unwrap();

        let flow = result.periods[0].energy_flow;
        // 10000 Wh * 0.5 C / 4 quarters
        assert_eq!(flow.ess(), -1250);
        assert_eq!(flow.grid(), 1750);
        assert_eq!(flow.grid_to_ess(), 1250);
        assert_eq!(result.final_ess_energy, 4250);
    }

    fn force_idle(model: &mut EnergyFlowModel, _: &PeriodContext<'_>) -> Result<(), FlowError> {
        model
            .set_fitting_coefficient_value(Coefficient::Ess, Relation::Eq, 0.0)
            .map(|_| ())
    }

    #[test]
    fn test_function_as_constraint() {
        let sim = simulator(&[(0, 1000, 100.0)]);
        let result = sim.simulate(&[force_idle]).unwrap();
        assert_eq!(result.periods[0].energy_flow.ess(), 0);
        assert_eq!(result.periods[0].energy_flow.grid(), 1000);
    }

    #[test]
    fn test_failure_aborts_run() {
        let mut sim = simulator(&[(0, 100, 100.0), (0, 50_000, 100.0)]);
        Arc::make_mut(&mut sim.context).ess.current_energy = 0;

        let err = sim.simulate::<EssMode>(&[]).unwrap_err();
        let SimulationError::Period { index, source, .. } = err;
        assert_eq!(index, 1);
        assert!(source.is_infeasible());
    }

    #[test]
    fn test_postprocess_schedule() {
        let sim = simulator(&[(2000, 1500, 100.0), (0, 1000, 300.0)]);
        let schedule = [EssMode::DelayDischarge, EssMode::DelayDischarge];
        let result = sim.simulate(&schedule).unwrap();

        let modes = sim.postprocess_schedule(&schedule, &result).unwrap();
        // Charging from surplus happens in balancing too
        assert_eq!(modes[0], EssMode::Balancing);
        assert_eq!(modes[1], EssMode::DelayDischarge);
    }

    #[test]
    fn test_modes_do_not_advance_state() {
        let sim = simulator(&[(0, 1000, 100.0)]);
        let period = &sim.context().periods[0];
        let flows = sim.simulate_period_modes(period, 3000).unwrap();
        assert_eq!(flows.balancing.ess(), 1000);
        assert_eq!(flows.delay_discharge.ess(), 0);
        assert_eq!(flows.charge_grid.ess(), -1250);
        assert_eq!(flows.postprocess(EssMode::ChargeGrid), EssMode::ChargeGrid);
    }
}
