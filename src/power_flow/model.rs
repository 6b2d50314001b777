use std::fmt;
use tracing::{debug, trace, warn};

use super::coefficient::{Coefficient, Row, COEFFICIENT_COUNT};
use super::constraints::{self, LinearConstraint, Relation};
use super::inputs::ModelInputs;
use super::snapshot::EnergyFlow;
use super::FlowError;
use crate::domain::{Ess, Grid};
use crate::forecast::Period;
use crate::solver::{self, Goal, Objective};

/// Values within this distance of zero count as zero when branching on
/// the battery's discharge capability.
const ZERO_TOLERANCE: f64 = 1e-6;

/// Weights of the final tie-breaking minimisation. Export carries a higher
/// weight so surplus production goes into the battery before the grid.
const TIE_BREAK_WEIGHTS: Row = {
    let mut weights = [1.0; COEFFICIENT_COUNT];
    weights[Coefficient::ProdToGrid.index()] = 1.5;
    weights
};

/// Smallest whole value not below `x`, ignoring solver noise
fn whole_at_least(x: f64) -> f64 {
    (x - ZERO_TOLERANCE).ceil()
}

/// Largest whole value not above `x`, ignoring solver noise
fn whole_at_most(x: f64) -> f64 {
    (x + ZERO_TOLERANCE).floor()
}

/// Flow balance model of one period
///
/// Holds the structural conservation laws, the period's forecast pins and
/// capability bounds, plus any pins added by the caller. Consumed by
/// [`EnergyFlowModel::solve`]; a model is never reused across periods.
#[derive(Debug, Clone)]
pub struct EnergyFlowModel {
    inputs: ModelInputs,
    constraints: Vec<LinearConstraint>,
}

impl EnergyFlowModel {
    /// Create a model seeded with the structural constraints and the bounds
    /// derived from `inputs`
    pub fn new(inputs: ModelInputs) -> Result<Self, FlowError> {
        inputs.validate()?;

        let mut constraints = constraints::structural();
        constraints.extend(constraints::period_bounds(&inputs));
        Ok(Self {
            inputs,
            constraints,
        })
    }

    /// Create the model of `period` given the battery energy at its start
    pub fn from_period(
        period: &Period,
        ess: &Ess,
        grid: &Grid,
        ess_initial_energy: i32,
    ) -> Result<Self, FlowError> {
        Self::new(ModelInputs::for_period(period, ess, grid, ess_initial_energy))
    }

    pub fn inputs(&self) -> &ModelInputs {
        &self.inputs
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Minimum or maximum value `coefficient` can take under the current
    /// constraints
    pub fn get_extreme_coefficient_value(
        &self,
        coefficient: Coefficient,
        goal: Goal,
    ) -> Result<f64, FlowError> {
        let point = solver::solve(
            &self.constraints,
            &Objective::coefficient(coefficient),
            goal,
        )
        .map_err(|source| FlowError::Extreme {
            coefficient,
            goal,
            source,
        })?;
        Ok(point[coefficient.index()])
    }

    /// Pin `coefficient <relation> value`, clamping `value` into the
    /// currently feasible range first.
    ///
    /// Pins are whole units so that the rounded solution still balances.
    /// Returns the value that was applied. If either extreme query fails the
    /// model is left unchanged.
    pub fn set_fitting_coefficient_value(
        &mut self,
        coefficient: Coefficient,
        relation: Relation,
        value: f64,
    ) -> Result<f64, FlowError> {
        let min = whole_at_least(self.get_extreme_coefficient_value(coefficient, Goal::Minimize)?);
        let value_rounded = value.round();
        let applied = if value_rounded <= min {
            min
        } else {
            let max =
                whole_at_most(self.get_extreme_coefficient_value(coefficient, Goal::Maximize)?);
            if value_rounded > max {
                max.max(min)
            } else {
                value_rounded
            }
        };

        if applied != value {
            trace!(
                %coefficient,
                %relation,
                requested = value,
                applied,
                "Clamped pin into feasible range"
            );
        }

        let description = format!("{coefficient} {relation} {applied}");
        self.constraints.push(LinearConstraint::single(
            description,
            coefficient,
            relation,
            applied,
        ));
        Ok(applied)
    }

    /// Pin the battery flow (positive = discharge)
    pub fn set_ess(&mut self, value: i32) -> Result<f64, FlowError> {
        self.set_fitting_coefficient_value(Coefficient::Ess, Relation::Eq, f64::from(value))
    }

    /// Limit charging to `value`
    pub fn set_ess_max_charge(&mut self, value: i32) -> Result<f64, FlowError> {
        self.set_fitting_coefficient_value(Coefficient::Ess, Relation::Ge, -f64::from(value))
    }

    /// Limit discharging to `value`
    pub fn set_ess_max_discharge(&mut self, value: i32) -> Result<f64, FlowError> {
        self.set_fitting_coefficient_value(Coefficient::Ess, Relation::Le, f64::from(value))
    }

    /// Limit buying from the grid to `value`
    pub fn set_grid_max_buy(&mut self, value: i32) -> Result<f64, FlowError> {
        self.set_fitting_coefficient_value(Coefficient::Grid, Relation::Le, f64::from(value))
    }

    /// Limit selling to the grid to `value`
    pub fn set_grid_max_sell(&mut self, value: i32) -> Result<f64, FlowError> {
        self.set_fitting_coefficient_value(Coefficient::Grid, Relation::Ge, -f64::from(value))
    }

    /// Distribute the period's energy.
    ///
    /// Battery first: when the battery may discharge, it covers as much
    /// consumption as it can before the grid does; when it cannot, it
    /// contributes nothing to consumption and may only be charged. The
    /// remaining freedom is resolved by minimising the weighted magnitude of
    /// all coefficients.
    pub fn solve(mut self) -> Result<EnergyFlow, FlowError> {
        match self.distribute() {
            Ok(point) => Ok(EnergyFlow::from_solution(&point)),
            Err(err) => {
                if err.is_infeasible() {
                    warn!(error = %err, inputs = ?self.inputs, "Energy flow model is infeasible");
                } else {
                    warn!(error = %err, inputs = ?self.inputs, "Unable to solve energy flow model");
                }
                Err(err)
            }
        }
    }

    fn distribute(&mut self) -> Result<Row, FlowError> {
        use Coefficient::*;

        let ess_max = self.get_extreme_coefficient_value(Ess, Goal::Maximize)?;

        if ess_max <= ZERO_TOLERANCE {
            self.constraints.push(LinearConstraint::single(
                "Ess cannot discharge: Grid to Ess",
                GridToEss,
                Relation::Ge,
                0.0,
            ));
            self.constraints.push(LinearConstraint::single(
                "Ess cannot discharge: Ess to Consumption",
                EssToCons,
                Relation::Eq,
                0.0,
            ));
        }

        if ess_max >= -ZERO_TOLERANCE {
            let ess_max_to_cons = self.get_extreme_coefficient_value(EssToCons, Goal::Maximize)?;
            self.constraints.push(LinearConstraint::single(
                "Ess to Consumption first",
                EssToCons,
                Relation::Eq,
                whole_at_most(ess_max_to_cons.min(ess_max)).max(0.0),
            ));
        }

        solver::solve(
            &self.constraints,
            &Objective::Magnitude(TIE_BREAK_WEIGHTS),
            Goal::Minimize,
        )
        .map_err(FlowError::Distribution)
    }

    /// Dump every constraint at debug level
    pub fn log_constraints(&self) {
        for (i, constraint) in self.constraints.iter().enumerate() {
            debug!(index = i, "{constraint}");
        }
    }

    /// Dump the feasible range of every coefficient at debug level
    pub fn log_min_max_values(&self) {
        for coefficient in Coefficient::ALL {
            let min = self.get_extreme_coefficient_value(coefficient, Goal::Minimize);
            let max = self.get_extreme_coefficient_value(coefficient, Goal::Maximize);
            match (min, max) {
                (Ok(min), Ok(max)) => debug!(%coefficient, min, max, "Feasible range"),
                (Err(err), _) | (_, Err(err)) => {
                    debug!(%coefficient, error = %err, "Feasible range unavailable")
                }
            }
        }
    }
}

impl fmt::Display for EnergyFlowModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "EnergyFlowModel {{ production: {}, consumption: {}, ess: -{}..{}, grid: -{}..{} }}",
            self.inputs.production,
            self.inputs.consumption,
            self.inputs.ess_max_charge,
            self.inputs.ess_max_discharge,
            self.inputs.grid_max_sell,
            self.inputs.grid_max_buy,
        )?;
        for constraint in &self.constraints {
            writeln!(f, "  {constraint}")?;
        }
        Ok(())
    }
}
