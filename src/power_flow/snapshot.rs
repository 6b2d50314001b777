use serde::{Deserialize, Serialize};
use std::fmt;

use super::coefficient::{Coefficient, Row, COEFFICIENT_COUNT};

/// Solved flow vector of one period
///
/// Immutable; produced only by a successful solve. Values are whole Wh,
/// rounded once when the solution is read.
///
/// Balance equation: PROD + ESS + GRID = CONS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnergyFlow {
    values: [i32; COEFFICIENT_COUNT],
}

impl EnergyFlow {
    /// Build a flow from explicit values in coefficient order
    pub fn new(values: [i32; COEFFICIENT_COUNT]) -> Self {
        Self { values }
    }

    /// Round an LP solution point to whole units
    pub fn from_solution(point: &Row) -> Self {
        let mut values = [0; COEFFICIENT_COUNT];
        for (value, x) in values.iter_mut().zip(point) {
            *value = x.round() as i32;
        }
        Self { values }
    }

    pub fn get(&self, coefficient: Coefficient) -> i32 {
        self.values[coefficient.index()]
    }

    pub fn values(&self) -> &[i32; COEFFICIENT_COUNT] {
        &self.values
    }

    pub fn prod(&self) -> i32 {
        self.get(Coefficient::Prod)
    }

    pub fn cons(&self) -> i32 {
        self.get(Coefficient::Cons)
    }

    /// Positive = discharging, negative = charging
    pub fn ess(&self) -> i32 {
        self.get(Coefficient::Ess)
    }

    /// Positive = buying, negative = selling
    pub fn grid(&self) -> i32 {
        self.get(Coefficient::Grid)
    }

    pub fn prod_to_cons(&self) -> i32 {
        self.get(Coefficient::ProdToCons)
    }

    pub fn prod_to_grid(&self) -> i32 {
        self.get(Coefficient::ProdToGrid)
    }

    pub fn prod_to_ess(&self) -> i32 {
        self.get(Coefficient::ProdToEss)
    }

    pub fn grid_to_cons(&self) -> i32 {
        self.get(Coefficient::GridToCons)
    }

    pub fn ess_to_cons(&self) -> i32 {
        self.get(Coefficient::EssToCons)
    }

    pub fn grid_to_ess(&self) -> i32 {
        self.get(Coefficient::GridToEss)
    }

    /// Check the node balance and the four split sums
    pub fn verify_balance(&self) -> bool {
        use Coefficient::*;
        let v = |c: Coefficient| i64::from(self.get(c));

        v(Prod) + v(Ess) + v(Grid) == v(Cons)
            && v(ProdToCons) + v(ProdToEss) + v(ProdToGrid) == v(Prod)
            && v(EssToCons) + v(GridToCons) + v(ProdToCons) == v(Cons)
            && v(GridToCons) + v(GridToEss) - v(ProdToGrid) == v(Grid)
            && v(EssToCons) - v(GridToEss) - v(ProdToEss) == v(Ess)
    }

    /// Energy bought from the grid (0 if selling)
    pub fn grid_buy(&self) -> i32 {
        self.grid().max(0)
    }

    /// Energy sold to the grid (0 if buying)
    pub fn grid_sell(&self) -> i32 {
        (-self.grid()).max(0)
    }

    pub fn ess_charge(&self) -> i32 {
        (-self.ess()).max(0)
    }

    pub fn ess_discharge(&self) -> i32 {
        self.ess().max(0)
    }

    /// Production used on site, including what goes into the battery
    pub fn self_consumption(&self) -> i32 {
        (self.prod() - self.prod_to_grid()).clamp(0, self.prod().max(0))
    }

    /// Cost of the grid purchase at `price` per MWh. Selling is not credited.
    pub fn grid_cost(&self, price: f64) -> f64 {
        f64::from(self.grid_buy()) * price / 1_000_000.0
    }
}

impl fmt::Display for EnergyFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnergyFlow {{ ")?;
        for coefficient in Coefficient::ALL {
            write!(f, "{}: {}, ", coefficient, self.get(coefficient))?;
        }
        write!(
            f,
            "Balanced: {} }}",
            if self.verify_balance() { "✓" } else { "✗" }
        )
    }
}
