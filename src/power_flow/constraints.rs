use serde::{Deserialize, Serialize};
use std::fmt;

use super::coefficient::{Coefficient, Row, COEFFICIENT_COUNT};
use super::inputs::ModelInputs;

/// Relational operator of a linear constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    Eq,
    Le,
    Ge,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Eq => write!(f, "="),
            Relation::Le => write!(f, "<="),
            Relation::Ge => write!(f, ">="),
        }
    }
}

/// `Σ weights[c] * c  <relation>  value` over the dense coefficient space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    pub description: String,
    pub weights: Row,
    pub relation: Relation,
    pub value: f64,
}

impl LinearConstraint {
    /// Create a constraint from sparse `(coefficient, weight)` terms
    pub fn new(
        description: impl Into<String>,
        terms: &[(Coefficient, f64)],
        relation: Relation,
        value: f64,
    ) -> Self {
        let mut weights = [0.0; COEFFICIENT_COUNT];
        for &(coefficient, weight) in terms {
            weights[coefficient.index()] += weight;
        }
        Self {
            description: description.into(),
            weights,
            relation,
            value,
        }
    }

    /// Constraint on a single coefficient
    pub fn single(
        description: impl Into<String>,
        coefficient: Coefficient,
        relation: Relation,
        value: f64,
    ) -> Self {
        Self::new(description, &[(coefficient, 1.0)], relation, value)
    }

    /// Left-hand side evaluated at `point`
    pub fn evaluate(&self, point: &Row) -> f64 {
        self.weights.iter().zip(point).map(|(w, x)| w * x).sum()
    }

    /// Whether `point` satisfies the constraint within `tolerance`
    pub fn is_satisfied_by(&self, point: &Row, tolerance: f64) -> bool {
        let lhs = self.evaluate(point);
        match self.relation {
            Relation::Eq => (lhs - self.value).abs() <= tolerance,
            Relation::Le => lhs <= self.value + tolerance,
            Relation::Ge => lhs >= self.value - tolerance,
        }
    }
}

impl fmt::Display for LinearConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for coefficient in Coefficient::ALL {
            let weight = self.weights[coefficient.index()];
            if weight == 0.0 {
                continue;
            }
            let sign = if weight < 0.0 { "-" } else { "+" };
            match (first, weight.abs() == 1.0) {
                (true, true) if weight > 0.0 => write!(f, "{coefficient}")?,
                (true, true) => write!(f, "-{coefficient}")?,
                (true, false) => write!(f, "{weight}*{coefficient}")?,
                (false, true) => write!(f, " {sign} {coefficient}")?,
                (false, false) => write!(f, " {sign} {}*{coefficient}", weight.abs())?,
            }
            first = false;
        }
        if first {
            write!(f, "0")?;
        }
        write!(f, " {} {} [{}]", self.relation, self.value, self.description)
    }
}

/// Conservation laws and non-negativity; independent of any forecast
pub fn structural() -> Vec<LinearConstraint> {
    use Coefficient::*;
    use Relation::*;

    vec![
        LinearConstraint::new(
            "Sum",
            &[(Prod, 1.0), (Ess, 1.0), (Grid, 1.0), (Cons, -1.0)],
            Eq,
            0.0,
        ),
        LinearConstraint::new(
            "Production",
            &[(ProdToCons, 1.0), (ProdToEss, 1.0), (ProdToGrid, 1.0), (Prod, -1.0)],
            Eq,
            0.0,
        ),
        LinearConstraint::new(
            "Consumption",
            &[(EssToCons, 1.0), (GridToCons, 1.0), (ProdToCons, 1.0), (Cons, -1.0)],
            Eq,
            0.0,
        ),
        LinearConstraint::new(
            "Grid",
            &[(GridToCons, 1.0), (GridToEss, 1.0), (ProdToGrid, -1.0), (Grid, -1.0)],
            Eq,
            0.0,
        ),
        LinearConstraint::new(
            "Ess",
            &[(EssToCons, 1.0), (GridToEss, -1.0), (ProdToEss, -1.0), (Ess, -1.0)],
            Eq,
            0.0,
        ),
        LinearConstraint::single("Production to Ess", ProdToEss, Ge, 0.0),
        LinearConstraint::single("Production to Grid", ProdToGrid, Ge, 0.0),
        LinearConstraint::single("Ess to Consumption", EssToCons, Ge, 0.0),
        LinearConstraint::single("Grid to Consumption", GridToCons, Ge, 0.0),
    ]
}

/// Forecast pins and capability bounds of one period
pub fn period_bounds(inputs: &ModelInputs) -> Vec<LinearConstraint> {
    use Coefficient::*;
    use Relation::*;

    let production = f64::from(inputs.production);
    let consumption = f64::from(inputs.consumption);
    vec![
        LinearConstraint::single("Production", Prod, Eq, production),
        LinearConstraint::single("Consumption", Cons, Eq, consumption),
        LinearConstraint::single(
            "Production to Consumption",
            ProdToCons,
            Eq,
            production.min(consumption),
        ),
        LinearConstraint::single("Ess Max Charge", Ess, Ge, -f64::from(inputs.ess_max_charge)),
        LinearConstraint::single("Ess Max Discharge", Ess, Le, f64::from(inputs.ess_max_discharge)),
        LinearConstraint::single("Grid Max Buy", Grid, Le, f64::from(inputs.grid_max_buy)),
        LinearConstraint::single("Grid Max Sell", Grid, Ge, -f64::from(inputs.grid_max_sell)),
    ]
}
