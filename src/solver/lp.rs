use good_lp::{
    constraint, microlp, variable, Constraint, Expression, ProblemVariables, Solution,
    SolverModel, Variable,
};

use crate::power_flow::{LinearConstraint, Relation, Row, COEFFICIENT_COUNT};

use super::{Goal, LpError, Objective};

/// Optimise `objective` in direction `goal` subject to `constraints`.
///
/// Returns the optimal point in coefficient order. Every coefficient that
/// appears in a constraint or in a linear objective is a free variable; sign
/// restrictions must be expressed as constraints. Coefficients that appear
/// nowhere are reported as 0.
pub fn solve(
    constraints: &[LinearConstraint],
    objective: &Objective,
    goal: Goal,
) -> Result<Row, LpError> {
    if matches!((objective, goal), (Objective::Magnitude(_), Goal::Maximize)) {
        return Err(LpError::NonConvex);
    }

    let mut used = [false; COEFFICIENT_COUNT];
    for c in constraints {
        mark_used(&mut used, &c.weights);
    }
    if let Objective::Linear(weights) = objective {
        mark_used(&mut used, weights);
    }

    let mut vars = ProblemVariables::new();
    let x: Vec<Option<Variable>> = used
        .iter()
        .map(|&is_used| is_used.then(|| vars.add(variable())))
        .collect();

    let mut auxiliary: Vec<Constraint> = Vec::new();
    let objective_expr: Expression = match objective {
        Objective::Linear(weights) => linear(weights, &x),
        Objective::Magnitude(weights) => {
            // t_c >= |c| via t_c >= c and t_c >= -c
            let mut terms = Vec::with_capacity(COEFFICIENT_COUNT);
            for (&weight, xc) in weights.iter().zip(&x) {
                let Some(xc) = *xc else { continue };
                if weight == 0.0 {
                    continue;
                }
                let t = vars.add(variable().min(0.0));
                auxiliary.push(constraint!(t - xc >= 0.0));
                auxiliary.push(constraint!(t + xc >= 0.0));
                terms.push(weight * t);
            }
            terms.into_iter().sum()
        }
    };

    let problem = match goal {
        Goal::Minimize => vars.minimise(objective_expr),
        Goal::Maximize => vars.maximise(objective_expr),
    };

    let mut model = problem.using(microlp);
    for c in constraints {
        model = model.with(to_good_lp(c, &x));
    }
    for c in auxiliary {
        model = model.with(c);
    }

    let solution = model.solve()?;

    let mut point = [0.0; COEFFICIENT_COUNT];
    for (value, xc) in point.iter_mut().zip(&x) {
        if let Some(xc) = xc {
            *value = solution.value(*xc);
        }
    }
    Ok(point)
}

fn mark_used(used: &mut [bool; COEFFICIENT_COUNT], weights: &Row) {
    for (flag, &w) in used.iter_mut().zip(weights) {
        *flag |= w != 0.0;
    }
}

fn linear(weights: &Row, x: &[Option<Variable>]) -> Expression {
    weights
        .iter()
        .zip(x)
        .filter(|(w, _)| **w != 0.0)
        .filter_map(|(&w, &xc)| xc.map(|xc| w * xc))
        .sum()
}

fn to_good_lp(c: &LinearConstraint, x: &[Option<Variable>]) -> Constraint {
    let lhs = linear(&c.weights, x);
    let rhs = c.value;
    match c.relation {
        Relation::Eq => constraint!(lhs == rhs),
        Relation::Le => constraint!(lhs <= rhs),
        Relation::Ge => constraint!(lhs >= rhs),
    }
}
