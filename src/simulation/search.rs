use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::mode::PeriodConstraint;
use super::simulator::{SimulationResult, Simulator};

/// A named schedule to evaluate
#[derive(Debug, Clone)]
pub struct Candidate<C> {
    pub name: String,
    pub schedule: Vec<C>,
}

impl<C> Candidate<C> {
    pub fn new(name: impl Into<String>, schedule: Vec<C>) -> Self {
        Self {
            name: name.into(),
            schedule,
        }
    }
}

/// A candidate together with its simulated outcome
#[derive(Debug, Clone)]
pub struct Evaluated<C> {
    pub candidate: Candidate<C>,
    pub result: SimulationResult,
}

/// Simulate every candidate on the blocking pool and return the cheapest one
/// finished within `limit`.
///
/// Candidates still queued when the limit is reached are cancelled. Solves
/// already running cannot be interrupted; their results are discarded and the
/// caller should shut the runtime down with a timeout instead of waiting for
/// them.
pub async fn evaluate_candidates<C>(
    simulator: &Simulator,
    candidates: Vec<Candidate<C>>,
    limit: Duration,
) -> Option<Evaluated<C>>
where
    C: PeriodConstraint + 'static,
{
    let mut runs = JoinSet::new();
    for candidate in candidates {
        let simulator = simulator.clone();
        runs.spawn_blocking(move || {
            let result = simulator.simulate(&candidate.schedule);
            (candidate, result)
        });
    }

    let mut best: Option<Evaluated<C>> = None;
    let collect = async {
        while let Some(joined) = runs.join_next().await {
            let (candidate, result) = match joined {
                Ok(run) => run,
                Err(err) => {
                    warn!(error = %err, "Candidate task failed");
                    continue;
                }
            };
            match result {
                Ok(result) => {
                    info!(
                        candidate = %candidate.name,
                        total_cost = result.total_cost,
                        final_ess_energy = result.final_ess_energy,
                        "Candidate evaluated"
                    );
                    if best
                        .as_ref()
                        .map_or(true, |b| result.total_cost < b.result.total_cost)
                    {
                        best = Some(Evaluated { candidate, result });
                    }
                }
                Err(err) => warn!(candidate = %candidate.name, error = %err, "Candidate failed"),
            }
        }
    };

    if tokio::time::timeout(limit, collect).await.is_err() {
        warn!(
            limit_ms = limit.as_millis() as u64,
            pending = runs.len(),
            "Execution limit reached"
        );
        runs.abort_all();
    }
    best
}
