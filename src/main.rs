use anyhow::{Context, Result};
use chrono::Utc;
use energy_flow_planner::{config, domain, forecast, simulation, telemetry};
use config::Config;
use forecast::PlanningContext;
use simulation::{evaluate_candidates, Candidate, EssMode, Simulator};
use std::sync::Arc;
use std::time::Duration;
use telemetry::init_tracing;
use tracing::{debug, info};

/// Grace period for solves still running when the plan is done
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;
    if std::env::args().any(|arg| arg == "--print-config") {
        print!("{}", toml::to_string_pretty(&cfg)?);
        return Ok(());
    }
    init_tracing(&cfg.logging)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    let outcome = runtime.block_on(plan(cfg));
    // Solves past the execution limit are abandoned rather than awaited
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    outcome
}

async fn plan(cfg: Config) -> Result<()> {
    let now = Utc::now();
    let start = domain::round_down_to_quarter(now);
    let quarters = cfg.planner.horizon_hours as usize * domain::PERIODS_PER_HOUR;
    let forecast = cfg.profile.forecast(start, quarters);

    let context = PlanningContext::build(now, &forecast, &cfg.site.telemetry(), &cfg.planner)
        .context("building planning context")?;
    if !context.is_worth_optimizing() {
        info!("Nothing to gain from optimizing; evaluating anyway");
    }

    let limit = domain::execution_limit_seconds(now);
    info!(
        %start,
        periods = context.periods.len(),
        execution_limit_seconds = limit,
        "Starting energy flow planner"
    );

    let simulator = Simulator::new(Arc::new(context), cfg.planner.charge_grid_c_rate);
    let candidates = candidate_schedules(simulator.context());

    let limit = Duration::from_secs(limit.max(0) as u64);
    let Some(best) = evaluate_candidates(&simulator, candidates, limit).await else {
        anyhow::bail!("no candidate schedule could be simulated");
    };

    let (name, schedule, result) = (&best.candidate.name, &best.candidate.schedule, &best.result);
    let modes = simulator.postprocess_schedule(schedule, result)?;
    let ess = &simulator.context().ess;
    info!(
        candidate = %name,
        total_cost = result.total_cost,
        final_soc_percent = ess.soc_percent(result.final_ess_energy),
        "Cheapest schedule"
    );
    for (period, mode) in result.periods.iter().zip(&modes) {
        info!(
            index = period.index,
            time = %period.time,
            price = period.price,
            %mode,
            ess_initial_energy = period.ess_initial_energy,
            soc_percent = ess.soc_percent(period.ess_initial_energy),
            flow = %period.energy_flow,
            "Planned period"
        );
    }
    debug!(plan = %serde_json::to_string(result)?, "Cheapest schedule as JSON");
    Ok(())
}

/// A handful of time-of-use schedules: uniform modes plus a price-threshold
/// plan that charges in the cheapest periods and holds the battery until the
/// most expensive ones.
fn candidate_schedules(context: &PlanningContext) -> Vec<Candidate<EssMode>> {
    let n = context.periods.len();
    let mut prices = context.periods.iter().map(|p| p.price()).collect::<Vec<_>>();
    prices.sort_by(f64::total_cmp);
    let low = prices.get(n / 4).copied().unwrap_or_default();
    let high = prices.get(n * 3 / 4).copied().unwrap_or_default();

    let threshold = |cheap: EssMode| {
        context
            .periods
            .iter()
            .map(|p| {
                if p.price() <= low {
                    cheap
                } else if p.price() >= high {
                    EssMode::Balancing
                } else {
                    EssMode::DelayDischarge
                }
            })
            .collect::<Vec<_>>()
    };

    vec![
        Candidate::new("balancing", vec![EssMode::Balancing; n]),
        Candidate::new("delay-discharge", vec![EssMode::DelayDischarge; n]),
        Candidate::new("hold-for-peak", threshold(EssMode::DelayDischarge)),
        Candidate::new("charge-cheap", threshold(EssMode::ChargeGrid)),
    ]
}
