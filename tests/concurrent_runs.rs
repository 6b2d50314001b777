//! Independent schedule runs sharing one planning context

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use energy_flow_planner::config::PlannerConfig;
use energy_flow_planner::domain::SystemTelemetry;
use energy_flow_planner::forecast::{PlanningContext, SyntheticProfile};
use energy_flow_planner::simulation::{EssMode, Simulator};
use strum::IntoEnumIterator;
use tokio::task::JoinSet;

fn simulator() -> Simulator {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 4, 0, 0).unwrap();
    let forecast = SyntheticProfile::default().forecast(start, 48);
    let telemetry = SystemTelemetry {
        ess_soc_percent: 50.0,
        ess_capacity_wh: 12000,
        ess_max_charge_power_w: 6000,
        ess_max_discharge_power_w: 6000,
        grid_max_buy_power_w: 17250,
        grid_max_sell_power_w: 17250,
    };
    let config = PlannerConfig {
        quarter_horizon_hours: 2,
        ..PlannerConfig::default()
    };
    let context = PlanningContext::build(start, &forecast, &telemetry, &config).unwrap();
    Simulator::new(Arc::new(context), 0.5)
}

/// Schedules that differ per run so interleaved state would show up
fn schedules(n: usize) -> Vec<Vec<EssMode>> {
    (0..12)
        .map(|run| {
            (0..n)
                .map(|i| EssMode::iter().nth((run + i) % 3).unwrap_or_default())
                .collect()
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_match_sequential_runs() {
    let simulator = simulator();
    let schedules = schedules(simulator.context().periods.len());

    let sequential = schedules
        .iter()
        .map(|s| simulator.simulate(s).unwrap())
        .collect::<Vec<_>>();

    let mut runs = JoinSet::new();
    for (i, schedule) in schedules.into_iter().enumerate() {
        let simulator = simulator.clone();
        runs.spawn_blocking(move || (i, simulator.simulate(&schedule)));
    }

    let mut seen = 0;
    while let Some(joined) = runs.join_next().await {
        let (i, result) = joined.unwrap();
        assert_eq!(result.unwrap(), sequential[i]);
        seen += 1;
    }
    assert_eq!(seen, sequential.len());
}
