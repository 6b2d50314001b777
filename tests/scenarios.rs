//! End-to-end planning scenarios

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use energy_flow_planner::config::PlannerConfig;
use energy_flow_planner::domain::{Ess, Forecast, Grid, SystemTelemetry, TimeSeries};
use energy_flow_planner::forecast::{
    cutover_index, Period, PeriodError, PlanningContext, QuarterPeriod, SyntheticProfile,
};
use energy_flow_planner::power_flow::{EnergyFlowModel, ModelInputs};
use energy_flow_planner::simulation::{EssMode, SimulationState, Simulator};

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn telemetry() -> SystemTelemetry {
    SystemTelemetry {
        ess_soc_percent: 30.0,
        ess_capacity_wh: 10000,
        ess_max_charge_power_w: 8000,
        ess_max_discharge_power_w: 8000,
        grid_max_buy_power_w: 20000,
        grid_max_sell_power_w: 20000,
    }
}

#[test]
fn test_surplus_charges_battery_and_advances_state() {
    let inputs = ModelInputs::new(2000, 1500, 2000, 2000, 5000, 5000);
    let flow = EnergyFlowModel::new(inputs).unwrap().solve().unwrap();

    assert_eq!(flow.prod_to_cons(), 1500);
    assert_eq!(flow.prod_to_ess(), 500);
    assert_eq!(flow.ess(), -500);
    assert_eq!(flow.grid(), 0);

    let mut state = SimulationState::new(3000);
    state.apply_charge(flow.ess());
    assert_eq!(state.initial_energy(), 3500);
}

#[test]
fn test_balanced_period_leaves_battery_and_grid_idle() {
    let inputs = ModelInputs::new(1000, 1000, 500, 500, 10000, 10000);
    let flow = EnergyFlowModel::new(inputs).unwrap().solve().unwrap();

    assert_eq!(flow.grid(), 0);
    assert_eq!(flow.ess(), 0);
    assert_eq!(flow.grid_to_cons(), 0);
}

#[test]
fn test_unsuppliable_consumption_is_infeasible() {
    let inputs = ModelInputs::new(0, 1000, 0, 0, 0, 0);
    let err = EnergyFlowModel::new(inputs).unwrap().solve().unwrap_err();
    assert!(err.is_infeasible());
}

#[test]
fn test_cutover_on_the_hour_and_quarter_past() {
    assert_eq!(cutover_index(noon(), 6), 24);
    assert_eq!(cutover_index(noon() + Duration::minutes(15), 6), 27);
}

#[test]
fn test_synthetic_day_plan() {
    let now = noon() + Duration::minutes(7);
    let forecast = SyntheticProfile::default().forecast(noon(), 96);
    let context =
        PlanningContext::build(now, &forecast, &telemetry(), &PlannerConfig::default()).unwrap();

    assert_eq!(context.start, noon());
    assert!(context.is_worth_optimizing());
    assert_eq!(context.periods.iter().filter(|p| !p.is_hour()).count(), 24);
    assert_eq!(context.periods.len(), 24 + 18);

    let simulator = Simulator::new(Arc::new(context), 0.5);
    let result = simulator.simulate::<EssMode>(&[]).unwrap();

    assert_eq!(result.periods.len(), 42);
    for period in &result.periods {
        assert!(period.energy_flow.verify_balance(), "{}", period.energy_flow);
        assert!(period.ess_initial_energy >= 0);
        assert!(period.ess_initial_energy <= 9000);
    }
    for pair in result.periods.windows(2) {
        let expected = (pair[0].ess_initial_energy - pair[0].energy_flow.ess()).max(0);
        assert_eq!(pair[1].ess_initial_energy, expected);
    }
}

#[test]
fn test_delaying_discharge_shifts_it_to_expensive_hours() {
    // Cheap morning, expensive evening, battery can carry only one of them
    let times = |i: i64| noon() + Duration::minutes(15 * i);
    let periods = [(0, 2000, 50.0), (0, 2000, 400.0)]
        .iter()
        .enumerate()
        .map(|(i, &(p, c, price))| Period::Quarter(QuarterPeriod::new(i, times(i as i64), p, c, price)))
        .collect();
    let ess = Ess {
        current_energy: 2000,
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
    let context = PlanningContext::new(noon(), periods, ess, grid).unwrap();
    let simulator = Simulator::new(Arc::new(context), 0.5);

    let balancing = simulator.simulate(&[EssMode::Balancing, EssMode::Balancing]).unwrap();
    let delayed = simulator
        .simulate(&[EssMode::DelayDischarge, EssMode::Balancing])
        .unwrap();

    // 2000 Wh at 400/MWh against 2000 Wh at 50/MWh
    assert!((balancing.total_cost - 0.8).abs() < 1e-9);
    assert!((delayed.total_cost - 0.1).abs() < 1e-9);

    let modes = simulator
        .postprocess_schedule(&[EssMode::DelayDischarge, EssMode::Balancing], &delayed)
        .unwrap();
    assert_eq!(modes, vec![EssMode::DelayDischarge, EssMode::Balancing]);
}

#[test]
fn test_forecast_gap_yields_empty_plan() {
    let forecast = Forecast {
        production: TimeSeries::from_values(noon(), [0; 8]),
        consumption: TimeSeries::new(noon(), vec![None; 8]),
        price: TimeSeries::from_values(noon(), [100.0; 8]),
    };
    let result = PlanningContext::build(noon(), &forecast, &telemetry(), &PlannerConfig::default());
    assert_eq!(result, Err(PeriodError::EmptySequence { start: noon() }));
}

#[test]
fn test_reserve_is_never_discharged() {
    let config = PlannerConfig {
        ess_min_soc_percent: 20.0,
        ..PlannerConfig::default()
    };
    let forecast = Forecast {
        production: TimeSeries::from_values(noon(), [0; 8]),
        consumption: TimeSeries::from_values(noon(), [1500; 8]),
        price: TimeSeries::from_values(noon(), [200.0; 8]),
    };
    let context = PlanningContext::build(noon(), &forecast, &telemetry(), &config).unwrap();
    let simulator = Simulator::new(Arc::new(context), 0.5);
    let result = simulator.simulate::<EssMode>(&[]).unwrap();

    // 3000 Wh stored, 2000 Wh reserved
    let discharged: i32 = result.periods.iter().map(|p| p.energy_flow.ess()).sum();
    assert_eq!(discharged, 1000);
    assert_eq!(result.final_ess_energy, 2000);
    assert!(result.periods.iter().all(|p| p.energy_flow.verify_balance()));
}
