use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::period::{HourPeriod, Period, QuarterPeriod};
use super::provider::ForecastProvider;
use super::PeriodError;
use crate::config::PlannerConfig;
use crate::domain::{
    quarter, quarters_remaining_in_hour, round_down_to_quarter, Ess, Grid, SystemTelemetry,
    PERIODS_PER_HOUR,
};

/// Inputs shared read-only by every candidate schedule of one planning cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningContext {
    pub start: DateTime<Utc>,
    pub periods: Vec<Period>,
    pub ess: Ess,
    pub grid: Grid,
}

impl PlanningContext {
    /// Build the period sequence starting at the quarter containing `now`
    /// and derive the capability records from `telemetry`.
    pub fn build(
        now: DateTime<Utc>,
        forecast: &dyn ForecastProvider,
        telemetry: &SystemTelemetry,
        config: &PlannerConfig,
    ) -> Result<Self, PeriodError> {
        telemetry.validate().map_err(PeriodError::InvalidTelemetry)?;

        let start = round_down_to_quarter(now);
        let cutover = cutover_index(start, config.quarter_horizon_hours);
        let max_quarters = config.max_horizon_hours as usize * PERIODS_PER_HOUR;
        let periods = build_periods(start, forecast, cutover, max_quarters);

        let context = Self::new(
            start,
            periods,
            Ess::from_telemetry(telemetry, &config.ess_limits()),
            Grid::from_telemetry(telemetry),
        )?;
        debug!(
            %start,
            cutover,
            periods = context.periods.len(),
            ess = ?context.ess,
            grid = ?context.grid,
            "Built planning context"
        );
        Ok(context)
    }

    /// Assemble a context from prepared periods; fails if there are none
    pub fn new(
        start: DateTime<Utc>,
        periods: Vec<Period>,
        ess: Ess,
        grid: Grid,
    ) -> Result<Self, PeriodError> {
        if periods.is_empty() {
            warn!(%start, "No usable forecast");
            return Err(PeriodError::EmptySequence { start });
        }
        Ok(Self {
            start,
            periods,
            ess,
            grid,
        })
    }

    /// Whether optimising this cycle can make any difference
    pub fn is_worth_optimizing(&self) -> bool {
        if self.periods.is_empty() {
            warn!("No periods are available");
            return false;
        }
        if self
            .periods
            .iter()
            .all(|p| p.production() == 0 && p.consumption() == 0)
        {
            warn!("Production and consumption forecasts are all zero");
            return false;
        }
        if self.periods.iter().map(Period::price).all_equal() {
            info!("Prices are all the same");
            return false;
        }
        true
    }
}

/// Index of the first hour period: the quarter horizon plus the quarters
/// left in the hour of `start`, so the quarter block ends on a full hour.
pub fn cutover_index(start: DateTime<Utc>, quarter_horizon_hours: u32) -> usize {
    quarter_horizon_hours as usize * PERIODS_PER_HOUR + quarters_remaining_in_hour(start)
}

fn quarter_at(
    index: usize,
    time: DateTime<Utc>,
    forecast: &dyn ForecastProvider,
) -> Option<QuarterPeriod> {
    let consumption = forecast.consumption(time)?;
    let price = forecast.price(time)?;
    let production = forecast.production(time).unwrap_or(0);
    Some(QuarterPeriod::new(index, time, production, consumption, price))
}

fn build_periods(
    start: DateTime<Utc>,
    forecast: &dyn ForecastProvider,
    cutover: usize,
    max_quarters: usize,
) -> Vec<Period> {
    let time_of = |slot: usize| start + quarter() * slot as i32;
    let mut periods = Vec::new();

    for slot in 0..cutover.min(max_quarters) {
        match quarter_at(slot, time_of(slot), forecast) {
            Some(q) => periods.push(Period::Quarter(q)),
            None => {
                debug!(slot, time = %time_of(slot), "Forecast ends within quarter horizon");
                return periods;
            }
        }
    }

    let mut slot = cutover;
    while slot + PERIODS_PER_HOUR <= max_quarters {
        let quarters: Option<Vec<QuarterPeriod>> = (slot..slot + PERIODS_PER_HOUR)
            .map(|s| quarter_at(s, time_of(s), forecast))
            .collect();
        let Some(hour) = quarters.and_then(|qs| HourPeriod::from_quarters(periods.len(), qs))
        else {
            debug!(slot, time = %time_of(slot), "Forecast ends");
            break;
        };
        periods.push(Period::Hour(hour));
        slot += PERIODS_PER_HOUR;
    }
    periods
}
