use chrono::{DateTime, Utc};

use crate::domain::Forecast;

/// Source of quarter-hour forecasts
///
/// Every lookup is keyed by the start of a quarter and returns `None` when
/// no value exists for that quarter.
pub trait ForecastProvider: Send + Sync {
    /// Production in Wh for the quarter starting at `time`
    fn production(&self, time: DateTime<Utc>) -> Option<i32>;

    /// Consumption in Wh for the quarter starting at `time`
    fn consumption(&self, time: DateTime<Utc>) -> Option<i32>;

    /// Price per MWh for the quarter starting at `time`
    fn price(&self, time: DateTime<Utc>) -> Option<f64>;
}

impl ForecastProvider for Forecast {
    fn production(&self, time: DateTime<Utc>) -> Option<i32> {
        self.production.at(time)
    }

    fn consumption(&self, time: DateTime<Utc>) -> Option<i32> {
        self.consumption.at(time)
    }

    fn price(&self, time: DateTime<Utc>) -> Option<f64> {
        self.price.at(time)
    }
}
