use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::{quarter, to_energy, Forecast, TimeSeries};

/// Shape of the generated demo forecast
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SyntheticProfile {
    #[validate(range(min = 0.0))]
    pub pv_peak_w: f64,
    #[validate(range(min = 0.0, max = 24.0))]
    pub sunrise_hour: f64,
    #[validate(range(min = 0.0, max = 24.0))]
    pub sunset_hour: f64,
    #[validate(range(min = 0.0))]
    pub base_load_w: f64,
    #[validate(range(min = 0.0))]
    pub evening_peak_w: f64,
    pub night_price: f64,
    pub day_price: f64,
    pub evening_price: f64,
}

impl Default for SyntheticProfile {
    fn default() -> Self {
        Self {
            pv_peak_w: 6000.0,
            sunrise_hour: 6.0,
            sunset_hour: 20.0,
            base_load_w: 400.0,
            evening_peak_w: 2500.0,
            night_price: 80.0,
            day_price: 180.0,
            evening_price: 320.0,
        }
    }
}

impl SyntheticProfile {
    /// PV power at fractional hour-of-day `h`
    pub fn production_w(&self, h: f64) -> f64 {
        if h < self.sunrise_hour || h > self.sunset_hour {
            return 0.0;
        }
        let day_len = (self.sunset_hour - self.sunrise_hour).max(0.01);
        let x = (h - self.sunrise_hour) / day_len;
        (std::f64::consts::PI * x).sin().max(0.0) * self.pv_peak_w
    }

    /// Household power at fractional hour-of-day `h`
    pub fn consumption_w(&self, h: f64) -> f64 {
        let morning = bump(h, 7.5, 1.0) * self.evening_peak_w * 0.4;
        let evening = bump(h, 19.0, 1.5) * self.evening_peak_w;
        self.base_load_w + morning + evening
    }

    /// Three-level time-of-use price at hour-of-day `hour`
    pub fn price(&self, hour: u32) -> f64 {
        match hour {
            0..=5 | 22..=23 => self.night_price,
            17..=21 => self.evening_price,
            _ => self.day_price,
        }
    }

    /// Generate `quarters` quarters of forecast starting at `start`
    pub fn forecast(&self, start: DateTime<Utc>, quarters: usize) -> Forecast {
        let times = (0..quarters)
            .map(|i| start + quarter() * i as i32)
            .collect::<Vec<_>>();
        let hour_of_day =
            |t: &DateTime<Utc>| f64::from(t.hour()) + f64::from(t.minute()) / 60.0;

        Forecast {
            production: TimeSeries::from_values(
                start,
                times
                    .iter()
                    .map(|t| to_energy(self.production_w(hour_of_day(t)).round() as i32)),
            ),
            consumption: TimeSeries::from_values(
                start,
                times
                    .iter()
                    .map(|t| to_energy(self.consumption_w(hour_of_day(t)).round() as i32)),
            ),
            price: TimeSeries::from_values(start, times.iter().map(|t| self.price(t.hour()))),
        }
    }
}

/// Gaussian bump of height 1 centred on `center`
fn bump(h: f64, center: f64, width: f64) -> f64 {
    (-((h - center) / width).powi(2)).exp()
}
