use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::iter::Sum;

use super::types::{quarter, QUARTER_MINUTES};

/// Quarter-hour series starting at `start`; `None` marks a missing value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries<T> {
    pub start: DateTime<Utc>,
    pub values: Vec<Option<T>>,
}

impl<T: Copy> TimeSeries<T> {
    pub fn new(start: DateTime<Utc>, values: Vec<Option<T>>) -> Self {
        Self { start, values }
    }

    /// Series without gaps
    pub fn from_values(start: DateTime<Utc>, values: impl IntoIterator<Item = T>) -> Self {
        Self::new(start, values.into_iter().map(Some).collect())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// End of the last covered quarter
    pub fn end(&self) -> DateTime<Utc> {
        self.start + quarter() * self.values.len() as i32
    }

    fn index_of(&self, time: DateTime<Utc>) -> Option<usize> {
        let minutes = (time - self.start).num_minutes();
        if minutes < 0 || minutes % QUARTER_MINUTES != 0 {
            return None;
        }
        usize::try_from(minutes / QUARTER_MINUTES).ok()
    }

    /// Value of the quarter starting at `time`
    pub fn at(&self, time: DateTime<Utc>) -> Option<T> {
        self.index_of(time)
            .and_then(|i| self.values.get(i).copied().flatten())
    }

    /// Values of the quarters in `[from, to)`; `None` if any is missing
    pub fn range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Option<Vec<T>> {
        let mut out = Vec::new();
        let mut time = from;
        while time < to {
            out.push(self.at(time)?);
            time += quarter();
        }
        Some(out)
    }
}

impl<T: Copy + Sum<T>> TimeSeries<T> {
    /// Sum over `[from, to)`; `None` if any quarter is missing
    pub fn sum(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Option<T> {
        self.range(from, to).map(|values| values.into_iter().sum())
    }
}

impl<T: Copy + Into<f64>> TimeSeries<T> {
    /// Average over `[from, to)`; `None` if the range is empty or has gaps
    pub fn average(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Option<f64> {
        let values = self.range(from, to)?;
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        Some(values.into_iter().map(Into::into).sum::<f64>() / n)
    }
}

/// Production, consumption and price forecast of one planning cycle
///
/// Production and consumption are Wh per quarter, prices per MWh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub production: TimeSeries<i32>,
    pub consumption: TimeSeries<i32>,
    pub price: TimeSeries<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_at() {
        let series = TimeSeries::new(start(), vec![Some(1), None, Some(3)]);
        assert_eq!(series.at(start()), Some(1));
        assert_eq!(series.at(start() + Duration::minutes(15)), None);
        assert_eq!(series.at(start() + Duration::minutes(30)), Some(3));
        assert_eq!(series.at(start() + Duration::minutes(45)), None);
        assert_eq!(series.at(start() - Duration::minutes(15)), None);
        assert_eq!(series.at(start() + Duration::minutes(5)), None);
    }

    #[test]
    fn test_sum_and_average() {
        let series = TimeSeries::from_values(start(), [100, 200, 300, 400]);
        let end = start() + Duration::hours(1);
        assert_eq!(series.sum(start(), end), Some(1000));
        assert_eq!(series.average(start(), end), Some(250.0));
        assert_eq!(series.end(), end);
    }

    #[test]
    fn test_gap_fails_aggregate() {
        let series = TimeSeries::new(start(), vec![Some(1.0), None, Some(3.0), Some(4.0)]);
        let end = start() + Duration::hours(1);
        assert_eq!(series.sum(start(), end), None);
        assert_eq!(series.average(start(), end), None);
        assert_eq!(series.average(start(), start()), None);
    }
}
