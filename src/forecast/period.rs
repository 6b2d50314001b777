use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{quarter, PERIODS_PER_HOUR};

/// One forecast quarter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterPeriod {
    /// Position of the quarter counted from the start of the cycle
    pub index: usize,
    pub time: DateTime<Utc>,
    /// Wh
    pub production: i32,
    /// Wh
    pub consumption: i32,
    /// Per MWh
    pub price: f64,
}

impl QuarterPeriod {
    pub fn new(
        index: usize,
        time: DateTime<Utc>,
        production: i32,
        consumption: i32,
        price: f64,
    ) -> Self {
        Self {
            index,
            time,
            production,
            consumption,
            price,
        }
    }
}

/// Four consecutive quarters aggregated into one hour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourPeriod {
    /// Position of the hour in the period sequence
    pub index: usize,
    pub time: DateTime<Utc>,
    /// Sum over the quarters
    pub production: i32,
    /// Sum over the quarters
    pub consumption: i32,
    /// Average over the quarters
    pub price: f64,
    pub quarters: Vec<QuarterPeriod>,
}

fn saturating_total(values: impl Iterator<Item = i32>) -> i32 {
    values.fold(0, i32::saturating_add)
}

impl HourPeriod {
    /// Aggregate exactly [`PERIODS_PER_HOUR`] consecutive quarters
    pub fn from_quarters(index: usize, quarters: Vec<QuarterPeriod>) -> Option<Self> {
        if quarters.len() != PERIODS_PER_HOUR {
            return None;
        }
        let consecutive = quarters
            .windows(2)
            .all(|pair| pair[1].time - pair[0].time == quarter());
        if !consecutive {
            return None;
        }

        let time = quarters.first()?.time;
        let production = saturating_total(quarters.iter().map(|q| q.production));
        let consumption = saturating_total(quarters.iter().map(|q| q.consumption));
        let price = quarters.iter().map(|q| q.price).sum::<f64>() / quarters.len() as f64;
        Some(Self {
            index,
            time,
            production,
            consumption,
            price,
            quarters,
        })
    }
}

/// A planning period: a single quarter near-term, an hour further out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Period {
    Quarter(QuarterPeriod),
    Hour(HourPeriod),
}

impl Period {
    pub fn index(&self) -> usize {
        match self {
            Period::Quarter(q) => q.index,
            Period::Hour(h) => h.index,
        }
    }

    pub fn time(&self) -> DateTime<Utc> {
        match self {
            Period::Quarter(q) => q.time,
            Period::Hour(h) => h.time,
        }
    }

    pub fn production(&self) -> i32 {
        match self {
            Period::Quarter(q) => q.production,
            Period::Hour(h) => h.production,
        }
    }

    pub fn consumption(&self) -> i32 {
        match self {
            Period::Quarter(q) => q.consumption,
            Period::Hour(h) => h.consumption,
        }
    }

    pub fn price(&self) -> f64 {
        match self {
            Period::Quarter(q) => q.price,
            Period::Hour(h) => h.price,
        }
    }

    /// Underlying quarters; a quarter period is its own single quarter
    pub fn quarters(&self) -> &[QuarterPeriod] {
        match self {
            Period::Quarter(q) => std::slice::from_ref(q),
            Period::Hour(h) => &h.quarters,
        }
    }

    pub fn quarter_count(&self) -> usize {
        self.quarters().len()
    }

    pub fn duration(&self) -> Duration {
        quarter() * self.quarter_count() as i32
    }

    pub fn is_hour(&self) -> bool {
        matches!(self, Period::Hour(_))
    }
}
