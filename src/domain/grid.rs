use serde::{Deserialize, Serialize};

use super::battery::SystemTelemetry;
use super::types::to_energy;

/// Grid connection limits as Wh per quarter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub max_buy: i32,
    pub max_sell: i32,
}

impl Grid {
    pub fn from_telemetry(telemetry: &SystemTelemetry) -> Self {
        Self {
            max_buy: to_energy(telemetry.grid_max_buy_power_w.max(0)),
            max_sell: to_energy(telemetry.grid_max_sell_power_w.max(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_telemetry() {
        let telemetry = SystemTelemetry {
            ess_soc_percent: 50.0,
            ess_capacity_wh: 10000,
            ess_max_charge_power_w: 5000,
            ess_max_discharge_power_w: 5000,
            grid_max_buy_power_w: 17250,
            grid_max_sell_power_w: 0,
        };
        let grid = Grid::from_telemetry(&telemetry);
        assert_eq!(grid.max_buy, 4312);
        assert_eq!(grid.max_sell, 0);
    }
}
