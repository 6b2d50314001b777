use serde::{Deserialize, Serialize};

use super::types::to_energy;

/// Highest state of charge the planner charges to, in percent
pub const ESS_MAX_SOC_PERCENT: f64 = 90.0;

/// Charge power cap under §14a EnWG controllable-device rules
pub const ESS_LIMIT_14A_ENWG_W: i32 = 4200;

/// Site-specific bounds applied on top of the battery telemetry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EssLimits {
    /// Floor for the reported charge/discharge power
    pub min_power_w: i32,

    /// Reserve kept for emergencies or by a discharge limiter
    pub min_soc_percent: f64,

    /// Charging stops at this state of charge
    pub max_soc_percent: f64,

    /// Cap charge power at [`ESS_LIMIT_14A_ENWG_W`]
    pub limit_charge_14a: bool,
}

impl Default for EssLimits {
    fn default() -> Self {
        Self {
            min_power_w: 1000,
            min_soc_percent: 0.0,
            max_soc_percent: ESS_MAX_SOC_PERCENT,
            limit_charge_14a: false,
        }
    }
}

/// Battery capability record of one planning cycle
///
/// Energies are Wh; the charge/discharge limits are Wh per quarter.
/// Shared read-only by every period's model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ess {
    /// Stored energy right now
    pub current_energy: i32,

    /// Usable capacity
    pub total_energy: i32,

    /// Stored energy that must not be discharged
    pub min_soc_energy: i32,

    /// Stored energy above which the battery is not charged
    pub max_soc_energy: i32,

    /// Energy the battery can absorb per quarter
    pub max_charge_energy: i32,

    /// Energy the battery can deliver per quarter
    pub max_discharge_energy: i32,
}

impl Ess {
    /// Derive the capability record from live telemetry.
    ///
    /// Reported charge/discharge power is floored at `limits.min_power_w` so
    /// that a momentary near-zero limit does not exclude the battery from
    /// planning.
    pub fn from_telemetry(telemetry: &SystemTelemetry, limits: &EssLimits) -> Self {
        let capacity = telemetry.ess_capacity_wh.max(0);
        let share = |percent: f64| {
            (f64::from(capacity) * percent.clamp(0.0, 100.0) / 100.0).round() as i32
        };
        let min_power_w = limits.min_power_w.saturating_abs();

        let mut charge_power_w = telemetry.ess_max_charge_power_w.saturating_abs().max(min_power_w);
        if limits.limit_charge_14a {
            charge_power_w = charge_power_w.min(ESS_LIMIT_14A_ENWG_W);
        }
        let min_soc_energy = share(limits.min_soc_percent);

        Self {
            current_energy: share(telemetry.ess_soc_percent),
            total_energy: telemetry.ess_capacity_wh,
            min_soc_energy,
            max_soc_energy: share(limits.max_soc_percent).max(min_soc_energy),
            max_charge_energy: to_energy(charge_power_w),
            max_discharge_energy: to_energy(
                telemetry.ess_max_discharge_power_w.saturating_abs().max(min_power_w),
            ),
        }
    }

    /// Energy that can still be charged before reaching the maximum SoC
    pub fn charge_headroom(&self, energy: i32) -> i32 {
        self.max_soc_energy.saturating_sub(energy.max(0)).max(0)
    }

    /// Energy that can be discharged without cutting into the reserve
    pub fn dischargeable_energy(&self, energy: i32) -> i32 {
        energy.max(0).saturating_sub(self.min_soc_energy).max(0)
    }

    /// State of charge in percent for a given stored energy
    pub fn soc_percent(&self, energy: i32) -> f64 {
        if self.total_energy <= 0 {
            return 0.0;
        }
        (f64::from(energy) / f64::from(self.total_energy) * 100.0).clamp(0.0, 100.0)
    }
}

/// Live system readings as of "now"
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemTelemetry {
    pub ess_soc_percent: f64,
    pub ess_capacity_wh: i32,

    /// Achievable charge power; sign is ignored
    pub ess_max_charge_power_w: i32,

    /// Achievable discharge power
    pub ess_max_discharge_power_w: i32,

    pub grid_max_buy_power_w: i32,
    pub grid_max_sell_power_w: i32,
}

impl SystemTelemetry {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=100.0).contains(&self.ess_soc_percent) {
            return Err(format!(
                "SoC must be between 0 and 100%, got {}",
                self.ess_soc_percent
            ));
        }
        if self.ess_capacity_wh < 0 {
            return Err(format!(
                "Capacity cannot be negative, got {} Wh",
                self.ess_capacity_wh
            ));
        }
        if self.grid_max_buy_power_w < 0 || self.grid_max_sell_power_w < 0 {
            return Err("Grid limits cannot be negative".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn telemetry() -> SystemTelemetry {
        SystemTelemetry {
            ess_soc_percent: 30.0,
            ess_capacity_wh: 10000,
            ess_max_charge_power_w: -5000,
            ess_max_discharge_power_w: 5000,
            grid_max_buy_power_w: 20000,
            grid_max_sell_power_w: 20000,
        }
    }

    #[test]
    fn test_from_telemetry() {
        let ess = Ess::from_telemetry(&telemetry(), &EssLimits::default());
        assert_eq!(ess.current_energy, 3000);
        assert_eq!(ess.total_energy, 10000);
        assert_eq!(ess.min_soc_energy, 0);
        assert_eq!(ess.max_soc_energy, 9000);
        assert_eq!(ess.max_charge_energy, 1250);
        assert_eq!(ess.max_discharge_energy, 1250);
    }

    #[test]
    fn test_soc_limits() {
        let limits = EssLimits {
            min_soc_percent: 20.0,
            max_soc_percent: 80.0,
            ..EssLimits::default()
        };
        let ess = Ess::from_telemetry(&telemetry(), &limits);
        assert_eq!(ess.min_soc_energy, 2000);
        assert_eq!(ess.max_soc_energy, 8000);

        assert_eq!(ess.charge_headroom(7500), 500);
        assert_eq!(ess.charge_headroom(9500), 0);
        assert_eq!(ess.charge_headroom(-100), 8000);
        assert_eq!(ess.dischargeable_energy(2500), 500);
        assert_eq!(ess.dischargeable_energy(1500), 0);
    }

    #[test]
    fn test_reserve_above_max_soc() {
        let limits = EssLimits {
            min_soc_percent: 95.0,
            ..EssLimits::default()
        };
        let ess = Ess::from_telemetry(&telemetry(), &limits);
        assert_eq!(ess.max_soc_energy, ess.min_soc_energy);
        assert_eq!(ess.charge_headroom(3000), 6500);
    }

    #[test]
    fn test_charge_limit_14a() {
        let t = SystemTelemetry {
            ess_max_charge_power_w: 8000,
            ess_max_discharge_power_w: 8000,
            ..telemetry()
        };
        let limits = EssLimits {
            limit_charge_14a: true,
            ..EssLimits::default()
        };
        let ess = Ess::from_telemetry(&t, &limits);
        assert_eq!(ess.max_charge_energy, 1050);
        assert_eq!(ess.max_discharge_energy, 2000);

        let ess = Ess::from_telemetry(&t, &EssLimits::default());
        assert_eq!(ess.max_charge_energy, 2000);
    }

    #[test]
    fn test_power_floor() {
        let t = SystemTelemetry {
            ess_max_charge_power_w: 0,
            ess_max_discharge_power_w: 200,
            ..telemetry()
        };
        let ess = Ess::from_telemetry(&t, &EssLimits::default());
        assert_eq!(ess.max_charge_energy, 250);
        assert_eq!(ess.max_discharge_energy, 250);
    }

    #[test]
    fn test_soc_percent() {
        let ess = Ess::from_telemetry(&telemetry(), &EssLimits::default());
        assert_eq!(ess.soc_percent(5000), 50.0);
        assert_eq!(ess.soc_percent(-10), 0.0);
    }

    #[test]
    fn test_validate() {
        assert!(telemetry().validate().is_ok());
        let bad = SystemTelemetry {
            ess_soc_percent: 120.0,
            ..telemetry()
        };
        assert!(bad.validate().is_err());
        let bad = SystemTelemetry {
            grid_max_buy_power_w: -1,
            ..telemetry()
        };
        assert!(bad.validate().is_err());
    }
}
