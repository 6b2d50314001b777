use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::{EssLimits, SystemTelemetry, ESS_MAX_SOC_PERCENT};
use crate::forecast::SyntheticProfile;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub planner: PlannerConfig,
    #[validate(nested)]
    pub logging: LoggingConfig,
    #[validate(nested)]
    pub site: SiteConfig,
    #[validate(nested)]
    pub profile: SyntheticProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PlannerConfig {
    /// Hours planned at quarter resolution before switching to hours
    #[validate(range(max = 48))]
    pub quarter_horizon_hours: u32,
    /// Floor for the reported battery charge/discharge power
    #[validate(range(min = 0))]
    pub min_ess_power_w: i32,
    /// Charge rate of grid charging as a fraction of capacity per hour
    #[validate(range(min = 0.0, max = 4.0))]
    pub charge_grid_c_rate: f64,
    /// Length of the demo forecast
    #[validate(range(min = 1, max = 168))]
    pub horizon_hours: u32,
    /// Hard cap on the period sequence
    #[validate(range(min = 1, max = 168))]
    pub max_horizon_hours: u32,
    /// Reserve the plan never discharges into
    #[validate(range(min = 0.0, max = 100.0))]
    pub ess_min_soc_percent: f64,
    /// State of charge the plan never charges beyond
    #[validate(range(min = 0.0, max = 100.0))]
    pub ess_max_soc_percent: f64,
    /// Apply the §14a EnWG charge power cap
    pub limit_charge_14a: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            quarter_horizon_hours: 6,
            min_ess_power_w: 1000,
            charge_grid_c_rate: 0.5,
            horizon_hours: 24,
            max_horizon_hours: 48,
            ess_min_soc_percent: 0.0,
            ess_max_soc_percent: ESS_MAX_SOC_PERCENT,
            limit_charge_14a: false,
        }
    }
}

impl PlannerConfig {
    pub fn ess_limits(&self) -> EssLimits {
        EssLimits {
            min_power_w: self.min_ess_power_w,
            min_soc_percent: self.ess_min_soc_percent,
            max_soc_percent: self.ess_max_soc_percent,
            limit_charge_14a: self.limit_charge_14a,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoggingConfig {
    #[validate(length(min = 1))]
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Telemetry of the demo site
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SiteConfig {
    #[validate(range(min = 0))]
    pub ess_capacity_wh: i32,
    #[validate(range(min = 0.0, max = 100.0))]
    pub ess_soc_percent: f64,
    pub ess_max_charge_power_w: i32,
    pub ess_max_discharge_power_w: i32,
    #[validate(range(min = 0))]
    pub grid_max_buy_power_w: i32,
    #[validate(range(min = 0))]
    pub grid_max_sell_power_w: i32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            ess_capacity_wh: 10000,
            ess_soc_percent: 30.0,
            ess_max_charge_power_w: 5000,
            ess_max_discharge_power_w: 5000,
            grid_max_buy_power_w: 17250,
            grid_max_sell_power_w: 17250,
        }
    }
}

impl SiteConfig {
    pub fn telemetry(&self) -> SystemTelemetry {
        SystemTelemetry {
            ess_soc_percent: self.ess_soc_percent,
            ess_capacity_wh: self.ess_capacity_wh,
            ess_max_charge_power_w: self.ess_max_charge_power_w,
            ess_max_discharge_power_w: self.ess_max_discharge_power_w,
            grid_max_buy_power_w: self.grid_max_buy_power_w,
            grid_max_sell_power_w: self.grid_max_sell_power_w,
        }
    }
}

impl Config {
    /// Defaults, then `config/default.toml`, then `PLANNER__*` environment
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("PLANNER__").split("__")),
        )
    }

    /// Extract and validate on top of the built-in defaults
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(figment)
            .extract()?;
        config.validate()?;
        Ok(config)
    }
}
