//! Energy flow planner
//!
//! Per-period dispatch model for a site with PV production, consumption, a
//! battery and a grid connection. A [`forecast::PlanningContext`] holds the
//! period sequence of one planning cycle; a [`simulation::Simulator`] runs
//! candidate schedules over it, solving one [`power_flow::EnergyFlowModel`]
//! per period.

pub mod config;
pub mod domain;
pub mod forecast;
pub mod power_flow;
pub mod simulation;
pub mod solver;
pub mod telemetry;
