//! Wounds, infections and the strategies that turn them into a health status

pub mod describe;
pub mod infection;
pub mod strategy;
pub mod tracker;
pub mod wound;

pub use infection::{Infection, InfectionKind, InfectionSimulator, InfectionState, InfectionTick, SystemicEffect};
pub use strategy::{HealthState, HealthStrategy};
pub use tracker::{HealingContext, WoundAggregate, WoundTick, WoundTracker};
pub use wound::{Treatment, Treatments, Wound};
