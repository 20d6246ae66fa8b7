//! Health strategies: reduce a body's wound, organ and blood state into a status
//!
//! Every evaluation is a pure function of the body as it is now, so it can be
//! recomputed after each mutation and always gives the same answer for the
//! same state.

use serde::{Deserialize, Serialize};

use crate::anatomy::BodyGraph;
use crate::core::config::EngineConfig;
use crate::entity::Body;

/// Discrete health status, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Hurt,
    Critical,
    Unconscious,
    Dead,
}

impl HealthState {
    pub fn display_name(&self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::Hurt => "hurt",
            HealthState::Critical => "critically injured",
            HealthState::Unconscious => "unconscious",
            HealthState::Dead => "dead",
        }
    }

    pub fn is_alive(&self) -> bool {
        *self != HealthState::Dead
    }
}

/// Policy bound to a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum HealthStrategy {
    /// Dies of vital organ damage or blood loss
    Standard,
    /// Never worse than `ceiling` (plot-protected characters)
    NoDeath { ceiling: HealthState },
}

impl Default for HealthStrategy {
    fn default() -> Self {
        HealthStrategy::Standard
    }
}

impl HealthStrategy {
    pub fn evaluate_status(&self, body: &Body, graph: &BodyGraph, config: &EngineConfig) -> HealthState {
        let status = standard_status(body, graph, config);
        match self {
            HealthStrategy::Standard => status,
            HealthStrategy::NoDeath { ceiling } => status.min(*ceiling),
        }
    }

    pub fn evaluate_can_act(&self, body: &Body, graph: &BodyGraph, config: &EngineConfig) -> bool {
        self.evaluate_status(body, graph, config) < HealthState::Unconscious
    }

    pub fn evaluate_death(&self, body: &Body, graph: &BodyGraph, config: &EngineConfig) -> bool {
        self.evaluate_status(body, graph, config) == HealthState::Dead
    }

    /// Damage healed per hour on each untreated wound
    pub fn healing_rate(&self, config: &EngineConfig) -> f64 {
        config.base_healing_per_hour
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            HealthStrategy::Standard => "standard",
            HealthStrategy::NoDeath { .. } => "no death",
        }
    }
}

fn standard_status(body: &Body, graph: &BodyGraph, config: &EngineConfig) -> HealthState {
    let blood = body.blood_fraction();
    let aggregate = body.aggregate(config);

    // Worst fraction of max life taken on any vital part; severed counts as destroyed
    let vital_damage = graph
        .vital_parts()
        .map(|part| {
            if body.is_severed(part.id) {
                f64::INFINITY
            } else {
                body.wounds().damage_on(part.id) / part.max_life
            }
        })
        .fold(0.0_f64, f64::max);

    if blood <= config.lethal_blood_fraction || vital_damage >= config.vital_lethal_fraction {
        return HealthState::Dead;
    }

    if blood < config.unconscious_blood_fraction
        || aggregate.stun >= config.unconscious_stun
        || aggregate.shock >= config.unconscious_shock
    {
        return HealthState::Unconscious;
    }

    if blood < config.critical_blood_fraction
        || aggregate.pain >= config.critical_pain
        || vital_damage >= config.critical_vital_fraction
    {
        return HealthState::Critical;
    }

    let open_wounds = body.wounds().wounds().iter().any(|w| !w.is_healed());
    if open_wounds || !body.severed_parts().is_empty() || aggregate.pain > 0.0 {
        return HealthState::Hurt;
    }

    HealthState::Healthy
}
