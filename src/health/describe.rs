//! Presentation text for wounds and infections
//!
//! Purely descriptive; nothing here feeds back into the simulation.

use super::infection::{Infection, InfectionState};
use super::strategy::HealthState;
use super::wound::Wound;
use crate::anatomy::BodypartPrototype;
use crate::core::types::DamageType;

/// Severity band of a wound relative to its bodypart's max life
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WoundSeverity {
    Superficial,
    Minor,
    Moderate,
    Severe,
    Grievous,
}

impl WoundSeverity {
    pub fn from_damage_ratio(ratio: f64) -> Self {
        if ratio >= 0.8 {
            Self::Grievous
        } else if ratio >= 0.5 {
            Self::Severe
        } else if ratio >= 0.25 {
            Self::Moderate
        } else if ratio >= 0.1 {
            Self::Minor
        } else {
            Self::Superficial
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Superficial => "superficial",
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
            Self::Grievous => "grievous",
        }
    }
}

/// Noun for the kind of wound a damage type leaves
pub fn wound_noun(damage_type: DamageType) -> &'static str {
    match damage_type {
        DamageType::Slashing => "cut",
        DamageType::Chopping => "gash",
        DamageType::Crushing => "bruise",
        DamageType::Piercing => "puncture",
        DamageType::Ballistic => "gunshot wound",
        DamageType::Burning => "burn",
        DamageType::Freezing => "frostbite",
        DamageType::Chemical => "chemical burn",
        DamageType::Shockwave => "concussion",
        DamageType::Bite => "bite",
        DamageType::Claw => "laceration",
        DamageType::Electrical => "electrical burn",
        DamageType::Hypoxia => "hypoxic injury",
        DamageType::Cellular => "cellular damage",
    }
}

pub fn severity_of(wound: &Wound, part: &BodypartPrototype) -> WoundSeverity {
    WoundSeverity::from_damage_ratio(wound.current_damage() / part.max_life)
}

/// e.g. "a severe cut on the left upper arm (bandaged, sutured)"
pub fn describe_wound(wound: &Wound, part: &BodypartPrototype) -> String {
    if wound.is_healed() {
        return format!("a healed {} on the {}", wound_noun(wound.damage_type()), part.name);
    }
    let mut text = format!(
        "a {} {} {} the {}",
        severity_of(wound, part).display_name(),
        wound_noun(wound.damage_type()),
        if wound.is_internal() { "inside" } else { "on" },
        part.name
    );

    let treatments = wound.treatments();
    let mut notes: Vec<&str> = Vec::new();
    if wound.is_bleeding() {
        notes.push("bleeding");
    }
    if treatments.bandaged {
        notes.push("bandaged");
    }
    if treatments.cleaned {
        notes.push("cleaned");
    }
    if treatments.sutured {
        notes.push("sutured");
    }
    if wound.lodged_item().is_some() {
        notes.push("with something lodged in it");
    }
    if wound.infection().is_some() {
        notes.push("infected");
    }
    if !notes.is_empty() {
        text.push_str(&format!(" ({})", notes.join(", ")));
    }
    text
}

pub fn describe_infection(infection: &Infection, part: Option<&BodypartPrototype>) -> String {
    let stage = match infection.state() {
        InfectionState::Subclinical => "an incipient",
        InfectionState::Active if infection.intensity() >= 0.5 => "a raging",
        InfectionState::Active => "a festering",
        InfectionState::Resolving => "a fading",
        InfectionState::Cleared => "a cleared",
    };
    match part {
        Some(part) => format!("{} {} in the {}", stage, infection.kind().display_name(), part.name),
        None => format!("{} {}", stage, infection.kind().display_name()),
    }
}

/// One line summary for a body's state, as seen by an onlooker
pub fn describe_health(state: HealthState) -> &'static str {
    match state {
        HealthState::Healthy => "looks to be in good health",
        HealthState::Hurt => "is hurt",
        HealthState::Critical => "is critically wounded",
        HealthState::Unconscious => "lies unconscious",
        HealthState::Dead => "is dead",
    }
}
