//! WoundTracker: the live set of wounds on one body
//!
//! Aggregate pain, shock and stun are derived from the wound set with
//! diminishing returns and recomputed whenever that set changes. Nothing
//! outside this module can write them.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::time::Duration;

use super::wound::{Treatment, Wound};
use crate::core::config::EngineConfig;
use crate::core::types::{BodypartId, DamageType, InfectionId, ItemId, WoundId};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Convert a tick duration into hours of simulated time
pub fn hours(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() / SECONDS_PER_HOUR
}

/// Pain, shock and stun summed over all wounds with diminishing returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WoundAggregate {
    pub pain: f64,
    pub shock: f64,
    pub stun: f64,
}

impl WoundAggregate {
    pub fn combined(&self, other: &WoundAggregate) -> WoundAggregate {
        WoundAggregate {
            pain: self.pain + other.pain,
            shock: self.shock + other.shock,
            stun: self.stun + other.stun,
        }
    }
}

/// Largest value counts fully, each following one `falloff` times less
fn diminishing_sum(mut values: Vec<f64>, falloff: f64) -> f64 {
    values.sort_by_key(|v| Reverse(OrderedFloat(*v)));
    let mut weight = 1.0;
    let mut total = 0.0;
    for value in values {
        total += value * weight;
        weight *= falloff;
    }
    total
}

/// Rates supplied by the health strategy for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealingContext {
    /// Damage healed per hour on an untreated wound
    pub rate_per_hour: f64,
}

/// What changed during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WoundTick {
    /// Wounds whose damage reached zero this tick
    pub healed: Vec<WoundId>,
    /// Litres of blood lost through open wounds
    pub blood_lost: f64,
    pub damage_healed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TrackerRecord {
    wounds: Vec<Wound>,
    next_id: u64,
    falloff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TrackerRecord", into = "TrackerRecord")]
pub struct WoundTracker {
    wounds: Vec<Wound>,
    next_id: u64,
    falloff: f64,
    aggregate: WoundAggregate,
}

impl From<TrackerRecord> for WoundTracker {
    fn from(record: TrackerRecord) -> Self {
        let mut tracker = Self {
            wounds: record.wounds,
            next_id: record.next_id,
            falloff: record.falloff,
            aggregate: WoundAggregate::default(),
        };
        tracker.recompute();
        tracker
    }
}

impl From<WoundTracker> for TrackerRecord {
    fn from(tracker: WoundTracker) -> Self {
        Self {
            wounds: tracker.wounds,
            next_id: tracker.next_id,
            falloff: tracker.falloff,
        }
    }
}

impl Default for WoundTracker {
    fn default() -> Self {
        Self::new(EngineConfig::default().aggregate_falloff)
    }
}

impl WoundTracker {
    pub fn new(falloff: f64) -> Self {
        Self {
            wounds: Vec::new(),
            next_id: 1,
            falloff,
            aggregate: WoundAggregate::default(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.aggregate_falloff)
    }

    /// Take ownership of a wound and give it an id
    pub fn add_wound(&mut self, mut wound: Wound) -> WoundId {
        let id = WoundId(self.next_id);
        self.next_id += 1;
        wound.assign_id(id);
        self.wounds.push(wound);
        self.recompute();
        id
    }

    /// Re-injure an existing wound. Returns false if it no longer exists.
    pub fn reinjure(&mut self, id: WoundId, damage: f64, pain: f64, shock: f64, stun: f64) -> bool {
        let Some(wound) = self.wounds.iter_mut().find(|w| w.id() == id) else {
            return false;
        };
        wound.reinjure(damage, pain, shock, stun);
        self.recompute();
        true
    }

    /// Open wound of `damage_type` on `part`, the candidate for re-injury
    pub fn find_open(&self, part: BodypartId, damage_type: DamageType) -> Option<WoundId> {
        self.wounds
            .iter()
            .find(|w| w.bodypart() == part && w.damage_type() == damage_type && !w.is_healed())
            .map(Wound::id)
    }

    pub fn get(&self, id: WoundId) -> Option<&Wound> {
        self.wounds.iter().find(|w| w.id() == id)
    }

    pub fn wounds(&self) -> &[Wound] {
        &self.wounds
    }

    pub fn wounds_on(&self, part: BodypartId) -> impl Iterator<Item = &Wound> {
        self.wounds.iter().filter(move |w| w.bodypart() == part)
    }

    pub fn len(&self) -> usize {
        self.wounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wounds.is_empty()
    }

    /// Cumulative current damage on one bodypart
    pub fn damage_on(&self, part: BodypartId) -> f64 {
        self.wounds_on(part).map(Wound::current_damage).sum()
    }

    pub fn aggregate(&self) -> WoundAggregate {
        self.aggregate
    }

    /// Total litres per hour bleeding out of open wounds
    pub fn bleed_rate(&self, config: &EngineConfig) -> f64 {
        self.wounds.iter().map(|w| w.bleed_rate(config)).sum()
    }

    /// Apply a treatment. Returns None if the wound is gone, Some(false) if
    /// it was already treated that way.
    pub fn treat(&mut self, id: WoundId, treatment: Treatment) -> Option<bool> {
        let wound = self.wounds.iter_mut().find(|w| w.id() == id)?;
        Some(wound.treat(treatment))
    }

    pub fn remove_lodged_item(&mut self, id: WoundId) -> Option<ItemId> {
        self.wounds
            .iter_mut()
            .find(|w| w.id() == id)
            .and_then(Wound::remove_lodged_item)
    }

    pub(crate) fn set_infection(&mut self, id: WoundId, infection: Option<InfectionId>) {
        if let Some(wound) = self.wounds.iter_mut().find(|w| w.id() == id) {
            wound.set_infection(infection);
        }
    }

    /// Advance healing, stun recovery and bleeding by `elapsed`
    pub fn tick(&mut self, elapsed: Duration, healing: HealingContext, config: &EngineConfig) -> WoundTick {
        let h = hours(elapsed);
        let mut report = WoundTick::default();
        if h <= 0.0 || self.wounds.is_empty() {
            return report;
        }

        for wound in &mut self.wounds {
            // Bleeding is measured against the damage open at the start of the tick
            report.blood_lost += wound.bleed_rate(config) * h;

            let was_open = !wound.is_healed();
            let amount = healing.rate_per_hour.max(0.0) * wound.healing_multiplier(config) * h;
            report.damage_healed += wound.heal(amount);
            wound.recover_stun(config.stun_recovery_per_hour * h);
            if was_open && wound.is_healed() {
                report.healed.push(wound.id());
            }
        }

        self.recompute();
        report
    }

    /// Drop fully healed, unstunned wounds that have nothing lodged and no live infection
    pub fn remove_healed_wounds(&mut self) -> Vec<Wound> {
        let (removed, kept): (Vec<Wound>, Vec<Wound>) =
            std::mem::take(&mut self.wounds).into_iter().partition(Wound::is_removable);
        self.wounds = kept;
        if !removed.is_empty() {
            self.recompute();
        }
        removed
    }

    fn recompute(&mut self) {
        self.aggregate = WoundAggregate {
            pain: diminishing_sum(self.wounds.iter().map(Wound::current_pain).collect(), self.falloff),
            shock: diminishing_sum(self.wounds.iter().map(Wound::current_shock).collect(), self.falloff),
            stun: diminishing_sum(self.wounds.iter().map(Wound::current_stun).collect(), self.falloff),
        };
    }
}
