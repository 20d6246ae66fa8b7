//! Hit location: which bodypart an attack strikes
//!
//! Weighted draw over the present parts of the target, then an optional
//! second draw through a bone's coverage into the organ behind it.
//! Pure with respect to body state; no locks needed.

use rand::Rng;

use crate::anatomy::{Alignment, BodyGraph, BodypartKind, BodypartPrototype, Orientation};
use crate::core::config::EngineConfig;
use crate::core::error::{EngineError, Result};
use crate::core::types::BodypartId;
use crate::entity::Body;

/// Where a blow landed. `struck` is the part the blow meets first and is
/// the one armour is checked against; `bodypart` is the part that takes the
/// wound. They differ only when a bone's coverage sends the hit through to
/// an organ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitLocation {
    pub struck: BodypartId,
    pub bodypart: BodypartId,
}

impl HitLocation {
    pub fn direct(part: BodypartId) -> Self {
        Self {
            struck: part,
            bodypart: part,
        }
    }

    pub fn reached_organ(&self) -> bool {
        self.struck != self.bodypart
    }
}

/// Relative weight of a bodypart for an attack from a given direction
pub trait HitWeighting: Send + Sync {
    fn weight(&self, part: &BodypartPrototype, alignment: Alignment, orientation: Orientation) -> f64;
}

/// Data-driven weighting: `relative_hit_chance × alignment × orientation`
/// with the modifiers looked up by distance in config tables
#[derive(Debug, Clone, PartialEq)]
pub struct TableHitWeighting {
    alignment_modifiers: Vec<f64>,
    orientation_modifiers: Vec<f64>,
}

impl TableHitWeighting {
    pub fn new(alignment_modifiers: Vec<f64>, orientation_modifiers: Vec<f64>) -> Self {
        Self {
            alignment_modifiers,
            orientation_modifiers,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.alignment_modifiers.clone(), config.orientation_modifiers.clone())
    }

    /// Distances past the end of a table use its last entry
    fn lookup(table: &[f64], distance: Option<u8>) -> f64 {
        match distance {
            None => 1.0,
            Some(d) => table
                .get(d as usize)
                .or_else(|| table.last())
                .copied()
                .unwrap_or(1.0),
        }
    }

    pub fn alignment_modifier(&self, part: Alignment, attack: Alignment) -> f64 {
        Self::lookup(&self.alignment_modifiers, part.steps_to(attack))
    }

    pub fn orientation_modifier(&self, part: Orientation, attack: Orientation) -> f64 {
        Self::lookup(&self.orientation_modifiers, part.bands_to(attack))
    }
}

impl Default for TableHitWeighting {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl HitWeighting for TableHitWeighting {
    fn weight(&self, part: &BodypartPrototype, alignment: Alignment, orientation: Orientation) -> f64 {
        part.relative_hit_chance.max(0.0)
            * self.alignment_modifier(part.alignment, alignment)
            * self.orientation_modifier(part.orientation, orientation)
    }
}

/// Parts an attack can land on directly: present and not an organ.
/// Organs are only reached through bone coverage.
fn is_directly_targetable(part: &BodypartPrototype, body: &Body) -> bool {
    part.kind != BodypartKind::Organ && !body.is_severed(part.id)
}

/// Weighted candidate list in display order
pub fn candidate_weights(
    alignment: Alignment,
    orientation: Orientation,
    body: &Body,
    graph: &BodyGraph,
    weighting: &dyn HitWeighting,
) -> Vec<(BodypartId, f64)> {
    graph
        .bodyparts()
        .filter(|part| is_directly_targetable(part, body))
        .map(|part| (part.id, weighting.weight(part, alignment, orientation)))
        .filter(|(_, weight)| *weight > 0.0)
        .collect()
}

/// One weighted draw; the first entry wins ties
fn choose_weighted<R: Rng + ?Sized>(entries: &[(BodypartId, f64)], rng: &mut R) -> Option<BodypartId> {
    let total: f64 = entries.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return None;
    }

    let roll = rng.gen::<f64>() * total;
    let mut accumulated = 0.0;
    for (id, weight) in entries {
        accumulated += weight;
        if roll < accumulated {
            return Some(*id);
        }
    }

    entries.last().map(|(id, _)| *id)
}

/// Second draw through a bone's coverage.
///
/// Probabilities accumulate in authored order; if they sum past 1 they are
/// normalised, otherwise the remainder keeps the hit on the bone.
fn redirect_through_coverage<R: Rng + ?Sized>(
    bone: BodypartId,
    body: &Body,
    graph: &BodyGraph,
    rng: &mut R,
) -> BodypartId {
    let organs: Vec<(BodypartId, f64)> = graph
        .coverage(bone)
        .iter()
        .filter(|(organ, _)| !body.is_severed(*organ))
        .copied()
        .collect();
    if organs.is_empty() {
        return bone;
    }

    let total: f64 = organs.iter().map(|(_, p)| p).sum();
    let scale = if total > 1.0 { total } else { 1.0 };
    let roll = rng.gen::<f64>() * scale;
    let mut accumulated = 0.0;
    for (organ, probability) in organs {
        accumulated += probability;
        if roll < accumulated {
            return organ;
        }
    }
    bone
}

/// Choose where a blow lands on `body`.
///
/// Fails with `NoValidTarget` when nothing is left to hit.
pub fn resolve_target<R: Rng + ?Sized>(
    alignment: Alignment,
    orientation: Orientation,
    body: &Body,
    graph: &BodyGraph,
    weighting: &dyn HitWeighting,
    rng: &mut R,
) -> Result<HitLocation> {
    let candidates = candidate_weights(alignment, orientation, body, graph, weighting);
    let struck = choose_weighted(&candidates, rng).ok_or(EngineError::NoValidTarget(body.id()))?;

    match graph.get(struck) {
        Some(part) if part.kind == BodypartKind::Bone => Ok(HitLocation {
            struck,
            bodypart: redirect_through_coverage(struck, body, graph, rng),
        }),
        _ => Ok(HitLocation::direct(struck)),
    }
}
