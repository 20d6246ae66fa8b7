//! Infection onset and progression
//!
//! Intensity follows logistic growth toward `virulence × intensity_ceiling`
//! and is damped by the body's acquired immunity, which only starts to build
//! once the infection has been detected and never goes back down.
//!
//! ```text
//! growth  = growth_rate × virulence × I × (1 − I / (virulence × ceiling))
//! damping = immunity × clearance_rate
//! I'      = max(0, I + (growth − damping) × h)
//! immunity' = immunity + gain × (1 − immunity) × h      (once detected)
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::tracker::{hours, WoundAggregate};
use super::wound::Wound;
use crate::anatomy::BodypartPrototype;
use crate::core::config::EngineConfig;
use crate::core::types::{BodypartId, DamageType, InfectionId, WoundId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfectionKind {
    /// Ordinary wound infection
    Simple,
    /// Spreading tissue rot from bites and claws
    Gangrene,
    /// Dead tissue left by burns
    Necrotic,
}

impl InfectionKind {
    pub fn for_damage(damage_type: DamageType) -> Self {
        match damage_type {
            DamageType::Bite | DamageType::Claw => InfectionKind::Gangrene,
            DamageType::Burning => InfectionKind::Necrotic,
            _ => InfectionKind::Simple,
        }
    }

    pub fn virulence_multiplier(&self) -> f64 {
        match self {
            InfectionKind::Simple => 1.0,
            InfectionKind::Gangrene => 1.4,
            InfectionKind::Necrotic => 1.2,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            InfectionKind::Simple => "infection",
            InfectionKind::Gangrene => "gangrene",
            InfectionKind::Necrotic => "necrosis",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfectionState {
    Subclinical,
    Active,
    Resolving,
    /// Terminal: intensity reached zero and the infection is destroyed
    Cleared,
}

/// Body-wide effect of a sufficiently intense infection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SystemicEffect {
    Fever { pain: f64 },
    Sepsis { stun: f64, shock: f64 },
}

impl SystemicEffect {
    pub fn as_aggregate(&self) -> WoundAggregate {
        match *self {
            SystemicEffect::Fever { pain } => WoundAggregate {
                pain,
                ..WoundAggregate::default()
            },
            SystemicEffect::Sepsis { stun, shock } => WoundAggregate {
                stun,
                shock,
                ..WoundAggregate::default()
            },
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SystemicEffect::Fever { .. } => "fever",
            SystemicEffect::Sepsis { .. } => "sepsis",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Infection {
    id: InfectionId,
    kind: InfectionKind,
    virulence: f64,
    intensity: f64,
    immunity: f64,
    state: InfectionState,
    detected: bool,
    wound: Option<WoundId>,
    bodypart: Option<BodypartId>,
}

impl Infection {
    pub fn new(kind: InfectionKind, virulence: f64, intensity: f64) -> Self {
        Self {
            id: InfectionId(0),
            kind,
            virulence: virulence.clamp(0.0, 1.0),
            intensity: intensity.max(0.0),
            immunity: 0.0,
            state: InfectionState::Subclinical,
            detected: false,
            wound: None,
            bodypart: None,
        }
    }

    pub fn on_wound(mut self, wound: WoundId, bodypart: BodypartId) -> Self {
        self.wound = Some(wound);
        self.bodypart = Some(bodypart);
        self
    }

    pub(crate) fn assign_id(&mut self, id: InfectionId) {
        self.id = id;
    }

    pub fn id(&self) -> InfectionId {
        self.id
    }

    pub fn kind(&self) -> InfectionKind {
        self.kind
    }

    pub fn virulence(&self) -> f64 {
        self.virulence
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    pub fn immunity(&self) -> f64 {
        self.immunity
    }

    pub fn state(&self) -> InfectionState {
        self.state
    }

    pub fn is_cleared(&self) -> bool {
        self.state == InfectionState::Cleared
    }

    pub fn wound(&self) -> Option<WoundId> {
        self.wound
    }

    pub fn bodypart(&self) -> Option<BodypartId> {
        self.bodypart
    }

    /// Systemic effects at the current intensity
    pub fn systemic_effects(&self, config: &EngineConfig) -> Vec<SystemicEffect> {
        let mut effects = Vec::new();
        if self.is_cleared() {
            return effects;
        }
        if self.intensity >= config.fever_threshold {
            effects.push(SystemicEffect::Fever {
                pain: config.fever_pain,
            });
        }
        if self.intensity >= config.sepsis_threshold {
            effects.push(SystemicEffect::Sepsis {
                stun: config.sepsis_stun,
                shock: config.sepsis_shock,
            });
        }
        effects
    }

    fn growth(&self, config: &EngineConfig) -> f64 {
        let ceiling = self.virulence * config.intensity_ceiling;
        if ceiling <= 0.0 {
            return 0.0;
        }
        config.infection_growth_per_hour * self.virulence * self.intensity * (1.0 - self.intensity / ceiling)
    }

    fn damping(&self, config: &EngineConfig) -> f64 {
        self.immunity * config.immune_clearance_per_hour
    }
}

/// Outcome of advancing one infection
#[derive(Debug, Clone, PartialEq)]
pub struct InfectionTick {
    pub previous_state: InfectionState,
    pub state: InfectionState,
    /// Effects that were not present before this tick
    pub effects_started: Vec<SystemicEffect>,
}

impl InfectionTick {
    pub fn state_changed(&self) -> bool {
        self.previous_state != self.state
    }

    pub fn cleared(&self) -> bool {
        self.state == InfectionState::Cleared && self.previous_state != InfectionState::Cleared
    }
}

pub struct InfectionSimulator<'a> {
    config: &'a EngineConfig,
}

impl<'a> InfectionSimulator<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Probability that `wound` becomes infected under `exposure` (0..=1)
    pub fn onset_chance(&self, wound: &Wound, bodypart: &BodypartPrototype, exposure: f64) -> f64 {
        if !wound.is_exposed() || wound.infection().is_some() || wound.is_healed() {
            return 0.0;
        }
        let size = 1.0 - (-self.config.infection_size_scale * wound.current_damage()).exp();
        let mut chance = self.config.infection_base_chance
            * size
            * bodypart.relative_infectability.max(0.0)
            * exposure.clamp(0.0, 1.0);
        if wound.treatments().cleaned {
            chance *= self.config.cleaned_infection_multiplier;
        }
        chance.clamp(0.0, 1.0)
    }

    /// Roll for infection onset on a wound. Virulence is fixed here.
    pub fn maybe_infect<R: Rng + ?Sized>(
        &self,
        wound: &Wound,
        bodypart: &BodypartPrototype,
        exposure: f64,
        rng: &mut R,
    ) -> Option<Infection> {
        let chance = self.onset_chance(wound, bodypart, exposure);
        if chance <= 0.0 || rng.gen::<f64>() >= chance {
            return None;
        }
        Some(self.infect(wound, rng))
    }

    /// Create an infection on `wound` without rolling for onset
    pub fn infect<R: Rng + ?Sized>(&self, wound: &Wound, rng: &mut R) -> Infection {
        let kind = InfectionKind::for_damage(wound.damage_type());
        let virulence = self.config.base_virulence * kind.virulence_multiplier() * rng.gen_range(0.75..=1.25);
        Infection::new(kind, virulence, self.config.initial_intensity).on_wound(wound.id(), wound.bodypart())
    }

    /// Advance an infection by `elapsed` in steps of at most `infection_step_hours`
    pub fn tick(&self, infection: &mut Infection, elapsed: Duration) -> InfectionTick {
        let previous_state = infection.state;
        let before = infection.systemic_effects(self.config);

        let mut remaining = hours(elapsed);
        while remaining > 0.0 && !infection.is_cleared() {
            let step = remaining.min(self.config.infection_step_hours);
            remaining -= step;
            self.step(infection, step);
        }

        let effects_started = infection
            .systemic_effects(self.config)
            .into_iter()
            .filter(|effect| {
                !before
                    .iter()
                    .any(|b| std::mem::discriminant(b) == std::mem::discriminant(effect))
            })
            .collect();

        InfectionTick {
            previous_state,
            state: infection.state,
            effects_started,
        }
    }

    fn step(&self, infection: &mut Infection, h: f64) {
        let growth = infection.growth(self.config);
        let damping = infection.damping(self.config);
        infection.intensity = (infection.intensity + (growth - damping) * h).max(0.0);

        if infection.intensity >= self.config.detection_threshold {
            infection.detected = true;
        }
        if infection.detected {
            infection.immunity += self.config.immunity_gain_per_hour * (1.0 - infection.immunity) * h;
            infection.immunity = infection.immunity.min(1.0);
        }

        infection.state = if infection.intensity <= 0.0 {
            InfectionState::Cleared
        } else {
            match infection.state {
                InfectionState::Subclinical if infection.intensity > self.config.active_threshold => {
                    InfectionState::Active
                }
                InfectionState::Active if damping > growth => InfectionState::Resolving,
                state => state,
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anatomy::BodypartKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn arm() -> BodypartPrototype {
        BodypartPrototype::new(2, "arm", BodypartKind::Limb, 50.0)
    }

    fn gash() -> Wound {
        Wound::new(BodypartId(2), DamageType::Slashing, 30.0)
    }

    fn hours_of(h: u64) -> Duration {
        Duration::from_secs(h * 3600)
    }

    #[test]
    fn test_onset_chance_shape() {
        let config = EngineConfig::default();
        let sim = InfectionSimulator::new(&config);
        let wound = gash();
        let open = sim.onset_chance(&wound, &arm(), 1.0);
        assert!(open > 0.0 && open <= config.infection_base_chance);
        assert_eq!(sim.onset_chance(&wound, &arm(), 0.0), 0.0);

        let mut cleaned = gash();
        cleaned.treat(crate::health::wound::Treatment::Clean);
        let reduced = sim.onset_chance(&cleaned, &arm(), 1.0);
        assert!((reduced - open * config.cleaned_infection_multiplier).abs() < 1e-12);
    }

    #[test]
    fn test_crushing_wounds_never_infect() {
        let config = EngineConfig::default();
        let sim = InfectionSimulator::new(&config);
        let bruise = Wound::new(BodypartId(2), DamageType::Crushing, 30.0);
        assert_eq!(sim.onset_chance(&bruise, &arm(), 1.0), 0.0);
    }

    #[test]
    fn test_certain_onset_fixes_virulence() {
        let config = EngineConfig {
            infection_base_chance: 1.0,
            infection_size_scale: 100.0,
            ..EngineConfig::default()
        };
        let sim = InfectionSimulator::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut infection = sim.maybe_infect(&gash(), &arm(), 1.0, &mut rng).unwrap();
        assert_eq!(infection.state(), InfectionState::Subclinical);
        assert_eq!(infection.bodypart(), Some(BodypartId(2)));
        let virulence = infection.virulence();
        sim.tick(&mut infection, hours_of(24));
        assert_eq!(infection.virulence(), virulence);
    }

    #[test]
    fn test_lifecycle_reaches_cleared() {
        let config = EngineConfig::default();
        let sim = InfectionSimulator::new(&config);
        let mut infection = Infection::new(InfectionKind::Simple, 0.6, 0.06);
        let mut seen = vec![infection.state()];
        let mut last_immunity = 0.0;
        for _ in 0..2000 {
            sim.tick(&mut infection, hours_of(1));
            assert!(infection.intensity() >= 0.0);
            assert!(infection.immunity() >= last_immunity);
            last_immunity = infection.immunity();
            if seen.last() != Some(&infection.state()) {
                seen.push(infection.state());
            }
            if infection.is_cleared() {
                break;
            }
        }
        assert_eq!(
            seen,
            vec![
                InfectionState::Subclinical,
                InfectionState::Active,
                InfectionState::Resolving,
                InfectionState::Cleared
            ]
        );
    }

    #[test]
    fn test_fever_effect_started_once() {
        let config = EngineConfig::default();
        let sim = InfectionSimulator::new(&config);
        let mut infection = Infection::new(InfectionKind::Simple, 1.0, config.fever_threshold - 0.01);
        let mut fevers = 0;
        for _ in 0..10 {
            let tick = sim.tick(&mut infection, hours_of(1));
            fevers += tick
                .effects_started
                .iter()
                .filter(|e| matches!(e, SystemicEffect::Fever { .. }))
                .count();
        }
        assert_eq!(fevers, 1);
    }

    #[test]
    fn test_undetected_infection_builds_no_immunity() {
        let config = EngineConfig::default();
        let sim = InfectionSimulator::new(&config);
        let mut infection = Infection::new(InfectionKind::Simple, 0.5, 0.001);
        sim.tick(&mut infection, hours_of(1));
        assert_eq!(infection.immunity(), 0.0);
    }
}
