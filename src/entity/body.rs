//! Body instance: the mutable physical state of one character
//!
//! A body owns its wounds and infections. It never owns its prototype: the
//! `BodyGraph` is shared read-only and passed in wherever structure matters.

use ahash::AHashSet;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::anatomy::{BodyGraph, LimbRole};
use crate::armour::WornItem;
use crate::core::config::EngineConfig;
use crate::core::types::{BodyId, BodyProtoId, BodypartId, CharacterId, InfectionId, WoundId};
use crate::health::infection::{Infection, InfectionSimulator, InfectionTick};
use crate::health::strategy::{HealthState, HealthStrategy};
use crate::health::tracker::{hours, HealingContext, WoundAggregate, WoundTick, WoundTracker};
use crate::health::wound::Wound;

/// Posture of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    #[default]
    Standing,
    Sitting,
    Kneeling,
    Prone,
    Flying,
}

impl Position {
    pub fn display_name(&self) -> &'static str {
        match self {
            Position::Standing => "standing",
            Position::Sitting => "sitting",
            Position::Kneeling => "kneeling",
            Position::Prone => "lying prone",
            Position::Flying => "flying",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Bloodtype {
    #[default]
    OPositive,
    ONegative,
    APositive,
    ANegative,
    BPositive,
    BNegative,
    AbPositive,
    AbNegative,
}

/// What happened to a body during one scheduler tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyTick {
    pub wounds: WoundTick,
    pub infections: Vec<(InfectionId, InfectionTick)>,
    /// Infections that took hold in open wounds this tick
    pub new_infections: Vec<InfectionId>,
    pub removed_wounds: Vec<WoundId>,
    pub status_before: Option<HealthState>,
    pub status_after: Option<HealthState>,
}

impl BodyTick {
    pub fn status_changed(&self) -> bool {
        self.status_before != self.status_after
    }
}

/// Physical state of one character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    id: BodyId,
    owner: CharacterId,
    prototype: BodyProtoId,
    height_cm: f64,
    weight_kg: f64,
    position: Position,
    stamina: f64,
    max_stamina: f64,
    /// Litres
    blood_volume: f64,
    max_blood_volume: f64,
    bloodtype: Bloodtype,
    ethnicity: String,
    strategy: HealthStrategy,
    severed: AHashSet<BodypartId>,
    worn: Vec<WornItem>,
    wounds: WoundTracker,
    infections: Vec<Infection>,
    next_infection_id: u64,
    /// Environmental contamination 0..=1 wounds are exposed to
    exposure: f64,
    /// Status at the last evaluation, used to report changes
    last_status: HealthState,
}

impl Body {
    pub fn new(owner: CharacterId, graph: &BodyGraph, weight_kg: f64, height_cm: f64, config: &EngineConfig) -> Self {
        let max_blood_volume = (weight_kg * config.blood_litres_per_kg).max(0.0);
        Self {
            id: BodyId::new(),
            owner,
            prototype: graph.prototype().id,
            height_cm,
            weight_kg,
            position: Position::Standing,
            stamina: config.max_stamina,
            max_stamina: config.max_stamina,
            blood_volume: max_blood_volume,
            max_blood_volume,
            bloodtype: Bloodtype::default(),
            ethnicity: String::new(),
            strategy: HealthStrategy::Standard,
            severed: AHashSet::new(),
            worn: Vec::new(),
            wounds: WoundTracker::from_config(config),
            infections: Vec::new(),
            next_infection_id: 1,
            exposure: 0.0,
            last_status: HealthState::Healthy,
        }
    }

    pub fn with_strategy(mut self, strategy: HealthStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_bloodtype(mut self, bloodtype: Bloodtype) -> Self {
        self.bloodtype = bloodtype;
        self
    }

    pub fn with_ethnicity(mut self, ethnicity: &str) -> Self {
        self.ethnicity = ethnicity.to_string();
        self
    }

    pub fn with_exposure(mut self, exposure: f64) -> Self {
        self.set_exposure(exposure);
        self
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn owner(&self) -> CharacterId {
        self.owner
    }

    pub fn prototype(&self) -> BodyProtoId {
        self.prototype
    }

    pub fn height_cm(&self) -> f64 {
        self.height_cm
    }

    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn stamina(&self) -> f64 {
        self.stamina
    }

    pub fn max_stamina(&self) -> f64 {
        self.max_stamina
    }

    pub fn blood_volume(&self) -> f64 {
        self.blood_volume
    }

    pub fn max_blood_volume(&self) -> f64 {
        self.max_blood_volume
    }

    pub fn blood_fraction(&self) -> f64 {
        if self.max_blood_volume <= 0.0 {
            return 1.0;
        }
        self.blood_volume / self.max_blood_volume
    }

    pub fn bloodtype(&self) -> Bloodtype {
        self.bloodtype
    }

    pub fn ethnicity(&self) -> &str {
        &self.ethnicity
    }

    pub fn strategy(&self) -> HealthStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: HealthStrategy) {
        self.strategy = strategy;
    }

    pub fn exposure(&self) -> f64 {
        self.exposure
    }

    pub fn set_exposure(&mut self, exposure: f64) {
        self.exposure = exposure.clamp(0.0, 1.0);
    }

    pub fn wounds(&self) -> &WoundTracker {
        &self.wounds
    }

    pub fn wounds_mut(&mut self) -> &mut WoundTracker {
        &mut self.wounds
    }

    pub fn infections(&self) -> &[Infection] {
        &self.infections
    }

    pub fn infection(&self, id: InfectionId) -> Option<&Infection> {
        self.infections.iter().find(|i| i.id() == id)
    }

    pub fn worn_items(&self) -> &[WornItem] {
        &self.worn
    }

    pub fn wear(&mut self, item: WornItem) {
        self.worn.retain(|w| w.item != item.item);
        self.worn.push(item);
    }

    // === SEVERANCE ===

    pub fn is_severed(&self, part: BodypartId) -> bool {
        self.severed.contains(&part)
    }

    pub fn severed_parts(&self) -> &AHashSet<BodypartId> {
        &self.severed
    }

    /// Sever `part` and everything attached below it.
    ///
    /// Returns only the parts that were not already severed, so severing the
    /// same part twice reports nothing the second time.
    pub fn sever(&mut self, part: BodypartId, graph: &BodyGraph) -> Vec<BodypartId> {
        let mut newly = Vec::new();
        for id in std::iter::once(part).chain(graph.descendants(part)) {
            if self.severed.insert(id) {
                newly.push(id);
            }
        }
        if !newly.is_empty() {
            self.worn.retain(|item| item.covers.iter().any(|p| !self.severed.contains(p)));
        }
        newly
    }

    pub fn can_stand(&self, graph: &BodyGraph) -> bool {
        graph.count_limbs(LimbRole::Leg, &self.severed) >= graph.prototype().min_legs_to_stand
    }

    pub fn can_fly(&self, graph: &BodyGraph) -> bool {
        let min = graph.prototype().min_wings_to_fly;
        min > 0 && graph.count_limbs(LimbRole::Wing, &self.severed) >= min
    }

    /// Drop to the ground if the body can no longer hold its posture
    pub fn settle_position(&mut self, graph: &BodyGraph) {
        match self.position {
            Position::Flying if !self.can_fly(graph) => self.position = Position::Prone,
            Position::Standing if !self.can_stand(graph) => self.position = Position::Prone,
            _ => {}
        }
    }

    // === BLOOD AND STAMINA ===

    pub fn lose_blood(&mut self, litres: f64) {
        self.blood_volume = (self.blood_volume - litres.max(0.0)).max(0.0);
    }

    pub fn regenerate_blood(&mut self, litres: f64) {
        self.blood_volume = (self.blood_volume + litres.max(0.0)).min(self.max_blood_volume);
    }

    /// Spend stamina; returns false and spends nothing if there is not enough
    pub fn spend_stamina(&mut self, cost: f64) -> bool {
        if cost > self.stamina {
            return false;
        }
        self.stamina -= cost.max(0.0);
        true
    }

    pub fn recover_stamina(&mut self, amount: f64) {
        self.stamina = (self.stamina + amount.max(0.0)).min(self.max_stamina);
    }

    // === HEALTH ===

    /// Wound aggregate plus systemic effects of live infections
    pub fn aggregate(&self, config: &EngineConfig) -> WoundAggregate {
        self.infections
            .iter()
            .flat_map(|i| i.systemic_effects(config))
            .fold(self.wounds.aggregate(), |acc, effect| acc.combined(&effect.as_aggregate()))
    }

    pub fn evaluate_status(&self, graph: &BodyGraph, config: &EngineConfig) -> HealthState {
        self.strategy.evaluate_status(self, graph, config)
    }

    pub fn last_status(&self) -> HealthState {
        self.last_status
    }

    /// Re-evaluate and remember the status; returns (previous, current)
    pub fn refresh_status(&mut self, graph: &BodyGraph, config: &EngineConfig) -> (HealthState, HealthState) {
        let previous = self.last_status;
        self.last_status = self.evaluate_status(graph, config);
        (previous, self.last_status)
    }

    // === INFECTION ===

    /// Attach an infection, linking it to its wound
    pub fn add_infection(&mut self, mut infection: Infection) -> InfectionId {
        let id = InfectionId(self.next_infection_id);
        self.next_infection_id += 1;
        infection.assign_id(id);
        if let Some(wound) = infection.wound() {
            self.wounds.set_infection(wound, Some(id));
        }
        self.infections.push(infection);
        id
    }

    /// Roll onset for one wound at full exposure weight
    pub fn try_infect<R: Rng + ?Sized>(
        &mut self,
        wound: WoundId,
        graph: &BodyGraph,
        config: &EngineConfig,
        rng: &mut R,
    ) -> Option<InfectionId> {
        let infection = {
            let wound = self.wounds.get(wound)?;
            let part = graph.get(wound.bodypart())?;
            InfectionSimulator::new(config).maybe_infect(wound, part, self.exposure, rng)?
        };
        Some(self.add_infection(infection))
    }

    // === TIME ===

    /// Advance the body by `elapsed`: healing, bleeding, blood and stamina
    /// recovery, infection growth and onset in still-open wounds.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        elapsed: Duration,
        graph: &BodyGraph,
        config: &EngineConfig,
        rng: &mut R,
    ) -> BodyTick {
        let mut report = BodyTick {
            status_before: Some(self.last_status),
            ..BodyTick::default()
        };
        let h = hours(elapsed);
        if h <= 0.0 || !self.last_status.is_alive() {
            report.status_after = Some(self.last_status);
            return report;
        }

        let healing = HealingContext {
            rate_per_hour: self.strategy.healing_rate(config),
        };
        report.wounds = self.wounds.tick(elapsed, healing, config);
        self.lose_blood(report.wounds.blood_lost);
        if self.wounds.bleed_rate(config) <= 0.0 {
            self.regenerate_blood(config.blood_regeneration_per_hour * h);
        }
        self.recover_stamina(config.stamina_recovery_per_hour * h);

        let simulator = InfectionSimulator::new(config);
        for infection in &mut self.infections {
            let tick = simulator.tick(infection, elapsed);
            report.infections.push((infection.id(), tick));
        }
        let cleared_wounds: Vec<WoundId> = self
            .infections
            .iter()
            .filter(|i| i.is_cleared())
            .filter_map(Infection::wound)
            .collect();
        for wound in cleared_wounds {
            self.wounds.set_infection(wound, None);
        }
        self.infections.retain(|i| !i.is_cleared());

        // Open, uncleaned wounds keep picking up contamination; the onset
        // chance applies per day of exposure
        let day_fraction = (h / 24.0).min(1.0);
        let candidates: Vec<WoundId> = self
            .wounds
            .wounds()
            .iter()
            .filter(|w| w.infection().is_none() && w.is_exposed() && !w.is_healed())
            .map(Wound::id)
            .collect();
        for wound_id in candidates {
            let infection = {
                let Some(wound) = self.wounds.get(wound_id) else { continue };
                let Some(part) = graph.get(wound.bodypart()) else { continue };
                let chance = simulator.onset_chance(wound, part, self.exposure) * day_fraction;
                if chance <= 0.0 || rng.gen::<f64>() >= chance {
                    continue;
                }
                simulator.infect(wound, rng)
            };
            report.new_infections.push(self.add_infection(infection));
        }

        report.removed_wounds = self.wounds.remove_healed_wounds().iter().map(Wound::id).collect();

        let (_, after) = self.refresh_status(graph, config);
        report.status_after = Some(after);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anatomy::{BodyPrototype, BodypartKind, BodypartPrototype};
    use crate::core::types::{ArmourTypeId, DamageType, ItemId};
    use crate::health::infection::InfectionKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn graph() -> BodyGraph {
        let mut proto = BodyPrototype::new(1, "biped");
        proto.min_legs_to_stand = 2;
        BodyGraph::new(
            proto,
            vec![
                BodypartPrototype::new(1, "torso", BodypartKind::External, 100.0),
                BodypartPrototype::new(2, "left leg", BodypartKind::Limb, 50.0)
                    .with_parent(1)
                    .with_limb(LimbRole::Leg)
                    .with_severed_threshold(50.0),
                BodypartPrototype::new(3, "left foot", BodypartKind::Extremity, 30.0).with_parent(2),
                BodypartPrototype::new(4, "right leg", BodypartKind::Limb, 50.0)
                    .with_parent(1)
                    .with_limb(LimbRole::Leg),
            ],
            vec![],
        )
        .unwrap()
    }

    fn body() -> Body {
        Body::new(CharacterId::new(), &graph(), 80.0, 180.0, &EngineConfig::default())
    }

    #[test]
    fn test_new_body_blood_from_weight() {
        let body = body();
        assert!((body.max_blood_volume() - 5.6).abs() < 1e-9);
        assert_eq!(body.blood_fraction(), 1.0);
    }

    #[test]
    fn test_sever_cascades_once() {
        let graph = graph();
        let mut body = body();
        let first = body.sever(BodypartId(2), &graph);
        assert_eq!(first, vec![BodypartId(2), BodypartId(3)]);
        assert!(body.sever(BodypartId(2), &graph).is_empty());
        assert!(body.is_severed(BodypartId(3)));
    }

    #[test]
    fn test_losing_a_leg_knocks_prone() {
        let graph = graph();
        let mut body = body();
        assert!(body.can_stand(&graph));
        body.sever(BodypartId(2), &graph);
        assert!(!body.can_stand(&graph));
        body.settle_position(&graph);
        assert_eq!(body.position(), Position::Prone);
        assert!(!body.can_fly(&graph));
    }

    #[test]
    fn test_severed_items_fall_off() {
        let graph = graph();
        let mut body = body();
        body.wear(WornItem {
            item: ItemId::new(),
            name: "boot".into(),
            armour_type: ArmourTypeId(1),
            material: None,
            layer: 1,
            covers: vec![BodypartId(3)],
        });
        body.sever(BodypartId(2), &graph);
        assert!(body.worn_items().is_empty());
    }

    #[test]
    fn test_blood_floors_and_caps() {
        let mut body = body();
        body.lose_blood(100.0);
        assert_eq!(body.blood_volume(), 0.0);
        body.regenerate_blood(100.0);
        assert_eq!(body.blood_volume(), body.max_blood_volume());
    }

    #[test]
    fn test_stamina_spending() {
        let mut body = body();
        assert!(body.spend_stamina(60.0));
        assert!(!body.spend_stamina(60.0));
        assert_eq!(body.stamina(), 40.0);
    }

    #[test]
    fn test_tick_heals_and_removes_wounds() {
        let config = EngineConfig::default();
        let graph = graph();
        let mut body = body();
        body.wounds_mut()
            .add_wound(Wound::new(BodypartId(1), DamageType::Crushing, 2.0).with_pain(2.0));
        body.refresh_status(&graph, &config);
        assert_eq!(body.last_status(), HealthState::Hurt);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let report = body.tick(Duration::from_secs(3 * 3600), &graph, &config, &mut rng);
        assert_eq!(report.removed_wounds.len(), 1);
        assert_eq!(report.status_after, Some(HealthState::Healthy));
        assert!(report.status_changed());
    }

    #[test]
    fn test_cleared_infection_unlinks_wound() {
        let config = EngineConfig::default();
        let graph = graph();
        let mut body = body();
        let wound = body
            .wounds_mut()
            .add_wound(Wound::new(BodypartId(1), DamageType::Slashing, 1.0));
        let id = body.add_infection(Infection::new(InfectionKind::Simple, 0.1, 0.0).on_wound(wound, BodypartId(1)));
        assert_eq!(body.wounds().get(wound).unwrap().infection(), Some(id));

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        body.tick(Duration::from_secs(3600), &graph, &config, &mut rng);
        assert!(body.infections().is_empty());
    }

    #[test]
    fn test_snapshot_serde_roundtrip() {
        let graph = graph();
        let mut body = body();
        body.sever(BodypartId(2), &graph);
        body.wounds_mut()
            .add_wound(Wound::new(BodypartId(1), DamageType::Piercing, 7.0));
        let json = serde_json::to_string(&body).unwrap();
        let restored: Body = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, body);
    }
}
