//! Attack resolution against one locked target
//!
//! `strike` runs the whole pipeline: hit location → armour → damage formulas
//! → wound → infection → health status. Every fallible step runs before the
//! first mutation, so a failed resolution leaves the target untouched.

use ahash::AHashMap;
use rand::Rng;
use tracing::debug;

use super::attack::WeaponAttack;
use super::damage::{self, DamageSource, WoundReport};
use super::hit_location::{resolve_target, HitWeighting};
use crate::anatomy::{Alignment, BodyGraph, Orientation};
use crate::armour::{mitigate, ArmourCatalog, IncomingDamage, MitigationResult};
use crate::core::config::EngineConfig;
use crate::core::error::{EngineError, Result};
use crate::core::types::{BodyId, BodypartId, CharacterId, InfectionId, ItemId};
use crate::entity::Body;
use crate::expression::EvalContext;
use crate::health::describe::{describe_health, wound_noun};
use crate::health::HealthState;

/// The attacking side of an exchange, as supplied by the character layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attacker {
    pub character: Option<CharacterId>,
    pub body: Option<BodyId>,
    pub weapon: Option<ItemId>,
    /// Visible to formulas as `attacker.<name>`
    pub traits: AHashMap<String, f64>,
    /// Visible to formulas as `weapon.<name>`
    pub weapon_traits: AHashMap<String, f64>,
    /// Side the attacker actually stands on; overrides the attack's own
    pub alignment: Option<Alignment>,
    /// Height the attacker actually reaches; overrides the attack's own
    pub orientation: Option<Orientation>,
}

impl Attacker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn character(mut self, character: CharacterId) -> Self {
        self.character = Some(character);
        self
    }

    pub fn body(mut self, body: BodyId) -> Self {
        self.body = Some(body);
        self
    }

    pub fn weapon(mut self, weapon: ItemId) -> Self {
        self.weapon = Some(weapon);
        self
    }

    pub fn with_trait(mut self, name: &str, value: f64) -> Self {
        self.traits.insert(name.to_string(), value);
        self
    }

    pub fn with_weapon_trait(mut self, name: &str, value: f64) -> Self {
        self.weapon_traits.insert(name.to_string(), value);
        self
    }

    pub fn from_side(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    pub fn at_height(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    /// Direction of an attack from this attacker
    pub fn aim(&self, attack: &WeaponAttack) -> (Alignment, Orientation) {
        (
            self.alignment.unwrap_or(attack.alignment),
            self.orientation.unwrap_or(attack.orientation),
        )
    }

    /// Formula context for an attack on `target`
    pub fn eval_context(&self, target: &Body) -> EvalContext {
        let mut ctx = EvalContext::new()
            .with("target.weight", target.weight_kg())
            .with("target.height", target.height_cm())
            .with("target.stamina", target.stamina());
        ctx.extend_prefixed("attacker", &self.traits);
        ctx.extend_prefixed("weapon", &self.weapon_traits);
        ctx
    }
}

/// Why an attack did not land; narrated as an ordinary miss
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissReason {
    /// Every bodypart of the target is gone
    NoValidTarget,
    /// A formula could not be evaluated
    BadFormula(String),
    /// Target no longer exists or left scope
    TargetGone,
    TargetDead,
    /// Another mutation held the target
    Contention,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttackResult {
    Hit,
    Miss(MissReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttackOutcome {
    pub result: AttackResult,
    /// Part the blow met; a bone when it carried on into an organ
    pub struck: Option<BodypartId>,
    /// Part that took the wound
    pub bodypart: Option<BodypartId>,
    pub mitigation: Option<MitigationResult>,
    pub wound: Option<WoundReport>,
    pub infection: Option<InfectionId>,
    pub health_before: Option<HealthState>,
    pub health_after: Option<HealthState>,
    pub health_state_changed: bool,
    /// Stamina charged to the attacker; filled in by the engine
    pub stamina_spent: f64,
}

impl AttackOutcome {
    pub fn miss(reason: MissReason) -> Self {
        Self {
            result: AttackResult::Miss(reason),
            struck: None,
            bodypart: None,
            mitigation: None,
            wound: None,
            infection: None,
            health_before: None,
            health_after: None,
            health_state_changed: false,
            stamina_spent: 0.0,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.result == AttackResult::Hit
    }

    /// Degrade a recoverable per-attack error into a miss
    pub fn from_error(err: &EngineError) -> Option<Self> {
        let reason = match err {
            EngineError::NoValidTarget(_) => MissReason::NoValidTarget,
            EngineError::ExpressionEvaluation { .. } => MissReason::BadFormula(err.to_string()),
            EngineError::ConcurrentMutationConflict(_) => MissReason::Contention,
            EngineError::BodyNotFound(_) => MissReason::TargetGone,
            _ => return None,
        };
        Some(Self::miss(reason))
    }

    /// One line of narration. Failed resolutions read exactly like misses.
    pub fn narrate(&self, attacker: &str, target: &str, attack: &WeaponAttack, graph: &BodyGraph) -> String {
        let part = self
            .bodypart
            .and_then(|id| graph.get(id))
            .map(|p| p.name.as_str())
            .unwrap_or("body");
        let mut line = match (&self.result, &self.wound) {
            (AttackResult::Miss(_), _) => format!("{} {} at {} but misses.", attacker, attack.verb, target),
            (AttackResult::Hit, Some(report)) if report.absorbed() => format!(
                "{} {} {}'s {}, but the blow is turned aside.",
                attacker, attack.verb, target, part
            ),
            (AttackResult::Hit, _) => format!(
                "{} {} {}'s {}, leaving a {}.",
                attacker,
                attack.verb,
                target,
                part,
                wound_noun(attack.damage_type)
            ),
        };
        if let Some(report) = &self.wound {
            if !report.severed.is_empty() {
                line.push_str(&format!(" {}'s {} is severed!", target, part));
            }
        }
        if self.health_state_changed {
            if let Some(state) = self.health_after {
                line.push_str(&format!(" {} {}.", target, describe_health(state)));
            }
        }
        line
    }
}

/// Everything `strike` reads besides the target
pub struct StrikeContext<'a> {
    pub graph: &'a BodyGraph,
    pub armour: &'a ArmourCatalog,
    pub weighting: &'a dyn HitWeighting,
    pub config: &'a EngineConfig,
}

/// Resolve `attack` against `target`. The caller must hold the target exclusively.
pub fn strike<R: Rng + ?Sized>(
    attack: &WeaponAttack,
    attacker: &Attacker,
    target: &mut Body,
    ctx: &StrikeContext<'_>,
    rng: &mut R,
) -> Result<AttackOutcome> {
    let health_before = target.evaluate_status(ctx.graph, ctx.config);

    let (alignment, orientation) = attacker.aim(attack);
    let hit = resolve_target(alignment, orientation, target, ctx.graph, ctx.weighting, rng)?;
    let struck = ctx.graph.get(hit.struck).ok_or(EngineError::BodypartNotFound(hit.struck))?;
    let part = ctx.graph.get(hit.bodypart).ok_or(EngineError::BodypartNotFound(hit.bodypart))?;
    let raw = damage::roll(attack, &attacker.eval_context(target), rng)?;

    // Armour over the bone (and the bone itself) stands between the blow
    // and the organ; the organ takes whatever gets through.
    let incoming = IncomingDamage {
        damage: raw.damage,
        penetration_degree: raw.penetration_degree,
        damage_type: raw.damage_type,
    };
    let mitigation = mitigate(&incoming, target.worn_items(), struck, ctx.armour, ctx.config);

    let source = DamageSource {
        actor: attacker.character,
        tool: attacker.weapon,
        lodged: if attack.lodges { attacker.weapon } else { None },
    };
    let report = damage::apply(&raw, &mitigation, part, target, ctx.graph, &source, ctx.config);

    let infection = match report.wound {
        Some(wound) => target.try_infect(wound, ctx.graph, ctx.config, rng),
        None => None,
    };

    let (_, health_after) = target.refresh_status(ctx.graph, ctx.config);
    debug!(
        attack = %attack.name,
        bodypart = %part.name,
        struck = %struck.name,
        raw = raw.damage,
        residual = mitigation.residual_damage,
        ?health_after,
        "attack resolved"
    );

    Ok(AttackOutcome {
        result: AttackResult::Hit,
        struck: Some(hit.struck),
        bodypart: Some(hit.bodypart),
        mitigation: Some(mitigation),
        wound: Some(report),
        infection,
        health_before: Some(health_before),
        health_after: Some(health_after),
        health_state_changed: health_before != health_after,
        stamina_spent: 0.0,
    })
}
