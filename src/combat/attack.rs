//! Attack templates: weapon attacks, combat actions and damage patterns
//!
//! All of these are read-only catalog entries; formulas are parsed when the
//! catalog loads.

use serde::{Deserialize, Serialize};

use crate::anatomy::{Alignment, Orientation};
use crate::core::types::{AttackId, CombatActionId, DamagePatternId, DamageType};
use crate::expression::TraitExpression;

/// What an attacker is trying to achieve with an attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intention {
    Attack,
    Kill,
    Wound,
    Disable,
    Stagger,
    Disarm,
    Grapple,
    Ranged,
}

/// How hard the attacker commits; scales stamina cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exertion {
    Low,
    #[default]
    Normal,
    High,
    Extreme,
}

impl Exertion {
    pub fn stamina_multiplier(&self) -> f64 {
        match self {
            Exertion::Low => 0.5,
            Exertion::Normal => 1.0,
            Exertion::High => 1.5,
            Exertion::Extreme => 2.5,
        }
    }
}

fn default_alignment() -> Alignment {
    Alignment::Front
}

fn default_orientation() -> Orientation {
    Orientation::Centre
}

/// One way of striking with a weapon (or a natural weapon)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponAttack {
    pub id: AttackId,
    pub name: String,
    /// Narration verb, third person ("slashes")
    pub verb: String,
    pub damage_type: DamageType,
    pub damage: TraitExpression,
    /// Defaults to the damage dealt
    #[serde(default)]
    pub pain: Option<TraitExpression>,
    /// Defaults to no stun
    #[serde(default)]
    pub stun: Option<TraitExpression>,
    #[serde(default)]
    pub penetration_degree: f64,
    /// Side of the target the attack arrives from
    #[serde(default = "default_alignment")]
    pub alignment: Alignment,
    /// Height band the attack is aimed at
    #[serde(default = "default_orientation")]
    pub orientation: Orientation,
    #[serde(default)]
    pub stamina_cost: f64,
    #[serde(default)]
    pub exertion: Exertion,
    #[serde(default)]
    pub intentions: Vec<Intention>,
    /// Whether the weapon (an arrow, a bolt) stays lodged in the wound
    #[serde(default)]
    pub lodges: bool,
}

impl WeaponAttack {
    pub fn new(id: u32, name: &str, damage_type: DamageType, damage: TraitExpression) -> Self {
        Self {
            id: AttackId(id),
            name: name.to_string(),
            verb: "strikes".to_string(),
            damage_type,
            damage,
            pain: None,
            stun: None,
            penetration_degree: 0.0,
            alignment: default_alignment(),
            orientation: default_orientation(),
            stamina_cost: 0.0,
            exertion: Exertion::default(),
            intentions: Vec::new(),
            lodges: false,
        }
    }

    pub fn with_verb(mut self, verb: &str) -> Self {
        self.verb = verb.to_string();
        self
    }

    pub fn with_aim(mut self, alignment: Alignment, orientation: Orientation) -> Self {
        self.alignment = alignment;
        self.orientation = orientation;
        self
    }

    pub fn with_penetration(mut self, degree: f64) -> Self {
        self.penetration_degree = degree;
        self
    }

    /// Stamina the attacker spends, after exertion
    pub fn total_stamina_cost(&self) -> f64 {
        self.stamina_cost.max(0.0) * self.exertion.stamina_multiplier()
    }

    pub fn has_intention(&self, intention: Intention) -> bool {
        self.intentions.contains(&intention)
    }

    /// Formula parameters that no attacker, weapon or target will supply.
    /// They evaluate as an error, which turns the attack into a miss.
    pub fn unrecognised_params(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let formulas = std::iter::once(&self.damage).chain(self.pain.iter()).chain(self.stun.iter());
        for formula in formulas {
            for name in formula.expr().params() {
                if !is_known_param(name) && !out.iter().any(|n| n == name) {
                    out.push(name.to_string());
                }
            }
        }
        out
    }
}

const TARGET_PARAMS: [&str; 3] = ["target.weight", "target.height", "target.stamina"];

fn is_known_param(name: &str) -> bool {
    name.starts_with("attacker.") || name.starts_with("weapon.") || TARGET_PARAMS.contains(&name)
}

/// A named manoeuvre grouping one or more attacks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatAction {
    pub id: CombatActionId,
    pub name: String,
    pub attacks: Vec<AttackId>,
    #[serde(default)]
    pub stamina_cost: f64,
    #[serde(default)]
    pub exertion: Exertion,
    #[serde(default)]
    pub intentions: Vec<Intention>,
}

impl CombatAction {
    pub fn serves(&self, intention: Intention) -> bool {
        self.intentions.contains(&intention)
    }

    pub fn total_stamina_cost(&self) -> f64 {
        self.stamina_cost.max(0.0) * self.exertion.stamina_multiplier()
    }
}

/// Damage with no attacker: falls, fire, collapsing masonry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamagePattern {
    pub id: DamagePatternId,
    pub name: String,
    pub damage_type: DamageType,
    pub damage: TraitExpression,
    #[serde(default)]
    pub pain: Option<TraitExpression>,
    #[serde(default)]
    pub stun: Option<TraitExpression>,
    #[serde(default)]
    pub penetration_degree: f64,
}

impl DamagePattern {
    /// View the pattern as an attack aimed at no side or height in particular
    pub fn as_attack(&self) -> WeaponAttack {
        WeaponAttack {
            id: AttackId(self.id.0),
            name: self.name.clone(),
            verb: "hits".to_string(),
            damage_type: self.damage_type,
            damage: self.damage.clone(),
            pain: self.pain.clone(),
            stun: self.stun.clone(),
            penetration_degree: self.penetration_degree,
            alignment: Alignment::Irrelevant,
            orientation: Orientation::Irrelevant,
            stamina_cost: 0.0,
            exertion: Exertion::Low,
            intentions: Vec::new(),
            lodges: false,
        }
    }
}
