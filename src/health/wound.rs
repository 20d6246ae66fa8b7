//! Wounds: accumulated injury at one location on a body instance
//!
//! Damage only ever goes down through healing; the single way back up is
//! [`Wound::reinjure`], which raises the original damage by the same amount
//! so `0 <= current_damage <= original_damage` always holds.

use serde::{Deserialize, Serialize};

use crate::core::config::EngineConfig;
use crate::core::types::{BodypartId, CharacterId, DamageType, InfectionId, ItemId, WoundId};

/// Medical attention a wound can receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Treatment {
    /// Stops external bleeding
    Bandage,
    /// Lowers the chance of infection onset
    Clean,
    /// Speeds natural healing
    Suture,
}

impl Treatment {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Bandage => "bandaged",
            Self::Clean => "cleaned",
            Self::Suture => "sutured",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treatments {
    pub bandaged: bool,
    pub cleaned: bool,
    pub sutured: bool,
}

impl Treatments {
    pub fn has(&self, treatment: Treatment) -> bool {
        match treatment {
            Treatment::Bandage => self.bandaged,
            Treatment::Clean => self.cleaned,
            Treatment::Suture => self.sutured,
        }
    }

    fn set(&mut self, treatment: Treatment) {
        match treatment {
            Treatment::Bandage => self.bandaged = true,
            Treatment::Clean => self.cleaned = true,
            Treatment::Suture => self.sutured = true,
        }
    }
}

/// A wound on one bodypart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wound {
    id: WoundId,
    bodypart: BodypartId,
    damage_type: DamageType,
    internal: bool,
    original_damage: f64,
    current_damage: f64,
    /// Pain and shock at full damage; current values scale with damage left
    peak_pain: f64,
    peak_shock: f64,
    current_pain: f64,
    current_shock: f64,
    current_stun: f64,
    bleed_modifier: f64,
    lodged_item: Option<ItemId>,
    origin_actor: Option<CharacterId>,
    origin_tool: Option<ItemId>,
    treatments: Treatments,
    infection: Option<InfectionId>,
}

impl Wound {
    /// A fresh wound. Negative inputs are floored at zero.
    pub fn new(bodypart: BodypartId, damage_type: DamageType, damage: f64) -> Self {
        let damage = damage.max(0.0);
        Self {
            id: WoundId(0),
            bodypart,
            damage_type,
            internal: false,
            original_damage: damage,
            current_damage: damage,
            peak_pain: 0.0,
            peak_shock: 0.0,
            current_pain: 0.0,
            current_shock: 0.0,
            current_stun: 0.0,
            bleed_modifier: 1.0,
            lodged_item: None,
            origin_actor: None,
            origin_tool: None,
            treatments: Treatments::default(),
            infection: None,
        }
    }

    pub fn with_pain(mut self, pain: f64) -> Self {
        self.peak_pain = pain.max(0.0);
        self.current_pain = self.peak_pain;
        self
    }

    pub fn with_shock(mut self, shock: f64) -> Self {
        self.peak_shock = shock.max(0.0);
        self.current_shock = self.peak_shock;
        self
    }

    pub fn with_stun(mut self, stun: f64) -> Self {
        self.current_stun = stun.max(0.0);
        self
    }

    pub fn with_bleed_modifier(mut self, modifier: f64) -> Self {
        self.bleed_modifier = modifier.max(0.0);
        self
    }

    pub fn internal(mut self, internal: bool) -> Self {
        self.internal = internal;
        self
    }

    pub fn with_origin(mut self, actor: Option<CharacterId>, tool: Option<ItemId>) -> Self {
        self.origin_actor = actor;
        self.origin_tool = tool;
        self
    }

    pub fn with_lodged_item(mut self, item: ItemId) -> Self {
        self.lodged_item = Some(item);
        self
    }

    pub(crate) fn assign_id(&mut self, id: WoundId) {
        self.id = id;
    }

    pub fn id(&self) -> WoundId {
        self.id
    }

    pub fn bodypart(&self) -> BodypartId {
        self.bodypart
    }

    pub fn damage_type(&self) -> DamageType {
        self.damage_type
    }

    pub fn is_internal(&self) -> bool {
        self.internal
    }

    pub fn original_damage(&self) -> f64 {
        self.original_damage
    }

    pub fn current_damage(&self) -> f64 {
        self.current_damage
    }

    pub fn current_pain(&self) -> f64 {
        self.current_pain
    }

    pub fn current_shock(&self) -> f64 {
        self.current_shock
    }

    pub fn current_stun(&self) -> f64 {
        self.current_stun
    }

    pub fn bleed_modifier(&self) -> f64 {
        self.bleed_modifier
    }

    pub fn lodged_item(&self) -> Option<ItemId> {
        self.lodged_item
    }

    pub fn origin_actor(&self) -> Option<CharacterId> {
        self.origin_actor
    }

    pub fn origin_tool(&self) -> Option<ItemId> {
        self.origin_tool
    }

    pub fn treatments(&self) -> Treatments {
        self.treatments
    }

    pub fn infection(&self) -> Option<InfectionId> {
        self.infection
    }

    /// Fraction of the original damage still open (0 when fully healed)
    pub fn severity_ratio(&self) -> f64 {
        if self.original_damage <= 0.0 {
            0.0
        } else {
            self.current_damage / self.original_damage
        }
    }

    pub fn is_healed(&self) -> bool {
        self.current_damage <= 0.0
    }

    /// Healed, stun worn off, nothing lodged and no live infection
    pub fn is_removable(&self) -> bool {
        self.is_healed() && self.current_stun <= 0.0 && self.lodged_item.is_none() && self.infection.is_none()
    }

    /// Skin-breaking external wounds let contamination in
    pub fn is_exposed(&self) -> bool {
        !self.internal && self.damage_type.breaks_skin()
    }

    /// Whether the wound is bleeding externally right now
    pub fn is_bleeding(&self) -> bool {
        !self.internal
            && !self.treatments.bandaged
            && self.current_damage > 0.0
            && self.damage_type.bleeds()
    }

    /// Litres per hour lost through this wound
    pub fn bleed_rate(&self, config: &EngineConfig) -> f64 {
        if self.is_bleeding() {
            self.current_damage * self.bleed_modifier * config.bleed_rate_per_damage_hour
        } else {
            0.0
        }
    }

    /// Multiplier on the strategy's healing rate. Lodged items block healing.
    pub fn healing_multiplier(&self, config: &EngineConfig) -> f64 {
        if self.lodged_item.is_some() {
            return 0.0;
        }
        let mut multiplier = 1.0;
        if self.treatments.sutured {
            multiplier *= config.suture_healing_multiplier;
        }
        if self.infection.is_some() {
            multiplier *= config.infected_healing_multiplier;
        }
        multiplier
    }

    /// Remove up to `amount` damage; returns how much was actually healed
    pub fn heal(&mut self, amount: f64) -> f64 {
        if amount <= 0.0 {
            return 0.0;
        }
        let healed = amount.min(self.current_damage);
        self.current_damage -= healed;
        if self.current_damage < 0.0 {
            self.current_damage = 0.0;
        }
        self.rescale();
        healed
    }

    pub fn recover_stun(&mut self, amount: f64) {
        self.current_stun = (self.current_stun - amount.max(0.0)).max(0.0);
    }

    /// Add a fresh injury on top of this wound
    pub fn reinjure(&mut self, damage: f64, pain: f64, shock: f64, stun: f64) {
        let damage = damage.max(0.0);
        self.original_damage += damage;
        self.current_damage += damage;
        self.peak_pain += pain.max(0.0);
        self.peak_shock += shock.max(0.0);
        self.current_stun += stun.max(0.0);
        // A fresh injury reopens the wound
        self.treatments.bandaged = false;
        self.treatments.sutured = false;
        self.rescale();
    }

    /// Returns false if the treatment was already applied
    pub fn treat(&mut self, treatment: Treatment) -> bool {
        if self.treatments.has(treatment) {
            return false;
        }
        self.treatments.set(treatment);
        true
    }

    pub fn remove_lodged_item(&mut self) -> Option<ItemId> {
        self.lodged_item.take()
    }

    pub(crate) fn set_infection(&mut self, infection: Option<InfectionId>) {
        self.infection = infection;
    }

    fn rescale(&mut self) {
        let ratio = self.severity_ratio();
        self.current_pain = self.peak_pain * ratio;
        self.current_shock = self.peak_shock * ratio;
    }
}
