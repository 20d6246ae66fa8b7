//! Core type definitions used throughout the codebase

use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a live body instance
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[display(fmt = "body:{}", _0)]
pub struct BodyId(pub Uuid);

impl BodyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BodyId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier of the character that owns a body (owned by the character layer)
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display(fmt = "character:{}", _0)]
pub struct CharacterId(pub Uuid);

impl CharacterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CharacterId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier of an item owned by the inventory layer
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display(fmt = "item:{}", _0)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable arena index of a bodypart prototype.
///
/// Stays valid after severance so historical wounds can still name the part.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[display(fmt = "bodypart#{}", _0)]
pub struct BodypartId(pub u32);

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display(fmt = "body-proto#{}", _0)]
pub struct BodyProtoId(pub u32);

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display(fmt = "armour#{}", _0)]
pub struct ArmourTypeId(pub u32);

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display(fmt = "material#{}", _0)]
pub struct MaterialId(pub u32);

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display(fmt = "attack#{}", _0)]
pub struct AttackId(pub u32);

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display(fmt = "action#{}", _0)]
pub struct CombatActionId(pub u32);

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display(fmt = "pattern#{}", _0)]
pub struct DamagePatternId(pub u32);

/// Per-body wound counter value
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[display(fmt = "wound#{}", _0)]
pub struct WoundId(pub u64);

/// Per-body infection counter value
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[display(fmt = "infection#{}", _0)]
pub struct InfectionId(pub u64);

/// Scheduler tick counter (simulation time unit)
pub type Tick = u64;

/// Category of harm a wound was caused by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Slashing,
    Chopping,
    Crushing,
    Piercing,
    Ballistic,
    Burning,
    Freezing,
    Chemical,
    Shockwave,
    Bite,
    Claw,
    Electrical,
    Hypoxia,
    Cellular,
}

impl DamageType {
    /// Damage types that break the skin and can carry contamination in
    pub fn breaks_skin(&self) -> bool {
        matches!(
            self,
            DamageType::Slashing
                | DamageType::Chopping
                | DamageType::Piercing
                | DamageType::Ballistic
                | DamageType::Bite
                | DamageType::Claw
                | DamageType::Burning
        )
    }

    /// Damage types whose wounds bleed externally
    pub fn bleeds(&self) -> bool {
        matches!(
            self,
            DamageType::Slashing
                | DamageType::Chopping
                | DamageType::Piercing
                | DamageType::Ballistic
                | DamageType::Bite
                | DamageType::Claw
        )
    }
}
