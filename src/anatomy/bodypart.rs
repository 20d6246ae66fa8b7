//! Bodypart prototypes: the static description of one anatomical part

use serde::{Deserialize, Serialize};

use crate::core::types::{ArmourTypeId, BodypartId, MaterialId};

/// Anatomical category of a bodypart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodypartKind {
    /// Generic external surface (torso, head)
    External,
    /// Arms, legs, wings, tails
    Limb,
    /// Hands, feet
    Extremity,
    /// Fingers, toes
    Digit,
    /// Skin/hide layer
    Skin,
    /// Internal organ
    Organ,
    /// Internal bone
    Bone,
}

impl BodypartKind {
    /// Internal parts are only reached through coverage redirection
    pub fn is_internal(&self) -> bool {
        matches!(self, BodypartKind::Organ | BodypartKind::Bone)
    }
}

/// Functional role a limb plays for posture and movement rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimbRole {
    Leg,
    Arm,
    Wing,
    Tail,
    Head,
}

/// Horizontal side of a body (eight compass steps around the body)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Front,
    FrontRight,
    Right,
    RearRight,
    Rear,
    RearLeft,
    Left,
    FrontLeft,
    /// Reachable from any side
    Irrelevant,
}

impl Alignment {
    fn compass_index(&self) -> Option<u8> {
        match self {
            Alignment::Front => Some(0),
            Alignment::FrontRight => Some(1),
            Alignment::Right => Some(2),
            Alignment::RearRight => Some(3),
            Alignment::Rear => Some(4),
            Alignment::RearLeft => Some(5),
            Alignment::Left => Some(6),
            Alignment::FrontLeft => Some(7),
            Alignment::Irrelevant => None,
        }
    }

    /// Number of 45° steps between two sides (0..=4), None if either is irrelevant
    pub fn steps_to(&self, other: Alignment) -> Option<u8> {
        let a = self.compass_index()?;
        let b = other.compass_index()?;
        let diff = a.abs_diff(b);
        Some(diff.min(8 - diff))
    }
}

/// Vertical band of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Highest,
    High,
    Centre,
    Low,
    Lowest,
    /// Reachable from any height (tails, wings)
    Appendage,
    Irrelevant,
}

impl Orientation {
    fn band(&self) -> Option<u8> {
        match self {
            Orientation::Highest => Some(0),
            Orientation::High => Some(1),
            Orientation::Centre => Some(2),
            Orientation::Low => Some(3),
            Orientation::Lowest => Some(4),
            Orientation::Appendage | Orientation::Irrelevant => None,
        }
    }

    /// Number of height bands between two orientations
    pub fn bands_to(&self, other: Orientation) -> Option<u8> {
        Some(self.band()?.abs_diff(other.band()?))
    }
}

fn default_modifier() -> f64 {
    1.0
}

fn default_hit_chance() -> f64 {
    100.0
}

/// Static template for one bodypart of a body type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodypartPrototype {
    pub id: BodypartId,
    pub name: String,
    pub kind: BodypartKind,
    #[serde(default)]
    pub shape: String,
    /// Free-text anatomical location ("upper left chest")
    #[serde(default)]
    pub location: String,
    pub alignment: Alignment,
    pub orientation: Orientation,
    /// Attachment parent; severing the parent severs this part too
    #[serde(default)]
    pub parent: Option<BodypartId>,
    pub max_life: f64,
    /// Cumulative damage at which the part is severed; None = cannot be severed
    #[serde(default)]
    pub severed_threshold: Option<f64>,
    #[serde(default = "default_modifier")]
    pub pain_modifier: f64,
    #[serde(default = "default_modifier")]
    pub bleed_modifier: f64,
    #[serde(default = "default_modifier")]
    pub damage_modifier: f64,
    #[serde(default = "default_modifier")]
    pub stun_modifier: f64,
    #[serde(default = "default_hit_chance")]
    pub relative_hit_chance: f64,
    #[serde(default = "default_modifier")]
    pub relative_infectability: f64,
    #[serde(default)]
    pub is_vital: bool,
    /// Natural armour (hide, scales, skull)
    #[serde(default)]
    pub armour_type: Option<ArmourTypeId>,
    #[serde(default)]
    pub material: Option<MaterialId>,
    #[serde(default)]
    pub implant_space: f64,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub limb: Option<LimbRole>,
}

impl BodypartPrototype {
    /// Minimal prototype for tests and programmatic bodies
    pub fn new(id: u32, name: &str, kind: BodypartKind, max_life: f64) -> Self {
        Self {
            id: BodypartId(id),
            name: name.to_string(),
            kind,
            shape: String::new(),
            location: String::new(),
            alignment: Alignment::Irrelevant,
            orientation: Orientation::Irrelevant,
            parent: None,
            max_life,
            severed_threshold: None,
            pain_modifier: 1.0,
            bleed_modifier: 1.0,
            damage_modifier: 1.0,
            stun_modifier: 1.0,
            relative_hit_chance: default_hit_chance(),
            relative_infectability: 1.0,
            is_vital: false,
            armour_type: None,
            material: None,
            implant_space: 0.0,
            display_order: id as i32,
            limb: None,
        }
    }

    pub fn with_parent(mut self, parent: u32) -> Self {
        self.parent = Some(BodypartId(parent));
        self
    }

    pub fn with_hit_chance(mut self, chance: f64) -> Self {
        self.relative_hit_chance = chance;
        self
    }

    pub fn with_severed_threshold(mut self, threshold: f64) -> Self {
        self.severed_threshold = Some(threshold);
        self
    }

    pub fn vital(mut self) -> Self {
        self.is_vital = true;
        self
    }

    pub fn with_limb(mut self, role: LimbRole) -> Self {
        self.limb = Some(role);
        self
    }

    pub fn can_sever(&self) -> bool {
        self.severed_threshold.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_steps_wrap_around() {
        assert_eq!(Alignment::Front.steps_to(Alignment::Front), Some(0));
        assert_eq!(Alignment::Front.steps_to(Alignment::FrontLeft), Some(1));
        assert_eq!(Alignment::FrontRight.steps_to(Alignment::Left), Some(3));
        assert_eq!(Alignment::Front.steps_to(Alignment::Rear), Some(4));
        assert_eq!(Alignment::Front.steps_to(Alignment::Irrelevant), None);
    }

    #[test]
    fn test_orientation_bands() {
        assert_eq!(Orientation::Highest.bands_to(Orientation::Lowest), Some(4));
        assert_eq!(Orientation::Low.bands_to(Orientation::Centre), Some(1));
        assert_eq!(Orientation::Appendage.bands_to(Orientation::High), None);
    }

    #[test]
    fn test_internal_kinds() {
        assert!(BodypartKind::Organ.is_internal());
        assert!(BodypartKind::Bone.is_internal());
        assert!(!BodypartKind::Limb.is_internal());
    }

    #[test]
    fn test_toml_defaults() {
        let part: BodypartPrototype = toml::from_str(
            r#"
            id = 4
            name = "left upper arm"
            kind = "limb"
            alignment = "front_left"
            orientation = "high"
            max_life = 40.0
            "#,
        )
        .unwrap();
        assert_eq!(part.pain_modifier, 1.0);
        assert_eq!(part.relative_hit_chance, 100.0);
        assert!(!part.can_sever());
        assert_eq!(part.parent, None);
    }
}
