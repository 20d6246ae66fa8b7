//! Body prototypes: named templates that group bodypart prototypes

use serde::{Deserialize, Serialize};

use crate::core::types::{BodyProtoId, BodypartId};

/// Clothing/armour size class a body wears
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WearSize {
    Tiny,
    Small,
    #[default]
    Normal,
    Large,
    Huge,
}

/// Presentation rule: describe a set of parts by one phrase ("both hands")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodypartGroupDescriber {
    pub description: String,
    pub parts: Vec<BodypartId>,
}

impl BodypartGroupDescriber {
    /// True when every part of the group appears in `parts`
    pub fn matches(&self, parts: &[BodypartId]) -> bool {
        !self.parts.is_empty() && self.parts.iter().all(|p| parts.contains(p))
    }
}

fn default_min_legs() -> u32 {
    1
}

/// Named body template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyPrototype {
    pub id: BodyProtoId,
    pub name: String,
    /// Part used for unarmed smashing attacks
    #[serde(default)]
    pub default_smashing_part: Option<BodypartId>,
    #[serde(default = "default_min_legs")]
    pub min_legs_to_stand: u32,
    /// 0 means the body cannot fly
    #[serde(default)]
    pub min_wings_to_fly: u32,
    #[serde(default)]
    pub wear_size: WearSize,
    #[serde(default)]
    pub group_describers: Vec<BodypartGroupDescriber>,
}

impl BodyPrototype {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id: BodyProtoId(id),
            name: name.to_string(),
            default_smashing_part: None,
            min_legs_to_stand: default_min_legs(),
            min_wings_to_fly: 0,
            wear_size: WearSize::Normal,
            group_describers: Vec::new(),
        }
    }

    /// Describers that fully match `parts`, largest groups first
    pub fn matching_groups(&self, parts: &[BodypartId]) -> Vec<&BodypartGroupDescriber> {
        let mut groups: Vec<_> = self
            .group_describers
            .iter()
            .filter(|g| g.matches(parts))
            .collect();
        groups.sort_by(|a, b| b.parts.len().cmp(&a.parts.len()));
        groups
    }
}
