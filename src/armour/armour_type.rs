//! Armour types, materials and worn items
//!
//! Catalog entries are read-only once loaded; combat never mutates them.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::{ArmourTypeId, BodypartId, DamageType, ItemId, MaterialId};

/// Substance an armour layer or bodypart is made of
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
    /// Multiplier on the base difficulty of armour made from this material
    #[serde(default = "default_hardness")]
    pub hardness: f64,
}

fn default_hardness() -> f64 {
    1.0
}

/// Protective profile of a class of armour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmourType {
    pub id: ArmourTypeId,
    pub name: String,
    /// Penetration degree an attack needs to get through at all
    pub minimum_penetration_degree: f64,
    /// Degrees of difficulty this layer imposes once penetrated
    pub base_difficulty_degrees: f64,
    /// Extra threshold per ln(1 + layers already traversed)
    #[serde(default)]
    pub stacked_difficulty_degrees: f64,
    /// Per damage type multiplier on the base difficulty (default 1.0)
    #[serde(default)]
    pub damage_type_multipliers: BTreeMap<DamageType, f64>,
}

impl ArmourType {
    pub fn multiplier(&self, damage_type: DamageType) -> f64 {
        self.damage_type_multipliers
            .get(&damage_type)
            .copied()
            .unwrap_or(1.0)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.minimum_penetration_degree < 0.0
            || self.base_difficulty_degrees < 0.0
            || self.stacked_difficulty_degrees < 0.0
        {
            return Err(format!("armour type {} has negative degrees", self.name));
        }
        if self.damage_type_multipliers.values().any(|m| *m < 0.0) {
            return Err(format!("armour type {} has a negative multiplier", self.name));
        }
        Ok(())
    }
}

/// A protective item currently worn over one or more bodyparts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WornItem {
    pub item: ItemId,
    pub name: String,
    pub armour_type: ArmourTypeId,
    #[serde(default)]
    pub material: Option<MaterialId>,
    /// Higher layers are worn over lower ones
    pub layer: u8,
    pub covers: Vec<BodypartId>,
}

impl WornItem {
    pub fn covers(&self, part: BodypartId) -> bool {
        self.covers.contains(&part)
    }
}

/// Lookup tables for armour types and materials
#[derive(Debug, Clone, Default)]
pub struct ArmourCatalog {
    armour_types: AHashMap<ArmourTypeId, ArmourType>,
    materials: AHashMap<MaterialId, Material>,
}

impl ArmourCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_armour_type(&mut self, armour: ArmourType) {
        self.armour_types.insert(armour.id, armour);
    }

    pub fn insert_material(&mut self, material: Material) {
        self.materials.insert(material.id, material);
    }

    pub fn armour_type(&self, id: ArmourTypeId) -> Option<&ArmourType> {
        self.armour_types.get(&id)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    pub fn len(&self) -> usize {
        self.armour_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armour_types.is_empty()
    }
}
