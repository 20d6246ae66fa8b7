//! Armour mitigation: worn layers reduce an attack before it reaches a bodypart
//!
//! Layers are traversed outermost to innermost, with the bodypart's natural
//! armour (hide, skull) last. For the `k`-th layer actually traversed:
//!
//! ```text
//! threshold = minimum_penetration_degree + stacked_difficulty_degrees × ln(1 + k)
//! degree <  threshold  → attack fully absorbed
//! margin    = degree − threshold
//! base      = min(base_difficulty × type_multiplier × hardness × reduction_per_degree, max_layer_reduction)
//! pass     *= 1 − base / (1 + ln(1 + margin))
//! degree    = margin
//! damage    = incoming × pass
//! ```
//!
//! Adding a layer anywhere only lowers the degree reaching later layers and
//! raises their thresholds, so residual damage never grows with more armour.

use tracing::warn;

use super::armour_type::{ArmourCatalog, WornItem};
use crate::anatomy::BodypartPrototype;
use crate::core::config::EngineConfig;
use crate::core::types::{ArmourTypeId, DamageType, ItemId, MaterialId};

/// Damage arriving at the outermost layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncomingDamage {
    pub damage: f64,
    pub penetration_degree: f64,
    pub damage_type: DamageType,
}

/// Where a protective layer comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerSource {
    Item(ItemId),
    Natural,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MitigationResult {
    pub residual_damage: f64,
    pub residual_penetration_degree: f64,
    /// Number of layers that took part in mitigation
    pub layers_traversed: usize,
    /// Layer that stopped the attack outright
    pub absorbed_by: Option<LayerSource>,
    /// Product of the per-layer `1 − reduction` factors; 0 when absorbed.
    /// Scales pain and stun, which are rolled separately from damage.
    pub passthrough: f64,
}

impl MitigationResult {
    /// The attack passes untouched
    pub fn unmitigated(incoming: &IncomingDamage) -> Self {
        Self {
            residual_damage: incoming.damage,
            residual_penetration_degree: incoming.penetration_degree,
            layers_traversed: 0,
            absorbed_by: None,
            passthrough: 1.0,
        }
    }

    pub fn absorbed(&self) -> bool {
        self.absorbed_by.is_some()
    }
}

struct Layer {
    source: LayerSource,
    armour_type: ArmourTypeId,
    material: Option<MaterialId>,
}

/// Reduce `incoming` through every item covering `bodypart`.
///
/// `covering` may be in any order; items that don't cover the part are
/// ignored. A missing armour type or material degrades to bare skin.
pub fn mitigate(
    incoming: &IncomingDamage,
    covering: &[WornItem],
    bodypart: &BodypartPrototype,
    catalog: &ArmourCatalog,
    config: &EngineConfig,
) -> MitigationResult {
    let mut items: Vec<&WornItem> = covering.iter().filter(|i| i.covers(bodypart.id)).collect();
    items.sort_by(|a, b| b.layer.cmp(&a.layer));

    let mut layers: Vec<Layer> = items
        .into_iter()
        .map(|item| Layer {
            source: LayerSource::Item(item.item),
            armour_type: item.armour_type,
            material: item.material,
        })
        .collect();
    if let Some(natural) = bodypart.armour_type {
        layers.push(Layer {
            source: LayerSource::Natural,
            armour_type: natural,
            material: bodypart.material,
        });
    }

    let mut result = MitigationResult::unmitigated(incoming);
    if layers.is_empty() {
        return result;
    }

    let mut passthrough = 1.0;
    let mut degree = incoming.penetration_degree;
    let mut traversed = 0usize;

    for layer in &layers {
        let Some(armour) = catalog.armour_type(layer.armour_type) else {
            warn!(
                armour_type = %layer.armour_type,
                bodypart = %bodypart.name,
                "missing armour type, treating layer as bare skin"
            );
            continue;
        };
        let hardness = match layer.material {
            Some(id) => match catalog.material(id) {
                Some(material) => material.hardness,
                None => {
                    warn!(material = %id, armour = %armour.name, "missing material, using hardness 1.0");
                    1.0
                }
            },
            None => 1.0,
        };

        let threshold = armour.minimum_penetration_degree
            + armour.stacked_difficulty_degrees * (1.0 + traversed as f64).ln();
        traversed += 1;

        if degree < threshold {
            result.residual_damage = 0.0;
            result.residual_penetration_degree = 0.0;
            result.layers_traversed = traversed;
            result.absorbed_by = Some(layer.source);
            result.passthrough = 0.0;
            return result;
        }

        let margin = degree - threshold;
        let base = (armour.base_difficulty_degrees
            * armour.multiplier(incoming.damage_type)
            * hardness
            * config.reduction_per_degree)
            .clamp(0.0, config.max_layer_reduction);
        let reduction = base / (1.0 + (1.0 + margin).ln());

        passthrough *= 1.0 - reduction;
        degree = margin;
    }

    result.residual_damage = (incoming.damage * passthrough).max(0.0);
    result.passthrough = passthrough;
    result.residual_penetration_degree = degree;
    result.layers_traversed = traversed;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anatomy::BodypartKind;
    use crate::armour::armour_type::{ArmourType, Material};
    use crate::core::types::BodypartId;
    use std::collections::BTreeMap;

    fn catalog() -> ArmourCatalog {
        let mut catalog = ArmourCatalog::new();
        catalog.insert_armour_type(ArmourType {
            id: ArmourTypeId(1),
            name: "padded".into(),
            minimum_penetration_degree: 0.0,
            base_difficulty_degrees: 2.0,
            stacked_difficulty_degrees: 1.0,
            damage_type_multipliers: BTreeMap::new(),
        });
        catalog.insert_armour_type(ArmourType {
            id: ArmourTypeId(2),
            name: "plate".into(),
            minimum_penetration_degree: 6.0,
            base_difficulty_degrees: 6.0,
            stacked_difficulty_degrees: 2.0,
            damage_type_multipliers: BTreeMap::new(),
        });
        catalog.insert_material(Material {
            id: MaterialId(1),
            name: "steel".into(),
            hardness: 1.2,
        });
        catalog
    }

    fn chest() -> BodypartPrototype {
        BodypartPrototype::new(1, "chest", BodypartKind::External, 100.0)
    }

    fn worn(armour: u32, layer: u8) -> WornItem {
        WornItem {
            item: ItemId::new(),
            name: format!("layer {}", layer),
            armour_type: ArmourTypeId(armour),
            material: None,
            layer,
            covers: vec![BodypartId(1)],
        }
    }

    fn slash(damage: f64, degree: f64) -> IncomingDamage {
        IncomingDamage {
            damage,
            penetration_degree: degree,
            damage_type: DamageType::Slashing,
        }
    }

    #[test]
    fn test_uncovered_part_unmodified() {
        let incoming = slash(12.0, 4.0);
        let result = mitigate(&incoming, &[], &chest(), &catalog(), &EngineConfig::default());
        assert_eq!(result, MitigationResult::unmitigated(&incoming));
    }

    #[test]
    fn test_items_on_other_parts_ignored() {
        let mut item = worn(2, 1);
        item.covers = vec![BodypartId(9)];
        let incoming = slash(12.0, 4.0);
        let result = mitigate(&incoming, &[item], &chest(), &catalog(), &EngineConfig::default());
        assert_eq!(result.residual_damage, 12.0);
    }

    #[test]
    fn test_below_minimum_degree_fully_absorbed() {
        let item = worn(2, 1);
        let result = mitigate(&slash(20.0, 3.0), &[item.clone()], &chest(), &catalog(), &EngineConfig::default());
        assert_eq!(result.residual_damage, 0.0);
        assert_eq!(result.absorbed_by, Some(LayerSource::Item(item.item)));
    }

    #[test]
    fn test_penetrating_layer_reduces_damage() {
        // margin 0: reduction is the full base 2 × 0.1 = 20%
        let result = mitigate(&slash(10.0, 0.0), &[worn(1, 1)], &chest(), &catalog(), &EngineConfig::default());
        assert!((result.residual_damage - 8.0).abs() < 1e-9);
        assert!(!result.absorbed());
    }

    #[test]
    fn test_passthrough_tracks_layers_even_without_damage() {
        let config = EngineConfig::default();
        let stun_only = mitigate(&slash(0.0, 0.0), &[worn(1, 1)], &chest(), &catalog(), &config);
        assert_eq!(stun_only.residual_damage, 0.0);
        assert!((stun_only.passthrough - 0.8).abs() < 1e-9);

        let blocked = mitigate(&slash(0.0, 3.0), &[worn(2, 1)], &chest(), &catalog(), &config);
        assert_eq!(blocked.passthrough, 0.0);
        assert_eq!(MitigationResult::unmitigated(&slash(0.0, 0.0)).passthrough, 1.0);
    }

    #[test]
    fn test_higher_penetration_loses_less_damage() {
        let config = EngineConfig::default();
        let low = mitigate(&slash(10.0, 1.0), &[worn(1, 1)], &chest(), &catalog(), &config);
        let high = mitigate(&slash(10.0, 8.0), &[worn(1, 1)], &chest(), &catalog(), &config);
        assert!(high.residual_damage > low.residual_damage);
    }

    #[test]
    fn test_extra_layer_never_increases_damage() {
        let config = EngineConfig::default();
        let incoming = slash(30.0, 10.0);
        let one = mitigate(&incoming, &[worn(2, 1)], &chest(), &catalog(), &config);
        let two = mitigate(&incoming, &[worn(2, 1), worn(1, 2)], &chest(), &catalog(), &config);
        assert!(two.residual_damage <= one.residual_damage);
    }

    #[test]
    fn test_missing_armour_type_is_bare_skin() {
        let incoming = slash(10.0, 2.0);
        let result = mitigate(&incoming, &[worn(77, 1)], &chest(), &catalog(), &EngineConfig::default());
        assert_eq!(result.residual_damage, 10.0);
        assert_eq!(result.layers_traversed, 0);
    }

    #[test]
    fn test_natural_armour_is_innermost() {
        let mut part = chest();
        part.armour_type = Some(ArmourTypeId(1));
        part.material = Some(MaterialId(1));
        let result = mitigate(&slash(10.0, 0.0), &[], &part, &catalog(), &EngineConfig::default());
        // hardness 1.2: 2 × 1.2 × 0.1 = 24%
        assert!((result.residual_damage - 7.6).abs() < 1e-9);
        assert_eq!(result.layers_traversed, 1);
    }
}
