//! Property tests for the quantities that must stay in bounds whatever the
//! inputs: wound damage, armour residuals, infection intensity and immunity.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

use injury_engine::anatomy::{BodyGraph, BodyPrototype, BodypartKind, BodypartPrototype};
use injury_engine::armour::{mitigate, ArmourCatalog, ArmourType, IncomingDamage, Material, MitigationResult, WornItem};
use injury_engine::combat::{damage, DamageSource, RawDamage};
use injury_engine::core::types::{ArmourTypeId, BodypartId, CharacterId, DamageType, ItemId, MaterialId};
use injury_engine::core::EngineConfig;
use injury_engine::entity::Body;
use injury_engine::health::{Infection, InfectionKind, InfectionSimulator, Wound};

fn arm_graph() -> BodyGraph {
    BodyGraph::new(
        BodyPrototype::new(1, "test"),
        vec![
            BodypartPrototype::new(1, "torso", BodypartKind::External, 100.0),
            BodypartPrototype::new(2, "arm", BodypartKind::Limb, 40.0).with_parent(1),
        ],
        vec![],
    )
    .unwrap()
}

fn armour_catalog(types: &[(f64, f64, f64)]) -> ArmourCatalog {
    let mut catalog = ArmourCatalog::new();
    catalog.insert_material(Material {
        id: MaterialId(1),
        name: "iron".into(),
        hardness: 1.2,
    });
    for (i, &(minimum, base, stacked)) in types.iter().enumerate() {
        catalog.insert_armour_type(ArmourType {
            id: ArmourTypeId(i as u32 + 1),
            name: format!("layer {}", i + 1),
            minimum_penetration_degree: minimum,
            base_difficulty_degrees: base,
            stacked_difficulty_degrees: stacked,
            damage_type_multipliers: Default::default(),
        });
    }
    catalog
}

fn worn(armour_type: u32, layer: u8) -> WornItem {
    WornItem {
        item: ItemId::new(),
        name: format!("layer {}", layer),
        armour_type: ArmourTypeId(armour_type),
        material: Some(MaterialId(1)),
        layer,
        covers: vec![BodypartId(1)],
    }
}

fn layer_strategy() -> impl Strategy<Value = (f64, f64, f64)> {
    (0.0..3.0f64, 0.0..10.0f64, 0.0..2.0f64)
}

proptest! {
    #[test]
    fn prop_extra_layer_never_increases_residual(
        layers in prop::collection::vec(layer_strategy(), 0..4),
        extra in layer_strategy(),
        damage in 0.0..200.0f64,
        degree in 0.0..10.0f64,
    ) {
        let config = EngineConfig::default();
        let graph = arm_graph();
        let torso = graph.get(BodypartId(1)).unwrap();

        let mut types = layers.clone();
        types.push(extra);
        let catalog = armour_catalog(&types);

        let incoming = IncomingDamage {
            damage,
            penetration_degree: degree,
            damage_type: DamageType::Slashing,
        };
        let inner: Vec<WornItem> = (0..layers.len()).map(|i| worn(i as u32 + 1, i as u8)).collect();
        let mut outer = inner.clone();
        outer.push(worn(types.len() as u32, 10));

        let without = mitigate(&incoming, &inner, torso, &catalog, &config);
        let with = mitigate(&incoming, &outer, torso, &catalog, &config);

        prop_assert!(with.residual_damage <= without.residual_damage + 1e-9);
        prop_assert!(with.residual_damage >= 0.0);
        prop_assert!(without.residual_damage <= damage + 1e-9);
    }

    #[test]
    fn prop_wound_damage_stays_within_original(
        hits in prop::collection::vec((0.0..60.0f64, 0.0..60.0f64), 1..8),
        heal_hours in prop::collection::vec(0u64..48, 0..8),
    ) {
        let config = EngineConfig::default();
        let graph = arm_graph();
        let arm = graph.get(BodypartId(2)).unwrap();
        let mut body = Body::new(CharacterId::new(), &graph, 70.0, 175.0, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        for (amount, pain) in hits {
            let raw = RawDamage {
                damage: amount,
                pain,
                stun: 0.0,
                damage_type: DamageType::Crushing,
                penetration_degree: 0.0,
            };
            let incoming = IncomingDamage {
                damage: amount,
                penetration_degree: 0.0,
                damage_type: DamageType::Crushing,
            };
            let mitigation = MitigationResult::unmitigated(&incoming);
            damage::apply(&raw, &mitigation, arm, &mut body, &graph, &DamageSource::default(), &config);
        }
        for h in heal_hours {
            body.tick(Duration::from_secs(h * 3600), &graph, &config, &mut rng);
        }

        for wound in body.wounds().wounds() {
            prop_assert!(wound.current_damage() >= 0.0);
            prop_assert!(wound.current_damage() <= wound.original_damage() + 1e-9);
            prop_assert!((0.0..=1.0).contains(&wound.severity_ratio()));
            prop_assert!(wound.current_pain() >= 0.0);
        }
        prop_assert!(body.blood_volume() >= 0.0);
        prop_assert!(body.blood_volume() <= body.max_blood_volume() + 1e-9);
    }

    #[test]
    fn prop_heal_never_goes_negative(damage in 0.0..100.0f64, heals in prop::collection::vec(0.0..50.0f64, 0..10)) {
        let mut wound = Wound::new(BodypartId(1), DamageType::Slashing, damage);
        let mut healed = 0.0;
        for amount in heals {
            healed += wound.heal(amount);
        }
        prop_assert!(wound.current_damage() >= 0.0);
        prop_assert!((healed + wound.current_damage() - damage).abs() < 1e-6);
    }

    #[test]
    fn prop_infection_intensity_and_immunity_bounded(
        virulence in 0.0..1.0f64,
        intensity in 0.0..1.0f64,
        hours in prop::collection::vec(0u64..200, 1..6),
        kind in prop_oneof![
            Just(InfectionKind::Simple),
            Just(InfectionKind::Gangrene),
            Just(InfectionKind::Necrotic),
        ],
    ) {
        let config = EngineConfig::default();
        let simulator = InfectionSimulator::new(&config);
        let mut infection = Infection::new(kind, virulence, intensity);
        for h in hours {
            simulator.tick(&mut infection, Duration::from_secs(h * 3600));
            prop_assert!((0.0..=1.0).contains(&infection.intensity()));
            prop_assert!((0.0..=1.0).contains(&infection.immunity()));
        }
    }
}
