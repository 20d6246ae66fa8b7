//! Statistical checks on hit location over many seeded draws

use ahash::AHashMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use injury_engine::anatomy::{Alignment, BodyGraph, BodyPrototype, BodypartKind, BodypartPrototype, CoverageEntry, Orientation};
use injury_engine::combat::{resolve_target, TableHitWeighting};
use injury_engine::core::types::{BodypartId, CharacterId};
use injury_engine::core::EngineConfig;
use injury_engine::entity::Body;

const DRAWS: usize = 100_000;

fn frequencies(graph: &BodyGraph, seed: u64) -> AHashMap<BodypartId, f64> {
    let body = Body::new(CharacterId::new(), graph, 70.0, 175.0, &EngineConfig::default());
    let weighting = TableHitWeighting::default();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut counts: AHashMap<BodypartId, usize> = AHashMap::new();
    for _ in 0..DRAWS {
        let hit = resolve_target(
            Alignment::Irrelevant,
            Orientation::Irrelevant,
            &body,
            graph,
            &weighting,
            &mut rng,
        )
        .unwrap();
        *counts.entry(hit.bodypart).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(id, n)| (id, n as f64 / DRAWS as f64))
        .collect()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 0.01,
        "observed {:.4}, expected {:.4}",
        actual,
        expected
    );
}

#[test]
fn test_weighted_chances_match_relative_hit_chance() {
    let graph = BodyGraph::new(
        BodyPrototype::new(1, "test"),
        vec![
            BodypartPrototype::new(1, "torso", BodypartKind::External, 50.0).with_hit_chance(100.0),
            BodypartPrototype::new(2, "arm", BodypartKind::Limb, 50.0)
                .with_parent(1)
                .with_hit_chance(50.0),
            BodypartPrototype::new(3, "hand", BodypartKind::Extremity, 50.0)
                .with_parent(2)
                .with_hit_chance(25.0),
        ],
        vec![],
    )
    .unwrap();

    let freq = frequencies(&graph, 0xC0FFEE);
    assert_close(freq[&BodypartId(1)], 100.0 / 175.0);
    assert_close(freq[&BodypartId(2)], 50.0 / 175.0);
    assert_close(freq[&BodypartId(3)], 25.0 / 175.0);
}

#[test]
fn test_coverage_splits_bone_hits() {
    let graph = BodyGraph::new(
        BodyPrototype::new(1, "test"),
        vec![
            BodypartPrototype::new(1, "flank", BodypartKind::External, 50.0).with_hit_chance(100.0),
            BodypartPrototype::new(2, "ribs", BodypartKind::Bone, 50.0)
                .with_parent(1)
                .with_hit_chance(100.0),
            BodypartPrototype::new(3, "lung", BodypartKind::Organ, 30.0)
                .with_parent(2)
                .with_hit_chance(100.0),
        ],
        vec![CoverageEntry {
            bone: BodypartId(2),
            organ: BodypartId(3),
            probability: 0.5,
        }],
    )
    .unwrap();

    // The organ is never drawn directly, only through the ribs
    let freq = frequencies(&graph, 17);
    assert_close(freq[&BodypartId(1)], 0.5);
    assert_close(freq[&BodypartId(2)], 0.25);
    assert_close(freq[&BodypartId(3)], 0.25);
}
