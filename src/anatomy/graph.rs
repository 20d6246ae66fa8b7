//! BodyGraph: the validated, immutable bodypart arena of one body prototype
//!
//! Parts live in a flat arena keyed by `BodypartId`. Parent/child edges and
//! bone→organ coverage are adjacency lists, so severing a part on a body
//! instance never touches the graph itself.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::bodypart::{BodypartKind, BodypartPrototype, LimbRole};
use super::prototype::BodyPrototype;
use crate::core::error::{EngineError, Result};
use crate::core::types::BodypartId;

/// One bone→organ coverage edge as authored in data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageEntry {
    pub bone: BodypartId,
    pub organ: BodypartId,
    pub probability: f64,
}

#[derive(Debug, Clone)]
pub struct BodyGraph {
    prototype: BodyPrototype,
    /// Sorted by display order, then id
    parts: Vec<BodypartPrototype>,
    index: AHashMap<BodypartId, usize>,
    children: AHashMap<BodypartId, Vec<BodypartId>>,
    coverage: AHashMap<BodypartId, Vec<(BodypartId, f64)>>,
}

impl BodyGraph {
    /// Build and validate a graph. Any violation is a `GraphIntegrity` error.
    pub fn new(
        prototype: BodyPrototype,
        mut parts: Vec<BodypartPrototype>,
        coverage: Vec<CoverageEntry>,
    ) -> Result<Self> {
        let integrity = |reason: String| EngineError::GraphIntegrity {
            prototype: prototype.name.clone(),
            reason,
        };

        parts.sort_by(|a, b| a.display_order.cmp(&b.display_order).then(a.id.cmp(&b.id)));

        let mut index = AHashMap::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            if index.insert(part.id, i).is_some() {
                return Err(integrity(format!("duplicate bodypart id {}", part.id)));
            }
            if part.max_life <= 0.0 {
                return Err(integrity(format!("{} has non-positive max life", part.name)));
            }
            if let Some(threshold) = part.severed_threshold {
                if threshold > part.max_life {
                    return Err(integrity(format!(
                        "{} severed threshold {} exceeds max life {}",
                        part.name, threshold, part.max_life
                    )));
                }
            }
        }

        let mut children: AHashMap<BodypartId, Vec<BodypartId>> = AHashMap::new();
        for part in &parts {
            if let Some(parent) = part.parent {
                if !index.contains_key(&parent) {
                    return Err(integrity(format!(
                        "{} references missing parent {}",
                        part.name, parent
                    )));
                }
                children.entry(parent).or_default().push(part.id);
            }
        }

        // Any parent chain longer than the arena must revisit a node
        for part in &parts {
            let mut steps = 0;
            let mut cursor = part.parent;
            while let Some(current) = cursor {
                if current == part.id || steps > parts.len() {
                    return Err(integrity(format!("{} is its own ancestor", part.name)));
                }
                steps += 1;
                cursor = parts[index[&current]].parent;
            }
        }

        let mut coverage_map: AHashMap<BodypartId, Vec<(BodypartId, f64)>> = AHashMap::new();
        for entry in coverage {
            let bone = index
                .get(&entry.bone)
                .map(|&i| &parts[i])
                .ok_or_else(|| integrity(format!("coverage references missing bone {}", entry.bone)))?;
            let organ = index
                .get(&entry.organ)
                .map(|&i| &parts[i])
                .ok_or_else(|| integrity(format!("coverage references missing organ {}", entry.organ)))?;
            if bone.kind != BodypartKind::Bone {
                return Err(integrity(format!("coverage source {} is not a bone", bone.name)));
            }
            if organ.kind != BodypartKind::Organ {
                return Err(integrity(format!("coverage target {} is not an organ", organ.name)));
            }
            if !(0.0..=1.0).contains(&entry.probability) {
                return Err(integrity(format!(
                    "coverage {} -> {} has probability {} outside [0, 1]",
                    bone.name, organ.name, entry.probability
                )));
            }
            coverage_map
                .entry(entry.bone)
                .or_default()
                .push((entry.organ, entry.probability));
        }

        for group in &prototype.group_describers {
            if let Some(missing) = group.parts.iter().find(|p| !index.contains_key(p)) {
                return Err(integrity(format!(
                    "group describer '{}' references missing bodypart {}",
                    group.description, missing
                )));
            }
        }

        if let Some(smash) = prototype.default_smashing_part {
            if !index.contains_key(&smash) {
                return Err(integrity(format!("default smashing part {} is missing", smash)));
            }
        }

        Ok(Self {
            prototype,
            parts,
            index,
            children,
            coverage: coverage_map,
        })
    }

    pub fn prototype(&self) -> &BodyPrototype {
        &self.prototype
    }

    /// All bodyparts in display order. The iterator can be cloned and restarted.
    pub fn bodyparts(&self) -> std::slice::Iter<'_, BodypartPrototype> {
        self.parts.iter()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn get(&self, id: BodypartId) -> Option<&BodypartPrototype> {
        self.index.get(&id).map(|&i| &self.parts[i])
    }

    /// Organ coverage of a bone as (organ, probability); empty for non-bones
    pub fn coverage(&self, bone: BodypartId) -> &[(BodypartId, f64)] {
        self.coverage.get(&bone).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn children(&self, id: BodypartId) -> &[BodypartId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every part attached below `id`, breadth first, excluding `id`
    pub fn descendants(&self, id: BodypartId) -> Vec<BodypartId> {
        let mut out = Vec::new();
        let mut queue: VecDeque<BodypartId> = self.children(id).iter().copied().collect();
        while let Some(next) = queue.pop_front() {
            out.push(next);
            queue.extend(self.children(next).iter().copied());
        }
        out
    }

    /// Count parts with `role` that are not in `severed`
    pub fn count_limbs(&self, role: LimbRole, severed: &AHashSet<BodypartId>) -> u32 {
        self.parts
            .iter()
            .filter(|p| p.limb == Some(role) && !severed.contains(&p.id))
            .count() as u32
    }

    pub fn vital_parts(&self) -> impl Iterator<Item = &BodypartPrototype> {
        self.parts.iter().filter(|p| p.is_vital)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anatomy::prototype::BodypartGroupDescriber;

    fn parts() -> Vec<BodypartPrototype> {
        vec![
            BodypartPrototype::new(1, "torso", BodypartKind::External, 100.0),
            BodypartPrototype::new(2, "arm", BodypartKind::Limb, 50.0)
                .with_parent(1)
                .with_severed_threshold(50.0),
            BodypartPrototype::new(3, "hand", BodypartKind::Extremity, 30.0).with_parent(2),
            BodypartPrototype::new(4, "ribs", BodypartKind::Bone, 60.0).with_parent(1),
            BodypartPrototype::new(5, "heart", BodypartKind::Organ, 20.0)
                .with_parent(1)
                .vital(),
        ]
    }

    fn graph_err(parts: Vec<BodypartPrototype>, coverage: Vec<CoverageEntry>) -> String {
        match BodyGraph::new(BodyPrototype::new(1, "test"), parts, coverage) {
            Err(EngineError::GraphIntegrity { reason, .. }) => reason,
            other => panic!("expected integrity error, got {:?}", other.map(|g| g.len())),
        }
    }

    #[test]
    fn test_valid_graph() {
        let coverage = vec![CoverageEntry {
            bone: BodypartId(4),
            organ: BodypartId(5),
            probability: 0.4,
        }];
        let graph = BodyGraph::new(BodyPrototype::new(1, "test"), parts(), coverage).unwrap();
        assert_eq!(graph.len(), 5);
        assert_eq!(graph.coverage(BodypartId(4)), &[(BodypartId(5), 0.4)]);
        assert!(graph.coverage(BodypartId(2)).is_empty());
        assert_eq!(graph.descendants(BodypartId(2)), vec![BodypartId(3)]);
        assert_eq!(graph.vital_parts().count(), 1);
    }

    #[test]
    fn test_bodyparts_iteration_is_restartable() {
        let graph = BodyGraph::new(BodyPrototype::new(1, "test"), parts(), vec![]).unwrap();
        let iter = graph.bodyparts();
        let first: Vec<_> = iter.clone().map(|p| p.id).collect();
        let second: Vec<_> = iter.map(|p| p.id).collect();
        assert_eq!(first, second);
        assert_eq!(first[0], BodypartId(1));
    }

    #[test]
    fn test_cycle_detected() {
        let mut parts = parts();
        parts[0].parent = Some(BodypartId(3));
        let reason = graph_err(parts, vec![]);
        assert!(reason.contains("own ancestor"), "{}", reason);
    }

    #[test]
    fn test_self_parent_detected() {
        let mut parts = parts();
        parts[1].parent = Some(BodypartId(2));
        assert!(graph_err(parts, vec![]).contains("own ancestor"));
    }

    #[test]
    fn test_missing_parent_detected() {
        let mut parts = parts();
        parts[2].parent = Some(BodypartId(99));
        assert!(graph_err(parts, vec![]).contains("missing parent"));
    }

    #[test]
    fn test_severed_threshold_above_max_life_rejected() {
        let mut parts = parts();
        parts[1].severed_threshold = Some(80.0);
        assert!(graph_err(parts, vec![]).contains("exceeds max life"));
    }

    #[test]
    fn test_coverage_must_link_bone_to_organ() {
        let coverage = vec![CoverageEntry {
            bone: BodypartId(2),
            organ: BodypartId(5),
            probability: 0.5,
        }];
        assert!(graph_err(parts(), coverage).contains("not a bone"));

        let coverage = vec![CoverageEntry {
            bone: BodypartId(4),
            organ: BodypartId(5),
            probability: 1.5,
        }];
        assert!(graph_err(parts(), coverage).contains("outside [0, 1]"));
    }

    #[test]
    fn test_orphaned_group_describer_rejected() {
        let mut proto = BodyPrototype::new(1, "test");
        proto.group_describers.push(BodypartGroupDescriber {
            description: "wings".into(),
            parts: vec![BodypartId(42)],
        });
        let result = BodyGraph::new(proto, parts(), vec![]);
        assert!(matches!(result, Err(EngineError::GraphIntegrity { .. })));
    }

    #[test]
    fn test_count_limbs_ignores_severed() {
        let parts = vec![
            BodypartPrototype::new(1, "torso", BodypartKind::External, 100.0),
            BodypartPrototype::new(2, "left leg", BodypartKind::Limb, 50.0)
                .with_parent(1)
                .with_limb(LimbRole::Leg),
            BodypartPrototype::new(3, "right leg", BodypartKind::Limb, 50.0)
                .with_parent(1)
                .with_limb(LimbRole::Leg),
        ];
        let graph = BodyGraph::new(BodyPrototype::new(1, "test"), parts, vec![]).unwrap();
        let mut severed = AHashSet::new();
        assert_eq!(graph.count_limbs(LimbRole::Leg, &severed), 2);
        severed.insert(BodypartId(2));
        assert_eq!(graph.count_limbs(LimbRole::Leg, &severed), 1);
    }
}
