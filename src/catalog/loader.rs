//! TOML loading for the catalog
//!
//! Layout of a data directory:
//!
//! ```text
//! data/
//!   anatomy/*.toml   one body prototype per file
//!   armour.toml      materials and armour types
//!   attacks.toml     weapon attacks, combat actions, damage patterns
//!   engine.toml      engine configuration (optional, see EngineConfig::load)
//! ```

use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use super::Catalog;
use crate::anatomy::{BodyGraph, BodyPrototype, BodypartPrototype, CoverageEntry};
use crate::armour::{ArmourType, Material};
use crate::combat::{CombatAction, DamagePattern, WeaponAttack};
use crate::core::error::{EngineError, Result};

#[derive(Debug, Deserialize)]
pub struct AnatomyFile {
    pub prototype: BodyPrototype,
    pub bodyparts: Vec<BodypartPrototype>,
    #[serde(default)]
    pub coverage: Vec<CoverageEntry>,
}

impl AnatomyFile {
    pub fn into_graph(self) -> Result<BodyGraph> {
        BodyGraph::new(self.prototype, self.bodyparts, self.coverage)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ArmourFile {
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub armour_types: Vec<ArmourType>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AttackFile {
    #[serde(default)]
    pub attacks: Vec<WeaponAttack>,
    #[serde(default)]
    pub actions: Vec<CombatAction>,
    #[serde(default)]
    pub patterns: Vec<DamagePattern>,
}

fn parse<T: for<'de> Deserialize<'de>>(content: &str, origin: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| EngineError::Catalog(format!("{}: {}", origin, e)))
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| EngineError::Catalog(format!("{}: {}", path.display(), e)))
}

impl Catalog {
    /// Parse and add one body prototype. Graph integrity errors are fatal.
    pub fn load_anatomy_str(&mut self, content: &str, origin: &str) -> Result<()> {
        let file: AnatomyFile = parse(content, origin)?;
        let graph = file.into_graph()?;
        info!(
            prototype = %graph.prototype().name,
            bodyparts = graph.len(),
            "loaded body prototype"
        );
        self.insert_graph(graph)?;
        Ok(())
    }

    pub fn load_armour_str(&mut self, content: &str, origin: &str) -> Result<()> {
        let file: ArmourFile = parse(content, origin)?;
        for material in file.materials {
            self.insert_material(material);
        }
        for armour in file.armour_types {
            self.insert_armour_type(armour)?;
        }
        Ok(())
    }

    /// Attacks are inserted before actions so actions can reference them
    pub fn load_attacks_str(&mut self, content: &str, origin: &str) -> Result<()> {
        let file: AttackFile = parse(content, origin)?;
        for attack in file.attacks {
            let unknown = attack.unrecognised_params();
            if !unknown.is_empty() {
                warn!(
                    origin,
                    attack = %attack.name,
                    params = ?unknown,
                    "attack formula reads parameters nothing supplies"
                );
            }
            self.insert_attack(attack)?;
        }
        for action in file.actions {
            self.insert_action(action)?;
        }
        for pattern in file.patterns {
            self.insert_pattern(pattern);
        }
        Ok(())
    }

    /// Load a whole data directory. Missing armour or attack files are
    /// allowed; a missing anatomy directory is not.
    pub fn load_directory(path: &Path) -> Result<Self> {
        let mut catalog = Catalog::new();

        let anatomy_dir = path.join("anatomy");
        let mut anatomy_files: Vec<_> = std::fs::read_dir(&anatomy_dir)
            .map_err(|e| EngineError::Catalog(format!("{}: {}", anatomy_dir.display(), e)))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map_or(false, |ext| ext == "toml"))
            .collect();
        anatomy_files.sort();
        for file in &anatomy_files {
            catalog.load_anatomy_str(&read(file)?, &file.display().to_string())?;
        }

        let armour = path.join("armour.toml");
        if armour.exists() {
            catalog.load_armour_str(&read(&armour)?, &armour.display().to_string())?;
        }

        let attacks = path.join("attacks.toml");
        if attacks.exists() {
            catalog.load_attacks_str(&read(&attacks)?, &attacks.display().to_string())?;
        }

        info!(
            prototypes = catalog.graph_count(),
            armour_types = catalog.armour().len(),
            attacks = catalog.attack_count(),
            "catalog loaded"
        );
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AttackId, BodyProtoId, BodypartId, DamagePatternId};

    const ANATOMY: &str = r#"
        [prototype]
        id = 1
        name = "stick figure"
        min_legs_to_stand = 1

        [[bodyparts]]
        id = 1
        name = "torso"
        kind = "external"
        alignment = "front"
        orientation = "centre"
        max_life = 100.0

        [[bodyparts]]
        id = 2
        name = "ribs"
        kind = "bone"
        alignment = "front"
        orientation = "centre"
        parent = 1
        max_life = 40.0

        [[bodyparts]]
        id = 3
        name = "heart"
        kind = "organ"
        alignment = "front"
        orientation = "centre"
        parent = 2
        max_life = 20.0
        is_vital = true

        [[coverage]]
        bone = 2
        organ = 3
        probability = 0.3
    "#;

    #[test]
    fn test_load_anatomy() {
        let mut catalog = Catalog::new();
        catalog.load_anatomy_str(ANATOMY, "inline").unwrap();
        let graph = catalog.graph(BodyProtoId(1)).unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.coverage(BodypartId(2)), &[(BodypartId(3), 0.3)]);
        assert!(catalog.graph_by_name("stick figure").is_some());
    }

    #[test]
    fn test_corrupt_anatomy_is_integrity_error() {
        let broken = ANATOMY.replace("parent = 1", "parent = 3");
        let mut catalog = Catalog::new();
        let result = catalog.load_anatomy_str(&broken, "inline");
        assert!(matches!(result, Err(EngineError::GraphIntegrity { .. })));
    }

    #[test]
    fn test_bad_formula_is_catalog_error() {
        let mut catalog = Catalog::new();
        let result = catalog.load_attacks_str(
            r#"
            [[attacks]]
            id = 1
            name = "broken"
            damage_type = "slashing"
            damage = "2d6 +"
            "#,
            "attacks.toml",
        );
        match result {
            Err(EngineError::Catalog(msg)) => assert!(msg.starts_with("attacks.toml")),
            other => panic!("expected catalog error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_attacks_and_patterns() {
        let mut catalog = Catalog::new();
        catalog
            .load_attacks_str(
                r#"
                [[attacks]]
                id = 1
                name = "stab"
                verb = "stabs"
                damage_type = "piercing"
                damage = "1d8"
                penetration_degree = 2.0

                [[actions]]
                id = 1
                name = "lunge"
                attacks = [1]
                intentions = ["kill"]

                [[patterns]]
                id = 1
                name = "fall"
                damage_type = "crushing"
                damage = "3d6"
                "#,
                "inline",
            )
            .unwrap();
        assert_eq!(catalog.attack(AttackId(1)).unwrap().penetration_degree, 2.0);
        assert_eq!(catalog.actions_for(crate::combat::Intention::Kill).len(), 1);
        assert!(catalog.pattern(DamagePatternId(1)).is_some());
    }

    #[test]
    fn test_load_shipped_data_directory() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
        let catalog = Catalog::load_directory(&dir).unwrap();
        assert!(catalog.graph_by_name("humanoid").is_some());
        assert!(!catalog.armour().is_empty());
        assert!(catalog.attack_count() > 0);
        for id in 1..=6 {
            let attack = catalog.attack(AttackId(id)).unwrap();
            assert!(attack.unrecognised_params().is_empty(), "{}", attack.name);
        }
    }
}
