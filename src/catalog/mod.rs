//! Read-only data catalog: body graphs, armour, attacks and damage patterns
//!
//! Built once at load time and shared by reference afterwards. Nothing in
//! combat or ticking mutates it.

pub mod loader;

use ahash::AHashMap;

use crate::anatomy::BodyGraph;
use crate::armour::{ArmourCatalog, ArmourType, Material};
use crate::combat::{CombatAction, DamagePattern, Intention, WeaponAttack};
use crate::core::error::{EngineError, Result};
use crate::core::types::{AttackId, BodyProtoId, DamagePatternId};

pub use loader::{AnatomyFile, ArmourFile, AttackFile};

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    graphs: AHashMap<BodyProtoId, BodyGraph>,
    graph_names: AHashMap<String, BodyProtoId>,
    armour: ArmourCatalog,
    attacks: AHashMap<AttackId, WeaponAttack>,
    attack_names: AHashMap<String, AttackId>,
    actions: Vec<CombatAction>,
    patterns: AHashMap<DamagePatternId, DamagePattern>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    // === ANATOMY ===

    pub fn insert_graph(&mut self, graph: BodyGraph) -> Result<BodyProtoId> {
        let id = graph.prototype().id;
        if self.graphs.contains_key(&id) {
            return Err(EngineError::Catalog(format!("duplicate body prototype {}", id)));
        }
        self.graph_names.insert(graph.prototype().name.clone(), id);
        self.graphs.insert(id, graph);
        Ok(id)
    }

    pub fn graph(&self, id: BodyProtoId) -> Option<&BodyGraph> {
        self.graphs.get(&id)
    }

    pub fn graph_by_name(&self, name: &str) -> Option<&BodyGraph> {
        self.graph_names.get(name).and_then(|id| self.graphs.get(id))
    }

    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    // === ARMOUR ===

    pub fn armour(&self) -> &ArmourCatalog {
        &self.armour
    }

    pub fn insert_armour_type(&mut self, armour: ArmourType) -> Result<()> {
        armour.validate().map_err(EngineError::Catalog)?;
        self.armour.insert_armour_type(armour);
        Ok(())
    }

    pub fn insert_material(&mut self, material: Material) {
        self.armour.insert_material(material);
    }

    // === ATTACKS ===

    pub fn insert_attack(&mut self, attack: WeaponAttack) -> Result<()> {
        if self.attacks.contains_key(&attack.id) {
            return Err(EngineError::Catalog(format!("duplicate attack {}", attack.id)));
        }
        self.attack_names.insert(attack.name.clone(), attack.id);
        self.attacks.insert(attack.id, attack);
        Ok(())
    }

    pub fn attack(&self, id: AttackId) -> Result<&WeaponAttack> {
        self.attacks.get(&id).ok_or(EngineError::UnknownAttack(id))
    }

    pub fn attack_by_name(&self, name: &str) -> Option<&WeaponAttack> {
        self.attack_names.get(name).and_then(|id| self.attacks.get(id))
    }

    pub fn attack_count(&self) -> usize {
        self.attacks.len()
    }

    /// Actions must only reference attacks already in the catalog
    pub fn insert_action(&mut self, action: CombatAction) -> Result<()> {
        if let Some(missing) = action.attacks.iter().find(|id| !self.attacks.contains_key(id)) {
            return Err(EngineError::Catalog(format!(
                "action {} references unknown {}",
                action.name, missing
            )));
        }
        self.actions.push(action);
        Ok(())
    }

    /// Actions serving `intention`, in authored order
    pub fn actions_for(&self, intention: Intention) -> Vec<&CombatAction> {
        self.actions.iter().filter(|a| a.serves(intention)).collect()
    }

    pub fn insert_pattern(&mut self, pattern: DamagePattern) {
        self.patterns.insert(pattern.id, pattern);
    }

    pub fn pattern(&self, id: DamagePatternId) -> Option<&DamagePattern> {
        self.patterns.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CombatActionId;
    use crate::combat::Exertion;
    use crate::core::types::DamageType;
    use crate::expression::TraitExpression;

    fn punch() -> WeaponAttack {
        WeaponAttack::new(1, "punch", DamageType::Crushing, TraitExpression::parse("1d4").unwrap())
    }

    #[test]
    fn test_attack_lookup() {
        let mut catalog = Catalog::new();
        catalog.insert_attack(punch()).unwrap();
        assert_eq!(catalog.attack(AttackId(1)).unwrap().name, "punch");
        assert!(catalog.attack_by_name("punch").is_some());
        assert!(matches!(catalog.attack(AttackId(9)), Err(EngineError::UnknownAttack(_))));
    }

    #[test]
    fn test_duplicate_attack_rejected() {
        let mut catalog = Catalog::new();
        catalog.insert_attack(punch()).unwrap();
        assert!(catalog.insert_attack(punch()).is_err());
    }

    #[test]
    fn test_action_with_unknown_attack_rejected() {
        let mut catalog = Catalog::new();
        let action = CombatAction {
            id: CombatActionId(1),
            name: "flurry".into(),
            attacks: vec![AttackId(3)],
            stamina_cost: 0.0,
            exertion: Exertion::Normal,
            intentions: vec![Intention::Attack],
        };
        assert!(matches!(catalog.insert_action(action), Err(EngineError::Catalog(_))));
    }

    #[test]
    fn test_actions_by_intention() {
        let mut catalog = Catalog::new();
        catalog.insert_attack(punch()).unwrap();
        for (id, intention) in [(1, Intention::Attack), (2, Intention::Stagger), (3, Intention::Attack)] {
            catalog
                .insert_action(CombatAction {
                    id: CombatActionId(id),
                    name: format!("action {}", id),
                    attacks: vec![AttackId(1)],
                    stamina_cost: 0.0,
                    exertion: Exertion::Normal,
                    intentions: vec![intention],
                })
                .unwrap();
        }
        let ids: Vec<_> = catalog.actions_for(Intention::Attack).iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![CombatActionId(1), CombatActionId(3)]);
        assert!(catalog.actions_for(Intention::Grapple).is_empty());
    }
}
