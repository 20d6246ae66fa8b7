//! Combat resolution: from an attack template to a wound on a body

pub mod attack;
pub mod damage;
pub mod hit_location;
pub mod phased;
pub mod resolution;

pub use attack::{CombatAction, DamagePattern, Exertion, Intention, WeaponAttack};
pub use damage::{DamageSource, RawDamage, VitalSignal, WoundReport};
pub use hit_location::{resolve_target, HitLocation, HitWeighting, TableHitWeighting};
pub use phased::{AttackPhase, PendingAttack, PhaseStep};
pub use resolution::{strike, AttackOutcome, AttackResult, Attacker, MissReason, StrikeContext};
