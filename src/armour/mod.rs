//! Armour catalog entries and the mitigation pass

pub mod armour_type;
pub mod mitigation;

pub use armour_type::{ArmourCatalog, ArmourType, Material, WornItem};
pub use mitigation::{mitigate, IncomingDamage, LayerSource, MitigationResult};
