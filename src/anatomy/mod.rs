//! Static anatomy: bodypart prototypes, body prototypes and the validated body graph

pub mod bodypart;
pub mod graph;
pub mod prototype;

pub use bodypart::{Alignment, BodypartKind, BodypartPrototype, LimbRole, Orientation};
pub use graph::{BodyGraph, CoverageEntry};
pub use prototype::{BodyPrototype, BodypartGroupDescriber, WearSize};
