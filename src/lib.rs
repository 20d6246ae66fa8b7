//! Injury Engine - body injury and combat resolution for a persistent text world
//!
//! Bodies are graphs of bodyparts built from data. Attacks pick a bodypart,
//! pass through worn and natural armour, and leave wounds that bleed, heal,
//! get infected and sever limbs. A health strategy turns the wound set into a
//! status the character layer acts on.

pub mod anatomy;
pub mod armour;
pub mod catalog;
pub mod combat;
pub mod core;
pub mod engine;
pub mod entity;
pub mod expression;
pub mod health;
