pub mod body;

pub use body::{Bloodtype, Body, BodyTick, Position};
