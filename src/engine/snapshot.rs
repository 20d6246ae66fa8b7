//! Serialized body state for periodic persistence

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::Tick;
use crate::entity::Body;
use crate::health::HealthState;

pub const SNAPSHOT_VERSION: u32 = 1;

/// One body as persisted. The health state is stored for readers that do
/// not load the catalog; it is re-derived on restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub version: u32,
    pub tick: Tick,
    pub health: HealthState,
    pub body: Body,
}

impl BodySnapshot {
    pub fn new(tick: Tick, health: HealthState, body: Body) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            tick,
            health,
            body,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
