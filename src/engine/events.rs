//! Append-only injury events for the character layer and persistence

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::combat::AttackOutcome;
use crate::core::types::{BodyId, BodypartId, DamageType, InfectionId, Tick, WoundId};
use crate::entity::BodyTick;
use crate::health::HealthState;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InjuryEvent {
    pub tick: Tick,
    pub body: BodyId,
    pub event_type: InjuryEventType,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum InjuryEventType {
    // Wounds
    WoundCreated { wound: WoundId, bodypart: BodypartId, damage_type: DamageType, damage: f64 },
    WoundReinjured { wound: WoundId, damage: f64 },
    WoundHealed { wound: WoundId },
    BodypartSevered { bodypart: BodypartId },

    // Infections
    InfectionCreated { infection: InfectionId },
    InfectionCleared { infection: InfectionId },

    // Status
    HealthChanged { from: HealthState, to: HealthState },
}

/// Receiver for injury events. Implementations must be cheap and never block
/// for long: they are called while a body is locked.
pub trait InjuryEventSink: Send + Sync {
    fn record(&self, event: InjuryEvent);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl InjuryEventSink for NullSink {
    fn record(&self, _event: InjuryEvent) {}
}

/// In-process event log
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    events: Mutex<Vec<InjuryEvent>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event recorded so far
    pub fn events(&self) -> Vec<InjuryEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every event, leaving the log empty
    pub fn drain(&self) -> Vec<InjuryEvent> {
        self.events.lock().map(|mut e| std::mem::take(&mut *e)).unwrap_or_default()
    }
}

impl InjuryEventSink for MemoryEventLog {
    fn record(&self, event: InjuryEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Events implied by one resolved attack
pub fn outcome_events(tick: Tick, body: BodyId, damage_type: DamageType, outcome: &AttackOutcome) -> Vec<InjuryEvent> {
    let mut out = Vec::new();
    let mut push = |event_type| out.push(InjuryEvent { tick, body, event_type });

    if let Some(report) = &outcome.wound {
        match report.wound {
            Some(wound) if report.reinjured => push(InjuryEventType::WoundReinjured {
                wound,
                damage: report.damage,
            }),
            Some(wound) => push(InjuryEventType::WoundCreated {
                wound,
                bodypart: report.bodypart,
                damage_type,
                damage: report.damage,
            }),
            None => {}
        }
        for &bodypart in &report.severed {
            push(InjuryEventType::BodypartSevered { bodypart });
        }
    }
    if let Some(infection) = outcome.infection {
        push(InjuryEventType::InfectionCreated { infection });
    }
    if let (true, Some(from), Some(to)) = (outcome.health_state_changed, outcome.health_before, outcome.health_after) {
        push(InjuryEventType::HealthChanged { from, to });
    }
    out
}

/// Events implied by one body tick
pub fn tick_events(tick: Tick, body: BodyId, report: &BodyTick) -> Vec<InjuryEvent> {
    let mut out = Vec::new();
    let mut push = |event_type| out.push(InjuryEvent { tick, body, event_type });

    for &wound in &report.wounds.healed {
        push(InjuryEventType::WoundHealed { wound });
    }
    for (infection, result) in &report.infections {
        if result.cleared() {
            push(InjuryEventType::InfectionCleared { infection: *infection });
        }
    }
    for &infection in &report.new_infections {
        push(InjuryEventType::InfectionCreated { infection });
    }
    if let (true, Some(from), Some(to)) = (report.status_changed(), report.status_before, report.status_after) {
        push(InjuryEventType::HealthChanged { from, to });
    }
    out
}
