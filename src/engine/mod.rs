//! InjuryEngine: the entry point the character layer talks to
//!
//! Owns the live bodies and the read-only catalog. Attack resolution and
//! ticking take `&self`, so one engine can be shared across worker threads;
//! the per-body locks in [`registry`] serialize mutations of a single body.

pub mod events;
pub mod registry;
pub mod snapshot;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::anatomy::BodyGraph;
use crate::catalog::Catalog;
use crate::combat::{
    strike, AttackOutcome, AttackPhase, AttackResult, Attacker, HitWeighting, MissReason, PendingAttack, PhaseStep,
    StrikeContext, TableHitWeighting, WeaponAttack,
};
use crate::core::config::EngineConfig;
use crate::core::error::{EngineError, Result};
use crate::core::types::{AttackId, BodyId, BodyProtoId, CharacterId, DamagePatternId, ItemId, Tick, WoundId};
use crate::entity::{Body, BodyTick};
use crate::health::{HealthState, Treatment};

pub use events::{InjuryEvent, InjuryEventSink, InjuryEventType, MemoryEventLog, NullSink};
pub use registry::{BodyHandle, BodyRegistry};
pub use snapshot::{BodySnapshot, SNAPSHOT_VERSION};

pub struct InjuryEngine {
    catalog: Arc<Catalog>,
    config: EngineConfig,
    weighting: Box<dyn HitWeighting>,
    bodies: BodyRegistry,
    sink: Arc<dyn InjuryEventSink>,
    tick: AtomicU64,
}

impl InjuryEngine {
    pub fn new(catalog: Arc<Catalog>, config: EngineConfig) -> Result<Self> {
        config.validate().map_err(EngineError::Config)?;
        let weighting = Box::new(TableHitWeighting::from_config(&config));
        Ok(Self {
            catalog,
            config,
            weighting,
            bodies: BodyRegistry::new(),
            sink: Arc::new(NullSink),
            tick: AtomicU64::new(0),
        })
    }

    pub fn with_weighting(mut self, weighting: Box<dyn HitWeighting>) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn InjuryEventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn current_tick(&self) -> Tick {
        self.tick.load(Ordering::Acquire)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn graph(&self, prototype: BodyProtoId) -> Result<&BodyGraph> {
        self.catalog
            .graph(prototype)
            .ok_or_else(|| EngineError::Catalog(format!("unknown body prototype {}", prototype)))
    }

    fn strike_context<'a>(&'a self, graph: &'a BodyGraph) -> StrikeContext<'a> {
        StrikeContext {
            graph,
            armour: self.catalog.armour(),
            weighting: self.weighting.as_ref(),
            config: &self.config,
        }
    }

    fn publish(&self, events: Vec<InjuryEvent>) {
        for event in events {
            self.sink.record(event);
        }
    }

    // === BODIES ===

    /// Create a fresh body of a catalog prototype
    pub fn spawn_body(&self, owner: CharacterId, prototype: &str, weight_kg: f64, height_cm: f64) -> Result<BodyId> {
        let graph = self
            .catalog
            .graph_by_name(prototype)
            .ok_or_else(|| EngineError::Catalog(format!("unknown body prototype '{}'", prototype)))?;
        self.add_body(Body::new(owner, graph, weight_kg, height_cm, &self.config))
    }

    pub fn add_body(&self, body: Body) -> Result<BodyId> {
        self.graph(body.prototype())?;
        self.bodies.insert(body)
    }

    /// Drop a body from scope. Pending attacks against it abort at their next phase.
    pub fn remove_body(&self, id: BodyId) -> Result<()> {
        self.bodies.remove(id).map(|_| ()).ok_or(EngineError::BodyNotFound(id))
    }

    fn handle(&self, id: BodyId) -> Result<BodyHandle> {
        self.bodies.handle(id).ok_or(EngineError::BodyNotFound(id))
    }

    /// Run `f` with shared access to a body
    pub fn with_body<T>(&self, id: BodyId, f: impl FnOnce(&Body) -> T) -> Result<T> {
        let handle = self.handle(id)?;
        let body = registry::lock(id, &handle)?;
        Ok(f(&body))
    }

    /// Current status, evaluated without changing anything
    pub fn health_state(&self, id: BodyId) -> Result<HealthState> {
        let handle = self.handle(id)?;
        let body = registry::lock(id, &handle)?;
        let graph = self.graph(body.prototype())?;
        Ok(body.evaluate_status(graph, &self.config))
    }

    // === ATTACKS ===

    /// Resolve one attack. Anything that goes wrong for this attack alone
    /// (no target left, bad formula, lock conflict, target gone) comes back
    /// as a miss; only an unknown attack id is an error.
    pub fn resolve_attack<R: Rng + ?Sized>(
        &self,
        attacker: &Attacker,
        attack: AttackId,
        target: BodyId,
        rng: &mut R,
    ) -> Result<AttackOutcome> {
        let attack = self.catalog.attack(attack)?;
        if let Some(reason) = self.unready(attacker, attack) {
            return Ok(AttackOutcome::miss(reason));
        }

        let mut outcome = match self.strike_body(attack, attacker, target, rng) {
            Ok(outcome) => outcome,
            Err(err) => return Ok(self.degrade(attack, &err)),
        };

        // The blow was swung (a hit, or a body already dead)
        outcome.stamina_spent = self.charge_stamina(attacker, attack);
        Ok(outcome)
    }

    /// Why the attacker cannot swing right now, if anything
    fn unready(&self, attacker: &Attacker, attack: &WeaponAttack) -> Option<MissReason> {
        let own = attacker.body?;
        let cost = attack.total_stamina_cost();
        if cost <= 0.0 {
            return None;
        }
        match self.with_body(own, |body| body.stamina() >= cost) {
            Ok(true) => None,
            Ok(false) => {
                debug!(body = %own, attack = %attack.name, cost, "attacker exhausted");
                Some(MissReason::Exhausted)
            }
            Err(err) => match self.degrade(attack, &err).result {
                AttackResult::Miss(reason) => Some(reason),
                AttackResult::Hit => None,
            },
        }
    }

    /// Charge the attacker for a swung blow. Must run after the target lock
    /// is released. Returns what was actually spent.
    fn charge_stamina(&self, attacker: &Attacker, attack: &WeaponAttack) -> f64 {
        let Some(own) = attacker.body else {
            return 0.0;
        };
        let cost = attack.total_stamina_cost();
        if cost <= 0.0 {
            return 0.0;
        }
        let charged = self.handle(own).and_then(|handle| {
            let mut body = registry::lock(own, &handle)?;
            let paid = body.spend_stamina(cost);
            Ok(paid)
        });
        match charged {
            Ok(true) => cost,
            Ok(false) => {
                warn!(body = %own, attack = %attack.name, cost, "attacker could not pay for a swung blow");
                0.0
            }
            Err(err) => {
                warn!(body = %own, attack = %attack.name, error = %err, "stamina charge failed");
                0.0
            }
        }
    }

    fn strike_body<R: Rng + ?Sized>(
        &self,
        attack: &WeaponAttack,
        attacker: &Attacker,
        target: BodyId,
        rng: &mut R,
    ) -> Result<AttackOutcome> {
        let handle = self.handle(target)?;
        let mut body = registry::lock(target, &handle)?;
        if !body.last_status().is_alive() {
            return Ok(AttackOutcome::miss(MissReason::TargetDead));
        }
        let graph = self.graph(body.prototype())?;
        let outcome = strike(attack, attacker, &mut body, &self.strike_context(graph), rng)?;
        self.report_outcome(target, attack, &outcome, graph);
        Ok(outcome)
    }

    fn report_outcome(&self, target: BodyId, attack: &WeaponAttack, outcome: &AttackOutcome, graph: &BodyGraph) {
        if let Some(report) = &outcome.wound {
            if let Some(first) = report.severed.first() {
                let name = graph.get(*first).map(|p| p.name.as_str()).unwrap_or("bodypart");
                info!(body = %target, bodypart = name, parts = report.severed.len(), "bodypart severed");
            }
            if let Some(vital) = report.vital {
                info!(body = %target, bodypart = %vital.bodypart, fraction = vital.fraction, "vital damage");
            }
        }
        if outcome.health_after == Some(HealthState::Dead) && outcome.health_state_changed {
            info!(body = %target, attack = %attack.name, "body died");
        }
        self.publish(events::outcome_events(self.current_tick(), target, attack.damage_type, outcome));
    }

    fn degrade(&self, attack: &WeaponAttack, err: &EngineError) -> AttackOutcome {
        warn!(attack = %attack.name, error = %err, "attack degraded to a miss");
        AttackOutcome::from_error(err).unwrap_or_else(|| AttackOutcome::miss(MissReason::TargetGone))
    }

    /// Environmental damage with no attacker
    pub fn apply_damage_pattern<R: Rng + ?Sized>(
        &self,
        pattern: DamagePatternId,
        target: BodyId,
        rng: &mut R,
    ) -> Result<AttackOutcome> {
        let pattern = self
            .catalog
            .pattern(pattern)
            .ok_or_else(|| EngineError::Catalog(format!("unknown damage pattern {}", pattern)))?;
        let attack = pattern.as_attack();
        match self.strike_body(&attack, &Attacker::new(), target, rng) {
            Ok(outcome) => Ok(outcome),
            Err(err) => Ok(self.degrade(&attack, &err)),
        }
    }

    /// Start a multi-phase attack at the current tick
    pub fn begin_attack(&self, attacker: Attacker, attack: AttackId, target: BodyId, aim_ticks: u64) -> Result<PendingAttack> {
        self.catalog.attack(attack)?;
        Ok(PendingAttack::begin(attacker, attack, target, self.current_tick(), aim_ticks))
    }

    /// Push a pending attack across its next phase boundary at the current tick.
    /// A lock conflict leaves the attack where it was. An attacker too spent
    /// to release aborts with `Exhausted`; a landed release is charged.
    pub fn advance_attack<R: Rng + ?Sized>(&self, pending: &mut PendingAttack, rng: &mut R) -> Result<PhaseStep> {
        let attack = self.catalog.attack(pending.attack)?;
        let now = self.current_tick();
        if *pending.phase() == AttackPhase::Releasing {
            if let Some(reason) = self.unready(&pending.attacker, attack) {
                return Ok(pending.cancel(reason));
            }
        }
        let Some(handle) = self.bodies.handle(pending.target) else {
            return Ok(pending.cancel(MissReason::TargetGone));
        };

        let step = {
            let mut body = registry::lock(pending.target, &handle)?;
            let graph = self.graph(body.prototype())?;
            let step = pending.advance(now, attack, Some(&mut *body), &self.strike_context(graph), rng)?;
            if let PhaseStep::Resolved(outcome) = &step {
                self.report_outcome(pending.target, attack, outcome, graph);
            }
            step
        };

        match step {
            PhaseStep::Resolved(mut outcome) if outcome.is_hit() => {
                outcome.stamina_spent = self.charge_stamina(&pending.attacker, attack);
                Ok(PhaseStep::Resolved(outcome))
            }
            step => Ok(step),
        }
    }

    // === TREATMENT ===

    /// Returns whether the treatment was newly applied
    pub fn treat_wound(&self, body: BodyId, wound: WoundId, treatment: Treatment) -> Result<bool> {
        let handle = self.handle(body)?;
        let mut guard = registry::lock(body, &handle)?;
        guard
            .wounds_mut()
            .treat(wound, treatment)
            .ok_or(EngineError::WoundNotFound(body, wound))
    }

    pub fn remove_lodged_item(&self, body: BodyId, wound: WoundId) -> Result<Option<ItemId>> {
        let handle = self.handle(body)?;
        let mut guard = registry::lock(body, &handle)?;
        Ok(guard.wounds_mut().remove_lodged_item(wound))
    }

    // === TIME ===

    /// Advance the scheduler one tick covering `elapsed` of game time.
    ///
    /// Each body gets its own RNG seeded from (engine seed, tick, body id), so
    /// the result does not depend on thread scheduling. Bodies locked by an
    /// in-flight mutation are skipped this tick.
    pub fn tick_all(&self, elapsed: Duration) -> Vec<(BodyId, BodyTick)> {
        let tick = self.tick.fetch_add(1, Ordering::AcqRel) + 1;
        let handles = self.bodies.handles();

        let run = |(id, handle): &(BodyId, BodyHandle)| -> Option<(BodyId, BodyTick)> {
            let mut body = registry::lock(*id, handle).ok()?;
            let graph = match self.graph(body.prototype()) {
                Ok(graph) => graph,
                Err(err) => {
                    warn!(body = %id, error = %err, "skipping tick");
                    return None;
                }
            };
            let mut rng = ChaCha8Rng::seed_from_u64(tick_seed(self.config.seed, tick, *id));
            let report = body.tick(elapsed, graph, &self.config, &mut rng);
            self.publish(events::tick_events(tick, *id, &report));
            Some((*id, report))
        };

        let reports: Vec<_> = if handles.len() >= self.config.parallel_threshold {
            handles.par_iter().filter_map(run).collect()
        } else {
            handles.iter().filter_map(run).collect()
        };
        debug!(tick, bodies = reports.len(), "tick complete");
        reports
    }

    // === PERSISTENCE ===

    pub fn snapshot(&self, id: BodyId) -> Result<BodySnapshot> {
        let handle = self.handle(id)?;
        let body = registry::lock(id, &handle)?;
        let graph = self.graph(body.prototype())?;
        let health = body.evaluate_status(graph, &self.config);
        Ok(BodySnapshot::new(self.current_tick(), health, body.clone()))
    }

    /// Put a snapshotted body back in scope
    pub fn restore(&self, snapshot: BodySnapshot) -> Result<BodyId> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(EngineError::SnapshotVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        self.add_body(snapshot.body)
    }
}

/// Per-body RNG seed for one tick
fn tick_seed(seed: u64, tick: Tick, body: BodyId) -> u64 {
    let bits = body.0.as_u128();
    seed ^ tick.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ (bits as u64) ^ ((bits >> 64) as u64).rotate_left(29)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_seed_varies() {
        let body = BodyId::new();
        assert_ne!(tick_seed(1, 1, body), tick_seed(1, 2, body));
        assert_ne!(tick_seed(1, 1, body), tick_seed(2, 1, body));
        assert_eq!(tick_seed(1, 1, body), tick_seed(1, 1, body));
    }
}
