//! Multi-phase attacks (aim, then release)
//!
//! The target is re-checked at every phase boundary. A target that died or
//! left scope aborts the attack before anything touches its body.

use rand::Rng;
use tracing::{debug, warn};

use super::attack::WeaponAttack;
use super::resolution::{strike, AttackOutcome, Attacker, MissReason, StrikeContext};
use crate::core::error::Result;
use crate::core::types::{AttackId, BodyId, Tick};
use crate::entity::Body;

#[derive(Debug, Clone, PartialEq)]
pub enum AttackPhase {
    Aiming,
    Releasing,
    Resolved,
    Aborted(MissReason),
}

impl AttackPhase {
    pub fn is_finished(&self) -> bool {
        matches!(self, AttackPhase::Resolved | AttackPhase::Aborted(_))
    }
}

/// Result of pushing a pending attack across (at most) one boundary
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseStep {
    /// Still aiming, or finished earlier
    Waiting,
    Released,
    Resolved(AttackOutcome),
    Aborted(MissReason),
}

#[derive(Debug, Clone)]
pub struct PendingAttack {
    pub attacker: Attacker,
    pub attack: AttackId,
    pub target: BodyId,
    phase: AttackPhase,
    ready_at: Tick,
}

impl PendingAttack {
    /// Start aiming at `now`; the attack can be released from `now + aim_ticks`
    pub fn begin(attacker: Attacker, attack: AttackId, target: BodyId, now: Tick, aim_ticks: u64) -> Self {
        Self {
            attacker,
            attack,
            target,
            phase: AttackPhase::Aiming,
            ready_at: now.saturating_add(aim_ticks),
        }
    }

    pub fn phase(&self) -> &AttackPhase {
        &self.phase
    }

    pub fn ready_at(&self) -> Tick {
        self.ready_at
    }

    fn check_target(&self, target: Option<&Body>) -> std::result::Result<(), MissReason> {
        match target {
            None => Err(MissReason::TargetGone),
            Some(body) if body.id() != self.target => Err(MissReason::TargetGone),
            Some(body) if !body.last_status().is_alive() => Err(MissReason::TargetDead),
            Some(_) => Ok(()),
        }
    }

    fn abort(&mut self, reason: MissReason) -> PhaseStep {
        debug!(target_body = %self.target, ?reason, "pending attack aborted");
        self.phase = AttackPhase::Aborted(reason.clone());
        PhaseStep::Aborted(reason)
    }

    /// Abort from outside, e.g. the target left scope or the attacker is
    /// spent. A finished attack stays as it was.
    pub fn cancel(&mut self, reason: MissReason) -> PhaseStep {
        if self.phase.is_finished() {
            return PhaseStep::Waiting;
        }
        self.abort(reason)
    }

    /// Advance one phase boundary. `target` is `None` when the body is no
    /// longer in scope; the caller holds it exclusively otherwise.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        now: Tick,
        weapon_attack: &WeaponAttack,
        target: Option<&mut Body>,
        ctx: &StrikeContext<'_>,
        rng: &mut R,
    ) -> Result<PhaseStep> {
        match self.phase {
            AttackPhase::Resolved | AttackPhase::Aborted(_) => Ok(PhaseStep::Waiting),
            AttackPhase::Aiming => {
                if let Err(reason) = self.check_target(target.as_deref()) {
                    return Ok(self.abort(reason));
                }
                if now < self.ready_at {
                    return Ok(PhaseStep::Waiting);
                }
                self.phase = AttackPhase::Releasing;
                Ok(PhaseStep::Released)
            }
            AttackPhase::Releasing => {
                if let Err(reason) = self.check_target(target.as_deref()) {
                    return Ok(self.abort(reason));
                }
                let Some(body) = target else {
                    return Ok(self.abort(MissReason::TargetGone));
                };
                match strike(weapon_attack, &self.attacker, body, ctx, rng) {
                    Ok(outcome) => {
                        self.phase = AttackPhase::Resolved;
                        Ok(PhaseStep::Resolved(outcome))
                    }
                    Err(err) => match AttackOutcome::from_error(&err) {
                        Some(miss) => {
                            warn!(attack = %weapon_attack.name, error = %err, "pending attack degraded to a miss");
                            self.phase = AttackPhase::Resolved;
                            Ok(PhaseStep::Resolved(miss))
                        }
                        None => Err(err),
                    },
                }
            }
        }
    }
}
