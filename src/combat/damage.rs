//! Damage resolution: formulas → mitigated magnitudes → wound
//!
//! `roll` is pure apart from the RNG. `apply` is the only step that mutates
//! the target and must run under the target's lock.

use rand::Rng;
use tracing::{debug, info};

use super::attack::WeaponAttack;
use crate::anatomy::{BodyGraph, BodypartPrototype};
use crate::armour::MitigationResult;
use crate::core::config::EngineConfig;
use crate::core::error::{EngineError, Result};
use crate::core::types::{BodypartId, CharacterId, DamageType, ItemId, WoundId};
use crate::entity::Body;
use crate::expression::{EvalContext, TraitExpression};
use crate::health::Wound;

/// Unmitigated magnitudes of one attack
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDamage {
    pub damage: f64,
    pub pain: f64,
    pub stun: f64,
    pub damage_type: DamageType,
    pub penetration_degree: f64,
}

fn evaluate<R: Rng + ?Sized>(
    attack: &WeaponAttack,
    formula: &'static str,
    expression: &TraitExpression,
    ctx: &EvalContext,
    rng: &mut R,
) -> Result<f64> {
    expression
        .expr()
        .evaluate(ctx, rng)
        .map(|value| value.max(0.0))
        .map_err(|source| EngineError::ExpressionEvaluation {
            attack: attack.name.clone(),
            formula,
            source,
        })
}

/// Evaluate the damage, pain and stun formulas of an attack
pub fn roll<R: Rng + ?Sized>(attack: &WeaponAttack, ctx: &EvalContext, rng: &mut R) -> Result<RawDamage> {
    let damage = evaluate(attack, "damage", &attack.damage, ctx, rng)?;
    let pain = match &attack.pain {
        Some(expression) => evaluate(attack, "pain", expression, ctx, rng)?,
        None => damage,
    };
    let stun = match &attack.stun {
        Some(expression) => evaluate(attack, "stun", expression, ctx, rng)?,
        None => 0.0,
    };
    Ok(RawDamage {
        damage,
        pain,
        stun,
        damage_type: attack.damage_type,
        penetration_degree: attack.penetration_degree,
    })
}

/// Who or what caused the damage; stored on the wound as ids only
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DamageSource {
    pub actor: Option<CharacterId>,
    pub tool: Option<ItemId>,
    /// Item left lodged in the wound
    pub lodged: Option<ItemId>,
}

/// A vital part took enough damage to be lethal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VitalSignal {
    pub bodypart: BodypartId,
    /// Cumulative damage as a fraction of the part's max life
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WoundReport {
    pub bodypart: BodypartId,
    /// None when armour absorbed everything
    pub wound: Option<WoundId>,
    pub reinjured: bool,
    pub damage: f64,
    pub pain: f64,
    pub stun: f64,
    pub shock: f64,
    pub blood_lost: f64,
    /// Parts severed by this hit, the struck part first
    pub severed: Vec<BodypartId>,
    pub vital: Option<VitalSignal>,
}

impl WoundReport {
    pub fn absorbed(&self) -> bool {
        self.wound.is_none()
    }
}

/// Turn mitigated damage into a wound on `part` and apply the immediate
/// consequences: severance, vital signal, blood loss.
///
/// Blood loss is taken from the raw damage of the blow; armour decides
/// whether the part bleeds at all, not how much.
pub fn apply(
    raw: &RawDamage,
    mitigation: &MitigationResult,
    part: &BodypartPrototype,
    body: &mut Body,
    graph: &BodyGraph,
    source: &DamageSource,
    config: &EngineConfig,
) -> WoundReport {
    let passthrough = mitigation.passthrough.clamp(0.0, 1.0);
    let damage = mitigation.residual_damage.max(0.0) * part.damage_modifier;
    let pain = raw.pain * passthrough * part.pain_modifier;
    let stun = raw.stun * passthrough * part.stun_modifier;
    let shock = damage * part.bleed_modifier * config.shock_per_damage;

    let mut report = WoundReport {
        bodypart: part.id,
        wound: None,
        reinjured: false,
        damage,
        pain,
        stun,
        shock,
        blood_lost: 0.0,
        severed: Vec::new(),
        vital: None,
    };

    if damage <= 0.0 && pain <= 0.0 && stun <= 0.0 {
        debug!(bodypart = %part.name, "attack fully absorbed");
        return report;
    }

    let open = if config.merge_reinjury {
        body.wounds().find_open(part.id, raw.damage_type)
    } else {
        None
    };
    let wound_id = match open {
        Some(id) => {
            body.wounds_mut().reinjure(id, damage, pain, shock, stun);
            report.reinjured = true;
            id
        }
        None => {
            let mut wound = Wound::new(part.id, raw.damage_type, damage)
                .with_pain(pain)
                .with_shock(shock)
                .with_stun(stun)
                .with_bleed_modifier(part.bleed_modifier)
                .internal(part.kind.is_internal())
                .with_origin(source.actor, source.tool);
            if let Some(item) = source.lodged {
                wound = wound.with_lodged_item(item);
            }
            body.wounds_mut().add_wound(wound)
        }
    };
    report.wound = Some(wound_id);

    let cumulative = body.wounds().damage_on(part.id);

    if let Some(threshold) = part.severed_threshold {
        if cumulative >= threshold && !body.is_severed(part.id) {
            report.severed = body.sever(part.id, graph);
            info!(bodypart = %part.name, body = %body.id(), parts = report.severed.len(), "bodypart severed");
        }
    }

    if part.is_vital && part.max_life > 0.0 {
        let fraction = cumulative / part.max_life;
        if fraction >= config.vital_lethal_fraction {
            report.vital = Some(VitalSignal {
                bodypart: part.id,
                fraction,
            });
        }
    }

    if damage > 0.0 {
        report.blood_lost = (part.bleed_modifier * raw.damage * config.blood_loss_per_damage).max(0.0);
    }
    body.lose_blood(report.blood_lost);
    body.settle_position(graph);

    debug!(
        bodypart = %part.name,
        damage,
        pain,
        reinjured = report.reinjured,
        "wound applied"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anatomy::{BodyPrototype, BodypartKind};
    use crate::armour::IncomingDamage;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn graph() -> BodyGraph {
        BodyGraph::new(
            BodyPrototype::new(1, "test"),
            vec![
                BodypartPrototype::new(1, "chest", BodypartKind::External, 100.0),
                BodypartPrototype::new(2, "arm", BodypartKind::Limb, 60.0)
                    .with_parent(1)
                    .with_severed_threshold(50.0),
                BodypartPrototype::new(3, "hand", BodypartKind::Extremity, 30.0).with_parent(2),
                BodypartPrototype::new(4, "heart", BodypartKind::Organ, 20.0)
                    .with_parent(1)
                    .vital(),
            ],
            vec![],
        )
        .unwrap()
    }

    fn body(graph: &BodyGraph) -> Body {
        Body::new(CharacterId::new(), graph, 80.0, 180.0, &EngineConfig::default())
    }

    fn flat(damage: f64) -> RawDamage {
        RawDamage {
            damage,
            pain: damage,
            stun: 0.0,
            damage_type: DamageType::Slashing,
            penetration_degree: 0.0,
        }
    }

    fn unmitigated(raw: &RawDamage) -> MitigationResult {
        MitigationResult::unmitigated(&IncomingDamage {
            damage: raw.damage,
            penetration_degree: raw.penetration_degree,
            damage_type: raw.damage_type,
        })
    }

    #[test]
    fn test_two_d_six_plus_three_in_range() {
        let attack = WeaponAttack::new(1, "punch", DamageType::Crushing, TraitExpression::parse("2d6+3").unwrap());
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..500 {
            let raw = roll(&attack, &EvalContext::new(), &mut rng).unwrap();
            assert!((5.0..=15.0).contains(&raw.damage));
            assert_eq!(raw.pain, raw.damage);
            assert_eq!(raw.stun, 0.0);
        }
    }

    #[test]
    fn test_unknown_variable_is_expression_error() {
        let attack = WeaponAttack::new(
            1,
            "crush",
            DamageType::Crushing,
            TraitExpression::parse("attacker.strength * 2").unwrap(),
        );
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = roll(&attack, &EvalContext::new(), &mut rng).unwrap_err();
        assert!(matches!(err, EngineError::ExpressionEvaluation { formula: "damage", .. }));
        assert!(err.is_recoverable());

        let ctx = EvalContext::new().with("attacker.strength", 6.0);
        assert_eq!(roll(&attack, &ctx, &mut rng).unwrap().damage, 12.0);
    }

    #[test]
    fn test_apply_creates_wound_and_bleeds() {
        let graph = graph();
        let mut body = body(&graph);
        let raw = flat(10.0);
        let part = graph.get(BodypartId(1)).unwrap();
        let report = apply(&raw, &unmitigated(&raw), part, &mut body, &graph, &DamageSource::default(), &EngineConfig::default());
        let wound = body.wounds().get(report.wound.unwrap()).unwrap();
        assert_eq!(wound.current_damage(), 10.0);
        assert!((report.blood_lost - 0.1).abs() < 1e-12);
        assert!((body.blood_volume() - (body.max_blood_volume() - 0.1)).abs() < 1e-12);
    }

    #[test]
    fn test_modifiers_scale_magnitudes() {
        let mut part = BodypartPrototype::new(1, "chest", BodypartKind::External, 100.0);
        part.damage_modifier = 2.0;
        part.pain_modifier = 0.5;
        let graph = BodyGraph::new(BodyPrototype::new(1, "test"), vec![part.clone()], vec![]).unwrap();
        let mut body = body(&graph);
        let raw = flat(10.0);
        let report = apply(&raw, &unmitigated(&raw), &part, &mut body, &graph, &DamageSource::default(), &EngineConfig::default());
        assert_eq!(report.damage, 20.0);
        assert_eq!(report.pain, 5.0);
    }

    #[test]
    fn test_same_type_reinjures_open_wound() {
        let graph = graph();
        let mut body = body(&graph);
        let part = graph.get(BodypartId(1)).unwrap();
        let config = EngineConfig::default();
        let raw = flat(5.0);
        let first = apply(&raw, &unmitigated(&raw), part, &mut body, &graph, &DamageSource::default(), &config);
        let second = apply(&raw, &unmitigated(&raw), part, &mut body, &graph, &DamageSource::default(), &config);
        assert!(second.reinjured);
        assert_eq!(first.wound, second.wound);
        assert_eq!(body.wounds().len(), 1);
        assert_eq!(body.wounds().damage_on(BodypartId(1)), 10.0);
    }

    #[test]
    fn test_severance_at_exact_threshold_happens_once() {
        let graph = graph();
        let mut body = body(&graph);
        let part = graph.get(BodypartId(2)).unwrap();
        let config = EngineConfig::default();

        let raw = flat(25.0);
        let report = apply(&raw, &unmitigated(&raw), part, &mut body, &graph, &DamageSource::default(), &config);
        assert!(report.severed.is_empty());

        let report = apply(&raw, &unmitigated(&raw), part, &mut body, &graph, &DamageSource::default(), &config);
        assert_eq!(report.severed, vec![BodypartId(2), BodypartId(3)]);
        assert!(body.is_severed(BodypartId(2)));

        let report = apply(&raw, &unmitigated(&raw), part, &mut body, &graph, &DamageSource::default(), &config);
        assert!(report.severed.is_empty());
    }

    #[test]
    fn test_vital_signal_raised() {
        let graph = graph();
        let mut body = body(&graph);
        let part = graph.get(BodypartId(4)).unwrap();
        let raw = flat(20.0);
        let report = apply(&raw, &unmitigated(&raw), part, &mut body, &graph, &DamageSource::default(), &EngineConfig::default());
        assert_eq!(report.vital.map(|v| v.bodypart), Some(BodypartId(4)));
        assert!(body.wounds().get(report.wound.unwrap()).unwrap().is_internal());
    }

    #[test]
    fn test_fully_absorbed_leaves_no_wound() {
        let graph = graph();
        let mut body = body(&graph);
        let part = graph.get(BodypartId(1)).unwrap();
        let raw = flat(10.0);
        let absorbed = MitigationResult {
            residual_damage: 0.0,
            residual_penetration_degree: 0.0,
            layers_traversed: 1,
            absorbed_by: Some(crate::armour::LayerSource::Natural),
            passthrough: 0.0,
        };
        let report = apply(&raw, &absorbed, part, &mut body, &graph, &DamageSource::default(), &EngineConfig::default());
        assert!(report.absorbed());
        assert!(body.wounds().is_empty());
        assert_eq!(body.blood_fraction(), 1.0);
    }

    fn halved(raw: &RawDamage) -> MitigationResult {
        MitigationResult {
            residual_damage: raw.damage * 0.5,
            residual_penetration_degree: 0.0,
            layers_traversed: 1,
            absorbed_by: None,
            passthrough: 0.5,
        }
    }

    #[test]
    fn test_stun_only_blow_lands_on_bare_part() {
        let graph = graph();
        let mut body = body(&graph);
        let part = graph.get(BodypartId(1)).unwrap();
        let raw = RawDamage {
            damage: 0.0,
            pain: 0.0,
            stun: 30.0,
            damage_type: DamageType::Crushing,
            penetration_degree: 0.0,
        };
        let report = apply(&raw, &unmitigated(&raw), part, &mut body, &graph, &DamageSource::default(), &EngineConfig::default());
        assert_eq!(report.stun, 30.0);
        assert_eq!(report.damage, 0.0);
        assert_eq!(report.blood_lost, 0.0);
        let wound = body.wounds().get(report.wound.unwrap()).unwrap();
        assert_eq!(wound.current_stun(), 30.0);
    }

    #[test]
    fn test_armour_scales_pain_and_stun_by_passthrough() {
        let graph = graph();
        let mut body = body(&graph);
        let part = graph.get(BodypartId(1)).unwrap();
        let raw = RawDamage {
            stun: 8.0,
            ..flat(10.0)
        };
        let report = apply(&raw, &halved(&raw), part, &mut body, &graph, &DamageSource::default(), &EngineConfig::default());
        assert_eq!(report.damage, 5.0);
        assert_eq!(report.pain, 5.0);
        assert_eq!(report.stun, 4.0);
    }

    #[test]
    fn test_blood_loss_follows_raw_damage_through_armour() {
        let graph = graph();
        let mut body = body(&graph);
        let part = graph.get(BodypartId(1)).unwrap();
        let config = EngineConfig::default();
        let raw = flat(10.0);
        let report = apply(&raw, &halved(&raw), part, &mut body, &graph, &DamageSource::default(), &config);
        let expected = part.bleed_modifier * 10.0 * config.blood_loss_per_damage;
        assert!((report.blood_lost - expected).abs() < 1e-12);
        assert!((report.blood_lost - 0.1).abs() < 1e-12);
    }
}
