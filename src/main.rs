//! injury-sim: a duel between two humanoids, narrated blow by blow
//!
//! Loads the data catalog, arms two fighters, runs rounds until one of them
//! can no longer act, then lets time pass so bleeding, healing and infection
//! play out. Ends with a summary (text or JSON).

use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use injury_engine::armour::WornItem;
use injury_engine::catalog::Catalog;
use injury_engine::combat::{AttackOutcome, Attacker, WeaponAttack};
use injury_engine::core::error::{EngineError, Result};
use injury_engine::core::types::{ArmourTypeId, AttackId, BodyId, BodypartId, CharacterId, ItemId, MaterialId};
use injury_engine::core::EngineConfig;
use injury_engine::engine::{InjuryEngine, MemoryEventLog};
use injury_engine::entity::{Bloodtype, Body};
use injury_engine::health::describe::{describe_health, describe_infection, describe_wound};
use injury_engine::health::HealthState;

#[derive(Parser, Debug)]
#[command(name = "injury-sim")]
#[command(about = "Run a narrated duel through the injury engine")]
struct Args {
    /// Data directory holding anatomy/, armour.toml and attacks.toml
    #[arg(long, default_value = "data")]
    data: PathBuf,

    /// Engine config (defaults to <data>/engine.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum exchange rounds
    #[arg(long, default_value_t = 30)]
    rounds: u32,

    /// Seconds of game time per round
    #[arg(long, default_value_t = 6)]
    round_seconds: u64,

    /// Hours simulated after the fight, one tick per hour
    #[arg(long, default_value_t = 72)]
    aftermath_hours: u32,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: text or json
    #[arg(long, default_value = "text")]
    format: String,

    /// Debug logging from the engine
    #[arg(long, short = 'v')]
    verbose: bool,
}

struct Fighter {
    name: &'static str,
    body: BodyId,
    attacker: Attacker,
    attacks: Vec<AttackId>,
}

#[derive(Serialize)]
struct FighterSummary {
    name: String,
    bloodtype: Bloodtype,
    ethnicity: String,
    health: HealthState,
    blood_fraction: f64,
    stamina: f64,
    wounds: Vec<String>,
    infections: Vec<String>,
    severed: Vec<String>,
}

#[derive(Serialize)]
struct DuelSummary {
    seed: u64,
    rounds: u32,
    hits: u32,
    misses: u32,
    events: usize,
    fighters: Vec<FighterSummary>,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "injury_engine=debug" } else { "injury_engine=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("injury-sim: {}", e);
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    match &args.config {
        Some(path) => EngineConfig::load(path),
        None => {
            let path = args.data.join("engine.toml");
            if path.exists() {
                EngineConfig::load(&path)
            } else {
                Ok(EngineConfig::default())
            }
        }
    }
}

fn attack_id(catalog: &Catalog, name: &str) -> Result<AttackId> {
    catalog
        .attack_by_name(name)
        .map(|a| a.id)
        .ok_or_else(|| EngineError::Catalog(format!("attack '{}' missing from catalog", name)))
}

fn armour(name: &str, armour_type: u32, material: u32, layer: u8, covers: &[u32]) -> WornItem {
    WornItem {
        item: ItemId::new(),
        name: name.to_string(),
        armour_type: ArmourTypeId(armour_type),
        material: Some(MaterialId(material)),
        layer,
        covers: covers.iter().map(|&id| BodypartId(id)).collect(),
    }
}

struct Build {
    weight_kg: f64,
    height_cm: f64,
    bloodtype: Bloodtype,
    ethnicity: &'static str,
}

fn spawn(engine: &InjuryEngine, build: Build, worn: Vec<WornItem>) -> Result<BodyId> {
    let graph = engine
        .catalog()
        .graph_by_name("humanoid")
        .ok_or_else(|| EngineError::Catalog("no humanoid body prototype".into()))?;
    let mut body = Body::new(CharacterId::new(), graph, build.weight_kg, build.height_cm, engine.config())
        .with_bloodtype(build.bloodtype)
        .with_ethnicity(build.ethnicity)
        .with_exposure(0.4);
    for item in worn {
        body.wear(item);
    }
    engine.add_body(body)
}

fn can_act(engine: &InjuryEngine, body: BodyId) -> bool {
    engine
        .health_state(body)
        .map(|state| state < HealthState::Unconscious)
        .unwrap_or(false)
}

fn narrate(engine: &InjuryEngine, outcome: &AttackOutcome, attacker: &str, target: &Fighter, attack: &WeaponAttack) -> String {
    engine
        .with_body(target.body, |body| {
            engine
                .catalog()
                .graph(body.prototype())
                .map(|graph| outcome.narrate(attacker, target.name, attack, graph))
        })
        .ok()
        .flatten()
        .unwrap_or_default()
}

fn summarize(engine: &InjuryEngine, fighter: &Fighter) -> Result<FighterSummary> {
    let health = engine.health_state(fighter.body)?;
    engine.with_body(fighter.body, |body| {
        let graph = engine.catalog().graph(body.prototype());
        let part_name = |id: BodypartId| {
            graph
                .and_then(|g| g.get(id))
                .map(|p| p.name.clone())
                .unwrap_or_else(|| id.to_string())
        };
        let mut severed: Vec<_> = body.severed_parts().iter().copied().collect();
        severed.sort();
        FighterSummary {
            name: fighter.name.to_string(),
            bloodtype: body.bloodtype(),
            ethnicity: body.ethnicity().to_string(),
            health,
            blood_fraction: body.blood_fraction(),
            stamina: body.stamina(),
            wounds: body
                .wounds()
                .wounds()
                .iter()
                .filter_map(|w| graph.and_then(|g| g.get(w.bodypart())).map(|p| describe_wound(w, p)))
                .collect(),
            infections: body
                .infections()
                .iter()
                .map(|i| describe_infection(i, i.bodypart().and_then(|id| graph.and_then(|g| g.get(id)))))
                .collect(),
            severed: severed.into_iter().map(part_name).collect(),
        }
    })
}

fn run(args: &Args) -> Result<()> {
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    let catalog = Arc::new(Catalog::load_directory(&args.data)?);
    let config = EngineConfig {
        seed,
        ..load_config(args)?
    };
    let log = Arc::new(MemoryEventLog::new());
    let engine = InjuryEngine::new(Arc::clone(&catalog), config)?.with_event_sink(log.clone());

    // Aldric: longsword, mail over padding on the trunk
    let aldric_body = spawn(
        &engine,
        Build {
            weight_kg: 82.0,
            height_cm: 183.0,
            bloodtype: Bloodtype::APositive,
            ethnicity: "northman",
        },
        vec![
            armour("padded gambeson", 1, 1, 0, &[1, 2, 3, 6, 9, 21]),
            armour("mail hauberk", 2, 2, 1, &[1, 2, 3, 21]),
        ],
    )?;
    // Brenna: axe and mace, steel cap and leather
    let brenna_body = spawn(
        &engine,
        Build {
            weight_kg: 70.0,
            height_cm: 172.0,
            bloodtype: Bloodtype::ONegative,
            ethnicity: "marcher",
        },
        vec![
            armour("leather jerkin", 1, 1, 0, &[1, 2, 3, 21]),
            armour("steel cap", 3, 3, 1, &[5, 20]),
        ],
    )?;

    let fighters = [
        Fighter {
            name: "Aldric",
            body: aldric_body,
            attacker: Attacker::new()
                .body(aldric_body)
                .with_trait("strength", 14.0)
                .with_weapon_trait("quality", 2.0),
            attacks: vec![
                attack_id(&catalog, "longsword slash")?,
                attack_id(&catalog, "longsword thrust")?,
            ],
        },
        Fighter {
            name: "Brenna",
            body: brenna_body,
            attacker: Attacker::new()
                .body(brenna_body)
                .with_trait("strength", 12.0)
                .with_weapon_trait("quality", 1.0),
            attacks: vec![attack_id(&catalog, "axe chop")?, attack_id(&catalog, "mace blow")?],
        },
    ];

    let mut lines = Vec::new();
    let (mut hits, mut misses, mut rounds) = (0u32, 0u32, 0u32);
    'duel: for round in 1..=args.rounds {
        rounds = round;
        for (attacker, defender) in [(&fighters[0], &fighters[1]), (&fighters[1], &fighters[0])] {
            if !can_act(&engine, attacker.body) || !can_act(&engine, defender.body) {
                break 'duel;
            }
            let Some(&chosen) = attacker.attacks.choose(&mut rng) else { continue };
            let attack = catalog.attack(chosen)?;
            let outcome = engine.resolve_attack(&attacker.attacker, chosen, defender.body, &mut rng)?;
            if outcome.is_hit() {
                hits += 1;
            } else {
                misses += 1;
            }
            lines.push(format!("[{}] {}", round, narrate(&engine, &outcome, attacker.name, defender, attack)));
        }
        engine.tick_all(Duration::from_secs(args.round_seconds));
    }

    for hour in 1..=args.aftermath_hours {
        for (id, report) in engine.tick_all(Duration::from_secs(3600)) {
            if let (true, Some(after)) = (report.status_changed(), report.status_after) {
                if let Some(fighter) = fighters.iter().find(|f| f.body == id) {
                    lines.push(format!("[+{}h] {} {}.", hour, fighter.name, describe_health(after)));
                }
            }
        }
    }
    info!(rounds, hits, misses, "duel finished");

    let summary = DuelSummary {
        seed,
        rounds,
        hits,
        misses,
        events: log.len(),
        fighters: fighters.iter().map(|f| summarize(&engine, f)).collect::<Result<_>>()?,
    };

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    for line in &lines {
        println!("{}", line);
    }
    println!();
    for fighter in &summary.fighters {
        println!(
            "{}: {:?}, blood {:.0}%, stamina {:.0}",
            fighter.name,
            fighter.health,
            fighter.blood_fraction * 100.0,
            fighter.stamina
        );
        for wound in &fighter.wounds {
            println!("  - {}", wound);
        }
        for infection in &fighter.infections {
            println!("  - {}", infection);
        }
        if !fighter.severed.is_empty() {
            println!("  missing: {}", fighter.severed.join(", "));
        }
    }
    println!("\nseed {} | {} rounds | {} hits | {} misses | {} events", seed, rounds, hits, misses, summary.events);
    Ok(())
}
