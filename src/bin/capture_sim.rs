//! Headless Capture Round Runner
//!
//! Loads a round file, lets seeded squads wander between the objectives and
//! skirmish, and reports the announcements and the outcome.

use capture_engine::capture::{Announcement, CaptureSystem, CombatantRoster, MobState, RoundOutcome};
use capture_engine::core::config::RoundConfig;
use capture_engine::core::error::Result;
use capture_engine::core::types::{EntityId, FactionId, Tick, Vec2};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Headless Capture Round Runner
#[derive(Parser, Debug)]
#[command(name = "capture_sim")]
#[command(about = "Run a capture-area round with wandering squads and print the result")]
struct Args {
    /// Round file to load
    #[arg(long, default_value = "data/rounds/king_of_the_hill.toml")]
    round: PathBuf,

    /// Combatants per faction
    #[arg(long, default_value_t = 8)]
    squad_size: usize,

    /// Maximum ticks before the run stops undecided
    #[arg(long, default_value_t = 7200)]
    max_ticks: u64,

    /// Simulated seconds per tick
    #[arg(long, default_value_t = 1.0)]
    dt: f32,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print announcements to stderr as they happen
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct RoundResult {
    mode: String,
    outcome: String,
    winner: Option<String>,
    ticks: Tick,
    announcements: Vec<String>,
    summary: Vec<String>,
    seed: u64,
}

/// Movement and respawn bookkeeping for one combatant
struct Agent {
    id: EntityId,
    home: Vec2,
    target: usize,
    respawn_at: Option<Tick>,
}

const WALK_SPEED: f32 = 1.4;
const RETARGET_CHANCE: f64 = 0.02;
const SKIRMISH_DEATH_CHANCE: f64 = 0.01;
const RESPAWN_TICKS: Tick = 30;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("capture_engine=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    let config = RoundConfig::load(&args.round)?;
    let objectives: Vec<Vec2> = config.regions.iter().map(|r| r.location).collect();
    let factions: Vec<FactionId> = config.roster.ids().collect();

    let mut roster = CombatantRoster::new();
    for region in &config.regions {
        roster.anchor(region.id);
    }

    let mut agents = Vec::new();
    for (i, &faction) in factions.iter().enumerate() {
        // Spread faction homes on a ring around the map
        let angle = i as f32 / factions.len().max(1) as f32 * std::f32::consts::TAU;
        let home = Vec2::new(angle.cos(), angle.sin()) * 80.0;
        for _ in 0..args.squad_size {
            let id = roster.spawn(vec![faction], home);
            agents.push(Agent {
                id,
                home,
                target: pick_target(&mut rng, objectives.len()),
                respawn_at: None,
            });
        }
    }

    let mut system = CaptureSystem::start_round(config)?;
    let mut heard: Vec<Announcement> = Vec::new();
    let mut ends: Vec<RoundOutcome> = Vec::new();

    while !system.is_round_over() && system.current_tick() < args.max_ticks {
        let now = system.current_tick();
        step_agents(&mut rng, &mut roster, &mut agents, &objectives, now, args.dt);
        skirmish(&mut rng, &mut roster, &mut agents, now);

        let report = system.tick(args.dt, &roster);
        if args.verbose {
            for announcement in &report.announcements {
                eprintln!("  [{}] {}: {}", report.tick, announcement.category.as_str(), announcement.message);
            }
        }
        report.dispatch(&mut heard, &mut ends);
    }

    let (outcome, winner) = match ends.first() {
        Some(RoundOutcome::CaptureVictory { faction, .. }) => {
            ("CaptureVictory".to_string(), Some(system.roster().display_name(*faction).to_string()))
        }
        Some(RoundOutcome::DefenderVictory { faction }) => {
            ("DefenderVictory".to_string(), Some(system.roster().display_name(*faction).to_string()))
        }
        None => ("Undecided".to_string(), None),
    };

    let result = RoundResult {
        mode: system.mode().name().to_string(),
        outcome,
        winner,
        ticks: system.current_tick(),
        announcements: heard.iter().map(|a| a.message.clone()).collect(),
        summary: system.round_summary(),
        seed,
    };

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "text" => {
            println!("Capture Round Result");
            println!("====================");
            println!("Mode: {}", result.mode);
            println!("Outcome: {}", result.outcome);
            if let Some(winner) = &result.winner {
                println!("Winner: {}", winner);
            }
            println!("Ticks: {}", result.ticks);
            println!();
            for line in &result.summary {
                println!("{}", line);
            }
            println!();
            println!("Seed: {}", result.seed);
        }
        _ => {
            eprintln!("Unknown format '{}', defaulting to json", args.format);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn pick_target(rng: &mut StdRng, objectives: usize) -> usize {
    if objectives == 0 {
        0
    } else {
        rng.gen_range(0..objectives)
    }
}

/// Walk living agents toward their objective, respawn the fallen at home
fn step_agents(
    rng: &mut StdRng,
    roster: &mut CombatantRoster,
    agents: &mut [Agent],
    objectives: &[Vec2],
    now: Tick,
    dt: f32,
) {
    for agent in agents.iter_mut() {
        if let Some(at) = agent.respawn_at {
            if now < at {
                continue;
            }
            agent.respawn_at = None;
            roster.set_state(agent.id, MobState::Alive);
            roster.move_to(agent.id, agent.home);
            agent.target = pick_target(rng, objectives.len());
        }

        let Some(&target) = objectives.get(agent.target) else {
            continue;
        };
        let Some(position) = roster.get(agent.id).map(|c| c.position) else {
            continue;
        };

        let offset = target - position;
        let distance = offset.length();
        if distance < 2.0 {
            if rng.gen_bool(RETARGET_CHANCE) {
                agent.target = pick_target(rng, objectives.len());
            }
            continue;
        }

        let jitter = Vec2::new(rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5));
        let step = (offset * (1.0 / distance)) * (WALK_SPEED * dt) + jitter;
        roster.move_to(agent.id, position + step);
    }
}

/// Combatants standing near enemies sometimes go down
fn skirmish(rng: &mut StdRng, roster: &mut CombatantRoster, agents: &mut [Agent], now: Tick) {
    let alive: Vec<(EntityId, Vec2, Vec<FactionId>)> = roster
        .iter()
        .filter(|c| c.is_alive())
        .map(|c| (c.id, c.position, c.factions.clone()))
        .collect();

    for agent in agents.iter_mut() {
        let Some((_, position, factions)) = alive.iter().find(|(id, _, _)| *id == agent.id) else {
            continue;
        };
        let threatened = alive.iter().any(|(_, other_pos, other_factions)| {
            other_pos.distance(position) < 6.0 && !other_factions.iter().any(|f| factions.contains(f))
        });
        if threatened && rng.gen_bool(SKIRMISH_DEATH_CHANCE) {
            let state = if rng.gen_bool(0.5) { MobState::Dead } else { MobState::Critical };
            roster.set_state(agent.id, state);
            agent.respawn_at = Some(now + RESPAWN_TICKS);
        }
    }
}
