//! Bomb Arena Server - headless harness
//!
//! Runs the authoritative world at the configured tick rate with a handful
//! of bots standing in for connected clients:
//! - Loads configuration from the environment (and `.env`)
//! - Builds the tile map (built-in arena or `HARNESS_MAP`)
//! - Feeds seeded random input to every bot each tick
//! - Drains events, messages and snapshots as a transport would

use std::path::Path;

use anyhow::Context;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bomb_arena_server::config::{Config, HarnessConfig};
use bomb_arena_server::game::input::INPUT_STATE_MASK;
use bomb_arena_server::game::{Observer, PlayerInput, Team, TileMap, World};
use bomb_arena_server::net::ServerMsg;
use bomb_arena_server::util::time::{tick_duration, Timer};

const ARENA: &str = "
########################################
#......................................#
#..S...........................S.......#
#......####..............####..........#
#......................................#
#..............>>>>>>..................#
#.........S..............S.............#
#....#########........#########........#
#......................................#
#..S.........^^..........^^.......S....#
#......N#####################N.........#
#......................................#
#XXXX..............................XXXX#
########################################
";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting Bomb Arena Server");

    let map = load_map(config.harness.map_path.as_deref())?;
    let seed = config.harness.seed.unwrap_or_else(rand::random);
    info!(
        seed,
        width = map.width(),
        height = map.height(),
        spawns = map.spawn_points().len(),
        "Map loaded"
    );

    let mut world = World::bomb(config.game, map, seed);
    let mut bots = join_bots(&mut world, &config.harness);
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0x5eed);

    tokio::select! {
        _ = run(&mut world, &mut bots, &mut rng, config.harness.seconds) => {
            info!("Harness run finished");
        }
        _ = shutdown_signal() => {}
    }

    info!(tick = world.tick(), "Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

fn load_map(path: Option<&Path>) -> anyhow::Result<TileMap> {
    let Some(path) = path else {
        return Ok(TileMap::parse(ARENA)?);
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading map {}", path.display()))?;
    TileMap::parse(&text).with_context(|| format!("parsing map {}", path.display()))
}

/// Random-walk input standing in for a client
struct Bot {
    slot: usize,
    input: PlayerInput,
}

impl Bot {
    fn next_input(&mut self, rng: &mut ChaCha8Rng) -> PlayerInput {
        let input = &mut self.input;
        if rng.gen_bool(0.05) {
            input.direction = rng.gen_range(-1..=1);
        }
        if rng.gen_bool(0.1) {
            input.target_x = rng.gen_range(-300..=300);
            input.target_y = rng.gen_range(-300..=300);
        }
        input.jump = i32::from(rng.gen_bool(0.03));
        if rng.gen_bool(0.05) {
            input.hook ^= 1;
        }
        // Every bump is a press or a release
        if rng.gen_bool(0.1) {
            input.fire = (input.fire + 1) & INPUT_STATE_MASK;
        }
        input.wanted_weapon = if rng.gen_bool(0.01) {
            rng.gen_range(1..=2)
        } else {
            0
        };
        *input
    }
}

fn join_bots(world: &mut World, harness: &HarnessConfig) -> Vec<Bot> {
    let mut bots = Vec::with_capacity(harness.bots);
    for i in 0..harness.bots {
        let team = if world.config().teamplay && i % 2 == 1 {
            Team::Blue
        } else {
            Team::Red
        };
        match world.join(&format!("bot{i}"), team) {
            Some(slot) => bots.push(Bot {
                slot,
                input: PlayerInput::default(),
            }),
            None => {
                warn!(requested = harness.bots, joined = bots.len(), "Server full");
                break;
            }
        }
    }
    bots
}

async fn run(world: &mut World, bots: &mut [Bot], rng: &mut ChaCha8Rng, seconds: u64) {
    let tick_speed = world.config().tick_speed;
    let mut tick_interval = interval(tick_duration(tick_speed));
    tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let total_ticks = seconds * tick_speed as u64;
    let mut timer = Timer::new();

    for _ in 0..total_ticks {
        tick_interval.tick().await;

        for bot in bots.iter_mut() {
            let input = bot.next_input(rng);
            world.on_predicted_input(bot.slot, input);
            world.on_direct_input(bot.slot, input);
        }

        timer.reset();
        world.step();
        let step_us = timer.elapsed_micros();

        publish(world, bots);

        if world.tick() % tick_speed == 0 {
            debug!(
                tick = world.tick(),
                step_us,
                characters = world.characters().count(),
                "Tick"
            );
        }
    }
}

/// Hand this tick's output to where a transport would send it
fn publish(world: &mut World, bots: &[Bot]) {
    for bot in bots {
        let snapshot = world.snap(Observer::Client(bot.slot));
        trace!(target: "net", slot = bot.slot, items = snapshot.len(), "snapshot");
    }

    let (events, outbound) = world.drain();
    trace!(target: "net", tick = world.tick(), events = events.len(), "events");

    for out in &outbound {
        if let ServerMsg::KillMsg(kill) = &out.msg {
            info!(
                killer = kill.killer,
                victim = kill.victim,
                weapon = kill.weapon,
                special = kill.mode_special,
                "Kill"
            );
        }
        match serde_json::to_string(out) {
            Ok(json) => trace!(target: "net", "{}", json),
            Err(e) => warn!(error = %e, "Failed to encode outbound message"),
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
