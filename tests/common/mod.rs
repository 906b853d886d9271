#![allow(dead_code)]

use glam::Vec2;

use bomb_arena_server::config::GameConfig;
use bomb_arena_server::game::{PlayerInput, Tile, TileMap, World};
use bomb_arena_server::net::{GameEvent, Outbound, Sound};

/// Floor surface height of [`flat_map`]
pub const FLOOR_Y: f32 = 480.0;

/// 40x20 tiles with solid ground from row 15 down
pub fn flat_map() -> TileMap {
    let mut map = TileMap::new(40, 20);
    map.fill(0, 15, 39, 19, Tile::solid());
    map
}

/// Centre of a character standing on the floor of [`flat_map`] in tile column `tx`
pub fn standing_at(tx: i32) -> Vec2 {
    Vec2::new(tx as f32 * 32.0 + 16.0, 14.0 * 32.0 + 16.0)
}

pub fn world_with(config: GameConfig, mut map: TileMap, spawns: &[Vec2]) -> World {
    for pos in spawns {
        map.add_spawn_point(*pos);
    }
    World::bomb(config, map, 11)
}

/// Input aiming to the right with everything released
pub fn idle_input() -> PlayerInput {
    PlayerInput {
        target_x: 64,
        ..PlayerInput::default()
    }
}

/// Enough predicted input for direct input to be acted on
pub fn warm_up(world: &mut World, slot: usize) {
    for _ in 0..3 {
        world.on_predicted_input(slot, idle_input());
    }
}

pub fn step_n(world: &mut World, n: usize) -> (Vec<GameEvent>, Vec<Outbound>) {
    let mut events = Vec::new();
    let mut outbound = Vec::new();
    for _ in 0..n {
        world.step();
        let (e, o) = world.drain();
        events.extend(e);
        outbound.extend(o);
    }
    (events, outbound)
}

pub fn count_sound(events: &[GameEvent], wanted: Sound) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, GameEvent::Sound { sound, .. } if *sound == wanted))
        .count()
}

/// Move a character and let one tick settle its visible position
pub fn place(world: &mut World, slot: usize, pos: Vec2) {
    if let Some(c) = world.character_mut(slot) {
        let core = c.core_mut();
        core.pos = pos;
        core.vel = Vec2::ZERO;
    }
}

/// Recipient masks of every `wanted` sound, in emission order
pub fn sound_masks(events: &[GameEvent], wanted: Sound) -> Vec<u64> {
    events
        .iter()
        .filter_map(|e| match e {
            GameEvent::Sound { sound, mask, .. } if *sound == wanted => Some(*mask),
            _ => None,
        })
        .collect()
}

/// Angles of the damage indicators, in emission order
pub fn indicator_angles(events: &[GameEvent]) -> Vec<i32> {
    events
        .iter()
        .filter_map(|e| match e {
            GameEvent::DamageIndicator { angle, .. } => Some(*angle),
            _ => None,
        })
        .collect()
}
