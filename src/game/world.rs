//! The authoritative game world
//!
//! Owns every player, character and projectile and runs the fixed tick:
//! respawns, stun timers, projectiles, the character input/weapons phase,
//! the deferred movement phase and finally the game mode. Characters are
//! lifted out of the arena one at a time so they can reach the rest of the
//! world through a [`GameContext`].

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use super::arena::{CharacterArena, CoreTable};
use super::character::{Character, SnapContext};
use super::collision::TileMap;
use super::context::GameContext;
use super::controller::{BombController, Controller, ControllerAction};
use super::entities::{explosion_falloff, Entities, Impact, EXPLOSION_RADIUS};
use super::events::EventQueue;
use super::input::PlayerInput;
use super::player::{PlayerTable, Team};
use super::snapshot::{Observer, SnapshotBuffer};
use super::tuning::Tuning;
use super::weapons::{WeaponKind, WEAPON_GAME, WEAPON_SELF};
use crate::config::GameConfig;
use crate::net::{GameEvent, Outbound, Sound};
use crate::util::time::{ms_to_ticks, Tick};

pub struct World {
    tick: Tick,
    paused: bool,
    config: GameConfig,
    tuning: Tuning,
    map: TileMap,
    players: PlayerTable,
    characters: CharacterArena,
    cores: CoreTable,
    controller: Box<dyn Controller>,
    events: EventQueue,
    entities: Entities,
    rng: ChaCha8Rng,
}

impl World {
    pub fn new(config: GameConfig, map: TileMap, controller: Box<dyn Controller>, seed: u64) -> Self {
        Self {
            tick: 0,
            paused: false,
            config,
            tuning: Tuning::default(),
            map,
            players: PlayerTable::new(),
            characters: CharacterArena::new(),
            cores: CoreTable::default(),
            controller,
            events: EventQueue::new(),
            entities: Entities::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// World running the bomb mode
    pub fn bomb(config: GameConfig, map: TileMap, seed: u64) -> Self {
        let controller = BombController::new(&config, seed);
        Self::new(config, map, Box::new(controller), seed)
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn tuning_mut(&mut self) -> &mut Tuning {
        &mut self.tuning
    }

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    pub fn players(&self) -> &PlayerTable {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut PlayerTable {
        &mut self.players
    }

    pub fn character(&self, slot: usize) -> Option<&Character> {
        self.characters.get(slot)
    }

    pub fn character_mut(&mut self, slot: usize) -> Option<&mut Character> {
        self.characters.get_mut(slot)
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter()
    }

    pub fn controller(&self) -> &dyn Controller {
        self.controller.as_ref()
    }

    pub fn entities(&self) -> &Entities {
        &self.entities
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    fn context(&mut self) -> GameContext<'_> {
        GameContext {
            tick: self.tick,
            paused: self.paused,
            config: &self.config,
            tuning: &self.tuning,
            map: &self.map,
            players: &mut self.players,
            characters: &mut self.characters,
            cores: &mut self.cores,
            controller: self.controller.as_mut(),
            events: &mut self.events,
            entities: &mut self.entities,
        }
    }

    /// Lift a character out of the arena and run `f` on it with the rest of
    /// the world
    pub fn with_context<R>(
        &mut self,
        slot: usize,
        f: impl FnOnce(&mut Character, &mut GameContext<'_>) -> R,
    ) -> Option<R> {
        let mut character = self.characters.take(slot)?;
        let result = {
            let mut ctx = self.context();
            f(&mut *character, &mut ctx)
        };
        self.characters.restore(slot, character);
        Some(result)
    }

    /// Add a player. They spawn on the next tick unless spectating.
    pub fn join(&mut self, name: &str, team: Team) -> Option<usize> {
        let limit = usize::try_from(self.config.max_clients).unwrap_or(0);
        let slot = self.players.join(name, team, limit)?;
        if let Some(player) = self.players.get_mut(slot) {
            player.respawn_tick = self.tick;
        }
        info!(slot, name, ?team, "player joined");
        Some(slot)
    }

    pub fn leave(&mut self, slot: usize) {
        self.remove_character(slot);
        if let Some(player) = self.players.leave(slot) {
            info!(slot, name = %player.name, "player left");
        }
    }

    /// Move a player to another team. Their character is removed without a kill.
    pub fn set_team(&mut self, slot: usize, team: Team) {
        let Some(player) = self.players.get_mut(slot) else {
            return;
        };
        if player.team == team {
            return;
        }
        player.team = team;
        player.preferred_team = team;
        player.respawn_tick = self.tick + self.config.tick_speed / 2;
        self.remove_character(slot);
        debug!(slot, ?team, "team changed");
    }

    fn remove_character(&mut self, slot: usize) {
        // Unbind first so no core lookup can reach the removed character
        self.cores.clear(slot);
        if self.characters.get(slot).is_some() {
            self.with_context(slot, |c, ctx| c.destroy(ctx));
            self.characters.remove(slot);
        }
    }

    /// Kill a player's character by their own hand
    pub fn kill(&mut self, slot: usize) {
        self.with_context(slot, |c, ctx| c.die(slot as i32, WEAPON_SELF, ctx));
    }

    pub fn on_predicted_input(&mut self, slot: usize, input: PlayerInput) {
        let Some(player) = self.players.get_mut(slot) else {
            return;
        };
        player.input = input;
        player.player_flags = input.player_flags;
        let tick = self.tick;
        if let Some(c) = self.characters.get_mut(slot) {
            c.on_predicted_input(input, tick);
        }
    }

    pub fn on_direct_input(&mut self, slot: usize, input: PlayerInput) {
        self.with_context(slot, |c, ctx| c.on_direct_input(input, ctx));
    }

    /// Advance the world by one tick
    pub fn step(&mut self) {
        self.tick += 1;

        if self.paused {
            self.tick_paused();
            return;
        }

        self.respawn_players();
        self.update_stuns();
        self.tick_projectiles();

        for slot in self.characters.occupied() {
            self.with_context(slot, |c, ctx| {
                if c.is_alive() {
                    c.tick(ctx);
                }
            });
        }
        self.remove_dead();

        for slot in self.characters.occupied() {
            self.with_context(slot, |c, ctx| c.tick_deferred(ctx));
        }

        self.update_view_positions();

        let alive: Vec<usize> = self
            .characters
            .iter()
            .filter(|c| c.is_alive())
            .map(Character::slot)
            .collect();
        if let Some(ControllerAction::Detonate(slot)) = self.controller.tick(&self.players, &alive) {
            self.detonate(slot);
        }
        self.remove_dead();
    }

    fn tick_paused(&mut self) {
        for c in self.characters.iter_mut() {
            c.tick_paused();
        }
        for p in self.entities.projectiles.iter_mut() {
            p.start_tick += 1;
        }
        for player in self.players.iter_mut() {
            player.respawn_tick += 1;
            player.die_tick += 1;
        }
    }

    fn respawn_players(&mut self) {
        let due: Vec<usize> = self
            .players
            .iter()
            .filter(|p| !p.is_spectator() && p.respawn_tick <= self.tick)
            .map(|p| p.slot)
            .filter(|slot| self.characters.get(*slot).is_none())
            .collect();
        for slot in due {
            self.spawn(slot);
        }
    }

    fn spawn_position(&mut self) -> Vec2 {
        match self.map.spawn_points().choose(&mut self.rng) {
            Some(pos) => *pos,
            None => Vec2::new(
                (self.map.width() * 16) as f32,
                (self.map.height() * 16) as f32,
            ),
        }
    }

    /// Spawn a character for a player right away
    pub fn spawn(&mut self, slot: usize) -> bool {
        if self.players.get(slot).is_none() {
            return false;
        }
        let pos = self.spawn_position();
        let mut character = Character::new(slot, pos);
        self.controller.on_character_spawn(&mut character);

        let Some(handle) = self.characters.insert(slot, character) else {
            return false;
        };
        self.cores.bind(handle);
        self.events.create_spawn(pos);
        self.events.create_sound_global(pos, Sound::PlayerSpawn);
        debug!(slot, x = pos.x, y = pos.y, "spawned");
        true
    }

    /// Count stuns down; an expiring stun takes the ninja away again
    fn update_stuns(&mut self) {
        let floor = -ms_to_ticks(100, self.config.tick_speed);
        let mut expired = Vec::new();
        for player in self.players.iter_mut() {
            if player.stun_tick > 0 {
                player.stun_tick -= 1;
                if player.stun_tick == 0 {
                    expired.push(player.slot);
                }
            } else if player.stun_tick > floor {
                player.stun_tick -= 1;
            }
        }
        for slot in expired {
            if let Some(c) = self.characters.get_mut(slot) {
                c.end_ninja();
            }
        }
    }

    fn tick_projectiles(&mut self) {
        let tick = self.tick;
        let ts = self.config.tick_speed;
        let mut projectiles = std::mem::take(&mut self.entities.projectiles);
        let mut impacts = Vec::new();

        projectiles.retain_mut(|p| {
            let owner = p.owner;
            let characters = &self.characters;
            match p.step(tick, ts, &self.tuning, &self.map, |from, to, radius| {
                characters.intersect_character(from, to, radius, Some(owner))
            }) {
                Some(impact) => {
                    impacts.push(impact);
                    false
                }
                None => true,
            }
        });
        self.entities.projectiles = projectiles;

        for impact in impacts {
            self.resolve_impact(impact);
        }
    }

    fn resolve_impact(&mut self, impact: Impact) {
        if let Some(sound) = impact.sound {
            self.events.create_sound_global(impact.pos, sound);
        }

        if impact.explosive {
            self.create_explosion(impact.pos, impact.owner, impact.weapon);
        } else if let Some(target) = impact.target {
            let force = impact.dir * impact.force.max(0.001);
            let owner = impact.owner as i32;
            self.with_context(target, |c, ctx| {
                c.take_damage(force, impact.damage, owner, impact.weapon.id(), ctx)
            });
        }
    }

    /// Blast with knock-back and damage falling off from the centre
    pub fn create_explosion(&mut self, pos: Vec2, owner: usize, weapon: WeaponKind) {
        self.events.create_explosion(pos);

        for slot in self.characters.find_in_radius(pos, EXPLOSION_RADIUS) {
            let Some(target_pos) = self.characters.get(slot).map(Character::pos) else {
                continue;
            };
            let diff = target_pos - pos;
            let dir = if diff.length() > 0.0 {
                diff.normalize()
            } else {
                Vec2::new(0.0, 1.0)
            };
            let Some((force, dmg)) = explosion_falloff(diff.length()) else {
                continue;
            };
            self.with_context(slot, |c, ctx| {
                c.take_damage(dir * force, dmg, owner as i32, weapon.id(), ctx)
            });
        }
    }

    fn detonate(&mut self, slot: usize) {
        let exploded = self.with_context(slot, |c, ctx| {
            c.make_death_grenades(ctx);
            c.die(slot as i32, WEAPON_GAME, ctx);
        });
        if exploded.is_some() {
            info!(slot, tick = self.tick, "bomb exploded");
        }
    }

    fn remove_dead(&mut self) {
        let dead: Vec<usize> = self
            .characters
            .iter()
            .filter(|c| !c.is_alive())
            .map(Character::slot)
            .collect();
        for slot in dead {
            self.cores.clear(slot);
            self.characters.remove(slot);
        }
    }

    fn update_view_positions(&mut self) {
        for player in self.players.iter_mut() {
            let followed = if player.is_spectator() {
                player.spectator_id
            } else {
                Some(player.slot)
            };
            if let Some(pos) = followed.and_then(|s| self.characters.get(s)).map(Character::pos) {
                player.view_pos = pos;
            }
        }
    }

    /// Build the snapshot one observer receives this tick
    pub fn snap(&mut self, observer: Observer) -> SnapshotBuffer {
        let mut buf = SnapshotBuffer::new(self.tick, observer);
        let ctx = SnapContext {
            tick: self.tick,
            paused: self.paused,
            config: &self.config,
            players: &self.players,
        };
        for c in self.characters.iter_mut() {
            c.snap(&ctx, &mut buf);
        }
        buf
    }

    /// Hand over this tick's events and outbound messages
    pub fn drain(&mut self) -> (Vec<GameEvent>, Vec<Outbound>) {
        self.events.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::collision::Tile;

    fn arena_map() -> TileMap {
        let mut map = TileMap::new(30, 15);
        map.fill(0, 12, 29, 14, Tile::solid());
        map.add_spawn_point(Vec2::new(200.0, 300.0));
        map
    }

    #[test]
    fn players_spawn_on_the_next_tick() {
        let mut world = World::bomb(GameConfig::default(), arena_map(), 3);
        let a = world.join("a", Team::Red).unwrap();
        let watcher = world.join("s", Team::Spectators).unwrap();
        assert!(world.character(a).is_none());

        world.step();
        let c = world.character(a).expect("spawned");
        assert_eq!(c.health(), 10);
        assert!(c.arsenal().owns(WeaponKind::Hammer));
        assert!(world.character(watcher).is_none());

        let (events, _) = world.drain();
        assert!(events.iter().any(|e| matches!(e, GameEvent::Spawn { .. })));
    }

    #[test]
    fn leaving_unbinds_the_core() {
        let mut world = World::bomb(GameConfig::default(), arena_map(), 3);
        let a = world.join("a", Team::Red).unwrap();
        world.step();
        assert!(world.cores.is_bound(a));
        world.leave(a);
        assert!(!world.cores.is_bound(a));
        assert!(world.character(a).is_none());
        assert!(world.players().get(a).is_none());
    }

    #[test]
    fn self_kill_schedules_respawn() {
        let mut world = World::bomb(GameConfig::default(), arena_map(), 3);
        let a = world.join("a", Team::Red).unwrap();
        world.step();
        world.kill(a);
        world.step();
        assert!(world.character(a).is_none());
        assert_eq!(world.players().get(a).unwrap().respawn_tick, 1 + 25);

        for _ in 0..25 {
            world.step();
        }
        assert!(world.character(a).is_some());
    }

    #[test]
    fn pause_freezes_the_clock_of_everything() {
        let mut world = World::bomb(GameConfig::default(), arena_map(), 3);
        let a = world.join("a", Team::Red).unwrap();
        world.step();
        let before = world.character(a).unwrap().pos();
        world.set_paused(true);
        for _ in 0..10 {
            world.step();
        }
        assert_eq!(world.character(a).unwrap().pos(), before);
        assert_eq!(world.tick(), 11);
    }
}
