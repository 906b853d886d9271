//! The controllable character
//!
//! A character is ticked in two phases by the world. [`Character::tick`]
//! feeds input into the movement core, applies map effects, handles weapons
//! and refreshes the status display. Once every character has done that,
//! [`Character::tick_deferred`] moves the core, plays movement cues and
//! decides whether observers need a fresh dead-reckoning baseline.

mod damage;
mod environment;
mod fire;
mod reckoning;
mod snap;

pub use damage::effective_damage;
pub use environment::accel_direction;
pub use snap::SnapContext;

use glam::Vec2;

use super::collision::TileMap;
use super::context::GameContext;
use super::core::CharacterCore;
use super::input::{PlayerInput, INPUT_STATE_MASK};
use super::weapons::{Arsenal, WeaponKind, WEAPON_WORLD};
use crate::net::Emote;
use crate::util::time::Tick;

#[derive(Debug, Clone)]
pub struct Character {
    slot: usize,
    alive: bool,
    /// Mirror of the core position, refreshed after every move
    pos: Vec2,
    health: i32,
    armor: i32,
    arsenal: Arsenal,

    input: PlayerInput,
    /// Movement input of the tick before
    prev_input: PlayerInput,
    /// Raw samples for edge detection, separate from the movement input
    latest_input: PlayerInput,
    latest_prev_input: PlayerInput,
    num_inputs: i32,

    core: CharacterCore,
    reckoning_core: CharacterCore,
    send_core: CharacterCore,
    reckoning_tick: Tick,

    emote: Emote,
    emote_stop: Tick,
    last_action: Tick,
    last_no_ammo_sound: Tick,
    attack_tick: Tick,
    damage_taken: i32,
    damage_taken_tick: Tick,
    landed_on_accel_ticks: i32,
    ninja_activation_tick: Tick,
}

impl Character {
    /// A freshly spawned character for `slot` at `pos`
    pub fn new(slot: usize, pos: Vec2) -> Self {
        Self {
            slot,
            alive: true,
            pos,
            health: 0,
            armor: 0,
            arsenal: Arsenal::default(),
            input: PlayerInput::default(),
            prev_input: PlayerInput::default(),
            latest_input: PlayerInput::default(),
            latest_prev_input: PlayerInput::default(),
            num_inputs: 0,
            core: CharacterCore::new(Some(slot), pos),
            reckoning_core: CharacterCore::default(),
            send_core: CharacterCore::default(),
            reckoning_tick: 0,
            emote: Emote::Normal,
            emote_stop: -1,
            last_action: -1,
            last_no_ammo_sound: -1,
            attack_tick: 0,
            damage_taken: 0,
            damage_taken_tick: 0,
            landed_on_accel_ticks: 0,
            ninja_activation_tick: 0,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn core(&self) -> &CharacterCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut CharacterCore {
        &mut self.core
    }

    pub fn reckoning_core(&self) -> &CharacterCore {
        &self.reckoning_core
    }

    pub fn send_core(&self) -> &CharacterCore {
        &self.send_core
    }

    pub fn reckoning_tick(&self) -> Tick {
        self.reckoning_tick
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn armor(&self) -> i32 {
        self.armor
    }

    pub fn arsenal(&self) -> &Arsenal {
        &self.arsenal
    }

    pub fn active_weapon(&self) -> WeaponKind {
        self.arsenal.active()
    }

    pub fn emote(&self) -> (Emote, Tick) {
        (self.emote, self.emote_stop)
    }

    pub fn attack_tick(&self) -> Tick {
        self.attack_tick
    }

    pub fn last_action(&self) -> Tick {
        self.last_action
    }

    pub fn input(&self) -> &PlayerInput {
        &self.input
    }

    pub fn prev_input(&self) -> &PlayerInput {
        &self.prev_input
    }

    pub fn set_emote(&mut self, emote: Emote, stop: Tick) {
        self.emote = emote;
        self.emote_stop = stop;
    }

    /// Direction of the latest aim
    pub fn aim_dir(&self) -> Vec2 {
        self.latest_input.target().normalize_or_zero()
    }

    pub fn is_grounded(&self, map: &TileMap) -> bool {
        self.core.is_grounded(map)
    }

    /// Fails without change when already at 10 and asked for more
    pub fn increase_health(&mut self, amount: i32) -> bool {
        if self.health >= 10 && amount > 0 {
            return false;
        }
        self.health = (self.health + amount).clamp(0, 10);
        true
    }

    /// Fails without change when already at 10 and asked for more
    pub fn increase_armor(&mut self, amount: i32) -> bool {
        if self.armor >= 10 && amount > 0 {
            return false;
        }
        self.armor = (self.armor + amount).clamp(0, 10);
        true
    }

    /// Lock movement input for `ticks` ticks
    pub fn freeze(&mut self, ticks: i32) {
        self.core.frozen = ticks.max(0);
    }

    pub fn freeze_ticks(&self) -> i32 {
        self.core.frozen
    }

    /// Input used for movement; arrives once per tick
    pub fn on_predicted_input(&mut self, input: PlayerInput, tick: Tick) {
        self.prev_input = self.input;
        if self.input != input {
            self.last_action = tick;
        }
        self.input = input;
        self.num_inputs += 1;
        self.input.sanitize_target();
    }

    /// Raw input as soon as it arrives; weapon edges are taken from here
    pub fn on_direct_input(&mut self, input: PlayerInput, ctx: &mut GameContext<'_>) {
        self.latest_prev_input = self.latest_input;
        self.latest_input = input;
        self.latest_input.sanitize_target();

        let spectating = ctx
            .players
            .get(self.slot)
            .map_or(true, |p| p.is_spectator());

        if self.num_inputs > 2 && !spectating {
            self.handle_weapon_switch(ctx);
            self.fire_weapon(ctx);
        }

        self.latest_prev_input = self.latest_input;
    }

    /// Drop held movement and release the trigger
    pub fn reset_input(&mut self) {
        self.input.direction = 0;
        self.input.hook = 0;
        self.input.fire &= INPUT_STATE_MASK;
        if self.input.fire & 1 != 0 {
            self.input.fire = (self.input.fire + 1) & INPUT_STATE_MASK;
        }
        self.input.jump = 0;
        self.latest_input = self.input;
        self.latest_prev_input = self.input;
    }

    /// First tick phase
    pub fn tick(&mut self, ctx: &mut GameContext<'_>) {
        self.announce_force_balance(ctx);

        self.core.input = self.input;
        let world = ctx.core_world();
        self.core.tick(true, &world, ctx.map, ctx.tuning);

        if self.touches_death(ctx.map) {
            self.die(self.slot as i32, WEAPON_WORLD, ctx);
            return;
        }

        self.handle_accelerators(ctx);
        self.handle_weapons(ctx);
        self.update_status(ctx);
    }

    /// Keep every stored tick stamp in place while the world is paused
    pub fn tick_paused(&mut self) {
        self.attack_tick += 1;
        self.damage_taken_tick += 1;
        self.ninja_activation_tick += 1;
        self.reckoning_tick += 1;
        if self.last_action != -1 {
            self.last_action += 1;
        }
        self.arsenal.tick_paused();
        if self.emote_stop > -1 {
            self.emote_stop += 1;
        }
    }

    /// Detach from the core table without the death effects
    pub fn destroy(&mut self, ctx: &mut GameContext<'_>) {
        ctx.cores.clear(self.slot);
        self.alive = false;
    }

    fn announce_force_balance(&mut self, ctx: &mut GameContext<'_>) {
        let Some(player) = ctx.players.get_mut(self.slot) else {
            return;
        };
        if !player.force_balanced {
            return;
        }
        player.force_balanced = false;
        let team = player.team;
        let text = format!(
            "You were moved to {} due to team balancing",
            ctx.controller.team_name(team)
        );
        ctx.events.broadcast(self.slot, text);
    }

    /// Armor shows the fuse, health the player capacity, plus the once-a-second
    /// bomb notices
    fn update_status(&mut self, ctx: &mut GameContext<'_>) {
        let ts = ctx.tick_speed().max(1);
        let fuse = ctx.controller.fuse(self.slot);
        let full = ctx.config.bomb_fuse_ticks().max(1);

        self.armor = ((10.0 * fuse as f32 / full as f32).round() as i32).clamp(0, 10);
        self.health = (ctx.config.max_clients - ctx.config.spectator_slots).clamp(0, 10);

        // Once per fuse second; without a running fuse, once per server second.
        let pulse = if fuse > 0 {
            (fuse + 1) % ts == 0
        } else {
            ctx.tick % ts == 0
        };
        if !pulse {
            return;
        }

        let is_bomb = ctx.controller.is_bomb(self.slot);
        if ctx.config.bomb_broadcast {
            let text = if is_bomb {
                format!(
                    "You are the bomb! Hit someone in {} seconds or you'll explode!",
                    fuse / ts
                )
            } else if ctx.active_players() < 2 {
                "At least 2 players are required to play".to_string()
            } else {
                String::new()
            };
            ctx.events.broadcast(self.slot, text);
        }

        if is_bomb {
            let sound = if self.armor < 4 {
                crate::net::Sound::PlayerPainLong
            } else {
                crate::net::Sound::PlayerPainShort
            };
            ctx.events.create_sound_global(self.pos, sound);
        }
    }
}
