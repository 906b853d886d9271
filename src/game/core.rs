//! Character movement core
//!
//! The core is a plain value: position, velocity, hook and jump state. It is
//! advanced in two steps, `tick` (input, gravity, hook, peer forces) and
//! `apply_movement` (tile collision). Both the authoritative core and the
//! throwaway reckoning copy use the same code, only the peer view differs.

use glam::Vec2;

use super::collision::{TileMap, COLFLAG_NOHOOK};
use super::input::PlayerInput;
use super::math::{closest_point_on_line, round_to_int, saturated_add, velocity_ramp};
use super::tuning::Tuning;
use super::MAX_CLIENTS;
use crate::net::NetCharacterCore;
use crate::util::time::DEFAULT_TICK_SPEED;

/// Collision box edge of a character
pub const PHYS_SIZE: f32 = 28.0;

const MAX_SPEED: f32 = 6000.0;

/// Edge-triggered things that happened during one core tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoreEvents(pub u32);

impl CoreEvents {
    pub const GROUND_JUMP: u32 = 1 << 0;
    pub const AIR_JUMP: u32 = 1 << 1;
    pub const HOOK_LAUNCH: u32 = 1 << 2;
    pub const HOOK_ATTACH_PLAYER: u32 = 1 << 3;
    pub const HOOK_ATTACH_GROUND: u32 = 1 << 4;
    pub const HOOK_HIT_NOHOOK: u32 = 1 << 5;
    pub const HOOK_RETRACT: u32 = 1 << 6;

    pub fn has(self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    fn set(&mut self, flag: u32) {
        self.0 |= flag;
    }
}

/// Hook lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum HookState {
    Retracted = -1,
    #[default]
    Idle = 0,
    RetractStart = 1,
    Retracting = 2,
    RetractEnd = 3,
    Flying = 4,
    Grabbed = 5,
}

impl HookState {
    fn from_wire(v: i32) -> Self {
        match v {
            -1 => Self::Retracted,
            1 => Self::RetractStart,
            2 => Self::Retracting,
            3 => Self::RetractEnd,
            4 => Self::Flying,
            5 => Self::Grabbed,
            _ => Self::Idle,
        }
    }
}

/// What a core can see of another character
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeerCore {
    pub pos: Vec2,
    pub vel: Vec2,
}

/// Read-only view of every live core, indexed by slot
#[derive(Debug, Clone, Default)]
pub struct CoreWorld {
    peers: [Option<PeerCore>; MAX_CLIENTS],
}

impl CoreWorld {
    pub fn set(&mut self, slot: usize, peer: PeerCore) {
        if let Some(entry) = self.peers.get_mut(slot) {
            *entry = Some(peer);
        }
    }

    pub fn get(&self, slot: usize) -> Option<&PeerCore> {
        self.peers.get(slot).and_then(Option::as_ref)
    }

    fn others(&self, me: Option<usize>) -> impl Iterator<Item = (usize, &PeerCore)> {
        self.peers
            .iter()
            .enumerate()
            .filter(move |(i, _)| Some(*i) != me)
            .filter_map(|(i, p)| p.as_ref().map(|p| (i, p)))
    }
}

/// Movement state of one character
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CharacterCore {
    /// Slot this core is bound to, `None` for detached copies
    pub slot: Option<usize>,
    pub pos: Vec2,
    pub vel: Vec2,
    pub hook_pos: Vec2,
    pub hook_dir: Vec2,
    pub hook_tick: i32,
    pub hook_state: HookState,
    pub hooked_player: i32,
    /// Bit 0: jump held since last jump, bit 1: air jump used
    pub jumped: i32,
    pub direction: i32,
    /// Aim angle scaled by 256
    pub angle: i32,
    pub input: PlayerInput,
    /// Ticks left during which input is ignored
    pub frozen: i32,
    /// Treat the core as standing on ground even in mid-air
    pub cond_grounded: bool,
    pub triggered_events: CoreEvents,
}

impl CharacterCore {
    /// Fresh core bound to a slot
    pub fn new(slot: Option<usize>, pos: Vec2) -> Self {
        Self {
            slot,
            pos,
            hook_pos: pos,
            hooked_player: -1,
            ..Default::default()
        }
    }

    fn grounded(&self, map: &TileMap) -> bool {
        let foot = self.pos.y + PHYS_SIZE / 2.0 + 5.0;
        self.cond_grounded
            || map.check_point(self.pos.x + PHYS_SIZE / 2.0, foot)
            || map.check_point(self.pos.x - PHYS_SIZE / 2.0, foot)
    }

    pub fn is_grounded(&self, map: &TileMap) -> bool {
        self.grounded(map)
    }

    /// Advance velocity, hook and jump state by one tick. Position only
    /// changes in [`CharacterCore::apply_movement`].
    pub fn tick(&mut self, use_input: bool, world: &CoreWorld, map: &TileMap, tuning: &Tuning) {
        self.triggered_events = CoreEvents::default();

        let mut use_input = use_input;
        if self.frozen > 0 {
            self.frozen -= 1;
            use_input = false;
            self.direction = 0;
        }

        let grounded = self.grounded(map);
        let target_dir = self.input.target().normalize_or_zero();

        self.vel.y += tuning.gravity;

        let (max_speed, accel, friction) = if grounded {
            (
                tuning.ground_control_speed,
                tuning.ground_control_accel,
                tuning.ground_friction,
            )
        } else {
            (
                tuning.air_control_speed,
                tuning.air_control_accel,
                tuning.air_friction,
            )
        };

        if use_input {
            self.direction = self.input.direction;

            let a = (self.input.target_y as f32).atan2(self.input.target_x as f32);
            self.angle = if a < -std::f32::consts::FRAC_PI_2 {
                ((a + std::f32::consts::TAU) * 256.0) as i32
            } else {
                (a * 256.0) as i32
            };

            if self.input.jump != 0 {
                if self.jumped & 1 == 0 {
                    if grounded {
                        self.triggered_events.set(CoreEvents::GROUND_JUMP);
                        self.vel.y = -tuning.ground_jump_impulse;
                        self.jumped |= 1;
                    } else if self.jumped & 2 == 0 {
                        self.triggered_events.set(CoreEvents::AIR_JUMP);
                        self.vel.y = -tuning.air_jump_impulse;
                        self.jumped |= 3;
                    }
                }
            } else {
                self.jumped &= !1;
            }

            if self.input.hook != 0 {
                if self.hook_state == HookState::Idle {
                    self.hook_state = HookState::Flying;
                    self.hook_pos = self.pos + target_dir * PHYS_SIZE * 1.5;
                    self.hook_dir = target_dir;
                    self.hooked_player = -1;
                    self.hook_tick = 0;
                    self.triggered_events.set(CoreEvents::HOOK_LAUNCH);
                }
            } else {
                self.release_hook(HookState::Idle);
            }
        }

        match self.direction.signum() {
            -1 => self.vel.x = saturated_add(-max_speed, max_speed, self.vel.x, -accel),
            1 => self.vel.x = saturated_add(-max_speed, max_speed, self.vel.x, accel),
            _ => self.vel.x *= friction,
        }

        if grounded {
            self.jumped &= !2;
        }

        self.tick_hook(world, map, tuning);
        self.tick_peers(world, tuning);

        if self.vel.length() > MAX_SPEED {
            self.vel = self.vel.normalize() * MAX_SPEED;
        }
    }

    fn release_hook(&mut self, state: HookState) {
        self.hooked_player = -1;
        self.hook_state = state;
        self.hook_pos = self.pos;
    }

    fn tick_hook(&mut self, world: &CoreWorld, map: &TileMap, tuning: &Tuning) {
        match self.hook_state {
            HookState::Idle => self.release_hook(HookState::Idle),
            HookState::RetractStart => self.hook_state = HookState::Retracting,
            HookState::Retracting => self.hook_state = HookState::RetractEnd,
            HookState::RetractEnd => {
                self.hook_state = HookState::Retracted;
                self.triggered_events.set(CoreEvents::HOOK_RETRACT);
            }
            HookState::Flying => self.fly_hook(world, map, tuning),
            HookState::Retracted | HookState::Grabbed => {}
        }

        if self.hook_state != HookState::Grabbed {
            return;
        }

        if self.hooked_player != -1 {
            match world.get(self.hooked_player as usize) {
                Some(peer) => self.hook_pos = peer.pos,
                None => {
                    self.release_hook(HookState::Retracted);
                    return;
                }
            }
        }

        // Ground hooks drag the owner; player hooks are handled with peer forces.
        if self.hooked_player == -1 && self.hook_pos.distance(self.pos) > 46.0 {
            let mut hook_vel = (self.hook_pos - self.pos).normalize_or_zero() * tuning.hook_drag_accel;
            if hook_vel.y > 0.0 {
                hook_vel.y *= 0.3;
            }
            if (hook_vel.x < 0.0 && self.direction < 0) || (hook_vel.x > 0.0 && self.direction > 0) {
                hook_vel.x *= 0.95;
            } else {
                hook_vel.x *= 0.75;
            }

            let new_vel = self.vel + hook_vel;
            if new_vel.length() < tuning.hook_drag_speed || new_vel.length() < self.vel.length() {
                self.vel = new_vel;
            }
        }

        self.hook_tick += 1;
        let timeout = DEFAULT_TICK_SPEED + DEFAULT_TICK_SPEED / 5;
        if self.hooked_player != -1 && self.hook_tick > timeout {
            self.release_hook(HookState::Retracted);
        }
    }

    fn fly_hook(&mut self, world: &CoreWorld, map: &TileMap, tuning: &Tuning) {
        let mut new_pos = self.hook_pos + self.hook_dir * tuning.hook_fire_speed;
        if self.pos.distance(new_pos) > tuning.hook_length {
            self.hook_state = HookState::RetractStart;
            new_pos = self.pos + (new_pos - self.pos).normalize_or_zero() * tuning.hook_length;
        }

        let mut going_to_hit_ground = false;
        let mut going_to_retract = false;
        if let Some(hit) = map.intersect_line(self.hook_pos, new_pos) {
            new_pos = hit.at;
            if hit.flags & COLFLAG_NOHOOK != 0 {
                going_to_retract = true;
            } else {
                going_to_hit_ground = true;
            }
        }

        if tuning.player_hooking {
            let mut best = f32::MAX;
            for (i, peer) in world.others(self.slot) {
                let closest = closest_point_on_line(self.hook_pos, new_pos, peer.pos);
                if peer.pos.distance(closest) < PHYS_SIZE + 2.0 {
                    let d = self.hook_pos.distance(peer.pos);
                    if self.hooked_player == -1 || d < best {
                        self.triggered_events.set(CoreEvents::HOOK_ATTACH_PLAYER);
                        self.hook_state = HookState::Grabbed;
                        self.hooked_player = i as i32;
                        best = d;
                    }
                }
            }
        }

        if self.hook_state == HookState::Flying {
            if going_to_hit_ground {
                self.triggered_events.set(CoreEvents::HOOK_ATTACH_GROUND);
                self.hook_state = HookState::Grabbed;
            } else if going_to_retract {
                self.triggered_events.set(CoreEvents::HOOK_HIT_NOHOOK);
                self.hook_state = HookState::RetractStart;
            }
            self.hook_pos = new_pos;
        }
    }

    fn tick_peers(&mut self, world: &CoreWorld, tuning: &Tuning) {
        for (i, peer) in world.others(self.slot) {
            let distance = self.pos.distance(peer.pos);
            let dir = (self.pos - peer.pos).normalize_or_zero();

            if tuning.player_collision && distance < PHYS_SIZE * 1.25 && distance > 0.0 {
                let a = PHYS_SIZE * 1.45 - distance;
                let mut velocity = 0.5;
                if self.vel.length() > 0.0001 {
                    velocity = 1.0 - (self.vel.normalize().dot(dir) + 1.0) / 2.0;
                }
                self.vel += dir * a * (velocity * 0.75);
                self.vel *= 0.85;
            }

            if self.hooked_player == i as i32 && tuning.player_hooking && distance > PHYS_SIZE * 1.5 {
                let accel = tuning.hook_drag_accel * (distance / tuning.hook_length);
                let drag = tuning.hook_drag_speed;
                self.vel.x = saturated_add(-drag, drag, self.vel.x, -accel * dir.x * 0.25);
                self.vel.y = saturated_add(-drag, drag, self.vel.y, -accel * dir.y * 0.25);
            }
        }
    }

    /// Move through the map with the current velocity, stopping short of peers
    pub fn apply_movement(&mut self, world: &CoreWorld, map: &TileMap, tuning: &Tuning) {
        let ramp = velocity_ramp(
            self.vel.length() * 50.0,
            tuning.velramp_start,
            tuning.velramp_range,
            tuning.velramp_curvature,
        );

        self.vel.x *= ramp;
        let mut new_pos = self.pos;
        map.move_box(&mut new_pos, &mut self.vel, Vec2::splat(PHYS_SIZE), 0.0);
        self.vel.x /= ramp;

        if tuning.player_collision {
            let distance = self.pos.distance(new_pos);
            if distance > 0.0 {
                let end = (distance + 1.0) as i32;
                let mut last = self.pos;
                for i in 0..end {
                    let a = i as f32 / distance;
                    let pos = self.pos.lerp(new_pos, a);
                    for (_, peer) in world.others(self.slot) {
                        let d = pos.distance(peer.pos);
                        if d < PHYS_SIZE && d > 0.0 {
                            if a > 0.0 {
                                self.pos = last;
                            } else if new_pos.distance(peer.pos) > d {
                                self.pos = new_pos;
                            }
                            return;
                        }
                    }
                    last = pos;
                }
            }
        }

        self.pos = new_pos;
    }

    /// Round-trip through the wire record so the server sees what clients see
    pub fn quantize(&mut self) {
        let record = self.write();
        self.read(&record);
    }

    /// Wire representation. `tick` is left zero for the caller to fill in.
    pub fn write(&self) -> NetCharacterCore {
        NetCharacterCore {
            tick: 0,
            x: round_to_int(self.pos.x),
            y: round_to_int(self.pos.y),
            vel_x: round_to_int(self.vel.x * 256.0),
            vel_y: round_to_int(self.vel.y * 256.0),
            angle: self.angle,
            direction: self.direction,
            jumped: self.jumped,
            hooked_player: self.hooked_player,
            hook_state: self.hook_state as i32,
            hook_tick: self.hook_tick,
            hook_x: round_to_int(self.hook_pos.x),
            hook_y: round_to_int(self.hook_pos.y),
            hook_dx: round_to_int(self.hook_dir.x * 256.0),
            hook_dy: round_to_int(self.hook_dir.y * 256.0),
        }
    }

    pub fn read(&mut self, record: &NetCharacterCore) {
        self.pos = Vec2::new(record.x as f32, record.y as f32);
        self.vel = Vec2::new(record.vel_x as f32 / 256.0, record.vel_y as f32 / 256.0);
        self.hook_state = HookState::from_wire(record.hook_state);
        self.hook_tick = record.hook_tick;
        self.hook_pos = Vec2::new(record.hook_x as f32, record.hook_y as f32);
        self.hook_dir = Vec2::new(record.hook_dx as f32 / 256.0, record.hook_dy as f32 / 256.0);
        self.hooked_player = record.hooked_player;
        self.jumped = record.jumped;
        self.direction = record.direction;
        self.angle = record.angle;
    }
}
