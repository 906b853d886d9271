//! Weapon tables and the per-character arsenal
//!
//! Firing is split into three stages that the character drives in order:
//! resolving which weapon the player wants ([`Arsenal::resolve_wanted`]),
//! the reload and ammo gate ([`Arsenal::wants_to_fire`], [`Arsenal::consume`]),
//! and the kind-specific effect described by [`WeaponEffect`].

use serde::{Deserialize, Serialize};

use super::input::{count_input, PlayerInput};
use crate::net::Sound;
use crate::util::time::{ms_to_ticks, Tick};

pub const NUM_WEAPONS: usize = 6;

/// Killed by the map (death tiles, leaving the game layer)
pub const WEAPON_WORLD: i32 = -1;
/// Killed by their own hand (suicide)
pub const WEAPON_SELF: i32 = -2;
/// Killed by the game mode
pub const WEAPON_GAME: i32 = -3;

/// Most ammo regeneration can ever restore
const REGEN_AMMO_CAP: i32 = 10;

/// Press counts at or above this are treated as garbage input
const SANE_PRESS_LIMIT: i32 = 128;

/// Weapon slots in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum WeaponKind {
    Hammer = 0,
    Gun = 1,
    Shotgun = 2,
    Grenade = 3,
    Rifle = 4,
    Ninja = 5,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; NUM_WEAPONS] = [
        WeaponKind::Hammer,
        WeaponKind::Gun,
        WeaponKind::Shotgun,
        WeaponKind::Grenade,
        WeaponKind::Rifle,
        WeaponKind::Ninja,
    ];

    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Wire id, also used as the kill message weapon
    pub fn id(self) -> i32 {
        self as i32
    }

    /// Keeps firing while the button is held
    pub fn is_full_auto(self) -> bool {
        matches!(self, Self::Grenade | Self::Shotgun | Self::Rifle)
    }

    pub fn effect(self) -> WeaponEffect {
        match self {
            Self::Hammer => WeaponEffect::Melee,
            Self::Gun => WeaponEffect::Projectile(ProjectileSpec {
                spreads: &[0.0],
                explosive: false,
                fire_sound: Sound::GunFire,
            }),
            Self::Shotgun => WeaponEffect::Projectile(ProjectileSpec {
                spreads: &SHOTGUN_SPREADS,
                explosive: false,
                fire_sound: Sound::ShotgunFire,
            }),
            Self::Grenade => WeaponEffect::Projectile(ProjectileSpec {
                spreads: &[0.0],
                explosive: true,
                fire_sound: Sound::GrenadeFire,
            }),
            Self::Rifle => WeaponEffect::Beam,
            Self::Ninja => WeaponEffect::Inert,
        }
    }
}

/// Angle offsets (radians) of the five shotgun pellets
pub const SHOTGUN_SPREADS: [f32; 5] = [-0.185, -0.070, 0.0, 0.070, 0.185];

/// What a projectile weapon spawns
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileSpec {
    /// One projectile per entry, rotated by the entry's angle
    pub spreads: &'static [f32],
    pub explosive: bool,
    pub fire_sound: Sound,
}

/// Kind-specific part of firing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeaponEffect {
    /// Hit everyone in reach with knock-back
    Melee,
    Projectile(ProjectileSpec),
    /// Instant bouncing laser
    Beam,
    /// Held as a state, nothing happens on fire
    Inert,
}

/// Static weapon data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaponSpec {
    pub fire_delay_ms: i32,
    pub max_ammo: i32,
    /// Zero disables regeneration
    pub ammo_regen_ms: i32,
    pub damage: i32,
}

impl WeaponSpec {
    pub fn for_kind(kind: WeaponKind) -> Self {
        match kind {
            WeaponKind::Hammer => Self {
                fire_delay_ms: 125,
                max_ammo: 10,
                ammo_regen_ms: 0,
                damage: 3,
            },
            WeaponKind::Gun => Self {
                fire_delay_ms: 125,
                max_ammo: 10,
                ammo_regen_ms: 500,
                damage: 1,
            },
            WeaponKind::Shotgun => Self {
                fire_delay_ms: 500,
                max_ammo: 10,
                ammo_regen_ms: 0,
                damage: 1,
            },
            WeaponKind::Grenade => Self {
                fire_delay_ms: 500,
                max_ammo: 10,
                ammo_regen_ms: 0,
                damage: 6,
            },
            WeaponKind::Rifle => Self {
                fire_delay_ms: 800,
                max_ammo: 10,
                ammo_regen_ms: 0,
                damage: 5,
            },
            WeaponKind::Ninja => Self {
                fire_delay_ms: 800,
                max_ammo: 10,
                ammo_regen_ms: 0,
                damage: 9,
            },
        }
    }
}

/// Ownership and ammo of one weapon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaponSlot {
    pub got: bool,
    /// -1 is unlimited
    pub ammo: i32,
    /// -1 while not regenerating
    pub ammo_regen_start: Tick,
}

impl Default for WeaponSlot {
    fn default() -> Self {
        Self {
            got: false,
            ammo: 0,
            ammo_regen_start: -1,
        }
    }
}

/// Weapons held by one character plus the switch and reload state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arsenal {
    slots: [WeaponSlot; NUM_WEAPONS],
    active: WeaponKind,
    last: WeaponKind,
    queued: Option<WeaponKind>,
    /// Ticks until the next shot is allowed
    pub reload_timer: i32,
}

impl Default for Arsenal {
    fn default() -> Self {
        Self {
            slots: [WeaponSlot::default(); NUM_WEAPONS],
            active: WeaponKind::Gun,
            last: WeaponKind::Hammer,
            queued: None,
            reload_timer: 0,
        }
    }
}

impl Arsenal {
    pub fn active(&self) -> WeaponKind {
        self.active
    }

    pub fn last(&self) -> WeaponKind {
        self.last
    }

    pub fn queued(&self) -> Option<WeaponKind> {
        self.queued
    }

    pub fn slot(&self, kind: WeaponKind) -> &WeaponSlot {
        &self.slots[kind.index()]
    }

    pub fn owns(&self, kind: WeaponKind) -> bool {
        self.slot(kind).got
    }

    pub fn active_slot(&self) -> &WeaponSlot {
        self.slot(self.active)
    }

    fn active_slot_mut(&mut self) -> &mut WeaponSlot {
        &mut self.slots[self.active.index()]
    }

    /// Grant a weapon or top it up. Fails when it is already owned and full.
    pub fn give(&mut self, kind: WeaponKind, ammo: i32) -> bool {
        let max = WeaponSpec::for_kind(kind).max_ammo;
        let slot = &mut self.slots[kind.index()];
        if slot.ammo < max || !slot.got {
            slot.got = true;
            slot.ammo = ammo.clamp(-1, max);
            return true;
        }
        false
    }

    /// Make `kind` active. Returns whether anything changed (the caller plays
    /// the switch cue).
    pub fn set_weapon(&mut self, kind: WeaponKind) -> bool {
        if kind == self.active {
            return false;
        }
        self.active_slot_mut().ammo_regen_start = -1;
        self.last = self.active;
        self.queued = None;
        self.active = kind;
        true
    }

    /// Work out the weapon the latest input asks for, if it should be queued
    pub fn resolve_wanted(&self, prev: &PlayerInput, latest: &PlayerInput) -> Option<WeaponKind> {
        let mut wanted = self.queued.unwrap_or(self.active).index() as i32;
        let any_owned = self.slots.iter().any(|s| s.got);

        let next = count_input(prev.next_weapon, latest.next_weapon).presses;
        let prev_presses = count_input(prev.prev_weapon, latest.prev_weapon).presses;

        if any_owned && next < SANE_PRESS_LIMIT {
            let mut left = next;
            while left > 0 {
                wanted = (wanted + 1) % NUM_WEAPONS as i32;
                if self.slots[wanted as usize].got {
                    left -= 1;
                }
            }
        }

        if any_owned && prev_presses < SANE_PRESS_LIMIT {
            let mut left = prev_presses;
            while left > 0 {
                wanted = (wanted - 1).rem_euclid(NUM_WEAPONS as i32);
                if self.slots[wanted as usize].got {
                    left -= 1;
                }
            }
        }

        if latest.wanted_weapon != 0 {
            // i32::MIN has no predecessor; -1 is out of range either way
            wanted = latest.wanted_weapon.checked_sub(1).unwrap_or(-1);
        }

        WeaponKind::from_index(wanted).filter(|&w| w != self.active && self.owns(w))
    }

    pub fn queue(&mut self, kind: WeaponKind) {
        self.queued = Some(kind);
    }

    /// Apply a queued switch if allowed. Ninja blocks switching until it ends.
    pub fn do_switch(&mut self) -> bool {
        if self.reload_timer != 0 || self.owns(WeaponKind::Ninja) {
            return false;
        }
        match self.queued {
            Some(kind) => self.set_weapon(kind),
            None => false,
        }
    }

    /// Whether this input pair pulls the trigger
    pub fn wants_to_fire(&self, prev: &PlayerInput, latest: &PlayerInput) -> bool {
        if count_input(prev.fire, latest.fire).presses > 0 {
            return true;
        }
        self.active.is_full_auto() && latest.fire_held() && self.active_slot().ammo != 0
    }

    pub fn has_ammo(&self) -> bool {
        self.active_slot().ammo != 0
    }

    /// Book a shot: spend ammo and start the fire delay unless something
    /// already set a reload
    pub fn consume(&mut self, tick_speed: i32) {
        let slot = self.active_slot_mut();
        if slot.ammo > 0 {
            slot.ammo -= 1;
        }
        if self.reload_timer == 0 {
            let delay = WeaponSpec::for_kind(self.active).fire_delay_ms;
            self.reload_timer = ms_to_ticks(delay, tick_speed);
        }
    }

    /// Regenerate ammo on the active weapon
    pub fn regen(&mut self, tick: Tick, tick_speed: i32) {
        let spec = WeaponSpec::for_kind(self.active);
        if spec.ammo_regen_ms == 0 {
            return;
        }

        let reloading = self.reload_timer > 0;
        let slot = self.active_slot_mut();
        if reloading || slot.ammo < 0 {
            slot.ammo_regen_start = -1;
            return;
        }

        if slot.ammo_regen_start < 0 {
            slot.ammo_regen_start = tick;
        }

        if tick - slot.ammo_regen_start >= ms_to_ticks(spec.ammo_regen_ms, tick_speed) {
            slot.ammo = (slot.ammo + 1).min(REGEN_AMMO_CAP).min(spec.max_ammo);
            slot.ammo_regen_start = -1;
        }
    }

    /// Switch into ninja, remembering the weapon to go back to
    pub fn give_ninja(&mut self) {
        let slot = &mut self.slots[WeaponKind::Ninja.index()];
        slot.got = true;
        slot.ammo = -1;
        if self.active != WeaponKind::Ninja {
            self.active_slot_mut().ammo_regen_start = -1;
            self.last = self.active;
        }
        self.active = WeaponKind::Ninja;
    }

    /// Drop ninja and go back to the weapon held before it
    pub fn end_ninja(&mut self) {
        self.slots[WeaponKind::Ninja.index()].got = false;
        if self.active == WeaponKind::Ninja {
            self.active = self.last;
        }
    }

    /// Shift the regen timer along with a paused world
    pub fn tick_paused(&mut self) {
        let slot = self.active_slot_mut();
        if slot.ammo_regen_start > -1 {
            slot.ammo_regen_start += 1;
        }
    }
}
