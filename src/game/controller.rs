//! Game mode controllers
//!
//! The controller owns mode rules the character consults but does not own:
//! kill classification, friendly fire, and the bomb with its fuse.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use super::character::Character;
use super::player::{PlayerTable, Team};
use super::weapons::WeaponKind;
use super::MAX_CLIENTS;
use crate::config::GameConfig;
use crate::util::time::ms_to_ticks;

/// What the character should do to the target of a melee hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeleeVerdict {
    Nothing,
    /// Stunned: switch the target to ninja
    GiveNinja,
    /// Stun cancelled: drop the target's ninja
    ClearStun,
}

/// Work the controller hands back to the world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerAction {
    /// Blow up the character in this slot
    Detonate(usize),
}

pub trait Controller: Send {
    fn name(&self) -> &'static str;

    /// Equip a freshly spawned character
    fn on_character_spawn(&mut self, character: &mut Character) {
        character.increase_health(10);
        character.give_weapon(WeaponKind::Hammer, -1);
        character.give_weapon(WeaponKind::Gun, 10);
    }

    /// Returns the mode-specific kill classifier
    fn on_character_death(&mut self, victim: usize, killer: i32, weapon: i32) -> i32;

    fn is_teamplay(&self) -> bool;

    /// Same playing team in a team mode. Hurting yourself is never friendly fire.
    fn is_friendly_fire(&self, players: &PlayerTable, victim: usize, from: i32) -> bool {
        if !self.is_teamplay() || from == victim as i32 {
            return false;
        }
        match (players.team_of(victim as i32), players.team_of(from)) {
            (Some(a), Some(b)) => a == b && a != Team::Spectators,
            _ => false,
        }
    }

    fn team_name(&self, team: Team) -> &'static str {
        match team {
            Team::Spectators => "spectators",
            _ if !self.is_teamplay() => "game",
            Team::Red => "red team",
            Team::Blue => "blue team",
        }
    }

    fn on_melee_hit(
        &mut self,
        attacker: usize,
        target: usize,
        players: &mut PlayerTable,
        tick_speed: i32,
    ) -> MeleeVerdict;

    /// Remaining fuse of a slot in ticks
    fn fuse(&self, slot: usize) -> i32;

    fn is_bomb(&self, slot: usize) -> bool;

    /// Per-tick mode update. `alive` lists slots with a living character.
    fn tick(&mut self, players: &PlayerTable, alive: &[usize]) -> Option<ControllerAction>;
}

/// Hot potato: one player carries a bomb and has to hammer someone else
/// before the fuse runs out
pub struct BombController {
    bomb: Option<usize>,
    fuses: [i32; MAX_CLIENTS],
    full_fuse: i32,
    stun_time_ms: i32,
    teamplay: bool,
    rng: ChaCha8Rng,
}

impl BombController {
    pub fn new(config: &GameConfig, seed: u64) -> Self {
        Self {
            bomb: None,
            fuses: [0; MAX_CLIENTS],
            full_fuse: config.bomb_fuse_ticks(),
            stun_time_ms: config.stun_time_ms,
            teamplay: config.teamplay,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn bomb(&self) -> Option<usize> {
        self.bomb
    }

    /// Hand the bomb to a slot with a full fuse
    pub fn set_bomb(&mut self, slot: usize) {
        if slot < MAX_CLIENTS {
            self.bomb = Some(slot);
            self.fuses[slot] = self.full_fuse;
        }
    }

    fn pass_bomb(&mut self, to: usize, from: usize) {
        self.fuses[to] = self.fuses[from];
        self.fuses[from] = 0;
        self.bomb = Some(to);
        debug!(target: "game", from, to, fuse = self.fuses[to], "bomb passed");
    }

    /// Knock `ticks` off a slot's fuse
    pub fn damage_fuse(&mut self, ticks: i32, slot: usize) {
        if let Some(fuse) = self.fuses.get_mut(slot) {
            *fuse -= ticks;
        }
    }
}

impl Controller for BombController {
    fn name(&self) -> &'static str {
        "bomb"
    }

    fn on_character_death(&mut self, victim: usize, _killer: i32, _weapon: i32) -> i32 {
        if self.bomb == Some(victim) {
            self.bomb = None;
            return 1;
        }
        0
    }

    fn is_teamplay(&self) -> bool {
        self.teamplay
    }

    fn on_melee_hit(
        &mut self,
        attacker: usize,
        target: usize,
        players: &mut PlayerTable,
        tick_speed: i32,
    ) -> MeleeVerdict {
        if self.bomb.is_none() {
            return MeleeVerdict::Nothing;
        }

        let stun_floor = -ms_to_ticks(100, tick_speed);
        let Some(victim) = players.get_mut(target) else {
            return MeleeVerdict::Nothing;
        };

        match (self.is_bomb(attacker), self.is_bomb(target)) {
            (true, false) => {
                self.pass_bomb(target, attacker);
                if victim.stun_tick >= stun_floor {
                    victim.stun_tick = -100;
                    return MeleeVerdict::ClearStun;
                }
                MeleeVerdict::Nothing
            }
            (false, false) => {
                if victim.stun_tick <= stun_floor {
                    victim.stun_tick = ms_to_ticks(self.stun_time_ms, tick_speed);
                    return MeleeVerdict::GiveNinja;
                }
                MeleeVerdict::Nothing
            }
            (false, true) => {
                self.damage_fuse(tick_speed, target);
                MeleeVerdict::Nothing
            }
            (true, true) => MeleeVerdict::Nothing,
        }
    }

    fn fuse(&self, slot: usize) -> i32 {
        self.fuses.get(slot).copied().unwrap_or(0)
    }

    fn is_bomb(&self, slot: usize) -> bool {
        self.bomb == Some(slot)
    }

    fn tick(&mut self, players: &PlayerTable, alive: &[usize]) -> Option<ControllerAction> {
        if players.active_count() < 2 {
            self.bomb = None;
            return None;
        }

        if let Some(bomb) = self.bomb {
            if !alive.contains(&bomb) {
                self.bomb = None;
            }
        }

        let bomb = match self.bomb {
            Some(bomb) => bomb,
            None => {
                let &slot = alive.choose(&mut self.rng)?;
                self.set_bomb(slot);
                info!(slot, name = players.name(slot as i32), "new bomb");
                slot
            }
        };

        self.fuses[bomb] -= 1;
        if self.fuses[bomb] <= 0 {
            self.fuses[bomb] = 0;
            return Some(ControllerAction::Detonate(bomb));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (BombController, PlayerTable) {
        let config = GameConfig {
            bomb_fuse_secs: 1,
            ..GameConfig::default()
        };
        let mut players = PlayerTable::new();
        players.join("a", Team::Red, 16);
        players.join("b", Team::Red, 16);
        players.join("c", Team::Red, 16);
        (BombController::new(&config, 7), players)
    }

    #[test]
    fn no_bomb_without_two_players() {
        let (mut ctrl, mut players) = setup();
        players.leave(1);
        players.leave(2);
        assert_eq!(ctrl.tick(&players, &[0]), None);
        assert_eq!(ctrl.bomb(), None);
    }

    #[test]
    fn fuse_runs_out_and_detonates() {
        let (mut ctrl, players) = setup();
        ctrl.set_bomb(1);
        for _ in 0..49 {
            assert_eq!(ctrl.tick(&players, &[0, 1, 2]), None);
        }
        assert_eq!(ctrl.fuse(1), 1);
        assert_eq!(
            ctrl.tick(&players, &[0, 1, 2]),
            Some(ControllerAction::Detonate(1))
        );
        assert_eq!(ctrl.on_character_death(1, 1, -3), 1);
        assert_eq!(ctrl.bomb(), None);
    }

    #[test]
    fn hammering_passes_bomb_and_stuns() {
        let (mut ctrl, mut players) = setup();
        ctrl.set_bomb(0);
        ctrl.damage_fuse(10, 0);

        players.get_mut(1).unwrap().stun_tick = 0;
        let verdict = ctrl.on_melee_hit(0, 1, &mut players, 50);
        assert_eq!(verdict, MeleeVerdict::ClearStun);
        assert!(ctrl.is_bomb(1));
        assert_eq!(ctrl.fuse(1), 40);
        assert_eq!(players.get(1).unwrap().stun_tick, -100);

        players.get_mut(2).unwrap().stun_tick = -5;
        assert_eq!(ctrl.on_melee_hit(0, 2, &mut players, 50), MeleeVerdict::GiveNinja);
        assert_eq!(players.get(2).unwrap().stun_tick, 50);
        // Already stunned targets are left alone.
        assert_eq!(ctrl.on_melee_hit(0, 2, &mut players, 50), MeleeVerdict::Nothing);

        ctrl.on_melee_hit(0, 1, &mut players, 50);
        assert_eq!(ctrl.fuse(1), -10);
    }

    #[test]
    fn friendly_fire_only_in_team_modes() {
        let (ctrl, players) = setup();
        assert!(!ctrl.is_friendly_fire(&players, 0, 1));

        let mut team = BombController::new(
            &GameConfig {
                teamplay: true,
                ..GameConfig::default()
            },
            1,
        );
        assert!(team.is_friendly_fire(&players, 0, 1));
        assert!(!team.is_friendly_fire(&players, 0, 0));
        assert!(!team.is_friendly_fire(&players, 0, -1));
        assert_eq!(team.team_name(Team::Blue), "blue team");
        team.teamplay = false;
        assert_eq!(team.team_name(Team::Blue), "game");
    }
}
