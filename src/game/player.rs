//! Per-slot player records and roster queries

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::input::PlayerInput;
use super::MAX_CLIENTS;
use crate::util::time::Tick;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Red,
    Blue,
    Spectators,
}

/// A connected player. Outlives any character spawned for it.
#[derive(Debug, Clone)]
pub struct Player {
    pub slot: usize,
    pub name: String,
    pub team: Team,
    /// Team the player asked for; spectators by choice do not count as active
    pub preferred_team: Team,
    /// Centre of the player's network view
    pub view_pos: Vec2,
    /// Who a spectator is following
    pub spectator_id: Option<usize>,
    pub player_flags: i32,
    pub respawn_tick: Tick,
    pub die_tick: Tick,
    /// Positive while stunned, counts down towards the floor otherwise
    pub stun_tick: i32,
    /// Set when the team balancer moved the player
    pub force_balanced: bool,
    /// Last predicted input received
    pub input: PlayerInput,
}

impl Player {
    pub fn new(slot: usize, name: impl Into<String>, team: Team) -> Self {
        Self {
            slot,
            name: name.into(),
            team,
            preferred_team: team,
            view_pos: Vec2::ZERO,
            spectator_id: None,
            player_flags: 0,
            respawn_tick: 0,
            die_tick: 0,
            stun_tick: 0,
            force_balanced: false,
            input: PlayerInput::default(),
        }
    }

    pub fn is_spectator(&self) -> bool {
        self.team == Team::Spectators
    }
}

/// Fixed table of player slots
#[derive(Debug, Clone, Default)]
pub struct PlayerTable {
    slots: [Option<Player>; MAX_CLIENTS],
}

impl PlayerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a player into the first free slot at or below `limit`
    pub fn join(&mut self, name: impl Into<String>, team: Team, limit: usize) -> Option<usize> {
        let limit = limit.min(MAX_CLIENTS);
        let slot = self.slots[..limit].iter().position(Option::is_none)?;
        self.slots[slot] = Some(Player::new(slot, name, team));
        Some(slot)
    }

    pub fn leave(&mut self, slot: usize) -> Option<Player> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    pub fn get(&self, slot: usize) -> Option<&Player> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Player> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Look up a slot given as a signed id (negative ids are never players)
    pub fn by_id(&self, id: i32) -> Option<&Player> {
        usize::try_from(id).ok().and_then(|slot| self.get(slot))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.slots.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.slots.iter_mut().flatten()
    }

    pub fn name(&self, id: i32) -> &str {
        self.by_id(id).map(|p| p.name.as_str()).unwrap_or("(invalid)")
    }

    /// Players currently on a playing team
    pub fn live_count(&self) -> usize {
        self.iter().filter(|p| !p.is_spectator()).count()
    }

    /// Players who want to play, whatever team they are on right now
    pub fn active_count(&self) -> usize {
        self.iter()
            .filter(|p| p.preferred_team != Team::Spectators)
            .count()
    }

    pub fn team_of(&self, id: i32) -> Option<Team> {
        self.by_id(id).map(|p| p.team)
    }
}
