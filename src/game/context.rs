//! Mutable view of the world handed to a character while it ticks

use super::arena::{CharacterArena, CoreTable};
use super::character::Character;
use super::collision::TileMap;
use super::controller::Controller;
use super::core::CoreWorld;
use super::entities::Entities;
use super::events::EventQueue;
use super::player::PlayerTable;
use super::tuning::Tuning;
use crate::config::GameConfig;
use crate::net::Emote;
use crate::util::time::Tick;

/// Everything except the acting character. The acting character is lifted
/// out of `characters` for the duration of its call, so nothing here aliases it.
pub struct GameContext<'a> {
    pub tick: Tick,
    pub paused: bool,
    pub config: &'a GameConfig,
    pub tuning: &'a Tuning,
    pub map: &'a TileMap,
    pub players: &'a mut PlayerTable,
    pub characters: &'a mut CharacterArena,
    pub cores: &'a mut CoreTable,
    pub controller: &'a mut dyn Controller,
    pub events: &'a mut EventQueue,
    pub entities: &'a mut Entities,
}

impl<'a> GameContext<'a> {
    pub fn tick_speed(&self) -> i32 {
        self.config.tick_speed
    }

    /// Players on a playing team
    pub fn live_players(&self) -> usize {
        self.players.live_count()
    }

    /// Players who want to play
    pub fn active_players(&self) -> usize {
        self.players.active_count()
    }

    /// Fresh peer view built from the core table
    pub fn core_world(&self) -> CoreWorld {
        self.cores.world(self.characters)
    }

    /// Run `f` on another character with the rest of the world available.
    /// Returns `None` if the slot is empty or already lifted out.
    pub fn with_character<R>(
        &mut self,
        slot: usize,
        f: impl FnOnce(&mut Character, &mut GameContext<'_>) -> R,
    ) -> Option<R> {
        let mut character = self.characters.take(slot)?;
        let result = f(&mut *character, self);
        self.characters.restore(slot, character);
        Some(result)
    }

    /// Give a successful attacker a happy face for a second
    pub fn taunt(&mut self, slot: i32) {
        let until = self.tick + self.tick_speed();
        if let Some(c) = usize::try_from(slot)
            .ok()
            .and_then(|s| self.characters.get_mut(s))
        {
            c.set_emote(Emote::Happy, until);
        }
    }
}
