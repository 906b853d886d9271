//! Per-observer character records

use super::Character;
use crate::config::GameConfig;
use crate::game::player::PlayerTable;
use crate::game::snapshot::{Observer, SnapshotBuffer};
use crate::net::Emote;
use crate::util::time::Tick;

/// Period of the idle blink, in ticks
const BLINK_PERIOD: Tick = 250;
const BLINK_TICKS: Tick = 5;

/// Read-only world state a snap pass needs
#[derive(Clone, Copy)]
pub struct SnapContext<'a> {
    pub tick: Tick,
    pub paused: bool,
    pub config: &'a GameConfig,
    pub players: &'a PlayerTable,
}

impl Character {
    /// Outside the observer's network view. The global observer sees everything.
    pub fn network_clipped(&self, observer: Observer, players: &PlayerTable) -> bool {
        let Some(view) = observer
            .slot()
            .and_then(|slot| players.get(slot))
            .map(|p| p.view_pos)
        else {
            return false;
        };
        let d = self.pos - view;
        d.x.abs() > 1000.0 || d.y.abs() > 800.0 || d.length() > 1100.0
    }

    /// Write this character into `buf` unless it is clipped or the buffer is full
    pub fn snap(&mut self, ctx: &SnapContext<'_>, buf: &mut SnapshotBuffer) {
        let observer = buf.observer;
        if self.network_clipped(observer, ctx.players) {
            return;
        }

        if self.emote_stop < ctx.tick {
            self.emote = Emote::Normal;
            self.emote_stop = -1;
        }

        let Some(record) = buf.new_character(self.slot) else {
            return;
        };

        // Paused clients cannot know how far to extrapolate
        if self.reckoning_tick == 0 || ctx.paused {
            record.core = self.core.write();
            record.core.tick = 0;
        } else {
            record.core = self.send_core.write();
            record.core.tick = self.reckoning_tick;
        }

        record.emote = self.emote as i32;
        record.ammo_count = 0;
        record.health = 0;
        record.armor = 0;
        record.weapon = self.arsenal.active().id();
        record.attack_tick = self.attack_tick;
        record.core.direction = self.input.direction;

        let follows_me = |slot: usize| {
            !ctx.config.strict_spectate_mode
                && ctx
                    .players
                    .get(slot)
                    .is_some_and(|p| p.spectator_id == Some(self.slot))
        };
        let sees_vitals = match observer {
            Observer::Global => true,
            Observer::Client(slot) => slot == self.slot || follows_me(slot),
        };
        if sees_vitals {
            record.health = self.health;
            record.armor = self.armor;
            let ammo = self.arsenal.active_slot().ammo;
            if ammo > 0 {
                record.ammo_count = ammo;
            }
        }

        if self.emote == Emote::Normal
            && BLINK_PERIOD - (ctx.tick - self.last_action) % BLINK_PERIOD < BLINK_TICKS
        {
            record.emote = Emote::Blink as i32;
        }

        record.player_flags = ctx
            .players
            .get(self.slot)
            .map_or(0, |p| p.player_flags);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::game::player::Team;

    fn roster() -> PlayerTable {
        let mut players = PlayerTable::new();
        players.join("owner", Team::Red, 16);
        players.join("watcher", Team::Spectators, 16);
        players.join("far", Team::Red, 16);
        players.get_mut(2).unwrap().view_pos = Vec2::new(5000.0, 0.0);
        players
    }

    fn character() -> Character {
        let mut c = Character::new(0, Vec2::new(10.0, 10.0));
        c.health = 7;
        c.armor = 3;
        c.give_weapon(crate::game::weapons::WeaponKind::Gun, 4);
        c
    }

    fn snap_for(c: &mut Character, observer: Observer, config: &GameConfig, players: &PlayerTable) -> SnapshotBuffer {
        let ctx = SnapContext {
            tick: 100,
            paused: false,
            config,
            players,
        };
        let mut buf = SnapshotBuffer::new(100, observer);
        c.snap(&ctx, &mut buf);
        buf
    }

    #[test]
    fn vitals_only_for_self_global_and_followers() {
        let mut players = roster();
        let config = GameConfig::default();
        let mut c = character();

        let own = snap_for(&mut c, Observer::Client(0), &config, &players);
        let rec = own.character(0).unwrap();
        assert_eq!((rec.health, rec.armor, rec.ammo_count), (7, 3, 4));

        let other = snap_for(&mut c, Observer::Client(1), &config, &players);
        assert_eq!(other.character(0).unwrap().health, 0);

        players.get_mut(1).unwrap().spectator_id = Some(0);
        let following = snap_for(&mut c, Observer::Client(1), &config, &players);
        assert_eq!(following.character(0).unwrap().health, 7);

        let strict = GameConfig {
            strict_spectate_mode: true,
            ..config
        };
        let hidden = snap_for(&mut c, Observer::Client(1), &strict, &players);
        assert_eq!(hidden.character(0).unwrap().armor, 0);

        let global = snap_for(&mut c, Observer::Global, &strict, &players);
        assert_eq!(global.character(0).unwrap().armor, 3);
    }

    #[test]
    fn distant_observers_get_nothing() {
        let players = roster();
        let config = GameConfig::default();
        let mut c = character();
        let far = snap_for(&mut c, Observer::Client(2), &config, &players);
        assert!(far.is_empty());
    }

    #[test]
    fn reckoning_baseline_is_tagged_unless_paused() {
        let players = roster();
        let config = GameConfig::default();
        let mut c = character();
        c.reconcile(40, 50);
        c.core_mut().pos.x = 30.0;

        let mut ctx = SnapContext {
            tick: 42,
            paused: false,
            config: &config,
            players: &players,
        };
        let mut buf = SnapshotBuffer::new(42, Observer::Global);
        c.snap(&ctx, &mut buf);
        let rec = buf.character(0).unwrap();
        assert_eq!(rec.core.tick, 40);
        assert_eq!(rec.core.x, 10);

        ctx.paused = true;
        let mut paused = SnapshotBuffer::new(42, Observer::Global);
        c.snap(&ctx, &mut paused);
        let rec = paused.character(0).unwrap();
        assert_eq!(rec.core.tick, 0);
        assert_eq!(rec.core.x, 30);
    }

    #[test]
    fn emotes_expire_and_idle_characters_blink() {
        let players = roster();
        let config = GameConfig::default();
        let mut c = character();
        c.set_emote(Emote::Pain, 50);
        c.last_action = 0;

        let ctx = SnapContext {
            tick: 49,
            paused: false,
            config: &config,
            players: &players,
        };
        let mut buf = SnapshotBuffer::new(49, Observer::Global);
        c.snap(&ctx, &mut buf);
        assert_eq!(buf.character(0).unwrap().emote, Emote::Pain as i32);

        let ctx = SnapContext { tick: 247, ..ctx };
        let mut buf = SnapshotBuffer::new(247, Observer::Global);
        c.snap(&ctx, &mut buf);
        assert_eq!(buf.character(0).unwrap().emote, Emote::Blink as i32);
        assert_eq!(c.emote().0, Emote::Normal);
    }
}
