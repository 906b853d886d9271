//! Knock-back, damage feedback and death

use glam::Vec2;
use tracing::debug;

use super::Character;
use crate::game::context::GameContext;
use crate::game::entities::Projectile;
use crate::game::weapons::WeaponKind;
use crate::net::{cmask_one, Emote, KillMsg, Recipient, ServerMsg, Sound};
use crate::util::time::ms_to_ticks;

/// Hits closer together than this fan their indicators out
const DAMAGE_GROUP_TICKS: i32 = 25;

const PAIN_EMOTE_MS: i32 = 500;

/// Damage after the self-hit rule: hurting yourself does half, at least 1
pub fn effective_damage(dmg: i32, from: i32, victim: usize) -> i32 {
    if from == victim as i32 {
        (dmg / 2).max(1)
    } else {
        dmg
    }
}

impl Character {
    /// Apply a hit. Knock-back always lands; everything else is skipped for
    /// friendly fire with team damage off, in which case this returns false.
    /// Health and armor are status displays in this mode and are left alone.
    pub fn take_damage(
        &mut self,
        force: Vec2,
        dmg: i32,
        from: i32,
        weapon: i32,
        ctx: &mut GameContext<'_>,
    ) -> bool {
        self.core.vel += force;

        if ctx.controller.is_friendly_fire(ctx.players, self.slot, from) && !ctx.config.team_damage {
            return false;
        }

        let dmg = effective_damage(dmg, from, self.slot);

        self.damage_taken += 1;
        if ctx.tick < self.damage_taken_tick + DAMAGE_GROUP_TICKS {
            ctx.events
                .create_damage_ind(self.pos, self.damage_taken as f32 * 0.25, dmg);
        } else {
            self.damage_taken = 0;
            ctx.events.create_damage_ind(self.pos, 0.0, dmg);
        }
        self.damage_taken_tick = ctx.tick;

        let attacker = ctx
            .players
            .by_id(from)
            .filter(|p| p.slot != self.slot)
            .map(|p| (p.slot, p.view_pos));
        if let Some((attacker, view_pos)) = attacker {
            let mut mask = cmask_one(attacker);
            for p in ctx.players.iter() {
                if p.is_spectator() && p.spectator_id == Some(attacker) {
                    mask |= cmask_one(p.slot);
                }
            }
            ctx.events.create_sound(view_pos, Sound::Hit, mask);
            ctx.taunt(from);
        }

        let pain = if dmg > 2 {
            Sound::PlayerPainLong
        } else {
            Sound::PlayerPainShort
        };
        ctx.events.create_sound_global(self.pos, pain);

        self.emote = Emote::Pain;
        self.emote_stop = ctx.tick + ms_to_ticks(PAIN_EMOTE_MS, ctx.tick_speed());

        debug!(target: "game", slot = self.slot, from, weapon, dmg, "damage");
        true
    }

    /// Kill the character. Calling it again on a dead character does nothing.
    pub fn die(&mut self, killer: i32, weapon: i32, ctx: &mut GameContext<'_>) {
        if !self.alive {
            return;
        }

        let tick = ctx.tick;
        let ts = ctx.tick_speed();
        if let Some(player) = ctx.players.get_mut(self.slot) {
            player.respawn_tick = tick + ts / 2;
        }

        let special = ctx.controller.on_character_death(self.slot, killer, weapon);

        debug!(
            target: "game",
            "kill killer='{}:{}' victim='{}:{}' weapon={} special={}",
            killer,
            ctx.players.name(killer),
            self.slot,
            ctx.players.name(self.slot as i32),
            weapon,
            special
        );

        ctx.events.send(
            Recipient::All,
            true,
            ServerMsg::KillMsg(KillMsg {
                killer,
                victim: self.slot as i32,
                weapon,
                mode_special: special,
            }),
        );
        ctx.events.create_sound_global(self.pos, Sound::PlayerDie);

        if let Some(player) = ctx.players.get_mut(self.slot) {
            player.die_tick = tick;
        }

        self.alive = false;
        ctx.cores.clear(self.slot);
        ctx.events.create_death(self.pos, self.slot);
    }

    /// Ring of short-fused grenades around an exploding bomb
    pub fn make_death_grenades(&self, ctx: &mut GameContext<'_>) {
        let ts = ctx.tick_speed() as f32;
        let fuses = [
            (Vec2::ZERO, (ts * 0.02) as i32),
            (Vec2::new(5.0, 5.0), (ts * 0.1) as i32),
            (Vec2::new(5.0, -5.0), (ts * 0.1) as i32),
            (Vec2::new(-5.0, 5.0), (ts * 0.1) as i32),
            (Vec2::new(-5.0, -5.0), (ts * 0.1) as i32),
        ];
        for (dir, lifespan) in fuses {
            ctx.entities.spawn_projectile(Projectile {
                owner: self.slot,
                weapon: WeaponKind::Grenade,
                pos: self.pos,
                dir: dir.normalize_or_zero(),
                start_tick: ctx.tick,
                lifespan,
                damage: 0,
                force: 0.0,
                explosive: true,
                impact_sound: Some(Sound::GrenadeExplode),
            });
        }
    }
}
