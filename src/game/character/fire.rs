//! Weapon switching and firing

use glam::Vec2;

use super::Character;
use crate::game::context::GameContext;
use crate::game::controller::MeleeVerdict;
use crate::game::core::PHYS_SIZE;
use crate::game::entities::{trace_laser, Projectile};
use crate::game::math::angle_of;
use crate::game::weapons::{ProjectileSpec, WeaponEffect, WeaponKind, WeaponSpec};
use crate::net::{NetProjectile, Recipient, ServerMsg, Sound};
use crate::util::time::{ms_to_ticks, secs_to_ticks, Tick};

/// Reload applied when the trigger is pulled on an empty weapon
const NO_AMMO_RELOAD_MS: i32 = 125;

/// Knock-back of a hammer blow, before the aim contribution
const HAMMER_KNOCKBACK: f32 = 10.0;

impl Character {
    pub(super) fn handle_weapon_switch(&mut self, ctx: &mut GameContext<'_>) {
        if let Some(wanted) = self
            .arsenal
            .resolve_wanted(&self.latest_prev_input, &self.latest_input)
        {
            self.arsenal.queue(wanted);
        }
        self.do_weapon_switch(ctx);
    }

    pub(super) fn do_weapon_switch(&mut self, ctx: &mut GameContext<'_>) {
        if self.arsenal.do_switch() {
            ctx.events.create_sound_global(self.pos, Sound::WeaponSwitch);
        }
    }

    /// Make `kind` active right away, with the switch cue
    pub fn set_weapon(&mut self, kind: WeaponKind, ctx: &mut GameContext<'_>) {
        if self.arsenal.set_weapon(kind) {
            ctx.events.create_sound_global(self.pos, Sound::WeaponSwitch);
        }
    }

    pub(super) fn fire_weapon(&mut self, ctx: &mut GameContext<'_>) {
        if self.arsenal.reload_timer != 0 {
            return;
        }

        self.do_weapon_switch(ctx);

        if !self
            .arsenal
            .wants_to_fire(&self.latest_prev_input, &self.latest_input)
        {
            return;
        }

        let ts = ctx.tick_speed();
        if !self.arsenal.has_ammo() {
            self.arsenal.reload_timer = ms_to_ticks(NO_AMMO_RELOAD_MS, ts);
            if self.last_no_ammo_sound + ts <= ctx.tick {
                ctx.events.create_sound_global(self.pos, Sound::WeaponNoAmmo);
                self.last_no_ammo_sound = ctx.tick;
            }
            return;
        }

        let dir = self.aim_dir();
        let proj_start = self.pos + dir * PHYS_SIZE * 0.75;

        match self.arsenal.active().effect() {
            WeaponEffect::Melee => self.fire_melee(proj_start, ctx),
            WeaponEffect::Projectile(spec) => self.fire_projectiles(&spec, proj_start, dir, ctx),
            WeaponEffect::Beam => self.fire_beam(dir, ctx),
            WeaponEffect::Inert => {}
        }

        self.attack_tick = ctx.tick;
        self.arsenal.consume(ts);
    }

    fn fire_melee(&mut self, proj_start: Vec2, ctx: &mut GameContext<'_>) {
        ctx.events.create_sound_global(self.pos, Sound::HammerFire);

        let mut hits = 0;
        let targets = ctx.characters.find_in_radius(proj_start, PHYS_SIZE * 0.5);
        for target in targets {
            let Some(target_pos) = ctx.characters.get(target).map(|c| c.pos()) else {
                continue;
            };
            if ctx.map.intersect_line(proj_start, target_pos).is_some() {
                continue;
            }

            let to_target = target_pos - proj_start;
            let hit_pos = if to_target.length() > 0.0 {
                target_pos - to_target.normalize() * PHYS_SIZE * 0.5
            } else {
                proj_start
            };
            ctx.events.create_hammer_hit(hit_pos);

            let away = target_pos - self.pos;
            let push = if away.length() > 0.0 {
                away.normalize()
            } else {
                Vec2::new(0.0, -1.0)
            };
            let force = Vec2::new(0.0, -1.0) + (push + Vec2::new(0.0, -1.1)).normalize_or_zero() * HAMMER_KNOCKBACK;

            let attacker = self.slot as i32;
            let damaged = ctx
                .with_character(target, |victim, ctx| {
                    victim.take_damage(force, 0, attacker, WeaponKind::Hammer.id(), ctx)
                })
                .unwrap_or(false);
            if damaged {
                self.set_emote(crate::net::Emote::Happy, ctx.tick + ctx.tick_speed());
            }

            let ts = ctx.tick_speed();
            match ctx
                .controller
                .on_melee_hit(self.slot, target, ctx.players, ts)
            {
                MeleeVerdict::Nothing => {}
                MeleeVerdict::GiveNinja => {
                    let tick = ctx.tick;
                    ctx.with_character(target, |victim, _| victim.give_ninja(tick));
                }
                MeleeVerdict::ClearStun => {
                    ctx.with_character(target, |victim, _| victim.end_ninja());
                }
            }

            hits += 1;
        }

        if hits > 0 {
            self.arsenal.reload_timer = ctx.tick_speed() / 3;
        }
    }

    fn fire_projectiles(
        &mut self,
        spec: &ProjectileSpec,
        proj_start: Vec2,
        dir: Vec2,
        ctx: &mut GameContext<'_>,
    ) {
        let weapon = self.arsenal.active();
        let ts = ctx.tick_speed();
        let tuning = ctx.tuning;
        let lifetime = match weapon {
            WeaponKind::Shotgun => tuning.shotgun_lifetime,
            WeaponKind::Grenade => tuning.grenade_lifetime,
            _ => tuning.gun_lifetime,
        };
        let damage = WeaponSpec::for_kind(weapon).damage;
        let impact_sound = spec.explosive.then_some(Sound::GrenadeExplode);

        // Pellets further from the centre fly slower
        let half = (spec.spreads.len() / 2) as f32;
        let mut sent = Vec::with_capacity(spec.spreads.len());
        for (i, &spread) in spec.spreads.iter().enumerate() {
            let velocity = if half > 0.0 {
                let v = 1.0 - (i as f32 - half).abs() / half;
                tuning.shotgun_speeddiff + (1.0 - tuning.shotgun_speeddiff) * v
            } else {
                1.0
            };
            let a = angle_of(dir) + spread;
            let projectile = Projectile {
                owner: self.slot,
                weapon,
                pos: proj_start,
                dir: Vec2::new(a.cos(), a.sin()) * velocity,
                start_tick: ctx.tick,
                lifespan: secs_to_ticks(lifetime, ts),
                damage,
                force: 0.0,
                explosive: spec.explosive,
                impact_sound,
            };
            sent.push(projectile.fill_info());
            ctx.entities.spawn_projectile(projectile);
        }

        ctx.events.send(
            Recipient::One(self.slot),
            false,
            ServerMsg::ExtraProjectile {
                payload: NetProjectile::pack_batch(&sent),
            },
        );
        ctx.events.create_sound_global(self.pos, spec.fire_sound);
    }

    fn fire_beam(&mut self, dir: Vec2, ctx: &mut GameContext<'_>) {
        let origin = self.pos;
        let me = self.slot;
        let characters = &*ctx.characters;
        let trace = trace_laser(origin, dir, ctx.tuning.laser_reach, ctx.tuning, ctx.map, |from, to| {
            characters.intersect_character(from, to, 0.0, Some(me))
        });

        ctx.events.create_sound_global(self.pos, Sound::RifleFire);
        for bounce in &trace.bounces {
            ctx.events.create_sound_global(*bounce, Sound::RifleBounce);
        }

        if let Some(target) = trace.hit {
            let damage = ctx.tuning.laser_damage;
            let attacker = me as i32;
            let hurt = ctx
                .with_character(target, |victim, ctx| {
                    victim.take_damage(Vec2::ZERO, damage, attacker, WeaponKind::Rifle.id(), ctx)
                })
                .unwrap_or(false);
            if hurt {
                self.set_emote(crate::net::Emote::Happy, ctx.tick + ctx.tick_speed());
            }
        }
    }

    /// Reload countdown, fire and ammo regeneration for this tick
    pub(super) fn handle_weapons(&mut self, ctx: &mut GameContext<'_>) {
        // Ninja is a pure state in this mode: no dash, no slash.

        if self.arsenal.reload_timer > 0 {
            self.arsenal.reload_timer -= 1;
            return;
        }

        self.fire_weapon(ctx);
        self.arsenal.regen(ctx.tick, ctx.tick_speed());
    }

    /// Grant a weapon or top it up; fails if it is owned and already full
    pub fn give_weapon(&mut self, kind: WeaponKind, ammo: i32) -> bool {
        self.arsenal.give(kind, ammo)
    }

    pub fn give_ninja(&mut self, tick: Tick) {
        self.ninja_activation_tick = tick;
        self.arsenal.give_ninja();
    }

    pub fn end_ninja(&mut self) {
        self.arsenal.end_ninja();
    }

    pub fn ninja_activation_tick(&self) -> Tick {
        self.ninja_activation_tick
    }
}
