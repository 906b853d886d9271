//! Second tick phase: movement, movement cues and dead-reckoning resync

use glam::Vec2;
use tracing::debug;

use super::Character;
use crate::game::context::GameContext;
use crate::game::core::{CoreEvents, CoreWorld, PHYS_SIZE};
use crate::net::{cmask_all, cmask_all_except_one, Sound};
use crate::util::time::Tick;

/// Longest stretch observers may extrapolate without a fresh baseline
const MAX_RECKONING_SECS: i32 = 3;

impl Character {
    /// Runs after every character finished [`Character::tick`]
    pub fn tick_deferred(&mut self, ctx: &mut GameContext<'_>) {
        // What an observer without knowledge of the other characters predicts
        {
            let scratch = CoreWorld::default();
            self.reckoning_core.tick(false, &scratch, ctx.map, ctx.tuning);
            self.reckoning_core.apply_movement(&scratch, ctx.map, ctx.tuning);
            self.reckoning_core.quantize();
        }

        let start_pos = self.core.pos;
        let start_vel = self.core.vel;
        let body = Vec2::splat(PHYS_SIZE);
        let stuck_before = ctx.map.test_box(self.core.pos, body);

        let world = ctx.core_world();
        self.core.apply_movement(&world, ctx.map, ctx.tuning);
        let stuck_after_move = ctx.map.test_box(self.core.pos, body);
        self.core.quantize();
        let stuck_after_quant = ctx.map.test_box(self.core.pos, body);
        self.pos = self.core.pos;

        if !stuck_before && (stuck_after_move || stuck_after_quant) {
            debug!(
                target: "game",
                "STUCK!!! {} {} {} {} {} {} {} {:x} {:x} {:x} {:x}",
                stuck_before,
                stuck_after_move,
                stuck_after_quant,
                start_pos.x,
                start_pos.y,
                start_vel.x,
                start_vel.y,
                start_pos.x.to_bits(),
                start_pos.y.to_bits(),
                start_vel.x.to_bits(),
                start_vel.y.to_bits()
            );
        }

        let events = self.core.triggered_events;
        let others = cmask_all_except_one(self.slot);
        if events.has(CoreEvents::GROUND_JUMP) {
            ctx.events.create_sound(self.pos, Sound::PlayerJump, others);
        }
        if events.has(CoreEvents::HOOK_ATTACH_PLAYER) {
            ctx.events.create_sound(self.pos, Sound::HookAttachPlayer, cmask_all());
        }
        if events.has(CoreEvents::HOOK_ATTACH_GROUND) {
            ctx.events.create_sound(self.pos, Sound::HookAttachGround, others);
        }
        if events.has(CoreEvents::HOOK_HIT_NOHOOK) {
            ctx.events.create_sound(self.pos, Sound::HookNoAttach, others);
        }

        let spectating = ctx
            .players
            .get(self.slot)
            .is_some_and(|p| p.is_spectator());
        if spectating {
            self.pos = self.input.target();
        }

        self.reconcile(ctx.tick, ctx.tick_speed());
    }

    /// Compare prediction with reality. On mismatch, or when the baseline is
    /// too old, snap both the send core and the reckoning core to the real
    /// core. Returns whether a resync happened.
    pub fn reconcile(&mut self, tick: Tick, tick_speed: i32) -> bool {
        let predicted = self.reckoning_core.write();
        let current = self.core.write();

        let expired = self.reckoning_tick + tick_speed * MAX_RECKONING_SECS < tick;
        if !expired && predicted == current {
            return false;
        }

        self.reckoning_tick = tick;
        self.send_core = self.core;
        self.reckoning_core = self.core;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_prediction_keeps_baseline() {
        let mut c = Character::new(0, Vec2::new(100.0, 100.0));
        assert!(c.reconcile(1, 50));
        assert_eq!(c.reckoning_tick(), 1);

        // Nothing moved, so the prediction still holds
        assert!(!c.reconcile(2, 50));
        assert!(!c.reconcile(151, 50));
        assert_eq!(c.reckoning_tick(), 1);
    }

    #[test]
    fn baseline_expires_after_three_seconds() {
        let mut c = Character::new(0, Vec2::new(100.0, 100.0));
        c.reconcile(10, 50);
        assert!(c.reconcile(161, 50));
        assert_eq!(c.reckoning_tick(), 161);
    }

    #[test]
    fn divergence_resyncs_immediately() {
        let mut c = Character::new(0, Vec2::new(100.0, 100.0));
        c.reconcile(10, 50);
        c.core_mut().vel.x = 3.0;
        assert!(c.reconcile(11, 50));
        assert_eq!(c.send_core().vel.x, 3.0);
        assert_eq!(c.reckoning_core().vel.x, 3.0);
    }
}
