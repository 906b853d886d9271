//! Death tiles and accelerator tiles

use glam::Vec2;

use super::Character;
use crate::game::collision::{TileMap, ACCEL_THRESHOLD_DIVISOR};
use crate::game::context::GameContext;
use crate::game::core::PHYS_SIZE;

/// Unit push for an accelerator direction code. Codes outside 0..=15 push nowhere.
pub fn accel_direction(raw: i32) -> Vec2 {
    match raw {
        0 | 2 | 4 | 6 => Vec2::X,
        1 | 3 | 5 | 7 => Vec2::NEG_X,
        8 | 10 | 12 | 14 => Vec2::Y,
        9 | 11 | 13 | 15 => Vec2::NEG_Y,
        _ => Vec2::ZERO,
    }
}

/// Corners of a square of half-width `r` around `pos`
fn corners(pos: Vec2, r: f32) -> [Vec2; 4] {
    [
        Vec2::new(pos.x + r, pos.y - r),
        Vec2::new(pos.x + r, pos.y + r),
        Vec2::new(pos.x - r, pos.y - r),
        Vec2::new(pos.x - r, pos.y + r),
    ]
}

/// An accelerator is switched on while its threshold is at least the number
/// of players on a playing team
fn accel_active(map: &TileMap, at: Vec2, live_players: i32) -> bool {
    map.collision_at(at.x, at.y) / ACCEL_THRESHOLD_DIVISOR >= live_players
}

/// Summed accelerator push at the four body corners. Every active corner adds
/// its full power, so straddling two tiles doubles the push.
pub(super) fn accel_force(map: &TileMap, pos: Vec2, live_players: i32) -> Option<(i32, i32)> {
    let points = corners(pos, PHYS_SIZE / 2.0);
    if !points.iter().any(|p| accel_active(map, *p, live_players)) {
        return None;
    }

    let mut sum = Vec2::ZERO;
    for p in points {
        if accel_active(map, p, live_players) {
            sum += accel_direction(map.flags_at(p.x, p.y)) * map.power_at(p.x, p.y) as f32;
        }
    }
    Some((sum.x as i32, sum.y as i32))
}

/// Soft velocity change: half the old speed, plus a square-root kick, plus the push
fn accelerate(v: f32, accel: i32) -> f32 {
    if accel == 0 {
        return v;
    }
    0.5 * v + v.abs().sqrt() * (accel.signum() as f32) + accel as f32
}

impl Character {
    /// Body corners in a death tile, or drifted out of the game layer
    pub(super) fn touches_death(&self, map: &TileMap) -> bool {
        corners(self.pos, PHYS_SIZE / 3.0)
            .iter()
            .any(|p| map.is_death(p.x, p.y))
            || map.game_layer_clipped(self.pos)
    }

    pub(super) fn handle_accelerators(&mut self, ctx: &mut GameContext<'_>) {
        let live = ctx.live_players() as i32;

        if self.landed_on_accel_ticks > 0 {
            self.landed_on_accel_ticks -= 1;
        } else {
            self.core.cond_grounded = false;
        }

        let Some((ax, ay)) = accel_force(ctx.map, self.pos, live) else {
            return;
        };

        self.core.vel.x = accelerate(self.core.vel.x, ax);
        self.core.vel.y = accelerate(self.core.vel.y, ay);

        // Upward accelerators carry the character like ground
        let below = Vec2::new(self.pos.x, self.pos.y + PHYS_SIZE / 5.0);
        if ay < 0 && !accel_active(ctx.map, below, live) {
            self.core.cond_grounded = true;
            self.landed_on_accel_ticks = (0.1 * ctx.tick_speed() as f32) as i32;
            self.core.jumped = 0;
        }
    }
}
