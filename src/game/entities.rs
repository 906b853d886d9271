//! Projectiles, lasers and explosions

use glam::Vec2;

use super::collision::TileMap;
use super::math::round_to_int;
use super::tuning::Tuning;
use super::weapons::WeaponKind;
use crate::net::{NetProjectile, Sound};
use crate::util::time::Tick;

pub const EXPLOSION_RADIUS: f32 = 135.0;
pub const EXPLOSION_INNER_RADIUS: f32 = 48.0;
pub const EXPLOSION_MAX_DAMAGE: f32 = 6.0;

/// Extra reach of projectiles when testing against characters
const PROJECTILE_HIT_RADIUS: f32 = 6.0;

/// Knock-back and damage of an explosion at `distance` from its centre.
/// Returns `None` once the damage rounds down to zero.
pub fn explosion_falloff(distance: f32) -> Option<(f32, i32)> {
    let l = 1.0
        - ((distance - EXPLOSION_INNER_RADIUS) / (EXPLOSION_RADIUS - EXPLOSION_INNER_RADIUS))
            .clamp(0.0, 1.0);
    let dmg = EXPLOSION_MAX_DAMAGE * l;
    if dmg as i32 == 0 {
        return None;
    }
    Some((dmg * 2.0, dmg as i32))
}

/// A flying bullet, pellet or grenade
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub owner: usize,
    /// Also decides the flight curve
    pub weapon: WeaponKind,
    pub pos: Vec2,
    pub dir: Vec2,
    pub start_tick: Tick,
    /// Ticks left before it expires
    pub lifespan: i32,
    pub damage: i32,
    pub force: f32,
    pub explosive: bool,
    pub impact_sound: Option<Sound>,
}

/// How a projectile ended
#[derive(Debug, Clone, PartialEq)]
pub struct Impact {
    pub pos: Vec2,
    pub owner: usize,
    pub weapon: WeaponKind,
    pub dir: Vec2,
    pub damage: i32,
    pub force: f32,
    pub explosive: bool,
    /// Character struck directly
    pub target: Option<usize>,
    pub sound: Option<Sound>,
}

impl Projectile {
    fn flight(&self, tuning: &Tuning) -> (f32, f32) {
        match self.weapon {
            WeaponKind::Grenade => (tuning.grenade_curvature, tuning.grenade_speed),
            WeaponKind::Shotgun => (tuning.shotgun_curvature, tuning.shotgun_speed),
            _ => (tuning.gun_curvature, tuning.gun_speed),
        }
    }

    /// Position `time` seconds after launch
    pub fn position_at(&self, time: f32, tuning: &Tuning) -> Vec2 {
        let (curvature, speed) = self.flight(tuning);
        let t = time * speed;
        Vec2::new(
            self.pos.x + self.dir.x * t,
            self.pos.y + self.dir.y * t + curvature / 10000.0 * (t * t),
        )
    }

    pub fn fill_info(&self) -> NetProjectile {
        NetProjectile {
            x: round_to_int(self.pos.x),
            y: round_to_int(self.pos.y),
            vel_x: (self.dir.x * 100.0) as i32,
            vel_y: (self.dir.y * 100.0) as i32,
            kind: self.weapon.id(),
            start_tick: self.start_tick,
        }
    }

    /// Advance one tick. `hit` finds the first character (other than the
    /// owner) on a segment and where it was struck.
    pub fn step<F>(
        &mut self,
        tick: Tick,
        tick_speed: i32,
        tuning: &Tuning,
        map: &TileMap,
        mut hit: F,
    ) -> Option<Impact>
    where
        F: FnMut(Vec2, Vec2, f32) -> Option<(usize, Vec2)>,
    {
        let ts = tick_speed as f32;
        let prev_pos = self.position_at((tick - self.start_tick - 1) as f32 / ts, tuning);
        let mut cur_pos = self.position_at((tick - self.start_tick) as f32 / ts, tuning);

        let collide = map.intersect_line(prev_pos, cur_pos);
        if let Some(c) = collide {
            cur_pos = c.at;
        }

        let target = hit(prev_pos, cur_pos, PROJECTILE_HIT_RADIUS);
        if let Some((_, at)) = target {
            cur_pos = at;
        }

        self.lifespan -= 1;

        if target.is_none()
            && collide.is_none()
            && self.lifespan >= 0
            && !map.game_layer_clipped(cur_pos)
        {
            return None;
        }

        let audible = self.lifespan >= 0 || self.weapon == WeaponKind::Grenade;
        Some(Impact {
            pos: cur_pos,
            owner: self.owner,
            weapon: self.weapon,
            dir: self.dir,
            damage: self.damage,
            force: self.force,
            explosive: self.explosive,
            target: target.map(|(slot, _)| slot),
            sound: self.impact_sound.filter(|_| audible),
        })
    }
}

/// Result of firing a laser
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaserTrace {
    /// Beam segments from muzzle to end
    pub segments: Vec<(Vec2, Vec2)>,
    /// Points where the beam bounced
    pub bounces: Vec<Vec2>,
    /// Character the beam stopped in
    pub hit: Option<usize>,
}

/// Trace a laser through the map, bouncing off walls until its energy is
/// spent, the bounce budget runs out or it hits a character
pub fn trace_laser<F>(from: Vec2, dir: Vec2, reach: f32, tuning: &Tuning, map: &TileMap, mut hit: F) -> LaserTrace
where
    F: FnMut(Vec2, Vec2) -> Option<(usize, Vec2)>,
{
    let mut trace = LaserTrace::default();
    let mut pos = from;
    let mut dir = dir;
    let mut energy = reach;
    let mut bounces = 0;

    while energy >= 0.0 {
        let mut to = pos + dir * energy;
        let wall = map.intersect_line(pos, to);
        if let Some(w) = wall {
            to = w.before;
        }

        if let Some((slot, at)) = hit(pos, to) {
            trace.segments.push((pos, at));
            trace.hit = Some(slot);
            break;
        }

        if wall.is_none() {
            trace.segments.push((pos, to));
            break;
        }

        let start = pos;
        let mut bounce_pos = to;
        let mut bounce_dir = dir * 4.0;
        map.move_point(&mut bounce_pos, &mut bounce_dir, 1.0);
        pos = bounce_pos;
        dir = bounce_dir.normalize_or_zero();
        trace.segments.push((start, pos));
        trace.bounces.push(pos);

        energy -= start.distance(pos) + tuning.laser_bounce_cost;
        bounces += 1;
        if bounces > tuning.laser_bounce_num {
            break;
        }
    }

    trace
}

/// Live projectiles in the world
#[derive(Debug, Default)]
pub struct Entities {
    pub projectiles: Vec<Projectile>,
}

impl Entities {
    pub fn spawn_projectile(&mut self, projectile: Projectile) {
        self.projectiles.push(projectile);
    }

    pub fn clear(&mut self) {
        self.projectiles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::collision::Tile;

    fn gun(start_tick: Tick) -> Projectile {
        Projectile {
            owner: 0,
            weapon: WeaponKind::Gun,
            pos: Vec2::new(100.0, 100.0),
            dir: Vec2::X,
            start_tick,
            lifespan: 100,
            damage: 1,
            force: 0.0,
            explosive: false,
            impact_sound: None,
        }
    }

    #[test]
    fn falloff_covers_inner_and_outer_radius() {
        assert_eq!(explosion_falloff(0.0), Some((12.0, 6)));
        assert_eq!(explosion_falloff(40.0), Some((12.0, 6)));
        assert_eq!(explosion_falloff(200.0), None);
        let (force, dmg) = explosion_falloff(100.0).unwrap();
        assert!(dmg > 0 && dmg < 6);
        assert!(force < 12.0);
    }

    #[test]
    fn gun_curves_downward() {
        let p = gun(0);
        let tuning = Tuning::default();
        let a = p.position_at(0.1, &tuning);
        assert!((a.x - (100.0 + 220.0)).abs() < 1e-3);
        assert!(a.y > 100.0);
    }

    #[test]
    fn projectile_hits_wall() {
        let mut map = TileMap::new(40, 10);
        map.fill(20, 0, 20, 9, Tile::solid());
        let tuning = Tuning::default();
        let mut p = gun(0);

        let mut impact = None;
        for tick in 1..20 {
            impact = p.step(tick, 50, &tuning, &map, |_, _, _| None);
            if impact.is_some() {
                break;
            }
        }
        let impact = impact.expect("hit the wall");
        assert!(impact.pos.x >= 640.0 - 1.0 && impact.pos.x < 660.0);
        assert_eq!(impact.target, None);
    }

    #[test]
    fn projectile_expires_silently() {
        let map = TileMap::new(400, 400);
        let tuning = Tuning::default();
        let mut p = gun(0);
        p.lifespan = 0;
        p.impact_sound = Some(Sound::Hit);
        let impact = p.step(1, 50, &tuning, &map, |_, _, _| None).unwrap();
        assert_eq!(impact.sound, None);
    }

    #[test]
    fn laser_bounces_once_then_stops() {
        let mut map = TileMap::new(40, 40);
        map.fill(10, 0, 10, 39, Tile::solid());
        let tuning = Tuning::default();
        let trace = trace_laser(Vec2::new(100.0, 300.0), Vec2::X, 800.0, &tuning, &map, |_, _| None);
        assert_eq!(trace.bounces.len(), 1);
        assert_eq!(trace.segments.len(), 2);
        let (_, end) = trace.segments[1];
        assert!(end.x < 320.0);
    }

    #[test]
    fn laser_stops_in_character() {
        let map = TileMap::new(40, 40);
        let tuning = Tuning::default();
        let trace = trace_laser(
            Vec2::new(100.0, 300.0),
            Vec2::X,
            800.0,
            &tuning,
            &map,
            |_, _| Some((3, Vec2::new(200.0, 300.0))),
        );
        assert_eq!(trace.hit, Some(3));
        assert_eq!(trace.segments, vec![(Vec2::new(100.0, 300.0), Vec2::new(200.0, 300.0))]);
    }
}
