//! Small numeric helpers shared by the physics and weapon code

use glam::Vec2;

/// Round half away from zero, the way positions are quantized on the wire
pub fn round_to_int(f: f32) -> i32 {
    if f > 0.0 {
        (f + 0.5) as i32
    } else {
        (f - 0.5) as i32
    }
}

/// Add `modifier` to `current` without pushing it past `[min, max]` in the direction of travel
pub fn saturated_add(min: f32, max: f32, current: f32, modifier: f32) -> f32 {
    if modifier < 0.0 {
        if current < min {
            return current;
        }
        (current + modifier).max(min)
    } else {
        if current > max {
            return current;
        }
        (current + modifier).min(max)
    }
}

/// Damping factor applied to fast horizontal movement
pub fn velocity_ramp(value: f32, start: f32, range: f32, curvature: f32) -> f32 {
    if value < start {
        return 1.0;
    }
    1.0 / curvature.powf((value - start) / range)
}

/// Closest point to `p` on the segment `a..b`
pub fn closest_point_on_line(a: Vec2, b: Vec2, p: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Angle of a direction vector in radians (zero for the zero vector)
pub fn angle_of(dir: Vec2) -> f32 {
    if dir.x == 0.0 && dir.y == 0.0 {
        return 0.0;
    }
    let mut a = (dir.y / dir.x).atan();
    if dir.x < 0.0 {
        a += std::f32::consts::PI;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_is_symmetric() {
        assert_eq!(round_to_int(1.5), 2);
        assert_eq!(round_to_int(-1.5), -2);
        assert_eq!(round_to_int(0.49), 0);
        assert_eq!(round_to_int(-0.49), 0);
    }

    #[test]
    fn saturated_add_keeps_overspeed_but_never_adds_to_it() {
        assert_eq!(saturated_add(-10.0, 10.0, 9.0, 2.0), 10.0);
        assert_eq!(saturated_add(-10.0, 10.0, 12.0, 2.0), 12.0);
        assert_eq!(saturated_add(-10.0, 10.0, -9.5, -2.0), -10.0);
        assert_eq!(saturated_add(-10.0, 10.0, 5.0, -2.0), 3.0);
    }

    #[test]
    fn ramp_is_identity_below_start() {
        assert_eq!(velocity_ramp(100.0, 550.0, 2000.0, 1.4), 1.0);
        assert!(velocity_ramp(2550.0, 550.0, 2000.0, 1.4) < 1.0);
    }

    #[test]
    fn closest_point_clamps_to_segment() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert_eq!(closest_point_on_line(a, b, Vec2::new(5.0, 3.0)), Vec2::new(5.0, 0.0));
        assert_eq!(closest_point_on_line(a, b, Vec2::new(-4.0, 1.0)), a);
        assert_eq!(closest_point_on_line(a, a, Vec2::new(3.0, 3.0)), a);
    }

    #[test]
    fn angle_covers_left_half_plane() {
        assert!((angle_of(Vec2::new(-1.0, 0.0)) - std::f32::consts::PI).abs() < 1e-6);
        assert_eq!(angle_of(Vec2::ZERO), 0.0);
    }
}
