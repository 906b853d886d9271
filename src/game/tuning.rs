//! Physics and weapon tuning parameters

/// Tunable constants read by the movement core and projectile code.
/// Speeds and accelerations are per tick at the stock 50 Hz rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub ground_control_speed: f32,
    pub ground_control_accel: f32,
    pub ground_friction: f32,
    pub ground_jump_impulse: f32,
    pub air_jump_impulse: f32,
    pub air_control_speed: f32,
    pub air_control_accel: f32,
    pub air_friction: f32,
    pub hook_length: f32,
    pub hook_fire_speed: f32,
    pub hook_drag_accel: f32,
    pub hook_drag_speed: f32,
    pub gravity: f32,

    pub velramp_start: f32,
    pub velramp_range: f32,
    pub velramp_curvature: f32,

    pub gun_curvature: f32,
    pub gun_speed: f32,
    /// Seconds
    pub gun_lifetime: f32,

    pub shotgun_curvature: f32,
    pub shotgun_speed: f32,
    /// Speed factor of the outermost pellets
    pub shotgun_speeddiff: f32,
    pub shotgun_lifetime: f32,

    pub grenade_curvature: f32,
    pub grenade_speed: f32,
    pub grenade_lifetime: f32,

    pub laser_reach: f32,
    pub laser_bounce_num: i32,
    pub laser_bounce_cost: f32,
    pub laser_damage: i32,

    pub player_collision: bool,
    pub player_hooking: bool,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            ground_control_speed: 10.0,
            ground_control_accel: 100.0 / 50.0,
            ground_friction: 0.5,
            ground_jump_impulse: 13.2,
            air_jump_impulse: 12.0,
            air_control_speed: 250.0 / 50.0,
            air_control_accel: 1.5,
            air_friction: 0.95,
            hook_length: 380.0,
            hook_fire_speed: 80.0,
            hook_drag_accel: 3.0,
            hook_drag_speed: 15.0,
            gravity: 0.5,

            velramp_start: 550.0,
            velramp_range: 2000.0,
            velramp_curvature: 1.4,

            gun_curvature: 1.25,
            gun_speed: 2200.0,
            gun_lifetime: 2.0,

            shotgun_curvature: 1.25,
            shotgun_speed: 2750.0,
            shotgun_speeddiff: 0.8,
            shotgun_lifetime: 0.20,

            grenade_curvature: 7.0,
            grenade_speed: 1000.0,
            grenade_lifetime: 2.0,

            laser_reach: 800.0,
            laser_bounce_num: 1,
            laser_bounce_cost: 0.0,
            laser_damage: 5,

            player_collision: true,
            player_hooking: true,
        }
    }
}
