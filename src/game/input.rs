//! Player input snapshots and press/release edge detection
//!
//! Buttons that can be tapped faster than the tick rate (fire, weapon
//! cycling) arrive as rolling counters instead of booleans: the client bumps
//! the counter on every press and every release, so an odd value means the
//! button is currently held. Comparing two samples recovers every edge that
//! happened in between.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Cyclic state space of the rolling button counters (64 steps)
pub const INPUT_STATE_MASK: i32 = 0x3f;

/// One input sample as sent by a client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInput {
    /// -1 left, 0 none, 1 right
    pub direction: i32,
    /// Aim target relative to the character
    pub target_x: i32,
    pub target_y: i32,
    pub jump: i32,
    /// Rolling counter, odd = held
    pub fire: i32,
    pub hook: i32,
    pub player_flags: i32,
    /// One-based direct weapon selection, 0 = none
    pub wanted_weapon: i32,
    /// Rolling counters for weapon cycling
    pub next_weapon: i32,
    pub prev_weapon: i32,
}

impl PlayerInput {
    /// Whether the fire button is held in this sample
    pub fn fire_held(&self) -> bool {
        self.fire & 1 != 0
    }

    pub fn target(&self) -> Vec2 {
        Vec2::new(self.target_x as f32, self.target_y as f32)
    }

    /// Aiming exactly at the character is not allowed; point straight up instead
    pub fn sanitize_target(&mut self) {
        if self.target_x == 0 && self.target_y == 0 {
            self.target_y = -1;
        }
    }
}

/// Edges found between two counter samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputCount {
    pub presses: i32,
    pub releases: i32,
}

/// Count presses and releases between two rolling counter samples
pub fn count_input(prev: i32, cur: i32) -> InputCount {
    count_input_masked(prev, cur, INPUT_STATE_MASK)
}

/// [`count_input`] over an arbitrary power-of-two state space (`mask` = size - 1).
///
/// Walks forward from `prev` to `cur`, wrapping; every odd step is a press and
/// every even step a release. Equal samples report nothing, so a counter that
/// wrapped all the way around between polls is indistinguishable from an idle
/// button.
pub fn count_input_masked(prev: i32, cur: i32, mask: i32) -> InputCount {
    debug_assert!(mask >= 0 && (mask & (mask + 1)) == 0, "mask must be 2^n - 1");

    let mut count = InputCount::default();
    let cur = cur & mask;
    let mut i = prev & mask;

    while i != cur {
        i = (i + 1) & mask;
        if i & 1 != 0 {
            count.presses += 1;
        } else {
            count.releases += 1;
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_steps_in_four_bit_space() {
        let c = count_input_masked(0b000, 0b011, 0xf);
        assert_eq!(c, InputCount { presses: 2, releases: 1 });
    }

    #[test]
    fn equal_samples_report_nothing() {
        assert_eq!(count_input(5, 5), InputCount::default());
        // A full lap looks the same as no activity.
        assert_eq!(count_input(5, 5 + 64), InputCount::default());
    }

    #[test]
    fn wraps_around_the_state_space() {
        // 62 -> 63 (press) -> 0 (release) -> 1 (press)
        let c = count_input(62, 1);
        assert_eq!(c, InputCount { presses: 2, releases: 1 });
    }

    #[test]
    fn totals_equal_cyclic_distance_and_alternate() {
        let mask = 0xf;
        for prev in 0..=mask {
            for cur in 0..=mask {
                let c = count_input_masked(prev, cur, mask);
                let distance = (cur - prev).rem_euclid(mask + 1);
                assert_eq!(c.presses + c.releases, distance);
                // Edges alternate, so the two counts differ by at most one.
                assert!((c.presses - c.releases).abs() <= 1);
                if prev & 1 == 0 {
                    assert!(c.presses >= c.releases);
                } else {
                    assert!(c.releases >= c.presses);
                }
            }
        }
    }

    #[test]
    fn only_low_bits_matter() {
        assert_eq!(count_input(0x40, 0x41), count_input(0, 1));
    }

    #[test]
    fn centre_aim_is_redirected_upward() {
        let mut input = PlayerInput::default();
        input.sanitize_target();
        assert_eq!((input.target_x, input.target_y), (0, -1));

        let mut aimed = PlayerInput {
            target_x: 3,
            ..Default::default()
        };
        aimed.sanitize_target();
        assert_eq!((aimed.target_x, aimed.target_y), (3, 0));
    }
}
