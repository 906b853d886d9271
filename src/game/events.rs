//! Per-tick queue of world events and outbound messages

use glam::Vec2;

use super::math::round_to_int;
use crate::net::{cmask_all, GameEvent, Outbound, Recipient, ServerMsg, Sound};

/// Everything the simulation wants the transport to deliver, collected
/// during a tick and drained by the server loop
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
    outbound: Vec<Outbound>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_sound(&mut self, pos: Vec2, sound: Sound, mask: u64) {
        self.events.push(GameEvent::Sound {
            x: round_to_int(pos.x),
            y: round_to_int(pos.y),
            sound,
            mask,
        });
    }

    /// Sound heard by everyone
    pub fn create_sound_global(&mut self, pos: Vec2, sound: Sound) {
        self.create_sound(pos, sound, cmask_all());
    }

    /// Fan `amount` indicators over a third of a circle around `angle`
    pub fn create_damage_ind(&mut self, pos: Vec2, angle: f32, amount: i32) {
        let a = 3.0 * std::f32::consts::PI / 2.0 + angle;
        let s = a - std::f32::consts::PI / 3.0;
        let e = a + std::f32::consts::PI / 3.0;
        for i in 0..amount {
            let f = s + (e - s) * ((i + 1) as f32 / (amount + 2) as f32);
            self.events.push(GameEvent::DamageIndicator {
                x: round_to_int(pos.x),
                y: round_to_int(pos.y),
                angle: (f * 256.0) as i32,
            });
        }
    }

    pub fn create_hammer_hit(&mut self, pos: Vec2) {
        self.events.push(GameEvent::HammerHit {
            x: round_to_int(pos.x),
            y: round_to_int(pos.y),
        });
    }

    pub fn create_explosion(&mut self, pos: Vec2) {
        self.events.push(GameEvent::Explosion {
            x: round_to_int(pos.x),
            y: round_to_int(pos.y),
        });
    }

    pub fn create_death(&mut self, pos: Vec2, slot: usize) {
        self.events.push(GameEvent::Death {
            x: round_to_int(pos.x),
            y: round_to_int(pos.y),
            slot,
        });
    }

    pub fn create_spawn(&mut self, pos: Vec2) {
        self.events.push(GameEvent::Spawn {
            x: round_to_int(pos.x),
            y: round_to_int(pos.y),
        });
    }

    pub fn send(&mut self, recipient: Recipient, vital: bool, msg: ServerMsg) {
        self.outbound.push(Outbound {
            recipient,
            vital,
            msg,
        });
    }

    pub fn broadcast(&mut self, slot: usize, text: impl Into<String>) {
        self.send(
            Recipient::One(slot),
            false,
            ServerMsg::Broadcast { text: text.into() },
        );
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn outbound(&self) -> &[Outbound] {
        &self.outbound
    }

    /// Hand over everything queued so far
    pub fn drain(&mut self) -> (Vec<GameEvent>, Vec<Outbound>) {
        (
            std::mem::take(&mut self.events),
            std::mem::take(&mut self.outbound),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_indicators_spread_around_the_top() {
        let mut q = EventQueue::new();
        q.create_damage_ind(Vec2::ZERO, 0.0, 3);
        let angles: Vec<i32> = q
            .events()
            .iter()
            .filter_map(|e| match e {
                GameEvent::DamageIndicator { angle, .. } => Some(*angle),
                _ => None,
            })
            .collect();
        assert_eq!(angles.len(), 3);
        assert!(angles.windows(2).all(|w| w[0] < w[1]));
        let up = 3.0 * std::f32::consts::PI / 2.0;
        let lo = ((up - std::f32::consts::PI / 3.0) * 256.0) as i32;
        let hi = ((up + std::f32::consts::PI / 3.0) * 256.0) as i32;
        assert!(angles.iter().all(|a| (lo..hi).contains(a)));
    }

    #[test]
    fn drain_empties_the_queue() {
        let mut q = EventQueue::new();
        q.create_explosion(Vec2::new(1.4, 2.6));
        q.broadcast(3, "hi");
        let (events, outbound) = q.drain();
        assert_eq!(events, vec![GameEvent::Explosion { x: 1, y: 3 }]);
        assert_eq!(outbound[0].recipient, Recipient::One(3));
        assert!(q.events().is_empty() && q.outbound().is_empty());
    }
}
