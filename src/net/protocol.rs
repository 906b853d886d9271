//! Network protocol record definitions
//! These are the wire types the simulation produces for observers

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::util::time::Tick;

/// Sound cues the simulation can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sound {
    GunFire,
    ShotgunFire,
    GrenadeFire,
    HammerFire,
    HammerHit,
    GrenadeExplode,
    RifleFire,
    RifleBounce,
    WeaponSwitch,
    WeaponNoAmmo,
    PlayerPainShort,
    PlayerPainLong,
    PlayerJump,
    PlayerDie,
    PlayerSpawn,
    HookAttachGround,
    HookAttachPlayer,
    HookNoAttach,
    Hit,
}

/// Face shown on a character
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum Emote {
    #[default]
    Normal = 0,
    Pain = 1,
    Happy = 2,
    Surprise = 3,
    Angry = 4,
    Blink = 5,
}

/// Recipient mask addressing every client
pub fn cmask_all() -> u64 {
    u64::MAX
}

/// Recipient mask addressing a single client
pub fn cmask_one(slot: usize) -> u64 {
    1u64.checked_shl(slot as u32).unwrap_or(0)
}

/// Recipient mask addressing everyone but one client
pub fn cmask_all_except_one(slot: usize) -> u64 {
    !cmask_one(slot)
}

/// Movement part of a character record. Also the unit of dead-reckoning comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetCharacterCore {
    pub tick: Tick,
    pub x: i32,
    pub y: i32,
    /// Velocity scaled by 256
    pub vel_x: i32,
    pub vel_y: i32,
    /// Aim angle scaled by 256
    pub angle: i32,
    pub direction: i32,
    pub jumped: i32,
    pub hooked_player: i32,
    pub hook_state: i32,
    pub hook_tick: i32,
    pub hook_x: i32,
    pub hook_y: i32,
    /// Hook direction scaled by 256
    pub hook_dx: i32,
    pub hook_dy: i32,
}

/// Full per-observer character record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetCharacter {
    pub core: NetCharacterCore,
    pub player_flags: i32,
    pub health: i32,
    pub armor: i32,
    pub ammo_count: i32,
    pub weapon: i32,
    pub emote: i32,
    pub attack_tick: Tick,
}

/// Compact projectile description, six integers on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetProjectile {
    pub x: i32,
    pub y: i32,
    /// Direction scaled by 100
    pub vel_x: i32,
    pub vel_y: i32,
    pub kind: i32,
    pub start_tick: Tick,
}

impl NetProjectile {
    pub const WIRE_INTS: usize = 6;

    fn put(&self, buf: &mut BytesMut) {
        buf.put_i32_le(self.x);
        buf.put_i32_le(self.y);
        buf.put_i32_le(self.vel_x);
        buf.put_i32_le(self.vel_y);
        buf.put_i32_le(self.kind);
        buf.put_i32_le(self.start_tick);
    }

    fn get(buf: &mut Bytes) -> Self {
        Self {
            x: buf.get_i32_le(),
            y: buf.get_i32_le(),
            vel_x: buf.get_i32_le(),
            vel_y: buf.get_i32_le(),
            kind: buf.get_i32_le(),
            start_tick: buf.get_i32_le(),
        }
    }

    /// Pack a batch as `count` followed by each projectile, uncompressed
    pub fn pack_batch(projectiles: &[NetProjectile]) -> Bytes {
        let mut buf = BytesMut::with_capacity(4 + projectiles.len() * Self::WIRE_INTS * 4);
        buf.put_i32_le(projectiles.len() as i32);
        for p in projectiles {
            p.put(&mut buf);
        }
        buf.freeze()
    }

    /// Inverse of [`NetProjectile::pack_batch`]
    pub fn unpack_batch(mut payload: Bytes) -> Result<Vec<NetProjectile>, WireError> {
        if payload.remaining() < 4 {
            return Err(WireError::Truncated);
        }
        let count = payload.get_i32_le();
        if count < 0 {
            return Err(WireError::InvalidCount(count));
        }
        let count = count as usize;
        if payload.remaining() != count * Self::WIRE_INTS * 4 {
            return Err(WireError::Truncated);
        }
        Ok((0..count).map(|_| Self::get(&mut payload)).collect())
    }
}

/// Kill notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillMsg {
    pub killer: i32,
    pub victim: i32,
    pub weapon: i32,
    pub mode_special: i32,
}

/// Messages sent from server to clients outside of snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Someone died
    KillMsg(KillMsg),

    /// Shooter-only copy of freshly spawned projectiles
    ExtraProjectile {
        payload: Bytes,
    },

    /// Centre-screen text
    Broadcast {
        text: String,
    },
}

/// Who a message goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    All,
    One(usize),
}

/// A queued server message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outbound {
    pub recipient: Recipient,
    /// Must be delivered reliably
    pub vital: bool,
    pub msg: ServerMsg,
}

/// Fire-and-forget world events (effects and cues)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GameEvent {
    Sound {
        x: i32,
        y: i32,
        sound: Sound,
        /// Recipient bitmask, bit N is client N
        mask: u64,
    },

    DamageIndicator {
        x: i32,
        y: i32,
        /// Angle scaled by 256
        angle: i32,
    },

    HammerHit {
        x: i32,
        y: i32,
    },

    Explosion {
        x: i32,
        y: i32,
    },

    Death {
        x: i32,
        y: i32,
        slot: usize,
    },

    Spawn {
        x: i32,
        y: i32,
    },
}

/// Wire decoding errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WireError {
    #[error("payload ended early")]
    Truncated,

    #[error("invalid item count {0}")]
    InvalidCount(i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_address_expected_clients() {
        assert_eq!(cmask_one(3), 0b1000);
        assert_eq!(cmask_all_except_one(0) & 1, 0);
        assert_eq!(cmask_all_except_one(0) & 0b10, 0b10);
        assert_eq!(cmask_one(200), 0);
    }

    #[test]
    fn projectile_batch_layout_is_count_then_six_ints() {
        let p = NetProjectile {
            x: 10,
            y: -20,
            vel_x: 100,
            vel_y: 0,
            kind: 1,
            start_tick: 77,
        };
        let payload = NetProjectile::pack_batch(&[p, p]);
        assert_eq!(payload.len(), 4 + 2 * 6 * 4);
        assert_eq!(&payload[..4], &2i32.to_le_bytes());
        assert_eq!(&payload[4..8], &10i32.to_le_bytes());
        assert_eq!(NetProjectile::unpack_batch(payload).unwrap(), vec![p, p]);
    }

    #[test]
    fn short_payload_is_rejected() {
        let payload = Bytes::from_static(&[1, 0, 0, 0, 5]);
        assert_eq!(
            NetProjectile::unpack_batch(payload),
            Err(WireError::Truncated)
        );
        let negative = Bytes::copy_from_slice(&(-1i32).to_le_bytes());
        assert_eq!(
            NetProjectile::unpack_batch(negative),
            Err(WireError::InvalidCount(-1))
        );
    }
}
