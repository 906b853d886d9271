//! Wire-level records exchanged with observers

pub mod protocol;

pub use protocol::{
    cmask_all, cmask_all_except_one, cmask_one, Emote, GameEvent, KillMsg, NetCharacter,
    NetCharacterCore, NetProjectile, Outbound, Recipient, ServerMsg, Sound, WireError,
};
