//! Game simulation modules

pub mod arena;
pub mod character;
pub mod collision;
pub mod context;
pub mod controller;
pub mod core;
pub mod entities;
pub mod events;
pub mod input;
pub mod math;
pub mod player;
pub mod snapshot;
pub mod tuning;
pub mod weapons;
pub mod world;

pub use character::Character;
pub use collision::{Tile, TileMap};
pub use controller::{BombController, Controller};
pub use input::PlayerInput;
pub use player::Team;
pub use snapshot::{Observer, SnapshotBuffer};
pub use tuning::Tuning;
pub use weapons::WeaponKind;
pub use world::World;

/// Player slots in one game
pub const MAX_CLIENTS: usize = 16;
