//! Bomb Arena Server - authoritative tick simulation for the bomb-tag tile arena
//!
//! The crate owns the character simulation (input edges, weapons, movement,
//! accelerator and death tiles, dead reckoning, snapshots) and the bomb mode
//! that drives it. Transport stays outside: the world emits events, messages
//! and per-observer snapshots for whoever runs it.

pub mod config;
pub mod game;
pub mod net;
pub mod util;
