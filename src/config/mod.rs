//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::game::MAX_CLIENTS;
use crate::util::time::DEFAULT_TICK_SPEED;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Rules the simulation reads every tick
    pub game: GameConfig,
    /// Headless harness settings
    pub harness: HarnessConfig,
}

/// Simulation-facing server variables
#[derive(Clone, Copy, Debug)]
pub struct GameConfig {
    /// Ticks per second
    pub tick_speed: i32,
    /// Player slots offered by the server
    pub max_clients: i32,
    /// Slots reserved for spectators
    pub spectator_slots: i32,
    /// Whether teammates can hurt each other
    pub team_damage: bool,
    /// Whether the mode runs with two sides
    pub teamplay: bool,
    /// Hide vitals from spectators following a player
    pub strict_spectate_mode: bool,
    /// Bomb fuse length in seconds
    pub bomb_fuse_secs: i32,
    /// Send the once-per-second bomb status broadcast
    pub bomb_broadcast: bool,
    /// How long a melee stun lasts, in milliseconds
    pub stun_time_ms: i32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_speed: DEFAULT_TICK_SPEED,
            max_clients: MAX_CLIENTS as i32,
            spectator_slots: 0,
            team_damage: false,
            teamplay: false,
            strict_spectate_mode: false,
            bomb_fuse_secs: 20,
            bomb_broadcast: true,
            stun_time_ms: 1000,
        }
    }
}

impl GameConfig {
    /// Full bomb fuse expressed in ticks
    pub fn bomb_fuse_ticks(&self) -> i32 {
        self.bomb_fuse_secs * self.tick_speed
    }
}

/// Settings for the bot-driven headless run
#[derive(Clone, Debug)]
pub struct HarnessConfig {
    pub bots: usize,
    pub seconds: u64,
    /// Fixed RNG seed, random when unset
    pub seed: Option<u64>,
    /// ASCII map file, built-in arena when unset
    pub map_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = GameConfig::default();

        let game = GameConfig {
            tick_speed: var_or("SV_TICK_SPEED", defaults.tick_speed)?,
            max_clients: var_or("SV_MAX_CLIENTS", defaults.max_clients)?,
            spectator_slots: var_or("SV_SPECTATOR_SLOTS", defaults.spectator_slots)?,
            team_damage: flag_or("SV_TEAMDAMAGE", defaults.team_damage)?,
            teamplay: flag_or("SV_TEAMPLAY", defaults.teamplay)?,
            strict_spectate_mode: flag_or(
                "SV_STRICT_SPECTATE_MODE",
                defaults.strict_spectate_mode,
            )?,
            bomb_fuse_secs: var_or("SV_BOMB_FUSE", defaults.bomb_fuse_secs)?,
            bomb_broadcast: flag_or("SV_BOMB_BROADCAST", defaults.bomb_broadcast)?,
            stun_time_ms: var_or("SV_STUN_TIME", defaults.stun_time_ms)?,
        };

        if game.tick_speed <= 0 {
            return Err(ConfigError::OutOfRange {
                name: "SV_TICK_SPEED",
                reason: "must be positive",
            });
        }
        if game.max_clients < 1 || game.max_clients > MAX_CLIENTS as i32 {
            return Err(ConfigError::OutOfRange {
                name: "SV_MAX_CLIENTS",
                reason: "must be between 1 and 16",
            });
        }
        if game.bomb_fuse_secs <= 0 {
            return Err(ConfigError::OutOfRange {
                name: "SV_BOMB_FUSE",
                reason: "must be positive",
            });
        }

        let seed = match env::var("HARNESS_SEED") {
            Ok(raw) => Some(
                raw.parse()
                    .map_err(|_| ConfigError::Invalid("HARNESS_SEED"))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            game,
            harness: HarnessConfig {
                bots: var_or("HARNESS_BOTS", 4)?,
                seconds: var_or("HARNESS_SECONDS", 30)?,
                seed,
                map_path: env::var("HARNESS_MAP").ok().map(PathBuf::from),
            },
        })
    }
}

fn var_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

// Server variables are traditionally 0/1, accept true/false too.
fn flag_or(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.trim() {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            _ => Err(ConfigError::Invalid(name)),
        },
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("{name} {reason}")]
    OutOfRange {
        name: &'static str,
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_server() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.tick_speed, 50);
        assert_eq!(cfg.max_clients, 16);
        assert!(!cfg.team_damage);
        assert_eq!(cfg.bomb_fuse_ticks(), 1000);
    }

    #[test]
    fn unset_variables_fall_back() {
        assert_eq!(var_or("BOMB_ARENA_TEST_UNSET_VAR", 7).unwrap(), 7);
        assert!(flag_or("BOMB_ARENA_TEST_UNSET_FLAG", true).unwrap());
    }
}
