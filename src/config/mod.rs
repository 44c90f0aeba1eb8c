//! Configuration module - environment variable parsing

use std::env;
use std::str::FromStr;

use crate::util::time::DEFAULT_TICK_RATE;

/// Harness configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Pulses per second
    pub tick_rate: u32,
    /// Stop after this many pulses (0 = run until Ctrl+C)
    pub run_ticks: u64,

    /// Scripted remote players
    pub remote_players: u16,
    /// Vehicles placed in the headless world
    pub vehicles: u16,
    /// Interpolation window applied to remote position updates
    pub sync_delay_ms: u64,
    /// Seed for scripted input
    pub world_seed: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            tick_rate: parse_var("TICK_RATE", DEFAULT_TICK_RATE)?,
            run_ticks: parse_var("RUN_TICKS", 0)?,
            remote_players: parse_var("REMOTE_PLAYERS", 3)?,
            vehicles: parse_var("VEHICLES", 4)?,
            sync_delay_ms: parse_var("SYNC_DELAY_MS", 100)?,
            world_seed: parse_var("WORLD_SEED", 42)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            tick_rate: DEFAULT_TICK_RATE,
            run_ticks: 0,
            remote_players: 3,
            vehicles: 4,
            sync_delay_ms: 100,
            world_seed: 42,
        }
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
