use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Relational store connection settings. The core only needs these to exist
/// in the config surface; persistence itself lives outside this process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub sslmode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    pub name: String,
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
    pub host: String,
    pub port: u16,
    pub stream: StreamConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    pub port: u16,
}

/// Parameters of the tournament itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// A table below this occupancy attracts players at the next rebalance.
    pub min_players: usize,
    /// Hard seat limit per table.
    pub max_players: usize,
    /// Per-turn deadline before the auto check/fold fires.
    pub turn_seconds: u64,
    pub starting_stack: u32,
    /// Fixed big blind; also the minimum raise increment.
    pub bb_value: u32,
    /// Pause between stage reveals so clients can animate.
    #[serde(default = "default_stage_pause_ms")]
    pub stage_pause_ms: u64,
    /// Safety brake: stop starting hands at a table past this many rounds.
    #[serde(default)]
    pub max_rounds: Option<u32>,
    /// Fixed RNG seed for reproducible tournaments; random when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Player ids to seat at start. Admission is handled elsewhere; the
    /// engine only needs the roster.
    #[serde(default)]
    pub players: Vec<String>,
}

fn default_stage_pause_ms() -> u64 {
    2_000
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 9,
            turn_seconds: 30,
            starting_stack: 10_000,
            bb_value: 100,
            stage_pause_ms: default_stage_pause_ms(),
            max_rounds: None,
            seed: None,
            players: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub bus: BusConfig,
    pub server: HttpConfig,
    pub tournament: TournamentConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Load, apply environment overrides and validate. Any failure here is
    /// fatal: the process refuses to start on a bad config.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().display().to_string();
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path_str.clone(),
            source,
        })?;
        let mut config: Config =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path_str,
                source,
            })?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Environment variables win over the file, `FELT_`-prefixed.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(v) = env::var("FELT_DB_HOST") {
            self.database.host = v;
        }
        if let Ok(v) = env::var("FELT_DB_PORT") {
            self.database.port = parse_env("FELT_DB_PORT", &v)?;
        }
        if let Ok(v) = env::var("FELT_DB_USER") {
            self.database.user = v;
        }
        if let Ok(v) = env::var("FELT_DB_PASSWORD") {
            self.database.password = v;
        }
        if let Ok(v) = env::var("FELT_BUS_HOST") {
            self.bus.host = v;
        }
        if let Ok(v) = env::var("FELT_BUS_PORT") {
            self.bus.port = parse_env("FELT_BUS_PORT", &v)?;
        }
        if let Ok(v) = env::var("FELT_HTTP_PORT") {
            self.server.port = parse_env("FELT_HTTP_PORT", &v)?;
        }
        if let Ok(v) = env::var("FELT_TURN_SECONDS") {
            self.tournament.turn_seconds = parse_env("FELT_TURN_SECONDS", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.tournament;
        if t.min_players < 2 {
            return Err(ConfigError::Invalid(
                "tournament.min_players must be at least 2".to_string(),
            ));
        }
        if t.max_players < t.min_players {
            return Err(ConfigError::Invalid(
                "tournament.max_players must be at least min_players".to_string(),
            ));
        }
        if t.bb_value < 2 {
            return Err(ConfigError::Invalid(
                "tournament.bb_value must be at least 2 so the small blind is nonzero".to_string(),
            ));
        }
        if t.starting_stack < t.bb_value {
            return Err(ConfigError::Invalid(
                "tournament.starting_stack must cover at least one big blind".to_string(),
            ));
        }
        if t.turn_seconds == 0 {
            return Err(ConfigError::Invalid(
                "tournament.turn_seconds must be greater than 0".to_string(),
            ));
        }
        if self.bus.stream.name.is_empty() {
            return Err(ConfigError::Invalid(
                "bus.stream.name cannot be empty".to_string(),
            ));
        }
        if self.bus.stream.subjects.is_empty() {
            return Err(ConfigError::Invalid(
                "bus.stream.subjects cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{name}={value} is not a valid value")))
}
