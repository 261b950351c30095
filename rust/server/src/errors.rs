use thiserror::Error;

use crate::bus::BusError;
use crate::config::ConfigError;
use felt_engine::errors::EngineError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("bus error: {0}")]
    Bus(#[from] BusError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("tournament task failed: {0}")]
    Join(String),
}
