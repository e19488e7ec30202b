// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Only configuration and setup paths return these errors. Task and process
//! failures are never raised; they are reported through `BatchReport`,
//! `CommandStatus` and `Verdict` instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepairKitError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Cycle detected in plan: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RepairKitError>;
