//! src/error.rs
//!
//! Error types shared across the ingest pipeline, the command path and startup
//! configuration.

use std::io;

use thiserror::Error;

/// Failure to establish a connection to the sensor device.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Failure on the outbound command path.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("no device connected")]
    NotConnected,
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

/// Invalid startup configuration. These are the only fatal errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("min valid reading {min} cm must be below tank height {max} cm")]
    InvalidBounds { min: f64, max: f64 },
    #[error("display scale must be positive, got {0}")]
    InvalidScale(f64),
    #[error("level table is empty")]
    EmptyLevels,
    #[error("level table holds {0} entries, at most 10 fit in one command digit")]
    TooManyLevels(usize),
    #[error("duplicate level label {0:?}")]
    DuplicateLevel(String),
    #[error("level {label:?} at {value} cm is outside the measurable range (0..{max})")]
    LevelOutOfRange { label: String, value: f64, max: f64 },
    #[error("malformed level entry {0:?}, expected LABEL:CM")]
    MalformedLevel(String),
}
