//! src/tank.rs
//!
//! Consumer-side tank model: measurement history, level mapping and the level
//! table used for outbound commands.

pub mod command;
pub mod history;
pub mod level;

pub use command::LevelTable;
pub use history::{Ingest, MeasurementHistory};
pub use level::LevelMapper;
