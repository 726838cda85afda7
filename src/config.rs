//! src/config.rs
//!
//! Command-line configuration.
//!
//! Everything is fixed at startup: serial line settings, tank geometry, history
//! and queue sizes, the level table and logging. [`Cli::into_config`] validates
//! the lot; a [`ConfigError`] here is the only fatal error the app knows.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::error::ConfigError;
use crate::ingest::ReaderTiming;
use crate::tank::{LevelMapper, LevelTable};

#[derive(Parser, Debug)]
#[command(
    name = "tankview",
    version,
    about = "Live water tank view fed by a serial distance sensor"
)]
pub struct Cli {
    /// Where readings come from
    #[arg(long, value_enum, default_value_t = Source::Serial)]
    pub source: Source,

    /// Serial device path
    #[arg(long, default_value = "/dev/ttyACM0", value_name = "PATH")]
    pub port: String,

    /// Baud rate
    #[arg(long, default_value_t = 115_200)]
    pub baud: u32,

    #[arg(long, value_enum, default_value_t = DataBitsOpt::Eight)]
    pub data_bits: DataBitsOpt,

    #[arg(long, value_enum, default_value_t = ParityOpt::None)]
    pub parity: ParityOpt,

    #[arg(long, value_enum, default_value_t = StopBitsOpt::One)]
    pub stop_bits: StopBitsOpt,

    /// Read timeout of one serial read
    #[arg(long, default_value_t = 100, value_name = "MS")]
    pub timeout_ms: u64,

    /// Delay between reader iterations
    #[arg(long, default_value_t = 10, value_name = "MS")]
    pub poll_ms: u64,

    /// Delay after a read or connect failure
    #[arg(long, default_value_t = 500, value_name = "MS")]
    pub backoff_ms: u64,

    /// Sensor blind zone; readings at or below are discarded
    #[arg(long, default_value_t = 4.0, value_name = "CM")]
    pub min_valid: f64,

    /// Physical tank height; readings at or above are discarded
    #[arg(long, default_value_t = 20.0, value_name = "CM")]
    pub tank_height: f64,

    /// Display units per centimeter of water
    #[arg(long, default_value_t = 10.0)]
    pub display_scale: f64,

    /// Samples kept in the history (0 keeps everything)
    #[arg(long, default_value_t = 1_000, value_name = "N")]
    pub history: usize,

    /// Samples shown on the live chart
    #[arg(long, default_value_t = 120, value_name = "N")]
    pub chart_window: usize,

    /// Frame queue capacity, dropping oldest when full (0 = unbounded)
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub queue_capacity: usize,

    /// Level table as LABEL:CM pairs, lowest first
    #[arg(long, value_name = "LABEL:CM,...")]
    pub levels: Option<String>,

    /// Log file (the terminal is taken by the UI)
    #[arg(long, default_value = "tankview.log", value_name = "PATH")]
    pub log_file: PathBuf,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    pub log_level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Source {
    /// Real device on a serial port
    Serial,
    /// In-process simulated device
    Simulate,
    /// No device; level buttons set the tank directly
    Manual,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DataBitsOpt {
    #[value(name = "7")]
    Seven,
    #[value(name = "8")]
    Eight,
}

impl From<DataBitsOpt> for serialport::DataBits {
    fn from(v: DataBitsOpt) -> Self {
        match v {
            DataBitsOpt::Seven => serialport::DataBits::Seven,
            DataBitsOpt::Eight => serialport::DataBits::Eight,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ParityOpt {
    None,
    Even,
    Odd,
}

impl From<ParityOpt> for serialport::Parity {
    fn from(v: ParityOpt) -> Self {
        match v {
            ParityOpt::None => serialport::Parity::None,
            ParityOpt::Even => serialport::Parity::Even,
            ParityOpt::Odd => serialport::Parity::Odd,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StopBitsOpt {
    #[value(name = "1")]
    One,
    #[value(name = "2")]
    Two,
}

impl From<StopBitsOpt> for serialport::StopBits {
    fn from(v: StopBitsOpt) -> Self {
        match v {
            StopBitsOpt::One => serialport::StopBits::One,
            StopBitsOpt::Two => serialport::StopBits::Two,
        }
    }
}

/// Serial line settings handed to the connector.
#[derive(Clone, Debug)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: serialport::DataBits,
    pub parity: serialport::Parity,
    pub stop_bits: serialport::StopBits,
    pub timeout: Duration,
}

/// Validated runtime configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub source: Source,
    pub serial: SerialSettings,
    pub timing: ReaderTiming,
    pub mapper: LevelMapper,
    pub levels: LevelTable,
    pub history_window: Option<usize>,
    pub chart_window: usize,
    pub queue_capacity: usize,
    pub log_file: PathBuf,
    pub log_level: String,
}

impl Cli {
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let mapper = LevelMapper::new(self.min_valid, self.tank_height, self.display_scale)?;
        let levels = match &self.levels {
            Some(text) => LevelTable::parse(text, &mapper)?,
            None => LevelTable::default_for(&mapper),
        };
        Ok(Config {
            source: self.source,
            serial: SerialSettings {
                port: self.port,
                baud_rate: self.baud,
                data_bits: self.data_bits.into(),
                parity: self.parity.into(),
                stop_bits: self.stop_bits.into(),
                timeout: Duration::from_millis(self.timeout_ms),
            },
            timing: ReaderTiming {
                poll_interval: Duration::from_millis(self.poll_ms),
                backoff: Duration::from_millis(self.backoff_ms),
            },
            mapper,
            levels,
            history_window: (self.history > 0).then_some(self.history),
            chart_window: self.chart_window.max(2),
            queue_capacity: self.queue_capacity,
            log_file: self.log_file,
            log_level: self.log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tankview").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_build_a_valid_config() {
        let cfg = parse(&[]).into_config().unwrap();
        assert_eq!(cfg.source, Source::Serial);
        assert_eq!(cfg.serial.port, "/dev/ttyACM0");
        assert_eq!(cfg.serial.baud_rate, 115_200);
        assert_eq!(cfg.serial.data_bits, serialport::DataBits::Eight);
        assert_eq!(cfg.serial.timeout, Duration::from_millis(100));
        assert_eq!(cfg.history_window, Some(1_000));
        assert_eq!(cfg.levels.len(), 5);
        assert_eq!(cfg.mapper.tank_height(), 20.0);
    }

    #[test]
    fn serial_options_map_to_serialport_types() {
        let cfg = parse(&[
            "--data-bits",
            "7",
            "--parity",
            "even",
            "--stop-bits",
            "2",
            "--history",
            "0",
        ])
        .into_config()
        .unwrap();
        assert_eq!(cfg.serial.data_bits, serialport::DataBits::Seven);
        assert_eq!(cfg.serial.parity, serialport::Parity::Even);
        assert_eq!(cfg.serial.stop_bits, serialport::StopBits::Two);
        assert_eq!(cfg.history_window, None);
    }

    #[test]
    fn invalid_geometry_is_rejected() {
        let err = parse(&["--min-valid", "30"]).into_config().unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidBounds {
                min: 30.0,
                max: 20.0
            }
        );
    }

    #[test]
    fn custom_levels_are_checked_against_usable_height() {
        let cfg = parse(&["--levels", "Off:0,On:12"]).into_config().unwrap();
        assert_eq!(cfg.levels.len(), 2);
        assert!(parse(&["--levels", "Off:0,On:17"]).into_config().is_err());
    }

    #[test]
    fn source_is_selectable() {
        assert_eq!(parse(&["--source", "simulate"]).source, Source::Simulate);
        assert_eq!(parse(&["--source", "manual"]).source, Source::Manual);
    }
}
