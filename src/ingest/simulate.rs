//! src/ingest/simulate.rs
//!
//! In-process stand-in for the sensor device.
//!
//! The simulated device answers level commands by moving its water level toward
//! the commanded height and reports the sensor-to-surface distance once per
//! period, in the same `DDD,Dcm` line format as the real hardware. A small share
//! of lines is deliberately broken or out of range so every rejection path shows
//! up in the counters.

use std::io::{self, ErrorKind, Read, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::link::{Connect, Link};
use crate::error::LinkError;
use crate::tank::command::LevelTable;

/// Probability that a line is malformed.
const GARBAGE_RATE: f64 = 0.03;
/// Probability that a well-formed line carries an impossible distance.
const SPIKE_RATE: f64 = 0.02;
/// Fraction of the remaining gap closed per period.
const FILL_RATE: f64 = 0.08;
/// Sensor noise amplitude in cm.
const NOISE_CM: f64 = 0.15;

struct DeviceState {
    water_cm: f64,
    target_cm: f64,
}

/// Connector producing simulated links that share one device state.
pub struct SimulatedConnect {
    state: Arc<Mutex<DeviceState>>,
    levels: LevelTable,
    tank_height: f64,
    period: Duration,
}

impl SimulatedConnect {
    /// The device starts resting at the lowest level of `levels`.
    pub fn new(levels: LevelTable, tank_height: f64, period: Duration) -> Self {
        let start = levels.get(0).map_or(0.0, |l| l.centimeters);
        let state = DeviceState {
            water_cm: start,
            target_cm: start,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            levels,
            tank_height,
            period,
        }
    }
}

impl Connect for SimulatedConnect {
    fn connect(&mut self) -> Result<Link, LinkError> {
        debug!("Simulated device attached");
        let reader = SimReader {
            state: self.state.clone(),
            rng: StdRng::from_rng(&mut rand::rng()),
            tank_height: self.tank_height,
            period: self.period,
            pending: Vec::new(),
        };
        let writer = SimWriter {
            state: self.state.clone(),
            levels: self.levels.clone(),
        };
        Ok(Link {
            reader: Box::new(reader),
            writer: Some(Box::new(writer)),
            description: "simulated device".into(),
        })
    }
}

struct SimReader {
    state: Arc<Mutex<DeviceState>>,
    rng: StdRng,
    tank_height: f64,
    period: Duration,
    pending: Vec<u8>,
}

impl SimReader {
    fn next_line(&mut self) -> String {
        let water = {
            let mut s = self.state.lock().unwrap_or_else(|p| p.into_inner());
            s.water_cm += (s.target_cm - s.water_cm) * FILL_RATE;
            s.water_cm
        };

        if self.rng.random_bool(GARBAGE_RATE) {
            return match self.rng.random_range(0..3) {
                0 => "ERR".to_string(),
                1 => "13,5cm".to_string(),
                _ => "013.5cm".to_string(),
            };
        }

        let distance = if self.rng.random_bool(SPIKE_RATE) {
            self.tank_height + self.rng.random_range(1.0..10.0)
        } else {
            let noise = self.rng.random_range(-NOISE_CM..NOISE_CM);
            (self.tank_height - water + noise).max(0.0)
        };
        format_frame(distance)
    }
}

/// Render a distance the way the sensor prints it, e.g. `013,5cm`.
pub fn format_frame(distance_cm: f64) -> String {
    let clamped = distance_cm.clamp(0.0, 999.9);
    format!("{:05.1}cm", clamped).replace('.', ",")
}

impl Read for SimReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            thread::sleep(self.period);
            let line = self.next_line();
            self.pending.extend_from_slice(line.as_bytes());
            self.pending.extend_from_slice(b"\r\n");
        }
        if buf.is_empty() {
            return Err(ErrorKind::WouldBlock.into());
        }
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

struct SimWriter {
    state: Arc<Mutex<DeviceState>>,
    levels: LevelTable,
}

impl Write for SimWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &byte in buf {
            if let Some(level) = self.levels.by_command(byte) {
                let mut s = self.state.lock().unwrap_or_else(|p| p.into_inner());
                s.target_cm = level.centimeters;
                debug!(label = %level.label, target = level.centimeters, "Simulated device retargeted");
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
