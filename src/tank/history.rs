//! src/tank/history.rs
//!
//! Consumer-side measurement history.
//!
//! Frames drained from the queue are parsed, range-checked and appended in
//! arrival order. The newest sample is the current level. When a window is
//! configured the oldest samples are evicted; retained samples keep their
//! original sequence numbers.

use std::collections::VecDeque;

use tracing::debug;

use super::level::LevelMapper;
use crate::ingest::SensorFrame;
use crate::ingest::frame::extract_value;

/// One accepted measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Arrival sequence number, starting at 0. Gaps never occur; eviction does
    /// not renumber.
    pub seq: u64,
    /// Sensor distance in centimeters.
    pub distance_cm: f64,
}

/// Outcome of [`MeasurementHistory::ingest`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Ingest {
    Accepted(Sample),
    /// Passed validation but the number field did not parse.
    Unparseable,
    /// Parsed, but outside the plausible range.
    Implausible(f64),
}

#[derive(Debug)]
pub struct MeasurementHistory {
    samples: VecDeque<Sample>,
    /// Maximum retained samples; `None` keeps everything.
    window: Option<usize>,
    mapper: LevelMapper,
    next_seq: u64,
    unparseable: u64,
    implausible: u64,
}

impl MeasurementHistory {
    pub fn new(mapper: LevelMapper, window: Option<usize>) -> Self {
        Self {
            samples: VecDeque::new(),
            window: window.map(|w| w.max(1)),
            mapper,
            next_seq: 0,
            unparseable: 0,
            implausible: 0,
        }
    }

    /// Parse, filter and append one frame.
    pub fn ingest(&mut self, frame: &SensorFrame) -> Ingest {
        let Some(distance) = extract_value(frame) else {
            self.unparseable += 1;
            debug!(frame = %frame, "Discarding unparseable frame");
            return Ingest::Unparseable;
        };
        if !self.mapper.is_plausible(distance) {
            self.implausible += 1;
            debug!(distance, "Discarding implausible reading");
            return Ingest::Implausible(distance);
        }
        Ingest::Accepted(self.push(distance))
    }

    fn push(&mut self, distance_cm: f64) -> Sample {
        let sample = Sample {
            seq: self.next_seq,
            distance_cm,
        };
        self.next_seq += 1;
        self.samples.push_back(sample);
        if let Some(window) = self.window {
            while self.samples.len() > window {
                self.samples.pop_front();
            }
        }
        sample
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Fill level of the newest sample in display units; `None` before the
    /// first accepted sample.
    pub fn current_fill_level(&self) -> Option<f64> {
        self.last().map(|s| self.mapper.fill_level(s.distance_cm))
    }

    /// Owned copy of the retained samples, oldest first.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    /// Minimum, maximum and newest water height in centimeters over the
    /// retained samples.
    pub fn stats(&self) -> Option<(f64, f64, f64)> {
        let last = self.last()?;
        let (mn, mx) = self.samples.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(mn, mx), s| {
                let water = self.mapper.water_height(s.distance_cm);
                (mn.min(water), mx.max(water))
            },
        );
        Some((mn, mx, self.mapper.water_height(last.distance_cm)))
    }

    /// Newest `n` samples as `(seq, water height in cm)` chart points.
    pub fn chart_points(&self, n: usize) -> Vec<(f64, f64)> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples
            .iter()
            .skip(skip)
            .map(|s| (s.seq as f64, self.mapper.water_height(s.distance_cm)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn mapper(&self) -> &LevelMapper {
        &self.mapper
    }

    /// Frames that passed validation but whose number did not parse.
    pub fn unparseable(&self) -> u64 {
        self.unparseable
    }

    /// Readings dropped by the plausibility filter.
    pub fn implausible(&self) -> u64 {
        self.implausible
    }
}
