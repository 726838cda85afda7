//! src/tank/command.rs
//!
//! Ordered level table: the labels offered to the user, the water height each
//! one stands for, and the single ASCII digit sent to the device to request it.

use std::collections::HashSet;

use super::level::LevelMapper;
use crate::error::ConfigError;

/// Labels of the default table, lowest first.
const DEFAULT_LABELS: [&str; 5] = ["Empty", "Low", "Medium", "High", "Full"];
/// Inset of the default table from both ends of the usable height, as a
/// fraction of it. Both plausibility bounds are exclusive.
const DEFAULT_INSET: f64 = 0.05;

/// One selectable level.
#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    pub label: String,
    /// Water height in centimeters.
    pub centimeters: f64,
    /// ASCII digit written to the device.
    pub command: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LevelTable {
    levels: Vec<Level>,
}

impl LevelTable {
    /// Build a table from `(label, centimeters)` pairs. Command digits follow
    /// the order given: the first entry is `'0'`. Every level must be a water
    /// height the sensor can report, `0 <= cm < mapper.usable_height()`.
    pub fn new(entries: Vec<(String, f64)>, mapper: &LevelMapper) -> Result<Self, ConfigError> {
        let usable = mapper.usable_height();
        if entries.is_empty() {
            return Err(ConfigError::EmptyLevels);
        }
        if entries.len() > 10 {
            return Err(ConfigError::TooManyLevels(entries.len()));
        }
        let mut seen = HashSet::new();
        let mut levels = Vec::with_capacity(entries.len());
        for (i, (label, centimeters)) in entries.into_iter().enumerate() {
            if !seen.insert(label.clone()) {
                return Err(ConfigError::DuplicateLevel(label));
            }
            if !(0.0..usable).contains(&centimeters) {
                return Err(ConfigError::LevelOutOfRange {
                    label,
                    value: centimeters,
                    max: usable,
                });
            }
            levels.push(Level {
                label,
                centimeters,
                command: b'0' + i as u8,
            });
        }
        Ok(Self { levels })
    }

    /// Empty, Low, Medium, High and Full spread evenly over the usable height,
    /// kept clear of the blind zone and the tank floor.
    pub fn default_for(mapper: &LevelMapper) -> Self {
        let usable = mapper.usable_height();
        let lo = usable * DEFAULT_INSET;
        let hi = usable - lo;
        let last = (DEFAULT_LABELS.len() - 1) as f64;
        let levels = DEFAULT_LABELS
            .iter()
            .enumerate()
            .map(|(i, label)| Level {
                label: label.to_string(),
                centimeters: lo + (hi - lo) * i as f64 / last,
                command: b'0' + i as u8,
            })
            .collect();
        Self { levels }
    }

    /// Parse `LABEL:CM,LABEL:CM,...`.
    pub fn parse(text: &str, mapper: &LevelMapper) -> Result<Self, ConfigError> {
        let entries = text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|entry| {
                let (label, value) = entry
                    .split_once(':')
                    .ok_or_else(|| ConfigError::MalformedLevel(entry.to_string()))?;
                let label = label.trim();
                let value = value
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| ConfigError::MalformedLevel(entry.to_string()))?;
                if label.is_empty() {
                    return Err(ConfigError::MalformedLevel(entry.to_string()));
                }
                Ok((label.to_string(), value))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(entries, mapper)
    }

    pub fn get(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    pub fn by_command(&self, command: u8) -> Option<&Level> {
        self.levels.iter().find(|l| l.command == command)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Level> {
        self.levels.iter()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> LevelMapper {
        LevelMapper::new(4.0, 20.0, 10.0).unwrap()
    }

    #[test]
    fn default_table_spreads_over_usable_height() {
        let t = LevelTable::default_for(&mapper());
        let labels: Vec<(&str, u8)> = t.iter().map(|l| (l.label.as_str(), l.command)).collect();
        assert_eq!(
            labels,
            vec![
                ("Empty", b'0'),
                ("Low", b'1'),
                ("Medium", b'2'),
                ("High", b'3'),
                ("Full", b'4'),
            ]
        );
        let cm: Vec<f64> = t.iter().map(|l| l.centimeters).collect();
        assert!(cm.windows(2).all(|w| w[0] < w[1]));
        assert!((cm[2] - 8.0).abs() < 1e-9, "medium at {}", cm[2]);
    }

    #[test]
    fn every_default_level_is_a_plausible_reading() {
        let m = mapper();
        for level in LevelTable::default_for(&m).iter() {
            let distance = m.tank_height() - level.centimeters;
            assert!(
                m.is_plausible(distance),
                "{} at {} cm reads {distance} cm",
                level.label,
                level.centimeters
            );
        }
    }

    #[test]
    fn parses_custom_table() {
        let t = LevelTable::parse("Dry:0, Half:8.5 ,Brim:15", &mapper()).unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.get(1).unwrap().label, "Half");
        assert_eq!(t.get(1).unwrap().centimeters, 8.5);
        assert_eq!(t.by_command(b'2').unwrap().label, "Brim");
        assert!(t.by_command(b'3').is_none());
    }

    #[test]
    fn rejects_levels_in_the_blind_zone() {
        assert_eq!(
            LevelTable::parse("Brim:16", &mapper()),
            Err(ConfigError::LevelOutOfRange {
                label: "Brim".into(),
                value: 16.0,
                max: 16.0
            })
        );
        assert!(matches!(
            LevelTable::parse("Below:-1", &mapper()),
            Err(ConfigError::LevelOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_bad_tables() {
        let m = mapper();
        assert_eq!(LevelTable::parse("", &m), Err(ConfigError::EmptyLevels));
        assert_eq!(
            LevelTable::parse("A:1,A:2", &m),
            Err(ConfigError::DuplicateLevel("A".into()))
        );
        assert!(matches!(
            LevelTable::parse("A:1,B:25", &m),
            Err(ConfigError::LevelOutOfRange { .. })
        ));
        assert_eq!(
            LevelTable::parse("A=1", &m),
            Err(ConfigError::MalformedLevel("A=1".into()))
        );
        assert_eq!(
            LevelTable::parse("A:x", &m),
            Err(ConfigError::MalformedLevel("A:x".into()))
        );
        let eleven: Vec<String> = (0..11).map(|i| format!("L{i}:1")).collect();
        assert_eq!(
            LevelTable::parse(&eleven.join(","), &m),
            Err(ConfigError::TooManyLevels(11))
        );
    }
}
