//! src/tank/level.rs
//!
//! Plausibility filter and distance → fill conversion.
//!
//! The sensor sits at the top of the tank and reports the distance down to the
//! water surface, so a larger reading means less water.

use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelMapper {
    /// Smallest distance the sensor can report (its blind zone). Exclusive.
    min_valid: f64,
    /// Physical tank height; a reading at or beyond it is impossible. Exclusive.
    max_valid: f64,
    /// Display units per centimeter of water.
    display_scale: f64,
}

impl LevelMapper {
    pub fn new(min_valid: f64, max_valid: f64, display_scale: f64) -> Result<Self, ConfigError> {
        if !(min_valid.is_finite() && max_valid.is_finite() && min_valid < max_valid) {
            return Err(ConfigError::InvalidBounds {
                min: min_valid,
                max: max_valid,
            });
        }
        if !(display_scale.is_finite() && display_scale > 0.0) {
            return Err(ConfigError::InvalidScale(display_scale));
        }
        Ok(Self {
            min_valid,
            max_valid,
            display_scale,
        })
    }

    /// True if `distance` lies strictly inside `(min_valid, max_valid)`.
    pub fn is_plausible(&self, distance: f64) -> bool {
        distance > self.min_valid && distance < self.max_valid
    }

    /// Water column in display units for a sensor distance.
    pub fn fill_level(&self, distance: f64) -> f64 {
        (self.max_valid - distance) * self.display_scale
    }

    /// Water heights strictly below this map to plausible readings.
    pub fn usable_height(&self) -> f64 {
        self.max_valid - self.min_valid
    }

    /// Water column in centimeters for a sensor distance.
    pub fn water_height(&self, distance: f64) -> f64 {
        self.max_valid - distance
    }

    pub fn tank_height(&self) -> f64 {
        self.max_valid
    }

    pub fn display_scale(&self) -> f64 {
        self.display_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plausibility_bounds_are_exclusive() {
        let m = LevelMapper::new(4.0, 20.0, 1.0).unwrap();
        assert!(!m.is_plausible(3.9));
        assert!(!m.is_plausible(4.0));
        assert!(m.is_plausible(4.1));
        assert!(m.is_plausible(19.99));
        assert!(!m.is_plausible(20.0));
        assert!(!m.is_plausible(f64::NAN));
    }

    #[test]
    fn fill_is_height_minus_distance_scaled() {
        let m = LevelMapper::new(4.0, 20.0, 10.0).unwrap();
        assert_eq!(m.fill_level(5.0), 150.0);
        assert_eq!(m.water_height(5.0), 15.0);
        assert_eq!(m.usable_height(), 16.0);
    }

    #[test]
    fn rejects_inverted_bounds_and_bad_scale() {
        assert_eq!(
            LevelMapper::new(20.0, 4.0, 1.0),
            Err(ConfigError::InvalidBounds {
                min: 20.0,
                max: 4.0
            })
        );
        assert_eq!(
            LevelMapper::new(4.0, 20.0, 0.0),
            Err(ConfigError::InvalidScale(0.0))
        );
    }
}
