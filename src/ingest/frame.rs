//! src/ingest/frame.rs
//!
//! Sensor frame validation and numeric extraction.
//!
//! The distance sensor prints one reading per line in the shape `DDD,D+cm`,
//! e.g. `013,5cm`. Validation and number extraction are two separate passes so
//! the shape check can be tested and swapped independently of unit handling.

use std::fmt;

use tracing::trace;

/// Unit label every frame must end with.
pub const UNIT_SUFFIX: &str = "cm";

/// Number of digits before the decimal comma.
const INTEGER_DIGITS: usize = 3;

/// A line that passed [`validate`]. Holds the original text unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SensorFrame(String);

impl SensorFrame {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SensorFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check a decoded, trimmed line against the `DDD,D+cm` frame shape.
///
/// Returns `None` for any deviation: wrong digit count, missing or different
/// separator, missing or different unit, or trailing characters.
pub fn validate(line: &str) -> Option<SensorFrame> {
    let body = line.strip_suffix(UNIT_SUFFIX)?;
    let (int_part, frac_part) = body.split_once(',')?;

    let ok = int_part.len() == INTEGER_DIGITS
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && !frac_part.is_empty()
        && frac_part.bytes().all(|b| b.is_ascii_digit());

    if ok {
        trace!(frame = line, "Accepted frame");
        Some(SensorFrame(line.to_string()))
    } else {
        None
    }
}

/// Parse the numeric payload of a validated frame, in centimeters.
///
/// The number field is everything in front of the unit suffix, with the decimal
/// comma normalized to a period. Returns `None` if that does not parse to a
/// finite value.
pub fn extract_value(frame: &SensorFrame) -> Option<f64> {
    let field = frame.as_str().strip_suffix(UNIT_SUFFIX)?;
    let normalized = field.replace(',', ".");
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}
