//! src/chart/view.rs
//!
//! Y-axis view state for the level chart: autoscale, smoothing, locking and the
//! expand-fast / shrink-slow hysteresis that keeps the axis from jittering.

/// Smoothing presets cycled by the `s` key (0.0 = frozen, 1.0 = instant).
pub const SMOOTHING_PRESETS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// Frames the data must sit comfortably inside the bounds before shrinking.
const SHRINK_CONFIRM_FRAMES: usize = 8;
/// Margin, as a fraction of the current range, that counts as comfortable.
const SHRINK_MARGIN_FRAC: f64 = 0.20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StabilizationState {
    Stable,
    Expanding,
    Shrinking,
}

impl StabilizationState {
    pub fn label(self) -> &'static str {
        match self {
            StabilizationState::Stable => "Stable",
            StabilizationState::Expanding => "Expanding",
            StabilizationState::Shrinking => "Shrinking",
        }
    }
}

#[derive(Debug)]
pub struct ChartView {
    /// Bounds used when autoscale is off or there is nothing to scale to.
    pub fallback: (f64, f64),
    pub autoscale: bool,
    pub smoothing: f64,
    pub locked_bounds: Option<(f64, f64)>,
    /// Bounds shown last frame; `None` until the first update.
    pub current_bounds: Option<(f64, f64)>,
    pub state: StabilizationState,
    stable_count: usize,
}

impl ChartView {
    pub fn new(fallback: (f64, f64), autoscale: bool, smoothing: f64) -> Self {
        Self {
            fallback,
            autoscale,
            smoothing: smoothing.clamp(0.0, 1.0),
            locked_bounds: None,
            current_bounds: None,
            state: StabilizationState::Stable,
            stable_count: 0,
        }
    }

    pub fn toggle_autoscale(&mut self) {
        self.autoscale = !self.autoscale;
        if self.autoscale {
            self.locked_bounds = None;
        }
    }

    pub fn cycle_smoothing(&mut self) {
        let idx = SMOOTHING_PRESETS
            .iter()
            .position(|&v| (v - self.smoothing).abs() < 1e-9)
            .unwrap_or(0);
        self.smoothing = SMOOTHING_PRESETS[(idx + 1) % SMOOTHING_PRESETS.len()];
    }

    /// Lock the current bounds, or unlock if already locked.
    pub fn toggle_lock(&mut self) {
        self.locked_bounds = match self.locked_bounds {
            Some(_) => None,
            None => self.current_bounds,
        };
    }

    /// Advance the view one frame for the visible `points` and return the
    /// y-bounds to draw.
    pub fn update(&mut self, points: &[(f64, f64)]) -> (f64, f64) {
        let target = if let Some(bounds) = self.locked_bounds {
            bounds
        } else if self.autoscale {
            target_bounds(points).unwrap_or(self.fallback)
        } else {
            self.fallback
        };

        let Some(mut current) = self.current_bounds else {
            self.current_bounds = Some(target);
            self.stable_count = 0;
            self.state = StabilizationState::Stable;
            return target;
        };

        if self.locked_bounds.is_some() {
            self.state = StabilizationState::Stable;
            self.current_bounds = Some(target);
            return target;
        }

        let (mn, mx) = y_range(points).unwrap_or(target);
        if mn < current.0 || mx > current.1 {
            // Expand quickly so no point is ever off-screen for long.
            self.state = StabilizationState::Expanding;
            self.stable_count = 0;
            current = interp_bounds(current, target, self.smoothing.max(0.5));
        } else {
            let range = (current.1 - current.0).abs().max(1e-9);
            let margin = SHRINK_MARGIN_FRAC * range;
            let comfortable = target.0 >= current.0 + margin && target.1 <= current.1 - margin;
            if comfortable {
                self.stable_count += 1;
                if self.stable_count >= SHRINK_CONFIRM_FRAMES {
                    self.state = StabilizationState::Shrinking;
                    current = interp_bounds(current, target, self.smoothing);
                } else {
                    self.state = StabilizationState::Stable;
                }
            } else {
                self.stable_count = 0;
                self.state = StabilizationState::Stable;
                if (self.smoothing - 1.0).abs() < f64::EPSILON {
                    current = target;
                }
            }
        }
        self.current_bounds = Some(current);
        current
    }
}

fn y_range(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut mn = f64::INFINITY;
    let mut mx = f64::NEG_INFINITY;
    for &(_, y) in points {
        mn = mn.min(y);
        mx = mx.max(y);
    }
    (mn.is_finite() && mx.is_finite()).then_some((mn, mx))
}

/// Padded bounds around the data: 10 % of the range, or 10 % of the magnitude
/// (at least 0.1) for flat data.
fn target_bounds(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let (mn, mx) = y_range(points)?;
    let pad = if (mx - mn).abs() < f64::EPSILON {
        mn.abs().max(1.0) * 0.1
    } else {
        (mx - mn) * 0.1
    };
    Some((mn - pad, mx + pad))
}

/// Move `current` toward `target` by `alpha` in `[0, 1]`.
fn interp_bounds(current: (f64, f64), target: (f64, f64), alpha: f64) -> (f64, f64) {
    let a = alpha.clamp(0.0, 1.0);
    (
        current.0 * (1.0 - a) + target.0 * a,
        current.1 * (1.0 - a) + target.1 * a,
    )
}
