//! Per-axis exponential smoothing of orientation samples.
//!
//! Heading is circular: the blend follows the shorter arc between the current and the
//! target heading, then wraps back into `[0, 360)`. Pitch and roll are blended linearly.

use crate::angles::{normalize360, shortest_delta};
use crate::constants::Degree;
use crate::orientation::OrientationSample;

/// Exponential smoother with a fixed weight on the incoming sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialSmoother {
    factor: f64,
}

impl ExponentialSmoother {
    /// `factor` is the weight of the new sample, expected in `(0, 1]`.
    pub fn new(factor: f64) -> Self {
        ExponentialSmoother { factor }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Move `current` toward `target` along the shorter arc.
    pub fn smooth_heading(&self, current: Degree, target: Degree) -> Degree {
        normalize360(current + self.factor * shortest_delta(current, target))
    }

    pub fn smooth_linear(&self, current: Degree, target: Degree) -> Degree {
        current + self.factor * (target - current)
    }

    /// Blend every axis of `target` into `current`.
    ///
    /// The absolute flag is taken from `target`.
    pub fn blend(&self, current: &OrientationSample, target: &OrientationSample) -> OrientationSample {
        OrientationSample {
            heading: self.smooth_heading(current.heading, target.heading),
            pitch: self.smooth_linear(current.pitch, target.pitch),
            roll: self.smooth_linear(current.roll, target.roll),
            is_absolute: target.is_absolute,
        }
    }
}
