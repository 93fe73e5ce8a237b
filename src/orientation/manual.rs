//! Manual orientation driven by pointer drags.
//!
//! Used on desktops and whenever sensor access was denied: the caller feeds pointer deltas
//! and projects with the resulting heading and pitch. Pitch is clamped to
//! `[MANUAL_PITCH_MIN, MANUAL_PITCH_MAX]` so the view never flips over the zenith or nadir.

use serde::{Deserialize, Serialize};

use crate::angles::normalize360;
use crate::constants::{
    Degree, Pixel, DEFAULT_DRAG_SENSITIVITY, DEFAULT_HEADING, DEFAULT_PITCH, MANUAL_PITCH_MAX,
    MANUAL_PITCH_MIN,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManualOrientation {
    heading: Degree,
    pitch: Degree,
    sensitivity: f64,
}

impl Default for ManualOrientation {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualOrientation {
    /// Start facing north at the horizon.
    pub fn new() -> Self {
        ManualOrientation {
            heading: DEFAULT_HEADING,
            pitch: DEFAULT_PITCH,
            sensitivity: DEFAULT_DRAG_SENSITIVITY,
        }
    }

    /// Degrees of rotation per dragged pixel.
    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn heading(&self) -> Degree {
        self.heading
    }

    pub fn pitch(&self) -> Degree {
        self.pitch
    }

    /// Apply a pointer drag of `(dx, dy)` pixels.
    ///
    /// Dragging right turns the view left (the sky follows the pointer), dragging down tilts
    /// the view up.
    pub fn drag(&mut self, dx: Pixel, dy: Pixel) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.heading = normalize360(self.heading - dx * self.sensitivity);
        self.pitch = clamp_pitch(self.pitch + dy * self.sensitivity);
    }

    /// Jump to an explicit orientation, wrapping the heading and clamping the pitch.
    pub fn set(&mut self, heading: Degree, pitch: Degree) {
        if heading.is_finite() {
            self.heading = normalize360(heading);
        }
        if pitch.is_finite() {
            self.pitch = clamp_pitch(pitch);
        }
    }
}

fn clamp_pitch(pitch: Degree) -> Degree {
    pitch.clamp(MANUAL_PITCH_MIN, MANUAL_PITCH_MAX)
}
