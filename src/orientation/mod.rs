//! # Device orientation: boundary normalization and estimation
//!
//! Platform orientation events come in several shapes. Some platforms report a generic
//! heading that is relative to an arbitrary start direction, some flag it as absolute
//! (referenced to true north), some add a dedicated compass field, and one convention
//! counts the heading counter-clockwise. This module turns every such event into one
//! canonical [`OrientationSample`] tagged with its [`OrientationSource`], before anything
//! reaches the smoothing logic of the [`OrientationEstimator`](crate::orientation::estimator::OrientationEstimator).
//!
//! ## Canonical convention
//!
//! - **Heading**: degrees in `[0, 360)`, clockwise from true north (compass bearing).
//! - **Pitch**: degrees of forward tilt; `90` means the device is upright and the rear
//!   camera looks at the horizon.
//! - **Roll**: degrees, linear, not used by the projection.
//!
//! ## Normalization rules
//!
//! 1. A `compass_heading` field wins over the generic `heading` field and is always absolute.
//! 2. Otherwise the generic `heading` is absolute only when the event says so.
//! 3. [`HeadingConvention::CounterClockwise`] headings are converted with `360 - raw`.
//! 4. An event without a usable heading is malformed and dropped.
//!
//! ```text
//! RawOrientationEvent ──normalize──▶ (OrientationSource, OrientationSample) ──▶ estimator
//!        │                                       │
//!        └── null / non-finite heading ──▶ None  └── AbsoluteCompass | RelativeGyro
//! ```
//!
//! ## See also
//! ------------
//! * [`estimator`] – Source arbitration state machine, smoothing and permission gating.
//! * [`smoothing`] – Per-axis exponential smoothing with heading wraparound.
//! * [`manual`] – Pointer-drag orientation used when no sensor is available.

pub mod estimator;
pub mod manual;
pub mod smoothing;

use serde::{Deserialize, Serialize};

use crate::angles::normalize360;
use crate::constants::{Degree, DEFAULT_PITCH, DEFAULT_ROLL};

/// Direction in which a platform counts its generic heading field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HeadingConvention {
    /// Compass bearing, clockwise from north. This is the canonical convention.
    #[default]
    Clockwise,
    /// Counter-clockwise from north, converted with `360 - raw`.
    CounterClockwise,
}

/// Kind of sensor that produced a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrientationSource {
    /// Heading referenced to true north.
    AbsoluteCompass,
    /// Heading referenced to an arbitrary start direction.
    RelativeGyro,
}

impl OrientationSource {
    pub fn is_absolute(&self) -> bool {
        matches!(self, OrientationSource::AbsoluteCompass)
    }
}

/// A raw orientation event as delivered by the platform.
///
/// Every angle is optional because platforms routinely deliver events with null fields
/// (sensor warming up, permission not yet effective).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RawOrientationEvent {
    /// Generic heading field, in the platform's [`HeadingConvention`].
    pub heading: Option<Degree>,
    /// Forward tilt.
    pub pitch: Option<Degree>,
    /// Sideways tilt.
    pub roll: Option<Degree>,
    /// Whether the platform declares the generic heading as referenced to true north.
    pub absolute: Option<bool>,
    /// Platform specific true compass heading, clockwise from north. Overrides `heading`.
    pub compass_heading: Option<Degree>,
    /// How the generic heading field is counted.
    pub convention: HeadingConvention,
}

impl RawOrientationEvent {
    /// Event from a sensor that only knows its heading relative to its start direction.
    pub fn relative(heading: Degree, pitch: Degree, roll: Degree) -> Self {
        RawOrientationEvent {
            heading: Some(heading),
            pitch: Some(pitch),
            roll: Some(roll),
            absolute: Some(false),
            ..Default::default()
        }
    }

    /// Event whose generic heading is flagged as referenced to true north.
    pub fn absolute(heading: Degree, pitch: Degree, roll: Degree) -> Self {
        RawOrientationEvent {
            heading: Some(heading),
            pitch: Some(pitch),
            roll: Some(roll),
            absolute: Some(true),
            ..Default::default()
        }
    }

    /// Event carrying a dedicated compass heading next to the generic one.
    pub fn with_compass_heading(mut self, compass_heading: Degree) -> Self {
        self.compass_heading = Some(compass_heading);
        self
    }

    pub fn with_convention(mut self, convention: HeadingConvention) -> Self {
        self.convention = convention;
        self
    }

    /// Normalize this event into the canonical sample and its source kind.
    ///
    /// Missing pitch or roll fields are filled from `previous` when available, otherwise
    /// from the default upright orientation.
    ///
    /// Arguments
    /// -----------------
    /// * `previous`: the last smoothed sample, used to fill missing linear axes.
    ///
    /// Return
    /// ----------
    /// * `Some((source, sample))` with a heading in `[0, 360)`, or `None` when the event
    ///   carries no finite heading at all.
    pub fn normalize(
        &self,
        previous: Option<&OrientationSample>,
    ) -> Option<(OrientationSource, OrientationSample)> {
        let compass = self.compass_heading.filter(|h| h.is_finite());
        let generic = self.heading.filter(|h| h.is_finite());

        let (source, heading) = match (compass, generic) {
            (Some(h), _) => (OrientationSource::AbsoluteCompass, h),
            (None, Some(raw)) => {
                let h = match self.convention {
                    HeadingConvention::Clockwise => raw,
                    HeadingConvention::CounterClockwise => 360.0 - raw,
                };
                let source = if self.absolute == Some(true) {
                    OrientationSource::AbsoluteCompass
                } else {
                    OrientationSource::RelativeGyro
                };
                (source, h)
            }
            (None, None) => return None,
        };

        let pitch = self
            .pitch
            .filter(|p| p.is_finite())
            .or(previous.map(|s| s.pitch))
            .unwrap_or(DEFAULT_PITCH);
        let roll = self
            .roll
            .filter(|r| r.is_finite())
            .or(previous.map(|s| s.roll))
            .unwrap_or(DEFAULT_ROLL);

        Some((
            source,
            OrientationSample {
                heading: normalize360(heading),
                pitch,
                roll,
                is_absolute: source.is_absolute(),
            },
        ))
    }
}

/// One coherent device orientation, in the canonical convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationSample {
    /// Compass bearing in `[0, 360)`.
    pub heading: Degree,
    /// Forward tilt, `90` at the horizon.
    pub pitch: Degree,
    pub roll: Degree,
    /// True when the heading is referenced to true north.
    pub is_absolute: bool,
}

impl OrientationSample {
    /// Altitude the rear camera axis points at.
    pub fn look_altitude(&self) -> Degree {
        self.pitch - 90.0
    }
}

#[cfg(test)]
mod orientation_test {
    use super::*;

    #[test]
    fn test_relative_event() {
        let (source, sample) = RawOrientationEvent::relative(45.0, 80.0, 2.0)
            .normalize(None)
            .unwrap();
        assert_eq!(source, OrientationSource::RelativeGyro);
        assert_eq!(sample.heading, 45.0);
        assert_eq!(sample.pitch, 80.0);
        assert_eq!(sample.roll, 2.0);
        assert!(!sample.is_absolute);
    }

    #[test]
    fn test_compass_heading_wins() {
        let event = RawOrientationEvent::relative(10.0, 90.0, 0.0).with_compass_heading(200.0);
        let (source, sample) = event.normalize(None).unwrap();
        assert_eq!(source, OrientationSource::AbsoluteCompass);
        assert_eq!(sample.heading, 200.0);
        assert!(sample.is_absolute);
    }

    #[test]
    fn test_counter_clockwise_convention() {
        let event = RawOrientationEvent::absolute(90.0, 90.0, 0.0)
            .with_convention(HeadingConvention::CounterClockwise);
        let (_, sample) = event.normalize(None).unwrap();
        assert_eq!(sample.heading, 270.0);

        let event = RawOrientationEvent::absolute(0.0, 90.0, 0.0)
            .with_convention(HeadingConvention::CounterClockwise);
        let (_, sample) = event.normalize(None).unwrap();
        assert_eq!(sample.heading, 0.0);
    }

    #[test]
    fn test_null_heading_dropped() {
        let event = RawOrientationEvent {
            pitch: Some(90.0),
            ..Default::default()
        };
        assert!(event.normalize(None).is_none());

        let event = RawOrientationEvent {
            heading: Some(f64::NAN),
            ..Default::default()
        };
        assert!(event.normalize(None).is_none());
    }

    #[test]
    fn test_missing_axes_use_previous() {
        let previous = OrientationSample {
            heading: 12.0,
            pitch: 70.0,
            roll: -3.0,
            is_absolute: false,
        };
        let event = RawOrientationEvent {
            heading: Some(20.0),
            ..Default::default()
        };
        let (_, sample) = event.normalize(Some(&previous)).unwrap();
        assert_eq!(sample.pitch, 70.0);
        assert_eq!(sample.roll, -3.0);

        let (_, sample) = event.normalize(None).unwrap();
        assert_eq!(sample.pitch, DEFAULT_PITCH);
        assert_eq!(sample.roll, DEFAULT_ROLL);
    }

    #[test]
    fn test_look_altitude() {
        let sample = OrientationSample {
            heading: 0.0,
            pitch: 90.0,
            roll: 0.0,
            is_absolute: true,
        };
        assert_eq!(sample.look_altitude(), 0.0);
    }
}
