//! # Orientation estimator
//!
//! This module defines [`OrientationEstimator`], the owner of the only mutable state of the
//! pipeline: the smoothed orientation accumulator. It ingests an unordered stream of
//! [`RawOrientationEvent`]s and exposes a single stable [`OrientationReading`].
//!
//! ## Source arbitration
//!
//! Absolute (true-north referenced) sources are preferred over relative ones and the
//! preference is **sticky**: once an absolute sample has been accepted, relative samples are
//! ignored for the rest of the session, even if the absolute stream stalls.
//!
//! ```text
//!                 relative                      absolute
//! Uninitialized ───────────▶ RelativeActive ─────────────▶ AbsoluteActive  (terminal)
//!       │                        ▲    │ relative (smoothed)       ▲    │ absolute (smoothed)
//!       │                        └────┘                           └────┘ relative (ignored)
//!       └──────────────────────── absolute ──────────────────────▶
//! ```
//!
//! The smoothed sample lives inside the state variant, so the terminal state cannot be left
//! by accident: [`EstimatorState::transition`] is the only place states change.
//!
//! ## Permission gating
//!
//! Platforms that require explicit consent start in [`PermissionState::NotRequested`].
//! Until [`OrientationEstimator::grant`] is called the estimator reports itself unsupported
//! and refuses events; callers fall back to a [`ManualOrientation`] or to the default
//! orientation (north, horizon). A denial is permanent for the session.
//!
//! ## Example
//!
//! ```rust
//! use skylens::orientation::estimator::{EstimatorParams, OrientationEstimator};
//! use skylens::orientation::RawOrientationEvent;
//!
//! let params = EstimatorParams::builder().smoothing_factor(0.3).build().unwrap();
//! let mut estimator = OrientationEstimator::new(params);
//!
//! estimator.ingest(&RawOrientationEvent::absolute(90.0, 90.0, 0.0));
//! let reading = estimator.reading();
//! assert!(reading.sample.unwrap().is_absolute);
//! ```

use std::cmp::Ordering::{Equal, Greater, Less};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{Degree, DEFAULT_HEADING, DEFAULT_PITCH, DEFAULT_SMOOTHING_FACTOR};
use crate::orientation::manual::ManualOrientation;
use crate::orientation::smoothing::ExponentialSmoother;
use crate::orientation::{OrientationSample, OrientationSource, RawOrientationEvent};
use crate::skylens_errors::SkylensError;

/// Configuration of an [`OrientationEstimator`].
///
/// Fields
/// -----------------
/// * `smoothing_factor` – weight of a new sample in the exponential smoother, in `(0, 1]`.
///   `1.0` disables smoothing.
/// * `requires_permission` – the platform needs an explicit user grant before sensor events
///   may be consumed.
/// * `sensor_available` – the platform exposes orientation events at all (false on most
///   desktops).
///
/// Defaults
/// -----------------
/// * `smoothing_factor`: 0.3
/// * `requires_permission`: false
/// * `sensor_available`: true
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorParams {
    pub smoothing_factor: f64,
    pub requires_permission: bool,
    pub sensor_available: bool,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        EstimatorParams {
            smoothing_factor: DEFAULT_SMOOTHING_FACTOR,
            requires_permission: false,
            sensor_available: true,
        }
    }
}

impl EstimatorParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> EstimatorParamsBuilder {
        EstimatorParamsBuilder::new()
    }
}

/// Builder for [`EstimatorParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct EstimatorParamsBuilder {
    params: EstimatorParams,
}

impl EstimatorParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: EstimatorParams::default(),
        }
    }

    pub fn smoothing_factor(mut self, v: f64) -> Self {
        self.params.smoothing_factor = v;
        self
    }
    pub fn requires_permission(mut self, v: bool) -> Self {
        self.params.requires_permission = v;
        self
    }
    pub fn sensor_available(mut self, v: bool) -> Self {
        self.params.sensor_available = v;
        self
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `0.0 < smoothing_factor ≤ 1.0` (NaN rejected).
    pub fn build(self) -> Result<EstimatorParams, SkylensError> {
        let alpha = self.params.smoothing_factor;
        let positive = alpha.partial_cmp(&0.0) == Some(Greater);
        let at_most_one = matches!(alpha.partial_cmp(&1.0), Some(Less) | Some(Equal));
        if !(positive && at_most_one) {
            return Err(SkylensError::InvalidEstimatorParameter(
                "smoothing_factor must be in (0, 1]".into(),
            ));
        }
        Ok(self.params)
    }
}

impl fmt::Display for EstimatorParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Orientation Estimator Parameters")?;
            writeln!(f, "--------------------------------")?;
            writeln!(f, "  smoothing_factor    = {:.3}", self.smoothing_factor)?;
            writeln!(f, "  requires_permission = {}", self.requires_permission)?;
            writeln!(f, "  sensor_available    = {}", self.sensor_available)
        } else {
            write!(
                f,
                "EstimatorParams(smoothing_factor={:.2}, requires_permission={}, sensor_available={})",
                self.smoothing_factor, self.requires_permission, self.sensor_available
            )
        }
    }
}

/// Sensor permission lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionState {
    NotRequested,
    Pending,
    Granted,
    /// Permanent for the session.
    Denied,
}

/// Source arbitration state, carrying the smoothing accumulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EstimatorState {
    Uninitialized,
    RelativeActive { smoothed: OrientationSample },
    /// Terminal for the session.
    AbsoluteActive { smoothed: OrientationSample },
}

/// Discriminant of [`EstimatorState`], cheap to copy into readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimatorStateKind {
    Uninitialized,
    RelativeActive,
    AbsoluteActive,
}

/// What happened to one ingested event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The sample updated the estimate.
    Accepted,
    /// A relative sample arrived after the absolute lock was taken.
    IgnoredRelative,
    /// The event carried no usable heading.
    Dropped,
    /// Sensor access is not granted (or the platform has no sensor).
    NotPermitted,
}

impl EstimatorState {
    pub fn kind(&self) -> EstimatorStateKind {
        match self {
            EstimatorState::Uninitialized => EstimatorStateKind::Uninitialized,
            EstimatorState::RelativeActive { .. } => EstimatorStateKind::RelativeActive,
            EstimatorState::AbsoluteActive { .. } => EstimatorStateKind::AbsoluteActive,
        }
    }

    pub fn smoothed(&self) -> Option<&OrientationSample> {
        match self {
            EstimatorState::Uninitialized => None,
            EstimatorState::RelativeActive { smoothed }
            | EstimatorState::AbsoluteActive { smoothed } => Some(smoothed),
        }
    }

    /// Apply one normalized sample and return the next state.
    ///
    /// The first sample of a reference frame seeds the accumulator directly, including the
    /// switch from a relative to an absolute frame: the two headings do not share an origin.
    pub fn transition(
        self,
        source: OrientationSource,
        sample: OrientationSample,
        smoother: &ExponentialSmoother,
    ) -> (EstimatorState, IngestOutcome) {
        use EstimatorState::*;
        use OrientationSource::*;

        match (self, source) {
            (Uninitialized, RelativeGyro) => {
                log::debug!("first relative orientation sample, entering RelativeActive");
                (RelativeActive { smoothed: sample }, IngestOutcome::Accepted)
            }
            (Uninitialized, AbsoluteCompass) | (RelativeActive { .. }, AbsoluteCompass) => {
                log::info!("absolute orientation source acquired, locking AbsoluteActive");
                (AbsoluteActive { smoothed: sample }, IngestOutcome::Accepted)
            }
            (RelativeActive { smoothed }, RelativeGyro) => (
                RelativeActive {
                    smoothed: smoother.blend(&smoothed, &sample),
                },
                IngestOutcome::Accepted,
            ),
            (AbsoluteActive { smoothed }, AbsoluteCompass) => (
                AbsoluteActive {
                    smoothed: smoother.blend(&smoothed, &sample),
                },
                IngestOutcome::Accepted,
            ),
            (state @ AbsoluteActive { .. }, RelativeGyro) => {
                log::trace!("relative orientation sample ignored under absolute lock");
                (state, IngestOutcome::IgnoredRelative)
            }
        }
    }
}

/// Snapshot of the estimator read by the composer at render time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationReading {
    /// Smoothed orientation, absent until a first sample is accepted.
    pub sample: Option<OrientationSample>,
    /// Sensor data can currently flow (available and permitted).
    pub supported: bool,
    pub permission: PermissionState,
    pub state: EstimatorStateKind,
}

impl OrientationReading {
    pub fn heading(&self) -> Option<Degree> {
        self.sample.map(|s| s.heading)
    }

    pub fn pitch(&self) -> Option<Degree> {
        self.sample.map(|s| s.pitch)
    }

    pub fn is_absolute(&self) -> bool {
        self.sample.map(|s| s.is_absolute).unwrap_or(false)
    }

    /// Heading and pitch to project with.
    ///
    /// The sensor estimate wins; without one the manual orientation is used when given,
    /// and the default orientation (north, horizon) otherwise.
    pub fn effective_orientation(&self, manual: Option<&ManualOrientation>) -> (Degree, Degree) {
        match (self.sample, manual) {
            (Some(s), _) => (s.heading, s.pitch),
            (None, Some(m)) => (m.heading(), m.pitch()),
            (None, None) => (DEFAULT_HEADING, DEFAULT_PITCH),
        }
    }
}

/// Owned, per-session orientation estimator.
#[derive(Debug, Clone)]
pub struct OrientationEstimator {
    params: EstimatorParams,
    smoother: ExponentialSmoother,
    state: EstimatorState,
    permission: PermissionState,
}

impl OrientationEstimator {
    pub fn new(params: EstimatorParams) -> Self {
        let permission = if params.requires_permission {
            PermissionState::NotRequested
        } else {
            PermissionState::Granted
        };
        OrientationEstimator {
            smoother: ExponentialSmoother::new(params.smoothing_factor),
            params,
            state: EstimatorState::Uninitialized,
            permission,
        }
    }

    pub fn params(&self) -> &EstimatorParams {
        &self.params
    }

    pub fn state(&self) -> &EstimatorState {
        &self.state
    }

    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    /// True when events can currently be consumed.
    pub fn is_supported(&self) -> bool {
        self.params.sensor_available && self.permission == PermissionState::Granted
    }

    pub fn is_absolute(&self) -> bool {
        self.state.kind() == EstimatorStateKind::AbsoluteActive
    }

    /// Mark a permission request as in flight.
    pub fn request_pending(&mut self) {
        if self.permission == PermissionState::NotRequested {
            self.permission = PermissionState::Pending;
        }
    }

    /// Record a granted permission. A previous denial is not overturned.
    pub fn grant(&mut self) {
        if self.permission == PermissionState::Denied {
            log::warn!("ignoring sensor permission grant after denial");
            return;
        }
        log::info!("sensor permission granted");
        self.permission = PermissionState::Granted;
    }

    /// Record a refused or failed permission request.
    pub fn deny(&mut self) {
        log::warn!("sensor permission not granted, manual orientation required");
        self.permission = PermissionState::Denied;
    }

    /// Feed one raw platform event.
    ///
    /// Arguments
    /// -----------------
    /// * `event`: the raw event, in any platform shape.
    ///
    /// Return
    /// ----------
    /// * The [`IngestOutcome`]; none of the outcomes is an error, rejected events simply
    ///   leave the previous estimate untouched.
    pub fn ingest(&mut self, event: &RawOrientationEvent) -> IngestOutcome {
        if !self.is_supported() {
            return IngestOutcome::NotPermitted;
        }

        let Some((source, sample)) = event.normalize(self.state.smoothed()) else {
            log::trace!("dropping orientation event without heading: {event:?}");
            return IngestOutcome::Dropped;
        };

        let (next, outcome) = self.state.transition(source, sample, &self.smoother);
        self.state = next;
        outcome
    }

    /// Current smoothed sample.
    pub fn sample(&self) -> Option<OrientationSample> {
        self.state.smoothed().copied()
    }

    pub fn reading(&self) -> OrientationReading {
        OrientationReading {
            sample: self.sample(),
            supported: self.is_supported(),
            permission: self.permission,
            state: self.state.kind(),
        }
    }

    /// Start a new session: forget the estimate and the absolute lock.
    ///
    /// Permission state is kept, it belongs to the platform and not to the session.
    pub fn reset(&mut self) {
        self.state = EstimatorState::Uninitialized;
    }
}

#[cfg(test)]
mod estimator_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn estimator() -> OrientationEstimator {
        OrientationEstimator::new(EstimatorParams::default())
    }

    #[test]
    fn test_params_validation() {
        assert!(EstimatorParams::builder().smoothing_factor(1.0).build().is_ok());
        assert_eq!(
            EstimatorParams::builder().smoothing_factor(0.0).build(),
            Err(SkylensError::InvalidEstimatorParameter(
                "smoothing_factor must be in (0, 1]".into()
            ))
        );
        assert!(EstimatorParams::builder()
            .smoothing_factor(f64::NAN)
            .build()
            .is_err());
        assert!(EstimatorParams::builder()
            .smoothing_factor(1.5)
            .build()
            .is_err());
    }

    #[test]
    fn test_relative_then_absolute() {
        let mut est = estimator();
        assert_eq!(est.state().kind(), EstimatorStateKind::Uninitialized);

        assert_eq!(
            est.ingest(&RawOrientationEvent::relative(100.0, 90.0, 0.0)),
            IngestOutcome::Accepted
        );
        assert_eq!(est.state().kind(), EstimatorStateKind::RelativeActive);
        assert!(!est.reading().is_absolute());

        assert_eq!(
            est.ingest(&RawOrientationEvent::absolute(10.0, 80.0, 0.0)),
            IngestOutcome::Accepted
        );
        assert!(est.is_absolute());
        // reseeded from the absolute sample, not blended with the relative frame
        assert_eq!(est.sample().unwrap().heading, 10.0);
        assert_eq!(est.sample().unwrap().pitch, 80.0);
    }

    #[test]
    fn test_absolute_lock_ignores_relative() {
        let mut est = estimator();
        est.ingest(&RawOrientationEvent::absolute(45.0, 90.0, 0.0));
        let locked = est.sample().unwrap();

        for i in 0..10 {
            let outcome = est.ingest(&RawOrientationEvent::relative(200.0 + i as f64, 30.0, 5.0));
            assert_eq!(outcome, IngestOutcome::IgnoredRelative);
        }

        assert!(est.reading().is_absolute());
        assert_eq!(est.sample().unwrap(), locked);
    }

    #[test]
    fn test_absolute_samples_are_smoothed() {
        let mut est = estimator();
        est.ingest(&RawOrientationEvent::absolute(350.0, 90.0, 0.0));
        est.ingest(&RawOrientationEvent::absolute(10.0, 100.0, 0.0));
        let s = est.sample().unwrap();
        assert_abs_diff_eq!(s.heading, 356.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s.pitch, 93.0, epsilon = 1e-9);
    }

    #[test]
    fn test_malformed_event_keeps_state() {
        let mut est = estimator();
        est.ingest(&RawOrientationEvent::relative(20.0, 90.0, 0.0));
        let before = est.sample();
        assert_eq!(
            est.ingest(&RawOrientationEvent::default()),
            IngestOutcome::Dropped
        );
        assert_eq!(est.sample(), before);
    }

    #[test]
    fn test_permission_gating() {
        let params = EstimatorParams::builder()
            .requires_permission(true)
            .build()
            .unwrap();
        let mut est = OrientationEstimator::new(params);
        assert_eq!(est.permission(), PermissionState::NotRequested);
        assert!(!est.reading().supported);

        est.request_pending();
        assert_eq!(est.permission(), PermissionState::Pending);
        assert_eq!(
            est.ingest(&RawOrientationEvent::absolute(0.0, 90.0, 0.0)),
            IngestOutcome::NotPermitted
        );
        assert_eq!(est.reading().effective_orientation(None), (0.0, 90.0));

        est.grant();
        assert!(est.reading().supported);
        assert_eq!(
            est.ingest(&RawOrientationEvent::absolute(30.0, 90.0, 0.0)),
            IngestOutcome::Accepted
        );
    }

    #[test]
    fn test_denial_is_permanent() {
        let params = EstimatorParams::builder()
            .requires_permission(true)
            .build()
            .unwrap();
        let mut est = OrientationEstimator::new(params);
        est.deny();
        est.grant();
        assert_eq!(est.permission(), PermissionState::Denied);
        assert!(!est.is_supported());

        let mut manual = ManualOrientation::new();
        manual.set(120.0, 100.0);
        assert_eq!(est.reading().effective_orientation(Some(&manual)), (120.0, 100.0));
    }

    #[test]
    fn test_no_sensor_reports_unsupported() {
        let params = EstimatorParams::builder()
            .sensor_available(false)
            .build()
            .unwrap();
        let mut est = OrientationEstimator::new(params);
        assert!(!est.reading().supported);
        assert_eq!(
            est.ingest(&RawOrientationEvent::absolute(0.0, 90.0, 0.0)),
            IngestOutcome::NotPermitted
        );
    }

    #[test]
    fn test_reset_releases_lock() {
        let mut est = estimator();
        est.ingest(&RawOrientationEvent::absolute(45.0, 90.0, 0.0));
        est.reset();
        assert_eq!(est.state().kind(), EstimatorStateKind::Uninitialized);
        assert_eq!(
            est.ingest(&RawOrientationEvent::relative(10.0, 90.0, 0.0)),
            IngestOutcome::Accepted
        );
        assert_eq!(est.state().kind(), EstimatorStateKind::RelativeActive);
    }

    #[test]
    fn test_params_display() {
        let params = EstimatorParams::default();
        assert_eq!(
            format!("{params}"),
            "EstimatorParams(smoothing_factor=0.30, requires_permission=false, sensor_available=true)"
        );
        assert!(format!("{params:#}").contains("smoothing_factor    = 0.300"));
    }
}
