//! # Celestial positions and their providers
//!
//! The projection pipeline only consumes horizontal coordinates: an altitude above the
//! horizon and an azimuth clockwise from true north, both in degrees. Where they come from
//! is the business of a [`CelestialPositionProvider`]:
//!
//! - fixed stars and constellation figures are handled in-crate by
//!   [`FixedStarProvider`](crate::celestial::equatorial::FixedStarProvider)
//!   (right ascension / declination → altitude / azimuth),
//! - planets, the Sun and the Moon come from an external ephemeris,
//! - satellites come from an external orbit propagator.
//!
//! [`CompositeProvider`] routes each [`CelestialTarget`] to the right provider.
//!
//! ## Contract
//!
//! Providers are pure, synchronous functions of `(target, time, location)`. A provider that
//! cannot produce a position returns an error; the scene composer turns that into
//! "object unavailable this tick" and never aborts the frame.
//!
//! Closures with the right signature are providers too, which keeps test doubles short:
//!
//! ```rust
//! use hifitime::Epoch;
//! use skylens::celestial::{CelestialPosition, CelestialPositionProvider, CelestialTarget};
//! use skylens::observer_context::ObserverLocation;
//! use skylens::skylens_errors::SkylensError;
//!
//! let due_east = |_: &CelestialTarget, _: &Epoch, _: &ObserverLocation| {
//!     CelestialPosition::new(45.0, 90.0)
//! };
//! let epoch = Epoch::from_mjd_utc(60000.0);
//! let pos = due_east
//!     .position_of(&CelestialTarget::Satellite("ISS".into()), &epoch, &ObserverLocation::default())
//!     .unwrap();
//! assert_eq!(pos.azimuth, 90.0);
//! # Ok::<(), SkylensError>(())
//! ```

pub mod equatorial;

use std::fmt;
use std::str::FromStr;

use hifitime::Epoch;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::angles::normalize360;
use crate::constants::{Degree, Hour, RADEG};
use crate::observer_context::ObserverLocation;
use crate::skylens_errors::SkylensError;

use self::equatorial::FixedStarProvider;

/// Horizontal coordinates of an object for one observer at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CelestialPosition {
    /// Degrees above the horizon, in `[-90, 90]`.
    pub altitude: Degree,
    /// Degrees clockwise from true north, in `[0, 360)`.
    pub azimuth: Degree,
}

impl CelestialPosition {
    /// Build a position, wrapping the azimuth into `[0, 360)`.
    ///
    /// Return
    /// ----------
    /// * `Err(SkylensError::InvalidCelestialPosition)` if either angle is not finite or the
    ///   altitude lies outside `[-90, 90]`.
    pub fn new(altitude: Degree, azimuth: Degree) -> Result<Self, SkylensError> {
        if !altitude.is_finite() || !azimuth.is_finite() {
            return Err(SkylensError::InvalidCelestialPosition(format!(
                "non-finite coordinates (alt={altitude}, az={azimuth})"
            )));
        }
        if !(-90.0..=90.0).contains(&altitude) {
            return Err(SkylensError::InvalidCelestialPosition(format!(
                "altitude {altitude} outside [-90, 90]"
            )));
        }
        Ok(CelestialPosition {
            altitude,
            azimuth: normalize360(azimuth),
        })
    }

    /// True when the object is above the geometric horizon.
    pub fn is_above_horizon(&self) -> bool {
        self.altitude > 0.0
    }

    /// Unit direction vector in the local East-North-Up frame.
    pub fn unit_vector(&self) -> Vector3<f64> {
        let (sin_alt, cos_alt) = (self.altitude * RADEG).sin_cos();
        let (sin_az, cos_az) = (self.azimuth * RADEG).sin_cos();
        Vector3::new(cos_alt * sin_az, cos_alt * cos_az, sin_alt)
    }
}

/// Solar system bodies known to the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BodyId {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
}

impl BodyId {
    pub const ALL: [BodyId; 9] = [
        BodyId::Mercury,
        BodyId::Venus,
        BodyId::Mars,
        BodyId::Jupiter,
        BodyId::Saturn,
        BodyId::Uranus,
        BodyId::Neptune,
        BodyId::Moon,
        BodyId::Sun,
    ];

    /// Lowercase identifier used by catalogs.
    pub fn id(&self) -> &'static str {
        match self {
            BodyId::Sun => "sun",
            BodyId::Moon => "moon",
            BodyId::Mercury => "mercury",
            BodyId::Venus => "venus",
            BodyId::Mars => "mars",
            BodyId::Jupiter => "jupiter",
            BodyId::Saturn => "saturn",
            BodyId::Uranus => "uranus",
            BodyId::Neptune => "neptune",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BodyId::Sun => "Sun",
            BodyId::Moon => "Moon",
            BodyId::Mercury => "Mercury",
            BodyId::Venus => "Venus",
            BodyId::Mars => "Mars",
            BodyId::Jupiter => "Jupiter",
            BodyId::Saturn => "Saturn",
            BodyId::Uranus => "Uranus",
            BodyId::Neptune => "Neptune",
        }
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for BodyId {
    type Err = SkylensError;

    /// Case-insensitive lookup by catalog identifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        BodyId::ALL
            .into_iter()
            .find(|b| b.id() == wanted)
            .ok_or_else(|| SkylensError::UnknownBody(s.to_string()))
    }
}

/// Anything whose horizontal position can be asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CelestialTarget {
    /// A solar system body, located by an ephemeris.
    Body(BodyId),
    /// A fixed point of the celestial sphere.
    Equatorial { ra_hours: Hour, dec_deg: Degree },
    /// An artificial satellite, located by an orbit propagator.
    Satellite(String),
}

impl fmt::Display for CelestialTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CelestialTarget::Body(b) => write!(f, "{b}"),
            CelestialTarget::Equatorial { ra_hours, dec_deg } => {
                write!(f, "RA {ra_hours:.3}h Dec {dec_deg:+.3}°")
            }
            CelestialTarget::Satellite(id) => write!(f, "satellite {id}"),
        }
    }
}

/// Source of horizontal coordinates.
pub trait CelestialPositionProvider {
    /// Position of `target` seen from `location` at `time`.
    fn position_of(
        &self,
        target: &CelestialTarget,
        time: &Epoch,
        location: &ObserverLocation,
    ) -> Result<CelestialPosition, SkylensError>;
}

impl<F> CelestialPositionProvider for F
where
    F: Fn(&CelestialTarget, &Epoch, &ObserverLocation) -> Result<CelestialPosition, SkylensError>,
{
    fn position_of(
        &self,
        target: &CelestialTarget,
        time: &Epoch,
        location: &ObserverLocation,
    ) -> Result<CelestialPosition, SkylensError> {
        self(target, time, location)
    }
}

/// Boxed provider that can be moved into the session's refresh task.
pub type DynProvider = Box<dyn CelestialPositionProvider + Send + Sync>;

/// Routes targets to the provider able to locate them.
///
/// Equatorial targets are always served by the in-crate [`FixedStarProvider`]; bodies and
/// satellites need external providers.
#[derive(Default)]
pub struct CompositeProvider {
    stars: FixedStarProvider,
    bodies: Option<DynProvider>,
    satellites: Option<DynProvider>,
}

impl CompositeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body_provider(mut self, provider: DynProvider) -> Self {
        self.bodies = Some(provider);
        self
    }

    pub fn with_satellite_provider(mut self, provider: DynProvider) -> Self {
        self.satellites = Some(provider);
        self
    }
}

impl fmt::Debug for CompositeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeProvider")
            .field("bodies", &self.bodies.is_some())
            .field("satellites", &self.satellites.is_some())
            .finish()
    }
}

impl CelestialPositionProvider for CompositeProvider {
    fn position_of(
        &self,
        target: &CelestialTarget,
        time: &Epoch,
        location: &ObserverLocation,
    ) -> Result<CelestialPosition, SkylensError> {
        let routed = match target {
            CelestialTarget::Equatorial { .. } => {
                return self.stars.position_of(target, time, location)
            }
            CelestialTarget::Body(_) => self.bodies.as_ref(),
            CelestialTarget::Satellite(_) => self.satellites.as_ref(),
        };
        match routed {
            Some(provider) => provider.position_of(target, time, location),
            None => Err(SkylensError::UnsupportedTarget(target.to_string())),
        }
    }
}

#[cfg(test)]
mod celestial_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_position_validation() {
        let pos = CelestialPosition::new(10.0, -90.0).unwrap();
        assert_eq!(pos.azimuth, 270.0);
        assert!(CelestialPosition::new(f64::NAN, 0.0).is_err());
        assert!(CelestialPosition::new(0.0, f64::INFINITY).is_err());
        assert!(CelestialPosition::new(91.0, 0.0).is_err());
    }

    #[test]
    fn test_unit_vector_enu() {
        let east = CelestialPosition::new(0.0, 90.0).unwrap().unit_vector();
        assert_abs_diff_eq!(east.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(east.y, 0.0, epsilon = 1e-12);

        let zenith = CelestialPosition::new(90.0, 0.0).unwrap().unit_vector();
        assert_abs_diff_eq!(zenith.z, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(zenith.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_body_from_str() {
        assert_eq!("Mars".parse::<BodyId>().unwrap(), BodyId::Mars);
        assert_eq!(" moon ".parse::<BodyId>().unwrap(), BodyId::Moon);
        assert_eq!(
            "pluto".parse::<BodyId>(),
            Err(SkylensError::UnknownBody("pluto".into()))
        );
    }

    #[test]
    fn test_composite_routing() {
        let epoch = Epoch::from_mjd_utc(60000.0);
        let here = ObserverLocation::default();

        let bare = CompositeProvider::new();
        assert_eq!(
            bare.position_of(&CelestialTarget::Body(BodyId::Venus), &epoch, &here),
            Err(SkylensError::UnsupportedTarget("Venus".into()))
        );
        assert!(bare
            .position_of(
                &CelestialTarget::Equatorial {
                    ra_hours: 5.92,
                    dec_deg: 7.41
                },
                &epoch,
                &here
            )
            .is_ok());

        let with_bodies = CompositeProvider::new().with_body_provider(Box::new(
            |_: &CelestialTarget, _: &Epoch, _: &ObserverLocation| CelestialPosition::new(12.0, 200.0),
        ));
        let pos = with_bodies
            .position_of(&CelestialTarget::Body(BodyId::Venus), &epoch, &here)
            .unwrap();
        assert_eq!(pos.altitude, 12.0);
        assert!(with_bodies
            .position_of(&CelestialTarget::Satellite("ISS".into()), &epoch, &here)
            .is_err());
    }
}
