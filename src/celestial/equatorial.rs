//! Fixed stars: equatorial (RA/Dec) to horizontal (alt/az) coordinates.
//!
//! The conversion goes through the local hour angle `H = LST - RA`:
//!
//! ```text
//! sin(alt) = sin(φ)·sin(δ) + cos(φ)·cos(δ)·cos(H)
//! az       = atan2(-cos(δ)·sin(H), sin(δ)·cos(φ) - cos(δ)·cos(H)·sin(φ))
//! ```
//!
//! with `φ` the observer latitude and `δ` the declination. The azimuth comes out clockwise
//! from north. Precession, nutation and refraction are ignored: catalog coordinates are
//! used as given, which is well within what an overlay on a phone camera can show.

use hifitime::Epoch;

use crate::celestial::{CelestialPosition, CelestialPositionProvider, CelestialTarget};
use crate::constants::{Degree, Hour, HOUR_TO_DEG, RADEG};
use crate::observer_context::ObserverLocation;
use crate::skylens_errors::SkylensError;
use crate::time::local_sidereal_time;

/// Provider for targets given by right ascension and declination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedStarProvider;

impl FixedStarProvider {
    pub fn new() -> Self {
        FixedStarProvider
    }

    /// Horizontal coordinates of an equatorial point.
    ///
    /// Arguments
    /// -----------------
    /// * `ra_hours`: right ascension in hours.
    /// * `dec_deg`: declination in degrees.
    /// * `time`: instant of the observation.
    /// * `location`: observer latitude/longitude in degrees.
    ///
    /// Return
    /// ----------
    /// * The [`CelestialPosition`], or `InvalidCelestialPosition` for non-finite inputs.
    pub fn horizontal(
        &self,
        ra_hours: Hour,
        dec_deg: Degree,
        time: &Epoch,
        location: &ObserverLocation,
    ) -> Result<CelestialPosition, SkylensError> {
        let lst = local_sidereal_time(time, location.longitude);
        let hour_angle = lst - ra_hours * HOUR_TO_DEG * RADEG;

        let (sin_lat, cos_lat) = (location.latitude * RADEG).sin_cos();
        let (sin_dec, cos_dec) = (dec_deg * RADEG).sin_cos();
        let (sin_h, cos_h) = hour_angle.sin_cos();

        let sin_alt = (sin_lat * sin_dec + cos_lat * cos_dec * cos_h).clamp(-1.0, 1.0);
        let altitude = sin_alt.asin() / RADEG;
        let azimuth = (-cos_dec * sin_h)
            .atan2(sin_dec * cos_lat - cos_dec * cos_h * sin_lat)
            / RADEG;

        CelestialPosition::new(altitude, azimuth)
    }
}

impl CelestialPositionProvider for FixedStarProvider {
    fn position_of(
        &self,
        target: &CelestialTarget,
        time: &Epoch,
        location: &ObserverLocation,
    ) -> Result<CelestialPosition, SkylensError> {
        match target {
            CelestialTarget::Equatorial { ra_hours, dec_deg } => {
                self.horizontal(*ra_hours, *dec_deg, time, location)
            }
            other => Err(SkylensError::UnsupportedTarget(other.to_string())),
        }
    }
}

#[cfg(test)]
mod equatorial_test {
    use super::*;
    use crate::celestial::BodyId;
    use crate::constants::DPI;
    use approx::assert_abs_diff_eq;
    use hifitime::TimeScale;

    fn epoch() -> Epoch {
        Epoch::from_gregorian(2024, 2, 1, 3, 30, 0, 0, TimeScale::UTC)
    }

    /// Right ascension (hours) currently on the local meridian.
    fn meridian_ra(location: &ObserverLocation) -> Hour {
        local_sidereal_time(&epoch(), location.longitude) / DPI * 24.0
    }

    #[test]
    fn test_polaris_altitude_tracks_latitude() {
        let provider = FixedStarProvider::new();
        let nyc = ObserverLocation::new(40.7128, -74.0060).unwrap();
        let polaris = provider.horizontal(2.53, 89.26, &epoch(), &nyc).unwrap();
        assert_abs_diff_eq!(polaris.altitude, nyc.latitude, epsilon = 1.0);
        assert!(polaris.azimuth < 2.0 || polaris.azimuth > 358.0);
    }

    #[test]
    fn test_meridian_star_at_zenith() {
        let provider = FixedStarProvider::new();
        let site = ObserverLocation::new(48.85, 2.35).unwrap();
        let ra = meridian_ra(&site);
        let pos = provider.horizontal(ra, site.latitude, &epoch(), &site).unwrap();
        assert_abs_diff_eq!(pos.altitude, 90.0, epsilon = 1e-4);
    }

    #[test]
    fn test_equatorial_star_rising_due_east() {
        let provider = FixedStarProvider::new();
        let site = ObserverLocation::new(30.0, 10.0).unwrap();
        // six hours east of the meridian: hour angle of -90°
        let ra = (meridian_ra(&site) + 6.0).rem_euclid(24.0);
        let pos = provider.horizontal(ra, 0.0, &epoch(), &site).unwrap();
        assert_abs_diff_eq!(pos.altitude, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(pos.azimuth, 90.0, epsilon = 1e-6);
    }

    #[test]
    fn test_bodies_are_not_served() {
        let provider = FixedStarProvider::new();
        let res = provider.position_of(
            &CelestialTarget::Body(BodyId::Mars),
            &epoch(),
            &ObserverLocation::default(),
        );
        assert_eq!(res, Err(SkylensError::UnsupportedTarget("Mars".into())));
    }
}
