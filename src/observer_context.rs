//! # Observer time and location context
//!
//! Every astronomical recompute needs an observer location and an instant. This module
//! holds both:
//!
//! - [`ObserverLocation`] – validated geodetic latitude/longitude in degrees,
//! - [`ObserverContext`] – the location plus a signed **time offset in hours**, used to
//!   preview the sky at another time without touching the clock,
//! - [`LocationStore`] – persistence of the last-known location as a small JSON file, so
//!   that the overlay starts at the right place before geolocation answers.
//!
//! The last-known location is the only state this crate writes to disk.

use camino::{Utf8Path, Utf8PathBuf};
use hifitime::Epoch;
use serde::{Deserialize, Serialize};

use crate::constants::Degree;
use crate::skylens_errors::SkylensError;
use crate::time::offset_epoch;

/// Geodetic position of the observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserverLocation {
    /// Degrees, north positive, in `[-90, 90]`.
    pub latitude: Degree,
    /// Degrees, east positive, in `[-180, 180]`.
    pub longitude: Degree,
}

impl Default for ObserverLocation {
    /// New York City, used until a real fix or a stored location is available.
    fn default() -> Self {
        ObserverLocation {
            latitude: 40.7128,
            longitude: -74.0060,
        }
    }
}

impl ObserverLocation {
    pub fn new(latitude: Degree, longitude: Degree) -> Result<Self, SkylensError> {
        let location = ObserverLocation {
            latitude,
            longitude,
        };
        location.validate()?;
        Ok(location)
    }

    fn validate(&self) -> Result<(), SkylensError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(SkylensError::InvalidLocation(format!(
                "latitude {} outside [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(SkylensError::InvalidLocation(format!(
                "longitude {} outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

/// Location and time offset shared by every recompute of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ObserverContext {
    pub location: ObserverLocation,
    /// Hours added to the wall clock, may be negative.
    pub time_offset_hours: f64,
}

impl ObserverContext {
    pub fn new(location: ObserverLocation) -> Self {
        ObserverContext {
            location,
            time_offset_hours: 0.0,
        }
    }

    pub fn with_time_offset(mut self, hours: f64) -> Self {
        self.time_offset_hours = if hours.is_finite() { hours } else { 0.0 };
        self
    }

    /// Instant at which the sky is drawn, given the wall clock `now`.
    pub fn current_time(&self, now: &Epoch) -> Epoch {
        if self.time_offset_hours == 0.0 {
            *now
        } else {
            offset_epoch(now, self.time_offset_hours)
        }
    }

    /// Current wall clock, shifted by the offset.
    pub fn now(&self) -> Epoch {
        // An unreadable system clock falls back to the Unix epoch rather than failing a frame
        let wall = Epoch::now().unwrap_or_else(|_| Epoch::from_unix_seconds(0.0));
        self.current_time(&wall)
    }
}

/// File-backed storage of the last-known observer location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationStore {
    path: Utf8PathBuf,
}

impl LocationStore {
    pub fn new(path: impl AsRef<Utf8Path>) -> Self {
        LocationStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Read the stored location.
    ///
    /// Return
    /// ----------
    /// * `Ok(None)` if nothing was stored yet, `Ok(Some(loc))` on success, or an error when
    ///   the file exists but cannot be read or holds an invalid location.
    pub fn try_load(&self) -> Result<Option<ObserverLocation>, SkylensError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&self.path)?;
        let location: ObserverLocation = serde_json::from_str(&text)?;
        location.validate()?;
        Ok(Some(location))
    }

    /// Stored location, or the default one when missing or unreadable.
    pub fn load(&self) -> ObserverLocation {
        match self.try_load() {
            Ok(Some(location)) => location,
            Ok(None) => ObserverLocation::default(),
            Err(err) => {
                log::warn!("ignoring stored location at {}: {err}", self.path);
                ObserverLocation::default()
            }
        }
    }

    pub fn save(&self, location: &ObserverLocation) -> Result<(), SkylensError> {
        location.validate()?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string(location)?)?;
        log::debug!("stored last-known location in {}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod observer_context_test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use hifitime::TimeScale;

    #[test]
    fn test_location_validation() {
        assert!(ObserverLocation::new(45.0, 7.0).is_ok());
        assert!(ObserverLocation::new(95.0, 7.0).is_err());
        assert!(ObserverLocation::new(45.0, -181.0).is_err());
        assert_eq!(
            ObserverLocation::new(f64::NAN, 0.0),
            Err(SkylensError::InvalidLocation(
                "latitude NaN outside [-90, 90]".into()
            ))
        );
    }

    #[test]
    fn test_time_offset() {
        let now = Epoch::from_gregorian(2024, 6, 1, 20, 0, 0, 0, TimeScale::UTC);
        let ctx = ObserverContext::default();
        assert_eq!(ctx.current_time(&now), now);

        let ctx = ObserverContext::default().with_time_offset(-2.0);
        let shifted = ctx.current_time(&now);
        assert_abs_diff_eq!(
            (now - shifted).to_seconds(),
            7200.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_store_roundtrip_and_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("nested/location.json")).unwrap();
        let store = LocationStore::new(&path);

        assert_eq!(store.try_load().unwrap(), None);
        assert_eq!(store.load(), ObserverLocation::default());

        let paris = ObserverLocation::new(48.8566, 2.3522).unwrap();
        store.save(&paris).unwrap();
        assert_eq!(store.load(), paris);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(store.try_load().is_err());
        assert_eq!(store.load(), ObserverLocation::default());
    }
}
