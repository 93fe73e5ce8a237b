//! Angle wrapping helpers shared by the estimator and the projection engine.
//!
//! Azimuths and headings are circular quantities in degrees: they are stored in `[0, 360)`
//! and every difference between two of them is taken along the shorter arc, in `(-180, 180]`.
//! Altitudes and pitches are linear and never go through these helpers.

use crate::constants::Degree;

/// Wrap an angle in degrees into `[0, 360)`.
///
/// `rem_euclid` can round a tiny negative input up to exactly `360.0`; that case is folded
/// back to `0.0` so the half-open range always holds.
///
/// Non-finite inputs are returned unchanged.
pub fn normalize360(angle: Degree) -> Degree {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Wrap an angle in degrees into `(-180, 180]`.
///
/// The result is congruent to the input modulo 360. An input of exactly `-180` maps to `180`.
///
/// Non-finite inputs are returned unchanged.
pub fn normalize180(angle: Degree) -> Degree {
    let wrapped = normalize360(angle);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Signed shortest rotation, in degrees, that brings `from` onto `to`.
///
/// Positive means clockwise (increasing azimuth), negative counter-clockwise.
pub fn shortest_delta(from: Degree, to: Degree) -> Degree {
    normalize180(to - from)
}
