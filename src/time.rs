use hifitime::{Epoch, Unit};

use crate::constants::{Degree, Radian, DPI, MJD, RADEG, T2000};

/// Modified Julian Date of an epoch, used as a stand-in for UT1.
///
/// UTC stays within 0.9 s of UT1.
pub fn epoch_to_mjd_ut(epoch: &Epoch) -> MJD {
    epoch.to_mjd_utc_days()
}

/// Shift an epoch by a signed number of hours (time-travel offset of the view).
pub fn offset_epoch(epoch: &Epoch, hours: f64) -> Epoch {
    *epoch + Unit::Hour * hours
}

/// Compute the Greenwich Mean Sidereal Time (GMST) in radians
/// for a given Modified Julian Date (UT1 time scale).
///
/// This function implements the IAU 1982 polynomial formula
/// for the mean sidereal time at 0h UT1, plus the fractional-day
/// correction term due to Earth's rotation rate.
///
/// # Arguments
/// * `tjm` - Modified Julian Date (MJD, UT1 time scale)
///
/// # Returns
/// * GMST angle in radians, normalized to the interval [0, 2π).
pub fn gmst(tjm: MJD) -> Radian {
    // Polynomial coefficients for GMST at 0h UT1 (in seconds)
    const C0: f64 = 24110.54841;
    const C1: f64 = 8640184.812866;
    const C2: f64 = 9.3104e-2;
    const C3: f64 = -6.2e-6;

    // Ratio of sidereal day to solar day
    const RAP: f64 = 1.00273790934;

    let itjm = tjm.floor();
    let t = (itjm - T2000) / 36525.0;

    let gmst0 = (((C3 * t + C2) * t + C1) * t + C0) * DPI / 86400.0;

    // Earth rotation during the elapsed fraction of the day, in sidereal units
    let h = tjm.fract() * DPI;

    (gmst0 + h * RAP).rem_euclid(DPI)
}

/// Local mean sidereal time, in radians in `[0, 2π)`.
///
/// Arguments
/// -----------------
/// * `epoch`: instant of the observation.
/// * `longitude`: observer longitude in degrees, east positive.
pub fn local_sidereal_time(epoch: &Epoch, longitude: Degree) -> Radian {
    (gmst(epoch_to_mjd_ut(epoch)) + longitude * RADEG).rem_euclid(DPI)
}
