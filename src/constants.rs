//! # Constants and type definitions for Skylens
//!
//! This module centralizes the **angular conversion factors**, the **default tuning values**
//! of the orientation and projection pipeline, and the **common type aliases** used throughout
//! the `skylens` library.
//!
//! ## Overview
//!
//! - Unit conversions (degrees ↔ radians, hours ↔ degrees)
//! - Default field of view, frustum margin and off-screen sentinel scale
//! - Default orientation used when no sensor reading is available
//! - Smoothing and manual-drag tuning
//! - Core type aliases (`Degree`, `Radian`, `Pixel`, `MJD`)

// -------------------------------------------------------------------------------------------------
// Unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Hours of right ascension → degrees
pub const HOUR_TO_DEG: f64 = 15.0;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00 TT)
pub const T2000: f64 = 51544.5;

// -------------------------------------------------------------------------------------------------
// Projection defaults
// -------------------------------------------------------------------------------------------------

/// Horizontal field of view of a typical phone camera, in degrees
pub const DEFAULT_HFOV: Degree = 60.0;

/// Extra angular margin added around the half field of view by the frustum test
pub const DEFAULT_FRUSTUM_MARGIN: Degree = 15.0;

/// Off-screen sentinels are placed this many viewport dimensions away from the center
pub const DEFAULT_OFFSCREEN_FACTOR: f64 = 2.0;

/// Smallest depth (cosine of the angle to the optical axis) still projected
pub const DEFAULT_MIN_DEPTH: f64 = 1e-6;

/// Azimuth step of the horizon polyline, in degrees
pub const DEFAULT_HORIZON_STEP: Degree = 10.0;

// -------------------------------------------------------------------------------------------------
// Orientation defaults
// -------------------------------------------------------------------------------------------------

/// Heading used when no orientation is known (facing true north)
pub const DEFAULT_HEADING: Degree = 0.0;

/// Pitch used when no orientation is known (device upright, looking at the horizon)
pub const DEFAULT_PITCH: Degree = 90.0;

/// Roll used when no orientation is known
pub const DEFAULT_ROLL: Degree = 0.0;

/// Weight of a new sample in the exponential smoother
pub const DEFAULT_SMOOTHING_FACTOR: f64 = 0.3;

/// Degrees of rotation per pixel of pointer drag in manual mode
pub const DEFAULT_DRAG_SENSITIVITY: f64 = 0.2;

/// Lowest pitch reachable in manual mode
pub const MANUAL_PITCH_MIN: Degree = 10.0;

/// Highest pitch reachable in manual mode
pub const MANUAL_PITCH_MAX: Degree = 170.0;

// -------------------------------------------------------------------------------------------------
// Scene defaults
// -------------------------------------------------------------------------------------------------

/// Objects at or below this altitude are not rendered
pub const DEFAULT_MIN_ALTITUDE: Degree = -10.0;

/// Satellites are only drawn once they rise above the geometric horizon
pub const SATELLITE_MIN_ALTITUDE: Degree = 0.0;

/// Period of the astronomical recompute, in seconds
pub const DEFAULT_REFRESH_PERIOD_S: f64 = 1.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Right ascension in hours
pub type Hour = f64;
/// Screen coordinate in pixels
pub type Pixel = f64;
/// Modified Julian Date (days)
pub type MJD = f64;
