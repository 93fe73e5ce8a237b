//! # Projection engine
//!
//! Maps horizontal coordinates `(altitude, azimuth)` to a pixel on the camera preview, for
//! a device looking along `(heading, pitch)`.
//!
//! ## Overview
//!
//! The projection is a pinhole camera model built from two rotations:
//!
//! 1. The target is turned into a unit vector in the local East-North-Up frame
//!    (see [`CelestialPosition::unit_vector`]).
//! 2. The vector is rotated about Up so that the heading lands on the +North axis, then
//!    about East by `-(pitch - 90)` so that the look direction lands on it exactly.
//!    After both rotations `y` is the depth along the optical axis, `x` points right and
//!    `z` points up on the screen.
//! 3. The perspective divide `x / y`, `z / y` is scaled by `1 / tan(hfov / 2)` into
//!    normalized device coordinates, then into pixels with the origin at the top-left.
//!
//! The device pitch follows the sensor convention: `90°` is the phone held upright with the
//! camera on the horizon, `180°` points it at the zenith. The camera therefore looks at
//! the altitude `pitch - 90` ([`look_altitude`]).
//!
//! Objects behind the viewer (non-positive depth) and numerically degenerate results never
//! wrap back onto the screen: they are parked at a deterministic point at least
//! `offscreen_factor` viewport dimensions away from the center.
//!
//! ## Front-facing camera
//!
//! The user-facing camera looks the opposite way and its preview is mirrored: the heading
//! is turned by 180° before projecting, and the horizontal coordinate is flipped afterwards.
//!
//! ## Example
//!
//! ```rust
//! use skylens::celestial::CelestialPosition;
//! use skylens::projection::{CameraFacing, ProjectionEngine, Viewport};
//!
//! let engine = ProjectionEngine::default();
//! let viewport = Viewport::new(1000.0, 1000.0).unwrap();
//! let east_45 = CelestialPosition::new(45.0, 90.0).unwrap();
//!
//! let p = engine.project(&east_45, Some(90.0), Some(90.0), &viewport, CameraFacing::Environment);
//! assert!((p.x - 500.0).abs() < 1e-9);
//! assert!(p.y < 500.0);
//! ```

pub mod params;

use itertools::iterate;
use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use crate::angles::normalize180;
use crate::celestial::CelestialPosition;
use crate::constants::{Degree, Pixel, DEFAULT_HEADING, DEFAULT_HORIZON_STEP, DEFAULT_PITCH, RADEG};
use crate::skylens_errors::SkylensError;

pub use self::params::{ProjectionParams, ProjectionParamsBuilder};

/// Which camera feeds the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CameraFacing {
    /// Rear camera, looking where the device points.
    #[default]
    Environment,
    /// Front camera, looking back at the user with a mirrored preview.
    User,
}

/// A pixel position, origin at the top-left corner, `y` growing downwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: Pixel,
    pub y: Pixel,
}

impl ScreenPoint {
    pub fn new(x: Pixel, y: Pixel) -> Self {
        ScreenPoint { x, y }
    }

    /// True when the point lies inside `[0, width] × [0, height]`.
    pub fn is_on_screen(&self, viewport: &Viewport) -> bool {
        (0.0..=viewport.width).contains(&self.x) && (0.0..=viewport.height).contains(&self.y)
    }
}

/// Size of the camera preview in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: Pixel,
    pub height: Pixel,
}

impl Viewport {
    pub fn new(width: Pixel, height: Pixel) -> Result<Self, SkylensError> {
        let valid = |v: Pixel| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(SkylensError::InvalidProjectionParameter(format!(
                "viewport {width}x{height} must have finite positive dimensions"
            )));
        }
        Ok(Viewport { width, height })
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.width / 2.0, self.height / 2.0)
    }
}

/// A projected point together with the frustum test result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projected {
    pub point: ScreenPoint,
    pub in_view: bool,
}

/// Altitude at which the camera looks for a device `pitch`.
#[inline]
pub fn look_altitude(pitch: Degree) -> Degree {
    pitch - 90.0
}

/// Celestial-to-screen projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionEngine {
    params: ProjectionParams,
    /// `1 / tan(hfov / 2)`, cached.
    focal: f64,
}

impl Default for ProjectionEngine {
    fn default() -> Self {
        Self::new(ProjectionParams::default())
    }
}

impl ProjectionEngine {
    pub fn new(params: ProjectionParams) -> Self {
        let focal = 1.0 / (params.half_fov() * RADEG).tan();
        ProjectionEngine { params, focal }
    }

    pub fn params(&self) -> &ProjectionParams {
        &self.params
    }

    /// Heading actually seen by the camera.
    fn camera_heading(heading: Degree, facing: CameraFacing) -> Degree {
        match facing {
            CameraFacing::Environment => heading,
            CameraFacing::User => heading + 180.0,
        }
    }

    /// Direction of `position` in the camera frame (x right, y depth, z up).
    fn camera_frame(
        &self,
        position: &CelestialPosition,
        heading: Degree,
        pitch: Degree,
        facing: CameraFacing,
    ) -> Vector3<f64> {
        let yaw = Rotation3::from_axis_angle(
            &Vector3::z_axis(),
            Self::camera_heading(heading, facing) * RADEG,
        );
        let tilt = Rotation3::from_axis_angle(&Vector3::x_axis(), -look_altitude(pitch) * RADEG);
        tilt * (yaw * position.unit_vector())
    }

    /// Pixel coordinates of a camera-frame direction.
    fn to_screen(&self, v: &Vector3<f64>, viewport: &Viewport, facing: CameraFacing) -> ScreenPoint {
        let mirror = match facing {
            CameraFacing::Environment => 1.0,
            CameraFacing::User => -1.0,
        };

        if v.y > self.params.min_depth {
            let ndc_x = mirror * v.x / v.y * self.focal;
            let ndc_y = v.z / v.y * self.focal;
            let x = (ndc_x + 1.0) * viewport.width / 2.0;
            let y = (1.0 - ndc_y) * viewport.height / 2.0;
            if x.is_finite() && y.is_finite() {
                return ScreenPoint::new(x, y);
            }
        }

        self.offscreen(v, viewport, mirror)
    }

    /// Sentinel for directions that cannot be drawn.
    fn offscreen(&self, v: &Vector3<f64>, viewport: &Viewport, mirror: f64) -> ScreenPoint {
        let sx = mirror * if v.x >= 0.0 { 1.0 } else { -1.0 };
        let sy = if v.z >= 0.0 { 1.0 } else { -1.0 };
        let f = self.params.offscreen_factor;
        ScreenPoint::new(
            viewport.width / 2.0 + sx * f * viewport.width,
            viewport.height / 2.0 - sy * f * viewport.height,
        )
    }

    /// Project a celestial position onto the preview.
    ///
    /// Arguments
    /// -----------------
    /// * `position`: horizontal coordinates of the object.
    /// * `heading`: device heading in degrees clockwise from north, `None` before any
    ///   orientation is known (defaults to 0).
    /// * `pitch`: device pitch in degrees, `None` defaults to 90 (looking at the horizon).
    /// * `viewport`: preview size in pixels.
    /// * `facing`: which camera feeds the preview.
    ///
    /// Return
    /// ----------
    /// * The pixel position. Objects behind the viewer land strictly outside the viewport.
    pub fn project(
        &self,
        position: &CelestialPosition,
        heading: Option<Degree>,
        pitch: Option<Degree>,
        viewport: &Viewport,
        facing: CameraFacing,
    ) -> ScreenPoint {
        let heading = heading.unwrap_or(DEFAULT_HEADING);
        let pitch = pitch.unwrap_or(DEFAULT_PITCH);
        let v = self.camera_frame(position, heading, pitch, facing);
        self.to_screen(&v, viewport, facing)
    }

    /// Frustum test, with the margin of [`ProjectionParams::frustum_margin`].
    ///
    /// The test is angular: the azimuth must be within `hfov / 2 + margin` of the camera
    /// heading (shortest way round) and the altitude within the same bound of the look
    /// altitude. Non-finite inputs are never in view.
    pub fn is_in_view(
        &self,
        position: &CelestialPosition,
        heading: Option<Degree>,
        pitch: Option<Degree>,
        facing: CameraFacing,
    ) -> bool {
        let heading = Self::camera_heading(heading.unwrap_or(DEFAULT_HEADING), facing);
        let pitch = pitch.unwrap_or(DEFAULT_PITCH);

        let delta_az = normalize180(position.azimuth - heading);
        let delta_alt = position.altitude - look_altitude(pitch);
        let bound = self.params.view_bound();

        delta_az.is_finite() && delta_alt.is_finite() && delta_az.abs() < bound && delta_alt.abs() < bound
    }

    /// [`project`](Self::project) and [`is_in_view`](Self::is_in_view) in one call.
    pub fn project_with_visibility(
        &self,
        position: &CelestialPosition,
        heading: Option<Degree>,
        pitch: Option<Degree>,
        viewport: &Viewport,
        facing: CameraFacing,
    ) -> Projected {
        Projected {
            point: self.project(position, heading, pitch, viewport, facing),
            in_view: self.is_in_view(position, heading, pitch, facing),
        }
    }

    /// Screen polyline of the horizon.
    ///
    /// Samples altitude 0 every `step` degrees of azimuth over the full circle and keeps
    /// the points in front of the camera. A non-positive or non-finite `step` falls back
    /// to 10°.
    pub fn horizon_polyline(
        &self,
        heading: Option<Degree>,
        pitch: Option<Degree>,
        viewport: &Viewport,
        facing: CameraFacing,
        step: Degree,
    ) -> Vec<ScreenPoint> {
        let step = if step.is_finite() && step > 0.0 {
            step
        } else {
            DEFAULT_HORIZON_STEP
        };
        let heading = heading.unwrap_or(DEFAULT_HEADING);
        let pitch = pitch.unwrap_or(DEFAULT_PITCH);

        iterate(0.0, |az| az + step)
            .take_while(|az| *az <= 360.0)
            .filter_map(|az| CelestialPosition::new(0.0, az).ok())
            .map(|p| self.camera_frame(&p, heading, pitch, facing))
            .filter(|v| v.y > self.params.min_depth)
            .map(|v| self.to_screen(&v, viewport, facing))
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .collect()
    }
}

#[cfg(test)]
mod projection_test {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn square() -> Viewport {
        Viewport::new(1000.0, 1000.0).unwrap()
    }

    fn pos(alt: Degree, az: Degree) -> CelestialPosition {
        CelestialPosition::new(alt, az).unwrap()
    }

    #[test]
    fn test_target_on_axis_hits_center() {
        let engine = ProjectionEngine::default();
        let vp = Viewport::new(800.0, 600.0).unwrap();
        for (h, p) in [(0.0, 90.0), (123.0, 135.0), (359.0, 60.0), (200.0, 100.0)] {
            let target = pos(look_altitude(p), h);
            let s = engine.project(&target, Some(h), Some(p), &vp, CameraFacing::Environment);
            assert_abs_diff_eq!(s.x, 400.0, epsilon = 1e-9);
            assert_abs_diff_eq!(s.y, 300.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_default_engine_uses_default_params() {
        let default = ProjectionEngine::default();
        let explicit = ProjectionEngine::new(ProjectionParams::default());
        assert_eq!(default, explicit);

        let vp = square();
        let off_axis = pos(0.0, 20.0);
        let s = default.project(&off_axis, Some(0.0), Some(90.0), &vp, CameraFacing::Environment);
        assert_eq!(
            s,
            explicit.project(&off_axis, Some(0.0), Some(90.0), &vp, CameraFacing::Environment)
        );
        // 500 + 500 * tan(20°) / tan(30°)
        assert_relative_eq!(s.x, 815.2074690959046, epsilon = 1e-9);
        assert_abs_diff_eq!(s.y, 500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_east_45_scenario() {
        let engine = ProjectionEngine::default();
        let s = engine.project(
            &pos(45.0, 90.0),
            Some(90.0),
            Some(90.0),
            &square(),
            CameraFacing::Environment,
        );
        assert_abs_diff_eq!(s.x, 500.0, epsilon = 1e-9);
        assert!(s.y < 500.0);
    }

    #[test]
    fn test_horizontal_offset_follows_tangent() {
        let engine = ProjectionEngine::default();
        let f = 1.0 / (30.0 * RADEG).tan();
        for d in [-25.0, -10.0, 5.0, 20.0] {
            let s = engine.project(
                &pos(0.0, 40.0 + d),
                Some(40.0),
                Some(90.0),
                &square(),
                CameraFacing::Environment,
            );
            let expected = ((d * RADEG).tan() * f + 1.0) * 500.0;
            assert_relative_eq!(s.x, expected, epsilon = 1e-9);
            assert_abs_diff_eq!(s.y, 500.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_vertical_offset_follows_tangent() {
        let engine = ProjectionEngine::default();
        let f = 1.0 / (30.0 * RADEG).tan();
        let s = engine.project(
            &pos(20.0, 0.0),
            Some(0.0),
            Some(90.0),
            &square(),
            CameraFacing::Environment,
        );
        assert_abs_diff_eq!(s.x, 500.0, epsilon = 1e-9);
        assert_relative_eq!(s.y, (1.0 - (20.0 * RADEG).tan() * f) * 500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_frustum_bounds() {
        let engine = ProjectionEngine::default();
        let env = CameraFacing::Environment;
        let h = Some(10.0);
        let p = Some(90.0);

        assert!(engine.is_in_view(&pos(0.0, 39.0), h, p, env));
        assert!(engine.is_in_view(&pos(0.0, 341.0), h, p, env));
        assert!(!engine.is_in_view(&pos(0.0, 56.0), h, p, env));
        assert!(!engine.is_in_view(&pos(0.0, 324.0), h, p, env));

        assert!(engine.is_in_view(&pos(29.0, 10.0), h, p, env));
        assert!(engine.is_in_view(&pos(-29.0, 10.0), h, p, env));
        assert!(!engine.is_in_view(&pos(46.0, 10.0), h, p, env));
        assert!(!engine.is_in_view(&pos(-46.0, 10.0), h, p, env));
    }

    #[test]
    fn test_null_orientation_defaults() {
        let engine = ProjectionEngine::default();
        let target = pos(12.0, 17.0);
        let vp = square();
        assert_eq!(
            engine.project(&target, None, None, &vp, CameraFacing::Environment),
            engine.project(&target, Some(0.0), Some(90.0), &vp, CameraFacing::Environment)
        );
        assert!(engine.is_in_view(&pos(0.0, 0.0), None, None, CameraFacing::Environment));
    }

    #[test]
    fn test_front_camera_is_mirrored_back_camera() {
        let engine = ProjectionEngine::default();
        let vp = Viewport::new(1080.0, 1920.0).unwrap();
        for (alt, az, h, p) in [
            (10.0, 200.0, 30.0, 95.0),
            (40.0, 90.0, 250.0, 120.0),
            (-5.0, 10.0, 10.0, 90.0),
            (60.0, 300.0, 300.0, 80.0),
        ] {
            let target = pos(alt, az);
            let user = engine.project(&target, Some(h), Some(p), &vp, CameraFacing::User);
            let env = engine.project(
                &target,
                Some(h + 180.0),
                Some(p),
                &vp,
                CameraFacing::Environment,
            );
            assert_relative_eq!(user.x, vp.width - env.x, epsilon = 1e-6);
            assert_relative_eq!(user.y, env.y, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_behind_viewer_is_off_screen() {
        let engine = ProjectionEngine::default();
        let vp = Viewport::new(640.0, 480.0).unwrap();
        for (alt, az) in [(0.0, 180.0), (10.0, 179.0), (-20.0, 181.0), (0.0, 270.0), (-30.0, 120.0)] {
            for facing in [CameraFacing::Environment, CameraFacing::User] {
                let h = match facing {
                    CameraFacing::Environment => 0.0,
                    CameraFacing::User => 180.0,
                };
                let s = engine.project(&pos(alt, az), Some(h), Some(90.0), &vp, facing);
                assert!(!s.is_on_screen(&vp), "({alt}, {az}) drawn at {s:?}");
                assert!(!engine.is_in_view(&pos(alt, az), Some(h), Some(90.0), facing));
            }
        }
    }

    #[test]
    fn test_non_finite_orientation_goes_off_screen() {
        let engine = ProjectionEngine::default();
        let vp = square();
        let s = engine.project(
            &pos(10.0, 10.0),
            Some(f64::NAN),
            Some(90.0),
            &vp,
            CameraFacing::Environment,
        );
        assert!(!s.is_on_screen(&vp));
        assert!(!engine.is_in_view(&pos(10.0, 10.0), Some(f64::NAN), Some(90.0), CameraFacing::Environment));
    }

    #[test]
    fn test_project_with_visibility() {
        let engine = ProjectionEngine::default();
        let projected = engine.project_with_visibility(
            &pos(5.0, 5.0),
            Some(0.0),
            Some(90.0),
            &square(),
            CameraFacing::Environment,
        );
        assert!(projected.in_view);
        assert!(projected.point.is_on_screen(&square()));
    }

    #[test]
    fn test_horizon_polyline() {
        let engine = ProjectionEngine::default();
        let vp = square();
        let line = engine.horizon_polyline(Some(0.0), Some(90.0), &vp, CameraFacing::Environment, 10.0);
        // azimuths strictly within 90° of north: 280..=350, 0..=80, and 360
        assert_eq!(line.len(), 18);
        for p in &line {
            assert_abs_diff_eq!(p.y, 500.0, epsilon = 1e-9);
        }

        let tilted = engine.horizon_polyline(Some(0.0), Some(120.0), &vp, CameraFacing::Environment, -1.0);
        assert!(tilted.iter().all(|p| p.y > 500.0));
    }

    #[test]
    fn test_viewport_validation() {
        assert!(Viewport::new(0.0, 10.0).is_err());
        assert!(Viewport::new(10.0, f64::NAN).is_err());
        assert_eq!(square().center(), ScreenPoint::new(500.0, 500.0));
    }
}
