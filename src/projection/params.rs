//! Tunable parameters of the [`ProjectionEngine`](crate::projection::ProjectionEngine).

use std::cmp::Ordering::{Equal, Greater, Less};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    Degree, DEFAULT_FRUSTUM_MARGIN, DEFAULT_HFOV, DEFAULT_MIN_DEPTH, DEFAULT_OFFSCREEN_FACTOR,
};
use crate::skylens_errors::SkylensError;

/// Configuration of the celestial-to-screen projection.
///
/// Fields
/// -----------------
/// * `horizontal_fov` – horizontal field of view of the camera in degrees. The same tangent
///   scale is reused vertically, so non-square viewports are anisotropic like a phone preview.
/// * `frustum_margin` – degrees added around the half field of view by the visibility test,
///   so objects slightly off-screen are still prepared for rendering.
/// * `offscreen_factor` – distance, in viewport dimensions from the screen center, at which
///   objects behind the viewer (or numerically degenerate) are parked.
/// * `min_depth` – smallest depth along the optical axis still projected in perspective.
///
/// Defaults
/// -----------------
/// * `horizontal_fov`: 60°
/// * `frustum_margin`: 15°
/// * `offscreen_factor`: 2.0
/// * `min_depth`: 1e-6
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionParams {
    pub horizontal_fov: Degree,
    pub frustum_margin: Degree,
    pub offscreen_factor: f64,
    pub min_depth: f64,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        ProjectionParams {
            horizontal_fov: DEFAULT_HFOV,
            frustum_margin: DEFAULT_FRUSTUM_MARGIN,
            offscreen_factor: DEFAULT_OFFSCREEN_FACTOR,
            min_depth: DEFAULT_MIN_DEPTH,
        }
    }
}

impl ProjectionParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ProjectionParamsBuilder {
        ProjectionParamsBuilder::new()
    }

    /// Half of the horizontal field of view, in degrees.
    pub fn half_fov(&self) -> Degree {
        self.horizontal_fov / 2.0
    }

    /// Angular bound used by the frustum test.
    pub fn view_bound(&self) -> Degree {
        self.half_fov() + self.frustum_margin
    }
}

/// Builder for [`ProjectionParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct ProjectionParamsBuilder {
    params: ProjectionParams,
}

impl ProjectionParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: ProjectionParams::default(),
        }
    }

    pub fn horizontal_fov(mut self, v: Degree) -> Self {
        self.params.horizontal_fov = v;
        self
    }
    pub fn frustum_margin(mut self, v: Degree) -> Self {
        self.params.frustum_margin = v;
        self
    }
    pub fn offscreen_factor(mut self, v: f64) -> Self {
        self.params.offscreen_factor = v;
        self
    }
    pub fn min_depth(mut self, v: f64) -> Self {
        self.params.min_depth = v;
        self
    }

    /// Return true iff a > b and comparable (i.e., not NaN).
    #[inline]
    fn gt(a: f64, b: f64) -> bool {
        a.partial_cmp(&b) == Some(Greater)
    }

    /// Return true iff a >= b and comparable (i.e., not NaN).
    #[inline]
    fn ge(a: f64, b: f64) -> bool {
        matches!(a.partial_cmp(&b), Some(Greater) | Some(Equal))
    }

    /// Return true iff a < b and comparable (i.e., not NaN).
    #[inline]
    fn lt(a: f64, b: f64) -> bool {
        a.partial_cmp(&b) == Some(Less)
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `0 < horizontal_fov < 180` – a perspective projection cannot cover a half space.
    /// * `frustum_margin ≥ 0` and finite.
    /// * `offscreen_factor > 1` and finite – sentinels must land outside the viewport.
    /// * `min_depth > 0` and finite.
    pub fn build(self) -> Result<ProjectionParams, SkylensError> {
        let p = &self.params;

        if !(Self::gt(p.horizontal_fov, 0.0) && Self::lt(p.horizontal_fov, 180.0)) {
            return Err(SkylensError::InvalidProjectionParameter(
                "horizontal_fov must be in (0, 180)".into(),
            ));
        }
        if !(Self::ge(p.frustum_margin, 0.0) && p.frustum_margin.is_finite()) {
            return Err(SkylensError::InvalidProjectionParameter(
                "frustum_margin must be finite and >= 0".into(),
            ));
        }
        if !(Self::gt(p.offscreen_factor, 1.0) && p.offscreen_factor.is_finite()) {
            return Err(SkylensError::InvalidProjectionParameter(
                "offscreen_factor must be finite and > 1".into(),
            ));
        }
        if !(Self::gt(p.min_depth, 0.0) && p.min_depth.is_finite()) {
            return Err(SkylensError::InvalidProjectionParameter(
                "min_depth must be finite and > 0".into(),
            ));
        }

        Ok(self.params)
    }
}

impl fmt::Display for ProjectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Projection Parameters")?;
            writeln!(f, "---------------------")?;
            writeln!(f, "  horizontal_fov   = {:.3}°", self.horizontal_fov)?;
            writeln!(f, "  frustum_margin   = {:.3}°", self.frustum_margin)?;
            writeln!(f, "  offscreen_factor = {:.3}", self.offscreen_factor)?;
            writeln!(f, "  min_depth        = {:.1e}", self.min_depth)
        } else {
            write!(
                f,
                "ProjectionParams(hfov={:.1}°, margin={:.1}°, offscreen={:.1}, min_depth={:.1e})",
                self.horizontal_fov, self.frustum_margin, self.offscreen_factor, self.min_depth
            )
        }
    }
}
