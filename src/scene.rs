//! # Scene composer
//!
//! Turns the [`Catalog`] into something a renderer can draw, at two rates:
//!
//! - [`SceneComposer::refresh_positions`] is the **slow path** (about once per second): it
//!   asks a [`CelestialPositionProvider`] for the horizontal coordinates of every catalog
//!   entry and caches them. A provider failure only marks that entry unavailable until the
//!   next refresh.
//! - [`SceneComposer::compose_frame`] is the **fast path** (every frame): it projects the
//!   cached positions with the latest orientation. Nothing here can fail.
//!
//! ## Visibility rules
//!
//! * Entries at or below [`SceneParams::min_altitude`] (default `-10°`) are dropped before
//!   projection.
//! * Satellites are only drawn above the horizon.
//! * Constellation segments are kept when both of their stars were projected.
//! * The eight compass points and the horizon line are always part of the frame.

use std::fmt;

use hifitime::Epoch;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CARDINAL_DIRECTIONS};
use crate::celestial::{CelestialPosition, CelestialPositionProvider, CelestialTarget};
use crate::constants::{
    Degree, DEFAULT_HEADING, DEFAULT_HORIZON_STEP, DEFAULT_MIN_ALTITUDE, DEFAULT_PITCH,
    SATELLITE_MIN_ALTITUDE,
};
use crate::observer_context::ObserverContext;
use crate::orientation::estimator::OrientationReading;
use crate::orientation::manual::ManualOrientation;
use crate::projection::{CameraFacing, ProjectionEngine, Projected, ScreenPoint, Viewport};
use crate::skylens_errors::SkylensError;

/// What the overlay shows.
///
/// Defaults
/// -----------------
/// * `min_altitude`: -10°
/// * `show_planets`, `show_constellations`, `show_satellites`: true
/// * `horizon_step`: 10°
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneParams {
    pub min_altitude: Degree,
    pub show_planets: bool,
    pub show_constellations: bool,
    pub show_satellites: bool,
    pub horizon_step: Degree,
}

impl Default for SceneParams {
    fn default() -> Self {
        SceneParams {
            min_altitude: DEFAULT_MIN_ALTITUDE,
            show_planets: true,
            show_constellations: true,
            show_satellites: true,
            horizon_step: DEFAULT_HORIZON_STEP,
        }
    }
}

impl SceneParams {
    pub fn builder() -> SceneParamsBuilder {
        SceneParamsBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneParamsBuilder {
    params: SceneParams,
}

impl SceneParamsBuilder {
    pub fn min_altitude(mut self, v: Degree) -> Self {
        self.params.min_altitude = v;
        self
    }
    pub fn show_planets(mut self, v: bool) -> Self {
        self.params.show_planets = v;
        self
    }
    pub fn show_constellations(mut self, v: bool) -> Self {
        self.params.show_constellations = v;
        self
    }
    pub fn show_satellites(mut self, v: bool) -> Self {
        self.params.show_satellites = v;
        self
    }
    pub fn horizon_step(mut self, v: Degree) -> Self {
        self.params.horizon_step = v;
        self
    }

    /// Validation rules
    /// -----------------
    /// * `-90 ≤ min_altitude ≤ 90`
    /// * `0 < horizon_step ≤ 90`
    pub fn build(self) -> Result<SceneParams, SkylensError> {
        let p = &self.params;
        if !(-90.0..=90.0).contains(&p.min_altitude) {
            return Err(SkylensError::InvalidSceneParameter(
                "min_altitude must be in [-90, 90]".into(),
            ));
        }
        if !(p.horizon_step > 0.0 && p.horizon_step <= 90.0) {
            return Err(SkylensError::InvalidSceneParameter(
                "horizon_step must be in (0, 90]".into(),
            ));
        }
        Ok(self.params)
    }
}

impl fmt::Display for SceneParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Scene Parameters")?;
            writeln!(f, "----------------")?;
            writeln!(f, "  min_altitude        = {:.1}°", self.min_altitude)?;
            writeln!(f, "  show_planets        = {}", self.show_planets)?;
            writeln!(f, "  show_constellations = {}", self.show_constellations)?;
            writeln!(f, "  show_satellites     = {}", self.show_satellites)?;
            writeln!(f, "  horizon_step        = {:.1}°", self.horizon_step)
        } else {
            write!(
                f,
                "SceneParams(min_alt={:.1}°, planets={}, constellations={}, satellites={})",
                self.min_altitude, self.show_planets, self.show_constellations, self.show_satellites
            )
        }
    }
}

/// Kind of a point-like object of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    SolarSystem,
    Satellite,
}

/// Cached horizontal position of a point-like catalog entry.
#[derive(Debug, Clone, PartialEq)]
struct PositionedObject {
    id: String,
    name: String,
    kind: ObjectKind,
    position: Option<CelestialPosition>,
}

/// Cached horizontal positions of a constellation figure.
#[derive(Debug, Clone, PartialEq)]
struct PositionedConstellation {
    id: String,
    name: String,
    label: Option<CelestialPosition>,
    stars: Vec<Option<CelestialPosition>>,
    lines: Vec<(usize, usize)>,
}

/// Outcome of one slow-path refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshReport {
    pub available: usize,
    pub unavailable: usize,
}

/// A projected point-like object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedObject {
    pub id: String,
    pub name: String,
    pub kind: ObjectKind,
    pub position: CelestialPosition,
    pub projected: Projected,
}

/// A projected constellation figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedConstellation {
    pub id: String,
    pub name: String,
    pub label: Option<Projected>,
    /// Same indexing as the catalog stars; `None` for stars not drawn this frame.
    pub stars: Vec<Option<Projected>>,
    /// Segments whose two ends are both in `stars`.
    pub lines: Vec<(usize, usize)>,
}

/// A projected compass point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedCardinal {
    pub label: &'static str,
    pub projected: Projected,
}

/// Everything to draw for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneFrame {
    pub heading: Degree,
    pub pitch: Degree,
    pub objects: Vec<RenderedObject>,
    pub constellations: Vec<RenderedConstellation>,
    pub cardinals: Vec<RenderedCardinal>,
    pub horizon: Vec<ScreenPoint>,
}

impl SceneFrame {
    pub fn object(&self, id: &str) -> Option<&RenderedObject> {
        self.objects.iter().find(|o| o.id == id)
    }
}

/// Projects catalog content with the current orientation.
#[derive(Debug, Clone)]
pub struct SceneComposer {
    engine: ProjectionEngine,
    params: SceneParams,
    objects: Vec<PositionedObject>,
    constellations: Vec<PositionedConstellation>,
    refreshed_at: Option<Epoch>,
}

impl SceneComposer {
    pub fn new(engine: ProjectionEngine, params: SceneParams) -> Self {
        SceneComposer {
            engine,
            params,
            objects: Vec::new(),
            constellations: Vec::new(),
            refreshed_at: None,
        }
    }

    pub fn engine(&self) -> &ProjectionEngine {
        &self.engine
    }

    pub fn params(&self) -> &SceneParams {
        &self.params
    }

    /// Instant of the last refresh, in the observer's (possibly offset) time.
    pub fn refreshed_at(&self) -> Option<Epoch> {
        self.refreshed_at
    }

    /// Ask `provider` for one target, turning every failure into `None`.
    fn locate<P>(
        provider: &P,
        target: &CelestialTarget,
        time: &Epoch,
        context: &ObserverContext,
        report: &mut RefreshReport,
    ) -> Option<CelestialPosition>
    where
        P: CelestialPositionProvider + ?Sized,
    {
        let located = provider
            .position_of(target, time, &context.location)
            .and_then(|p| {
                if p.altitude.is_finite() && p.azimuth.is_finite() {
                    Ok(p)
                } else {
                    Err(SkylensError::ProviderFailure(format!(
                        "non-finite position for {target}"
                    )))
                }
            });
        match located {
            Ok(p) => {
                report.available += 1;
                Some(p)
            }
            Err(err) => {
                log::debug!("{target} unavailable this tick: {err}");
                report.unavailable += 1;
                None
            }
        }
    }

    /// Recompute the horizontal position of every catalog entry.
    ///
    /// Arguments
    /// -----------------
    /// * `catalog`: what to locate.
    /// * `provider`: source of horizontal coordinates.
    /// * `context`: observer location and time offset.
    /// * `now`: wall clock; the context offset is applied on top of it.
    ///
    /// Return
    /// ----------
    /// * How many positions were obtained and how many failed. Failed entries are kept in
    ///   the cache as unavailable and skipped by [`compose_frame`](Self::compose_frame).
    pub fn refresh_positions<P>(
        &mut self,
        catalog: &Catalog,
        provider: &P,
        context: &ObserverContext,
        now: &Epoch,
    ) -> RefreshReport
    where
        P: CelestialPositionProvider + ?Sized,
    {
        let time = context.current_time(now);
        let mut report = RefreshReport::default();

        let bodies = catalog.solar_system.iter().map(|b| PositionedObject {
            id: b.id.id().to_string(),
            name: b.name.clone(),
            kind: ObjectKind::SolarSystem,
            position: Self::locate(provider, &b.target(), &time, context, &mut report),
        });
        let mut objects: Vec<PositionedObject> = bodies.collect();
        objects.extend(catalog.satellites.iter().map(|s| PositionedObject {
            id: s.id.clone(),
            name: s.name.clone(),
            kind: ObjectKind::Satellite,
            position: Self::locate(provider, &s.target(), &time, context, &mut report),
        }));

        let mut constellations = Vec::with_capacity(catalog.constellations.len());
        for c in &catalog.constellations {
            let label = Self::locate(provider, &c.label_target(), &time, context, &mut report);
            let stars = c
                .stars
                .iter()
                .map(|s| Self::locate(provider, &s.target(), &time, context, &mut report))
                .collect();
            constellations.push(PositionedConstellation {
                id: c.id.clone(),
                name: c.name.clone(),
                label,
                stars,
                lines: c.lines.clone(),
            });
        }

        self.objects = objects;
        self.constellations = constellations;
        self.refreshed_at = Some(time);

        log::debug!(
            "refreshed sky positions at {time}: {} available, {} unavailable",
            report.available,
            report.unavailable
        );
        report
    }

    fn drawable(&self, position: &CelestialPosition) -> bool {
        position.altitude > self.params.min_altitude
    }

    /// Project the cached positions with the given orientation.
    ///
    /// `heading`/`pitch` of `None` fall back to north on the horizon.
    pub fn compose_frame(
        &self,
        heading: Option<Degree>,
        pitch: Option<Degree>,
        viewport: &Viewport,
        facing: CameraFacing,
    ) -> SceneFrame {
        let engine = &self.engine;
        let project = |p: &CelestialPosition| {
            engine.project_with_visibility(p, heading, pitch, viewport, facing)
        };

        let objects = self
            .objects
            .iter()
            .filter(|o| match o.kind {
                ObjectKind::SolarSystem => self.params.show_planets,
                ObjectKind::Satellite => self.params.show_satellites,
            })
            .filter_map(|o| {
                let position = o.position?;
                let visible = match o.kind {
                    ObjectKind::SolarSystem => self.drawable(&position),
                    ObjectKind::Satellite => position.altitude > SATELLITE_MIN_ALTITUDE,
                };
                visible.then(|| RenderedObject {
                    id: o.id.clone(),
                    name: o.name.clone(),
                    kind: o.kind,
                    position,
                    projected: project(&position),
                })
            })
            .collect();

        let constellations = if self.params.show_constellations {
            self.constellations
                .iter()
                .filter_map(|c| {
                    let stars: Vec<Option<Projected>> = c
                        .stars
                        .iter()
                        .map(|s| s.filter(|p| self.drawable(p)).map(|p| project(&p)))
                        .collect();
                    let label = c.label.filter(|p| self.drawable(p)).map(|p| project(&p));
                    if label.is_none() && stars.iter().all(Option::is_none) {
                        return None;
                    }
                    let drawn = |i: usize| stars.get(i).is_some_and(Option::is_some);
                    let lines = c
                        .lines
                        .iter()
                        .copied()
                        .filter(|(a, b)| drawn(*a) && drawn(*b))
                        .collect();
                    Some(RenderedConstellation {
                        id: c.id.clone(),
                        name: c.name.clone(),
                        label,
                        stars,
                        lines,
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        let cardinals = CARDINAL_DIRECTIONS
            .iter()
            .filter_map(|d| {
                let position = CelestialPosition::new(0.0, d.azimuth as Degree).ok()?;
                Some(RenderedCardinal {
                    label: d.label,
                    projected: project(&position),
                })
            })
            .collect();

        let horizon =
            engine.horizon_polyline(heading, pitch, viewport, facing, self.params.horizon_step);

        SceneFrame {
            heading: heading.unwrap_or(DEFAULT_HEADING),
            pitch: pitch.unwrap_or(DEFAULT_PITCH),
            objects,
            constellations,
            cardinals,
            horizon,
        }
    }

    /// [`compose_frame`](Self::compose_frame) driven by an estimator reading, with the
    /// manual orientation as fallback while no sensor sample is available.
    pub fn compose_from_reading(
        &self,
        reading: &OrientationReading,
        manual: Option<&ManualOrientation>,
        viewport: &Viewport,
        facing: CameraFacing,
    ) -> SceneFrame {
        let (heading, pitch) = reading.effective_orientation(manual);
        self.compose_frame(Some(heading), Some(pitch), viewport, facing)
    }
}
