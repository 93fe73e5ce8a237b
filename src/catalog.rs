//! # Sky catalog
//!
//! Static content drawn by the overlay:
//!
//! - the nine solar system bodies, in display order,
//! - three constellation figures (Orion, Ursa Major, Cassiopeia), whose stars are stored
//!   as a CSV table embedded in the binary and whose stick figures are index pairs into
//!   that table,
//! - the eight compass points shown along the horizon,
//! - the satellites tracked by the external propagator.
//!
//! The star table has the columns `constellation,name,ra_hours,dec_deg,brightness`;
//! `name` may be left empty.

use std::collections::HashMap;
use std::io::Read;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::angles::shortest_delta;
use crate::celestial::{BodyId, CelestialTarget};
use crate::constants::{Degree, Hour, Pixel};
use crate::skylens_errors::SkylensError;

const BUILTIN_STARS: &str = include_str!("../data/stars.csv");

/// A solar system body as listed by the overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarSystemEntry {
    pub id: BodyId,
    pub name: String,
    /// Astronomical symbol shown on the marker.
    pub symbol: String,
    /// Marker diameter.
    pub marker_size: Pixel,
    pub visible_to_naked_eye: bool,
}

impl SolarSystemEntry {
    /// The entry of `id` with its built-in marker attributes.
    pub fn builtin(id: BodyId) -> Self {
        let (symbol, marker_size, visible_to_naked_eye) = match id {
            BodyId::Mercury => ("☿", 12.0, true),
            BodyId::Venus => ("♀", 18.0, true),
            BodyId::Mars => ("♂", 16.0, true),
            BodyId::Jupiter => ("♃", 32.0, true),
            BodyId::Saturn => ("♄", 28.0, true),
            BodyId::Uranus => ("♅", 22.0, false),
            BodyId::Neptune => ("♆", 20.0, false),
            BodyId::Moon => ("☾", 30.0, true),
            BodyId::Sun => ("☉", 36.0, true),
        };
        SolarSystemEntry {
            id,
            name: id.name().to_string(),
            symbol: symbol.to_string(),
            marker_size,
            visible_to_naked_eye,
        }
    }

    pub fn target(&self) -> CelestialTarget {
        CelestialTarget::Body(self.id)
    }
}

/// One star of a constellation figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStar {
    pub name: Option<String>,
    pub ra_hours: Hour,
    pub dec_deg: Degree,
    /// Relative brightness in `[0, 1]`, used for the marker size.
    pub brightness: f64,
}

impl CatalogStar {
    pub fn target(&self) -> CelestialTarget {
        CelestialTarget::Equatorial {
            ra_hours: self.ra_hours,
            dec_deg: self.dec_deg,
        }
    }
}

/// A constellation stick figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constellation {
    pub id: String,
    pub name: String,
    pub latin_name: String,
    /// Label anchor.
    pub ra_hours: Hour,
    pub dec_deg: Degree,
    pub stars: Vec<CatalogStar>,
    /// Segments between stars, as indices into `stars`.
    pub lines: Vec<(usize, usize)>,
}

impl Constellation {
    pub fn label_target(&self) -> CelestialTarget {
        CelestialTarget::Equatorial {
            ra_hours: self.ra_hours,
            dec_deg: self.dec_deg,
        }
    }

    fn validate(&self) -> Result<(), SkylensError> {
        if self.stars.is_empty() {
            return Err(SkylensError::InvalidCatalog(format!(
                "constellation '{}' has no stars",
                self.id
            )));
        }
        if let Some((a, b)) = self
            .lines
            .iter()
            .find(|(a, b)| *a >= self.stars.len() || *b >= self.stars.len())
        {
            return Err(SkylensError::InvalidCatalog(format!(
                "constellation '{}': line ({a}, {b}) out of range for {} stars",
                self.id,
                self.stars.len()
            )));
        }
        Ok(())
    }
}

/// An artificial satellite whose position comes from the propagator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatelliteEntry {
    pub id: String,
    pub name: String,
}

impl SatelliteEntry {
    pub fn target(&self) -> CelestialTarget {
        CelestialTarget::Satellite(self.id.clone())
    }
}

/// A labelled compass point on the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardinalDirection {
    pub label: &'static str,
    pub azimuth: u16,
}

pub const CARDINAL_DIRECTIONS: [CardinalDirection; 8] = [
    CardinalDirection { label: "N", azimuth: 0 },
    CardinalDirection { label: "NE", azimuth: 45 },
    CardinalDirection { label: "E", azimuth: 90 },
    CardinalDirection { label: "SE", azimuth: 135 },
    CardinalDirection { label: "S", azimuth: 180 },
    CardinalDirection { label: "SW", azimuth: 225 },
    CardinalDirection { label: "W", azimuth: 270 },
    CardinalDirection { label: "NW", azimuth: 315 },
];

/// Compass readout suffix: the main cardinal point within 22.5° of `heading`, if any.
pub fn cardinal_label(heading: Degree) -> Option<&'static str> {
    CARDINAL_DIRECTIONS
        .iter()
        .step_by(2)
        .find(|d| shortest_delta(heading, d.azimuth as Degree).abs() < 22.5)
        .map(|d| d.label)
}

/// Row of the star table.
#[derive(Debug, Deserialize)]
struct StarRecord {
    constellation: String,
    name: Option<String>,
    ra_hours: Hour,
    dec_deg: Degree,
    brightness: f64,
}

/// Constellation data that does not live in the star table.
struct FigureDefinition {
    id: &'static str,
    name: &'static str,
    latin_name: &'static str,
    ra_hours: Hour,
    dec_deg: Degree,
    lines: &'static [(usize, usize)],
}

const FIGURES: [FigureDefinition; 3] = [
    FigureDefinition {
        id: "orion",
        name: "Orion",
        latin_name: "Orion",
        ra_hours: 5.5,
        dec_deg: 5.0,
        lines: &[(0, 1), (0, 2), (1, 4), (2, 3), (3, 4), (2, 5), (4, 6)],
    },
    FigureDefinition {
        id: "ursa-major",
        name: "Big Dipper",
        latin_name: "Ursa Major",
        ra_hours: 11.0,
        dec_deg: 50.0,
        lines: &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 6)],
    },
    FigureDefinition {
        id: "cassiopeia",
        name: "Cassiopeia",
        latin_name: "Cassiopeia",
        ra_hours: 1.0,
        dec_deg: 60.0,
        lines: &[(0, 1), (1, 2), (2, 3), (3, 4)],
    },
];

/// Everything the scene composer can draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub solar_system: Vec<SolarSystemEntry>,
    pub constellations: Vec<Constellation>,
    pub satellites: Vec<SatelliteEntry>,
}

impl Catalog {
    /// The catalog compiled into the crate.
    pub fn builtin() -> Result<Self, SkylensError> {
        let constellations = Self::constellations_from_reader(BUILTIN_STARS.as_bytes())?;
        let catalog = Catalog {
            solar_system: BodyId::ALL.into_iter().map(SolarSystemEntry::builtin).collect(),
            constellations,
            satellites: vec![SatelliteEntry {
                id: "iss".into(),
                name: "ISS".into(),
            }],
        };
        log::debug!(
            "loaded catalog: {} bodies, {} constellations, {} satellites",
            catalog.solar_system.len(),
            catalog.constellations.len(),
            catalog.satellites.len()
        );
        Ok(catalog)
    }

    /// Parse a star table and attach it to the built-in constellation figures.
    ///
    /// Stars keep the row order of the table within each constellation; rows naming an
    /// unknown constellation are ignored.
    ///
    /// Return
    /// ----------
    /// * The figures in catalog order, or `CsvError` for a malformed table and
    ///   `InvalidCatalog` when a figure has no stars or a line points past its stars.
    pub fn constellations_from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<Constellation>, SkylensError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let records = csv_reader
            .deserialize::<StarRecord>()
            .collect::<Result<Vec<_>, _>>()?;

        let mut by_figure: HashMap<String, Vec<CatalogStar>> = records
            .into_iter()
            .map(|r| {
                (
                    r.constellation,
                    CatalogStar {
                        name: r.name.filter(|n| !n.is_empty()),
                        ra_hours: r.ra_hours,
                        dec_deg: r.dec_deg,
                        brightness: r.brightness.clamp(0.0, 1.0),
                    },
                )
            })
            .into_group_map();

        FIGURES
            .iter()
            .map(|def| -> Result<Constellation, SkylensError> {
                let constellation = Constellation {
                    id: def.id.to_string(),
                    name: def.name.to_string(),
                    latin_name: def.latin_name.to_string(),
                    ra_hours: def.ra_hours,
                    dec_deg: def.dec_deg,
                    stars: by_figure.remove(def.id).unwrap_or_default(),
                    lines: def.lines.to_vec(),
                };
                constellation.validate()?;
                Ok(constellation)
            })
            .collect()
    }

    pub fn constellation(&self, id: &str) -> Option<&Constellation> {
        self.constellations.iter().find(|c| c.id == id)
    }

    pub fn body(&self, id: BodyId) -> Option<&SolarSystemEntry> {
        self.solar_system.iter().find(|b| b.id == id)
    }
}
