#![allow(dead_code)]

use std::collections::HashMap;

use approx::assert_abs_diff_eq;
use hifitime::{Epoch, TimeScale};
use skylens::celestial::{CelestialPosition, CelestialTarget};
use skylens::observer_context::ObserverLocation;
use skylens::projection::{ScreenPoint, Viewport};
use skylens::skylens_errors::SkylensError;

pub fn assert_point_close(actual: &ScreenPoint, expected: &ScreenPoint, epsilon: f64) {
    assert_abs_diff_eq!(actual.x, expected.x, epsilon = epsilon);
    assert_abs_diff_eq!(actual.y, expected.y, epsilon = epsilon);
}

pub fn square_viewport() -> Viewport {
    Viewport::new(1000.0, 1000.0).unwrap()
}

pub fn phone_viewport() -> Viewport {
    Viewport::new(1080.0, 1920.0).unwrap()
}

pub fn reference_epoch() -> Epoch {
    Epoch::from_gregorian(2024, 3, 20, 22, 0, 0, 0, TimeScale::UTC)
}

/// Provider serving fixed alt/az pairs keyed by the target's display name.
///
/// Targets missing from the table fail with `ProviderFailure`.
pub fn table_provider(
    table: &[(&str, f64, f64)],
) -> impl Fn(&CelestialTarget, &Epoch, &ObserverLocation) -> Result<CelestialPosition, SkylensError>
       + Send
       + Sync
       + 'static {
    let table: HashMap<String, (f64, f64)> = table
        .iter()
        .map(|(name, alt, az)| (name.to_string(), (*alt, *az)))
        .collect();
    move |target: &CelestialTarget, _: &Epoch, _: &ObserverLocation| {
        let key = target.to_string();
        match table.get(&key) {
            Some((alt, az)) => CelestialPosition::new(*alt, *az),
            None => Err(SkylensError::ProviderFailure(format!("no data for {key}"))),
        }
    }
}
