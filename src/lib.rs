pub mod angles;
pub mod catalog;
pub mod celestial;
pub mod constants;
pub mod observer_context;
pub mod orientation;
pub mod projection;
pub mod scene;
pub mod session;
pub mod skylens_errors;
pub mod time;

#[cfg(test)]
pub(crate) mod unit_test_global {
    use std::sync::LazyLock;

    use hifitime::{Epoch, TimeScale};

    use crate::catalog::Catalog;
    use crate::observer_context::ObserverLocation;

    pub(crate) static BUILTIN_CATALOG: LazyLock<Catalog> =
        LazyLock::new(|| Catalog::builtin().unwrap());

    /// Paris, a winter evening: Orion close to the southern meridian, the Big Dipper in the
    /// north-east and Cassiopeia in the north-west, all well above the horizon.
    pub(crate) static WINTER_EVENING: LazyLock<(ObserverLocation, Epoch)> = LazyLock::new(|| {
        (
            ObserverLocation::new(48.8566, 2.3522).unwrap(),
            Epoch::from_gregorian(2024, 1, 15, 21, 0, 0, 0, TimeScale::UTC),
        )
    });
}
