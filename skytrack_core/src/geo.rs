//! The "GEO" Projector - local tangent-plane offsets from geodetic coordinates
//!
//! Uses the equirectangular approximation: the neighbourhood of the observer
//! is treated as flat, with a latitude-dependent longitude scale. Accurate for
//! the short ranges a receiver sees; not geodesically exact, and the
//! longitude scale collapses toward zero near the poles.

use serde::{Deserialize, Serialize};

/// Meters per degree of latitude (constant in this approximation).
pub const METERS_PER_DEG_LAT: f64 = 111_133.0;

/// Meters per degree of longitude at the equator.
pub const METERS_PER_DEG_LON_EQUATOR: f64 = 111_320.0;

/// Feet → meters.
pub const FEET_TO_METERS: f64 = 0.3048;

/// The reference frame all projections are computed against.
///
/// Supplied from outside every update cycle (live sensor fix or a fixed test
/// value); the core never owns or mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserverPose {
    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Altitude in meters above the local datum
    pub altitude_m: f64,
}

impl ObserverPose {
    pub fn new(latitude: f64, longitude: f64, altitude_m: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude_m,
        }
    }

    /// Whether latitude/longitude are inside their valid degree ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.altitude_m.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Offset of a target from the observer, in real-world meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoOffset {
    pub east_m: f64,
    pub north_m: f64,
    pub up_m: f64,

    /// Horizontal distance, ignoring altitude
    pub planar_distance_m: f64,
}

impl GeoOffset {
    /// Returns `[east, north, up]`.
    #[inline]
    pub fn as_enu(&self) -> [f64; 3] {
        [self.east_m, self.north_m, self.up_m]
    }
}

#[inline]
pub fn feet_to_meters(feet: f64) -> f64 {
    feet * FEET_TO_METERS
}

#[inline]
pub fn meters_to_feet(meters: f64) -> f64 {
    meters / FEET_TO_METERS
}

/// Meters per degree of longitude at the given latitude.
#[inline]
pub fn meters_per_deg_lon(latitude_deg: f64) -> f64 {
    METERS_PER_DEG_LON_EQUATOR * latitude_deg.to_radians().cos()
}

/// Project a target onto the observer's local tangent plane.
///
/// # Arguments
/// * `observer` - Reference pose
/// * `target_lat`, `target_lon` - Target position in degrees
/// * `target_alt_feet` - Target altitude in feet
///
/// Pure arithmetic: always returns a value, which may be degenerate for
/// observers close to ±90° latitude.
pub fn project(
    observer: &ObserverPose,
    target_lat: f64,
    target_lon: f64,
    target_alt_feet: f64,
) -> GeoOffset {
    let delta_lat = target_lat - observer.latitude;
    let delta_lon = target_lon - observer.longitude;

    let north_m = delta_lat * METERS_PER_DEG_LAT;
    let east_m = delta_lon * meters_per_deg_lon(observer.latitude);
    let up_m = feet_to_meters(target_alt_feet) - observer.altitude_m;

    GeoOffset {
        east_m,
        north_m,
        up_m,
        planar_distance_m: (east_m * east_m + north_m * north_m).sqrt(),
    }
}

/// Inverse of [`project`] for the horizontal plane: the lat/lon lying
/// `east_m`/`north_m` away from the observer.
pub fn offset_to_lat_lon(observer: &ObserverPose, east_m: f64, north_m: f64) -> (f64, f64) {
    let lat = observer.latitude + north_m / METERS_PER_DEG_LAT;
    let lon = observer.longitude + east_m / meters_per_deg_lon(observer.latitude);
    (lat, lon)
}
