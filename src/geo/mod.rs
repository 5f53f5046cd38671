//! Great-circle geometry on a spherical Earth.
//!
//! All angles cross the module boundary in degrees and are converted to radians internally.
//! Distances are in meters.

pub mod error;

use std::fmt;

use self::error::InvalidCoordinate;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Coordinates closer than this (in degrees) compare equal.
const COORDINATE_EPSILON_DEG: f64 = 1e-9;

/// A latitude/longitude pair in degrees on the WGS84 sphere approximation.
///
/// A [`Point`] can only be constructed with coordinates inside the valid ranges, so every
/// function in this module is total over its inputs.
#[derive(Debug, Clone, Copy)]
pub struct Point {
    lat: f64,
    lon: f64,
}

impl Point {
    /// Create a new [`Point`], rejecting latitudes outside [-90, 90], longitudes outside
    /// [-180, 180] and non-finite values.
    pub fn new(lat: f64, lon: f64) -> Result<Self, InvalidCoordinate> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);

        if valid {
            Ok(Self { lat, lon })
        } else {
            Err(InvalidCoordinate { lat, lon })
        }
    }

    /// Construct from values already known to be in range, normalizing them.
    fn normalized(lat: f64, lon: f64) -> Self {
        Self {
            lat: lat.clamp(-90.0, 90.0),
            lon: wrap_longitude(lon),
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        (self.lat - other.lat).abs() <= COORDINATE_EPSILON_DEG
            && (self.lon - other.lon).abs() <= COORDINATE_EPSILON_DEG
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Haversine great-circle distance between `a` and `b` in meters.
pub fn distance(a: Point, b: Point) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat * 0.5).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);
    // Rounding can push `h` a hair past 1 for antipodal points.
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Initial great-circle bearing from `a` to `b` in degrees, within [0, 360).
///
/// Coincident points have no defined bearing; 0 is returned. Callers should treat a
/// near-zero [`distance`] as terminal before relying on the bearing.
pub fn bearing(a: Point, b: Point) -> f64 {
    if a == b {
        return 0.0;
    }

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

    normalize_bearing(y.atan2(x).to_degrees())
}

/// Project the point reached by travelling `distance_m` from `origin` along the initial
/// bearing `bearing_deg`.
pub fn destination(origin: Point, bearing_deg: f64, distance_m: f64) -> Point {
    let angular = distance_m / EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();
    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();

    let sin_lat2 = lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * theta.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();
    let lon2 = lon1
        + (theta.sin() * angular.sin() * lat1.cos()).atan2(angular.cos() - lat1.sin() * sin_lat2);

    Point::normalized(lat2.to_degrees(), lon2.to_degrees())
}

fn normalize_bearing(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid of a tiny negative value rounds up to exactly 360.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

fn wrap_longitude(deg: f64) -> f64 {
    if (-180.0..=180.0).contains(&deg) {
        return deg;
    }
    (deg + 180.0).rem_euclid(360.0) - 180.0
}
