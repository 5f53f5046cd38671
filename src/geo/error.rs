//! Error types for geographic coordinates.

/// Indicates that a latitude/longitude pair lies outside the valid WGS84 ranges.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("invalid coordinate (lat {lat}, lon {lon}): latitude must be in [-90, 90] and longitude in [-180, 180]")]
pub struct InvalidCoordinate {
    pub lat: f64,
    pub lon: f64,
}
