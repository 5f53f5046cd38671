use std::fmt::Display;
use std::sync::Arc;

use crate::geo::Point;

/// An opaque identifier for a [`Station`].
///
/// Assigned by whoever owns the station records; the simulator never interprets it.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct StationId(Arc<str>);

impl Display for StationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for StationId {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for StationId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

/// A fixed destination the driver converges on.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: StationId,
    pub location: Point,
}

impl Station {
    pub fn new(id: impl Into<StationId>, location: Point) -> Self {
        Self {
            id: id.into(),
            location,
        }
    }
}
