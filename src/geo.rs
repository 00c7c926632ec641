//! Geographic node positions.
//!
//! The partitioner treats positions as an opaque 2D embedding: the only
//! consumers are the inertial projections, which order nodes along a line
//! through the plane.

use serde::{Deserialize, Serialize};

/// A 2D node position. Interpreted as latitude/longitude for road networks,
/// but any planar embedding works.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPos {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPos {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Projection of this position onto the direction `dir`, used to order
    /// nodes along a line.
    pub fn project(&self, dir: GeoPos) -> f64 {
        self.lat * dir.lat + self.lon * dir.lon
    }
}

/// Unit vector at angle `phi` (radians), used to fan out projection
/// directions evenly over the half circle.
pub fn unit_direction(phi: f64) -> GeoPos {
    GeoPos {
        lat: phi.cos(),
        lon: phi.sin(),
    }
}
