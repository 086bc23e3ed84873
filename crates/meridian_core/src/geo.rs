//! Geographic and screen-space primitives
//!
//! Coordinates are WGS84 degrees. Screen values (points, sizes, insets) are
//! logical points. Projection helpers use spherical Web Mercator with a
//! 512-point world tile at zoom 0.

use serde::{Deserialize, Serialize};

/// Size of the world in points at zoom level 0
pub const TILE_SIZE: f64 = 512.0;

/// Latitude limit of the Web Mercator projection
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

/// A geographic coordinate in degrees
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that both components are finite numbers
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Return the same coordinate with longitude wrapped into `[-180, 180)`
    pub fn wrapped(&self) -> Self {
        Self {
            latitude: self.latitude,
            longitude: wrap(self.longitude, -180.0, 180.0),
        }
    }

    /// Shift this coordinate's longitude by a multiple of 360 so that the
    /// straight path to `end` crosses the antimeridian when that is shorter.
    pub fn unwrap_for_shortest_path(&self, end: &Coordinate) -> Self {
        let delta = end.longitude - self.longitude;
        let mut longitude = self.longitude;
        if delta.abs() > 180.0 {
            if delta > 0.0 {
                longitude += 360.0;
            } else {
                longitude -= 360.0;
            }
        }
        Self {
            latitude: self.latitude,
            longitude,
        }
    }

    /// Approximate equality in degrees
    pub fn approx_eq(&self, other: &Coordinate, epsilon: f64) -> bool {
        (self.latitude - other.latitude).abs() <= epsilon
            && (self.longitude - other.longitude).abs() <= epsilon
    }
}

/// A point in screen space
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A size in screen space
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Insets from each edge of the viewport
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeInsets {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl EdgeInsets {
    pub const ZERO: Self = Self {
        top: 0.0,
        left: 0.0,
        bottom: 0.0,
        right: 0.0,
    };

    pub const fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Uniform insets on every edge
    pub const fn uniform(inset: f64) -> Self {
        Self::new(inset, inset, inset, inset)
    }
}

/// Wrap `value` into the half-open range `[min, max)`
pub fn wrap(value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    if value >= min && value < max {
        return value;
    }
    let span = max - min;
    let wrapped = (value - min).rem_euclid(span) + min;
    // rem_euclid can round up to exactly `max` for tiny negative inputs
    if wrapped >= max {
        min
    } else {
        wrapped
    }
}

/// Normalize a bearing into `[0, 360)`
pub fn normalize_bearing(bearing: f64) -> f64 {
    wrap(bearing, 0.0, 360.0)
}

/// Signed angular difference `to - from` in degrees, in `(-180, 180]`
pub fn shortest_angle_delta(from: f64, to: f64) -> f64 {
    let delta = wrap(to - from, -180.0, 180.0);
    if delta == -180.0 {
        180.0
    } else {
        delta
    }
}

/// Spherical Web Mercator projection helpers
pub mod mercator {
    use super::{Coordinate, ScreenPoint, MAX_MERCATOR_LATITUDE, TILE_SIZE};
    use std::f64::consts::PI;

    /// World size in points for the given zoom scale (`2^zoom`)
    pub fn world_size(zoom_scale: f64) -> f64 {
        TILE_SIZE * zoom_scale
    }

    /// Project a coordinate to world points. Longitude is not wrapped so
    /// unwrapped coordinates stay continuous across the antimeridian.
    pub fn project(coordinate: &Coordinate, zoom_scale: f64) -> ScreenPoint {
        let world = world_size(zoom_scale);
        let latitude = coordinate
            .latitude
            .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
        let x = (coordinate.longitude + 180.0) / 360.0 * world;
        let y = (180.0 - (180.0 / PI) * (PI / 4.0 + latitude * PI / 360.0).tan().ln()) / 360.0
            * world;
        ScreenPoint::new(x, y)
    }

    /// Inverse of [`project`]
    pub fn unproject(point: &ScreenPoint, zoom_scale: f64) -> Coordinate {
        let world = world_size(zoom_scale);
        let longitude = point.x / world * 360.0 - 180.0;
        let y2 = 180.0 - point.y / world * 360.0;
        let latitude = 360.0 / PI * (y2 * PI / 180.0).exp().atan() - 90.0;
        Coordinate::new(latitude, longitude)
    }
}
