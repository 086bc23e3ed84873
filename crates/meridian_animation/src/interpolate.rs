//! Interpolatable camera values
//!
//! Linear interpolation for the scalar and screen-space parts of a camera,
//! plus the two geographic special cases: longitudes that wrap around the
//! antimeridian and bearings that wrap around the compass.

use meridian_core::{
    normalize_bearing, shortest_angle_delta, CameraPose, Coordinate, EdgeInsets, ScreenPoint,
};

use crate::transition::CameraTransition;

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone {
    /// Linearly interpolate between self and other by factor t
    ///
    /// `t` may leave `[0, 1]` for overshooting curves.
    fn lerp(&self, other: &Self, t: f64) -> Self;

    /// Check if two values are approximately equal
    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool;
}

// ============================================================================
// Scalar and screen-space values
// ============================================================================

impl Interpolate for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self - other).abs() < epsilon
    }
}

impl Interpolate for ScreenPoint {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        ScreenPoint::new(self.x.lerp(&other.x, t), self.y.lerp(&other.y, t))
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.x.approx_eq(&other.x, epsilon) && self.y.approx_eq(&other.y, epsilon)
    }
}

impl Interpolate for EdgeInsets {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        EdgeInsets::new(
            self.top.lerp(&other.top, t),
            self.left.lerp(&other.left, t),
            self.bottom.lerp(&other.bottom, t),
            self.right.lerp(&other.right, t),
        )
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.top.approx_eq(&other.top, epsilon)
            && self.left.approx_eq(&other.left, epsilon)
            && self.bottom.approx_eq(&other.bottom, epsilon)
            && self.right.approx_eq(&other.right, epsilon)
    }
}

// ============================================================================
// Wrapping values
// ============================================================================

/// Interpolate a coordinate, crossing the antimeridian when that is shorter
///
/// Latitude is linear; the result's longitude is wrapped into `[-180, 180)`.
pub fn interpolate_coordinate(from: &Coordinate, to: &Coordinate, t: f64) -> Coordinate {
    let start = from.unwrap_for_shortest_path(to);
    Coordinate::new(
        start.latitude.lerp(&to.latitude, t),
        start.longitude.lerp(&to.longitude, t),
    )
    .wrapped()
}

/// Interpolate a bearing along the shorter arc, normalized into `[0, 360)`
pub fn interpolate_direction(from: f64, to: f64, t: f64) -> f64 {
    normalize_bearing(from + shortest_angle_delta(from, to) * t)
}

// ============================================================================
// Camera poses
// ============================================================================

/// Interpolates whole camera poses field by field
///
/// A field is interpolated only when both endpoints specify it; every
/// other field is left unspecified so the renderer keeps its value. The
/// anchor is a pivot rather than an animated value: when both ends name
/// one, the target anchor is passed through unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct CameraOptionsInterpolator;

impl CameraOptionsInterpolator {
    pub fn new() -> Self {
        Self
    }

    pub fn interpolate(&self, from: &CameraPose, to: &CameraPose, fraction: f64) -> CameraPose {
        CameraPose {
            center: from
                .center
                .zip(to.center)
                .map(|(a, b)| interpolate_coordinate(&a, &b, fraction)),
            zoom: from.zoom.zip(to.zoom).map(|(a, b)| a.lerp(&b, fraction)),
            bearing: from
                .bearing
                .zip(to.bearing)
                .map(|(a, b)| interpolate_direction(a, b, fraction)),
            pitch: from.pitch.zip(to.pitch).map(|(a, b)| a.lerp(&b, fraction)),
            padding: from
                .padding
                .zip(to.padding)
                .map(|(a, b)| a.lerp(&b, fraction)),
            anchor: from.anchor.zip(to.anchor).map(|(_, b)| b),
        }
    }

    /// Pose at `fraction` along a transition
    ///
    /// Unlike [`interpolate`](Self::interpolate) the bearing follows the
    /// transition's resolved path, so `optimize_bearing_path = false` can
    /// take the long way round. Anchors are interpolated because a
    /// transition may move the pivot deliberately.
    pub fn interpolate_transition(
        &self,
        transition: &CameraTransition,
        fraction: f64,
    ) -> CameraPose {
        let from = transition.from_pose();
        let to = transition.to_pose();
        CameraPose {
            center: from
                .center
                .zip(to.center)
                .map(|(a, b)| interpolate_coordinate(&a, &b, fraction)),
            zoom: from.zoom.zip(to.zoom).map(|(a, b)| a.lerp(&b, fraction)),
            bearing: from
                .bearing
                .zip(to.bearing)
                .map(|(a, b)| normalize_bearing(a.lerp(&b, fraction))),
            pitch: from.pitch.zip(to.pitch).map(|(a, b)| a.lerp(&b, fraction)),
            padding: from
                .padding
                .zip(to.padding)
                .map(|(a, b)| a.lerp(&b, fraction)),
            anchor: from
                .anchor
                .zip(to.anchor)
                .map(|(a, b)| a.lerp(&b, fraction)),
        }
    }
}
