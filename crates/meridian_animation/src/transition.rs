//! Camera transitions
//!
//! A [`CameraTransition`] pairs a `from` and an optional `to` value for each
//! camera field. It is seeded from the renderer's current camera and then
//! edited by the caller's `animations` closure before the animator starts.

use meridian_core::{
    normalize_bearing, shortest_angle_delta, CameraPose, CameraState, Coordinate, EdgeInsets,
    ScreenPoint,
};

/// One animated field
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Change<T> {
    pub from: T,
    /// `None` leaves the field untouched
    pub to: Option<T>,
}

impl<T: Copy> Change<T> {
    pub fn new(from: T) -> Self {
        Self { from, to: None }
    }

    /// The target if set, otherwise the start value
    pub fn target(&self) -> T {
        self.to.unwrap_or(self.from)
    }
}

/// Per-field start and end values of a camera animation
#[derive(Clone, Debug, PartialEq)]
pub struct CameraTransition {
    pub center: Change<Coordinate>,
    pub zoom: Change<f64>,
    pub bearing: Change<f64>,
    pub pitch: Change<f64>,
    pub padding: Change<EdgeInsets>,
    pub anchor: Change<ScreenPoint>,
    /// Rotate the shorter way around the compass
    pub optimize_bearing_path: bool,
}

impl CameraTransition {
    /// Seed a transition from the renderer's current camera
    pub fn new(state: &CameraState, anchor: ScreenPoint) -> Self {
        Self {
            center: Change::new(state.center),
            zoom: Change::new(state.zoom),
            bearing: Change::new(state.bearing),
            pitch: Change::new(state.pitch),
            padding: Change::new(state.padding),
            anchor: Change::new(anchor),
            optimize_bearing_path: true,
        }
    }

    /// Set every `to` field that is present in `pose`
    pub fn set_target(&mut self, pose: &CameraPose) {
        if pose.center.is_some() {
            self.center.to = pose.center;
        }
        if pose.zoom.is_some() {
            self.zoom.to = pose.zoom;
        }
        if pose.bearing.is_some() {
            self.bearing.to = pose.bearing;
        }
        if pose.pitch.is_some() {
            self.pitch.to = pose.pitch;
        }
        if pose.padding.is_some() {
            self.padding.to = pose.padding;
        }
        if pose.anchor.is_some() {
            self.anchor.to = pose.anchor;
        }
    }

    /// Start values for the animated fields
    ///
    /// The bearing is re-expressed relative to the target when
    /// `optimize_bearing_path` is set, so a linear interpolation between
    /// `from_pose` and `to_pose` takes the short way round.
    pub fn from_pose(&self) -> CameraPose {
        CameraPose {
            center: self.center.to.map(|_| self.center.from),
            zoom: self.zoom.to.map(|_| self.zoom.from),
            bearing: self.bearing.to.map(|_| self.bearing.from),
            pitch: self.pitch.to.map(|_| self.pitch.from),
            padding: self.padding.to.map(|_| self.padding.from),
            anchor: self.anchor.to.map(|_| self.anchor.from),
        }
    }

    /// End values for the animated fields
    pub fn to_pose(&self) -> CameraPose {
        CameraPose {
            center: self.center.to,
            zoom: self.zoom.to,
            bearing: self.bearing.to.map(|to| self.resolved_bearing_target(to)),
            pitch: self.pitch.to,
            padding: self.padding.to,
            anchor: self.anchor.to,
        }
    }

    /// Bearing target continuous with `bearing.from`
    fn resolved_bearing_target(&self, to: f64) -> f64 {
        if self.optimize_bearing_path {
            self.bearing.from + shortest_angle_delta(self.bearing.from, to)
        } else {
            to
        }
    }

    /// True when no field has a target
    pub fn is_empty(&self) -> bool {
        self.to_pose().is_empty()
    }
}

/// Normalize the bearing of a pose the renderer is about to receive
pub(crate) fn normalized(mut pose: CameraPose) -> CameraPose {
    pose.bearing = pose.bearing.map(normalize_bearing);
    pose
}
