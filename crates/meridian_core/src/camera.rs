//! Camera pose types
//!
//! [`CameraPose`] is a partial camera description where every field is
//! optional and `None` means "keep the current value". [`CameraState`] is the
//! renderer's fully specified camera.

use serde::{Deserialize, Serialize};

use crate::geo::{normalize_bearing, Coordinate, EdgeInsets, ScreenPoint};

/// A partial camera description
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraPose {
    pub center: Option<Coordinate>,
    pub zoom: Option<f64>,
    /// Degrees clockwise from north
    pub bearing: Option<f64>,
    /// Degrees away from nadir
    pub pitch: Option<f64>,
    pub padding: Option<EdgeInsets>,
    /// Screen point the zoom and rotation pivot around
    pub anchor: Option<ScreenPoint>,
}

impl CameraPose {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_center(mut self, center: Coordinate) -> Self {
        self.center = Some(center);
        self
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }

    pub fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = Some(bearing);
        self
    }

    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn with_padding(mut self, padding: EdgeInsets) -> Self {
        self.padding = Some(padding);
        self
    }

    pub fn with_anchor(mut self, anchor: ScreenPoint) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// True when no field is specified
    pub fn is_empty(&self) -> bool {
        self.center.is_none()
            && self.zoom.is_none()
            && self.bearing.is_none()
            && self.pitch.is_none()
            && self.padding.is_none()
            && self.anchor.is_none()
    }
}

/// The renderer's fully specified camera
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub center: Coordinate,
    pub zoom: f64,
    pub bearing: f64,
    pub pitch: f64,
    pub padding: EdgeInsets,
}

impl CameraState {
    pub fn new(center: Coordinate, zoom: f64, bearing: f64, pitch: f64) -> Self {
        Self {
            center,
            zoom,
            bearing,
            pitch,
            padding: EdgeInsets::ZERO,
        }
    }

    /// Apply the specified fields of a pose, clamped to `bounds`
    pub fn apply(&mut self, pose: &CameraPose, bounds: &CameraBounds) {
        if let Some(center) = pose.center.filter(Coordinate::is_finite) {
            self.center = Coordinate::new(center.latitude.clamp(-90.0, 90.0), center.longitude)
                .wrapped();
        }
        if let Some(zoom) = pose.zoom.filter(|z| z.is_finite()) {
            self.zoom = bounds.clamp_zoom(zoom);
        }
        if let Some(bearing) = pose.bearing.filter(|b| b.is_finite()) {
            self.bearing = normalize_bearing(bearing);
        }
        if let Some(pitch) = pose.pitch.filter(|p| p.is_finite()) {
            self.pitch = bounds.clamp_pitch(pitch);
        }
        if let Some(padding) = pose.padding {
            self.padding = padding;
        }
    }
}

impl From<CameraState> for CameraPose {
    fn from(state: CameraState) -> Self {
        CameraPose {
            center: Some(state.center),
            zoom: Some(state.zoom),
            bearing: Some(state.bearing),
            pitch: Some(state.pitch),
            padding: Some(state.padding),
            anchor: None,
        }
    }
}

/// Zoom and pitch limits of the map
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraBounds {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub min_pitch: f64,
    pub max_pitch: f64,
}

impl Default for CameraBounds {
    fn default() -> Self {
        Self {
            min_zoom: 0.0,
            max_zoom: 22.0,
            min_pitch: 0.0,
            max_pitch: 85.0,
        }
    }
}

impl CameraBounds {
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    pub fn clamp_pitch(&self, pitch: f64) -> f64 {
        pitch.clamp(self.min_pitch, self.max_pitch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_only_touches_specified_fields() {
        let mut state = CameraState::new(Coordinate::new(10.0, 20.0), 5.0, 30.0, 10.0);
        let pose = CameraPose::new().with_zoom(8.0);
        state.apply(&pose, &CameraBounds::default());

        assert_eq!(state.zoom, 8.0);
        assert_eq!(state.center, Coordinate::new(10.0, 20.0));
        assert_eq!(state.bearing, 30.0);
        assert_eq!(state.pitch, 10.0);
    }

    #[test]
    fn test_apply_clamps_and_normalizes() {
        let mut state = CameraState::default();
        let pose = CameraPose::new()
            .with_zoom(40.0)
            .with_pitch(120.0)
            .with_bearing(-45.0)
            .with_center(Coordinate::new(0.0, 190.0));
        state.apply(&pose, &CameraBounds::default());

        assert_eq!(state.zoom, 22.0);
        assert_eq!(state.pitch, 85.0);
        assert_eq!(state.bearing, 315.0);
        assert_eq!(state.center.longitude, -170.0);
    }

    #[test]
    fn test_apply_ignores_non_finite_values() {
        let mut state = CameraState::new(Coordinate::new(1.0, 2.0), 3.0, 4.0, 5.0);
        let pose = CameraPose::new()
            .with_zoom(f64::NAN)
            .with_center(Coordinate::new(f64::NAN, 0.0));
        state.apply(&pose, &CameraBounds::default());

        assert_eq!(state.zoom, 3.0);
        assert_eq!(state.center, Coordinate::new(1.0, 2.0));
    }

    #[test]
    fn test_pose_serde_defaults_missing_fields() {
        let pose: CameraPose = serde_json::from_str(r#"{"zoom": 4.5}"#).unwrap();
        assert_eq!(pose.zoom, Some(4.5));
        assert!(pose.center.is_none());
        assert!(!pose.is_empty());
        assert!(CameraPose::new().is_empty());
    }
}
