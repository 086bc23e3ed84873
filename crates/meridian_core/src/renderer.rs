//! Renderer collaborator
//!
//! The animation engine never draws. It reads the camera from, and writes
//! poses to, a [`CameraRenderer`], and brackets running animations with
//! `begin_animation` / `end_animation` so the renderer can pick a
//! continuous-rendering mode.

use std::cell::{Cell, RefCell};

use crate::camera::{CameraBounds, CameraPose, CameraState};
use crate::geo::{ScreenPoint, Size};

/// The map surface an animation drives
///
/// All methods take `&self`: renderers are shared between the runner and
/// every animator and are expected to use interior mutability.
pub trait CameraRenderer {
    /// The current, fully specified camera
    fn camera_state(&self) -> CameraState;

    /// The current anchor (pivot point for zoom and rotation)
    fn anchor(&self) -> ScreenPoint;

    /// Apply the specified fields of `pose`
    fn set_camera(&self, pose: &CameraPose);

    /// Zoom and pitch limits
    fn camera_bounds(&self) -> CameraBounds;

    /// Viewport size in points
    fn viewport_size(&self) -> Size;

    /// An animation started running. Calls are reference counted.
    fn begin_animation(&self);

    /// An animation stopped running. Must balance a prior `begin_animation`.
    fn end_animation(&self);
}

/// A renderer that only keeps camera state in memory
///
/// Useful for headless hosts and tests: it applies poses, clamps them to its
/// bounds, and records how often the engine touched it.
pub struct HeadlessRenderer {
    state: RefCell<CameraState>,
    anchor: Cell<ScreenPoint>,
    bounds: Cell<CameraBounds>,
    viewport: Cell<Size>,
    animation_depth: Cell<u32>,
    begin_count: Cell<usize>,
    end_count: Cell<usize>,
    poses: RefCell<Vec<CameraPose>>,
}

impl HeadlessRenderer {
    pub fn new(state: CameraState, viewport: Size) -> Self {
        Self {
            state: RefCell::new(state),
            anchor: Cell::new(ScreenPoint::new(viewport.width / 2.0, viewport.height / 2.0)),
            bounds: Cell::new(CameraBounds::default()),
            viewport: Cell::new(viewport),
            animation_depth: Cell::new(0),
            begin_count: Cell::new(0),
            end_count: Cell::new(0),
            poses: RefCell::new(Vec::new()),
        }
    }

    pub fn with_bounds(self, bounds: CameraBounds) -> Self {
        self.bounds.set(bounds);
        self
    }

    /// Replace the camera state without recording a write
    pub fn reset_state(&self, state: CameraState) {
        *self.state.borrow_mut() = state;
    }

    pub fn set_anchor(&self, anchor: ScreenPoint) {
        self.anchor.set(anchor);
    }

    /// Whether at least one animation is between begin and end
    pub fn is_animating(&self) -> bool {
        self.animation_depth.get() > 0
    }

    /// Number of unbalanced `begin_animation` calls
    pub fn animation_depth(&self) -> u32 {
        self.animation_depth.get()
    }

    pub fn begin_count(&self) -> usize {
        self.begin_count.get()
    }

    pub fn end_count(&self) -> usize {
        self.end_count.get()
    }

    /// Every pose passed to `set_camera`, oldest first
    pub fn poses(&self) -> Vec<CameraPose> {
        self.poses.borrow().clone()
    }

    /// The most recent pose passed to `set_camera`
    pub fn last_pose(&self) -> Option<CameraPose> {
        self.poses.borrow().last().cloned()
    }

    pub fn set_camera_count(&self) -> usize {
        self.poses.borrow().len()
    }
}

impl CameraRenderer for HeadlessRenderer {
    fn camera_state(&self) -> CameraState {
        *self.state.borrow()
    }

    fn anchor(&self) -> ScreenPoint {
        self.anchor.get()
    }

    fn set_camera(&self, pose: &CameraPose) {
        let bounds = self.bounds.get();
        self.state.borrow_mut().apply(pose, &bounds);
        if let Some(anchor) = pose.anchor.filter(ScreenPoint::is_finite) {
            self.anchor.set(anchor);
        }
        self.poses.borrow_mut().push(pose.clone());
    }

    fn camera_bounds(&self) -> CameraBounds {
        self.bounds.get()
    }

    fn viewport_size(&self) -> Size {
        self.viewport.get()
    }

    fn begin_animation(&self) {
        self.animation_depth.set(self.animation_depth.get() + 1);
        self.begin_count.set(self.begin_count.get() + 1);
    }

    fn end_animation(&self) {
        let depth = self.animation_depth.get();
        debug_assert!(depth > 0, "end_animation called without a matching begin_animation");
        if depth == 0 {
            tracing::warn!("HeadlessRenderer: unbalanced end_animation ignored");
            return;
        }
        self.animation_depth.set(depth - 1);
        self.end_count.set(self.end_count.get() + 1);
    }
}
