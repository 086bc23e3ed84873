//! Meridian Animation Engine
//!
//! Frame-driven camera animations for a map surface.
//!
//! # Features
//!
//! - **Animators**: timing-curve, pose-to-pose, fly-to and fling-deceleration
//!   strategies behind one [`CameraAnimator`] contract
//! - **Fly-to**: van Wijk & Nuij zoom-out/zoom-in flight along a great circle
//! - **Curves**: cubic-bezier presets, custom control points and damped springs
//! - **Runner**: per-tick driving, renderer begin/end bracketing, and
//!   owner/type based cancellation
//! - **Manager**: cancel-then-start facade giving each owner one animation
//! - **Deferred completions**: re-entrant completion dispatch through an
//!   explicit [`TaskQueue`]
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use std::time::Duration;
//!
//! use meridian_animation::{AnimationsManager, TimingCurve};
//! use meridian_core::{
//!     CameraPose, CameraRenderer, CameraState, Coordinate, HeadlessRenderer, ManualClock, Size,
//! };
//!
//! let renderer = Rc::new(HeadlessRenderer::new(
//!     CameraState::new(Coordinate::new(0.0, 0.0), 2.0, 0.0, 0.0),
//!     Size::new(375.0, 812.0),
//! ));
//! let clock = Rc::new(ManualClock::new());
//! let manager = AnimationsManager::new(renderer.clone(), clock.clone());
//! manager.set_enabled(true);
//!
//! manager.ease(
//!     CameraPose::new().with_zoom(6.0),
//!     Duration::from_millis(300),
//!     TimingCurve::EaseInOut,
//!     None,
//!     None,
//! );
//! for _ in 0..30 {
//!     clock.advance(Duration::from_millis(16));
//!     manager.update();
//! }
//! assert_eq!(renderer.camera_state().zoom, 6.0);
//! ```

pub mod animator;
pub mod animators;
pub mod config;
pub mod easing;
pub mod error;
pub mod fly_to;
pub mod interpolate;
pub mod manager;
pub mod queue;
pub mod runner;
mod signal;
pub mod spring;
pub mod transition;

pub use animator::{
    AnimatingPosition, AnimationOwner, AnimationType, AnimatorEvents, AnimatorState,
    AnimatorStatus, CameraAnimator, Cancelable, Completion, StopReason,
};
pub use animators::{
    AnimatorContext, BasicCameraAnimator, FlyToCameraAnimator, GestureDecelerationAnimator,
    SimpleCameraAnimator, DEFAULT_DECELERATION_THRESHOLD,
};
pub use config::AnimationConfig;
pub use easing::{TimingCurve, UnitBezier, DEFAULT_BEZIER_EPSILON};
pub use error::{ConfigError, Result};
pub use fly_to::FlyToInterpolator;
pub use interpolate::{
    interpolate_coordinate, interpolate_direction, CameraOptionsInterpolator, Interpolate,
};
pub use manager::AnimationsManager;
pub use queue::TaskQueue;
pub use runner::{AnimatorId, AnimatorsRunner, StatusPayload};
pub use signal::ObserverId;
pub use spring::SpringCurve;
pub use transition::{CameraTransition, Change};
