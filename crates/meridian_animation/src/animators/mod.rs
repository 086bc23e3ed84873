//! Concrete animation strategies
//!
//! - [`BasicCameraAnimator`]: timing-curve animation of a [`CameraTransition`]
//! - [`SimpleCameraAnimator`]: time-driven interpolation between two poses
//! - [`FlyToCameraAnimator`]: zoom-out/zoom-in flight along a great circle
//! - [`GestureDecelerationAnimator`]: inertial scrolling after a fling
//!
//! [`CameraTransition`]: crate::CameraTransition

mod basic;
mod deceleration;
mod fly_to;
mod simple;

pub use basic::BasicCameraAnimator;
pub use deceleration::{GestureDecelerationAnimator, DEFAULT_DECELERATION_THRESHOLD};
pub use fly_to::FlyToCameraAnimator;
pub use simple::SimpleCameraAnimator;

use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use meridian_core::{CameraRenderer, Clock};

use crate::queue::TaskQueue;

/// Collaborators every animator is built against
#[derive(Clone)]
pub struct AnimatorContext {
    pub renderer: Rc<dyn CameraRenderer>,
    pub clock: Rc<dyn Clock>,
    pub queue: TaskQueue,
}

impl AnimatorContext {
    pub fn new(renderer: Rc<dyn CameraRenderer>, clock: Rc<dyn Clock>, queue: TaskQueue) -> Self {
        Self {
            renderer,
            clock,
            queue,
        }
    }

    pub(crate) fn now(&self) -> Instant {
        self.clock.now()
    }
}

impl fmt::Debug for AnimatorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatorContext")
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

/// Elapsed animation time that survives pauses
///
/// `start` may lie in the future to express a start delay.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Stopwatch {
    start: Option<Instant>,
    banked: Duration,
}

impl Stopwatch {
    /// Start or resume counting at `at`
    pub(crate) fn resume_at(&mut self, at: Instant) {
        self.start = Some(at);
    }

    pub(crate) fn pause(&mut self, now: Instant) {
        if let Some(start) = self.start.take() {
            self.banked += now.saturating_duration_since(start);
        }
    }

    /// Time counted so far; `None` while a start delay is pending
    pub(crate) fn elapsed(&self, now: Instant) -> Option<Duration> {
        match self.start {
            Some(start) => now.checked_duration_since(start).map(|d| self.banked + d),
            None => Some(self.banked),
        }
    }
}

/// Linear progress of `elapsed` through `duration`, clamped to `[0, 1]`
pub(crate) fn linear_progress(elapsed: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
}
