//! Inertial scrolling after a fling gesture

use std::cell::Cell;
use std::fmt;
use std::time::{Duration, Instant};

use meridian_core::ScreenPoint;

use crate::animator::{
    AnimatingPosition, AnimationOwner, AnimationType, AnimatorCore, AnimatorState, AnimatorStatus,
    CameraAnimator, Cancelable, Completion, Phase,
};
use crate::animators::AnimatorContext;
use crate::signal::ObserverId;

/// Velocity (points per second) below which a fling is considered over
pub const DEFAULT_DECELERATION_THRESHOLD: f64 = 1.0;

type LocationChanged = Box<dyn Fn(ScreenPoint, ScreenPoint)>;

/// Decays a gesture velocity and reports the resulting screen movement
///
/// Every update multiplies the velocity by `factor` once per elapsed
/// millisecond and moves the tracked location by `velocity · Δt`. The
/// `location_changed` handler receives the old and new locations and is
/// responsible for moving the camera.
///
/// `factor` must lie in `(0, 1)`. Any other factor, or a non-finite
/// velocity, makes the animator finish on its first update.
pub struct GestureDecelerationAnimator {
    core: AnimatorCore,
    ctx: AnimatorContext,
    location: Cell<ScreenPoint>,
    velocity: Cell<ScreenPoint>,
    factor: f64,
    threshold: f64,
    /// Time of the previous update, or of the (possibly delayed) start
    previous: Cell<Option<Instant>>,
    location_changed: LocationChanged,
}

impl GestureDecelerationAnimator {
    pub fn new(
        location: ScreenPoint,
        velocity: ScreenPoint,
        factor: f64,
        owner: AnimationOwner,
        ctx: AnimatorContext,
        location_changed: impl Fn(ScreenPoint, ScreenPoint) + 'static,
    ) -> Self {
        // A factor outside (0, 1) would never decay below the threshold
        let valid = velocity.is_finite() && factor > 0.0 && factor < 1.0;
        if !valid {
            tracing::warn!(
                "GestureDecelerationAnimator[{}]: invalid velocity {:?} or factor {}, finishing at once",
                owner,
                velocity,
                factor
            );
        }
        Self {
            core: AnimatorCore::new(owner, AnimationType::Deceleration, ctx.queue.clone()),
            ctx,
            location: Cell::new(location),
            velocity: Cell::new(if valid { velocity } else { ScreenPoint::ZERO }),
            factor: if valid { factor } else { 0.0 },
            threshold: DEFAULT_DECELERATION_THRESHOLD,
            previous: Cell::new(None),
            location_changed: Box::new(location_changed),
        }
    }

    /// Finish once both velocity components drop below `threshold`
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        if threshold.is_finite() && threshold > 0.0 {
            self.threshold = threshold;
        }
        self
    }

    pub fn location(&self) -> ScreenPoint {
        self.location.get()
    }

    pub fn velocity(&self) -> ScreenPoint {
        self.velocity.get()
    }

    fn begin(&self, at: Instant) {
        self.previous.set(Some(at));
        self.core.set_phase(Phase::Running);
    }
}

impl Cancelable for GestureDecelerationAnimator {
    fn cancel(&self) {
        self.stop();
    }
}

impl CameraAnimator for GestureDecelerationAnimator {
    fn owner(&self) -> AnimationOwner {
        self.core.owner()
    }

    fn animation_type(&self) -> AnimationType {
        self.core.animation_type()
    }

    fn state(&self) -> AnimatorState {
        self.core.state()
    }

    fn is_running(&self) -> bool {
        self.core.is_running()
    }

    fn start(&self) {
        self.start_after_delay(Duration::ZERO);
    }

    fn start_after_delay(&self, delay: Duration) {
        match self.core.phase() {
            Phase::Initial | Phase::Paused => self.begin(self.ctx.now() + delay),
            Phase::Running | Phase::Final(_) => {}
        }
    }

    /// Paused time does not decay the velocity
    fn pause(&self) {
        match self.core.phase() {
            Phase::Initial | Phase::Running => self.core.set_phase(Phase::Paused),
            Phase::Paused | Phase::Final(_) => {}
        }
    }

    fn stop(&self) {
        self.core.finish(AnimatingPosition::Current);
    }

    fn add_completion(&self, completion: Completion) {
        self.core.add_completion(completion);
    }

    fn update(&self) {
        if !self.core.is_running() {
            return;
        }
        let now = self.ctx.now();
        let Some(previous) = self.previous.get() else {
            return;
        };
        // Still inside a start delay
        let Some(elapsed) = now.checked_duration_since(previous) else {
            return;
        };
        self.previous.set(Some(now));

        let dt = elapsed.as_secs_f64();
        let decay = self.factor.powf(dt * 1000.0);
        let velocity = self.velocity.get();
        let velocity = ScreenPoint::new(velocity.x * decay, velocity.y * decay);
        self.velocity.set(velocity);

        let from = self.location.get();
        let to = ScreenPoint::new(from.x + velocity.x * dt, from.y + velocity.y * dt);
        self.location.set(to);
        (self.location_changed)(from, to);

        if velocity.x.abs() < self.threshold && velocity.y.abs() < self.threshold {
            self.core.finish(AnimatingPosition::End);
        }
    }

    fn observe_status(&self, observer: Box<dyn Fn(AnimatorStatus)>) -> ObserverId {
        self.core.observe_status(observer)
    }

    fn remove_observer(&self, id: ObserverId) -> bool {
        self.core.remove_observer(id)
    }
}

impl fmt::Debug for GestureDecelerationAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureDecelerationAnimator")
            .field("core", &self.core)
            .field("location", &self.location.get())
            .field("velocity", &self.velocity.get())
            .field("factor", &self.factor)
            .finish_non_exhaustive()
    }
}
