//! Fly-to animator

use std::cell::Cell;
use std::fmt;
use std::time::Duration;

use crate::animator::{
    AnimatingPosition, AnimationOwner, AnimationType, AnimatorCore, AnimatorState, AnimatorStatus,
    CameraAnimator, Cancelable, Completion, Phase,
};
use crate::animators::{linear_progress, AnimatorContext, Stopwatch};
use crate::easing::{TimingCurve, DEFAULT_BEZIER_EPSILON};
use crate::fly_to::FlyToInterpolator;
use crate::signal::ObserverId;
use crate::transition::normalized;

/// Drives a camera along a [`FlyToInterpolator`] path
///
/// Timing works like [`SimpleCameraAnimator`](crate::SimpleCameraAnimator):
/// the curve is applied to elapsed time over the duration, read from the
/// clock on every update.
pub struct FlyToCameraAnimator {
    core: AnimatorCore,
    ctx: AnimatorContext,
    interpolator: FlyToInterpolator,
    duration: Duration,
    curve: TimingCurve,
    epsilon: f64,
    stopwatch: Cell<Stopwatch>,
}

impl FlyToCameraAnimator {
    /// Create an animator; without a `duration` the path's ideal duration
    /// is used
    pub fn new(
        interpolator: FlyToInterpolator,
        duration: Option<Duration>,
        curve: TimingCurve,
        owner: AnimationOwner,
        ctx: AnimatorContext,
    ) -> Self {
        let duration = duration.unwrap_or_else(|| interpolator.duration(None));
        tracing::debug!("FlyToCameraAnimator[{}]: duration {:?}", owner, duration);
        Self {
            core: AnimatorCore::new(owner, AnimationType::Unspecified, ctx.queue.clone()),
            ctx,
            interpolator,
            duration,
            curve,
            epsilon: DEFAULT_BEZIER_EPSILON,
            stopwatch: Cell::new(Stopwatch::default()),
        }
    }

    pub fn with_bezier_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn interpolator(&self) -> &FlyToInterpolator {
        &self.interpolator
    }
}

impl Cancelable for FlyToCameraAnimator {
    fn cancel(&self) {
        self.stop();
    }
}

impl CameraAnimator for FlyToCameraAnimator {
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
        let now = self.ctx.now();
        match self.core.phase() {
            Phase::Initial | Phase::Paused => {
                let mut stopwatch = self.stopwatch.get();
                stopwatch.resume_at(now + delay);
                self.stopwatch.set(stopwatch);
                self.core.set_phase(Phase::Running);
            }
            Phase::Running | Phase::Final(_) => {}
        }
    }

    fn pause(&self) {
        match self.core.phase() {
            Phase::Running => {
                let mut stopwatch = self.stopwatch.get();
                stopwatch.pause(self.ctx.now());
                self.stopwatch.set(stopwatch);
                self.core.set_phase(Phase::Paused);
            }
            Phase::Initial => self.core.set_phase(Phase::Paused),
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
        let Some(elapsed) = self.stopwatch.get().elapsed(self.ctx.now()) else {
            return;
        };

        let linear = linear_progress(elapsed, self.duration);
        if linear >= 1.0 {
            let destination = normalized(self.interpolator.destination());
            self.ctx.renderer.set_camera(&destination);
            self.core.finish(AnimatingPosition::End);
            return;
        }

        let fraction = self.curve.progress_with_epsilon(linear, self.epsilon);
        let pose = normalized(self.interpolator.pose(fraction));
        self.ctx.renderer.set_camera(&pose);
    }

    fn observe_status(&self, observer: Box<dyn Fn(AnimatorStatus)>) -> ObserverId {
        self.core.observe_status(observer)
    }

    fn remove_observer(&self, id: ObserverId) -> bool {
        self.core.remove_observer(id)
    }
}

impl fmt::Debug for FlyToCameraAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlyToCameraAnimator")
            .field("core", &self.core)
            .field("duration", &self.duration)
            .field("curve", &self.curve)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animators::test_support::{
        assert_stop_after_initial_pause_is_silent, observe, Harness,
    };
    use meridian_core::{CameraPose, CameraRenderer, Coordinate};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn fly(harness: &Harness, to: CameraPose, duration: Option<Duration>) -> FlyToCameraAnimator {
        let renderer = &harness.renderer;
        let interpolator = FlyToInterpolator::new(
            &renderer.camera_state(),
            &to,
            &renderer.camera_bounds(),
            renderer.viewport_size(),
        );
        FlyToCameraAnimator::new(
            interpolator,
            duration,
            TimingCurve::EaseInOut,
            AnimationOwner::DEFAULT,
            harness.context(),
        )
    }

    #[test]
    fn test_flies_to_destination() {
        let harness = Harness::new();
        let to = CameraPose::new()
            .with_center(Coordinate::new(48.8566, 2.3522))
            .with_zoom(10.0)
            .with_bearing(-30.0);
        let animator = fly(&harness, to, Some(Duration::from_secs(2)));
        let done = Rc::new(RefCell::new(Vec::new()));
        let d = done.clone();
        animator.add_completion(Box::new(move |pos| d.borrow_mut().push(pos)));

        animator.start();
        for _ in 0..10 {
            harness.clock.advance(Duration::from_millis(100));
            animator.update();
            assert!(harness.renderer.camera_state().zoom <= 10.0 + 1e-9);
        }
        assert_eq!(animator.state(), AnimatorState::Active);

        harness.clock.advance(Duration::from_secs(1));
        animator.update();
        let state = harness.renderer.camera_state();
        assert!(state.center.approx_eq(&Coordinate::new(48.8566, 2.3522), 1e-9));
        assert_eq!(state.zoom, 10.0);
        assert!((state.bearing - 330.0).abs() < 1e-9);
        assert_eq!(*done.borrow(), vec![AnimatingPosition::End]);
    }

    #[test]
    fn test_derived_duration_is_used_when_unspecified() {
        let harness = Harness::new();
        let to = CameraPose::new().with_center(Coordinate::new(40.0, 40.0));
        let animator = fly(&harness, to, None);
        assert_eq!(animator.duration(), animator.interpolator().duration(None));
        assert!(animator.duration() > Duration::from_millis(100));
    }

    #[test]
    fn test_stop_leaves_camera_where_it_was() {
        let harness = Harness::new();
        let animator = fly(&harness, CameraPose::new().with_zoom(8.0), Some(Duration::from_secs(1)));
        animator.start();
        harness.clock.advance(Duration::from_millis(300));
        animator.update();
        let writes = harness.renderer.set_camera_count();

        animator.stop();
        assert_eq!(harness.renderer.set_camera_count(), writes);
        assert_eq!(animator.state(), AnimatorState::Inactive);
    }

    #[test]
    fn test_stop_after_pause_before_start_is_silent() {
        let harness = Harness::new();
        let animator = fly(&harness, CameraPose::new().with_zoom(8.0), None);
        assert_stop_after_initial_pause_is_silent(&animator);
    }

    #[test]
    fn test_stop_before_start_completes_without_writing() {
        let harness = Harness::new();
        let animator = fly(&harness, CameraPose::new().with_zoom(8.0), None);
        let observed = observe(&animator);

        animator.stop();
        assert_eq!(*observed.positions.borrow(), vec![AnimatingPosition::Current]);
        assert!(observed.statuses.borrow().is_empty());
        assert_eq!(animator.state(), AnimatorState::Inactive);

        // Single-shot
        animator.start();
        harness.clock.advance(Duration::from_secs(20));
        animator.update();
        assert_eq!(animator.state(), AnimatorState::Inactive);
        assert_eq!(harness.renderer.set_camera_count(), 0);
    }
}
