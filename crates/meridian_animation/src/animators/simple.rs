//! Time-driven pose interpolation

use std::cell::{Cell, RefCell};
use std::fmt;
use std::time::Duration;

use meridian_core::CameraPose;

use crate::animator::{
    AnimatingPosition, AnimationOwner, AnimationType, AnimatorCore, AnimatorState, AnimatorStatus,
    CameraAnimator, Cancelable, Completion, Phase,
};
use crate::animators::{linear_progress, AnimatorContext, Stopwatch};
use crate::easing::{TimingCurve, DEFAULT_BEZIER_EPSILON};
use crate::interpolate::CameraOptionsInterpolator;
use crate::signal::ObserverId;

/// Interpolates between two camera poses from elapsed clock time
///
/// Only fields present in both `from` and `to` are animated.
pub struct SimpleCameraAnimator {
    core: AnimatorCore,
    ctx: AnimatorContext,
    interpolator: CameraOptionsInterpolator,
    from: CameraPose,
    to: RefCell<CameraPose>,
    duration: Duration,
    curve: TimingCurve,
    epsilon: f64,
    stopwatch: Cell<Stopwatch>,
}

impl SimpleCameraAnimator {
    pub fn new(
        from: CameraPose,
        to: CameraPose,
        duration: Duration,
        curve: TimingCurve,
        owner: AnimationOwner,
        ctx: AnimatorContext,
    ) -> Self {
        Self::with_type(from, to, duration, curve, owner, AnimationType::Unspecified, ctx)
    }

    pub fn with_type(
        from: CameraPose,
        to: CameraPose,
        duration: Duration,
        curve: TimingCurve,
        owner: AnimationOwner,
        animation_type: AnimationType,
        ctx: AnimatorContext,
    ) -> Self {
        Self {
            core: AnimatorCore::new(owner, animation_type, ctx.queue.clone()),
            ctx,
            interpolator: CameraOptionsInterpolator::new(),
            from,
            to: RefCell::new(to),
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

    pub fn from(&self) -> &CameraPose {
        &self.from
    }

    pub fn to(&self) -> CameraPose {
        self.to.borrow().clone()
    }

    /// Retarget the animation
    ///
    /// The new target should specify the same fields as the old one; fields
    /// that only one of `from` and `to` specify are not animated.
    pub fn set_to(&self, to: CameraPose) {
        {
            let current = self.to.borrow();
            if field_mask(&current) != field_mask(&to) {
                tracing::warn!(
                    "SimpleCameraAnimator[{}]: new target specifies different fields than the old one",
                    self.core.owner()
                );
            }
        }
        *self.to.borrow_mut() = to;
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Eased progress at the current clock time
    pub fn fraction_complete(&self) -> f64 {
        match self.core.phase() {
            Phase::Final(AnimatingPosition::End) => 1.0,
            _ => {
                let elapsed = self.stopwatch.get().elapsed(self.ctx.now());
                let linear = elapsed.map_or(0.0, |e| linear_progress(e, self.duration));
                self.curve.progress_with_epsilon(linear, self.epsilon)
            }
        }
    }

    fn begin(&self, delay: Duration) {
        let mut stopwatch = Stopwatch::default();
        stopwatch.resume_at(self.ctx.now() + delay);
        self.stopwatch.set(stopwatch);
        self.core.set_phase(Phase::Running);
    }
}

fn field_mask(pose: &CameraPose) -> [bool; 6] {
    [
        pose.center.is_some(),
        pose.zoom.is_some(),
        pose.bearing.is_some(),
        pose.pitch.is_some(),
        pose.padding.is_some(),
        pose.anchor.is_some(),
    ]
}

impl Cancelable for SimpleCameraAnimator {
    fn cancel(&self) {
        self.stop();
    }
}

impl CameraAnimator for SimpleCameraAnimator {
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

    /// Starting again while running keeps the elapsed progress
    fn start_after_delay(&self, delay: Duration) {
        match self.core.phase() {
            Phase::Initial => self.begin(delay),
            Phase::Paused => {
                let mut stopwatch = self.stopwatch.get();
                stopwatch.resume_at(self.ctx.now() + delay);
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
            let to = self.to();
            self.ctx.renderer.set_camera(&to);
            self.core.finish(AnimatingPosition::End);
            return;
        }

        let fraction = self.curve.progress_with_epsilon(linear, self.epsilon);
        let pose = self.interpolator.interpolate(&self.from, &self.to.borrow(), fraction);
        tracing::trace!("SimpleCameraAnimator[{}]: fraction {:.3}", self.core.owner(), fraction);
        self.ctx.renderer.set_camera(&pose);
    }

    fn observe_status(&self, observer: Box<dyn Fn(AnimatorStatus)>) -> ObserverId {
        self.core.observe_status(observer)
    }

    fn remove_observer(&self, id: ObserverId) -> bool {
        self.core.remove_observer(id)
    }
}

impl fmt::Debug for SimpleCameraAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleCameraAnimator")
            .field("core", &self.core)
            .field("from", &self.from)
            .field("to", &self.to.borrow())
            .field("duration", &self.duration)
            .field("curve", &self.curve)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animators::test_support::{assert_stop_after_initial_pause_is_silent, Harness};
    use meridian_core::{CameraRenderer, Coordinate};
    use std::rc::Rc;

    fn animator(harness: &Harness, curve: TimingCurve) -> SimpleCameraAnimator {
        SimpleCameraAnimator::new(
            CameraPose::new()
                .with_zoom(2.0)
                .with_center(Coordinate::new(0.0, 0.0)),
            CameraPose::new()
                .with_zoom(4.0)
                .with_center(Coordinate::new(10.0, 20.0)),
            Duration::from_secs(2),
            curve,
            AnimationOwner::DEFAULT,
            harness.context(),
        )
    }

    #[test]
    fn test_restart_does_not_perturb_progress() {
        let harness = Harness::new();
        let animator = animator(&harness, TimingCurve::Linear);

        animator.start();
        harness.clock.advance(Duration::from_secs(1));
        animator.start();
        animator.update();

        assert!((animator.fraction_complete() - 0.5).abs() < 1e-9);
        assert!((harness.renderer.camera_state().zoom - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_curve_shapes_fraction() {
        let harness = Harness::new();
        let animator = animator(&harness, TimingCurve::EaseIn);
        animator.start();
        harness.clock.advance(Duration::from_millis(500));
        animator.update();

        let expected = TimingCurve::EaseIn.progress(0.25);
        assert!((animator.fraction_complete() - expected).abs() < 1e-9);
        assert!((harness.renderer.camera_state().zoom - (2.0 + 2.0 * expected)).abs() < 1e-9);
    }

    #[test]
    fn test_delay_leaves_camera_alone() {
        let harness = Harness::new();
        let animator = animator(&harness, TimingCurve::Linear);
        animator.start_after_delay(Duration::from_secs(1));
        assert_eq!(animator.state(), AnimatorState::Active);

        harness.clock.advance(Duration::from_millis(900));
        animator.update();
        assert_eq!(harness.renderer.set_camera_count(), 0);

        harness.clock.advance(Duration::from_millis(1_100));
        animator.update();
        assert!((harness.renderer.camera_state().zoom - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_finishes_with_exact_target() {
        let harness = Harness::new();
        let animator = animator(&harness, TimingCurve::EaseInOut);
        let done = Rc::new(RefCell::new(Vec::new()));
        let d = done.clone();
        animator.add_completion(Box::new(move |pos| d.borrow_mut().push(pos)));

        animator.start();
        harness.clock.advance(Duration::from_secs(3));
        animator.update();

        let state = harness.renderer.camera_state();
        assert_eq!(state.zoom, 4.0);
        assert_eq!(state.center, Coordinate::new(10.0, 20.0));
        assert_eq!(*done.borrow(), vec![AnimatingPosition::End]);
        assert_eq!(animator.state(), AnimatorState::Inactive);
    }

    #[test]
    fn test_completion_added_after_finish_runs_next_turn() {
        let harness = Harness::new();
        let animator = animator(&harness, TimingCurve::Linear);
        animator.stop();

        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        animator.add_completion(Box::new(move |pos| {
            assert_eq!(pos, AnimatingPosition::Current);
            h.set(h.get() + 1);
        }));
        assert_eq!(hits.get(), 0);
        harness.queue.drain();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_pause_and_resume() {
        let harness = Harness::new();
        let animator = animator(&harness, TimingCurve::Linear);
        animator.start();
        harness.clock.advance(Duration::from_millis(500));
        animator.pause();
        harness.clock.advance(Duration::from_secs(30));
        animator.start();
        harness.clock.advance(Duration::from_millis(500));
        animator.update();
        assert!((animator.fraction_complete() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_set_to_retargets() {
        let harness = Harness::new();
        let animator = animator(&harness, TimingCurve::Linear);
        animator.start();
        animator.set_to(
            CameraPose::new()
                .with_zoom(10.0)
                .with_center(Coordinate::new(10.0, 20.0)),
        );
        harness.clock.advance(Duration::from_secs(1));
        animator.update();
        assert!((harness.renderer.camera_state().zoom - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_stop_after_pause_before_start_is_silent() {
        let harness = Harness::new();
        let animator = animator(&harness, TimingCurve::Linear);
        assert_stop_after_initial_pause_is_silent(&animator);
    }
}
