//! Curve-driven transition animator

use std::cell::{Cell, RefCell};
use std::fmt;
use std::time::{Duration, Instant};

use meridian_core::CameraPose;

use crate::animator::{
    AnimatingPosition, AnimationOwner, AnimationType, AnimatorCore, AnimatorState, AnimatorStatus,
    CameraAnimator, Cancelable, Completion, Phase,
};
use crate::animators::AnimatorContext;
use crate::easing::{TimingCurve, DEFAULT_BEZIER_EPSILON};
use crate::interpolate::CameraOptionsInterpolator;
use crate::signal::ObserverId;
use crate::transition::{normalized, CameraTransition};

type Animations = Box<dyn FnOnce(&mut CameraTransition)>;

/// Linear progress bookkeeping
///
/// Progress is `base` when the animator last (re)started at `resumed_at`
/// and moves towards 1, or towards 0 when reversed.
#[derive(Clone, Copy, Debug, Default)]
struct Timing {
    base: f64,
    resumed_at: Option<Instant>,
}

/// Animates a [`CameraTransition`] over a fixed duration with a timing curve
///
/// The transition is seeded from the renderer's camera when the animator
/// first starts or pauses, then handed to the `animations` closure to set
/// the targets.
pub struct BasicCameraAnimator {
    core: AnimatorCore,
    ctx: AnimatorContext,
    interpolator: CameraOptionsInterpolator,
    duration: Cell<Duration>,
    curve: Cell<TimingCurve>,
    epsilon: f64,
    animations: RefCell<Option<Animations>>,
    transition: RefCell<Option<CameraTransition>>,
    timing: Cell<Timing>,
    is_reversed: Cell<bool>,
    pauses_on_completion: Cell<bool>,
}

impl BasicCameraAnimator {
    pub fn new(
        duration: Duration,
        curve: TimingCurve,
        owner: AnimationOwner,
        ctx: AnimatorContext,
        animations: impl FnOnce(&mut CameraTransition) + 'static,
    ) -> Self {
        let core = AnimatorCore::new(owner, AnimationType::Unspecified, ctx.queue.clone());
        Self {
            core,
            ctx,
            interpolator: CameraOptionsInterpolator::new(),
            duration: Cell::new(duration),
            curve: Cell::new(curve),
            epsilon: DEFAULT_BEZIER_EPSILON,
            animations: RefCell::new(Some(Box::new(animations))),
            transition: RefCell::new(None),
            timing: Cell::new(Timing::default()),
            is_reversed: Cell::new(false),
            pauses_on_completion: Cell::new(false),
        }
    }

    /// Use a different bezier solver precision
    pub fn with_bezier_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration.get()
    }

    pub fn curve(&self) -> TimingCurve {
        self.curve.get()
    }

    /// The transition being animated, while running or paused
    pub fn transition(&self) -> Option<CameraTransition> {
        match self.core.phase() {
            Phase::Running | Phase::Paused => self.transition.borrow().clone(),
            Phase::Initial | Phase::Final(_) => None,
        }
    }

    pub fn is_reversed(&self) -> bool {
        self.is_reversed.get()
    }

    /// Run towards the start instead of the end
    ///
    /// Toggling while running continues from the current progress.
    pub fn set_reversed(&self, reversed: bool) {
        if reversed == self.is_reversed.get() {
            return;
        }
        if self.core.is_running() {
            let now = self.ctx.now();
            if let Some(progress) = self.progress_at(now) {
                self.timing.set(Timing {
                    base: progress,
                    resumed_at: Some(now),
                });
            }
        }
        self.is_reversed.set(reversed);
    }

    pub fn pauses_on_completion(&self) -> bool {
        self.pauses_on_completion.get()
    }

    /// When set, reaching the end pauses the animator instead of finishing
    /// it, so it can be scrubbed or reversed afterwards.
    pub fn set_pauses_on_completion(&self, pauses: bool) {
        self.pauses_on_completion.set(pauses);
    }

    /// Linear progress through the animation, in `[0, 1]`
    pub fn fraction_complete(&self) -> f64 {
        match self.core.phase() {
            Phase::Running => self
                .progress_at(self.ctx.now())
                .unwrap_or(self.timing.get().base),
            Phase::Final(AnimatingPosition::End) => 1.0,
            Phase::Final(AnimatingPosition::Start) => 0.0,
            _ => self.timing.get().base,
        }
    }

    /// Jump to `fraction`. While paused the camera is moved there at once.
    pub fn set_fraction_complete(&self, fraction: f64) {
        if self.core.is_terminal() || !fraction.is_finite() {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        let mut timing = self.timing.get();
        timing.base = fraction;
        if self.core.is_running() {
            timing.resumed_at = Some(self.ctx.now());
        }
        self.timing.set(timing);

        if self.core.phase() == Phase::Paused {
            self.write_progress(fraction);
        }
    }

    /// Resume a paused animation with a new curve, scaling the duration
    ///
    /// Only valid while paused.
    pub fn continue_animation(&self, curve: Option<TimingCurve>, duration_factor: f64) {
        if self.core.phase() != Phase::Paused {
            debug_assert!(false, "continue_animation called on an animator that is not paused");
            tracing::warn!(
                "BasicCameraAnimator[{}]: continue_animation ignored, animator is not paused",
                self.core.owner()
            );
            return;
        }
        if let Some(curve) = curve {
            self.curve.set(curve);
        }
        if duration_factor.is_finite() && duration_factor > 0.0 {
            self.duration.set(self.duration.get().mul_f64(duration_factor));
        }
        self.resume(self.ctx.now());
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn ensure_transition(&self) {
        if self.transition.borrow().is_some() {
            return;
        }
        let renderer = &self.ctx.renderer;
        let mut transition = CameraTransition::new(&renderer.camera_state(), renderer.anchor());
        let animations = self.animations.borrow_mut().take();
        if let Some(animations) = animations {
            animations(&mut transition);
        }
        *self.transition.borrow_mut() = Some(transition);
    }

    /// Linear progress at `now`; `None` while a start delay is pending
    fn progress_at(&self, now: Instant) -> Option<f64> {
        let timing = self.timing.get();
        let resumed_at = timing.resumed_at?;
        let elapsed = now.checked_duration_since(resumed_at)?;
        let duration = self.duration.get();
        let delta = if duration.is_zero() {
            1.0
        } else {
            elapsed.as_secs_f64() / duration.as_secs_f64()
        };
        let progress = if self.is_reversed.get() {
            timing.base - delta
        } else {
            timing.base + delta
        };
        Some(progress.clamp(0.0, 1.0))
    }

    fn pose_at(&self, progress: f64) -> Option<CameraPose> {
        let eased = self.curve.get().progress_with_epsilon(progress, self.epsilon);
        let transition = self.transition.borrow();
        transition
            .as_ref()
            .map(|transition| self.interpolator.interpolate_transition(transition, eased))
    }

    fn write_progress(&self, progress: f64) {
        if let Some(pose) = self.pose_at(progress) {
            self.ctx.renderer.set_camera(&pose);
        }
    }

    /// Exact pose at one end of the transition
    fn end_pose(&self, position: AnimatingPosition) -> Option<CameraPose> {
        let transition = self.transition.borrow();
        transition.as_ref().map(|transition| match position {
            AnimatingPosition::Start => transition.from_pose(),
            _ => normalized(transition.to_pose()),
        })
    }

    fn resume(&self, at: Instant) {
        let mut timing = self.timing.get();
        timing.resumed_at = Some(at);
        self.timing.set(timing);
        self.core.set_phase(Phase::Running);
    }

    fn begin(&self, delay: Duration) {
        self.ensure_transition();
        let base = if self.is_reversed.get() { 1.0 } else { 0.0 };
        self.timing.set(Timing {
            base,
            resumed_at: Some(self.ctx.now() + delay),
        });
        self.core.set_phase(Phase::Running);
    }
}

impl Cancelable for BasicCameraAnimator {
    fn cancel(&self) {
        self.stop();
    }
}

impl CameraAnimator for BasicCameraAnimator {
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
        match self.core.phase() {
            Phase::Initial => self.begin(Duration::ZERO),
            Phase::Paused => self.resume(self.ctx.now()),
            Phase::Running | Phase::Final(_) => {}
        }
    }

    fn start_after_delay(&self, delay: Duration) {
        match self.core.phase() {
            Phase::Initial => self.begin(delay),
            Phase::Paused => {
                debug_assert!(false, "start_after_delay called on a paused animator");
                tracing::warn!(
                    "BasicCameraAnimator[{}]: start_after_delay ignored while paused",
                    self.core.owner()
                );
            }
            Phase::Running | Phase::Final(_) => {}
        }
    }

    fn pause(&self) {
        match self.core.phase() {
            Phase::Initial => {
                self.ensure_transition();
                let base = if self.is_reversed.get() { 1.0 } else { 0.0 };
                self.timing.set(Timing {
                    base,
                    resumed_at: None,
                });
                self.core.set_phase(Phase::Paused);
            }
            Phase::Running => {
                let now = self.ctx.now();
                let timing = self.timing.get();
                let base = self.progress_at(now).unwrap_or(timing.base);
                self.timing.set(Timing {
                    base,
                    resumed_at: None,
                });
                self.core.set_phase(Phase::Paused);
            }
            Phase::Paused | Phase::Final(_) => {}
        }
    }

    fn stop(&self) {
        match self.core.phase() {
            Phase::Running | Phase::Paused => {
                // One authoritative write of what is on screen right now
                let progress = if self.core.is_running() {
                    self.progress_at(self.ctx.now())
                } else {
                    None
                };
                let progress = progress.unwrap_or(self.timing.get().base);
                self.write_progress(progress);
                self.core.finish(AnimatingPosition::Current);
            }
            Phase::Initial => {
                self.core.finish(AnimatingPosition::Current);
            }
            Phase::Final(_) => {}
        }
    }

    fn add_completion(&self, completion: Completion) {
        self.core.add_completion(completion);
    }

    fn update(&self) {
        if !self.core.is_running() {
            return;
        }
        let Some(progress) = self.progress_at(self.ctx.now()) else {
            return;
        };

        let reversed = self.is_reversed.get();
        let reached = if reversed { progress <= 0.0 } else { progress >= 1.0 };
        if !reached {
            self.write_progress(progress);
            return;
        }

        let position = if reversed {
            AnimatingPosition::Start
        } else {
            AnimatingPosition::End
        };
        if let Some(pose) = self.end_pose(position) {
            self.ctx.renderer.set_camera(&pose);
        }
        if self.pauses_on_completion.get() {
            self.timing.set(Timing {
                base: progress,
                resumed_at: None,
            });
            self.core.set_phase(Phase::Paused);
        } else {
            self.core.finish(position);
        }
    }

    fn observe_status(&self, observer: Box<dyn Fn(AnimatorStatus)>) -> ObserverId {
        self.core.observe_status(observer)
    }

    fn remove_observer(&self, id: ObserverId) -> bool {
        self.core.remove_observer(id)
    }
}

impl fmt::Debug for BasicCameraAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCameraAnimator")
            .field("core", &self.core)
            .field("duration", &self.duration.get())
            .field("curve", &self.curve.get())
            .field("is_reversed", &self.is_reversed.get())
            .finish()
    }
}
