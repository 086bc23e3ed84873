//! Animations manager
//!
//! The public entry point for camera animations. Every constructor cancels
//! the animators already running for the same owner before building its
//! own, so two animations of one owner never fight over the camera.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use meridian_core::{CameraPose, CameraRenderer, Clock, ScreenPoint};

use crate::animator::{AnimationOwner, AnimationType, CameraAnimator, Completion};
use crate::animators::{
    AnimatorContext, BasicCameraAnimator, FlyToCameraAnimator, GestureDecelerationAnimator,
    SimpleCameraAnimator,
};
use crate::config::AnimationConfig;
use crate::easing::TimingCurve;
use crate::error::Result;
use crate::fly_to::FlyToInterpolator;
use crate::queue::TaskQueue;
use crate::runner::{AnimatorsRunner, StatusPayload};
use crate::signal::ObserverId;
use crate::transition::CameraTransition;

/// Builds, registers and starts camera animators
pub struct AnimationsManager {
    runner: AnimatorsRunner,
    ctx: AnimatorContext,
    config: AnimationConfig,
}

impl AnimationsManager {
    /// Create a manager with the standard configuration
    ///
    /// The runner starts disabled; enable it once the surface is attached.
    pub fn new(renderer: Rc<dyn CameraRenderer>, clock: Rc<dyn Clock>) -> Self {
        Self::build(renderer, clock, AnimationConfig::standard())
    }

    /// Create a manager with a custom configuration
    ///
    /// Fails if the configuration does not pass [`AnimationConfig::validate`].
    pub fn with_config(
        renderer: Rc<dyn CameraRenderer>,
        clock: Rc<dyn Clock>,
        config: AnimationConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(renderer, clock, config))
    }

    fn build(
        renderer: Rc<dyn CameraRenderer>,
        clock: Rc<dyn Clock>,
        config: AnimationConfig,
    ) -> Self {
        let queue = TaskQueue::new();
        let runner = AnimatorsRunner::new(renderer.clone(), queue.clone());
        Self {
            runner,
            ctx: AnimatorContext::new(renderer, clock, queue),
            config,
        }
    }

    pub fn runner(&self) -> &AnimatorsRunner {
        &self.runner
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Context for animators built outside the manager
    pub fn context(&self) -> &AnimatorContext {
        &self.ctx
    }

    // ========================================================================
    // High-level animations
    // ========================================================================

    /// Fly to `to` along a zoom-out/zoom-in path
    ///
    /// Without a `duration` the path's ideal duration is used.
    pub fn fly_to(
        &self,
        to: CameraPose,
        duration: Option<Duration>,
        curve: TimingCurve,
        completion: Option<Completion>,
    ) -> Rc<FlyToCameraAnimator> {
        let owner = self.config.default_owner();
        self.runner.cancel_animations_with_owners(&[owner.clone()]);

        let renderer = &self.ctx.renderer;
        let interpolator = FlyToInterpolator::with_config(
            &renderer.camera_state(),
            &to,
            &renderer.camera_bounds(),
            renderer.viewport_size(),
            &self.config,
        );
        let animator = Rc::new(
            FlyToCameraAnimator::new(interpolator, duration, curve, owner, self.ctx.clone())
                .with_bezier_epsilon(self.config.bezier_epsilon),
        );
        self.launch(animator.clone(), completion);
        animator
    }

    /// Ease the camera to `to` over `duration`
    ///
    /// An anchor in `to` is held fixed for the whole animation.
    pub fn ease(
        &self,
        to: CameraPose,
        duration: Duration,
        curve: TimingCurve,
        owner: Option<AnimationOwner>,
        completion: Option<Completion>,
    ) -> Rc<BasicCameraAnimator> {
        let owner = owner.unwrap_or_else(|| self.config.default_owner());
        self.runner.cancel_animations_with_owners(&[owner.clone()]);

        let animator = Rc::new(
            BasicCameraAnimator::new(duration, curve, owner, self.ctx.clone(), move |transition| {
                transition.set_target(&to);
                if let Some(anchor) = to.anchor {
                    transition.anchor.from = anchor;
                }
            })
            .with_bezier_epsilon(self.config.bezier_epsilon),
        );
        self.launch(animator.clone(), completion);
        animator
    }

    /// Continue a fling with decaying velocity
    ///
    /// `location_changed` receives every screen-space step and is expected
    /// to move the camera.
    pub fn decelerate(
        &self,
        location: ScreenPoint,
        velocity: ScreenPoint,
        deceleration_factor: f64,
        location_changed: impl Fn(ScreenPoint, ScreenPoint) + 'static,
        completion: Option<Completion>,
    ) -> Rc<GestureDecelerationAnimator> {
        let owner = self.config.default_owner();
        self.runner.cancel_animations_with_owners(&[owner.clone()]);

        let animator = Rc::new(
            GestureDecelerationAnimator::new(
                location,
                velocity,
                deceleration_factor,
                owner,
                self.ctx.clone(),
                location_changed,
            )
            .with_threshold(self.config.deceleration_threshold),
        );
        self.launch(animator.clone(), completion);
        animator
    }

    // ========================================================================
    // Builders
    // ========================================================================

    /// Build an unstarted animator; `animations` fills in the transition
    /// when the animator first starts
    pub fn make_animator(
        &self,
        duration: Duration,
        curve: TimingCurve,
        owner: AnimationOwner,
        animations: impl FnOnce(&mut CameraTransition) + 'static,
    ) -> Rc<BasicCameraAnimator> {
        self.runner.cancel_animations_with_owners(&[owner.clone()]);
        let animator = Rc::new(
            BasicCameraAnimator::new(duration, curve, owner, self.ctx.clone(), animations)
                .with_bezier_epsilon(self.config.bezier_epsilon),
        );
        self.runner.add(animator.clone());
        animator
    }

    /// [`make_animator`](Self::make_animator) with cubic-bezier control points
    pub fn make_animator_with_control_points(
        &self,
        duration: Duration,
        control_points: (f64, f64, f64, f64),
        owner: AnimationOwner,
        animations: impl FnOnce(&mut CameraTransition) + 'static,
    ) -> Rc<BasicCameraAnimator> {
        let (x1, y1, x2, y2) = control_points;
        self.make_animator(duration, TimingCurve::cubic_bezier(x1, y1, x2, y2), owner, animations)
    }

    /// [`make_animator`](Self::make_animator) with a spring curve
    pub fn make_animator_with_damping_ratio(
        &self,
        duration: Duration,
        damping_ratio: f64,
        owner: AnimationOwner,
        animations: impl FnOnce(&mut CameraTransition) + 'static,
    ) -> Rc<BasicCameraAnimator> {
        self.make_animator(duration, TimingCurve::spring(damping_ratio), owner, animations)
    }

    /// Build an unstarted animator interpolating `from` to `to`
    pub fn make_simple_animator(
        &self,
        from: CameraPose,
        to: CameraPose,
        duration: Duration,
        curve: TimingCurve,
        owner: AnimationOwner,
    ) -> Rc<SimpleCameraAnimator> {
        self.runner.cancel_animations_with_owners(&[owner.clone()]);
        let animator = Rc::new(
            SimpleCameraAnimator::new(from, to, duration, curve, owner, self.ctx.clone())
                .with_bezier_epsilon(self.config.bezier_epsilon),
        );
        self.runner.add(animator.clone());
        animator
    }

    // ========================================================================
    // Runner forwarding
    // ========================================================================

    /// Drive one display tick
    pub fn update(&self) {
        self.runner.update();
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.runner.set_enabled(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.runner.is_enabled()
    }

    pub fn animators(&self) -> Vec<Rc<dyn CameraAnimator>> {
        self.runner.animators()
    }

    pub fn cancel_animations(&self) {
        self.runner.cancel_animations();
    }

    pub fn cancel_animations_with_owners(&self, owners: &[AnimationOwner]) {
        self.runner.cancel_animations_with_owners(owners);
    }

    pub fn cancel_animations_with_owners_and_types(
        &self,
        owners: &[AnimationOwner],
        types: &[AnimationType],
    ) {
        self.runner
            .cancel_animations_with_owners_and_types(owners, types);
    }

    pub fn observe_status(&self, observer: Box<dyn Fn(StatusPayload)>) -> ObserverId {
        self.runner.observe_status(observer)
    }

    pub fn remove_status_observer(&self, id: ObserverId) -> bool {
        self.runner.remove_status_observer(id)
    }

    fn launch(&self, animator: Rc<dyn CameraAnimator>, completion: Option<Completion>) {
        if let Some(completion) = completion {
            animator.add_completion(completion);
        }
        self.runner.add(animator.clone());
        animator.start();
    }
}

impl fmt::Debug for AnimationsManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationsManager")
            .field("runner", &self.runner)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::{AnimatingPosition, AnimatorState, Cancelable};
    use crate::error::ConfigError;
    use meridian_core::{CameraState, Coordinate, HeadlessRenderer, ManualClock, Size};
    use std::cell::RefCell;

    struct Fixture {
        renderer: Rc<HeadlessRenderer>,
        clock: Rc<ManualClock>,
        manager: AnimationsManager,
    }

    fn fixture() -> Fixture {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();

        let renderer = Rc::new(HeadlessRenderer::new(
            CameraState::new(Coordinate::new(0.0, 0.0), 2.0, 0.0, 0.0),
            Size::new(400.0, 800.0),
        ));
        let clock = Rc::new(ManualClock::new());
        let manager = AnimationsManager::with_config(
            renderer.clone(),
            clock.clone(),
            AnimationConfig::testing(),
        )
        .expect("testing config is valid");
        manager.set_enabled(true);
        Fixture {
            renderer,
            clock,
            manager,
        }
    }

    fn record(log: &Rc<RefCell<Vec<AnimatingPosition>>>) -> Option<Completion> {
        let log = log.clone();
        Some(Box::new(move |pos| log.borrow_mut().push(pos)))
    }

    fn tick(fixture: &Fixture, frames: usize, frame: Duration) {
        for _ in 0..frames {
            fixture.clock.advance(frame);
            fixture.manager.update();
        }
    }

    #[test]
    fn test_fly_to_runs_to_completion() {
        let f = fixture();
        let done = Rc::new(RefCell::new(Vec::new()));
        let to = CameraPose::new()
            .with_center(Coordinate::new(35.0, 139.0))
            .with_zoom(9.0);

        let animator = f.manager.fly_to(
            to,
            Some(Duration::from_secs(1)),
            TimingCurve::EaseInOut,
            record(&done),
        );
        assert!(animator.is_running());
        assert_eq!(f.renderer.animation_depth(), 1);

        tick(&f, 70, Duration::from_millis(16));
        let state = f.renderer.camera_state();
        assert!(state.center.approx_eq(&Coordinate::new(35.0, 139.0), 1e-9));
        assert_eq!(state.zoom, 9.0);
        assert_eq!(*done.borrow(), vec![AnimatingPosition::End]);
        assert_eq!(f.renderer.animation_depth(), 0);
        assert_eq!(f.renderer.begin_count(), f.renderer.end_count());
    }

    #[test]
    fn test_same_owner_cancels_previous() {
        let f = fixture();
        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));

        let a = f.manager.ease(
            CameraPose::new().with_zoom(6.0),
            Duration::from_secs(1),
            TimingCurve::Linear,
            None,
            record(&first),
        );
        tick(&f, 1, Duration::from_millis(100));

        let b = f.manager.fly_to(
            CameraPose::new().with_zoom(4.0),
            Some(Duration::from_secs(1)),
            TimingCurve::Linear,
            record(&second),
        );
        assert_eq!(a.state(), AnimatorState::Inactive);
        assert!(b.is_running());
        f.manager.update();
        assert_eq!(*first.borrow(), vec![AnimatingPosition::Current]);
        assert!(second.borrow().is_empty());
        assert_eq!(f.renderer.animation_depth(), 1);
    }

    #[test]
    fn test_distinct_owners_coexist() {
        let f = fixture();
        let a = f.manager.ease(
            CameraPose::new().with_pitch(40.0),
            Duration::from_secs(1),
            TimingCurve::Linear,
            Some(AnimationOwner::new("compass")),
            None,
        );
        let b = f.manager.ease(
            CameraPose::new().with_zoom(5.0),
            Duration::from_secs(1),
            TimingCurve::Linear,
            Some(AnimationOwner::new("zoom-buttons")),
            None,
        );
        assert!(a.is_running() && b.is_running());
        assert_eq!(f.manager.animators().len(), 2);

        tick(&f, 1, Duration::from_secs(2));
        let state = f.renderer.camera_state();
        assert_eq!(state.pitch, 40.0);
        assert_eq!(state.zoom, 5.0);
    }

    #[test]
    fn test_ease_holds_requested_anchor() {
        let f = fixture();
        let anchor = ScreenPoint::new(120.0, 300.0);
        f.manager.ease(
            CameraPose::new().with_zoom(5.0).with_anchor(anchor),
            Duration::from_millis(500),
            TimingCurve::EaseOut,
            None,
            None,
        );
        tick(&f, 40, Duration::from_millis(16));

        let poses = f.renderer.poses();
        assert!(!poses.is_empty());
        assert!(poses.iter().all(|pose| pose.anchor == Some(anchor)));
        assert_eq!(f.renderer.camera_state().zoom, 5.0);
    }

    #[test]
    fn test_decelerate_reports_steps_and_is_cancellable_by_type() {
        let f = fixture();
        let steps = Rc::new(RefCell::new(0));
        let s = steps.clone();
        let done = Rc::new(RefCell::new(Vec::new()));

        let animator = f.manager.decelerate(
            ScreenPoint::new(200.0, 400.0),
            ScreenPoint::new(2000.0, 0.0),
            0.998,
            move |_, _| *s.borrow_mut() += 1,
            record(&done),
        );
        assert_eq!(animator.owner(), AnimationOwner::DEFAULT);
        assert_eq!(animator.animation_type(), AnimationType::Deceleration);

        tick(&f, 3, Duration::from_millis(16));
        assert_eq!(*steps.borrow(), 3);

        f.manager.cancel_animations_with_owners_and_types(
            &[AnimationOwner::DEFAULT],
            &[AnimationType::Deceleration],
        );
        f.manager.update();
        assert!(!animator.is_running());
        assert_eq!(*done.borrow(), vec![AnimatingPosition::Current]);
    }

    #[test]
    fn test_make_animator_is_registered_but_unstarted() {
        let f = fixture();
        let owner = AnimationOwner::new("tour");
        let previous = f.manager.ease(
            CameraPose::new().with_zoom(3.0),
            Duration::from_secs(1),
            TimingCurve::Linear,
            Some(owner.clone()),
            None,
        );

        let animator = f.manager.make_animator_with_control_points(
            Duration::from_millis(300),
            (0.25, 0.1, 0.25, 1.0),
            owner,
            |transition| transition.bearing.to = Some(90.0),
        );
        assert!(!previous.is_running());
        assert_eq!(animator.state(), AnimatorState::Inactive);
        assert_eq!(animator.curve(), TimingCurve::cubic_bezier(0.25, 0.1, 0.25, 1.0));
        assert_eq!(f.manager.animators().len(), 1);

        tick(&f, 1, Duration::from_millis(16));
        assert_eq!(f.renderer.camera_state().bearing, 0.0);

        animator.start();
        tick(&f, 30, Duration::from_millis(16));
        assert_eq!(f.renderer.camera_state().bearing, 90.0);
    }

    #[test]
    fn test_transition_is_seeded_when_animator_starts() {
        let f = fixture();
        let animator = f.manager.make_animator(
            Duration::from_millis(200),
            TimingCurve::Linear,
            AnimationOwner::DEFAULT,
            |transition| transition.zoom.to = Some(transition.zoom.from + 1.0),
        );

        // Camera moved between building and starting
        f.renderer.reset_state(CameraState::new(Coordinate::new(10.0, 10.0), 7.0, 0.0, 0.0));
        f.renderer.set_anchor(ScreenPoint::new(50.0, 60.0));
        animator.start();

        let transition = animator.transition().expect("running animator has a transition");
        assert_eq!(transition.zoom.from, 7.0);
        assert_eq!(transition.anchor.from, ScreenPoint::new(50.0, 60.0));

        tick(&f, 20, Duration::from_millis(16));
        assert_eq!(f.renderer.camera_state().zoom, 8.0);
    }

    #[test]
    fn test_make_simple_animator_with_spring_builder() {
        let f = fixture();
        let simple = f.manager.make_simple_animator(
            CameraPose::new().with_zoom(2.0),
            CameraPose::new().with_zoom(3.0),
            Duration::from_millis(200),
            TimingCurve::Linear,
            AnimationOwner::VIEWPORT,
        );
        assert!(!simple.is_running());

        let spring = f.manager.make_animator_with_damping_ratio(
            Duration::from_millis(200),
            0.6,
            AnimationOwner::new("bounce"),
            |transition| transition.zoom.to = Some(4.0),
        );
        assert_eq!(spring.curve(), TimingCurve::spring(0.6));

        simple.start();
        spring.start();
        tick(&f, 20, Duration::from_millis(16));
        // Later registration wins the shared field
        assert_eq!(f.renderer.camera_state().zoom, 4.0);
    }

    #[test]
    fn test_disabled_manager_completes_immediately() {
        let f = fixture();
        f.manager.set_enabled(false);
        let done = Rc::new(RefCell::new(Vec::new()));

        let animator = f.manager.fly_to(
            CameraPose::new().with_zoom(12.0),
            None,
            TimingCurve::EaseOut,
            record(&done),
        );
        assert!(!animator.is_running());
        assert_eq!(*done.borrow(), vec![AnimatingPosition::Current]);
        assert_eq!(f.renderer.set_camera_count(), 0);
        assert_eq!(f.renderer.animation_depth(), 0);
    }

    #[test]
    fn test_status_feed_through_manager() {
        let f = fixture();
        let statuses = Rc::new(RefCell::new(Vec::new()));
        let s = statuses.clone();
        f.manager
            .observe_status(Box::new(move |(_, status)| s.borrow_mut().push(status)));

        f.manager.ease(
            CameraPose::new().with_zoom(3.0),
            Duration::from_millis(100),
            TimingCurve::Linear,
            None,
            None,
        );
        f.manager.cancel_animations();
        assert_eq!(statuses.borrow().len(), 2);
    }

    #[test]
    fn test_with_config_rejects_inverted_duration_range() {
        let renderer = Rc::new(HeadlessRenderer::new(
            CameraState::new(Coordinate::new(0.0, 0.0), 2.0, 0.0, 0.0),
            Size::new(400.0, 800.0),
        ));
        let config = AnimationConfig::standard().with_fly_to_duration_range(2_000, 100);
        let result = AnimationsManager::with_config(renderer, Rc::new(ManualClock::new()), config);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_decelerate_replaces_default_owner_ease() {
        let f = fixture();
        let done = Rc::new(RefCell::new(Vec::new()));
        let ease = f.manager.ease(
            CameraPose::new().with_zoom(6.0),
            Duration::from_secs(1),
            TimingCurve::Linear,
            None,
            record(&done),
        );
        tick(&f, 1, Duration::from_millis(16));

        let fling = f.manager.decelerate(
            ScreenPoint::new(200.0, 400.0),
            ScreenPoint::new(1000.0, 0.0),
            0.99,
            |_, _| {},
            None,
        );
        assert_eq!(ease.state(), AnimatorState::Inactive);
        assert!(fling.is_running());
        assert_eq!(*done.borrow(), vec![AnimatingPosition::Current]);
        assert_eq!(f.manager.animators().len(), 1);
    }

    #[test]
    fn test_cancel_from_completion_defers_to_next_tick() {
        let f = fixture();
        let other_done = Rc::new(RefCell::new(Vec::new()));
        let other = f.manager.ease(
            CameraPose::new().with_pitch(30.0),
            Duration::from_secs(1),
            TimingCurve::Linear,
            Some(AnimationOwner::new("compass")),
            record(&other_done),
        );

        let target = other.clone();
        let first = f.manager.ease(
            CameraPose::new().with_zoom(4.0),
            Duration::from_millis(100),
            TimingCurve::Linear,
            None,
            Some(Box::new(move |_| target.cancel())),
        );

        tick(&f, 1, Duration::from_millis(200));
        assert_eq!(first.state(), AnimatorState::Inactive);
        assert_eq!(other.state(), AnimatorState::Inactive);
        assert!(other_done.borrow().is_empty());

        f.manager.update();
        assert_eq!(*other_done.borrow(), vec![AnimatingPosition::Current]);
    }
}
