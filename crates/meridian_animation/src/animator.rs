//! Animator contract
//!
//! Every camera animation strategy implements [`CameraAnimator`]: a
//! single-shot state machine that goes `Inactive → Active → Inactive`,
//! publishes [`AnimatorStatus`] changes, and resolves each registered
//! completion exactly once with the position it stopped at.
//!
//! The shared bookkeeping (phase, status observers, completions) lives in
//! `AnimatorCore`, which the concrete animators embed.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::time::Duration;

use crate::queue::TaskQueue;
use crate::signal::{ObserverId, Signal};

/// Handler invoked once with the animator's terminal position
pub type Completion = Box<dyn FnOnce(AnimatingPosition)>;

// ============================================================================
// Identity and status types
// ============================================================================

/// Tag naming which subsystem requested an animation
///
/// Used for conflict-based cancellation: starting an animation through the
/// manager cancels everything else with the same owner.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationOwner(Cow<'static, str>);

impl AnimationOwner {
    /// Animations driven by gesture recognizers
    pub const GESTURES: Self = Self(Cow::Borrowed("gestures"));
    /// Animations driven by the viewport state machine
    pub const VIEWPORT: Self = Self(Cow::Borrowed("viewport"));
    /// Owner of manager calls that don't name one
    pub const DEFAULT: Self = Self(Cow::Borrowed("user:default"));

    pub fn new(raw: impl Into<Cow<'static, str>>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AnimationOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnimationOwner({:?})", self.as_str())
    }
}

impl fmt::Display for AnimationOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&'static str> for AnimationOwner {
    fn from(raw: &'static str) -> Self {
        Self::new(raw)
    }
}

/// Coarse category used for bulk cancellation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AnimationType {
    #[default]
    Unspecified,
    Deceleration,
}

/// Where an animator stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimatingPosition {
    Start,
    End,
    Current,
}

/// Whether an animator is in flight
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimatorState {
    Inactive,
    Active,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StopReason {
    Finished,
    Cancelled,
}

/// Lifecycle notification published by an animator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimatorStatus {
    Started,
    Paused,
    Stopped { reason: StopReason },
}

// ============================================================================
// Contract
// ============================================================================

/// Anything that can be cancelled
pub trait Cancelable {
    fn cancel(&self);
}

/// The contract shared by every animation strategy
///
/// Methods take `&self`; implementations use interior mutability so that
/// animators can be shared between the runner and the caller as `Rc`s.
pub trait CameraAnimator: Cancelable {
    fn owner(&self) -> AnimationOwner;

    fn animation_type(&self) -> AnimationType;

    /// `Active` while running or paused
    fn state(&self) -> AnimatorState;

    /// True only while running
    fn is_running(&self) -> bool;

    /// Start or resume. Ignored once the animator is terminal.
    fn start(&self);

    fn start_after_delay(&self, delay: Duration);

    /// Suspend without invoking completions
    fn pause(&self);

    /// Stop immediately, resolving completions with [`AnimatingPosition::Current`]
    fn stop(&self);

    /// Register a completion. After the animator is terminal the handler
    /// runs on the next scheduler turn, never before this call returns.
    fn add_completion(&self, completion: Completion);

    /// Advance by one frame
    fn update(&self);

    fn observe_status(&self, observer: Box<dyn Fn(AnimatorStatus)>) -> ObserverId;

    /// Returns false if the observer was already removed
    fn remove_observer(&self, id: ObserverId) -> bool;
}

/// Convenience observers for [`CameraAnimator`]s
pub trait AnimatorEvents: CameraAnimator {
    fn on_started(&self, handler: impl Fn() + 'static) -> ObserverId {
        self.observe_status(Box::new(move |status| {
            if status == AnimatorStatus::Started {
                handler();
            }
        }))
    }

    fn on_finished(&self, handler: impl Fn() + 'static) -> ObserverId {
        self.observe_status(Box::new(move |status| {
            if status == (AnimatorStatus::Stopped { reason: StopReason::Finished }) {
                handler();
            }
        }))
    }

    fn on_cancelled(&self, handler: impl Fn() + 'static) -> ObserverId {
        self.observe_status(Box::new(move |status| {
            if status == (AnimatorStatus::Stopped { reason: StopReason::Cancelled }) {
                handler();
            }
        }))
    }
}

impl<T: CameraAnimator + ?Sized> AnimatorEvents for T {}

// ============================================================================
// Shared state machine
// ============================================================================

/// Internal lifecycle of an animator
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Phase {
    Initial,
    Running,
    Paused,
    Final(AnimatingPosition),
}

/// Phase, completions and status signal shared by all animators
pub(crate) struct AnimatorCore {
    owner: AnimationOwner,
    animation_type: AnimationType,
    phase: Cell<Phase>,
    /// Set once `Started` has been published
    did_start: Cell<bool>,
    completions: RefCell<Vec<Completion>>,
    status: Signal<AnimatorStatus>,
    queue: TaskQueue,
}

impl AnimatorCore {
    pub(crate) fn new(
        owner: AnimationOwner,
        animation_type: AnimationType,
        queue: TaskQueue,
    ) -> Self {
        Self {
            owner,
            animation_type,
            phase: Cell::new(Phase::Initial),
            did_start: Cell::new(false),
            completions: RefCell::new(Vec::new()),
            status: Signal::new(),
            queue,
        }
    }

    pub(crate) fn owner(&self) -> AnimationOwner {
        self.owner.clone()
    }

    pub(crate) fn animation_type(&self) -> AnimationType {
        self.animation_type
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub(crate) fn state(&self) -> AnimatorState {
        match self.phase.get() {
            Phase::Running | Phase::Paused => AnimatorState::Active,
            Phase::Initial | Phase::Final(_) => AnimatorState::Inactive,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.phase.get() == Phase::Running
    }

    pub(crate) fn is_terminal(&self) -> bool {
        matches!(self.phase.get(), Phase::Final(_))
    }

    /// Move to `next` and publish the matching status, if any
    pub(crate) fn set_phase(&self, next: Phase) {
        let previous = self.phase.replace(next);
        let status = match (previous, next) {
            (Phase::Initial, Phase::Running) | (Phase::Paused, Phase::Running) => {
                Some(AnimatorStatus::Started)
            }
            (Phase::Running, Phase::Paused) => Some(AnimatorStatus::Paused),
            // A pause straight out of Initial never started
            (Phase::Running, Phase::Final(position)) | (Phase::Paused, Phase::Final(position))
                if self.did_start.get() =>
            {
                let reason = if position == AnimatingPosition::End {
                    StopReason::Finished
                } else {
                    StopReason::Cancelled
                };
                Some(AnimatorStatus::Stopped { reason })
            }
            // Same phase, initial → paused/final, or anything out of final
            _ => None,
        };
        if status == Some(AnimatorStatus::Started) {
            self.did_start.set(true);
        }
        if let Some(status) = status {
            tracing::trace!("CameraAnimator[{}]: {:?} -> {:?}", self.owner, previous, next);
            self.status.send(status);
        }
    }

    /// Become terminal at `position` and resolve every completion
    ///
    /// Returns false if the animator was already terminal.
    pub(crate) fn finish(&self, position: AnimatingPosition) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.set_phase(Phase::Final(position));
        let completions = std::mem::take(&mut *self.completions.borrow_mut());
        self.queue.dispatch_completions(completions, position);
        true
    }

    pub(crate) fn add_completion(&self, completion: Completion) {
        match self.phase.get() {
            Phase::Final(position) => self.queue.defer(move || completion(position)),
            _ => self.completions.borrow_mut().push(completion),
        }
    }

    pub(crate) fn observe_status(&self, observer: Box<dyn Fn(AnimatorStatus)>) -> ObserverId {
        self.status.observe(observer)
    }

    pub(crate) fn remove_observer(&self, id: ObserverId) -> bool {
        self.status.remove(id)
    }
}

impl fmt::Debug for AnimatorCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatorCore")
            .field("owner", &self.owner)
            .field("animation_type", &self.animation_type)
            .field("phase", &self.phase.get())
            .field("did_start", &self.did_start.get())
            .field("completions", &self.completions.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn new_core(queue: TaskQueue) -> AnimatorCore {
        AnimatorCore::new(AnimationOwner::DEFAULT, AnimationType::Unspecified, queue)
    }

    fn recorder(core: &AnimatorCore) -> Rc<RefCell<Vec<AnimatorStatus>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        core.observe_status(Box::new(move |status| l.borrow_mut().push(status)));
        log
    }

    #[test]
    fn test_owner_constants() {
        assert_eq!(AnimationOwner::GESTURES.as_str(), "gestures");
        assert_eq!(AnimationOwner::VIEWPORT.as_str(), "viewport");
        assert_eq!(AnimationOwner::DEFAULT.to_string(), "user:default");
        assert_eq!(AnimationOwner::new("viewport".to_string()), AnimationOwner::VIEWPORT);
    }

    #[test]
    fn test_phase_transitions_publish_statuses() {
        let core = new_core(TaskQueue::new());
        let log = recorder(&core);

        core.set_phase(Phase::Running);
        core.set_phase(Phase::Paused);
        assert_eq!(core.state(), AnimatorState::Active);
        core.set_phase(Phase::Running);
        core.finish(AnimatingPosition::End);

        assert_eq!(
            *log.borrow(),
            vec![
                AnimatorStatus::Started,
                AnimatorStatus::Paused,
                AnimatorStatus::Started,
                AnimatorStatus::Stopped { reason: StopReason::Finished },
            ]
        );
        assert_eq!(core.state(), AnimatorState::Inactive);
    }

    #[test]
    fn test_stop_before_start_is_silent_but_completes() {
        let core = new_core(TaskQueue::new());
        let log = recorder(&core);
        let positions = Rc::new(RefCell::new(Vec::new()));

        let p = positions.clone();
        core.add_completion(Box::new(move |pos| p.borrow_mut().push(pos)));
        assert!(core.finish(AnimatingPosition::Current));
        assert!(!core.finish(AnimatingPosition::End));

        assert!(log.borrow().is_empty());
        assert_eq!(*positions.borrow(), vec![AnimatingPosition::Current]);
    }

    #[test]
    fn test_stop_after_initial_pause_is_silent() {
        let core = new_core(TaskQueue::new());
        let log = recorder(&core);
        let positions = Rc::new(RefCell::new(Vec::new()));
        let p = positions.clone();
        core.add_completion(Box::new(move |pos| p.borrow_mut().push(pos)));

        core.set_phase(Phase::Paused);
        assert_eq!(core.state(), AnimatorState::Active);
        core.finish(AnimatingPosition::Current);

        assert!(log.borrow().is_empty());
        assert_eq!(*positions.borrow(), vec![AnimatingPosition::Current]);
    }

    #[test]
    fn test_non_end_positions_report_cancelled() {
        let core = new_core(TaskQueue::new());
        let log = recorder(&core);
        core.set_phase(Phase::Running);
        core.finish(AnimatingPosition::Start);
        assert_eq!(
            log.borrow().last(),
            Some(&AnimatorStatus::Stopped { reason: StopReason::Cancelled })
        );
    }

    #[test]
    fn test_completion_after_terminal_is_deferred() {
        let queue = TaskQueue::new();
        let core = new_core(queue.clone());
        core.finish(AnimatingPosition::End);

        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        core.add_completion(Box::new(move |pos| {
            assert_eq!(pos, AnimatingPosition::End);
            h.set(h.get() + 1);
        }));
        assert_eq!(hits.get(), 0);

        queue.drain();
        assert_eq!(hits.get(), 1);
        queue.drain();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_removed_observer_is_not_notified() {
        let core = new_core(TaskQueue::new());
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let id = core.observe_status(Box::new(move |_| h.set(h.get() + 1)));

        core.set_phase(Phase::Running);
        assert!(core.remove_observer(id));
        assert!(!core.remove_observer(id));
        core.finish(AnimatingPosition::Current);
        assert_eq!(hits.get(), 1);
    }
}
