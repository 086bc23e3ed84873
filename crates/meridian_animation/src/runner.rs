//! Animator runner
//!
//! The runner keeps the registry of live animators and drives the running
//! ones once per display tick. Registered animators are held weakly; the
//! runner takes a strong reference only while an animator is running, so
//! dropping the runner (or the surface it belongs to) releases everything.
//!
//! The runner also translates animator status changes into renderer
//! notifications: `begin_animation` when an animator starts running and
//! `end_animation` when it stops or pauses.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use meridian_core::CameraRenderer;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::animator::{AnimationOwner, AnimationType, AnimatorStatus, CameraAnimator};
use crate::queue::TaskQueue;
use crate::signal::{ObserverId, Signal};

new_key_type! {
    /// Handle to a registered animator
    pub struct AnimatorId;
}

/// Animator and status forwarded to runner-wide observers
pub type StatusPayload = (Rc<dyn CameraAnimator>, AnimatorStatus);

struct Entry {
    animator: Weak<dyn CameraAnimator>,
    /// Registration order
    seq: u64,
    /// Observer installed on the animator
    observer: ObserverId,
}

struct RunningAnimator {
    id: AnimatorId,
    seq: u64,
    animator: Rc<dyn CameraAnimator>,
}

struct RunnerInner {
    renderer: Rc<dyn CameraRenderer>,
    queue: TaskQueue,
    enabled: Cell<bool>,
    entries: RefCell<SlotMap<AnimatorId, Entry>>,
    /// Strong references to running animators, in registration order
    running: RefCell<Vec<RunningAnimator>>,
    next_seq: Cell<u64>,
    status: Signal<StatusPayload>,
    animating: Signal<bool>,
}

/// Registry and per-frame driver of camera animators
///
/// Clones share the same registry.
#[derive(Clone)]
pub struct AnimatorsRunner {
    inner: Rc<RunnerInner>,
}

impl AnimatorsRunner {
    /// Create a disabled runner; call [`set_enabled`](Self::set_enabled)
    /// once the surface is attached to a display.
    pub fn new(renderer: Rc<dyn CameraRenderer>, queue: TaskQueue) -> Self {
        Self {
            inner: Rc::new(RunnerInner {
                renderer,
                queue,
                enabled: Cell::new(false),
                entries: RefCell::new(SlotMap::with_key()),
                running: RefCell::new(Vec::new()),
                next_seq: Cell::new(0),
                status: Signal::new(),
                animating: Signal::new(),
            }),
        }
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.inner.queue
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.get()
    }

    /// Disabling stops every animator; while disabled nothing may run.
    pub fn set_enabled(&self, enabled: bool) {
        let was = self.inner.enabled.replace(enabled);
        if was != enabled {
            tracing::debug!("AnimatorsRunner: set_enabled({})", enabled);
        }
        if !enabled {
            self.cancel_animations();
        }
    }

    /// Register an animator
    ///
    /// Registering the same animator twice returns the existing id. A
    /// disabled runner stops the animator immediately and does not keep it
    /// registered.
    pub fn add(&self, animator: Rc<dyn CameraAnimator>) -> AnimatorId {
        self.prune();

        if let Some(id) = self.find(&animator) {
            return id;
        }

        let seq = self.inner.next_seq.get();
        self.inner.next_seq.set(seq + 1);

        let id = self.inner.entries.borrow_mut().insert_with_key(|id| Entry {
            animator: Rc::downgrade(&animator),
            seq,
            observer: ObserverId::default(),
        });

        let runner = Rc::downgrade(&self.inner);
        let observer = animator.observe_status(Box::new(move |status| {
            if let Some(inner) = runner.upgrade() {
                AnimatorsRunner { inner }.handle_status(id, status);
            }
        }));
        if let Some(entry) = self.inner.entries.borrow_mut().get_mut(id) {
            entry.observer = observer;
        }
        tracing::debug!(
            "AnimatorsRunner: registered {:?} owner={} type={:?}",
            id,
            animator.owner(),
            animator.animation_type()
        );

        // Started before registration
        if animator.is_running() {
            self.did_start(id, &animator);
        }
        if !self.is_enabled() {
            animator.stop();
            self.forget(id, animator.as_ref());
        }
        id
    }

    /// Drive one display tick
    ///
    /// Runs the deferred tasks of the previous turn first. When disabled the
    /// tick cancels everything instead of updating.
    pub fn update(&self) {
        self.inner.queue.drain();

        if !self.is_enabled() {
            self.cancel_animations();
            return;
        }

        let running: Vec<Rc<dyn CameraAnimator>> = self
            .inner
            .running
            .borrow()
            .iter()
            .map(|r| r.animator.clone())
            .collect();
        for animator in running {
            // An earlier animator's completion may have stopped this one
            if animator.is_running() {
                animator.update();
            }
        }
    }

    /// Live registered animators, in registration order
    pub fn animators(&self) -> Vec<Rc<dyn CameraAnimator>> {
        self.live_entries()
            .into_iter()
            .map(|(_, animator)| animator)
            .collect()
    }

    pub fn get(&self, id: AnimatorId) -> Option<Rc<dyn CameraAnimator>> {
        self.inner
            .entries
            .borrow()
            .get(id)
            .and_then(|entry| entry.animator.upgrade())
    }

    /// Number of animators currently running
    pub fn running_count(&self) -> usize {
        self.inner.running.borrow().len()
    }

    /// True while at least one animator is running
    pub fn is_animating(&self) -> bool {
        self.running_count() > 0
    }

    /// Stop every registered animator
    pub fn cancel_animations(&self) {
        self.stop_matching(|_| true, "all");
    }

    /// Stop animators whose owner is in `owners`
    pub fn cancel_animations_with_owners(&self, owners: &[AnimationOwner]) {
        if owners.is_empty() {
            return;
        }
        self.stop_matching(|animator| owners.contains(&animator.owner()), "owners");
    }

    /// Stop animators whose owner is in `owners` and whose type is in `types`
    ///
    /// An empty `types` matches every type; an empty `owners` matches nothing.
    pub fn cancel_animations_with_owners_and_types(
        &self,
        owners: &[AnimationOwner],
        types: &[AnimationType],
    ) {
        if owners.is_empty() {
            return;
        }
        self.stop_matching(
            |animator| {
                owners.contains(&animator.owner())
                    && (types.is_empty() || types.contains(&animator.animation_type()))
            },
            "owners and types",
        );
    }

    /// Observe every registered animator's status changes
    pub fn observe_status(&self, observer: Box<dyn Fn(StatusPayload)>) -> ObserverId {
        self.inner.status.observe(observer)
    }

    pub fn remove_status_observer(&self, id: ObserverId) -> bool {
        self.inner.status.remove(id)
    }

    /// Observe the aggregate animating flag
    ///
    /// Fires `true` when the first animator starts running and `false` when
    /// the last one stops or pauses.
    pub fn observe_animating(&self, observer: Box<dyn Fn(bool)>) -> ObserverId {
        self.inner.animating.observe(observer)
    }

    pub fn remove_animating_observer(&self, id: ObserverId) -> bool {
        self.inner.animating.remove(id)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn find(&self, animator: &Rc<dyn CameraAnimator>) -> Option<AnimatorId> {
        let target = Rc::as_ptr(animator) as *const ();
        self.inner
            .entries
            .borrow()
            .iter()
            .find(|(_, entry)| entry.animator.as_ptr() as *const () == target)
            .map(|(id, _)| id)
    }

    /// Forget animators that have been dropped
    fn prune(&self) {
        self.inner
            .entries
            .borrow_mut()
            .retain(|_, entry| entry.animator.strong_count() > 0);
    }

    fn live_entries(&self) -> Vec<(AnimatorId, Rc<dyn CameraAnimator>)> {
        let mut live: Vec<(u64, AnimatorId, Rc<dyn CameraAnimator>)> = self
            .inner
            .entries
            .borrow()
            .iter()
            .filter_map(|(id, entry)| entry.animator.upgrade().map(|a| (entry.seq, id, a)))
            .collect();
        live.sort_by_key(|(seq, _, _)| *seq);
        live.into_iter()
            .map(|(_, id, animator)| (id, animator))
            .collect()
    }

    fn stop_matching(&self, matches: impl Fn(&dyn CameraAnimator) -> bool, what: &str) {
        let targets: SmallVec<[(AnimatorId, Rc<dyn CameraAnimator>); 8]> = self
            .live_entries()
            .into_iter()
            .filter(|(_, animator)| matches(animator.as_ref()))
            .collect();
        if targets.is_empty() {
            return;
        }
        tracing::debug!("AnimatorsRunner: cancelling {} animator(s) by {}", targets.len(), what);
        for (id, animator) in targets {
            animator.stop();
            // Stopping from Initial publishes no status, so drop the entry here
            self.forget(id, animator.as_ref());
        }
    }

    fn handle_status(&self, id: AnimatorId, status: AnimatorStatus) {
        let Some(animator) = self.get(id) else {
            return;
        };
        match status {
            AnimatorStatus::Started => self.did_start(id, &animator),
            AnimatorStatus::Paused | AnimatorStatus::Stopped { .. } => self.did_stop(id),
        }
        self.inner.status.send((animator.clone(), status));

        // Stopped animators never run again
        if let AnimatorStatus::Stopped { .. } = status {
            self.forget(id, animator.as_ref());
        }
    }

    fn forget(&self, id: AnimatorId, animator: &dyn CameraAnimator) {
        let entry = self.inner.entries.borrow_mut().remove(id);
        if let Some(entry) = entry {
            animator.remove_observer(entry.observer);
        }
    }

    fn did_start(&self, id: AnimatorId, animator: &Rc<dyn CameraAnimator>) {
        let count = {
            let mut running = self.inner.running.borrow_mut();
            if running.iter().any(|r| r.id == id) {
                return;
            }
            let seq = self
                .inner
                .entries
                .borrow()
                .get(id)
                .map_or(u64::MAX, |entry| entry.seq);
            let index = running.partition_point(|r| r.seq < seq);
            running.insert(
                index,
                RunningAnimator {
                    id,
                    seq,
                    animator: animator.clone(),
                },
            );
            running.len()
        };

        tracing::debug!("AnimatorsRunner: {:?} started ({} running)", id, count);
        self.inner.renderer.begin_animation();
        if count == 1 {
            self.inner.animating.send(true);
        }
    }

    fn did_stop(&self, id: AnimatorId) {
        // Dropped after the borrow ends; the animator may run user code in
        // its destructor
        let (removed, count) = {
            let mut running = self.inner.running.borrow_mut();
            let Some(index) = running.iter().position(|r| r.id == id) else {
                return;
            };
            let removed = running.remove(index);
            (removed, running.len())
        };

        tracing::debug!("AnimatorsRunner: {:?} stopped ({} running)", id, count);
        self.inner.renderer.end_animation();
        if count == 0 {
            self.inner.animating.send(false);
        }
        drop(removed);
    }
}

impl Drop for RunnerInner {
    fn drop(&mut self) {
        // Detach from animators that outlive the runner
        for entry in self.entries.get_mut().values() {
            if let Some(animator) = entry.animator.upgrade() {
                animator.remove_observer(entry.observer);
            }
        }
    }
}

impl fmt::Debug for AnimatorsRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatorsRunner")
            .field("enabled", &self.is_enabled())
            .field("registered", &self.inner.entries.borrow().len())
            .field("running", &self.running_count())
            .field("status_observers", &self.inner.status.len())
            .finish()
    }
}
