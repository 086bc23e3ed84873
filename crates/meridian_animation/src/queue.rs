//! Deferred task queue
//!
//! Work that must not run on the caller's stack (completions registered
//! after an animator finished, completions of an animator stopped from
//! inside another callback) is pushed onto a [`TaskQueue`] and runs on the
//! next scheduler turn, i.e. the next [`TaskQueue::drain`]. The runner
//! drains the queue at the start of every tick.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::animator::{AnimatingPosition, Completion};

type Task = Box<dyn FnOnce()>;

struct QueueInner {
    tasks: RefCell<VecDeque<Task>>,
    /// Number of drains or completion dispatches currently on the stack
    depth: Cell<u32>,
}

/// Single-threaded queue of deferred callbacks
///
/// Clones share the same queue.
#[derive(Clone)]
pub struct TaskQueue {
    inner: Rc<QueueInner>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(QueueInner {
                tasks: RefCell::new(VecDeque::new()),
                depth: Cell::new(0),
            }),
        }
    }

    /// Schedule a task for the next scheduler turn
    pub fn defer(&self, task: impl FnOnce() + 'static) {
        self.inner.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Number of tasks waiting for the next turn
    pub fn len(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.tasks.borrow().is_empty()
    }

    /// True while a drain or completion dispatch is running
    pub fn is_dispatching(&self) -> bool {
        self.inner.depth.get() > 0
    }

    /// Run one scheduler turn
    ///
    /// Only the tasks queued before the call run; anything they defer waits
    /// for the following turn. Returns the number of tasks run.
    pub fn drain(&self) -> usize {
        let batch = std::mem::take(&mut *self.inner.tasks.borrow_mut());
        if batch.is_empty() {
            return 0;
        }
        let count = batch.len();
        tracing::trace!("TaskQueue: draining {} task(s)", count);

        let _guard = DepthGuard::enter(&self.inner.depth);
        for task in batch {
            task();
        }
        count
    }

    /// Invoke completions with `position`
    ///
    /// Runs them synchronously from ordinary code. When called while another
    /// dispatch is already on the stack the completions are deferred instead,
    /// so completion dispatch never recurses.
    pub(crate) fn dispatch_completions(
        &self,
        completions: Vec<Completion>,
        position: AnimatingPosition,
    ) {
        if completions.is_empty() {
            return;
        }
        if self.is_dispatching() {
            self.defer(move || {
                for completion in completions {
                    completion(position);
                }
            });
            return;
        }

        let _guard = DepthGuard::enter(&self.inner.depth);
        for completion in completions {
            completion(position);
        }
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.len())
            .field("depth", &self.inner.depth.get())
            .finish()
    }
}

/// Restores the dispatch depth even if a callback panics
struct DepthGuard<'a> {
    depth: &'a Cell<u32>,
}

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a Cell<u32>) -> Self {
        depth.set(depth.get() + 1);
        Self { depth }
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deferred_tasks_wait_for_drain() {
        let queue = TaskQueue::new();
        let hits = Rc::new(Cell::new(0));

        let h = hits.clone();
        queue.defer(move || h.set(h.get() + 1));
        assert_eq!(hits.get(), 0);
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.drain(), 1);
        assert_eq!(hits.get(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_tasks_deferred_during_drain_run_next_turn() {
        let queue = TaskQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let q = queue.clone();
        let l = log.clone();
        queue.defer(move || {
            l.borrow_mut().push("first");
            let l2 = l.clone();
            q.defer(move || l2.borrow_mut().push("second"));
        });

        queue.drain();
        assert_eq!(*log.borrow(), vec!["first"]);
        queue.drain();
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_completions_run_synchronously_outside_dispatch() {
        let queue = TaskQueue::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = seen.clone();
        let completion: Completion = Box::new(move |pos| s.borrow_mut().push(pos));
        queue.dispatch_completions(vec![completion], AnimatingPosition::End);

        assert_eq!(*seen.borrow(), vec![AnimatingPosition::End]);
        assert!(!queue.is_dispatching());
    }

    #[test]
    fn test_nested_completions_are_deferred() {
        let queue = TaskQueue::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let q = queue.clone();
        let s = seen.clone();
        let outer: Completion = Box::new(move |_| {
            let s2 = s.clone();
            let inner: Completion = Box::new(move |pos| s2.borrow_mut().push(pos));
            q.dispatch_completions(vec![inner], AnimatingPosition::Current);
            // Still queued while the outer completion runs
            assert!(s.borrow().is_empty());
        });
        queue.dispatch_completions(vec![outer], AnimatingPosition::End);

        assert!(seen.borrow().is_empty());
        assert_eq!(queue.len(), 1);
        queue.drain();
        assert_eq!(*seen.borrow(), vec![AnimatingPosition::Current]);
    }
}
