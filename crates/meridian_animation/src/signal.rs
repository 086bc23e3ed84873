//! Observer lists
//!
//! A [`Signal`] fans a value out to every registered observer. Observers are
//! keyed by slotmap handles so they can be removed without comparing
//! closures.

use std::cell::RefCell;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a registered observer
    pub struct ObserverId;
}

/// Single-threaded list of observers of `T`
pub(crate) struct Signal<T> {
    observers: RefCell<SlotMap<ObserverId, Rc<dyn Fn(T)>>>,
}

impl<T: Clone> Signal<T> {
    pub(crate) fn new() -> Self {
        Self {
            observers: RefCell::new(SlotMap::with_key()),
        }
    }

    pub(crate) fn observe(&self, observer: Box<dyn Fn(T)>) -> ObserverId {
        self.observers.borrow_mut().insert(Rc::from(observer))
    }

    /// Returns false if the observer was already removed
    pub(crate) fn remove(&self, id: ObserverId) -> bool {
        self.observers.borrow_mut().remove(id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.borrow().len()
    }

    /// Notify every observer
    ///
    /// Observers may subscribe or unsubscribe while being notified; the
    /// change applies from the next send.
    pub(crate) fn send(&self, value: T) {
        let observers: Vec<_> = self.observers.borrow().values().cloned().collect();
        for observer in observers {
            observer(value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_send_reaches_every_observer() {
        let signal = Signal::new();
        let total = Rc::new(Cell::new(0));

        for _ in 0..3 {
            let t = total.clone();
            signal.observe(Box::new(move |v: i32| t.set(t.get() + v)));
        }
        signal.send(2);
        assert_eq!(total.get(), 6);
    }

    #[test]
    fn test_observer_can_unsubscribe_itself() {
        let signal = Rc::new(Signal::new());
        let hits = Rc::new(Cell::new(0));
        let id = Rc::new(Cell::new(None));

        let s = Rc::downgrade(&signal);
        let h = hits.clone();
        let own_id = id.clone();
        let registered = signal.observe(Box::new(move |_: ()| {
            h.set(h.get() + 1);
            if let (Some(signal), Some(id)) = (s.upgrade(), own_id.get()) {
                signal.remove(id);
            }
        }));
        id.set(Some(registered));

        signal.send(());
        signal.send(());
        assert_eq!(hits.get(), 1);
        assert_eq!(signal.len(), 0);
    }
}
