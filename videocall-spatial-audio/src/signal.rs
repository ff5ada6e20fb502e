/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

//! Single-threaded change-notification channel.
//!
//! A [`Signal`] fans a value out to every registered listener. A replaying
//! signal also remembers the last dispatched value and hands it to listeners
//! as they register, which suits state (configuration, current track). A
//! transient signal only delivers values dispatched after registration, which
//! suits one-shot events (joins, leaves, clears).

use crate::subscription::Subscription;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

type Listener<T> = Rc<dyn Fn(T)>;

struct SignalInner<T> {
    listeners: RefCell<BTreeMap<u64, Listener<T>>>,
    next_id: Cell<u64>,
    last_value: RefCell<Option<T>>,
    replay: bool,
}

pub struct Signal<T: Clone + 'static> {
    inner: Rc<SignalInner<T>>,
}

impl<T: Clone + 'static> Signal<T> {
    /// A signal that replays its most recent value to new listeners.
    pub fn new() -> Self {
        Self::with_replay(true)
    }

    /// A signal that never replays.
    pub fn transient() -> Self {
        Self::with_replay(false)
    }

    fn with_replay(replay: bool) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                listeners: RefCell::new(BTreeMap::new()),
                next_id: Cell::new(0),
                last_value: RefCell::new(None),
                replay,
            }),
        }
    }

    /// Deliver `value` to every listener registered at the time of the call.
    ///
    /// Listeners may add or cancel subscriptions on this signal while being
    /// notified; those changes take effect from the next dispatch.
    pub fn dispatch(&self, value: T) {
        if self.inner.replay {
            *self.inner.last_value.borrow_mut() = Some(value.clone());
        }
        let listeners: Vec<Listener<T>> =
            self.inner.listeners.borrow().values().cloned().collect();
        for listener in listeners {
            listener(value.clone());
        }
    }

    pub fn add<F: Fn(T) + 'static>(&self, listener: F) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);

        let listener: Listener<T> = Rc::new(listener);
        self.inner
            .listeners
            .borrow_mut()
            .insert(id, Rc::clone(&listener));

        let replayed = self.inner.last_value.borrow().clone();
        if let Some(value) = replayed {
            listener(value);
        }

        let weak: Weak<SignalInner<T>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().remove(&id);
            }
        })
    }

    /// Most recently dispatched value, if this signal replays.
    pub fn last_value(&self) -> Option<T> {
        self.inner.last_value.borrow().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

impl<T: Clone + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaying_signal_hands_last_value_to_late_listener() {
        let signal = Signal::new();
        signal.dispatch(7u32);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _sub = signal.add(move |v| sink.borrow_mut().push(v));
        signal.dispatch(8);

        assert_eq!(*seen.borrow(), vec![7, 8]);
    }

    #[test]
    fn transient_signal_does_not_replay() {
        let signal = Signal::transient();
        signal.dispatch("joined".to_string());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _sub = signal.add(move |v: String| sink.borrow_mut().push(v));

        assert!(seen.borrow().is_empty());
        assert_eq!(signal.last_value(), None);
    }

    #[test]
    fn cancelled_listener_stops_receiving() {
        let signal = Signal::transient();
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let mut sub = signal.add(move |_: ()| counter.set(counter.get() + 1));

        signal.dispatch(());
        sub.cancel();
        signal.dispatch(());

        assert_eq!(count.get(), 1);
        assert_eq!(signal.listener_count(), 0);
    }

    #[test]
    fn listener_may_subscribe_during_dispatch() {
        let signal: Signal<u8> = Signal::transient();
        let nested = Rc::new(RefCell::new(Vec::new()));
        let handle = signal.clone();
        let store = nested.clone();
        let _sub = signal.add(move |_| {
            store.borrow_mut().push(handle.add(|_| {}));
        });

        signal.dispatch(1);
        assert_eq!(signal.listener_count(), 2);
    }
}
