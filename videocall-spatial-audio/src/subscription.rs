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

//! Explicit unsubscribe capability.
//!
//! Every listener registration in this crate hands back a [`Subscription`].
//! Cancelling runs the unsubscribe action at most once; dropping an
//! un-cancelled subscription cancels it.

use std::fmt;

pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new<F: FnOnce() + 'static>(cancel: F) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to release.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Run the unsubscribe action. Calling this again is a no-op.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn cancel_runs_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut sub = Subscription::new(move || counter.set(counter.get() + 1));

        assert!(sub.is_active());
        sub.cancel();
        sub.cancel();
        drop(sub);

        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn drop_cancels() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        drop(Subscription::new(move || counter.set(counter.get() + 1)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn noop_is_inactive() {
        let mut sub = Subscription::noop();
        assert!(!sub.is_active());
        sub.cancel();
    }
}
