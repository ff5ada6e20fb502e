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

//! Native platform primitives.
//!
//! Timers run as `tokio` local tasks, so they must be created from inside a
//! `tokio::task::LocalSet`. This mirrors the browser, where every callback
//! runs on the one UI thread.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A repeating timer. The task is aborted when the handle is dropped.
pub struct IntervalHandle {
    quit: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl IntervalHandle {
    /// **Important:** Must be called inside a `tokio::task::LocalSet`;
    /// a tokio runtime alone is not enough.
    pub fn new<F: Fn() + 'static>(period_ms: u32, callback: F) -> Self {
        let quit = Arc::new(AtomicBool::new(false));
        let quit_clone = quit.clone();
        let period = Duration::from_millis(period_ms as u64);

        let handle = tokio::task::spawn_local(async move {
            let mut interval = tokio::time::interval(period);
            // gloo's Interval does not fire immediately; neither do we.
            interval.tick().await;

            loop {
                interval.tick().await;
                if quit_clone.load(Ordering::Relaxed) {
                    break;
                }
                callback();
            }
        });

        Self {
            quit,
            handle: Some(handle),
        }
    }
}

impl Drop for IntervalHandle {
    fn drop(&mut self) {
        self.quit.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// A one-shot timer. The task is aborted when the handle is dropped.
pub struct TimeoutHandle {
    quit: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TimeoutHandle {
    /// **Important:** Must be called inside a `tokio::task::LocalSet`.
    pub fn new<F: FnOnce() + 'static>(delay_ms: u32, callback: F) -> Self {
        let quit = Arc::new(AtomicBool::new(false));
        let quit_clone = quit.clone();
        let delay = Duration::from_millis(delay_ms as u64);

        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            if !quit_clone.load(Ordering::Relaxed) {
                callback();
            }
        });

        Self {
            quit,
            handle: Some(handle),
        }
    }
}

impl Drop for TimeoutHandle {
    fn drop(&mut self) {
        self.quit.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Spawn a non-`Send` future on the current `LocalSet`.
pub fn spawn_local<F: Future<Output = ()> + 'static>(future: F) {
    tokio::task::spawn_local(future);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use tokio::task::LocalSet;

    #[tokio::test(start_paused = true)]
    async fn test_interval_fires_and_cancels() {
        LocalSet::new()
            .run_until(async {
                let counter = Rc::new(Cell::new(0u32));
                let counter_clone = counter.clone();

                let handle = IntervalHandle::new(10, move || {
                    counter_clone.set(counter_clone.get() + 1);
                });

                tokio::time::sleep(Duration::from_millis(55)).await;
                assert_eq!(counter.get(), 5);

                drop(handle);
                tokio::time::sleep(Duration::from_millis(45)).await;
                assert_eq!(counter.get(), 5);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_once() {
        LocalSet::new()
            .run_until(async {
                let fired = Rc::new(Cell::new(0u32));
                let fired_clone = fired.clone();

                let _handle = TimeoutHandle::new(20, move || {
                    fired_clone.set(fired_clone.get() + 1);
                });

                tokio::time::sleep(Duration::from_millis(15)).await;
                assert_eq!(fired.get(), 0);
                tokio::time::sleep(Duration::from_millis(30)).await;
                assert_eq!(fired.get(), 1);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_timeout_never_fires() {
        LocalSet::new()
            .run_until(async {
                let fired = Rc::new(Cell::new(false));
                let fired_clone = fired.clone();

                let handle = TimeoutHandle::new(20, move || fired_clone.set(true));
                drop(handle);

                tokio::time::sleep(Duration::from_millis(50)).await;
                assert!(!fired.get());
            })
            .await;
    }
}
