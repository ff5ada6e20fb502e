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

//! WASM (browser) platform primitives backed by `gloo-timers` and
//! `wasm-bindgen-futures`.

use gloo_timers::callback::{Interval, Timeout};
use std::future::Future;

/// A repeating timer. Wraps `gloo_timers::callback::Interval`; the browser
/// interval is cleared when the handle is dropped.
pub struct IntervalHandle {
    _interval: Interval,
}

impl IntervalHandle {
    pub fn new<F: Fn() + 'static>(period_ms: u32, callback: F) -> Self {
        Self {
            _interval: Interval::new(period_ms, callback),
        }
    }
}

/// A one-shot timer. Wraps `gloo_timers::callback::Timeout`.
///
/// Do not drop a handle from inside its own callback; park it and drop it
/// from a later turn of the event loop.
pub struct TimeoutHandle {
    _timeout: Timeout,
}

impl TimeoutHandle {
    pub fn new<F: FnOnce() + 'static>(delay_ms: u32, callback: F) -> Self {
        Self {
            _timeout: Timeout::new(delay_ms, callback),
        }
    }
}

pub fn spawn_local<F: Future<Output = ()> + 'static>(future: F) {
    wasm_bindgen_futures::spawn_local(future);
}
