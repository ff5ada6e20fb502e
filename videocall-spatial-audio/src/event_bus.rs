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

//! Global event bus for spatial audio lifecycle events.
//!
//! An MPMC broadcast channel: the engine emits [`SpatialAudioEvent`]s and any
//! number of UI components can subscribe to them independently.
//!
//! ```ignore
//! use videocall_spatial_audio::{subscribe_spatial_audio_events, SpatialAudioEvent};
//!
//! let mut rx = subscribe_spatial_audio_events();
//! wasm_bindgen_futures::spawn_local(async move {
//!     while let Ok(event) = rx.recv().await {
//!         if event == SpatialAudioEvent::Deactivated {
//!             break;
//!         }
//!     }
//! });
//! ```

use crate::constants::EVENT_BUS_CAPACITY;
use crate::events::SpatialAudioEvent;
use async_broadcast::{broadcast, InactiveReceiver, Receiver, Sender};
use once_cell::sync::Lazy;

struct Bus {
    sender: Sender<SpatialAudioEvent>,
    // Keeps the channel open while nobody is listening.
    _keepalive: InactiveReceiver<SpatialAudioEvent>,
}

static BUS: Lazy<Bus> = Lazy::new(|| {
    let (mut sender, receiver) = broadcast(EVENT_BUS_CAPACITY);
    sender.set_overflow(true);
    Bus {
        sender,
        _keepalive: receiver.deactivate(),
    }
});

/// Get a clone of the global sender.
pub fn global_spatial_audio_sender() -> Sender<SpatialAudioEvent> {
    BUS.sender.clone()
}

/// Subscribe to spatial audio events.
///
/// Each receiver sees every event emitted after it was created.
pub fn subscribe_spatial_audio_events() -> Receiver<SpatialAudioEvent> {
    BUS.sender.new_receiver()
}

/// Emit an event to all subscribers. Never blocks; when a subscriber lags
/// behind by more than the channel capacity its oldest events are dropped.
pub fn emit_spatial_audio_event(event: SpatialAudioEvent) {
    if let Err(e) = BUS.sender.try_broadcast(event) {
        log::trace!("spatial audio event not delivered: {e}");
    }
}
