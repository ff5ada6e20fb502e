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

//! # Spatial audio for meeting clients
//!
//! Every remote participant's microphone is routed through its own 3-D
//! panner, and all voices slowly orbit the listener so concurrent speakers
//! are easier to tell apart.
//!
//! ## Engine lifecycle
//! ```ignore
//! let engine = SpatialAudioEngine::for_web(SpatialAudioConfig::default())?;
//! engine.activate(session)?;   // attach to everyone present, follow the roster
//! engine.start_orbit();        // no-op if already running
//! engine.update_orbit(OrbitConfig { radius: 30.0, ..Default::default() })?;
//! engine.deactivate();         // release nodes, listeners, timers and the context
//! ```
//!
//! Outside the browser the orbit timers run on `tokio::task::spawn_local`:
//! call [`SpatialAudioEngine::activate`] and
//! [`SpatialAudioEngine::start_orbit`] from inside a `tokio::task::LocalSet`,
//! or they panic.
//!
//! ## Lifecycle events
//! ```ignore
//! let mut events = subscribe_spatial_audio_events();
//! while let Ok(event) = events.recv().await {
//!     log::info!("spatial audio: {event:?}");
//! }
//! ```
//!
//! The meeting SDK is reached through [`MeetingSession`]; the audio graph
//! through [`AudioEngine`]. [`InMemorySession`] and [`OfflineAudioEngine`]
//! implement both seams without a browser.

pub mod audio;
mod bridge;
pub mod config;
pub mod constants;
mod engine;
pub mod error;
mod event_bus;
pub mod events;
pub mod orbit;
pub mod platform;
pub mod registry;
pub mod session;
mod signal;
mod subscription;

pub use audio::{AudioEngine, AudioMixingContext, AudioTrack, OfflineAudioEngine, OfflineTrack};
#[cfg(target_arch = "wasm32")]
pub use audio::WebAudioEngine;
pub use bridge::RosterEventBridge;
pub use config::{DistanceModel, OrbitConfig, PanningModel, SpatialAudioConfig, SpatializerOptions};
pub use engine::SpatialAudioEngine;
pub use error::{Result, SpatialAudioError};
pub use event_bus::{
    emit_spatial_audio_event, global_spatial_audio_sender, subscribe_spatial_audio_events,
};
pub use events::{RosterEvent, SpatialAudioEvent};
pub use orbit::{OrbitAnimator, OrbitPosition, OrbitState};
pub use registry::{ParticipantNodeRegistry, UpsertOutcome};
pub use session::{InMemorySession, MeetingSession, ParticipantId, RemoteParticipant};
pub use signal::Signal;
pub use subscription::Subscription;
