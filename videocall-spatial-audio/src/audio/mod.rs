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

//! # Spatial Audio Graph
//!
//! Every remote participant with a live track gets its own two-node chain in
//! one shared engine:
//!
//! ```text
//! AudioMixingContext
//! ├── engine (shared, one per session)
//! ├── Peer "alice" → source ─▶ spatializer ─┐
//! ├── Peer "bob"   → source ─▶ spatializer ─┼─▶ output
//! └── Peer "carol" → source ─▶ spatializer ─┘
//! ```
//!
//! The engine itself is behind [`AudioEngine`] so the same registry drives
//! the browser's Web Audio graph and the in-memory [`OfflineAudioEngine`].

mod engine;
pub mod mixing_context;
pub mod offline;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use engine::{AudioEngine, AudioNodeHandle, AudioTrack, EngineFactory, SpatialNode};
pub use mixing_context::AudioMixingContext;
pub use offline::{OfflineAudioEngine, OfflineTrack};
#[cfg(target_arch = "wasm32")]
pub use web::WebAudioEngine;
