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

use crate::config::SpatializerOptions;
use crate::error::Result;

/// A live audio source handed over by the meeting session.
///
/// Two tracks are the same source when their ids match.
pub trait AudioTrack: Clone + 'static {
    fn track_id(&self) -> String;
}

pub trait AudioNodeHandle {
    /// Drop every outgoing connection of this node. Safe to call repeatedly.
    fn disconnect(&self);
}

/// A node that renders its input from a point in 3D space.
pub trait SpatialNode: AudioNodeHandle {
    fn set_position_x_at(&self, value: f64, time: f64) -> Result<()>;
    fn set_position_z_at(&self, value: f64, time: f64) -> Result<()>;
}

/// The platform audio layer: node construction and wiring in one real-time
/// processing graph with an implicit output destination.
pub trait AudioEngine: 'static {
    type Track: AudioTrack;
    type Source: AudioNodeHandle;
    type Spatializer: SpatialNode;

    /// Engine clock in seconds, used to timestamp parameter automation.
    fn current_time(&self) -> f64;

    fn create_source(&self, track: &Self::Track) -> Result<Self::Source>;

    fn create_spatializer(&self, options: &SpatializerOptions) -> Result<Self::Spatializer>;

    /// Wire `source → spatializer → output`.
    fn connect_to_output(
        &self,
        source: &Self::Source,
        spatializer: &Self::Spatializer,
    ) -> Result<()>;

    /// Stop processing. Nodes created by this engine are unusable afterwards.
    fn close(&self);
}

/// Constructs the engine on first need. Failing here is fatal for the session.
pub type EngineFactory<E> = Box<dyn Fn() -> Result<E>>;
