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

//! Event types crossing the engine's boundaries.
//!
//! [`RosterEvent`] flows in from the meeting session; [`SpatialAudioEvent`]
//! flows out over the event bus to whatever UI framework hosts the engine.

use crate::session::{ParticipantId, RemoteParticipant};

/// Changes to the set of joined participants, as reported by the session.
#[derive(Clone, Debug)]
pub enum RosterEvent<T> {
    /// A participant joined. Carries its audio track at join time, if any.
    Joined(RemoteParticipant<T>),

    /// A participant left the meeting
    Left(ParticipantId),

    /// The whole roster was dropped (e.g. the session reconnected)
    Cleared,
}

/// Lifecycle events emitted by the spatial audio engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpatialAudioEvent {
    /// A session was bound and the roster bridge is live
    Activated,

    /// Every subscription, node and timer has been released
    Deactivated,

    /// The audio engine instance was constructed
    ContextCreated,

    /// The audio engine instance was closed
    ContextReleased,

    /// A participant's spatial subgraph was connected to the output
    NodeAttached(ParticipantId),

    /// A participant's spatial subgraph was disconnected
    NodeDetached(ParticipantId),

    /// The orbit animator is ticking
    OrbitStarted,

    /// The orbit animator was cancelled
    OrbitStopped,
}
