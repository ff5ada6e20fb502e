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

//! The meeting-session seam.
//!
//! The spatial audio engine does not own the meeting connection. It consumes
//! the roster and per-participant audio tracks from whatever SDK hosts the
//! meeting, through [`MeetingSession`].

pub mod memory;

use crate::audio::AudioTrack;
use crate::events::RosterEvent;
use crate::subscription::Subscription;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

pub use memory::InMemorySession;

/// Stable participant identifier.
///
/// Ordered byte by byte, not by locale-aware collation: uppercase sorts
/// before lowercase, so `"Bob" < "alice"`. SDK-assigned ids are opaque and
/// never mix case, so orbit order is unaffected in practice.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for ParticipantId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A joined participant as seen by the session at one instant.
#[derive(Clone, Debug)]
pub struct RemoteParticipant<T> {
    pub id: ParticipantId,
    /// `None` while the participant is muted or has not published audio.
    pub audio_track: Option<T>,
}

impl<T> RemoteParticipant<T> {
    pub fn new(id: impl Into<ParticipantId>, audio_track: Option<T>) -> Self {
        Self {
            id: id.into(),
            audio_track,
        }
    }
}

pub type RosterHandler<T> = Box<dyn Fn(RosterEvent<T>)>;
pub type TrackHandler<T> = Box<dyn Fn(Option<T>)>;

/// What the engine needs from the meeting SDK.
///
/// Handlers are invoked on the same thread as the engine. A session may
/// invoke a handler from inside the registration call (to replay the current
/// value); the engine tolerates that.
pub trait MeetingSession: 'static {
    type Track: AudioTrack;

    /// Identity of the local listener, which is never spatialized.
    fn local_participant_id(&self) -> Option<ParticipantId>;

    /// Snapshot of the currently joined participants.
    fn joined_participants(&self) -> Vec<RemoteParticipant<Self::Track>>;

    /// Subscribe to join, leave and clear notifications.
    fn on_roster_event(&self, handler: RosterHandler<Self::Track>) -> Subscription;

    /// Subscribe to audio track changes of one participant.
    fn on_track_update(
        &self,
        participant_id: &ParticipantId,
        handler: TrackHandler<Self::Track>,
    ) -> Subscription;

    /// Stop the SDK's own (non-spatial) playback of this participant's track.
    fn suppress_default_playback(
        &self,
        participant_id: &ParticipantId,
        track: &Self::Track,
    ) -> anyhow::Result<()>;
}
