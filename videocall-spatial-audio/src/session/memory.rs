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

//! An in-process meeting session.
//!
//! Used for headless runs and for driving the engine in tests: the caller
//! scripts joins, leaves, clears and track changes, and the session fans them
//! out to whoever subscribed, exactly as a meeting SDK would.

use super::{MeetingSession, ParticipantId, RemoteParticipant, RosterHandler, TrackHandler};
use crate::audio::AudioTrack;
use crate::events::RosterEvent;
use crate::signal::Signal;
use crate::subscription::Subscription;
use anyhow::anyhow;
use log::debug;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

pub struct InMemorySession<T: AudioTrack> {
    local_id: Option<ParticipantId>,
    joined: RefCell<Vec<RemoteParticipant<T>>>,
    roster: Signal<RosterEvent<T>>,
    tracks: RefCell<HashMap<ParticipantId, Signal<Option<T>>>>,
    suppressed: RefCell<Vec<(ParticipantId, String)>>,
    reject_suppression: Cell<bool>,
}

impl<T: AudioTrack> InMemorySession<T> {
    pub fn new(local_id: Option<ParticipantId>) -> Self {
        Self {
            local_id,
            joined: RefCell::new(Vec::new()),
            roster: Signal::transient(),
            tracks: RefCell::new(HashMap::new()),
            suppressed: RefCell::new(Vec::new()),
            reject_suppression: Cell::new(false),
        }
    }

    /// Add a participant to the roster and notify roster listeners.
    pub fn join(&self, id: impl Into<ParticipantId>, audio_track: Option<T>) {
        let participant = RemoteParticipant::new(id, audio_track);
        debug!("in-memory session: {} joined", participant.id);
        {
            let mut joined = self.joined.borrow_mut();
            joined.retain(|p| p.id != participant.id);
            joined.push(participant.clone());
        }
        self.track_signal(&participant.id)
            .dispatch(participant.audio_track.clone());
        self.roster.dispatch(RosterEvent::Joined(participant));
    }

    pub fn leave(&self, id: &ParticipantId) {
        debug!("in-memory session: {id} left");
        self.joined.borrow_mut().retain(|p| &p.id != id);
        self.roster.dispatch(RosterEvent::Left(id.clone()));
    }

    pub fn clear(&self) {
        debug!("in-memory session: roster cleared");
        self.joined.borrow_mut().clear();
        self.roster.dispatch(RosterEvent::Cleared);
    }

    /// Publish a new audio track (or `None` for muted) for a participant.
    pub fn set_track(&self, id: &ParticipantId, audio_track: Option<T>) {
        if let Some(p) = self.joined.borrow_mut().iter_mut().find(|p| &p.id == id) {
            p.audio_track = audio_track.clone();
        }
        self.track_signal(id).dispatch(audio_track);
    }

    /// Make `suppress_default_playback` fail, as an SDK without the module would.
    pub fn reject_suppression(&self, reject: bool) {
        self.reject_suppression.set(reject);
    }

    /// Every `(participant, track id)` pair whose default playback was suppressed.
    pub fn suppressed_playbacks(&self) -> Vec<(ParticipantId, String)> {
        self.suppressed.borrow().clone()
    }

    pub fn roster_listener_count(&self) -> usize {
        self.roster.listener_count()
    }

    pub fn track_listener_count(&self, id: &ParticipantId) -> usize {
        self.tracks
            .borrow()
            .get(id)
            .map(|signal| signal.listener_count())
            .unwrap_or(0)
    }

    /// Track-update listeners across all participants, joined or not.
    pub fn total_track_listeners(&self) -> usize {
        self.tracks
            .borrow()
            .values()
            .map(|signal| signal.listener_count())
            .sum()
    }

    fn track_signal(&self, id: &ParticipantId) -> Signal<Option<T>> {
        self.tracks
            .borrow_mut()
            .entry(id.clone())
            .or_insert_with(Signal::new)
            .clone()
    }
}

impl<T: AudioTrack> MeetingSession for InMemorySession<T> {
    type Track = T;

    fn local_participant_id(&self) -> Option<ParticipantId> {
        self.local_id.clone()
    }

    fn joined_participants(&self) -> Vec<RemoteParticipant<T>> {
        self.joined.borrow().clone()
    }

    fn on_roster_event(&self, handler: RosterHandler<T>) -> Subscription {
        self.roster.add(handler)
    }

    fn on_track_update(
        &self,
        participant_id: &ParticipantId,
        handler: TrackHandler<T>,
    ) -> Subscription {
        self.track_signal(participant_id).add(handler)
    }

    fn suppress_default_playback(
        &self,
        participant_id: &ParticipantId,
        track: &T,
    ) -> anyhow::Result<()> {
        if self.reject_suppression.get() {
            return Err(anyhow!(
                "default playback control unavailable for {participant_id}"
            ));
        }
        self.suppressed
            .borrow_mut()
            .push((participant_id.clone(), track.track_id()));
        Ok(())
    }
}
