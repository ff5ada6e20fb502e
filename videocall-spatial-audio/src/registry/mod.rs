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

//! Participant → audio subgraph bookkeeping.
//!
//! The registry is the only owner of participant nodes. It also holds the
//! per-participant track-update subscriptions so that removing a participant
//! releases everything tied to it in one place.

mod node;
mod ordered_map;

pub use node::ParticipantAudioNode;
pub use ordered_map::HashMapWithOrderedKeys;

use crate::audio::{AudioEngine, AudioNodeHandle, AudioTrack};
use crate::config::SpatializerOptions;
use crate::error::Result;
use crate::event_bus::emit_spatial_audio_event;
use crate::events::SpatialAudioEvent;
use crate::session::{MeetingSession, ParticipantId};
use crate::subscription::Subscription;
use log::{debug, info, warn};
use std::collections::{BTreeSet, HashMap};

/// What an [`upsert`](ParticipantNodeRegistry::upsert) did to the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A subgraph was built for a participant that had none
    Attached,
    /// The previous subgraph was torn down and a new one built
    Replaced,
    /// The participant already plays this track
    Unchanged,
    /// No track (muted or unpublished); nothing created, nothing removed
    EmptyTrack,
    /// The local listener is never spatialized
    LocalParticipant,
}

pub struct ParticipantNodeRegistry<E: AudioEngine> {
    nodes: HashMapWithOrderedKeys<ParticipantId, ParticipantAudioNode<E>>,
    listeners: HashMap<ParticipantId, Subscription>,
    options: SpatializerOptions,
    local_id: Option<ParticipantId>,
}

impl<E: AudioEngine> ParticipantNodeRegistry<E> {
    pub fn new(options: SpatializerOptions) -> Self {
        Self {
            nodes: HashMapWithOrderedKeys::new(),
            listeners: HashMap::new(),
            options,
            local_id: None,
        }
    }

    /// Record who the local listener is. Any node already held for that
    /// participant is removed.
    pub fn set_local_participant(&mut self, local_id: Option<ParticipantId>) {
        if let Some(id) = &local_id {
            if self.nodes.contains_key(id) {
                warn!("Dropping spatial node held for local participant {id}");
                self.remove(id);
            }
        }
        self.local_id = local_id;
    }

    pub fn local_participant(&self) -> Option<&ParticipantId> {
        self.local_id.as_ref()
    }

    /// Bring a participant's subgraph in line with its current track.
    ///
    /// An empty track never creates or removes anything; only
    /// [`remove`](Self::remove) tears a participant down. A new track replaces
    /// the old subgraph, which is disconnected before the new one is built so
    /// the participant is never audible twice.
    pub fn upsert<S>(
        &mut self,
        engine: &E,
        session: &S,
        participant_id: &ParticipantId,
        track: Option<E::Track>,
    ) -> Result<UpsertOutcome>
    where
        S: MeetingSession<Track = E::Track> + ?Sized,
    {
        let Some(track) = track else {
            debug!("No audio track for {participant_id}; graph unchanged");
            return Ok(UpsertOutcome::EmptyTrack);
        };
        if let Some(outcome) = self.skip_reason(participant_id, &track) {
            return Ok(outcome);
        }
        suppress_playback(session, participant_id, &track);
        self.install(engine, participant_id, track)
    }

    /// The outcome of an update that needs no graph change, or `None` when
    /// `track` has to be installed.
    pub fn skip_reason(
        &self,
        participant_id: &ParticipantId,
        track: &E::Track,
    ) -> Option<UpsertOutcome> {
        if self.local_id.as_ref() == Some(participant_id) {
            debug!("Ignoring track of local participant {participant_id}");
            return Some(UpsertOutcome::LocalParticipant);
        }
        match self.nodes.get(participant_id) {
            Some(existing) if existing.track().track_id() == track.track_id() => {
                Some(UpsertOutcome::Unchanged)
            }
            _ => None,
        }
    }

    /// The graph half of [`upsert`](Self::upsert): replace the participant's
    /// subgraph with one playing `track`. The session is not touched, so the
    /// caller suppresses default playback itself.
    pub fn install(
        &mut self,
        engine: &E,
        participant_id: &ParticipantId,
        track: E::Track,
    ) -> Result<UpsertOutcome> {
        if let Some(outcome) = self.skip_reason(participant_id, &track) {
            return Ok(outcome);
        }

        let replacing = match self.nodes.remove(participant_id) {
            Some(previous) => {
                previous.disconnect();
                debug!("Disconnected previous subgraph of {participant_id}");
                emit_spatial_audio_event(SpatialAudioEvent::NodeDetached(participant_id.clone()));
                true
            }
            None => false,
        };

        let node = build_subgraph(engine, &self.options, participant_id, track)?;
        self.nodes.insert(participant_id.clone(), node);
        info!(
            "Attached spatial audio for {participant_id} ({} nodes)",
            self.nodes.len()
        );
        emit_spatial_audio_event(SpatialAudioEvent::NodeAttached(participant_id.clone()));

        Ok(if replacing {
            UpsertOutcome::Replaced
        } else {
            UpsertOutcome::Attached
        })
    }

    /// Disconnect the participant's nodes, cancel its track subscription and
    /// forget it. Returns `false` when there was nothing to remove.
    pub fn remove(&mut self, participant_id: &ParticipantId) -> bool {
        let node = self.nodes.remove(participant_id);
        if let Some(node) = &node {
            node.disconnect();
            emit_spatial_audio_event(SpatialAudioEvent::NodeDetached(participant_id.clone()));
        }

        let listener = self.listeners.remove(participant_id);
        let had_listener = listener.is_some();
        if let Some(mut listener) = listener {
            listener.cancel();
        }

        let removed = node.is_some() || had_listener;
        if removed {
            debug!("Removed participant {participant_id}");
        }
        removed
    }

    /// [`remove`](Self::remove) every participant that has a node or a
    /// subscription. Returns how many were removed.
    pub fn remove_all(&mut self) -> usize {
        let ids: BTreeSet<ParticipantId> = self
            .nodes
            .ordered_keys()
            .iter()
            .chain(self.listeners.keys())
            .cloned()
            .collect();
        let count = ids.iter().filter(|id| self.remove(id)).count();
        if count > 0 {
            info!("Removed all {count} spatial audio participants");
        }
        count
    }

    /// Hold the track-update subscription of a participant.
    ///
    /// A participant is attached at most once: if a subscription is already
    /// held, the new one is cancelled and `false` is returned.
    pub fn track_listener(
        &mut self,
        participant_id: ParticipantId,
        mut listener: Subscription,
    ) -> bool {
        if self.listeners.contains_key(&participant_id) {
            debug!("Already listening to {participant_id}; dropping duplicate subscription");
            listener.cancel();
            return false;
        }
        self.listeners.insert(participant_id, listener);
        true
    }

    /// Hand back the participant's track subscription without cancelling it.
    pub fn take_listener(&mut self, participant_id: &ParticipantId) -> Option<Subscription> {
        self.listeners.remove(participant_id)
    }

    /// Remove every participant, handing back their track subscriptions
    /// uncancelled. Cancelling may call into the session, which must not
    /// happen while the registry is borrowed.
    pub fn detach_all(&mut self) -> Vec<Subscription> {
        let listeners: Vec<Subscription> = self
            .listeners
            .drain()
            .map(|(_, listener)| listener)
            .collect();
        self.remove_all();
        listeners
    }

    pub fn is_tracking(&self, participant_id: &ParticipantId) -> bool {
        self.listeners.contains_key(participant_id)
    }

    /// Cancel every held subscription, leaving nodes in place.
    pub fn release_listeners(&mut self) -> usize {
        let count = self.listeners.len();
        for (_, mut listener) in self.listeners.drain() {
            listener.cancel();
        }
        count
    }

    pub fn get(&self, participant_id: &ParticipantId) -> Option<&ParticipantAudioNode<E>> {
        self.nodes.get(participant_id)
    }

    pub fn contains(&self, participant_id: &ParticipantId) -> bool {
        self.nodes.contains_key(participant_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Participants with a node, in ascending id order.
    pub fn participant_ids(&self) -> Vec<ParticipantId> {
        self.nodes.ordered_keys().to_vec()
    }

    /// Nodes in ascending participant id order.
    pub fn ordered_nodes(&self) -> impl Iterator<Item = &ParticipantAudioNode<E>> + '_ {
        self.nodes.iter_ordered().map(|(_, node)| node)
    }
}

impl<E: AudioEngine> Drop for ParticipantNodeRegistry<E> {
    fn drop(&mut self) {
        self.release_listeners();
        self.remove_all();
    }
}

/// Ask the session to stop its own playback of `track`; the registry renders
/// the participant from now on. Failure is logged and otherwise ignored.
pub fn suppress_playback<S>(session: &S, participant_id: &ParticipantId, track: &S::Track)
where
    S: MeetingSession + ?Sized,
{
    if let Err(e) = session.suppress_default_playback(participant_id, track) {
        warn!("Could not suppress default playback for {participant_id}: {e}");
    }
}

fn build_subgraph<E: AudioEngine>(
    engine: &E,
    options: &SpatializerOptions,
    participant_id: &ParticipantId,
    track: E::Track,
) -> Result<ParticipantAudioNode<E>> {
    let source = engine.create_source(&track)?;
    let spatializer = match engine.create_spatializer(options) {
        Ok(spatializer) => spatializer,
        Err(e) => {
            source.disconnect();
            return Err(e);
        }
    };
    if let Err(e) = engine.connect_to_output(&source, &spatializer) {
        source.disconnect();
        spatializer.disconnect();
        return Err(e);
    }
    Ok(ParticipantAudioNode::new(
        participant_id.clone(),
        track,
        source,
        spatializer,
    ))
}
