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

//! Keeps the participant registry in step with the meeting roster.
//!
//! The bridge never polls. It attaches to every participant present at
//! activation, then follows join/leave/clear notifications and each
//! participant's track updates until deactivated.

use crate::audio::{AudioEngine, AudioMixingContext};
use crate::events::RosterEvent;
use crate::registry::{suppress_playback, ParticipantNodeRegistry};
use crate::session::{MeetingSession, ParticipantId, RemoteParticipant};
use crate::subscription::Subscription;
use log::{debug, error, info, warn};
use std::cell::RefCell;
use std::rc::Rc;

pub struct RosterEventBridge<S, E>
where
    S: MeetingSession,
    E: AudioEngine<Track = S::Track>,
{
    inner: Rc<BridgeInner<S, E>>,
}

struct BridgeInner<S, E>
where
    S: MeetingSession,
    E: AudioEngine<Track = S::Track>,
{
    session: Rc<S>,
    context: Rc<AudioMixingContext<E>>,
    registry: Rc<RefCell<ParticipantNodeRegistry<E>>>,
    local_id: Option<ParticipantId>,
    roster_subscription: RefCell<Option<Subscription>>,
}

impl<S, E> RosterEventBridge<S, E>
where
    S: MeetingSession,
    E: AudioEngine<Track = S::Track>,
{
    /// Attach to every joined participant, then start following the roster.
    pub fn activate(
        session: Rc<S>,
        context: Rc<AudioMixingContext<E>>,
        registry: Rc<RefCell<ParticipantNodeRegistry<E>>>,
    ) -> Self {
        let local_id = session.local_participant_id();
        registry.borrow_mut().set_local_participant(local_id.clone());

        let inner = Rc::new(BridgeInner {
            session,
            context,
            registry,
            local_id,
            roster_subscription: RefCell::new(None),
        });

        let joined = inner.session.joined_participants();
        info!(
            "Spatial audio bridge activating with {} joined participants",
            joined.len()
        );
        for participant in joined {
            BridgeInner::attach(&inner, participant);
        }

        let weak = Rc::downgrade(&inner);
        let subscription = inner.session.on_roster_event(Box::new(move |event| {
            if let Some(inner) = weak.upgrade() {
                BridgeInner::on_roster_event(&inner, event);
            }
        }));
        *inner.roster_subscription.borrow_mut() = Some(subscription);

        Self { inner }
    }

    pub fn is_active(&self) -> bool {
        self.inner.roster_subscription.borrow().is_some()
    }

    /// Release every subscription, then tear down every participant. Calling
    /// this again is a no-op.
    pub fn deactivate(&self) {
        let roster = self.inner.roster_subscription.borrow_mut().take();
        let Some(mut roster) = roster else {
            return;
        };
        roster.cancel();

        let listeners = match self.inner.registry.try_borrow_mut() {
            Ok(mut registry) => registry.detach_all(),
            Err(_) => {
                error!("Participant registry busy during bridge teardown");
                return;
            }
        };
        info!(
            "Spatial audio bridge deactivated: released {} listeners",
            listeners.len()
        );
        cancel_all(listeners);
    }
}

impl<S, E> Drop for RosterEventBridge<S, E>
where
    S: MeetingSession,
    E: AudioEngine<Track = S::Track>,
{
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl<S, E> BridgeInner<S, E>
where
    S: MeetingSession,
    E: AudioEngine<Track = S::Track>,
{
    fn attach(inner: &Rc<Self>, participant: RemoteParticipant<S::Track>) {
        let RemoteParticipant { id, audio_track } = participant;
        if inner.local_id.as_ref() == Some(&id) {
            debug!("Skipping local participant {id}");
            return;
        }

        let already_attached = match inner.registry.try_borrow() {
            Ok(registry) => registry.is_tracking(&id),
            Err(_) => {
                warn!("Participant registry busy; cannot attach {id}");
                return;
            }
        };

        if already_attached {
            debug!("{id} already attached; refreshing its track");
        } else {
            let weak = Rc::downgrade(inner);
            let handler_id = id.clone();
            let subscription = inner.session.on_track_update(
                &id,
                Box::new(move |track| {
                    if let Some(inner) = weak.upgrade() {
                        inner.on_track_update(&handler_id, track);
                    }
                }),
            );
            match inner.registry.try_borrow_mut() {
                Ok(mut registry) => {
                    registry.track_listener(id.clone(), subscription);
                }
                Err(_) => {
                    warn!("Participant registry busy; dropping audio listener for {id}");
                    return;
                }
            }
            debug!("Listening for audio updates from {id}");
        }

        inner.upsert(&id, audio_track);
    }

    fn on_roster_event(inner: &Rc<Self>, event: RosterEvent<S::Track>) {
        match event {
            RosterEvent::Joined(participant) => {
                debug!("{} joined", participant.id);
                Self::attach(inner, participant);
            }
            RosterEvent::Left(id) => {
                let listener = match inner.registry.try_borrow_mut() {
                    Ok(mut registry) => {
                        let listener = registry.take_listener(&id);
                        registry.remove(&id);
                        listener
                    }
                    Err(_) => {
                        warn!("Participant registry busy; could not remove {id}");
                        return;
                    }
                };
                if let Some(mut listener) = listener {
                    listener.cancel();
                }
                info!("{id} left; spatial audio removed");
            }
            RosterEvent::Cleared => {
                let listeners = match inner.registry.try_borrow_mut() {
                    Ok(mut registry) => registry.detach_all(),
                    Err(_) => {
                        warn!("Participant registry busy; could not clear roster");
                        return;
                    }
                };
                info!("Roster cleared; released {} listeners", listeners.len());
                cancel_all(listeners);
            }
        }
    }

    fn on_track_update(&self, id: &ParticipantId, track: Option<S::Track>) {
        match self.registry.try_borrow() {
            Ok(registry) if registry.is_tracking(id) => {}
            Ok(_) => {
                debug!("Ignoring audio update for detached participant {id}");
                return;
            }
            Err(_) => {
                warn!("Participant registry busy; dropping audio update for {id}");
                return;
            }
        }
        debug!("Audio update for {id}, track present: {}", track.is_some());
        self.upsert(id, track);
    }

    // The session is only called with the registry unborrowed, so it may
    // emit events synchronously.
    fn upsert(&self, id: &ParticipantId, track: Option<S::Track>) {
        let Some(track) = track else {
            debug!("No audio track for {id}; graph unchanged");
            return;
        };
        let engine = match self.context.require() {
            Ok(engine) => engine,
            Err(e) => {
                warn!("{e}; dropping audio update for {id}");
                return;
            }
        };

        match self.registry.try_borrow() {
            Ok(registry) => {
                if let Some(outcome) = registry.skip_reason(id, &track) {
                    debug!("Audio update for {id} needs no graph change: {outcome:?}");
                    return;
                }
            }
            Err(_) => {
                warn!("Participant registry busy; dropping audio update for {id}");
                return;
            }
        }

        suppress_playback(&*self.session, id, &track);

        let result = match self.registry.try_borrow_mut() {
            Ok(mut registry) => registry.install(&*engine, id, track),
            Err(_) => {
                warn!("Participant registry busy; dropping audio update for {id}");
                return;
            }
        };
        if let Err(e) = result {
            error!("Failed to attach spatial audio for {id}: {e}");
        }
    }
}

fn cancel_all(listeners: Vec<Subscription>) {
    for mut listener in listeners {
        listener.cancel();
    }
}
