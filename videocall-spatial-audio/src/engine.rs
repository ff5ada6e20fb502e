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

//! The top-level spatial audio engine.
//!
//! `SpatialAudioEngine` ties together the mixing context, the node registry,
//! the roster bridge and the orbit animator. Bind it to a meeting with
//! [`SpatialAudioEngine::activate`] and tear everything down with
//! [`SpatialAudioEngine::deactivate`] (or by dropping it).

use crate::audio::{AudioEngine, AudioMixingContext, EngineFactory};
use crate::bridge::RosterEventBridge;
use crate::config::{OrbitConfig, SpatialAudioConfig};
use crate::error::{Result, SpatialAudioError};
use crate::event_bus::emit_spatial_audio_event;
use crate::events::SpatialAudioEvent;
use crate::orbit::OrbitAnimator;
use crate::registry::ParticipantNodeRegistry;
use crate::session::{MeetingSession, ParticipantId};
use crate::signal::Signal;
use log::{debug, error, info};
use std::cell::RefCell;
use std::rc::Rc;

pub struct SpatialAudioEngine<S, E>
where
    S: MeetingSession,
    E: AudioEngine<Track = S::Track>,
{
    config: RefCell<SpatialAudioConfig>,
    context: Rc<AudioMixingContext<E>>,
    registry: Rc<RefCell<ParticipantNodeRegistry<E>>>,
    orbit_config: Signal<OrbitConfig>,
    animator: OrbitAnimator<E>,
    bridge: RefCell<Option<RosterEventBridge<S, E>>>,
}

impl<S, E> SpatialAudioEngine<S, E>
where
    S: MeetingSession,
    E: AudioEngine<Track = S::Track>,
{
    /// Build an inactive engine. No audio resources are created until
    /// [`activate`](Self::activate).
    pub fn new(config: SpatialAudioConfig, factory: EngineFactory<E>) -> Result<Self> {
        config.validate()?;

        let context = Rc::new(AudioMixingContext::new(factory));
        let registry = Rc::new(RefCell::new(ParticipantNodeRegistry::new(
            config.spatializer.clone(),
        )));
        let orbit_config = Signal::new();
        orbit_config.dispatch(config.orbit.clone());
        let animator = OrbitAnimator::new(context.clone(), registry.clone(), &orbit_config);

        Ok(Self {
            config: RefCell::new(config),
            context,
            registry,
            orbit_config,
            animator,
            bridge: RefCell::new(None),
        })
    }

    /// Arm the orbit loop. It waits for the mixing context if there is none yet.
    ///
    /// # Panics
    ///
    /// On native targets the orbit timers are spawned with
    /// `tokio::task::spawn_local`, so this must be called from inside a
    /// `tokio::task::LocalSet`. A bare `#[tokio::main]` runtime is not enough.
    pub fn start_orbit(&self) {
        self.animator.start();
    }

    /// Bind to a meeting session and start spatialising its remote audio.
    ///
    /// # Panics
    ///
    /// Activation starts the orbit. On native targets that requires a
    /// `tokio::task::LocalSet`, see [`start_orbit`](Self::start_orbit).
    pub fn activate(&self, session: Rc<S>) -> Result<()> {
        if self.bridge.borrow().is_some() {
            return Err(SpatialAudioError::AlreadyActive);
        }

        if let Err(e) = self.context.ensure() {
            error!("Spatial audio activation failed: {}", e);
            return Err(e);
        }

        let bridge =
            RosterEventBridge::activate(session, self.context.clone(), self.registry.clone());
        *self.bridge.borrow_mut() = Some(bridge);
        self.animator.start();

        info!(
            "Spatial audio active with {} participants",
            self.registry.borrow().len()
        );
        emit_spatial_audio_event(SpatialAudioEvent::Activated);
        Ok(())
    }

    /// Release every subscription, node, timer and the mixing context.
    /// Safe to call any number of times.
    pub fn deactivate(&self) {
        let bridge = self.bridge.borrow_mut().take();
        let was_active = bridge.is_some();
        if let Some(bridge) = bridge {
            bridge.deactivate();
        }

        self.animator.cancel();

        let listeners = match self.registry.try_borrow_mut() {
            Ok(mut registry) => registry.detach_all(),
            Err(_) => {
                error!("Participant registry busy during deactivation");
                Vec::new()
            }
        };
        drop(listeners);

        self.context.release();

        if was_active {
            info!("Spatial audio deactivated");
            emit_spatial_audio_event(SpatialAudioEvent::Deactivated);
        } else {
            debug!("Spatial audio deactivate called while inactive");
        }
    }

    /// Publish new orbit geometry. Radius, step and flattening apply from the
    /// next tick; timer periods apply from the next start.
    pub fn update_orbit(&self, orbit: OrbitConfig) -> Result<()> {
        orbit.validate()?;
        self.config.borrow_mut().orbit = orbit.clone();
        self.orbit_config.dispatch(orbit);
        Ok(())
    }

    pub fn config(&self) -> SpatialAudioConfig {
        self.config.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.bridge.borrow().is_some()
    }

    /// Participants that currently have a spatialised voice, in orbit order.
    pub fn participant_ids(&self) -> Vec<ParticipantId> {
        self.registry.borrow().participant_ids()
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listener_count()
    }

    pub fn is_orbiting(&self) -> bool {
        self.animator.is_running()
    }

    pub fn is_waiting_for_context(&self) -> bool {
        self.animator.is_waiting_for_context()
    }

    pub fn orbit_angle(&self) -> f64 {
        self.animator.angle()
    }

    /// The live audio engine, if the mixing context exists.
    pub fn audio_engine(&self) -> Option<Rc<E>> {
        self.context.get()
    }
}

#[cfg(target_arch = "wasm32")]
impl<S> SpatialAudioEngine<S, crate::audio::WebAudioEngine>
where
    S: MeetingSession<Track = web_sys::MediaStreamTrack>,
{
    /// An engine backed by a browser `AudioContext` at the configured sample rate.
    pub fn for_web(config: SpatialAudioConfig) -> Result<Self> {
        let sample_rate = config.sample_rate;
        Self::new(
            config,
            Box::new(move || crate::audio::WebAudioEngine::new(sample_rate)),
        )
    }
}

impl<S, E> Drop for SpatialAudioEngine<S, E>
where
    S: MeetingSession,
    E: AudioEngine<Track = S::Track>,
{
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{OfflineAudioEngine, OfflineTrack};
    use crate::session::InMemorySession;

    type TestEngine = SpatialAudioEngine<InMemorySession<OfflineTrack>, OfflineAudioEngine>;

    fn offline(engine: &OfflineAudioEngine) -> EngineFactory<OfflineAudioEngine> {
        let engine = engine.clone();
        Box::new(move || Ok(engine.clone()))
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = SpatialAudioConfig::default();
        config.orbit.radius = -1.0;

        let result = TestEngine::new(config, offline(&OfflineAudioEngine::new()));
        assert!(matches!(result, Err(SpatialAudioError::InvalidConfig(_))));
    }

    #[test]
    fn construction_creates_no_context() {
        let engine = TestEngine::new(
            SpatialAudioConfig::default(),
            offline(&OfflineAudioEngine::new()),
        )
        .unwrap();

        assert!(engine.audio_engine().is_none());
        assert!(!engine.is_active());
    }

    #[test]
    fn factory_failure_surfaces_from_activate() {
        let engine = TestEngine::new(
            SpatialAudioConfig::default(),
            Box::new(|| Err(SpatialAudioError::Other(anyhow::anyhow!("no audio device")))),
        )
        .unwrap();
        let session = Rc::new(InMemorySession::new(Some("me".into())));

        let result = engine.activate(session);
        assert!(matches!(result, Err(SpatialAudioError::Initialization(_))));
        assert!(!engine.is_active());
    }

    #[test]
    fn invalid_orbit_update_keeps_previous_geometry() {
        let engine = TestEngine::new(
            SpatialAudioConfig::default(),
            offline(&OfflineAudioEngine::new()),
        )
        .unwrap();

        let bad = OrbitConfig {
            step: f64::NAN,
            ..OrbitConfig::default()
        };
        assert!(engine.update_orbit(bad).is_err());
        assert_eq!(engine.config().orbit, OrbitConfig::default());

        let good = OrbitConfig {
            radius: 20.0,
            ..OrbitConfig::default()
        };
        engine.update_orbit(good.clone()).unwrap();
        assert_eq!(engine.config().orbit, good);
    }
}
