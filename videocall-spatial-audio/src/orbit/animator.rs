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

//! Drives the shared orbit clock on a repeating timer.
//!
//! The animator only moves spatializers that already exist; nodes are owned
//! by the registry. While the mixing context is missing it re-checks on a
//! one-shot timer until the context appears or it is cancelled.

use crate::audio::{AudioEngine, AudioMixingContext, SpatialNode};
use crate::config::OrbitConfig;
use crate::event_bus::emit_spatial_audio_event;
use crate::events::SpatialAudioEvent;
use crate::orbit::state::OrbitState;
use crate::platform::{IntervalHandle, TimeoutHandle};
use crate::registry::ParticipantNodeRegistry;
use crate::signal::Signal;
use crate::subscription::Subscription;
use log::{debug, info, trace, warn};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

enum Phase {
    Idle,
    WaitingForContext(TimeoutHandle),
    Running(IntervalHandle),
}

pub struct OrbitAnimator<E: AudioEngine> {
    inner: Rc<AnimatorInner<E>>,
}

struct AnimatorInner<E: AudioEngine> {
    context: Rc<AudioMixingContext<E>>,
    registry: Rc<RefCell<ParticipantNodeRegistry<E>>>,
    config: RefCell<OrbitConfig>,
    state: RefCell<OrbitState>,
    phase: RefCell<Phase>,
    // A retry timeout that already fired. It is dropped on the next
    // transition rather than inside its own callback.
    spent_retry: RefCell<Option<TimeoutHandle>>,
    ticks: Cell<u64>,
    config_subscription: RefCell<Option<Subscription>>,
}

impl<E: AudioEngine> OrbitAnimator<E> {
    /// Create an idle animator. Geometry changes published on `config` are
    /// picked up from the next tick.
    pub fn new(
        context: Rc<AudioMixingContext<E>>,
        registry: Rc<RefCell<ParticipantNodeRegistry<E>>>,
        config: &Signal<OrbitConfig>,
    ) -> Self {
        let initial = config.last_value().unwrap_or_default();
        let inner = Rc::new(AnimatorInner {
            context,
            registry,
            state: RefCell::new(OrbitState::new(&initial)),
            config: RefCell::new(initial),
            phase: RefCell::new(Phase::Idle),
            spent_retry: RefCell::new(None),
            ticks: Cell::new(0),
            config_subscription: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let subscription = config.add(move |orbit: OrbitConfig| {
            if let Some(inner) = weak.upgrade() {
                inner.apply_config(orbit);
            }
        });
        *inner.config_subscription.borrow_mut() = Some(subscription);

        Self { inner }
    }

    /// Start ticking, or start waiting for the mixing context. Calling this
    /// while already running does nothing; while waiting, it starts at once
    /// if the context has appeared.
    ///
    /// # Panics
    ///
    /// On native targets the tick and retry timers use
    /// `tokio::task::spawn_local` and panic outside a `tokio::task::LocalSet`.
    pub fn start(&self) {
        let waiting = match *self.inner.phase.borrow() {
            Phase::Idle => false,
            Phase::WaitingForContext(_) => true,
            Phase::Running(_) => {
                debug!("Orbit animator already running");
                return;
            }
        };
        if waiting {
            if !self.inner.context.is_ready() {
                return;
            }
            // The pending retry has not fired, so it can be dropped here.
            *self.inner.phase.borrow_mut() = Phase::Idle;
        }
        AnimatorInner::try_start(&self.inner);
    }

    /// Stop the tick timer and any pending retry, and reset the orbit clock.
    pub fn cancel(&self) {
        let previous = std::mem::replace(&mut *self.inner.phase.borrow_mut(), Phase::Idle);
        self.inner.spent_retry.borrow_mut().take();
        let was_running = matches!(previous, Phase::Running(_));
        let was_waiting = matches!(previous, Phase::WaitingForContext(_));
        drop(previous);

        let initial = OrbitState::new(&self.inner.config.borrow());
        *self.inner.state.borrow_mut() = initial;
        self.inner.ticks.set(0);

        if was_running {
            info!("Orbit animator stopped");
            emit_spatial_audio_event(SpatialAudioEvent::OrbitStopped);
        } else if was_waiting {
            debug!("Orbit animator cancelled while waiting for audio context");
        }
    }

    /// Run one tick immediately. The interval timer calls the same path.
    pub fn tick(&self) {
        self.inner.tick();
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.inner.phase.borrow(), Phase::Running(_))
    }

    pub fn is_waiting_for_context(&self) -> bool {
        matches!(*self.inner.phase.borrow(), Phase::WaitingForContext(_))
    }

    pub fn angle(&self) -> f64 {
        self.inner.state.borrow().angle()
    }

    pub fn tick_count(&self) -> u64 {
        self.inner.ticks.get()
    }

    pub fn config(&self) -> OrbitConfig {
        self.inner.config.borrow().clone()
    }
}

impl<E: AudioEngine> Drop for OrbitAnimator<E> {
    fn drop(&mut self) {
        self.cancel();
        if let Some(mut subscription) = self.inner.config_subscription.borrow_mut().take() {
            subscription.cancel();
        }
    }
}

impl<E: AudioEngine> AnimatorInner<E> {
    fn try_start(inner: &Rc<Self>) {
        let config = inner.config.borrow().clone();
        let weak = Rc::downgrade(inner);

        let next = if inner.context.is_ready() {
            info!(
                "Starting orbit animation every {}ms",
                config.tick_interval_ms
            );
            let interval = IntervalHandle::new(config.tick_interval_ms, move || {
                if let Some(inner) = weak.upgrade() {
                    inner.tick();
                }
            });
            Phase::Running(interval)
        } else {
            debug!(
                "No audio context yet, retrying orbit start in {}ms",
                config.retry_delay_ms
            );
            let timeout = TimeoutHandle::new(config.retry_delay_ms, move || {
                if let Some(inner) = weak.upgrade() {
                    AnimatorInner::retry(&inner);
                }
            });
            Phase::WaitingForContext(timeout)
        };

        let started = matches!(next, Phase::Running(_));
        let previous = std::mem::replace(&mut *inner.phase.borrow_mut(), next);
        if let Phase::WaitingForContext(fired) = previous {
            *inner.spent_retry.borrow_mut() = Some(fired);
        }
        if started {
            emit_spatial_audio_event(SpatialAudioEvent::OrbitStarted);
        }
    }

    fn retry(inner: &Rc<Self>) {
        // A cancel between scheduling and firing leaves the phase idle.
        if !matches!(*inner.phase.borrow(), Phase::WaitingForContext(_)) {
            return;
        }
        AnimatorInner::try_start(inner);
    }

    fn apply_config(&self, orbit: OrbitConfig) {
        match self.state.try_borrow_mut() {
            Ok(mut state) => state.apply_geometry(&orbit),
            Err(_) => {
                warn!("Orbit state busy, geometry update skipped");
                return;
            }
        }
        *self.config.borrow_mut() = orbit;
    }

    fn tick(&self) {
        let Some(engine) = self.context.get() else {
            debug!("Orbit tick without an audio context");
            return;
        };
        let Ok(registry) = self.registry.try_borrow() else {
            warn!("Participant registry busy, orbit tick deferred");
            return;
        };
        let mut state = self.state.borrow_mut();

        let now = engine.current_time();
        let count = registry.len();
        for (index, node) in registry.ordered_nodes().enumerate() {
            let position = state.position_for(index, count);
            let spatializer = node.spatializer();
            let moved = spatializer
                .set_position_x_at(position.x, now)
                .and_then(|_| spatializer.set_position_z_at(position.z, now));
            if let Err(e) = moved {
                warn!("Failed to move {}: {}", node.participant_id(), e);
            }
        }
        state.advance();

        self.ticks.set(self.ticks.get() + 1);
        trace!("Orbit tick moved {} nodes, angle {:.3}", count, state.angle());
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::audio::offline::{OfflineAudioEngine, OfflineTrack};
    use crate::config::SpatializerOptions;
    use crate::session::{InMemorySession, ParticipantId};
    use std::time::Duration;
    use tokio::task::LocalSet;

    struct Fixture {
        engine: OfflineAudioEngine,
        context: Rc<AudioMixingContext<OfflineAudioEngine>>,
        registry: Rc<RefCell<ParticipantNodeRegistry<OfflineAudioEngine>>>,
        session: InMemorySession<OfflineTrack>,
        config: Signal<OrbitConfig>,
    }

    impl Fixture {
        fn new() -> Self {
            let engine = OfflineAudioEngine::new();
            let shared = engine.clone();
            let config = Signal::new();
            config.dispatch(OrbitConfig::default());
            Self {
                engine,
                context: Rc::new(AudioMixingContext::new(Box::new(move || Ok(shared.clone())))),
                registry: Rc::new(RefCell::new(ParticipantNodeRegistry::new(
                    SpatializerOptions::default(),
                ))),
                session: InMemorySession::new(Some("me".into())),
                config,
            }
        }

        fn animator(&self) -> OrbitAnimator<OfflineAudioEngine> {
            OrbitAnimator::new(self.context.clone(), self.registry.clone(), &self.config)
        }

        fn attach(&self, id: &str) {
            let engine = self.context.ensure().unwrap();
            self.registry
                .borrow_mut()
                .upsert(
                    &*engine,
                    &self.session,
                    &ParticipantId::from(id),
                    Some(OfflineTrack::new(format!("{id}-mic"))),
                )
                .unwrap();
        }

        fn position(&self, id: &str) -> [f64; 3] {
            self.registry
                .borrow()
                .get(&ParticipantId::from(id))
                .unwrap()
                .spatializer()
                .position()
        }
    }

    #[test]
    fn tick_places_nodes_in_lexical_order() {
        let fixture = Fixture::new();
        fixture.attach("b");
        fixture.attach("a");
        let animator = fixture.animator();

        animator.tick();

        assert_eq!(fixture.position("a"), [50.0, 0.0, 0.0]);
        let b = fixture.position("b");
        assert!((b[0] + 50.0).abs() < 1e-9);
        assert!(b[2].abs() < 1e-9);
        assert!((animator.angle() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn one_timestamp_per_tick() {
        let fixture = Fixture::new();
        fixture.attach("a");
        fixture.attach("b");
        fixture.engine.advance_clock(1.5);
        let animator = fixture.animator();

        animator.tick();

        let registry = fixture.registry.borrow();
        for node in registry.ordered_nodes() {
            let automation = node.spatializer().automation();
            assert_eq!(automation.len(), 2);
            assert!(automation.iter().all(|event| event.time == 1.5));
        }
    }

    #[test]
    fn tick_without_context_changes_nothing() {
        let fixture = Fixture::new();
        let animator = fixture.animator();

        animator.tick();

        assert_eq!(animator.tick_count(), 0);
        assert_eq!(animator.angle(), 0.0);
    }

    #[test]
    fn busy_registry_defers_tick() {
        let fixture = Fixture::new();
        fixture.attach("a");
        let animator = fixture.animator();

        let _guard = fixture.registry.borrow_mut();
        animator.tick();

        assert_eq!(animator.tick_count(), 0);
    }

    #[test]
    fn geometry_updates_apply_on_next_tick() {
        let fixture = Fixture::new();
        fixture.attach("a");
        let animator = fixture.animator();

        fixture.config.dispatch(OrbitConfig {
            radius: 10.0,
            ..OrbitConfig::default()
        });
        animator.tick();

        assert_eq!(fixture.position("a"), [10.0, 0.0, 0.0]);
        assert_eq!(animator.config().radius, 10.0);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_context_then_runs() {
        LocalSet::new()
            .run_until(async {
                let fixture = Fixture::new();
                let animator = fixture.animator();

                animator.start();
                assert!(animator.is_waiting_for_context());

                tokio::time::sleep(Duration::from_millis(450)).await;
                assert!(animator.is_waiting_for_context());

                fixture.attach("a");
                tokio::time::sleep(Duration::from_millis(200)).await;
                assert!(animator.is_running());

                tokio::time::sleep(Duration::from_millis(175)).await;
                assert_eq!(animator.tick_count(), 4);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_wait_prevents_late_start() {
        LocalSet::new()
            .run_until(async {
                let fixture = Fixture::new();
                let animator = fixture.animator();

                animator.start();
                tokio::time::sleep(Duration::from_millis(100)).await;
                animator.cancel();
                fixture.context.ensure().unwrap();

                tokio::time::sleep(Duration::from_millis(1_000)).await;
                assert!(!animator.is_running());
                assert!(!animator.is_waiting_for_context());
                assert_eq!(animator.tick_count(), 0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_cancel_starts_fresh() {
        LocalSet::new()
            .run_until(async {
                let fixture = Fixture::new();
                fixture.attach("a");
                let animator = fixture.animator();

                animator.start();
                animator.start();
                tokio::time::sleep(Duration::from_millis(120)).await;
                assert_eq!(animator.tick_count(), 2);

                animator.cancel();
                assert_eq!(animator.angle(), 0.0);
                tokio::time::sleep(Duration::from_millis(200)).await;
                assert_eq!(animator.tick_count(), 0);

                animator.start();
                assert!(animator.is_running());
            })
            .await;
    }
}
