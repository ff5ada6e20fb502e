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

//! Session-scoped ownership of the audio engine.
//!
//! The engine starts a real-time graph as soon as it exists, so it is built
//! lazily on the first [`ensure`](AudioMixingContext::ensure) and reused until
//! [`release`](AudioMixingContext::release).

use super::engine::{AudioEngine, EngineFactory};
use crate::error::{Result, SpatialAudioError};
use crate::event_bus::emit_spatial_audio_event;
use crate::events::SpatialAudioEvent;
use log::info;
use std::cell::RefCell;
use std::rc::Rc;

pub struct AudioMixingContext<E: AudioEngine> {
    factory: EngineFactory<E>,
    engine: RefCell<Option<Rc<E>>>,
}

impl<E: AudioEngine> AudioMixingContext<E> {
    pub fn new(factory: EngineFactory<E>) -> Self {
        Self {
            factory,
            engine: RefCell::new(None),
        }
    }

    /// Return the session's engine, constructing it if this is the first call.
    pub fn ensure(&self) -> Result<Rc<E>> {
        if let Some(engine) = self.get() {
            return Ok(engine);
        }

        let engine = Rc::new((self.factory)().map_err(|e| match e {
            SpatialAudioError::Initialization(_) => e,
            other => SpatialAudioError::Initialization(other.to_string()),
        })?);
        info!("Audio mixing context created");
        *self.engine.borrow_mut() = Some(Rc::clone(&engine));
        emit_spatial_audio_event(SpatialAudioEvent::ContextCreated);
        Ok(engine)
    }

    /// The engine, if it has been constructed. Never constructs.
    pub fn get(&self) -> Option<Rc<E>> {
        self.engine.borrow().as_ref().map(Rc::clone)
    }

    /// Like [`get`](Self::get), for callers that cannot proceed without it.
    pub fn require(&self) -> Result<Rc<E>> {
        self.get().ok_or(SpatialAudioError::ContextUnavailable)
    }

    pub fn is_ready(&self) -> bool {
        self.engine.borrow().is_some()
    }

    /// Close and forget the engine. Returns `false` if there was none.
    pub fn release(&self) -> bool {
        let engine = self.engine.borrow_mut().take();
        match engine {
            Some(engine) => {
                engine.close();
                info!("Audio mixing context released");
                emit_spatial_audio_event(SpatialAudioEvent::ContextReleased);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::offline::OfflineAudioEngine;
    use std::cell::Cell;

    fn counting_context() -> (AudioMixingContext<OfflineAudioEngine>, Rc<Cell<u32>>) {
        let builds = Rc::new(Cell::new(0));
        let counter = builds.clone();
        let context = AudioMixingContext::new(Box::new(move || {
            counter.set(counter.get() + 1);
            Ok(OfflineAudioEngine::new())
        }));
        (context, builds)
    }

    #[test]
    fn ensure_builds_once() {
        let (context, builds) = counting_context();
        assert!(context.get().is_none());

        let first = context.ensure().unwrap();
        let second = context.ensure().unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(builds.get(), 1);
        assert!(context.is_ready());
    }

    #[test]
    fn release_closes_and_allows_rebuild() {
        let (context, builds) = counting_context();
        let engine = context.ensure().unwrap();

        assert!(context.release());
        assert!(engine.is_closed());
        assert!(!context.release());

        context.ensure().unwrap();
        assert_eq!(builds.get(), 2);
    }

    #[test]
    fn require_never_constructs() {
        let (context, builds) = counting_context();
        assert!(matches!(
            context.require(),
            Err(SpatialAudioError::ContextUnavailable)
        ));
        assert_eq!(builds.get(), 0);

        context.ensure().unwrap();
        assert!(context.require().is_ok());
    }

    #[test]
    fn factory_failure_surfaces_as_initialization_error() {
        let context: AudioMixingContext<OfflineAudioEngine> =
            AudioMixingContext::new(Box::new(|| {
                Err(SpatialAudioError::Graph("no output device".to_string()))
            }));

        match context.ensure() {
            Err(SpatialAudioError::Initialization(msg)) => {
                assert!(msg.contains("no output device"))
            }
            other => panic!("expected initialization error, got {other:?}"),
        }
        assert!(!context.is_ready());
    }
}
