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

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use videocall_spatial_audio::audio::EngineFactory;
use videocall_spatial_audio::{
    InMemorySession, OfflineAudioEngine, OfflineTrack, SpatialAudioConfig, SpatialAudioEngine,
};

pub type TestEngine = SpatialAudioEngine<InMemorySession<OfflineTrack>, OfflineAudioEngine>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// An engine wired to offline graphs and an in-memory meeting whose local
/// participant is `"me"`. Every mixing context gets a fresh graph.
pub struct Harness {
    pub built: Rc<RefCell<Vec<OfflineAudioEngine>>>,
    pub session: Rc<InMemorySession<OfflineTrack>>,
    pub engine: TestEngine,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(SpatialAudioConfig::default())
    }

    pub fn with_config(config: SpatialAudioConfig) -> Self {
        init_logging();
        let built = Rc::new(RefCell::new(Vec::new()));
        let log = built.clone();
        let factory: EngineFactory<OfflineAudioEngine> = Box::new(move || {
            let audio = OfflineAudioEngine::new();
            log.borrow_mut().push(audio.clone());
            Ok(audio)
        });
        let engine = TestEngine::new(config, factory).expect("config is valid");
        Self {
            built,
            session: Rc::new(InMemorySession::new(Some("me".into()))),
            engine,
        }
    }

    pub fn activate(&self) {
        self.engine
            .activate(self.session.clone())
            .expect("activation succeeds");
    }

    /// The most recently built audio graph.
    pub fn audio(&self) -> OfflineAudioEngine {
        self.built
            .borrow()
            .last()
            .cloned()
            .expect("no audio graph built yet")
    }

    pub fn builds(&self) -> usize {
        self.built.borrow().len()
    }

    pub fn ids(&self) -> Vec<String> {
        self.engine
            .participant_ids()
            .iter()
            .map(|id| id.to_string())
            .collect()
    }

    pub fn position(&self, track_id: &str) -> [f64; 3] {
        self.audio()
            .audible_position(track_id)
            .unwrap_or_else(|| panic!("{track_id} is not audible"))
    }
}

pub fn mic(participant: &str) -> Option<OfflineTrack> {
    Some(OfflineTrack::new(format!("{participant}-mic")))
}
