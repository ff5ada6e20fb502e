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

use crate::audio::{AudioEngine, AudioNodeHandle};
use crate::session::ParticipantId;
use std::fmt;

/// One participant's path through the engine: `source → spatializer → output`.
///
/// Both nodes are owned exclusively by this entry.
pub struct ParticipantAudioNode<E: AudioEngine> {
    participant_id: ParticipantId,
    track: E::Track,
    source: E::Source,
    spatializer: E::Spatializer,
}

impl<E: AudioEngine> ParticipantAudioNode<E> {
    pub(crate) fn new(
        participant_id: ParticipantId,
        track: E::Track,
        source: E::Source,
        spatializer: E::Spatializer,
    ) -> Self {
        Self {
            participant_id,
            track,
            source,
            spatializer,
        }
    }

    pub fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    pub fn track(&self) -> &E::Track {
        &self.track
    }

    pub fn source(&self) -> &E::Source {
        &self.source
    }

    pub fn spatializer(&self) -> &E::Spatializer {
        &self.spatializer
    }

    pub(crate) fn disconnect(&self) {
        self.source.disconnect();
        self.spatializer.disconnect();
    }
}

impl<E: AudioEngine> fmt::Debug for ParticipantAudioNode<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticipantAudioNode")
            .field("participant_id", &self.participant_id)
            .finish_non_exhaustive()
    }
}
