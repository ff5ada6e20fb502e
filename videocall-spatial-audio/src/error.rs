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

use thiserror::Error;

/// Result type for spatial audio operations
pub type Result<T> = std::result::Result<T, SpatialAudioError>;

/// Errors surfaced by the spatial audio engine.
///
/// Only construction-time failures are meant to reach the caller of
/// [`SpatialAudioEngine`](crate::SpatialAudioEngine); everything raised while
/// handling a roster event is logged and absorbed.
#[derive(Error, Debug)]
pub enum SpatialAudioError {
    #[error("Audio engine initialization failed: {0}")]
    Initialization(String),

    #[error("Audio graph error: {0}")]
    Graph(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Spatial audio engine is already active")]
    AlreadyActive,

    #[error("Audio mixing context is not available")]
    ContextUnavailable,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(target_arch = "wasm32")]
impl SpatialAudioError {
    pub(crate) fn graph_js(context: &str, err: wasm_bindgen::JsValue) -> Self {
        SpatialAudioError::Graph(format!("{context}: {err:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SpatialAudioError::Initialization("audio denied".to_string());
        assert_eq!(
            err.to_string(),
            "Audio engine initialization failed: audio denied"
        );

        let err = SpatialAudioError::Other(anyhow::anyhow!("session went away"));
        assert!(err.to_string().contains("session went away"));
    }
}
