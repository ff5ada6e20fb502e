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

//! Web Audio backend.
//!
//! One `AudioContext` per session; each participant gets a
//! `MediaStreamAudioSourceNode` feeding a `PannerNode` that is wired straight
//! into the context destination.

use super::engine::{AudioEngine, AudioNodeHandle, AudioTrack, SpatialNode};
use crate::config::{DistanceModel, PanningModel, SpatializerOptions};
use crate::error::{Result, SpatialAudioError};
use crate::platform::spawn_local;
use log::{info, warn};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AudioContext, AudioContextOptions, DistanceModelType, MediaStream, MediaStreamAudioSourceNode,
    MediaStreamTrack, PannerNode, PanningModelType,
};

impl AudioTrack for MediaStreamTrack {
    fn track_id(&self) -> String {
        self.id()
    }
}

pub struct WebSourceNode(MediaStreamAudioSourceNode);

impl AudioNodeHandle for WebSourceNode {
    fn disconnect(&self) {
        if let Err(e) = self.0.disconnect() {
            warn!("Failed to disconnect source node: {e:?}");
        }
    }
}

pub struct WebSpatializerNode(PannerNode);

impl WebSpatializerNode {
    pub fn panner(&self) -> &PannerNode {
        &self.0
    }
}

impl AudioNodeHandle for WebSpatializerNode {
    fn disconnect(&self) {
        if let Err(e) = self.0.disconnect() {
            warn!("Failed to disconnect panner node: {e:?}");
        }
    }
}

impl SpatialNode for WebSpatializerNode {
    fn set_position_x_at(&self, value: f64, time: f64) -> Result<()> {
        self.0
            .position_x()
            .set_value_at_time(value as f32, time)
            .map(|_| ())
            .map_err(|e| SpatialAudioError::graph_js("positionX automation", e))
    }

    fn set_position_z_at(&self, value: f64, time: f64) -> Result<()> {
        self.0
            .position_z()
            .set_value_at_time(value as f32, time)
            .map(|_| ())
            .map_err(|e| SpatialAudioError::graph_js("positionZ automation", e))
    }
}

pub struct WebAudioEngine {
    context: AudioContext,
}

impl WebAudioEngine {
    /// Construct the browser `AudioContext`. `sample_rate` of `None` lets the
    /// browser pick the device rate.
    pub fn new(sample_rate: Option<f32>) -> Result<Self> {
        let options = AudioContextOptions::new();
        if let Some(rate) = sample_rate {
            options.set_sample_rate(rate);
        }
        let context = AudioContext::new_with_context_options(&options)
            .map_err(|e| SpatialAudioError::Initialization(format!("{e:?}")))?;
        info!(
            "AudioContext created at {}Hz, state {:?}",
            context.sample_rate(),
            context.state()
        );
        Ok(Self { context })
    }

    pub fn context(&self) -> &AudioContext {
        &self.context
    }
}

fn panning_model(model: PanningModel) -> PanningModelType {
    match model {
        PanningModel::Hrtf => PanningModelType::Hrtf,
        PanningModel::EqualPower => PanningModelType::Equalpower,
    }
}

fn distance_model(model: DistanceModel) -> DistanceModelType {
    match model {
        DistanceModel::Linear => DistanceModelType::Linear,
        DistanceModel::Inverse => DistanceModelType::Inverse,
        DistanceModel::Exponential => DistanceModelType::Exponential,
    }
}

impl AudioEngine for WebAudioEngine {
    type Track = MediaStreamTrack;
    type Source = WebSourceNode;
    type Spatializer = WebSpatializerNode;

    fn current_time(&self) -> f64 {
        self.context.current_time()
    }

    fn create_source(&self, track: &MediaStreamTrack) -> Result<WebSourceNode> {
        let tracks = js_sys::Array::of1(track);
        let stream = MediaStream::new_with_tracks(&tracks)
            .map_err(|e| SpatialAudioError::graph_js("MediaStream", e))?;
        let source = self
            .context
            .create_media_stream_source(&stream)
            .map_err(|e| SpatialAudioError::graph_js("createMediaStreamSource", e))?;
        Ok(WebSourceNode(source))
    }

    fn create_spatializer(&self, options: &SpatializerOptions) -> Result<WebSpatializerNode> {
        let panner = self
            .context
            .create_panner()
            .map_err(|e| SpatialAudioError::graph_js("createPanner", e))?;
        panner.set_panning_model(panning_model(options.panning_model));
        panner.set_distance_model(distance_model(options.distance_model));
        panner.set_ref_distance(options.ref_distance);
        panner.set_max_distance(options.max_distance);
        panner.set_rolloff_factor(options.rolloff_factor);
        Ok(WebSpatializerNode(panner))
    }

    fn connect_to_output(
        &self,
        source: &WebSourceNode,
        spatializer: &WebSpatializerNode,
    ) -> Result<()> {
        source
            .0
            .connect_with_audio_node(&spatializer.0)
            .map_err(|e| SpatialAudioError::graph_js("connect source", e))?;
        spatializer
            .0
            .connect_with_audio_node(&self.context.destination())
            .map_err(|e| SpatialAudioError::graph_js("connect panner", e))?;
        Ok(())
    }

    fn close(&self) {
        match self.context.close() {
            Ok(promise) => spawn_local(async move {
                if let Err(e) = JsFuture::from(promise).await {
                    warn!("AudioContext close rejected: {e:?}");
                }
            }),
            Err(e) => warn!("Failed to close AudioContext: {e:?}"),
        }
    }
}
