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

//! Explicitly passed configuration for the spatial audio engine.
//!
//! Defaults reproduce the reference perceptual curve and orbit exactly; any
//! override is validated before an engine is built from it.

use crate::constants::*;
use crate::error::{Result, SpatialAudioError};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PanningModel {
    Hrtf,
    EqualPower,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceModel {
    Linear,
    Inverse,
    Exponential,
}

/// Panner settings applied identically to every participant node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatializerOptions {
    pub panning_model: PanningModel,
    pub distance_model: DistanceModel,
    pub ref_distance: f64,
    pub max_distance: f64,
    pub rolloff_factor: f64,
}

impl Default for SpatializerOptions {
    fn default() -> Self {
        Self {
            panning_model: PanningModel::Hrtf,
            distance_model: DistanceModel::Inverse,
            ref_distance: SPATIALIZER_REF_DISTANCE,
            max_distance: SPATIALIZER_MAX_DISTANCE,
            rolloff_factor: SPATIALIZER_ROLLOFF_FACTOR,
        }
    }
}

/// Geometry and cadence of the orbit animation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub radius: f64,
    /// Radians added to the shared angle after every tick.
    pub step: f64,
    /// Z scale relative to X; small values flatten the circle to an ellipse.
    pub flattening: f64,
    pub initial_angle: f64,
    pub tick_interval_ms: u32,
    /// Delay between attempts to start while the mixing context is missing.
    pub retry_delay_ms: u32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            radius: ORBIT_RADIUS,
            step: ORBIT_STEP_RADIANS,
            flattening: ORBIT_FLATTENING,
            initial_angle: 0.0,
            tick_interval_ms: ORBIT_TICK_MS,
            retry_delay_ms: ORBIT_RETRY_MS,
        }
    }
}

impl OrbitConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(invalid(format!("orbit radius must be positive, got {}", self.radius)));
        }
        if !self.step.is_finite() {
            return Err(invalid("orbit step must be finite".to_string()));
        }
        if !self.flattening.is_finite() || self.flattening < 0.0 {
            return Err(invalid(format!(
                "orbit flattening must be non-negative, got {}",
                self.flattening
            )));
        }
        if !self.initial_angle.is_finite() {
            return Err(invalid("initial orbit angle must be finite".to_string()));
        }
        if self.tick_interval_ms == 0 {
            return Err(invalid("orbit tick interval must be non-zero".to_string()));
        }
        if self.retry_delay_ms == 0 {
            return Err(invalid("orbit retry delay must be non-zero".to_string()));
        }
        Ok(())
    }
}

impl SpatializerOptions {
    pub fn validate(&self) -> Result<()> {
        if !self.ref_distance.is_finite() || self.ref_distance <= 0.0 {
            return Err(invalid(format!(
                "ref distance must be positive, got {}",
                self.ref_distance
            )));
        }
        if !self.max_distance.is_finite() || self.max_distance < self.ref_distance {
            return Err(invalid(format!(
                "max distance {} is below ref distance {}",
                self.max_distance, self.ref_distance
            )));
        }
        if !self.rolloff_factor.is_finite() || self.rolloff_factor < 0.0 {
            return Err(invalid(format!(
                "rolloff factor must be non-negative, got {}",
                self.rolloff_factor
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialAudioConfig {
    pub spatializer: SpatializerOptions,
    pub orbit: OrbitConfig,
    /// Requested engine sample rate; `None` uses the device rate.
    pub sample_rate: Option<f32>,
}

impl Default for SpatialAudioConfig {
    fn default() -> Self {
        Self {
            spatializer: SpatializerOptions::default(),
            orbit: OrbitConfig::default(),
            sample_rate: Some(AUDIO_SAMPLE_RATE as f32),
        }
    }
}

impl SpatialAudioConfig {
    pub fn validate(&self) -> Result<()> {
        self.spatializer.validate()?;
        self.orbit.validate()?;
        if let Some(rate) = self.sample_rate {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(invalid(format!("sample rate must be positive, got {rate}")));
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| invalid(format!("malformed configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SpatialAudioError::Other(e.into()))
    }
}

fn invalid(message: String) -> SpatialAudioError {
    SpatialAudioError::InvalidConfig(message)
}
