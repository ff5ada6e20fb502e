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

pub const AUDIO_SAMPLE_RATE: u32 = 48000u32;

// Spatializer curve. Every participant node uses the same falloff.
pub const SPATIALIZER_REF_DISTANCE: f64 = 1.0;
pub const SPATIALIZER_MAX_DISTANCE: f64 = 100.0;
pub const SPATIALIZER_ROLLOFF_FACTOR: f64 = 1.0;

// Orbit animation
pub const ORBIT_RADIUS: f64 = 50.0;
pub const ORBIT_STEP_RADIANS: f64 = 0.02;
pub const ORBIT_FLATTENING: f64 = 0.02;
pub const ORBIT_TICK_MS: u32 = 50u32;
pub const ORBIT_RETRY_MS: u32 = 200u32;

/// Capacity of the spatial audio event bus channel
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Automation events kept per offline spatializer; older ones are discarded.
pub const OFFLINE_AUTOMATION_HISTORY: usize = 64;
