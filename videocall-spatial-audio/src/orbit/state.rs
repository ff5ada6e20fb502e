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

//! Orbit geometry, kept free of timers so position sequences are a pure
//! function of the configuration and the number of ticks.

use crate::config::OrbitConfig;
use std::f64::consts::TAU;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitPosition {
    pub x: f64,
    pub z: f64,
}

/// The shared animation clock. One instance drives every node.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitState {
    angle: f64,
    step: f64,
    radius: f64,
    flattening: f64,
}

impl OrbitState {
    pub fn new(config: &OrbitConfig) -> Self {
        Self {
            angle: config.initial_angle.rem_euclid(TAU),
            step: config.step,
            radius: config.radius,
            flattening: config.flattening,
        }
    }

    /// Current angle in radians, within `[0, 2π)`.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Position of the `index`-th of `count` nodes at the current angle.
    ///
    /// Nodes are spread evenly around the circle; the z axis is scaled by the
    /// flattening factor.
    pub fn position_for(&self, index: usize, count: usize) -> OrbitPosition {
        let phase = (index as f64 / count.max(1) as f64) * TAU;
        let theta = self.angle + phase;
        OrbitPosition {
            x: theta.cos() * self.radius,
            z: theta.sin() * self.radius * self.flattening,
        }
    }

    pub fn positions(&self, count: usize) -> Vec<OrbitPosition> {
        (0..count).map(|i| self.position_for(i, count)).collect()
    }

    pub fn advance(&mut self) {
        self.angle = (self.angle + self.step).rem_euclid(TAU);
    }

    /// Take radius, step and flattening from `config`, keeping the angle.
    pub fn apply_geometry(&mut self, config: &OrbitConfig) {
        self.step = config.step;
        self.radius = config.radius;
        self.flattening = config.flattening;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn two_nodes_sit_opposite_each_other() {
        let state = OrbitState::new(&OrbitConfig::default());
        let positions = state.positions(2);

        assert_eq!(positions[0], OrbitPosition { x: 50.0, z: 0.0 });
        assert!((positions[1].x + 50.0).abs() < EPSILON);
        assert!(positions[1].z.abs() < EPSILON);
    }

    #[test]
    fn single_node_has_no_phase_offset() {
        let mut state = OrbitState::new(&OrbitConfig::default());
        for _ in 0..7 {
            state.advance();
        }
        let angle = state.angle();
        let position = state.position_for(0, 1);

        assert_eq!(position.x, angle.cos() * 50.0);
        assert_eq!(position.z, angle.sin() * 50.0 * 0.02);
    }

    #[test]
    fn zero_count_is_treated_as_one() {
        let state = OrbitState::new(&OrbitConfig::default());
        assert_eq!(state.position_for(0, 0), state.position_for(0, 1));
        assert!(state.positions(0).is_empty());
    }

    #[test]
    fn angle_wraps_into_full_turn() {
        let config = OrbitConfig {
            initial_angle: 2.0 * PI - 0.01,
            ..OrbitConfig::default()
        };
        let mut state = OrbitState::new(&config);
        state.advance();

        assert!(state.angle() >= 0.0 && state.angle() < TAU);
        assert!((state.angle() - 0.01).abs() < EPSILON);
    }

    #[test]
    fn negative_step_stays_in_range() {
        let config = OrbitConfig {
            step: -0.5,
            ..OrbitConfig::default()
        };
        let mut state = OrbitState::new(&config);
        state.advance();
        assert!((state.angle() - (TAU - 0.5)).abs() < EPSILON);
    }

    #[test]
    fn sequences_are_deterministic() {
        let run = || {
            let mut state = OrbitState::new(&OrbitConfig::default());
            let mut out = Vec::new();
            for _ in 0..100 {
                out.extend(state.positions(3));
                state.advance();
            }
            out
        };
        let a = run();
        let b = run();
        assert!(a
            .iter()
            .zip(&b)
            .all(|(p, q)| p.x.to_bits() == q.x.to_bits() && p.z.to_bits() == q.z.to_bits()));
    }

    #[test]
    fn geometry_update_keeps_angle() {
        let mut state = OrbitState::new(&OrbitConfig::default());
        state.advance();
        let angle = state.angle();

        state.apply_geometry(&OrbitConfig {
            radius: 10.0,
            ..OrbitConfig::default()
        });

        assert_eq!(state.angle(), angle);
        assert_eq!(state.radius(), 10.0);
    }
}
