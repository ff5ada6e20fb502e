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

//! In-memory audio engine.
//!
//! Records the graph instead of rendering it: which nodes exist, which pairs
//! are connected and every position automation event. Headless clients use
//! it where no audio device exists, and tests use it to assert on graph
//! shape (e.g. that a participant never has two paths into the output).

use super::engine::{AudioEngine, AudioNodeHandle, AudioTrack, SpatialNode};
use crate::config::SpatializerOptions;
use crate::constants::OFFLINE_AUTOMATION_HISTORY;
use crate::error::{Result, SpatialAudioError};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::rc::Rc;

pub type NodeId = u64;

/// The implicit output destination.
pub const OUTPUT_NODE: NodeId = 0;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OfflineTrack {
    id: String,
}

impl OfflineTrack {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl AudioTrack for OfflineTrack {
    fn track_id(&self) -> String {
        self.id.clone()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionAxis {
    X,
    Z,
}

/// One `setValueAtTime` call on a spatializer position parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AutomationEvent {
    pub axis: PositionAxis,
    pub value: f64,
    pub time: f64,
}

#[derive(Debug)]
struct SpatializerState {
    options: SpatializerOptions,
    position: [f64; 3],
    automation: VecDeque<AutomationEvent>,
}

#[derive(Debug, Default)]
struct Graph {
    next_id: NodeId,
    edges: BTreeSet<(NodeId, NodeId)>,
    sources: HashMap<NodeId, String>,
    spatializers: HashMap<NodeId, SpatializerState>,
    closed: bool,
}

impl Graph {
    fn allocate(&mut self) -> Result<NodeId> {
        if self.closed {
            return Err(SpatialAudioError::Graph("engine is closed".to_string()));
        }
        self.next_id += 1;
        Ok(self.next_id)
    }

    fn disconnect(&mut self, node: NodeId) {
        self.edges.retain(|(from, _)| *from != node);
    }

    // Called when a node handle is dropped; the node can never be used again.
    fn forget(&mut self, node: NodeId) {
        self.edges.retain(|(from, to)| *from != node && *to != node);
        self.sources.remove(&node);
        self.spatializers.remove(&node);
    }
}

/// Cheap to clone; clones observe the same graph.
#[derive(Clone, Debug)]
pub struct OfflineAudioEngine {
    graph: Rc<RefCell<Graph>>,
    clock: Rc<Cell<f64>>,
}

impl OfflineAudioEngine {
    pub fn new() -> Self {
        Self {
            graph: Rc::new(RefCell::new(Graph::default())),
            clock: Rc::new(Cell::new(0.0)),
        }
    }

    /// Move the engine clock forward. Nothing renders offline, so whoever
    /// drives the engine owns the clock.
    pub fn advance_clock(&self, seconds: f64) {
        self.clock.set(self.clock.get() + seconds);
    }

    pub fn is_closed(&self) -> bool {
        self.graph.borrow().closed
    }

    /// Number of connections terminating at the output destination.
    pub fn output_connections(&self) -> usize {
        self.graph
            .borrow()
            .edges
            .iter()
            .filter(|(_, to)| *to == OUTPUT_NODE)
            .count()
    }

    pub fn is_connected(&self, from: NodeId, to: NodeId) -> bool {
        self.graph.borrow().edges.contains(&(from, to))
    }

    /// Track ids that currently have a complete `source → spatializer → output`
    /// path, sorted. A track appearing twice would be heard twice.
    pub fn audible_tracks(&self) -> Vec<String> {
        let graph = self.graph.borrow();
        let mut tracks: Vec<String> = graph
            .edges
            .iter()
            .filter(|(from, to)| {
                graph.sources.contains_key(from)
                    && graph.spatializers.contains_key(to)
                    && graph.edges.contains(&(*to, OUTPUT_NODE))
            })
            .filter_map(|(from, _)| graph.sources.get(from).cloned())
            .collect();
        tracks.sort();
        tracks
    }

    /// Position of the spatializer an audible track is routed through.
    pub fn audible_position(&self, track_id: &str) -> Option<[f64; 3]> {
        let graph = self.graph.borrow();
        graph
            .edges
            .iter()
            .filter(|(from, to)| {
                graph.sources.get(from).map(String::as_str) == Some(track_id)
                    && graph.edges.contains(&(*to, OUTPUT_NODE))
            })
            .find_map(|(_, to)| graph.spatializers.get(to).map(|s| s.position))
    }

    /// Source nodes whose handles are still alive.
    pub fn source_count(&self) -> usize {
        self.graph.borrow().sources.len()
    }

    /// Spatializer nodes whose handles are still alive.
    pub fn spatializer_count(&self) -> usize {
        self.graph.borrow().spatializers.len()
    }

    pub fn spatializer_position(&self, node: NodeId) -> Option<[f64; 3]> {
        self.graph
            .borrow()
            .spatializers
            .get(&node)
            .map(|s| s.position)
    }
}

impl Default for OfflineAudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct OfflineSourceNode {
    id: NodeId,
    track_id: String,
    graph: Rc<RefCell<Graph>>,
}

impl OfflineSourceNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }
}

impl AudioNodeHandle for OfflineSourceNode {
    fn disconnect(&self) {
        self.graph.borrow_mut().disconnect(self.id);
    }
}

impl Drop for OfflineSourceNode {
    fn drop(&mut self) {
        if let Ok(mut graph) = self.graph.try_borrow_mut() {
            graph.forget(self.id);
        }
    }
}

#[derive(Debug)]
pub struct OfflineSpatializerNode {
    id: NodeId,
    graph: Rc<RefCell<Graph>>,
}

impl OfflineSpatializerNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> [f64; 3] {
        self.graph
            .borrow()
            .spatializers
            .get(&self.id)
            .map(|s| s.position)
            .unwrap_or_default()
    }

    pub fn options(&self) -> Option<SpatializerOptions> {
        self.graph
            .borrow()
            .spatializers
            .get(&self.id)
            .map(|s| s.options.clone())
    }

    pub fn automation(&self) -> Vec<AutomationEvent> {
        self.graph
            .borrow()
            .spatializers
            .get(&self.id)
            .map(|s| s.automation.iter().copied().collect())
            .unwrap_or_default()
    }

    fn automate(&self, axis: PositionAxis, value: f64, time: f64) -> Result<()> {
        let mut graph = self.graph.borrow_mut();
        if graph.closed {
            return Err(SpatialAudioError::Graph("engine is closed".to_string()));
        }
        let state = graph.spatializers.get_mut(&self.id).ok_or_else(|| {
            SpatialAudioError::Graph(format!("unknown spatializer node {}", self.id))
        })?;
        match axis {
            PositionAxis::X => state.position[0] = value,
            PositionAxis::Z => state.position[2] = value,
        }
        if state.automation.len() == OFFLINE_AUTOMATION_HISTORY {
            state.automation.pop_front();
        }
        state.automation.push_back(AutomationEvent { axis, value, time });
        Ok(())
    }
}

impl Drop for OfflineSpatializerNode {
    fn drop(&mut self) {
        if let Ok(mut graph) = self.graph.try_borrow_mut() {
            graph.forget(self.id);
        }
    }
}

impl AudioNodeHandle for OfflineSpatializerNode {
    fn disconnect(&self) {
        self.graph.borrow_mut().disconnect(self.id);
    }
}

impl SpatialNode for OfflineSpatializerNode {
    fn set_position_x_at(&self, value: f64, time: f64) -> Result<()> {
        self.automate(PositionAxis::X, value, time)
    }

    fn set_position_z_at(&self, value: f64, time: f64) -> Result<()> {
        self.automate(PositionAxis::Z, value, time)
    }
}

impl AudioEngine for OfflineAudioEngine {
    type Track = OfflineTrack;
    type Source = OfflineSourceNode;
    type Spatializer = OfflineSpatializerNode;

    fn current_time(&self) -> f64 {
        self.clock.get()
    }

    fn create_source(&self, track: &OfflineTrack) -> Result<OfflineSourceNode> {
        let mut graph = self.graph.borrow_mut();
        let id = graph.allocate()?;
        graph.sources.insert(id, track.track_id());
        Ok(OfflineSourceNode {
            id,
            track_id: track.track_id(),
            graph: Rc::clone(&self.graph),
        })
    }

    fn create_spatializer(&self, options: &SpatializerOptions) -> Result<OfflineSpatializerNode> {
        let mut graph = self.graph.borrow_mut();
        let id = graph.allocate()?;
        graph.spatializers.insert(
            id,
            SpatializerState {
                options: options.clone(),
                position: [0.0; 3],
                automation: VecDeque::new(),
            },
        );
        Ok(OfflineSpatializerNode {
            id,
            graph: Rc::clone(&self.graph),
        })
    }

    fn connect_to_output(
        &self,
        source: &OfflineSourceNode,
        spatializer: &OfflineSpatializerNode,
    ) -> Result<()> {
        let mut graph = self.graph.borrow_mut();
        if graph.closed {
            return Err(SpatialAudioError::Graph("engine is closed".to_string()));
        }
        graph.edges.insert((source.id, spatializer.id));
        graph.edges.insert((spatializer.id, OUTPUT_NODE));
        Ok(())
    }

    fn close(&self) {
        let mut graph = self.graph.borrow_mut();
        graph.closed = true;
        graph.edges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_builds_complete_path() {
        let engine = OfflineAudioEngine::new();
        let source = engine.create_source(&OfflineTrack::new("mic")).unwrap();
        let panner = engine
            .create_spatializer(&SpatializerOptions::default())
            .unwrap();

        engine.connect_to_output(&source, &panner).unwrap();

        assert!(engine.is_connected(source.id(), panner.id()));
        assert!(engine.is_connected(panner.id(), OUTPUT_NODE));
        assert_eq!(engine.audible_tracks(), vec!["mic".to_string()]);
    }

    #[test]
    fn disconnect_is_idempotent() {
        let engine = OfflineAudioEngine::new();
        let source = engine.create_source(&OfflineTrack::new("mic")).unwrap();
        let panner = engine
            .create_spatializer(&SpatializerOptions::default())
            .unwrap();
        engine.connect_to_output(&source, &panner).unwrap();

        source.disconnect();
        source.disconnect();
        panner.disconnect();

        assert_eq!(engine.output_connections(), 0);
        assert!(engine.audible_tracks().is_empty());
    }

    #[test]
    fn automation_records_time_and_moves_node() {
        let engine = OfflineAudioEngine::new();
        let panner = engine
            .create_spatializer(&SpatializerOptions::default())
            .unwrap();
        engine.advance_clock(0.5);

        panner.set_position_x_at(3.0, engine.current_time()).unwrap();
        panner.set_position_z_at(-1.0, engine.current_time()).unwrap();

        assert_eq!(panner.position(), [3.0, 0.0, -1.0]);
        assert_eq!(
            panner.automation(),
            vec![
                AutomationEvent { axis: PositionAxis::X, value: 3.0, time: 0.5 },
                AutomationEvent { axis: PositionAxis::Z, value: -1.0, time: 0.5 },
            ]
        );
    }

    #[test]
    fn dropped_nodes_leave_the_graph() {
        let engine = OfflineAudioEngine::new();
        for i in 0..100 {
            let track = OfflineTrack::new(format!("mic-{i}"));
            let source = engine.create_source(&track).unwrap();
            let panner = engine
                .create_spatializer(&SpatializerOptions::default())
                .unwrap();
            engine.connect_to_output(&source, &panner).unwrap();
        }

        assert_eq!(engine.source_count(), 0);
        assert_eq!(engine.spatializer_count(), 0);
        assert_eq!(engine.output_connections(), 0);
    }

    #[test]
    fn automation_history_is_bounded() {
        let engine = OfflineAudioEngine::new();
        let panner = engine
            .create_spatializer(&SpatializerOptions::default())
            .unwrap();

        for tick in 0..10_000 {
            let time = tick as f64 * 0.05;
            panner.set_position_x_at(1.0, time).unwrap();
            panner.set_position_z_at(2.0, time).unwrap();
        }

        let automation = panner.automation();
        assert_eq!(automation.len(), OFFLINE_AUTOMATION_HISTORY);
        assert_eq!(automation.last().unwrap().time, 9_999.0 * 0.05);
        assert_eq!(panner.position(), [1.0, 0.0, 2.0]);
    }

    #[test]
    fn closed_engine_refuses_new_nodes() {
        let engine = OfflineAudioEngine::new();
        engine.close();
        assert!(engine.is_closed());
        assert!(engine.create_source(&OfflineTrack::new("mic")).is_err());
    }
}
