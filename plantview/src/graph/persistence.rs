//! Drag-to-reposition lifecycle and position saving.
//!
//! A drag unlocks the dragged nodes so the engine lets them move, the
//! release captures their coordinates into one [`PositionBatch`], and the
//! save result decides whether they are locked again. A failed save leaves
//! the nodes free and marks them unsaved until a later save succeeds.

use std::collections::{BTreeSet, HashMap};

use plantview_common::{NodeId, PositionUpdate, TopologySnapshot};

use super::engine::{NodePatch, RenderEngine};

/// What produced a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOrigin {
    /// Release of a drag gesture.
    Drag,
    /// Explicit "save all positions".
    SaveAll,
}

/// Positions captured for one save request.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionBatch {
    pub id: u64,
    pub origin: BatchOrigin,
    pub updates: Vec<PositionUpdate>,
}

impl PositionBatch {
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

/// Result of applying a save completion.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved {
        count: usize,
        relocked: Vec<NodeId>,
    },
    Failed {
        error: String,
        unsaved: Vec<NodeId>,
    },
    /// The batch is not tracked any more (view was reset).
    Stale,
}

#[derive(Debug, Clone)]
struct Gesture {
    nodes: Vec<NodeId>,
    suppressed: bool,
}

#[derive(Debug, Clone)]
struct InFlight {
    origin: BatchOrigin,
    nodes: Vec<NodeId>,
}

/// Per-view drag and save bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct PositionPersistence {
    drag_locked: bool,
    gesture: Option<Gesture>,
    next_batch: u64,
    in_flight: HashMap<u64, InFlight>,
    unsaved: BTreeSet<NodeId>,
}

impl PositionPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drag_locked(&self) -> bool {
        self.drag_locked
    }

    /// Flip the global lock. Only affects gestures started afterwards.
    pub fn toggle_drag_lock(&mut self) -> bool {
        self.drag_locked = !self.drag_locked;
        self.drag_locked
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn pending_saves(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_unsaved(&self, id: &str) -> bool {
        self.unsaved.contains(id)
    }

    pub fn unsaved_count(&self) -> usize {
        self.unsaved.len()
    }

    /// Begin a drag gesture on `nodes`.
    pub fn drag_start(&mut self, nodes: &[NodeId], engine: &mut impl RenderEngine) {
        if self.drag_locked {
            tracing::debug!(nodes = nodes.len(), "Drag suppressed by lock");
            self.gesture = Some(Gesture {
                nodes: nodes.to_vec(),
                suppressed: true,
            });
            return;
        }

        for id in nodes {
            engine.update_node(id, NodePatch::locked(false));
        }
        self.gesture = Some(Gesture {
            nodes: nodes.to_vec(),
            suppressed: false,
        });
    }

    /// Finish a drag gesture and capture the batch to save.
    ///
    /// Coordinates are read here, before any save is issued, so the batch
    /// reflects this gesture's final positions.
    pub fn drag_end(
        &mut self,
        nodes: &[NodeId],
        engine: &impl RenderEngine,
    ) -> Option<PositionBatch> {
        let gesture = self.gesture.take();
        if gesture.as_ref().is_some_and(|g| g.suppressed) {
            return None;
        }

        let mut ids = nodes.to_vec();
        if let Some(gesture) = gesture {
            for id in gesture.nodes {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        self.track(BatchOrigin::Drag, engine.positions(&ids))
    }

    /// Capture every displayed node's coordinates as one batch.
    pub fn save_all(&mut self, engine: &impl RenderEngine) -> Option<PositionBatch> {
        self.track(BatchOrigin::SaveAll, engine.all_positions())
    }

    fn track(&mut self, origin: BatchOrigin, updates: Vec<PositionUpdate>) -> Option<PositionBatch> {
        if updates.is_empty() {
            return None;
        }

        self.next_batch += 1;
        let id = self.next_batch;
        let nodes = updates.iter().map(|u| u.node_id.clone()).collect();
        self.in_flight.insert(id, InFlight { origin, nodes });

        Some(PositionBatch {
            id,
            origin,
            updates,
        })
    }

    /// Apply the backend's answer for batch `id`.
    ///
    /// Nodes the engine is not showing (hidden by a layer filter) are
    /// updated in `stored`, so they come back in the right state.
    pub fn complete(
        &mut self,
        id: u64,
        result: Result<usize, String>,
        engine: &mut impl RenderEngine,
        stored: &mut TopologySnapshot,
    ) -> SaveOutcome {
        let Some(batch) = self.in_flight.remove(&id) else {
            tracing::debug!(batch = id, "Ignoring completion of an untracked save");
            return SaveOutcome::Stale;
        };

        // Nodes picked up again by a newer gesture stay free.
        let dragging: &[NodeId] = match &self.gesture {
            Some(gesture) if !gesture.suppressed => &gesture.nodes,
            _ => &[],
        };

        match result {
            Ok(count) => {
                let mut relocked = Vec::new();
                for node in &batch.nodes {
                    if dragging.contains(node) {
                        continue;
                    }
                    let was_unsaved = self.unsaved.remove(node);
                    if batch.origin == BatchOrigin::Drag || was_unsaved {
                        let patch = NodePatch {
                            locked: Some(true),
                            unsaved: Some(false),
                            style: None,
                        };
                        let shown = engine.update_node(node, patch);
                        let kept = match stored.nodes.iter_mut().find(|n| &n.id == node) {
                            Some(stored) => {
                                stored.locked = true;
                                true
                            }
                            None => false,
                        };
                        if shown || kept {
                            relocked.push(node.clone());
                        }
                    }
                }
                tracing::info!(batch = id, count, relocked = relocked.len(), "Positions saved");
                SaveOutcome::Saved { count, relocked }
            }
            Err(error) => {
                let mut unsaved = Vec::new();
                for node in &batch.nodes {
                    let free = match engine.graph().node(node) {
                        Some(shown) => !shown.locked,
                        None => stored.nodes.iter().any(|n| &n.id == node && !n.locked),
                    };
                    if !free {
                        continue;
                    }
                    self.unsaved.insert(node.clone());
                    engine.update_node(
                        node,
                        NodePatch {
                            unsaved: Some(true),
                            ..NodePatch::default()
                        },
                    );
                    unsaved.push(node.clone());
                }
                tracing::warn!(batch = id, error = %error, unsaved = unsaved.len(), "Saving positions failed");
                SaveOutcome::Failed { error, unsaved }
            }
        }
    }

    /// Forget gestures, pending saves and unsaved marks. The lock toggle is kept.
    pub fn reset(&mut self) {
        self.gesture = None;
        self.in_flight.clear();
        self.unsaved.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::adapter::{GraphAdapter, RenderGraph};
    use crate::view::canvas::CanvasEngine;
    use plantview_common::{NodeKind, TopologyNode, TopologySnapshot};

    fn engine() -> CanvasEngine {
        let mut engine = CanvasEngine::default();
        engine.set_data(GraphAdapter::default().adapt(&TopologySnapshot::new(
            vec![
                TopologyNode::new("A", NodeKind::Pole).at(0.0, 0.0),
                TopologyNode::new("B", NodeKind::Pole).at(100.0, 0.0),
                TopologyNode::new("C", NodeKind::Pole).at(200.0, 0.0),
            ],
            vec![],
        )));
        engine
    }

    fn ids(list: &[&str]) -> Vec<NodeId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Complete a batch whose nodes are all on screen.
    fn complete(
        persistence: &mut PositionPersistence,
        id: u64,
        result: Result<usize, String>,
        engine: &mut CanvasEngine,
    ) -> SaveOutcome {
        persistence.complete(id, result, engine, &mut TopologySnapshot::default())
    }

    fn locked(engine: &CanvasEngine, id: &str) -> bool {
        engine.graph().node(id).map(|n| n.locked).unwrap_or_default()
    }

    #[test]
    fn test_drag_save_relocks() {
        let mut engine = engine();
        let mut persistence = PositionPersistence::new();
        let nodes = ids(&["A", "B"]);

        persistence.drag_start(&nodes, &mut engine);
        assert!(!locked(&engine, "A"));
        assert!(!locked(&engine, "B"));

        engine.drag_by(&nodes, 10.0, 5.0);
        let batch = persistence.drag_end(&nodes, &engine).unwrap();
        assert_eq!(batch.origin, BatchOrigin::Drag);
        assert_eq!(
            batch.updates,
            vec![
                PositionUpdate::new("A", 10.0, 5.0),
                PositionUpdate::new("B", 110.0, 5.0),
            ]
        );

        let outcome = complete(&mut persistence, batch.id, Ok(2), &mut engine);
        assert_eq!(
            outcome,
            SaveOutcome::Saved {
                count: 2,
                relocked: nodes.clone()
            }
        );
        assert!(locked(&engine, "A"));
        assert!(locked(&engine, "B"));
    }

    #[test]
    fn test_lock_suppresses_gesture() {
        let mut engine = engine();
        let mut persistence = PositionPersistence::new();
        let nodes = ids(&["A"]);

        persistence.toggle_drag_lock();
        persistence.drag_start(&nodes, &mut engine);
        assert!(locked(&engine, "A"));

        engine.drag_by(&nodes, 50.0, 50.0);
        assert_eq!(engine.positions(&nodes), vec![PositionUpdate::new("A", 0.0, 0.0)]);

        // Unlocking mid-gesture does not revive it.
        persistence.toggle_drag_lock();
        assert!(persistence.drag_end(&nodes, &engine).is_none());
        assert_eq!(persistence.pending_saves(), 0);
    }

    #[test]
    fn test_lock_mid_gesture_does_not_suppress() {
        let mut engine = engine();
        let mut persistence = PositionPersistence::new();
        let nodes = ids(&["C"]);

        persistence.drag_start(&nodes, &mut engine);
        persistence.toggle_drag_lock();
        assert!(persistence.drag_end(&nodes, &engine).is_some());
    }

    #[test]
    fn test_failed_save_marks_unsaved_until_next_success() {
        let mut engine = engine();
        let mut persistence = PositionPersistence::new();
        let nodes = ids(&["A"]);

        persistence.drag_start(&nodes, &mut engine);
        let batch = persistence.drag_end(&nodes, &engine).unwrap();
        let outcome = complete(&mut persistence, batch.id, Err("BD_ERROR".into()), &mut engine);

        assert!(matches!(outcome, SaveOutcome::Failed { ref unsaved, .. } if unsaved == &nodes));
        assert!(!locked(&engine, "A"));
        assert!(persistence.is_unsaved("A"));
        assert!(engine.graph().node("A").unwrap().unsaved);

        let retry = persistence.save_all(&engine).unwrap();
        assert_eq!(retry.len(), 3);
        complete(&mut persistence, retry.id, Ok(3), &mut engine);

        assert!(locked(&engine, "A"));
        assert_eq!(persistence.unsaved_count(), 0);
        assert!(!engine.graph().node("A").unwrap().unsaved);
    }

    #[test]
    fn test_completion_skips_nodes_dragged_again() {
        let mut engine = engine();
        let mut persistence = PositionPersistence::new();
        let nodes = ids(&["B"]);

        persistence.drag_start(&nodes, &mut engine);
        let first = persistence.drag_end(&nodes, &engine).unwrap();

        persistence.drag_start(&nodes, &mut engine);
        let outcome = complete(&mut persistence, first.id, Ok(1), &mut engine);

        assert_eq!(
            outcome,
            SaveOutcome::Saved {
                count: 1,
                relocked: vec![]
            }
        );
        assert!(!locked(&engine, "B"));
    }

    #[test]
    fn test_reset_drops_pending_saves() {
        let mut engine = engine();
        let mut persistence = PositionPersistence::new();
        let batch = persistence.save_all(&engine).unwrap();

        persistence.reset();
        assert_eq!(complete(&mut persistence, batch.id, Ok(3), &mut engine), SaveOutcome::Stale);
    }

    #[test]
    fn test_save_relocks_hidden_node() {
        let mut engine = engine();
        let mut persistence = PositionPersistence::new();
        let mut stored = TopologySnapshot::new(
            vec![TopologyNode::new("A", NodeKind::Pole).at(0.0, 0.0)],
            vec![],
        );
        stored.nodes[0].locked = false;
        let nodes = ids(&["A"]);

        persistence.drag_start(&nodes, &mut engine);
        let batch = persistence.drag_end(&nodes, &engine).unwrap();

        // The node's layer is hidden before the answer arrives.
        engine.set_data(RenderGraph::default());
        let outcome = persistence.complete(batch.id, Ok(1), &mut engine, &mut stored);

        assert_eq!(
            outcome,
            SaveOutcome::Saved {
                count: 1,
                relocked: nodes
            }
        );
        assert!(stored.nodes[0].locked);
    }

    #[test]
    fn test_failed_save_marks_hidden_node_unsaved() {
        let mut engine = engine();
        let mut persistence = PositionPersistence::new();
        let mut stored = TopologySnapshot::new(
            vec![TopologyNode::new("B", NodeKind::Pole).at(100.0, 0.0)],
            vec![],
        );
        stored.nodes[0].locked = false;
        let nodes = ids(&["B"]);

        persistence.drag_start(&nodes, &mut engine);
        let batch = persistence.drag_end(&nodes, &engine).unwrap();

        engine.set_data(RenderGraph::default());
        let outcome = persistence.complete(batch.id, Err("BD_ERROR".into()), &mut engine, &mut stored);

        assert!(matches!(outcome, SaveOutcome::Failed { ref unsaved, .. } if unsaved == &nodes));
        assert!(persistence.is_unsaved("B"));
        assert!(!stored.nodes[0].locked);
    }
}
