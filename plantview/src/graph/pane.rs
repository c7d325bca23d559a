//! One graph on screen: adapter, engine, selection, navigation and
//! persistence wired together.

use std::collections::HashMap;

use plantview_common::{EdgeKind, NodeId, NodeKind, TopologySnapshot};

use super::adapter::{GraphAdapter, RenderGraph};
use super::callback::CallbackSlot;
use super::engine::{EdgePatch, EngineEvent, NodePatch, RenderEngine};
use super::navigation::RouteNavigationTrigger;
use super::persistence::{PositionBatch, PositionPersistence, SaveOutcome};
use super::selection::{
    HighlightChange, Pin, PinKind, SelectionBehavior, SelectionController, SelectionOutcome,
    SelectionPayload, SelectionState,
};
use super::style::StyleSheet;

/// The graph part of a screen.
///
/// The engine is created once per mount. Listeners (selection and route
/// navigation) are read through callback slots, so the owner can replace
/// them at any time without touching the engine.
#[derive(Debug)]
pub struct GraphPane<E: RenderEngine> {
    adapter: GraphAdapter,
    engine: Option<E>,
    mounts: usize,
    selection: SelectionController,
    navigation: RouteNavigationTrigger,
    persistence: PositionPersistence,
    snapshot: TopologySnapshot,
    generation: u64,
    loading: bool,
    error: Option<String>,
    fitted: bool,
    on_select: CallbackSlot<Option<SelectionPayload>>,
    on_open_route: CallbackSlot<String>,
}

impl<E: RenderEngine> GraphPane<E> {
    pub fn new(styles: StyleSheet, behavior: SelectionBehavior) -> Self {
        Self {
            adapter: GraphAdapter::new(styles),
            engine: None,
            mounts: 0,
            selection: SelectionController::new(behavior),
            navigation: RouteNavigationTrigger,
            persistence: PositionPersistence::new(),
            snapshot: TopologySnapshot::default(),
            generation: 0,
            loading: false,
            error: None,
            fitted: false,
            on_select: CallbackSlot::new(),
            on_open_route: CallbackSlot::new(),
        }
    }

    /// Create the engine if it does not exist yet. Returns whether it was created.
    pub fn mount(&mut self, create: impl FnOnce() -> E) -> bool {
        if self.engine.is_some() {
            return false;
        }
        self.engine = Some(create());
        self.mounts += 1;
        self.fitted = false;
        if !self.snapshot.is_empty() {
            self.render();
        }
        tracing::debug!(mounts = self.mounts, "Graph engine mounted");
        true
    }

    /// Drop the engine and all interaction state tied to it.
    pub fn unmount(&mut self) {
        if self.engine.take().is_some() {
            self.selection.reset();
            self.persistence.reset();
            tracing::debug!("Graph engine unmounted");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.engine.is_some()
    }

    /// How many engines this pane has created.
    pub fn mount_count(&self) -> usize {
        self.mounts
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut E> {
        self.engine.as_mut()
    }

    pub fn graph(&self) -> Option<&RenderGraph> {
        self.engine.as_ref().map(RenderEngine::graph)
    }

    pub fn snapshot(&self) -> &TopologySnapshot {
        &self.snapshot
    }

    pub fn adapter(&self) -> &GraphAdapter {
        &self.adapter
    }

    /// Slot for the details panel callback.
    pub fn on_select(&self) -> &CallbackSlot<Option<SelectionPayload>> {
        &self.on_select
    }

    /// Slot for the route navigation callback.
    pub fn on_open_route(&self) -> &CallbackSlot<String> {
        &self.on_open_route
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn selection_state(&self) -> SelectionState {
        self.selection.state()
    }

    pub fn pin(&self) -> Option<&Pin> {
        self.selection.pin()
    }

    pub fn selection(&self) -> Option<&SelectionPayload> {
        self.selection.current()
    }

    pub fn is_drag_locked(&self) -> bool {
        self.persistence.is_drag_locked()
    }

    pub fn unsaved_count(&self) -> usize {
        self.persistence.unsaved_count()
    }

    pub fn pending_saves(&self) -> usize {
        self.persistence.pending_saves()
    }

    /// Generation of the latest fetch.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a fetch. Only the result tagged with the returned generation
    /// will be applied.
    pub fn begin_fetch(&mut self) -> u64 {
        self.generation += 1;
        self.loading = true;
        self.generation
    }

    /// Apply a fetch result. Returns `false` if it was superseded.
    ///
    /// On failure the last-known graph stays on screen next to the error.
    pub fn finish_fetch(&mut self, generation: u64, result: Result<TopologySnapshot, String>) -> bool {
        if generation != self.generation {
            tracing::debug!(generation, latest = self.generation, "Discarding stale fetch result");
            return false;
        }
        self.loading = false;

        match result {
            Ok(snapshot) => {
                self.error = None;
                self.load(snapshot);
            }
            Err(error) => {
                tracing::error!(error = %error, "Failed to load topology");
                self.error = Some(error);
            }
        }
        true
    }

    /// Replace the source snapshot and rebuild the render graph.
    pub fn load(&mut self, snapshot: TopologySnapshot) {
        tracing::debug!(
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            "Loading topology snapshot"
        );
        self.snapshot = snapshot;
        self.persistence.reset();
        self.fitted = false;
        self.render();
    }

    /// Forget the current graph, selection and saves (e.g. before switching route).
    pub fn reset(&mut self) {
        let outcome = self.selection.reset();
        self.publish(outcome);
        self.persistence.reset();
        self.snapshot = TopologySnapshot::default();
        self.error = None;
        self.fitted = false;
        if let Some(engine) = self.engine.as_mut() {
            engine.set_data(RenderGraph::default());
        }
    }

    fn render(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let mut graph = self.adapter.adapt(&self.snapshot);

        for node in graph.nodes.iter_mut() {
            if self.persistence.is_unsaved(&node.id) {
                node.locked = false;
                node.unsaved = true;
            }
        }
        if let Some(pin) = self.selection.pin() {
            let styles = self.adapter.styles();
            match pin.kind {
                PinKind::Node => {
                    if let Some(node) = graph.node_mut(&pin.id) {
                        node.style = styles.highlighted_node(node.style);
                    }
                }
                PinKind::Edge => {
                    if let Some(edge) = graph.edge_mut(&pin.id) {
                        edge.style = styles.highlighted_edge(edge.style);
                    }
                }
            }
        }

        engine.set_data(graph);
        if !self.fitted && !engine.graph().is_empty() {
            engine.fit();
            self.fitted = true;
        }
    }

    /// Copy engine-side positions and lock flags back into the snapshot,
    /// so a rebuild keeps what the user did.
    fn sync_snapshot(&mut self) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        let positions: HashMap<NodeId, (f32, f32)> = engine
            .all_positions()
            .into_iter()
            .map(|update| (update.node_id, (update.x, update.y)))
            .collect();
        let locks: HashMap<&str, bool> = engine
            .graph()
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), node.locked))
            .collect();

        for node in self.snapshot.nodes.iter_mut() {
            if let Some(&(x, y)) = positions.get(&node.id) {
                node.x = Some(x);
                node.y = Some(y);
            }
            if let Some(&locked) = locks.get(node.id.as_str()) {
                node.locked = locked;
            }
        }
    }

    /// Route one engine event through the controllers.
    ///
    /// Returns a batch when a drag finished and its positions must be saved.
    pub fn handle(&mut self, event: EngineEvent) -> Option<PositionBatch> {
        let Some(engine) = self.engine.as_mut() else {
            tracing::debug!(?event, "Engine event without a mounted engine");
            return None;
        };

        match event {
            EngineEvent::Click(hit) => {
                let outcome = self.selection.click(&hit, engine.graph());
                self.publish(outcome);
                None
            }
            EngineEvent::DoubleClick(hit) => {
                self.navigation
                    .fire(&hit, engine.graph(), &self.on_open_route);
                None
            }
            EngineEvent::DragStart(nodes) => {
                self.persistence.drag_start(&nodes, engine);
                None
            }
            EngineEvent::DragEnd(nodes) => {
                let batch = self.persistence.drag_end(&nodes, &*engine);
                self.sync_snapshot();
                batch
            }
        }
    }

    fn publish(&mut self, outcome: SelectionOutcome) {
        self.apply_highlight(&outcome.highlight);
        if let Some(emit) = outcome.emit {
            self.on_select.invoke(emit.into_payload());
        }
    }

    fn apply_highlight(&mut self, change: &HighlightChange) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let styles = self.adapter.styles();

        if let Some(pin) = &change.clear {
            match pin.kind {
                PinKind::Node => {
                    if let Some(kind) = engine.graph().node(&pin.id).map(|n| n.kind.clone()) {
                        engine.update_node(&pin.id, NodePatch::style(styles.node_style(&kind)));
                    }
                }
                PinKind::Edge => {
                    if let Some(kind) = engine.graph().edge(&pin.id).map(|e| e.kind.clone()) {
                        let patch = EdgePatch {
                            style: Some(styles.edge_style(&kind)),
                        };
                        engine.update_edge(&pin.id, patch);
                    }
                }
            }
        }

        if let Some(pin) = &change.apply {
            match pin.kind {
                PinKind::Node => {
                    if let Some(kind) = engine.graph().node(&pin.id).map(|n| n.kind.clone()) {
                        let style = styles.highlighted_node(styles.node_style(&kind));
                        engine.update_node(&pin.id, NodePatch::style(style));
                    }
                }
                PinKind::Edge => {
                    if let Some(kind) = engine.graph().edge(&pin.id).map(|e| e.kind.clone()) {
                        let patch = EdgePatch {
                            style: Some(styles.highlighted_edge(styles.edge_style(&kind))),
                        };
                        engine.update_edge(&pin.id, patch);
                    }
                }
            }
        }
    }

    /// Flip select mode. Returns whether the next click will pin.
    pub fn toggle_select_mode(&mut self) -> bool {
        self.selection.toggle_select_mode()
    }

    /// Flip the global drag lock. Returns whether dragging is now locked.
    pub fn toggle_drag_lock(&mut self) -> bool {
        let locked = self.persistence.toggle_drag_lock();
        tracing::debug!(locked, "Drag lock toggled");
        locked
    }

    /// Clear the pin and tell the details panel nothing is selected.
    pub fn clear_selection(&mut self) {
        let outcome = self.selection.clear();
        self.publish(outcome);
    }

    /// Capture every node's coordinates for saving.
    pub fn save_all(&mut self) -> Option<PositionBatch> {
        let engine = self.engine.as_ref()?;
        self.persistence.save_all(engine)
    }

    /// Apply the backend's answer for a position batch.
    pub fn complete_save(&mut self, batch: u64, result: Result<usize, String>) -> SaveOutcome {
        let Some(engine) = self.engine.as_mut() else {
            return SaveOutcome::Stale;
        };
        let outcome = self
            .persistence
            .complete(batch, result, engine, &mut self.snapshot);
        self.sync_snapshot();
        outcome
    }

    pub fn fit(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.fit();
        }
    }

    /// Show or hide a node kind. Returns whether it is now visible.
    pub fn toggle_node_layer(&mut self, kind: NodeKind) -> bool {
        self.sync_snapshot();
        let visible = self.adapter.filter_mut().toggle_node(kind);
        self.render();
        visible
    }

    /// Show or hide an edge kind. Returns whether it is now visible.
    pub fn toggle_edge_layer(&mut self, kind: EdgeKind) -> bool {
        self.sync_snapshot();
        let visible = self.adapter.filter_mut().toggle_edge(kind);
        self.render();
        visible
    }

    pub fn is_node_layer_visible(&self, kind: &NodeKind) -> bool {
        self.adapter.filter().is_node_visible(kind)
    }

    pub fn is_edge_layer_visible(&self, kind: &EdgeKind) -> bool {
        self.adapter.filter().is_edge_visible(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::engine::Hit;
    use crate::view::canvas::CanvasEngine;
    use plantview_common::{TopologyEdge, TopologyNode};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn snapshot() -> TopologySnapshot {
        TopologySnapshot::new(
            vec![
                TopologyNode::new("odf:1", NodeKind::Odf).at(0.0, 0.0),
                TopologyNode::new("pole:1", NodeKind::Pole).at(80.0, 0.0),
                TopologyNode::new("mufa:1", NodeKind::Mufa).at(80.0, 60.0),
            ],
            vec![
                TopologyEdge::new("s1", "odf:1", "pole:1", EdgeKind::Span),
                TopologyEdge::new("pm1", "pole:1", "mufa:1", EdgeKind::PoleToMufa),
            ],
        )
    }

    fn pane() -> GraphPane<CanvasEngine> {
        let mut pane = GraphPane::new(StyleSheet::route_detail(), SelectionBehavior::route_detail());
        pane.mount(CanvasEngine::default);
        pane
    }

    #[test]
    fn test_mount_creates_engine_once() {
        let mut pane = pane();
        assert!(!pane.mount(CanvasEngine::default));
        assert_eq!(pane.mount_count(), 1);

        pane.unmount();
        assert!(pane.mount(CanvasEngine::default));
        assert_eq!(pane.mount_count(), 2);
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut pane = pane();
        let old = pane.begin_fetch();
        let new = pane.begin_fetch();

        assert!(pane.finish_fetch(new, Ok(snapshot())));
        assert!(!pane.finish_fetch(old, Ok(TopologySnapshot::default())));
        assert_eq!(pane.graph().unwrap().nodes.len(), 3);
        assert!(!pane.is_loading());
    }

    #[test]
    fn test_fetch_error_keeps_graph() {
        let mut pane = pane();
        let generation = pane.begin_fetch();
        pane.finish_fetch(generation, Ok(snapshot()));

        let generation = pane.begin_fetch();
        pane.finish_fetch(generation, Err("HTTP 500".into()));

        assert_eq!(pane.error(), Some("HTTP 500"));
        assert_eq!(pane.graph().unwrap().nodes.len(), 3);
    }

    #[test]
    fn test_pin_survives_layer_toggle() {
        let mut pane = pane();
        pane.load(snapshot());

        pane.toggle_select_mode();
        pane.handle(EngineEvent::Click(Hit::Node("pole:1".into())));
        let pinned_fill = pane.adapter().styles().highlighted_node(
            pane.adapter().styles().node_style(&NodeKind::Pole),
        );
        assert_eq!(pane.graph().unwrap().node("pole:1").unwrap().style, pinned_fill);

        assert!(!pane.toggle_node_layer(NodeKind::Mufa));
        let graph = pane.graph().unwrap();
        assert!(graph.node("mufa:1").is_none());
        assert!(graph.edge("pm1").is_none());
        assert_eq!(graph.node("pole:1").unwrap().style, pinned_fill);
    }

    #[test]
    fn test_clear_restores_kind_style() {
        let mut pane = pane();
        pane.load(snapshot());

        pane.toggle_select_mode();
        pane.handle(EngineEvent::Click(Hit::Edge("s1".into())));
        pane.clear_selection();

        let expected = pane.adapter().styles().edge_style(&EdgeKind::Span);
        assert_eq!(pane.graph().unwrap().edge("s1").unwrap().style, expected);
        assert_eq!(pane.selection_state(), SelectionState::Idle);
    }

    #[test]
    fn test_reset_emits_nothing_selected() {
        let mut pane = pane();
        pane.load(snapshot());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        pane.on_select().set(move |payload| log.borrow_mut().push(payload.is_some()));

        pane.toggle_select_mode();
        pane.handle(EngineEvent::Click(Hit::Node("odf:1".into())));
        pane.reset();

        assert_eq!(*seen.borrow(), vec![true, false]);
        assert!(pane.pin().is_none());
        assert!(pane.graph().unwrap().is_empty());
    }

    #[test]
    fn test_dragged_positions_survive_rebuild() {
        let mut pane = pane();
        pane.load(snapshot());
        let nodes = vec!["pole:1".to_string()];

        pane.handle(EngineEvent::DragStart(nodes.clone()));
        pane.engine_mut().unwrap().drag_by(&nodes, 0.0, 20.0);
        let batch = pane.handle(EngineEvent::DragEnd(nodes)).unwrap();
        pane.complete_save(batch.id, Ok(1));

        pane.toggle_edge_layer(EdgeKind::Span);
        let node = pane.graph().unwrap().node("pole:1").unwrap().clone();
        assert_eq!((node.x, node.y), (Some(80.0), Some(20.0)));
        assert!(node.locked);
    }
}
