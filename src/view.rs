use eframe::egui::Rect;

use crate::config::{GraphConfig, LiveConfig};
use crate::error::DataFetchError;
use crate::graph::{
    CanonicalGraph, FilterQuery, GraphNode, RawGraph, SubgraphIdentity, VisibleSubgraph,
    available_tags, filter, normalize,
};
use crate::interaction::{Command, Interaction, PointerEvent};
use crate::physics::{ReseedOutcome, Simulation, SimulationPhase, TickReport};
use crate::render::{DrawableFrame, Scene, Transform, render};

#[derive(Clone, Debug, PartialEq)]
pub enum ViewStatus {
    Loading,
    Failed(DataFetchError),
    Ready,
}

#[derive(Clone, Copy, Debug)]
pub struct NodeDetails<'a> {
    pub node: &'a GraphNode,
    pub connections: usize,
}

pub struct GraphView {
    config: GraphConfig,
    status: ViewStatus,
    graph: CanonicalGraph,
    tags: Vec<String>,
    query: FilterQuery,
    visible: VisibleSubgraph,
    identity: SubgraphIdentity,
    simulation: Simulation,
    interaction: Interaction,
    on_node_activated: Option<Box<dyn FnMut(&str)>>,
    last_reseed: Option<ReseedOutcome>,
}

impl GraphView {
    pub fn new(config: GraphConfig) -> Self {
        let config = config.sanitized();
        Self {
            config,
            status: ViewStatus::Loading,
            graph: CanonicalGraph::default(),
            tags: Vec::new(),
            query: FilterQuery::default(),
            visible: VisibleSubgraph::default(),
            identity: SubgraphIdentity::default(),
            simulation: Simulation::new(config.forces()),
            interaction: Interaction::new(&config),
            on_node_activated: None,
            last_reseed: None,
        }
    }

    pub fn set_on_node_activated(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_node_activated = Some(Box::new(callback));
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    pub fn graph(&self) -> &CanonicalGraph {
        &self.graph
    }

    pub fn visible(&self) -> &VisibleSubgraph {
        &self.visible
    }

    pub fn query(&self) -> &FilterQuery {
        &self.query
    }

    pub fn available_tags(&self) -> &[String] {
        &self.tags
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn transform(&self) -> Transform {
        self.interaction.transform()
    }

    pub fn selection(&self) -> Option<&str> {
        self.interaction.selection()
    }

    pub fn last_reseed(&self) -> Option<ReseedOutcome> {
        self.last_reseed
    }

    pub fn selected_details(&self) -> Option<NodeDetails<'_>> {
        let id = self.interaction.selection()?;
        Some(NodeDetails {
            node: self.graph.node(id)?,
            connections: self.visible.degree_of(&self.graph, id)?,
        })
    }

    pub fn begin_loading(&mut self) {
        self.status = ViewStatus::Loading;
        self.replace_graph(CanonicalGraph::default());
    }

    pub fn load(&mut self, result: Result<RawGraph, DataFetchError>) {
        match result {
            Ok(raw) => {
                let graph = normalize(&raw.nodes, &raw.edges);
                self.status = ViewStatus::Ready;
                self.replace_graph(graph);
            }
            Err(error) => {
                tracing::warn!(%error, "graph data unavailable");
                self.status = ViewStatus::Failed(error);
                self.replace_graph(CanonicalGraph::default());
            }
        }
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.query.search_text == text {
            return;
        }
        self.query.search_text = text;
        self.refresh_visible(false);
    }

    pub fn toggle_tag(&mut self, tag: &str) -> bool {
        let selected = self.query.toggle_tag(tag);
        self.refresh_visible(false);
        selected
    }

    pub fn set_query(&mut self, query: FilterQuery) {
        if self.query == query {
            return;
        }
        self.query = query;
        self.refresh_visible(false);
    }

    pub fn clear_filters(&mut self) {
        self.set_query(FilterQuery::default());
    }

    /// Applies new settings. Always reheats, even when only cosmetic fields changed.
    pub fn set_config(&mut self, config: GraphConfig) {
        self.config = config.sanitized();
        self.interaction.set_limits(&self.config);
        self.simulation.reconfigure(self.config.forces());
    }

    pub fn set_live(&mut self, live: LiveConfig) {
        self.set_config(self.config.with_live(live));
    }

    pub fn tick(&mut self) -> TickReport {
        self.simulation.tick()
    }

    pub fn is_animating(&self) -> bool {
        self.simulation.phase() != SimulationPhase::Idle
    }

    pub fn frame(&self, viewport: Rect) -> DrawableFrame {
        match &self.status {
            ViewStatus::Loading => DrawableFrame::loading(),
            ViewStatus::Failed(error) => DrawableFrame::error(error.to_string()),
            ViewStatus::Ready => {
                let scene = Scene {
                    graph: &self.graph,
                    visible: &self.visible,
                    query: &self.query,
                    positions: self.simulation.positions(),
                    config: &self.config,
                };
                render(
                    &scene,
                    self.interaction.transform(),
                    viewport,
                    self.interaction.selection(),
                    self.interaction.hover(),
                )
            }
        }
    }

    pub fn handle_pointer(&mut self, event: PointerEvent, viewport: Rect) {
        let frame = self.frame(viewport);
        let commands = self.interaction.handle(event, &frame, viewport);
        self.apply(commands);
    }

    pub fn zoom_in(&mut self, viewport: Rect) {
        self.interaction.zoom_in(viewport);
    }

    pub fn zoom_out(&mut self, viewport: Rect) {
        self.interaction.zoom_out(viewport);
    }

    pub fn reset_view(&mut self) {
        self.interaction.reset_view();
    }

    pub fn dispose(&mut self) {
        let commands = self.interaction.reset();
        self.apply(commands);
        self.simulation.dispose();
        self.on_node_activated = None;
    }

    fn replace_graph(&mut self, graph: CanonicalGraph) {
        self.tags = available_tags(&graph);
        if !graph.is_empty() {
            self.query
                .selected_tags
                .retain(|tag| self.tags.binary_search(tag).is_ok());
        }
        self.graph = graph;
        // Node indices may have moved even if the id sets did not.
        self.refresh_visible(true);
    }

    fn refresh_visible(&mut self, force_reseed: bool) {
        self.visible = filter(&self.graph, &self.query);
        let identity = self.visible.identity(&self.graph);
        if !force_reseed && identity == self.identity {
            return;
        }
        self.identity = identity;

        let graph = &self.graph;
        let visible = &self.visible;
        let commands = self
            .interaction
            .on_reseed(|id| visible.contains_node(graph, id));
        self.apply(commands);

        let outcome = self.simulation.reseed(&self.graph, &self.visible);
        self.last_reseed = Some(outcome);
    }

    fn apply(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::StartDrag { id, world } => {
                    self.simulation.start_drag(&id, world);
                }
                Command::UpdateDrag { world } => self.simulation.update_drag(world),
                Command::EndDrag => {
                    self.simulation.end_drag();
                }
                Command::Activate(id) => {
                    tracing::info!(id = %id, "node activated");
                    if let Some(callback) = self.on_node_activated.as_mut() {
                        callback(&id);
                    }
                }
            }
        }
    }
}

impl Drop for GraphView {
    fn drop(&mut self) {
        if !self.simulation.is_disposed() {
            self.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use eframe::egui::{Pos2, pos2, vec2};

    use super::*;
    use crate::graph::{RawEdge, RawNode};
    use crate::interaction::PointerButton;
    use crate::render::FrameStatus;

    fn viewport() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0))
    }

    fn raw() -> RawGraph {
        RawGraph {
            nodes: vec![
                RawNode::new("1").with_label("Alpha").with_tags(["rust"]),
                RawNode::new("2").with_label("Beta").with_tags(["rust"]),
                RawNode::new("3").with_label("Gamma"),
            ],
            edges: vec![RawEdge::new("1", "2"), RawEdge::new("2", "3")],
        }
    }

    fn ready() -> GraphView {
        let mut view = GraphView::new(GraphConfig::default());
        view.load(Ok(raw()));
        view
    }

    fn settled() -> GraphView {
        let mut view = ready();
        for _ in 0..60 {
            view.tick();
        }
        view
    }

    fn node_center(view: &GraphView, id: &str) -> Pos2 {
        let frame = view.frame(viewport());
        frame
            .nodes
            .iter()
            .find(|shape| shape.id == id)
            .map(|shape| shape.center)
            .unwrap()
    }

    #[test]
    fn loading_and_failure_frames_keep_simulation_idle() {
        let mut view = GraphView::new(GraphConfig::default());
        assert_eq!(view.frame(viewport()).status, FrameStatus::Loading);
        assert!(!view.is_animating());

        view.load(Err(DataFetchError::Workspace("missing".to_owned())));
        assert_eq!(
            view.frame(viewport()).status,
            FrameStatus::Error("unknown workspace: missing".to_owned())
        );
        assert!(!view.is_animating());

        view.load(Ok(raw()));
        assert!(view.frame(viewport()).is_ready());
        assert!(view.is_animating());
    }

    #[test]
    fn equivalent_query_does_not_reseed() {
        let mut view = ready();
        for _ in 0..10 {
            view.tick();
        }
        let generation = view.simulation().generation();

        view.set_search_text("a");
        assert_eq!(view.simulation().generation(), generation);

        view.set_search_text("A ");
        assert_eq!(view.simulation().generation(), generation);

        view.set_search_text("alpha");
        assert_eq!(view.simulation().generation(), generation + 1);
        assert_eq!(view.visible().node_count(), 1);
    }

    #[test]
    fn toggling_tags_reseeds_with_visible_degrees() {
        let mut view = ready();
        assert!(view.toggle_tag("rust"));
        assert_eq!(view.visible().node_count(), 2);
        assert_eq!(view.simulation().ids(), &["1".to_owned(), "2".to_owned()]);
        assert_eq!(view.visible().degree_of(view.graph(), "2"), Some(1));
        assert_eq!(view.available_tags(), &["rust".to_owned()]);
    }

    #[test]
    fn clicking_a_node_selects_and_notifies_host() {
        let activated = Rc::new(RefCell::new(Vec::new()));
        let mut view = settled();
        let sink = Rc::clone(&activated);
        view.set_on_node_activated(move |id| sink.borrow_mut().push(id.to_owned()));

        let at = node_center(&view, "2");
        view.handle_pointer(
            PointerEvent::Down {
                pos: at,
                button: PointerButton::Primary,
            },
            viewport(),
        );
        assert!(view.simulation().is_pinned("2"));
        view.handle_pointer(
            PointerEvent::Up {
                pos: at,
                button: PointerButton::Primary,
            },
            viewport(),
        );
        assert!(!view.simulation().is_pinned("2"));
        assert_eq!(view.selection(), Some("2"));
        assert_eq!(activated.borrow().as_slice(), &["2".to_owned()]);

        let details = view.selected_details().unwrap();
        assert_eq!(details.node.label, "Beta");
        assert_eq!(details.connections, 2);
    }

    #[test]
    fn filtering_out_a_dragged_node_releases_it() {
        let mut view = settled();
        let at = node_center(&view, "3");
        view.handle_pointer(
            PointerEvent::Down {
                pos: at,
                button: PointerButton::Primary,
            },
            viewport(),
        );
        assert_eq!(view.interaction().dragged_id(), Some("3"));

        view.toggle_tag("rust");
        assert_eq!(view.interaction().dragged_id(), None);
        assert_eq!(view.simulation().dragged_id(), None);
        assert!(view.simulation().position_of("3").is_none());
    }

    #[test]
    fn live_config_change_reheats_cooled_layout() {
        let mut view = ready();
        for _ in 0..2_000 {
            view.tick();
        }
        assert!(!view.is_animating());

        let mut live = view.config().live();
        live.show_labels = false;
        view.set_live(live);
        assert!(view.is_animating());
        assert!(!view.config().show_labels);
    }

    #[test]
    fn disposed_view_ignores_input_and_ticks() {
        let mut view = ready();
        view.dispose();
        let report = view.tick();
        assert_eq!(report.phase, SimulationPhase::Idle);
        view.handle_pointer(PointerEvent::Move { pos: pos2(400.0, 300.0) }, viewport());
        view.set_search_text("beta");
        assert!(view.simulation().positions().is_empty());
    }

    #[test]
    fn reload_drops_selected_tags_that_no_longer_exist() {
        let mut view = ready();
        view.toggle_tag("rust");
        let mut without_tags = raw();
        for node in &mut without_tags.nodes {
            node.tags.clear();
        }
        view.load(Ok(without_tags));
        assert!(view.query().selected_tags.is_empty());
        assert_eq!(view.visible().node_count(), 3);
    }
}
