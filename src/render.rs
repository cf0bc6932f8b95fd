use eframe::egui::{Color32, Pos2, Rect, Stroke, Vec2, vec2};

use crate::config::{ColorBy, GraphConfig};
use crate::graph::{
    CanonicalGraph, EdgeKind, FilterQuery, GraphNode, UNCATEGORIZED, VisibleSubgraph,
};
use crate::util::{short_label, stable_hash};

const MAX_TAG_DOTS: usize = 3;
const TAG_DOT_RADIUS: f32 = 3.0;
const TAG_DOT_SPACING: f32 = 8.0;
const LABEL_OFFSET: f32 = 4.0;
const LABEL_SIZE: f32 = 12.0;
const CULL_PADDING: f32 = 24.0;

const PALETTE: [Color32; 10] = [
    Color32::from_rgb(31, 119, 180),
    Color32::from_rgb(255, 127, 14),
    Color32::from_rgb(44, 160, 44),
    Color32::from_rgb(214, 39, 40),
    Color32::from_rgb(148, 103, 189),
    Color32::from_rgb(140, 86, 75),
    Color32::from_rgb(227, 119, 194),
    Color32::from_rgb(127, 127, 127),
    Color32::from_rgb(188, 189, 34),
    Color32::from_rgb(23, 190, 207),
];

const NODE_OUTLINE: Color32 = Color32::from_rgb(255, 255, 255);
const SELECTED_OUTLINE: Color32 = Color32::from_rgb(245, 206, 93);
const HOVERED_OUTLINE: Color32 = Color32::from_rgb(255, 164, 101);
const LABEL_COLOR: Color32 = Color32::from_gray(238);

pub fn node_radius(degree: usize, floor: f32) -> f32 {
    floor.max((degree as f32 * 50.0).sqrt())
}

pub fn palette_color(key: &str) -> Color32 {
    PALETTE[(stable_hash(key) % PALETTE.len() as u64) as usize]
}

pub fn color_key(node: &GraphNode, color_by: ColorBy) -> &str {
    match color_by {
        ColorBy::Category => &node.category,
        ColorBy::FirstTag => node.first_tag().unwrap_or(UNCATEGORIZED),
    }
}

pub fn node_color(node: &GraphNode, color_by: ColorBy) -> Color32 {
    palette_color(color_key(node, color_by))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub pan: Vec2,
    pub zoom: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Transform {
    pub fn world_to_screen(self, viewport: Rect, world: Vec2) -> Pos2 {
        viewport.center() + self.pan + world * self.zoom
    }

    pub fn screen_to_world(self, viewport: Rect, screen: Pos2) -> Vec2 {
        (screen - viewport.center() - self.pan) / self.zoom
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStyle {
    pub color: Color32,
    pub line: LineStyle,
    pub extra_width: f32,
}

pub fn edge_style(kind: &EdgeKind) -> EdgeStyle {
    match kind {
        EdgeKind::AiSuggested => EdgeStyle {
            color: Color32::from_rgb(59, 130, 246),
            line: LineStyle::Dashed,
            extra_width: 1.0,
        },
        EdgeKind::TagDerived => EdgeStyle {
            color: Color32::from_rgb(16, 185, 129),
            line: LineStyle::Dotted,
            extra_width: 0.0,
        },
        EdgeKind::Backlink => EdgeStyle {
            color: Color32::from_gray(204),
            line: LineStyle::Solid,
            extra_width: 0.0,
        },
        EdgeKind::Reference | EdgeKind::Other(_) => EdgeStyle {
            color: Color32::from_gray(153),
            line: LineStyle::Solid,
            extra_width: 0.0,
        },
    }
}

pub fn edge_width(weight: f32) -> f32 {
    weight.max(0.0).sqrt()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmptyReason {
    NoData,
    NoSearchMatches,
    AllFilteredOut,
}

impl EmptyReason {
    pub fn message(self) -> &'static str {
        match self {
            Self::NoData => "No pages to display yet. Create pages and link them to see the graph.",
            Self::NoSearchMatches => "No pages match your search.",
            Self::AllFilteredOut => "No pages match the selected tags.",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FrameStatus {
    Loading,
    Error(String),
    Empty(EmptyReason),
    Ready,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TagDot {
    pub center: Pos2,
    pub radius: f32,
    pub color: Color32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeShape {
    pub id: String,
    pub center: Pos2,
    pub radius: f32,
    pub fill: Color32,
    pub stroke: Stroke,
    pub selected: bool,
    pub hovered: bool,
    pub tag_dots: Vec<TagDot>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeLine {
    pub id: String,
    pub from: Pos2,
    pub to: Pos2,
    pub width: f32,
    pub color: Color32,
    pub line: LineStyle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub node_id: String,
    pub anchor: Pos2,
    pub text: String,
    pub size: f32,
    pub color: Color32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub nodes: usize,
    pub edges: usize,
    pub zoom_percent: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DrawableFrame {
    pub status: FrameStatus,
    pub edges: Vec<EdgeLine>,
    /// In draw order; later shapes are on top.
    pub nodes: Vec<NodeShape>,
    pub labels: Vec<Label>,
    pub stats: FrameStats,
}

impl DrawableFrame {
    fn with_status(status: FrameStatus) -> Self {
        Self {
            status,
            edges: Vec::new(),
            nodes: Vec::new(),
            labels: Vec::new(),
            stats: FrameStats::default(),
        }
    }

    pub fn loading() -> Self {
        Self::with_status(FrameStatus::Loading)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_status(FrameStatus::Error(message.into()))
    }

    pub fn is_ready(&self) -> bool {
        self.status == FrameStatus::Ready
    }
}

pub struct Scene<'a> {
    pub graph: &'a CanonicalGraph,
    pub visible: &'a VisibleSubgraph,
    pub query: &'a FilterQuery,
    /// Parallel to `visible.node_indices()`.
    pub positions: &'a [Vec2],
    pub config: &'a GraphConfig,
}

pub fn render(
    scene: &Scene<'_>,
    transform: Transform,
    viewport: Rect,
    selection: Option<&str>,
    hover: Option<&str>,
) -> DrawableFrame {
    let zoom_percent = (transform.zoom * 100.0).round().max(0.0) as u32;

    if scene.graph.is_empty() {
        return DrawableFrame::with_status(FrameStatus::Empty(EmptyReason::NoData));
    }
    if scene.visible.is_empty() {
        let reason = if scene.query.search_text.trim().is_empty() {
            EmptyReason::AllFilteredOut
        } else {
            EmptyReason::NoSearchMatches
        };
        let mut frame = DrawableFrame::with_status(FrameStatus::Empty(reason));
        frame.stats.zoom_percent = zoom_percent;
        return frame;
    }

    let config = scene.config;
    let zoom = transform.zoom;
    let screen = |local: usize| {
        scene
            .positions
            .get(local)
            .map(|world| transform.world_to_screen(viewport, *world))
    };
    let culling_rect = viewport.expand(CULL_PADDING);

    let mut edges = Vec::with_capacity(scene.visible.edge_count());
    for (&(source, target), &edge_index) in scene
        .visible
        .links()
        .iter()
        .zip(scene.visible.edge_indices())
    {
        let (Some(from), Some(to)) = (screen(source), screen(target)) else {
            continue;
        };
        if !edge_visible(culling_rect, from, to) {
            continue;
        }
        let edge = &scene.graph.edges()[edge_index];
        let style = edge_style(&edge.kind);
        edges.push(EdgeLine {
            id: edge.id.clone(),
            from,
            to,
            width: (edge_width(edge.weight) + style.extra_width) * zoom,
            color: style.color,
            line: style.line,
        });
    }

    let mut nodes = Vec::with_capacity(scene.visible.node_count());
    let mut labels = Vec::new();
    for ((local, node), &degree) in scene
        .visible
        .visible_nodes(scene.graph)
        .enumerate()
        .zip(scene.visible.degrees())
    {
        let Some(center) = screen(local) else {
            continue;
        };
        let radius = node_radius(degree, config.node_size_floor) * zoom;
        if !circle_visible(culling_rect, center, radius) {
            continue;
        }

        let selected = selection == Some(node.id.as_str());
        let hovered = hover == Some(node.id.as_str());
        let stroke = if selected {
            Stroke::new(3.0, SELECTED_OUTLINE)
        } else if hovered {
            Stroke::new(2.5, HOVERED_OUTLINE)
        } else {
            Stroke::new(1.5, NODE_OUTLINE)
        };

        let tag_dots = node
            .tags
            .iter()
            .take(MAX_TAG_DOTS)
            .enumerate()
            .map(|(slot, tag)| {
                let offset = (slot as f32 - 1.0) * TAG_DOT_SPACING * zoom;
                TagDot {
                    center: center + vec2(offset, -(radius + TAG_DOT_RADIUS * 2.0 * zoom)),
                    radius: TAG_DOT_RADIUS * zoom,
                    color: palette_color(tag),
                }
            })
            .collect();

        if config.show_labels || selected || hovered {
            labels.push(Label {
                node_id: node.id.clone(),
                anchor: center + vec2(radius + LABEL_OFFSET * zoom, 0.0),
                text: short_label(&node.label),
                size: LABEL_SIZE * zoom.sqrt(),
                color: LABEL_COLOR,
            });
        }

        nodes.push(NodeShape {
            id: node.id.clone(),
            center,
            radius,
            fill: node_color(node, config.color_by),
            stroke,
            selected,
            hovered,
            tag_dots,
        });
    }

    // Highlighted nodes are drawn, and hit, above their neighbours.
    nodes.sort_by_key(|shape| (shape.selected, shape.hovered));

    DrawableFrame {
        status: FrameStatus::Ready,
        edges,
        nodes,
        labels,
        stats: FrameStats {
            nodes: scene.visible.node_count(),
            edges: scene.visible.edge_count(),
            zoom_percent,
        },
    }
}

pub fn hit_test(frame: &DrawableFrame, screen_pos: Pos2) -> Option<&str> {
    frame
        .nodes
        .iter()
        .rev()
        .find(|shape| shape.center.distance(screen_pos) <= shape.radius)
        .map(|shape| shape.id.as_str())
}

fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

fn edge_visible(rect: Rect, start: Pos2, end: Pos2) -> bool {
    if rect.contains(start) || rect.contains(end) {
        return true;
    }
    if start.x.max(end.x) < rect.left()
        || start.x.min(end.x) > rect.right()
        || start.y.max(end.y) < rect.top()
        || start.y.min(end.y) > rect.bottom()
    {
        return false;
    }

    let corners = [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
    ];
    (0..4).any(|side| segments_intersect(start, end, corners[side], corners[(side + 1) % 4]))
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
        let oa = a - o;
        let ob = b - o;
        (oa.x * ob.y) - (oa.y * ob.x)
    }

    let c1 = cross(a1, a2, b1);
    let c2 = cross(a1, a2, b2);
    let c3 = cross(b1, b2, a1);
    let c4 = cross(b1, b2, a2);

    (c1 <= 0.0 && c2 >= 0.0 || c1 >= 0.0 && c2 <= 0.0)
        && (c3 <= 0.0 && c4 >= 0.0 || c3 >= 0.0 && c4 <= 0.0)
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;
    use crate::graph::{RawEdge, RawNode, filter, normalize};

    fn viewport() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0))
    }

    fn workspace() -> CanonicalGraph {
        let nodes = [
            RawNode::new("a")
                .with_label("Architecture decision records")
                .with_category("eng")
                .with_tags(["adr", "rust", "design", "infra"]),
            RawNode::new("b")
                .with_label("Borrowing")
                .with_category("eng")
                .with_tags(["rust"]),
            RawNode::new("c").with_label("Cooking").with_category("life"),
        ];
        let edges = [
            RawEdge::new("a", "b").with_kind("ai_suggested").with_weight(4.0),
            RawEdge::new("b", "c"),
        ];
        normalize(&nodes, &edges)
    }

    fn frame_for(
        graph: &CanonicalGraph,
        query: &FilterQuery,
        config: &GraphConfig,
        selection: Option<&str>,
    ) -> DrawableFrame {
        let visible = filter(graph, query);
        let positions = (0..visible.node_count())
            .map(|i| vec2(i as f32 * 100.0 - 100.0, 0.0))
            .collect::<Vec<_>>();
        let scene = Scene {
            graph,
            visible: &visible,
            query,
            positions: &positions,
            config,
        };
        render(&scene, Transform::default(), viewport(), selection, None)
    }

    #[test]
    fn radius_has_floor_and_grows_with_degree() {
        assert_eq!(node_radius(0, 12.0), 12.0);
        assert_eq!(node_radius(2, 12.0), 12.0);
        assert!(node_radius(10, 12.0) > 12.0);
        let radii = (0..20).map(|degree| node_radius(degree, 5.0)).collect::<Vec<_>>();
        assert!(radii.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn colour_is_stable_across_unrelated_filter_changes() {
        let graph = workspace();
        let config = GraphConfig::default();
        let before = frame_for(&graph, &FilterQuery::default(), &config, None);
        let after = frame_for(&graph, &FilterQuery::search("b"), &config, None);

        let fill = |frame: &DrawableFrame| {
            frame
                .nodes
                .iter()
                .find(|shape| shape.id == "b")
                .map(|shape| shape.fill)
        };
        assert!(fill(&before).is_some());
        assert_eq!(fill(&before), fill(&after));
    }

    #[test]
    fn nodes_of_one_category_share_a_colour() {
        let graph = workspace();
        let a = graph.node("a").unwrap();
        let b = graph.node("b").unwrap();
        assert_eq!(node_color(a, ColorBy::Category), node_color(b, ColorBy::Category));
        assert_eq!(node_color(a, ColorBy::FirstTag), palette_color("adr"));
    }

    #[test]
    fn empty_frames_carry_a_reason() {
        let config = GraphConfig::default();
        let empty = CanonicalGraph::default();
        let frame = frame_for(&empty, &FilterQuery::default(), &config, None);
        assert_eq!(frame.status, FrameStatus::Empty(EmptyReason::NoData));
        assert!(frame.nodes.is_empty() && frame.edges.is_empty());

        let graph = workspace();
        let frame = frame_for(&graph, &FilterQuery::search("nothing like this"), &config, None);
        assert_eq!(frame.status, FrameStatus::Empty(EmptyReason::NoSearchMatches));

        let mut query = FilterQuery::default();
        query.toggle_tag("unused");
        let frame = frame_for(&graph, &query, &config, None);
        assert_eq!(frame.status, FrameStatus::Empty(EmptyReason::AllFilteredOut));
    }

    #[test]
    fn edge_style_follows_kind_and_width_follows_weight() {
        let graph = workspace();
        let frame = frame_for(&graph, &FilterQuery::default(), &GraphConfig::default(), None);
        assert_eq!(frame.stats.edges, 2);

        let suggested = frame.edges.iter().find(|edge| edge.id.ends_with("ai-suggested")).unwrap();
        let reference = frame.edges.iter().find(|edge| edge.id.ends_with("reference")).unwrap();
        assert_eq!(suggested.line, LineStyle::Dashed);
        assert_eq!(reference.line, LineStyle::Solid);
        assert_eq!(suggested.width, 3.0);
        assert_eq!(reference.width, 1.0);
        assert!(edge_width(9.0) > edge_width(4.0));
    }

    #[test]
    fn tag_dots_are_capped_and_labels_truncated() {
        let graph = workspace();
        let frame = frame_for(&graph, &FilterQuery::default(), &GraphConfig::default(), None);
        let a = frame.nodes.iter().find(|shape| shape.id == "a").unwrap();
        assert_eq!(a.tag_dots.len(), MAX_TAG_DOTS);
        let label = frame.labels.iter().find(|label| label.node_id == "a").unwrap();
        assert_eq!(label.text, "Architecture de...");
    }

    #[test]
    fn hidden_labels_still_show_for_selection() {
        let graph = workspace();
        let config = GraphConfig {
            show_labels: false,
            ..GraphConfig::default()
        };
        let frame = frame_for(&graph, &FilterQuery::default(), &config, Some("c"));
        assert_eq!(frame.labels.len(), 1);
        assert_eq!(frame.labels[0].node_id, "c");
        assert_eq!(frame.nodes.last().map(|shape| shape.id.as_str()), Some("c"));
    }

    #[test]
    fn hit_test_targets_node_shapes_not_labels() {
        let graph = workspace();
        let frame = frame_for(&graph, &FilterQuery::default(), &GraphConfig::default(), None);
        let b = frame.nodes.iter().find(|shape| shape.id == "b").unwrap();
        assert_eq!(hit_test(&frame, b.center), Some("b"));
        assert_eq!(hit_test(&frame, b.center + vec2(b.radius - 0.5, 0.0)), Some("b"));

        let label = frame.labels.iter().find(|label| label.node_id == "b").unwrap();
        assert_eq!(hit_test(&frame, label.anchor + vec2(20.0, 0.0)), None);
        assert_eq!(hit_test(&frame, pos2(5.0, 5.0)), None);
    }

    #[test]
    fn hit_test_prefers_top_most_shape() {
        let frame = DrawableFrame {
            nodes: ["under", "over"]
                .map(|id| NodeShape {
                    id: id.to_owned(),
                    center: pos2(50.0, 50.0),
                    radius: 10.0,
                    fill: PALETTE[0],
                    stroke: Stroke::NONE,
                    selected: false,
                    hovered: false,
                    tag_dots: Vec::new(),
                })
                .to_vec(),
            ..DrawableFrame::with_status(FrameStatus::Ready)
        };
        assert_eq!(hit_test(&frame, pos2(52.0, 50.0)), Some("over"));
    }

    #[test]
    fn transform_maps_world_origin_to_viewport_centre() {
        let transform = Transform {
            pan: vec2(10.0, -20.0),
            zoom: 2.0,
        };
        let screen = transform.world_to_screen(viewport(), vec2(5.0, 5.0));
        assert_eq!(screen, pos2(420.0, 290.0));
        assert_eq!(transform.screen_to_world(viewport(), screen), vec2(5.0, 5.0));
    }

    #[test]
    fn off_screen_nodes_are_culled_but_counted() {
        let graph = workspace();
        let query = FilterQuery::default();
        let config = GraphConfig::default();
        let visible = filter(&graph, &query);
        let positions = vec![vec2(0.0, 0.0), vec2(5_000.0, 0.0), vec2(5_100.0, 0.0)];
        let scene = Scene {
            graph: &graph,
            visible: &visible,
            query: &query,
            positions: &positions,
            config: &config,
        };
        let frame = render(&scene, Transform::default(), viewport(), None, None);
        assert_eq!(frame.nodes.len(), 1);
        assert_eq!(frame.stats.nodes, 3);
        assert_eq!(frame.edges.len(), 1);
    }
}
