use eframe::egui::{Pos2, Rect, vec2};

use page_graph::graph::{RawEdge, RawGraph, RawNode};
use page_graph::interaction::{PointerButton, PointerEvent};
use page_graph::physics::{ReseedOutcome, SimulationPhase};
use page_graph::render::{EmptyReason, FrameStatus};
use page_graph::{GraphConfig, GraphView};

fn viewport() -> Rect {
    Rect::from_min_size(Pos2::ZERO, vec2(1000.0, 700.0))
}

fn chain() -> RawGraph {
    let ids = ["A", "B", "C", "D", "E"];
    RawGraph {
        nodes: ids
            .iter()
            .map(|id| RawNode::new(*id).with_label(*id))
            .collect(),
        edges: ids
            .windows(2)
            .map(|pair| RawEdge::new(pair[0], pair[1]))
            .collect(),
    }
}

#[test]
fn search_shows_only_matching_node_without_neighbours() {
    let mut view = GraphView::new(GraphConfig::default());
    view.load(Ok(chain()));
    view.set_search_text("C");

    let frame = view.frame(viewport());
    assert!(frame.is_ready());
    assert_eq!(
        frame.nodes.iter().map(|node| node.id.as_str()).collect::<Vec<_>>(),
        vec!["C"]
    );
    assert!(frame.edges.is_empty());
    assert_eq!(
        view.last_reseed(),
        Some(ReseedOutcome::Started { nodes: 1, links: 0 })
    );
}

#[test]
fn empty_states_are_distinct_from_errors() {
    let mut view = GraphView::new(GraphConfig::default());
    view.load(Ok(RawGraph::default()));
    assert_eq!(
        view.frame(viewport()).status,
        FrameStatus::Empty(EmptyReason::NoData)
    );
    assert_eq!(view.last_reseed(), Some(ReseedOutcome::NothingToSimulate));

    view.load(Ok(chain()));
    view.set_search_text("zebra");
    assert_eq!(
        view.frame(viewport()).status,
        FrameStatus::Empty(EmptyReason::NoSearchMatches)
    );
    assert_eq!(view.simulation().phase(), SimulationPhase::Idle);

    view.set_search_text("");
    assert_eq!(view.visible().node_count(), 5);
    assert_eq!(view.visible().edge_count(), 4);
}

#[test]
fn layout_settles_and_drag_moves_neighbours() {
    let mut view = GraphView::new(GraphConfig::default());
    view.load(Ok(chain()));
    for _ in 0..600 {
        view.tick();
    }
    assert!(!view.is_animating());
    let before = view.simulation().position_of("B").unwrap();

    let frame = view.frame(viewport());
    let a = frame.nodes.iter().find(|node| node.id == "A").unwrap().center;
    view.handle_pointer(
        PointerEvent::Down {
            pos: a,
            button: PointerButton::Primary,
        },
        viewport(),
    );
    assert_eq!(view.simulation().phase(), SimulationPhase::Dragging);

    let target = a + vec2(-250.0, 0.0);
    view.handle_pointer(PointerEvent::Move { pos: target }, viewport());
    for _ in 0..30 {
        view.tick();
    }
    let world = view.transform().screen_to_world(viewport(), target);
    assert_eq!(view.simulation().position_of("A"), Some(world));
    assert_ne!(view.simulation().position_of("B"), Some(before));

    view.handle_pointer(PointerEvent::FocusLost, viewport());
    assert!(!view.simulation().is_pinned("A"));
    assert_eq!(view.selection(), None);
}
