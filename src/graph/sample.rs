use std::collections::HashSet;

use super::{RawEdge, RawNode};

const CHAIN_LENGTH: usize = 4;

pub fn synthesize_sample_edges(nodes: &[RawNode]) -> Vec<RawEdge> {
    let mut edges = Vec::new();
    if nodes.len() < 2 {
        return edges;
    }

    let tag_sets = nodes
        .iter()
        .map(|node| node.tags.iter().map(String::as_str).collect::<HashSet<_>>())
        .collect::<Vec<_>>();

    for (first, first_tags) in tag_sets.iter().enumerate() {
        for (second, second_tags) in tag_sets.iter().enumerate().skip(first + 1) {
            if !first_tags.is_disjoint(second_tags) {
                edges.push(RawEdge {
                    source: nodes[first].id.clone(),
                    target: nodes[second].id.clone(),
                    kind: Some("tag-derived".to_owned()),
                    weight: None,
                });
            }
        }
    }

    if edges.is_empty() {
        for pair in nodes.windows(2).take(CHAIN_LENGTH) {
            edges.push(RawEdge {
                source: pair[0].id.clone(),
                target: pair[1].id.clone(),
                kind: Some("reference".to_owned()),
                weight: None,
            });
        }
    }

    tracing::info!(count = edges.len(), "synthesized sample edges");
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RawId;

    #[test]
    fn connects_pages_sharing_a_tag() {
        let nodes = [
            RawNode::new("a").with_tags(["rust"]),
            RawNode::new("b").with_tags(["go"]),
            RawNode::new("c").with_tags(["rust", "go"]),
        ];
        let edges = synthesize_sample_edges(&nodes);
        let pairs = edges
            .iter()
            .map(|edge| (edge.source.to_string(), edge.target.to_string()))
            .collect::<Vec<_>>();
        assert_eq!(
            pairs,
            vec![
                ("a".to_owned(), "c".to_owned()),
                ("b".to_owned(), "c".to_owned())
            ]
        );
        assert!(edges.iter().all(|edge| edge.kind.as_deref() == Some("tag-derived")));
    }

    #[test]
    fn chains_untagged_pages() {
        let nodes = (0..7).map(|i| RawNode::new(i.to_string())).collect::<Vec<_>>();
        let edges = synthesize_sample_edges(&nodes);
        assert_eq!(edges.len(), CHAIN_LENGTH);
        assert_eq!(edges[0].source, RawId::Text("0".to_owned()));
        assert_eq!(edges[3].target, RawId::Text("4".to_owned()));
    }

    #[test]
    fn is_deterministic_and_ignores_single_node() {
        assert!(synthesize_sample_edges(&[RawNode::new("solo")]).is_empty());
        let nodes = [RawNode::new("a"), RawNode::new("b")];
        assert_eq!(synthesize_sample_edges(&nodes), synthesize_sample_edges(&nodes));
    }
}
