use std::collections::{BTreeSet, HashMap, HashSet};

use super::{CanonicalGraph, EdgeKind, GraphEdge, GraphNode, RawEdge, RawNode, UNCATEGORIZED};

pub fn normalize(raw_nodes: &[RawNode], raw_edges: &[RawEdge]) -> CanonicalGraph {
    let mut nodes = Vec::with_capacity(raw_nodes.len());
    let mut index_by_id = HashMap::with_capacity(raw_nodes.len());
    let mut duplicate_nodes = 0usize;

    for raw in raw_nodes {
        let id = raw.id.to_string();
        if id.is_empty() {
            tracing::warn!("skipping node record with an empty id");
            continue;
        }
        if index_by_id.contains_key(&id) {
            duplicate_nodes += 1;
            continue;
        }

        let label = raw
            .label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Node {id}"));

        let category = raw
            .category
            .as_ref()
            .map(|category| category.to_string().trim().to_owned())
            .filter(|category| !category.is_empty())
            .unwrap_or_else(|| UNCATEGORIZED.to_owned());

        let tags = raw
            .tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .map(str::to_owned)
            .collect::<BTreeSet<_>>();

        index_by_id.insert(id.clone(), nodes.len());
        nodes.push(GraphNode {
            id,
            label,
            category,
            tags,
        });
    }

    let mut edges = Vec::with_capacity(raw_edges.len());
    let mut endpoints = Vec::with_capacity(raw_edges.len());
    let mut seen = HashSet::with_capacity(raw_edges.len());
    let mut dangling = 0usize;
    let mut duplicates = 0usize;
    let mut self_loops = 0usize;

    for raw in raw_edges {
        let source = raw.source.to_string();
        let target = raw.target.to_string();

        let (Some(&source_index), Some(&target_index)) =
            (index_by_id.get(&source), index_by_id.get(&target))
        else {
            dangling += 1;
            continue;
        };
        if source_index == target_index {
            self_loops += 1;
            continue;
        }

        let kind = raw
            .kind
            .as_deref()
            .map(EdgeKind::parse)
            .unwrap_or(EdgeKind::Reference);
        if !seen.insert((source_index, target_index, kind.clone())) {
            duplicates += 1;
            continue;
        }
        let id = GraphEdge::edge_id(&source, &target, &kind);

        let weight = raw
            .weight
            .filter(|weight| weight.is_finite() && *weight > 0.0)
            .unwrap_or(1.0);

        edges.push(GraphEdge {
            id,
            source,
            target,
            kind,
            weight,
        });
        endpoints.push((source_index, target_index));
    }

    if dangling + duplicates + self_loops + duplicate_nodes > 0 {
        tracing::warn!(
            dangling,
            duplicates,
            self_loops,
            duplicate_nodes,
            "dropped raw graph records during normalization"
        );
    }
    tracing::debug!(nodes = nodes.len(), edges = edges.len(), "normalized graph");

    CanonicalGraph {
        nodes,
        edges,
        endpoints,
        index_by_id,
    }
}
