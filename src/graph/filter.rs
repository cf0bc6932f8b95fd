use std::collections::BTreeSet;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::{CanonicalGraph, GraphNode};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterQuery {
    pub search_text: String,
    pub selected_tags: BTreeSet<String>,
}

impl FilterQuery {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search_text: text.into(),
            selected_tags: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.search_text.trim().is_empty() && self.selected_tags.is_empty()
    }

    pub fn toggle_tag(&mut self, tag: &str) -> bool {
        if self.selected_tags.remove(tag) {
            false
        } else {
            self.selected_tags.insert(tag.to_owned());
            true
        }
    }

    pub fn clear(&mut self) {
        self.search_text.clear();
        self.selected_tags.clear();
    }
}

/// Filtered view over a canonical graph. Indices refer to the canonical graph it
/// was built from; `links` and `degrees` use local (visible) indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisibleSubgraph {
    nodes: Vec<usize>,
    edges: Vec<usize>,
    links: Vec<(usize, usize)>,
    degrees: Vec<usize>,
}

impl VisibleSubgraph {
    pub fn node_indices(&self) -> &[usize] {
        &self.nodes
    }

    pub fn edge_indices(&self) -> &[usize] {
        &self.edges
    }

    pub fn links(&self) -> &[(usize, usize)] {
        &self.links
    }

    pub fn degrees(&self) -> &[usize] {
        &self.degrees
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn local_index(&self, canonical_index: usize) -> Option<usize> {
        self.nodes.binary_search(&canonical_index).ok()
    }

    pub fn contains_node(&self, graph: &CanonicalGraph, id: &str) -> bool {
        graph
            .index_of(id)
            .and_then(|index| self.local_index(index))
            .is_some()
    }

    pub fn degree_of(&self, graph: &CanonicalGraph, id: &str) -> Option<usize> {
        let local = self.local_index(graph.index_of(id)?)?;
        self.degrees.get(local).copied()
    }

    pub fn visible_nodes<'g>(
        &'g self,
        graph: &'g CanonicalGraph,
    ) -> impl Iterator<Item = &'g GraphNode> + 'g {
        self.nodes.iter().map(|&index| &graph.nodes()[index])
    }

    pub fn identity(&self, graph: &CanonicalGraph) -> SubgraphIdentity {
        let mut node_ids = self
            .nodes
            .iter()
            .map(|&index| graph.nodes()[index].id.clone())
            .collect::<Vec<_>>();
        let mut edge_ids = self
            .edges
            .iter()
            .map(|&index| graph.edges()[index].id.clone())
            .collect::<Vec<_>>();
        node_ids.sort_unstable();
        edge_ids.sort_unstable();
        SubgraphIdentity { node_ids, edge_ids }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubgraphIdentity {
    pub node_ids: Vec<String>,
    pub edge_ids: Vec<String>,
}

impl SubgraphIdentity {
    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }
}

fn node_matches(node: &GraphNode, needle: &str, selected_tags: &BTreeSet<String>) -> bool {
    let text_match = needle.is_empty()
        || node.label.to_lowercase().contains(needle)
        || node.tags.iter().any(|tag| tag.to_lowercase().contains(needle));
    let tag_match =
        selected_tags.is_empty() || node.tags.iter().any(|tag| selected_tags.contains(tag));
    text_match && tag_match
}

/// Derives the visible subgraph. Node visibility is a per-node predicate, never
/// expanded to neighbours; an edge is visible iff both endpoints are.
pub fn filter(graph: &CanonicalGraph, query: &FilterQuery) -> VisibleSubgraph {
    let needle = query.search_text.trim().to_lowercase();
    let mut local_by_canonical = vec![None; graph.node_count()];
    let mut nodes = Vec::new();

    for (index, node) in graph.nodes().iter().enumerate() {
        if node_matches(node, &needle, &query.selected_tags) {
            local_by_canonical[index] = Some(nodes.len());
            nodes.push(index);
        }
    }

    let mut degrees = vec![0usize; nodes.len()];
    let mut edges = Vec::new();
    let mut links = Vec::new();
    for (index, &(source, target)) in graph.endpoints().iter().enumerate() {
        if let (Some(Some(source)), Some(Some(target))) = (
            local_by_canonical.get(source).copied(),
            local_by_canonical.get(target).copied(),
        ) {
            degrees[source] += 1;
            degrees[target] += 1;
            edges.push(index);
            links.push((source, target));
        }
    }

    VisibleSubgraph {
        nodes,
        edges,
        links,
        degrees,
    }
}

pub fn available_tags(graph: &CanonicalGraph) -> Vec<String> {
    graph
        .nodes()
        .iter()
        .flat_map(|node| node.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

pub fn rank_tags(tags: &[String], needle: &str, limit: usize) -> Vec<String> {
    let needle = needle.trim();
    if needle.is_empty() {
        let mut sorted = tags.to_vec();
        sorted.sort();
        sorted.truncate(limit);
        return sorted;
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = tags
        .iter()
        .filter_map(|tag| fuzzy_match_score(&matcher, tag, needle).map(|score| (score, tag)))
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, tag)| tag.clone())
        .collect()
}
