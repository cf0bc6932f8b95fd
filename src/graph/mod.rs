use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

mod filter;
mod normalize;
mod sample;

pub use filter::{FilterQuery, SubgraphIdentity, VisibleSubgraph, available_tags, filter, rank_tags};
pub use normalize::normalize;
pub use sample::synthesize_sample_edges;

pub const UNCATEGORIZED: &str = "uncategorized";

/// Identifier as it arrives from the backend: page ids are strings, older exports use integers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Integer(i64),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => f.write_str(value),
            Self::Integer(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for RawId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub id: RawId,
    #[serde(default, alias = "name", alias = "title")]
    pub label: Option<String>,
    #[serde(default, alias = "group")]
    pub category: Option<RawId>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RawNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: RawId::Text(id.into()),
            label: None,
            category: None,
            tags: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(RawId::Text(category.into()));
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawEdge {
    #[serde(alias = "from")]
    pub source: RawId,
    #[serde(alias = "to")]
    pub target: RawId,
    #[serde(default, rename = "type", alias = "link_type", alias = "kind")]
    pub kind: Option<String>,
    #[serde(default, alias = "value")]
    pub weight: Option<f32>,
}

impl RawEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: RawId::Text(source.into()),
            target: RawId::Text(target.into()),
            kind: None,
            weight: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = Some(weight);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGraph {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default, alias = "links")]
    pub edges: Vec<RawEdge>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeKind {
    Reference,
    Backlink,
    AiSuggested,
    TagDerived,
    Other(String),
}

impl EdgeKind {
    pub fn parse(raw: &str) -> Self {
        let key = raw.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match key.as_str() {
            "" | "reference" | "manual-reference" | "manual" => Self::Reference,
            "backlink" => Self::Backlink,
            "ai-suggested" | "ai" | "suggested" => Self::AiSuggested,
            "tag-derived" | "related" | "shared-tags" => Self::TagDerived,
            _ => Self::Other(key),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Reference => "reference",
            Self::Backlink => "backlink",
            Self::AiSuggested => "ai-suggested",
            Self::TagDerived => "tag-derived",
            Self::Other(kind) => kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub category: String,
    pub tags: BTreeSet<String>,
}

impl GraphNode {
    pub fn first_tag(&self) -> Option<&str> {
        self.tags.iter().next().map(String::as_str)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    pub weight: f32,
}

impl GraphEdge {
    /// Endpoint ids are length-prefixed so ids containing `->` or `#` cannot collide.
    pub fn edge_id(source: &str, target: &str, kind: &EdgeKind) -> String {
        format!(
            "{}:{source}->{}:{target}#{}",
            source.len(),
            target.len(),
            kind.as_str()
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CanonicalGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    endpoints: Vec<(usize, usize)>,
    index_by_id: HashMap<String, usize>,
}

impl CanonicalGraph {
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Canonical node indices of each edge's `(source, target)`, parallel to [`Self::edges`].
    pub fn endpoints(&self) -> &[(usize, usize)] {
        &self.endpoints
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
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

    pub fn to_raw(&self) -> RawGraph {
        let nodes = self
            .nodes
            .iter()
            .map(|node| RawNode {
                id: RawId::Text(node.id.clone()),
                label: Some(node.label.clone()),
                category: Some(RawId::Text(node.category.clone())),
                tags: node.tags.iter().cloned().collect(),
            })
            .collect();
        let edges = self
            .edges
            .iter()
            .map(|edge| RawEdge {
                source: RawId::Text(edge.source.clone()),
                target: RawId::Text(edge.target.clone()),
                kind: Some(edge.kind.as_str().to_owned()),
                weight: Some(edge.weight),
            })
            .collect();
        RawGraph { nodes, edges }
    }
}
