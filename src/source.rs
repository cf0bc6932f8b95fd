use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use serde::{Deserialize, Serialize};

use crate::error::DataFetchError;
use crate::graph::{RawGraph, RawId, synthesize_sample_edges};

pub const GRAPH_FILE: &str = "graph.json";
pub const PAGES_FILE: &str = "pages.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: RawId,
    #[serde(default, alias = "name")]
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub trait GraphSource {
    fn fetch_graph_data(&self, workspace_id: &str) -> Result<RawGraph, DataFetchError>;

    fn fetch_page_metadata(&self, workspace_id: &str) -> Result<Vec<PageRecord>, DataFetchError>;
}

#[derive(Clone, Debug)]
pub struct JsonDirSource {
    root: PathBuf,
}

impl JsonDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn workspace_dir(&self, workspace_id: &str) -> Result<PathBuf, DataFetchError> {
        let id = Path::new(workspace_id);
        let mut components = id.components();
        let single_normal = matches!(components.next(), Some(Component::Normal(_)))
            && components.next().is_none();
        if !single_normal {
            return Err(DataFetchError::Workspace(workspace_id.to_owned()));
        }

        let dir = self.root.join(id);
        if !dir.is_dir() {
            return Err(DataFetchError::Workspace(workspace_id.to_owned()));
        }
        Ok(dir)
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, DataFetchError> {
    let raw = std::fs::read_to_string(path).map_err(|error| DataFetchError::io(path, &error))?;
    serde_json::from_str(&raw).map_err(|error| DataFetchError::parse(path, &error))
}

impl GraphSource for JsonDirSource {
    fn fetch_graph_data(&self, workspace_id: &str) -> Result<RawGraph, DataFetchError> {
        let path = self.workspace_dir(workspace_id)?.join(GRAPH_FILE);
        read_json(&path)
    }

    fn fetch_page_metadata(&self, workspace_id: &str) -> Result<Vec<PageRecord>, DataFetchError> {
        let path = self.workspace_dir(workspace_id)?.join(PAGES_FILE);
        match std::fs::metadata(&path) {
            Err(error) if error.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no page metadata, tags come from graph data only");
                Ok(Vec::new())
            }
            _ => read_json(&path),
        }
    }
}

pub fn load_workspace(
    source: &dyn GraphSource,
    workspace_id: &str,
) -> Result<RawGraph, DataFetchError> {
    let mut graph = source.fetch_graph_data(workspace_id)?;
    let pages = source.fetch_page_metadata(workspace_id)?;

    let pages_by_id = pages
        .iter()
        .map(|page| (page.id.to_string(), page))
        .collect::<HashMap<_, _>>();

    let mut enriched = 0usize;
    for node in &mut graph.nodes {
        let Some(page) = pages_by_id.get(node.id.to_string().as_str()) else {
            continue;
        };
        for tag in &page.tags {
            if !node.tags.contains(tag) {
                node.tags.push(tag.clone());
            }
        }
        if node.label.as_deref().is_none_or(|label| label.trim().is_empty()) {
            node.label = page.title.clone();
        }
        enriched += 1;
    }

    tracing::info!(
        workspace = workspace_id,
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        pages = pages.len(),
        enriched,
        "loaded workspace"
    );
    Ok(graph)
}

#[derive(Clone)]
pub struct LoadRequest {
    pub source: Arc<dyn GraphSource + Send + Sync>,
    pub workspace_id: String,
    pub sample_edges: bool,
}

impl LoadRequest {
    pub fn run(&self) -> Result<RawGraph, DataFetchError> {
        let mut graph = load_workspace(self.source.as_ref(), &self.workspace_id)?;
        if self.sample_edges && graph.edges.is_empty() {
            graph.edges = synthesize_sample_edges(&graph.nodes);
        }
        Ok(graph)
    }
}

/// Runs `request` on a worker thread. The receiver yields exactly one result.
pub fn spawn_load(request: LoadRequest) -> Receiver<Result<RawGraph, DataFetchError>> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let result = request.run();
        if let Err(error) = &result {
            tracing::warn!(%error, workspace = %request.workspace_id, "workspace load failed");
        }
        let _ = tx.send(result);
    });

    rx
}
