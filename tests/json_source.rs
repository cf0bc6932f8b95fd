use std::fs;
use std::path::Path;

use page_graph::DataFetchError;
use page_graph::graph::{RawId, normalize};
use page_graph::source::{GraphSource, JsonDirSource, load_workspace};

fn write_workspace(root: &Path, id: &str, graph: &str, pages: Option<&str>) {
    let dir = root.join(id);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("graph.json"), graph).unwrap();
    if let Some(pages) = pages {
        fs::write(dir.join("pages.json"), pages).unwrap();
    }
}

#[test]
fn loads_graph_and_enriches_tags_from_pages() {
    let root = tempfile::tempdir().unwrap();
    write_workspace(
        root.path(),
        "team",
        r#"{
            "nodes": [
                {"id": "p1", "name": "Roadmap", "group": 1},
                {"id": "p2", "name": "Retro"},
                {"id": 3}
            ],
            "links": [
                {"source": "p1", "target": "p2", "type": "ai_suggested", "value": 0.8},
                {"source": "p1", "target": "p2", "type": "ai_suggested"},
                {"source": "p2", "target": "missing"}
            ]
        }"#,
        Some(r#"[{"id": "p1", "title": "Roadmap", "tags": ["planning"]}, {"id": 3, "title": "Ideas"}]"#),
    );

    let source = JsonDirSource::new(root.path());
    let raw = load_workspace(&source, "team").unwrap();
    assert_eq!(raw.nodes[0].tags, vec!["planning"]);
    assert_eq!(raw.nodes[2].id, RawId::Integer(3));
    assert_eq!(raw.nodes[2].label.as_deref(), Some("Ideas"));

    let graph = normalize(&raw.nodes, &raw.edges);
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.node("p1").unwrap().category, "1");
    assert_eq!(graph.node("p2").unwrap().category, "uncategorized");
    assert_eq!(graph.edges()[0].weight, 0.8);
}

#[test]
fn missing_pages_file_is_not_an_error() {
    let root = tempfile::tempdir().unwrap();
    write_workspace(root.path(), "solo", r#"{"nodes": [{"id": "a"}]}"#, None);

    let source = JsonDirSource::new(root.path());
    assert!(source.fetch_page_metadata("solo").unwrap().is_empty());
    let raw = load_workspace(&source, "solo").unwrap();
    assert_eq!(raw.nodes.len(), 1);
    assert!(raw.edges.is_empty());
}

#[test]
fn failures_are_typed() {
    let root = tempfile::tempdir().unwrap();
    write_workspace(root.path(), "broken", "{not json", None);
    fs::create_dir_all(root.path().join("empty")).unwrap();
    let source = JsonDirSource::new(root.path());

    assert!(matches!(
        source.fetch_graph_data("broken"),
        Err(DataFetchError::Parse { .. })
    ));
    assert!(matches!(
        source.fetch_graph_data("empty"),
        Err(DataFetchError::Io { .. })
    ));
    assert_eq!(
        source.fetch_graph_data("nowhere"),
        Err(DataFetchError::Workspace("nowhere".to_owned()))
    );

    write_workspace(root.path(), "bad-pages", r#"{"nodes": []}"#, Some("[1, 2"));
    assert!(matches!(
        load_workspace(&source, "bad-pages"),
        Err(DataFetchError::Parse { .. })
    ));
}
