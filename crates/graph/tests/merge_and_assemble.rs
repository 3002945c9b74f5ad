use context_code_parser::{FileExtraction, ParserRegistry, RelationshipType};
use context_graph::{merge_extractions, ContextAssembler, GraphBuilder, GraphError};
use pretty_assertions::assert_eq;

const PROJECT: &[(&str, &str)] = &[
    ("pkg/store.py", "def load(name):\n    return name\n"),
    (
        "pkg/service.py",
        "from .store import load\n\nclass Service:\n    def run(self):\n        return load(self)\n",
    ),
    ("src/app/Base.java", "package app;\n\npublic class Base {}\n"),
    (
        "src/app/App.java",
        "package app;\n\npublic class App extends Base {\n    public void start() {}\n}\n",
    ),
    ("src/store.rs", "pub struct Store;\n"),
    ("src/lib.rs", "use crate::store::Store;\n\npub struct Cache {\n    inner: Store,\n}\n"),
    (
        "docs/index.md",
        "# Index\n\n```codeindex\n# SYSTEMS\nS7:Store|keeps rows\n```\n",
    ),
    ("docs/guide.md", "# Guide\n\nThe store is S7, see [code](../src/store.rs).\n"),
];

fn extractions() -> Vec<FileExtraction> {
    let registry = ParserRegistry::default();
    PROJECT
        .iter()
        .map(|(path, content)| registry.parse_file(content, path).expect("supported"))
        .collect()
}

fn has_edge(graph: &context_graph::CodeGraph, source: &str, target: &str, kind: RelationshipType) -> bool {
    graph.relationships().any(|r| {
        r.relationship_type == kind && r.source_id == source && r.target.resolved_id() == Some(target)
    })
}

#[test]
fn merge_is_independent_of_input_order() {
    let forward = merge_extractions(extractions()).expect("merge");
    let mut reversed_input = extractions();
    reversed_input.reverse();
    let reversed = merge_extractions(reversed_input).expect("merge");

    let ids = |g: &context_graph::CodeGraph| {
        let mut ids: Vec<String> = g.relationships().map(|r| r.id.clone()).collect();
        ids.sort();
        ids
    };
    assert_eq!(ids(&forward), ids(&reversed));
    assert_eq!(forward.node_count(), reversed.node_count());
    assert_eq!(forward.stats, reversed.stats);
}

#[test]
fn pending_targets_resolve_across_languages() {
    let graph = merge_extractions(extractions()).expect("merge");

    assert!(has_edge(
        &graph,
        "pkg/service.py::method::run",
        "pkg/store.py::function::load",
        RelationshipType::Calls
    ));
    assert!(has_edge(
        &graph,
        "src/app/App.java::class::App",
        "src/app/Base.java::class::Base",
        RelationshipType::Extends
    ));
    assert!(has_edge(
        &graph,
        "src/lib.rs::file::lib.rs",
        "src/store.rs::file::store.rs",
        RelationshipType::ImportsFrom
    ));
    assert!(graph.relationships().any(|r| {
        r.relationship_type == RelationshipType::References
            && r.source_id.starts_with("docs/guide.md")
            && r.target.resolved_id() == Some("src/store.rs::file::store.rs")
    }));
    assert!(graph.relationships().any(|r| {
        r.relationship_type == RelationshipType::References
            && r.source_id.starts_with("docs/guide.md")
            && r.target.resolved_id().is_some_and(|t| t.starts_with("docs/index.md::index_system"))
    }));
    assert!(graph.unresolved.iter().all(|r| r.target.is_pending()));
    assert_eq!(graph.stats.files, PROJECT.len());
}

#[test]
fn context_slices_rank_direct_neighbours_first() {
    let assembler = ContextAssembler::new(merge_extractions(extractions()).expect("merge"));

    let context = assembler.assemble("run", 1).expect("run exists");
    assert_eq!(context.focus.id, "pkg/service.py::method::run");
    assert!(context.related.iter().all(|r| r.distance == 1));
    let names: Vec<&str> = context.related.iter().map(|r| r.component.name.as_str()).collect();
    assert!(names.contains(&"load"));
    assert!(names.contains(&"Service"));
    assert_eq!(context.related[0].component.name, "load");
    assert!(context
        .related
        .windows(2)
        .all(|w| w[0].relevance_score >= w[1].relevance_score));
    assert!(context.relationships.iter().all(|r| {
        context.components().any(|c| c.id == r.source_id)
            && context
                .components()
                .any(|c| Some(c.id.as_str()) == r.target.resolved_id())
    }));

    let deeper = assembler.assemble("run", 2).expect("run exists");
    assert!(deeper.related.len() > context.related.len());
}

#[test]
fn unknown_entities_fail() {
    let assembler = ContextAssembler::new(merge_extractions(extractions()).expect("merge"));
    assert!(matches!(
        assembler.assemble("does_not_exist", 2),
        Err(GraphError::NodeNotFound(_))
    ));
}

#[test]
fn builder_accepts_loose_components() {
    let mut builder = GraphBuilder::new();
    let mut extraction = extractions().remove(0);
    builder.add_components(extraction.components.clone());
    builder.add_relationships(std::mem::take(&mut extraction.relationships));
    builder.add_components(extraction.components);
    let graph = builder.build();
    assert_eq!(graph.stats.duplicate_components, graph.node_count());
}
