use context_code_parser::passes::{ContainmentPass, PassContext, RelationshipPass, RelationshipSet};
use context_code_parser::{
    BlockParseOptions, CodeBlock, Component, ComponentType, LanguageParser, ParserRegistry,
    TypeScriptParser,
};
use pretty_assertions::assert_eq;
use std::collections::{BTreeSet, HashMap};

const SAMPLES: &[(&str, &str)] = &[
    (
        "src/store.ts",
        r#"import { fetchAll } from './api';

export interface Repo { load(): string[]; }

export class Store implements Repo {
  private cache = new Map<string, string>();

  load(): string[] {
    return fetchAll();
  }
}

export const build = () => new Store();
"#,
    ),
    (
        "pkg/service.py",
        r#"from .store import load

class Service:
    """Serves records."""

    def __init__(self, name):
        self.name = name

    def run(self):
        return load(self.name)
"#,
    ),
    (
        "src/App.java",
        r#"package app;

public class App extends Base {
    public void start() { run(); }
    private void run() {}
}
"#,
    ),
    (
        "src/lib.rs",
        r#"use crate::store::Store;

pub struct Cache { size: usize }

impl Cache {
    pub fn new() -> Self { Cache { size: 0 } }
}
"#,
    ),
    (
        "docs/README.md",
        "# Guide\n\nSee `Cache` and S1.\n\n## Setup\n\n```ts\nexport function setup() {}\n```\n",
    ),
];

fn ids_and_locations(components: &[Component]) -> Vec<(String, usize, usize)> {
    components
        .iter()
        .map(|c| (c.id.clone(), c.location.start_line, c.location.end_line))
        .collect()
}

#[test]
fn extraction_is_deterministic() {
    let registry = ParserRegistry::default();
    for (path, content) in SAMPLES {
        let first = registry.parse_file(content, path).expect("supported");
        let second = registry.parse_file(content, path).expect("supported");
        assert_eq!(
            ids_and_locations(&first.components),
            ids_and_locations(&second.components),
            "{path}"
        );
        let rel_ids = |e: &context_code_parser::FileExtraction| {
            e.relationships.iter().map(|r| r.id.clone()).collect::<Vec<_>>()
        };
        assert_eq!(rel_ids(&first), rel_ids(&second), "{path}");
    }
}

#[test]
fn every_file_keeps_a_root_even_when_unparseable() {
    let registry = ParserRegistry::default();
    let garbage = "}}}} ((( class def fn :: <<<\n\u{0}\u{1}";
    for (path, _) in SAMPLES {
        let extraction = registry.parse_file(garbage, path).expect("supported");
        assert!(
            extraction
                .components
                .iter()
                .any(|c| c.component_type == ComponentType::File),
            "{path}"
        );
    }
    let empty = registry.parse_file("", "src/empty.ts").expect("supported");
    assert_eq!(empty.components.len(), 1);
}

#[test]
fn parents_form_a_tree_inside_each_batch() {
    let registry = ParserRegistry::default();
    for (path, content) in SAMPLES {
        let extraction = registry.parse_file(content, path).expect("supported");
        let parents: HashMap<&str, Option<&str>> = extraction
            .components
            .iter()
            .map(|c| (c.id.as_str(), c.parent_id.as_deref()))
            .collect();
        assert_eq!(parents.len(), extraction.components.len(), "{path}: duplicate ids");

        for component in &extraction.components {
            if component.component_type == ComponentType::File {
                assert_eq!(component.parent_id, None);
                continue;
            }
            let mut seen = BTreeSet::new();
            let mut current = component.id.as_str();
            while let Some(Some(parent)) = parents.get(current) {
                assert!(parents.contains_key(parent), "{path}: dangling parent {parent}");
                assert!(seen.insert(*parent), "{path}: cycle through {parent}");
                current = parent;
            }
            assert_eq!(
                parents.get(current),
                Some(&None),
                "{path}: {} does not reach the file root",
                component.id
            );
        }
    }
}

#[test]
fn block_locations_are_shifted_to_host_lines() {
    let snippet = "function a() {\n  return 1;\n}\n\nclass B {\n  m() {}\n}\n";
    let parser = TypeScriptParser::typescript();
    let standalone = parser.detect_components(snippet, "docs/guide.md");

    let mut block = CodeBlock::new(snippet, 10);
    block.end_line = 20;
    let host: String = "x\n".repeat(25);
    let result = parser.parse_code_block(&block, &host, "docs/guide.md", &BlockParseOptions::default());

    assert_eq!(result.metadata.line_offset, 9);
    assert!(!result.components.is_empty());
    for component in &result.components {
        let original = standalone
            .iter()
            .find(|c| c.id == component.id)
            .expect("same ids as the standalone parse");
        assert_eq!(component.location.start_line, original.location.start_line + 9);
        assert_eq!(component.location.end_line, original.location.end_line + 9);
    }
    assert!(!result.components.iter().any(|c| c.component_type == ComponentType::File));
}

#[test]
fn block_components_attach_to_the_requested_parent() {
    let parser = TypeScriptParser::typescript();
    let block = CodeBlock::new("function a() {}\n", 3);
    let options = BlockParseOptions {
        parent_id: Some("docs/guide.md::code_block::ts".to_string()),
        include_file_root: false,
    };
    let result = parser.parse_code_block(&block, "# x\n\n```ts\nfunction a() {}\n```\n", "docs/guide.md", &options);
    let a = result
        .components
        .iter()
        .find(|c| c.name == "a")
        .expect("function a");
    assert_eq!(a.parent_id.as_deref(), Some("docs/guide.md::code_block::ts"));
    assert_eq!(a.location.start_line, 3);
}

#[test]
fn containment_dedupes_regardless_of_order() {
    let registry = ParserRegistry::default();
    let (path, content) = SAMPLES[0];
    let components = registry.parse_file(content, path).expect("supported").components;
    let mut reversed = components.clone();
    reversed.reverse();

    let run = |components: &[Component]| {
        let ctx = PassContext::new(components, content);
        let mut set = RelationshipSet::new();
        ContainmentPass.run(&ctx, &mut set).expect("containment");
        ContainmentPass.run(&ctx, &mut set).expect("containment");
        set.iter().map(|r| r.id.clone()).collect::<BTreeSet<_>>()
    };

    let forward = run(&components);
    assert_eq!(forward.len(), components.len() - 1);
    assert_eq!(forward, run(&reversed));
}

#[test]
fn heading_stack_scenario() {
    let registry = ParserRegistry::default();
    let content = "# One\n\n## Two\n\n## Three\n\n# Four\n\n### Five\n";
    let extraction = registry.parse_file(content, "docs/headings.md").expect("markdown");
    let by_id: HashMap<&str, &Component> = extraction
        .components
        .iter()
        .map(|c| (c.id.as_str(), c))
        .collect();
    let parent_names: Vec<String> = extraction
        .components
        .iter()
        .filter(|c| c.component_type == ComponentType::Section)
        .map(|c| {
            let parent = c.parent_id.as_deref().and_then(|p| by_id.get(p)).expect("parent");
            match parent.component_type {
                ComponentType::File => "file".to_string(),
                _ => parent.name.clone(),
            }
        })
        .collect();
    assert_eq!(parent_names, vec!["file", "One", "One", "file", "Four"]);
}
