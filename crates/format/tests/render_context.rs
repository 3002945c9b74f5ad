use context_code_parser::ParserRegistry;
use context_format::aiccl::{decode, AicclEncoder};
use context_format::{AdapterRegistry, ContextData, ContextRequest, Flow, Rule};
use context_graph::{merge_extractions, ContextAssembler};
use pretty_assertions::assert_eq;

const PROJECT: &[(&str, &str)] = &[
    ("src/api.ts", "export function fetchAll() {\n  return [];\n}\n"),
    (
        "src/app.ts",
        "import { fetchAll } from './api';\n\nexport function main() {\n  return fetchAll();\n}\n",
    ),
];

fn context_for(entity: &str) -> ContextData {
    let parsers = ParserRegistry::default();
    let extractions = PROJECT
        .iter()
        .map(|(path, content)| parsers.parse_file(content, path).expect("supported"));
    let graph = merge_extractions(extractions).expect("merge");
    let assembled = ContextAssembler::new(graph)
        .assemble(entity, 1)
        .expect("entity exists");
    ContextData::from_assembled(&assembled)
        .with_rules(vec![Rule {
            rule_type: "errors".to_string(),
            confidence: Some(0.8),
            guidance: Some("return empty lists, never null".to_string()),
            why: None,
        }])
        .with_flows(vec![Flow {
            name: "startup".to_string(),
            steps: vec!["main".to_string(), "fetchAll".to_string()],
        }])
}

#[test]
fn aiccl_round_trip_keeps_structure_and_code() {
    let data = context_for("main");
    let text = AicclEncoder::default().encode(&data);
    let doc = decode(&text);

    assert!(doc.warnings.is_empty(), "{:?}\n{text}", doc.warnings);
    let paths: Vec<&str> = doc.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, data.files());
    assert_eq!(doc.systems.len(), data.components.len());

    for (system, scored) in doc.systems.iter().zip(&data.components) {
        let component = &scored.component;
        assert_eq!(system.name, component.name);
        assert_eq!(system.file.as_deref(), Some(component.file_path.as_str()));
        assert_eq!(
            system.lines,
            Some((component.location.start_line, component.location.end_line))
        );
        assert_eq!(system.component_type.as_deref(), Some(component.component_type.as_str()));
        if !component.is_root() && !component.code.trim().is_empty() {
            assert_eq!(system.code.as_deref(), Some(component.code.trim_end()));
        }
    }

    assert!(doc
        .relationships
        .iter()
        .any(|r| r.source == "main" && r.target == "fetchAll" && r.relationship_type == "CALLS"));
    assert_eq!(
        doc.rules[0].guidance.as_deref(),
        Some("return empty lists, never null")
    );
    assert_eq!(doc.flows[0].steps, vec!["main", "fetchAll"]);
}

#[test]
fn crlf_code_survives_the_round_trip() {
    let parsers = ParserRegistry::default();
    let extraction = parsers
        .parse_file("export function load() {\r\n  return 1;\r\n}\r\n", "src/crlf.ts")
        .expect("supported");
    let assembled = ContextAssembler::new(merge_extractions([extraction]).expect("merge"))
        .assemble("load", 0)
        .expect("entity exists");
    let data = ContextData::from_assembled(&assembled);
    let code = data.focus().expect("focus").code.trim_end().to_string();
    assert!(code.contains("\r\n"), "{code:?}");

    let text = AicclEncoder::default().encode(&data);
    assert!(!text.contains('\r'), "{text:?}");
    let doc = decode(&text);
    assert!(doc.warnings.is_empty(), "{:?}", doc.warnings);
    assert_eq!(doc.system_named("load").and_then(|s| s.code.as_deref()), Some(code.as_str()));
}

#[test]
fn flow_names_starting_with_a_hash_stay_in_flows() {
    let data = context_for("main").with_flows(vec![Flow {
        name: "#hot path".to_string(),
        steps: vec!["main".to_string(), "fetchAll".to_string()],
    }]);
    let text = AicclEncoder::default().encode(&data);
    assert!(text.contains("\n\\#hot path: "), "{text}");

    let doc = decode(&text);
    assert!(doc.warnings.is_empty(), "{:?}\n{text}", doc.warnings);
    assert_eq!(doc.flows.len(), 1);
    assert_eq!(doc.flows[0].name, "#hot path");
    assert_eq!(doc.flows[0].steps, vec!["main", "fetchAll"]);
}

#[test]
fn handwritten_document_decodes() {
    let text = "\
# FILE_PATHS
F1:src/store.ts
# COMPRESSION_MAP
f=function|ret=return
# SYSTEMS
S1:load|90%
F1>1-3:f{load()}
S2:save|70%
F1>5-7:f{save()}
# RELATIONSHIPS
S1>S2:CALLS|80%
";
    let doc = decode(text);
    assert!(doc.warnings.is_empty(), "{:?}", doc.warnings);
    assert_eq!(doc.relationships.len(), 1);
    let rel = &doc.relationships[0];
    assert_eq!((rel.source.as_str(), rel.target.as_str()), ("load", "save"));
    assert_eq!(rel.relationship_type, "CALLS");
    assert_eq!(rel.confidence, Some(80));
    assert_eq!(doc.system("S2").map(|s| s.signature.as_str()), Some("save()"));
}

#[test]
fn expansion_prefers_the_longest_code() {
    let text = "\
# COMPRESSION_MAP
e=export|exp=expression
# SYSTEMS
S1:parse|e exp|50%
";
    let doc = decode(text);
    assert_eq!(doc.systems[0].summary.as_deref(), Some("export expression"));
    assert_eq!(doc.mappings.operations.get("e").map(String::as_str), Some("export"));
    assert_eq!(doc.mappings.patterns.get("exp").map(String::as_str), Some("expression"));
}

#[test]
fn compact_substitution_and_bypass() {
    let data = context_for("main");
    let registry = AdapterRegistry::default();
    let request = ContextRequest::new("main").format("markdown").token_budget(1500);

    let selected = registry.render(&request, &data).expect("render");
    assert_eq!(selected.format, "markdown-compact");
    assert!(!selected.content.contains("```"));

    let exact = registry.render_exact(&request, &data).expect("render");
    assert_eq!(exact.format, "markdown");
    assert!(exact.content.contains("```typescript"), "{}", exact.content);
    assert!(exact.token_count <= 1500);
}

#[test]
fn every_format_renders_the_same_slice() {
    let data = context_for("main");
    let registry = AdapterRegistry::default();
    for name in registry.names() {
        let request = ContextRequest::new("main").format(name);
        let response = registry.render_exact(&request, &data).expect("render");
        assert_eq!(response.format, name);
        assert_eq!(response.stats.components, data.components.len(), "{name}");
        assert!(response.content.contains("fetchAll"), "{name}: {}", response.content);
        assert!(response.warnings.is_empty(), "{name}: {:?}", response.warnings);
    }
}
