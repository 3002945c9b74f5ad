use super::{PassContext, RelationshipPass, RelationshipSet};
use crate::error::{ParserError, Result};
use crate::language::Language;
use crate::parsers::last_segment;
use crate::types::{Component, ComponentDetails, ComponentType, Relationship, RelationshipType};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};

static CALL_SITE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Za-z_]\w*)\s*\(").expect("valid call regex"));
static NEW_EXPR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bnew\s+([A-Za-z_][\w.]*)").expect("valid new regex"));
static IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Za-z_]\w*\b").expect("valid ident regex"));
static QUOTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|`(?:[^`\\]|\\.)*`"#).expect("valid string regex")
});
static DOUBLE_QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(?:[^"\\]|\\.)*""#).expect("valid string regex"));

const NOT_CALLS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "function", "def", "fn", "match", "new",
    "typeof", "sizeof", "super", "elif", "with", "assert", "yield", "await", "async", "in", "not",
    "and", "or", "synchronized", "try",
];

const RESOLVED_SAME_FILE: f32 = 0.9;
const RESOLVED_OTHER_FILE: f32 = 0.7;
const TYPE_MENTION: f32 = 0.8;
const IMPORTED_CALL: f32 = 0.6;

/// `CALLS` / `INSTANTIATES` / `USES` from the bodies of callables.
///
/// Each line is attributed to the innermost callable that spans it. Call sites match known
/// component names; calls to names bound by an import in the same file become pending edges
/// to `<specifier>#<name>`.
pub struct UsagePass;

struct ImportBinding {
    specifier: String,
    imported: String,
}

impl RelationshipPass for UsagePass {
    fn name(&self) -> &'static str {
        "usage"
    }

    fn run(&self, ctx: &PassContext<'_>, out: &mut RelationshipSet) -> Result<()> {
        let mut by_file: BTreeMap<&str, Vec<&Component>> = BTreeMap::new();
        for component in ctx.components {
            if component.component_type.is_callable() {
                by_file
                    .entry(component.file_path.as_str())
                    .or_default()
                    .push(component);
            }
        }

        for (file_path, callables) in by_file {
            if let Some(c) = callables
                .iter()
                .find(|c| c.location.end_line > ctx.line_count())
            {
                return Err(ParserError::pass(
                    "usage",
                    format!(
                        "{} ends at line {} but content has {} lines",
                        c.id,
                        c.location.end_line,
                        ctx.line_count()
                    ),
                ));
            }

            let bindings = import_bindings(ctx, file_path);
            let owners = line_owners(&callables);
            let mut owned: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
            for (line, idx) in owners {
                owned.entry(idx).or_default().push(line);
            }

            for (idx, lines) in owned {
                let owner = callables[idx];
                scan_callable(ctx, owner, &lines, &bindings, out);
            }
        }
        Ok(())
    }
}

fn import_bindings(ctx: &PassContext<'_>, file_path: &str) -> HashMap<String, ImportBinding> {
    let mut bindings = HashMap::new();
    for component in ctx.components.iter().filter(|c| c.file_path == file_path) {
        let ComponentDetails::Import {
            specifier,
            imported_names,
            default_import,
            is_reexport: false,
            ..
        } = &component.metadata.details
        else {
            continue;
        };
        for name in imported_names {
            bindings.insert(
                name.local_name().to_string(),
                ImportBinding {
                    specifier: specifier.clone(),
                    imported: name.name.clone(),
                },
            );
        }
        if let Some(default) = default_import {
            bindings.insert(
                default.clone(),
                ImportBinding {
                    specifier: specifier.clone(),
                    imported: "default".to_string(),
                },
            );
        }
    }
    bindings
}

/// line → index of the innermost callable spanning it
fn line_owners(callables: &[&Component]) -> BTreeMap<usize, usize> {
    let mut order: Vec<usize> = (0..callables.len()).collect();
    // Widest first so nested callables overwrite their parents' lines
    order.sort_by(|&a, &b| {
        let la = callables[a].location;
        let lb = callables[b].location;
        lb.line_count()
            .cmp(&la.line_count())
            .then_with(|| la.start_line.cmp(&lb.start_line))
            .then_with(|| callables[a].id.cmp(&callables[b].id))
    });
    let mut owners = BTreeMap::new();
    for idx in order {
        let loc = callables[idx].location;
        for line in loc.start_line..=loc.end_line {
            owners.insert(line, idx);
        }
    }
    owners
}

fn strip_line(line: &str, language: Language) -> String {
    let without_strings = match language {
        Language::Rust => DOUBLE_QUOTED.replace_all(line, "\"\""),
        _ => QUOTED.replace_all(line, "\"\""),
    };
    let comment = match language {
        Language::Python => "#",
        Language::Markdown | Language::Unknown => return without_strings.into_owned(),
        _ => "//",
    };
    match without_strings.find(comment) {
        Some(pos) => without_strings[..pos].to_string(),
        None => without_strings.into_owned(),
    }
}

fn scan_callable(
    ctx: &PassContext<'_>,
    owner: &Component,
    lines: &[usize],
    bindings: &HashMap<String, ImportBinding>,
    out: &mut RelationshipSet,
) {
    let ast_calls: Option<HashSet<&str>> = match &owner.metadata.details {
        ComponentDetails::Callable { calls, .. } if !calls.is_empty() => {
            Some(calls.iter().map(String::as_str).collect())
        }
        _ => None,
    };
    let mut seen_calls: HashSet<String> = HashSet::new();

    for &line_no in lines {
        let Some(raw) = ctx.line(line_no) else {
            continue;
        };
        let line = strip_line(raw, owner.language);
        let mut instantiated: HashSet<String> = HashSet::new();

        for cap in NEW_EXPR.captures_iter(&line) {
            let name = last_segment(&cap[1]).to_string();
            if let Some(rel) = instantiation(ctx, owner, &name, bindings, line_no) {
                out.insert(rel);
            }
            instantiated.insert(name);
        }

        let mut called: HashSet<String> = HashSet::new();
        for cap in CALL_SITE.captures_iter(&line) {
            let name = &cap[1];
            if NOT_CALLS.contains(&name) || instantiated.contains(name) {
                continue;
            }
            if line_no == owner.location.start_line && name == owner.name {
                continue;
            }
            if let Some(allowed) = &ast_calls {
                if !allowed.contains(name) {
                    continue;
                }
            }
            called.insert(name.to_string());
            seen_calls.insert(name.to_string());
            if let Some(rel) = call(ctx, owner, name, bindings, Some(line_no)) {
                out.insert(rel);
            }
        }

        for m in IDENT.find_iter(&line) {
            let name = m.as_str();
            if called.contains(name) || instantiated.contains(name) {
                continue;
            }
            let Some(target) = ctx.find_named(name, &owner.file_path, |c| {
                c.component_type.is_type_like()
            }) else {
                continue;
            };
            if owner.parent_id.as_deref() == Some(target.id.as_str()) {
                continue;
            }
            out.insert(
                Relationship::resolved(&owner.id, &target.id, RelationshipType::Uses)
                    .confidence(TYPE_MENTION)
                    .at_line(line_no),
            );
        }
    }

    // Calls the grammar saw that the line scan missed (split across lines)
    if let Some(allowed) = &ast_calls {
        let mut missing: Vec<&str> = allowed
            .iter()
            .copied()
            .filter(|name| !seen_calls.contains(*name))
            .collect();
        missing.sort_unstable();
        for name in missing {
            if let Some(rel) = call(ctx, owner, name, bindings, None) {
                out.insert(rel);
            }
        }
    }
}

fn call(
    ctx: &PassContext<'_>,
    owner: &Component,
    name: &str,
    bindings: &HashMap<String, ImportBinding>,
    line: Option<usize>,
) -> Option<Relationship> {
    let target = ctx.find_named(name, &owner.file_path, |c| {
        c.component_type.is_callable() || c.component_type == ComponentType::Class
    });
    let rel = match target {
        Some(target) if target.component_type == ComponentType::Class => {
            Relationship::resolved(&owner.id, &target.id, RelationshipType::Instantiates)
                .confidence(confidence_for(owner, target))
        }
        Some(target) => Relationship::resolved(&owner.id, &target.id, RelationshipType::Calls)
            .confidence(confidence_for(owner, target)),
        None => {
            let binding = bindings.get(name)?;
            Relationship::pending(
                &owner.id,
                format!("{}#{}", binding.specifier, binding.imported),
                RelationshipType::Calls,
            )
            .confidence(IMPORTED_CALL)
        }
    };
    Some(match line {
        Some(line) => rel.at_line(line),
        None => rel,
    })
}

fn instantiation(
    ctx: &PassContext<'_>,
    owner: &Component,
    name: &str,
    bindings: &HashMap<String, ImportBinding>,
    line: usize,
) -> Option<Relationship> {
    let rel = match ctx.find_named(name, &owner.file_path, |c| {
        c.component_type.is_type_like()
    }) {
        Some(target) => {
            Relationship::resolved(&owner.id, &target.id, RelationshipType::Instantiates)
                .confidence(confidence_for(owner, target))
        }
        None => {
            let binding = bindings.get(name)?;
            Relationship::pending(
                &owner.id,
                format!("{}#{}", binding.specifier, binding.imported),
                RelationshipType::Instantiates,
            )
            .confidence(IMPORTED_CALL)
        }
    };
    Some(rel.at_line(line))
}

fn confidence_for(owner: &Component, target: &Component) -> f32 {
    if owner.file_path == target.file_path {
        RESOLVED_SAME_FILE
    } else {
        RESOLVED_OTHER_FILE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ImportedName, Location, RelationshipTarget};

    fn component(name: &str, ty: ComponentType, lines: (usize, usize)) -> Component {
        let mut c = Component::file_root("app.ts", Language::TypeScript, "");
        c.id = format!("app.ts::{}::{name}", ty.as_str());
        c.name = name.to_string();
        c.component_type = ty;
        c.location = Location::lines(lines.0, lines.1);
        c.parent_id = Some("app.ts::file::app.ts".to_string());
        c
    }

    const SOURCE: &str = "\
import { fetchAll } from './api';
class Store {}
function save(store: Store) {
  return 1;
}
function load() {
  const s = new Store();
  save(s); // load(
  fetchAll();
  log(\"save(\");
}
";

    fn run(components: &[Component]) -> Vec<Relationship> {
        let ctx = PassContext::new(components, SOURCE);
        let mut set = RelationshipSet::new();
        UsagePass.run(&ctx, &mut set).expect("pass");
        set.into_vec()
    }

    fn fixture() -> Vec<Component> {
        let mut import = component("./api", ComponentType::Import, (1, 1));
        import.metadata.details = ComponentDetails::Import {
            specifier: "./api".to_string(),
            imported_names: vec![ImportedName {
                name: "fetchAll".to_string(),
                alias: None,
            }],
            default_import: None,
            namespace_import: None,
            is_type_only: false,
            is_reexport: false,
        };
        vec![
            import,
            component("Store", ComponentType::Class, (2, 2)),
            component("save", ComponentType::Function, (3, 5)),
            component("load", ComponentType::Function, (6, 11)),
        ]
    }

    #[test]
    fn detects_calls_instantiations_and_pending_imports() {
        let rels = run(&fixture());
        let from_load: Vec<_> = rels
            .iter()
            .filter(|r| r.source_id == "app.ts::function::load")
            .map(|r| (r.relationship_type, r.target.clone()))
            .collect();

        assert!(from_load.contains(&(
            RelationshipType::Instantiates,
            RelationshipTarget::Resolved("app.ts::class::Store".to_string())
        )));
        assert!(from_load.contains(&(
            RelationshipType::Calls,
            RelationshipTarget::Resolved("app.ts::function::save".to_string())
        )));
        assert!(from_load.contains(&(
            RelationshipType::Calls,
            RelationshipTarget::Pending("./api#fetchAll".to_string())
        )));
        // no self call from the comment, nothing from the string literal
        assert!(!from_load
            .iter()
            .any(|(_, t)| t == &RelationshipTarget::Resolved("app.ts::function::load".to_string())));
        assert_eq!(
            from_load
                .iter()
                .filter(|(ty, _)| *ty == RelationshipType::Calls)
                .count(),
            2
        );
    }

    #[test]
    fn type_mentions_become_uses() {
        let rels = run(&fixture());
        let uses: Vec<_> = rels
            .iter()
            .filter(|r| r.relationship_type == RelationshipType::Uses)
            .collect();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].source_id, "app.ts::function::save");
        assert_eq!(uses[0].metadata.line, Some(3));
    }

    #[test]
    fn out_of_range_components_fail_the_pass() {
        let components = vec![component("ghost", ComponentType::Function, (40, 42))];
        let ctx = PassContext::new(&components, SOURCE);
        let mut set = RelationshipSet::new();
        assert!(UsagePass.run(&ctx, &mut set).is_err());
    }
}
