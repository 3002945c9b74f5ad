//! Phase-two resolution: rewrite `Pending` targets against the merged component index.
//!
//! Specifier shapes handled:
//! - module specifiers on `IMPORTS_FROM` / `EXPORTS_FROM` (`./api`, `.store`, `crate::store`,
//!   `app.model`) resolve to the target file's root component;
//! - `<specifier>#<name>` on `CALLS` / `INSTANTIATES` resolves to the component the target
//!   file exports under `name`;
//! - raw heritage names on `EXTENDS` / `IMPLEMENTS` resolve through the source file's
//!   imports, then to a unique type of that name anywhere;
//! - `REFERENCES` to index tags (`S12`) or relative document links (`guide.md#setup`).
//!
//! Anything else stays pending.

use context_code_parser::{
    file_name, generate_component_id, Component, ComponentDetails, ComponentType, Language,
    Relationship, RelationshipTarget, RelationshipType,
};
use std::collections::{BTreeSet, HashMap};

const TS_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".d.ts", ".js", ".jsx", ".mjs", ".cjs"];

pub(crate) struct Resolver<'a> {
    files: BTreeSet<&'a str>,
    by_file: HashMap<&'a str, Vec<&'a Component>>,
    types_by_name: HashMap<&'a str, Vec<&'a Component>>,
    index_by_tag: HashMap<&'a str, Vec<&'a Component>>,
}

impl<'a> Resolver<'a> {
    /// `components` must be sorted by id so every "first match" is deterministic
    pub fn new(components: &'a [Component]) -> Self {
        let mut resolver = Self {
            files: BTreeSet::new(),
            by_file: HashMap::new(),
            types_by_name: HashMap::new(),
            index_by_tag: HashMap::new(),
        };
        for component in components {
            if component.is_root() {
                resolver.files.insert(component.file_path.as_str());
            }
            resolver
                .by_file
                .entry(component.file_path.as_str())
                .or_default()
                .push(component);
            if component.component_type.is_type_like() {
                resolver
                    .types_by_name
                    .entry(component.name.as_str())
                    .or_default()
                    .push(component);
            }
            if let ComponentDetails::IndexEntry {
                tag, target: None, ..
            } = &component.metadata.details
            {
                resolver.index_by_tag.entry(tag.as_str()).or_default().push(component);
            }
        }
        resolver
    }

    /// Target component id for a pending relationship, if one can be found
    pub fn resolve(&self, relationship: &Relationship, source: &Component) -> Option<String> {
        let RelationshipTarget::Pending(spec) = &relationship.target else {
            return None;
        };
        let spec = spec.as_str();
        match relationship.relationship_type {
            RelationshipType::ImportsFrom | RelationshipType::ExportsFrom => {
                let single = match relationship.metadata.imported_names.as_slice() {
                    [name] if !name.contains(' ') && name != "*" => Some(name.as_str()),
                    _ => None,
                };
                let file = single
                    .and_then(|name| self.resolve_module(source, &join_specifier(spec, name, source.language)))
                    .or_else(|| self.resolve_module(source, spec))?;
                Some(root_id(file))
            }
            RelationshipType::Calls | RelationshipType::Instantiates | RelationshipType::Uses => {
                let (module, name) = spec.rsplit_once('#')?;
                self.resolve_import(source, module, name)
            }
            RelationshipType::Extends | RelationshipType::Implements => {
                self.resolve_type_name(source, spec)
            }
            RelationshipType::References => self.resolve_reference(source, spec),
            _ => None,
        }
    }

    /// The component `module` exports as `name`, seen from `source`'s file
    fn resolve_import(&self, source: &Component, module: &str, name: &str) -> Option<String> {
        if name == "*" {
            return None;
        }
        if let Some(file) = self.resolve_module(source, module) {
            if let Some(found) = self.exported(file, name) {
                return Some(found.id.clone());
            }
        }
        // Java-style `package#Type`: the type lives in its own file
        let file = self.resolve_module(source, &join_specifier(module, name, source.language))?;
        self.exported(file, name).map(|c| c.id.clone())
    }

    fn exported(&self, file: &str, name: &str) -> Option<&'a Component> {
        let members = self.by_file.get(file)?;
        let declared = |c: &&&Component| {
            !c.is_root() && c.component_type != ComponentType::Import
        };
        members
            .iter()
            .filter(declared)
            .find(|c| {
                c.metadata.is_exported
                    && c.metadata.exported_name.as_deref().unwrap_or(&c.name) == name
            })
            .or_else(|| {
                let root = root_id(file);
                members
                    .iter()
                    .filter(declared)
                    .find(|c| c.name == name && c.parent_id.as_deref() == Some(root.as_str()))
            })
            .or_else(|| members.iter().filter(declared).find(|c| c.name == name))
            .copied()
    }

    fn resolve_type_name(&self, source: &Component, raw: &str) -> Option<String> {
        let name = bare_type_name(raw);
        if name.is_empty() {
            return None;
        }

        // A name bound by an import of the source file
        if let Some(members) = self.by_file.get(source.file_path.as_str()) {
            for import in members {
                let ComponentDetails::Import {
                    specifier,
                    imported_names,
                    default_import,
                    ..
                } = &import.metadata.details
                else {
                    continue;
                };
                let imported = imported_names
                    .iter()
                    .find(|n| n.local_name() == name)
                    .map(|n| n.name.as_str())
                    .or_else(|| (default_import.as_deref() == Some(name)).then_some("default"));
                if let Some(imported) = imported {
                    if let Some(found) = self.resolve_import(source, specifier, imported) {
                        return Some(found);
                    }
                }
            }
        }

        let candidates: Vec<&Component> = self
            .types_by_name
            .get(name)?
            .iter()
            .copied()
            .filter(|c| c.id != source.id)
            .collect();
        match candidates.as_slice() {
            [only] => Some(only.id.clone()),
            _ => candidates
                .iter()
                .find(|c| c.file_path == source.file_path)
                .map(|c| c.id.clone()),
        }
    }

    fn resolve_reference(&self, source: &Component, spec: &str) -> Option<String> {
        if let Some(entries) = self.index_by_tag.get(spec) {
            let entries: Vec<_> = entries.iter().filter(|c| c.id != source.id).collect();
            return match entries.as_slice() {
                [only] => Some(only.id.clone()),
                _ => None,
            };
        }

        let (path, anchor) = match spec.split_once('#') {
            Some((path, anchor)) => (path, Some(anchor)),
            None => (spec, None),
        };
        if path.is_empty() || path.contains("://") {
            return None;
        }
        let joined = normalize(&join(dir_of(&source.file_path), path));
        let file = self.files.get(joined.as_str()).copied()?;
        match anchor {
            Some(anchor) => self.by_file.get(file)?.iter().find_map(|c| match &c.metadata.details {
                ComponentDetails::Section { anchor: a, .. } if a == anchor => Some(c.id.clone()),
                _ => None,
            }),
            None => Some(root_id(file)),
        }
    }

    /// Known file a module specifier points at, seen from `source`
    pub fn resolve_module(&self, source: &Component, spec: &str) -> Option<&'a str> {
        let language = source.language;
        let from = source.file_path.as_str();
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }
        match language {
            Language::TypeScript | Language::Tsx | Language::JavaScript | Language::Markdown => {
                self.resolve_script_module(from, spec)
            }
            Language::Python => self.resolve_python_module(from, spec),
            Language::Rust => self.resolve_rust_module(from, spec),
            Language::Java => {
                let path = format!("{}.java", spec.replace('.', "/"));
                self.by_suffix(from, &[path])
            }
            Language::Unknown => None,
        }
    }

    fn resolve_script_module(&self, from: &str, spec: &str) -> Option<&'a str> {
        if !(spec.starts_with("./") || spec.starts_with("../")) {
            return None;
        }
        let base = normalize(&join(dir_of(from), spec));
        let mut candidates = vec![base.clone()];
        let stem = [".js", ".jsx", ".mjs", ".cjs"]
            .iter()
            .find_map(|ext| base.strip_suffix(ext));
        if let Some(stem) = stem {
            candidates.push(format!("{stem}.ts"));
            candidates.push(format!("{stem}.tsx"));
        }
        candidates.extend(TS_EXTENSIONS.iter().map(|ext| format!("{base}{ext}")));
        candidates.extend(TS_EXTENSIONS.iter().map(|ext| format!("{base}/index{ext}")));
        self.first_known(&candidates)
    }

    fn resolve_python_module(&self, from: &str, spec: &str) -> Option<&'a str> {
        let dots = spec.chars().take_while(|c| *c == '.').count();
        let rest = spec[dots..].replace('.', "/");
        if dots == 0 {
            return self.by_suffix(from, &[format!("{rest}.py"), format!("{rest}/__init__.py")]);
        }
        let mut dir = dir_of(from).to_string();
        for _ in 1..dots {
            dir = dir_of(&dir).to_string();
        }
        let candidates = if rest.is_empty() {
            vec![join(&dir, "__init__.py")]
        } else {
            let base = join(&dir, &rest);
            vec![format!("{base}.py"), format!("{base}/__init__.py")]
        };
        self.first_known(&candidates)
    }

    fn resolve_rust_module(&self, from: &str, spec: &str) -> Option<&'a str> {
        let mut segments: Vec<&str> = spec.split("::").filter(|s| !s.is_empty()).collect();
        let base = match segments.first().copied() {
            Some("crate") => {
                segments.remove(0);
                crate_root(from).to_string()
            }
            Some("self") => {
                segments.remove(0);
                module_dir(from)
            }
            Some("super") => {
                let mut dir = module_dir(from);
                while segments.first() == Some(&"super") {
                    segments.remove(0);
                    dir = dir_of(&dir).to_string();
                }
                dir
            }
            _ => {
                let rest = segments.join("/");
                return self.by_suffix(from, &[format!("{rest}.rs"), format!("{rest}/mod.rs")]);
            }
        };
        if segments.is_empty() {
            return self.first_known(&[join(&base, "lib.rs"), join(&base, "main.rs"), join(&base, "mod.rs")]);
        }
        let path = join(&base, &segments.join("/"));
        self.first_known(&[format!("{path}.rs"), format!("{path}/mod.rs")])
    }

    fn first_known(&self, candidates: &[String]) -> Option<&'a str> {
        candidates
            .iter()
            .find_map(|candidate| self.files.get(candidate.as_str()).copied())
    }

    /// Known file ending with one of `suffixes`, closest to `from` first
    fn by_suffix(&self, from: &str, suffixes: &[String]) -> Option<&'a str> {
        suffixes.iter().find_map(|suffix| {
            self.files
                .iter()
                .copied()
                .filter(|file| *file == suffix || file.ends_with(&format!("/{suffix}")))
                .max_by(|a, b| {
                    common_prefix(a, from)
                        .cmp(&common_prefix(b, from))
                        .then_with(|| b.cmp(a))
                })
        })
    }
}

fn root_id(file_path: &str) -> String {
    generate_component_id(file_path, &file_name(file_path), ComponentType::File)
}

fn join_specifier(module: &str, name: &str, language: Language) -> String {
    match language {
        Language::Rust => format!("{module}::{name}"),
        Language::Python | Language::Java if module.ends_with('.') => format!("{module}{name}"),
        Language::Python | Language::Java => format!("{module}.{name}"),
        _ => format!("{module}/{name}"),
    }
}

/// `pkg.Base<T>` / `crate::x::Base` / `Base(metaclass=M)` -> `Base`
fn bare_type_name(raw: &str) -> &str {
    let raw = raw.trim();
    let end = raw.find(['<', '(', '[', ' ']).unwrap_or(raw.len());
    let head = &raw[..end];
    let after_path = head.rsplit("::").next().unwrap_or(head);
    after_path.rsplit('.').next().unwrap_or(after_path)
}

fn dir_of(path: &str) -> &str {
    path.rfind('/').map_or("", |idx| &path[..idx])
}

fn join(dir: &str, rest: &str) -> String {
    if dir.is_empty() {
        rest.to_string()
    } else {
        format!("{dir}/{rest}")
    }
}

/// Collapse `.` and `..` segments; leading `..` that escape the root are kept
pub(crate) fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if path.starts_with('/') {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Directory holding the crate root: the nearest `src` ancestor, else the file's directory
fn crate_root(from: &str) -> &str {
    let mut dir = dir_of(from);
    loop {
        if dir == "src" || dir.ends_with("/src") {
            return dir;
        }
        if dir.is_empty() {
            return dir_of(from);
        }
        dir = dir_of(dir);
    }
}

/// Directory whose files are submodules of the module defined by `from`
fn module_dir(from: &str) -> String {
    let dir = dir_of(from);
    let file = from.rsplit('/').next().unwrap_or(from);
    match file {
        "mod.rs" | "lib.rs" | "main.rs" => dir.to_string(),
        _ => join(dir, file.strip_suffix(".rs").unwrap_or(file)),
    }
}

fn common_prefix(a: &str, b: &str) -> usize {
    a.split('/')
        .zip(b.split('/'))
        .take_while(|(x, y)| x == y)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_code_parser::Location;

    fn file(path: &str, language: Language) -> Component {
        Component::file_root(path, language, "")
    }

    #[test]
    fn normalizes_relative_segments() {
        assert_eq!(normalize("src/a/../b/./c.ts"), "src/b/c.ts");
        assert_eq!(normalize("../x"), "../x");
        assert_eq!(normalize("/abs/./y"), "/abs/y");
    }

    #[test]
    fn bare_type_names() {
        assert_eq!(bare_type_name("Base<T>"), "Base");
        assert_eq!(bare_type_name("models.Base"), "Base");
        assert_eq!(bare_type_name("crate::store::Store"), "Store");
        assert_eq!(bare_type_name("Meta(metaclass=ABCMeta)"), "Meta");
    }

    #[test]
    fn script_modules_try_extensions_and_index_files() {
        let components = vec![
            file("src/api.ts", Language::TypeScript),
            file("src/util/index.ts", Language::TypeScript),
            file("src/store.ts", Language::TypeScript),
        ];
        let resolver = Resolver::new(&components);
        let from = &components[2];
        assert_eq!(resolver.resolve_module(from, "./api"), Some("src/api.ts"));
        assert_eq!(resolver.resolve_module(from, "./api.js"), Some("src/api.ts"));
        assert_eq!(resolver.resolve_module(from, "./util"), Some("src/util/index.ts"));
        assert_eq!(resolver.resolve_module(from, "react"), None);
    }

    #[test]
    fn python_relative_levels() {
        let components = vec![
            file("pkg/__init__.py", Language::Python),
            file("pkg/store.py", Language::Python),
            file("pkg/sub/service.py", Language::Python),
            file("lib/util/strings.py", Language::Python),
        ];
        let resolver = Resolver::new(&components);
        let from = &components[2];
        assert_eq!(resolver.resolve_module(from, "..store"), Some("pkg/store.py"));
        assert_eq!(resolver.resolve_module(from, ".."), Some("pkg/__init__.py"));
        assert_eq!(resolver.resolve_module(from, "util.strings"), Some("lib/util/strings.py"));
        assert_eq!(resolver.resolve_module(from, ".missing"), None);
    }

    #[test]
    fn rust_paths_from_crate_self_and_super() {
        let components = vec![
            file("core/src/lib.rs", Language::Rust),
            file("core/src/store/mod.rs", Language::Rust),
            file("core/src/store/cache.rs", Language::Rust),
            file("core/src/net.rs", Language::Rust),
        ];
        let resolver = Resolver::new(&components);
        let cache = &components[2];
        assert_eq!(resolver.resolve_module(cache, "crate::net"), Some("core/src/net.rs"));
        assert_eq!(resolver.resolve_module(cache, "super"), Some("core/src/store/mod.rs"));
        assert_eq!(resolver.resolve_module(cache, "crate"), Some("core/src/lib.rs"));
        let store = &components[1];
        assert_eq!(resolver.resolve_module(store, "self::cache"), Some("core/src/store/cache.rs"));
        assert_eq!(resolver.resolve_module(store, "std::collections"), None);
    }

    #[test]
    fn java_packages_map_to_directories() {
        let components = vec![
            file("src/main/java/app/model/User.java", Language::Java),
            file("src/main/java/app/App.java", Language::Java),
        ];
        let resolver = Resolver::new(&components);
        let from = &components[1];
        assert_eq!(
            resolver.resolve_module(from, "app.model.User"),
            Some("src/main/java/app/model/User.java")
        );
    }

    #[test]
    fn unique_type_names_resolve_globally() {
        let mut base = file("a.py", Language::Python);
        base.id = "a.py::class::Base".to_string();
        base.name = "Base".to_string();
        base.component_type = ComponentType::Class;
        base.location = Location::lines(1, 2);
        let mut child = base.clone();
        child.id = "b.py::class::Child".to_string();
        child.name = "Child".to_string();
        child.file_path = "b.py".to_string();

        let components = vec![base, child.clone()];
        let resolver = Resolver::new(&components);
        let rel = Relationship::pending(&child.id, "Base", RelationshipType::Extends);
        assert_eq!(resolver.resolve(&rel, &child).as_deref(), Some("a.py::class::Base"));
        let missing = Relationship::pending(&child.id, "Nowhere", RelationshipType::Extends);
        assert_eq!(resolver.resolve(&missing, &child), None);
    }
}
