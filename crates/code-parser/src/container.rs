//! Per-call extraction state: the container stack and the component batch it feeds.

use crate::language::Language;
use crate::types::{generate_component_id, Component, ComponentMetadata, ComponentType, Location};
use std::collections::{HashMap, HashSet};

/// Explicit current-parent stack.
///
/// Traversals push a container when descending into it and pop it on the way out; every
/// component discovered in between takes its parent from the top.
#[derive(Debug, Default, Clone)]
pub struct ContainerStack {
    entries: Vec<String>,
}

impl ContainerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, component_id: impl Into<String>) {
        self.entries.push(component_id.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.entries.pop()
    }

    #[must_use]
    pub fn top(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Accumulates the components of one file.
///
/// Owns the synthetic file root, the container stack and id de-duplication. Parsers call
/// [`ComponentBatch::add`] for every discovered unit and [`ComponentBatch::finish`] once.
pub struct ComponentBatch<'a> {
    file_path: &'a str,
    language: Language,
    content: &'a str,
    line_starts: Vec<usize>,
    root_id: String,
    components: Vec<Component>,
    seen_ids: HashMap<String, usize>,
    pub stack: ContainerStack,
}

impl<'a> ComponentBatch<'a> {
    pub fn new(file_path: &'a str, language: Language, content: &'a str) -> Self {
        let root = Component::file_root(file_path, language, content);
        let root_id = root.id.clone();
        let mut seen_ids = HashMap::new();
        seen_ids.insert(root_id.clone(), 1);
        let mut line_starts = vec![0];
        line_starts.extend(content.match_indices('\n').map(|(idx, _)| idx + 1));
        Self {
            file_path,
            language,
            content,
            line_starts,
            root_id,
            components: vec![root],
            seen_ids,
            stack: ContainerStack::new(),
        }
    }

    #[must_use]
    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    #[must_use]
    pub fn file_path(&self) -> &str {
        self.file_path
    }

    #[must_use]
    pub fn content(&self) -> &'a str {
        self.content
    }

    /// Parent a new component would receive right now
    #[must_use]
    pub fn current_parent(&self) -> &str {
        self.stack.top().unwrap_or(&self.root_id)
    }

    /// Add a component under the current stack top. Returns its id.
    pub fn add(
        &mut self,
        component_type: ComponentType,
        name: &str,
        location: Location,
        code: String,
        metadata: ComponentMetadata,
    ) -> String {
        let parent = self.current_parent().to_string();
        self.add_with_parent(component_type, name, location, code, metadata, parent)
    }

    /// Add a component with an explicit parent (used where nesting is not positional)
    pub fn add_with_parent(
        &mut self,
        component_type: ComponentType,
        name: &str,
        location: Location,
        code: String,
        metadata: ComponentMetadata,
        parent_id: String,
    ) -> String {
        let id = self.unique_id(name, component_type);
        self.components.push(Component {
            id: id.clone(),
            name: name.to_string(),
            component_type,
            language: self.language,
            file_path: self.file_path.to_string(),
            location,
            parent_id: Some(parent_id),
            metadata,
            code,
        });
        id
    }

    /// Exact source text between two byte offsets
    #[must_use]
    pub fn slice(&self, start_byte: usize, end_byte: usize) -> &'a str {
        self.content
            .get(start_byte..end_byte.min(self.content.len()))
            .unwrap_or("")
    }

    /// Exact source text of a closed 1-based line range
    #[must_use]
    pub fn lines_text(&self, start_line: usize, end_line: usize) -> String {
        let start = self
            .line_starts
            .get(start_line.saturating_sub(1))
            .copied()
            .unwrap_or(self.content.len());
        let end = self
            .line_starts
            .get(end_line)
            .map(|next| next.saturating_sub(1))
            .unwrap_or(self.content.len());
        self.slice(start, end.max(start)).trim_end_matches('\r').to_string()
    }

    /// Flag the top-level component named `name` as exported (`export { name as alias }`).
    /// Returns false when no such declaration exists in this file.
    pub fn mark_exported(&mut self, name: &str, exported_name: &str) -> bool {
        let root_id = self.root_id.clone();
        let mut found = false;
        for component in self
            .components
            .iter_mut()
            .filter(|c| c.name == name && c.parent_id.as_deref() == Some(root_id.as_str()))
            .filter(|c| c.component_type != ComponentType::Import)
        {
            component.metadata.is_exported = true;
            component.metadata.exported_name = Some(exported_name.to_string());
            found = true;
        }
        found
    }

    /// Mutable access to an already added component
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.id == id)
    }

    /// First component named `name` whose type satisfies `filter`
    pub fn find_by_name(&self, name: &str, filter: impl Fn(ComponentType) -> bool) -> Option<String> {
        self.components
            .iter()
            .find(|c| c.name == name && filter(c.component_type))
            .map(|c| c.id.clone())
    }

    /// Take over components produced by another parse of this file (embedded code).
    ///
    /// Ids are re-issued against this batch; parent links inside the adopted set follow the
    /// renames, links to outside ids are kept.
    pub fn adopt(&mut self, components: Vec<Component>) {
        let mut renamed: HashMap<String, String> = HashMap::new();
        let mut adopted = Vec::with_capacity(components.len());
        for mut component in components {
            let id = self.unique_id(&component.name, component.component_type);
            renamed.insert(std::mem::replace(&mut component.id, id), component.id.clone());
            adopted.push(component);
        }
        for component in &mut adopted {
            if let Some(parent) = component.parent_id.as_mut() {
                if let Some(new_id) = renamed.get(parent.as_str()) {
                    *parent = new_id.clone();
                }
            }
        }
        self.components.extend(adopted);
    }

    /// First component matching `predicate`
    pub fn find_where(&self, predicate: impl Fn(&Component) -> bool) -> Option<String> {
        self.components
            .iter()
            .find(|c| predicate(c))
            .map(|c| c.id.clone())
    }

    fn unique_id(&mut self, name: &str, component_type: ComponentType) -> String {
        let base = generate_component_id(self.file_path, name, component_type);
        let count = self.seen_ids.entry(base.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base
        } else {
            format!("{base}#{count}")
        }
    }

    /// Seal the batch: repair orphans and return the components in discovery order.
    pub fn finish(self) -> Vec<Component> {
        repair_hierarchy(self.components)
    }

    /// Drop everything but the file root (used when extraction fails midway)
    pub fn into_root_only(mut self) -> Vec<Component> {
        self.components.truncate(1);
        self.components
    }
}

/// Re-parent every non-root component whose parent is missing from the batch, or whose
/// parent chain loops, to the file root. Adds a root if the batch has none.
pub fn repair_hierarchy(mut components: Vec<Component>) -> Vec<Component> {
    let Some(root_id) = components
        .iter()
        .find(|c| c.is_root())
        .map(|c| c.id.clone())
    else {
        return components;
    };

    let ids: HashSet<String> = components.iter().map(|c| c.id.clone()).collect();
    for component in components.iter_mut().filter(|c| !c.is_root()) {
        let valid = component
            .parent_id
            .as_ref()
            .is_some_and(|parent| ids.contains(parent) && parent != &component.id);
        if !valid {
            log::debug!("re-parenting orphan {} to file root", component.id);
            component.parent_id = Some(root_id.clone());
        }
    }

    let parents: HashMap<String, Option<String>> = components
        .iter()
        .map(|c| (c.id.clone(), c.parent_id.clone()))
        .collect();
    let looping: Vec<String> = components
        .iter()
        .filter(|c| !c.is_root() && has_cycle(&c.id, &parents))
        .map(|c| c.id.clone())
        .collect();
    for component in components.iter_mut() {
        if looping.contains(&component.id) {
            component.parent_id = Some(root_id.clone());
        }
    }

    components
}

fn has_cycle(start: &str, parents: &HashMap<String, Option<String>>) -> bool {
    let mut seen = HashSet::new();
    let mut current = Some(start.to_string());
    while let Some(id) = current {
        if !seen.insert(id.clone()) {
            return true;
        }
        current = parents.get(&id).cloned().flatten();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(batch: &mut ComponentBatch<'_>, ty: ComponentType, name: &str) -> String {
        batch.add(
            ty,
            name,
            Location::lines(1, 1),
            String::new(),
            ComponentMetadata::default(),
        )
    }

    #[test]
    fn stack_top_becomes_parent() {
        let content = "class A { m() {} }\n";
        let mut batch = ComponentBatch::new("a.ts", Language::TypeScript, content);
        let class_id = add(&mut batch, ComponentType::Class, "A");
        batch.stack.push(class_id.clone());
        let method_id = add(&mut batch, ComponentType::Method, "m");
        batch.stack.pop();
        let free_id = add(&mut batch, ComponentType::Function, "f");
        let root = batch.root_id().to_string();

        let components = batch.finish();
        let parent_of = |id: &str| {
            components
                .iter()
                .find(|c| c.id == id)
                .and_then(|c| c.parent_id.clone())
        };
        assert_eq!(parent_of(&class_id), Some(root.clone()));
        assert_eq!(parent_of(&method_id), Some(class_id));
        assert_eq!(parent_of(&free_id), Some(root));
    }

    #[test]
    fn duplicate_names_get_stable_suffixes() {
        let mut batch = ComponentBatch::new("a.md", Language::Markdown, "");
        let first = add(&mut batch, ComponentType::Section, "Usage");
        let second = add(&mut batch, ComponentType::Section, "Usage");
        assert_eq!(first, "a.md::section::Usage");
        assert_eq!(second, "a.md::section::Usage#2");
    }

    #[test]
    fn orphans_and_cycles_are_repaired() {
        let mut batch = ComponentBatch::new("a.py", Language::Python, "");
        let a = add(&mut batch, ComponentType::Function, "a");
        let b = add(&mut batch, ComponentType::Function, "b");
        let root = batch.root_id().to_string();
        let mut components = batch.components;
        for c in components.iter_mut() {
            if c.id == a {
                c.parent_id = Some(b.clone());
            } else if c.id == b {
                c.parent_id = Some(a.clone());
            }
        }
        components.push(Component {
            parent_id: Some("missing".to_string()),
            id: "a.py::function::ghost".to_string(),
            ..components[1].clone()
        });

        let repaired = repair_hierarchy(components);
        for c in repaired.iter().filter(|c| !c.is_root()) {
            assert_eq!(c.parent_id.as_deref(), Some(root.as_str()), "{}", c.id);
        }
    }

    #[test]
    fn mark_exported_only_touches_top_level() {
        let mut batch = ComponentBatch::new("a.ts", Language::TypeScript, "");
        let class_id = add(&mut batch, ComponentType::Class, "load");
        batch.stack.push(class_id.clone());
        let nested = add(&mut batch, ComponentType::Method, "load");
        batch.stack.pop();

        assert!(batch.mark_exported("load", "default"));
        assert!(!batch.mark_exported("missing", "missing"));
        let components = batch.finish();
        let get = |id: &str| components.iter().find(|c| c.id == id).cloned().expect("component");
        assert!(get(&class_id).metadata.is_exported);
        assert_eq!(get(&class_id).metadata.exported_name.as_deref(), Some("default"));
        assert!(!get(&nested).metadata.is_exported);
    }

    #[test]
    fn adopted_components_are_renamed_consistently() {
        let mut batch = ComponentBatch::new("a.md", Language::Markdown, "");
        let block = add(&mut batch, ComponentType::CodeBlock, "python");
        add(&mut batch, ComponentType::Function, "run");

        let mut other = ComponentBatch::new("a.md", Language::Python, "");
        other.stack.push(block.clone());
        let class_id = add(&mut other, ComponentType::Class, "Runner");
        other.stack.push(class_id);
        add(&mut other, ComponentType::Function, "run");
        let embedded: Vec<Component> = other.components.into_iter().skip(1).collect();

        batch.adopt(embedded);
        let components = batch.finish();
        let runner = components
            .iter()
            .find(|c| c.name == "Runner")
            .expect("adopted class");
        assert_eq!(runner.parent_id.as_deref(), Some(block.as_str()));
        let nested = components.last().expect("adopted function");
        assert_eq!(nested.id, "a.md::function::run#2");
        assert_eq!(nested.parent_id.as_deref(), Some(runner.id.as_str()));
    }

    #[test]
    fn lines_text_slices_closed_ranges() {
        let content = "one\ntwo\nthree\n";
        let batch = ComponentBatch::new("x.md", Language::Markdown, content);
        assert_eq!(batch.lines_text(2, 3), "two\nthree");
        assert_eq!(batch.lines_text(1, 1), "one");
    }
}
