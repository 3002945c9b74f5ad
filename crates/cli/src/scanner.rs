use context_code_parser::ParserRegistry;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Finds files some parser understands, honouring `.gitignore`
pub struct FileScanner<'a> {
    root: PathBuf,
    parsers: &'a ParserRegistry,
    max_file_bytes: u64,
}

impl<'a> FileScanner<'a> {
    pub fn new(root: impl AsRef<Path>, parsers: &'a ParserRegistry) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            parsers,
            max_file_bytes: 0,
        }
    }

    /// Skip files larger than `bytes` (0 = no limit)
    pub fn max_file_bytes(mut self, bytes: usize) -> Self {
        self.max_file_bytes = bytes as u64;
        self
    }

    /// Supported files under the root, sorted
    pub fn scan(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let root = self.root.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true);
        builder.filter_entry(move |entry| !is_ignored_scope(entry.path(), &root));

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    if !entry.file_type().is_some_and(|t| t.is_file()) {
                        continue;
                    }
                    let path = entry.path();
                    if !self.parsers.supports_path(path) {
                        continue;
                    }
                    if self.max_file_bytes > 0 {
                        if let Ok(meta) = entry.metadata() {
                            if meta.len() > self.max_file_bytes {
                                log::debug!(
                                    "Skipping large file {} ({} bytes > {})",
                                    path.display(),
                                    meta.len(),
                                    self.max_file_bytes
                                );
                                continue;
                            }
                        }
                    }
                    files.push(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        files.sort();
        log::info!("Found {} source files under {}", files.len(), self.root.display());
        files
    }
}

fn is_ignored_scope(path: &Path, root: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    relative.components().any(|component| match component {
        std::path::Component::Normal(name) => {
            let lowered = name.to_string_lossy().to_lowercase();
            IGNORED_SCOPES.contains(&lowered.as_str())
        }
        _ => false,
    })
}

const IGNORED_SCOPES: &[&str] = &[
    // VCS / tooling
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    // caches / builds
    "node_modules",
    ".next",
    ".turbo",
    "build",
    "dist",
    "coverage",
    "target",
    ".venv",
    "__pycache__",
    // vendored code
    "vendor",
    "third_party",
    "third-party",
];

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_supported_files_only() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::create_dir_all(temp.path().join("node_modules/lib")).unwrap();
        fs::write(temp.path().join("src/app.ts"), "export const a = 1;\n").unwrap();
        fs::write(temp.path().join("README.md"), "# Readme\n").unwrap();
        fs::write(temp.path().join("notes.txt"), "plain\n").unwrap();
        fs::write(temp.path().join("node_modules/lib/index.js"), "x()\n").unwrap();

        let parsers = ParserRegistry::default();
        let files = FileScanner::new(temp.path(), &parsers).scan();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(temp.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["README.md", "src/app.ts"]);
    }

    #[test]
    fn respects_size_limit() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("big.py"), "x = 1\n".repeat(100)).unwrap();
        fs::write(temp.path().join("small.py"), "x = 1\n").unwrap();

        let parsers = ParserRegistry::default();
        let files = FileScanner::new(temp.path(), &parsers)
            .max_file_bytes(64)
            .scan();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("small.py"));
    }
}
