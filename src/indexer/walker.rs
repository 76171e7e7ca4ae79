use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::{Walk, WalkBuilder};
use tracing::warn;

use crate::error::{IndexerError, Result};
use crate::indexer::ignore_rules::IgnoreRules;
use crate::languages::LanguageRegistry;

/// Path of `path` relative to `root`, `/`-separated.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Decides which files under a root are indexed.
pub struct FileWalker {
    registry: Arc<LanguageRegistry>,
    rules: Arc<IgnoreRules>,
    /// Lowercase extensions with a leading dot; empty means no restriction
    extensions: Vec<String>,
}

impl FileWalker {
    pub fn new(registry: Arc<LanguageRegistry>, rules: Arc<IgnoreRules>) -> Self {
        Self {
            registry,
            rules,
            extensions: Vec::new(),
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Lazily walks `root` in file-name order. Each call starts a new walk.
    pub fn walk(&self, root: &Path) -> Result<SelectedFiles<'_>> {
        if !root.is_dir() {
            return Err(IndexerError::InvalidRoot(root.to_path_buf()));
        }

        let filter_root = root.to_path_buf();
        let filter_rules = Arc::clone(&self.rules);
        let walk = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                entry.depth() == 0
                    || !filter_rules.is_ignored(&relative_path(&filter_root, entry.path()))
            })
            .build();

        Ok(SelectedFiles {
            walker: self,
            root: root.to_path_buf(),
            walk,
            errors: Vec::new(),
        })
    }

    /// Collects the whole walk.
    pub fn collect(&self, root: &Path) -> Result<Vec<PathBuf>> {
        Ok(self.walk(root)?.collect())
    }

    /// Extension/name and restriction checks; ignore rules are applied by
    /// the walk itself.
    pub fn is_supported(&self, path: &Path) -> bool {
        if !self.registry.is_recognized(path) {
            return false;
        }
        if self.extensions.is_empty() {
            return true;
        }
        self.registry
            .extension_of(path)
            .is_some_and(|ext| self.extensions.contains(&ext))
    }
}

/// Result of a finished walk.
#[derive(Debug, Default)]
pub struct Selection {
    pub files: Vec<PathBuf>,
    /// Directories or entries that could not be read; their files are missing
    pub errors: Vec<IndexerError>,
}

/// Selected files of one walk, produced as the walk proceeds.
pub struct SelectedFiles<'a> {
    walker: &'a FileWalker,
    root: PathBuf,
    walk: Walk,
    errors: Vec<IndexerError>,
}

impl SelectedFiles<'_> {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk errors met so far.
    pub fn errors(&self) -> &[IndexerError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<IndexerError> {
        self.errors
    }
}

fn keep_walk_error(errors: &mut Vec<IndexerError>, root: &Path, err: ignore::Error) {
    let err = IndexerError::from(err);
    warn!("Walk under {} incomplete: {}", root.display(), err);
    errors.push(err);
}

impl Iterator for SelectedFiles<'_> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        for entry in self.walk.by_ref() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    keep_walk_error(&mut self.errors, &self.root, e);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            if self.walker.is_supported(entry.path()) {
                return Some(entry.into_path());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_walker(root: &Path) -> FileWalker {
        let rules = IgnoreRules::load(root, &IndexConfig::default());
        FileWalker::new(Arc::new(LanguageRegistry::new()), Arc::new(rules))
    }

    fn create_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    fn relative(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files.iter().map(|f| relative_path(root, f)).collect()
    }

    #[test]
    fn test_walk_is_sorted_and_recursive() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "z.py", "");
        create_file(temp_dir.path(), "a.js", "");
        create_file(temp_dir.path(), "src/module/deep/file.rs", "");
        create_file(temp_dir.path(), "src/lib.rs", "");

        let files = create_walker(temp_dir.path()).collect(temp_dir.path()).unwrap();

        assert_eq!(
            relative(temp_dir.path(), &files),
            vec!["a.js", "src/lib.rs", "src/module/deep/file.rs", "z.py"]
        );
    }

    #[test]
    fn test_walk_selects_recognized_only() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "main.py", "");
        create_file(temp_dir.path(), "README.md", "# Readme");
        create_file(temp_dir.path(), "Makefile", "all:");
        create_file(temp_dir.path(), ".env", "A=1");
        create_file(temp_dir.path(), "notes.txt", "");
        create_file(temp_dir.path(), "logo.png", "");

        let files = create_walker(temp_dir.path()).collect(temp_dir.path()).unwrap();

        assert_eq!(
            relative(temp_dir.path(), &files),
            vec![".env", "Makefile", "README.md", "main.py"]
        );
    }

    #[test]
    fn test_walk_skips_builtin_and_ignore_file_dirs() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), ".gitignore", "generated/\n*.min.js\n");
        create_file(temp_dir.path(), "src/app.js", "");
        create_file(temp_dir.path(), "src/app.min.js", "");
        create_file(temp_dir.path(), "node_modules/lib/index.js", "");
        create_file(temp_dir.path(), "build/out.py", "");
        create_file(temp_dir.path(), "pkg/generated/api.py", "");

        let files = create_walker(temp_dir.path()).collect(temp_dir.path()).unwrap();

        assert_eq!(relative(temp_dir.path(), &files), vec!["src/app.js"]);
    }

    #[test]
    fn test_walk_extension_restriction() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "a.py", "");
        create_file(temp_dir.path(), "b.js", "");
        create_file(temp_dir.path(), "C.PY", "");

        let walker = create_walker(temp_dir.path()).with_extensions(vec![".py".to_string()]);
        let files = walker.collect(temp_dir.path()).unwrap();

        assert_eq!(relative(temp_dir.path(), &files), vec!["C.PY", "a.py"]);
    }

    #[test]
    fn test_walk_is_restartable_and_lazy() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "a.py", "");
        create_file(temp_dir.path(), "b.py", "");

        let walker = create_walker(temp_dir.path());
        let mut first = walker.walk(temp_dir.path()).unwrap();
        assert!(first.next().is_some());

        let again: Vec<PathBuf> = walker.walk(temp_dir.path()).unwrap().collect();
        assert_eq!(again.len(), 2);
    }

    #[test]
    fn test_walk_invalid_root() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "file.py", "");
        let walker = create_walker(temp_dir.path());

        assert!(matches!(
            walker.walk(&temp_dir.path().join("file.py")),
            Err(IndexerError::InvalidRoot(_))
        ));
        assert!(matches!(
            walker.walk(&temp_dir.path().join("missing")),
            Err(IndexerError::InvalidRoot(_))
        ));
    }

    #[test]
    fn test_walk_errors_are_kept() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "a.py", "");
        let walker = create_walker(temp_dir.path());

        let denied = ignore::Error::WithPath {
            path: temp_dir.path().join("locked"),
            err: Box::new(ignore::Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "permission denied",
            ))),
        };

        let mut walk = walker.walk(temp_dir.path()).unwrap();
        keep_walk_error(&mut walk.errors, temp_dir.path(), denied);
        let files: Vec<PathBuf> = walk.by_ref().collect();

        assert_eq!(relative(temp_dir.path(), &files), vec!["a.py"]);
        assert_eq!(walk.errors().len(), 1);
        assert!(matches!(walk.errors()[0], IndexerError::Walk(_)));
        assert!(walk.errors()[0].to_string().contains("locked"));
    }

    #[test]
    fn test_walk_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let files = create_walker(temp_dir.path()).collect(temp_dir.path()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(relative_path(Path::new("/a"), Path::new("/a/b/c.py")), "b/c.py");
        assert_eq!(relative_path(Path::new("/a"), Path::new("/a")), "");
    }
}
