//! Ignore policy for file selection.
//!
//! The union of a built-in directory set, configured extra directories and
//! the patterns read from an ignore file at the root. A pattern is tested
//! against every path segment and every leading sub-path, so a match on a
//! directory excludes its whole subtree.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::IndexConfig;

/// Directory names never descended into.
pub const BUILTIN_IGNORE_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "bower_components",
    "vendor",
    "packages",
    "pkg",
    "__pycache__",
    ".venv",
    "venv",
    "env",
    "virtualenv",
    ".pytest_cache",
    "eggs",
    ".eggs",
    ".tox",
    "htmlcov",
    "build",
    "dist",
    ".next",
    ".netlify",
    ".vercel",
    "target",
    "out",
    "bin",
    "obj",
    "coverage",
    ".nyc_output",
    ".idea",
    ".vscode",
    ".DS_Store",
    ".vs",
    "archive",
    ".archive",
    "archived-sessions",
    ".serena",
    ".claude",
];

#[derive(Debug, Clone)]
enum IgnorePattern {
    Glob(glob::Pattern),
    /// A line that is not a valid glob, compared verbatim
    Literal(String),
}

impl IgnorePattern {
    fn parse(line: &str) -> Self {
        match glob::Pattern::new(line) {
            Ok(pattern) => IgnorePattern::Glob(pattern),
            Err(e) => {
                debug!("Keeping ignore pattern {:?} as a literal: {}", line, e);
                IgnorePattern::Literal(line.to_string())
            }
        }
    }

    fn matches(&self, candidate: &str) -> bool {
        match self {
            IgnorePattern::Glob(pattern) => pattern.matches(candidate),
            IgnorePattern::Literal(literal) => literal == candidate,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    dirs: BTreeSet<String>,
    patterns: Vec<IgnorePattern>,
}

impl IgnoreRules {
    /// Built-in directories only.
    pub fn builtin() -> Self {
        Self {
            dirs: BUILTIN_IGNORE_DIRS.iter().map(|d| d.to_string()).collect(),
            patterns: Vec::new(),
        }
    }

    /// Built-in and configured directories plus the patterns of the
    /// configured ignore file under `root`. A missing or unreadable ignore
    /// file adds nothing.
    pub fn load(root: &Path, config: &IndexConfig) -> Self {
        let mut rules = Self::builtin();
        rules
            .dirs
            .extend(config.extra_ignore_dirs.iter().map(|d| d.trim_matches('/').to_string()));

        let ignore_path = root.join(&config.ignore_file);
        match fs::read_to_string(&ignore_path) {
            Ok(content) => {
                rules.add_patterns(&content);
                debug!(
                    "Loaded {} ignore patterns from {}",
                    rules.patterns.len(),
                    ignore_path.display()
                );
            }
            Err(e) => debug!("No ignore patterns from {}: {}", ignore_path.display(), e),
        }
        rules
    }

    /// Parses ignore-file content. Blank lines, `#` comments and `!`
    /// negations are skipped.
    pub fn add_patterns(&mut self, content: &str) {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let line = line.trim_matches('/');
            if line.is_empty() {
                continue;
            }
            self.patterns.push(IgnorePattern::parse(line));
        }
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// True when `rel_path` (relative to the root, `/`-separated) or any
    /// directory above it is ignored.
    pub fn is_ignored(&self, rel_path: &str) -> bool {
        let rel_path = rel_path.trim_matches('/');
        if rel_path.is_empty() {
            return false;
        }

        let mut prefix_end = 0;
        for segment in rel_path.split('/') {
            prefix_end += segment.len();
            let prefix = &rel_path[..prefix_end];
            prefix_end += 1;

            if self.dirs.contains(segment) {
                return true;
            }
            if self
                .patterns
                .iter()
                .any(|p| p.matches(segment) || p.matches(prefix))
            {
                return true;
            }
        }
        false
    }
}

/// Parsed rules per root, owned by one run.
#[derive(Debug, Default)]
pub struct IgnoreCache {
    rules: HashMap<PathBuf, Arc<IgnoreRules>>,
}

impl IgnoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&mut self, root: &Path, config: &IndexConfig) -> Arc<IgnoreRules> {
        Arc::clone(
            self.rules
                .entry(root.to_path_buf())
                .or_insert_with(|| Arc::new(IgnoreRules::load(root, config))),
        )
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
