//! Run configuration.
//!
//! Loaded from an explicit YAML file or from `.source-indexer.yml` at the
//! indexed root. Every field has a default so a partial file is valid.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{IndexerError, Result};

/// Config file looked up at the root when no explicit file is given.
pub const CONFIG_FILENAME: &str = ".source-indexer.yml";

/// Default size of the raw excerpt stored for unparsed files.
pub const DEFAULT_EXCERPT_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Restrict scanning to these extensions (with or without the leading dot).
    pub extensions: Vec<String>,
    /// Ignore file read from the root.
    pub ignore_file: String,
    /// Directory names ignored in addition to the built-in set.
    pub extra_ignore_dirs: Vec<String>,
    /// Extension to language overrides, e.g. `".inc": "php"`.
    pub extension_overrides: BTreeMap<String, String>,
    /// Tie-break language per ambiguous extension, e.g. `".pl": "perl"`.
    pub tie_breaks: BTreeMap<String, String>,
    pub excerpt_chars: usize,
    /// Worker threads for extraction; 0 uses every core.
    pub threads: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
            ignore_file: ".gitignore".to_string(),
            extra_ignore_dirs: Vec::new(),
            extension_overrides: BTreeMap::new(),
            tie_breaks: BTreeMap::new(),
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
            threads: 0,
        }
    }
}

impl IndexConfig {
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| IndexerError::Config(format!("Invalid config YAML: {}", e)))
    }

    /// Loads an explicitly requested config file. Errors are fatal here.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            IndexerError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Loads `.source-indexer.yml` from the root if present.
    ///
    /// A missing file yields defaults; a malformed one is logged and ignored.
    pub fn discover(root: &Path) -> Self {
        let path = root.join(CONFIG_FILENAME);
        let Ok(content) = fs::read_to_string(&path) else {
            return Self::default();
        };
        match Self::parse(&content) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Normalized extension restriction: lowercase, leading dot.
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.extensions.iter().map(|e| normalize_extension(e)).collect()
    }
}

/// Lowercases an extension and makes sure it starts with a dot.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim();
    if ext.starts_with('.') {
        ext.to_lowercase()
    } else {
        format!(".{}", ext.to_lowercase())
    }
}
