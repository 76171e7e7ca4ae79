use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{IndexerError, Result};
use crate::index::{FileRecord, SymbolTable};
use crate::indexer::walker::relative_path;
use crate::languages::LanguageRegistry;
use crate::semantic::infer_file_purpose;

/// One extracted file: its metadata and symbols.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub record: FileRecord,
    pub symbols: SymbolTable,
    /// The extractor panicked and the symbols are an excerpt
    pub degraded: bool,
}

/// Reads a file, resolves its language and runs the matching extractor.
pub struct SymbolExtractor {
    registry: Arc<LanguageRegistry>,
}

impl SymbolExtractor {
    pub fn new(registry: Arc<LanguageRegistry>) -> Self {
        Self { registry }
    }

    /// Extracts `path`, keyed by its path relative to `root`.
    ///
    /// Fails only when the file cannot be read or is not UTF-8.
    pub fn extract_file(&self, root: &Path, path: &Path) -> Result<ExtractionResult> {
        let bytes = fs::read(path)?;
        let content = String::from_utf8(bytes)
            .map_err(|_| IndexerError::Parse(format!("{} is not valid UTF-8", path.display())))?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

        Ok(self.extract_content(&relative_path(root, path), content))
    }

    /// Extracts already-loaded content. Never fails.
    pub fn extract_content(&self, rel_path: &str, content: &str) -> ExtractionResult {
        let path = Path::new(rel_path);
        let language = self.registry.resolve(path, content);

        let mut record = FileRecord::new(rel_path, language.clone(), content);
        record.purpose = infer_file_purpose(path).map(str::to_string);

        let Some(language) = language else {
            debug!("{}: no language, metadata only", rel_path);
            return ExtractionResult {
                record,
                symbols: SymbolTable::new(),
                degraded: false,
            };
        };

        let extractor = self.registry.extractor_for(&language);
        debug!("{}: {} via {} extractor", rel_path, language, extractor.name());

        match panic::catch_unwind(AssertUnwindSafe(|| extractor.extract(content))) {
            Ok(symbols) => ExtractionResult {
                record,
                symbols,
                degraded: false,
            },
            Err(_) => {
                warn!(
                    "{}: {} extractor failed, storing an excerpt",
                    rel_path,
                    extractor.name()
                );
                ExtractionResult {
                    record,
                    symbols: SymbolTable::excerpt_only(content, self.registry.excerpt_chars()),
                    degraded: true,
                }
            }
        }
    }
}
