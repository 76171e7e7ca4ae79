//! One indexing run.
//!
//! Phase A reads and extracts every selected file on a rayon pool; the
//! workers share nothing but the progress counters. Phase B runs after all
//! of Phase A has finished and builds the call graph, the directory
//! purposes and the final index.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::IndexConfig;
use crate::error::{IndexerError, Result};
use crate::index::{CallGraph, IndexAssembler, ProjectIndex};
use crate::indexer::extractor::{ExtractionResult, SymbolExtractor};
use crate::indexer::ignore_rules::IgnoreCache;
use crate::indexer::progress::IndexingProgress;
use crate::indexer::walker::{FileWalker, Selection};
use crate::languages::LanguageRegistry;
use crate::semantic::directory_purposes;

/// State owned by one run: configuration, language tables, parsed ignore
/// rules and progress counters.
pub struct IndexContext {
    config: IndexConfig,
    registry: Arc<LanguageRegistry>,
    ignore_cache: IgnoreCache,
    progress: IndexingProgress,
}

impl IndexContext {
    pub fn new(config: IndexConfig) -> Self {
        let registry = Arc::new(LanguageRegistry::from_config(&config));
        Self {
            config,
            registry,
            ignore_cache: IgnoreCache::new(),
            progress: IndexingProgress::new(),
        }
    }

    /// Shares `progress` with the caller, e.g. to drive a progress bar.
    pub fn with_progress(mut self, progress: IndexingProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<LanguageRegistry> {
        &self.registry
    }

    pub fn progress(&self) -> &IndexingProgress {
        &self.progress
    }

    pub fn ignore_cache(&self) -> &IgnoreCache {
        &self.ignore_cache
    }

    /// File selector for `root`, reusing the rules parsed earlier in this run.
    pub fn walker(&mut self, root: &Path) -> FileWalker {
        let rules = self.ignore_cache.get_or_load(root, &self.config);
        FileWalker::new(Arc::clone(&self.registry), rules)
            .with_extensions(self.config.normalized_extensions())
    }

    /// Selected files under `root` in walk order, counted into the
    /// progress as they are found.
    pub fn select(&mut self, root: &Path) -> Result<Selection> {
        let walker = self.walker(root);
        let progress = &self.progress;
        progress.begin_selection();

        let mut walk = walker.walk(root)?;
        let files = walk.by_ref().inspect(|_| progress.file_selected()).collect();
        Ok(Selection {
            files,
            errors: walk.into_errors(),
        })
    }

    pub fn index(&mut self, root: &Path) -> Result<ProjectIndex> {
        let started = Instant::now();
        let selection = self.select(root)?;
        info!("Selected {} files under {}", selection.files.len(), root.display());
        if !selection.errors.is_empty() {
            warn!(
                "{} entries under {} could not be walked",
                selection.errors.len(),
                root.display()
            );
        }

        let results = self.extract_all(root, &selection.files)?;

        // Phase B
        self.progress.begin_assembly();
        let mut assembler = IndexAssembler::new(root);
        assembler.record_walk_errors(selection.errors.len());
        for result in results {
            match result {
                Some(extracted) => {
                    if extracted.degraded {
                        assembler.record_degraded();
                    }
                    assembler.add_file(extracted.record, extracted.symbols);
                }
                None => assembler.record_skipped(),
            }
        }

        let call_graph = CallGraph::build(assembler.symbol_tables());
        debug!("Call graph: {} edges", call_graph.edge_count());
        let purposes = directory_purposes(assembler.paths());

        let index = assembler.finish(call_graph, purposes);
        self.progress.finish();
        info!(
            "Indexed {} files ({} skipped, {} degraded), {} symbols in {:?}",
            index.stats.files_indexed,
            index.stats.files_skipped,
            index.stats.files_degraded,
            index.stats.symbols,
            started.elapsed()
        );
        Ok(index)
    }

    /// Phase A. `None` marks a file that could not be read.
    fn extract_all(&self, root: &Path, files: &[PathBuf]) -> Result<Vec<Option<ExtractionResult>>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| IndexerError::Config(format!("Cannot start worker pool: {}", e)))?;

        let extractor = SymbolExtractor::new(Arc::clone(&self.registry));
        let progress = &self.progress;
        progress.begin_extraction();

        let results = pool.install(|| {
            files
                .par_iter()
                .map(|path| match extractor.extract_file(root, path) {
                    Ok(result) => {
                        progress.file_indexed(result.symbols.symbol_count(), result.degraded);
                        Some(result)
                    }
                    Err(e) => {
                        warn!("Skipping {}: {}", path.display(), e);
                        progress.file_skipped();
                        None
                    }
                })
                .collect()
        });

        Ok(results)
    }
}

/// Indexes `root` with `config` in a fresh context.
pub fn index_directory(root: &Path, config: IndexConfig) -> Result<ProjectIndex> {
    IndexContext::new(config).index(root)
}
