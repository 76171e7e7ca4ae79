pub mod extractor;
pub mod ignore_rules;
pub mod pipeline;
pub mod progress;
pub mod walker;

pub use extractor::{ExtractionResult, SymbolExtractor};
pub use ignore_rules::{IgnoreCache, IgnoreRules, BUILTIN_IGNORE_DIRS};
pub use pipeline::{index_directory, IndexContext};
pub use progress::{IndexingProgress, Phase, ProgressSnapshot};
pub use walker::{relative_path, FileWalker, SelectedFiles, Selection};
