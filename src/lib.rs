pub mod config;
pub mod error;
pub mod index;
pub mod indexer;
pub mod languages;
pub mod semantic;

pub use config::IndexConfig;
pub use error::{IndexerError, Result};
pub use index::{
    CallGraph, ClassInfo, ClassKind, DocumentOutline, EnumInfo, FileEntry, FileRecord,
    FunctionInfo, IndexStats, InterfaceInfo, ProjectIndex, SymbolTable, ValueKind,
};
pub use indexer::{index_directory, FileWalker, IndexContext, IndexingProgress, SymbolExtractor};
pub use languages::{LanguageExtractor, LanguageRegistry};
