//! Combines per-file results, the call graph and directory purposes into
//! one `ProjectIndex`.

use std::collections::BTreeMap;
use std::path::Path;

use super::call_graph::CallGraph;
use super::models::{FileEntry, FileRecord, IndexStats, ProjectIndex, SymbolTable};

/// Collects the outcome of Phase A; `finish` produces the index.
pub struct IndexAssembler {
    root: String,
    files: BTreeMap<String, FileEntry>,
    skipped: usize,
    degraded: usize,
    walk_errors: usize,
}

impl IndexAssembler {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_string_lossy().replace('\\', "/"),
            files: BTreeMap::new(),
            skipped: 0,
            degraded: 0,
            walk_errors: 0,
        }
    }

    /// Adds an extracted file. A later record for the same path replaces
    /// the earlier one.
    pub fn add_file(&mut self, record: FileRecord, symbols: SymbolTable) {
        self.files
            .insert(record.path.clone(), FileEntry { record, symbols });
    }

    /// Counts a selected file that could not be indexed.
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Counts a file added with an excerpt in place of its symbols.
    pub fn record_degraded(&mut self) {
        self.degraded += 1;
    }

    pub fn record_walk_errors(&mut self, count: usize) {
        self.walk_errors += count;
    }

    pub fn symbol_tables(&self) -> impl Iterator<Item = &SymbolTable> + Clone {
        self.files.values().map(|entry| &entry.symbols)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn finish(
        self,
        call_graph: CallGraph,
        directory_purposes: BTreeMap<String, String>,
    ) -> ProjectIndex {
        let stats = IndexStats {
            files_selected: self.files.len() + self.skipped,
            files_indexed: self.files.len(),
            files_skipped: self.skipped,
            files_degraded: self.degraded,
            walk_errors: self.walk_errors,
            symbols: self.files.values().map(|e| e.symbols.symbol_count()).sum(),
        };

        ProjectIndex {
            root: self.root,
            files: self.files,
            call_graph,
            directory_purposes,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::models::FunctionInfo;

    fn table_with(functions: &[&str]) -> SymbolTable {
        let mut table = SymbolTable::new();
        for name in functions {
            table.functions.insert(name.to_string(), FunctionInfo::new("()", 1));
        }
        table
    }

    #[test]
    fn test_finish_computes_stats() {
        let mut assembler = IndexAssembler::new(Path::new("/work/proj"));
        assembler.add_file(
            FileRecord::new("src/b.py", Some("python".into()), "def g(): pass\n"),
            table_with(&["g"]),
        );
        assembler.add_file(
            FileRecord::new("src/a.py", Some("python".into()), "def f(): pass\n"),
            table_with(&["f", "h"]),
        );
        assembler.record_skipped();
        assembler.record_degraded();
        assembler.record_walk_errors(2);

        let index = assembler.finish(CallGraph::default(), BTreeMap::new());

        assert_eq!(index.root, "/work/proj");
        assert_eq!(index.files.keys().collect::<Vec<_>>(), vec!["src/a.py", "src/b.py"]);
        assert_eq!(
            index.stats,
            IndexStats {
                files_selected: 3,
                files_indexed: 2,
                files_skipped: 1,
                files_degraded: 1,
                walk_errors: 2,
                symbols: 3,
            }
        );
    }

    #[test]
    fn test_same_path_replaces() {
        let mut assembler = IndexAssembler::new(Path::new("."));
        assembler.add_file(FileRecord::new("a.sh", Some("shell".into()), "a"), table_with(&["x"]));
        assembler.add_file(FileRecord::new("a.sh", Some("shell".into()), "b"), table_with(&["y"]));
        assert_eq!(assembler.file_count(), 1);
        assert_eq!(assembler.paths().collect::<Vec<_>>(), vec!["a.sh"]);

        let index = assembler.finish(CallGraph::default(), BTreeMap::new());
        assert!(index.files["a.sh"].symbols.functions.contains_key("y"));
    }

    #[test]
    fn test_index_json_shape() {
        let mut assembler = IndexAssembler::new(Path::new("root"));
        assembler.add_file(FileRecord::new("x.md", Some("markdown".into()), "# T\n"), SymbolTable::new());
        let purposes = BTreeMap::from([("docs".to_string(), "Documentation".to_string())]);
        let index = assembler.finish(CallGraph::default(), purposes);

        let json: serde_json::Value = serde_json::from_str(&index.to_json(true).unwrap()).unwrap();
        assert_eq!(json["root"], "root");
        assert_eq!(json["files"]["x.md"]["language"], "markdown");
        assert!(json["call_graph"]["forward"].as_object().unwrap().is_empty());
        assert_eq!(json["directory_purposes"]["docs"], "Documentation");
        assert_eq!(json["stats"]["files_indexed"], 1);
        assert_eq!(json["stats"]["files_degraded"], 0);
        assert_eq!(json["stats"]["walk_errors"], 0);
    }
}
