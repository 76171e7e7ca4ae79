use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::call_graph::CallGraph;

// =====================================================
// Symbol Table Types
// =====================================================

/// A module-level function or a class method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    /// Parameter list with optional return annotation, e.g. `(a, b) -> int`
    pub signature: String,
    /// Line number (1-based)
    pub line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<String>,
    /// Names of known functions called from the body, sorted and unique
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<String>,
}

impl FunctionInfo {
    pub fn new(signature: impl Into<String>, line: usize) -> Self {
        Self {
            signature: signature.into(),
            line,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    #[default]
    Normal,
    Enum,
    Exception,
}

impl ClassKind {
    /// Classifies a class from its base list.
    pub fn from_bases(bases: &[String]) -> Self {
        let lowered: Vec<String> = bases.iter().map(|b| b.to_lowercase()).collect();
        if lowered.iter().any(|b| b.contains("enum")) {
            ClassKind::Enum
        } else if lowered
            .iter()
            .any(|b| b.contains("exception") || b.contains("error"))
        {
            ClassKind::Exception
        } else {
            ClassKind::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassKind::Normal => "normal",
            ClassKind::Enum => "enum",
            ClassKind::Exception => "exception",
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub line: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inherits: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub methods: BTreeMap<String, FunctionInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub constants: BTreeMap<String, ValueKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: ClassKind,
    #[serde(rename = "abstract", default, skip_serializing_if = "is_false")]
    pub is_abstract: bool,
    /// Uppercase members collected while the class is open; consumed by enum promotion
    #[serde(skip)]
    pub members: Vec<String>,
}

impl ClassInfo {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumInfo {
    /// Member names in declaration order
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceInfo {
    pub line: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

/// Inferred type of a constant or exported variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Collection,
    Str,
    Number,
    Value,
}

impl ValueKind {
    /// Infers the kind from the right-hand side of an assignment.
    pub fn infer(value: &str) -> Self {
        let value = value.trim();
        if value.starts_with('{') || value.starts_with('[') {
            ValueKind::Collection
        } else if value.starts_with('"') || value.starts_with('\'') || value.starts_with('`') {
            ValueKind::Str
        } else {
            let digits: String = value
                .chars()
                .filter(|c| *c != '.' && *c != '-' && *c != '_')
                .collect();
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                ValueKind::Number
            } else {
                ValueKind::Value
            }
        }
    }
}

/// Outline of a markdown document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOutline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub architecture_hints: Vec<String>,
}

/// Per-file structured symbol record. Every extractor produces this shape.
///
/// `functions` and `classes` are always written, empty or not; the other
/// collections are omitted when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    #[serde(default)]
    pub functions: BTreeMap<String, FunctionInfo>,
    #[serde(default)]
    pub classes: BTreeMap<String, ClassInfo>,
    /// Imported modules in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub constants: BTreeMap<String, ValueKind>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub type_aliases: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub enums: BTreeMap<String, EnumInfo>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub interfaces: BTreeMap<String, InterfaceInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub exports: BTreeMap<String, ValueKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<DocumentOutline>,
    /// Top-level keys of a JSON or YAML document
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_level_keys: Vec<String>,
    /// Bounded raw excerpt, stored only when nothing structured was recognized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding only a bounded excerpt of `content`.
    pub fn excerpt_only(content: &str, max_chars: usize) -> Self {
        Self {
            excerpt: Some(content.chars().take(max_chars).collect()),
            ..Default::default()
        }
    }

    /// True when no structured symbol of any kind was recognized.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
            && self.classes.is_empty()
            && self.imports.is_empty()
            && self.constants.is_empty()
            && self.type_aliases.is_empty()
            && self.enums.is_empty()
            && self.interfaces.is_empty()
            && self.variables.is_empty()
            && self.exports.is_empty()
            && self.namespace.is_none()
            && self.outline.is_none()
            && self.top_level_keys.is_empty()
    }

    /// Declared symbols: functions, classes, methods, enums, interfaces,
    /// constants and type aliases.
    pub fn symbol_count(&self) -> usize {
        self.functions.len()
            + self.classes.len()
            + self.classes.values().map(|c| c.methods.len()).sum::<usize>()
            + self.enums.len()
            + self.interfaces.len()
            + self.constants.len()
            + self.type_aliases.len()
    }

    /// Adds an import once, keeping first-seen order.
    pub fn add_import(&mut self, module: impl Into<String>) {
        let module = module.into();
        if !module.is_empty() && !self.imports.contains(&module) {
            self.imports.push(module);
        }
    }

    pub fn add_variable(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.variables.contains(&name) {
            self.variables.push(name);
        }
    }

    /// Moves every enum-kind class into `enums`, carrying its members.
    pub fn promote_enums(&mut self) {
        let names: Vec<String> = self
            .classes
            .iter()
            .filter(|(_, c)| c.kind == ClassKind::Enum)
            .map(|(name, _)| name.clone())
            .collect();

        for name in names {
            if let Some(class) = self.classes.remove(&name) {
                self.enums.insert(
                    name,
                    EnumInfo {
                        values: class.members,
                        line: Some(class.line),
                        doc: class.doc,
                    },
                );
            }
        }
    }
}

// =====================================================
// File and Project Types
// =====================================================

/// Per-file metadata. The content itself is not retained; `content_hash`
/// identifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the root, `/`-separated; used as the map key
    #[serde(skip)]
    pub path: String,
    pub language: Option<String>,
    pub size: u64,
    pub line_count: usize,
    /// xxh3-64 of the content, lowercase hex
    pub content_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, language: Option<String>, content: &str) -> Self {
        Self {
            path: path.into(),
            language,
            size: content.len() as u64,
            line_count: content.lines().count(),
            content_hash: content_hash(content),
            purpose: None,
        }
    }
}

pub fn content_hash(content: &str) -> String {
    format!("{:016x}", xxhash_rust::xxh3::xxh3_64(content.as_bytes()))
}

/// One entry of `ProjectIndex::files`: metadata and symbols side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    #[serde(flatten)]
    pub record: FileRecord,
    #[serde(flatten)]
    pub symbols: SymbolTable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub files_selected: usize,
    pub files_indexed: usize,
    pub files_skipped: usize,
    /// Indexed files whose extractor failed; they carry an excerpt only
    #[serde(default)]
    pub files_degraded: usize,
    /// Entries the directory walk could not read
    #[serde(default)]
    pub walk_errors: usize,
    pub symbols: usize,
}

/// The complete output of one indexing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectIndex {
    pub root: String,
    pub files: BTreeMap<String, FileEntry>,
    pub call_graph: CallGraph,
    pub directory_purposes: BTreeMap<String, String>,
    pub stats: IndexStats,
}

impl ProjectIndex {
    pub fn to_json(&self, pretty: bool) -> crate::error::Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    pub fn file(&self, path: &str) -> Option<&FileEntry> {
        self.files.get(path)
    }
}
