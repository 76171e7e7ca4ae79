//! Best-effort extraction for languages without a dedicated extractor.
//!
//! A handful of per-language regexes find function, class and import
//! names; JSON, YAML and TOML documents report their top-level keys. When
//! nothing is recognized the table carries a bounded excerpt instead.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use super::common::{line_of_offset, normalize_whitespace};
use super::LanguageExtractor;
use crate::index::{ClassInfo, FunctionInfo, SymbolTable};

const MAX_TOP_LEVEL_KEYS: usize = 50;

/// Names the C-family function pattern picks up from control statements.
const C_KEYWORDS: &[&str] = &["if", "while", "for", "switch", "return", "else", "sizeof", "catch", "do"];

struct Patterns {
    functions: Vec<Regex>,
    classes: Vec<Regex>,
    imports: Vec<Regex>,
}

impl Patterns {
    fn new(functions: &[&str], classes: &[&str], imports: &[&str]) -> Self {
        let compile = |patterns: &[&str]| -> Vec<Regex> {
            patterns
                .iter()
                .map(|p| Regex::new(&format!("(?m){}", p)).unwrap())
                .collect()
        };
        Self {
            functions: compile(functions),
            classes: compile(classes),
            imports: compile(imports),
        }
    }
}

static PATTERNS: Lazy<HashMap<&'static str, Arc<Patterns>>> = Lazy::new(|| {
    let mut map = HashMap::new();
    let mut add = |languages: &[&'static str], patterns: Patterns| {
        let patterns = Arc::new(patterns);
        for language in languages {
            map.insert(*language, Arc::clone(&patterns));
        }
    };

    add(
        &["python", "renpy"],
        Patterns::new(
            &[r"^\s*(?:async\s+)?def\s+(\w+)\s*\("],
            &[r"^\s*class\s+(\w+)"],
            &[r"^import\s+([\w.]+)", r"^from\s+([\w.]+)\s+import"],
        ),
    );
    add(
        &["javascript", "typescript", "svelte", "vue"],
        Patterns::new(
            &[
                r"function\s+(\w+)\s*\(",
                r"const\s+(\w+)\s*=\s*(?:async\s+)?\(",
                r"(\w+)\s*:\s*function\s*\(",
            ],
            &[r"class\s+(\w+)"],
            &[
                r#"import\s+.*?from\s+['"]([^'"]+)['"]"#,
                r#"require\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
            ],
        ),
    );
    add(
        &["java", "groovy"],
        Patterns::new(
            &[r"(?:public|private|protected)\s+(?:static\s+)?(?:[\w<>\[\],]+\s+)+(\w+)\s*\("],
            &[r"(?:public|private|protected)?\s*(?:abstract\s+|final\s+)?(?:class|interface|enum)\s+(\w+)"],
            &[r"^import\s+(?:static\s+)?([\w.]+)"],
        ),
    );
    add(
        &["kotlin"],
        Patterns::new(
            &[r"^\s*(?:\w+\s+)*fun\s+(?:<[^>]*>\s*)?(?:\w+\.)?(\w+)\s*\("],
            &[r"^\s*(?:\w+\s+)*(?:class|interface|object)\s+(\w+)"],
            &[r"^import\s+([\w.]+)"],
        ),
    );
    add(
        &["scala"],
        Patterns::new(
            &[r"^\s*(?:\w+\s+)*def\s+(\w+)"],
            &[r"^\s*(?:\w+\s+)*(?:class|trait|object)\s+(\w+)"],
            &[r"^import\s+([\w.]+)"],
        ),
    );
    add(
        &["c", "cpp"],
        Patterns::new(
            &[r"^\s*(?:\w+\s+)*(\w+)\s*\([^)]*\)\s*\{"],
            &[r"^\s*(?:class|struct)\s+(\w+)"],
            &[r#"#include\s+[<"]([^>"]+)[>"]"#],
        ),
    );
    add(
        &["csharp"],
        Patterns::new(
            &[r"(?:public|private|protected|internal)\s+(?:static\s+)?(?:\w+\s+)+(\w+)\s*\("],
            &[r"(?:class|struct)\s+(\w+)"],
            &[r"^using\s+([\w.]+)\s*;"],
        ),
    );
    add(
        &["go"],
        Patterns::new(
            &[r"^func\s+(?:\([^)]*\)\s*)?(\w+)\s*\("],
            &[r"^type\s+(\w+)\s+(?:struct|interface)"],
            &[r#"^import\s+(?:\w+\s+)?"([^"]+)""#, r#"^\s+(?:\w+\s+)?"([\w./-]+)"\s*$"#],
        ),
    );
    add(
        &["rust"],
        Patterns::new(
            &[r#"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+(\w+)"#],
            &[r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait)\s+(\w+)"],
            &[r"^\s*(?:pub\s+)?use\s+([\w:]+)"],
        ),
    );
    add(
        &["ruby", "crystal"],
        Patterns::new(
            &[r"^\s*def\s+(?:self\.)?(\w+[?!]?)"],
            &[r"^\s*(?:class|module)\s+([A-Z]\w*)"],
            &[r#"^\s*require(?:_relative)?\s+['"]([^'"]+)['"]"#],
        ),
    );
    add(
        &["php"],
        Patterns::new(
            &[r"function\s+(\w+)\s*\("],
            &[r"^\s*(?:abstract\s+|final\s+)?(?:class|interface|trait)\s+(\w+)"],
            &[
                r"^\s*use\s+([\w\\]+)",
                r#"(?:require|include)(?:_once)?\s*\(?\s*['"]([^'"]+)['"]"#,
            ],
        ),
    );
    add(
        &["perl"],
        Patterns::new(
            &[r"^\s*sub\s+(\w+)"],
            &[r"^\s*package\s+([\w:]+)"],
            &[r"^\s*(?:use|require)\s+([A-Z][\w:]*)"],
        ),
    );
    add(
        &["lua"],
        Patterns::new(
            &[r"^\s*(?:local\s+)?function\s+([\w.:]+)\s*\("],
            &[],
            &[r#"require\s*\(?\s*['"]([^'"]+)['"]"#],
        ),
    );
    add(
        &["swift"],
        Patterns::new(
            &[r"func\s+(\w+)\s*[<(]"],
            &[r"^\s*(?:\w+\s+)*(?:class|struct|protocol)\s+(\w+)"],
            &[r"^import\s+(\w+)"],
        ),
    );
    add(
        &["elixir"],
        Patterns::new(
            &[r"^\s*defp?\s+(\w+[?!]?)"],
            &[r"^\s*defmodule\s+([\w.]+)"],
            &[r"^\s*(?:import|alias|use|require)\s+([\w.]+)"],
        ),
    );
    add(
        &["haskell", "purescript"],
        Patterns::new(
            &[r"^(\w+)\s*::"],
            &[r"^(?:data|newtype|class)\s+(\w+)"],
            &[r"^import\s+(?:qualified\s+)?([\w.]+)"],
        ),
    );
    add(
        &["julia"],
        Patterns::new(
            &[r"^\s*function\s+([\w.!]+)"],
            &[r"^\s*(?:mutable\s+)?struct\s+(\w+)"],
            &[r"^\s*(?:using|import)\s+([\w.]+)"],
        ),
    );
    add(
        &["r"],
        Patterns::new(
            &[r"^\s*([\w.]+)\s*(?:<-|=)\s*function\s*\("],
            &[],
            &[r"(?:library|require)\(([\w.]+)\)"],
        ),
    );
    add(
        &["zig"],
        Patterns::new(&[r"fn\s+(\w+)\s*\("], &[], &[r#"@import\("([^"]+)"\)"#]),
    );
    add(
        &["dart"],
        Patterns::new(
            &[r"^\s*(?:[\w<>?]+\s+)+(\w+)\s*\([^)]*\)\s*(?:async\s*)?\{"],
            &[r"^\s*(?:abstract\s+)?class\s+(\w+)"],
            &[r#"^import\s+['"]([^'"]+)['"]"#],
        ),
    );
    add(
        &["gdscript"],
        Patterns::new(
            &[r"^\s*(?:static\s+)?func\s+(\w+)\s*\("],
            &[r"^class_name\s+(\w+)", r"^class\s+(\w+)"],
            &[r#"(?:pre)?load\("([^"]+)"\)"#],
        ),
    );
    add(
        &["sql"],
        Patterns::new(
            &[r"(?i)create\s+(?:or\s+replace\s+)?(?:function|procedure)\s+([\w.]+)"],
            &[r"(?i)create\s+table\s+(?:if\s+not\s+exists\s+)?([\w.]+)"],
            &[],
        ),
    );

    map
});

static TOML_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*(?:\[+\s*([\w.\-"]+)\s*\]+|([\w\-]+)\s*=)"#).unwrap());

pub struct GenericExtractor {
    language: String,
    excerpt_chars: usize,
}

impl GenericExtractor {
    pub fn new(language: &str, excerpt_chars: usize) -> Self {
        Self {
            language: language.to_string(),
            excerpt_chars,
        }
    }
}

impl LanguageExtractor for GenericExtractor {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn languages(&self) -> &[&'static str] {
        &[]
    }

    fn extract(&self, content: &str) -> SymbolTable {
        let mut table = match self.language.as_str() {
            "json" => data_keys(serde_json::from_str::<serde_json::Value>(content).ok().map(json_keys)),
            "yaml" => data_keys(serde_yaml::from_str::<serde_yaml::Value>(content).ok().map(yaml_keys)),
            "toml" => data_keys(Some(toml_keys(content))),
            language => match PATTERNS.get(language) {
                Some(patterns) => extract_with(patterns, content, language),
                None => SymbolTable::new(),
            },
        };

        if table.is_empty() {
            table = SymbolTable::excerpt_only(content, self.excerpt_chars);
        }
        table
    }
}

fn extract_with(patterns: &Patterns, content: &str, language: &str) -> SymbolTable {
    let mut table = SymbolTable::new();
    let c_family = matches!(language, "c" | "cpp" | "dart");

    for pattern in &patterns.functions {
        for caps in pattern.captures_iter(content) {
            let Some(name) = caps.get(1) else { continue };
            if c_family && C_KEYWORDS.contains(&name.as_str()) {
                continue;
            }
            let info = FunctionInfo::new(
                parameters_after(content, name.end()),
                line_of_offset(content, name.start()),
            );
            table.functions.insert(name.as_str().to_string(), info);
        }
    }

    for pattern in &patterns.classes {
        for caps in pattern.captures_iter(content) {
            let Some(name) = caps.get(1) else { continue };
            table
                .classes
                .insert(name.as_str().to_string(), ClassInfo::new(line_of_offset(content, name.start())));
        }
    }

    let mut imports: Vec<(usize, String)> = patterns
        .imports
        .iter()
        .flat_map(|pattern| pattern.captures_iter(content))
        .filter_map(|caps| caps.get(1).map(|m| (m.start(), m.as_str().to_string())))
        .collect();
    imports.sort();
    for (_, module) in imports {
        table.add_import(module);
    }

    table
}

/// `(params)` following a declared name, or `()` when no list is found
/// on the same line.
fn parameters_after(content: &str, offset: usize) -> String {
    let rest = &content[offset..];
    let rest = rest.trim_start_matches([' ', '\t']);
    let Some(inner) = rest.strip_prefix('(') else {
        return "()".to_string();
    };

    let mut depth = 1usize;
    for (idx, c) in inner.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return format!("({})", normalize_whitespace(&inner[..idx]));
                }
            }
            _ => {}
        }
    }
    "()".to_string()
}

fn data_keys(keys: Option<Vec<String>>) -> SymbolTable {
    let mut table = SymbolTable::new();
    table.top_level_keys = keys.unwrap_or_default().into_iter().take(MAX_TOP_LEVEL_KEYS).collect();
    table
}

fn json_keys(value: serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<String> = map.into_iter().map(|(k, _)| k).collect();
            keys.sort();
            keys
        }
        _ => Vec::new(),
    }
}

fn yaml_keys(value: serde_yaml::Value) -> Vec<String> {
    match value {
        serde_yaml::Value::Mapping(map) => map
            .into_iter()
            .filter_map(|(k, _)| match k {
                serde_yaml::Value::String(s) => Some(s),
                serde_yaml::Value::Number(n) => Some(n.to_string()),
                serde_yaml::Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Table headers and keys outside any table.
fn toml_keys(content: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut in_table = false;
    for caps in TOML_KEY_RE.captures_iter(content) {
        if let Some(header) = caps.get(1) {
            in_table = true;
            let name = header.as_str().trim_matches('"');
            let top = name.split('.').next().unwrap_or(name).to_string();
            if !keys.contains(&top) {
                keys.push(top);
            }
        } else if let Some(key) = caps.get(2).filter(|_| !in_table) {
            keys.push(key.as_str().to_string());
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(language: &str, src: &str) -> SymbolTable {
        GenericExtractor::new(language, 500).extract(src)
    }

    #[test]
    fn test_go() {
        let src = r#"package main

import (
    "fmt"
    log "github.com/sirupsen/logrus"
)

type Server struct {
    addr string
}

func (s *Server) Start(port int) error {
    return nil
}

func main() {
    fmt.Println("hi")
}
"#;
        let table = extract("go", src);
        assert_eq!(table.functions["Start"].signature, "(port int)");
        assert_eq!(table.functions["Start"].line, 12);
        assert_eq!(table.functions["main"].signature, "()");
        assert!(table.classes.contains_key("Server"));
        assert_eq!(table.imports, vec!["fmt", "github.com/sirupsen/logrus"]);
    }

    #[test]
    fn test_rust() {
        let src = "use std::fs;\n\npub struct Config;\n\npub async fn load(path: &str) -> Config {\n    Config\n}\n";
        let table = extract("rust", src);
        assert_eq!(table.functions["load"].signature, "(path: &str)");
        assert!(table.classes.contains_key("Config"));
        assert_eq!(table.imports, vec!["std::fs"]);
    }

    #[test]
    fn test_c_skips_control_flow() {
        let src = "#include <stdio.h>\n#include \"util.h\"\n\nint add(int a, int b) {\n    if (a) {\n        return a + b;\n    }\n    return b;\n}\n";
        let table = extract("c", src);
        assert_eq!(table.functions.keys().collect::<Vec<_>>(), vec!["add"]);
        assert_eq!(table.functions["add"].signature, "(int a, int b)");
        assert_eq!(table.imports, vec!["stdio.h", "util.h"]);
    }

    #[test]
    fn test_java() {
        let src = "import java.util.List;\n\npublic class Repo {\n    public static List<String> findAll(int limit) {\n        return null;\n    }\n}\n";
        let table = extract("java", src);
        assert!(table.classes.contains_key("Repo"));
        assert_eq!(table.functions["findAll"].signature, "(int limit)");
        assert_eq!(table.imports, vec!["java.util.List"]);
    }

    #[test]
    fn test_ruby_and_perl() {
        let ruby = extract("ruby", "require 'json'\nclass Cart\n  def total?\n  end\nend\n");
        assert!(ruby.functions.contains_key("total?"));
        assert!(ruby.classes.contains_key("Cart"));
        assert_eq!(ruby.imports, vec!["json"]);

        let perl = extract("perl", "package My::Tool;\nuse strict;\nuse File::Spec;\nsub run {\n}\n");
        assert!(perl.functions.contains_key("run"));
        assert!(perl.classes.contains_key("My::Tool"));
        assert_eq!(perl.imports, vec!["File::Spec"]);
    }

    #[test]
    fn test_json_and_yaml_keys() {
        let json = extract("json", r#"{"name": "app", "version": "1.0", "scripts": {}}"#);
        assert_eq!(json.top_level_keys, vec!["name", "scripts", "version"]);

        let yaml = extract("yaml", "services:\n  web: {}\nversion: 3\n");
        assert_eq!(yaml.top_level_keys, vec!["services", "version"]);
    }

    #[test]
    fn test_toml_keys() {
        let table = extract("toml", "title = \"x\"\n\n[package]\nname = \"a\"\n\n[dependencies.serde]\nversion = \"1\"\n");
        assert_eq!(table.top_level_keys, vec!["title", "package", "dependencies"]);
    }

    #[test]
    fn test_top_level_key_limit() {
        let body: Vec<String> = (0..80).map(|i| format!("\"k{:02}\": {}", i, i)).collect();
        let table = extract("json", &format!("{{{}}}", body.join(",")));
        assert_eq!(table.top_level_keys.len(), MAX_TOP_LEVEL_KEYS);
    }

    #[test]
    fn test_excerpt_when_nothing_recognized() {
        let table = extract("haskell", "-- just a comment\n");
        assert_eq!(table.excerpt.as_deref(), Some("-- just a comment\n"));

        let unknown = extract("unity-scene", &"y".repeat(900));
        assert_eq!(unknown.excerpt.map(|e| e.len()), Some(500));

        let broken = extract("json", "{ not json");
        assert!(broken.top_level_keys.is_empty());
        assert!(broken.excerpt.is_some());
    }
}
