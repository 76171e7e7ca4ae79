pub mod common;
pub mod csharp;
pub mod detect;
pub mod generic;
pub mod javascript;
pub mod markdown;
pub mod prolog;
pub mod python;
pub mod shell;
pub mod table;

pub use detect::{AmbiguousRule, Disambiguation};

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::config::{normalize_extension, IndexConfig, DEFAULT_EXCERPT_CHARS};
use crate::index::SymbolTable;

/// A line-based symbol extractor for one language family.
///
/// Extraction never fails: malformed input yields a partial table.
pub trait LanguageExtractor: Send + Sync {
    fn name(&self) -> &'static str;
    /// Language names this extractor handles
    fn languages(&self) -> &[&'static str];
    fn extract(&self, content: &str) -> SymbolTable;
}

/// How a file's language was decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageAssignment {
    pub extension: String,
    pub language: Option<String>,
    /// Candidate languages; two for ambiguous extensions
    pub candidates: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disambiguation: Option<Disambiguation>,
}

pub struct LanguageRegistry {
    extractors: HashMap<String, Arc<dyn LanguageExtractor>>,
    extension_map: HashMap<String, String>,
    filenames: Vec<String>,
    tie_breaks: HashMap<String, String>,
    excerpt_chars: usize,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            extractors: HashMap::new(),
            extension_map: table::EXTENSION_LANGUAGES
                .iter()
                .map(|(ext, lang)| (ext.to_string(), lang.to_string()))
                .collect(),
            filenames: table::RECOGNIZED_FILENAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            tie_breaks: HashMap::new(),
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        };

        registry.register(Arc::new(python::PythonExtractor));
        registry.register(Arc::new(javascript::JavaScriptExtractor));
        registry.register(Arc::new(csharp::CSharpExtractor));
        registry.register(Arc::new(shell::ShellExtractor));
        registry.register(Arc::new(prolog::PrologExtractor));
        registry.register(Arc::new(markdown::MarkdownExtractor));

        registry
    }

    /// Built-in tables with the overrides from `config` applied.
    pub fn from_config(config: &IndexConfig) -> Self {
        let mut registry = Self::new();
        for (ext, lang) in &config.extension_overrides {
            registry
                .extension_map
                .insert(normalize_extension(ext), lang.clone());
        }
        for (ext, lang) in &config.tie_breaks {
            registry
                .tie_breaks
                .insert(normalize_extension(ext), lang.clone());
        }
        registry.excerpt_chars = config.excerpt_chars;
        registry
    }

    pub fn register(&mut self, extractor: Arc<dyn LanguageExtractor>) {
        for language in extractor.languages() {
            self.extractors
                .insert(language.to_string(), Arc::clone(&extractor));
        }
    }

    /// Extension key for `path`: compound (`.d.ts`) first, then the plain
    /// suffix as written, then lowercased.
    fn extension_key(&self, path: &Path) -> Option<String> {
        let file_name = path.file_name()?.to_str()?;
        if let Some(idx) = file_name.find('.').filter(|idx| *idx > 0) {
            let compound = &file_name[idx..];
            if compound.matches('.').count() > 1 && self.extension_map.contains_key(compound) {
                return Some(compound.to_string());
            }
        }
        let ext = format!(".{}", path.extension()?.to_str()?);
        if self.extension_map.contains_key(&ext) {
            Some(ext)
        } else {
            Some(ext.to_lowercase())
        }
    }

    /// Language from the extension alone; ambiguous extensions give their default.
    pub fn language_for_extension(&self, ext: &str) -> Option<&str> {
        self.extension_map
            .get(ext)
            .or_else(|| self.extension_map.get(&ext.to_lowercase()))
            .map(String::as_str)
    }

    /// True when the file is a code, markdown or known build/config file.
    pub fn is_recognized(&self, path: &Path) -> bool {
        let by_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.filenames.iter().any(|f| f == name));
        by_name
            || self
                .extension_key(path)
                .is_some_and(|ext| self.language_for_extension(&ext).is_some())
    }

    /// Lowercased extension used for restriction filters.
    pub fn extension_of(&self, path: &Path) -> Option<String> {
        self.extension_key(path).map(|e| e.to_lowercase())
    }

    pub fn resolve(&self, path: &Path, content: &str) -> Option<String> {
        self.assign(path, content).language
    }

    /// Resolves the language of `path`, scoring `content` when the extension
    /// is ambiguous.
    pub fn assign(&self, path: &Path, content: &str) -> LanguageAssignment {
        let extension = self.extension_key(path).unwrap_or_default();

        if let Some(rule) = detect::rule_for(&extension.to_lowercase())
            .filter(|_| !self.is_overridden(&extension))
        {
            let tie_break = self.tie_breaks.get(rule.extension).map(String::as_str);
            let outcome = rule.decide_with(content, tie_break);
            if outcome.tie_break_applied {
                debug!(
                    "{}: tied scores for {}, using {}",
                    path.display(),
                    rule.extension,
                    outcome.language
                );
            }
            return LanguageAssignment {
                extension,
                language: Some(outcome.language.clone()),
                candidates: rule.candidates().iter().map(|s| s.to_string()).collect(),
                disambiguation: Some(outcome),
            };
        }

        let language = self.language_for_extension(&extension).map(str::to_string);
        LanguageAssignment {
            extension,
            candidates: language.iter().cloned().collect(),
            language,
            disambiguation: None,
        }
    }

    fn is_overridden(&self, ext: &str) -> bool {
        self.extension_map
            .get(ext)
            .zip(table::EXTENSION_LANGUAGES.iter().find(|(e, _)| *e == ext))
            .is_some_and(|(current, (_, builtin))| current.as_str() != *builtin)
    }

    /// Extractor for `language`; languages without a dedicated one get the
    /// generic fallback.
    pub fn extractor_for(&self, language: &str) -> Arc<dyn LanguageExtractor> {
        match self.extractors.get(language) {
            Some(extractor) => Arc::clone(extractor),
            None => Arc::new(generic::GenericExtractor::new(language, self.excerpt_chars)),
        }
    }

    pub fn has_dedicated_extractor(&self, language: &str) -> bool {
        self.extractors.contains_key(language)
    }

    pub fn excerpt_chars(&self) -> usize {
        self.excerpt_chars
    }

    /// (extension, language) pairs sorted by extension.
    pub fn supported_extensions(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = self
            .extension_map
            .iter()
            .map(|(e, l)| (e.as_str(), l.as_str()))
            .collect();
        pairs.sort();
        pairs
    }

    pub fn supported_languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = self.extension_map.values().map(String::as_str).collect();
        languages.sort();
        languages.dedup();
        languages
    }

    pub fn ambiguous_rules(&self) -> &'static [AmbiguousRule] {
        detect::rules()
    }

    /// Effective tie-break for an ambiguous extension.
    pub fn tie_break_for(&self, rule: &AmbiguousRule) -> String {
        self.tie_breaks
            .get(rule.extension)
            .cloned()
            .unwrap_or_else(|| rule.tie_break.to_string())
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_registry_new() {
        let registry = LanguageRegistry::new();
        assert!(registry.has_dedicated_extractor("python"));
        assert!(registry.has_dedicated_extractor("javascript"));
        assert!(registry.has_dedicated_extractor("typescript"));
        assert!(registry.has_dedicated_extractor("csharp"));
        assert!(registry.has_dedicated_extractor("shell"));
        assert!(registry.has_dedicated_extractor("prolog"));
        assert!(registry.has_dedicated_extractor("markdown"));
        assert!(!registry.has_dedicated_extractor("go"));
    }

    #[test]
    fn test_resolve_plain_extensions() {
        let registry = LanguageRegistry::new();
        assert_eq!(registry.resolve(Path::new("a.py"), ""), Some("python".into()));
        assert_eq!(registry.resolve(Path::new("src/a.rs"), ""), Some("rust".into()));
        assert_eq!(registry.resolve(Path::new("x.cs"), ""), Some("csharp".into()));
        assert_eq!(registry.resolve(Path::new("run.sh"), ""), Some("shell".into()));
        assert_eq!(registry.resolve(Path::new("README.md"), ""), Some("markdown".into()));
        assert_eq!(registry.resolve(Path::new("notes.txt"), ""), None);
        assert_eq!(registry.resolve(Path::new("Makefile"), ""), None);
    }

    #[test]
    fn test_resolve_case_and_compound() {
        let registry = LanguageRegistry::new();
        assert_eq!(registry.resolve(Path::new("analysis.R"), ""), Some("r".into()));
        assert_eq!(registry.resolve(Path::new("MAIN.PY"), ""), Some("python".into()));
        assert_eq!(registry.resolve(Path::new("types.d.ts"), ""), Some("typescript".into()));
        assert_eq!(registry.resolve(Path::new("boot.S"), ""), Some("assembly".into()));
        assert_eq!(registry.resolve(Path::new("my.module.py"), ""), Some("python".into()));
    }

    #[test]
    fn test_resolve_ambiguous() {
        let registry = LanguageRegistry::new();
        assert_eq!(
            registry.resolve(Path::new("rules.pl"), "grand(X,Z) :- parent(X,Y), parent(Y,Z)."),
            Some("prolog".into())
        );
        assert_eq!(
            registry.resolve(Path::new("tool.pl"), "use strict;\nmy $x = 1;\n"),
            Some("perl".into())
        );

        let assignment = registry.assign(Path::new("tool.pl"), "");
        assert_eq!(assignment.candidates, vec!["prolog", "perl"]);
        assert!(assignment.disambiguation.unwrap().tie_break_applied);
    }

    #[test]
    fn test_from_config_overrides() {
        let mut config = IndexConfig::default();
        config.tie_breaks = BTreeMap::from([("pl".to_string(), "perl".to_string())]);
        config.extension_overrides = BTreeMap::from([
            (".inc".to_string(), "php".to_string()),
            (".m".to_string(), "mercury".to_string()),
        ]);
        config.excerpt_chars = 42;

        let registry = LanguageRegistry::from_config(&config);
        assert_eq!(registry.resolve(Path::new("a.pl"), "nothing"), Some("perl".into()));
        assert_eq!(registry.resolve(Path::new("a.inc"), ""), Some("php".into()));
        assert_eq!(registry.resolve(Path::new("a.m"), "@interface X"), Some("mercury".into()));
        assert_eq!(registry.excerpt_chars(), 42);
        assert_eq!(registry.tie_break_for(detect::rule_for(".pl").unwrap()), "perl");
    }

    #[test]
    fn test_is_recognized() {
        let registry = LanguageRegistry::new();
        assert!(registry.is_recognized(Path::new("src/main.py")));
        assert!(registry.is_recognized(Path::new("docs/guide.md")));
        assert!(registry.is_recognized(Path::new("Makefile")));
        assert!(registry.is_recognized(Path::new(".env")));
        assert!(!registry.is_recognized(Path::new("image.png")));
        assert!(!registry.is_recognized(Path::new("LICENSE")));
    }

    #[test]
    fn test_extractor_for_fallback() {
        let registry = LanguageRegistry::new();
        assert_eq!(registry.extractor_for("python").name(), "python");
        assert_eq!(registry.extractor_for("typescript").name(), "javascript");
        assert_eq!(registry.extractor_for("go").name(), "generic");
    }

    #[test]
    fn test_supported_lists_sorted() {
        let registry = LanguageRegistry::new();
        let extensions = registry.supported_extensions();
        assert!(extensions.windows(2).all(|w| w[0] <= w[1]));
        assert!(extensions.contains(&(".py", "python")));

        let languages = registry.supported_languages();
        assert!(languages.contains(&"prolog"));
        assert!(languages.windows(2).all(|w| w[0] < w[1]));
    }
}
