//! Markdown outline extraction
//!
//! Pulls the title, the leading section headings and path-like references
//! ("stored in `src/db/`") from the head of a document.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use super::LanguageExtractor;
use crate::index::{DocumentOutline, SymbolTable};

/// Only the head of a document is scanned.
const SCAN_CHARS: usize = 5000;
const MAX_SECTIONS: usize = 10;
const MAX_HINTS: usize = 5;

static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,3})\s+(.+)$").unwrap());

static HINT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?:located?|found?|stored?)\s+in\s+`?([\w\-./]+)`?",
        r"`?([\w\-./]+)`?\s+(?:contains?|houses?|holds?)",
        r"(?:see|check|look)\s+(?:in\s+)?`?([\w\-./]+)`?\s+for",
        r"(?:file|module|component)\s+`?([\w\-./]+)`?",
    ]
    .iter()
    .map(|p| RegexBuilder::new(p).case_insensitive(true).build().unwrap())
    .collect()
});

pub struct MarkdownExtractor;

impl LanguageExtractor for MarkdownExtractor {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn languages(&self) -> &[&'static str] {
        &["markdown"]
    }

    fn extract(&self, content: &str) -> SymbolTable {
        let head: String = content.chars().take(SCAN_CHARS).collect();

        let mut title = None;
        let mut sections = Vec::new();
        let mut in_fence = false;

        for line in head.lines() {
            if line.trim_start().starts_with("```") {
                in_fence = !in_fence;
                continue;
            }
            if in_fence {
                continue;
            }
            if let Some(caps) = HEADING_RE.captures(line.trim_end()) {
                let text = caps[2].trim().to_string();
                if caps[1].len() == 1 && title.is_none() {
                    title = Some(text.clone());
                }
                if sections.len() < MAX_SECTIONS {
                    sections.push(text);
                }
            }
        }

        let architecture_hints = architecture_hints(&head);

        let mut table = SymbolTable::new();
        if title.is_some() || !sections.is_empty() || !architecture_hints.is_empty() {
            table.outline = Some(DocumentOutline {
                title,
                sections,
                architecture_hints,
            });
        }
        table
    }
}

/// Path-like references next to phrases such as "located in" or "see ... for".
fn architecture_hints(text: &str) -> Vec<String> {
    let mut hints = BTreeSet::new();
    for pattern in HINT_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let candidate = &caps[1];
            if candidate.contains('/') && !candidate.to_lowercase().starts_with("http") {
                hints.insert(candidate.to_string());
            }
        }
    }
    hints.into_iter().take(MAX_HINTS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const README: &str = r#"# Inventory Service

Handles stock levels. Models are stored in `src/models/` and the
HTTP layer is located in src/api/handlers.

## Setup

```bash
# not a heading
pip install -r requirements.txt
```

## Usage
### Advanced
#### Too deep

See docs/usage.md for more. The module app/core.py holds the wiring.
Read https://example.com/a/b for background.
"#;

    #[test]
    fn test_title_and_sections() {
        let table = MarkdownExtractor.extract(README);
        let outline = table.outline.unwrap();
        assert_eq!(outline.title.as_deref(), Some("Inventory Service"));
        assert_eq!(outline.sections, vec!["Inventory Service", "Setup", "Usage", "Advanced"]);
    }

    #[test]
    fn test_architecture_hints() {
        let table = MarkdownExtractor.extract(README);
        let hints = table.outline.unwrap().architecture_hints;
        assert!(hints.contains(&"src/models/".to_string()));
        assert!(hints.contains(&"docs/usage.md".to_string()));
        assert!(hints.contains(&"app/core.py".to_string()));
        assert!(hints.iter().all(|h| !h.starts_with("http")));
        assert!(hints.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_section_limit() {
        let doc: String = (0..15).map(|i| format!("## Part {}\n", i)).collect();
        let outline = MarkdownExtractor.extract(&doc).outline.unwrap();
        assert_eq!(outline.sections.len(), MAX_SECTIONS);
        assert_eq!(outline.title, None);
    }

    #[test]
    fn test_plain_text_has_no_outline() {
        assert!(MarkdownExtractor.extract("just some words\n").outline.is_none());
    }

    #[test]
    fn test_only_head_is_scanned() {
        let doc = format!("{}\n# Late Title\n", "x".repeat(SCAN_CHARS));
        assert!(MarkdownExtractor.extract(&doc).outline.is_none());
    }
}
