//! Content-based disambiguation for extensions shared by two languages.
//!
//! Each rule scores the content against two signal sets: one point per
//! signal pattern found anywhere in the file. The higher score wins and an
//! exact tie falls back to the rule's tie-break language.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Regex signals that suggest one language.
pub struct SignalSet {
    pub language: &'static str,
    patterns: Vec<Regex>,
}

impl SignalSet {
    fn new(language: &'static str, patterns: &[&str]) -> Self {
        Self::build(language, patterns, false)
    }

    fn case_insensitive(language: &'static str, patterns: &[&str]) -> Self {
        Self::build(language, patterns, true)
    }

    fn build(language: &'static str, patterns: &[&str], ignore_case: bool) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| {
                let source = if ignore_case {
                    format!("(?i){}", p)
                } else {
                    p.to_string()
                };
                Regex::new(&source).ok()
            })
            .collect();
        Self { language, patterns }
    }

    /// Number of signals present in `content`.
    pub fn score(&self, content: &str) -> usize {
        self.patterns.iter().filter(|re| re.is_match(content)).count()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

pub struct AmbiguousRule {
    pub extension: &'static str,
    pub first: SignalSet,
    pub second: SignalSet,
    /// Language chosen when both scores are equal
    pub tie_break: &'static str,
}

/// Outcome of scoring one file against an ambiguous rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Disambiguation {
    pub language: String,
    pub scores: Vec<(String, usize)>,
    /// True when the scores tied and the tie-break decided
    pub tie_break_applied: bool,
}

impl AmbiguousRule {
    pub fn candidates(&self) -> [&'static str; 2] {
        [self.first.language, self.second.language]
    }

    pub fn decide(&self, content: &str) -> Disambiguation {
        self.decide_with(content, None)
    }

    /// Scores `content`; `tie_break` overrides the built-in default.
    pub fn decide_with(&self, content: &str, tie_break: Option<&str>) -> Disambiguation {
        let first = self.first.score(content);
        let second = self.second.score(content);

        let (language, tie_break_applied) = match first.cmp(&second) {
            std::cmp::Ordering::Greater => (self.first.language.to_string(), false),
            std::cmp::Ordering::Less => (self.second.language.to_string(), false),
            std::cmp::Ordering::Equal => (
                tie_break.unwrap_or(self.tie_break).to_string(),
                true,
            ),
        };

        Disambiguation {
            language,
            scores: vec![
                (self.first.language.to_string(), first),
                (self.second.language.to_string(), second),
            ],
            tie_break_applied,
        }
    }
}

static RULES: Lazy<Vec<AmbiguousRule>> = Lazy::new(|| {
    vec![
        AmbiguousRule {
            extension: ".pl",
            first: SignalSet::new(
                "prolog",
                &[r":-", r"\?-", r"assert\(", r"retract\(", r"findall\(", r"member\("],
            ),
            second: SignalSet::new(
                "perl",
                &[
                    r"use strict",
                    r"use warnings",
                    r"my \$",
                    r"sub \w+\s*\{",
                    r"package \w+",
                ],
            ),
            tie_break: "prolog",
        },
        AmbiguousRule {
            extension: ".m",
            first: SignalSet::new("objective-c", &[r"@interface", r"@implementation", r"#import"]),
            second: SignalSet::new("matlab", &[r"function\s+\w+", r"end\s*$", r"%"]),
            tie_break: "matlab",
        },
        AmbiguousRule {
            extension: ".tsx",
            first: SignalSet::new("tiled-tileset", &[r"<tileset", r"<tsx"]),
            second: SignalSet::new("typescript", &[]),
            tie_break: "typescript",
        },
        AmbiguousRule {
            extension: ".v",
            first: SignalSet::new(
                "verilog",
                &[
                    r"\bmodule\s+\w+",
                    r"\b(?:wire|reg|logic)\s+",
                    r"\balways\s*@",
                    r"\bassign\s+",
                    r"\bendmodule\b",
                ],
            ),
            second: SignalSet::new(
                "vlang",
                &[
                    r"\bfn\s+\w+\(",
                    r"\bpub\s+fn\b",
                    r"\bimport\s+\w+",
                    r"\bstruct\s+\w+\s*\{",
                ],
            ),
            tie_break: "vlang",
        },
        AmbiguousRule {
            extension: ".fs",
            first: SignalSet::new(
                "fsharp",
                &[
                    r"\bmodule\s+\w+",
                    r"\bnamespace\s+\w+",
                    r"\blet\s+\w+\s*=",
                    r"\btype\s+\w+\s*=",
                    r"\bopen\s+\w+",
                ],
            ),
            second: SignalSet::case_insensitive(
                "forth",
                &[r":\s+\w+", r";\s*$", r"\bDUP\b", r"\bSWAP\b", r"\bDROP\b"],
            ),
            tie_break: "forth",
        },
        AmbiguousRule {
            extension: ".t",
            first: SignalSet::new("perl", &[r"use Test::", r"use strict"]),
            second: SignalSet::new("tera", &[]),
            tie_break: "tera",
        },
    ]
});

/// All built-in ambiguous-extension rules.
pub fn rules() -> &'static [AmbiguousRule] {
    &RULES
}

pub fn rule_for(extension: &str) -> Option<&'static AmbiguousRule> {
    RULES.iter().find(|r| r.extension == extension)
}
