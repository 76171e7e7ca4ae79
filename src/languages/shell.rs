//! Shell script symbol extraction.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::common::{self, mask, BraceMap};
use super::LanguageExtractor;
use crate::index::{FunctionInfo, SymbolTable, ValueKind};

/// `name() {`
static PAREN_FUNCTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z_][\w-]*)\s*\(\s*\)\s*\{?").unwrap());
/// `function name {` or `function name() {`
static KEYWORD_FUNCTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*function\s+([A-Za-z_][\w-]*)\s*(?:\(\s*\))?\s*\{?").unwrap());
static POSITIONAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{?([1-9])").unwrap());
static EXPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*export\s+([A-Za-z_]\w*)(?:=(.*))?").unwrap());
static VARIABLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([A-Z_][A-Z0-9_]*)=").unwrap());
static SOURCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:source|\.)\s+(.+)$").unwrap());
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z_][\w-]*").unwrap());

const EXCLUDED_CALLS: &[&str] = &[
    "if", "then", "else", "elif", "fi", "for", "while", "until", "do", "done", "case", "esac",
    "function", "echo", "printf", "local", "export", "return", "exit", "source", "set", "unset",
    "shift", "read", "test", "true", "false", "cd", "eval", "exec",
];

/// Keywords after which the next word is a command.
const COMMAND_KEYWORDS: &[&str] = &["then", "do", "else", "if", "elif", "while", "until", "!", "time"];

pub struct ShellExtractor;

impl LanguageExtractor for ShellExtractor {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn languages(&self) -> &[&'static str] {
        &["shell"]
    }

    fn extract(&self, content: &str) -> SymbolTable {
        let raw: Vec<&str> = content.lines().collect();
        let masked = mask(content, &common::SHELL);
        let braces = BraceMap::new(&masked);
        let mut table = SymbolTable::new();

        let declaration = |line: &str| {
            KEYWORD_FUNCTION_RE
                .captures(line)
                .or_else(|| PAREN_FUNCTION_RE.captures(line))
                .map(|c| c[1].to_string())
        };
        let known: BTreeSet<String> = masked.lines.iter().filter_map(|l| declaration(l.as_str())).collect();

        let mut i = 0;
        while i < masked.lines.len() {
            let line = masked.line(i);
            if line.trim().is_empty() || masked.is_continued(i) || braces.depth_at(i) != 0 {
                i += 1;
                continue;
            }
            let raw_line = raw.get(i).copied().unwrap_or("");

            if let Some(name) = declaration(line) {
                let Some(block) = braces.block(i) else {
                    i += 1;
                    continue;
                };
                let body: Vec<&str> = raw
                    .iter()
                    .take(block.close_line + 1)
                    .skip(block.open_line)
                    .copied()
                    .collect();

                let arity = body
                    .iter()
                    .flat_map(|l| POSITIONAL_RE.captures_iter(l))
                    .filter_map(|c| c[1].parse::<usize>().ok())
                    .max()
                    .unwrap_or(0);
                let params: Vec<String> = (1..=arity).map(|n| format!("${}", n)).collect();

                let mut info = FunctionInfo::new(format!("({})", params.join(" ")), i + 1);
                info.doc = comment_above(&raw, i);
                info.calls = find_commands(&body, &known);
                table.functions.insert(name, info);

                i = block.close_line + 1;
                continue;
            }

            if let Some(caps) = EXPORT_RE.captures(raw_line) {
                let kind = caps
                    .get(2)
                    .map_or(ValueKind::Value, |v| ValueKind::infer(v.as_str()));
                table.exports.insert(caps[1].to_string(), kind);
            } else if let Some(caps) = VARIABLE_RE.captures(line) {
                table.add_variable(&caps[1]);
            } else if let Some(caps) = SOURCE_RE.captures(raw_line) {
                if let Some(target) = source_target(&caps[1]) {
                    table.add_import(&target);
                }
            }
            i += 1;
        }

        table
    }
}

/// Text of a `#` comment on the line directly above `idx`.
fn comment_above(raw: &[&str], idx: usize) -> Option<String> {
    let previous = raw.get(idx.checked_sub(1)?)?.trim();
    if previous.starts_with("#!") {
        return None;
    }
    previous
        .strip_prefix('#')
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Known functions invoked as commands in `body`.
fn find_commands(body: &[&str], known: &BTreeSet<String>) -> Vec<String> {
    let mut calls = BTreeSet::new();
    for (idx, line) in body.iter().enumerate() {
        let code = strip_comment(line);
        // skip the declaration itself
        let code = if idx == 0 {
            code.split_once('{').map_or("", |(_, rest)| rest)
        } else {
            code
        };
        for word in WORD_RE.find_iter(code) {
            let name = word.as_str();
            if known.contains(name)
                && !EXCLUDED_CALLS.contains(&name)
                && in_command_position(&code[..word.start()])
            {
                calls.insert(name.to_string());
            }
        }
    }
    calls.into_iter().collect()
}

/// True when a word following `before` is run as a command.
fn in_command_position(before: &str) -> bool {
    let before = before.trim_end();
    if before.is_empty() || before.ends_with([';', '&', '|', '`']) || before.ends_with("$(") {
        return true;
    }
    let last_word = before
        .rsplit(|c: char| c.is_whitespace() || matches!(c, ';' | '&' | '|'))
        .next()
        .unwrap_or("");
    COMMAND_KEYWORDS.contains(&last_word)
}

/// `line` up to an unquoted `#` that starts a comment.
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut previous = ' ';
    for (idx, c) in line.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            (None, '#') if previous.is_whitespace() || idx == 0 => return &line[..idx],
            _ => {}
        }
        previous = c;
    }
    line
}

/// Path named by a `source` or `.` line.
fn source_target(rest: &str) -> Option<String> {
    let rest = rest.trim();
    let target = if let Some(inner) = rest.strip_prefix('"') {
        inner.split('"').next()?
    } else if let Some(inner) = rest.strip_prefix('\'') {
        inner.split('\'').next()?
    } else if rest.starts_with("$(") {
        rest.find(')').map_or(rest, |end| &rest[..=end])
    } else {
        rest.split_whitespace().next()?
    };
    let target = target.trim_end_matches(';');
    (!target.is_empty()).then(|| target.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(src: &str) -> SymbolTable {
        ShellExtractor.extract(src)
    }

    const SCRIPT: &str = r#"#!/usr/bin/env bash
set -euo pipefail

source "./lib/common.sh"
. ./env.sh
export APP_ENV=production
export PORT=8080
export PATH
LOG_DIR=/var/log/app

# Prints a greeting
greet() {
    local name="$1"
    echo "Hello, $name from $2"
}

function deploy {
    greet "$USER" prod
    status=$(check_health) && notify "done"
    if [ -z "$3" ]; then log_it; fi
}

function check_health() {
    curl -s "$1" | grep ok # greet here is a comment
}

notify() { echo "$1"; }
log_it() { :; }
"#;

    #[test]
    fn test_functions_and_arity() {
        let table = extract(SCRIPT);
        assert_eq!(table.functions["greet"].signature, "($1 $2)");
        assert_eq!(table.functions["greet"].line, 12);
        assert_eq!(table.functions["greet"].doc.as_deref(), Some("Prints a greeting"));
        assert_eq!(table.functions["deploy"].signature, "($1 $2 $3)");
        assert_eq!(table.functions["check_health"].signature, "($1)");
        assert_eq!(table.functions["log_it"].signature, "()");
    }

    #[test]
    fn test_calls() {
        let table = extract(SCRIPT);
        assert_eq!(
            table.functions["deploy"].calls,
            vec!["check_health", "greet", "log_it", "notify"]
        );
        assert!(table.functions["check_health"].calls.is_empty());
        assert!(table.functions["greet"].calls.is_empty());
    }

    #[test]
    fn test_exports_variables_imports() {
        let table = extract(SCRIPT);
        assert_eq!(table.exports["APP_ENV"], ValueKind::Value);
        assert_eq!(table.exports["PORT"], ValueKind::Number);
        assert_eq!(table.exports["PATH"], ValueKind::Value);
        assert_eq!(table.variables, vec!["LOG_DIR"]);
        assert_eq!(table.imports, vec!["./lib/common.sh", "./env.sh"]);
    }

    #[test]
    fn test_shebang_is_not_doc() {
        let table = extract("#!/bin/sh\nmain() {\n  true\n}\n");
        assert_eq!(table.functions["main"].doc, None);
    }

    #[test]
    fn test_brace_expansion_does_not_open_scope() {
        let src = "echo ${#items[@]} ${HOME}\nrun() {\n  echo \"${1:-x}\"\n}\n";
        let table = extract(src);
        assert_eq!(table.functions["run"].signature, "($1)");
        assert_eq!(table.functions["run"].line, 2);
    }

    #[test]
    fn test_source_targets() {
        assert_eq!(source_target("\"$DIR/a.sh\""), Some("$DIR/a.sh".to_string()));
        assert_eq!(source_target("'b.sh' arg"), Some("b.sh".to_string()));
        assert_eq!(source_target("$(dirname $0)/c.sh"), Some("$(dirname $0)".to_string()));
        assert_eq!(source_target("d.sh;"), Some("d.sh".to_string()));
    }
}
