//! Prolog predicates.
//!
//! Each predicate becomes one function entry named after the predicate,
//! with signature `name/arity`. Clauses of the same predicate are merged:
//! the first clause gives the line, calls are unioned, and the entry is a
//! rule when any clause is.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::common::{self, find_calls, mask, matching_paren, split_top_level, unmask, MaskedSource};
use super::LanguageExtractor;
use crate::index::{FunctionInfo, SymbolTable};

static HEAD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([a-z]\w*)\s*(\()?").unwrap());
static DIRECTIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*:-\s*(use_module|ensure_loaded|consult)\s*\(").unwrap());
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([a-z]\w*)\b").unwrap());

const EXCLUDED_CALLS: &[&str] = &[
    "is", "write", "writeln", "nl", "format", "assert", "asserta", "assertz", "retract",
    "findall", "bagof", "setof", "member", "append", "length", "atom", "number", "var",
    "nonvar", "call", "not", "fail", "true", "halt",
];

pub struct PrologExtractor;

/// A clause: lines `start..=end` of the masked source, ending in `.`.
struct Clause {
    start: usize,
    end: usize,
}

impl LanguageExtractor for PrologExtractor {
    fn name(&self) -> &'static str {
        "prolog"
    }

    fn languages(&self) -> &[&'static str] {
        &["prolog"]
    }

    fn extract(&self, content: &str) -> SymbolTable {
        let raw: Vec<&str> = content.lines().collect();
        let masked = mask(content, &common::PROLOG);
        let clauses = split_clauses(&masked);
        let mut table = SymbolTable::new();

        let known: BTreeSet<String> = clauses
            .iter()
            .filter_map(|c| HEAD_RE.captures(masked.line(c.start)))
            .map(|caps| caps[1].to_string())
            .collect();

        for clause in &clauses {
            let first = masked.line(clause.start);

            if let Some(caps) = DIRECTIVE_RE.captures(first) {
                let paren = caps.get(0).map_or(0, |m| m.end()).saturating_sub(1);
                let open = (clause.start, common::char_col(first, paren));
                if let Some(close) = matching_paren(&masked, open) {
                    let args = unmask(&masked, &raw, &common::PROLOG, (open.0, open.1 + 1), close);
                    if let Some(module) = split_top_level(&args, ',').first() {
                        table.add_import(module.trim_matches(|c| c == '\'' || c == '"'));
                    }
                }
                continue;
            }

            let Some(caps) = HEAD_RE.captures(first) else {
                continue;
            };
            let name = caps[1].to_string();
            let text = masked.join(clause.start, clause.end);

            // Arguments and the text after the head
            let (arity, rest) = match caps.get(2) {
                Some(paren) => {
                    let open = (clause.start, common::char_col(first, paren.start()));
                    let Some(close) = matching_paren(&masked, open) else {
                        continue;
                    };
                    let args = between(&masked, open, close);
                    let rest = masked.join(close.0, clause.end);
                    let rest = rest.chars().skip(close.1 + 1).collect::<String>();
                    (split_top_level(&args, ',').len(), rest)
                }
                None => (0, text[caps.get(0).map_or(0, |m| m.end())..].to_string()),
            };

            let rest = rest.trim_start();
            let (is_rule, calls) = match rest.strip_prefix(":-") {
                Some(body) => (true, goal_calls(body, &known)),
                None if rest.starts_with('.') => (false, Vec::new()),
                None => continue,
            };

            let entry = table.functions.entry(name.clone()).or_insert_with(|| {
                let mut info = FunctionInfo::new(format!("{}/{}", name, arity), clause.start + 1);
                info.doc = Some("fact".to_string());
                info
            });
            if is_rule {
                entry.doc = Some("rule".to_string());
            }
            for call in calls {
                if !entry.calls.contains(&call) {
                    entry.calls.push(call);
                }
            }
            entry.calls.sort();
        }

        table
    }
}

/// Groups masked lines into clauses terminated by a `.` at line end.
fn split_clauses(masked: &MaskedSource) -> Vec<Clause> {
    let mut clauses = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, line) in masked.lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let clause_start = *start.get_or_insert(idx);
        if trimmed.ends_with('.') {
            clauses.push(Clause {
                start: clause_start,
                end: idx,
            });
            start = None;
        }
    }
    clauses
}

/// Masked text strictly between `open` and `close`.
fn between(masked: &MaskedSource, open: common::Pos, close: common::Pos) -> String {
    let mut text = String::new();
    for line_idx in open.0..=close.0 {
        if line_idx > open.0 {
            text.push('\n');
        }
        for (col, c) in masked.line(line_idx).chars().enumerate() {
            if line_idx == open.0 && col <= open.1 {
                continue;
            }
            if line_idx == close.0 && col >= close.1 {
                break;
            }
            text.push(c);
        }
    }
    text
}

/// Known predicates used as goals in a rule body: `name(` or a bare atom in
/// goal position.
fn goal_calls(body: &str, known: &BTreeSet<String>) -> Vec<String> {
    let mut calls: BTreeSet<String> = find_calls(body, known, EXCLUDED_CALLS).into_iter().collect();

    for caps in WORD_RE.captures_iter(body) {
        let Some(m) = caps.get(1) else { continue };
        let name = m.as_str();
        if !known.contains(name) || EXCLUDED_CALLS.contains(&name) {
            continue;
        }
        let before = body[..m.start()].trim_end();
        let after = body[m.end()..].trim_start();
        let goal_position = before.is_empty()
            || before.ends_with(',')
            || before.ends_with(';')
            || before.ends_with("->")
            || before.ends_with("\\+");
        if goal_position && !after.starts_with('(') {
            calls.insert(name.to_string());
        }
    }
    calls.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(src: &str) -> SymbolTable {
        PrologExtractor.extract(src)
    }

    const FAMILY: &str = r#"% Family relations
:- use_module(library(lists)).
:- ensure_loaded('helpers.pl').

parent(tom, bob).
parent(bob, ann).

grandparent(X, Z) :-
    parent(X, Y),
    parent(Y, Z).

ancestor(X, Y) :- parent(X, Y).
ancestor(X, Y) :- parent(X, Z), ancestor(Z, Y), report.

report :- write('done: parent(x)'), nl.
"#;

    #[test]
    fn test_imports() {
        let table = extract(FAMILY);
        assert_eq!(table.imports, vec!["library(lists)", "helpers.pl"]);
    }

    #[test]
    fn test_predicates() {
        let table = extract(FAMILY);
        let parent = &table.functions["parent"];
        assert_eq!(parent.signature, "parent/2");
        assert_eq!(parent.doc.as_deref(), Some("fact"));
        assert_eq!(parent.line, 5);

        let grandparent = &table.functions["grandparent"];
        assert_eq!(grandparent.signature, "grandparent/2");
        assert_eq!(grandparent.doc.as_deref(), Some("rule"));
        assert_eq!(grandparent.line, 8);
        assert_eq!(grandparent.calls, vec!["parent"]);

        assert_eq!(table.functions["report"].signature, "report/0");
    }

    #[test]
    fn test_clauses_merge_calls() {
        let table = extract(FAMILY);
        let ancestor = &table.functions["ancestor"];
        assert_eq!(ancestor.line, 12);
        assert_eq!(ancestor.calls, vec!["ancestor", "parent", "report"]);
        assert!(table.functions["report"].calls.is_empty());
    }

    #[test]
    fn test_nested_head_arguments() {
        let table = extract("len([], 0).\nlen([_|T], N) :- len(T, M), N is M + 1.\n");
        assert_eq!(table.functions["len"].signature, "len/2");
        assert_eq!(table.functions["len"].calls, vec!["len"]);
    }
}
