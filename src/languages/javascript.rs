//! JavaScript and TypeScript symbol extraction.
//!
//! Declarations are recognized at brace depth 0, one statement at a time,
//! so several may share a line; class members at depth 1 inside the class
//! block. Bodies are bounded with the brace map of the
//! masked source.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::common::{
    self, block_body, char_col, find_calls, jsdoc_above, mask, matching_paren, rest_of_line,
    segment, split_top_level, statement_end, unmask, BraceMap, MaskedSource, Pos,
};
use super::LanguageExtractor;
use crate::index::{ClassInfo, ClassKind, EnumInfo, FunctionInfo, InterfaceInfo, SymbolTable, ValueKind};

// Imports
static IMPORT_FROM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*(?:import|export)\b.*\bfrom\s+['"]([^'"]+)['"]"#).unwrap());
static IMPORT_TAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*\}\s*from\s+['"]([^'"]+)['"]"#).unwrap());
static IMPORT_BARE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*import\s+['"]([^'"]+)['"]"#).unwrap());
static REQUIRE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());

// Top-level declarations
static FUNCTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:default\s+)?(?:declare\s+)?(async\s+)?function\s*\*?\s*(\w+)\s*(?:<[^>]*>)?\s*\(")
        .unwrap()
});
static ARROW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:const|let|var)\s+(\w+)\s*(?::[^=]+)?=\s*(async\s+)?(?:function\s*\*?\s*\w*\s*)?(?:<[^>]*>\s*)?\(")
        .unwrap()
});
static ARROW_BARE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:const|let|var)\s+(\w+)\s*=\s*(async\s+)?(\w+)\s*=>").unwrap()
});
static CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:default\s+)?(?:declare\s+)?(abstract\s+)?class\s+(\w+)(?:\s*<[^{]*?>)?(?:\s+extends\s+([\w.]+)(?:\s*<[^{]*?>)?)?(?:\s+implements\s+([^{]+))?")
        .unwrap()
});
static INTERFACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:declare\s+)?interface\s+(\w+)(?:\s*<[^{]*?>)?(?:\s+extends\s+([^{]+))?")
        .unwrap()
});
static ENUM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:declare\s+)?(?:const\s+)?enum\s+(\w+)").unwrap()
});
static TYPE_ALIAS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:declare\s+)?type\s+(\w+)(?:\s*<[^=]*>)?\s*=").unwrap()
});
static CONSTANT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:export\s+)?const\s+([A-Z_][A-Z0-9_]*)\s*(?::[^=]+)?=\s*(.+?);?\s*$").unwrap()
});
static VARIABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:let|const|var)\s+([a-z_]\w*)\s*(?::[^=]+)?=").unwrap()
});
static DECORATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*@(\w[\w.]*)").unwrap());

// Class members
static METHOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*((?:(?:public|private|protected|static|async|readonly|override|abstract|declare|get|set)\s+)*)\*?(#?\w+)\s*[?!]?\s*(?:<[^>]*>)?\s*\(")
        .unwrap()
});
static ARROW_PROPERTY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*((?:(?:public|private|protected|static|readonly|override)\s+)*)(#?\w+)\s*(?::[^=]+)?=\s*(async\s+)?\(")
        .unwrap()
});
static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*((?:(?:public|private|protected|static|readonly|override|declare|abstract)\s+)*)(#?\w+)\s*[?!]?\s*(?::[^=;]+)?(?:=\s*(.*?))?;?\s*$")
        .unwrap()
});
static INTERFACE_METHOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:readonly\s+)?(\w+)\s*\??\s*(?:<[^>]*>)?\s*\(").unwrap()
});
static ENUM_MEMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([A-Za-z_$][\w$]*)").unwrap());

// Call targets
static KNOWN_FUNCTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bfunction\s*\*?\s*(\w+)").unwrap());
static KNOWN_ASSIGNED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?(?:\(|function\b|\w+\s*=>)").unwrap()
});
static KNOWN_METHOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*\([^)]*\)\s*(?::[^{;=]*)?\{").unwrap());
static KNOWN_ARROW_PROPERTY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*=\s*(?:async\s+)?\([^)]*\)\s*(?::[^=]+)?=>").unwrap());

const EXCLUDED_CALLS: &[&str] = &[
    "if", "while", "for", "switch", "catch", "function", "class", "return", "throw", "new",
    "typeof", "instanceof", "void", "console", "Array", "Object", "String", "Number", "Boolean",
    "Promise", "Math", "Date", "JSON", "parseInt", "parseFloat", "super", "require",
];

/// Names that look like members but are keywords.
const SKIPPED_MEMBERS: &[&str] = &[
    "get", "set", "if", "for", "while", "switch", "catch", "try", "return", "function",
];

pub struct JavaScriptExtractor;

/// Header of a function-like declaration.
struct Header {
    signature: String,
    /// Position of the closing `)` of the parameter list
    close: Pos,
    /// Column of `=>` on the close line, for arrow functions
    arrow: Option<usize>,
}

struct Scan<'a> {
    raw: &'a [&'a str],
    masked: &'a MaskedSource,
    braces: BraceMap,
    known: BTreeSet<String>,
}

impl LanguageExtractor for JavaScriptExtractor {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn languages(&self) -> &[&'static str] {
        &["javascript", "typescript"]
    }

    fn extract(&self, content: &str) -> SymbolTable {
        let raw: Vec<&str> = content.lines().collect();
        let masked = mask(content, &common::JAVASCRIPT);
        let scan = Scan {
            raw: &raw,
            braces: BraceMap::new(&masked),
            known: known_names(&masked),
            masked: &masked,
        };

        let mut table = SymbolTable::new();
        collect_imports(&mut table, &raw, &masked);

        let mut pending_decorators: Vec<String> = Vec::new();
        let mut pos: Pos = (0, 0);
        while pos.0 < masked.lines.len() {
            let (i, col) = pos;
            if col == 0 && (masked.is_continued(i) || scan.braces.depth_at(i) != 0) {
                pos = (i + 1, 0);
                continue;
            }
            let text = segment(masked.line(i), col, None);
            if text.trim().is_empty() {
                pos = (i + 1, 0);
                continue;
            }

            if let Some(caps) = DECORATOR_RE.captures(&text) {
                pending_decorators.push(caps[1].to_string());
                pos = (i + 1, 0);
                continue;
            }
            let decorators = std::mem::take(&mut pending_decorators);

            pos = if let Some(caps) = CLASS_RE.captures(&text) {
                scan.class(&mut table, pos, &caps, decorators)
            } else if let Some(caps) = INTERFACE_RE.captures(&text) {
                scan.interface(&mut table, pos, &caps)
            } else if let Some(caps) = ENUM_RE.captures(&text) {
                scan.enumeration(&mut table, pos, &caps[1])
            } else if let Some(caps) = TYPE_ALIAS_RE.captures(&text) {
                scan.type_alias(&mut table, pos, &text, &caps)
            } else if let Some(next) = scan.function(&mut table, pos, &text, decorators) {
                next
            } else {
                scan.binding(&mut table, pos, &text)
            };
        }

        table
    }
}

impl Scan<'_> {
    fn class(
        &self,
        table: &mut SymbolTable,
        at: Pos,
        caps: &regex::Captures,
        decorators: Vec<String>,
    ) -> Pos {
        let i = at.0;
        let mut class = ClassInfo::new(i + 1);
        if let Some(base) = caps.get(3) {
            class.inherits.push(base.as_str().to_string());
            if base.as_str().to_lowercase().contains("error") {
                class.kind = ClassKind::Exception;
            }
        }
        if let Some(interfaces) = caps.get(4) {
            class.inherits.extend(split_top_level(interfaces.as_str(), ','));
        }
        class.is_abstract = caps.get(1).is_some();
        class.decorators = decorators;
        class.doc = jsdoc_above(self.raw, i);

        let next = match self.braces.block_from(i, at.1) {
            Some(block) => {
                self.class_members(&mut class, block.open_line, block.close_line);
                block.end()
            }
            None => (i + 1, 0),
        };
        table.classes.insert(caps[2].to_string(), class);
        next
    }

    fn class_members(&self, class: &mut ClassInfo, open_line: usize, close_line: usize) {
        let member_depth = self.braces.depth_at(open_line) + 1;
        let mut pending_decorators: Vec<String> = Vec::new();
        let mut j = open_line + 1;

        while j <= close_line {
            let line = self.masked.line(j);
            if line.trim().is_empty()
                || self.masked.is_continued(j)
                || self.braces.depth_at(j) != member_depth
            {
                j += 1;
                continue;
            }

            if let Some(caps) = DECORATOR_RE.captures(line) {
                pending_decorators.push(caps[1].to_string());
                j += 1;
                continue;
            }
            let decorators = std::mem::take(&mut pending_decorators);

            if let Some(caps) = METHOD_RE.captures(line) {
                let modifiers = &caps[1];
                let name = &caps[2];
                if SKIPPED_MEMBERS.contains(&name) {
                    j += 1;
                    continue;
                }
                let open = (j, char_col(line, caps.get(0).map_or(0, |m| m.end()) - 1));
                let is_accessor = modifiers
                    .split_whitespace()
                    .any(|m| m == "get" || m == "set");
                if modifiers.split_whitespace().any(|m| m == "abstract") {
                    class.is_abstract = true;
                }

                let Some(header) = self.header(open, modifiers.contains("async")) else {
                    j += 1;
                    continue;
                };
                let (calls, next) = self.body(&header);

                if is_accessor {
                    push_unique(&mut class.properties, name.trim_start_matches('#'));
                } else {
                    let method_name = if name == "constructor" { "__init__" } else { name };
                    let mut info = FunctionInfo::new(header.signature, j + 1);
                    info.doc = jsdoc_above(self.raw, j);
                    info.decorators = decorators;
                    info.calls = calls;
                    class.methods.insert(method_name.to_string(), info);
                }
                j = line_after(next);
                continue;
            }

            if let Some(caps) = ARROW_PROPERTY_RE.captures(line) {
                let open = (j, char_col(line, caps.get(0).map_or(0, |m| m.end()) - 1));
                if let Some(header) = self.header(open, caps.get(3).is_some()) {
                    if header.arrow.is_some() {
                        let (calls, next) = self.body(&header);
                        let mut info = FunctionInfo::new(header.signature, j + 1);
                        info.doc = jsdoc_above(self.raw, j);
                        info.decorators = decorators;
                        info.calls = calls;
                        class.methods.insert(caps[2].to_string(), info);
                        j = line_after(next);
                        continue;
                    }
                }
            }

            let end = statement_end(self.masked, j);
            if let Some(caps) = FIELD_RE.captures(line) {
                let name = &caps[2];
                let is_static = caps[1].split_whitespace().any(|m| m == "static");
                let is_constant_name = name
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
                match caps.get(3) {
                    Some(value) if is_static && is_constant_name => {
                        class
                            .constants
                            .insert(name.to_string(), ValueKind::infer(value.as_str()));
                    }
                    _ if !name.starts_with('#') && !SKIPPED_MEMBERS.contains(&name) => {
                        push_unique(&mut class.properties, name);
                    }
                    _ => {}
                }
            }
            j = end + 1;
        }
    }

    fn interface(&self, table: &mut SymbolTable, at: Pos, caps: &regex::Captures) -> Pos {
        let i = at.0;
        let mut interface = InterfaceInfo {
            line: i + 1,
            extends: caps
                .get(2)
                .map(|e| split_top_level(e.as_str(), ','))
                .unwrap_or_default(),
            methods: Vec::new(),
            doc: jsdoc_above(self.raw, i),
        };

        let next = match self.braces.block_from(i, at.1) {
            Some(block) => {
                let member_depth = self.braces.depth_at(block.open_line) + 1;
                for j in block.open_line + 1..=block.close_line {
                    if self.braces.depth_at(j) != member_depth {
                        continue;
                    }
                    if let Some(m) = INTERFACE_METHOD_RE.captures(self.masked.line(j)) {
                        push_unique(&mut interface.methods, &m[1]);
                    }
                }
                block.end()
            }
            None => (i + 1, 0),
        };

        table.interfaces.insert(caps[1].to_string(), interface);
        next
    }

    fn enumeration(&self, table: &mut SymbolTable, at: Pos, name: &str) -> Pos {
        let i = at.0;
        let Some(block) = self.braces.block_from(i, at.1) else {
            return (i + 1, 0);
        };
        let values = split_top_level(&block_body(self.masked, &block), ',')
            .iter()
            .filter_map(|item| ENUM_MEMBER_RE.captures(item).map(|c| c[1].to_string()))
            .collect();

        table.enums.insert(
            name.to_string(),
            EnumInfo {
                values,
                line: Some(i + 1),
                doc: jsdoc_above(self.raw, i),
            },
        );
        block.end()
    }

    /// `type X = ...` up to the terminating `;`, or the end of the last
    /// line when the statement runs on without one.
    fn type_alias(&self, table: &mut SymbolTable, at: Pos, text: &str, caps: &regex::Captures) -> Pos {
        let i = at.0;
        let start = (i, at.1 + char_col(text, caps.get(0).map_or(0, |m| m.end())));

        let mut depth = 0i32;
        let mut end: Pos = (i, usize::MAX);
        'lines: for idx in i..self.masked.lines.len() {
            let skip = if idx == i { start.1 } else { 0 };
            for (col, c) in self.masked.line(idx).chars().enumerate().skip(skip) {
                match c {
                    '{' | '(' | '[' | '<' => depth += 1,
                    '}' | ')' | ']' | '>' => depth -= 1,
                    ';' if depth <= 0 => {
                        end = (idx, col);
                        break 'lines;
                    }
                    _ => {}
                }
            }
            end = (idx, usize::MAX);
            let trimmed = self.masked.line(idx).trim_end();
            let continues = depth > 0
                || trimmed.ends_with('=')
                || trimmed.ends_with('|')
                || trimmed.ends_with('&')
                || self
                    .masked
                    .lines
                    .get(idx + 1)
                    .map(|next| next.trim_start())
                    .is_some_and(|next| next.starts_with('|') || next.starts_with('&'));
            if !continues {
                break;
            }
        }

        let definition = unmask(self.masked, self.raw, &common::JAVASCRIPT, start, end);
        table.type_aliases.insert(caps[1].to_string(), definition);
        if end.1 == usize::MAX {
            (end.0 + 1, 0)
        } else {
            (end.0, end.1 + 1)
        }
    }

    /// Function declarations and functions assigned to bindings.
    fn function(
        &self,
        table: &mut SymbolTable,
        at: Pos,
        text: &str,
        decorators: Vec<String>,
    ) -> Option<Pos> {
        let (i, col) = at;

        if let Some(caps) = ARROW_BARE_RE.captures(text) {
            let arrow = col + char_col(text, text.find("=>")?);
            let mut signature = format!("({})", &caps[3]);
            if caps.get(2).is_some() {
                signature = format!("async {}", signature);
            }
            let header = Header {
                signature,
                close: (i, arrow.saturating_sub(1)),
                arrow: Some(arrow),
            };
            return Some(self.record_function(table, i, &caps[1], header, decorators));
        }

        let (caps, is_binding) = match FUNCTION_RE.captures(text) {
            Some(caps) => (caps, false),
            None => (ARROW_RE.captures(text)?, true),
        };
        let matched = caps.get(0)?;
        let is_async = caps.get(if is_binding { 2 } else { 1 }).is_some();
        let open = (i, col + char_col(text, matched.end() - 1));
        let header = self.header(open, is_async)?;
        if is_binding && header.arrow.is_none() && !matched.as_str().contains("function") {
            return None;
        }

        let name = if is_binding { caps[1].to_string() } else { caps[2].to_string() };
        Some(self.record_function(table, i, &name, header, decorators))
    }

    fn record_function(
        &self,
        table: &mut SymbolTable,
        i: usize,
        name: &str,
        header: Header,
        decorators: Vec<String>,
    ) -> Pos {
        let (calls, next) = self.body(&header);
        let mut info = FunctionInfo::new(header.signature, i + 1);
        info.doc = jsdoc_above(self.raw, i);
        info.decorators = decorators;
        info.calls = calls;
        table.functions.insert(name.to_string(), info);
        next
    }

    /// Constants and variables; anything else is skipped up to the end of
    /// the statement.
    fn binding(&self, table: &mut SymbolTable, at: Pos, text: &str) -> Pos {
        let stop = statement_stop(text);
        let statement: String = match stop {
            Some(stop) => text.chars().take(stop + 1).collect(),
            None => text.to_string(),
        };
        if let Some(caps) = CONSTANT_RE.captures(&statement) {
            table
                .constants
                .insert(caps[1].to_string(), ValueKind::infer(&caps[2]));
        } else if let Some(caps) = VARIABLE_RE.captures(&statement) {
            table.add_variable(&caps[1]);
        }
        match stop {
            Some(stop) => (at.0, at.1 + stop + 1),
            None => (statement_end(self.masked, at.0) + 1, 0),
        }
    }

    /// Parameter list starting at `open`, plus the return annotation.
    fn header(&self, open: Pos, is_async: bool) -> Option<Header> {
        let close = matching_paren(self.masked, open)?;
        let params = unmask(
            self.masked,
            self.raw,
            &common::JAVASCRIPT,
            (open.0, open.1 + 1),
            close,
        );

        let after = rest_of_line(self.masked, close.0, close.1);
        let arrow_offset = after.find("=>");
        let annotation_end = [after.find('{'), arrow_offset, after.find(';')]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(after.len());

        let mut signature = format!("({})", params);
        if let Some(ret) = after[..annotation_end].trim().strip_prefix(':') {
            let ret = common::normalize_whitespace(ret);
            if !ret.is_empty() {
                signature.push_str(": ");
                signature.push_str(&ret);
            }
        }
        if is_async {
            signature = format!("async {}", signature);
        }

        let arrow = arrow_offset
            .filter(|offset| after[..*offset].trim().is_empty() || after[..*offset].trim().starts_with(':'))
            .map(|offset| close.1 + 1 + char_col(&after, offset));

        Some(Header {
            signature,
            close,
            arrow,
        })
    }

    /// Calls made in the body that follows `header`, and the position just
    /// past it.
    fn body(&self, header: &Header) -> (Vec<String>, Pos) {
        let (line, col) = header.close;

        if let Some(arrow) = header.arrow {
            let after_arrow = rest_of_line(self.masked, line, arrow + 1);
            if !after_arrow.trim().is_empty() && !after_arrow.trim_start().starts_with('{') {
                if let Some(stop) = statement_stop(&after_arrow) {
                    let body: String = after_arrow.chars().take(stop).collect();
                    return (
                        find_calls(&body, &self.known, EXCLUDED_CALLS),
                        (line, arrow + 2 + stop + 1),
                    );
                }
                let end = statement_end(self.masked, line).max(line);
                let mut body = after_arrow;
                body.push('\n');
                body.push_str(&self.masked.join(line + 1, end));
                return (find_calls(&body, &self.known, EXCLUDED_CALLS), (end + 1, 0));
            }
        }

        match self.braces.block_from(line, col + 1) {
            Some(block) => {
                let body = block_body(self.masked, &block);
                (find_calls(&body, &self.known, EXCLUDED_CALLS), block.end())
            }
            // Overload or ambient declaration
            None => {
                let after = rest_of_line(self.masked, line, col);
                let next = statement_stop(&after).map_or((line + 1, 0), |stop| (line, col + 1 + stop + 1));
                (Vec::new(), next)
            }
        }
    }
}

/// Char column of the first `;` outside brackets in `text`.
fn statement_stop(text: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (col, c) in text.chars().enumerate() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ';' if depth <= 0 => return Some(col),
            _ => {}
        }
    }
    None
}

/// First line wholly after `pos`.
fn line_after(pos: Pos) -> usize {
    if pos.1 == 0 {
        pos.0
    } else {
        pos.0 + 1
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}

fn known_names(masked: &MaskedSource) -> BTreeSet<String> {
    let mut known = BTreeSet::new();
    for line in &masked.lines {
        for re in [
            &*KNOWN_FUNCTION_RE,
            &*KNOWN_ASSIGNED_RE,
            &*KNOWN_METHOD_RE,
            &*KNOWN_ARROW_PROPERTY_RE,
        ] {
            for caps in re.captures_iter(line) {
                known.insert(caps[1].to_string());
            }
        }
    }
    known
}

fn collect_imports(table: &mut SymbolTable, raw: &[&str], masked: &MaskedSource) {
    for (idx, line) in raw.iter().enumerate() {
        let code = masked.line(idx);
        if code.trim().is_empty() {
            continue;
        }
        let found = IMPORT_FROM_RE
            .captures(line)
            .or_else(|| IMPORT_TAIL_RE.captures(line))
            .or_else(|| IMPORT_BARE_RE.captures(line));
        if let Some(caps) = found {
            table.add_import(&caps[1]);
            continue;
        }
        if code.contains("require") {
            for caps in REQUIRE_RE.captures_iter(line) {
                table.add_import(&caps[1]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(src: &str) -> SymbolTable {
        JavaScriptExtractor.extract(src)
    }

    #[test]
    fn test_imports() {
        let src = r#"import React from 'react';
import { a, b } from "./util";
import * as path from 'path';
import './styles.css';
import {
  x,
  y,
} from '../lib';
export { z } from './z';
const fs = require('fs');
// const no = require('commented');
"#;
        let table = extract(src);
        assert_eq!(
            table.imports,
            vec!["react", "./util", "path", "./styles.css", "../lib", "./z", "fs"]
        );
    }

    #[test]
    fn test_functions_and_calls() {
        let src = "function foo() {\n  bar();\n}\n\nfunction bar() {\n  return 1;\n}\n";
        let table = extract(src);
        assert_eq!(table.functions["foo"].calls, vec!["bar"]);
        assert_eq!(table.functions["foo"].line, 1);
        assert_eq!(table.functions["bar"].line, 5);
    }

    #[test]
    fn test_function_signatures() {
        let src = "export async function load(url: string, opts = {}): Promise<Data> {\n  return fetch(url);\n}\n";
        let table = extract(src);
        assert_eq!(
            table.functions["load"].signature,
            "async (url: string, opts = {}): Promise<Data>"
        );
    }

    #[test]
    fn test_arrow_functions() {
        let src = "const helper = (x) => x * 2;\nexport const run = async (a, b) => {\n  return helper(a) + b;\n};\nconst twice = n => helper(helper(n));\n";
        let table = extract(src);
        assert_eq!(table.functions["helper"].signature, "(x)");
        assert_eq!(table.functions["run"].signature, "async (a, b)");
        assert_eq!(table.functions["run"].calls, vec!["helper"]);
        assert_eq!(table.functions["twice"].signature, "(n)");
        assert_eq!(table.functions["twice"].calls, vec!["helper"]);
        assert!(table.variables.is_empty());
    }

    #[test]
    fn test_class_members() {
        let src = r#"/**
 * Handles users.
 */
export class UserService extends BaseService implements Service, Disposable {
  static MAX_USERS = 100;
  name: string;
  #secret = 1;

  constructor(repo) {
    this.repo = repo;
    this.init();
  }

  init() {
    validate();
  }

  get count() {
    return 0;
  }

  handle = (event) => {
    this.init();
  };
}

function validate() {}
"#;
        let table = extract(src);
        let class = &table.classes["UserService"];
        assert_eq!(class.line, 4);
        assert_eq!(class.doc.as_deref(), Some("Handles users."));
        assert_eq!(class.inherits, vec!["BaseService", "Service", "Disposable"]);
        assert_eq!(class.constants["MAX_USERS"], ValueKind::Number);
        assert_eq!(class.properties, vec!["name", "count"]);
        assert_eq!(class.methods["__init__"].calls, vec!["init"]);
        assert_eq!(class.methods["init"].calls, vec!["validate"]);
        assert_eq!(class.methods["handle"].calls, vec!["init"]);
        assert!(!class.methods.contains_key("count"));
        assert!(table.functions.contains_key("validate"));
        assert!(!table.functions.contains_key("init"));
    }

    #[test]
    fn test_abstract_decorated_exception() {
        let src = "@Injectable()\nexport abstract class Repo {\n  @Log\n  abstract find(id: number): Item;\n  save(item) {\n  }\n}\n\nclass NotFoundError extends Error {}\n";
        let table = extract(src);
        let repo = &table.classes["Repo"];
        assert!(repo.is_abstract);
        assert_eq!(repo.decorators, vec!["Injectable"]);
        assert_eq!(repo.methods["find"].signature, "(id: number): Item");
        assert_eq!(repo.methods["find"].decorators, vec!["Log"]);
        assert!(repo.methods.contains_key("save"));
        assert_eq!(table.classes["NotFoundError"].kind, ClassKind::Exception);
    }

    #[test]
    fn test_multiline_parameters_do_not_become_properties() {
        let src = "class A {\n  run(\n    first,\n    second\n  ) {\n    go();\n  }\n}\nfunction go() {}\n";
        let table = extract(src);
        let class = &table.classes["A"];
        assert_eq!(class.methods["run"].signature, "(first, second)");
        assert_eq!(class.methods["run"].calls, vec!["go"]);
        assert!(class.properties.is_empty());
    }

    #[test]
    fn test_interfaces_types_enums() {
        let src = r#"/** A shape. */
export interface Shape extends Named, Sized {
  area(): number;
  name: string;
  scale?(factor: number): void;
}

export type Id = string | number;
type Point = {
  x: number;
  y: number;
};
type Mode =
  | 'light'
  | 'dark';

export enum Color {
  Red = "red",
  Green = 2,
  Blue,
}
"#;
        let table = extract(src);
        let shape = &table.interfaces["Shape"];
        assert_eq!(shape.extends, vec!["Named", "Sized"]);
        assert_eq!(shape.methods, vec!["area", "scale"]);
        assert_eq!(shape.doc.as_deref(), Some("A shape."));

        assert_eq!(table.type_aliases["Id"], "string | number");
        assert_eq!(table.type_aliases["Point"], "{ x: number; y: number; }");
        assert_eq!(table.type_aliases["Mode"], "| 'light' | 'dark'");

        assert_eq!(table.enums["Color"].values, vec!["Red", "Green", "Blue"]);
        assert_eq!(table.enums["Color"].line, Some(17));
    }

    #[test]
    fn test_constants_and_variables() {
        let src = "const API_URL = 'https://x';\nexport const LIMITS = [1, 2];\nconst MAX = 10;\nlet counter = 0;\nconst config: Config = load();\nvar legacy = true;\n";
        let table = extract(src);
        assert_eq!(table.constants["API_URL"], ValueKind::Str);
        assert_eq!(table.constants["LIMITS"], ValueKind::Collection);
        assert_eq!(table.constants["MAX"], ValueKind::Number);
        assert_eq!(table.variables, vec!["counter", "config", "legacy"]);
    }

    #[test]
    fn test_nested_functions_not_top_level() {
        let src = "function outer() {\n  function inner() {}\n  inner();\n}\n";
        let table = extract(src);
        assert_eq!(table.functions.keys().collect::<Vec<_>>(), vec!["outer"]);
        assert_eq!(table.functions["outer"].calls, vec!["inner"]);
    }

    #[test]
    fn test_braces_in_strings_and_comments() {
        let src = "function a() {\n  const s = \"}\"; // {\n  b();\n}\nfunction b() {}\n";
        let table = extract(src);
        assert_eq!(table.functions["a"].calls, vec!["b"]);
        assert!(table.functions.contains_key("b"));
    }

    #[test]
    fn test_unclosed_body_runs_to_end() {
        let table = extract("function a() {\n  b();\nfunction b() {\n");
        assert_eq!(table.functions["a"].calls, vec!["b"]);
    }

    #[test]
    fn test_declarations_sharing_a_line() {
        let src = "const s = \"é😀\"; function f() { g(); }\nfunction g() {}\nconst MAX = 3; let n = 0; const h = () => f();\n";
        let table = extract(src);
        assert_eq!(table.functions.keys().collect::<Vec<_>>(), vec!["f", "g", "h"]);
        assert_eq!(table.functions["f"].line, 1);
        assert_eq!(table.functions["f"].calls, vec!["g"]);
        assert_eq!(table.functions["h"].calls, vec!["f"]);
        assert_eq!(table.constants["MAX"], ValueKind::Number);
        assert_eq!(table.variables, vec!["s", "n"]);
    }

    #[test]
    fn test_excluded_calls() {
        let src = "function parseInt() {}\nfunction f() { return parseInt('1'); }\n";
        assert!(extract(src).functions["f"].calls.is_empty());
    }
}
