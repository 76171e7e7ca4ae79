//! Python symbol extraction.
//!
//! Scope is tracked with an indentation stack. Only `def`s at module level
//! become functions and only `def`s directly inside a module-level class
//! become methods; anything nested deeper is walked for scope but not
//! recorded.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::common::{self, find_calls, indent_width, mask, normalize_whitespace, MaskedSource};
use super::LanguageExtractor;
use crate::index::{ClassInfo, ClassKind, FunctionInfo, SymbolTable, ValueKind};

static DEF_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)(async\s+)?def\s+(\w+)\s*\(").unwrap());
static CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)class\s+(\w+)\s*(?:\((.*)\))?\s*:").unwrap());
static DECORATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*@([\w.]+)").unwrap());
static IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:from\s+(\S+)\s+)?import\s+(.+)$").unwrap());
static MODULE_CONST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z_][A-Z0-9_]*)\s*=\s*(.+)$").unwrap());
static MODULE_VAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)\s*:\s*([^=]+)=").unwrap());
static TYPE_ALIAS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\w+)\s*=\s*(?:Union|Optional|List|Dict|Tuple|Set|Type|Callable|Literal|TypeVar|NewType|TypedDict|Protocol)\[.+\]\s*$",
    )
    .unwrap()
});
static TYPE_STMT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^type\s+(\w+)\s*=\s*(.+)$").unwrap());
static CLASS_CONST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s+([A-Z_][A-Z0-9_]*)\s*=\s*(.+)$").unwrap());
static ENUM_MEMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s+([A-Z_][A-Z0-9_]*)\s*(?:=.*)?$").unwrap());
static PROPERTY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s+(\w+)\s*:\s*([^=]+)").unwrap());
static DOCSTRING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*(?:[rRuU]?)(?:'''|""")\s*(.*?)\s*(?:'''|"""|$)"#).unwrap());

/// Dunder methods left out of the index. `__init__` is always kept.
const SKIPPED_DUNDERS: &[&str] = &[
    "__repr__", "__str__", "__hash__", "__eq__", "__ne__", "__lt__", "__le__", "__gt__",
    "__ge__", "__bool__",
];

/// Builtins and keywords never recorded as calls.
const EXCLUDED_CALLS: &[&str] = &[
    "if", "elif", "while", "for", "with", "except", "def", "class", "return", "yield", "raise",
    "assert", "print", "len", "str", "int", "float", "bool", "list", "dict", "set", "tuple",
    "type", "isinstance", "issubclass", "super", "range", "enumerate", "zip", "map", "filter",
    "sorted", "reversed", "open", "input", "eval",
];

pub struct PythonExtractor;

enum Scope {
    /// Module-level class being recorded
    Class { name: String, indent: usize },
    /// Function, method or nested class; walked but not recorded
    Other { indent: usize },
}

impl Scope {
    fn indent(&self) -> usize {
        match self {
            Scope::Class { indent, .. } | Scope::Other { indent } => *indent,
        }
    }
}

struct ParsedDef {
    name: String,
    signature: String,
    /// Index of the line holding the closing `:`
    end_line: usize,
    /// Code after the `:` on the same line (one-line bodies)
    inline_body: String,
}

impl LanguageExtractor for PythonExtractor {
    fn name(&self) -> &'static str {
        "python"
    }

    fn languages(&self) -> &[&'static str] {
        &["python"]
    }

    fn extract(&self, content: &str) -> SymbolTable {
        let lines: Vec<&str> = content.lines().collect();
        let masked = mask(content, &common::PYTHON);
        let mut table = SymbolTable::new();

        // Pass 1: every def name is a call target
        let known: BTreeSet<String> = masked
            .lines
            .iter()
            .filter_map(|l| DEF_START_RE.captures(l))
            .map(|c| c[3].to_string())
            .collect();

        for line in &masked.lines {
            if let Some(caps) = IMPORT_RE.captures(line.trim()) {
                match caps.get(1) {
                    Some(module) => table.add_import(module.as_str()),
                    None => {
                        for item in caps[2].split(',') {
                            let module = item.split(" as ").next().unwrap_or("").trim();
                            table.add_import(module.trim_matches(|c| c == '(' || c == ')'));
                        }
                    }
                }
            }
        }

        let mut stack: Vec<Scope> = Vec::new();
        let mut pending_decorators: Vec<String> = Vec::new();
        let mut i = 0;

        while i < masked.lines.len() {
            let line = masked.line(i);
            if line.trim().is_empty() || masked.is_continued(i) {
                i += 1;
                continue;
            }

            let indent = indent_width(line);
            while stack.last().is_some_and(|s| s.indent() >= indent) {
                stack.pop();
            }
            let enclosing_class = match stack.as_slice() {
                [Scope::Class { name, .. }] => Some(name.clone()),
                _ => None,
            };

            if let Some(caps) = DECORATOR_RE.captures(line) {
                pending_decorators.push(caps[1].to_string());
                i += 1;
                continue;
            }

            if let Some(caps) = CLASS_RE.captures(line) {
                let name = caps[2].to_string();
                if stack.is_empty() {
                    let class = build_class(&caps, &lines, i, std::mem::take(&mut pending_decorators));
                    table.classes.insert(name.clone(), class);
                    stack.push(Scope::Class { name, indent });
                } else {
                    pending_decorators.clear();
                    stack.push(Scope::Other { indent });
                }
                i += 1;
                continue;
            }

            if DEF_START_RE.is_match(line) {
                let Some(def) = parse_def(&masked, &lines, i) else {
                    i += 1;
                    continue;
                };
                let decorators = std::mem::take(&mut pending_decorators);
                stack.push(Scope::Other { indent });

                let keep = !SKIPPED_DUNDERS.contains(&def.name.as_str());
                let top_level = stack.len() == 1;
                if keep && (top_level || enclosing_class.is_some()) {
                    let body_end = body_end(&masked, def.end_line, indent);
                    let mut body = def.inline_body.clone();
                    body.push('\n');
                    body.push_str(&masked.join(def.end_line + 1, body_end));

                    let mut info = FunctionInfo::new(def.signature.clone(), i + 1);
                    info.doc = docstring(&lines, def.end_line + 1);
                    info.calls = find_calls(&body, &known, EXCLUDED_CALLS);

                    match &enclosing_class {
                        Some(class_name) if !top_level => {
                            if let Some(class) = table.classes.get_mut(class_name) {
                                if decorators.iter().any(|d| d.ends_with("abstractmethod")) {
                                    class.is_abstract = true;
                                }
                                info.decorators = decorators;
                                class.methods.insert(def.name, info);
                            }
                        }
                        _ => {
                            info.decorators = decorators;
                            table.functions.insert(def.name, info);
                        }
                    }
                }

                i = def.end_line + 1;
                continue;
            }

            match &enclosing_class {
                Some(class_name) => {
                    if let Some(class) = table.classes.get_mut(class_name) {
                        record_class_member(class, line);
                    }
                }
                None if stack.is_empty() && indent == 0 => {
                    record_module_statement(&mut table, line, lines.get(i).copied().unwrap_or(""));
                }
                None => {}
            }
            i += 1;
        }

        table.promote_enums();
        table
    }
}

fn build_class(caps: &regex::Captures, lines: &[&str], idx: usize, decorators: Vec<String>) -> ClassInfo {
    let mut class = ClassInfo::new(idx + 1);
    class.inherits = caps
        .get(3)
        .map(|b| common::split_top_level(b.as_str(), ','))
        .unwrap_or_default();
    class.kind = ClassKind::from_bases(&class.inherits);
    class.is_abstract = class.inherits.iter().any(|b| {
        let base = b.rsplit('.').next().unwrap_or(b).to_lowercase();
        base == "abc" || base == "protocol" || b.starts_with("metaclass=ABCMeta")
    });
    class.decorators = decorators;
    class.doc = docstring(lines, idx + 1);
    class
}

/// Joins a possibly multi-line `def` header and splits out its parts.
///
/// Brackets and the closing `:` are found on the masked text; string
/// literals are copied from the raw text so defaults survive.
fn parse_def(masked: &MaskedSource, raw: &[&str], start: usize) -> Option<ParsedDef> {
    let first = masked.line(start);
    let caps = DEF_START_RE.captures(first)?;
    let name = caps[3].to_string();
    let is_async = caps.get(2).is_some();
    let open_col = first[..caps.get(0)?.end() - 1].chars().count();

    let mut header = String::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut params_end: Option<usize> = None;
    let mut colon: Option<usize> = None;
    let mut inline_body = String::new();
    let mut end_line = start;

    for line_idx in start..masked.lines.len() {
        let skip = if line_idx == start {
            open_col
        } else {
            header.push(' ');
            0
        };
        let raw_chars = raw.get(line_idx).copied().unwrap_or("").chars();
        let pairs = masked
            .line(line_idx)
            .chars()
            .zip(raw_chars.chain(std::iter::repeat(' ')))
            .skip(skip);

        for (m, r) in pairs {
            if colon.is_some() {
                inline_body.push(m);
                continue;
            }
            if matches!(m, '"' | '\'') {
                in_string = !in_string;
                header.push(m);
                continue;
            }
            header.push(if in_string { r } else { m });
            if in_string {
                continue;
            }
            match (m, params_end) {
                ('(' | '[' | '{', None) => depth += 1,
                (')' | ']' | '}', None) => {
                    depth -= 1;
                    if depth == 0 {
                        params_end = Some(header.len());
                    }
                }
                (':', Some(_)) => colon = Some(header.len() - 1),
                _ => {}
            }
        }

        end_line = line_idx;
        if colon.is_some() {
            break;
        }
    }

    let params_end = params_end?;
    let colon = colon?;
    let params = normalize_whitespace(&header[1..params_end - 1]);

    let mut signature = format!("({})", params);
    if let Some(ret) = header[params_end..colon].trim().strip_prefix("->") {
        signature.push_str(" -> ");
        signature.push_str(&normalize_whitespace(ret));
    }
    if is_async {
        signature = format!("async {}", signature);
    }

    Some(ParsedDef {
        name,
        signature,
        end_line,
        inline_body,
    })
}

/// Last line of the indented block after `header_end`.
fn body_end(masked: &MaskedSource, header_end: usize, def_indent: usize) -> usize {
    let mut last = header_end;
    for idx in header_end + 1..masked.lines.len() {
        let line = masked.line(idx);
        if line.trim().is_empty() || masked.is_continued(idx) {
            continue;
        }
        if indent_width(line) <= def_indent {
            break;
        }
        last = idx;
    }
    last
}

/// First text of a docstring starting at `idx`.
fn docstring(lines: &[&str], idx: usize) -> Option<String> {
    let line = lines.get(idx)?;
    let caps = DOCSTRING_RE.captures(line)?;
    let text = caps[1].trim();
    if !text.is_empty() {
        return Some(text.to_string());
    }
    // Opening quotes alone on their line
    lines
        .get(idx + 1)
        .map(|l| l.trim().trim_end_matches("\"\"\"").trim_end_matches("'''").trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

fn record_class_member(class: &mut ClassInfo, line: &str) {
    if class.kind == ClassKind::Enum {
        if let Some(caps) = ENUM_MEMBER_RE.captures(line) {
            let member = caps[1].to_string();
            if !class.members.contains(&member) {
                class.members.push(member);
            }
            return;
        }
    }

    if let Some(caps) = CLASS_CONST_RE.captures(line) {
        class
            .constants
            .insert(caps[1].to_string(), ValueKind::infer(&caps[2]));
        return;
    }

    if let Some(caps) = PROPERTY_RE.captures(line) {
        let name = caps[1].to_string();
        if !name.starts_with('_') && !class.properties.contains(&name) {
            class.properties.push(name);
        }
    }
}

fn record_module_statement(table: &mut SymbolTable, masked_line: &str, raw_line: &str) {
    if TYPE_ALIAS_RE.is_match(raw_line.trim_end()) {
        if let Some((name, definition)) = raw_line.split_once('=') {
            table
                .type_aliases
                .insert(name.trim().to_string(), definition.trim().to_string());
        }
        return;
    }

    if let Some(caps) = TYPE_STMT_RE.captures(raw_line.trim_end()) {
        table
            .type_aliases
            .insert(caps[1].to_string(), caps[2].trim().to_string());
        return;
    }

    if let Some(caps) = MODULE_CONST_RE.captures(masked_line.trim_end()) {
        table
            .constants
            .insert(caps[1].to_string(), ValueKind::infer(&caps[2]));
        return;
    }

    if let Some(caps) = MODULE_VAR_RE.captures(masked_line) {
        let name = &caps[1];
        if !name.starts_with('_') {
            table.add_variable(name);
        }
    }
}
