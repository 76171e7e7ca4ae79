//! Scanning helpers shared by the line-based extractors.
//!
//! Extractors match declarations line by line. Scope tracking and call
//! detection run on a *masked* copy of the source where the inside of
//! string literals and comments is blanked out, so braces, parentheses and
//! identifiers in strings never count. Masking keeps every newline and the
//! quote characters themselves, so line numbers and value-kind inference
//! still line up with the original text.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Lexical shape of a language, as far as masking needs it.
#[derive(Debug, Clone, Copy)]
pub struct Syntax {
    pub line_comments: &'static [&'static str],
    pub block_comment: Option<(&'static str, &'static str)>,
    pub quotes: &'static [char],
    /// Quotes whose literals may span lines
    pub multiline_quotes: &'static [char],
    /// `'''` and `"""` open multi-line strings
    pub triple_quotes: bool,
    /// A line comment only starts after whitespace or an operator (shell `#`)
    pub comment_needs_boundary: bool,
}

pub const C_LIKE: Syntax = Syntax {
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    quotes: &['"', '\''],
    multiline_quotes: &[],
    triple_quotes: false,
    comment_needs_boundary: false,
};

pub const JAVASCRIPT: Syntax = Syntax {
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    quotes: &['"', '\'', '`'],
    multiline_quotes: &['`'],
    triple_quotes: false,
    comment_needs_boundary: false,
};

pub const PYTHON: Syntax = Syntax {
    line_comments: &["#"],
    block_comment: None,
    quotes: &['"', '\''],
    multiline_quotes: &[],
    triple_quotes: true,
    comment_needs_boundary: false,
};

pub const SHELL: Syntax = Syntax {
    line_comments: &["#"],
    block_comment: None,
    quotes: &['"', '\''],
    multiline_quotes: &[],
    triple_quotes: false,
    comment_needs_boundary: true,
};

pub const PROLOG: Syntax = Syntax {
    line_comments: &["%"],
    block_comment: Some(("/*", "*/")),
    quotes: &['"', '\''],
    multiline_quotes: &[],
    triple_quotes: false,
    comment_needs_boundary: false,
};

/// Source with literals and comments blanked, split into lines.
pub struct MaskedSource {
    pub lines: Vec<String>,
    /// `continued[i]` is true when line `i` begins inside a string or block comment
    pub continued: Vec<bool>,
}

impl MaskedSource {
    pub fn line(&self, idx: usize) -> &str {
        self.lines.get(idx).map(String::as_str).unwrap_or("")
    }

    pub fn is_continued(&self, idx: usize) -> bool {
        self.continued.get(idx).copied().unwrap_or(false)
    }

    /// Joins lines `from..=to` (clamped) with newlines.
    pub fn join(&self, from: usize, to: usize) -> String {
        if from >= self.lines.len() || from > to {
            return String::new();
        }
        let to = to.min(self.lines.len() - 1);
        self.lines[from..=to].join("\n")
    }
}

#[derive(Clone, Copy)]
enum MaskState {
    Code,
    LineComment,
    BlockComment(&'static str),
    Str { quote: char, triple: bool, multiline: bool },
}

fn starts_with_at(chars: &[char], idx: usize, token: &str) -> bool {
    let mut i = idx;
    for t in token.chars() {
        if chars.get(i) != Some(&t) {
            return false;
        }
        i += 1;
    }
    true
}

pub fn mask(content: &str, syntax: &Syntax) -> MaskedSource {
    let chars: Vec<char> = content.chars().collect();
    let mut out = String::with_capacity(content.len());
    let mut continued = vec![false];
    let mut state = MaskState::Code;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\n' {
            out.push('\n');
            i += 1;
            state = match state {
                MaskState::LineComment => MaskState::Code,
                MaskState::Str { multiline: false, .. } => MaskState::Code,
                other => other,
            };
            continued.push(!matches!(state, MaskState::Code));
            continue;
        }

        match state {
            MaskState::Code => {
                if let Some(token) = syntax
                    .line_comments
                    .iter()
                    .find(|t| starts_with_at(&chars, i, t))
                {
                    let at_boundary = !syntax.comment_needs_boundary
                        || i == 0
                        || chars[i - 1].is_whitespace()
                        || matches!(chars[i - 1], ';' | '&' | '|' | '(');
                    if at_boundary {
                        state = MaskState::LineComment;
                        out.extend(std::iter::repeat(' ').take(token.chars().count()));
                        i += token.chars().count();
                        continue;
                    }
                }
                if let Some((open, close)) = syntax.block_comment {
                    if starts_with_at(&chars, i, open) {
                        state = MaskState::BlockComment(close);
                        out.extend(std::iter::repeat(' ').take(open.chars().count()));
                        i += open.chars().count();
                        continue;
                    }
                }
                if syntax.quotes.contains(&c) {
                    let triple = syntax.triple_quotes
                        && chars.get(i + 1) == Some(&c)
                        && chars.get(i + 2) == Some(&c);
                    let width = if triple { 3 } else { 1 };
                    out.extend(std::iter::repeat(c).take(width));
                    i += width;
                    state = MaskState::Str {
                        quote: c,
                        triple,
                        multiline: triple || syntax.multiline_quotes.contains(&c),
                    };
                    continue;
                }
                out.push(c);
                i += 1;
            }
            MaskState::LineComment => {
                out.push(' ');
                i += 1;
            }
            MaskState::BlockComment(close) => {
                if starts_with_at(&chars, i, close) {
                    out.extend(std::iter::repeat(' ').take(close.chars().count()));
                    i += close.chars().count();
                    state = MaskState::Code;
                } else {
                    out.push(' ');
                    i += 1;
                }
            }
            MaskState::Str { quote, triple, .. } => {
                if c == '\\' && chars.get(i + 1).is_some_and(|n| *n != '\n') {
                    out.push_str("  ");
                    i += 2;
                } else if c == quote && !triple {
                    out.push(c);
                    i += 1;
                    state = MaskState::Code;
                } else if c == quote
                    && chars.get(i + 1) == Some(&quote)
                    && chars.get(i + 2) == Some(&quote)
                {
                    out.extend(std::iter::repeat(quote).take(3));
                    i += 3;
                    state = MaskState::Code;
                } else {
                    out.push(' ');
                    i += 1;
                }
            }
        }
    }

    let lines: Vec<String> = out.lines().map(str::to_string).collect();
    continued.truncate(lines.len());
    continued.resize(lines.len(), false);
    MaskedSource { lines, continued }
}

// =====================================================
// Brace tracking
// =====================================================

/// A `{ ... }` block located by `BraceMap::block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub open_line: usize,
    pub open_col: usize,
    pub close_line: usize,
    /// `None` when the block runs to end of file unclosed
    pub close_col: Option<usize>,
}

impl Block {
    /// Position just past the closing brace.
    pub fn end(&self) -> Pos {
        match self.close_col {
            Some(col) => (self.close_line, col + 1),
            None => (self.close_line + 1, 0),
        }
    }
}

/// Brace depth per line of a masked source.
pub struct BraceMap {
    /// (col, char) of every `{`, `}` and `;` per line
    tokens: Vec<Vec<(usize, char)>>,
    depth_before: Vec<usize>,
}

impl BraceMap {
    pub fn new(masked: &MaskedSource) -> Self {
        let mut tokens = Vec::with_capacity(masked.lines.len());
        let mut depth_before = Vec::with_capacity(masked.lines.len());
        let mut depth = 0usize;

        for line in &masked.lines {
            depth_before.push(depth);
            let line_tokens: Vec<(usize, char)> = line
                .chars()
                .enumerate()
                .filter(|(_, c)| matches!(c, '{' | '}' | ';'))
                .collect();
            for (_, c) in &line_tokens {
                match c {
                    '{' => depth += 1,
                    '}' => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }
            tokens.push(line_tokens);
        }

        Self {
            tokens,
            depth_before,
        }
    }

    /// Brace depth at the start of `line`.
    pub fn depth_at(&self, line: usize) -> usize {
        self.depth_before.get(line).copied().unwrap_or(0)
    }

    /// Brace depth just before char column `col` of `line`.
    pub fn depth_before(&self, line: usize, col: usize) -> usize {
        let Some(line_tokens) = self.tokens.get(line) else {
            return 0;
        };
        line_tokens
            .iter()
            .take_while(|(c, _)| *c < col)
            .fold(self.depth_at(line), |depth, (_, token)| match token {
                '{' => depth + 1,
                '}' => depth.saturating_sub(1),
                _ => depth,
            })
    }

    /// Finds the block opened by the first `{` at or after `start_line`.
    ///
    /// Returns `None` when a `;` or a closing `}` comes first, i.e. the
    /// declaration has no body.
    pub fn block(&self, start_line: usize) -> Option<Block> {
        self.block_from(start_line, 0)
    }

    /// Like [`BraceMap::block`] but ignores tokens before `start_col` on the first line.
    pub fn block_from(&self, start_line: usize, start_col: usize) -> Option<Block> {
        let mut open: Option<(usize, usize)> = None;
        let mut depth = 0usize;

        for (line_idx, line_tokens) in self.tokens.iter().enumerate().skip(start_line) {
            for &(col, c) in line_tokens {
                if line_idx == start_line && col < start_col {
                    continue;
                }
                match (c, open) {
                    ('{', None) => {
                        open = Some((line_idx, col));
                        depth = 1;
                    }
                    ('{', Some(_)) => depth += 1,
                    ('}', None) | (';', None) => return None,
                    ('}', Some((open_line, open_col))) => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(Block {
                                open_line,
                                open_col,
                                close_line: line_idx,
                                close_col: Some(col),
                            });
                        }
                    }
                    _ => {}
                }
            }
        }

        open.map(|(open_line, open_col)| Block {
            open_line,
            open_col,
            close_line: self.tokens.len().saturating_sub(1),
            close_col: None,
        })
    }

    pub fn line_count(&self) -> usize {
        self.tokens.len()
    }
}

/// Text strictly between a block's braces.
pub fn block_body(masked: &MaskedSource, block: &Block) -> String {
    let mut body = String::new();
    for line_idx in block.open_line..=block.close_line {
        let chars: Vec<char> = masked.line(line_idx).chars().collect();
        let start = if line_idx == block.open_line {
            block.open_col + 1
        } else {
            0
        };
        let end = match block.close_col {
            Some(col) if line_idx == block.close_line => col,
            _ => chars.len(),
        };
        if start < end && start < chars.len() {
            body.extend(&chars[start..end.min(chars.len())]);
        }
        if line_idx != block.close_line {
            body.push('\n');
        }
    }
    body
}

/// A char position in a masked source: (line, char column).
pub type Pos = (usize, usize);

/// Finds the `)` matching the `(` at `open`.
pub fn matching_paren(masked: &MaskedSource, open: Pos) -> Option<Pos> {
    let mut depth = 0usize;
    for line_idx in open.0..masked.lines.len() {
        let skip = if line_idx == open.0 { open.1 } else { 0 };
        for (col, c) in masked.line(line_idx).chars().enumerate().skip(skip) {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some((line_idx, col));
                    }
                }
                _ => {}
            }
        }
    }
    None
}

/// Source text from `start` up to `end` (exclusive) with comments dropped
/// and whitespace collapsed. String literals are restored from `raw`.
pub fn unmask(masked: &MaskedSource, raw: &[&str], syntax: &Syntax, start: Pos, end: Pos) -> String {
    let mut text = String::new();
    let mut in_string = false;
    let last = end.0.min(masked.lines.len().saturating_sub(1));

    for line_idx in start.0..=last {
        if line_idx > start.0 {
            text.push(' ');
        }
        let raw_chars = raw
            .get(line_idx)
            .copied()
            .unwrap_or("")
            .chars()
            .chain(std::iter::repeat(' '));
        for (col, (m, r)) in masked.line(line_idx).chars().zip(raw_chars).enumerate() {
            if line_idx == start.0 && col < start.1 {
                continue;
            }
            if line_idx == end.0 && col >= end.1 {
                break;
            }
            if syntax.quotes.contains(&m) {
                in_string = !in_string;
                text.push(m);
            } else {
                text.push(if in_string { r } else { m });
            }
        }
    }
    normalize_whitespace(&text)
}

/// Masked text on `line` after char column `col`.
pub fn rest_of_line(masked: &MaskedSource, line: usize, col: usize) -> String {
    masked.line(line).chars().skip(col + 1).collect()
}

/// Char column of a byte offset within `line`.
pub fn char_col(line: &str, byte_offset: usize) -> usize {
    line.get(..byte_offset).map_or(0, |prefix| prefix.chars().count())
}

/// Last line of a statement whose parentheses or brackets span lines.
pub fn statement_end(masked: &MaskedSource, start: usize) -> usize {
    let mut balance = 0i32;
    for idx in start..masked.lines.len() {
        for c in masked.line(idx).chars() {
            match c {
                '(' | '[' => balance += 1,
                ')' | ']' => balance -= 1,
                _ => {}
            }
        }
        if balance <= 0 {
            return idx;
        }
    }
    masked.lines.len().saturating_sub(1)
}

// =====================================================
// Call detection
// =====================================================

static CALL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Za-z_]\w*)\s*\(").unwrap());
static MEMBER_CALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w\s*\.\s*([A-Za-z_]\w*)\s*\(").unwrap());

const DECLARATION_KEYWORDS: &[&str] = &["def", "function", "fn", "sub"];

fn preceded_by_declaration(body: &str, start: usize) -> bool {
    let before = body[..start].trim_end();
    DECLARATION_KEYWORDS.iter().any(|kw| {
        before.ends_with(kw)
            && before[..before.len() - kw.len()]
                .chars()
                .last()
                .map_or(true, |c| !c.is_alphanumeric() && c != '_')
    })
}

/// Names from `known` called in `body`, sorted and unique.
///
/// Direct calls (`name(`) skip `excluded`; member calls (`obj.name(`) only
/// need to be known.
pub fn find_calls(body: &str, known: &BTreeSet<String>, excluded: &[&str]) -> Vec<String> {
    let mut calls = BTreeSet::new();

    for cap in CALL_RE.captures_iter(body) {
        let Some(m) = cap.get(1) else { continue };
        let name = m.as_str();
        if known.contains(name)
            && !excluded.contains(&name)
            && !preceded_by_declaration(body, m.start())
        {
            calls.insert(name.to_string());
        }
    }

    for cap in MEMBER_CALL_RE.captures_iter(body) {
        let Some(m) = cap.get(1) else { continue };
        if known.contains(m.as_str()) {
            calls.insert(m.as_str().to_string());
        }
    }

    calls.into_iter().collect()
}

// =====================================================
// Small text helpers
// =====================================================

/// Chars of `line` from column `from` up to `to` (exclusive), or to the end.
pub fn segment(line: &str, from: usize, to: Option<usize>) -> String {
    let take = to.map_or(usize::MAX, |to| to.saturating_sub(from));
    line.chars().skip(from).take(take).collect()
}

/// Width of leading whitespace; a tab counts as one column.
pub fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Collapses runs of whitespace to one space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits on `sep` outside `()`, `[]`, `{}` and `<>`, trimming each part.
pub fn split_top_level(text: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();

    for c in text.chars() {
        match c {
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' | '>' => depth -= 1,
            _ => {}
        }
        if c == sep && depth <= 0 {
            parts.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(c);
        }
    }
    parts.push(current.trim().to_string());
    parts.retain(|p| !p.is_empty());
    parts
}

/// 1-based line number of a byte offset.
pub fn line_of_offset(content: &str, offset: usize) -> usize {
    content[..offset.min(content.len())].matches('\n').count() + 1
}

static JSDOC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/\*\*\s*\*?\s*([^@\n*][^@\n]*)").unwrap());

/// First text line of a `/** ... */` comment ending right above `line_idx`.
pub fn jsdoc_above(lines: &[&str], line_idx: usize) -> Option<String> {
    let mut idx = line_idx;
    let mut end = None;
    while idx > 0 {
        idx -= 1;
        let trimmed = lines[idx].trim();
        if end.is_none() {
            // decorators may sit between the comment and the declaration
            if trimmed.starts_with('@') {
                continue;
            }
            if trimmed.is_empty() {
                return None;
            }
        }
        if end.is_none() {
            if !trimmed.ends_with("*/") {
                return None;
            }
            end = Some(idx);
        }
        if trimmed.starts_with("/**") {
            let comment = lines[idx..=end.unwrap_or(idx)]
                .iter()
                .map(|l| l.trim())
                .collect::<Vec<_>>()
                .join("\n");
            return JSDOC_RE
                .captures(&comment)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().trim_end_matches("*/").trim().to_string())
                .filter(|s| !s.is_empty());
        }
        if !trimmed.starts_with('*') {
            return None;
        }
    }
    None
}
