use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::common::{
    self, block_body, char_col, find_calls, mask, matching_paren, normalize_whitespace,
    rest_of_line, segment, split_top_level, unmask, Block, BraceMap, MaskedSource, Pos,
};
use super::LanguageExtractor;
use crate::index::{ClassInfo, ClassKind, EnumInfo, FunctionInfo, InterfaceInfo, SymbolTable, ValueKind};

static USING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:global\s+)?using\s+(?:static\s+)?(?:\w+\s*=\s*)?([\w.]+)\s*;").unwrap()
});
static NAMESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*namespace\s+([\w.]+)").unwrap());
static ATTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\[\s*(\w[\w.]*)").unwrap());
static TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*((?:(?:public|private|protected|internal|static|abstract|sealed|partial|readonly|unsafe|new|file|ref)\s+)*)(class|struct|record|interface|enum)(?:\s+(?:class|struct))?\s+(\w+)(?:\s*<[^>]*>)?(?:\s*\([^)]*\))?(?:\s*:\s*([^{;]+))?")
        .unwrap()
});
static METHOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*((?:(?:public|private|protected|internal|static|virtual|override|abstract|async|sealed|partial|extern|new|unsafe|readonly)\s+)*)([\w.]+(?:<[^()]*?>)?(?:\[\])?\??)\s+(\w+)\s*(?:<[^>]*>)?\s*\(")
        .unwrap()
});
static CONSTRUCTOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*((?:(?:public|private|protected|internal|static)\s+)*)(\w+)\s*\(").unwrap()
});
static PROPERTY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:(?:public|private|protected|internal|static|virtual|override|abstract|readonly|required|new|sealed)\s+)*[\w.<>,\[\]?]+\s+(\w+)\s*\{\s*(?:get|set|init|private|protected|internal)")
        .unwrap()
});
static CONSTANT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:(?:public|private|protected|internal|static|new)\s+)*const\s+[\w.<>?]+\s+(\w+)\s*=\s*(.+?);").unwrap()
});
static INTERFACE_MEMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[\w.<>,\[\]?]+\s+)+(\w+)\s*(?:<[^>]*>)?\s*\(").unwrap()
});
static ENUM_MEMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\[[^\]]*\]\s*)?([A-Za-z_]\w*)").unwrap());
static DECLARATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([\w.]+(?:<[^()]*?>)?(?:\[\])?\??)\s+(\w+)\s*\([^()]*\)\s*(?:\{|=>)").unwrap()
});
static KNOWN_METHOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:public|private|protected|internal|static|virtual|override|abstract|async)\s+(?:[\w<>\[\],.?]+\s+)+(\w+)\s*(?:<[^>]+>)?\s*\(")
        .unwrap()
});

const EXCLUDED_CALLS: &[&str] = &[
    "if", "while", "for", "foreach", "switch", "catch", "return", "throw", "new", "typeof",
    "nameof", "sizeof", "using", "lock", "Console", "Debug", "String", "Int32", "Convert",
    "Math", "DateTime", "Task", "List", "Dictionary", "Array", "Enum",
];

/// Keywords that METHOD_RE would otherwise read as a return type. Modifiers
/// are listed because a constructor line matches with its last modifier as
/// the "type".
const NOT_RETURN_TYPES: &[&str] = &[
    "return", "new", "await", "throw", "else", "yield", "case", "using", "var", "goto", "in",
    "is", "as", "when", "public", "private", "protected", "internal", "static", "virtual",
    "override", "abstract", "async", "sealed", "partial", "extern", "unsafe", "readonly",
];

pub struct CSharpExtractor;

struct Scan<'a> {
    raw: &'a [&'a str],
    masked: &'a MaskedSource,
    braces: BraceMap,
    known: BTreeSet<String>,
}

impl LanguageExtractor for CSharpExtractor {
    fn name(&self) -> &'static str {
        "csharp"
    }

    fn languages(&self) -> &[&'static str] {
        &["csharp"]
    }

    fn extract(&self, content: &str) -> SymbolTable {
        let raw: Vec<&str> = content.lines().collect();
        let masked = mask(content, &common::C_LIKE);
        let scan = Scan {
            raw: &raw,
            braces: BraceMap::new(&masked),
            known: known_names(&masked),
            masked: &masked,
        };
        let mut table = SymbolTable::new();

        // Namespace blocks are walked through, so types inside block-scoped
        // and file-scoped namespaces are both found.
        let mut attributes: Vec<String> = Vec::new();
        let mut i = 0;
        while i < masked.lines.len() {
            let line = masked.line(i);
            if line.trim().is_empty() || masked.is_continued(i) {
                i += 1;
                continue;
            }

            if let Some(caps) = USING_RE.captures(line) {
                table.add_import(&caps[1]);
            } else if let Some(caps) = NAMESPACE_RE.captures(line) {
                if table.namespace.is_none() {
                    table.namespace = Some(caps[1].to_string());
                }
            } else if let Some(caps) = ATTRIBUTE_RE.captures(line) {
                attributes.push(caps[1].to_string());
            } else if let Some(caps) = TYPE_RE.captures(line) {
                i = scan.type_declaration(&mut table, i, &caps, std::mem::take(&mut attributes));
                continue;
            } else {
                attributes.clear();
            }
            i += 1;
        }

        table
    }
}

impl Scan<'_> {
    fn type_declaration(
        &self,
        table: &mut SymbolTable,
        i: usize,
        caps: &regex::Captures,
        attributes: Vec<String>,
    ) -> usize {
        let name = caps[3].to_string();
        let bases = caps
            .get(4)
            .map(|b| {
                let list = b.as_str();
                let list = list.split(" where ").next().unwrap_or(list);
                split_top_level(list, ',')
            })
            .unwrap_or_default();
        let doc = xml_summary(self.raw, i);
        let block = self.braces.block(i);
        let next = block.map_or(i + 1, |b| b.close_line + 1);

        match &caps[2] {
            "interface" => {
                let mut interface = InterfaceInfo {
                    line: i + 1,
                    extends: bases,
                    methods: Vec::new(),
                    doc,
                };
                if let Some(block) = block {
                    for j in self.member_lines(block.open_line, block.close_line) {
                        if let Some(m) = INTERFACE_MEMBER_RE.captures(self.masked.line(j)) {
                            if !interface.methods.iter().any(|n| n == &m[1]) {
                                interface.methods.push(m[1].to_string());
                            }
                        }
                    }
                }
                table.interfaces.insert(name, interface);
            }
            "enum" => {
                let values = block
                    .map(|b| {
                        split_top_level(&block_body(self.masked, &b), ',')
                            .iter()
                            .filter_map(|item| ENUM_MEMBER_RE.captures(item).map(|c| c[1].to_string()))
                            .collect()
                    })
                    .unwrap_or_default();
                table.enums.insert(
                    name,
                    EnumInfo {
                        values,
                        line: Some(i + 1),
                        doc,
                    },
                );
            }
            _ => {
                let mut class = ClassInfo::new(i + 1);
                if bases.iter().any(|b| b.ends_with("Exception")) {
                    class.kind = ClassKind::Exception;
                }
                class.inherits = bases;
                class.is_abstract = caps[1].split_whitespace().any(|m| m == "abstract");
                class.decorators = attributes;
                class.doc = doc;
                if let Some(block) = block {
                    self.class_members(&mut class, &name, block);
                }
                table.classes.insert(name, class);
            }
        }

        next
    }

    /// Non-blank lines directly inside the block opened on `open_line`.
    fn member_lines(&self, open_line: usize, close_line: usize) -> impl Iterator<Item = usize> + '_ {
        let member_depth = self.braces.depth_at(open_line) + 1;
        (open_line + 1..=close_line).filter(move |&j| {
            self.braces.depth_at(j) == member_depth
                && !self.masked.is_continued(j)
                && !self.masked.line(j).trim().is_empty()
        })
    }

    /// Scans the members of a class body with a (line, column) cursor, so
    /// members sharing a line with the braces or with each other are found.
    fn class_members(&self, class: &mut ClassInfo, class_name: &str, block: Block) {
        let member_depth = self.braces.depth_before(block.open_line, block.open_col) + 1;
        let mut attributes: Vec<String> = Vec::new();
        let mut pos: Pos = (block.open_line, block.open_col + 1);

        while pos.0 <= block.close_line {
            let (j, col) = pos;
            if col == 0
                && (self.masked.is_continued(j) || self.braces.depth_at(j) != member_depth)
            {
                pos = (j + 1, 0);
                continue;
            }
            let end_col = if j == block.close_line { block.close_col } else { None };
            let text = segment(self.masked.line(j), col, end_col);
            if text.trim().is_empty() {
                pos = (j + 1, 0);
                continue;
            }
            pos = self.class_member(class, class_name, (j, col), &text, &mut attributes);
        }
    }

    /// Handles the member starting at `start`; returns where the next one may begin.
    fn class_member(
        &self,
        class: &mut ClassInfo,
        class_name: &str,
        start: Pos,
        text: &str,
        attributes: &mut Vec<String>,
    ) -> Pos {
        let (j, col) = start;
        let next_line = (j + 1, 0);
        let at = |byte: usize| col + char_col(text, byte);

        if let Some(caps) = ATTRIBUTE_RE.captures(text) {
            attributes.push(caps[1].to_string());
            return text.find(']').map_or(next_line, |b| (j, at(b) + 1));
        }
        let decorators = std::mem::take(attributes);

        // Nested types are not indexed
        if TYPE_RE.is_match(text) {
            return self.braces.block_from(j, col).map_or(next_line, |b| b.end());
        }

        if let Some(caps) = CONSTANT_RE.captures(text) {
            class
                .constants
                .insert(caps[1].to_string(), ValueKind::infer(&caps[2]));
            return caps.get(0).map_or(next_line, |m| (j, at(m.end())));
        }

        if let Some(caps) = PROPERTY_RE.captures(text) {
            let name = caps[1].to_string();
            if !class.properties.contains(&name) {
                class.properties.push(name);
            }
            return self.braces.block_from(j, col).map_or(next_line, |b| b.end());
        }

        let method = METHOD_RE
            .captures(text)
            .filter(|c| !NOT_RETURN_TYPES.contains(&&c[2]))
            .map(|c| (c[1].to_string(), Some(c[2].to_string()), c[3].to_string(), c.get(0).map_or(0, |m| m.end())))
            .or_else(|| {
                CONSTRUCTOR_RE
                    .captures(text)
                    .filter(|c| &c[2] == class_name)
                    .map(|c| (c[1].to_string(), None, c[2].to_string(), c.get(0).map_or(0, |m| m.end())))
            });
        let Some((modifiers, return_type, name, match_end)) = method else {
            // Fields and events: resume after the statement
            return text.find(';').map_or(next_line, |b| (j, at(b) + 1));
        };

        let open = (j, at(match_end - 1));
        let Some(close) = matching_paren(self.masked, open) else {
            return next_line;
        };
        let params = unmask(self.masked, self.raw, &common::C_LIKE, (open.0, open.1 + 1), close);

        let mut signature = format!("({})", params);
        if let Some(ret) = return_type.as_deref().filter(|r| *r != "void") {
            signature.push_str(": ");
            signature.push_str(ret);
        }
        if modifiers.split_whitespace().any(|m| m == "async") {
            signature = format!("async {}", signature);
        }
        if modifiers.split_whitespace().any(|m| m == "abstract") {
            class.is_abstract = true;
        }

        let (calls, next) = self.body(close);

        let method_name = if return_type.is_none() { "__init__".to_string() } else { name };
        let mut info = FunctionInfo::new(signature, j + 1);
        info.doc = xml_summary(self.raw, j);
        info.decorators = decorators;
        info.calls = calls;
        class.methods.insert(method_name, info);
        next
    }

    /// Calls in a block or expression body after the parameter list, and
    /// the position just past the body.
    fn body(&self, close: Pos) -> (Vec<String>, Pos) {
        let after = rest_of_line(self.masked, close.0, close.1);
        if after.trim_start().starts_with("=>") {
            let mut body = String::new();
            let (mut line, mut from) = (close.0, close.1 + 1);
            loop {
                let chars: Vec<char> = self.masked.line(line).chars().collect();
                let from_col = from.min(chars.len());
                if let Some(p) = chars[from_col..].iter().position(|c| *c == ';') {
                    body.extend(&chars[from_col..from_col + p]);
                    return (
                        find_calls(&body, &self.known, EXCLUDED_CALLS),
                        (line, from_col + p + 1),
                    );
                }
                body.extend(&chars[from_col..]);
                body.push('\n');
                if line + 1 >= self.masked.lines.len() {
                    return (find_calls(&body, &self.known, EXCLUDED_CALLS), (line + 1, 0));
                }
                line += 1;
                from = 0;
            }
        }

        match self.braces.block_from(close.0, close.1 + 1) {
            Some(block) => (
                find_calls(&block_body(self.masked, &block), &self.known, EXCLUDED_CALLS),
                block.end(),
            ),
            // No body: abstract, extern or interface-style declaration
            None => {
                let end = after
                    .find(';')
                    .map_or((close.0 + 1, 0), |b| (close.0, close.1 + 1 + char_col(&after, b) + 1));
                (Vec::new(), end)
            }
        }
    }
}

/// Text of the `<summary>` in the `///` comment above `line_idx`.
fn xml_summary(raw: &[&str], line_idx: usize) -> Option<String> {
    let mut doc_lines = Vec::new();
    let mut idx = line_idx;
    while idx > 0 {
        idx -= 1;
        let trimmed = raw[idx].trim();
        if let Some(text) = trimmed.strip_prefix("///") {
            doc_lines.push(text.trim());
        } else if trimmed.starts_with('[') && doc_lines.is_empty() {
            continue;
        } else {
            break;
        }
    }
    doc_lines.reverse();

    let text = doc_lines.join(" ");
    let start = text.find("<summary>")? + "<summary>".len();
    let end = text[start..].find("</summary>").map_or(text.len(), |e| start + e);
    let summary = normalize_whitespace(&text[start..end]);
    (!summary.is_empty()).then_some(summary)
}

fn known_names(masked: &MaskedSource) -> BTreeSet<String> {
    let mut known = BTreeSet::new();
    for line in &masked.lines {
        for caps in KNOWN_METHOD_RE.captures_iter(line) {
            known.insert(caps[1].to_string());
        }
        if let Some(caps) = METHOD_RE.captures(line) {
            if !NOT_RETURN_TYPES.contains(&&caps[2]) {
                known.insert(caps[3].to_string());
            }
        }
        for caps in DECLARATION_RE.captures_iter(line) {
            if !NOT_RETURN_TYPES.contains(&&caps[1]) {
                known.insert(caps[2].to_string());
            }
        }
    }
    known
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(src: &str) -> SymbolTable {
        CSharpExtractor.extract(src)
    }

    const SERVICE: &str = r#"using System;
using System.Collections.Generic;
using static System.Math;
using Json = Newtonsoft.Json;

namespace Shop.Orders
{
    /// <summary>
    /// Places and tracks orders.
    /// </summary>
    [Serializable]
    public class OrderService : ServiceBase, IOrderService
    {
        public const int MaxItems = 50;
        private const string Prefix = "ord";

        public string Name { get; set; }
        public int Count { get; private set; }

        public OrderService(IRepo repo)
        {
            Init();
        }

        /// <summary>Adds an order.</summary>
        [HttpPost("orders")]
        public async Task<Order> AddAsync(Order order, int qty = 1)
        {
            Validate(order);
            return await repo.Save(order);
        }

        private void Init() { }

        private bool Validate(Order order) => Check(order);

        private static bool Check(Order o) { return true; }
    }
}
"#;

    #[test]
    fn test_usings_and_namespace() {
        let table = extract(SERVICE);
        assert_eq!(
            table.imports,
            vec!["System", "System.Collections.Generic", "System.Math", "Newtonsoft.Json"]
        );
        assert_eq!(table.namespace.as_deref(), Some("Shop.Orders"));
    }

    #[test]
    fn test_class_structure() {
        let table = extract(SERVICE);
        let class = &table.classes["OrderService"];
        assert_eq!(class.line, 12);
        assert_eq!(class.inherits, vec!["ServiceBase", "IOrderService"]);
        assert_eq!(class.doc.as_deref(), Some("Places and tracks orders."));
        assert_eq!(class.decorators, vec!["Serializable"]);
        assert_eq!(class.constants["MaxItems"], ValueKind::Number);
        assert_eq!(class.constants["Prefix"], ValueKind::Str);
        assert_eq!(class.properties, vec!["Name", "Count"]);
    }

    #[test]
    fn test_methods_and_calls() {
        let table = extract(SERVICE);
        let methods = &table.classes["OrderService"].methods;

        assert_eq!(methods["__init__"].signature, "(IRepo repo)");
        assert_eq!(methods["__init__"].calls, vec!["Init"]);

        let add = &methods["AddAsync"];
        assert_eq!(add.signature, "async (Order order, int qty = 1): Task<Order>");
        assert_eq!(add.doc.as_deref(), Some("Adds an order."));
        assert_eq!(add.decorators, vec!["HttpPost"]);
        assert_eq!(add.calls, vec!["Validate"]);

        assert_eq!(methods["Init"].signature, "()");
        assert_eq!(methods["Validate"].signature, "(Order order): bool");
        assert_eq!(methods["Validate"].calls, vec!["Check"]);
        assert!(methods.contains_key("Check"));
    }

    #[test]
    fn test_file_scoped_namespace_interface_enum() {
        let src = r#"namespace App.Core;

public interface IRepo<T> : IDisposable where T : class
{
    T Find(int id);
    void Save(T item);
    int Count { get; }
}

public enum Status
{
    Active = 1,
    [Obsolete] Retired,
    Pending
}

public abstract class Handler
{
    public abstract void Handle();
}

public class NotFoundException : Exception { }

public record Point(int X, int Y);
"#;
        let table = extract(src);
        assert_eq!(table.namespace.as_deref(), Some("App.Core"));

        let repo = &table.interfaces["IRepo"];
        assert_eq!(repo.extends, vec!["IDisposable"]);
        assert_eq!(repo.methods, vec!["Find", "Save"]);

        assert_eq!(table.enums["Status"].values, vec!["Active", "Retired", "Pending"]);
        assert_eq!(table.enums["Status"].line, Some(10));

        assert!(table.classes["Handler"].is_abstract);
        assert!(table.classes["Handler"].methods.contains_key("Handle"));
        assert_eq!(table.classes["NotFoundException"].kind, ClassKind::Exception);
        assert!(table.classes.contains_key("Point"));
    }

    #[test]
    fn test_nested_types_skipped() {
        let src = "class Outer\n{\n    class Inner\n    {\n        void Hidden() { }\n    }\n    void Visible() { }\n}\n";
        let table = extract(src);
        let outer = &table.classes["Outer"];
        assert!(outer.methods.contains_key("Visible"));
        assert!(!outer.methods.contains_key("Hidden"));
        assert!(!table.classes.contains_key("Inner"));
    }

    #[test]
    fn test_single_line_class_members() {
        let table = extract("class A { public A() { B(); } void B() {} }\n");
        let class = &table.classes["A"];
        assert_eq!(class.line, 1);
        assert_eq!(class.methods.keys().collect::<Vec<_>>(), vec!["B", "__init__"]);
        assert_eq!(class.methods["__init__"].calls, vec!["B"]);
        assert_eq!(class.methods["B"].line, 1);
    }

    #[test]
    fn test_members_after_field_on_same_line() {
        let src = "class C\n{\n    private int n = 0; public int Get() => n;\n    [Fact] public void Run() { Get(); }\n}\n";
        let methods = &extract(src).classes["C"].methods;
        assert_eq!(methods["Get"].signature, "(): int");
        assert_eq!(methods["Run"].decorators, vec!["Fact"]);
        assert_eq!(methods["Run"].calls, vec!["Get"]);
    }

    #[test]
    fn test_excluded_calls() {
        let src = "class A\n{\n    void Run()\n    {\n        Console.WriteLine(\"Run()\");\n    }\n}\n";
        assert!(extract(src).classes["A"].methods["Run"].calls.is_empty());
    }
}
