//! File and directory purpose labels.
//!
//! Both are naming heuristics: a file's stem, a directory's own name, and
//! failing that the names of the files directly inside the directory.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Conventional directory names, checked exactly and then as substrings in
/// this order.
const DIRECTORY_PURPOSES: &[(&str, &str)] = &[
    ("auth", "Authentication and authorization logic"),
    ("models", "Data models and database schemas"),
    ("views", "UI views and templates"),
    ("controllers", "Request handlers and business logic"),
    ("services", "Business logic and external service integrations"),
    ("utils", "Shared utility functions and helpers"),
    ("helpers", "Helper functions and utilities"),
    ("tests", "Test files and test utilities"),
    ("test", "Test files and test utilities"),
    ("spec", "Test specifications"),
    ("docs", "Project documentation"),
    ("api", "API endpoints and route handlers"),
    ("components", "Reusable UI components"),
    ("lib", "Library code and shared modules"),
    ("src", "Source code root directory"),
    ("static", "Static assets (images, CSS, etc.)"),
    ("public", "Publicly accessible files"),
    ("config", "Configuration files and settings"),
    ("scripts", "Build and utility scripts"),
    ("middleware", "Middleware functions and handlers"),
    ("migrations", "Database migration files"),
    ("fixtures", "Test fixtures and sample data"),
];

/// Filename fragments checked when the directory name says nothing.
const CONTENT_PURPOSES: &[(&[&str], &str)] = &[
    (&["test", "spec"], "Test files and test utilities"),
    (&["model"], "Data models and schemas"),
    (&["route", "endpoint"], "API routes and endpoints"),
    (&["component"], "UI components"),
];

/// File stem fragments; the first match wins.
const FILE_PURPOSES: &[(&[&str], &str)] = &[
    (&["test", "spec"], "Test file"),
    (&["config", "settings"], "Configuration"),
    (&["route"], "Route definitions"),
    (&["model"], "Data model"),
    (&["util", "helper"], "Utility functions"),
    (&["middleware"], "Middleware"),
];

const ENTRY_POINT_STEMS: &[&str] = &["index", "main", "app"];

pub fn infer_file_purpose(path: &Path) -> Option<&'static str> {
    let stem = path.file_stem()?.to_str()?.to_lowercase();

    if ENTRY_POINT_STEMS.contains(&stem.as_str()) {
        return Some("Application entry point");
    }
    FILE_PURPOSES
        .iter()
        .find(|(fragments, _)| fragments.iter().any(|f| stem.contains(f)))
        .map(|(_, label)| *label)
}

/// Label for the directory at `path` given the names of the files directly
/// inside it.
pub fn infer_directory_purpose(path: &Path, immediate_files: &[&str]) -> Option<&'static str> {
    let name = path.file_name()?.to_str()?.to_lowercase();

    if let Some((_, label)) = DIRECTORY_PURPOSES.iter().find(|(dir, _)| *dir == name) {
        return Some(label);
    }
    if let Some((_, label)) = DIRECTORY_PURPOSES.iter().find(|(dir, _)| name.contains(dir)) {
        return Some(label);
    }

    if immediate_files.is_empty() {
        return None;
    }
    let lowered: Vec<String> = immediate_files.iter().map(|f| f.to_lowercase()).collect();
    CONTENT_PURPOSES
        .iter()
        .find(|(fragments, _)| {
            let matching = lowered
                .iter()
                .filter(|f| fragments.iter().any(|frag| f.contains(frag)))
                .count();
            matching * 2 > lowered.len()
        })
        .map(|(_, label)| *label)
}

/// Purposes for every directory holding one of `paths` or an ancestor of
/// one, keyed by `/`-separated path relative to the root. The root itself
/// is never labelled.
pub fn directory_purposes<'a, I>(paths: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut immediate: BTreeMap<String, Vec<&'a str>> = BTreeMap::new();
    let mut directories = BTreeSet::new();

    for path in paths {
        let (parent, file_name) = match path.rsplit_once('/') {
            Some((parent, name)) => (parent, name),
            None => continue,
        };
        immediate.entry(parent.to_string()).or_default().push(file_name);

        let mut dir = parent;
        loop {
            directories.insert(dir.to_string());
            match dir.rsplit_once('/') {
                Some((up, _)) => dir = up,
                None => break,
            }
        }
    }

    directories
        .into_iter()
        .filter_map(|dir| {
            let files = immediate.get(&dir).map(Vec::as_slice).unwrap_or(&[]);
            infer_directory_purpose(Path::new(&dir), files).map(|label| (dir, label.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_purpose() {
        assert_eq!(infer_file_purpose(Path::new("src/main.py")), Some("Application entry point"));
        assert_eq!(infer_file_purpose(Path::new("web/Index.tsx")), Some("Application entry point"));
        assert_eq!(infer_file_purpose(Path::new("tests/test_api.py")), Some("Test file"));
        assert_eq!(infer_file_purpose(Path::new("app.spec.ts")), Some("Test file"));
        assert_eq!(infer_file_purpose(Path::new("settings.py")), Some("Configuration"));
        assert_eq!(infer_file_purpose(Path::new("routes.js")), Some("Route definitions"));
        assert_eq!(infer_file_purpose(Path::new("user_model.rb")), Some("Data model"));
        assert_eq!(infer_file_purpose(Path::new("string_utils.c")), Some("Utility functions"));
        assert_eq!(infer_file_purpose(Path::new("middleware.go")), Some("Middleware"));
        assert_eq!(infer_file_purpose(Path::new("mainframe.py")), None);
        assert_eq!(infer_file_purpose(Path::new("engine.rs")), None);
    }

    #[test]
    fn test_test_beats_config() {
        assert_eq!(infer_file_purpose(Path::new("test_config.py")), Some("Test file"));
    }

    #[test]
    fn test_directory_by_name() {
        assert_eq!(
            infer_directory_purpose(Path::new("app/models"), &[]),
            Some("Data models and database schemas")
        );
        assert_eq!(
            infer_directory_purpose(Path::new("Tests"), &[]),
            Some("Test files and test utilities")
        );
        // substring match in table order
        assert_eq!(
            infer_directory_purpose(Path::new("oauth_provider"), &[]),
            Some("Authentication and authorization logic")
        );
    }

    #[test]
    fn test_directory_by_contents() {
        assert_eq!(
            infer_directory_purpose(Path::new("checks"), &["test_a.py", "test_b.py", "conftest.py"]),
            Some("Test files and test utilities")
        );
        assert_eq!(
            infer_directory_purpose(Path::new("domain"), &["user_model.py", "order_model.py", "base.py"]),
            Some("Data models and schemas")
        );
        assert_eq!(
            infer_directory_purpose(Path::new("web"), &["user_routes.js", "endpoints.js"]),
            Some("API routes and endpoints")
        );
        assert_eq!(
            infer_directory_purpose(Path::new("ui"), &["ButtonComponent.tsx"]),
            Some("UI components")
        );
    }

    #[test]
    fn test_directory_minority_does_not_count() {
        assert_eq!(
            infer_directory_purpose(Path::new("core"), &["engine.py", "loader.py", "test_engine.py"]),
            None
        );
        assert_eq!(infer_directory_purpose(Path::new("core"), &["a.py", "test_a.py"]), None);
        assert_eq!(infer_directory_purpose(Path::new("core"), &[]), None);
    }

    #[test]
    fn test_directory_purposes_cover_ancestors() {
        let paths = [
            "README.md",
            "backend/services/billing/invoice.py",
            "backend/services/billing/test_invoice.py",
            "backend/services/billing/test_tax.py",
            "frontend/index.js",
        ];
        let purposes = directory_purposes(paths);

        assert_eq!(
            purposes.get("backend/services").map(String::as_str),
            Some("Business logic and external service integrations")
        );
        assert_eq!(
            purposes.get("backend/services/billing").map(String::as_str),
            Some("Test files and test utilities")
        );
        assert!(!purposes.contains_key("backend"));
        assert!(!purposes.contains_key("frontend"));
        assert!(!purposes.contains_key(""));
    }
}
