//! Project-wide call graph.
//!
//! `forward` maps a qualified caller (`name` or `Class.method`) to the names
//! it calls; `reverse` is its exact inverse. Both are rebuilt from scratch
//! from the per-file symbol tables on every run.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::models::SymbolTable;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraph {
    pub forward: BTreeMap<String, Vec<String>>,
    pub reverse: BTreeMap<String, Vec<String>>,
}

/// Every function and method name declared anywhere in the project.
pub fn call_target_universe<'a, I>(tables: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a SymbolTable>,
{
    let mut universe = BTreeSet::new();
    for table in tables {
        universe.extend(table.functions.keys().cloned());
        for class in table.classes.values() {
            universe.extend(class.methods.keys().cloned());
        }
    }
    universe
}

impl CallGraph {
    /// Builds the graph from all symbol tables of a run.
    ///
    /// Callees outside the project's call-target universe are dropped. A
    /// qualified name defined in several files gets the union of their calls.
    pub fn build<'a, I>(tables: I) -> Self
    where
        I: IntoIterator<Item = &'a SymbolTable> + Clone,
    {
        let universe = call_target_universe(tables.clone());
        let mut edges = Vec::new();

        for table in tables {
            for (name, func) in &table.functions {
                for callee in &func.calls {
                    edges.push((name.clone(), callee.clone()));
                }
            }
            for (class_name, class) in &table.classes {
                for (method_name, method) in &class.methods {
                    let qualified = format!("{}.{}", class_name, method_name);
                    for callee in &method.calls {
                        edges.push((qualified.clone(), callee.clone()));
                    }
                }
            }
        }

        Self::from_edges(
            edges
                .into_iter()
                .filter(|(_, callee)| universe.contains(callee)),
        )
    }

    /// Builds forward and reverse maps from raw (caller, callee) pairs.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut forward: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut reverse: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for (caller, callee) in edges {
            reverse
                .entry(callee.clone())
                .or_default()
                .insert(caller.clone());
            forward.entry(caller).or_default().insert(callee);
        }

        Self {
            forward: flatten(forward),
            reverse: flatten(reverse),
        }
    }

    pub fn callees(&self, caller: &str) -> &[String] {
        self.forward.get(caller).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn callers(&self, callee: &str) -> &[String] {
        self.reverse.get(callee).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All (caller, callee) edges in sorted order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.forward.iter().flat_map(|(caller, callees)| {
            callees
                .iter()
                .map(move |callee| (caller.as_str(), callee.as_str()))
        })
    }

    pub fn edge_count(&self) -> usize {
        self.forward.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

fn flatten(map: BTreeMap<String, BTreeSet<String>>) -> BTreeMap<String, Vec<String>> {
    map.into_iter()
        .map(|(k, v)| (k, v.into_iter().collect()))
        .collect()
}
