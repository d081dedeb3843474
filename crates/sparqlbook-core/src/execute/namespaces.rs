//! Namespace rewriting for SELECT results.
//!
//! `PREFIX` declarations are harvested from the query text and used to
//! shorten `uri` binding values for display. The rewrite is cosmetic: a
//! value that no namespace matches is left untouched.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static PREFIX_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)prefix ([^:]*):[ ]*<([^>]*)>").expect("prefix declaration regex")
});

/// Prefix name to namespace URI mapping, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespaces {
    entries: Vec<(String, String)>,
}

impl Namespaces {
    /// Collect every `PREFIX name: <uri>` declaration of a query.
    ///
    /// A name declared twice keeps its first position and its last URI.
    pub fn from_query(query: &str) -> Self {
        let mut namespaces = Self::default();
        for caps in PREFIX_DECLARATION.captures_iter(query) {
            namespaces.insert(&caps[1], &caps[2]);
        }
        namespaces
    }

    /// Add or update a namespace.
    pub fn insert(&mut self, name: &str, uri: &str) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = uri.to_string(),
            None => self.entries.push((name.to_string(), uri.to_string())),
        }
    }

    /// URI bound to a prefix name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, uri)| uri.as_str())
    }

    /// Number of declared namespaces.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no namespace was declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shorten a URI with the first namespace that changes it.
    ///
    /// The first occurrence of the namespace URI inside the value is replaced
    /// by `name:`. Namespaces with an empty URI never match.
    pub fn compact(&self, uri: &str) -> Option<String> {
        self.entries
            .iter()
            .filter(|(_, ns)| !ns.is_empty())
            .find(|(_, ns)| uri.contains(ns.as_str()))
            .map(|(name, ns)| uri.replacen(ns.as_str(), &format!("{name}:"), 1))
    }
}

/// Rewrite every `uri` binding of a SPARQL JSON result in place.
///
/// Returns the number of rewritten values. Results without a
/// `results.bindings` array are left as they are.
pub fn rewrite_bindings(results: &mut Value, namespaces: &Namespaces) -> usize {
    if namespaces.is_empty() {
        return 0;
    }

    let Some(bindings) = results
        .pointer_mut("/results/bindings")
        .and_then(Value::as_array_mut)
    else {
        return 0;
    };

    let mut rewritten = 0;
    for solution in bindings.iter_mut().filter_map(Value::as_object_mut) {
        for term in solution.values_mut().filter_map(Value::as_object_mut) {
            if term.get("type").and_then(Value::as_str) != Some("uri") {
                continue;
            }
            let Some(value) = term.get("value").and_then(Value::as_str) else {
                continue;
            };
            if let Some(compacted) = namespaces.compact(value) {
                term.insert("value".to_string(), Value::String(compacted));
                rewritten += 1;
            }
        }
    }
    rewritten
}
