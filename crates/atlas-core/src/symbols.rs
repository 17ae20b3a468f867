//! Name table for best-effort dependency resolution

use std::collections::HashMap;

use smallvec::SmallVec;

/// Candidates registered under one name, in insertion order.
pub type Candidates = SmallVec<[usize; 2]>;

/// Maps bare and qualified names to entity indices.
///
/// Several entities may share a name. Lookups pick the most recently
/// inserted candidate; the full list stays available via [`candidates`].
///
/// [`candidates`]: SymbolTable::candidates
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Candidates>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `index` under `name`. Empty names are ignored.
    pub fn insert(&mut self, name: &str, index: usize) {
        if name.is_empty() {
            return;
        }
        let slot = self.symbols.entry(name.to_string()).or_default();
        // The same entity under the same key twice would skew the tie-break.
        if slot.last() != Some(&index) {
            slot.retain(|i| *i != index);
            slot.push(index);
        }
    }

    /// Most recently inserted candidate for an exact name.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.symbols.get(name).and_then(|c| c.last().copied())
    }

    /// Every candidate for an exact name, oldest first.
    pub fn candidates(&self, name: &str) -> &[usize] {
        self.symbols.get(name).map(|c| c.as_slice()).unwrap_or(&[])
    }

    /// Exact lookup, then one retry on the last segment when `name` is
    /// qualified by any of `separators`.
    pub fn resolve(&self, name: &str, separators: &[&str]) -> Option<usize> {
        if let Some(hit) = self.lookup(name) {
            return Some(hit);
        }
        let (_, last) = split_qualified(name, separators)?;
        self.lookup(last)
    }

    /// Like [`resolve`](Self::resolve), but takes the most recent candidate
    /// accepted by `accept` instead of the most recent overall.
    pub fn resolve_where(
        &self,
        name: &str,
        separators: &[&str],
        accept: impl Fn(usize) -> bool,
    ) -> Option<usize> {
        let newest = |key: &str| self.candidates(key).iter().rev().copied().find(|&i| accept(i));
        if let Some(hit) = newest(name) {
            return Some(hit);
        }
        let (_, last) = split_qualified(name, separators)?;
        newest(last)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Split `name` at the right-most occurrence of any separator into
/// `(qualifier, last_segment)`. `None` when unqualified.
pub fn split_qualified<'a>(name: &'a str, separators: &[&str]) -> Option<(&'a str, &'a str)> {
    let (pos, sep) = separators
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|sep| name.rfind(sep).map(|pos| (pos, *sep)))
        .max_by_key(|(pos, sep)| pos + sep.len())?;
    let qualifier = &name[..pos];
    let last = &name[pos + sep.len()..];
    if qualifier.is_empty() || last.is_empty() {
        return None;
    }
    Some((qualifier, last))
}
