//! Sparse overlays applied to a document held in memory.
//!
//! A partial update is described by two trees shaped like the document
//! itself: a [`ReplaceTree`] of values to assign and a [`DeleteTree`] of
//! entries to remove. Arrays are atomic fields; they are either replaced as a
//! whole or edited by explicit index.
//!
//! Both functions mutate the map they are given. The update loop hands them a
//! freshly read copy of the document on every attempt.

use smol_str::SmolStr;
use std::collections::BTreeMap;

use crate::types::value::{Map, Value};

#[cfg(test)]
mod tests;

/// The most scalar values a single document may hold.
pub const MAX_LEAF_VALUES: usize = 19_990;

/// Values to assign, keyed like the document.
pub type ReplaceTree = BTreeMap<SmolStr, Replace>;

/// Entries to remove, keyed like the document.
pub type DeleteTree = BTreeMap<SmolStr, Delete>;

/// One entry of a [`ReplaceTree`].
#[derive(Debug, Clone, PartialEq)]
pub enum Replace {
    /// Overwrite the field. Arrays given this way replace the whole sequence.
    Set(Value),
    /// Assign into a nested map, key by key.
    Merge(ReplaceTree),
    /// Positional edits of an array: `(index, value)` replaces the element at
    /// `index`, or appends when `index` equals the current length. Other
    /// indices are ignored.
    Splice(Vec<(usize, Value)>),
}

/// One entry of a [`DeleteTree`].
#[derive(Debug, Clone, PartialEq)]
pub enum Delete {
    /// Remove the entry.
    Remove,
    /// Remove entries of a nested map. Empty means [`Delete::Remove`].
    Fields(DeleteTree),
    /// Remove or descend into array elements by index. Empty means
    /// [`Delete::Remove`].
    Elements(Vec<(usize, Delete)>),
}

impl From<Value> for Replace {
    /// Maps become [`Replace::Merge`] (recursively), everything else
    /// [`Replace::Set`].
    fn from(value: Value) -> Self {
        match value {
            Value::Map(map) => Replace::Merge(
                map.into_iter()
                    .map(|(key, value)| (key, Replace::from(value)))
                    .collect(),
            ),
            other => Replace::Set(other),
        }
    }
}

impl Replace {
    /// Build a replace tree from a plain map, merging nested maps.
    pub fn tree(map: Map) -> ReplaceTree {
        map.into_iter()
            .map(|(key, value)| (key, Replace::from(value)))
            .collect()
    }

    /// The value this overlay produces when there is nothing to merge into.
    fn materialize(&self) -> Value {
        match self {
            Replace::Set(value) => value.clone(),
            Replace::Merge(tree) => {
                let mut map = Map::new();
                apply_replace(&mut map, tree);
                Value::Map(map)
            }
            Replace::Splice(edits) => {
                let mut items = Vec::new();
                splice(&mut items, edits);
                Value::Array(items)
            }
        }
    }
}

impl Delete {
    /// Build a delete tree removing each of the given top-level keys.
    pub fn keys<I, K>(keys: I) -> DeleteTree
    where
        I: IntoIterator<Item = K>,
        K: Into<SmolStr>,
    {
        keys.into_iter()
            .map(|key| (key.into(), Delete::Remove))
            .collect()
    }

    fn is_leaf(&self) -> bool {
        match self {
            Delete::Remove => true,
            Delete::Fields(tree) => tree.is_empty(),
            Delete::Elements(elements) => elements.is_empty(),
        }
    }
}

/// Apply `replace` onto `existing`.
///
/// Returns whether any positional splice was applied to an existing array.
pub fn apply_replace(existing: &mut Map, replace: &ReplaceTree) -> bool {
    let mut spliced = false;
    for (key, overlay) in replace {
        let Some(current) = existing.get_mut(key) else {
            existing.insert(key.clone(), overlay.materialize());
            continue;
        };
        match (overlay, current) {
            (Replace::Merge(tree), Value::Map(inner)) => {
                spliced |= apply_replace(inner, tree);
            }
            (Replace::Splice(edits), Value::Array(items)) => {
                splice(items, edits);
                spliced = true;
            }
            (overlay, current) => *current = overlay.materialize(),
        }
    }
    spliced
}

fn splice(items: &mut Vec<Value>, edits: &[(usize, Value)]) {
    for (index, value) in edits {
        if let Some(slot) = items.get_mut(*index) {
            *slot = value.clone();
        } else if *index == items.len() {
            items.push(value.clone());
        }
    }
}

/// Remove the entries named by `delete` from `existing`.
///
/// Keys or indices that do not exist, and nested specs whose target has a
/// different shape, are ignored.
pub fn apply_delete(existing: &mut Map, delete: &DeleteTree) {
    for (key, spec) in delete {
        if spec.is_leaf() {
            existing.remove(key);
        } else if let Some(current) = existing.get_mut(key) {
            delete_nested(current, spec);
        }
    }
}

fn delete_nested(current: &mut Value, spec: &Delete) {
    match (spec, current) {
        (Delete::Fields(tree), Value::Map(inner)) => apply_delete(inner, tree),
        (Delete::Elements(elements), Value::Array(items)) => delete_elements(items, elements),
        _ => {}
    }
}

/// Indices are processed from highest to lowest so that removing one element
/// never shifts an index still waiting to be processed.
fn delete_elements(items: &mut Vec<Value>, elements: &[(usize, Delete)]) {
    let mut ordered: Vec<&(usize, Delete)> = elements.iter().collect();
    ordered.sort_by(|a, b| b.0.cmp(&a.0));
    ordered.dedup_by_key(|(index, _)| *index);
    for (index, spec) in ordered {
        if *index >= items.len() {
            continue;
        }
        if spec.is_leaf() {
            items.remove(*index);
        } else {
            delete_nested(&mut items[*index], spec);
        }
    }
}

/// Number of scalar leaves in a document. Empty maps and arrays count zero.
pub fn count_leaves(document: &Map) -> usize {
    document.values().map(Value::leaf_count).sum()
}
