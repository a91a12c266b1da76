//! Collection/document tree builder.
//!
//! Folds decoded entities into a nested mapping that mirrors the
//! database hierarchy: collection kind → document id → document map,
//! with subcollections nested inside their parent document's map.

use crate::key::EntityKey;
use crate::value::{FieldMap, Value};

/// A nested collection → document mapping built from decoded entities.
///
/// Inserting the same key twice merges field by field (last write wins
/// per field, not per document), so two partial writes of one document
/// combine their fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    root: FieldMap,
}

impl Tree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entity at its key path.
    ///
    /// Walks the ancestor chain, creating collection and document maps as
    /// needed, then merges `fields` into the leaf document. A slot that
    /// must become a collection or document map but currently holds a
    /// scalar is replaced by a fresh map.
    pub fn insert(&mut self, key: &EntityKey, fields: FieldMap) {
        let mut node = &mut self.root;
        for element in key.elements() {
            let collection = entry_map(node, &element.kind);
            node = entry_map(collection, &element.id.to_key_string());
        }
        for (name, value) in fields {
            node.insert(name, value);
        }
    }

    /// The top-level collection map.
    #[must_use]
    pub fn root(&self) -> &FieldMap {
        &self.root
    }

    /// Whether no entity has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Looks up a top-level collection's document map.
    #[must_use]
    pub fn collection(&self, kind: &str) -> Option<&FieldMap> {
        self.root.get(kind).and_then(Value::as_entity)
    }

    /// Looks up a top-level document's field map.
    #[must_use]
    pub fn document(&self, kind: &str, id: &str) -> Option<&FieldMap> {
        self.collection(kind)?.get(id).and_then(Value::as_entity)
    }
}

/// Builds a tree from a sequence of decoded records.
pub fn build_tree(records: impl IntoIterator<Item = (EntityKey, FieldMap)>) -> Tree {
    let mut tree = Tree::new();
    for (key, fields) in records {
        tree.insert(&key, fields);
    }
    tree
}

/// Descends into the map slot at `key`, creating or normalizing it to an
/// entity map.
fn entry_map<'a>(map: &'a mut FieldMap, key: &str) -> &'a mut FieldMap {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Entity(FieldMap::new()));
    if !matches!(slot, Value::Entity(_)) {
        *slot = Value::Entity(FieldMap::new());
    }
    match slot {
        Value::Entity(m) => m,
        _ => unreachable!("slot normalized to an entity map above"),
    }
}
