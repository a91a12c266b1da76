//! Hierarchical entity keys.

use crate::error::{EntityError, EntityResult};
use std::fmt;

/// One identifier in a key path: either a numeric id assigned by the
/// database or a caller-chosen name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathId {
    /// Auto-assigned numeric identifier.
    Id(i64),
    /// Caller-chosen string name.
    Name(String),
}

impl PathId {
    /// Returns the identifier as a document map key.
    ///
    /// Numeric ids are stringified so document keys have a uniform type.
    #[must_use]
    pub fn to_key_string(&self) -> String {
        match self {
            Self::Id(n) => n.to_string(),
            Self::Name(s) => s.clone(),
        }
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(n) => write!(f, "{n}"),
            Self::Name(s) => write!(f, "{s}"),
        }
    }
}

/// One (kind, identifier) pair of a key path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathElement {
    /// Collection kind at this level.
    pub kind: String,
    /// Identifier within the kind.
    pub id: PathId,
}

impl PathElement {
    /// Creates an element with a string name identifier.
    pub fn named(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: PathId::Name(name.into()),
        }
    }

    /// Creates an element with a numeric identifier.
    pub fn numbered(kind: impl Into<String>, id: i64) -> Self {
        Self {
            kind: kind.into(),
            id: PathId::Id(id),
        }
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// An ordered, non-empty path of (kind, identifier) pairs.
///
/// The last element identifies the entity itself, preceding elements its
/// ancestors. Non-emptiness is enforced at construction, so accessors
/// for the leaf and root never fail.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey(Vec<PathElement>);

impl EntityKey {
    /// Creates a key from path elements.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::EmptyKey`] if `elements` is empty.
    pub fn new(elements: Vec<PathElement>) -> EntityResult<Self> {
        if elements.is_empty() {
            return Err(EntityError::EmptyKey);
        }
        Ok(Self(elements))
    }

    /// All path elements, root first.
    #[must_use]
    pub fn elements(&self) -> &[PathElement] {
        &self.0
    }

    /// The element identifying the entity itself.
    #[must_use]
    pub fn leaf(&self) -> &PathElement {
        // Non-empty by construction.
        &self.0[self.0.len() - 1]
    }

    /// Ancestor elements, root first, excluding the leaf.
    #[must_use]
    pub fn ancestors(&self) -> &[PathElement] {
        &self.0[..self.0.len() - 1]
    }

    /// Kind of the top-level collection this key belongs to.
    #[must_use]
    pub fn root_kind(&self) -> &str {
        &self.0[0].kind
    }

    /// Number of path elements.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{element}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_rejected() {
        assert_eq!(EntityKey::new(Vec::new()), Err(EntityError::EmptyKey));
    }

    #[test]
    fn leaf_and_ancestors() {
        let key = EntityKey::new(vec![
            PathElement::named("User", "alice"),
            PathElement::numbered("Order", 42),
        ])
        .unwrap();

        assert_eq!(key.root_kind(), "User");
        assert_eq!(key.leaf().kind, "Order");
        assert_eq!(key.ancestors().len(), 1);
        assert_eq!(key.depth(), 2);
    }

    #[test]
    fn single_element_key_has_no_ancestors() {
        let key = EntityKey::new(vec![PathElement::named("User", "a")]).unwrap();
        assert!(key.ancestors().is_empty());
        assert_eq!(key.leaf().kind, "User");
    }

    #[test]
    fn numeric_id_stringified() {
        assert_eq!(PathId::Id(42).to_key_string(), "42");
        assert_eq!(PathId::Name("a".to_string()).to_key_string(), "a");
    }

    #[test]
    fn display_joins_with_slashes() {
        let key = EntityKey::new(vec![
            PathElement::named("User", "alice"),
            PathElement::numbered("Order", 42),
        ])
        .unwrap();
        assert_eq!(key.to_string(), "User/alice/Order/42");
    }
}
