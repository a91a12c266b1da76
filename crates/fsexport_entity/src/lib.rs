//! # fsexport Entity
//!
//! Entity value model, hierarchical keys, payload codec, and the
//! collection/document tree builder.
//!
//! An export record is an opaque serialized entity. Decoding it yields an
//! [`EntityKey`] (the entity's position in the collection hierarchy) and a
//! [`FieldMap`] (field name to typed [`Value`]). The [`Tree`] folds decoded
//! entities into the nested collection → document mapping that mirrors the
//! database, merging repeated writes to the same key field by field.
//!
//! The payload encoding itself sits behind the [`PayloadDecoder`] seam so
//! that a protobuf-based decoder can be plugged in; [`BinaryEntityCodec`]
//! is the built-in implementation.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod key;
mod tree;
mod value;

pub use decoder::BinaryEntityCodec;
pub use error::{EntityError, EntityResult};
pub use key::{EntityKey, PathElement, PathId};
pub use tree::{build_tree, Tree};
pub use value::{FieldMap, Value};

/// A decoded entity: its key and its field map.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEntity {
    /// Position in the collection hierarchy.
    pub key: EntityKey,
    /// Field name to typed value.
    pub fields: FieldMap,
}

/// Decodes an opaque entity payload into a key and field map.
///
/// This is the boundary to the export's proprietary entity encoding.
/// Implementations must be usable from multiple worker threads at once.
///
/// # Errors
///
/// A failed decode is fatal to that record only; callers collect the
/// error and continue with the next record.
pub trait PayloadDecoder: Send + Sync {
    /// Decodes one entity payload.
    fn decode(&self, bytes: &[u8]) -> EntityResult<DecodedEntity>;
}
