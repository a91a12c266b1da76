//! Binary entity encoder.
//!
//! Versioned, length-prefixed encoding of a key plus field map. All
//! integers are little-endian. This is the built-in counterpart to the
//! proprietary export encoding; the decoder lives in [`crate::decoder`].

use crate::error::{EntityError, EntityResult};
use crate::key::{EntityKey, PathId};
use crate::value::{FieldMap, Value};
use crate::DecodedEntity;

/// Current payload format version.
pub(crate) const FORMAT_VERSION: u8 = 1;

/// Value type tags on the wire.
pub(crate) mod tag {
    pub const NULL: u8 = 0;
    pub const BOOL: u8 = 1;
    pub const INTEGER: u8 = 2;
    pub const FLOAT: u8 = 3;
    pub const TEXT: u8 = 4;
    pub const BYTES: u8 = 5;
    pub const TIMESTAMP: u8 = 6;
    pub const GEO_POINT: u8 = 7;
    pub const REFERENCE: u8 = 8;
    pub const ARRAY: u8 = 9;
    pub const ENTITY: u8 = 10;
}

/// Identifier kind markers within a key element.
pub(crate) const ID_NUMERIC: u8 = 0;
pub(crate) const ID_NAME: u8 = 1;

/// Encodes an entity into payload bytes.
pub(crate) fn encode_entity(entity: &DecodedEntity) -> EntityResult<Vec<u8>> {
    let mut buf = vec![FORMAT_VERSION];
    encode_key(&mut buf, &entity.key)?;
    encode_field_map(&mut buf, &entity.fields)?;
    Ok(buf)
}

fn encode_key(buf: &mut Vec<u8>, key: &EntityKey) -> EntityResult<()> {
    let count = u16::try_from(key.elements().len())
        .map_err(|_| EntityError::encoding_failed("key path too deep"))?;
    buf.extend_from_slice(&count.to_le_bytes());

    for element in key.elements() {
        encode_short_str(buf, &element.kind)?;
        match &element.id {
            PathId::Id(n) => {
                buf.push(ID_NUMERIC);
                buf.extend_from_slice(&n.to_le_bytes());
            }
            PathId::Name(s) => {
                buf.push(ID_NAME);
                encode_short_str(buf, s)?;
            }
        }
    }
    Ok(())
}

fn encode_field_map(buf: &mut Vec<u8>, fields: &FieldMap) -> EntityResult<()> {
    let count = u32::try_from(fields.len())
        .map_err(|_| EntityError::encoding_failed("too many fields"))?;
    buf.extend_from_slice(&count.to_le_bytes());

    for (name, value) in fields {
        encode_short_str(buf, name)?;
        encode_value(buf, value)?;
    }
    Ok(())
}

fn encode_value(buf: &mut Vec<u8>, value: &Value) -> EntityResult<()> {
    match value {
        Value::Null => buf.push(tag::NULL),
        Value::Bool(b) => {
            buf.push(tag::BOOL);
            buf.push(u8::from(*b));
        }
        Value::Integer(n) => {
            buf.push(tag::INTEGER);
            buf.extend_from_slice(&n.to_le_bytes());
        }
        Value::Float(x) => {
            buf.push(tag::FLOAT);
            buf.extend_from_slice(&x.to_le_bytes());
        }
        Value::Text(s) => {
            buf.push(tag::TEXT);
            encode_str(buf, s)?;
        }
        Value::Bytes(b) => {
            buf.push(tag::BYTES);
            encode_bytes(buf, b)?;
        }
        Value::Timestamp(micros) => {
            buf.push(tag::TIMESTAMP);
            buf.extend_from_slice(&micros.to_le_bytes());
        }
        Value::GeoPoint { lat, lng } => {
            buf.push(tag::GEO_POINT);
            buf.extend_from_slice(&lat.to_le_bytes());
            buf.extend_from_slice(&lng.to_le_bytes());
        }
        Value::Reference(key) => {
            buf.push(tag::REFERENCE);
            encode_key(buf, key)?;
        }
        Value::Array(items) => {
            buf.push(tag::ARRAY);
            let count = u32::try_from(items.len())
                .map_err(|_| EntityError::encoding_failed("array too long"))?;
            buf.extend_from_slice(&count.to_le_bytes());
            for item in items {
                encode_value(buf, item)?;
            }
        }
        Value::Entity(fields) => {
            buf.push(tag::ENTITY);
            encode_field_map(buf, fields)?;
        }
    }
    Ok(())
}

fn encode_short_str(buf: &mut Vec<u8>, s: &str) -> EntityResult<()> {
    let len = u16::try_from(s.len())
        .map_err(|_| EntityError::encoding_failed(format!("name too long: {} bytes", s.len())))?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

fn encode_str(buf: &mut Vec<u8>, s: &str) -> EntityResult<()> {
    let len = u32::try_from(s.len())
        .map_err(|_| EntityError::encoding_failed("string too long"))?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

fn encode_bytes(buf: &mut Vec<u8>, b: &[u8]) -> EntityResult<()> {
    let len = u32::try_from(b.len())
        .map_err(|_| EntityError::encoding_failed("byte string too long"))?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(b);
    Ok(())
}
