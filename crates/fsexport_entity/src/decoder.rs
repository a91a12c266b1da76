//! Binary entity decoder.

use crate::encoder::{self, tag, ID_NAME, ID_NUMERIC};
use crate::error::{EntityError, EntityResult};
use crate::key::{EntityKey, PathElement, PathId};
use crate::value::{FieldMap, Value};
use crate::{DecodedEntity, PayloadDecoder};

/// The built-in entity payload codec.
///
/// Encodes and decodes the versioned binary entity format produced by
/// [`BinaryEntityCodec::encode`]. Plugs into the decoding pipeline through
/// the [`PayloadDecoder`] trait; a protobuf-based decoder for the real
/// export encoding would implement the same trait.
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryEntityCodec;

impl BinaryEntityCodec {
    /// Creates the codec.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Encodes an entity into payload bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if a name or container exceeds its length prefix.
    pub fn encode(&self, entity: &DecodedEntity) -> EntityResult<Vec<u8>> {
        encoder::encode_entity(entity)
    }
}

impl PayloadDecoder for BinaryEntityCodec {
    fn decode(&self, bytes: &[u8]) -> EntityResult<DecodedEntity> {
        let mut cursor = Cursor::new(bytes);

        let version = cursor.read_u8()?;
        if version != encoder::FORMAT_VERSION {
            return Err(EntityError::UnsupportedVersion { version });
        }

        let key = cursor.read_key()?;
        let fields = cursor.read_field_map()?;

        if !cursor.is_empty() {
            return Err(EntityError::decoding_failed(format!(
                "{} trailing bytes after entity",
                cursor.remaining()
            )));
        }

        Ok(DecodedEntity { key, fields })
    }
}

/// Bounds-checked reader over a payload.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> EntityResult<u8> {
        if self.pos >= self.data.len() {
            return Err(EntityError::UnexpectedEof);
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    fn read_bytes(&mut self, len: usize) -> EntityResult<&'a [u8]> {
        if len > self.data.len() - self.pos {
            return Err(EntityError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_u16(&mut self) -> EntityResult<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> EntityResult<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_i64(&mut self) -> EntityResult<i64> {
        let b = self.read_bytes(8)?;
        Ok(i64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn read_f64(&mut self) -> EntityResult<f64> {
        let b = self.read_bytes(8)?;
        Ok(f64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn read_short_str(&mut self) -> EntityResult<String> {
        let len = self.read_u16()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| EntityError::InvalidUtf8)
    }

    fn read_str(&mut self) -> EntityResult<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| EntityError::InvalidUtf8)
    }

    fn read_key(&mut self) -> EntityResult<EntityKey> {
        let count = self.read_u16()? as usize;
        let mut elements = Vec::new();
        for _ in 0..count {
            let kind = self.read_short_str()?;
            let id = match self.read_u8()? {
                ID_NUMERIC => PathId::Id(self.read_i64()?),
                ID_NAME => PathId::Name(self.read_short_str()?),
                marker => {
                    return Err(EntityError::decoding_failed(format!(
                        "unknown key id marker {marker}"
                    )));
                }
            };
            elements.push(PathElement { kind, id });
        }
        EntityKey::new(elements)
    }

    fn read_field_map(&mut self) -> EntityResult<FieldMap> {
        let count = self.read_u32()?;
        let mut fields = FieldMap::new();
        for _ in 0..count {
            let name = self.read_short_str()?;
            let value = self.read_value(&name)?;
            fields.insert(name, value);
        }
        Ok(fields)
    }

    fn read_value(&mut self, field: &str) -> EntityResult<Value> {
        let value_tag = self.read_u8()?;
        match value_tag {
            tag::NULL => Ok(Value::Null),
            tag::BOOL => match self.read_u8()? {
                0 => Ok(Value::Bool(false)),
                1 => Ok(Value::Bool(true)),
                b => Err(EntityError::decoding_failed(format!(
                    "invalid bool byte {b} in field {field:?}"
                ))),
            },
            tag::INTEGER => Ok(Value::Integer(self.read_i64()?)),
            tag::FLOAT => Ok(Value::Float(self.read_f64()?)),
            tag::TEXT => Ok(Value::Text(self.read_str()?)),
            tag::BYTES => {
                let len = self.read_u32()? as usize;
                Ok(Value::Bytes(self.read_bytes(len)?.to_vec()))
            }
            tag::TIMESTAMP => Ok(Value::Timestamp(self.read_i64()?)),
            tag::GEO_POINT => Ok(Value::GeoPoint {
                lat: self.read_f64()?,
                lng: self.read_f64()?,
            }),
            tag::REFERENCE => Ok(Value::Reference(self.read_key()?)),
            tag::ARRAY => {
                let count = self.read_u32()?;
                let mut items = Vec::new();
                for _ in 0..count {
                    items.push(self.read_value(field)?);
                }
                Ok(Value::Array(items))
            }
            tag::ENTITY => Ok(Value::Entity(self.read_field_map()?)),
            _ => Err(EntityError::UnsupportedValue {
                tag: value_tag,
                field: field.to_string(),
            }),
        }
    }
}
