//! JSON rendering of trees and values.
//!
//! Types JSON has no native form for get a stable, injective object
//! encoding so nothing collapses into a plain string: bytes become
//! `{"bytes": "<hex>"}`, timestamps `{"timestamp_micros": n}`, geo
//! points `{"lat": .., "lng": ..}`, and references `{"path": [...]}`
//! with numeric path ids kept as numbers.

use fsexport_entity::{FieldMap, PathId, Tree, Value};
use serde_json::{json, Map, Value as Json};

/// Renders a whole tree as a JSON object.
#[must_use]
pub fn tree_to_json(tree: &Tree) -> Json {
    field_map_to_json(tree.root())
}

/// Renders a field map as a JSON object.
#[must_use]
pub fn field_map_to_json(fields: &FieldMap) -> Json {
    let mut object = Map::with_capacity(fields.len());
    for (name, value) in fields {
        object.insert(name.clone(), value_to_json(value));
    }
    Json::Object(object)
}

/// Renders one field value.
#[must_use]
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => json!(b),
        Value::Integer(n) => json!(n),
        Value::Float(x) => json!(x),
        Value::Text(s) => json!(s),
        Value::Bytes(b) => json!({ "bytes": hex_string(b) }),
        Value::Timestamp(micros) => json!({ "timestamp_micros": micros }),
        Value::GeoPoint { lat, lng } => json!({ "lat": lat, "lng": lng }),
        Value::Reference(key) => {
            let mut path = Vec::with_capacity(key.elements().len() * 2);
            for element in key.elements() {
                path.push(json!(element.kind));
                path.push(match &element.id {
                    PathId::Id(n) => json!(n),
                    PathId::Name(s) => json!(s),
                });
            }
            json!({ "path": path })
        }
        Value::Array(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Entity(fields) => field_map_to_json(fields),
    }
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsexport_entity::{EntityKey, PathElement};

    #[test]
    fn scalars_map_to_native_json() {
        assert_eq!(value_to_json(&Value::Null), Json::Null);
        assert_eq!(value_to_json(&Value::Bool(true)), json!(true));
        assert_eq!(value_to_json(&Value::Integer(-3)), json!(-3));
        assert_eq!(value_to_json(&Value::Float(0.5)), json!(0.5));
        assert_eq!(value_to_json(&Value::Text("x".to_string())), json!("x"));
    }

    #[test]
    fn bytes_tagged_as_hex() {
        assert_eq!(
            value_to_json(&Value::Bytes(vec![0x00, 0xAB, 0xFF])),
            json!({ "bytes": "00abff" })
        );
    }

    #[test]
    fn timestamp_and_geo_tagged() {
        assert_eq!(
            value_to_json(&Value::Timestamp(42)),
            json!({ "timestamp_micros": 42 })
        );
        assert_eq!(
            value_to_json(&Value::GeoPoint { lat: 1.5, lng: -2.5 }),
            json!({ "lat": 1.5, "lng": -2.5 })
        );
    }

    #[test]
    fn reference_path_preserves_id_types() {
        let key = EntityKey::new(vec![
            PathElement::named("User", "alice"),
            PathElement::numbered("Order", 42),
        ])
        .unwrap();
        assert_eq!(
            value_to_json(&Value::Reference(key)),
            json!({ "path": ["User", "alice", "Order", 42] })
        );
    }

    #[test]
    fn entities_render_as_plain_objects() {
        let mut inner = FieldMap::new();
        inner.insert("city".to_string(), Value::Text("Dar".to_string()));
        let mut outer = FieldMap::new();
        outer.insert("address".to_string(), Value::Entity(inner));
        assert_eq!(
            field_map_to_json(&outer),
            json!({ "address": { "city": "Dar" } })
        );
    }

    #[test]
    fn tree_renders_collections_then_documents() {
        let mut tree = Tree::new();
        let key = EntityKey::new(vec![PathElement::named("User", "a")]).unwrap();
        let mut fields = FieldMap::new();
        fields.insert("name".to_string(), Value::Text("X".to_string()));
        tree.insert(&key, fields);

        assert_eq!(
            tree_to_json(&tree),
            json!({ "User": { "a": { "name": "X" } } })
        );
    }
}
