//! # Property Codec
//!
//! `PropertyValue` to and from the JSON tree stored in snapshots.
//!
//! ## Shape Rules
//! - Null values are omitted. Inside an object the key disappears; inside an
//!   array the slot is kept as an explicit null so positions do not shift.
//! - Assets and archives write their signed map form and are recognized again
//!   on the way back by that signature. Any other map is a plain object.
//! - Secrets write `{sig: SECRET_SIG, plaintext}`, where `plaintext` is the JSON
//!   text of the serialized inner value. Secret-ness survives the round trip.
//! - Resource references write their signed marshaled form.
//! - `Computed` cannot be persisted. Reaching it is an upstream bug and fails.

use serde_json::Map;
use serde_json::Number;
use serde_json::Value;
use tracing::error;

use propval::ARCHIVE_SIG;
use propval::ASSET_SIG;
use propval::Archive;
use propval::Asset;
use propval::MarshalOptions;
use propval::PropertyMap;
use propval::PropertyValue;
use propval::RESOURCE_REFERENCE_SIG;
use propval::SECRET_SIG;
use propval::SIG_KEY;
use propval::marshal;
use propval::signature;

use crate::error::Error;
use crate::error::Result;

/// Serializes one value. `Ok(None)` means the value is omitted.
pub fn serialize_property_value(value: &PropertyValue) -> Result<Option<Value>> {
    serialize_at(value, "")
}

/// Serializes a property bag in sorted key order, dropping omitted values.
pub fn serialize_properties(props: &PropertyMap) -> Result<Map<String, Value>> {
    serialize_map(props, "")
}

/// Rebuilds a value. A JSON null becomes `Null`.
pub fn deserialize_property_value(wire: &Value) -> Result<PropertyValue> {
    deserialize_at(wire, "")
}

pub fn deserialize_properties(wire: &Map<String, Value>) -> Result<PropertyMap> {
    deserialize_map(wire, "")
}

// ============================================================================
//  SERIALIZE
// ============================================================================

fn serialize_map(props: &PropertyMap, path: &str) -> Result<Map<String, Value>> {
    let mut out = Map::new();
    for (key, value) in props {
        if let Some(wire) = serialize_at(value, &join_key(path, key))? {
            out.insert(key.clone(), wire);
        }
    }
    Ok(out)
}

fn serialize_at(value: &PropertyValue, path: &str) -> Result<Option<Value>> {
    if value.is_computed() {
        error!(path, "computed value reached the snapshot serializer");
        return Err(Error::ComputedValue(path.to_string()));
    }
    if !value.has_value() {
        return Ok(None);
    }

    let wire = match value {
        PropertyValue::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                out.push(serialize_at(item, &join_index(path, i))?.unwrap_or(Value::Null));
            }
            Value::Array(out)
        }
        PropertyValue::Object(map) => Value::Object(serialize_map(map, path)?),
        PropertyValue::Asset(a) => Value::Object(a.to_wire()),
        PropertyValue::Archive(a) => Value::Object(a.to_wire()),
        PropertyValue::Secret(inner) => {
            let inner = serialize_at(inner, path)?.unwrap_or(Value::Null);
            let mut map = Map::new();
            map.insert(SIG_KEY.into(), Value::String(SECRET_SIG.into()));
            map.insert("plaintext".into(), Value::String(inner.to_string()));
            Value::Object(map)
        }
        PropertyValue::ResourceReference(_) => {
            let opts = MarshalOptions { keep_resources: true, ..MarshalOptions::labeled("snapshot") };
            marshal::marshal_value(value, &opts)
                .map_err(|source| Error::Reference { path: path.to_string(), source })?
                .unwrap_or(Value::Null)
        }
        PropertyValue::Bool(b) => Value::Bool(*b),
        PropertyValue::Number(n) => match Number::from_f64(*n) {
            Some(n) => Value::Number(n),
            None => {
                return Err(Error::UnrecognizedValue { path: path.to_string(), reason: format!("number {n} is not finite") });
            }
        },
        PropertyValue::String(s) => Value::String(s.clone()),
        PropertyValue::Null | PropertyValue::Computed => return Ok(None),
    };
    Ok(Some(wire))
}

// ============================================================================
//  DESERIALIZE
// ============================================================================

fn deserialize_map(wire: &Map<String, Value>, path: &str) -> Result<PropertyMap> {
    let mut props = PropertyMap::new();
    for (key, value) in wire {
        props.insert(key.clone(), deserialize_at(value, &join_key(path, key))?);
    }
    Ok(props)
}

fn deserialize_at(wire: &Value, path: &str) -> Result<PropertyValue> {
    match wire {
        Value::Null => Ok(PropertyValue::Null),
        Value::Bool(b) => Ok(PropertyValue::Bool(*b)),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() => Ok(PropertyValue::Number(f)),
            _ => {
                error!(path, number = %n, "unrecognized number in snapshot");
                Err(Error::UnrecognizedValue { path: path.to_string(), reason: format!("number {n} is not an f64") })
            }
        },
        Value::String(s) => Ok(PropertyValue::String(s.clone())),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                out.push(deserialize_at(item, &join_index(path, i))?);
            }
            Ok(PropertyValue::Array(out))
        }
        Value::Object(map) => deserialize_object(map, path),
    }
}

fn deserialize_object(map: &Map<String, Value>, path: &str) -> Result<PropertyValue> {
    let asset_err = |source| Error::Asset { path: path.to_string(), source };

    match signature(map) {
        Some(ASSET_SIG) => {
            if let Some(asset) = Asset::from_wire(map).map_err(asset_err)? {
                return Ok(PropertyValue::Asset(asset));
            }
        }
        Some(ARCHIVE_SIG) => {
            if let Some(archive) = Archive::from_wire(map).map_err(asset_err)? {
                return Ok(PropertyValue::Archive(archive));
            }
        }
        Some(SECRET_SIG) => return deserialize_secret(map, path),
        Some(RESOURCE_REFERENCE_SIG) => {
            let opts = MarshalOptions { keep_resources: true, ..MarshalOptions::labeled("snapshot") };
            let value = marshal::unmarshal_value(&Value::Object(map.clone()), &opts)
                .map_err(|source| Error::Reference { path: path.to_string(), source })?;
            return Ok(value.unwrap_or_default());
        }
        _ => {}
    }
    Ok(PropertyValue::Object(deserialize_map(map, path)?))
}

fn deserialize_secret(map: &Map<String, Value>, path: &str) -> Result<PropertyValue> {
    let Some(Value::String(plaintext)) = map.get("plaintext") else {
        return Err(Error::UnrecognizedValue {
            path: path.to_string(),
            reason: "secret without a plaintext string".into(),
        });
    };
    let inner: Value = serde_json::from_str(plaintext)?;
    Ok(PropertyValue::secret(deserialize_at(&inner, path)?))
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() { key.to_string() } else { format!("{path}.{key}") }
}

fn join_index(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}
