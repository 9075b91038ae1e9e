//! # Property Marshaler
//!
//! Converts between `PropertyValue` and the wire-neutral tree used by RPC
//! messages (`serde_json::Value`).
//!
//! ## Retention
//!
//! Three kinds of value have no plain JSON form, and `MarshalOptions` says what
//! to do with each:
//!
//! - **Unknowns**: kept as the [`UNKNOWN`] sentinel string, rejected with an
//!   error, or dropped. A dropped object entry disappears; a dropped array slot
//!   becomes null so that positions do not shift.
//! - **Secrets**: kept as a signed `{sig, value}` map, or emitted bare.
//! - **Resource references**: kept as a signed `{sig, urn, id?, packageVersion?}`
//!   map, or degraded to the id string (the URN string when there is no id).
//!
//! Errors name the label of the property bag and the path within it.

use serde_json::Map;
use serde_json::Number;
use serde_json::Value;
use tracing::trace;

use crate::ARCHIVE_SIG;
use crate::ASSET_SIG;
use crate::RESOURCE_REFERENCE_SIG;
use crate::SECRET_SIG;
use crate::SIG_KEY;
use crate::UNKNOWN;
use crate::asset;
use crate::asset::Archive;
use crate::asset::Asset;
use crate::signature;
use crate::urn::Id;
use crate::urn::Urn;
use crate::value::PropertyMap;
use crate::value::PropertyValue;
use crate::value::ResourceReference;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("{label}: unexpected unknown value at '{path}'")]
    UnexpectedUnknown { label: String, path: String },
    #[error("{label}: number at '{path}' is not finite")]
    NonFiniteNumber { label: String, path: String },
    #[error("{label}: unrecognized signature '{sig}' at '{path}'")]
    UnknownSignature { label: String, path: String, sig: String },
    #[error("{label}: malformed {kind} at '{path}': {reason}")]
    Malformed { label: String, path: String, kind: &'static str, reason: String },
    #[error("{label}: {source} at '{path}'")]
    Asset { label: String, path: String, source: asset::Error },
}

pub type Result<T> = std::result::Result<T, Error>;

/// What the marshaler keeps, drops, or rejects.
#[derive(Debug, Clone, Default)]
pub struct MarshalOptions {
    /// Names the property bag in error messages.
    pub label: String,
    pub keep_unknowns: bool,
    /// Unknowns are an error instead of being dropped. Ignored when `keep_unknowns` is set.
    pub reject_unknowns: bool,
    pub keep_secrets: bool,
    pub keep_resources: bool,
}

impl MarshalOptions {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self { label: label.into(), ..Self::default() }
    }
}

// ============================================================================
//  MARSHAL
// ============================================================================

pub fn marshal_properties(props: &PropertyMap, opts: &MarshalOptions) -> Result<Map<String, Value>> {
    let out = marshal_map(props, opts, "")?;
    trace!(label = %opts.label, count = out.len(), "marshaled properties");
    Ok(out)
}

/// Marshals one value. `Ok(None)` means the value was dropped.
pub fn marshal_value(value: &PropertyValue, opts: &MarshalOptions) -> Result<Option<Value>> {
    marshal_at(value, opts, "")
}

fn marshal_map(props: &PropertyMap, opts: &MarshalOptions, path: &str) -> Result<Map<String, Value>> {
    let mut out = Map::new();
    for (key, value) in props {
        if let Some(wire) = marshal_at(value, opts, &join_key(path, key))? {
            out.insert(key.clone(), wire);
        }
    }
    Ok(out)
}

fn marshal_at(value: &PropertyValue, opts: &MarshalOptions, path: &str) -> Result<Option<Value>> {
    let wire = match value {
        PropertyValue::Null => Value::Null,
        PropertyValue::Bool(b) => Value::Bool(*b),
        PropertyValue::Number(n) => match Number::from_f64(*n) {
            Some(n) => Value::Number(n),
            None => return Err(Error::NonFiniteNumber { label: opts.label.clone(), path: path.to_string() }),
        },
        PropertyValue::String(s) => Value::String(s.clone()),
        PropertyValue::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                out.push(marshal_at(item, opts, &join_index(path, i))?.unwrap_or(Value::Null));
            }
            Value::Array(out)
        }
        PropertyValue::Object(map) => Value::Object(marshal_map(map, opts, path)?),
        PropertyValue::Asset(a) => Value::Object(a.to_wire()),
        PropertyValue::Archive(a) => Value::Object(a.to_wire()),
        PropertyValue::Secret(inner) => {
            let Some(inner) = marshal_at(inner, opts, path)? else {
                return Ok(None);
            };
            if !opts.keep_secrets {
                return Ok(Some(inner));
            }
            let mut map = Map::new();
            map.insert(SIG_KEY.into(), Value::String(SECRET_SIG.into()));
            map.insert("value".into(), inner);
            Value::Object(map)
        }
        PropertyValue::Computed => {
            if opts.keep_unknowns {
                Value::String(UNKNOWN.into())
            } else if opts.reject_unknowns {
                return Err(Error::UnexpectedUnknown { label: opts.label.clone(), path: path.to_string() });
            } else {
                return Ok(None);
            }
        }
        PropertyValue::ResourceReference(r) => {
            if opts.keep_resources {
                Value::Object(reference_to_wire(r))
            } else {
                match &r.id {
                    Some(id) => Value::String(id.to_string()),
                    None => Value::String(r.urn.to_string()),
                }
            }
        }
    };
    Ok(Some(wire))
}

fn reference_to_wire(r: &ResourceReference) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(SIG_KEY.into(), Value::String(RESOURCE_REFERENCE_SIG.into()));
    map.insert("urn".into(), Value::String(r.urn.to_string()));
    if let Some(id) = &r.id {
        map.insert("id".into(), Value::String(id.to_string()));
    }
    if let Some(version) = &r.package_version {
        map.insert("packageVersion".into(), Value::String(version.clone()));
    }
    map
}

// ============================================================================
//  UNMARSHAL
// ============================================================================

pub fn unmarshal_properties(wire: &Map<String, Value>, opts: &MarshalOptions) -> Result<PropertyMap> {
    let props = unmarshal_map(wire, opts, "")?;
    trace!(label = %opts.label, count = props.len(), "unmarshaled properties");
    Ok(props)
}

/// Unmarshals one value. `Ok(None)` means the value was dropped.
pub fn unmarshal_value(wire: &Value, opts: &MarshalOptions) -> Result<Option<PropertyValue>> {
    unmarshal_at(wire, opts, "")
}

fn unmarshal_map(wire: &Map<String, Value>, opts: &MarshalOptions, path: &str) -> Result<PropertyMap> {
    let mut props = PropertyMap::new();
    for (key, value) in wire {
        if let Some(value) = unmarshal_at(value, opts, &join_key(path, key))? {
            props.insert(key.clone(), value);
        }
    }
    Ok(props)
}

fn unmarshal_at(wire: &Value, opts: &MarshalOptions, path: &str) -> Result<Option<PropertyValue>> {
    let value = match wire {
        Value::Null => PropertyValue::Null,
        Value::Bool(b) => PropertyValue::Bool(*b),
        Value::Number(n) => match n.as_f64() {
            Some(n) if n.is_finite() => PropertyValue::Number(n),
            _ => return Err(Error::NonFiniteNumber { label: opts.label.clone(), path: path.to_string() }),
        },
        Value::String(s) if s == UNKNOWN => {
            if opts.keep_unknowns {
                PropertyValue::Computed
            } else if opts.reject_unknowns {
                return Err(Error::UnexpectedUnknown { label: opts.label.clone(), path: path.to_string() });
            } else {
                return Ok(None);
            }
        }
        Value::String(s) => PropertyValue::String(s.clone()),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                out.push(unmarshal_at(item, opts, &join_index(path, i))?.unwrap_or(PropertyValue::Null));
            }
            PropertyValue::Array(out)
        }
        Value::Object(map) => return unmarshal_object(map, opts, path),
    };
    Ok(Some(value))
}

fn unmarshal_object(map: &Map<String, Value>, opts: &MarshalOptions, path: &str) -> Result<Option<PropertyValue>> {
    let Some(sig) = signature(map) else {
        return Ok(Some(PropertyValue::Object(unmarshal_map(map, opts, path)?)));
    };
    let asset_err = |source| Error::Asset { label: opts.label.clone(), path: path.to_string(), source };

    match sig {
        ASSET_SIG => Ok(Asset::from_wire(map).map_err(asset_err)?.map(PropertyValue::Asset)),
        ARCHIVE_SIG => Ok(Archive::from_wire(map).map_err(asset_err)?.map(PropertyValue::Archive)),
        SECRET_SIG => {
            let inner = map.get("value").unwrap_or(&Value::Null);
            let Some(inner) = unmarshal_at(inner, opts, path)? else {
                return Ok(None);
            };
            if opts.keep_secrets {
                Ok(Some(PropertyValue::secret(inner)))
            } else {
                Ok(Some(inner))
            }
        }
        RESOURCE_REFERENCE_SIG => {
            let reference = reference_from_wire(map, opts, path)?;
            if opts.keep_resources {
                return Ok(Some(PropertyValue::ResourceReference(reference)));
            }
            let degraded = match reference.id {
                Some(id) => id.into_string(),
                None => reference.urn.into_string(),
            };
            Ok(Some(PropertyValue::String(degraded)))
        }
        other => Err(Error::UnknownSignature {
            label: opts.label.clone(),
            path: path.to_string(),
            sig: other.to_string(),
        }),
    }
}

fn reference_from_wire(map: &Map<String, Value>, opts: &MarshalOptions, path: &str) -> Result<ResourceReference> {
    let malformed = |reason: &str| Error::Malformed {
        label: opts.label.clone(),
        path: path.to_string(),
        kind: "resource reference",
        reason: reason.to_string(),
    };
    let urn = match map.get("urn") {
        Some(Value::String(s)) if !s.is_empty() => Urn::from(s.as_str()),
        _ => return Err(malformed("missing urn")),
    };
    let id = match map.get("id") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(Id::from(s.as_str())),
        Some(_) => return Err(malformed("id must be a string")),
    };
    let package_version = match map.get("packageVersion") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(malformed("packageVersion must be a string")),
    };
    Ok(ResourceReference { urn, id, package_version })
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() { key.to_string() } else { format!("{path}.{key}") }
}

fn join_index(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}
