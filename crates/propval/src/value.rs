//! # Property Values
//!
//! `PropertyValue` is a closed sum type. Every conversion in the workspace is an
//! exhaustive match over it, so adding a variant is a compile error everywhere
//! it is not yet handled.
//!
//! ## Invariants
//! - `Computed` marks a value that does not exist yet. It may travel through
//!   the marshaler (as the unknown sentinel) but never into a snapshot.
//! - `PropertyMap` is a `BTreeMap`, so iteration is always in sorted key order
//!   and serialized output is deterministic.

use std::collections::BTreeMap;

use crate::asset::Archive;
use crate::asset::Asset;
use crate::urn::Id;
use crate::urn::Urn;

/// Name-keyed property bag.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PropertyValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<PropertyValue>),
    Object(PropertyMap),
    Asset(Asset),
    Archive(Archive),
    Secret(Box<PropertyValue>),
    /// A value that will only be known once the resource it comes from exists.
    Computed,
    ResourceReference(ResourceReference),
}

/// A pointer to another resource, by URN and (for custom resources) ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReference {
    pub urn: Urn,
    pub id: Option<Id>,
    pub package_version: Option<String>,
}

impl PropertyValue {
    pub fn secret(inner: PropertyValue) -> Self {
        PropertyValue::Secret(Box::new(inner))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, PropertyValue::Computed)
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, PropertyValue::Secret(_))
    }

    /// False for values that have nothing to persist.
    pub fn has_value(&self) -> bool {
        !self.is_null()
    }

    /// True if this value or anything nested in it is `Computed`.
    pub fn contains_unknowns(&self) -> bool {
        match self {
            PropertyValue::Computed => true,
            PropertyValue::Array(items) => items.iter().any(PropertyValue::contains_unknowns),
            PropertyValue::Object(map) => map.values().any(PropertyValue::contains_unknowns),
            PropertyValue::Secret(inner) => inner.contains_unknowns(),
            _ => false,
        }
    }

    /// True if this value or anything nested in it is a secret.
    pub fn contains_secrets(&self) -> bool {
        match self {
            PropertyValue::Secret(_) => true,
            PropertyValue::Array(items) => items.iter().any(PropertyValue::contains_secrets),
            PropertyValue::Object(map) => map.values().any(PropertyValue::contains_secrets),
            _ => false,
        }
    }

    /// Strips one level of secret wrapping, reporting whether there was one.
    pub fn unwrap_secret(self) -> (PropertyValue, bool) {
        match self {
            PropertyValue::Secret(inner) => (*inner, true),
            other => (other, false),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Null => "null",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Number(_) => "number",
            PropertyValue::String(_) => "string",
            PropertyValue::Array(_) => "array",
            PropertyValue::Object(_) => "object",
            PropertyValue::Asset(_) => "asset",
            PropertyValue::Archive(_) => "archive",
            PropertyValue::Secret(_) => "secret",
            PropertyValue::Computed => "computed",
            PropertyValue::ResourceReference(_) => "resource reference",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        PropertyValue::Number(n as f64)
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(items: Vec<PropertyValue>) -> Self {
        PropertyValue::Array(items)
    }
}

impl From<PropertyMap> for PropertyValue {
    fn from(map: PropertyMap) -> Self {
        PropertyValue::Object(map)
    }
}

impl From<Asset> for PropertyValue {
    fn from(a: Asset) -> Self {
        PropertyValue::Asset(a)
    }
}

impl From<Archive> for PropertyValue {
    fn from(a: Archive) -> Self {
        PropertyValue::Archive(a)
    }
}

impl From<ResourceReference> for PropertyValue {
    fn from(r: ResourceReference) -> Self {
        PropertyValue::ResourceReference(r)
    }
}
