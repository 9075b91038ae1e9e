//! Conversions between Rust types and the `PropertyValue` an output stores.

use std::collections::BTreeMap;

use propval::Archive;
use propval::Asset;
use propval::Id;
use propval::PropertyValue;
use propval::Urn;

/// A type an `Output` can be viewed as.
pub trait OutputValue: Sized + Send + Sync + 'static {
    /// Human name used in type mismatch errors.
    const TYPE_NAME: &'static str;

    fn into_property(self) -> PropertyValue;

    /// `None` when the value has a different shape.
    fn from_property(value: PropertyValue) -> Option<Self>;
}

impl OutputValue for PropertyValue {
    const TYPE_NAME: &'static str = "any";

    fn into_property(self) -> PropertyValue {
        self
    }

    fn from_property(value: PropertyValue) -> Option<Self> {
        Some(value)
    }
}

impl OutputValue for String {
    const TYPE_NAME: &'static str = "string";

    fn into_property(self) -> PropertyValue {
        PropertyValue::String(self)
    }

    fn from_property(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl OutputValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn into_property(self) -> PropertyValue {
        PropertyValue::Bool(self)
    }

    fn from_property(value: PropertyValue) -> Option<Self> {
        value.as_bool()
    }
}

impl OutputValue for f64 {
    const TYPE_NAME: &'static str = "number";

    fn into_property(self) -> PropertyValue {
        PropertyValue::Number(self)
    }

    fn from_property(value: PropertyValue) -> Option<Self> {
        value.as_number()
    }
}

impl OutputValue for i64 {
    const TYPE_NAME: &'static str = "integer";

    fn into_property(self) -> PropertyValue {
        PropertyValue::Number(self as f64)
    }

    fn from_property(value: PropertyValue) -> Option<Self> {
        let n = value.as_number()?;
        // Only whole numbers inside the exactly representable range.
        if n.fract() != 0.0 || n.abs() > 9_007_199_254_740_992.0 {
            return None;
        }
        Some(n as i64)
    }
}

impl OutputValue for Urn {
    const TYPE_NAME: &'static str = "urn";

    fn into_property(self) -> PropertyValue {
        PropertyValue::String(self.into_string())
    }

    fn from_property(value: PropertyValue) -> Option<Self> {
        String::from_property(value).map(Urn::from)
    }
}

impl OutputValue for Id {
    const TYPE_NAME: &'static str = "id";

    fn into_property(self) -> PropertyValue {
        PropertyValue::String(self.into_string())
    }

    fn from_property(value: PropertyValue) -> Option<Self> {
        String::from_property(value).map(Id::from)
    }
}

impl OutputValue for Asset {
    const TYPE_NAME: &'static str = "asset";

    fn into_property(self) -> PropertyValue {
        PropertyValue::Asset(self)
    }

    fn from_property(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Asset(a) => Some(a),
            _ => None,
        }
    }
}

impl OutputValue for Archive {
    const TYPE_NAME: &'static str = "archive";

    fn into_property(self) -> PropertyValue {
        PropertyValue::Archive(self)
    }

    fn from_property(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Archive(a) => Some(a),
            _ => None,
        }
    }
}

impl<T: OutputValue> OutputValue for Vec<T> {
    const TYPE_NAME: &'static str = "array";

    fn into_property(self) -> PropertyValue {
        PropertyValue::Array(self.into_iter().map(T::into_property).collect())
    }

    fn from_property(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Array(items) => items.into_iter().map(T::from_property).collect(),
            _ => None,
        }
    }
}

impl<T: OutputValue> OutputValue for BTreeMap<String, T> {
    const TYPE_NAME: &'static str = "map";

    fn into_property(self) -> PropertyValue {
        PropertyValue::Object(self.into_iter().map(|(k, v)| (k, v.into_property())).collect())
    }

    fn from_property(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Object(map) => map.into_iter().map(|(k, v)| T::from_property(v).map(|v| (k, v))).collect(),
            _ => None,
        }
    }
}

impl<T: OutputValue> OutputValue for Option<T> {
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    fn into_property(self) -> PropertyValue {
        match self {
            Some(v) => v.into_property(),
            None => PropertyValue::Null,
        }
    }

    fn from_property(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Null => Some(None),
            other => T::from_property(other).map(Some),
        }
    }
}
