//! Resource identity: URNs and provider-assigned IDs.
//!
//! A URN has the shape `urn:pulumi:<stack>::<project>::<qualified type>::<name>`,
//! where the qualified type is the parent's type and the resource's own type
//! joined by `$`. The name is everything after the third separator, so it may
//! itself contain `::`.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Prefix shared by every URN this runtime mints.
pub const URN_PREFIX: &str = "urn:pulumi:";

/// Separator between URN segments.
pub const URN_SEPARATOR: &str = "::";

/// Type token of the root stack resource. Children of the stack do not
/// qualify their type with it.
pub const ROOT_STACK_TYPE: &str = "pulumi:pulumi:Stack";

/// Globally unique identifier of a resource instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Urn(String);

impl Urn {
    /// Mints the URN for a resource.
    pub fn new(stack: &str, project: &str, parent_type: Option<&str>, ty: &str, name: &str) -> Self {
        let qualified = match parent_type {
            Some(parent) if !parent.is_empty() && parent != ROOT_STACK_TYPE => format!("{parent}${ty}"),
            _ => ty.to_string(),
        };
        Urn(format!("{URN_PREFIX}{stack}{URN_SEPARATOR}{project}{URN_SEPARATOR}{qualified}{URN_SEPARATOR}{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the string has the full four-segment shape.
    pub fn is_valid(&self) -> bool {
        self.0.starts_with(URN_PREFIX) && self.segments().is_some()
    }

    /// The `$`-joined type chain, or `None` for a malformed URN.
    pub fn qualified_type(&self) -> Option<&str> {
        self.segments().map(|[_, _, qualified, _]| qualified)
    }

    /// The resource's own type token: the last link of the qualified type.
    pub fn type_token(&self) -> Option<&str> {
        self.qualified_type().and_then(|q| q.rsplit('$').next())
    }

    /// The resource name.
    pub fn name(&self) -> Option<&str> {
        self.segments().map(|[_, _, _, name]| name)
    }

    fn segments(&self) -> Option<[&str; 4]> {
        let mut parts = self.0.splitn(4, URN_SEPARATOR);
        Some([parts.next()?, parts.next()?, parts.next()?, parts.next()?])
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Urn {
    fn from(s: String) -> Self {
        Urn(s)
    }
}

impl From<&str> for Urn {
    fn from(s: &str) -> Self {
        Urn(s.to_string())
    }
}

impl AsRef<str> for Urn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Provider-assigned identifier of a custom resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id(s.to_string())
    }
}
