//! # Propval
//!
//! The typed, recursive value model for resource properties.
//!
//! ## Architecture
//!
//! - **Values** (`value`): `PropertyValue`, the sum type every property is one of,
//!   and `PropertyMap`, its name-keyed container.
//! - **Identity** (`urn`): `Urn` and `Id` newtypes.
//! - **Assets** (`asset`): file-like values that carry their own self-describing
//!   wire form.
//! - **Marshaling** (`marshal`): conversion to and from the wire-neutral tree
//!   (`serde_json::Value`) with configurable retention of secrets, unknowns and
//!   resource references.
//!
//! ## Signatures
//!
//! Values that do not fit the plain JSON shapes are written as maps carrying the
//! [`SIG_KEY`] entry. The signature decides how the rest of the map is read.

pub mod asset;
pub mod marshal;
pub mod urn;
pub mod value;


pub use asset::Archive;
pub use asset::ArchiveMember;
pub use asset::Asset;
pub use marshal::MarshalOptions;
pub use urn::Id;
pub use urn::Urn;
pub use value::PropertyMap;
pub use value::PropertyValue;
pub use value::ResourceReference;

/// Map key whose value names the kind of a signed map.
pub const SIG_KEY: &str = "4dabf18193072939515e22adb298388d";
/// Signature of an asset.
pub const ASSET_SIG: &str = "c44067f5952c0a294b673a41bacd8c17";
/// Signature of an archive.
pub const ARCHIVE_SIG: &str = "0def7320c3a5731c473e5ecbe6d01bc7";
/// Signature of a secret wrapper.
pub const SECRET_SIG: &str = "1b47061264138c4ac30d75fd1eb44270";
/// Signature of a resource reference.
pub const RESOURCE_REFERENCE_SIG: &str = "5cf8f73096256a8f31e491e813e4eb8e";

/// Sentinel string standing in for a value that is not yet known.
pub const UNKNOWN: &str = "04da6b54-80e4-46f7-96ec-b56ff0331ba9";

/// Reads the signature of a wire map, if it carries one.
pub fn signature(map: &serde_json::Map<String, serde_json::Value>) -> Option<&str> {
    map.get(SIG_KEY).and_then(serde_json::Value::as_str)
}
