//! # Assets and Archives
//!
//! File-like property values. Each one serializes to a map that embeds the
//! signature key, so a reader can tell it apart from an ordinary object.
//!
//! ## Wire Shape
//! - Asset:   `{sig: ASSET_SIG, hash?, text | path | uri}`
//! - Archive: `{sig: ARCHIVE_SIG, hash?, assets | path | uri}`, where `assets`
//!   maps member names to nested asset or archive maps.

use std::collections::BTreeMap;

use serde_json::Map;
use serde_json::Value;

use crate::ARCHIVE_SIG;
use crate::ASSET_SIG;
use crate::SIG_KEY;
use crate::signature;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("{kind} field '{field}' must be a string")]
    NotAString { kind: &'static str, field: &'static str },
    #[error("{kind} has none of {expected}")]
    MissingContents { kind: &'static str, expected: &'static str },
    #[error("archive field 'assets' must be a map")]
    AssetsNotAMap,
    #[error("archive member '{0}' is neither an asset nor an archive")]
    BadMember(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Where an asset's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    Text(String),
    Path(String),
    Uri(String),
}

/// A single blob of data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub source: AssetSource,
    /// Content hash, when the engine has computed one.
    pub hash: Option<String>,
}

impl Asset {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { source: AssetSource::Text(text.into()), hash: None }
    }

    pub fn from_path(path: impl Into<String>) -> Self {
        Self { source: AssetSource::Path(path.into()), hash: None }
    }

    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self { source: AssetSource::Uri(uri.into()), hash: None }
    }

    pub fn to_wire(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(SIG_KEY.into(), Value::String(ASSET_SIG.into()));
        if let Some(hash) = &self.hash {
            map.insert("hash".into(), Value::String(hash.clone()));
        }
        let (key, val) = match &self.source {
            AssetSource::Text(s) => ("text", s),
            AssetSource::Path(s) => ("path", s),
            AssetSource::Uri(s) => ("uri", s),
        };
        map.insert(key.into(), Value::String(val.clone()));
        map
    }

    /// Reads an asset back. `Ok(None)` means the map is not signed as an asset.
    pub fn from_wire(map: &Map<String, Value>) -> Result<Option<Self>> {
        if signature(map) != Some(ASSET_SIG) {
            return Ok(None);
        }
        let hash = string_field(map, "asset", "hash")?;
        let source = if let Some(text) = string_field(map, "asset", "text")? {
            AssetSource::Text(text)
        } else if let Some(path) = string_field(map, "asset", "path")? {
            AssetSource::Path(path)
        } else if let Some(uri) = string_field(map, "asset", "uri")? {
            AssetSource::Uri(uri)
        } else {
            return Err(Error::MissingContents { kind: "asset", expected: "text, path or uri" });
        };
        Ok(Some(Self { source, hash }))
    }
}

/// One entry of an archive built from in-memory members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveMember {
    Asset(Asset),
    Archive(Archive),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSource {
    Assets(BTreeMap<String, ArchiveMember>),
    Path(String),
    Uri(String),
}

/// A collection of assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub source: ArchiveSource,
    pub hash: Option<String>,
}

impl Archive {
    pub fn from_assets(assets: BTreeMap<String, ArchiveMember>) -> Self {
        Self { source: ArchiveSource::Assets(assets), hash: None }
    }

    pub fn from_path(path: impl Into<String>) -> Self {
        Self { source: ArchiveSource::Path(path.into()), hash: None }
    }

    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self { source: ArchiveSource::Uri(uri.into()), hash: None }
    }

    pub fn to_wire(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(SIG_KEY.into(), Value::String(ARCHIVE_SIG.into()));
        if let Some(hash) = &self.hash {
            map.insert("hash".into(), Value::String(hash.clone()));
        }
        match &self.source {
            ArchiveSource::Assets(members) => {
                let members = members
                    .iter()
                    .map(|(name, member)| {
                        let wire = match member {
                            ArchiveMember::Asset(a) => a.to_wire(),
                            ArchiveMember::Archive(a) => a.to_wire(),
                        };
                        (name.clone(), Value::Object(wire))
                    })
                    .collect();
                map.insert("assets".into(), Value::Object(members));
            }
            ArchiveSource::Path(s) => {
                map.insert("path".into(), Value::String(s.clone()));
            }
            ArchiveSource::Uri(s) => {
                map.insert("uri".into(), Value::String(s.clone()));
            }
        }
        map
    }

    /// Reads an archive back. `Ok(None)` means the map is not signed as an archive.
    pub fn from_wire(map: &Map<String, Value>) -> Result<Option<Self>> {
        if signature(map) != Some(ARCHIVE_SIG) {
            return Ok(None);
        }
        let hash = string_field(map, "archive", "hash")?;
        let source = if let Some(assets) = map.get("assets") {
            let Value::Object(entries) = assets else {
                return Err(Error::AssetsNotAMap);
            };
            let mut members = BTreeMap::new();
            for (name, entry) in entries {
                members.insert(name.clone(), read_member(name, entry)?);
            }
            ArchiveSource::Assets(members)
        } else if let Some(path) = string_field(map, "archive", "path")? {
            ArchiveSource::Path(path)
        } else if let Some(uri) = string_field(map, "archive", "uri")? {
            ArchiveSource::Uri(uri)
        } else {
            return Err(Error::MissingContents { kind: "archive", expected: "assets, path or uri" });
        };
        Ok(Some(Self { source, hash }))
    }
}

fn read_member(name: &str, entry: &Value) -> Result<ArchiveMember> {
    let Value::Object(map) = entry else {
        return Err(Error::BadMember(name.to_string()));
    };
    if let Some(asset) = Asset::from_wire(map)? {
        return Ok(ArchiveMember::Asset(asset));
    }
    if let Some(archive) = Archive::from_wire(map)? {
        return Ok(ArchiveMember::Archive(archive));
    }
    Err(Error::BadMember(name.to_string()))
}

fn string_field(map: &Map<String, Value>, kind: &'static str, field: &'static str) -> Result<Option<String>> {
    match map.get(field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::NotAString { kind, field }),
    }
}
