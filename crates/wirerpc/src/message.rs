//! # Construct Messages
//!
//! The bodies carried by `Construct` calls and their replies. Every message is
//! a Map keyed by camelCase field name. Absent fields take their zero value,
//! except `type` and `name` which a construct request cannot do without.

use std::collections::BTreeMap;

use serde_json::Map;
use serde_json::Value;
use wirepack::Decoder;
use wirepack::Encoder;

use crate::error::Error;
use crate::error::Result;

/// A body that can ride inside a Call or Reply frame.
pub trait Message: Sized {
    fn encode(&self, enc: &mut Encoder) -> Result<()>;
    fn decode(dec: Decoder) -> Result<Self>;
}

/// Acknowledgement body: a bare null.
impl Message for () {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        Ok(enc.null()?)
    }

    fn decode(mut dec: Decoder) -> Result<Self> {
        Ok(dec.null()?)
    }
}

/// A request to construct a component resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstructRequest {
    pub project: String,
    pub stack: String,
    pub config: BTreeMap<String, String>,
    pub parallel: u32,
    pub dry_run: bool,
    pub monitor_endpoint: String,
    pub r#type: String,
    pub name: String,
    /// Marshaled input properties.
    pub inputs: Map<String, Value>,
    /// Per-input dependency URNs.
    pub input_dependencies: BTreeMap<String, Vec<String>>,
    pub aliases: Vec<String>,
    pub dependencies: Vec<String>,
    /// Package name to provider reference (`<urn>::<id>`).
    pub providers: BTreeMap<String, String>,
    /// Parent URN; empty when the component has no parent.
    pub parent: String,
    pub protect: bool,
}

impl Message for ConstructRequest {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.map_begin()?;
        write_str(enc, "project", &self.project)?;
        write_str(enc, "stack", &self.stack)?;
        write_str_map(enc, "config", &self.config)?;
        enc.variant_begin("parallel")?;
        enc.u64(u64::from(self.parallel))?;
        enc.variant_end()?;
        enc.variant_begin("dryRun")?;
        enc.bool(self.dry_run)?;
        enc.variant_end()?;
        write_str(enc, "monitorEndpoint", &self.monitor_endpoint)?;
        write_str(enc, "type", &self.r#type)?;
        write_str(enc, "name", &self.name)?;
        write_struct(enc, "inputs", &self.inputs)?;
        write_list_map(enc, "inputDependencies", &self.input_dependencies)?;
        write_str_list(enc, "aliases", &self.aliases)?;
        write_str_list(enc, "dependencies", &self.dependencies)?;
        write_str_map(enc, "providers", &self.providers)?;
        write_str(enc, "parent", &self.parent)?;
        enc.variant_begin("protect")?;
        enc.bool(self.protect)?;
        enc.variant_end()?;
        enc.map_end()?;
        Ok(())
    }

    fn decode(mut dec: Decoder) -> Result<Self> {
        let mut req = ConstructRequest::default();
        let mut has_type = false;
        let mut has_name = false;

        let mut map = dec.map()?;
        while let Some((key, mut val)) = map.next()? {
            match key {
                "project" => req.project = val.str()?.to_string(),
                "stack" => req.stack = val.str()?.to_string(),
                "config" => req.config = read_str_map(&mut val)?,
                "parallel" => {
                    let raw = val.u64()?;
                    req.parallel = u32::try_from(raw).map_err(|_| Error::TypeMismatch {
                        field: "parallel".into(),
                        expected: "u32",
                    })?;
                }
                "dryRun" => req.dry_run = val.bool()?,
                "monitorEndpoint" => req.monitor_endpoint = val.str()?.to_string(),
                "type" => {
                    req.r#type = val.str()?.to_string();
                    has_type = true;
                }
                "name" => {
                    req.name = val.str()?.to_string();
                    has_name = true;
                }
                "inputs" => req.inputs = read_struct(&mut val, "inputs")?,
                "inputDependencies" => req.input_dependencies = read_list_map(&mut val)?,
                "aliases" => req.aliases = read_str_list(&mut val)?,
                "dependencies" => req.dependencies = read_str_list(&mut val)?,
                "providers" => req.providers = read_str_map(&mut val)?,
                "parent" => req.parent = val.str()?.to_string(),
                "protect" => req.protect = val.bool()?,
                _ => val.skip()?,
            }
        }

        if !has_type {
            return Err(Error::MissingField("type"));
        }
        if !has_name {
            return Err(Error::MissingField("name"));
        }
        Ok(req)
    }
}

/// The state of a constructed component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstructResponse {
    pub urn: String,
    /// Marshaled output properties.
    pub state: Map<String, Value>,
    /// Per-property dependency URNs, sorted and free of duplicates.
    pub state_dependencies: BTreeMap<String, Vec<String>>,
}

impl Message for ConstructResponse {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.map_begin()?;
        write_str(enc, "urn", &self.urn)?;
        write_struct(enc, "state", &self.state)?;
        write_list_map(enc, "stateDependencies", &self.state_dependencies)?;
        enc.map_end()?;
        Ok(())
    }

    fn decode(mut dec: Decoder) -> Result<Self> {
        let mut resp = ConstructResponse::default();
        let mut map = dec.map()?;
        while let Some((key, mut val)) = map.next()? {
            match key {
                "urn" => resp.urn = val.str()?.to_string(),
                "state" => resp.state = read_struct(&mut val, "state")?,
                "stateDependencies" => resp.state_dependencies = read_list_map(&mut val)?,
                _ => val.skip()?,
            }
        }
        Ok(resp)
    }
}

// ============================================================================
//  FIELD HELPERS
// ============================================================================

fn write_str(enc: &mut Encoder, key: &str, val: &str) -> Result<()> {
    enc.variant_begin(key)?;
    enc.str(val)?;
    enc.variant_end()?;
    Ok(())
}

fn write_str_list(enc: &mut Encoder, key: &str, items: &[String]) -> Result<()> {
    enc.variant_begin(key)?;
    enc.list_begin()?;
    for item in items {
        enc.str(item)?;
    }
    enc.list_end()?;
    enc.variant_end()?;
    Ok(())
}

fn write_str_map(enc: &mut Encoder, key: &str, entries: &BTreeMap<String, String>) -> Result<()> {
    enc.variant_begin(key)?;
    enc.map_begin()?;
    for (k, v) in entries {
        write_str(enc, k, v)?;
    }
    enc.map_end()?;
    enc.variant_end()?;
    Ok(())
}

fn write_list_map(enc: &mut Encoder, key: &str, entries: &BTreeMap<String, Vec<String>>) -> Result<()> {
    enc.variant_begin(key)?;
    enc.map_begin()?;
    for (k, v) in entries {
        write_str_list(enc, k, v)?;
    }
    enc.map_end()?;
    enc.variant_end()?;
    Ok(())
}

fn write_struct(enc: &mut Encoder, key: &str, fields: &Map<String, Value>) -> Result<()> {
    enc.variant_begin(key)?;
    enc.map_begin()?;
    for (k, v) in fields {
        enc.variant_begin(k)?;
        wirepack::encode_value(enc, v)?;
        enc.variant_end()?;
    }
    enc.map_end()?;
    enc.variant_end()?;
    Ok(())
}

fn read_str_list(dec: &mut Decoder) -> Result<Vec<String>> {
    let mut iter = dec.list()?;
    let mut out = Vec::new();
    while let Some(mut item) = iter.next()? {
        out.push(item.str()?.to_string());
    }
    Ok(out)
}

fn read_str_map(dec: &mut Decoder) -> Result<BTreeMap<String, String>> {
    let mut iter = dec.map()?;
    let mut out = BTreeMap::new();
    while let Some((k, mut v)) = iter.next()? {
        out.insert(k.to_string(), v.str()?.to_string());
    }
    Ok(out)
}

fn read_list_map(dec: &mut Decoder) -> Result<BTreeMap<String, Vec<String>>> {
    let mut iter = dec.map()?;
    let mut out = BTreeMap::new();
    while let Some((k, mut v)) = iter.next()? {
        out.insert(k.to_string(), read_str_list(&mut v)?);
    }
    Ok(out)
}

fn read_struct(dec: &mut Decoder, field: &str) -> Result<Map<String, Value>> {
    match wirepack::decode_value(dec)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(Error::TypeMismatch { field: field.to_string(), expected: "struct" }),
    }
}
