//! Deployment records: a timestamped, ordered list of resources.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::resource::Resource;
use crate::resource::State;
use crate::resource::deserialize_resource;
use crate::resource::serialize_resource;

/// All resources of a stack at a point in time, in dependency order.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub time: DateTime<Utc>,
    /// Opaque information about the source of the deployment.
    pub info: Option<Value>,
    pub resources: Vec<State>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
    /// Always written, even when empty.
    #[serde(default)]
    pub resources: Vec<Resource>,
}

pub fn serialize_deployment(snap: &Snapshot) -> Result<Deployment> {
    let resources = snap.resources.iter().map(serialize_resource).collect::<Result<Vec<_>>>()?;
    debug!(resources = resources.len(), "serialized deployment");
    Ok(Deployment { time: snap.time, info: snap.info.clone(), resources })
}

pub fn deserialize_deployment(dep: &Deployment) -> Result<Snapshot> {
    let resources = dep.resources.iter().map(deserialize_resource).collect::<Result<Vec<_>>>()?;
    debug!(resources = resources.len(), "deserialized deployment");
    Ok(Snapshot { time: dep.time, info: dep.info.clone(), resources })
}
