//! Resource records.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use tracing::error;

use propval::Id;
use propval::PropertyMap;
use propval::Urn;

use crate::codec::deserialize_properties;
use crate::codec::serialize_properties;
use crate::error::Error;
use crate::error::Result;

/// A resource as the engine holds it in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    pub r#type: String,
    pub urn: Urn,
    /// Managed by a provider plugin rather than composed from children.
    pub custom: bool,
    /// Scheduled for deletion in the next update.
    pub delete: bool,
    pub id: Option<Id>,
    pub inputs: Option<PropertyMap>,
    pub defaults: Option<PropertyMap>,
    pub outputs: Option<PropertyMap>,
    pub children: Vec<Urn>,
}

/// A resource as it is written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub urn: Urn,
    pub custom: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub delete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[serde(rename = "type")]
    pub r#type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Urn>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

pub fn serialize_resource(state: &State) -> Result<Resource> {
    if state.urn.is_empty() {
        error!(resource_type = %state.r#type, "resource reached the serializer without a urn");
        return Err(Error::EmptyUrn(state.r#type.clone()));
    }

    let bag = |props: &Option<PropertyMap>| props.as_ref().map(serialize_properties).transpose();

    let mut children = state.children.clone();
    children.sort();

    Ok(Resource {
        urn: state.urn.clone(),
        custom: state.custom,
        delete: state.delete,
        id: state.id.clone(),
        r#type: state.r#type.clone(),
        inputs: bag(&state.inputs)?,
        defaults: bag(&state.defaults)?,
        outputs: bag(&state.outputs)?,
        children,
    })
}

pub fn deserialize_resource(res: &Resource) -> Result<State> {
    let bag = |props: &Option<Map<String, Value>>| props.as_ref().map(deserialize_properties).transpose();

    Ok(State {
        r#type: res.r#type.clone(),
        urn: res.urn.clone(),
        custom: res.custom,
        delete: res.delete,
        id: res.id.clone(),
        inputs: bag(&res.inputs)?,
        defaults: bag(&res.defaults)?,
        outputs: bag(&res.outputs)?,
        children: res.children.clone(),
    })
}
