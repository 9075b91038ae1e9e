//! # Resource Monitor
//!
//! The engine-side service that records resource registrations. The adapter
//! only talks to it through this trait; connecting to a real engine is the
//! embedding process's job.

use std::collections::BTreeMap;

use propval::Id;
use propval::PropertyMap;
use propval::Urn;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonitorError {
    /// The monitor could not be reached.
    #[error("monitor unavailable: {0}")]
    Unavailable(String),
    /// The monitor refused the registration.
    #[error("registration rejected: {0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, MonitorError>;

/// Feature name the monitor reports when it accepts resource references.
pub const RESOURCE_REFERENCES: &str = "resourceReferences";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterResourceRequest {
    pub r#type: String,
    pub name: String,
    pub custom: bool,
    pub parent: Option<Urn>,
    /// Input properties. Unknown inputs are `Computed`; secret inputs are wrapped.
    pub object: PropertyMap,
    pub property_dependencies: BTreeMap<String, Vec<Urn>>,
    /// Explicit dependencies plus every input's dependencies.
    pub dependencies: Vec<Urn>,
    pub protect: bool,
    /// Provider reference (`<urn>::<id>`) for the resource's package, if one was given.
    pub provider: Option<String>,
    pub aliases: Vec<Urn>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterResourceResponse {
    pub urn: Urn,
    /// Empty for component resources and for custom resources during a preview.
    pub id: Option<Id>,
    pub object: PropertyMap,
}

/// An object-safe handle to the engine's resource monitor.
#[async_trait::async_trait]
pub trait ResourceMonitor: Send + Sync + 'static {
    async fn register_resource(&self, req: RegisterResourceRequest) -> Result<RegisterResourceResponse>;

    /// Records the final outputs of a component resource.
    async fn register_resource_outputs(&self, urn: Urn, outputs: PropertyMap) -> Result<()>;

    async fn supports_feature(&self, _feature: &str) -> Result<bool> {
        Ok(false)
    }
}
