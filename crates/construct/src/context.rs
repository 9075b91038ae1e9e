//! # Call Context
//!
//! Everything a construction routine can reach during one construct call: the
//! run's configuration, the resource monitor, and the call's task group.
//!
//! ## Philosophy
//!
//! - **Call-Scoped**: A context is created per call and dropped with it. Two
//!   concurrent calls never share a task group or a cancellation token.
//! - **Non-Blocking Registration**: `register_*` returns handles immediately and
//!   performs the monitor call on the task group. Handles' outputs resolve when
//!   the monitor answers, or fail with the registration's error.

use std::collections::BTreeMap;
use std::sync::Arc;

use output::AnyOutput;
use output::Output;
use propval::Id;
use propval::PropertyMap;
use propval::PropertyValue;
use propval::Urn;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use crate::config::Config;
use crate::error::Error;
use crate::error::Result;
use crate::group::TaskGroup;
use crate::monitor;
use crate::monitor::RegisterResourceRequest;
use crate::monitor::ResourceMonitor;
use crate::options::ResourceOptions;

/// Call-scoped run configuration, decoded from the construct request.
#[derive(Debug, Clone, Default)]
pub struct RunInfo {
    pub project: String,
    pub stack: String,
    pub config: Arc<BTreeMap<String, String>>,
    pub parallel: u32,
    pub dry_run: bool,
    pub monitor_addr: String,
}

/// Outputs of a registered resource.
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    pub urn: Output<Urn>,
    /// Unknown for components and for custom resources during a preview.
    pub id: Output<Id>,
    /// The full output object.
    pub outputs: AnyOutput,
}

impl ResourceHandle {
    fn pending() -> Self {
        Self { urn: Output::new(Vec::new()), id: Output::new(Vec::new()), outputs: Output::new(Vec::new()) }
    }

    fn fail(&self, err: &Error) {
        let failure = match err {
            Error::Cancelled => output::Error::Cancelled,
            err => output::Error::Failed(err.to_string()),
        };
        self.reject(failure);
    }

    /// Rejects whatever is still pending. Settled outputs are left alone.
    fn reject(&self, failure: output::Error) {
        self.urn.reject(failure.clone());
        self.id.reject(failure.clone());
        self.outputs.reject(failure);
    }

    /// One output property. A missing property resolves to null.
    pub fn output(&self, name: &str) -> AnyOutput {
        let name = name.to_string();
        self.outputs.apply(move |value| match value {
            PropertyValue::Object(mut map) => map.remove(&name).unwrap_or_default(),
            _ => PropertyValue::Null,
        })
    }
}

#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    info: RunInfo,
    monitor: Arc<dyn ResourceMonitor>,
    tasks: TaskGroup,
    cancel: CancellationToken,
    keep_resources: bool,
}

impl Context {
    /// Creates the context for one call, asking the monitor which features it supports.
    pub async fn new(info: RunInfo, monitor: Arc<dyn ResourceMonitor>, cancel: CancellationToken) -> Result<Self> {
        let keep_resources = monitor.supports_feature(monitor::RESOURCE_REFERENCES).await?;
        debug!(project = %info.project, stack = %info.stack, keep_resources, "created call context");
        Ok(Self {
            inner: Arc::new(ContextInner {
                tasks: TaskGroup::new(cancel.clone()),
                info,
                monitor,
                cancel,
                keep_resources,
            }),
        })
    }

    pub fn info(&self) -> &RunInfo {
        &self.inner.info
    }

    pub fn project(&self) -> &str {
        &self.inner.info.project
    }

    pub fn stack(&self) -> &str {
        &self.inner.info.stack
    }

    pub fn dry_run(&self) -> bool {
        self.inner.info.dry_run
    }

    /// Whether the monitor accepts resource references in property values.
    pub fn keep_resources(&self) -> bool {
        self.inner.keep_resources
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.inner.cancel
    }

    /// Configuration in the project's namespace.
    pub fn config(&self) -> Config {
        self.config_in(&self.inner.info.project)
    }

    pub fn config_in(&self, namespace: &str) -> Config {
        Config::new(namespace, self.inner.info.config.clone())
    }

    /// Registers a provider-managed resource.
    pub fn register_resource(
        &self,
        r#type: &str,
        name: &str,
        inputs: BTreeMap<String, AnyOutput>,
        opts: &ResourceOptions,
    ) -> Result<ResourceHandle> {
        self.register(r#type, name, true, inputs, opts)
    }

    /// Registers a component resource whose children are registered by the caller.
    pub fn register_component_resource(&self, r#type: &str, name: &str, opts: &ResourceOptions) -> Result<ResourceHandle> {
        self.register(r#type, name, false, BTreeMap::new(), opts)
    }

    /// Records a component's final outputs once `urn` and every output resolve.
    pub fn register_resource_outputs(&self, urn: &Output<Urn>, outputs: BTreeMap<String, AnyOutput>) -> Result<()> {
        let urn = urn.clone();
        let ctx = self.clone();
        self.inner.tasks.spawn(async move {
            let cancel = ctx.cancellation();
            let urn = urn
                .resolution_or_cancel(cancel)
                .await
                .map_err(|e| Error::resolving("component urn", e))?
                .value
                .ok_or(Error::UnknownUrn)?;
            let (props, _) = resolve_inputs(&outputs, cancel).await?;
            debug!(%urn, outputs = props.len(), "registering resource outputs");
            ctx.inner.monitor.register_resource_outputs(urn, props).await?;
            Ok(())
        })
    }

    /// Waits for every registration this call has issued and closes the call
    /// to further registrations.
    pub async fn wait_for_registrations(&self) -> Result<()> {
        self.inner.tasks.join().await
    }

    fn register(
        &self,
        r#type: &str,
        name: &str,
        custom: bool,
        inputs: BTreeMap<String, AnyOutput>,
        opts: &ResourceOptions,
    ) -> Result<ResourceHandle> {
        let handle = ResourceHandle::pending();
        let pending = PendingHandle(handle.clone());
        let ctx = self.clone();
        let r#type = r#type.to_string();
        let name = name.to_string();
        let opts = opts.clone();

        self.inner.tasks.spawn(async move {
            let outcome = ctx.register_now(r#type, name, custom, inputs, opts).await;
            let task_handle = &pending.0;
            match outcome {
                Ok(resp) => {
                    let deps = vec![resp.urn.clone()];
                    task_handle.urn.resolve(PropertyValue::String(resp.urn.to_string()), true, false, deps.clone());
                    match resp.id {
                        Some(id) if !id.is_empty() => task_handle.id.resolve(id.into_string().into(), true, false, deps.clone()),
                        _ => task_handle.id.resolve(PropertyValue::Computed, false, false, deps.clone()),
                    };
                    task_handle.outputs.resolve(PropertyValue::Object(resp.object), true, false, deps);
                    Ok(())
                }
                Err(err) => {
                    warn!(error = %err, "resource registration failed");
                    task_handle.fail(&err);
                    Err(err)
                }
            }
        })?;
        Ok(handle)
    }

    async fn register_now(
        &self,
        r#type: String,
        name: String,
        custom: bool,
        inputs: BTreeMap<String, AnyOutput>,
        opts: ResourceOptions,
    ) -> Result<monitor::RegisterResourceResponse> {
        let cancel = self.cancellation();

        let parent = match &opts.parent {
            Some(parent) => Some(
                parent
                    .urn
                    .resolution_or_cancel(cancel)
                    .await
                    .map_err(|e| Error::resolving("parent urn", e))?
                    .value
                    .ok_or(Error::UnknownUrn)?,
            ),
            None => None,
        };

        let mut dependencies = Vec::new();
        for dep in &opts.depends_on {
            let resolved = dep.urn.resolution_or_cancel(cancel).await.map_err(|e| Error::resolving("dependency urn", e))?;
            dependencies.extend(resolved.value);
        }

        let (object, property_dependencies) = resolve_inputs(&inputs, cancel).await?;
        for deps in property_dependencies.values() {
            dependencies.extend(deps.iter().cloned());
        }
        dependencies.sort();
        dependencies.dedup();

        let req = RegisterResourceRequest {
            provider: opts.provider_for(&r#type).map(|p| p.reference()),
            r#type,
            name,
            custom,
            parent,
            object,
            property_dependencies,
            dependencies,
            protect: opts.protect,
            aliases: opts.aliases,
        };
        debug!(resource_type = %req.r#type, name = %req.name, custom, "registering resource");
        Ok(self.inner.monitor.register_resource(req).await?)
    }
}

/// A registration's handle, rejected with `Cancelled` if the registration task
/// is dropped before it settles the outputs.
struct PendingHandle(ResourceHandle);

impl Drop for PendingHandle {
    fn drop(&mut self) {
        self.0.reject(output::Error::Cancelled);
    }
}

/// Awaits a bag of outputs into a property map plus per-property dependencies.
///
/// Unknown values become `Computed`; secret values are wrapped.
pub(crate) async fn resolve_inputs(
    inputs: &BTreeMap<String, AnyOutput>,
    cancel: &CancellationToken,
) -> Result<(PropertyMap, BTreeMap<String, Vec<Urn>>)> {
    let mut props = PropertyMap::new();
    let mut deps = BTreeMap::new();
    for (key, out) in inputs {
        let settled = out.settled_or_cancel(cancel).await.map_err(|e| Error::resolving(format!("property '{key}'"), e))?;
        let value = if settled.secret && !settled.value.is_secret() {
            PropertyValue::secret(settled.value)
        } else {
            settled.value
        };
        props.insert(key.clone(), value);
        deps.insert(key.clone(), settled.deps);
    }
    Ok((props, deps))
}
