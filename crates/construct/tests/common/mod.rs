//! Shared fixtures for the construct integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::time::Duration;

use futures::future::BoxFuture;
use propval::Id;
use propval::PropertyMap;
use propval::Urn;
use wirerpc::ConstructRequest;

use construct::ConstructInputs;
use construct::ConstructResult;
use construct::Constructor;
use construct::Context;
use construct::MonitorError;
use construct::RegisterResourceRequest;
use construct::RegisterResourceResponse;
use construct::ResourceMonitor;
use construct::ResourceOptions;
use construct::monitor;

pub const STACK: &str = "dev";
pub const PROJECT: &str = "proj";

/// Routes test output through the test harness. `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn request(ty: &str, name: &str) -> ConstructRequest {
    ConstructRequest {
        project: PROJECT.into(),
        stack: STACK.into(),
        parallel: 4,
        monitor_endpoint: "127.0.0.1:0".into(),
        r#type: ty.into(),
        name: name.into(),
        ..Default::default()
    }
}

pub fn urn_of(parent: Option<&Urn>, ty: &str, name: &str) -> Urn {
    Urn::new(STACK, PROJECT, parent.and_then(|p| p.qualified_type()), ty, name)
}

// ============================================================================
// Resource monitor
// ============================================================================

/// A resource monitor that mints URNs locally and records every call.
///
/// Custom resources echo their inputs back as outputs, plus an `arn` derived
/// from their name.
#[derive(Default)]
pub struct MockMonitor {
    preview: bool,
    resource_references: bool,
    delays: BTreeMap<String, Duration>,
    failures: BTreeSet<String>,
    started: Mutex<Vec<String>>,
    completed: Mutex<Vec<RegisterResourceRequest>>,
    outputs: Mutex<Vec<(Urn, PropertyMap)>>,
}

impl MockMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom resources get no id, as during a preview.
    pub fn preview(mut self) -> Self {
        self.preview = true;
        self
    }

    pub fn with_resource_references(mut self) -> Self {
        self.resource_references = true;
        self
    }

    /// Registrations of `name` take `delay` to complete.
    pub fn with_delay(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self
    }

    /// Registrations of `name` are rejected.
    pub fn failing(mut self, name: &str) -> Self {
        self.failures.insert(name.to_string());
        self
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    /// Completed registrations, in completion order.
    pub fn registrations(&self) -> Vec<RegisterResourceRequest> {
        self.completed.lock().unwrap().clone()
    }

    pub fn registration(&self, name: &str) -> Option<RegisterResourceRequest> {
        self.registrations().into_iter().find(|r| r.name == name)
    }

    pub fn registered_outputs(&self) -> Vec<(Urn, PropertyMap)> {
        self.outputs.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ResourceMonitor for MockMonitor {
    async fn register_resource(&self, req: RegisterResourceRequest) -> monitor::Result<RegisterResourceResponse> {
        self.started.lock().unwrap().push(req.name.clone());
        if let Some(delay) = self.delays.get(&req.name) {
            tokio::time::sleep(*delay).await;
        }
        if self.failures.contains(&req.name) {
            return Err(MonitorError::Rejected(format!("{} is not allowed", req.name)));
        }

        let urn = urn_of(req.parent.as_ref(), &req.r#type, &req.name);
        let (id, object) = if req.custom {
            let mut object = req.object.clone();
            object.insert("arn".into(), format!("arn:{}", req.name).into());
            let id = (!self.preview).then(|| Id::from(format!("{}-id", req.name)));
            (id, object)
        } else {
            (None, PropertyMap::new())
        };

        self.completed.lock().unwrap().push(req);
        Ok(RegisterResourceResponse { urn, id, object })
    }

    async fn register_resource_outputs(&self, urn: Urn, outputs: PropertyMap) -> monitor::Result<()> {
        self.outputs.lock().unwrap().push((urn, outputs));
        Ok(())
    }

    async fn supports_feature(&self, feature: &str) -> monitor::Result<bool> {
        Ok(feature == monitor::RESOURCE_REFERENCES && self.resource_references)
    }
}

// ============================================================================
// Constructors
// ============================================================================

pub type Routine =
    dyn Fn(Context, String, ConstructInputs, ResourceOptions) -> BoxFuture<'static, anyhow::Result<ConstructResult>>
        + Send
        + Sync;

/// A constructor backed by a closure. The closure receives the context, the
/// component name, the inputs and the rebuilt options.
pub struct FnConstructor {
    routine: Box<Routine>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FnConstructor {
    pub fn new<F>(routine: F) -> Self
    where
        F: Fn(Context, String, ConstructInputs, ResourceOptions) -> BoxFuture<'static, anyhow::Result<ConstructResult>>
            + Send
            + Sync
            + 'static,
    {
        Self { routine: Box::new(routine), calls: Mutex::new(Vec::new()) }
    }

    /// `(type, name)` of every invocation.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Constructor for FnConstructor {
    async fn construct(
        &self,
        ctx: &Context,
        r#type: &str,
        name: &str,
        inputs: ConstructInputs,
        options: ResourceOptions,
    ) -> anyhow::Result<ConstructResult> {
        self.calls.lock().unwrap().push((r#type.to_string(), name.to_string()));
        (self.routine)(ctx.clone(), name.to_string(), inputs, options).await
    }
}
