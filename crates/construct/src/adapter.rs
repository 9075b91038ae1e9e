//! # Construct Adapter
//!
//! Runs one construct call end to end:
//!
//! 1. **Decode**: build the call context and turn the wire inputs into
//!    `ConstructInput`s. Unknowns are only accepted during a preview.
//! 2. **Rebuild options**: aliases, dependencies, providers, parent, protect.
//! 3. **Invoke** the user's `Constructor`.
//! 4. **Barrier**: wait for every registration the routine issued.
//! 5. **Resolve** the component URN and every state value.
//! 6. **Encode** the state and its sorted, duplicate-free dependencies.
//!
//! Nothing survives the call. Any failure ends it without a response, and
//! registrations still in flight are dropped with it.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::try_join_all;
use output::AnyOutput;
use output::Output;
use propval::MarshalOptions;
use propval::PropertyMap;
use propval::PropertyValue;
use propval::Urn;
use propval::marshal;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use tracing::debug;
use tracing::info;
use tracing::info_span;
use wirerpc::ConstructRequest;
use wirerpc::ConstructResponse;

use crate::bind::ComponentResource;
use crate::bind::ConstructInput;
use crate::bind::ConstructInputs;
use crate::bind::extract_state;
use crate::context::Context;
use crate::context::RunInfo;
use crate::error::Error;
use crate::error::Result;
use crate::monitor::ResourceMonitor;
use crate::options::DependencyResource;
use crate::options::ProviderResource;
use crate::options::ResourceOptions;

/// What a construction routine hands back: the component's identity and the
/// state it exposes.
#[derive(Debug, Clone)]
pub struct ConstructResult {
    pub urn: Output<Urn>,
    pub state: BTreeMap<String, AnyOutput>,
}

/// The URN and tagged state of a component.
pub fn construct_result<C: ComponentResource>(component: &C) -> ConstructResult {
    ConstructResult { urn: component.urn(), state: extract_state(component) }
}

/// A user-supplied construction routine.
#[async_trait::async_trait]
pub trait Constructor: Send + Sync + 'static {
    async fn construct(
        &self,
        ctx: &Context,
        r#type: &str,
        name: &str,
        inputs: ConstructInputs,
        options: ResourceOptions,
    ) -> anyhow::Result<ConstructResult>;
}

/// Runs one construct call.
pub async fn construct(
    req: &ConstructRequest,
    monitor: Arc<dyn ResourceMonitor>,
    cancel: CancellationToken,
    constructor: &dyn Constructor,
) -> Result<ConstructResponse> {
    let span = info_span!("construct", resource_type = %req.r#type, name = %req.name, dry_run = req.dry_run);
    async move {
        info!("construct call started");
        let resp = run(req, monitor, cancel, constructor).await;
        match &resp {
            Ok(resp) => info!(urn = %resp.urn, state = resp.state.len(), "construct call finished"),
            Err(err) => info!(error = %err, "construct call failed"),
        }
        resp
    }
    .instrument(span)
    .await
}

async fn run(
    req: &ConstructRequest,
    monitor: Arc<dyn ResourceMonitor>,
    cancel: CancellationToken,
    constructor: &dyn Constructor,
) -> Result<ConstructResponse> {
    let dry_run = req.dry_run;

    // Fires on every exit, so no registration outlives the call.
    let call = cancel.child_token();
    let _call_guard = call.clone().drop_guard();
    let cancel = call;

    // 1. Decode.
    let info = RunInfo {
        project: req.project.clone(),
        stack: req.stack.clone(),
        config: Arc::new(req.config.clone()),
        parallel: req.parallel,
        dry_run,
        monitor_addr: req.monitor_endpoint.clone(),
    };
    let ctx = Context::new(info, monitor, cancel.clone()).await?;
    let inputs = decode_inputs(req)?;
    debug!(inputs = inputs.len(), "decoded inputs");

    // 2. Rebuild options.
    let options = rebuild_options(req)?;

    // 3. Invoke.
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(Error::Cancelled),
        result = constructor.construct(&ctx, &req.r#type, &req.name, inputs, options) => {
            result.map_err(Error::Routine)?
        }
    };

    // 4. Barrier.
    ctx.wait_for_registrations().await?;
    debug!("registrations complete");

    // 5. Resolve.
    let urn = result
        .urn
        .resolution_or_cancel(&cancel)
        .await
        .map_err(|e| Error::resolving("component urn", e))?
        .value
        .ok_or(Error::UnknownUrn)?;

    let entries = try_join_all(result.state.iter().map(|(key, out)| {
        let cancel = &cancel;
        async move {
            let settled = out
                .settled_or_cancel(cancel)
                .await
                .map_err(|e| Error::resolving(format!("state property '{key}'"), e))?;
            Ok::<_, Error>((key.clone(), settled))
        }
    }))
    .await?;

    let mut state = PropertyMap::new();
    let mut state_dependencies = BTreeMap::new();
    for (key, settled) in entries {
        let value = if settled.secret && !settled.value.is_secret() {
            PropertyValue::secret(settled.value)
        } else {
            settled.value
        };
        state.insert(key.clone(), value);
        state_dependencies.insert(key, sorted_unique(settled.deps));
    }

    // 6. Encode.
    let opts = MarshalOptions {
        label: "state".into(),
        keep_unknowns: dry_run,
        reject_unknowns: !dry_run,
        keep_secrets: true,
        keep_resources: ctx.keep_resources(),
    };
    let state = marshal::marshal_properties(&state, &opts)
        .map_err(|source| Error::Marshal { what: "state".into(), source })?;

    Ok(ConstructResponse { urn: urn.into_string(), state, state_dependencies })
}

fn decode_inputs(req: &ConstructRequest) -> Result<ConstructInputs> {
    let opts = MarshalOptions {
        label: "inputs".into(),
        keep_unknowns: req.dry_run,
        reject_unknowns: !req.dry_run,
        keep_secrets: true,
        keep_resources: true,
    };
    let props = marshal::unmarshal_properties(&req.inputs, &opts)
        .map_err(|source| Error::Unmarshal { what: "inputs".into(), source })?;

    let mut inputs = BTreeMap::new();
    for (key, value) in props {
        let deps = req
            .input_dependencies
            .get(&key)
            .map(|urns| urns.iter().map(|u| Urn::from(u.as_str())).collect())
            .unwrap_or_default();
        let (value, secret) = value.unwrap_secret();
        inputs.insert(key, ConstructInput { value, secret, deps });
    }
    Ok(ConstructInputs::new(inputs))
}

fn rebuild_options(req: &ConstructRequest) -> Result<ResourceOptions> {
    let mut providers = BTreeMap::new();
    for (package, reference) in &req.providers {
        providers.insert(package.clone(), ProviderResource::parse(package.clone(), reference)?);
    }
    Ok(ResourceOptions {
        aliases: req.aliases.iter().map(|u| Urn::from(u.as_str())).collect(),
        depends_on: req.dependencies.iter().map(|u| DependencyResource::new(Urn::from(u.as_str()))).collect(),
        protect: req.protect,
        providers,
        parent: (!req.parent.is_empty()).then(|| DependencyResource::new(Urn::from(req.parent.as_str()))),
    })
}

/// Sorts `urns` and drops adjacent duplicates in one pass.
pub fn sorted_unique(mut urns: Vec<Urn>) -> Vec<String> {
    urns.sort();
    let mut out: Vec<String> = Vec::with_capacity(urns.len());
    for urn in urns {
        if out.last().map(String::as_str) == Some(urn.as_str()) {
            continue;
        }
        out.push(urn.into_string());
    }
    out
}
