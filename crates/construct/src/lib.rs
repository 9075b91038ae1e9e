//! # Construct
//!
//! Serves component construction over RPC. A host asks a provider to build a
//! component; the provider runs a user routine that registers child
//! resources, then answers with the component's URN and state.
//!
//! ## Architecture
//!
//! - **Adapter** (`adapter`): one call end to end, from wire request to wire response.
//! - **Context** (`context`): what a routine can reach during a call, including registration.
//! - **Task Group** (`group`): the per-call barrier every registration joins.
//! - **Binding** (`bind`): construct inputs onto args structs, component fields back out as state.
//! - **Options** (`options`): aliases, dependencies, providers and parent for a resource.
//! - **Config** (`config`): typed, namespaced access to the run's configuration.
//! - **Monitor** (`monitor`): the resource monitor the call registers against.
//! - **Provider / Client** (`provider`, `client`): the RPC surface on both ends of a `Transport`.
//!
//! ## Invariants
//! - Every registration a routine issues completes before state is read.
//! - A call is all-or-nothing: it produces a full response or an error, never both.
//! - Nothing survives a call. Concurrent calls share no state.

pub mod adapter;
pub mod bind;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod group;
pub mod monitor;
pub mod options;
pub mod provider;
pub mod transport;


pub use adapter::ConstructResult;
pub use adapter::Constructor;
pub use adapter::construct;
pub use adapter::construct_result;
pub use bind::ComponentResource;
pub use bind::ConstructInput;
pub use bind::ConstructInputs;
pub use bind::Field;
pub use bind::Fields;
pub use bind::InputField;
pub use bind::extract_state;
pub use client::ClientError;
pub use client::ProviderClient;
pub use config::Config;
pub use config::ConfigError;
pub use context::Context;
pub use context::ResourceHandle;
pub use context::RunInfo;
pub use error::Error;
pub use error::Result;
pub use monitor::MonitorError;
pub use monitor::RegisterResourceRequest;
pub use monitor::RegisterResourceResponse;
pub use monitor::ResourceMonitor;
pub use options::DependencyResource;
pub use options::ProviderResource;
pub use options::ResourceOptions;
pub use provider::ProviderServer;
pub use transport::Transport;
pub use transport::TransportError;
