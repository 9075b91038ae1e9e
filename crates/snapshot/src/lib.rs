//! # Snapshot
//!
//! The persisted record of a deployment: every resource and its property state
//! at a point in time.
//!
//! ## Architecture
//!
//! - **Codec** (`codec`): `PropertyValue` to and from the JSON tree stored on disk.
//! - **Resource** (`resource`): one resource record (`State` in memory, `Resource` on disk).
//! - **Deployment** (`deployment`): the ordered resource list plus time and info.
//! - **Checkpoint** (`checkpoint`): the file that wraps the latest deployment of a stack.
//!
//! ## Invariants
//! - Resource order is whatever the caller supplied. This crate never sorts resources.
//! - Children are always written in lexicographic order.
//! - Absent property bags stay absent; empty ones stay empty.

pub mod checkpoint;
pub mod codec;
pub mod deployment;
pub mod error;
pub mod resource;

#[cfg(test)]
mod tests;

pub use checkpoint::Checkpoint;
pub use checkpoint::read_checkpoint;
pub use checkpoint::write_checkpoint;
pub use codec::deserialize_properties;
pub use codec::deserialize_property_value;
pub use codec::serialize_properties;
pub use codec::serialize_property_value;
pub use deployment::Deployment;
pub use deployment::Snapshot;
pub use deployment::deserialize_deployment;
pub use deployment::serialize_deployment;
pub use error::Error;
pub use error::Result;
pub use resource::Resource;
pub use resource::State;
pub use resource::deserialize_resource;
pub use resource::serialize_resource;
