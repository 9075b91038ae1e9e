//! # Error Definitions
//!
//! Contract violations (a value or record that should never have reached the
//! codec) are kept apart from I/O and parse failures.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A resource reached the serializer before a URN was assigned.
    #[error("resource of type '{0}' has an empty urn")]
    EmptyUrn(String),
    /// A computed value reached the serializer.
    #[error("computed value at '{0}' cannot be persisted")]
    ComputedValue(String),
    /// A stored value has a shape the codec does not produce.
    #[error("unrecognized value at '{path}': {reason}")]
    UnrecognizedValue { path: String, reason: String },
    #[error("malformed asset at '{path}': {source}")]
    Asset { path: String, source: propval::asset::Error },
    #[error("malformed resource reference at '{path}': {source}")]
    Reference { path: String, source: propval::marshal::Error },
    #[error("invalid checkpoint json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("checkpoint file {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}

impl Error {
    /// True for errors that mean an upstream stage broke its contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::EmptyUrn(_) | Self::ComputedValue(_) | Self::UnrecognizedValue { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
