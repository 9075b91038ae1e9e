//! # Error Definitions
//!
//! Every way a construct call can fail. A call is all-or-nothing: any of these
//! ends it without a response.

use propval::marshal;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Wire values could not be turned into property values.
    #[error("unmarshaling {what}: {source}")]
    Unmarshal { what: String, source: marshal::Error },
    /// Property values could not be turned into wire values.
    #[error("marshaling {what}: {source}")]
    Marshal { what: String, source: marshal::Error },
    /// A provider reference had no `::` separator.
    #[error("expected '::' in provider reference '{0}'")]
    ProviderReference(String),
    /// The user construction routine returned an error.
    #[error("construct routine failed: {0:#}")]
    Routine(anyhow::Error),
    /// A resource monitor call failed.
    #[error("monitor: {0}")]
    Monitor(#[from] crate::monitor::MonitorError),
    /// A spawned registration task panicked or was aborted.
    #[error("registration task did not finish: {0}")]
    TaskFailed(String),
    /// An output the call depends on failed or could not be viewed as needed.
    #[error("resolving {what}: {source}")]
    Resolve { what: String, source: output::Error },
    /// The component's URN resolved as unknown.
    #[error("component urn is unknown")]
    UnknownUrn,
    /// A registration was issued after the call's barrier.
    #[error("registrations are closed for this call")]
    GroupClosed,
    /// The owning call was cancelled.
    #[error("call cancelled")]
    Cancelled,
}

impl Error {
    /// Wraps an output failure, keeping cancellation distinct.
    pub fn resolving(what: impl Into<String>, source: output::Error) -> Self {
        match source {
            output::Error::Cancelled => Error::Cancelled,
            source => Error::Resolve { what: what.into(), source },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
