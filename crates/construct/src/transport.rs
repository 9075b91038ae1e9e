//! # Transport Abstraction
//!
//! A minimal, async interface for moving bytes between a runtime and a provider.
//!
//! ## Philosophy
//!
//! - **Byte-Oriented**: The transport knows nothing about frames or messages.
//!   It moves opaque buffers.
//! - **Request-Response**: Send bytes, await bytes. Cancellation is itself a
//!   request carrying a `Cancel` frame.

/// Errors that occur at the network/transport layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The peer is unreachable or the connection was dropped.
    #[error("connection lost: {0}")]
    ConnectionLost(String),
    /// The payload could not be handled at all.
    #[error("transport i/o error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// A mechanism to send a byte buffer and receive a reply.
///
/// Object-safe, so it can be shared as `Arc<dyn Transport>`.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends a payload and waits for the raw reply bytes.
    async fn call(&self, payload: &[u8]) -> Result<Vec<u8>>;
}
