//! # Provider Client
//!
//! Issues construct calls over a `Transport` and checks the replies.
//!
//! ## Invariants
//!
//! - Reply sequence numbers must match call sequence numbers.
//! - Only Reply frames are accepted; anything else is a protocol violation.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use tracing::debug;
use wirepack::Decoder;
use wirerpc::CONSTRUCT_METHOD;
use wirerpc::CallEncoder;
use wirerpc::CancelEncoder;
use wirerpc::ConstructRequest;
use wirerpc::ConstructResponse;
use wirerpc::FailureReason;
use wirerpc::Message;
use wirerpc::RpcFrame;

use crate::transport::Transport;
use crate::transport::TransportError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// Transport failure (disconnect, unusable payload).
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    /// Malformed frames or bodies.
    #[error("rpc protocol error: {0}")]
    Rpc(#[from] wirerpc::Error),
    /// The provider answered with a failure.
    #[error("remote failure: {0}")]
    Remote(FailureReason),
    #[error("sequence mismatch: sent {sent}, received {received}")]
    SequenceMismatch { sent: u64, received: u64 },
}

pub type Result<T> = std::result::Result<T, ClientError>;

pub struct ProviderClient {
    transport: Arc<dyn Transport>,
    seq_gen: AtomicU64,
}

impl ProviderClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport, seq_gen: AtomicU64::new(1) }
    }

    /// A fresh sequence number for the next call.
    pub fn next_seq(&self) -> u64 {
        self.seq_gen.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn construct(&self, req: &ConstructRequest) -> Result<ConstructResponse> {
        self.construct_as(self.next_seq(), req).await
    }

    /// Issues a construct call under a caller-chosen sequence number, so that
    /// it can be cancelled from elsewhere with `cancel(seq)`.
    pub async fn construct_as(&self, seq: u64, req: &ConstructRequest) -> Result<ConstructResponse> {
        debug!(seq, resource_type = %req.r#type, name = %req.name, "sending construct call");
        let payload = CallEncoder::new(seq, CONSTRUCT_METHOD, req).into_bytes()?;
        self.invoke(seq, &payload).await
    }

    /// Asks the provider to cancel the call with sequence number `seq`.
    pub async fn cancel(&self, seq: u64) -> Result<()> {
        debug!(seq, "sending cancel");
        let payload = CancelEncoder::new(seq).into_bytes()?;
        self.invoke(seq, &payload).await
    }

    async fn invoke<M: Message>(&self, seq: u64, payload: &[u8]) -> Result<M> {
        let response = self.transport.call(payload).await?;

        let mut dec = Decoder::new(&response);
        match RpcFrame::decode(&mut dec)? {
            RpcFrame::Reply(reply) => {
                if reply.seq != seq {
                    return Err(ClientError::SequenceMismatch { sent: seq, received: reply.seq });
                }
                match reply.status {
                    Ok(body) => Ok(M::decode(body)?),
                    Err(reason) => Err(ClientError::Remote(reason)),
                }
            }
            RpcFrame::Call(_) | RpcFrame::Cancel { .. } => Err(ClientError::Rpc(wirerpc::Error::ProtocolViolation(
                "received a non-Reply frame while waiting for a Reply".into(),
            ))),
        }
    }
}
