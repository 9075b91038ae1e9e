//! # Provider Server
//!
//! Answers RPC frames on behalf of a `Constructor`.
//!
//! ## Dispatch
//!
//! - `Call("Construct")`: decode the request, run the adapter under a
//!   call-scoped cancellation token and reply with the response or the reason
//!   the call failed.
//! - `Call(other)`: `MethodNotFound`.
//! - `Cancel{seq}`: cancel the in-flight call with that sequence number and
//!   acknowledge with an empty `Ok`. Unknown sequence numbers are acknowledged
//!   too; the call may already have finished.
//! - `Reply`: a provider never issues calls, so this is a protocol violation.
//!
//! Frames that cannot be decoded are answered with `ProtocolViolation` when
//! their sequence number can still be read, and fail the transport otherwise.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;
use wirepack::Decoder;
use wirerpc::CONSTRUCT_METHOD;
use wirerpc::ConstructRequest;
use wirerpc::FailureReason;
use wirerpc::Message;
use wirerpc::ReplyErrEncoder;
use wirerpc::ReplyOkEncoder;
use wirerpc::RpcFrame;

use crate::adapter::Constructor;
use crate::adapter::construct;
use crate::error::Error;
use crate::monitor::ResourceMonitor;
use crate::transport;
use crate::transport::Transport;
use crate::transport::TransportError;

pub struct ProviderServer {
    constructor: Arc<dyn Constructor>,
    monitor: Arc<dyn ResourceMonitor>,
    inflight: DashMap<u64, CancellationToken>,
    shutdown: CancellationToken,
}

impl ProviderServer {
    pub fn new(constructor: Arc<dyn Constructor>, monitor: Arc<dyn ResourceMonitor>) -> Self {
        Self { constructor, monitor, inflight: DashMap::new(), shutdown: CancellationToken::new() }
    }

    /// Number of construct calls currently running.
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    /// Cancels every running call. Later calls are cancelled on arrival.
    pub fn shutdown(&self) {
        debug!(in_flight = self.in_flight(), "provider shutting down");
        self.shutdown.cancel();
    }

    /// Handles one inbound frame and returns the encoded reply.
    pub async fn handle_rpc(&self, payload: &[u8]) -> transport::Result<Vec<u8>> {
        let mut dec = Decoder::new(payload);
        let frame = match RpcFrame::decode(&mut dec) {
            Ok(frame) => frame,
            Err(err) => {
                let seq = wirerpc::decode_seq(payload).map_err(|_| TransportError::Io(err.to_string()))?;
                warn!(seq, error = %err, "undecodable frame");
                return reply_err(seq, FailureReason::ProtocolViolation(err.to_string()));
            }
        };

        match frame {
            RpcFrame::Call(call) => {
                let seq = call.seq;
                if call.method != CONSTRUCT_METHOD {
                    debug!(seq, method = call.method, "unknown method");
                    return reply_err(seq, FailureReason::MethodNotFound(call.method.to_string()));
                }
                match ConstructRequest::decode(call.body) {
                    Ok(req) => self.serve_construct(seq, req).await,
                    Err(err) => {
                        warn!(seq, error = %err, "undecodable construct request");
                        reply_err(seq, FailureReason::ProtocolViolation(err.to_string()))
                    }
                }
            }
            RpcFrame::Cancel { seq } => {
                match self.inflight.get(&seq) {
                    Some(token) => {
                        debug!(seq, "cancelling call");
                        token.cancel();
                    }
                    None => debug!(seq, "cancel for a call that is not running"),
                }
                reply_ok(seq, &())
            }
            RpcFrame::Reply(reply) => {
                reply_err(reply.seq, FailureReason::ProtocolViolation("provider received a Reply frame".into()))
            }
        }
    }

    async fn serve_construct(&self, seq: u64, req: ConstructRequest) -> transport::Result<Vec<u8>> {
        let token = self.shutdown.child_token();
        match self.inflight.entry(seq) {
            Entry::Occupied(_) => {
                return reply_err(seq, FailureReason::ProtocolViolation(format!("call {seq} is already in flight")));
            }
            Entry::Vacant(slot) => {
                slot.insert(token.clone());
            }
        }
        let _inflight = InflightGuard { map: &self.inflight, seq };

        match construct(&req, self.monitor.clone(), token, self.constructor.as_ref()).await {
            Ok(resp) => reply_ok(seq, &resp),
            Err(Error::Cancelled) => reply_err(seq, FailureReason::Cancelled),
            Err(err) => reply_err(seq, FailureReason::ConstructFailed(err.to_string())),
        }
    }
}

#[async_trait::async_trait]
impl Transport for ProviderServer {
    async fn call(&self, payload: &[u8]) -> transport::Result<Vec<u8>> {
        self.handle_rpc(payload).await
    }
}

/// Removes a call from the in-flight table when its future ends or is dropped.
struct InflightGuard<'a> {
    map: &'a DashMap<u64, CancellationToken>,
    seq: u64,
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.map.remove(&self.seq);
    }
}

fn reply_ok<M: Message>(seq: u64, body: &M) -> transport::Result<Vec<u8>> {
    ReplyOkEncoder::new(seq, body).into_bytes().map_err(|e| TransportError::Io(e.to_string()))
}

fn reply_err(seq: u64, reason: FailureReason) -> transport::Result<Vec<u8>> {
    ReplyErrEncoder::new(seq, reason).into_bytes().map_err(|e| TransportError::Io(e.to_string()))
}
