//! The provider's RPC surface, driven through `ProviderClient` and raw frames.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::json;

use construct::ClientError;
use construct::ConstructResult;
use construct::ProviderClient;
use construct::ProviderServer;
use construct::Transport;
use construct::TransportError;
use output::AnyOutput;
use output::Output;
use wirepack::Decoder;
use wirerpc::CallEncoder;
use wirerpc::FailureReason;
use wirerpc::ReplyOkEncoder;
use wirerpc::RpcFrame;

use common::FnConstructor;
use common::MockMonitor;
use common::init_tracing;
use common::request;
use common::urn_of;

const COMPONENT_TYPE: &str = "my:index:Greeting";

/// Answers with `greeting: "hello <name>"`.
fn greeter() -> FnConstructor {
    FnConstructor::new(|ctx, name, _inputs, opts| {
        async move {
            let component = ctx.register_component_resource(COMPONENT_TYPE, &name, &opts)?;
            let mut state = BTreeMap::new();
            state.insert("greeting".to_string(), AnyOutput::resolved(format!("hello {name}").into(), Vec::new()));
            Ok(ConstructResult { urn: component.urn, state })
        }
        .boxed()
    })
}

/// Never finishes on its own.
fn stuck() -> FnConstructor {
    FnConstructor::new(|_ctx, name, _inputs, _opts| {
        async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(ConstructResult { urn: Output::resolved(urn_of(None, COMPONENT_TYPE, &name), Vec::new()), state: BTreeMap::new() })
        }
        .boxed()
    })
}

fn serve(constructor: FnConstructor) -> (Arc<ProviderServer>, ProviderClient) {
    init_tracing();
    let server = Arc::new(ProviderServer::new(Arc::new(constructor), Arc::new(MockMonitor::new())));
    let client = ProviderClient::new(server.clone());
    (server, client)
}

/// Decodes a reply frame into its sequence number and outcome.
fn reply_of(bytes: &[u8]) -> (u64, Result<(), FailureReason>) {
    let mut dec = Decoder::new(bytes);
    match RpcFrame::decode(&mut dec).expect("valid frame") {
        RpcFrame::Reply(reply) => (reply.seq, reply.status.map(|_| ())),
        _ => panic!("expected a Reply frame"),
    }
}

async fn wait_until_in_flight(server: &ProviderServer, count: usize) {
    for _ in 0..200 {
        if server.in_flight() == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {count} calls in flight, found {}", server.in_flight());
}

// ============================================================================
// Construct calls
// ============================================================================

#[tokio::test]
async fn test_construct_over_rpc() {
    let (server, client) = serve(greeter());
    let resp = client.construct(&request(COMPONENT_TYPE, "world")).await.expect("construct");

    assert_eq!(resp.urn, urn_of(None, COMPONENT_TYPE, "world").as_str());
    assert_eq!(resp.state.get("greeting"), Some(&json!("hello world")));
    assert_eq!(resp.state_dependencies.get("greeting"), Some(&Vec::new()));
    assert_eq!(server.in_flight(), 0);
}

#[tokio::test]
async fn test_routine_failure_is_reported_remotely() {
    let constructor = FnConstructor::new(|_ctx, _name, _inputs, _opts| async { Err(anyhow::anyhow!("boom")) }.boxed());
    let (_server, client) = serve(constructor);

    match client.construct(&request(COMPONENT_TYPE, "x")).await {
        Err(ClientError::Remote(FailureReason::ConstructFailed(msg))) => assert!(msg.contains("boom"), "{msg}"),
        other => panic!("expected ConstructFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_sequence_numbers_increase() {
    let (_server, client) = serve(greeter());
    let first = client.next_seq();
    let second = client.next_seq();
    assert!(second > first);
}

// ============================================================================
// Malformed and unexpected frames
// ============================================================================

#[tokio::test]
async fn test_unknown_method() {
    let (server, _client) = serve(greeter());
    let payload = CallEncoder::new(11, "Destroy", &()).into_bytes().expect("encode");
    let reply = server.handle_rpc(&payload).await.expect("reply");
    assert_eq!(reply_of(&reply), (11, Err(FailureReason::MethodNotFound("Destroy".into()))));
}

#[tokio::test]
async fn test_undecodable_request_body() {
    let (server, _client) = serve(greeter());
    let payload = CallEncoder::new(12, wirerpc::CONSTRUCT_METHOD, &()).into_bytes().expect("encode");
    let reply = server.handle_rpc(&payload).await.expect("reply");
    let (seq, outcome) = reply_of(&reply);
    assert_eq!(seq, 12);
    assert!(matches!(outcome, Err(FailureReason::ProtocolViolation(_))));
}

#[tokio::test]
async fn test_reply_frame_sent_to_the_provider() {
    let (server, _client) = serve(greeter());
    let payload = ReplyOkEncoder::new(13, &()).into_bytes().expect("encode");
    let reply = server.handle_rpc(&payload).await.expect("reply");
    let (seq, outcome) = reply_of(&reply);
    assert_eq!(seq, 13);
    assert!(matches!(outcome, Err(FailureReason::ProtocolViolation(_))));
}

#[tokio::test]
async fn test_garbage_fails_the_transport() {
    let (server, _client) = serve(greeter());
    let err = server.handle_rpc(&[0xff, 0x00, 0x13]).await.unwrap_err();
    assert!(matches!(err, TransportError::Io(_)));
}

/// Answers every frame with an empty reply for sequence number 999.
struct Misnumbered;

#[async_trait::async_trait]
impl Transport for Misnumbered {
    async fn call(&self, _payload: &[u8]) -> construct::transport::Result<Vec<u8>> {
        ReplyOkEncoder::new(999, &()).into_bytes().map_err(|e| TransportError::Io(e.to_string()))
    }
}

#[tokio::test]
async fn test_client_rejects_mismatched_reply() {
    let client = ProviderClient::new(Arc::new(Misnumbered));
    let err = client.cancel(1).await.unwrap_err();
    assert_eq!(err, ClientError::SequenceMismatch { sent: 1, received: 999 });
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancel_frame_stops_the_call() {
    let (server, client) = serve(stuck());
    let client = Arc::new(client);

    let seq = client.next_seq();
    let call = {
        let client = client.clone();
        tokio::spawn(async move { client.construct_as(seq, &request(COMPONENT_TYPE, "stuck")).await })
    };
    wait_until_in_flight(&server, 1).await;

    client.cancel(seq).await.expect("cancel acknowledged");
    let outcome = tokio::time::timeout(Duration::from_secs(5), call)
        .await
        .expect("cancel did not unblock the call")
        .expect("call task");
    assert_eq!(outcome.unwrap_err(), ClientError::Remote(FailureReason::Cancelled));
    assert_eq!(server.in_flight(), 0);
}

#[tokio::test]
async fn test_cancel_for_an_unknown_call_is_acknowledged() {
    let (_server, client) = serve(greeter());
    client.cancel(4242).await.expect("cancel acknowledged");
}

#[tokio::test]
async fn test_duplicate_sequence_number_is_refused() {
    let (server, client) = serve(stuck());
    let client = Arc::new(client);

    let first = {
        let client = client.clone();
        tokio::spawn(async move { client.construct_as(77, &request(COMPONENT_TYPE, "one")).await })
    };
    wait_until_in_flight(&server, 1).await;

    let err = client.construct_as(77, &request(COMPONENT_TYPE, "two")).await.unwrap_err();
    assert!(matches!(err, ClientError::Remote(FailureReason::ProtocolViolation(_))));

    server.shutdown();
    let outcome = tokio::time::timeout(Duration::from_secs(5), first).await.expect("shutdown").expect("call task");
    assert_eq!(outcome.unwrap_err(), ClientError::Remote(FailureReason::Cancelled));
}

#[tokio::test]
async fn test_shutdown_cancels_new_calls() {
    let (server, client) = serve(greeter());
    server.shutdown();
    let err = client.construct(&request(COMPONENT_TYPE, "late")).await.unwrap_err();
    assert_eq!(err, ClientError::Remote(FailureReason::Cancelled));
}
