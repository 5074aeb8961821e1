//! TCP binding round trip against an in-process server speaking the
//! length-delimited JSON frame protocol.

mod common;

use std::sync::Arc;

use bytes::Bytes;
use common::{event_channel, MockPreparer};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use visionlink::{
    AuthConfig, ClassificationInput, ClientConfig, ClientEvent, VisionClientBuilder,
};

async fn handle_connection(socket: TcpStream) {
    let mut wire = Framed::new(socket, LengthDelimitedCodec::new());
    let mut saw_hello = false;

    while let Some(Ok(buf)) = wire.next().await {
        let frame: Value = serde_json::from_slice(&buf).unwrap();
        match frame["frame"].as_str().unwrap() {
            "hello" => {
                assert_eq!(frame["metadata"]["client_language"], "rust");
                assert_eq!(frame["metadata"]["authorization"], "Bearer tcp-token");
                saw_hello = true;
            }
            "request" | "classify" => {
                assert!(saw_hello, "envelope before hello");
                let results: Vec<Value> = frame["envelope"]["inputs"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|input| {
                        json!({
                            "correlation_id": input["correlation_id"],
                            "classifications": [{"label": "ok", "weight": 0.9}],
                        })
                    })
                    .collect();
                let reply = json!({
                    "frame": "response",
                    "envelope": {"results": results},
                });
                wire.send(Bytes::from(serde_json::to_vec(&reply).unwrap()))
                    .await
                    .unwrap();
            }
            "list-deployments" => {
                assert!(saw_hello, "listing before hello");
                let reply = json!({
                    "frame": "deployments",
                    "deployments": [
                        {"deployment_id": "dep-a", "backlog": 3},
                        {"deployment_id": "dep-b", "backlog": 0},
                    ],
                });
                wire.send(Bytes::from(serde_json::to_vec(&reply).unwrap()))
                    .await
                    .unwrap();
            }
            other => panic!("unexpected frame: {other}"),
        }
    }
}

async fn spawn_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(handle_connection(socket));
        }
    });
    addr.to_string()
}

fn tcp_config(endpoint: String) -> ClientConfig {
    ClientConfig::new(
        endpoint,
        "dep-a",
        "acme",
        AuthConfig::Static {
            token: "tcp-token".to_string(),
        },
    )
}

#[tokio::test]
async fn test_streaming_round_trip_over_tcp() {
    let endpoint = spawn_server().await;
    // Default connector is the TCP binding against the configured endpoint.
    let client = VisionClientBuilder::new()
        .config(tcp_config(endpoint))
        .preparer(Arc::new(MockPreparer::new()))
        .build()
        .unwrap();
    let (_sub, mut events) = event_channel(&client);

    client.open().await.unwrap();
    assert!(matches!(events.recv().await, Some(ClientEvent::Open)));

    client
        .submit_one(ClassificationInput::resized(vec![1u8, 2, 3]).correlation_id("tcp-1"))
        .await
        .unwrap();

    match events.recv().await {
        Some(ClientEvent::Data(envelope)) => {
            assert_eq!(envelope.results.len(), 1);
            assert_eq!(envelope.results[0].correlation_id, "tcp-1");
            assert_eq!(envelope.results[0].classifications[0].label, "ok");
        }
        other => panic!("expected a data event, got {other:?}"),
    }

    client.close().await;
    assert!(matches!(events.recv().await, Some(ClientEvent::Close)));
}

#[tokio::test]
async fn test_list_deployments_over_tcp() {
    let endpoint = spawn_server().await;
    let client = VisionClientBuilder::new()
        .config(tcp_config(endpoint))
        .preparer(Arc::new(MockPreparer::new()))
        .build()
        .unwrap();

    // No open session required.
    let deployments = client.list_deployments().await.unwrap();
    assert_eq!(deployments.len(), 2);
    assert_eq!(deployments[0].deployment_id, "dep-a");
    assert_eq!(deployments[0].backlog, 3);
}

#[tokio::test]
async fn test_single_shot_over_tcp() {
    let endpoint = spawn_server().await;
    let client = VisionClientBuilder::new()
        .config(tcp_config(endpoint))
        .preparer(Arc::new(MockPreparer::new()))
        .build()
        .unwrap();

    let result = client
        .submit_single_shot(
            ClassificationInput::resized(vec![7u8]).correlation_id("one-shot"),
        )
        .await
        .unwrap();
    assert_eq!(result.correlation_id, "one-shot");
    assert_eq!(result.classifications[0].label, "ok");
}

#[tokio::test]
async fn test_connect_failure_propagates() {
    // Nothing listens here.
    let client = VisionClientBuilder::new()
        .config(tcp_config("127.0.0.1:1".to_string()))
        .preparer(Arc::new(MockPreparer::new()))
        .build()
        .unwrap();
    assert!(client.open().await.is_err());
    assert!(!client.is_open().await);
}
