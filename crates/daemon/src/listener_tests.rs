// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use px_adapters::SubprocessScriptExecutor;
use px_core::{PromptDefinition, SystemClock};
use px_engine::{Engine, EngineConfig, ExecutionRequest, NotificationSender};
use px_storage::SessionStore;
use std::time::Duration;

fn test_engine() -> Arc<DaemonEngine> {
    let registries = px_registry::RegistrySet::new();
    registries.prompts.insert(PromptDefinition {
        id: "greet".to_string(),
        name: "greet".to_string(),
        category: "general".to_string(),
        system_message: None,
        user_message_template: "Hello, {{name}}!".to_string(),
        arguments: vec![],
        chain_steps: vec![],
        gate_configuration: None,
        script_tools: vec![],
        injection: None,
        prompt_dir: None,
    });
    let store = Arc::new(SessionStore::in_memory(
        Duration::from_secs(60),
        SystemClock,
    ));
    Arc::new(Engine::new(
        registries,
        store,
        SubprocessScriptExecutor::new(),
        NotificationSender::disabled(),
        SystemClock,
        EngineConfig::default(),
    ))
}

async fn start_listener() -> (tempfile::TempDir, std::path::PathBuf, Arc<Notify>) {
    let tmp = tempfile::tempdir().unwrap();
    let socket_path = tmp.path().join("daemon.sock");
    let socket = UnixListener::bind(&socket_path).unwrap();
    let shutdown = Arc::new(Notify::new());
    let listener = Listener::new(socket, test_engine(), Arc::clone(&shutdown));
    tokio::spawn(listener.run());
    (tmp, socket_path, shutdown)
}

#[tokio::test]
async fn ping_pong() {
    let (_tmp, socket_path, _shutdown) = start_listener().await;
    let mut stream = UnixStream::connect(&socket_path).await.unwrap();
    write_message(&mut stream, &Request::Ping).await.unwrap();
    let response: Option<Response> = read_message(&mut stream).await.unwrap();
    assert_eq!(response, Some(Response::Pong));
}

#[tokio::test]
async fn hello_returns_daemon_version() {
    let (_tmp, socket_path, _shutdown) = start_listener().await;
    let mut stream = UnixStream::connect(&socket_path).await.unwrap();
    write_message(
        &mut stream,
        &Request::Hello {
            version: "0.0.0".to_string(),
        },
    )
    .await
    .unwrap();
    let response: Option<Response> = read_message(&mut stream).await.unwrap();
    assert_eq!(
        response,
        Some(Response::Hello {
            version: PROTOCOL_VERSION.to_string()
        })
    );
}

#[tokio::test]
async fn execute_runs_the_pipeline() {
    let (_tmp, socket_path, _shutdown) = start_listener().await;
    let mut stream = UnixStream::connect(&socket_path).await.unwrap();
    write_message(
        &mut stream,
        &Request::Execute {
            request: ExecutionRequest::from_command(">>greet name=\"Ada\""),
        },
    )
    .await
    .unwrap();
    let response: Option<Response> = read_message(&mut stream).await.unwrap();
    match response {
        Some(Response::Execution { response }) => {
            assert!(!response.is_error);
            assert!(response.first_text().contains("Hello, Ada!"));
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn status_reports_registry_counts() {
    let (_tmp, socket_path, _shutdown) = start_listener().await;
    let mut stream = UnixStream::connect(&socket_path).await.unwrap();
    write_message(&mut stream, &Request::Status).await.unwrap();
    let response: Option<Response> = read_message(&mut stream).await.unwrap();
    match response {
        Some(Response::Status { status }) => {
            assert_eq!(status.prompts, 1);
            assert_eq!(status.active_sessions, 0);
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn shutdown_wakes_the_main_loop() {
    let (_tmp, socket_path, shutdown) = start_listener().await;
    let mut stream = UnixStream::connect(&socket_path).await.unwrap();
    write_message(&mut stream, &Request::Shutdown).await.unwrap();
    let response: Option<Response> = read_message(&mut stream).await.unwrap();
    assert_eq!(response, Some(Response::ShuttingDown));
    // The notify fired; a waiter returns promptly
    tokio::time::timeout(Duration::from_secs(1), shutdown.notified())
        .await
        .unwrap();
}
