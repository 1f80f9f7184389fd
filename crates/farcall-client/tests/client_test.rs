// Integration tests for the farcall client proxy against a real server.

use std::time::{Duration, Instant};

use serde_json::json;

use farcall_client::RpcClient;
use farcall_common::FarcallError;
use farcall_server::{Registry, Server, ServerConfig, ServerHandle};

// ============================================================================
// Test Helpers
// ============================================================================

fn demo_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register("add", &["x", "y"], Some("Add two numbers."), |args| {
        let x = args[0]
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("x must be a number"))?;
        let y = args[1]
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("y must be a number"))?;
        Ok(json!(x + y))
    });
    registry.register("whoami", &[], None, |_args| Ok(json!("farcall")));
    registry
}

fn start_server() -> ServerHandle {
    Server::new(demo_registry(), ServerConfig::default())
        .serve()
        .expect("server should start")
}

/// An address nothing is listening on.
fn dead_addr() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    addr
}

// ============================================================================
// Bootstrap
// ============================================================================

#[test]
fn construction_introspects_the_server() {
    let handle = start_server();

    let client = RpcClient::connect(handle.local_addr().to_string()).unwrap();

    let names: Vec<_> = client.procedures().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["add", "whoami"]);
    assert_eq!(client.procedures()[0].signature, "x, y");
    assert_eq!(client.procedures()[1].doc, "NO DOCS");

    handle.shutdown();
}

#[test]
fn construction_fails_fast_when_refused() {
    let addr = dead_addr();

    let started = Instant::now();
    let err = RpcClient::connect_with_timeout(addr.as_str(), Duration::from_secs(5)).unwrap_err();

    assert!(matches!(err, FarcallError::ConnectionRefused(_)));
    // Refusal surfaces at the connect step, not after a send/receive stall.
    assert!(started.elapsed() < Duration::from_secs(5));
}

// ============================================================================
// Calls
// ============================================================================

#[test]
fn call_returns_the_result_value() {
    let handle = start_server();
    let client = RpcClient::connect(handle.local_addr().to_string()).unwrap();

    assert_eq!(client.call("add", vec![json!(2), json!(3)]).unwrap(), json!(5));
    assert_eq!(client.call("whoami", vec![]).unwrap(), json!("farcall"));

    handle.shutdown();
}

#[test]
fn each_call_is_an_independent_connection() {
    let handle = start_server();
    let client = RpcClient::connect(handle.local_addr().to_string()).unwrap();

    for i in 0..10i64 {
        let result = client.call("add", vec![json!(i), json!(1)]).unwrap();
        assert_eq!(result, json!(i + 1));
    }

    handle.shutdown();
}

#[test]
fn unknown_procedure_surfaces_as_remote_error() {
    let handle = start_server();
    let client = RpcClient::connect(handle.local_addr().to_string()).unwrap();

    let err = client.call("missing", vec![]).unwrap_err();

    match err {
        FarcallError::Remote(message) => assert_eq!(message, "No such procedure provided"),
        other => panic!("expected Remote, got {other:?}"),
    }

    handle.shutdown();
}

#[test]
fn call_against_a_dead_server_is_refused() {
    let handle = start_server();
    let addr = handle.local_addr().to_string();
    let client = RpcClient::connect(addr.as_str()).unwrap();
    handle.shutdown();

    let err = client
        .call("add", vec![json!(1), json!(2)])
        .expect_err("server is gone");

    assert!(matches!(
        err,
        FarcallError::ConnectionRefused(_) | FarcallError::Connection(_)
    ));
}

// ============================================================================
// Help
// ============================================================================

#[test]
fn procedures_help_lists_every_procedure() {
    let handle = start_server();
    let client = RpcClient::connect(handle.local_addr().to_string()).unwrap();

    let help = client.procedures_help();

    assert_eq!(
        help,
        "add(x, y)\nAdd two numbers.\nwhoami()\nNO DOCS"
    );

    handle.shutdown();
}
