#![cfg(unix)]

//! The shutdown flag is process-wide and never resets, so this file holds a
//! single test in its own binary.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pulselog_server::shutdown::{is_shutdown_requested, shutdown_and_wake};
use pulselog_server::{
    LogRecordServer, MemorySink, MessageServer, ServerConfig, ServerState, StopReason,
};
use pulselog_transport::Namespace;

#[test]
fn shutdown_request_unblocks_every_signal_aware_server() {
    let dir = tempfile::tempdir().expect("temp dir");
    let ns = Namespace::new(dir.path());

    let servers: Vec<Arc<MessageServer>> = ["alpha", "beta"]
        .into_iter()
        .map(|name| {
            Arc::new(
                MessageServer::bind_str(&ns, name, ServerConfig::default())
                    .expect("server should bind"),
            )
        })
        .collect();

    let sinks: Vec<MemorySink> = servers.iter().map(|_| MemorySink::new()).collect();
    let handles: Vec<_> = servers
        .iter()
        .zip(&sinks)
        .map(|(server, sink)| {
            let server = Arc::clone(server);
            let sink = sink.clone();
            thread::spawn(move || LogRecordServer::new(sink).serve(&server))
        })
        .collect();

    let start = Instant::now();
    while servers.iter().any(|s| s.state() != ServerState::Running) {
        assert!(start.elapsed() < Duration::from_secs(3), "servers did not start");
        thread::sleep(Duration::from_millis(5));
    }

    assert!(!is_shutdown_requested());
    shutdown_and_wake();
    assert!(is_shutdown_requested());

    for handle in handles {
        assert_eq!(
            handle.join().expect("server thread").expect("serve"),
            StopReason::ShutdownRequested
        );
    }
    for (server, sink) in servers.iter().zip(&sinks) {
        assert_eq!(server.state(), ServerState::Stopped);
        assert_eq!(
            sink.lines().last().map(String::as_str),
            Some("Logger has been stopped.")
        );
    }

    // A server started after the request stops before receiving anything.
    let late = MessageServer::bind_str(&ns, "gamma", ServerConfig::default())
        .expect("server should bind");
    assert_eq!(
        LogRecordServer::new(MemorySink::new())
            .serve(&late)
            .expect("serve"),
        StopReason::ShutdownRequested
    );
}
