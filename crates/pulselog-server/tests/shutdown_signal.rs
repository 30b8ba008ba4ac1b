#![cfg(unix)]

//! Delivers a real SIGTERM to the test process. Kept in its own binary so the
//! process-wide shutdown flag does not leak into other tests.

use std::process::Command;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pulselog_server::{
    is_shutdown_requested, LogRecordServer, MemorySink, MessageServer, ServerConfig,
    ServerState, StopReason,
};
use pulselog_transport::Namespace;

#[test]
fn sigterm_stops_a_blocked_server() {
    let dir = tempfile::tempdir().expect("temp dir");
    let ns = Namespace::new(dir.path());
    let server = Arc::new(
        MessageServer::bind_str(&ns, "logger", ServerConfig::default())
            .expect("server should bind and install the signal handler"),
    );

    let sink = MemorySink::new();
    let handle = {
        let server = Arc::clone(&server);
        let sink = sink.clone();
        thread::spawn(move || LogRecordServer::new(sink).serve(&server))
    };

    let start = Instant::now();
    while server.state() != ServerState::Running {
        assert!(start.elapsed() < Duration::from_secs(3), "server did not start");
        thread::sleep(Duration::from_millis(5));
    }

    let status = Command::new("kill")
        .arg("-TERM")
        .arg(std::process::id().to_string())
        .status()
        .expect("kill should run");
    assert!(status.success());

    assert_eq!(
        handle.join().expect("server thread").expect("serve"),
        StopReason::ShutdownRequested
    );
    assert!(is_shutdown_requested());
    assert_eq!(
        sink.lines(),
        vec!["Logger has been started.", "Logger has been stopped."]
    );
}
